//! One artifact file per horizon day
//!
//! Model `h` lives at `<dir>/model_{h}.json`. Writes go to a temp file in the
//! same directory which is then renamed over the destination, so readers
//! never observe a half-written artifact.

use crate::error::{ForecastError, Result};
use crate::models::TrainedModel;
use crate::HORIZON;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Directory of per-horizon artifacts
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

/// The full set of horizon models, index `h` scoring horizon day `h`
#[derive(Debug, Clone)]
pub struct ModelSet {
    models: Vec<TrainedModel>,
}

impl ModelSet {
    /// Wrap exactly one model per horizon day
    pub fn new(models: Vec<TrainedModel>) -> Result<Self> {
        if models.len() != HORIZON {
            return Err(ForecastError::ValidationError(format!(
                "Expected {} horizon models, got {}",
                HORIZON,
                models.len()
            )));
        }
        Ok(Self { models })
    }

    pub fn get(&self, horizon: usize) -> Option<&TrainedModel> {
        self.models.get(horizon)
    }

    pub fn models(&self) -> &[TrainedModel] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the artifact for one horizon day
    pub fn artifact_path(&self, horizon: usize) -> PathBuf {
        self.dir.join(format!("model_{}.json", horizon))
    }

    /// Persist one horizon model with an atomic replace
    pub fn save(&self, horizon: usize, model: &TrainedModel) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.artifact_path(horizon);

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, model)?;
            writer.flush()?;
        }
        tmp.persist(&path)?;

        debug!("Saved horizon {} model to {}", horizon, path.display());
        Ok(path)
    }

    /// Persist every model of a set
    pub fn save_all(&self, models: &ModelSet) -> Result<Vec<PathBuf>> {
        let paths = models
            .models()
            .iter()
            .enumerate()
            .map(|(h, model)| self.save(h, model))
            .collect::<Result<Vec<_>>>()?;

        info!("Saved {} models to {}", paths.len(), self.dir.display());
        Ok(paths)
    }

    /// Load one horizon model
    pub fn load(&self, horizon: usize) -> Result<TrainedModel> {
        let path = self.artifact_path(horizon);
        if !path.is_file() {
            return Err(ForecastError::MissingArtifact { horizon, path });
        }

        let reader = BufReader::new(File::open(&path)?);
        let model = serde_json::from_reader(reader)?;
        Ok(model)
    }

    /// Load all horizon models, failing on the first missing one
    pub fn load_all(&self) -> Result<ModelSet> {
        let models = (0..HORIZON)
            .map(|h| self.load(h))
            .collect::<Result<Vec<_>>>()?;

        info!("Loaded {} models from {}", models.len(), self.dir.display());
        ModelSet::new(models)
    }
}
