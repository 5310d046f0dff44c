use chrono::{Duration, NaiveDate};
use pretty_assertions::assert_eq;
use sales_forecast::aggregate::Domain;
use sales_forecast::error::ForecastError;
use sales_forecast::output::{CATEGORIES_FILE, FORECAST_FILE, ITEMS_FILE, STORES_FILE};
use sales_forecast::HORIZON;
use shelfcast::config::{Config, ModelChoice};
use shelfcast::{service, ServiceError};
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

const HISTORY_DAYS: i64 = 60;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2017, 1, 1).unwrap()
}

fn write_lines(path: &Path, lines: &[String]) {
    fs::write(path, lines.join("\n") + "\n").unwrap();
}

/// Two stores, two items, 60 days of history and a 16-day schedule
fn workspace(kind: ModelChoice) -> (TempDir, Config) {
    let dir = tempdir().unwrap();
    let root = dir.path();

    let mut history = vec!["id,date,store_nbr,item_nbr,unit_sales,onpromotion".to_string()];
    let mut id = 0;
    for d in 0..HISTORY_DAYS {
        let day = start() + Duration::days(d);
        for store in [1u32, 2] {
            for item in [101u64, 102] {
                let units = (store as i64 * 7 + item as i64 * 3 + d) % 5;
                history.push(format!("{},{},{},{},{}.0,False", id, day, store, item, units));
                id += 1;
            }
        }
    }
    write_lines(&root.join("train.csv"), &history);

    let anchor = start() + Duration::days(HISTORY_DAYS);
    let mut schedule = vec!["id,date,store_nbr,item_nbr,onpromotion".to_string()];
    for h in 0..HORIZON as i64 {
        let day = anchor + Duration::days(h);
        for store in [1u32, 2] {
            for item in [101u64, 102] {
                schedule.push(format!("{},{},{},{},{}", id, day, store, item, h == 3));
                id += 1;
            }
        }
    }
    write_lines(&root.join("test.csv"), &schedule);

    write_lines(
        &root.join("items.csv"),
        &[
            "item_nbr,family,class,perishable".to_string(),
            "101,GROCERY I,1040,0".to_string(),
            "102,DAIRY,2712,1".to_string(),
        ],
    );
    write_lines(
        &root.join("stores.csv"),
        &[
            "store_nbr,city,state,type,cluster".to_string(),
            "1,Quito,Pichincha,D,13".to_string(),
            "2,Guayaquil,Guayas,A,17".to_string(),
        ],
    );

    let mut config = Config::default();
    config.data.history = root.join("train.csv");
    config.data.schedule = root.join("test.csv");
    config.data.items = root.join("items.csv");
    config.data.stores = root.join("stores.csv");
    config.model.dir = root.join("models");
    config.model.kind = kind;
    config.training.weeks = 2;
    config.output.dir = root.join("output");
    (dir, config)
}

#[test]
fn test_quick_predict_before_predict_is_not_found() {
    let (_dir, config) = workspace(ModelChoice::MovingAverage);

    let err = service::quick_predict(&config).unwrap_err();

    assert!(err.is_not_found());
}

#[test]
fn test_predict_without_models_fails_without_output() {
    let (_dir, config) = workspace(ModelChoice::Ridge);

    let err = service::predict(&config, None, None).unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Forecast(ForecastError::MissingArtifact { horizon: 0, .. })
    ));
    assert!(!err.is_not_found());
    assert!(!config.output.dir.join(FORECAST_FILE).exists());
}

#[test]
fn test_train_predict_and_cached_read() {
    let (_dir, config) = workspace(ModelChoice::Ridge);

    let report = service::train(&config).unwrap();
    assert_eq!(report.artifacts.len(), HORIZON);
    assert_eq!(report.fit.horizons.len(), HORIZON);
    assert_eq!(report.fit.anchors.len(), 2);
    assert!(config.model.dir.join("model_15.json").exists());

    let summaries = service::predict(&config, None, Some(1)).unwrap();
    assert_eq!(summaries.categories.len(), 1);
    assert_eq!(summaries.items.len(), 1);
    assert_eq!(summaries.stores.len(), 1);
    for file in [FORECAST_FILE, CATEGORIES_FILE, ITEMS_FILE, STORES_FILE] {
        assert!(config.output.dir.join(file).exists(), "{} missing", file);
    }

    let forecast = fs::read_to_string(config.output.dir.join(FORECAST_FILE)).unwrap();
    assert_eq!(forecast.lines().count(), 1 + 4 * HORIZON);

    assert_eq!(service::quick_predict(&config).unwrap(), summaries);
}

#[test]
fn test_moving_average_summaries_rank_by_total() {
    let (_dir, config) = workspace(ModelChoice::MovingAverage);
    service::train(&config).unwrap();

    let summaries = service::predict(&config, None, None).unwrap();

    assert_eq!(summaries.items.len(), 2);
    assert_eq!(summaries.stores.len(), 2);
    assert!(summaries.items[0].measure >= summaries.items[1].measure);
    assert!(summaries
        .items
        .iter()
        .all(|e| matches!(e.domain, Domain::Id(101) | Domain::Id(102))));

    let json = serde_json::to_value(&summaries).unwrap();
    assert!(json["categories"].is_array());
    assert!(json["stores"][0]["measure"].is_number());
}

#[test]
fn test_config_file_drives_the_service() {
    let (dir, config) = workspace(ModelChoice::MovingAverage);
    let path = dir.path().join("shelfcast.toml");
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();

    assert_eq!(loaded, config);
    assert_eq!(loaded.model.kind, ModelChoice::MovingAverage);
}

#[test]
fn test_history_start_filters_training_window() {
    let (_dir, mut config) = workspace(ModelChoice::MovingAverage);
    config.data.history_start = Some(start() + Duration::days(40));
    config.training.weeks = 1;

    let report = service::train(&config).unwrap();

    assert_eq!(report.fit.anchors, vec![start() + Duration::days(HISTORY_DAYS - 16)]);
}
