//! Command-line interface for the forecasting service.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use shelfcast::config::{Config, DEFAULT_CONFIG_FILE};
use shelfcast::{service, ServiceError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// shelfcast - 16-day unit sales forecasts per store and item.
#[derive(Parser)]
#[command(name = "shelfcast")]
#[command(version)]
#[command(about = "Train and serve 16-day unit sales forecasts")]
#[command(long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit and persist the per-horizon models
    Train,

    /// Forecast the scheduled rows and write the results
    Predict {
        /// First forecast day (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Entries per summary
        #[arg(short = 'n', long)]
        top_n: Option<usize>,
    },

    /// Serve the summaries of the last prediction
    QuickPredict,

    /// Write a default configuration file
    Init,
}

impl Cli {
    /// Initialize logging based on verbosity level.
    fn init_logging(&self) {
        let level = match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };

        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .finish();

        if tracing::subscriber::set_global_default(subscriber).is_err() {
            eprintln!("A tracing subscriber was already installed");
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ServiceError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: &Cli) -> Result<(), ServiceError> {
    if let Commands::Init = cli.command {
        Config::default().save(&cli.config)?;
        info!("Wrote default configuration to {}", cli.config.display());
        return Ok(());
    }

    let config = Config::load(&cli.config)?;
    match &cli.command {
        Commands::Train => print_json(&service::train(&config)?),
        Commands::Predict { date, top_n } => {
            print_json(&service::predict(&config, *date, *top_n)?)
        }
        Commands::QuickPredict => print_json(&service::quick_predict(&config)?),
        Commands::Init => Ok(()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.init_logging();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.is_not_found() => {
            println!("{}", serde_json::json!({ "error": "not found" }));
            ExitCode::from(2)
        }
        Err(err) => {
            error!("{}", err);
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
