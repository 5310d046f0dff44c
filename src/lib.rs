//! # shelfcast
//!
//! `shelfcast` trains and serves 16-day unit sales forecasts for every
//! (store, item) pair in a promotion schedule, on top of the
//! [`sales_forecast`] pipeline.
//!
//! ## Example
//!
//! ```no_run
//! use shelfcast::config::Config;
//! use shelfcast::service;
//!
//! let config = Config::load("shelfcast.toml").unwrap();
//! service::train(&config).unwrap();
//! let summaries = service::predict(&config, None, None).unwrap();
//! println!("{}", serde_json::to_string(&summaries).unwrap());
//! ```

pub mod config;
pub mod error;
pub mod service;

pub use crate::config::Config;
pub use crate::error::{Result, ServiceError};
pub use crate::service::{predict, quick_predict, train, TrainReport};
