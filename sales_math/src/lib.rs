//! # Sales Math
//!
//! Numeric kernels used by the sales forecasting pipeline.
//! This crate provides window statistics over daily series, the log
//! transforms applied to unit sales, column scaling and a ridge
//! regression solver.

use thiserror::Error;

// Kernel modules
pub mod regression;
pub mod scaling;
pub mod windows;

pub use regression::{solve_ridge, RidgeFit};
pub use scaling::{from_log_sales, min_max_scale, to_log_sales};

/// Errors that can occur in forecasting math
#[derive(Error, Debug)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for forecasting math operations
pub type Result<T> = std::result::Result<T, MathError>;
