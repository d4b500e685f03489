//! # Trade Math
//!
//! Technical indicator calculations over closing-price series.
//! Indicators are incremental (`update` / `value`) with `*_series` helpers
//! that return one `Option<f64>` per input, `None` during warm-up.

use thiserror::Error;

// Indicator modules
pub mod moving_averages;
pub mod oscillators;

pub use moving_averages::{ema_series, ExponentialMovingAverage};
pub use oscillators::{macd_series, rsi_series, Macd, RelativeStrengthIndex};

/// Errors that can occur in indicator calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for trading math operations
pub type Result<T> = std::result::Result<T, MathError>;
