//! Error types for the nse_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the nse_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// File extension is not one of csv, txt or xlsx
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// A required source column is absent from the header row
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// A date cell does not match the DD-Mon-YYYY pattern
    #[error("Could not parse {column} at row {row}: '{value}' is not a DD-Mon-YYYY date")]
    DateParse {
        column: String,
        row: usize,
        value: String,
    },

    /// The file has a header but no data rows
    #[error("Dataset is empty")]
    EmptyDataset,

    /// Close price missing or non-numeric where a forecast needs it
    #[error("Close price at row {row} is not a number")]
    InvalidClose { row: usize },

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Not enough observations to fit a model
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Error raised while fitting or evaluating a model
    #[error("Model error: {0}")]
    ModelError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from the delimited-text reader
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from the spreadsheet reader
    #[error("Spreadsheet error: {0}")]
    SpreadsheetError(String),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error from indicator calculations
    #[error("Indicator error: {0}")]
    IndicatorError(#[from] trade_math::MathError),
}

impl ForecastError {
    /// True when the error means the uploaded file itself is unusable
    pub fn is_invalid_dataset(&self) -> bool {
        matches!(
            self,
            ForecastError::UnsupportedFormat(_)
                | ForecastError::MissingColumn(_)
                | ForecastError::DateParse { .. }
                | ForecastError::EmptyDataset
                | ForecastError::CsvError(_)
                | ForecastError::SpreadsheetError(_)
        )
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<calamine::XlsxError> for ForecastError {
    fn from(err: calamine::XlsxError) -> Self {
        ForecastError::SpreadsheetError(err.to_string())
    }
}
