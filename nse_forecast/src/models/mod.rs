//! Forecasting models for closing-price series

use crate::data::TimeSeriesData;
use crate::error::{ForecastError, Result};
use crate::utils::future_dates;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub mod additive;

pub use additive::{AdditiveModel, SeasonalityMode, TrainedAdditiveModel};

/// One predicted row: the fitted components and the combined estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub ds: NaiveDate,
    pub trend: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yearly: Option<f64>,
    pub additive_terms: f64,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

/// Predictions over a timeline, history dates first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastFrame {
    rows: Vec<ForecastRow>,
    history_len: usize,
}

impl ForecastFrame {
    pub fn new(rows: Vec<ForecastRow>, history_len: usize) -> Self {
        Self { rows, history_len }
    }

    pub fn rows(&self) -> &[ForecastRow] {
        &self.rows
    }

    /// Number of rows in the frame
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows that fall on or before the last training date
    pub fn history_len(&self) -> usize {
        self.history_len
    }

    /// Rows strictly after the training history
    pub fn future(&self) -> &[ForecastRow] {
        &self.rows[self.history_len.min(self.rows.len())..]
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|row| row.ds).collect()
    }

    pub fn yhat(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.yhat).collect()
    }

    pub fn has_weekly(&self) -> bool {
        self.rows.iter().any(|row| row.weekly.is_some())
    }

    pub fn has_yearly(&self) -> bool {
        self.rows.iter().any(|row| row.yearly.is_some())
    }

    /// Mean absolute error of the in-sample fit against `actual`
    pub fn mean_absolute_error(&self, actual: &TimeSeriesData) -> Result<f64> {
        if actual.is_empty() {
            return Err(ForecastError::DataError("Empty time series".to_string()));
        }

        let mut total = 0.0;
        for (date, value) in actual.dates().iter().zip(actual.values()) {
            let row = self
                .rows
                .binary_search_by_key(date, |row| row.ds)
                .map(|index| &self.rows[index])
                .map_err(|_| ForecastError::DataError(format!("No prediction for {}", date)))?;
            total += (row.yhat - value).abs();
        }
        Ok(total / actual.len() as f64)
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Unique training dates in ascending order
    fn history_dates(&self) -> &[NaiveDate];

    /// Predict the given dates
    fn predict(&self, dates: &[NaiveDate]) -> Result<ForecastFrame>;

    /// Name of the model
    fn name(&self) -> &str;

    /// History dates followed by `periods` consecutive days
    fn make_future_dates(&self, periods: usize) -> Vec<NaiveDate> {
        let history = self.history_dates();
        let mut dates = history.to_vec();
        if let Some(&last) = history.last() {
            dates.extend(future_dates(last, periods));
        }
        dates
    }
}

/// Forecast model that can be trained on time series data
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model on time series data
    fn train(&self, data: &TimeSeriesData) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}
