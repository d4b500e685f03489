//! # NSE Forecast
//!
//! Loading, charting and forecasting of NSE derivative price files.
//!
//! ## Features
//!
//! - Upload normalisation (csv, txt, xlsx) into a canonical polars table
//! - Additive trend + seasonality forecasting of closing prices
//! - MACD and RSI indicator charts (via `trade_math`)
//! - Plotly figure descriptions serialisable with serde
//!
//! ## Quick Start
//!
//! ```no_run
//! use nse_forecast::data::DataLoader;
//! use nse_forecast::views::{forecast_for_days, DaysHorizon};
//!
//! # fn main() -> nse_forecast::error::Result<()> {
//! let loaded = DataLoader::from_path("NIFTY.csv")?;
//! let view = forecast_for_days(&loaded.table, DaysHorizon::new(7)?)?;
//! println!("{}: {} rows", view.caption, view.forecast.len());
//! # Ok(())
//! # }
//! ```

pub mod charts;
pub mod data;
pub mod error;
pub mod models;
pub mod utils;
pub mod views;

// Re-export commonly used types
pub use crate::data::{DataLoader, LoadedTable, PriceTable, TimeSeriesData, Upload};
pub use crate::error::ForecastError;
pub use crate::models::{AdditiveModel, ForecastFrame, ForecastModel, TrainedForecastModel};
pub use crate::views::{DaysHorizon, DaysView, Page, YearsHorizon, YearsView};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
