//! Dashboard views
//!
//! Each view is a pure function of a [`PriceTable`] and its parameters and
//! returns serialisable figures and captions. Nothing is cached between
//! calls.

use crate::charts::{self, Axis, Figure, Title, Trace};
use crate::data::{PriceTable, TimeSeriesData};
use crate::error::{ForecastError, Result};
use crate::models::{AdditiveModel, ForecastFrame, ForecastModel, TrainedForecastModel};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, info_span};
use trade_math::oscillators::{DEFAULT_MACD_FAST, DEFAULT_MACD_SLOW, DEFAULT_RSI_WINDOW};

pub const RAW_TITLE: &str = "Time Series data with Rangeslider";
pub const MACD_TITLE: &str = "Stock Moving Average Convergence Divergence (MACD) = Close";
pub const RSI_TITLE: &str = "Relative Strength Index (RSI) = Close";

const DAYS_PER_YEAR: usize = 365;

/// Dashboard pages offered by the page selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Page {
    #[serde(rename = "Forecast for Days")]
    ForecastForDays,
    #[serde(rename = "Forecast for Years")]
    ForecastForYears,
}

impl Page {
    pub const ALL: [Page; 2] = [Page::ForecastForDays, Page::ForecastForYears];

    pub fn label(&self) -> &'static str {
        match self {
            Page::ForecastForDays => "Forecast for Days",
            Page::ForecastForYears => "Forecast for Years",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Short forecast horizon in days, 1 to 31
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DaysHorizon(u32);

impl DaysHorizon {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 31;

    pub fn new(days: u32) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&days) {
            return Err(ForecastError::InvalidParameter(format!(
                "Days horizon must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                days
            )));
        }
        Ok(Self(days))
    }

    pub fn days(&self) -> u32 {
        self.0
    }

    /// Number of future rows to predict
    pub fn periods(&self) -> usize {
        self.0 as usize
    }
}

impl Default for DaysHorizon {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

/// Long forecast horizon in years, 1 to 10
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearsHorizon(u32);

impl YearsHorizon {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 10;

    pub fn new(years: u32) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&years) {
            return Err(ForecastError::InvalidParameter(format!(
                "Years horizon must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                years
            )));
        }
        Ok(Self(years))
    }

    pub fn years(&self) -> u32 {
        self.0
    }

    /// Number of future rows to predict, 365 per year
    pub fn periods(&self) -> usize {
        self.0 as usize * DAYS_PER_YEAR
    }
}

impl Default for YearsHorizon {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

/// Output of the short-horizon page
#[derive(Debug, Clone, Serialize)]
pub struct DaysView {
    pub caption: String,
    pub forecast: ForecastFrame,
    pub forecast_figure: Figure,
    pub components_figure: Figure,
}

/// Forecast section of the long-horizon page, shown on request
#[derive(Debug, Clone, Serialize)]
pub struct ForecastDetail {
    pub caption: String,
    pub forecast: ForecastFrame,
    pub forecast_figure: Figure,
    pub components_figure: Figure,
}

/// Output of the long-horizon page
#[derive(Debug, Clone, Serialize)]
pub struct YearsView {
    pub macd_figure: Figure,
    pub rsi_figure: Figure,
    pub detail: Option<ForecastDetail>,
}

/// Open and close prices over time with a range slider
pub fn plot_raw_data(table: &PriceTable) -> Result<Figure> {
    let dates = table.dates()?;

    Ok(Figure::new(RAW_TITLE)
        .with_trace(Trace::line("stock_open", &dates, table.opens()?))
        .with_trace(Trace::line("stock_close", &dates, table.closes()?))
        .with_size(1000, 600)
        .with_rangeslider())
}

/// Fit the default model on closes and predict `periods` days ahead
fn fit_and_predict(series: &TimeSeriesData, periods: usize) -> Result<ForecastFrame> {
    let model = AdditiveModel::default();
    let trained = model.train(series)?;
    debug!(
        changepoints = trained.changepoint_count(),
        residual_std = trained.residual_std(),
        "Model fitted"
    );
    let timeline = trained.make_future_dates(periods);
    trained.predict(&timeline)
}

/// Forecast the close over the next 1 to 31 days
pub fn forecast_for_days(table: &PriceTable, horizon: DaysHorizon) -> Result<DaysView> {
    let span = info_span!("forecast_for_days", days = horizon.days(), rows = table.len());
    let _guard = span.enter();

    let series = table.close_series()?.sorted_by_date();
    let forecast = fit_and_predict(&series, horizon.periods())?;
    info!(forecast_rows = forecast.len(), "Forecast ready");

    Ok(DaysView {
        caption: format!(
            "Forecasting closing of stock value for a period of {} days",
            horizon.days()
        ),
        forecast_figure: charts::forecast_figure(&series, &forecast),
        components_figure: charts::components_figure(&forecast),
        forecast,
    })
}

/// MACD and RSI charts plus, when `show_detail` is set, a 1 to 10 year forecast
pub fn forecast_for_years(
    table: &PriceTable,
    horizon: YearsHorizon,
    show_detail: bool,
) -> Result<YearsView> {
    let span = info_span!(
        "forecast_for_years",
        years = horizon.years(),
        detail = show_detail,
        rows = table.len()
    );
    let _guard = span.enter();

    let series = table.close_series()?.sorted_by_date();
    let macd_figure = macd_figure(&series)?;
    let rsi_figure = rsi_figure(&series)?;

    // Fit failures surface even when the detail is hidden
    let forecast = fit_and_predict(&series, horizon.periods())?;
    info!(forecast_rows = forecast.len(), "Forecast ready");

    let detail = show_detail.then(|| ForecastDetail {
        caption: format!(
            "Forecasting closing of stock value for a period of {} years",
            horizon.years()
        ),
        forecast_figure: charts::forecast_figure(&series, &forecast),
        components_figure: charts::components_figure(&forecast),
        forecast,
    });

    Ok(YearsView {
        macd_figure,
        rsi_figure,
        detail,
    })
}

/// MACD line as an area chart
pub fn macd_figure(series: &TimeSeriesData) -> Result<Figure> {
    let macd = trade_math::macd_series(series.values(), DEFAULT_MACD_FAST, DEFAULT_MACD_SLOW)?;
    Ok(indicator_figure(MACD_TITLE, "MACD")
        .with_trace(Trace::line("MACD", series.dates(), macd).area()))
}

/// RSI line chart
pub fn rsi_figure(series: &TimeSeriesData) -> Result<Figure> {
    let rsi = trade_math::rsi_series(series.values(), DEFAULT_RSI_WINDOW)?;
    Ok(indicator_figure(RSI_TITLE, "RSI").with_trace(Trace::line("RSI", series.dates(), rsi)))
}

fn indicator_figure(title: &str, y_label: &str) -> Figure {
    Figure::new(title).with_axis(
        "yaxis",
        Axis {
            title: Some(Title {
                text: y_label.to_string(),
            }),
            ..Axis::default()
        },
    )
}
