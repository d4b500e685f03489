//! Additive trend + seasonality model
//!
//! `y(t) = trend(t) + weekly(t) + yearly(t) + noise`, where the trend is
//! piecewise linear with changepoints spread over the early part of the
//! history and each seasonality is a truncated Fourier series. All
//! coefficients are fitted jointly by penalised least squares: changepoint
//! deltas and Fourier terms carry Gaussian priors whose scales play the role
//! of regularisation strength.

use crate::data::coerce::date_to_epoch_days;
use crate::data::TimeSeriesData;
use crate::error::{ForecastError, Result};
use crate::models::{ForecastFrame, ForecastModel, ForecastRow, TrainedForecastModel};
use crate::utils::solve_linear_system;
use chrono::NaiveDate;
use statrs::distribution::{ContinuousCDF, Normal};
use std::f64::consts::PI;
use tracing::debug;

const WEEKLY_PERIOD: f64 = 7.0;
const WEEKLY_ORDER: usize = 3;
const YEARLY_PERIOD: f64 = 365.25;
const YEARLY_ORDER: usize = 10;

/// Minimum history span (days) before a seasonality is switched on in auto mode
const WEEKLY_MIN_SPAN_DAYS: i64 = 14;
const YEARLY_MIN_SPAN_DAYS: i64 = 730;

/// Floor on every ridge penalty so near-collinear columns stay solvable
const MIN_PENALTY: f64 = 1e-6;

/// Whether a seasonal component is fitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonalityMode {
    /// Enabled when the history is long enough
    Auto,
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Component {
    Weekly,
    Yearly,
}

#[derive(Debug, Clone, PartialEq)]
struct Seasonality {
    component: Component,
    period: f64,
    order: usize,
}

impl Seasonality {
    fn width(&self) -> usize {
        2 * self.order
    }

    fn push_features(&self, epoch_days: f64, out: &mut Vec<f64>) {
        for i in 1..=self.order {
            let x = 2.0 * PI * i as f64 * epoch_days / self.period;
            out.push(x.sin());
            out.push(x.cos());
        }
    }
}

/// Untrained additive model configuration
#[derive(Debug, Clone)]
pub struct AdditiveModel {
    name: String,
    n_changepoints: usize,
    changepoint_range: f64,
    changepoint_prior_scale: f64,
    seasonality_prior_scale: f64,
    interval_width: f64,
    weekly: SeasonalityMode,
    yearly: SeasonalityMode,
}

/// Fitted additive model
#[derive(Debug, Clone)]
pub struct TrainedAdditiveModel {
    name: String,
    start: NaiveDate,
    span_days: f64,
    y_scale: f64,
    changepoints: Vec<f64>,
    seasonalities: Vec<Seasonality>,
    coefficients: Vec<f64>,
    /// Residual standard deviation on the scaled target
    sigma: f64,
    /// Standard-normal quantile for the interval width
    z: f64,
    history_dates: Vec<NaiveDate>,
}

impl Default for AdditiveModel {
    fn default() -> Self {
        Self {
            name: "Additive trend + seasonality".to_string(),
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            interval_width: 0.8,
            weekly: SeasonalityMode::Auto,
            yearly: SeasonalityMode::Auto,
        }
    }
}

impl AdditiveModel {
    /// Model with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of potential changepoints and the share of history they cover
    pub fn with_changepoints(mut self, n_changepoints: usize, changepoint_range: f64) -> Result<Self> {
        if !(changepoint_range > 0.0 && changepoint_range <= 1.0) {
            return Err(ForecastError::InvalidParameter(
                "Changepoint range must be in (0, 1]".to_string(),
            ));
        }
        self.n_changepoints = n_changepoints;
        self.changepoint_range = changepoint_range;
        Ok(self)
    }

    /// Prior scales for changepoint deltas and Fourier coefficients
    pub fn with_prior_scales(mut self, changepoint: f64, seasonality: f64) -> Result<Self> {
        if !(changepoint > 0.0 && seasonality > 0.0) {
            return Err(ForecastError::InvalidParameter(
                "Prior scales must be positive".to_string(),
            ));
        }
        self.changepoint_prior_scale = changepoint;
        self.seasonality_prior_scale = seasonality;
        Ok(self)
    }

    /// Coverage of the `yhat_lower`..`yhat_upper` band
    pub fn with_interval_width(mut self, interval_width: f64) -> Result<Self> {
        if !(interval_width > 0.0 && interval_width < 1.0) {
            return Err(ForecastError::InvalidParameter(
                "Interval width must be between 0 and 1".to_string(),
            ));
        }
        self.interval_width = interval_width;
        Ok(self)
    }

    pub fn with_weekly_seasonality(mut self, mode: SeasonalityMode) -> Self {
        self.weekly = mode;
        self
    }

    pub fn with_yearly_seasonality(mut self, mode: SeasonalityMode) -> Self {
        self.yearly = mode;
        self
    }

    fn seasonalities(&self, span_days: i64) -> Vec<Seasonality> {
        let enabled = |mode: SeasonalityMode, min_span: i64| match mode {
            SeasonalityMode::Auto => span_days >= min_span,
            SeasonalityMode::Enabled => true,
            SeasonalityMode::Disabled => false,
        };

        let mut seasonalities = Vec::new();
        if enabled(self.weekly, WEEKLY_MIN_SPAN_DAYS) {
            seasonalities.push(Seasonality {
                component: Component::Weekly,
                period: WEEKLY_PERIOD,
                order: WEEKLY_ORDER,
            });
        }
        if enabled(self.yearly, YEARLY_MIN_SPAN_DAYS) {
            seasonalities.push(Seasonality {
                component: Component::Yearly,
                period: YEARLY_PERIOD,
                order: YEARLY_ORDER,
            });
        }
        seasonalities
    }

    /// Changepoint times (scaled) evenly spaced over the first part of history
    fn changepoints(&self, t: &[f64]) -> Vec<f64> {
        let hist_size = (t.len() as f64 * self.changepoint_range).floor() as usize;
        let n = self.n_changepoints.min(hist_size.saturating_sub(1));
        if n == 0 {
            return Vec::new();
        }

        let step = (hist_size - 1) as f64 / n as f64;
        let mut changepoints: Vec<f64> = (1..=n)
            .map(|i| t[(i as f64 * step).round() as usize])
            .filter(|&c| c > 0.0 && c < 1.0)
            .collect();
        changepoints.dedup();
        changepoints
    }

    fn fit_coefficients(&self, design: &[Vec<f64>], y: &[f64], penalties: &[f64]) -> Result<Vec<f64>> {
        let p = penalties.len();
        let mut xtx = vec![vec![0.0; p]; p];
        let mut xty = vec![0.0; p];

        for (row, &target) in design.iter().zip(y) {
            for i in 0..p {
                if row[i] == 0.0 {
                    continue;
                }
                xty[i] += row[i] * target;
                for j in i..p {
                    xtx[i][j] += row[i] * row[j];
                }
            }
        }
        for i in 0..p {
            for j in 0..i {
                xtx[i][j] = xtx[j][i];
            }
            xtx[i][i] += penalties[i];
        }

        solve_linear_system(xtx, xty)
    }

    fn penalties(&self, noise_variance: f64, n_changepoints: usize, n_seasonal: usize) -> Vec<f64> {
        let changepoint = (noise_variance / self.changepoint_prior_scale.powi(2)).max(MIN_PENALTY);
        let seasonal = (noise_variance / self.seasonality_prior_scale.powi(2)).max(MIN_PENALTY);

        let mut penalties = vec![0.0, 0.0];
        penalties.extend(std::iter::repeat(changepoint).take(n_changepoints));
        penalties.extend(std::iter::repeat(seasonal).take(n_seasonal));
        penalties
    }
}

fn design_row(t: f64, epoch_days: f64, changepoints: &[f64], seasonalities: &[Seasonality]) -> Vec<f64> {
    let width: usize = seasonalities.iter().map(Seasonality::width).sum();
    let mut row = Vec::with_capacity(2 + changepoints.len() + width);
    row.push(1.0);
    row.push(t);
    row.extend(changepoints.iter().map(|&c| (t - c).max(0.0)));
    for seasonality in seasonalities {
        seasonality.push_features(epoch_days, &mut row);
    }
    row
}

fn mean_squared_residual(design: &[Vec<f64>], y: &[f64], coefficients: &[f64]) -> f64 {
    let rss: f64 = design
        .iter()
        .zip(y)
        .map(|(row, &target)| {
            let fitted: f64 = row.iter().zip(coefficients).map(|(x, c)| x * c).sum();
            (target - fitted).powi(2)
        })
        .sum();
    rss / y.len() as f64
}

impl ForecastModel for AdditiveModel {
    type Trained = TrainedAdditiveModel;

    fn train(&self, data: &TimeSeriesData) -> Result<Self::Trained> {
        if data.len() < 2 {
            return Err(ForecastError::InsufficientData(format!(
                "Need at least 2 observations, got {}",
                data.len()
            )));
        }

        let sorted = data.sorted_by_date();
        let dates = sorted.dates();
        let start = dates[0];
        let end = dates[dates.len() - 1];
        let span = (end - start).num_days();
        if span <= 0 {
            return Err(ForecastError::InsufficientData(
                "All observations share a single date".to_string(),
            ));
        }
        let span_days = span as f64;

        let y_scale = match sorted.values().iter().fold(0.0_f64, |m, v| m.max(v.abs())) {
            m if m > 0.0 => m,
            _ => 1.0,
        };
        let y: Vec<f64> = sorted.values().iter().map(|v| v / y_scale).collect();
        let t: Vec<f64> = dates
            .iter()
            .map(|d| (*d - start).num_days() as f64 / span_days)
            .collect();

        let changepoints = self.changepoints(&t);
        let seasonalities = self.seasonalities(span);
        let n_seasonal: usize = seasonalities.iter().map(Seasonality::width).sum();

        let design: Vec<Vec<f64>> = dates
            .iter()
            .zip(&t)
            .map(|(date, &ti)| {
                design_row(ti, date_to_epoch_days(*date) as f64, &changepoints, &seasonalities)
            })
            .collect();

        // First pass assumes all variance is noise, second uses the residuals
        let mean = y.iter().sum::<f64>() / y.len() as f64;
        let variance = y.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / y.len() as f64;
        let penalties = self.penalties(variance, changepoints.len(), n_seasonal);
        let first = self.fit_coefficients(&design, &y, &penalties)?;

        let residual_variance = mean_squared_residual(&design, &y, &first);
        let penalties = self.penalties(residual_variance, changepoints.len(), n_seasonal);
        let coefficients = self.fit_coefficients(&design, &y, &penalties)?;
        let sigma = mean_squared_residual(&design, &y, &coefficients).sqrt();

        let normal = Normal::new(0.0, 1.0).map_err(|e| ForecastError::ModelError(e.to_string()))?;
        let z = normal.inverse_cdf(0.5 + self.interval_width / 2.0);

        debug!(
            observations = y.len(),
            changepoints = changepoints.len(),
            seasonal_terms = n_seasonal,
            sigma = sigma * y_scale,
            "Fitted additive model"
        );

        Ok(TrainedAdditiveModel {
            name: self.name.clone(),
            start,
            span_days,
            y_scale,
            changepoints,
            seasonalities,
            coefficients,
            sigma,
            z,
            history_dates: sorted.unique_dates(),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedAdditiveModel {
    /// Number of trend changepoints kept after placement
    pub fn changepoint_count(&self) -> usize {
        self.changepoints.len()
    }

    pub fn has_weekly(&self) -> bool {
        self.seasonalities.iter().any(|s| s.component == Component::Weekly)
    }

    pub fn has_yearly(&self) -> bool {
        self.seasonalities.iter().any(|s| s.component == Component::Yearly)
    }

    /// Residual standard deviation in price units
    pub fn residual_std(&self) -> f64 {
        self.sigma * self.y_scale
    }
}

impl TrainedForecastModel for TrainedAdditiveModel {
    fn history_dates(&self) -> &[NaiveDate] {
        &self.history_dates
    }

    fn predict(&self, dates: &[NaiveDate]) -> Result<ForecastFrame> {
        let last = *self
            .history_dates
            .last()
            .ok_or_else(|| ForecastError::ModelError("Model has no history".to_string()))?;
        let n_history = self.history_dates.len() as f64;
        let trend_width = 2 + self.changepoints.len();

        let rows = dates
            .iter()
            .map(|&ds| {
                let t = (ds - self.start).num_days() as f64 / self.span_days;
                let row = design_row(
                    t,
                    date_to_epoch_days(ds) as f64,
                    &self.changepoints,
                    &self.seasonalities,
                );
                let dot = |range: std::ops::Range<usize>| -> f64 {
                    range.map(|i| row[i] * self.coefficients[i]).sum::<f64>() * self.y_scale
                };

                let trend = dot(0..trend_width);
                let mut weekly = None;
                let mut yearly = None;
                let mut offset = trend_width;
                for seasonality in &self.seasonalities {
                    let value = dot(offset..offset + seasonality.width());
                    offset += seasonality.width();
                    match seasonality.component {
                        Component::Weekly => weekly = Some(value),
                        Component::Yearly => yearly = Some(value),
                    }
                }

                let additive_terms = weekly.unwrap_or(0.0) + yearly.unwrap_or(0.0);
                let yhat = trend + additive_terms;
                let steps_ahead = (ds - last).num_days().max(0) as f64;
                let half_width =
                    self.z * self.sigma * self.y_scale * (1.0 + steps_ahead / n_history).sqrt();

                ForecastRow {
                    ds,
                    trend,
                    weekly,
                    yearly,
                    additive_terms,
                    yhat,
                    yhat_lower: yhat - half_width,
                    yhat_upper: yhat + half_width,
                }
            })
            .collect();

        let history_len = dates.iter().filter(|&&d| d <= last).count();
        Ok(ForecastFrame::new(rows, history_len))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Duration;

    fn linear_series(days: i64) -> TimeSeriesData {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let dates = (0..days).map(|i| start + Duration::days(i)).collect();
        let values = (0..days).map(|i| 100.0 + 0.5 * i as f64).collect();
        TimeSeriesData::new(dates, values).unwrap()
    }

    #[test]
    fn test_changepoint_placement() {
        let model = AdditiveModel::new();
        let t: Vec<f64> = (0..101).map(|i| i as f64 / 100.0).collect();
        let changepoints = model.changepoints(&t);
        assert_eq!(changepoints.len(), 25);
        assert!(changepoints.iter().all(|&c| c > 0.0 && c <= 0.8));

        // Short history keeps fewer changepoints
        let short: Vec<f64> = (0..5).map(|i| i as f64 / 4.0).collect();
        assert_eq!(model.changepoints(&short).len(), 3);
        assert!(model.changepoints(&short[..2]).is_empty());
    }

    #[test]
    fn test_auto_seasonalities() {
        let model = AdditiveModel::new();
        assert!(model.seasonalities(10).is_empty());
        assert_eq!(model.seasonalities(30).len(), 1);
        assert_eq!(model.seasonalities(800).len(), 2);

        let forced = AdditiveModel::new()
            .with_weekly_seasonality(SeasonalityMode::Disabled)
            .with_yearly_seasonality(SeasonalityMode::Enabled);
        let seasonalities = forced.seasonalities(30);
        assert_eq!(seasonalities.len(), 1);
        assert_eq!(seasonalities[0].component, Component::Yearly);
    }

    #[test]
    fn test_fits_linear_trend() {
        let data = linear_series(60);
        let trained = AdditiveModel::new().train(&data).unwrap();
        let frame = trained.predict(&trained.make_future_dates(10)).unwrap();

        assert_eq!(frame.len(), 70);
        assert_eq!(frame.history_len(), 60);
        assert!(frame.mean_absolute_error(&data).unwrap() < 0.5);
        assert_eq!(trained.changepoint_count(), 25);
        assert!(trained.residual_std() < 0.5);

        // Extrapolation keeps rising
        let future = frame.future();
        assert_eq!(future.len(), 10);
        assert!(future[9].yhat > future[0].yhat);
        assert!(future.iter().all(|row| row.yhat_lower <= row.yhat && row.yhat <= row.yhat_upper));
    }

    #[test]
    fn test_interval_widens_with_horizon() {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let dates: Vec<NaiveDate> = (0..40).map(|i| start + Duration::days(i)).collect();
        let values = (0..40).map(|i| 50.0 + if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let data = TimeSeriesData::new(dates, values).unwrap();

        let trained = AdditiveModel::new()
            .with_weekly_seasonality(SeasonalityMode::Disabled)
            .train(&data)
            .unwrap();
        let frame = trained.predict(&trained.make_future_dates(30)).unwrap();
        let rows = frame.rows();
        let width = |row: &ForecastRow| row.yhat_upper - row.yhat_lower;
        assert!(width(&rows[69]) > width(&rows[40]));
        assert_relative_eq!(width(&rows[0]), width(&rows[39]), epsilon = 1e-9);
    }

    #[test]
    fn test_components_add_up() {
        let data = linear_series(800);
        let trained = AdditiveModel::new().train(&data).unwrap();
        assert!(trained.has_weekly());
        assert!(trained.has_yearly());

        let frame = trained.predict(&trained.make_future_dates(5)).unwrap();
        for row in frame.rows() {
            let sum = row.trend + row.weekly.unwrap() + row.yearly.unwrap();
            assert_relative_eq!(row.yhat, sum, epsilon = 1e-9);
            assert_relative_eq!(row.additive_terms, sum - row.trend, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_insufficient_data() {
        let date = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let one = TimeSeriesData::new(vec![date], vec![1.0]).unwrap();
        assert!(matches!(
            AdditiveModel::new().train(&one),
            Err(ForecastError::InsufficientData(_))
        ));

        let same_day = TimeSeriesData::new(vec![date, date], vec![1.0, 2.0]).unwrap();
        assert!(matches!(
            AdditiveModel::new().train(&same_day),
            Err(ForecastError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_parameter_validation() {
        assert!(AdditiveModel::new().with_interval_width(1.0).is_err());
        assert!(AdditiveModel::new().with_interval_width(0.95).is_ok());
        assert!(AdditiveModel::new().with_changepoints(10, 0.0).is_err());
        assert!(AdditiveModel::new().with_prior_scales(-1.0, 10.0).is_err());
    }
}
