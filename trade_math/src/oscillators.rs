//! Oscillator indicator implementations
//!
//! Contains implementations of the momentum oscillators drawn on the
//! long-horizon page:
//! - Relative Strength Index (RSI), Wilder smoothing
//! - Moving Average Convergence Divergence (MACD)

use crate::moving_averages::ExponentialMovingAverage;
use crate::{MathError, Result};

/// Default RSI look-back window
pub const DEFAULT_RSI_WINDOW: usize = 14;
/// Default MACD fast EMA span
pub const DEFAULT_MACD_FAST: usize = 12;
/// Default MACD slow EMA span
pub const DEFAULT_MACD_SLOW: usize = 26;
/// Default MACD signal EMA span
pub const DEFAULT_MACD_SIGNAL: usize = 9;

/// Relative Strength Index (RSI) implementation
///
/// Gains and losses are smoothed with an EMA of `alpha = 1 / window`.
/// The first price counts as a zero change, so the first value is
/// available once `window` prices have been seen.
#[derive(Debug, Clone)]
pub struct RelativeStrengthIndex {
    window: usize,
    previous_price: Option<f64>,
    avg_gain: ExponentialMovingAverage,
    avg_loss: ExponentialMovingAverage,
}

impl RelativeStrengthIndex {
    /// Create a new RSI with the specified window
    pub fn new(window: usize) -> Result<Self> {
        if window == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }

        let alpha = 1.0 / window as f64;
        Ok(Self {
            window,
            previous_price: None,
            avg_gain: ExponentialMovingAverage::with_alpha(alpha, window)?,
            avg_loss: ExponentialMovingAverage::with_alpha(alpha, window)?,
        })
    }

    /// Update the RSI with a new price value
    pub fn update(&mut self, price: f64) -> Result<()> {
        if !price.is_finite() {
            return Err(MathError::InvalidInput(format!(
                "RSI input must be finite, got {}",
                price
            )));
        }

        let change = self.previous_price.map_or(0.0, |prev_price| price - prev_price);
        self.avg_gain.update(change.max(0.0))?;
        self.avg_loss.update((-change).max(0.0))?;
        self.previous_price = Some(price);

        Ok(())
    }

    /// Get the current RSI value (0-100)
    pub fn value(&self) -> Result<f64> {
        let (avg_gain, avg_loss) = match (self.avg_gain.value(), self.avg_loss.value()) {
            (Ok(gain), Ok(loss)) => (gain, loss),
            _ => {
                return Err(MathError::InsufficientData(format!(
                    "Not enough data for RSI calculation. Need {} values.",
                    self.window
                )))
            }
        };

        if avg_loss == 0.0 {
            return Ok(100.0);
        }

        let rs = avg_gain / avg_loss;
        Ok(100.0 - (100.0 / (1.0 + rs)))
    }

    /// Get the look-back window
    pub fn period(&self) -> usize {
        self.window
    }

    /// Reset the RSI, clearing all values
    pub fn reset(&mut self) {
        self.previous_price = None;
        self.avg_gain.reset();
        self.avg_loss.reset();
    }
}

/// Moving Average Convergence Divergence (MACD) implementation
#[derive(Debug, Clone)]
pub struct Macd {
    fast_ema: ExponentialMovingAverage,
    slow_ema: ExponentialMovingAverage,
    signal_ema: ExponentialMovingAverage,
    signal_period: usize,
}

impl Macd {
    /// Create a new MACD with the specified spans
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Result<Self> {
        if fast_period >= slow_period {
            return Err(MathError::InvalidInput(
                "Fast period must be smaller than slow period".to_string(),
            ));
        }

        if signal_period == 0 {
            return Err(MathError::InvalidInput(
                "Signal period must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            fast_ema: ExponentialMovingAverage::new(fast_period)?,
            slow_ema: ExponentialMovingAverage::new(slow_period)?,
            signal_ema: ExponentialMovingAverage::new(signal_period)?,
            signal_period,
        })
    }

    /// Update the MACD with a new price value
    pub fn update(&mut self, price: f64) -> Result<()> {
        self.fast_ema.update(price)?;
        self.slow_ema.update(price)?;

        // The signal line only starts once the MACD line exists
        if let Ok(macd_value) = self.macd_value() {
            self.signal_ema.update(macd_value)?;
        }

        Ok(())
    }

    /// Get the current MACD line value (fast EMA - slow EMA)
    pub fn macd_value(&self) -> Result<f64> {
        match (self.fast_ema.value(), self.slow_ema.value()) {
            (Ok(fast), Ok(slow)) => Ok(fast - slow),
            _ => Err(MathError::InsufficientData(
                "Not enough data to calculate MACD line".to_string(),
            )),
        }
    }

    /// Get the current signal line value (EMA of MACD)
    pub fn signal_value(&self) -> Result<f64> {
        self.signal_ema.value().map_err(|_| {
            MathError::InsufficientData("Not enough data to calculate signal line".to_string())
        })
    }

    /// Get the current histogram value (MACD line - signal line)
    pub fn histogram(&self) -> Result<f64> {
        Ok(self.macd_value()? - self.signal_value()?)
    }

    /// Get the fast period
    pub fn fast_period(&self) -> usize {
        self.fast_ema.period()
    }

    /// Get the slow period
    pub fn slow_period(&self) -> usize {
        self.slow_ema.period()
    }

    /// Get the signal period
    pub fn signal_period(&self) -> usize {
        self.signal_period
    }

    /// Reset the MACD, clearing all values
    pub fn reset(&mut self) {
        self.fast_ema.reset();
        self.slow_ema.reset();
        self.signal_ema.reset();
    }
}

/// MACD line for every price, `None` until the slow span is filled
pub fn macd_series(prices: &[f64], fast_period: usize, slow_period: usize) -> Result<Vec<Option<f64>>> {
    let mut macd = Macd::new(fast_period, slow_period, DEFAULT_MACD_SIGNAL)?;
    let mut out = Vec::with_capacity(prices.len());
    for &price in prices {
        macd.update(price)?;
        out.push(macd.macd_value().ok());
    }
    Ok(out)
}

/// RSI for every price, `None` for the first `window - 1` prices
pub fn rsi_series(prices: &[f64], window: usize) -> Result<Vec<Option<f64>>> {
    let mut rsi = RelativeStrengthIndex::new(window)?;
    let mut out = Vec::with_capacity(prices.len());
    for &price in prices {
        rsi.update(price)?;
        out.push(rsi.value().ok());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rsi_calculation() {
        let mut rsi = RelativeStrengthIndex::new(3).unwrap();

        rsi.update(10.0).unwrap();
        rsi.update(10.5).unwrap();
        assert!(rsi.value().is_err());
        rsi.update(11.0).unwrap();
        rsi.update(10.5).unwrap();

        let rsi_value = rsi.value().unwrap();
        assert!((0.0..=100.0).contains(&rsi_value));

        // Downtrend: should produce lower RSI
        rsi.update(10.0).unwrap();
        let new_rsi_value = rsi.value().unwrap();
        assert!(new_rsi_value < rsi_value);
    }

    #[test]
    fn test_rsi_wilder_values() {
        // Changes: 0, +1, +1, -1 with alpha = 1/3
        // gains: 0 -> 1/3 -> 5/9 -> 10/27, losses: 0 -> 0 -> 0 -> 1/3
        let mut rsi = RelativeStrengthIndex::new(3).unwrap();
        for price in [10.0, 11.0, 12.0, 11.0] {
            rsi.update(price).unwrap();
        }
        let expected = 100.0 - 100.0 / (1.0 + (10.0 / 27.0) / (1.0 / 3.0));
        assert_relative_eq!(rsi.value().unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_rsi_no_losses_is_100() {
        let series = rsi_series(&[1.0, 2.0, 3.0, 4.0, 5.0], 3).unwrap();
        assert_eq!(series[1], None);
        assert_eq!(series[2], Some(100.0));
        assert_eq!(series[4], Some(100.0));
    }

    #[test]
    fn test_rsi_series_warmup() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 0.7).sin()).collect();
        let series = rsi_series(&prices, DEFAULT_RSI_WINDOW).unwrap();
        assert_eq!(series.len(), prices.len());
        assert!(series[..DEFAULT_RSI_WINDOW - 1].iter().all(Option::is_none));
        assert!(series[DEFAULT_RSI_WINDOW - 1..].iter().all(Option::is_some));
    }

    #[test]
    fn test_macd_calculation() {
        let mut macd = Macd::new(3, 6, 2).unwrap();

        for i in 0..10 {
            let price = 100.0 + i as f64 * 2.0;
            macd.update(price).unwrap();
        }

        // In an uptrend, MACD should be positive
        let macd_value = macd.macd_value().unwrap();
        assert!(macd_value > 0.0);

        let signal_value = macd.signal_value().unwrap();
        let histogram = macd.histogram().unwrap();
        assert_relative_eq!(histogram, macd_value - signal_value);
    }

    #[test]
    fn test_macd_series_warmup() {
        let prices: Vec<f64> = (0..40).map(|i| 50.0 + i as f64).collect();
        let series = macd_series(&prices, DEFAULT_MACD_FAST, DEFAULT_MACD_SLOW).unwrap();
        assert!(series[..DEFAULT_MACD_SLOW - 1].iter().all(Option::is_none));
        assert!(series[DEFAULT_MACD_SLOW - 1..].iter().all(Option::is_some));
    }

    #[test]
    fn test_macd_parameter_validation() {
        assert!(Macd::new(26, 12, 9).is_err());
        assert!(Macd::new(12, 26, 0).is_err());
        let macd = Macd::new(DEFAULT_MACD_FAST, DEFAULT_MACD_SLOW, DEFAULT_MACD_SIGNAL).unwrap();
        assert_eq!(macd.fast_period(), DEFAULT_MACD_FAST);
        assert_eq!(macd.slow_period(), DEFAULT_MACD_SLOW);
        assert_eq!(macd.signal_period(), DEFAULT_MACD_SIGNAL);
    }
}
