//! Moving average calculation implementations
//!
//! Contains the exponential moving average used by the oscillators:
//! - Exponential Moving Average (EMA), span or alpha parameterised
//! - `ema_series` helper producing a value-per-input series

use crate::{MathError, Result};

/// Exponential Moving Average (EMA) implementation
///
/// The average is seeded with the first observation and then follows the
/// recursion `ema = alpha * value + (1 - alpha) * ema`. A value is only
/// reported once `min_periods` observations have been seen.
#[derive(Debug, Clone)]
pub struct ExponentialMovingAverage {
    alpha: f64,
    min_periods: usize,
    current_ema: Option<f64>,
    values_seen: usize,
}

impl ExponentialMovingAverage {
    /// Create a new EMA from a span, `alpha = 2 / (span + 1)`
    pub fn new(span: usize) -> Result<Self> {
        if span == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }

        Self::with_alpha(2.0 / (span as f64 + 1.0), span)
    }

    /// Create a new EMA with an explicit smoothing factor
    pub fn with_alpha(alpha: f64, min_periods: usize) -> Result<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(MathError::InvalidInput(format!(
                "Alpha must be in (0, 1], got {}",
                alpha
            )));
        }
        if min_periods == 0 {
            return Err(MathError::InvalidInput(
                "Minimum periods must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            alpha,
            min_periods,
            current_ema: None,
            values_seen: 0,
        })
    }

    /// Update the EMA with a new value
    pub fn update(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(MathError::InvalidInput(format!(
                "EMA input must be finite, got {}",
                value
            )));
        }

        self.values_seen += 1;
        self.current_ema = Some(match self.current_ema {
            None => value,
            Some(current) => (value - current) * self.alpha + current,
        });

        Ok(())
    }

    /// Get the current EMA value
    pub fn value(&self) -> Result<f64> {
        match self.current_ema {
            Some(ema) if self.values_seen >= self.min_periods => Ok(ema),
            _ => Err(MathError::InsufficientData(format!(
                "Not enough data for EMA calculation. Need {} values, have {}.",
                self.min_periods, self.values_seen
            ))),
        }
    }

    /// Number of observations required before a value is reported
    pub fn period(&self) -> usize {
        self.min_periods
    }

    /// Smoothing factor
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Reset the EMA, clearing all values
    pub fn reset(&mut self) {
        self.current_ema = None;
        self.values_seen = 0;
    }
}

/// EMA over a whole series; `None` until the span is filled
pub fn ema_series(values: &[f64], span: usize) -> Result<Vec<Option<f64>>> {
    let mut ema = ExponentialMovingAverage::new(span)?;
    let mut out = Vec::with_capacity(values.len());
    for &value in values {
        ema.update(value)?;
        out.push(ema.value().ok());
    }
    Ok(out)
}
