//! Cell-level parsing shared by every numeric and date column.
//!
//! All numeric cells go through the same decimal policy: surrounding
//! whitespace is trimmed, thousands separators are stripped, and the rest
//! must parse as a finite number. Cells that fail become `None`.

use chrono::{Datelike, NaiveDate};

/// Day-month-year pattern used by the exchange exports, e.g. `15-Jan-2021`
pub const DATE_FORMAT: &str = "%d-%b-%Y";

/// Days from 0001-01-01 (CE day 1) to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Parse a decimal cell, stripping thousands separators
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let cleaned = strip_separators(raw)?;
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an integer cell; integral decimals such as `1,000.00` are accepted
pub fn parse_integer(raw: &str) -> Option<i64> {
    let cleaned = strip_separators(raw)?;
    if let Ok(value) = cleaned.parse::<i64>() {
        return Some(value);
    }

    let value = cleaned.parse::<f64>().ok().filter(|v| v.is_finite())?;
    if value.fract() != 0.0 || value.abs() > i64::MAX as f64 {
        return None;
    }
    Some(value as i64)
}

/// Parse a `DD-Mon-YYYY` date cell
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// Format a date back into the source `DD-Mon-YYYY` pattern
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Days since the Unix epoch, the physical representation of a polars `Date`
pub fn date_to_epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Inverse of [`date_to_epoch_days`]
pub fn epoch_days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

fn strip_separators(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return None;
    }
    Some(trimmed.replace(',', ""))
}
