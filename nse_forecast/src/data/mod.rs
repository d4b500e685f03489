//! Loading and normalisation of uploaded price files
//!
//! An upload (csv, txt or xlsx) is tokenised into a [`RawGrid`], the fixed
//! set of exchange headers is renamed to canonical snake_case names, dates
//! are parsed as `DD-Mon-YYYY` and numeric cells are coerced with the
//! decimal policy in [`coerce`]. The result is a [`PriceTable`] backed by a
//! polars `DataFrame` with exactly [`CANONICAL_COLUMNS`].

pub mod coerce;
pub mod source;

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, info_span};

pub use source::{RawGrid, SourceFormat};

/// How a canonical column is parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Date,
    Decimal,
    Integer,
}

/// Source header, canonical name and kind of every required column
pub const COLUMN_MAP: [(&str, &str, ColumnKind); 13] = [
    ("DATE ", "date", ColumnKind::Date),
    ("EXPIRY DATE ", "expiry_date", ColumnKind::Date),
    ("OPEN PRICE ", "open", ColumnKind::Decimal),
    ("HIGH PRICE ", "high", ColumnKind::Decimal),
    ("LOW PRICE ", "low", ColumnKind::Decimal),
    ("CLOSE PRICE ", "close", ColumnKind::Decimal),
    ("LAST PRICE ", "last", ColumnKind::Decimal),
    ("SETTLE PRICE ", "settle", ColumnKind::Decimal),
    ("Volume ", "volume", ColumnKind::Integer),
    ("VALUE ", "value", ColumnKind::Decimal),
    ("PREMIUM VALUE ", "premium_value", ColumnKind::Decimal),
    ("OPEN INTEREST ", "open_interest", ColumnKind::Integer),
    ("CHANGE IN OI ", "change_in_open_interest", ColumnKind::Integer),
];

/// Canonical column names, in table order
pub const CANONICAL_COLUMNS: [&str; 13] = [
    "date",
    "expiry_date",
    "open",
    "high",
    "low",
    "close",
    "last",
    "settle",
    "volume",
    "value",
    "premium_value",
    "open_interest",
    "change_in_open_interest",
];

/// An uploaded file: its client-side name and raw contents
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Per-column count of cells that failed numeric coercion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoercionReport {
    pub rows: usize,
    pub nulls: BTreeMap<String, usize>,
}

impl CoercionReport {
    /// True when every numeric cell parsed
    pub fn is_clean(&self) -> bool {
        self.nulls.values().all(|&count| count == 0)
    }

    pub fn total_nulls(&self) -> usize {
        self.nulls.values().sum()
    }
}

/// A normalised table together with how it was produced
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: PriceTable,
    pub report: CoercionReport,
    pub source: SourceFormat,
}

/// One row of a [`PriceTable`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub last: Option<f64>,
    pub settle: Option<f64>,
    pub volume: Option<i64>,
    pub value: Option<f64>,
    pub premium_value: Option<f64>,
    pub open_interest: Option<i64>,
    pub change_in_open_interest: Option<i64>,
}

/// Normalised price table with the canonical schema
#[derive(Debug, Clone)]
pub struct PriceTable {
    df: DataFrame,
}

/// `(date, value)` observations handed to a forecasting model
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesData {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

/// Data loader for uploaded price files
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load an optional upload; no upload yields `Ok(None)`
    pub fn load(upload: Option<Upload>) -> Result<Option<LoadedTable>> {
        match upload {
            Some(upload) => Self::from_bytes(&upload.file_name, &upload.bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Load a file from disk, format taken from its extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<LoadedTable> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_bytes(&file_name, &bytes)
    }

    /// Load raw bytes named `file_name`
    pub fn from_bytes(file_name: &str, bytes: &[u8]) -> Result<LoadedTable> {
        let span = info_span!("load_data", file = %file_name, bytes = bytes.len());
        let _guard = span.enter();
        info!("Loading data...");

        let source = SourceFormat::from_file_name(file_name)?;
        let grid = source::read_grid(source, bytes)?;
        let (table, report) = Self::from_grid(&grid)?;

        info!(
            rows = table.len(),
            format = source.extension(),
            coercion_nulls = report.total_nulls(),
            "Loaded dataset"
        );
        Ok(LoadedTable {
            table,
            report,
            source,
        })
    }

    /// Normalise an already tokenised grid
    pub fn from_grid(grid: &RawGrid) -> Result<(PriceTable, CoercionReport)> {
        Self::from_rows(&grid.headers, &grid.rows)
    }

    /// Rename, parse and coerce `rows` laid out under `headers`
    pub fn from_rows(headers: &[String], rows: &[Vec<String>]) -> Result<(PriceTable, CoercionReport)> {
        let positions = Self::resolve_columns(headers)?;

        let rows: Vec<&Vec<String>> = rows
            .iter()
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .collect();
        if rows.is_empty() {
            return Err(ForecastError::EmptyDataset);
        }

        let mut report = CoercionReport {
            rows: rows.len(),
            nulls: BTreeMap::new(),
        };
        let mut columns = Vec::with_capacity(COLUMN_MAP.len());

        for ((_, name, kind), &position) in COLUMN_MAP.iter().zip(positions.iter()) {
            let cells = rows
                .iter()
                .map(|row| row.get(position).map(String::as_str).unwrap_or(""));

            let series = match kind {
                ColumnKind::Date => {
                    let mut days = Vec::with_capacity(rows.len());
                    for (index, cell) in cells.enumerate() {
                        let date = coerce::parse_date(cell).ok_or_else(|| ForecastError::DateParse {
                            column: name.to_string(),
                            row: index + 1,
                            value: cell.to_string(),
                        })?;
                        days.push(coerce::date_to_epoch_days(date));
                    }
                    Series::new(name, days).cast(&DataType::Date)?
                }
                ColumnKind::Decimal => {
                    let values: Vec<Option<f64>> = cells.map(coerce::parse_decimal).collect();
                    report.nulls.insert(name.to_string(), count_nulls(&values));
                    Series::new(name, values)
                }
                ColumnKind::Integer => {
                    let values: Vec<Option<i64>> = cells.map(coerce::parse_integer).collect();
                    report.nulls.insert(name.to_string(), count_nulls(&values));
                    Series::new(name, values)
                }
            };
            columns.push(series);
        }

        if !report.is_clean() {
            debug!(nulls = ?report.nulls, "Numeric cells coerced to null");
        }

        let table = PriceTable::new(DataFrame::new(columns)?)?;
        Ok((table, report))
    }

    /// Index of each required source header, matched after trimming
    fn resolve_columns(headers: &[String]) -> Result<Vec<usize>> {
        let mut positions = Vec::with_capacity(COLUMN_MAP.len());
        for (source, canonical, _) in COLUMN_MAP.iter() {
            let wanted = source.trim();
            let position = headers
                .iter()
                .position(|header| header.trim() == wanted)
                .ok_or_else(|| {
                    ForecastError::MissingColumn(format!("'{}' (for {})", source, canonical))
                })?;
            positions.push(position);
        }

        let extra = headers.len().saturating_sub(COLUMN_MAP.len());
        if extra > 0 {
            debug!(extra, "Ignoring columns outside the canonical set");
        }
        Ok(positions)
    }
}

fn count_nulls<T>(values: &[Option<T>]) -> usize {
    values.iter().filter(|value| value.is_none()).count()
}

impl PriceTable {
    /// Wrap a DataFrame, checking it carries exactly the canonical columns
    pub fn new(df: DataFrame) -> Result<Self> {
        let names = df.get_column_names();
        if names.len() != CANONICAL_COLUMNS.len()
            || names.iter().zip(CANONICAL_COLUMNS.iter()).any(|(a, b)| a != b)
        {
            return Err(ForecastError::DataError(format!(
                "Expected columns {:?}, found {:?}",
                CANONICAL_COLUMNS, names
            )));
        }
        Ok(Self { df })
    }

    /// Get the DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Column names in table order
    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Get the number of rows
    pub fn len(&self) -> usize {
        self.df.height()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Trade dates, in file order
    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        self.date_column("date")
    }

    /// Contract expiry dates, in file order
    pub fn expiry_dates(&self) -> Result<Vec<NaiveDate>> {
        self.date_column("expiry_date")
    }

    /// Close prices, `None` where coercion failed
    pub fn closes(&self) -> Result<Vec<Option<f64>>> {
        self.decimal_column("close")
    }

    /// Open prices, `None` where coercion failed
    pub fn opens(&self) -> Result<Vec<Option<f64>>> {
        self.decimal_column("open")
    }

    /// A decimal column by canonical name
    pub fn decimal_column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let col = self.df.column(name)?;
        Ok(col.f64()?.into_iter().collect())
    }

    /// An integer column by canonical name
    pub fn integer_column(&self, name: &str) -> Result<Vec<Option<i64>>> {
        let col = self.df.column(name)?;
        Ok(col.i64()?.into_iter().collect())
    }

    fn date_column(&self, name: &str) -> Result<Vec<NaiveDate>> {
        let days = self.df.column(name)?.cast(&DataType::Int32)?;
        let dates: Result<Vec<NaiveDate>> = days
            .i32()?
            .into_iter()
            .enumerate()
            .map(|(index, days)| {
                days.and_then(coerce::epoch_days_to_date).ok_or_else(|| {
                    ForecastError::DataError(format!(
                        "Column '{}' has no date at row {}",
                        name,
                        index + 1
                    ))
                })
            })
            .collect();
        dates
    }

    /// `(date, close)` series for forecasting; every close must be present
    pub fn close_series(&self) -> Result<TimeSeriesData> {
        let dates = self.dates()?;
        let closes = self
            .closes()?
            .into_iter()
            .enumerate()
            .map(|(index, close)| close.ok_or(ForecastError::InvalidClose { row: index + 1 }))
            .collect::<Result<Vec<f64>>>()?;
        TimeSeriesData::new(dates, closes)
    }

    /// All rows as records
    pub fn records(&self) -> Result<Vec<PriceRecord>> {
        self.head(self.len())
    }

    /// The first `n` rows as records
    pub fn head(&self, n: usize) -> Result<Vec<PriceRecord>> {
        let n = n.min(self.len());
        let dates = self.dates()?;
        let expiry_dates = self.expiry_dates()?;
        let open = self.decimal_column("open")?;
        let high = self.decimal_column("high")?;
        let low = self.decimal_column("low")?;
        let close = self.decimal_column("close")?;
        let last = self.decimal_column("last")?;
        let settle = self.decimal_column("settle")?;
        let volume = self.integer_column("volume")?;
        let value = self.decimal_column("value")?;
        let premium_value = self.decimal_column("premium_value")?;
        let open_interest = self.integer_column("open_interest")?;
        let change_in_open_interest = self.integer_column("change_in_open_interest")?;

        Ok((0..n)
            .map(|i| PriceRecord {
                date: dates[i],
                expiry_date: expiry_dates[i],
                open: open[i],
                high: high[i],
                low: low[i],
                close: close[i],
                last: last[i],
                settle: settle[i],
                volume: volume[i],
                value: value[i],
                premium_value: premium_value[i],
                open_interest: open_interest[i],
                change_in_open_interest: change_in_open_interest[i],
            })
            .collect())
    }
}

impl TimeSeriesData {
    /// Create a series from parallel date and value vectors
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::DataError(format!(
                "Dates length ({}) doesn't match values length ({})",
                dates.len(),
                values.len()
            )));
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::DataError(format!(
                "Value at row {} is not finite",
                index + 1
            )));
        }
        Ok(Self { dates, values })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the length of the time series
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the time series is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy ordered by date; rows sharing a date keep their file order
    pub fn sorted_by_date(&self) -> Self {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by_key(|&i| self.dates[i]);
        Self {
            dates: order.iter().map(|&i| self.dates[i]).collect(),
            values: order.iter().map(|&i| self.values[i]).collect(),
        }
    }

    /// Distinct dates in ascending order
    pub fn unique_dates(&self) -> Vec<NaiveDate> {
        let mut dates = self.dates.clone();
        dates.sort();
        dates.dedup();
        dates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> Vec<String> {
        COLUMN_MAP.iter().map(|(source, _, _)| source.to_string()).collect()
    }

    fn row(date: &str, close: &str) -> Vec<String> {
        vec![
            date, "28-Jan-2021", "100", "110", "90", close, "101", "101", "1,000", "2.5", "0.5",
            "300", "-20",
        ]
        .into_iter()
        .map(str::to_string)
        .collect()
    }

    #[test]
    fn test_from_rows_canonical_schema() {
        let rows = vec![row("01-Jan-2021", "1,234.50"), row("04-Jan-2021", "1240")];
        let (table, report) = DataLoader::from_rows(&headers(), &rows).unwrap();

        assert_eq!(table.column_names(), CANONICAL_COLUMNS.to_vec());
        assert_eq!(table.len(), 2);
        assert!(report.is_clean());
        assert_eq!(table.closes().unwrap(), vec![Some(1234.5), Some(1240.0)]);
        assert_eq!(table.integer_column("volume").unwrap(), vec![Some(1000), Some(1000)]);
    }

    #[test]
    fn test_coercion_failures_are_counted() {
        let mut bad = row("01-Jan-2021", "oops");
        bad[8] = "n/a".to_string();
        let (table, report) = DataLoader::from_rows(&headers(), &[bad]).unwrap();

        assert_eq!(table.closes().unwrap(), vec![None]);
        assert_eq!(report.nulls["close"], 1);
        assert_eq!(report.nulls["volume"], 1);
        assert_eq!(report.total_nulls(), 2);
        assert!(matches!(table.close_series(), Err(ForecastError::InvalidClose { row: 1 })));
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let blank = vec![String::new(); 13];
        let (table, _) = DataLoader::from_rows(&headers(), &[row("01-Jan-2021", "1"), blank]).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_sorted_by_date_is_stable() {
        let d = |day| NaiveDate::from_ymd_opt(2021, 1, day).unwrap();
        let series = TimeSeriesData::new(vec![d(3), d(1), d(3), d(2)], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let sorted = series.sorted_by_date();
        assert_eq!(sorted.dates(), &[d(1), d(2), d(3), d(3)]);
        assert_eq!(sorted.values(), &[2.0, 4.0, 1.0, 3.0]);
        assert_eq!(series.unique_dates(), vec![d(1), d(2), d(3)]);
    }
}
