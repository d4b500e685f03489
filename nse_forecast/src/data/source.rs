//! Readers turning uploaded bytes into a header row plus string cells.

use crate::data::coerce::DATE_FORMAT;
use crate::error::{ForecastError, Result};
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;

/// Input file format, sniffed from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Txt,
    Xlsx,
}

impl SourceFormat {
    /// Detect the format from a file name such as `NIFTY.csv`
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "txt" => Ok(SourceFormat::Txt),
            "xlsx" => Ok(SourceFormat::Xlsx),
            _ => Err(ForecastError::UnsupportedFormat(format!(
                "'{}' (expected .csv, .txt or .xlsx)",
                file_name
            ))),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SourceFormat::Csv => "csv",
            SourceFormat::Txt => "txt",
            SourceFormat::Xlsx => "xlsx",
        }
    }
}

/// Header row and data rows as raw strings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGrid {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Read the bytes of an upload in the given format
pub fn read_grid(format: SourceFormat, bytes: &[u8]) -> Result<RawGrid> {
    match format {
        SourceFormat::Csv => read_delimited(bytes, b','),
        SourceFormat::Txt => read_delimited(bytes, sniff_delimiter(bytes)),
        SourceFormat::Xlsx => read_xlsx(bytes),
    }
}

/// Tab when the header line has tabs and no commas, comma otherwise
fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let header = bytes.split(|&b| b == b'\n').next().unwrap_or_default();
    let has_tab = header.contains(&b'\t');
    let has_comma = header.contains(&b',');
    if has_tab && !has_comma {
        b'\t'
    } else {
        b','
    }
}

fn read_delimited(bytes: &[u8], delimiter: u8) -> Result<RawGrid> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(bytes);

    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawGrid { headers, rows })
}

fn read_xlsx(bytes: &[u8]) -> Result<RawGrid> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ForecastError::SpreadsheetError("workbook has no worksheets".to_string()))??;

    let mut sheet_rows = range.rows();
    let headers = match sheet_rows.next() {
        Some(row) => row.iter().map(cell_to_string).collect(),
        None => return Err(ForecastError::EmptyDataset),
    };
    let rows = sheet_rows
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    Ok(RawGrid { headers, rows })
}

/// Render a spreadsheet cell the way it would appear in a CSV export
pub(crate) fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => datetime.date().format(DATE_FORMAT).to_string(),
            None => dt.as_f64().to_string(),
        },
        other => other.to_string(),
    }
}
