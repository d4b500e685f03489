#![allow(dead_code)]

use chrono::{Datelike, Duration, NaiveDate};
use nse_forecast::data::coerce::{format_date, parse_decimal};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

pub const HEADER: [&str; 13] = [
    "DATE ",
    "EXPIRY DATE ",
    "OPEN PRICE ",
    "HIGH PRICE ",
    "LOW PRICE ",
    "CLOSE PRICE ",
    "LAST PRICE ",
    "SETTLE PRICE ",
    "Volume ",
    "VALUE ",
    "PREMIUM VALUE ",
    "OPEN INTEREST ",
    "CHANGE IN OI ",
];

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()
}

/// Close price of row `i` in the generated fixtures
pub fn close_at(i: usize) -> f64 {
    1234.5 + i as f64 * 1.5 + (i % 7) as f64 * 2.0
}

/// Cells of one exchange row with the close formatted like the exchange does
pub fn row_cells(i: usize) -> Vec<String> {
    let date = start_date() + Duration::days(i as i64);
    let expiry = NaiveDate::from_ymd_opt(2021, 12, 30).unwrap();
    let close = close_at(i);
    vec![
        format_date(date),
        format_date(expiry),
        format!("{:.2}", close - 3.0),
        format!("{:.2}", close + 10.0),
        format!("{:.2}", close - 10.0),
        with_thousands(close),
        format!("{:.2}", close),
        format!("{:.2}", close),
        format!("{}", 1000 + i * 10),
        format!("{:.2}", close * 75.0),
        "0.00".to_string(),
        format!("{}", 5000 + i),
        "-12".to_string(),
    ]
}

/// `1234.5` -> `1,234.50`
pub fn with_thousands(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    let (whole, fraction) = formatted.split_once('.').unwrap();
    let mut grouped = String::new();
    for (index, ch) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}.{}", grouped, fraction)
}

fn quote(cell: &str) -> String {
    if cell.contains(',') {
        format!("\"{}\"", cell)
    } else {
        cell.to_string()
    }
}

/// A comma-separated export with `rows` consecutive trading days
pub fn csv_fixture(rows: usize) -> String {
    let mut out = HEADER.join(",");
    out.push('\n');
    for i in 0..rows {
        let cells: Vec<String> = row_cells(i).iter().map(|c| quote(c)).collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

/// The same export, tab separated
pub fn tsv_fixture(rows: usize) -> String {
    let mut out = HEADER.join("\t");
    out.push('\n');
    for i in 0..rows {
        out.push_str(&row_cells(i).join("\t"));
        out.push('\n');
    }
    out
}

/// The same export as a workbook.
///
/// With `native_cells` the date columns are Excel dates and the numeric
/// columns are numbers, otherwise every cell is a string.
pub fn xlsx_fixture(rows: usize, native_cells: bool) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("dd-mmm-yyyy");
    let sheet = workbook.add_worksheet();

    for (col, header) in HEADER.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    for i in 0..rows {
        let row = i as u32 + 1;
        let date = start_date() + Duration::days(i as i64);
        let expiry = NaiveDate::from_ymd_opt(2021, 12, 30).unwrap();
        for (col, cell) in row_cells(i).iter().enumerate() {
            let col = col as u16;
            if !native_cells {
                sheet.write_string(row, col, cell).unwrap();
                continue;
            }
            match col {
                0 | 1 => {
                    let day = if col == 0 { date } else { expiry };
                    let excel_date =
                        ExcelDateTime::from_ymd(day.year() as u16, day.month() as u8, day.day() as u8)
                            .unwrap();
                    sheet
                        .write_datetime_with_format(row, col, &excel_date, &date_format)
                        .unwrap();
                }
                _ => {
                    sheet.write_number(row, col, parse_decimal(cell).unwrap()).unwrap();
                }
            }
        }
    }

    workbook.save_to_buffer().unwrap()
}
