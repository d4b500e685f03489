use nse_forecast::ForecastError;
use std::io;

#[test]
fn test_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let forecast_error = ForecastError::from(io_error);
    assert!(matches!(forecast_error, ForecastError::IoError(_)));

    let math_error = trade_math::MathError::InvalidInput("window".to_string());
    let forecast_error = ForecastError::from(math_error);
    assert!(matches!(forecast_error, ForecastError::IndicatorError(_)));
}

#[test]
fn test_error_display() {
    let error = ForecastError::InvalidParameter("Days horizon must be between 1 and 31".to_string());
    assert_eq!(
        error.to_string(),
        "Invalid parameter: Days horizon must be between 1 and 31"
    );

    let error = ForecastError::DateParse {
        column: "expiry_date".to_string(),
        row: 3,
        value: "2021/01/28".to_string(),
    };
    let message = error.to_string();
    assert!(message.contains("expiry_date"));
    assert!(message.contains("row 3"));
    assert!(message.contains("2021/01/28"));
}

#[test]
fn test_invalid_dataset_classification() {
    assert!(ForecastError::EmptyDataset.is_invalid_dataset());
    assert!(ForecastError::MissingColumn("DATE".to_string()).is_invalid_dataset());
    assert!(ForecastError::UnsupportedFormat("x.pdf".to_string()).is_invalid_dataset());
    assert!(ForecastError::SpreadsheetError("zip".to_string()).is_invalid_dataset());

    assert!(!ForecastError::InvalidClose { row: 1 }.is_invalid_dataset());
    assert!(!ForecastError::ModelError("singular".to_string()).is_invalid_dataset());
    assert!(!ForecastError::InvalidParameter("days".to_string()).is_invalid_dataset());
}
