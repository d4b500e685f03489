use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use nse_dashboard::api::{self, error::INVALID_DATASET_WARNING};
use nse_dashboard::ServerConfig;
use pretty_assertions::assert_eq;
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "nse-test-boundary";
const HEADER: &str = "DATE ,EXPIRY DATE ,OPEN PRICE ,HIGH PRICE ,LOW PRICE ,CLOSE PRICE ,LAST PRICE ,SETTLE PRICE ,Volume ,VALUE ,PREMIUM VALUE ,OPEN INTEREST ,CHANGE IN OI ";

/// `rows` consecutive days starting 01-Jan-2021, close `"1,234.50"` on the first
fn csv_fixture(rows: usize) -> String {
    let start = chrono::NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
    let mut out = format!("{HEADER}\n");
    for i in 0..rows {
        let date = start + chrono::Duration::days(i as i64);
        let close = 1234.5 + i as f64 + (i % 5) as f64;
        let close_cell = if i == 0 {
            "\"1,234.50\"".to_string()
        } else {
            format!("{close:.2}")
        };
        out.push_str(&format!(
            "{},30-Dec-2021,{:.2},{:.2},{:.2},{},{:.2},{:.2},{},{:.2},0,{},{}\n",
            date.format("%d-%b-%Y"),
            close - 2.0,
            close + 5.0,
            close - 5.0,
            close_cell,
            close,
            close,
            1000 + i,
            close * 50.0,
            4000 + i,
            -3
        ));
    }
    out
}

fn app() -> Router {
    api::router(&ServerConfig::default())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn create_session(app: &Router) -> String {
    let request = Request::post("/api/sessions").body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::CREATED);
    body["session_id"].as_str().unwrap().to_string()
}

/// Multipart upload; `file` of `None` sends the form without a file
async fn upload(app: &Router, session: &str, file: Option<(&str, &str)>) -> (StatusCode, Value) {
    let mut body = String::new();
    match file {
        Some((name, contents)) => {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\nContent-Type: text/csv\r\n\r\n{contents}\r\n"
            ));
        }
        None => {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"\"\r\nContent-Type: application/octet-stream\r\n\r\n\r\n"
            ));
        }
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/sessions/{session}/upload"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

#[tokio::test]
async fn test_health_and_pages() {
    let app = app();

    let response = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"ok");

    let (status, pages) = get(&app, "/api/pages").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        pages,
        serde_json::json!(["Forecast for Days", "Forecast for Years"])
    );
}

#[tokio::test]
async fn test_index_page() {
    let response = app()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Show forecast data"));
    assert!(html.contains(".csv,.txt,.xlsx"));
}

#[tokio::test]
async fn test_upload_then_views() {
    let app = app();
    let session = create_session(&app).await;

    let (status, summary) = upload(&app, &session, Some(("NIFTY.csv", &csv_fixture(60)))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["loaded"], true);
    assert_eq!(summary["rows"], 60);
    assert_eq!(summary["format"], "csv");
    assert_eq!(summary["preview"].as_array().unwrap().len(), 5);
    assert_eq!(summary["preview"][0]["close"], 1234.5);
    assert_eq!(summary["columns"][0], "date");
    assert_eq!(summary["coercion"]["rows"], 60);

    let (status, raw) = get(&app, &format!("/api/sessions/{session}/raw")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(raw["layout"]["title"]["text"], "Time Series data with Rangeslider");
    assert_eq!(raw["data"][0]["name"], "stock_open");
    assert_eq!(raw["data"][1]["name"], "stock_close");

    let (status, days) = get(&app, &format!("/api/sessions/{session}/forecast/days?days=7")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(days["forecast"]["rows"].as_array().unwrap().len(), 67);
    assert_eq!(
        days["caption"],
        "Forecasting closing of stock value for a period of 7 days"
    );

    let (status, years) = get(&app, &format!("/api/sessions/{session}/forecast/years?years=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(years["detail"], Value::Null);
    assert_eq!(
        years["macd_figure"]["layout"]["title"]["text"],
        "Stock Moving Average Convergence Divergence (MACD) = Close"
    );

    let (status, years) = get(
        &app,
        &format!("/api/sessions/{session}/forecast/years?years=1&detail=true"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        years["detail"]["forecast"]["rows"].as_array().unwrap().len(),
        60 + 365
    );
}

#[tokio::test]
async fn test_horizon_out_of_range() {
    let app = app();
    let session = create_session(&app).await;
    upload(&app, &session, Some(("NIFTY.csv", &csv_fixture(30)))).await;

    for uri in [
        format!("/api/sessions/{session}/forecast/days?days=0"),
        format!("/api/sessions/{session}/forecast/days?days=32"),
        format!("/api/sessions/{session}/forecast/years?years=11"),
    ] {
        let (status, _) = get(&app, &uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn test_upload_without_file() {
    let app = app();
    let session = create_session(&app).await;

    let (status, summary) = upload(&app, &session, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary, serde_json::json!({ "loaded": false }));

    let (status, _) = get(&app, &format!("/api/sessions/{session}/raw")).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_invalid_upload_clears_the_table() {
    let app = app();
    let session = create_session(&app).await;
    upload(&app, &session, Some(("NIFTY.csv", &csv_fixture(10)))).await;

    let broken = "DATE ,CLOSE PRICE \n01-Jan-2021,1\n";
    let (status, body) = upload(&app, &session, Some(("broken.csv", broken))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], INVALID_DATASET_WARNING);
    assert!(body["detail"].as_str().unwrap().contains("Missing required column"));

    let (status, _) = get(&app, &format!("/api/sessions/{session}/raw")).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_oversized_upload_clears_the_table() {
    let config = ServerConfig {
        max_upload_mb: 1,
        ..ServerConfig::default()
    };
    let app = api::router(&config);
    let session = create_session(&app).await;
    let (status, _) = upload(&app, &session, Some(("NIFTY.csv", &csv_fixture(10)))).await;
    assert_eq!(status, StatusCode::OK);

    let oversized = csv_fixture(10) + "x".repeat(2 * 1024 * 1024).as_str();
    let (status, body) = upload(&app, &session, Some(("big.csv", &oversized))).await;
    assert!(status.is_client_error(), "{status}");
    assert!(body["error"].as_str().unwrap().starts_with("multipart error"));

    let (status, _) = get(&app, &format!("/api/sessions/{session}/raw")).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_view_failure_keeps_the_table() {
    let app = app();
    let session = create_session(&app).await;
    let gappy = csv_fixture(30).replacen("\"1,234.50\"", "", 1);
    let (status, summary) = upload(&app, &session, Some(("gappy.csv", &gappy))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["coercion"]["nulls"]["close"], 1);

    let (status, body) = get(&app, &format!("/api/sessions/{session}/forecast/days?days=3")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("row 1"));

    let (status, _) = get(&app, &format!("/api/sessions/{session}/raw")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_and_deleted_sessions() {
    let app = app();
    let unknown = uuid::Uuid::new_v4();
    let (status, _) = get(&app, &format!("/api/sessions/{unknown}/raw")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let session = create_session(&app).await;
    let delete = || {
        Request::builder()
            .method(Method::DELETE)
            .uri(format!("/api/sessions/{session}"))
            .body(Body::empty())
            .unwrap()
    };
    let (status, _) = send(&app, delete()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, delete()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&app, &format!("/api/sessions/{session}/raw")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
