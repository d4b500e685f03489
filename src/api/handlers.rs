use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::api::types::{DaysQuery, SessionCreated, UploadSummary, YearsQuery};
use crate::session::SessionId;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::Json;
use nse_forecast::charts::Figure;
use nse_forecast::views::{self, DaysHorizon, DaysView, Page, YearsHorizon, YearsView};
use nse_forecast::{DataLoader, Upload};
use std::sync::Arc;
use tracing::{info, warn};

/// Multipart field carrying the uploaded file
const FILE_FIELD: &str = "file";

/// Run a synchronous view on the blocking pool
async fn run_blocking<T, F>(job: F) -> Result<T, ApiError>
where
    F: FnOnce() -> nse_forecast::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| ApiError::Internal(format!("view task failed: {e}")))?
        .map_err(ApiError::from)
}

pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn pages() -> Json<[Page; 2]> {
    Json(Page::ALL)
}

pub async fn create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionCreated>) {
    let session_id = state.sessions.create().await;
    (StatusCode::CREATED, Json(SessionCreated { session_id }))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Unknown session {id}")))
    }
}

/// First non-empty `file` field of the form, if any
async fn read_upload(multipart: &mut Multipart) -> Result<Option<Upload>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        if file_name.is_empty() && bytes.is_empty() {
            return Ok(None);
        }
        return Ok(Some(Upload::new(file_name, bytes.to_vec())));
    }
    Ok(None)
}

/// Replace the session's table with the uploaded file.
///
/// No file clears the table and reports `loaded: false`. A body that
/// cannot be read or a file that cannot be loaded also clears it.
pub async fn upload(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    mut multipart: Multipart,
) -> Result<Json<UploadSummary>, ApiError> {
    state.sessions.touch(id).await?;

    let upload = match read_upload(&mut multipart).await {
        Ok(upload) => upload,
        Err(err) => {
            warn!(session = %id, error = %err, "Upload body rejected");
            state.sessions.set_table(id, None).await?;
            return Err(err.into());
        }
    };

    let Some(upload) = upload else {
        state.sessions.set_table(id, None).await?;
        return Ok(Json(UploadSummary::not_loaded()));
    };

    let file_name = upload.file_name.clone();
    let preview_rows = state.preview_rows;
    let result = run_blocking(move || {
        let loaded = DataLoader::from_bytes(&upload.file_name, &upload.bytes)?;
        let summary = UploadSummary::from_loaded(&upload.file_name, &loaded, preview_rows)?;
        Ok((loaded, summary))
    })
    .await;

    match result {
        Ok((loaded, summary)) => {
            info!(session = %id, file = %file_name, rows = loaded.table.len(), "Dataset loaded");
            state.sessions.set_table(id, Some(Arc::new(loaded))).await?;
            Ok(Json(summary))
        }
        Err(err) => {
            warn!(session = %id, file = %file_name, error = ?err, "Upload rejected");
            state.sessions.set_table(id, None).await?;
            Err(err)
        }
    }
}

pub async fn raw(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> Result<Json<Figure>, ApiError> {
    let loaded = state.sessions.table(id).await?;
    let figure = run_blocking(move || views::plot_raw_data(&loaded.table)).await?;
    Ok(Json(figure))
}

pub async fn forecast_days(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<DaysView>, ApiError> {
    let horizon = match query.days {
        Some(days) => DaysHorizon::new(days)?,
        None => DaysHorizon::default(),
    };
    let loaded = state.sessions.table(id).await?;
    let view = run_blocking(move || views::forecast_for_days(&loaded.table, horizon)).await?;
    Ok(Json(view))
}

pub async fn forecast_years(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Query(query): Query<YearsQuery>,
) -> Result<Json<YearsView>, ApiError> {
    let horizon = match query.years {
        Some(years) => YearsHorizon::new(years)?,
        None => YearsHorizon::default(),
    };
    let detail = query.detail;
    let loaded = state.sessions.table(id).await?;
    let view =
        run_blocking(move || views::forecast_for_years(&loaded.table, horizon, detail)).await?;
    Ok(Json(view))
}
