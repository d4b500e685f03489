use crate::session::SessionId;
use nse_forecast::data::{CoercionReport, PriceRecord, SourceFormat};
use nse_forecast::LoadedTable;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: SessionId,
}

/// Upload outcome; everything but `loaded` is absent when no file was sent
#[derive(Debug, Serialize)]
pub struct UploadSummary {
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<SourceFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<Vec<PriceRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coercion: Option<CoercionReport>,
}

impl UploadSummary {
    pub fn not_loaded() -> Self {
        Self {
            loaded: false,
            file_name: None,
            format: None,
            rows: None,
            columns: None,
            preview: None,
            coercion: None,
        }
    }

    /// Summary of a table with its first `preview_rows` rows
    pub fn from_loaded(
        file_name: &str,
        loaded: &LoadedTable,
        preview_rows: usize,
    ) -> nse_forecast::error::Result<Self> {
        Ok(Self {
            loaded: true,
            file_name: Some(file_name.to_string()),
            format: Some(loaded.source),
            rows: Some(loaded.table.len()),
            columns: Some(loaded.table.column_names()),
            preview: Some(loaded.table.head(preview_rows)?),
            coercion: Some(loaded.report.clone()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct DaysQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct YearsQuery {
    pub years: Option<u32>,
    #[serde(default)]
    pub detail: bool,
}
