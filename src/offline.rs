//! Views run directly on a file, without the server

use crate::api::types::UploadSummary;
use anyhow::{bail, Context, Result};
use nse_forecast::views::{self, DaysHorizon, YearsHorizon};
use nse_forecast::DataLoader;
use serde_json::Value;
use std::path::Path;

/// Which forecast page to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizon {
    Days(u32),
    Years { years: u32, detail: bool },
}

impl Horizon {
    /// Build from the mutually exclusive `--days` / `--years` flags
    pub fn from_flags(days: Option<u32>, years: Option<u32>, detail: bool) -> Result<Self> {
        match (days, years) {
            (Some(days), None) => Ok(Horizon::Days(days)),
            (None, Some(years)) => Ok(Horizon::Years { years, detail }),
            _ => bail!("pass exactly one of --days or --years"),
        }
    }
}

/// Load `path` and describe it the way the upload endpoint does
pub fn inspect(path: &Path, preview_rows: usize) -> Result<Value> {
    let loaded = DataLoader::from_path(path)
        .with_context(|| format!("loading {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let summary = UploadSummary::from_loaded(&file_name, &loaded, preview_rows)?;
    Ok(serde_json::to_value(summary)?)
}

/// Load `path` and run the forecast page selected by `horizon`
pub fn forecast(path: &Path, horizon: Horizon) -> Result<Value> {
    let loaded = DataLoader::from_path(path)
        .with_context(|| format!("loading {}", path.display()))?;

    let view = match horizon {
        Horizon::Days(days) => {
            let view = views::forecast_for_days(&loaded.table, DaysHorizon::new(days)?)
                .context("forecast for days")?;
            serde_json::to_value(view)?
        }
        Horizon::Years { years, detail } => {
            let view = views::forecast_for_years(&loaded.table, YearsHorizon::new(years)?, detail)
                .context("forecast for years")?;
            serde_json::to_value(view)?
        }
    };
    Ok(view)
}
