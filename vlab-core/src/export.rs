//! Result export: equity curve CSV and pretty JSON.

use std::path::Path;

use thiserror::Error;

use crate::domain::BacktestResult;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV buffer was not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Equity curve as `index,value` rows.
pub fn export_equity_csv(result: &BacktestResult) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["index", "value"])?;
    for point in &result.equity_curve {
        wtr.write_record([point.index.to_string(), format!("{:.6}", point.value)])?;
    }
    let bytes = wtr.into_inner().map_err(|e| ExportError::Csv(e.into_error().into()))?;
    Ok(String::from_utf8(bytes)?)
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(result: &BacktestResult) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(result)?)
}

// ─── Files ──────────────────────────────────────────────────────────

pub fn write_equity_csv(result: &BacktestResult, path: &Path) -> Result<(), ExportError> {
    write(path, &export_equity_csv(result)?)
}

pub fn write_json(result: &BacktestResult, path: &Path) -> Result<(), ExportError> {
    write(path, &export_json(result)?)
}

fn write(path: &Path, content: &str) -> Result<(), ExportError> {
    std::fs::write(path, content).map_err(|source| ExportError::Write {
        path: path.display().to_string(),
        source,
    })
}
