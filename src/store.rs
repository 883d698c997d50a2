use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::MonitorError;
use crate::models::ClassificationMetrics;

fn ensure_parent(path: &Path) -> Result<(), MonitorError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Writes any artifact as pretty-printed JSON, creating parent directories.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<(), MonitorError> {
    ensure_parent(path)?;
    let body = serde_json::to_string_pretty(value)?;
    std::fs::write(path, body)?;
    info!(path = %path.display(), "Saved JSON artifact");
    Ok(())
}

pub fn save_text(body: &str, path: &Path) -> Result<(), MonitorError> {
    ensure_parent(path)?;
    std::fs::write(path, body)?;
    info!(path = %path.display(), "Saved text report");
    Ok(())
}

/// Snapshots the current dataset as the new reference. Returns `false` when
/// a reference already exists and nothing was written.
pub fn bootstrap_reference(current: &Path, reference: &Path) -> Result<bool, MonitorError> {
    if reference.exists() {
        return Ok(false);
    }
    if !current.exists() {
        return Err(MonitorError::DatasetNotFound(current.to_path_buf()));
    }
    ensure_parent(reference)?;
    std::fs::copy(current, reference)?;
    warn!(
        reference = %reference.display(),
        "Reference data not found, saved current data as the new reference"
    );
    Ok(true)
}

/// Loads the numeric entries of a historical metrics document. A missing
/// file yields `None`; non-numeric entries are ignored.
pub fn load_historical_metrics(path: &Path) -> Result<Option<BTreeMap<String, f64>>, MonitorError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)?;
    let document: BTreeMap<String, serde_json::Value> = serde_json::from_str(&raw)?;
    let metrics = document
        .into_iter()
        .filter_map(|(name, value)| value.as_f64().map(|v| (name, v)))
        .collect();
    Ok(Some(metrics))
}

pub fn save_baseline(metrics: &ClassificationMetrics, path: &Path) -> Result<(), MonitorError> {
    save_json(metrics, path)
}
