use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::MonitorConfig;
use crate::dataset::Dataset;
use crate::drift::DriftDetector;
use crate::error::MonitorError;
use crate::models::{DataDriftSummary, StatusReport};
use crate::performance::PerformanceCheck;
use crate::store;

/// Files read and written by one combined check.
#[derive(Debug, Clone)]
pub struct CheckPaths {
    pub current: PathBuf,
    pub reference: PathBuf,
    pub metrics: PathBuf,
    pub out: PathBuf,
}

pub fn load_dataset(path: &Path, config: &MonitorConfig) -> Result<Dataset, MonitorError> {
    Dataset::from_csv(path, config.delimiter_byte())
}

/// Columns the model consumes: the configured list, or every numeric column
/// other than the label and prediction.
pub fn model_features(current: &Dataset, config: &MonitorConfig) -> Vec<String> {
    match &config.feature_columns {
        Some(columns) => columns.clone(),
        None => current
            .numeric_columns()
            .into_iter()
            .filter(|name| *name != config.label_column && *name != config.prediction_column)
            .map(str::to_string)
            .collect(),
    }
}

/// Drift detector over `reference` that never treats the label or the
/// prediction as a feature.
pub fn drift_detector<'a>(reference: &'a Dataset, config: &MonitorConfig) -> DriftDetector<'a> {
    DriftDetector::new(reference, config.drift.clone())
        .excluding([config.label_column.as_str(), config.prediction_column.as_str()])
}

/// Runs drift detection and the degradation check, then persists the
/// combined status to `paths.out`.
///
/// A missing reference is bootstrapped from the current data and the drift
/// section reports that no reference was available.
pub fn run_check(paths: &CheckPaths, config: &MonitorConfig) -> Result<StatusReport, MonitorError> {
    let current = load_dataset(&paths.current, config)?;

    let data_drift = if store::bootstrap_reference(&paths.current, &paths.reference)? {
        DataDriftSummary::no_reference(format!(
            "No reference data available, saved current data to {}",
            paths.reference.display()
        ))
    } else {
        let reference = load_dataset(&paths.reference, config)?;
        DataDriftSummary::from_report(
            drift_detector(&reference, config).detect(&current, config.feature_columns.as_deref()),
        )
    };

    let historical = store::load_historical_metrics(&paths.metrics)?;
    let performance = PerformanceCheck::new(config.degradation.clone()).evaluate(
        &current,
        &model_features(&current, config),
        &config.label_column,
        &config.prediction_column,
        historical.as_ref(),
    );

    let status = StatusReport::new(data_drift, performance);
    store::save_json(&status, &paths.out)?;
    info!(status = status.overall_status.as_str(), "Drift check finished");
    Ok(status)
}
