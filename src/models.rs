use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDrift {
    pub drift_detected: bool,
    pub severity: Severity,
    pub ks_statistic: f64,
    pub ks_pvalue: f64,
    pub mw_statistic: f64,
    pub mw_pvalue: f64,
    pub cohens_d: f64,
    pub reference_mean: f64,
    pub current_mean: f64,
    pub reference_std: f64,
    pub current_std: f64,
    pub reference_count: usize,
    pub current_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub overall_drift_detected: bool,
    pub drift_percentage: f64,
    pub drift_severity: Severity,
    pub features_skipped: usize,
    pub feature_drift: BTreeMap<String, FeatureDrift>,
}

impl DriftReport {
    pub fn drifted_features(&self) -> impl Iterator<Item = (&String, &FeatureDrift)> {
        self.feature_drift
            .iter()
            .filter(|(_, record)| record.drift_detected)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

impl ClassificationMetrics {
    pub fn named(&self) -> [(&'static str, f64); 4] {
        [
            ("accuracy", self.accuracy),
            ("precision", self.precision),
            ("recall", self.recall),
            ("f1_score", self.f1_score),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub historical: f64,
    pub current: f64,
    pub degradation: f64,
    pub degradation_percentage: f64,
    pub degradation_detected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub degradation_detected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub metrics_comparison: BTreeMap<String, MetricComparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_metrics: Option<ClassificationMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub historical_metrics: Option<BTreeMap<String, f64>>,
    pub evaluated_rows: usize,
}

impl PerformanceReport {
    pub fn informational(message: impl Into<String>) -> Self {
        Self {
            degradation_detected: false,
            message: Some(message.into()),
            metrics_comparison: BTreeMap::new(),
            current_metrics: None,
            historical_metrics: None,
            evaluated_rows: 0,
        }
    }
}

/// Drift section of the status document; `report` is absent when the run
/// bootstrapped a reference dataset instead of comparing against one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataDriftSummary {
    pub drift_detected: bool,
    pub drift_severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<DriftReport>,
}

impl DataDriftSummary {
    pub fn from_report(report: DriftReport) -> Self {
        Self {
            drift_detected: report.overall_drift_detected,
            drift_severity: report.drift_severity,
            message: None,
            report: Some(report),
        }
    }

    pub fn no_reference(message: impl Into<String>) -> Self {
        Self {
            drift_detected: false,
            drift_severity: Severity::None,
            message: Some(message.into()),
            report: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Warning,
    Critical,
}

impl OverallStatus {
    pub fn from_checks(drift_detected: bool, degradation_detected: bool) -> Self {
        match (drift_detected, degradation_detected) {
            (true, true) => OverallStatus::Critical,
            (true, false) | (false, true) => OverallStatus::Warning,
            (false, false) => OverallStatus::Healthy,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            OverallStatus::Healthy => 0,
            OverallStatus::Warning => 1,
            OverallStatus::Critical => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Healthy => "healthy",
            OverallStatus::Warning => "warning",
            OverallStatus::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub timestamp: DateTime<Utc>,
    pub data_drift: DataDriftSummary,
    pub performance_degradation: PerformanceReport,
    pub overall_status: OverallStatus,
}

impl StatusReport {
    pub fn new(data_drift: DataDriftSummary, performance_degradation: PerformanceReport) -> Self {
        let overall_status = OverallStatus::from_checks(
            data_drift.drift_detected,
            performance_degradation.degradation_detected,
        );
        Self {
            timestamp: Utc::now(),
            data_drift,
            performance_degradation,
            overall_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_rollup_precedence() {
        assert_eq!(OverallStatus::from_checks(true, true), OverallStatus::Critical);
        assert_eq!(OverallStatus::from_checks(true, false), OverallStatus::Warning);
        assert_eq!(OverallStatus::from_checks(false, true), OverallStatus::Warning);
        assert_eq!(OverallStatus::from_checks(false, false), OverallStatus::Healthy);
    }

    #[test]
    fn only_healthy_exits_cleanly() {
        assert_eq!(OverallStatus::Healthy.exit_code(), 0);
        assert_ne!(OverallStatus::Warning.exit_code(), 0);
        assert_ne!(OverallStatus::Critical.exit_code(), 0);
    }

    #[test]
    fn severity_serializes_lowercase() {
        let value = serde_json::to_string(&Severity::Medium).unwrap();
        assert_eq!(value, "\"medium\"");
        assert_eq!(Severity::High.to_string(), "high");
    }

    #[test]
    fn bootstrap_summary_is_not_drift() {
        let summary = DataDriftSummary::no_reference("no reference data available");
        let status = StatusReport::new(summary, PerformanceReport::informational("no baseline"));
        assert_eq!(status.overall_status, OverallStatus::Healthy);
        assert_eq!(status.data_drift.drift_severity, Severity::None);
    }
}
