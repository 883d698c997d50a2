use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MonitorError;
use crate::models::Severity;

/// Cutoffs used to flag and grade feature drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftThresholds {
    /// Minimum non-missing observations per side before a feature is scored.
    pub min_samples: usize,
    /// p-value below which either test flags drift.
    pub significance: f64,
    /// p-value below which a drifting feature is graded `high`.
    pub high_significance: f64,
    pub medium_effect_size: f64,
    pub high_effect_size: f64,
    /// Share of drifting features (percent) that raises the overall alarm.
    pub alarm_percentage: f64,
    pub high_percentage: f64,
}

impl Default for DriftThresholds {
    fn default() -> Self {
        Self {
            min_samples: 10,
            significance: 0.05,
            high_significance: 0.01,
            medium_effect_size: 0.5,
            high_effect_size: 0.8,
            alarm_percentage: 20.0,
            high_percentage: 50.0,
        }
    }
}

impl DriftThresholds {
    pub fn is_drifting(&self, ks_pvalue: f64, mw_pvalue: f64) -> bool {
        ks_pvalue < self.significance || mw_pvalue < self.significance
    }

    pub fn feature_severity(&self, ks_pvalue: f64, mw_pvalue: f64, cohens_d: f64) -> Severity {
        let effect = cohens_d.abs();
        if ks_pvalue < self.high_significance
            || mw_pvalue < self.high_significance
            || effect > self.high_effect_size
        {
            Severity::High
        } else if ks_pvalue < self.significance
            || mw_pvalue < self.significance
            || effect > self.medium_effect_size
        {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn overall_alarm(&self, drift_percentage: f64) -> bool {
        drift_percentage > self.alarm_percentage
    }

    pub fn overall_severity(&self, drift_percentage: f64) -> Severity {
        if drift_percentage > self.high_percentage {
            Severity::High
        } else if drift_percentage > self.alarm_percentage {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    fn validate(&self) -> Result<(), MonitorError> {
        if self.min_samples < 2 {
            return Err(MonitorError::InvalidConfig(
                "min_samples must be at least 2".to_string(),
            ));
        }
        for (name, value) in [
            ("significance", self.significance),
            ("high_significance", self.high_significance),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(MonitorError::InvalidConfig(format!(
                    "{name} must lie in (0, 1), got {value}"
                )));
            }
        }
        if self.high_significance > self.significance {
            return Err(MonitorError::InvalidConfig(
                "high_significance must not exceed significance".to_string(),
            ));
        }
        if self.medium_effect_size < 0.0 || self.high_effect_size < self.medium_effect_size {
            return Err(MonitorError::InvalidConfig(
                "effect size cutoffs must satisfy 0 <= medium <= high".to_string(),
            ));
        }
        if self.alarm_percentage < 0.0
            || self.high_percentage < self.alarm_percentage
            || self.high_percentage > 100.0
        {
            return Err(MonitorError::InvalidConfig(
                "percentage cutoffs must satisfy 0 <= alarm <= high <= 100".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DegradationThresholds {
    /// Relative drop (0.05 = 5%) above which a metric counts as degraded.
    pub relative_drop: f64,
}

impl Default for DegradationThresholds {
    fn default() -> Self {
        Self {
            relative_drop: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub drift: DriftThresholds,
    pub degradation: DegradationThresholds,
    /// Explicit feature list; all shared numeric columns when unset.
    pub feature_columns: Option<Vec<String>>,
    pub label_column: String,
    pub prediction_column: String,
    pub delimiter: char,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            drift: DriftThresholds::default(),
            degradation: DegradationThresholds::default(),
            feature_columns: None,
            label_column: "failure".to_string(),
            prediction_column: "prediction".to_string(),
            delimiter: ',',
        }
    }
}

impl MonitorConfig {
    pub fn from_file(path: &Path) -> Result<Self, MonitorError> {
        let raw = std::fs::read_to_string(path)?;
        let config: MonitorConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MonitorError> {
        self.drift.validate()?;
        if self.degradation.relative_drop < 0.0 {
            return Err(MonitorError::InvalidConfig(
                "relative_drop must not be negative".to_string(),
            ));
        }
        if !self.delimiter.is_ascii() {
            return Err(MonitorError::InvalidConfig(format!(
                "delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            )));
        }
        Ok(())
    }

    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }
}
