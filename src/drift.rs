use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::DriftThresholds;
use crate::dataset::Dataset;
use crate::models::{DriftReport, FeatureDrift};
use crate::stats;

/// Compares observed data against a fixed reference dataset.
pub struct DriftDetector<'a> {
    reference: &'a Dataset,
    thresholds: DriftThresholds,
    excluded: Vec<String>,
}

impl<'a> DriftDetector<'a> {
    pub fn new(reference: &'a Dataset, thresholds: DriftThresholds) -> Self {
        Self {
            reference,
            thresholds,
            excluded: Vec::new(),
        }
    }

    /// Columns never picked up by automatic feature discovery, such as the
    /// label and the model's prediction.
    pub fn excluding<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Columns to score: the requested list, or every numeric column of
    /// `current` that is also numeric in the reference, minus the excluded
    /// columns. Columns missing or non-numeric on either side are dropped.
    pub fn resolve_features(&self, current: &Dataset, requested: Option<&[String]>) -> Vec<String> {
        let candidates: Vec<String> = match requested {
            Some(columns) => columns.to_vec(),
            None => current
                .numeric_columns()
                .into_iter()
                .filter(|name| !self.excluded.iter().any(|excluded| excluded == name))
                .map(str::to_string)
                .collect(),
        };

        candidates
            .into_iter()
            .filter(|name| current.is_numeric(name) && self.reference.is_numeric(name))
            .collect()
    }

    pub fn detect(&self, current: &Dataset, requested: Option<&[String]>) -> DriftReport {
        info!("Starting drift detection");
        let features = self.resolve_features(current, requested);

        let mut feature_drift = BTreeMap::new();
        let mut skipped = 0usize;

        for name in features.iter() {
            let (Some(reference), Some(observed)) =
                (self.reference.values(name), current.values(name))
            else {
                continue;
            };

            match self.score_feature(&reference, &observed) {
                Some(record) => {
                    feature_drift.insert(name.clone(), record);
                }
                None => {
                    debug!(
                        feature = name.as_str(),
                        reference_count = reference.len(),
                        current_count = observed.len(),
                        "skipping feature with insufficient samples"
                    );
                    skipped += 1;
                }
            }
        }

        let drifted = feature_drift
            .values()
            .filter(|record| record.drift_detected)
            .count();
        let drift_percentage = if feature_drift.is_empty() {
            0.0
        } else {
            drifted as f64 * 100.0 / feature_drift.len() as f64
        };

        info!(
            scored = feature_drift.len(),
            drifted,
            skipped,
            "Drift detection completed. {:.1}% of features show drift",
            drift_percentage
        );

        DriftReport {
            run_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            overall_drift_detected: self.thresholds.overall_alarm(drift_percentage),
            drift_percentage,
            drift_severity: self.thresholds.overall_severity(drift_percentage),
            features_skipped: skipped,
            feature_drift,
        }
    }

    /// Scores one feature, or `None` when either side is below the minimum
    /// sample count.
    pub fn score_feature(&self, reference: &[f64], current: &[f64]) -> Option<FeatureDrift> {
        let min_samples = self.thresholds.min_samples;
        if reference.len() < min_samples || current.len() < min_samples {
            return None;
        }

        let ks = stats::ks_two_sample(reference, current);
        let mw = stats::mann_whitney_u(reference, current);
        let cohens_d = stats::cohens_d(reference, current);

        Some(FeatureDrift {
            drift_detected: self.thresholds.is_drifting(ks.pvalue, mw.pvalue),
            severity: self
                .thresholds
                .feature_severity(ks.pvalue, mw.pvalue, cohens_d),
            ks_statistic: ks.statistic,
            ks_pvalue: ks.pvalue,
            mw_statistic: mw.statistic,
            mw_pvalue: mw.pvalue,
            cohens_d,
            reference_mean: stats::mean(reference),
            current_mean: stats::mean(current),
            reference_std: stats::std_dev(reference),
            current_std: stats::std_dev(current),
            reference_count: reference.len(),
            current_count: current.len(),
        })
    }
}
