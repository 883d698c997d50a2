use std::collections::{BTreeMap, BTreeSet};

use tracing::{info, warn};

use crate::config::DegradationThresholds;
use crate::dataset::Dataset;
use crate::error::MonitorError;
use crate::models::{ClassificationMetrics, MetricComparison, PerformanceReport};

/// Accuracy plus support-weighted precision, recall and F1.
///
/// Labels are the union of true and predicted values. A label that is never
/// predicted scores zero precision; a label with no support carries no weight.
pub fn classification_metrics(pairs: &[(String, String)]) -> ClassificationMetrics {
    if pairs.is_empty() {
        return ClassificationMetrics::default();
    }

    let labels: BTreeSet<&str> = pairs
        .iter()
        .flat_map(|(truth, predicted)| [truth.as_str(), predicted.as_str()])
        .collect();

    let total = pairs.len() as f64;
    let correct = pairs.iter().filter(|(truth, predicted)| truth == predicted).count();

    let mut precision = 0.0;
    let mut recall = 0.0;
    let mut f1_score = 0.0;

    for label in labels {
        let support = pairs.iter().filter(|(truth, _)| truth == label).count();
        if support == 0 {
            continue;
        }
        let predicted = pairs.iter().filter(|(_, p)| p == label).count();
        let true_positive = pairs
            .iter()
            .filter(|(truth, p)| truth == label && p == label)
            .count();

        let label_precision = ratio(true_positive, predicted);
        let label_recall = ratio(true_positive, support);
        let label_f1 = if label_precision + label_recall > 0.0 {
            2.0 * label_precision * label_recall / (label_precision + label_recall)
        } else {
            0.0
        };

        let weight = support as f64 / total;
        precision += weight * label_precision;
        recall += weight * label_recall;
        f1_score += weight * label_f1;
    }

    ClassificationMetrics {
        accuracy: correct as f64 / total,
        precision,
        recall,
        f1_score,
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// (truth, prediction) pairs for rows where every listed feature, the label
/// and the prediction are present. Features absent from the dataset are not
/// used for filtering.
pub fn labelled_pairs(
    dataset: &Dataset,
    features: &[String],
    label_column: &str,
    prediction_column: &str,
) -> Result<Vec<(String, String)>, MonitorError> {
    let label = dataset.require_column(label_column)?;
    let prediction = dataset.require_column(prediction_column)?;
    let feature_columns: Vec<_> = features
        .iter()
        .filter_map(|name| dataset.column(name))
        .collect();

    let pairs = (0..dataset.row_count())
        .filter(|&row| feature_columns.iter().all(|column| !column.is_missing(row)))
        .filter_map(|row| Some((label.text(row)?, prediction.text(row)?)))
        .collect();
    Ok(pairs)
}

pub struct PerformanceCheck {
    thresholds: DegradationThresholds,
}

impl PerformanceCheck {
    pub fn new(thresholds: DegradationThresholds) -> Self {
        Self { thresholds }
    }

    /// Compares the four headline metrics against the historical record.
    pub fn compare(
        &self,
        current: &ClassificationMetrics,
        historical: &BTreeMap<String, f64>,
    ) -> BTreeMap<String, MetricComparison> {
        current
            .named()
            .into_iter()
            .filter_map(|(name, current_value)| {
                let historical_value = *historical.get(name)?;
                let degradation = historical_value - current_value;
                let degradation_percentage = if historical_value > 0.0 {
                    degradation / historical_value
                } else {
                    0.0
                };
                Some((
                    name.to_string(),
                    MetricComparison {
                        historical: historical_value,
                        current: current_value,
                        degradation,
                        degradation_percentage,
                        degradation_detected: degradation_percentage
                            > self.thresholds.relative_drop,
                    },
                ))
            })
            .collect()
    }

    pub fn evaluate(
        &self,
        current: &Dataset,
        features: &[String],
        label_column: &str,
        prediction_column: &str,
        historical: Option<&BTreeMap<String, f64>>,
    ) -> PerformanceReport {
        let Some(historical) = historical else {
            warn!("No historical metrics available, skipping degradation check");
            return PerformanceReport::informational("No historical metrics available");
        };

        let pairs = match labelled_pairs(current, features, label_column, prediction_column) {
            Ok(pairs) => pairs,
            Err(error) => {
                warn!(%error, "Cannot evaluate model performance on current data");
                return PerformanceReport::informational(error.to_string());
            }
        };

        if pairs.is_empty() {
            return PerformanceReport::informational("Insufficient data for evaluation");
        }

        let metrics = classification_metrics(&pairs);
        let metrics_comparison = self.compare(&metrics, historical);
        let degradation_detected = metrics_comparison
            .values()
            .any(|comparison| comparison.degradation_detected);

        info!(
            rows = pairs.len(),
            accuracy = metrics.accuracy,
            degradation_detected,
            "Performance check completed"
        );

        PerformanceReport {
            degradation_detected,
            message: None,
            metrics_comparison,
            current_metrics: Some(metrics),
            historical_metrics: Some(historical.clone()),
            evaluated_rows: pairs.len(),
        }
    }
}
