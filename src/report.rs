use std::fmt::Write;

use crate::models::{DriftReport, OverallStatus, Severity, StatusReport};

const RULE: &str = "============================================================";

const HIGH_ACTIONS: &[&str] = &[
    "- Immediate model retraining recommended",
    "- Investigate data pipeline changes",
    "- Consider feature engineering updates",
    "- Monitor model performance closely",
];

const MEDIUM_ACTIONS: &[&str] = &[
    "- Schedule model retraining soon",
    "- Monitor drift trends over time",
    "- Consider incremental learning",
];

const LOW_ACTIONS: &[&str] = &["- Continue monitoring", "- No immediate action required"];

fn recommendations(severity: Severity) -> (&'static str, &'static [&'static str]) {
    match severity {
        Severity::High => ("HIGH DRIFT DETECTED", HIGH_ACTIONS),
        Severity::Medium => ("MEDIUM DRIFT DETECTED", MEDIUM_ACTIONS),
        Severity::Low | Severity::None => ("LOW DRIFT DETECTED", LOW_ACTIONS),
    }
}

/// Human-readable drift report. Output depends only on the report contents.
pub fn generate_report(report: &DriftReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "{RULE}");
    let _ = writeln!(output, "DATA DRIFT DETECTION REPORT");
    let _ = writeln!(output, "{RULE}");
    let _ = writeln!(output, "Generated: {}", report.timestamp.to_rfc3339());
    let _ = writeln!(output, "Run ID: {}", report.run_id);
    let _ = writeln!(output, "Overall Drift Detected: {}", report.overall_drift_detected);
    let _ = writeln!(output, "Drift Percentage: {:.1}%", report.drift_percentage);
    let _ = writeln!(
        output,
        "Overall Severity: {}",
        report.drift_severity.as_str().to_uppercase()
    );
    let _ = writeln!(
        output,
        "Features Scored: {} ({} skipped for insufficient data)",
        report.feature_drift.len(),
        report.features_skipped
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "FEATURE-LEVEL DRIFT ANALYSIS");
    let _ = writeln!(output, "----------------------------------------");

    if report.feature_drift.is_empty() {
        let _ = writeln!(output, "No features had enough data to compare.");
    }

    for (feature, record) in report.feature_drift.iter() {
        let _ = writeln!(output);
        let _ = writeln!(output, "Feature: {feature}");
        let _ = writeln!(output, "  Drift Detected: {}", record.drift_detected);
        let _ = writeln!(
            output,
            "  Severity: {}",
            record.severity.as_str().to_uppercase()
        );
        let _ = writeln!(output, "  KS Test p-value: {:.4}", record.ks_pvalue);
        let _ = writeln!(output, "  Mann-Whitney p-value: {:.4}", record.mw_pvalue);
        let _ = writeln!(output, "  Effect Size (Cohen's d): {:.3}", record.cohens_d);
        let _ = writeln!(output, "  Reference Mean: {:.3}", record.reference_mean);
        let _ = writeln!(output, "  Current Mean: {:.3}", record.current_mean);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "{RULE}");
    let _ = writeln!(output, "RECOMMENDATIONS");
    let _ = writeln!(output, "{RULE}");

    let (headline, actions) = recommendations(report.drift_severity);
    let _ = writeln!(output, "{headline}");
    for action in actions {
        let _ = writeln!(output, "{action}");
    }

    output
}

/// Console summary of a combined drift and degradation check.
pub fn status_summary(status: &StatusReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "=== Model Drift Detection Report ===");
    let _ = writeln!(output, "Timestamp: {}", status.timestamp.to_rfc3339());
    let _ = writeln!(
        output,
        "Overall Status: {}",
        status.overall_status.as_str().to_uppercase()
    );

    if let Some(message) = &status.data_drift.message {
        let _ = writeln!(output, "Data drift: {message}");
    }
    if status.data_drift.drift_detected {
        let _ = writeln!(output, "DATA DRIFT DETECTED");
        if let Some(report) = &status.data_drift.report {
            let _ = writeln!(
                output,
                "Features with drift: {} ({:.1}%)",
                report.drifted_features().count(),
                report.drift_percentage
            );
            for (feature, record) in report.drifted_features() {
                let _ = writeln!(
                    output,
                    "  - {feature}: {} (cohen's d {:.2})",
                    record.severity, record.cohens_d
                );
            }
        }
    }

    let performance = &status.performance_degradation;
    if let Some(message) = &performance.message {
        let _ = writeln!(output, "Performance: {message}");
    }
    if performance.degradation_detected {
        let _ = writeln!(output, "PERFORMANCE DEGRADATION DETECTED");
        for (metric, comparison) in performance.metrics_comparison.iter() {
            if comparison.degradation_detected {
                let _ = writeln!(
                    output,
                    "  - {metric}: {:.2}% degradation",
                    comparison.degradation_percentage * 100.0
                );
            }
        }
    }

    if status.overall_status == OverallStatus::Healthy {
        let _ = writeln!(output, "No significant drift or degradation detected");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        DataDriftSummary, FeatureDrift, MetricComparison, PerformanceReport,
    };
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn record(drift_detected: bool, severity: Severity, cohens_d: f64) -> FeatureDrift {
        FeatureDrift {
            drift_detected,
            severity,
            ks_statistic: 0.5,
            ks_pvalue: if drift_detected { 0.0001 } else { 0.62 },
            mw_statistic: 12000.0,
            mw_pvalue: if drift_detected { 0.0002 } else { 0.71 },
            cohens_d,
            reference_mean: 100.0,
            current_mean: 100.0 + cohens_d * 10.0,
            reference_std: 10.0,
            current_std: 10.0,
            reference_count: 200,
            current_count: 200,
        }
    }

    fn sample_report(severity: Severity) -> DriftReport {
        let mut feature_drift = BTreeMap::new();
        feature_drift.insert("pressure".to_string(), record(true, Severity::High, 3.0));
        feature_drift.insert("volt".to_string(), record(false, Severity::Low, 0.01));
        DriftReport {
            run_id: Uuid::nil(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            overall_drift_detected: severity != Severity::Low,
            drift_percentage: 50.0,
            drift_severity: severity,
            features_skipped: 1,
            feature_drift,
        }
    }

    #[test]
    fn report_sections_appear_in_order() {
        let text = generate_report(&sample_report(Severity::Medium));

        let header = text.find("DATA DRIFT DETECTION REPORT").unwrap();
        let generated = text.find("Generated: 2026-03-01T12:00:00+00:00").unwrap();
        let flags = text.find("Overall Drift Detected: true").unwrap();
        let pressure = text.find("Feature: pressure").unwrap();
        let volt = text.find("Feature: volt").unwrap();
        let advice = text.find("RECOMMENDATIONS").unwrap();

        assert!(header < generated && generated < flags);
        assert!(flags < pressure && pressure < volt && volt < advice);
        assert!(text.contains("Drift Percentage: 50.0%"));
        assert!(text.contains("  Effect Size (Cohen's d): 3.000"));
        assert!(text.contains("  Current Mean: 130.000"));
        assert!(text.contains("MEDIUM DRIFT DETECTED"));
        assert!(text.contains("- Schedule model retraining soon"));
    }

    #[test]
    fn recommendation_tiers_differ() {
        let high = generate_report(&sample_report(Severity::High));
        let low = generate_report(&sample_report(Severity::Low));
        assert!(high.contains("- Immediate model retraining recommended"));
        assert!(low.contains("- No immediate action required"));
        assert!(!low.contains("retraining"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let report = sample_report(Severity::High);
        assert_eq!(generate_report(&report), generate_report(&report));
    }

    #[test]
    fn status_summary_explains_verdict() {
        let mut metrics_comparison = BTreeMap::new();
        metrics_comparison.insert(
            "accuracy".to_string(),
            MetricComparison {
                historical: 0.9,
                current: 0.8,
                degradation: 0.1,
                degradation_percentage: 0.1 / 0.9,
                degradation_detected: true,
            },
        );
        let performance = PerformanceReport {
            degradation_detected: true,
            message: None,
            metrics_comparison,
            current_metrics: None,
            historical_metrics: None,
            evaluated_rows: 120,
        };
        let status = StatusReport::new(
            DataDriftSummary::from_report(sample_report(Severity::High)),
            performance,
        );

        let text = status_summary(&status);
        assert!(text.contains("Overall Status: CRITICAL"));
        assert!(text.contains("Features with drift: 1 (50.0%)"));
        assert!(text.contains("  - pressure: high (cohen's d 3.00)"));
        assert!(text.contains("  - accuracy: 11.11% degradation"));
    }
}
