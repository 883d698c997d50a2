use serde::Serialize;

use crate::dataset::Dataset;
use crate::models::DriftReport;
use crate::stats::{quantile_sorted, sorted_copy};

pub const MAX_FEATURES: usize = 6;
pub const NUM_BINS: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub reference_density: f64,
    pub current_density: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureDistribution {
    pub feature: String,
    pub histogram: Vec<HistogramBin>,
    pub reference_box: BoxSummary,
    pub current_box: BoxSummary,
}

/// Box-plot statistics with whiskers at the furthest points within 1.5 IQR.
pub fn box_summary(values: &[f64]) -> Option<BoxSummary> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted_copy(values);
    let q1 = quantile_sorted(&sorted, 0.25);
    let q3 = quantile_sorted(&sorted, 0.75);
    let iqr = q3 - q1;
    let (low_fence, high_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

    let inside: Vec<f64> = sorted
        .iter()
        .copied()
        .filter(|v| *v >= low_fence && *v <= high_fence)
        .collect();

    Some(BoxSummary {
        min: sorted[0],
        q1,
        median: quantile_sorted(&sorted, 0.5),
        q3,
        max: sorted[sorted.len() - 1],
        lower_whisker: inside.first().copied().unwrap_or(q1),
        upper_whisker: inside.last().copied().unwrap_or(q3),
        outliers: sorted.len() - inside.len(),
    })
}

fn bin_counts(values: &[f64], lower: f64, width: f64, bins: usize) -> Vec<usize> {
    let mut counts = vec![0usize; bins];
    for value in values {
        let index = if width > 0.0 {
            (((value - lower) / width).floor() as usize).min(bins - 1)
        } else {
            0
        };
        counts[index] += 1;
    }
    counts
}

/// Density histogram of both samples over their combined range.
pub fn histogram(reference: &[f64], current: &[f64], bins: usize) -> Vec<HistogramBin> {
    if reference.is_empty() || current.is_empty() || bins == 0 {
        return Vec::new();
    }
    let (lower, upper) = reference
        .iter()
        .chain(current.iter())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let (bins, width) = if upper > lower {
        (bins, (upper - lower) / bins as f64)
    } else {
        (1, 0.0)
    };

    let reference_counts = bin_counts(reference, lower, width, bins);
    let current_counts = bin_counts(current, lower, width, bins);
    // a zero-width range collapses into one bin of unit density
    let density = |count: usize, total: usize| {
        if width > 0.0 {
            count as f64 / (total as f64 * width)
        } else {
            count as f64 / total as f64
        }
    };

    (0..bins)
        .map(|i| HistogramBin {
            lower: lower + width * i as f64,
            upper: if width > 0.0 {
                lower + width * (i + 1) as f64
            } else {
                upper
            },
            reference_density: density(reference_counts[i], reference.len()),
            current_density: density(current_counts[i], current.len()),
        })
        .collect()
}

/// Distribution summaries for the first scored features of a report.
pub fn summarize(reference: &Dataset, current: &Dataset, report: &DriftReport) -> Vec<FeatureDistribution> {
    report
        .feature_drift
        .keys()
        .take(MAX_FEATURES)
        .filter_map(|feature| {
            let reference_values = reference.values(feature)?;
            let current_values = current.values(feature)?;
            Some(FeatureDistribution {
                feature: feature.clone(),
                histogram: histogram(&reference_values, &current_values, NUM_BINS),
                reference_box: box_summary(&reference_values)?,
                current_box: box_summary(&current_values)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DriftThresholds;
    use crate::drift::DriftDetector;
    use approx::assert_relative_eq;

    #[test]
    fn box_summary_flags_outliers() {
        let mut values: Vec<f64> = (1..=9).map(f64::from).collect();
        values.push(100.0);
        let summary = box_summary(&values).unwrap();

        assert_relative_eq!(summary.median, 5.5);
        assert_relative_eq!(summary.q1, 3.25);
        assert_relative_eq!(summary.q3, 7.75);
        assert_eq!(summary.upper_whisker, 9.0);
        assert_eq!(summary.lower_whisker, 1.0);
        assert_eq!(summary.outliers, 1);
        assert_eq!(summary.max, 100.0);
    }

    #[test]
    fn histogram_densities_integrate_to_one() {
        let reference: Vec<f64> = (0..100).map(f64::from).collect();
        let current: Vec<f64> = (50..150).map(f64::from).collect();
        let bins = histogram(&reference, &current, NUM_BINS);

        assert_eq!(bins.len(), NUM_BINS);
        let width = bins[0].upper - bins[0].lower;
        let reference_area: f64 = bins.iter().map(|b| b.reference_density * width).sum();
        let current_area: f64 = bins.iter().map(|b| b.current_density * width).sum();
        assert_relative_eq!(reference_area, 1.0, epsilon = 1e-9);
        assert_relative_eq!(current_area, 1.0, epsilon = 1e-9);
        assert_eq!(bins[NUM_BINS - 1].reference_density, 0.0);
    }

    #[test]
    fn constant_values_collapse_to_one_bin() {
        let bins = histogram(&[3.0; 12], &[3.0; 12], NUM_BINS);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].reference_density, 1.0);
    }

    #[test]
    fn summaries_are_capped_at_six_features() {
        let columns: Vec<(String, Vec<Option<f64>>)> = (0..8)
            .map(|i| {
                let values: Vec<Option<f64>> = (0..20).map(|v| Some(f64::from(v + i))).collect();
                (format!("sensor_{i}"), values)
            })
            .collect();
        let dataset = Dataset::from_numeric(columns);
        let report = DriftDetector::new(&dataset, DriftThresholds::default()).detect(&dataset, None);

        let summaries = summarize(&dataset, &dataset, &report);
        assert_eq!(summaries.len(), MAX_FEATURES);
        assert_eq!(summaries[0].feature, "sensor_0");
    }
}
