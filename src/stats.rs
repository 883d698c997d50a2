//! Two-sample statistics used by the drift detector.
//!
//! Inputs are assumed to be finite; missing values are dropped by the
//! dataset loader before anything reaches this module.

use statrs::function::erf::erfc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestResult {
    pub statistic: f64,
    pub pvalue: f64,
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance with an `n - 1` denominator.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let mu = mean(values);
    values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

pub fn pooled_std(reference: &[f64], current: &[f64]) -> f64 {
    let n_ref = reference.len() as f64;
    let n_cur = current.len() as f64;
    let pooled = ((n_ref - 1.0) * variance(reference) + (n_cur - 1.0) * variance(current))
        / (n_ref + n_cur - 2.0);
    pooled.sqrt()
}

/// Standardized mean difference of `current` against `reference`.
///
/// Returns 0 when the pooled standard deviation is zero or undefined, so a
/// constant feature never reports an effect.
pub fn cohens_d(reference: &[f64], current: &[f64]) -> f64 {
    let pooled = pooled_std(reference, current);
    if !pooled.is_finite() || pooled == 0.0 {
        return 0.0;
    }
    (mean(current) - mean(reference)) / pooled
}

pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut values = values.to_vec();
    values.sort_by(|a, b| a.total_cmp(b));
    values
}

/// Above this many sample pairs (`n1 * n2`) the KS p-value switches from the
/// exact lattice-path distribution to the asymptotic series.
pub const EXACT_KS_MAX_PAIRS: usize = 10_000;

/// Two-sample Kolmogorov–Smirnov test.
///
/// The statistic is the largest gap between the two empirical CDFs. Small
/// samples get the exact two-sided p-value; larger ones use the asymptotic
/// Kolmogorov distribution with the Stephens correction.
pub fn ks_two_sample(reference: &[f64], current: &[f64]) -> TestResult {
    let a = sorted_copy(reference);
    let b = sorted_copy(current);
    let (n1, n2) = (a.len(), b.len());
    if n1 == 0 || n2 == 0 {
        return TestResult {
            statistic: 0.0,
            pvalue: 1.0,
        };
    }

    let (mut i, mut j) = (0usize, 0usize);
    let mut statistic: f64 = 0.0;
    while i < n1 && j < n2 {
        let value = a[i].min(b[j]);
        while i < n1 && a[i] <= value {
            i += 1;
        }
        while j < n2 && b[j] <= value {
            j += 1;
        }
        let gap = (i as f64 / n1 as f64 - j as f64 / n2 as f64).abs();
        statistic = statistic.max(gap);
    }

    let pvalue = if n1 * n2 <= EXACT_KS_MAX_PAIRS {
        ks_exact_survival(n1, n2, statistic)
    } else {
        let en = ((n1 * n2) as f64 / (n1 + n2) as f64).sqrt();
        kolmogorov_survival((en + 0.12 + 0.11 / en) * statistic)
    };

    TestResult { statistic, pvalue }
}

/// P(D >= statistic) under the null, counted over monotone lattice paths
/// from (0, 0) to (n1, n2).
///
/// Each path is a uniformly random interleaving of the two samples. A path
/// is absorbed the first time `|i / n1 - j / n2|` reaches the statistic and
/// the absorbed mass is the p-value.
fn ks_exact_survival(n1: usize, n2: usize, statistic: f64) -> f64 {
    // the statistic is a multiple of 1 / (n1 * n2)
    let threshold = (statistic * (n1 * n2) as f64).round() as i64;
    if threshold <= 0 {
        return 1.0;
    }

    let width = n2 + 1;
    let mut mass = vec![0.0f64; (n1 + 1) * width];
    mass[0] = 1.0;
    let mut absorbed = 0.0;

    for i in 0..=n1 {
        for j in 0..=n2 {
            let here = mass[i * width + j];
            if here == 0.0 {
                continue;
            }
            let gap = (i * n2) as i64 - (j * n1) as i64;
            if gap.abs() >= threshold {
                absorbed += here;
                continue;
            }
            let remaining = ((n1 - i) + (n2 - j)) as f64;
            if i < n1 {
                mass[(i + 1) * width + j] += here * (n1 - i) as f64 / remaining;
            }
            if j < n2 {
                mass[i * width + j + 1] += here * (n2 - j) as f64 / remaining;
            }
        }
    }

    absorbed.clamp(0.0, 1.0)
}

/// P(K > z) for the Kolmogorov distribution.
fn kolmogorov_survival(z: f64) -> f64 {
    if z <= 0.0 {
        return 1.0;
    }
    if z < 1.18 {
        let y = (-1.233_700_550_136_17 / (z * z)).exp();
        let cdf = 2.256_758_334_191_025 * (-y.ln()).sqrt() * (y + y.powi(9) + y.powi(25) + y.powi(49));
        (1.0 - cdf).clamp(0.0, 1.0)
    } else {
        let x = (-2.0 * z * z).exp();
        (2.0 * (x - x.powi(4) + x.powi(9))).clamp(0.0, 1.0)
    }
}

/// Average ranks (1-based) of the concatenation `first ++ second`, with the
/// tie term `sum(t^3 - t)` over tie groups.
fn rank_with_ties(first: &[f64], second: &[f64]) -> (Vec<f64>, f64) {
    let mut indexed: Vec<(usize, f64)> = first
        .iter()
        .chain(second.iter())
        .copied()
        .enumerate()
        .collect();
    indexed.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut ranks = vec![0.0; indexed.len()];
    let mut tie_term = 0.0;
    let mut start = 0;
    while start < indexed.len() {
        let mut end = start + 1;
        while end < indexed.len() && indexed[end].1 == indexed[start].1 {
            end += 1;
        }
        // positions start..end share the average of ranks start+1..=end
        let average = (start + end + 1) as f64 / 2.0;
        for &(original, _) in &indexed[start..end] {
            ranks[original] = average;
        }
        let t = (end - start) as f64;
        tie_term += t * t * t - t;
        start = end;
    }

    (ranks, tie_term)
}

/// Two-sided Mann–Whitney U test.
///
/// The statistic is U for `reference`. The p-value comes from the normal
/// approximation with tie and continuity corrections.
pub fn mann_whitney_u(reference: &[f64], current: &[f64]) -> TestResult {
    let n1 = reference.len() as f64;
    let n2 = current.len() as f64;
    if reference.is_empty() || current.is_empty() {
        return TestResult {
            statistic: 0.0,
            pvalue: 1.0,
        };
    }

    let (ranks, tie_term) = rank_with_ties(reference, current);
    let rank_sum: f64 = ranks[..reference.len()].iter().sum();
    let u1 = rank_sum - n1 * (n1 + 1.0) / 2.0;
    let u2 = n1 * n2 - u1;

    let n = n1 + n2;
    let mu = n1 * n2 / 2.0;
    let sigma = (n1 * n2 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)))).sqrt();
    if !sigma.is_finite() || sigma == 0.0 {
        return TestResult {
            statistic: u1,
            pvalue: 1.0,
        };
    }

    let z = (u1.max(u2) - mu - 0.5) / sigma;
    let pvalue = (2.0 * normal_survival(z)).clamp(0.0, 1.0);

    TestResult {
        statistic: u1,
        pvalue,
    }
}

fn normal_survival(z: f64) -> f64 {
    0.5 * erfc(z / std::f64::consts::SQRT_2)
}

/// Linear-interpolated quantile of already sorted values.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use statrs::distribution::{ContinuousCDF, Normal};

    /// Evenly spaced quantiles of Normal(mean, sd); a deterministic stand-in
    /// for a random sample.
    pub(crate) fn normal_sample(mean: f64, sd: f64, n: usize) -> Vec<f64> {
        let normal = Normal::new(mean, sd).unwrap();
        (0..n)
            .map(|i| normal.inverse_cdf((i as f64 + 0.5) / n as f64))
            .collect()
    }

    #[test]
    fn mean_and_sample_variance() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&values), 5.0);
        assert_relative_eq!(variance(&values), 32.0 / 7.0, epsilon = 1e-12);
        assert!(variance(&[1.0]).is_nan());
    }

    #[test]
    fn pooled_std_matches_formula() {
        let reference = [1.0, 2.0, 3.0, 4.0];
        let current = [2.0, 4.0, 6.0];
        let expected = ((3.0 * variance(&reference) + 2.0 * variance(&current)) / 5.0).sqrt();
        assert_relative_eq!(pooled_std(&reference, &current), expected, epsilon = 1e-12);
    }

    #[test]
    fn cohens_d_zero_for_constant_samples() {
        let reference = vec![5.0; 20];
        let current = vec![5.0; 20];
        assert_eq!(cohens_d(&reference, &current), 0.0);

        let shifted = vec![6.0; 20];
        assert_eq!(cohens_d(&reference, &shifted), 0.0);
    }

    #[test]
    fn cohens_d_sign_follows_current() {
        let reference = normal_sample(0.0, 1.0, 200);
        let current: Vec<f64> = reference.iter().map(|v| v + 1.0).collect();
        let d = cohens_d(&reference, &current);
        assert!(d > 0.9 && d < 1.1, "unexpected d {d}");
        assert!(cohens_d(&current, &reference) < 0.0);
    }

    #[test]
    fn ks_identical_samples() {
        let sample = normal_sample(10.0, 2.0, 100);
        let result = ks_two_sample(&sample, &sample);
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.pvalue, 1.0);
    }

    #[test]
    fn ks_statistic_counts_ties_together() {
        let result = ks_two_sample(&[1.0, 2.0, 3.0], &[3.0, 4.0, 5.0]);
        assert_relative_eq!(result.statistic, 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn ks_disjoint_samples() {
        let reference: Vec<f64> = (0..50).map(f64::from).collect();
        let current: Vec<f64> = (100..150).map(f64::from).collect();
        let result = ks_two_sample(&reference, &current);
        assert_eq!(result.statistic, 1.0);
        assert!(result.pvalue < 1e-10);
    }

    #[test]
    fn ks_small_samples_use_exact_distribution() {
        let reference: Vec<f64> = (0..10).map(f64::from).collect();
        let current: Vec<f64> = (6..16).map(f64::from).collect();
        let result = ks_two_sample(&reference, &current);

        assert_relative_eq!(result.statistic, 0.6, epsilon = 1e-12);
        // 2 * C(20, 4) / C(20, 10)
        assert_relative_eq!(result.pvalue, 9690.0 / 184_756.0, epsilon = 1e-12);
        assert!(result.pvalue > 0.05);
    }

    #[test]
    fn ks_exact_survival_known_values() {
        // 2 * C(20, 3) / C(20, 10)
        assert_relative_eq!(ks_exact_survival(10, 10, 0.7), 2280.0 / 184_756.0, epsilon = 1e-12);
        // only the two fully separated orderings out of C(6, 3)
        assert_relative_eq!(ks_exact_survival(3, 3, 1.0), 0.1, epsilon = 1e-12);
        assert_eq!(ks_exact_survival(4, 6, 0.0), 1.0);
        // first step always leaves the diagonal
        assert_relative_eq!(ks_exact_survival(3, 3, 1.0 / 3.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn ks_large_samples_use_asymptotic_series() {
        let reference = normal_sample(0.0, 1.0, 200);
        let current = normal_sample(0.3, 1.0, 200);
        let result = ks_two_sample(&reference, &current);

        let en = (200.0 * 200.0 / 400.0f64).sqrt();
        let expected = kolmogorov_survival((en + 0.12 + 0.11 / en) * result.statistic);
        assert_eq!(result.pvalue, expected);
    }

    #[test]
    fn kolmogorov_survival_known_values() {
        // Q_KS(1.36) is the classic 5% critical point
        assert_relative_eq!(kolmogorov_survival(1.36), 0.0494, epsilon = 1e-3);
        assert_relative_eq!(kolmogorov_survival(1.0), 0.2700, epsilon = 1e-3);
        assert_relative_eq!(kolmogorov_survival(0.5), 0.9639, epsilon = 1e-3);
    }

    #[test]
    fn ranks_average_over_ties() {
        let (ranks, tie_term) = rank_with_ties(&[1.0, 2.0], &[2.0, 3.0]);
        assert_eq!(ranks, vec![1.0, 2.5, 2.5, 4.0]);
        assert_relative_eq!(tie_term, 6.0);
    }

    #[test]
    fn mann_whitney_identical_samples() {
        let sample = normal_sample(0.0, 1.0, 50);
        let result = mann_whitney_u(&sample, &sample);
        assert_relative_eq!(result.statistic, 1250.0);
        assert_eq!(result.pvalue, 1.0);
    }

    #[test]
    fn mann_whitney_separated_samples() {
        let reference: Vec<f64> = (0..30).map(f64::from).collect();
        let current: Vec<f64> = (30..60).map(f64::from).collect();
        let result = mann_whitney_u(&reference, &current);
        assert_eq!(result.statistic, 0.0);
        assert!(result.pvalue < 1e-8);
    }

    #[test]
    fn mann_whitney_all_equal_values() {
        let result = mann_whitney_u(&[3.0; 12], &[3.0; 12]);
        assert_eq!(result.pvalue, 1.0);
    }

    #[test]
    fn quantiles_interpolate() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(quantile_sorted(&values, 0.5), 2.5);
        assert_relative_eq!(quantile_sorted(&values, 0.25), 1.75);
        assert_relative_eq!(quantile_sorted(&values, 1.0), 4.0);
    }
}
