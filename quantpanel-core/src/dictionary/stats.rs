//! Descriptive statistics — pure functions over f64 series.
//!
//! Every function ignores NaN cells and returns `None` when the
//! statistic is undefined for the surviving observation count
//! (std needs two, skewness three). Matching the conventions of the
//! pandas-era source data: std is the sample standard deviation
//! (ddof = 1) and skewness is the adjusted Fisher–Pearson coefficient.

/// Non-NaN observations of a series, in order.
pub fn observations(series: &[f64]) -> Vec<f64> {
    series.iter().copied().filter(|v| !v.is_nan()).collect()
}

/// Arithmetic mean of the non-NaN observations.
pub fn mean(series: &[f64]) -> Option<f64> {
    let obs = observations(series);
    if obs.is_empty() {
        return None;
    }
    Some(obs.iter().sum::<f64>() / obs.len() as f64)
}

/// Sample standard deviation (ddof = 1). Needs at least two observations.
pub fn sample_std(series: &[f64]) -> Option<f64> {
    let obs = observations(series);
    let n = obs.len();
    if n < 2 {
        return None;
    }
    let m = obs.iter().sum::<f64>() / n as f64;
    let var = obs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    Some(var.sqrt())
}

/// Minimum of the non-NaN observations.
pub fn min(series: &[f64]) -> Option<f64> {
    observations(series).into_iter().reduce(f64::min)
}

/// Maximum of the non-NaN observations.
pub fn max(series: &[f64]) -> Option<f64> {
    observations(series).into_iter().reduce(f64::max)
}

/// Last non-NaN observation.
pub fn last(series: &[f64]) -> Option<f64> {
    series.iter().rev().copied().find(|v| !v.is_nan())
}

/// Adjusted Fisher–Pearson skewness:
/// `n / ((n-1)(n-2)) * Σ((x - x̄) / s)³`.
///
/// Needs at least three observations and non-zero dispersion.
pub fn skewness(series: &[f64]) -> Option<f64> {
    let obs = observations(series);
    let n = obs.len();
    if n < 3 {
        return None;
    }
    let s = sample_std(series)?;
    if s < 1e-15 {
        return None;
    }
    let m = obs.iter().sum::<f64>() / n as f64;
    let cubed: f64 = obs.iter().map(|x| ((x - m) / s).powi(3)).sum();
    let nf = n as f64;
    Some(nf / ((nf - 1.0) * (nf - 2.0)) * cubed)
}

/// Annualized volatility: σ × √(periods per year).
pub fn annualized_volatility(std_dev: f64, periods_per_year: f64) -> f64 {
    std_dev * periods_per_year.sqrt()
}

/// Round to four decimal places — the dictionary's statistic precision.
pub fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Round to two decimal places — the completeness precision.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_skips_nan() {
        let series = [1.0, f64::NAN, 3.0];
        assert_eq!(mean(&series), Some(2.0));
        assert_eq!(mean(&[f64::NAN, f64::NAN]), None);
    }

    #[test]
    fn sample_std_uses_ddof_one() {
        // Sample std of [2, 4, 4, 4, 5, 5, 7, 9] is ~2.1381.
        let series = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let s = sample_std(&series).unwrap();
        assert!((s - 2.13809).abs() < 1e-4);
        assert_eq!(sample_std(&[1.0]), None);
    }

    #[test]
    fn min_max_last() {
        let series = [3.0, f64::NAN, 1.0, 2.0, f64::NAN];
        assert_eq!(min(&series), Some(1.0));
        assert_eq!(max(&series), Some(3.0));
        assert_eq!(last(&series), Some(2.0));
        assert_eq!(last(&[f64::NAN]), None);
    }

    #[test]
    fn skewness_of_symmetric_data_is_zero() {
        let series = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(skewness(&series).unwrap().abs() < 1e-12);
    }

    #[test]
    fn skewness_sign_follows_the_tail() {
        let right_tailed = [1.0, 1.0, 1.0, 1.0, 10.0];
        assert!(skewness(&right_tailed).unwrap() > 0.0);
        let left_tailed = [-10.0, 1.0, 1.0, 1.0, 1.0];
        assert!(skewness(&left_tailed).unwrap() < 0.0);
    }

    #[test]
    fn skewness_undefined_for_tiny_or_flat_series() {
        assert_eq!(skewness(&[1.0, 2.0]), None);
        assert_eq!(skewness(&[5.0, 5.0, 5.0, 5.0]), None);
    }

    #[test]
    fn annualized_vol_matches_sigma_root_252() {
        let sigma = 0.0123_f64;
        let vol = annualized_volatility(sigma, 252.0);
        assert_eq!(round4(vol), round4(sigma * 252.0_f64.sqrt()));
        assert!((round4(vol) - 0.1953).abs() < 1e-12);
    }

    #[test]
    fn rounding_precision() {
        assert_eq!(round4(0.123456), 0.1235);
        assert_eq!(round2(79.999), 80.0);
    }
}
