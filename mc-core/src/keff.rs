//! The k_eff accumulator (C7): running mean and Bessel-corrected sample
//! standard deviation over the active-batch k_eff estimates.

/// Mean and sample standard deviation of `keff[0..n]`.
///
/// `std` is `NaN` for `n == 1` (a single sample has no sample variance);
/// the driver prints it anyway. Never called with `n == 0`.
#[must_use]
pub fn mean_and_std(keff: &[f64]) -> (f64, f64) {
    let n = keff.len();
    assert!(n > 0, "k_eff accumulator called with an empty slice");

    let mean = keff.iter().sum::<f64>() / n as f64;
    let variance = keff.iter().map(|k| (k - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);

    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_active_batch_mean_is_that_batch() {
        let (mean, _) = mean_and_std(&[1.0042]);
        assert_eq!(mean, 1.0042);
    }

    #[test]
    fn single_active_batch_std_is_nan() {
        let (_, std) = mean_and_std(&[1.0042]);
        assert!(std.is_nan());
    }

    #[test]
    fn matches_scenario_s5() {
        // keff = [1.00, 1.02, 0.99] => mean ~= 1.00333, std ~= 0.01528
        let (mean, std) = mean_and_std(&[1.00, 1.02, 0.99]);
        assert!((mean - 1.003_333_333).abs() < 1e-9);
        assert!((std - 0.015_275_25).abs() < 1e-6);
    }
}
