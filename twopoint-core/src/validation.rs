//! Validation utilities for record construction
//!
//! Pure functions with no I/O. Constructors call these to enforce the
//! aligned-length and ordering invariants of the data model.

use hashbrown::HashSet;

use crate::error::{Result, TwoPointError};

/// Check that a column has the expected row count
pub fn expect_len(field: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(TwoPointError::Validation {
            field,
            reason: format!("expected {expected} rows, got {actual}"),
        });
    }
    Ok(())
}

/// Check that every bin index is non-negative
pub fn expect_non_negative(field: &'static str, values: &[i64]) -> Result<()> {
    if let Some(bad) = values.iter().find(|&&v| v < 0) {
        return Err(TwoPointError::Validation {
            field,
            reason: format!("bin index {bad} is negative"),
        });
    }
    Ok(())
}

/// Check the redshift grid ordering `z_low[k] <= z_mid[k] <= z_high[k]`
///
/// Assumes the three grids already have equal length.
pub fn expect_ordered_grid(z_low: &[f64], z_mid: &[f64], z_high: &[f64]) -> Result<()> {
    for (k, ((lo, mid), hi)) in z_low.iter().zip(z_mid).zip(z_high).enumerate() {
        if !(lo <= mid && mid <= hi) {
            return Err(TwoPointError::Validation {
                field: "z_mid",
                reason: format!("grid row {k} not ordered: {lo} <= {mid} <= {hi} fails"),
            });
        }
    }
    Ok(())
}

/// Count the distinct values in an integer column
pub fn distinct_count(values: &[i64]) -> usize {
    values.iter().collect::<HashSet<_>>().len()
}

/// Evaluate the polynomial `sum_i a_i * z^i` at `z` (Horner form)
pub fn poly_eval(coeffs: &[f64], z: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, a| acc * z + a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expect_len_mismatch_names_field() {
        let err = expect_len("value", 4, 3).unwrap_err();
        assert!(err.to_string().contains("value"));
    }

    #[test]
    fn negative_bins_rejected() {
        assert!(expect_non_negative("bin1", &[0, 1, 2]).is_ok());
        assert!(expect_non_negative("bin1", &[0, -1]).is_err());
    }

    #[test]
    fn grid_ordering() {
        assert!(expect_ordered_grid(&[0.0, 0.1], &[0.05, 0.15], &[0.1, 0.2]).is_ok());
        assert!(expect_ordered_grid(&[0.0], &[0.2], &[0.1]).is_err());
    }

    #[test]
    fn distinct_count_ignores_repeats() {
        assert_eq!(distinct_count(&[0, 0, 1, 2, 2, 2]), 3);
        assert_eq!(distinct_count(&[]), 0);
    }

    #[test]
    fn poly_eval_matches_direct_sum() {
        let coeffs = [-1.18159413, 1.1060884, -0.24906221, 0.02157702];
        for &z in &[0.0f64, 0.3, 0.77, 1.5] {
            let direct: f64 = coeffs
                .iter()
                .enumerate()
                .map(|(i, a)| a * z.powi(i as i32))
                .sum();
            assert!((poly_eval(&coeffs, z) - direct).abs() < 1e-12);
        }
    }
}
