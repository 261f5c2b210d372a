//! Redshift-distribution kernels
//!
//! A kernel carries one n(z) curve per tomographic bin on a shared
//! redshift grid. Measurements reference kernels by name; the kernel
//! itself has no dependencies on the rest of the model.

use crate::error::Result;
use crate::validation::{expect_len, expect_ordered_grid};
use crate::TwoPointError;

/// A named set of redshift distributions on a common grid
///
/// Immutable after construction; `new` enforces the grid invariants.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberDensity {
    name: String,
    z_low: Vec<f64>,
    z_mid: Vec<f64>,
    z_high: Vec<f64>,
    nzs: Vec<Vec<f64>>,
}

impl NumberDensity {
    /// Build a kernel from a redshift grid and per-bin distribution curves
    ///
    /// Requires a non-empty grid with equal-length low/mid/high edges,
    /// `z_low[k] <= z_mid[k] <= z_high[k]` everywhere, and every curve in
    /// `nzs` sampled on the full grid.
    pub fn new(
        name: impl Into<String>,
        z_low: Vec<f64>,
        z_mid: Vec<f64>,
        z_high: Vec<f64>,
        nzs: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let n_z = z_mid.len();
        if n_z == 0 {
            return Err(TwoPointError::Validation {
                field: "z_mid",
                reason: "redshift grid is empty".into(),
            });
        }
        expect_len("z_low", n_z, z_low.len())?;
        expect_len("z_high", n_z, z_high.len())?;
        expect_ordered_grid(&z_low, &z_mid, &z_high)?;
        for (i, nz) in nzs.iter().enumerate() {
            if nz.len() != n_z {
                return Err(TwoPointError::Validation {
                    field: "nzs",
                    reason: format!("curve {i} has {} samples, grid has {n_z}", nz.len()),
                });
            }
        }

        Ok(Self {
            name: name.into(),
            z_low,
            z_mid,
            z_high,
            nzs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn z_low(&self) -> &[f64] {
        &self.z_low
    }

    pub fn z_mid(&self) -> &[f64] {
        &self.z_mid
    }

    /// Alias for the mid grid, matching the conventional attribute name
    pub fn z(&self) -> &[f64] {
        &self.z_mid
    }

    pub fn z_high(&self) -> &[f64] {
        &self.z_high
    }

    /// One distribution curve per tomographic bin
    pub fn nzs(&self) -> &[Vec<f64>] {
        &self.nzs
    }

    /// Number of samples in the redshift grid
    pub fn n_z(&self) -> usize {
        self.z_mid.len()
    }

    /// Number of tomographic bins (distribution curves)
    pub fn n_bin(&self) -> usize {
        self.nzs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let step = 2.0 / n as f64;
        let lo: Vec<f64> = (0..n).map(|i| i as f64 * step).collect();
        let hi: Vec<f64> = (0..n).map(|i| (i + 1) as f64 * step).collect();
        let mid: Vec<f64> = lo.iter().zip(&hi).map(|(a, b)| 0.5 * (a + b)).collect();
        (lo, mid, hi)
    }

    #[test]
    fn valid_kernel() {
        let (lo, mid, hi) = grid(8);
        let nz = NumberDensity::new("nz_src", lo, mid, hi, vec![vec![1.0; 8], vec![2.0; 8]])
            .unwrap();
        assert_eq!(nz.n_z(), 8);
        assert_eq!(nz.n_bin(), 2);
        assert_eq!(nz.z(), nz.z_mid());
    }

    #[test]
    fn mismatched_grid_rejected() {
        let (lo, mid, _) = grid(8);
        let err = NumberDensity::new("nz", lo, mid, vec![0.0; 7], vec![]).unwrap_err();
        assert!(matches!(err, TwoPointError::Validation { field: "z_high", .. }));
    }

    #[test]
    fn unordered_edges_rejected() {
        let err = NumberDensity::new(
            "nz",
            vec![0.0, 0.5],
            vec![0.4, 0.4],
            vec![0.5, 1.0],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, TwoPointError::Validation { .. }));
    }

    #[test]
    fn short_curve_rejected() {
        let (lo, mid, hi) = grid(8);
        let err = NumberDensity::new("nz", lo, mid, hi, vec![vec![1.0; 7]]).unwrap_err();
        assert!(matches!(err, TwoPointError::Validation { field: "nzs", .. }));
    }
}
