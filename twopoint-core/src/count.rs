//! Auxiliary count measurements
//!
//! Cluster counts per (redshift bin, richness bin), with the per-row bin
//! edges needed to evaluate selection functions, and an optional
//! polynomial model for the photometric scatter sigma(z) per richness bin.

use crate::error::Result;
use crate::validation::{distinct_count, expect_len, expect_non_negative, poly_eval};
use crate::TwoPointError;

/// Counts per (redshift, richness) bin referencing one kernel by name
#[derive(Debug, Clone, PartialEq)]
pub struct CountMeasurement {
    name: String,
    kernel: String,
    value: Vec<f64>,
    zcl_bin: Vec<i64>,
    lambda_bin: Vec<i64>,
    z_lims: Vec<(f64, f64)>,
    lambda_lims: Vec<(f64, f64)>,
    sigma_z_coeffs: Option<Vec<Vec<f64>>>,
}

impl CountMeasurement {
    /// Build a count measurement from aligned per-row columns
    ///
    /// `value`, `zcl_bin`, `lambda_bin`, `z_lims`, and `lambda_lims` must
    /// all have the same length; bin ids must be non-negative.
    pub fn new(
        name: impl Into<String>,
        kernel: impl Into<String>,
        value: Vec<f64>,
        zcl_bin: Vec<i64>,
        lambda_bin: Vec<i64>,
        z_lims: Vec<(f64, f64)>,
        lambda_lims: Vec<(f64, f64)>,
    ) -> Result<Self> {
        let m = value.len();
        expect_len("zcl_bin", m, zcl_bin.len())?;
        expect_len("lambda_bin", m, lambda_bin.len())?;
        expect_len("z_lims", m, z_lims.len())?;
        expect_len("lambda_lims", m, lambda_lims.len())?;
        expect_non_negative("zcl_bin", &zcl_bin)?;
        expect_non_negative("lambda_bin", &lambda_bin)?;

        Ok(Self {
            name: name.into(),
            kernel: kernel.into(),
            value,
            zcl_bin,
            lambda_bin,
            z_lims,
            lambda_lims,
            sigma_z_coeffs: None,
        })
    }

    /// Attach sigma(z) polynomial coefficients, one list per richness bin
    ///
    /// The outer length must equal the number of distinct `lambda_bin`
    /// values stored in the measurement.
    pub fn with_sigma_z_coeffs(mut self, coeffs: Vec<Vec<f64>>) -> Result<Self> {
        let n_lambda = distinct_count(&self.lambda_bin);
        if coeffs.len() != n_lambda {
            return Err(TwoPointError::Validation {
                field: "sigma_z_coeffs",
                reason: format!(
                    "{} coefficient lists for {n_lambda} richness bins",
                    coeffs.len()
                ),
            });
        }
        self.sigma_z_coeffs = Some(coeffs);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the referenced kernel, resolved lazily by the container
    pub fn kernel(&self) -> &str {
        &self.kernel
    }

    pub fn value(&self) -> &[f64] {
        &self.value
    }

    /// Cluster-redshift bin id per row
    pub fn z_bins(&self) -> &[i64] {
        &self.zcl_bin
    }

    /// Richness bin id per row
    pub fn lambda_bins(&self) -> &[i64] {
        &self.lambda_bin
    }

    /// Redshift bin edges `(low, high)` per row
    pub fn z_lims(&self) -> &[(f64, f64)] {
        &self.z_lims
    }

    /// Richness bin edges `(low, high)` per row
    pub fn lambda_lims(&self) -> &[(f64, f64)] {
        &self.lambda_lims
    }

    pub fn sigma_z_coeffs(&self) -> Option<&[Vec<f64>]> {
        self.sigma_z_coeffs.as_deref()
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.value.len()
    }

    /// Evaluate sigma(z) = sum_i a_i * z^i for one richness bin over a
    /// grid of redshifts
    ///
    /// Fails with `NotAvailable` when no coefficients were supplied and
    /// with `IndexOutOfRange` for a richness-bin index past the stored
    /// coefficient lists.
    pub fn get_sigma_z(&self, lambda_bin: usize, z_values: &[f64]) -> Result<Vec<f64>> {
        let coeffs = self
            .sigma_z_coeffs
            .as_ref()
            .ok_or(TwoPointError::NotAvailable("sigma_z_coeffs"))?;
        let row = coeffs
            .get(lambda_bin)
            .ok_or(TwoPointError::IndexOutOfRange {
                what: "sigma_z_coeffs",
                index: lambda_bin,
                len: coeffs.len(),
            })?;
        Ok(z_values.iter().map(|&z| poly_eval(row, z)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CountMeasurement {
        // 2 redshift bins x 3 richness bins
        let mut zcl = Vec::new();
        let mut lam = Vec::new();
        let mut zl = Vec::new();
        let mut ll = Vec::new();
        for z in 0..2i64 {
            for l in 0..3i64 {
                zcl.push(z);
                lam.push(l);
                zl.push((0.15 + 0.15 * z as f64, 0.3 + 0.2 * z as f64));
                ll.push((5.0 * (l + 1) as f64, 5.0 * (l + 2) as f64));
            }
        }
        CountMeasurement::new(
            "cluster_counts",
            "nz_cluster",
            vec![11.0, 12.0, 13.0, 21.0, 22.0, 23.0],
            zcl,
            lam,
            zl,
            ll,
        )
        .unwrap()
    }

    #[test]
    fn aligned_lengths_enforced() {
        let err = CountMeasurement::new(
            "c",
            "k",
            vec![1.0, 2.0],
            vec![0],
            vec![0, 0],
            vec![(0.0, 1.0); 2],
            vec![(0.0, 1.0); 2],
        )
        .unwrap_err();
        assert!(matches!(err, TwoPointError::Validation { field: "zcl_bin", .. }));
    }

    #[test]
    fn sigma_z_requires_matching_bin_count() {
        let err = sample()
            .with_sigma_z_coeffs(vec![vec![0.1], vec![0.2]])
            .unwrap_err();
        assert!(matches!(
            err,
            TwoPointError::Validation { field: "sigma_z_coeffs", .. }
        ));
    }

    #[test]
    fn sigma_z_polynomial() {
        let coeffs = vec![
            vec![-1.18159413, 1.1060884, -0.24906221, 0.02157702],
            vec![-1.22925508, 1.1175665, -0.25085154, 0.02129638],
            vec![-1.26122355, 1.12986624, -0.25394517, 0.0212711],
        ];
        let counts = sample().with_sigma_z_coeffs(coeffs.clone()).unwrap();
        let z: Vec<f64> = (0..100).map(|i| i as f64 / 99.0).collect();
        let sigma = counts.get_sigma_z(0, &z).unwrap();
        assert_eq!(sigma.len(), z.len());
        for (s, &zv) in sigma.iter().zip(&z) {
            let direct: f64 = coeffs[0]
                .iter()
                .enumerate()
                .map(|(i, a)| a * zv.powi(i as i32))
                .sum();
            assert!((s - direct).abs() < 1e-12);
        }
    }

    #[test]
    fn sigma_z_without_coeffs() {
        let err = sample().get_sigma_z(0, &[0.5]).unwrap_err();
        assert!(matches!(err, TwoPointError::NotAvailable(_)));
    }

    #[test]
    fn sigma_z_bad_index() {
        let counts = sample()
            .with_sigma_z_coeffs(vec![vec![0.1], vec![0.2], vec![0.3]])
            .unwrap();
        let err = counts.get_sigma_z(3, &[0.5]).unwrap_err();
        assert!(matches!(err, TwoPointError::IndexOutOfRange { .. }));
    }
}
