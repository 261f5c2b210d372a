//! The measurement bundle container
//!
//! A [`TwoPointFile`] aggregates measurements and kernels, optionally a
//! covariance matrix and a window-function blob, and owns the file
//! codec entry points. Kernel references held by measurements are
//! resolved lazily: `get_kernel` is the integrity-check point, so a
//! bundle can be assembled before every referenced kernel exists.

use std::path::Path;

use hashbrown::HashSet;
use twopoint_core::{
    CountMeasurement, NumberDensity, Result, SpectrumMeasurement, TwoPointError,
};

use crate::file_io;

/// Default extension name for the covariance block
pub const COVMAT_NAME: &str = "COVMAT";

/// A measurement record, tagged by variant
#[derive(Debug, Clone, PartialEq)]
pub enum Measurement {
    Spectrum(SpectrumMeasurement),
    Count(CountMeasurement),
}

impl Measurement {
    pub fn name(&self) -> &str {
        match self {
            Measurement::Spectrum(s) => s.name(),
            Measurement::Count(c) => c.name(),
        }
    }

    /// Number of rows contributed to the concatenated data vector
    pub fn rows(&self) -> usize {
        match self {
            Measurement::Spectrum(s) => s.rows(),
            Measurement::Count(c) => c.rows(),
        }
    }

    pub fn as_spectrum(&self) -> Option<&SpectrumMeasurement> {
        match self {
            Measurement::Spectrum(s) => Some(s),
            Measurement::Count(_) => None,
        }
    }

    pub fn as_count(&self) -> Option<&CountMeasurement> {
        match self {
            Measurement::Count(c) => Some(c),
            Measurement::Spectrum(_) => None,
        }
    }
}

impl From<SpectrumMeasurement> for Measurement {
    fn from(s: SpectrumMeasurement) -> Self {
        Measurement::Spectrum(s)
    }
}

impl From<CountMeasurement> for Measurement {
    fn from(c: CountMeasurement) -> Self {
        Measurement::Count(c)
    }
}

/// A named, opaque row-major 2D covariance block
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceMatrix {
    name: String,
    dim: usize,
    values: Vec<f64>,
}

impl CovarianceMatrix {
    /// Build a covariance block; `values` must hold `dim * dim` entries
    pub fn new(name: impl Into<String>, dim: usize, values: Vec<f64>) -> Result<Self> {
        if values.len() != dim * dim {
            return Err(TwoPointError::Validation {
                field: "covariance",
                reason: format!("{} values for a {dim}x{dim} matrix", values.len()),
            });
        }
        Ok(Self {
            name: name.into(),
            dim,
            values,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Row-major storage
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Element accessor, `None` out of bounds
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.dim && col < self.dim {
            Some(self.values[row * self.dim + col])
        } else {
            None
        }
    }
}

/// An ordered bundle of measurements and kernels with name-based lookup
#[derive(Debug, Clone, PartialEq)]
pub struct TwoPointFile {
    measurements: Vec<Measurement>,
    kernels: Vec<NumberDensity>,
    covariance: Option<CovarianceMatrix>,
    windows: Option<Vec<u8>>,
}

impl TwoPointFile {
    /// Assemble a bundle from already-built records
    ///
    /// Measurement names and kernel names must each be unique; kernel
    /// references are deliberately not checked here.
    pub fn new(measurements: Vec<Measurement>, kernels: Vec<NumberDensity>) -> Result<Self> {
        let mut seen = HashSet::new();
        for m in &measurements {
            if !seen.insert(m.name()) {
                return Err(TwoPointError::AmbiguousName {
                    kind: "measurement",
                    name: m.name().to_string(),
                    count: 2,
                });
            }
        }
        seen.clear();
        for k in &kernels {
            if !seen.insert(k.name()) {
                return Err(TwoPointError::AmbiguousName {
                    kind: "kernel",
                    name: k.name().to_string(),
                    count: 2,
                });
            }
        }
        drop(seen);

        Ok(Self {
            measurements,
            kernels,
            covariance: None,
            windows: None,
        })
    }

    /// Attach a covariance block whose dimension must match the total
    /// concatenated measurement length
    pub fn with_covariance(mut self, covariance: CovarianceMatrix) -> Result<Self> {
        let n = self.n_data_points();
        if covariance.dim() != n {
            return Err(TwoPointError::Validation {
                field: "covariance",
                reason: format!(
                    "dimension {} does not match {n} total data points",
                    covariance.dim()
                ),
            });
        }
        self.covariance = Some(covariance);
        Ok(self)
    }

    /// Attach an opaque window-function payload
    pub fn with_windows(mut self, payload: Vec<u8>) -> Self {
        self.windows = Some(payload);
        self
    }

    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    pub fn kernels(&self) -> &[NumberDensity] {
        &self.kernels
    }

    pub fn covariance(&self) -> Option<&CovarianceMatrix> {
        self.covariance.as_ref()
    }

    pub fn windows(&self) -> Option<&[u8]> {
        self.windows.as_deref()
    }

    /// Total concatenated length of all measurement data vectors
    pub fn n_data_points(&self) -> usize {
        self.measurements.iter().map(|m| m.rows()).sum()
    }

    /// Look up a measurement by exact name
    ///
    /// Zero matches is `NotFound`; more than one is `AmbiguousName`
    /// (construction prevents duplicates, lookup still defends).
    pub fn get_measurement(&self, name: &str) -> Result<&Measurement> {
        let mut matches = self.measurements.iter().filter(|m| m.name() == name);
        match (matches.next(), matches.next()) {
            (Some(m), None) => Ok(m),
            (None, _) => Err(TwoPointError::NotFound {
                kind: "measurement",
                name: name.to_string(),
            }),
            (Some(_), Some(_)) => Err(TwoPointError::AmbiguousName {
                kind: "measurement",
                name: name.to_string(),
                count: self
                    .measurements
                    .iter()
                    .filter(|m| m.name() == name)
                    .count(),
            }),
        }
    }

    /// Look up a kernel by exact name; same contract as `get_measurement`
    pub fn get_kernel(&self, name: &str) -> Result<&NumberDensity> {
        let mut matches = self.kernels.iter().filter(|k| k.name() == name);
        match (matches.next(), matches.next()) {
            (Some(k), None) => Ok(k),
            (None, _) => Err(TwoPointError::NotFound {
                kind: "kernel",
                name: name.to_string(),
            }),
            (Some(_), Some(_)) => Err(TwoPointError::AmbiguousName {
                kind: "kernel",
                name: name.to_string(),
                count: self.kernels.iter().filter(|k| k.name() == name).count(),
            }),
        }
    }

    /// Serialize the bundle to a single multi-extension file
    ///
    /// An existing target with `overwrite = false` fails with
    /// `AlreadyExists` before anything is written; otherwise the file is
    /// staged at a temporary path and renamed into place.
    pub fn to_file<P: AsRef<Path>>(&self, path: P, overwrite: bool) -> Result<()> {
        file_io::write_container(self, path.as_ref(), overwrite)
    }

    /// Deserialize a bundle from a file
    ///
    /// `covariance_selector = None` skips any covariance block in the
    /// file; `Some(name)` requires a covariance extension with that name
    /// and fails with `NotFound` otherwise.
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        covariance_selector: Option<&str>,
    ) -> Result<TwoPointFile> {
        file_io::read_container(path.as_ref(), covariance_selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twopoint_core::CorrelationType;

    fn kernel(name: &str) -> NumberDensity {
        NumberDensity::new(
            name,
            vec![0.0, 0.1],
            vec![0.05, 0.15],
            vec![0.1, 0.2],
            vec![vec![1.0, 0.5]],
        )
        .unwrap()
    }

    fn spectrum(name: &str) -> SpectrumMeasurement {
        SpectrumMeasurement::new(
            name,
            (vec![0, 0], vec![0, 1]),
            (
                CorrelationType::GalaxyPositionReal,
                CorrelationType::GalaxyShearPlusReal,
            ),
            ("nz_lens", "nz_source"),
            "SAMPLE",
            vec![0, 1],
            vec![1.0, 2.0],
        )
        .unwrap()
    }

    #[test]
    fn duplicate_measurement_names_rejected() {
        let err = TwoPointFile::new(
            vec![spectrum("xi").into(), spectrum("xi").into()],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, TwoPointError::AmbiguousName { kind: "measurement", .. }));
    }

    #[test]
    fn duplicate_kernel_names_rejected() {
        let err = TwoPointFile::new(vec![], vec![kernel("nz"), kernel("nz")]).unwrap_err();
        assert!(matches!(err, TwoPointError::AmbiguousName { kind: "kernel", .. }));
    }

    #[test]
    fn lookup_miss_is_not_found() {
        let bundle = TwoPointFile::new(vec![spectrum("xi").into()], vec![kernel("nz")]).unwrap();
        assert!(matches!(
            bundle.get_measurement("missing"),
            Err(TwoPointError::NotFound { kind: "measurement", .. })
        ));
        assert!(matches!(
            bundle.get_kernel("missing"),
            Err(TwoPointError::NotFound { kind: "kernel", .. })
        ));
        assert_eq!(bundle.get_measurement("xi").unwrap().name(), "xi");
        assert_eq!(bundle.get_kernel("nz").unwrap().name(), "nz");
    }

    #[test]
    fn lookup_defends_against_duplicates() {
        // Bypass the constructor to exercise the defensive path.
        let bundle = TwoPointFile {
            measurements: vec![spectrum("xi").into(), spectrum("xi").into()],
            kernels: vec![],
            covariance: None,
            windows: None,
        };
        assert!(matches!(
            bundle.get_measurement("xi"),
            Err(TwoPointError::AmbiguousName { count: 2, .. })
        ));
    }

    #[test]
    fn covariance_dimension_checked() {
        let bundle = TwoPointFile::new(vec![spectrum("xi").into()], vec![]).unwrap();
        let cov = CovarianceMatrix::new(COVMAT_NAME, 3, vec![0.0; 9]).unwrap();
        let err = bundle.with_covariance(cov).unwrap_err();
        assert!(matches!(err, TwoPointError::Validation { field: "covariance", .. }));

        let bundle = TwoPointFile::new(vec![spectrum("xi").into()], vec![]).unwrap();
        let cov = CovarianceMatrix::new(COVMAT_NAME, 2, vec![1.0, 0.1, 0.1, 1.0]).unwrap();
        let bundle = bundle.with_covariance(cov).unwrap();
        assert_eq!(bundle.covariance().unwrap().get(1, 0), Some(0.1));
    }

    #[test]
    fn covariance_shape_checked() {
        assert!(CovarianceMatrix::new("COVMAT", 3, vec![0.0; 8]).is_err());
    }
}
