//! Angular correlation measurements
//!
//! A spectrum holds one data vector with per-row bin metadata for a pair
//! of correlated quantities, referencing up to two kernels by name. The
//! kernel names are resolved lazily through the container.

use crate::error::Result;
use crate::types::{ColumnData, CorrelationType};
use crate::validation::{distinct_count, expect_len, expect_non_negative};
use crate::TwoPointError;

/// One angular correlation data vector with per-row bin metadata
///
/// Construction is staged in the builder style: [`SpectrumMeasurement::new`]
/// validates the core aligned columns, and the `with_*` methods attach the
/// optional angle column and caller-named extra columns, each validated
/// against the row count on attachment.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumMeasurement {
    name: String,
    bin1: Vec<i64>,
    bin2: Vec<i64>,
    type1: CorrelationType,
    type2: CorrelationType,
    kernel1: String,
    kernel2: String,
    bin_order: String,
    angular_bin: Vec<i64>,
    value: Vec<f64>,
    angle: Option<Vec<f64>>,
    angle_unit: Option<String>,
    extra_cols: Vec<(String, ColumnData)>,
}

impl SpectrumMeasurement {
    /// Build a spectrum from its required columns
    ///
    /// `bin1`, `bin2`, `angular_bin`, and `value` must be aligned; bin
    /// indices must be non-negative. Duplicate `(bin1, bin2, angular_bin)`
    /// triples are tolerated and left to the caller.
    #[allow(clippy::too_many_arguments)]
    pub fn new<K1, K2>(
        name: impl Into<String>,
        bins: (Vec<i64>, Vec<i64>),
        types: (CorrelationType, CorrelationType),
        kernels: (K1, K2),
        bin_order: impl Into<String>,
        angular_bin: Vec<i64>,
        value: Vec<f64>,
    ) -> Result<Self>
    where
        K1: Into<String>,
        K2: Into<String>,
    {
        let (bin1, bin2) = bins;
        let n = value.len();
        expect_len("bin1", n, bin1.len())?;
        expect_len("bin2", n, bin2.len())?;
        expect_len("angular_bin", n, angular_bin.len())?;
        expect_non_negative("bin1", &bin1)?;
        expect_non_negative("bin2", &bin2)?;
        expect_non_negative("angular_bin", &angular_bin)?;

        Ok(Self {
            name: name.into(),
            bin1,
            bin2,
            type1: types.0,
            type2: types.1,
            kernel1: kernels.0.into(),
            kernel2: kernels.1.into(),
            bin_order: bin_order.into(),
            angular_bin,
            value,
            angle: None,
            angle_unit: None,
            extra_cols: Vec::new(),
        })
    }

    /// Attach the angular separation column and its unit
    pub fn with_angle(mut self, angle: Vec<f64>, unit: impl Into<String>) -> Result<Self> {
        expect_len("angle", self.value.len(), angle.len())?;
        self.angle = Some(angle);
        self.angle_unit = Some(unit.into());
        Ok(self)
    }

    /// Attach a caller-named extra column, aligned with the data vector
    ///
    /// Column names must be unique within the measurement and must not
    /// shadow the required columns; insertion order is preserved through
    /// serialization.
    pub fn with_extra_col(mut self, name: impl Into<String>, col: ColumnData) -> Result<Self> {
        const RESERVED: [&str; 5] = ["bin1", "bin2", "angular_bin", "value", "angle"];
        let name = name.into();
        expect_len("extra_cols", self.value.len(), col.len())?;
        if RESERVED.contains(&name.as_str()) {
            return Err(TwoPointError::Validation {
                field: "extra_cols",
                reason: format!("`{name}` is a reserved column name"),
            });
        }
        if self.extra_cols.iter().any(|(n, _)| *n == name) {
            return Err(TwoPointError::AmbiguousName {
                kind: "extra column",
                name,
                count: 2,
            });
        }
        self.extra_cols.push((name, col));
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bin1(&self) -> &[i64] {
        &self.bin1
    }

    pub fn bin2(&self) -> &[i64] {
        &self.bin2
    }

    pub fn type1(&self) -> CorrelationType {
        self.type1
    }

    pub fn type2(&self) -> CorrelationType {
        self.type2
    }

    pub fn kernel1(&self) -> &str {
        &self.kernel1
    }

    pub fn kernel2(&self) -> &str {
        &self.kernel2
    }

    /// Free-form iteration-convention string (e.g. `"SAMPLE"`)
    pub fn bin_order(&self) -> &str {
        &self.bin_order
    }

    pub fn angular_bin(&self) -> &[i64] {
        &self.angular_bin
    }

    pub fn value(&self) -> &[f64] {
        &self.value
    }

    pub fn angle(&self) -> Option<&[f64]> {
        self.angle.as_deref()
    }

    pub fn angle_unit(&self) -> Option<&str> {
        self.angle_unit.as_deref()
    }

    /// Extra columns in insertion order
    pub fn extra_cols(&self) -> &[(String, ColumnData)] {
        &self.extra_cols
    }

    /// Look up an extra column by name
    pub fn extra_col(&self, name: &str) -> Option<&ColumnData> {
        self.extra_cols
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    /// Number of rows in the data vector
    pub fn rows(&self) -> usize {
        self.value.len()
    }

    /// Count of distinct first-side tomographic bins
    pub fn num_bin1(&self) -> usize {
        distinct_count(&self.bin1)
    }

    /// Count of distinct second-side tomographic bins
    pub fn num_bin2(&self) -> usize {
        distinct_count(&self.bin2)
    }

    /// Aligned sub-selection of every column, keeping rows where the
    /// predicate holds for the row index
    ///
    /// Row order is preserved; an empty selection is a valid (empty)
    /// measurement.
    pub fn select<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(usize) -> bool,
    {
        let keep: Vec<usize> = (0..self.rows()).filter(|&i| predicate(i)).collect();
        let pick_i64 = |v: &[i64]| -> Vec<i64> { keep.iter().map(|&i| v[i]).collect() };
        let pick_f64 = |v: &[f64]| -> Vec<f64> { keep.iter().map(|&i| v[i]).collect() };

        Self {
            name: self.name.clone(),
            bin1: pick_i64(&self.bin1),
            bin2: pick_i64(&self.bin2),
            type1: self.type1,
            type2: self.type2,
            kernel1: self.kernel1.clone(),
            kernel2: self.kernel2.clone(),
            bin_order: self.bin_order.clone(),
            angular_bin: pick_i64(&self.angular_bin),
            value: pick_f64(&self.value),
            angle: self.angle.as_deref().map(pick_f64),
            angle_unit: self.angle_unit.clone(),
            extra_cols: self
                .extra_cols
                .iter()
                .map(|(n, c)| (n.clone(), c.gather(&keep)))
                .collect(),
        }
    }
}
