//! Column storage types and correlation-quantity tags
//!
//! This module defines the closed set of numeric kinds a column can hold
//! and the tagged array type used for measurement columns, along with the
//! enumeration of correlation quantities carried in spectrum headers.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TwoPointError};

/// Numeric kinds storable in a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum DataType {
    /// 32-bit floating point
    F32 = 0,
    /// 64-bit floating point
    F64 = 1,
    /// 32-bit signed integer
    I32 = 2,
    /// 64-bit signed integer
    I64 = 3,
    /// 32-bit unsigned integer
    U32 = 4,
    /// 64-bit unsigned integer
    U64 = 5,
}

impl DataType {
    /// Convert from u8 representation
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(DataType::F32),
            1 => Some(DataType::F64),
            2 => Some(DataType::I32),
            3 => Some(DataType::I64),
            4 => Some(DataType::U32),
            5 => Some(DataType::U64),
            _ => None,
        }
    }

    /// Convert to u8 representation
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Size in bytes of one element of this kind
    pub const fn size_bytes(self) -> usize {
        match self {
            DataType::F32 | DataType::I32 | DataType::U32 => 4,
            DataType::F64 | DataType::I64 | DataType::U64 => 8,
        }
    }
}

impl core::fmt::Display for DataType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DataType::F32 => write!(f, "f32"),
            DataType::F64 => write!(f, "f64"),
            DataType::I32 => write!(f, "i32"),
            DataType::I64 => write!(f, "i64"),
            DataType::U32 => write!(f, "u32"),
            DataType::U64 => write!(f, "u64"),
        }
    }
}

/// A tagged numeric array, one variant per [`DataType`]
///
/// Extra measurement columns are caller-named and may use any of these
/// kinds; the tag survives serialization so a reloaded column has the
/// same dtype as the one written.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    F32(Vec<f32>),
    F64(Vec<f64>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    U32(Vec<u32>),
    U64(Vec<u64>),
}

impl ColumnData {
    /// Number of rows in the column
    pub fn len(&self) -> usize {
        match self {
            ColumnData::F32(v) => v.len(),
            ColumnData::F64(v) => v.len(),
            ColumnData::I32(v) => v.len(),
            ColumnData::I64(v) => v.len(),
            ColumnData::U32(v) => v.len(),
            ColumnData::U64(v) => v.len(),
        }
    }

    /// Whether the column has no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The numeric kind of this column
    pub const fn data_type(&self) -> DataType {
        match self {
            ColumnData::F32(_) => DataType::F32,
            ColumnData::F64(_) => DataType::F64,
            ColumnData::I32(_) => DataType::I32,
            ColumnData::I64(_) => DataType::I64,
            ColumnData::U32(_) => DataType::U32,
            ColumnData::U64(_) => DataType::U64,
        }
    }

    /// Row value widened to f64, `None` if out of bounds
    pub fn as_f64(&self, idx: usize) -> Option<f64> {
        match self {
            ColumnData::F32(v) => v.get(idx).map(|x| *x as f64),
            ColumnData::F64(v) => v.get(idx).copied(),
            ColumnData::I32(v) => v.get(idx).map(|x| *x as f64),
            ColumnData::I64(v) => v.get(idx).map(|x| *x as f64),
            ColumnData::U32(v) => v.get(idx).map(|x| *x as f64),
            ColumnData::U64(v) => v.get(idx).map(|x| *x as f64),
        }
    }

    /// Row value as i64 for integer variants, `None` for float variants
    /// or out-of-bounds rows
    pub fn as_i64(&self, idx: usize) -> Option<i64> {
        match self {
            ColumnData::I32(v) => v.get(idx).map(|x| *x as i64),
            ColumnData::I64(v) => v.get(idx).copied(),
            ColumnData::U32(v) => v.get(idx).map(|x| *x as i64),
            ColumnData::U64(v) => v.get(idx).map(|x| *x as i64),
            ColumnData::F32(_) | ColumnData::F64(_) => None,
        }
    }

    /// Sub-selection by row index, preserving the order of `keep`
    ///
    /// Rows in `keep` must be in bounds; callers derive the index list
    /// from this column's own row count.
    pub fn gather(&self, keep: &[usize]) -> ColumnData {
        fn pick<T: Copy>(v: &[T], keep: &[usize]) -> Vec<T> {
            keep.iter().map(|&i| v[i]).collect()
        }
        match self {
            ColumnData::F32(v) => ColumnData::F32(pick(v, keep)),
            ColumnData::F64(v) => ColumnData::F64(pick(v, keep)),
            ColumnData::I32(v) => ColumnData::I32(pick(v, keep)),
            ColumnData::I64(v) => ColumnData::I64(pick(v, keep)),
            ColumnData::U32(v) => ColumnData::U32(pick(v, keep)),
            ColumnData::U64(v) => ColumnData::U64(pick(v, keep)),
        }
    }
}

impl From<Vec<f32>> for ColumnData {
    fn from(v: Vec<f32>) -> Self {
        ColumnData::F32(v)
    }
}

impl From<Vec<f64>> for ColumnData {
    fn from(v: Vec<f64>) -> Self {
        ColumnData::F64(v)
    }
}

impl From<Vec<i32>> for ColumnData {
    fn from(v: Vec<i32>) -> Self {
        ColumnData::I32(v)
    }
}

impl From<Vec<i64>> for ColumnData {
    fn from(v: Vec<i64>) -> Self {
        ColumnData::I64(v)
    }
}

impl From<Vec<u32>> for ColumnData {
    fn from(v: Vec<u32>) -> Self {
        ColumnData::U32(v)
    }
}

impl From<Vec<u64>> for ColumnData {
    fn from(v: Vec<u64>) -> Self {
        ColumnData::U64(v)
    }
}

/// Correlation-quantity kinds for the two sides of a spectrum
///
/// The serialized form is the two-point code string (`"GPR"`, `"G+R"`, ...)
/// so headers written here match files produced by other tooling for this
/// format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelationType {
    #[serde(rename = "GPF")]
    GalaxyPositionFourier,
    #[serde(rename = "GEF")]
    GalaxyShearEmodeFourier,
    #[serde(rename = "GBF")]
    GalaxyShearBmodeFourier,
    #[serde(rename = "GPR")]
    GalaxyPositionReal,
    #[serde(rename = "G+R")]
    GalaxyShearPlusReal,
    #[serde(rename = "G-R")]
    GalaxyShearMinusReal,
}

impl CorrelationType {
    /// The short code string recorded in extension headers
    pub const fn code(self) -> &'static str {
        match self {
            CorrelationType::GalaxyPositionFourier => "GPF",
            CorrelationType::GalaxyShearEmodeFourier => "GEF",
            CorrelationType::GalaxyShearBmodeFourier => "GBF",
            CorrelationType::GalaxyPositionReal => "GPR",
            CorrelationType::GalaxyShearPlusReal => "G+R",
            CorrelationType::GalaxyShearMinusReal => "G-R",
        }
    }

    /// Resolve a code string back to a tag
    pub fn from_code(code: &str) -> Result<Self> {
        match code {
            "GPF" => Ok(CorrelationType::GalaxyPositionFourier),
            "GEF" => Ok(CorrelationType::GalaxyShearEmodeFourier),
            "GBF" => Ok(CorrelationType::GalaxyShearBmodeFourier),
            "GPR" => Ok(CorrelationType::GalaxyPositionReal),
            "G+R" => Ok(CorrelationType::GalaxyShearPlusReal),
            "G-R" => Ok(CorrelationType::GalaxyShearMinusReal),
            other => Err(TwoPointError::Format(format!(
                "unknown correlation type code `{other}`"
            ))),
        }
    }
}

impl core::fmt::Display for CorrelationType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_u8_roundtrip() {
        for raw in 0..=5u8 {
            let dt = DataType::from_u8(raw).unwrap();
            assert_eq!(dt.to_u8(), raw);
        }
        assert_eq!(DataType::from_u8(6), None);
    }

    #[test]
    fn column_gather_preserves_order() {
        let col = ColumnData::from(vec![10i64, 20, 30, 40]);
        let picked = col.gather(&[3, 0]);
        assert_eq!(picked, ColumnData::from(vec![40i64, 10]));
    }

    #[test]
    fn correlation_codes_roundtrip() {
        for t in [
            CorrelationType::GalaxyPositionFourier,
            CorrelationType::GalaxyShearEmodeFourier,
            CorrelationType::GalaxyShearBmodeFourier,
            CorrelationType::GalaxyPositionReal,
            CorrelationType::GalaxyShearPlusReal,
            CorrelationType::GalaxyShearMinusReal,
        ] {
            assert_eq!(CorrelationType::from_code(t.code()).unwrap(), t);
        }
        assert!(CorrelationType::from_code("XYZ").is_err());
    }
}
