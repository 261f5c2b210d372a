//! twopoint-core - Two-Point Measurement Data Model
//!
//! This crate provides the in-memory records for two-point measurement
//! bundles: redshift-distribution kernels, spectrum and count
//! measurements, typed columns, and the shared error taxonomy. It holds
//! no I/O; the `twopoint` crate adds the container and the file codec.

pub mod count;
pub mod error;
pub mod kernel;
pub mod spectrum;
pub mod types;
pub mod validation;

pub use count::CountMeasurement;
pub use error::{Result, TwoPointError};
pub use kernel::NumberDensity;
pub use spectrum::SpectrumMeasurement;
pub use types::{ColumnData, CorrelationType, DataType};
