//! twopoint - Two-Point Measurement Bundle Format
//!
//! This library stores angular correlation measurements, auxiliary count
//! measurements, and the redshift-distribution kernels that calibrate
//! them in a single multi-extension binary file, and rebuilds the typed
//! records on reload.
//!
//! ## Architecture
//!
//! The workspace follows a specification/implementation separation:
//!
//! - **twopoint-core**: pure data model, typed columns, validation, and
//!   errors (no I/O)
//! - **twopoint**: the container, binary format definitions, and file codec
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use twopoint::{NumberDensity, TwoPointFile};
//!
//! fn example() -> twopoint::Result<()> {
//!     let nz = NumberDensity::new(
//!         "nz_source",
//!         vec![0.0, 0.1],
//!         vec![0.05, 0.15],
//!         vec![0.1, 0.2],
//!         vec![vec![1.0, 0.5]],
//!     )?;
//!     let bundle = TwoPointFile::new(vec![], vec![nz])?;
//!     bundle.to_file("bundle.2pt", true)?;
//!
//!     let reloaded = TwoPointFile::from_file("bundle.2pt", None)?;
//!     let kernel = reloaded.get_kernel("nz_source")?;
//!     println!("{} bins on {} redshifts", kernel.n_bin(), kernel.n_z());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Name-based lookup**: measurements and kernels resolve by name
//!   after reload; lookups are the referential integrity check point
//! - **Typed extra columns**: caller-named aligned columns survive
//!   round trips with their dtype
//! - **Safe writes**: files are staged and renamed, and an existing
//!   target is never clobbered without `overwrite`
//! - **Opaque covariance**: a covariance block is stored and retrieved
//!   by name, never interpreted

// Re-export the data model so callers need a single dependency
pub use twopoint_core::{
    ColumnData, CorrelationType, CountMeasurement, DataType, NumberDensity, Result,
    SpectrumMeasurement, TwoPointError,
};

pub mod container;
pub mod file_io;
pub mod format;

pub use container::{CovarianceMatrix, Measurement, TwoPointFile, COVMAT_NAME};
pub use file_io::WINDOWS_NAME;
