//! Codec behavior on structurally invalid files

use std::fs;

use tempfile::tempdir;
use twopoint::{
    CorrelationType, Measurement, SpectrumMeasurement, TwoPointFile, TwoPointError,
};

fn write_valid(path: &std::path::Path) {
    let spectrum = SpectrumMeasurement::new(
        "xi_plus",
        (vec![0, 1], vec![0, 1]),
        (
            CorrelationType::GalaxyShearPlusReal,
            CorrelationType::GalaxyShearPlusReal,
        ),
        ("nz_source", "nz_source"),
        "SAMPLE",
        vec![0, 0],
        vec![1.0e-5, 2.0e-5],
    )
    .unwrap();
    TwoPointFile::new(vec![Measurement::from(spectrum)], vec![])
        .unwrap()
        .to_file(path, false)
        .unwrap();
}

#[test]
fn bad_magic_is_format_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bundle.2pt");
    write_valid(&path);

    let mut bytes = fs::read(&path).unwrap();
    bytes[0] = b'X';
    fs::write(&path, &bytes).unwrap();

    let err = TwoPointFile::from_file(&path, None).unwrap_err();
    assert!(matches!(err, TwoPointError::Format(_)));
}

#[test]
fn truncated_file_is_format_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bundle.2pt");
    write_valid(&path);

    let bytes = fs::read(&path).unwrap();
    // Cut the file in the middle of the extension payload.
    fs::write(&path, &bytes[..bytes.len() - 9]).unwrap();

    let err = TwoPointFile::from_file(&path, None).unwrap_err();
    assert!(matches!(err, TwoPointError::Format(_)));
}

#[test]
fn empty_file_is_format_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.2pt");
    fs::write(&path, []).unwrap();

    let err = TwoPointFile::from_file(&path, None).unwrap_err();
    assert!(matches!(err, TwoPointError::Format(_)));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = TwoPointFile::from_file(dir.path().join("absent.2pt"), None).unwrap_err();
    assert!(matches!(err, TwoPointError::Io(_)));
}
