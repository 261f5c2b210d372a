//! File codec for measurement bundles
//!
//! One write or read is a single batch transaction: the writer assembles
//! the complete file in memory, stages it at a temporary sibling path,
//! and renames it into place; the reader loads the whole file and walks
//! every extension, dispatching on the header tag.

use std::fs;
use std::path::Path;

use log::debug;
use twopoint_core::{
    ColumnData, CountMeasurement, DataType, NumberDensity, Result, SpectrumMeasurement,
    TwoPointError,
};

use crate::container::{CovarianceMatrix, Measurement, TwoPointFile};
use crate::format::{
    align_to_8, decode_column, decode_columns, encode_column, encode_f64s, encode_i64s,
    ColumnDesc, ExtensionFrame, ExtensionHeader, FileHeader,
};

/// Extension name used for the window-function blob
pub const WINDOWS_NAME: &str = "WINDOWS";

fn pad_to_8(buf: &mut Vec<u8>) {
    buf.resize(align_to_8(buf.len()), 0);
}

fn f64_desc(name: &str, rows: usize) -> ColumnDesc {
    ColumnDesc {
        name: name.into(),
        dtype: DataType::F64,
        rows,
    }
}

fn i64_desc(name: &str, rows: usize) -> ColumnDesc {
    ColumnDesc {
        name: name.into(),
        dtype: DataType::I64,
        rows,
    }
}

fn kernel_extension(kernel: &NumberDensity) -> (ExtensionHeader, Vec<u8>) {
    let n_z = kernel.n_z();
    let mut columns = vec![
        f64_desc("z_low", n_z),
        f64_desc("z_mid", n_z),
        f64_desc("z_high", n_z),
    ];
    let mut data = Vec::new();
    encode_f64s(kernel.z_low(), &mut data);
    encode_f64s(kernel.z_mid(), &mut data);
    encode_f64s(kernel.z_high(), &mut data);
    for (i, nz) in kernel.nzs().iter().enumerate() {
        columns.push(f64_desc(&format!("bin{}", i + 1), n_z));
        encode_f64s(nz, &mut data);
    }

    (
        ExtensionHeader::Kernel {
            name: kernel.name().to_string(),
            n_z,
            n_bin: kernel.n_bin(),
            columns,
        },
        data,
    )
}

fn spectrum_extension(spectrum: &SpectrumMeasurement) -> (ExtensionHeader, Vec<u8>) {
    let rows = spectrum.rows();
    let mut columns = vec![
        i64_desc("bin1", rows),
        i64_desc("bin2", rows),
        i64_desc("angular_bin", rows),
        f64_desc("value", rows),
    ];
    let mut data = Vec::new();
    encode_i64s(spectrum.bin1(), &mut data);
    encode_i64s(spectrum.bin2(), &mut data);
    encode_i64s(spectrum.angular_bin(), &mut data);
    encode_f64s(spectrum.value(), &mut data);
    if let Some(angle) = spectrum.angle() {
        columns.push(f64_desc("angle", rows));
        encode_f64s(angle, &mut data);
    }
    for (name, col) in spectrum.extra_cols() {
        columns.push(ColumnDesc {
            name: name.clone(),
            dtype: col.data_type(),
            rows,
        });
        encode_column(col, &mut data);
    }

    (
        ExtensionHeader::Spectrum {
            name: spectrum.name().to_string(),
            quant1: spectrum.type1(),
            quant2: spectrum.type2(),
            kernel1: spectrum.kernel1().to_string(),
            kernel2: spectrum.kernel2().to_string(),
            bin_order: spectrum.bin_order().to_string(),
            angle_unit: spectrum.angle_unit().map(str::to_string),
            rows,
            columns,
        },
        data,
    )
}

fn count_extension(counts: &CountMeasurement) -> (ExtensionHeader, Vec<u8>) {
    let rows = counts.rows();
    let columns = vec![
        f64_desc("value", rows),
        i64_desc("zcl_bin", rows),
        i64_desc("lambda_bin", rows),
        f64_desc("z_lims_low", rows),
        f64_desc("z_lims_high", rows),
        f64_desc("lambda_lims_low", rows),
        f64_desc("lambda_lims_high", rows),
    ];
    let mut data = Vec::new();
    encode_f64s(counts.value(), &mut data);
    encode_i64s(counts.z_bins(), &mut data);
    encode_i64s(counts.lambda_bins(), &mut data);
    let lows: Vec<f64> = counts.z_lims().iter().map(|(lo, _)| *lo).collect();
    let highs: Vec<f64> = counts.z_lims().iter().map(|(_, hi)| *hi).collect();
    encode_f64s(&lows, &mut data);
    encode_f64s(&highs, &mut data);
    let lows: Vec<f64> = counts.lambda_lims().iter().map(|(lo, _)| *lo).collect();
    let highs: Vec<f64> = counts.lambda_lims().iter().map(|(_, hi)| *hi).collect();
    encode_f64s(&lows, &mut data);
    encode_f64s(&highs, &mut data);

    (
        ExtensionHeader::Count {
            name: counts.name().to_string(),
            kernel: counts.kernel().to_string(),
            rows,
            sigma_z_coeffs: counts.sigma_z_coeffs().map(|c| c.to_vec()),
            columns,
        },
        data,
    )
}

fn covariance_extension(cov: &CovarianceMatrix) -> (ExtensionHeader, Vec<u8>) {
    let mut data = Vec::new();
    encode_f64s(cov.values(), &mut data);
    (
        ExtensionHeader::Covariance {
            name: cov.name().to_string(),
            dim: cov.dim(),
        },
        data,
    )
}

/// Serialize a bundle to `path`
///
/// Extensions are written in container order: kernels, then
/// measurements, then covariance, then windows.
pub fn write_container(bundle: &TwoPointFile, path: &Path, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        return Err(TwoPointError::AlreadyExists(path.to_path_buf()));
    }

    let mut extensions: Vec<(ExtensionHeader, Vec<u8>)> = Vec::new();
    for kernel in bundle.kernels() {
        extensions.push(kernel_extension(kernel));
    }
    for measurement in bundle.measurements() {
        extensions.push(match measurement {
            Measurement::Spectrum(s) => spectrum_extension(s),
            Measurement::Count(c) => count_extension(c),
        });
    }
    if let Some(cov) = bundle.covariance() {
        extensions.push(covariance_extension(cov));
    }
    if let Some(payload) = bundle.windows() {
        extensions.push((
            ExtensionHeader::Windows {
                name: WINDOWS_NAME.to_string(),
                size: payload.len(),
            },
            payload.to_vec(),
        ));
    }

    let mut buf = Vec::new();
    buf.extend_from_slice(&FileHeader::new(extensions.len() as u64).to_bytes());
    for (header, data) in &extensions {
        let header_json = serde_json::to_vec(header)
            .map_err(|e| TwoPointError::Format(format!("extension header encode: {e}")))?;
        let frame = ExtensionFrame {
            header_len: header_json.len() as u32,
            data_len: data.len() as u64,
        };
        buf.extend_from_slice(&frame.to_bytes());
        buf.extend_from_slice(&header_json);
        pad_to_8(&mut buf);
        buf.extend_from_slice(data);
        pad_to_8(&mut buf);
    }

    // Stage next to the target so the rename stays on one filesystem.
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &buf)?;
    fs::rename(&tmp, path)?;
    debug!(
        "wrote {} extensions ({} bytes) to {}",
        extensions.len(),
        buf.len(),
        path.display()
    );
    Ok(())
}

/// Decoded columns of one extension, consumed by name during rebuild
struct ColumnSet {
    ext: String,
    cols: Vec<(String, ColumnData)>,
}

impl ColumnSet {
    fn decode(ext: &str, descs: &[ColumnDesc], data: &[u8]) -> Result<Self> {
        Ok(Self {
            ext: ext.to_string(),
            cols: decode_columns(descs, data)?,
        })
    }

    fn take(&mut self, name: &str) -> Option<ColumnData> {
        let idx = self.cols.iter().position(|(n, _)| n == name)?;
        Some(self.cols.remove(idx).1)
    }

    fn take_f64(&mut self, name: &str) -> Result<Vec<f64>> {
        match self.take(name) {
            Some(ColumnData::F64(v)) => Ok(v),
            Some(other) => Err(TwoPointError::Format(format!(
                "column `{name}` in `{}` has dtype {}, expected f64",
                self.ext,
                other.data_type()
            ))),
            None => Err(TwoPointError::Format(format!(
                "extension `{}` is missing required column `{name}`",
                self.ext
            ))),
        }
    }

    fn take_i64(&mut self, name: &str) -> Result<Vec<i64>> {
        match self.take(name) {
            Some(ColumnData::I64(v)) => Ok(v),
            Some(other) => Err(TwoPointError::Format(format!(
                "column `{name}` in `{}` has dtype {}, expected i64",
                self.ext,
                other.data_type()
            ))),
            None => Err(TwoPointError::Format(format!(
                "extension `{}` is missing required column `{name}`",
                self.ext
            ))),
        }
    }

    fn into_remaining(self) -> Vec<(String, ColumnData)> {
        self.cols
    }
}

fn expect_rows(ext: &str, columns: &[ColumnDesc], rows: usize) -> Result<()> {
    for desc in columns {
        if desc.rows != rows {
            return Err(TwoPointError::Format(format!(
                "column `{}` in `{ext}` has {} rows, expected {rows}",
                desc.name, desc.rows
            )));
        }
    }
    Ok(())
}

fn read_kernel(
    name: String,
    n_z: usize,
    n_bin: usize,
    columns: Vec<ColumnDesc>,
    data: &[u8],
) -> Result<NumberDensity> {
    expect_rows(&name, &columns, n_z)?;
    let mut cols = ColumnSet::decode(&name, &columns, data)?;
    let z_low = cols.take_f64("z_low")?;
    let z_mid = cols.take_f64("z_mid")?;
    let z_high = cols.take_f64("z_high")?;
    let mut nzs = Vec::with_capacity(n_bin);
    for i in 1..=n_bin {
        nzs.push(cols.take_f64(&format!("bin{i}"))?);
    }
    NumberDensity::new(name, z_low, z_mid, z_high, nzs)
}

#[allow(clippy::too_many_arguments)]
fn read_spectrum(
    name: String,
    quant1: twopoint_core::CorrelationType,
    quant2: twopoint_core::CorrelationType,
    kernel1: String,
    kernel2: String,
    bin_order: String,
    angle_unit: Option<String>,
    rows: usize,
    columns: Vec<ColumnDesc>,
    data: &[u8],
) -> Result<SpectrumMeasurement> {
    expect_rows(&name, &columns, rows)?;
    let has_angle = columns.iter().any(|c| c.name == "angle");
    let mut cols = ColumnSet::decode(&name, &columns, data)?;
    let bin1 = cols.take_i64("bin1")?;
    let bin2 = cols.take_i64("bin2")?;
    let angular_bin = cols.take_i64("angular_bin")?;
    let value = cols.take_f64("value")?;

    let mut spectrum = SpectrumMeasurement::new(
        name.clone(),
        (bin1, bin2),
        (quant1, quant2),
        (kernel1, kernel2),
        bin_order,
        angular_bin,
        value,
    )?;
    if has_angle {
        let angle = cols.take_f64("angle")?;
        let unit = angle_unit.ok_or_else(|| {
            TwoPointError::Format(format!("extension `{name}` has an angle column but no unit"))
        })?;
        spectrum = spectrum.with_angle(angle, unit)?;
    }
    for (col_name, col) in cols.into_remaining() {
        spectrum = spectrum.with_extra_col(col_name, col)?;
    }
    Ok(spectrum)
}

fn read_count(
    name: String,
    kernel: String,
    rows: usize,
    sigma_z_coeffs: Option<Vec<Vec<f64>>>,
    columns: Vec<ColumnDesc>,
    data: &[u8],
) -> Result<CountMeasurement> {
    expect_rows(&name, &columns, rows)?;
    let mut cols = ColumnSet::decode(&name, &columns, data)?;
    let value = cols.take_f64("value")?;
    let zcl_bin = cols.take_i64("zcl_bin")?;
    let lambda_bin = cols.take_i64("lambda_bin")?;
    let z_low = cols.take_f64("z_lims_low")?;
    let z_high = cols.take_f64("z_lims_high")?;
    let l_low = cols.take_f64("lambda_lims_low")?;
    let l_high = cols.take_f64("lambda_lims_high")?;
    let z_lims = z_low.into_iter().zip(z_high).collect();
    let lambda_lims = l_low.into_iter().zip(l_high).collect();

    let mut counts =
        CountMeasurement::new(name, kernel, value, zcl_bin, lambda_bin, z_lims, lambda_lims)?;
    if let Some(coeffs) = sigma_z_coeffs {
        counts = counts.with_sigma_z_coeffs(coeffs)?;
    }
    Ok(counts)
}

fn read_covariance(name: String, dim: usize, data: &[u8]) -> Result<CovarianceMatrix> {
    let desc = ColumnDesc {
        name: "covariance".into(),
        dtype: DataType::F64,
        rows: dim * dim,
    };
    let values = match decode_column(&desc, data)? {
        ColumnData::F64(v) => v,
        _ => unreachable!("descriptor dtype is f64"),
    };
    CovarianceMatrix::new(name, dim, values)
}

/// Deserialize a bundle from `path`
pub fn read_container(path: &Path, covariance_selector: Option<&str>) -> Result<TwoPointFile> {
    let bytes = fs::read(path)?;
    let header = FileHeader::from_bytes(&bytes)?;

    let mut kernels = Vec::new();
    let mut measurements = Vec::new();
    let mut covariance: Option<CovarianceMatrix> = None;
    let mut windows: Option<Vec<u8>> = None;

    let mut pos = FileHeader::SIZE;
    for _ in 0..header.extension_count {
        if pos + ExtensionFrame::SIZE > bytes.len() {
            return Err(TwoPointError::Format("truncated extension frame".into()));
        }
        let frame = ExtensionFrame::from_bytes(&bytes[pos..])?;
        pos += ExtensionFrame::SIZE;

        let header_end = pos + frame.header_len as usize;
        if header_end > bytes.len() {
            return Err(TwoPointError::Format(
                "truncated extension header".into(),
            ));
        }
        let ext: ExtensionHeader = serde_json::from_slice(&bytes[pos..header_end])
            .map_err(|e| TwoPointError::Format(format!("extension header decode: {e}")))?;

        pos = align_to_8(header_end);
        let data_end = pos + frame.data_len as usize;
        if data_end > bytes.len() {
            return Err(TwoPointError::Format(format!(
                "extension `{}` data extends beyond the file",
                ext.name()
            )));
        }
        let data = &bytes[pos..data_end];
        pos = align_to_8(data_end);

        match ext {
            ExtensionHeader::Kernel {
                name,
                n_z,
                n_bin,
                columns,
            } => kernels.push(read_kernel(name, n_z, n_bin, columns, data)?),
            ExtensionHeader::Spectrum {
                name,
                quant1,
                quant2,
                kernel1,
                kernel2,
                bin_order,
                angle_unit,
                rows,
                columns,
            } => measurements.push(Measurement::Spectrum(read_spectrum(
                name, quant1, quant2, kernel1, kernel2, bin_order, angle_unit, rows, columns,
                data,
            )?)),
            ExtensionHeader::Count {
                name,
                kernel,
                rows,
                sigma_z_coeffs,
                columns,
            } => measurements.push(Measurement::Count(read_count(
                name,
                kernel,
                rows,
                sigma_z_coeffs,
                columns,
                data,
            )?)),
            ExtensionHeader::Covariance { name, dim } => match covariance_selector {
                Some(selector) if selector == name && covariance.is_none() => {
                    covariance = Some(read_covariance(name, dim, data)?);
                }
                // No selector, or a different name: leave the blob on disk.
                _ => {}
            },
            ExtensionHeader::Windows { name, size } => {
                if size != data.len() {
                    return Err(TwoPointError::Format(format!(
                        "window blob `{name}` has {} bytes, header says {size}",
                        data.len()
                    )));
                }
                windows = Some(data.to_vec());
            }
        }
    }

    if let Some(selector) = covariance_selector {
        if covariance.is_none() {
            return Err(TwoPointError::NotFound {
                kind: "covariance extension",
                name: selector.to_string(),
            });
        }
    }

    debug!(
        "read {} measurements, {} kernels from {}",
        measurements.len(),
        kernels.len(),
        path.display()
    );

    let mut bundle = TwoPointFile::new(measurements, kernels)?;
    if let Some(cov) = covariance {
        bundle = bundle.with_covariance(cov)?;
    }
    if let Some(payload) = windows {
        bundle = bundle.with_windows(payload);
    }
    Ok(bundle)
}
