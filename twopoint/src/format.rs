//! Binary multi-extension layout definitions
//!
//! A bundle file is a fixed-size file header followed by a sequence of
//! extensions. Each extension is a small fixed frame, a JSON header block
//! describing the extension kind and its columns, and an 8-byte-aligned
//! data block holding the column payloads in little-endian order.

use serde::{Deserialize, Serialize};
use twopoint_core::{ColumnData, CorrelationType, DataType, Result, TwoPointError};

/// Magic bytes for bundle files
pub const FILE_MAGIC: [u8; 4] = *b"2PTF";

/// Magic bytes for extension frames
pub const EXTENSION_MAGIC: [u8; 4] = *b"EXTN";

/// Current format version
pub const FORMAT_VERSION: u8 = 1;

/// Align an offset to the next 8-byte boundary
pub const fn align_to_8(offset: usize) -> usize {
    (offset + 7) & !7
}

/// Fixed-size file header (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Format version
    pub version: u8,
    /// Number of extensions that follow
    pub extension_count: u64,
}

impl FileHeader {
    /// Size of the header in bytes
    pub const SIZE: usize = 16;

    /// Create a header for a file with the given extension count
    pub const fn new(extension_count: u64) -> Self {
        Self {
            version: FORMAT_VERSION,
            extension_count,
        }
    }

    /// Convert header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&FILE_MAGIC);
        bytes[4] = self.version;
        // bytes 5-7 reserved, stay zero
        bytes[8..16].copy_from_slice(&self.extension_count.to_le_bytes());
        bytes
    }

    /// Parse and validate a header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(TwoPointError::Format(
                "file shorter than the fixed header".into(),
            ));
        }
        if bytes[0..4] != FILE_MAGIC {
            return Err(TwoPointError::Format("bad file magic".into()));
        }
        let version = bytes[4];
        if version > FORMAT_VERSION {
            return Err(TwoPointError::Format(format!(
                "unsupported format version {version}"
            )));
        }
        let mut count = [0u8; 8];
        count.copy_from_slice(&bytes[8..16]);

        Ok(Self {
            version,
            extension_count: u64::from_le_bytes(count),
        })
    }
}

/// Per-extension frame (16 bytes) preceding the JSON header block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionFrame {
    /// Byte length of the JSON header block
    pub header_len: u32,
    /// Byte length of the data block
    pub data_len: u64,
}

impl ExtensionFrame {
    /// Size of the frame in bytes
    pub const SIZE: usize = 16;

    /// Convert frame to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&EXTENSION_MAGIC);
        bytes[4..8].copy_from_slice(&self.header_len.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.data_len.to_le_bytes());
        bytes
    }

    /// Parse and validate a frame from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(TwoPointError::Format(
                "truncated extension frame".into(),
            ));
        }
        if bytes[0..4] != EXTENSION_MAGIC {
            return Err(TwoPointError::Format("bad extension magic".into()));
        }
        let mut header_len = [0u8; 4];
        header_len.copy_from_slice(&bytes[4..8]);
        let mut data_len = [0u8; 8];
        data_len.copy_from_slice(&bytes[8..16]);

        Ok(Self {
            header_len: u32::from_le_bytes(header_len),
            data_len: u64::from_le_bytes(data_len),
        })
    }
}

/// One named, typed column inside an extension's data block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDesc {
    pub name: String,
    pub dtype: DataType,
    pub rows: usize,
}

impl ColumnDesc {
    /// Byte length of the column's payload
    pub fn byte_len(&self) -> usize {
        self.rows * self.dtype.size_bytes()
    }
}

/// Typed extension header, serialized as the JSON block of each extension
///
/// The `kind` tag is the type indicator used for read dispatch; an
/// unknown or missing tag fails deserialization and surfaces as a
/// `Format` error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtensionHeader {
    Kernel {
        name: String,
        n_z: usize,
        n_bin: usize,
        columns: Vec<ColumnDesc>,
    },
    Spectrum {
        name: String,
        quant1: CorrelationType,
        quant2: CorrelationType,
        kernel1: String,
        kernel2: String,
        bin_order: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        angle_unit: Option<String>,
        rows: usize,
        columns: Vec<ColumnDesc>,
    },
    Count {
        name: String,
        kernel: String,
        rows: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sigma_z_coeffs: Option<Vec<Vec<f64>>>,
        columns: Vec<ColumnDesc>,
    },
    Covariance {
        name: String,
        dim: usize,
    },
    Windows {
        name: String,
        size: usize,
    },
}

impl ExtensionHeader {
    /// The extension's name as recorded in its header
    pub fn name(&self) -> &str {
        match self {
            ExtensionHeader::Kernel { name, .. }
            | ExtensionHeader::Spectrum { name, .. }
            | ExtensionHeader::Count { name, .. }
            | ExtensionHeader::Covariance { name, .. }
            | ExtensionHeader::Windows { name, .. } => name,
        }
    }
}

/// Append a little-endian f64 column payload
pub fn encode_f64s(values: &[f64], out: &mut Vec<u8>) {
    out.reserve(values.len() * 8);
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
}

/// Append a little-endian i64 column payload
pub fn encode_i64s(values: &[i64], out: &mut Vec<u8>) {
    out.reserve(values.len() * 8);
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
}

/// Append any column's payload in little-endian order
pub fn encode_column(col: &ColumnData, out: &mut Vec<u8>) {
    match col {
        ColumnData::F32(v) => {
            for x in v {
                out.extend_from_slice(&x.to_le_bytes());
            }
        }
        ColumnData::F64(v) => encode_f64s(v, out),
        ColumnData::I32(v) => {
            for x in v {
                out.extend_from_slice(&x.to_le_bytes());
            }
        }
        ColumnData::I64(v) => encode_i64s(v, out),
        ColumnData::U32(v) => {
            for x in v {
                out.extend_from_slice(&x.to_le_bytes());
            }
        }
        ColumnData::U64(v) => {
            for x in v {
                out.extend_from_slice(&x.to_le_bytes());
            }
        }
    }
}

/// Decode one column payload against its descriptor
///
/// `bytes` must be exactly the column's payload; a size mismatch is a
/// `Format` error.
pub fn decode_column(desc: &ColumnDesc, bytes: &[u8]) -> Result<ColumnData> {
    let expected = desc.byte_len();
    if bytes.len() != expected {
        return Err(TwoPointError::Format(format!(
            "column `{}` has {} payload bytes, expected {expected}",
            desc.name,
            bytes.len()
        )));
    }

    fn take4(chunk: &[u8]) -> [u8; 4] {
        let mut b = [0u8; 4];
        b.copy_from_slice(chunk);
        b
    }
    fn take8(chunk: &[u8]) -> [u8; 8] {
        let mut b = [0u8; 8];
        b.copy_from_slice(chunk);
        b
    }

    let col = match desc.dtype {
        DataType::F32 => ColumnData::F32(
            bytes
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes(take4(c)))
                .collect(),
        ),
        DataType::F64 => ColumnData::F64(
            bytes
                .chunks_exact(8)
                .map(|c| f64::from_le_bytes(take8(c)))
                .collect(),
        ),
        DataType::I32 => ColumnData::I32(
            bytes
                .chunks_exact(4)
                .map(|c| i32::from_le_bytes(take4(c)))
                .collect(),
        ),
        DataType::I64 => ColumnData::I64(
            bytes
                .chunks_exact(8)
                .map(|c| i64::from_le_bytes(take8(c)))
                .collect(),
        ),
        DataType::U32 => ColumnData::U32(
            bytes
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes(take4(c)))
                .collect(),
        ),
        DataType::U64 => ColumnData::U64(
            bytes
                .chunks_exact(8)
                .map(|c| u64::from_le_bytes(take8(c)))
                .collect(),
        ),
    };
    Ok(col)
}

/// Decode a full data block against its column descriptors
///
/// Columns are concatenated in descriptor order with no padding between
/// them; trailing bytes are a `Format` error.
pub fn decode_columns(descs: &[ColumnDesc], data: &[u8]) -> Result<Vec<(String, ColumnData)>> {
    let mut offset = 0usize;
    let mut cols = Vec::with_capacity(descs.len());
    for desc in descs {
        let end = offset + desc.byte_len();
        if end > data.len() {
            return Err(TwoPointError::Format(format!(
                "column `{}` extends beyond the data block",
                desc.name
            )));
        }
        cols.push((desc.name.clone(), decode_column(desc, &data[offset..end])?));
        offset = end;
    }
    if offset != data.len() {
        return Err(TwoPointError::Format(format!(
            "{} trailing bytes after the described columns",
            data.len() - offset
        )));
    }
    Ok(cols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_header_roundtrip() {
        let header = FileHeader::new(5);
        let parsed = FileHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn bad_magic_rejected() {
        let mut bytes = FileHeader::new(1).to_bytes();
        bytes[0] = b'X';
        assert!(matches!(
            FileHeader::from_bytes(&bytes),
            Err(TwoPointError::Format(_))
        ));
    }

    #[test]
    fn newer_version_rejected() {
        let mut bytes = FileHeader::new(1).to_bytes();
        bytes[4] = FORMAT_VERSION + 1;
        assert!(FileHeader::from_bytes(&bytes).is_err());
    }

    #[test]
    fn frame_roundtrip() {
        let frame = ExtensionFrame {
            header_len: 123,
            data_len: 4096,
        };
        assert_eq!(ExtensionFrame::from_bytes(&frame.to_bytes()).unwrap(), frame);
    }

    #[test]
    fn column_codec_roundtrip() {
        let col = ColumnData::from(vec![1.5f64, -2.25, 0.0]);
        let desc = ColumnDesc {
            name: "value".into(),
            dtype: DataType::F64,
            rows: 3,
        };
        let mut bytes = Vec::new();
        encode_column(&col, &mut bytes);
        assert_eq!(decode_column(&desc, &bytes).unwrap(), col);

        let ints = ColumnData::from(vec![-3i64, 0, 9]);
        let idesc = ColumnDesc {
            name: "bin1".into(),
            dtype: DataType::I64,
            rows: 3,
        };
        let mut ibytes = Vec::new();
        encode_column(&ints, &mut ibytes);
        assert_eq!(decode_column(&idesc, &ibytes).unwrap(), ints);
    }

    #[test]
    fn payload_size_mismatch_is_format_error() {
        let desc = ColumnDesc {
            name: "value".into(),
            dtype: DataType::F64,
            rows: 4,
        };
        assert!(matches!(
            decode_column(&desc, &[0u8; 24]),
            Err(TwoPointError::Format(_))
        ));
    }

    #[test]
    fn trailing_bytes_rejected() {
        let descs = [ColumnDesc {
            name: "value".into(),
            dtype: DataType::F64,
            rows: 1,
        }];
        assert!(decode_columns(&descs, &[0u8; 16]).is_err());
    }

    #[test]
    fn header_kind_tag_dispatch() {
        let json = serde_json::to_vec(&ExtensionHeader::Covariance {
            name: "COVMAT".into(),
            dim: 4,
        })
        .unwrap();
        let parsed: ExtensionHeader = serde_json::from_slice(&json).unwrap();
        assert_eq!(parsed.name(), "COVMAT");

        let unknown = br#"{"kind":"mystery","name":"x"}"#;
        assert!(serde_json::from_slice::<ExtensionHeader>(unknown).is_err());
    }
}
