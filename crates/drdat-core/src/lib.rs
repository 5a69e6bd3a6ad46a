//! DrDat core library for decoding quantized multi-dimensional variables.
//!
//! A DrDat file is a little-endian byte stream: a validator byte (69), a
//! variable count, then one record per variable carrying its sample width,
//! extents, a fixed-point scale/offset pair and the raw unsigned samples.
//! This crate validates the header, parses each record, dequantizes samples
//! as `raw / scale - offset` and reshapes them row-major into nested arrays.
//!
//! Decoding is byte-oriented and side-effect free; file access is isolated in
//! `source`. Errors are returned, never reported out of band, and a failed
//! decode yields no partial output.
//!
//! # Examples
//! ```
//! use drdat_core::{VariableData, decode};
//!
//! // validator, one variable: 8-bit, 1 dim of 2, scale 1.0, offset 0.0
//! let mut bytes = vec![69u8, 1, 8, 1];
//! bytes.extend_from_slice(&2i32.to_le_bytes());
//! bytes.extend_from_slice(&1000i32.to_le_bytes());
//! bytes.extend_from_slice(&0i32.to_le_bytes());
//! bytes.extend_from_slice(&[10, 20]);
//!
//! let variables = decode(&bytes)?;
//! assert_eq!(variables[0].data, VariableData::Flat(vec![10.0, 20.0]));
//! # Ok::<(), drdat_core::DecodeError>(())
//! ```

use serde::{Deserialize, Serialize};

mod format;
mod source;
mod variable;

pub use format::layout;
pub use format::{DatDecoder, DecodeError, decode, read_descriptors};
pub use source::{FileError, decode_dat_file, describe_dat_file};
pub use variable::{BitWidth, Variable, VariableData, VariableDescriptor};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;

/// Decoded file report with variables in file order.
///
/// # Examples
/// ```
/// use drdat_core::make_report;
///
/// let report = make_report("sample.drdat", 2, Vec::new());
/// assert_eq!(report.report_version, drdat_core::REPORT_VERSION);
/// assert!(report.variables.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// Input file metadata.
    pub input: InputInfo,
    /// Decoded variables in file order.
    pub variables: Vec<VariableReport>,
}

/// Tool metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

/// Input file metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the decoder.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}

/// One decoded variable as it appears in a report.
///
/// # Examples
/// ```
/// use drdat_core::{BitWidth, VariableData, VariableReport};
///
/// let entry = VariableReport {
///     index: 0,
///     bit_width: BitWidth::U8,
///     dimensions: vec![2],
///     scale: 1.0,
///     offset: 0.0,
///     sample_count: 2,
///     data: VariableData::Flat(vec![10.0, 20.0]),
/// };
/// assert_eq!(entry.sample_count, 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableReport {
    /// Position of the variable in the file.
    pub index: usize,
    /// Sample width in bits.
    pub bit_width: BitWidth,
    /// Extents, outermost first.
    pub dimensions: Vec<usize>,
    pub scale: f64,
    pub offset: f64,
    /// Number of decoded values.
    pub sample_count: usize,
    /// Values shaped per `dimensions`.
    pub data: VariableData,
}

impl VariableReport {
    pub fn new(index: usize, variable: Variable) -> Self {
        let sample_count = variable.descriptor.sample_count();
        let VariableDescriptor {
            bit_width,
            dimensions,
            scale,
            offset,
        } = variable.descriptor;
        Self {
            index,
            bit_width,
            dimensions,
            scale,
            offset,
            sample_count,
            data: variable.data,
        }
    }
}

/// Build a report for decoded variables.
pub fn make_report(input_path: &str, input_bytes: u64, variables: Vec<Variable>) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "drdat".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        variables: variables
            .into_iter()
            .enumerate()
            .map(|(index, variable)| VariableReport::new(index, variable))
            .collect(),
    }
}
