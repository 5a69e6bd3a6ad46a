//! File-backed entry points.
//!
//! Reads a whole DrDat file into memory and hands it to the decoder. This is
//! the only place in the crate that touches the filesystem.

use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::format::{DecodeError, decode, read_descriptors};
use crate::{Report, VariableDescriptor, make_report};

#[derive(Debug, Error)]
pub enum FileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Decode a DrDat file into a report.
pub fn decode_dat_file(path: &Path) -> Result<Report, FileError> {
    let buffer = fs::read(path)?;
    let variables = decode(&buffer)?;
    info!(
        path = %path.display(),
        bytes = buffer.len(),
        variables = variables.len(),
        "DrDat file decoded"
    );
    Ok(make_report(
        &path.display().to_string(),
        buffer.len() as u64,
        variables,
    ))
}

/// Read the variable descriptors of a DrDat file without decoding samples.
pub fn describe_dat_file(path: &Path) -> Result<Vec<VariableDescriptor>, FileError> {
    let buffer = fs::read(path)?;
    Ok(read_descriptors(&buffer)?)
}

#[cfg(test)]
mod tests {
    use super::{FileError, decode_dat_file};
    use std::path::Path;

    #[test]
    fn missing_file_is_io_error() {
        let err = decode_dat_file(Path::new("does/not/exist.drdat")).unwrap_err();
        assert!(matches!(err, FileError::Io(_)));
    }
}
