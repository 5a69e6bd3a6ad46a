use thiserror::Error;

/// Errors returned by DrDat decoding.
///
/// Decoding is all-or-nothing: any of these aborts the whole buffer and no
/// variables are returned.
///
/// # Examples
/// ```
/// use drdat_core::DecodeError;
///
/// let err = DecodeError::InvalidHeader { found: 0 };
/// assert!(err.to_string().contains("invalid header"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid header: validator byte is {found}, expected 69")]
    InvalidHeader { found: i8 },
    #[error("invalid bit width {bits} for variable {variable}: expected 8, 16 or 32")]
    InvalidBitWidth { variable: usize, bits: i8 },
    #[error("truncated input at offset {offset}: need {needed} bytes, got {actual}")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        actual: usize,
    },
    #[error("invalid size {size} for dimension {dimension} of variable {variable}")]
    InvalidDimension {
        variable: usize,
        dimension: usize,
        size: i32,
    },
    #[error("sample count overflow in variable {variable}")]
    SampleCountOverflow { variable: usize },
    #[error("zero scale in variable {variable}")]
    ZeroScale { variable: usize },
}
