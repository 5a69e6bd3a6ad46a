pub const VALIDATOR_OFFSET: usize = 0;
pub const VARIABLE_COUNT_OFFSET: usize = 1;
pub const HEADER_LEN: usize = 2;

pub const VALIDATOR: i8 = 69;

/// Bit width byte + dimension count byte.
pub const DESCRIPTOR_PREFIX_LEN: usize = 2;
pub const DIMENSION_SIZE_LEN: usize = 4;
pub const SCALE_LEN: usize = 4;
pub const OFFSET_LEN: usize = 4;
pub const TRANSFORM_LEN: usize = SCALE_LEN + OFFSET_LEN;

/// Scale and offset are stored as integers in thousandths.
pub const TRANSFORM_DIVISOR: f64 = 1000.0;

/// Metadata length of a variable record, excluding its samples.
pub const fn descriptor_len(dimension_count: usize) -> usize {
    DESCRIPTOR_PREFIX_LEN + dimension_count * DIMENSION_SIZE_LEN + TRANSFORM_LEN
}
