use tracing::{debug, trace, warn};

use super::error::DecodeError;
use super::layout;
use super::reader::DatReader;
use crate::variable::checked_sample_count;
use crate::{BitWidth, Variable, VariableData, VariableDescriptor};

/// Incremental decoder over an in-memory DrDat buffer.
///
/// The header is validated on construction; variables are then decoded one
/// at a time in file order. After the first error the decoder yields nothing
/// further, since the cursor can no longer be trusted.
///
/// # Examples
/// ```
/// use drdat_core::DatDecoder;
///
/// let bytes = [69u8, 0];
/// let mut decoder = DatDecoder::new(&bytes)?;
/// assert_eq!(decoder.variable_count(), 0);
/// assert!(decoder.next_variable()?.is_none());
/// # Ok::<(), drdat_core::DecodeError>(())
/// ```
pub struct DatDecoder<'a> {
    reader: DatReader<'a>,
    variable_count: usize,
    next_index: usize,
}

impl<'a> DatDecoder<'a> {
    pub fn new(buffer: &'a [u8]) -> Result<Self, DecodeError> {
        let mut reader = DatReader::new(buffer);
        debug_assert_eq!(reader.position(), layout::VALIDATOR_OFFSET);
        let validator = reader.read_i8()?;
        if validator != layout::VALIDATOR {
            warn!(found = validator, "rejecting buffer with invalid validator byte");
            return Err(DecodeError::InvalidHeader { found: validator });
        }

        debug_assert_eq!(reader.position(), layout::VARIABLE_COUNT_OFFSET);
        let variable_count = reader.read_count()?;
        debug_assert_eq!(reader.position(), layout::HEADER_LEN);
        debug!(
            variable_count,
            buffer_len = buffer.len(),
            "DrDat header parsed"
        );

        Ok(Self {
            reader,
            variable_count,
            next_index: 0,
        })
    }

    /// Number of variables declared by the header.
    pub fn variable_count(&self) -> usize {
        self.variable_count
    }

    pub fn remaining_variables(&self) -> usize {
        self.variable_count - self.next_index
    }

    /// Current byte offset into the buffer.
    pub fn position(&self) -> usize {
        self.reader.position()
    }

    /// Decode the next variable, or `None` once every declared variable has
    /// been consumed.
    pub fn next_variable(&mut self) -> Result<Option<Variable>, DecodeError> {
        self.advance(Self::decode_variable)
    }

    /// Parse the next variable's metadata and skip over its samples.
    ///
    /// The sample block must still be fully present in the buffer.
    pub fn next_descriptor(&mut self) -> Result<Option<VariableDescriptor>, DecodeError> {
        self.advance(|decoder, index| {
            let descriptor = decoder.read_descriptor(index)?;
            let (_, sample_bytes) = sample_layout(&descriptor, index)?;
            decoder.reader.skip(sample_bytes)?;
            Ok(descriptor)
        })
    }

    fn advance<T>(
        &mut self,
        step: impl FnOnce(&mut Self, usize) -> Result<T, DecodeError>,
    ) -> Result<Option<T>, DecodeError> {
        if self.next_index >= self.variable_count {
            return Ok(None);
        }
        let index = self.next_index;
        match step(self, index) {
            Ok(item) => {
                self.next_index += 1;
                if self.next_index == self.variable_count && self.reader.remaining() > 0 {
                    debug!(
                        trailing = self.reader.remaining(),
                        "ignoring bytes after the last variable"
                    );
                }
                Ok(Some(item))
            }
            Err(err) => {
                warn!(variable = index, error = %err, "DrDat decoding aborted");
                self.next_index = self.variable_count;
                Err(err)
            }
        }
    }

    fn decode_variable(&mut self, index: usize) -> Result<Variable, DecodeError> {
        let start = self.reader.position();
        let descriptor = self.read_descriptor(index)?;
        let (sample_count, sample_bytes) = sample_layout(&descriptor, index)?;
        self.reader.require(sample_bytes)?;

        let mut values = Vec::with_capacity(sample_count);
        for _ in 0..sample_count {
            let raw = self.reader.read_sample(descriptor.bit_width)?;
            values.push(descriptor.dequantize(raw));
        }
        trace!(
            variable = index,
            start,
            end = self.reader.position(),
            "variable samples consumed"
        );

        let data = VariableData::from_flat(values, &descriptor.dimensions);
        Ok(Variable { descriptor, data })
    }

    fn read_descriptor(&mut self, index: usize) -> Result<VariableDescriptor, DecodeError> {
        let bits = self.reader.read_i8()?;
        let bit_width =
            BitWidth::from_bits(bits).ok_or(DecodeError::InvalidBitWidth {
                variable: index,
                bits,
            })?;

        let dimension_count = self.reader.read_count()?;
        let mut dimensions = Vec::with_capacity(dimension_count);
        for dimension in 0..dimension_count {
            let size = self.reader.read_i32_le()?;
            let extent = usize::try_from(size)
                .ok()
                .filter(|&extent| extent > 0)
                .ok_or(DecodeError::InvalidDimension {
                    variable: index,
                    dimension,
                    size,
                })?;
            dimensions.push(extent);
        }

        let scale = self.reader.read_transform()?;
        let offset = self.reader.read_transform()?;
        if scale == 0.0 {
            return Err(DecodeError::ZeroScale { variable: index });
        }

        let descriptor = VariableDescriptor {
            bit_width,
            dimensions,
            scale,
            offset,
        };
        debug!(
            variable = index,
            bits = bit_width.bits(),
            dimensions = ?descriptor.dimensions,
            scale,
            offset,
            "variable descriptor parsed"
        );
        Ok(descriptor)
    }
}

impl Iterator for DatDecoder<'_> {
    type Item = Result<Variable, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_variable().transpose()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining_variables()))
    }
}

/// Sample count and sample byte length of a variable.
fn sample_layout(
    descriptor: &VariableDescriptor,
    index: usize,
) -> Result<(usize, usize), DecodeError> {
    let overflow = DecodeError::SampleCountOverflow { variable: index };
    let count = checked_sample_count(&descriptor.dimensions).ok_or(overflow.clone())?;
    let bytes = count
        .checked_mul(descriptor.bit_width.byte_width())
        .ok_or(overflow)?;
    Ok((count, bytes))
}

/// Decode every variable in a DrDat buffer.
///
/// All-or-nothing: the first error aborts and no variables are returned.
///
/// # Examples
/// ```
/// use drdat_core::{DecodeError, decode};
///
/// let err = decode(&[0u8, 1]).unwrap_err();
/// assert_eq!(err, DecodeError::InvalidHeader { found: 0 });
/// ```
pub fn decode(buffer: &[u8]) -> Result<Vec<Variable>, DecodeError> {
    DatDecoder::new(buffer)?.collect()
}

/// Parse every variable descriptor without materialising samples.
pub fn read_descriptors(buffer: &[u8]) -> Result<Vec<VariableDescriptor>, DecodeError> {
    let mut decoder = DatDecoder::new(buffer)?;
    let mut descriptors = Vec::with_capacity(decoder.variable_count());
    while let Some(descriptor) = decoder.next_descriptor()? {
        descriptors.push(descriptor);
    }
    Ok(descriptors)
}

#[cfg(test)]
mod tests {
    use super::{DatDecoder, decode, read_descriptors};
    use crate::format::error::DecodeError;
    use crate::format::layout;
    use crate::{BitWidth, VariableData};

    fn record(bits: i8, dims: &[i32], scale: i32, offset: i32, samples: &[u8]) -> Vec<u8> {
        let mut out = vec![bits as u8, dims.len() as u8];
        for dim in dims {
            out.extend_from_slice(&dim.to_le_bytes());
        }
        out.extend_from_slice(&scale.to_le_bytes());
        out.extend_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(samples);
        out
    }

    fn file(records: &[Vec<u8>]) -> Vec<u8> {
        let mut out = vec![layout::VALIDATOR as u8, records.len() as u8];
        for rec in records {
            out.extend_from_slice(rec);
        }
        out
    }

    #[test]
    fn decode_single_u8_variable() {
        let bytes = file(&[record(8, &[3], 1000, 0, &[1, 2, 3])]);
        let variables = decode(&bytes).unwrap();
        assert_eq!(variables.len(), 1);
        assert_eq!(variables[0].descriptor.bit_width, BitWidth::U8);
        assert_eq!(variables[0].data, VariableData::Flat(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn decode_applies_scale_then_offset() {
        let samples: Vec<u8> = [100u16, 300].iter().flat_map(|s| s.to_le_bytes()).collect();
        let bytes = file(&[record(16, &[2], 2000, -30000, &samples)]);
        let variables = decode(&bytes).unwrap();
        assert_eq!(variables[0].descriptor.scale, 2.0);
        assert_eq!(variables[0].descriptor.offset, -30.0);
        assert_eq!(variables[0].data, VariableData::Flat(vec![80.0, 180.0]));
    }

    #[test]
    fn decode_u32_samples() {
        let samples: Vec<u8> = [u32::MAX, 7].iter().flat_map(|s| s.to_le_bytes()).collect();
        let bytes = file(&[record(32, &[2], 1000, 0, &samples)]);
        let variables = decode(&bytes).unwrap();
        assert_eq!(
            variables[0].data,
            VariableData::Flat(vec![f64::from(u32::MAX), 7.0])
        );
    }

    #[test]
    fn header_only_rejects_bad_validator() {
        let err = decode(&[70, 1, 8, 1]).unwrap_err();
        assert_eq!(err, DecodeError::InvalidHeader { found: 70 });
    }

    #[test]
    fn empty_buffer_is_truncated() {
        let err = decode(&[]).unwrap_err();
        assert!(matches!(err, DecodeError::TruncatedInput { offset: 0, .. }));
    }

    #[test]
    fn missing_variable_count_is_truncated() {
        let err = decode(&[69]).unwrap_err();
        assert!(matches!(err, DecodeError::TruncatedInput { offset: 1, .. }));
    }

    #[test]
    fn unsupported_bit_width_aborts() {
        let bytes = file(&[
            record(8, &[1], 1000, 0, &[1]),
            record(24, &[1], 1000, 0, &[1, 2, 3]),
        ]);
        let err = decode(&bytes).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidBitWidth {
                variable: 1,
                bits: 24
            }
        );
    }

    #[test]
    fn decoder_stops_after_error() {
        let bytes = file(&[record(12, &[1], 1000, 0, &[1]), record(8, &[1], 1000, 0, &[1])]);
        let mut decoder = DatDecoder::new(&bytes).unwrap();
        assert!(decoder.next_variable().is_err());
        assert!(decoder.next_variable().unwrap().is_none());
    }

    #[test]
    fn negative_extent_is_rejected() {
        let bytes = file(&[record(8, &[2, -1], 1000, 0, &[])]);
        let err = decode(&bytes).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidDimension {
                variable: 0,
                dimension: 1,
                size: -1
            }
        );
    }

    #[test]
    fn zero_scale_is_rejected() {
        let bytes = file(&[record(8, &[1], 0, 0, &[1])]);
        let err = decode(&bytes).unwrap_err();
        assert_eq!(err, DecodeError::ZeroScale { variable: 0 });
    }

    #[test]
    fn huge_extents_overflow_instead_of_allocating() {
        let bytes = file(&[record(32, &[i32::MAX, i32::MAX, i32::MAX], 1000, 0, &[])]);
        let err = decode(&bytes).unwrap_err();
        assert_eq!(err, DecodeError::SampleCountOverflow { variable: 0 });
    }

    #[test]
    fn zero_outer_extent_is_rejected_before_reshape() {
        let bytes = file(&[record(8, &[0, i32::MAX, i32::MAX, i32::MAX], 1000, 0, &[])]);
        let err = decode(&bytes).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidDimension {
                variable: 0,
                dimension: 0,
                size: 0
            }
        );
    }

    #[test]
    fn zero_inner_extent_is_rejected_before_reshape() {
        let bytes = file(&[record(8, &[i32::MAX, 0], 1000, 0, &[])]);
        assert_eq!(bytes.len(), 20);
        let err = decode(&bytes).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidDimension {
                variable: 0,
                dimension: 1,
                size: 0
            }
        );
    }

    #[test]
    fn zero_extent_is_rejected_when_describing() {
        let bytes = file(&[record(16, &[3, 0], 1000, 0, &[])]);
        let err = read_descriptors(&bytes).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidDimension { dimension: 1, size: 0, .. }
        ));
    }

    #[test]
    fn truncated_samples_fail_before_reading() {
        let bytes = file(&[record(16, &[3], 1000, 0, &[1, 0, 2, 0, 3])]);
        let err = decode(&bytes).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedInput {
                offset: 2 + layout::descriptor_len(1),
                needed: 6,
                actual: 5,
            }
        );
    }

    #[test]
    fn zero_dimensions_yield_empty_flat_payload() {
        let bytes = file(&[record(8, &[], 1000, 0, &[]), record(8, &[1], 1000, 0, &[9])]);
        let variables = decode(&bytes).unwrap();
        assert_eq!(variables[0].data, VariableData::Flat(Vec::new()));
        assert_eq!(variables[1].data, VariableData::Flat(vec![9.0]));
    }

    #[test]
    fn decoder_position_tracks_record_length() {
        let samples: Vec<u8> = (0..6u16).flat_map(|s| s.to_le_bytes()).collect();
        let bytes = file(&[record(16, &[2, 3], 1000, 0, &samples)]);
        let mut decoder = DatDecoder::new(&bytes).unwrap();
        assert_eq!(decoder.position(), layout::HEADER_LEN);

        let variable = decoder.next_variable().unwrap().unwrap();
        assert_eq!(
            decoder.position(),
            layout::HEADER_LEN + 2 + 4 * 2 + 8 + 6 * 2
        );
        assert_eq!(
            decoder.position(),
            layout::HEADER_LEN + variable.descriptor.record_len()
        );
    }

    #[test]
    fn descriptors_skip_samples() {
        let bytes = file(&[
            record(8, &[2, 2], 500, 1000, &[1, 2, 3, 4]),
            record(32, &[1], 1000, 0, &[0, 0, 0, 1]),
        ]);
        let descriptors = read_descriptors(&bytes).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].dimensions, vec![2, 2]);
        assert_eq!(descriptors[0].scale, 0.5);
        assert_eq!(descriptors[0].offset, 1.0);
        assert_eq!(descriptors[1].bit_width, BitWidth::U32);
    }

    #[test]
    fn descriptors_still_require_sample_bytes() {
        let bytes = file(&[record(8, &[4], 1000, 0, &[1, 2])]);
        let err = read_descriptors(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::TruncatedInput { needed: 4, .. }));
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut bytes = file(&[record(8, &[1], 1000, 0, &[5])]);
        bytes.extend_from_slice(&[0xAA, 0xBB]);
        let variables = decode(&bytes).unwrap();
        assert_eq!(variables.len(), 1);
    }
}
