use super::error::DecodeError;
use super::layout;
use crate::BitWidth;

/// Cursor over a little-endian DrDat buffer.
///
/// Every read is bounds-checked and advances the cursor by exactly the number
/// of bytes consumed; a short buffer yields `DecodeError::TruncatedInput`.
pub struct DatReader<'a> {
    payload: &'a [u8],
    position: usize,
}

impl<'a> DatReader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self {
            payload,
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.payload.len().saturating_sub(self.position)
    }

    /// Fail unless `needed` more bytes are available from the cursor.
    pub fn require(&self, needed: usize) -> Result<(), DecodeError> {
        if self.remaining() < needed {
            return Err(self.truncated(needed));
        }
        Ok(())
    }

    pub fn read_i8(&mut self) -> Result<i8, DecodeError> {
        let bytes = self.take(1)?;
        Ok(i8::from_le_bytes([bytes[0]]))
    }

    /// Read a count byte. The field is a signed byte on the wire; negative
    /// values are reinterpreted as unsigned counts.
    pub fn read_count(&mut self) -> Result<usize, DecodeError> {
        Ok(self.read_i8()? as u8 as usize)
    }

    pub fn read_i32_le(&mut self) -> Result<i32, DecodeError> {
        let bytes = self.take(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a fixed-point transform field (thousandths) as a real number.
    pub fn read_transform(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from(self.read_i32_le()?) / layout::TRANSFORM_DIVISOR)
    }

    /// Read one unsigned sample of the given width, widened to `u32`.
    pub fn read_sample(&mut self, width: BitWidth) -> Result<u32, DecodeError> {
        let bytes = self.take(width.byte_width())?;
        let sample = match width {
            BitWidth::U8 => u32::from(bytes[0]),
            BitWidth::U16 => u32::from(u16::from_le_bytes([bytes[0], bytes[1]])),
            BitWidth::U32 => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        };
        Ok(sample)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), DecodeError> {
        self.take(len).map(|_| ())
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .position
            .checked_add(len)
            .ok_or_else(|| self.truncated(len))?;
        let payload = self.payload;
        let bytes = payload
            .get(self.position..end)
            .ok_or_else(|| self.truncated(len))?;
        self.position = end;
        Ok(bytes)
    }

    fn truncated(&self, needed: usize) -> DecodeError {
        DecodeError::TruncatedInput {
            offset: self.position,
            needed,
            actual: self.remaining(),
        }
    }
}
