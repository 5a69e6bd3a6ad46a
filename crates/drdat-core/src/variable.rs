//! Decoded variable model.
//!
//! A variable is a descriptor (bit width, extents, linear transform) plus a
//! payload whose logical shape is the extent list in row-major order. One
//! dimension (or none) keeps the payload flat; more dimensions nest it, first
//! extent outermost.

use serde::{Deserialize, Serialize};

use crate::format::layout;

/// Unsigned sample width of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BitWidth {
    U8,
    U16,
    U32,
}

impl BitWidth {
    /// Map a wire bit-width byte to a supported width.
    ///
    /// # Examples
    /// ```
    /// use drdat_core::BitWidth;
    ///
    /// assert_eq!(BitWidth::from_bits(16), Some(BitWidth::U16));
    /// assert_eq!(BitWidth::from_bits(24), None);
    /// ```
    pub fn from_bits(bits: i8) -> Option<Self> {
        match bits {
            8 => Some(Self::U8),
            16 => Some(Self::U16),
            32 => Some(Self::U32),
            _ => None,
        }
    }

    pub const fn bits(self) -> u8 {
        match self {
            Self::U8 => 8,
            Self::U16 => 16,
            Self::U32 => 32,
        }
    }

    pub const fn byte_width(self) -> usize {
        self.bits() as usize / 8
    }
}

impl From<BitWidth> for u8 {
    fn from(value: BitWidth) -> Self {
        value.bits()
    }
}

impl TryFrom<u8> for BitWidth {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        i8::try_from(value)
            .ok()
            .and_then(BitWidth::from_bits)
            .ok_or_else(|| format!("unsupported bit width: {value}"))
    }
}

/// Per-variable metadata parsed ahead of the sample block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDescriptor {
    /// Width of each raw sample.
    pub bit_width: BitWidth,
    /// Extents, outermost first.
    pub dimensions: Vec<usize>,
    /// Divisor applied to each raw sample.
    pub scale: f64,
    /// Subtracted after the division.
    pub offset: f64,
}

impl VariableDescriptor {
    pub fn dimension_count(&self) -> usize {
        self.dimensions.len()
    }

    /// Number of samples in the payload. An empty extent list holds none.
    ///
    /// # Examples
    /// ```
    /// use drdat_core::{BitWidth, VariableDescriptor};
    ///
    /// let descriptor = VariableDescriptor {
    ///     bit_width: BitWidth::U16,
    ///     dimensions: vec![2, 3],
    ///     scale: 1.0,
    ///     offset: 0.0,
    /// };
    /// assert_eq!(descriptor.sample_count(), 6);
    /// assert_eq!(descriptor.sample_bytes(), 12);
    /// ```
    pub fn sample_count(&self) -> usize {
        checked_sample_count(&self.dimensions).unwrap_or(usize::MAX)
    }

    pub fn sample_bytes(&self) -> usize {
        self.sample_count()
            .saturating_mul(self.bit_width.byte_width())
    }

    /// Length of the whole variable record, metadata and samples.
    pub fn record_len(&self) -> usize {
        layout::descriptor_len(self.dimension_count()).saturating_add(self.sample_bytes())
    }

    /// Apply the linear transform to one raw sample.
    pub fn dequantize(&self, raw: u32) -> f64 {
        f64::from(raw) / self.scale - self.offset
    }
}

/// Product of the extents, `Some(0)` for an empty list and `None` on
/// overflow.
pub(crate) fn checked_sample_count(dimensions: &[usize]) -> Option<usize> {
    if dimensions.is_empty() {
        return Some(0);
    }
    dimensions
        .iter()
        .try_fold(1usize, |acc, &extent| acc.checked_mul(extent))
}

/// Decoded payload: a flat run of values or nested rows.
///
/// Serializes as plain (nested) JSON arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableData {
    Flat(Vec<f64>),
    Nested(Vec<VariableData>),
}

impl VariableData {
    /// Shape a row-major run of values by `dimensions`.
    ///
    /// Fewer than two extents keep the values flat. `values.len()` should
    /// equal the product of the extents; rows that the values cannot fill are
    /// dropped rather than padded.
    ///
    /// # Examples
    /// ```
    /// use drdat_core::VariableData;
    ///
    /// let data = VariableData::from_flat(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]);
    /// assert_eq!(
    ///     data,
    ///     VariableData::Nested(vec![
    ///         VariableData::Flat(vec![1.0, 2.0]),
    ///         VariableData::Flat(vec![3.0, 4.0]),
    ///     ])
    /// );
    /// ```
    pub fn from_flat(values: Vec<f64>, dimensions: &[usize]) -> Self {
        match dimensions {
            [] | [_] => Self::Flat(values),
            [outer, inner @ ..] => {
                let row_len = checked_sample_count(inner).unwrap_or(0);
                if row_len == 0 {
                    return Self::Nested(Vec::new());
                }
                // Row count is bounded by `values`, not by `outer`.
                let rows = values
                    .chunks_exact(row_len)
                    .take(*outer)
                    .map(|row| Self::from_flat(row.to_vec(), inner))
                    .collect();
                Self::Nested(rows)
            }
        }
    }

    /// Row-major copy of every value.
    pub fn flatten(&self) -> Vec<f64> {
        let mut out = Vec::new();
        self.collect_into(&mut out);
        out
    }

    fn collect_into(&self, out: &mut Vec<f64>) {
        match self {
            Self::Flat(values) => out.extend_from_slice(values),
            Self::Nested(rows) => rows.iter().for_each(|row| row.collect_into(out)),
        }
    }

    /// Number of outermost elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Flat(values) => values.len(),
            Self::Nested(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A decoded variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    #[serde(flatten)]
    pub descriptor: VariableDescriptor,
    pub data: VariableData,
}
