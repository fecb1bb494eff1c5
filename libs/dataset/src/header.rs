//! Fixed 8-byte dataset headers.
//!
//! Both layouts store two little-endian `u32` words in front of the payload;
//! they differ only in which word comes first:
//!
//! | Layout | word 0 | word 1 |
//! |--------|--------|--------|
//! | [`HeaderLayout::Internal`] | dimension | count |
//! | [`HeaderLayout::Standard`] (fbin/ibin) | count | dimension |
//!
//! Callers always work with the semantic [`DatasetHeader`]; the physical
//! order lives in exactly one place ([`HeaderLayout::field_order`]).

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};

use crate::element::ElementType;
use crate::error::HeaderError;

/// Size of either header layout in bytes.
pub const HEADER_LEN: usize = 8;

/// A semantic header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    /// Vector width, or `k` (neighbors per query) for ground truth.
    Dimension,
    /// Number of rows (vectors or queries).
    Count,
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderField::Dimension => write!(f, "dimension"),
            HeaderField::Count => write!(f, "count"),
        }
    }
}

/// Header contents independent of physical field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetHeader {
    pub dimension: u64,
    pub count: u64,
}

impl DatasetHeader {
    pub fn new(dimension: u64, count: u64) -> Self {
        Self { dimension, count }
    }

    /// Payload length in bytes for the given element type, `None` on overflow.
    pub fn payload_len(&self, element: ElementType) -> Option<u64> {
        self.dimension
            .checked_mul(self.count)?
            .checked_mul(element.width() as u64)
    }

    fn get(&self, field: HeaderField) -> u64 {
        match field {
            HeaderField::Dimension => self.dimension,
            HeaderField::Count => self.count,
        }
    }

    fn set(&mut self, field: HeaderField, value: u64) {
        match field {
            HeaderField::Dimension => self.dimension = value,
            HeaderField::Count => self.count = value,
        }
    }
}

/// Physical header layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLayout {
    /// `[dimension: u32 LE][count: u32 LE]`
    Internal,
    /// `[count: u32 LE][dimension: u32 LE]` (fbin/ibin)
    Standard,
}

impl HeaderLayout {
    /// Semantic field stored in each of the two header words.
    pub const fn field_order(self) -> [HeaderField; 2] {
        match self {
            HeaderLayout::Internal => [HeaderField::Dimension, HeaderField::Count],
            HeaderLayout::Standard => [HeaderField::Count, HeaderField::Dimension],
        }
    }

    /// Decode the first [`HEADER_LEN`] bytes of `bytes`.
    pub fn decode(self, bytes: &[u8]) -> Result<DatasetHeader, HeaderError> {
        if bytes.len() < HEADER_LEN {
            return Err(HeaderError::Truncated { len: bytes.len() });
        }

        let mut header = DatasetHeader::new(0, 0);
        for (i, field) in self.field_order().into_iter().enumerate() {
            let word = LittleEndian::read_u32(&bytes[i * 4..i * 4 + 4]);
            header.set(field, u64::from(word));
        }
        Ok(header)
    }

    /// Encode `header` in this layout. Values above `u32::MAX` are rejected.
    pub fn encode(self, header: &DatasetHeader) -> Result<[u8; HEADER_LEN], HeaderError> {
        let mut buf = [0u8; HEADER_LEN];
        for (i, field) in self.field_order().into_iter().enumerate() {
            let value = header.get(field);
            let word =
                u32::try_from(value).map_err(|_| HeaderError::ValueOutOfRange { field, value })?;
            LittleEndian::write_u32(&mut buf[i * 4..i * 4 + 4], word);
        }
        Ok(buf)
    }
}

impl fmt::Display for HeaderLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [first, second] = self.field_order();
        match self {
            HeaderLayout::Internal => write!(f, "internal [{}, {}]", first, second),
            HeaderLayout::Standard => write!(f, "standard [{}, {}]", first, second),
        }
    }
}

/// Decode an internal-layout header `(dimension, count)`.
pub fn decode_internal(bytes: &[u8]) -> Result<DatasetHeader, HeaderError> {
    HeaderLayout::Internal.decode(bytes)
}

/// Encode a standard-layout (fbin/ibin) header `(count, dimension)`.
pub fn encode_standard(header: &DatasetHeader) -> Result<[u8; HEADER_LEN], HeaderError> {
    HeaderLayout::Standard.encode(header)
}
