//! Binary data parsing utilities shared across the container and document layers.
//!
//! Every structure in the compound file and in the WordDocument/Table streams is
//! little-endian, fixed width and unpadded. These helpers read such integers at an
//! arbitrary offset without panicking on short input.

use thiserror::Error;
use zerocopy::{FromBytes, I16, LE, U16, U32};

/// Binary parsing error type
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BinaryError {
    /// Not enough data to read the requested type
    #[error("Insufficient data: expected {expected}, got {available}")]
    InsufficientData { expected: usize, available: usize },
}

/// Result type for binary operations
pub type BinaryResult<T> = Result<T, BinaryError>;

#[inline]
fn window(data: &[u8], offset: usize, width: usize) -> BinaryResult<&[u8]> {
    let end = offset.checked_add(width).unwrap_or(usize::MAX);
    if end > data.len() {
        return Err(BinaryError::InsufficientData {
            expected: end,
            available: data.len(),
        });
    }
    Ok(&data[offset..end])
}

/// Read a single byte at the given offset.
#[inline]
pub fn read_u8(data: &[u8], offset: usize) -> BinaryResult<u8> {
    window(data, offset, 1).map(|b| b[0])
}

/// Read a little-endian u16 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use docbin::common::binary::read_u16_le;
/// let data = [0x34, 0x12, 0x78, 0x56];
/// assert_eq!(read_u16_le(&data, 0).unwrap(), 0x1234);
/// assert_eq!(read_u16_le(&data, 2).unwrap(), 0x5678);
/// ```
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> BinaryResult<u16> {
    let bytes = window(data, offset, 2)?;
    Ok(U16::<LE>::read_from_bytes(bytes).map(|v| v.get()).unwrap_or(0))
}

/// Read a little-endian i16 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use docbin::common::binary::read_i16_le;
/// let data = [0xFF, 0xFF];
/// assert_eq!(read_i16_le(&data, 0).unwrap(), -1i16);
/// ```
#[inline]
pub fn read_i16_le(data: &[u8], offset: usize) -> BinaryResult<i16> {
    let bytes = window(data, offset, 2)?;
    Ok(I16::<LE>::read_from_bytes(bytes).map(|v| v.get()).unwrap_or(0))
}

/// Read a little-endian u32 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use docbin::common::binary::read_u32_le;
/// let data = [0x78, 0x56, 0x34, 0x12];
/// assert_eq!(read_u32_le(&data, 0).unwrap(), 0x12345678);
/// ```
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> BinaryResult<u32> {
    let bytes = window(data, offset, 4)?;
    Ok(U32::<LE>::read_from_bytes(bytes).map(|v| v.get()).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u16_le() {
        let data = [0x34, 0x12, 0x78, 0x56];
        assert!(read_u16_le(&data, 0).is_ok_and(|v| v == 0x1234));
        assert!(read_u16_le(&data, 2).is_ok_and(|v| v == 0x5678));
        assert!(read_u16_le(&data, 3).is_err());
    }

    #[test]
    fn test_read_u32_le() {
        let data = [0x78, 0x56, 0x34, 0x12];
        assert!(read_u32_le(&data, 0).is_ok_and(|v| v == 0x12345678));
        assert_eq!(
            read_u32_le(&data, 1),
            Err(BinaryError::InsufficientData {
                expected: 5,
                available: 4
            })
        );
    }

    #[test]
    fn test_offset_overflow_is_an_error() {
        let data = [0u8; 4];
        assert!(read_u32_le(&data, usize::MAX - 1).is_err());
        assert!(read_u8(&data, 4).is_err());
    }
}
