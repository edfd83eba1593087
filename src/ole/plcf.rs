//! Property List with Character Positions (PLCF) parser.
//!
//! A PLC is an array of n+1 little-endian u32 positions followed by n fixed-size
//! data elements. Word uses it for the piece table, the bin tables, section and
//! footnote tables, and the header/footer story boundaries.

use crate::common::binary;
use bytes::Bytes;

/// Parsed PLC structure.
///
/// `element_size` may be zero, in which case the structure is a bare position
/// array (as used by `PlcfHdd`) and every element is empty.
///
/// # Examples
///
/// ```
/// use docbin::ole::plcf::PlcfParser;
///
/// // CPs: 0, 10, 20 with two 2-byte elements
/// let data = vec![
///     0x00, 0x00, 0x00, 0x00, // CP 0
///     0x0A, 0x00, 0x00, 0x00, // CP 10
///     0x14, 0x00, 0x00, 0x00, // CP 20
///     0x01, 0x02, // Property 1
///     0x03, 0x04, // Property 2
/// ];
///
/// let plcf = PlcfParser::parse(&data, 2).unwrap();
/// assert_eq!(plcf.count(), 2);
/// assert_eq!(plcf.range(1), Some((10, 20)));
/// assert_eq!(plcf.property(1), Some(&[0x03, 0x04][..]));
/// assert_eq!(plcf.find_index(15), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct PlcfParser {
    /// Character positions (CP array), one more than the element count
    positions: Vec<u32>,
    /// Property data buffer containing all property elements
    properties_data: Bytes,
    /// Size of each property element
    element_size: usize,
}

impl PlcfParser {
    /// Parse a PLC structure from binary data.
    ///
    /// Returns `None` when the data is too short to hold even one position.
    /// Trailing bytes that do not form a whole (position, element) pair are ignored.
    pub fn parse(data: &[u8], element_size: usize) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        // n+1 positions (4 bytes each) + n elements (element_size each)
        let n = (data.len() - 4) / (4 + element_size);

        let positions = (0..=n)
            .map(|i| binary::read_u32_le(data, i * 4))
            .collect::<Result<Vec<_>, _>>()
            .ok()?;

        let props_start = (n + 1) * 4;
        let props_end = props_start + n * element_size;
        let properties_data = Bytes::copy_from_slice(data.get(props_start..props_end)?);

        Some(Self {
            positions,
            properties_data,
            element_size,
        })
    }

    /// Get the number of elements in the PLC.
    #[inline]
    pub fn count(&self) -> usize {
        self.positions.len().saturating_sub(1)
    }

    /// Get character position at index (valid for `0..=count()`).
    #[inline]
    pub fn position(&self, index: usize) -> Option<u32> {
        self.positions.get(index).copied()
    }

    /// All positions, including the trailing limit.
    #[inline]
    pub fn positions(&self) -> &[u32] {
        &self.positions
    }

    /// Get property data at index.
    #[inline]
    pub fn property(&self, index: usize) -> Option<&[u8]> {
        if index >= self.count() {
            return None;
        }
        let offset = index * self.element_size;
        self.properties_data.get(offset..offset + self.element_size)
    }

    /// Get character range for element at index.
    ///
    /// Returns (start_cp, end_cp) tuple.
    pub fn range(&self, index: usize) -> Option<(u32, u32)> {
        if index >= self.count() {
            return None;
        }
        Some((self.positions[index], self.positions[index + 1]))
    }

    /// Index of the element whose range contains `position`: the largest `i`
    /// with `positions[i] <= position` that is still below the trailing limit.
    pub fn find_index(&self, position: u32) -> Option<usize> {
        let limit = *self.positions.last()?;
        if self.count() == 0 || position >= limit {
            return None;
        }
        match self.positions.partition_point(|&p| p <= position) {
            0 => None,
            idx => Some(idx - 1),
        }
    }

    /// Iterate over `(start, end, element)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, &[u8])> + '_ {
        (0..self.count()).filter_map(move |i| {
            let (start, end) = self.range(i)?;
            Some((start, end, self.property(i)?))
        })
    }
}
