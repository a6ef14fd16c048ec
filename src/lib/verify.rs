//! Chunk content verification.
//!
//! Pure functions comparing a chunk's contents with the [`FillPattern`] it was written
//! with. Elements are little-endian `u32`. The scan runs front to back and stops at the
//! first divergent element.

use std::fmt;

use crate::pattern::FillPattern;

/// Width in bytes of one dataset element.
pub const ELEMENT_SIZE: usize = std::mem::size_of::<u32>();

/// First divergent element of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    /// Index of the element within the chunk
    pub element_index: usize,
    /// Value the fill pattern prescribes
    pub expected: u32,
    /// Value found in the chunk
    pub actual: u32,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "element {}: expected {}, found {}",
            self.element_index, self.expected, self.actual
        )
    }
}

/// Outcome of verifying one chunk.
pub type Verification = Result<(), Mismatch>;

/// Verifies raw chunk bytes as read from disk.
///
/// A trailing partial element (fewer than [`ELEMENT_SIZE`] bytes) is decoded with
/// zero padding and reported as a mismatch at its element index.
///
/// # Examples
///
/// ```
/// use chunkfetch_lib::FillPattern;
/// use chunkfetch_lib::verify::verify_bytes;
///
/// let bytes: Vec<u8> = (0u32..4).flat_map(u32::to_le_bytes).collect();
/// assert!(verify_bytes(&bytes, FillPattern::Sequence, 0).is_ok());
///
/// let mismatch = verify_bytes(&bytes, FillPattern::ChunkIndex, 2).unwrap_err();
/// assert_eq!(mismatch.element_index, 0);
/// assert_eq!(mismatch.expected, 2);
/// assert_eq!(mismatch.actual, 0);
/// ```
pub fn verify_bytes(bytes: &[u8], pattern: FillPattern, chunk_index: u64) -> Verification {
    let elements = bytes.chunks_exact(ELEMENT_SIZE);
    let remainder = elements.remainder();

    for (element_index, raw) in elements.enumerate() {
        let actual = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        let expected = pattern.expected(chunk_index, element_index);
        if actual != expected {
            return Err(Mismatch { element_index, expected, actual });
        }
    }

    if remainder.is_empty() {
        return Ok(());
    }

    let element_index = bytes.len() / ELEMENT_SIZE;
    let mut padded = [0u8; ELEMENT_SIZE];
    padded[..remainder.len()].copy_from_slice(remainder);
    Err(Mismatch {
        element_index,
        expected: pattern.expected(chunk_index, element_index),
        actual: u32::from_le_bytes(padded),
    })
}

/// Verifies already-decoded chunk elements (library read modes).
pub fn verify_elements(elements: &[u32], pattern: FillPattern, chunk_index: u64) -> Verification {
    match elements
        .iter()
        .enumerate()
        .find(|&(j, &actual)| actual != pattern.expected(chunk_index, j))
    {
        Some((element_index, &actual)) => Err(Mismatch {
            element_index,
            expected: pattern.expected(chunk_index, element_index),
            actual,
        }),
        None => Ok(()),
    }
}
