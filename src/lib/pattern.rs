//! Deterministic fill patterns.
//!
//! The generator writes every chunk with a [`FillPattern`] and the verifier checks the
//! chunk against the same pattern. The pattern is recorded in the container header, so
//! a reader always verifies with the convention the file was written with.

use clap::ValueEnum;

/// Element values written into (and expected from) each chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum)]
pub enum FillPattern {
    /// Element `j` of every chunk equals `j`, i.e. each chunk holds `[0, chunk_elements)`.
    #[default]
    #[value(name = "sequence")]
    Sequence,

    /// Every element of chunk `i` equals `i`.
    #[value(name = "chunk-index")]
    ChunkIndex,
}

impl FillPattern {
    /// Tag stored in the container superblock.
    #[must_use]
    pub fn tag(self) -> u32 {
        match self {
            Self::Sequence => 0,
            Self::ChunkIndex => 1,
        }
    }

    /// Inverse of [`tag`](Self::tag).
    #[must_use]
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(Self::Sequence),
            1 => Some(Self::ChunkIndex),
            _ => None,
        }
    }

    /// The expected value of element `element_index` within chunk `chunk_index`.
    ///
    /// Values are 32-bit; chunk indices wrap at 2^32.
    #[inline]
    #[must_use]
    pub fn expected(self, chunk_index: u64, element_index: usize) -> u32 {
        match self {
            Self::Sequence => element_index as u32,
            Self::ChunkIndex => chunk_index as u32,
        }
    }

    /// Fills `out` with the contents of chunk `chunk_index`.
    pub fn fill(self, chunk_index: u64, out: &mut [u32]) {
        match self {
            Self::Sequence => {
                for (j, value) in out.iter_mut().enumerate() {
                    *value = j as u32;
                }
            }
            Self::ChunkIndex => out.fill(chunk_index as u32),
        }
    }
}

impl std::fmt::Display for FillPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequence => write!(f, "sequence"),
            Self::ChunkIndex => write!(f, "chunk-index"),
        }
    }
}
