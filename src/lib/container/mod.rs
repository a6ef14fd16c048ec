//! Chunked container files.
//!
//! A container holds one one-dimensional dataset of little-endian `u32` elements, stored
//! as fixed-size chunks. Chunk payloads are located through a chunk index at the end of
//! the file; nothing about a chunk's physical address can be derived from its logical
//! position alone (payloads may be padded to an alignment boundary).
//!
//! # File Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │ Superblock (64 bytes)                                           │
//! │  - Magic "CHNKFILE", format version, element width              │
//! │  - Total elements, chunk elements, fill pattern, alignment      │
//! │  - Index offset, chunk count                                    │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ Chunk payloads (each starting on an `alignment` boundary)       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ Chunk index: chunk_count × (address u64, size u64)              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`Dataset`] is the read side. Its chunk lookups go through the dataset's own file
//! cursor, so they take `&mut self` and the type is neither `Sync` nor safe to share:
//! metadata resolution must happen on one thread.

mod dataset;
mod format;
mod writer;

use std::io;

use thiserror::Error;

pub use dataset::Dataset;
pub use format::{FORMAT_VERSION, INDEX_ENTRY_SIZE, MAGIC, SUPERBLOCK_SIZE, Superblock};
pub use writer::ContainerWriter;

use crate::verify::ELEMENT_SIZE;

/// Errors raised by the container library.
#[derive(Error, Debug)]
pub enum ContainerError {
    /// Underlying I/O failure
    #[error("Container I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not a valid container
    #[error("Not a valid chunk container: {reason}")]
    Format {
        /// What is wrong with the file
        reason: String,
    },

    /// The requested dataset geometry is not supported
    #[error("Invalid dataset layout: {reason}")]
    Layout {
        /// Why the layout was rejected
        reason: String,
    },

    /// A chunk coordinate does not start a chunk
    #[error("Coordinate {coord} is not aligned to the chunk size {chunk_elements}")]
    MisalignedCoordinate {
        /// Element coordinate passed by the caller
        coord: u64,
        /// Elements per chunk
        chunk_elements: u64,
    },

    /// A coordinate or selection lies outside the dataset
    #[error("Selection starting at {coord} ({count} elements) exceeds the dataset ({total_elements} elements)")]
    OutOfRange {
        /// First element of the selection
        coord: u64,
        /// Number of elements selected
        count: u64,
        /// Total elements in the dataset
        total_elements: u64,
    },

    /// The chunk index has no allocation for a chunk
    #[error("Chunk {chunk_index} has not been written")]
    UnwrittenChunk {
        /// Logical chunk index
        chunk_index: u64,
    },

    /// Caller buffer does not match the requested selection
    #[error("Buffer holds {actual} elements but {expected} are required")]
    BufferSize {
        /// Elements required
        expected: u64,
        /// Elements the buffer holds
        actual: u64,
    },

    /// Chunks were not written as consecutive strides
    #[error("Chunks must be written in order: expected coordinate {expected}, got {actual}")]
    OutOfOrderWrite {
        /// Next coordinate the writer expects
        expected: u64,
        /// Coordinate passed by the caller
        actual: u64,
    },
}

/// Result type for container operations.
pub type ContainerResult<T> = std::result::Result<T, ContainerError>;

/// Geometry of a one-dimensional chunked dataset.
///
/// The chunk size must divide the total size; every chunk is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetLayout {
    total_elements: u64,
    chunk_elements: u64,
}

impl DatasetLayout {
    /// Creates a layout after checking that the chunk size is non-zero and divides the
    /// total size.
    ///
    /// # Examples
    ///
    /// ```
    /// use chunkfetch_lib::container::DatasetLayout;
    ///
    /// let layout = DatasetLayout::new(4096, 1024).unwrap();
    /// assert_eq!(layout.chunk_count(), 4);
    /// assert_eq!(layout.chunk_bytes(), 4096);
    ///
    /// assert!(DatasetLayout::new(4096, 1000).is_err());
    /// ```
    pub fn new(total_elements: u64, chunk_elements: u64) -> ContainerResult<Self> {
        if chunk_elements == 0 {
            return Err(ContainerError::Layout { reason: "chunk size must be at least 1".into() });
        }
        if total_elements == 0 {
            return Err(ContainerError::Layout {
                reason: "dataset must hold at least one element".into(),
            });
        }
        if !total_elements.is_multiple_of(chunk_elements) {
            return Err(ContainerError::Layout {
                reason: format!(
                    "chunk size {chunk_elements} does not divide the dataset size {total_elements}"
                ),
            });
        }
        if chunk_elements.checked_mul(ELEMENT_SIZE as u64).is_none_or(|b| b > usize::MAX as u64) {
            return Err(ContainerError::Layout {
                reason: format!("chunk size {chunk_elements} is too large to buffer"),
            });
        }
        Ok(Self { total_elements, chunk_elements })
    }

    /// Total number of elements in the dataset.
    #[must_use]
    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }

    /// Number of elements per chunk.
    #[must_use]
    pub fn chunk_elements(&self) -> u64 {
        self.chunk_elements
    }

    /// Number of chunks in the dataset.
    #[must_use]
    pub fn chunk_count(&self) -> u64 {
        self.total_elements / self.chunk_elements
    }

    /// Size in bytes of one chunk payload.
    #[must_use]
    pub fn chunk_bytes(&self) -> u64 {
        self.chunk_elements * ELEMENT_SIZE as u64
    }

    /// Size in bytes of the whole dataset payload.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.total_elements * ELEMENT_SIZE as u64
    }

    /// Element coordinate of the first element of chunk `chunk_index`.
    #[must_use]
    pub fn chunk_coord(&self, chunk_index: u64) -> u64 {
        chunk_index * self.chunk_elements
    }

    /// Logical chunk index of the chunk starting at `coord`.
    pub fn chunk_index_of(&self, coord: u64) -> ContainerResult<u64> {
        if coord >= self.total_elements {
            return Err(ContainerError::OutOfRange {
                coord,
                count: self.chunk_elements,
                total_elements: self.total_elements,
            });
        }
        if !coord.is_multiple_of(self.chunk_elements) {
            return Err(ContainerError::MisalignedCoordinate {
                coord,
                chunk_elements: self.chunk_elements,
            });
        }
        Ok(coord / self.chunk_elements)
    }
}

/// Physical location of one chunk inside the container file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkAddress {
    /// Byte offset of the chunk payload
    pub address: u64,
    /// Byte length of the chunk payload
    pub size: u64,
}
