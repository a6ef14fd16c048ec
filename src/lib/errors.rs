//! Custom error types for chunkfetch operations.
//!
//! Errors in this module are the *fatal* ones: they abort a read before or around the
//! parallel phase. Per-chunk failures that must not stop sibling chunks live in
//! [`crate::task::ChunkFailure`] and are collected by [`crate::outcome::BatchOutcome`].

use std::io;

use thiserror::Error;

use crate::container::ContainerError;
use crate::pool::PoolError;

/// Result type alias for chunkfetch operations
pub type Result<T> = std::result::Result<T, ChunkFetchError>;

/// Error type for chunkfetch operations
#[derive(Error, Debug)]
pub enum ChunkFetchError {
    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// File format error
    #[error("Invalid {file_type} file '{path}': {reason}")]
    InvalidFileFormat {
        /// Type of file (e.g., "Input container")
        file_type: String,
        /// Path to the file
        path: String,
        /// Explanation of the problem
        reason: String,
    },

    /// The container's chunk index could not resolve a chunk.
    ///
    /// Raised by the serial resolver; no descriptor table is produced.
    #[error("Failed to resolve chunk {chunk_index}: {source}")]
    MetadataResolution {
        /// Logical index of the chunk whose lookup failed
        chunk_index: u64,
        /// Underlying container error
        #[source]
        source: ContainerError,
    },

    /// Any other container library failure (open, library-level reads).
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// Operating system I/O failure outside of a chunk task
    #[error("I/O error while {context}: {source}")]
    Io {
        /// What was being done when the error occurred
        context: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The worker pool failed to start or to join its workers
    #[error("Worker pool failure: {0}")]
    PoolLifecycle(#[from] PoolError),
}

impl ChunkFetchError {
    /// Wraps an I/O error with a short description of the failed operation.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }
}
