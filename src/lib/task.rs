//! The per-chunk unit of work: one positioned read followed by verification.

use std::io;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::descriptor::ChunkDescriptor;
use crate::outcome::BatchOutcome;
use crate::pattern::FillPattern;
use crate::pool::Job;
use crate::shared_file::SharedFile;
use crate::verify::{Mismatch, verify_bytes};

/// Why a single chunk failed. Recorded per chunk; never aborts the batch.
#[derive(Error, Debug)]
pub enum ChunkFailure {
    #[error("read of {length} bytes at offset {offset} failed: {source}")]
    Io {
        offset: u64,
        length: u64,
        #[source]
        source: io::Error,
    },

    #[error("short read at offset {offset}: expected {expected} bytes, got {actual}")]
    ShortRead { offset: u64, expected: u64, actual: u64 },

    #[error("chunk is {actual} bytes on disk but the dataset chunk size is {expected} bytes")]
    UnexpectedLength { expected: u64, actual: u64 },

    #[error("verification failed at {0}")]
    Verification(Mismatch),
}

impl ChunkFailure {
    /// The content mismatch, if this failure is one.
    #[must_use]
    pub fn mismatch(&self) -> Option<&Mismatch> {
        match self {
            Self::Verification(m) => Some(m),
            _ => None,
        }
    }
}

/// Final state of one chunk.
#[derive(Debug)]
pub enum ChunkStatus {
    Verified,
    Failed(ChunkFailure),
    /// Not attempted because the batch was cancelled first
    Skipped,
}

/// What happened to one chunk, with its timing.
#[derive(Debug)]
pub struct ChunkReport {
    pub chunk_index: u64,
    /// Bytes read from disk (0 when the read failed or was skipped)
    pub bytes: u64,
    pub elapsed: Duration,
    pub status: ChunkStatus,
}

impl ChunkReport {
    #[must_use]
    pub fn skipped(chunk_index: u64) -> Self {
        Self { chunk_index, bytes: 0, elapsed: Duration::ZERO, status: ChunkStatus::Skipped }
    }

    /// Builds a report from the result of reading and verifying one chunk.
    #[must_use]
    pub fn from_result(
        chunk_index: u64,
        bytes: u64,
        elapsed: Duration,
        result: Result<(), ChunkFailure>,
    ) -> Self {
        let status = match result {
            Ok(()) => ChunkStatus::Verified,
            Err(failure) => ChunkStatus::Failed(failure),
        };
        Self { chunk_index, bytes, elapsed, status }
    }

    #[must_use]
    pub fn is_verified(&self) -> bool {
        matches!(self.status, ChunkStatus::Verified)
    }

    #[must_use]
    pub fn failure(&self) -> Option<&ChunkFailure> {
        match &self.status {
            ChunkStatus::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// Read bandwidth of this chunk in bytes per second.
    #[must_use]
    pub fn bandwidth(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 { self.bytes as f64 / secs } else { 0.0 }
    }
}

/// Everything a chunk task borrows for the lifetime of the batch.
#[derive(Debug, Clone, Copy)]
pub struct ChunkContext<'a> {
    pub file: &'a SharedFile,
    pub pattern: FillPattern,
    /// Expected payload size of every chunk
    pub chunk_bytes: u64,
    pub outcome: &'a BatchOutcome,
}

/// Reads and verifies one chunk on a pool worker.
#[derive(Debug)]
pub struct ChunkTask<'a> {
    pub descriptor: &'a ChunkDescriptor,
    pub context: ChunkContext<'a>,
}

impl Job for ChunkTask<'_> {
    fn run(self) {
        let ChunkContext { file, pattern, chunk_bytes, outcome } = self.context;
        let chunk_index = self.descriptor.logical_index;

        if outcome.is_cancelled() {
            outcome.record(ChunkReport::skipped(chunk_index));
            return;
        }

        let start = Instant::now();
        let result = read_and_verify(file, self.descriptor, pattern, chunk_bytes);
        let elapsed = start.elapsed();

        let report = match result {
            Ok(bytes) => ChunkReport::from_result(chunk_index, bytes, elapsed, Ok(())),
            Err(failure) => {
                let bytes = match &failure {
                    ChunkFailure::Verification(_) => self.descriptor.byte_length,
                    ChunkFailure::ShortRead { actual, .. } => *actual,
                    _ => 0,
                };
                ChunkReport::from_result(chunk_index, bytes, elapsed, Err(failure))
            }
        };
        outcome.record(report);
    }
}

/// Reads the chunk described by `descriptor` with positioned reads and verifies it.
///
/// Returns the number of bytes read. The read is attempted once; a short read is a
/// failure, not a retry.
pub fn read_and_verify(
    file: &SharedFile,
    descriptor: &ChunkDescriptor,
    pattern: FillPattern,
    chunk_bytes: u64,
) -> Result<u64, ChunkFailure> {
    let ChunkDescriptor { logical_index, physical_offset, byte_length } = *descriptor;
    if byte_length != chunk_bytes {
        return Err(ChunkFailure::UnexpectedLength { expected: chunk_bytes, actual: byte_length });
    }

    let mut buffer = vec![0u8; byte_length as usize];
    let read = file.read_fully_at(&mut buffer, physical_offset).map_err(|source| ChunkFailure::Io {
        offset: physical_offset,
        length: byte_length,
        source,
    })? as u64;
    if read < byte_length {
        return Err(ChunkFailure::ShortRead { offset: physical_offset, expected: byte_length, actual: read });
    }

    verify_bytes(&buffer, pattern, logical_index).map_err(ChunkFailure::Verification)?;
    Ok(read)
}
