//! The four strategies for reading a dataset back and verifying it.
//!
//! | Mode            | Metadata                  | Data path                          | Threads |
//! |-----------------|---------------------------|------------------------------------|---------|
//! | `library`       | inside the library        | hyperslab read per chunk           | 1       |
//! | `direct-chunk`  | inside the library        | whole-chunk read per chunk         | 1       |
//! | `posix`         | resolved up front         | positioned read per chunk          | 1       |
//! | `multithreaded` | resolved up front         | positioned reads on a worker pool  | N       |
//!
//! The serial modes stop at the first failing chunk and treat I/O errors as fatal. The
//! multithreaded mode records every chunk's failure and always runs the batch to the
//! end unless fail-fast cancellation is requested.

use std::path::Path;
use std::thread;
use std::time::Instant;

use clap::ValueEnum;

use crate::container::Dataset;
use crate::descriptor::{DescriptorTable, resolve_descriptors};
use crate::errors::{ChunkFetchError, Result};
use crate::logging::{OperationTimer, format_bytes};
use crate::outcome::{BatchOutcome, BatchSummary};
use crate::pattern::FillPattern;
use crate::pool::WorkerPool;
use crate::shared_file::SharedFile;
use crate::task::{ChunkContext, ChunkFailure, ChunkReport, ChunkTask, read_and_verify};
use crate::validation::{validate_file_exists, validate_worker_count};
use crate::verify::verify_elements;

/// Worker threads used by the multithreaded mode unless overridden.
pub const DEFAULT_WORKERS: usize = 4;

/// How chunks are read back from the container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum)]
pub enum ReadMode {
    /// Hyperslab reads through the container library
    #[value(name = "library")]
    Library,
    /// Whole-chunk reads through the container library
    #[value(name = "direct-chunk")]
    DirectChunk,
    /// Resolved descriptors, positioned reads on one thread
    #[value(name = "posix")]
    Posix,
    /// Resolved descriptors, positioned reads on a worker pool
    #[default]
    #[value(name = "multithreaded")]
    Multithreaded,
}

impl std::fmt::Display for ReadMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Library => "library",
            Self::DirectChunk => "direct-chunk",
            Self::Posix => "posix",
            Self::Multithreaded => "multithreaded",
        };
        f.write_str(name)
    }
}

/// Options for [`read_dataset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    pub mode: ReadMode,
    /// Worker threads (multithreaded mode only)
    pub workers: usize,
    /// Cancel chunks that have not started once one chunk fails (multithreaded mode only)
    pub fail_fast: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self { mode: ReadMode::default(), workers: DEFAULT_WORKERS, fail_fast: false }
    }
}

/// Reads every chunk of the dataset in `path` and verifies it against the fill pattern
/// recorded in the container.
///
/// Returns `Err` for failures that abort the read (missing file, metadata resolution,
/// pool lifecycle, I/O in the serial modes). Per-chunk failures are reported in the
/// returned [`BatchSummary`].
pub fn read_dataset<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<BatchSummary> {
    let path = path.as_ref();
    validate_file_exists(path, "Input container")?;
    if options.mode == ReadMode::Multithreaded {
        validate_worker_count(options.workers)?;
    }

    let mut dataset = Dataset::open(path)?;
    let layout = dataset.layout();
    log::info!(
        "Reading {} ({} elements, {} chunks of {} elements, {} pattern) in {} mode",
        path.display(),
        layout.total_elements(),
        layout.chunk_count(),
        layout.chunk_elements(),
        dataset.pattern(),
        options.mode
    );

    match options.mode {
        ReadMode::Library => read_library(&mut dataset),
        ReadMode::DirectChunk => read_direct_chunk(&mut dataset),
        ReadMode::Posix => {
            let table = resolve_table(&mut dataset)?;
            let file = open_shared(path)?;
            read_posix(file, &table, dataset.pattern())
        }
        ReadMode::Multithreaded => {
            let table = resolve_table(&mut dataset)?;
            let file = open_shared(path)?;
            read_multithreaded(file, &table, dataset.pattern(), options.workers, options.fail_fast)
        }
    }
}

/// Reads each chunk as a hyperslab selection through the container library.
pub fn read_library(dataset: &mut Dataset) -> Result<BatchSummary> {
    let layout = dataset.layout();
    let pattern = dataset.pattern();
    let mut buffer = vec![0u32; layout.chunk_elements() as usize];
    read_serially(layout.chunk_count(), |chunk_index| {
        dataset.read_hyperslab(layout.chunk_coord(chunk_index), &mut buffer)?;
        let result = verify_elements(&buffer, pattern, chunk_index).map_err(ChunkFailure::Verification);
        Ok((layout.chunk_bytes(), result))
    })
}

/// Reads each chunk whole through the container library.
pub fn read_direct_chunk(dataset: &mut Dataset) -> Result<BatchSummary> {
    let layout = dataset.layout();
    let pattern = dataset.pattern();
    let mut buffer = vec![0u32; layout.chunk_elements() as usize];
    read_serially(layout.chunk_count(), |chunk_index| {
        dataset.read_chunk(layout.chunk_coord(chunk_index), &mut buffer)?;
        let result = verify_elements(&buffer, pattern, chunk_index).map_err(ChunkFailure::Verification);
        Ok((layout.chunk_bytes(), result))
    })
}

/// Reads resolved chunks with positioned reads on the calling thread.
pub fn read_posix(file: SharedFile, table: &DescriptorTable, pattern: FillPattern) -> Result<BatchSummary> {
    let chunk_bytes = table.layout().chunk_bytes();
    let summary = read_serially(table.len() as u64, |chunk_index| {
        let descriptor = table
            .get(chunk_index as usize)
            .ok_or_else(|| ChunkFetchError::InvalidParameter {
                parameter: "chunk".to_string(),
                reason: format!("no descriptor for chunk {chunk_index}"),
            })?;
        match read_and_verify(&file, descriptor, pattern, chunk_bytes) {
            Ok(bytes) => Ok((bytes, Ok(()))),
            Err(ChunkFailure::Io { offset, source, .. }) => Err(ChunkFetchError::io(
                format!("reading chunk {chunk_index} at offset {offset}"),
                source,
            )),
            Err(failure) => {
                let bytes = match &failure {
                    ChunkFailure::ShortRead { actual, .. } => *actual,
                    _ => descriptor.byte_length,
                };
                Ok((bytes, Err(failure)))
            }
        }
    });
    file.close();
    summary
}

/// Reads resolved chunks on a pool of `workers` threads.
///
/// Every chunk becomes one [`ChunkTask`]. The file is borrowed by the tasks for the
/// lifetime of the pool and closed only after every worker has been joined.
pub fn read_multithreaded(
    file: SharedFile,
    table: &DescriptorTable,
    pattern: FillPattern,
    workers: usize,
    fail_fast: bool,
) -> Result<BatchSummary> {
    let outcome = BatchOutcome::new(table.len() as u64, fail_fast);
    let timer = OperationTimer::new("Reading chunks");

    let context = ChunkContext { file: &file, pattern, chunk_bytes: table.layout().chunk_bytes(), outcome: &outcome };
    let stats = thread::scope(|scope| -> Result<_> {
        let pool = WorkerPool::new(scope, workers)?;
        log::info!("Dispatching {} chunks to {} workers", table.len(), pool.worker_count());
        for descriptor in table {
            pool.submit(ChunkTask { descriptor, context })?;
        }
        pool.wait();
        Ok(pool.shutdown()?)
    })?;

    if stats.panicked > 0 {
        log::error!("{} chunk task(s) panicked and produced no report", stats.panicked);
    }
    timer.log_completion(outcome.finished());
    file.close();

    Ok(outcome.into_summary(timer.elapsed()))
}

fn resolve_table(dataset: &mut Dataset) -> Result<DescriptorTable> {
    let timer = OperationTimer::new("Resolving chunk descriptors");
    let table = resolve_descriptors(dataset)?;
    timer.log_completion(table.len() as u64);
    Ok(table)
}

fn open_shared(path: &Path) -> Result<SharedFile> {
    let context = || format!("opening {}", path.display());
    let file = SharedFile::open(path).map_err(|e| ChunkFetchError::io(context(), e))?;
    let len = file.file_len().map_err(|e| ChunkFetchError::io(context(), e))?;
    log::debug!("Opened {} for positioned reads ({})", path.display(), format_bytes(len));
    Ok(file)
}

/// Drives a serial read, stopping at the first chunk that fails.
///
/// `read_chunk` returns the bytes read and the chunk's verification result; an `Err`
/// aborts the whole read.
fn read_serially<F>(chunk_count: u64, mut read_chunk: F) -> Result<BatchSummary>
where
    F: FnMut(u64) -> Result<(u64, std::result::Result<(), ChunkFailure>)>,
{
    let outcome = BatchOutcome::new(chunk_count, false);
    let timer = OperationTimer::new("Reading chunks");

    for chunk_index in 0..chunk_count {
        let start = Instant::now();
        let (bytes, result) = read_chunk(chunk_index)?;
        let failed = result.is_err();
        outcome.record(ChunkReport::from_result(chunk_index, bytes, start.elapsed(), result));
        if failed {
            log::warn!("Stopping serial read at failed chunk {chunk_index}");
            break;
        }
    }

    timer.log_completion(outcome.finished());
    Ok(outcome.into_summary(timer.elapsed()))
}
