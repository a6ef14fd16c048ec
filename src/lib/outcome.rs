//! Thread-safe collection of per-chunk reports for one batch.
//!
//! Tasks running on any worker call [`BatchOutcome::record`]; once the pool has been
//! waited on and shut down, [`BatchOutcome::into_summary`] turns the collected reports
//! into a [`BatchSummary`]. The collector also carries the batch's cooperative
//! cancellation flag used by fail-fast runs.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::logging::format_count;
use crate::task::{ChunkFailure, ChunkReport, ChunkStatus};

/// Progress is logged each time this fraction of the batch completes.
const PROGRESS_STEPS: u64 = 10;

/// Upper bound on the report slots reserved up front; larger batches grow on demand.
const MAX_PREALLOCATED_REPORTS: u64 = 1 << 20;

/// Collects chunk reports from concurrent tasks.
#[derive(Debug)]
pub struct BatchOutcome {
    total_chunks: u64,
    fail_fast: bool,
    progress_interval: u64,
    cancelled: AtomicBool,
    finished: AtomicU64,
    failed: AtomicU64,
    reports: Mutex<Vec<ChunkReport>>,
}

impl BatchOutcome {
    /// Creates a collector for `total_chunks` chunks.
    ///
    /// With `fail_fast`, the first failed chunk cancels the batch: tasks that start after
    /// it record themselves as skipped.
    #[must_use]
    pub fn new(total_chunks: u64, fail_fast: bool) -> Self {
        Self {
            total_chunks,
            fail_fast,
            progress_interval: (total_chunks / PROGRESS_STEPS).max(1),
            cancelled: AtomicBool::new(false),
            finished: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            reports: Mutex::new(Vec::with_capacity(
                total_chunks.min(MAX_PREALLOCATED_REPORTS) as usize,
            )),
        }
    }

    /// Records the report for one chunk.
    pub fn record(&self, report: ChunkReport) {
        if let ChunkStatus::Failed(failure) = &report.status {
            self.failed.fetch_add(1, Ordering::Relaxed);
            log::debug!("Chunk {} failed: {failure}", report.chunk_index);
            if self.fail_fast && !self.cancelled.swap(true, Ordering::AcqRel) {
                log::warn!("Chunk {} failed; cancelling remaining chunks", report.chunk_index);
            }
        }

        self.reports.lock().push(report);

        let done = self.finished.fetch_add(1, Ordering::Relaxed) + 1;
        if done % self.progress_interval == 0 || done == self.total_chunks {
            log::info!(
                "Processed {} / {} chunks ({} failed)",
                format_count(done),
                format_count(self.total_chunks),
                format_count(self.failed.load(Ordering::Relaxed))
            );
        }
    }

    /// Requests cancellation of chunks that have not started yet.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Number of reports recorded so far.
    #[must_use]
    pub fn finished(&self) -> u64 {
        self.finished.load(Ordering::Relaxed)
    }

    /// Consumes the collector, ordering reports by chunk index.
    #[must_use]
    pub fn into_summary(self, elapsed: Duration) -> BatchSummary {
        let mut reports = self.reports.into_inner();
        reports.sort_unstable_by_key(|r| r.chunk_index);
        BatchSummary { total_chunks: self.total_chunks, reports, elapsed }
    }
}

/// Result of reading a whole dataset.
#[derive(Debug)]
pub struct BatchSummary {
    total_chunks: u64,
    reports: Vec<ChunkReport>,
    elapsed: Duration,
}

impl BatchSummary {
    /// True if every chunk of the dataset was read and verified.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.verified_count() == self.total_chunks
    }

    #[must_use]
    pub fn total_chunks(&self) -> u64 {
        self.total_chunks
    }

    /// Reports in chunk order. A serial read that stopped early holds fewer reports than
    /// there are chunks.
    #[must_use]
    pub fn reports(&self) -> &[ChunkReport] {
        &self.reports
    }

    #[must_use]
    pub fn verified_count(&self) -> u64 {
        self.reports.iter().filter(|r| r.is_verified()).count() as u64
    }

    #[must_use]
    pub fn failed_count(&self) -> u64 {
        self.failures().count() as u64
    }

    #[must_use]
    pub fn skipped_count(&self) -> u64 {
        self.reports.iter().filter(|r| matches!(r.status, ChunkStatus::Skipped)).count() as u64
    }

    /// Failed chunks as `(chunk_index, failure)`, in chunk order.
    pub fn failures(&self) -> impl Iterator<Item = (u64, &ChunkFailure)> + '_ {
        self.reports.iter().filter_map(|r| r.failure().map(|f| (r.chunk_index, f)))
    }

    /// Total bytes read from disk.
    #[must_use]
    pub fn bytes_read(&self) -> u64 {
        self.reports.iter().map(|r| r.bytes).sum()
    }

    /// Wall-clock time of the whole read.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Aggregate bandwidth in bytes per second.
    #[must_use]
    pub fn bandwidth(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 { self.bytes_read() as f64 / secs } else { 0.0 }
    }
}
