//! Formatting helpers for counts, durations and bandwidth, plus operation timing.
//!
//! These keep the log output of every command consistent.

use std::time::{Duration, Instant};

use crate::outcome::BatchSummary;

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Formats an integer with thousands separators.
///
/// # Examples
///
/// ```
/// use chunkfetch_lib::logging::format_count;
///
/// assert_eq!(format_count(0), "0");
/// assert_eq!(format_count(1_048_576), "1,048,576");
/// ```
#[must_use]
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats a fraction (0.0-1.0) as a percentage.
///
/// ```
/// use chunkfetch_lib::logging::format_percent;
///
/// assert_eq!(format_percent(0.9543, 2), "95.43%");
/// assert_eq!(format_percent(1.0, 0), "100%");
/// ```
#[must_use]
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.decimals$}%", value * 100.0, decimals = decimals)
}

/// Formats a duration in human-readable form.
///
/// Durations under a second keep millisecond (or microsecond) precision since single
/// chunk reads are usually that fast.
///
/// # Examples
///
/// ```
/// use chunkfetch_lib::logging::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_micros(250)), "250µs");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(135)), "2m 15s");
/// assert_eq!(format_duration(Duration::from_secs(5400)), "1h 30m");
/// ```
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if duration < Duration::from_millis(1) {
        format!("{}µs", duration.as_micros())
    } else if duration < Duration::from_secs(1) {
        format!("{:.1}ms", duration.as_secs_f64() * 1000.0)
    } else if secs < 60 {
        format!("{:.2}s", duration.as_secs_f64())
    } else if secs < 3600 {
        let mins = secs / 60;
        let remaining_secs = secs % 60;
        if remaining_secs == 0 { format!("{mins}m") } else { format!("{mins}m {remaining_secs}s") }
    } else {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        if mins == 0 { format!("{hours}h") } else { format!("{hours}h {mins}m") }
    }
}

/// Formats a byte count using binary units.
///
/// ```
/// use chunkfetch_lib::logging::format_bytes;
///
/// assert_eq!(format_bytes(512), "512 B");
/// assert_eq!(format_bytes(4 * 1024 * 1024), "4.00 MiB");
/// ```
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    let b = bytes as f64;
    if b >= GIB {
        format!("{:.2} GiB", b / GIB)
    } else if b >= MIB {
        format!("{:.2} MiB", b / MIB)
    } else if b >= KIB {
        format!("{:.2} KiB", b / KIB)
    } else {
        format!("{bytes} B")
    }
}

/// Formats a bandwidth given in bytes per second as MiB/s.
///
/// ```
/// use chunkfetch_lib::logging::format_bandwidth;
///
/// assert_eq!(format_bandwidth(1024.0 * 1024.0 * 250.0), "250.00 MiB/s");
/// ```
#[must_use]
pub fn format_bandwidth(bytes_per_sec: f64) -> String {
    format!("{:.2} MiB/s", bytes_per_sec / MIB)
}

/// Formats an item rate for `count` items processed in `duration`.
#[must_use]
pub fn format_rate(count: u64, duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 0.001 {
        return format!("{} chunks/s", format_count(count));
    }
    format!("{} chunks/s", format_count((count as f64 / secs) as u64))
}

/// Logs the outcome of a dataset read.
pub fn log_batch_summary(summary: &BatchSummary) {
    log::info!("Read Summary:");
    log::info!("  Chunks: {}", format_count(summary.total_chunks()));
    log::info!("  Verified: {}", format_count(summary.verified_count()));
    if summary.failed_count() > 0 {
        log::info!("  Failed: {}", format_count(summary.failed_count()));
    }
    if summary.skipped_count() > 0 {
        log::info!("  Skipped: {}", format_count(summary.skipped_count()));
    }
    if summary.total_chunks() > 0 {
        let fraction = summary.verified_count() as f64 / summary.total_chunks() as f64;
        log::info!("  Verified fraction: {}", format_percent(fraction, 2));
    }
    log::info!("  Bytes read: {}", format_bytes(summary.bytes_read()));
    log::info!("  Elapsed: {}", format_duration(summary.elapsed()));
    log::info!("  Bandwidth: {}", format_bandwidth(summary.bandwidth()));
}

/// Operation timing and summary helper.
///
/// # Examples
///
/// ```no_run
/// use chunkfetch_lib::logging::OperationTimer;
///
/// let timer = OperationTimer::new("Reading chunks");
/// // ... do work ...
/// timer.log_completion(1_024);
/// ```
pub struct OperationTimer {
    operation: String,
    start_time: Instant,
}

impl OperationTimer {
    /// Creates a new operation timer and logs the start.
    #[must_use]
    pub fn new(operation: &str) -> Self {
        log::info!("{operation} ...");
        Self { operation: operation.to_string(), start_time: Instant::now() }
    }

    /// Time since the timer started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Logs the completion with item count and rate.
    pub fn log_completion(&self, count: u64) {
        let duration = self.start_time.elapsed();
        log::info!(
            "{} completed: {} chunks in {} ({})",
            self.operation,
            format_count(count),
            format_duration(duration),
            format_rate(count, duration)
        );
    }
}
