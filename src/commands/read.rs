//! Read a dataset back and verify every chunk.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use log::{error, info};

use chunkfetch_lib::logging::{
    format_bandwidth, format_bytes, format_count, format_duration, log_batch_summary,
};
use chunkfetch_lib::modes::{ReadMode, ReadOptions, read_dataset};
use chunkfetch_lib::outcome::BatchSummary;
use chunkfetch_lib::task::{ChunkFailure, ChunkStatus};

use crate::commands::command::Command;
use crate::commands::common::{ReportOptions, ThreadOptions};

/// Read a chunked dataset and verify its contents.
#[derive(Debug, Parser)]
#[command(
    name = "read",
    about = "Read a chunked dataset and verify every chunk",
    long_about = r#"
Read every chunk of a dataset written by `chunkfetch generate` and verify it against the
fill pattern recorded in the file.

Modes:
  library        hyperslab read of each chunk through the container library
  direct-chunk   whole-chunk read of each chunk through the container library
  posix          resolve every chunk address, then positioned reads on one thread
  multithreaded  resolve every chunk address, then positioned reads on a worker pool

The command exits 0 only if every chunk verifies.

Example usage:
  chunkfetch read -i data.chunks
  chunkfetch read -i data.chunks --mode posix --print-timing
  chunkfetch read -i data.chunks -t 16 --print-bandwidth --fail-fast
"#
)]
pub struct Read {
    /// Input container file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Read strategy
    #[arg(short = 'm', long = "mode", value_enum, default_value_t = ReadMode::default())]
    pub mode: ReadMode,

    #[command(flatten)]
    pub threads: ThreadOptions,

    #[command(flatten)]
    pub report: ReportOptions,

    /// Stop starting new chunks after the first failure (multithreaded mode)
    #[arg(long = "fail-fast", default_value_t = false)]
    pub fail_fast: bool,
}

impl Command for Read {
    fn execute(&self, command_line: &str) -> Result<()> {
        info!("{command_line}");
        if self.mode == ReadMode::Multithreaded {
            self.threads.validate()?;
            info!("Worker threads: {}", self.threads.threads);
        }

        let options =
            ReadOptions { mode: self.mode, workers: self.threads.threads, fail_fast: self.fail_fast };
        let summary = read_dataset(&self.input, &options)?;

        if self.report.per_chunk() {
            self.print_chunk_reports(&summary);
        }
        log_batch_summary(&summary);

        for (chunk_index, failure) in summary.failures() {
            log_failure(chunk_index, failure);
        }

        if summary.is_success() {
            println!(
                "PASS: {} of {} chunks verified in {} mode",
                format_count(summary.verified_count()),
                format_count(summary.total_chunks()),
                self.mode
            );
            Ok(())
        } else {
            println!(
                "FAIL: {} of {} chunks verified, {} failed, {} skipped in {} mode",
                format_count(summary.verified_count()),
                format_count(summary.total_chunks()),
                format_count(summary.failed_count()),
                format_count(summary.skipped_count()),
                self.mode
            );
            bail!(
                "Verification failed for {} chunk(s) of {}",
                summary.failed_count(),
                self.input.display()
            );
        }
    }
}

impl Read {
    fn print_chunk_reports(&self, summary: &BatchSummary) {
        for report in summary.reports() {
            if matches!(report.status, ChunkStatus::Skipped) {
                continue;
            }
            let mut line = format!("chunk {}:", report.chunk_index);
            if self.report.print_timing {
                line.push_str(&format!(" time {}", format_duration(report.elapsed)));
            }
            if self.report.print_bandwidth {
                line.push_str(&format!(" bandwidth {}", format_bandwidth(report.bandwidth())));
            }
            println!("{line}");
        }
        if self.report.print_bandwidth {
            println!(
                "total: {} in {} ({})",
                format_bytes(summary.bytes_read()),
                format_duration(summary.elapsed()),
                format_bandwidth(summary.bandwidth())
            );
        }
    }
}

fn log_failure(chunk_index: u64, failure: &ChunkFailure) {
    match failure.mismatch() {
        Some(m) => error!(
            "Chunk {chunk_index} failed verification: element {} should be {} but is {}",
            m.element_index, m.expected, m.actual
        ),
        None => error!("Chunk {chunk_index} failed: {failure}"),
    }
}
