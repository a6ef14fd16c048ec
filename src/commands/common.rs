//! Common CLI options shared across commands.
//!
//! Argument groups composed into command structs with `#[command(flatten)]`.

use clap::Args;

use chunkfetch_lib::container::DatasetLayout;
use chunkfetch_lib::modes::DEFAULT_WORKERS;
use chunkfetch_lib::validation::{validate_layout, validate_worker_count};

/// Dataset dimensions for commands that create a dataset.
#[derive(Debug, Clone, Args)]
pub struct LayoutOptions {
    /// Total number of u32 elements in the dataset
    #[arg(short = 'n', long = "total-elements", default_value_t = 1_048_576)]
    pub total_elements: u64,

    /// Number of elements per chunk; must divide --total-elements
    #[arg(short = 'c', long = "chunk-elements", default_value_t = 1_024)]
    pub chunk_elements: u64,
}

impl LayoutOptions {
    /// Validates the dimensions and builds the layout.
    pub fn layout(&self) -> anyhow::Result<DatasetLayout> {
        Ok(validate_layout(self.total_elements, self.chunk_elements)?)
    }
}

/// Worker pool sizing.
#[derive(Debug, Clone, Args)]
pub struct ThreadOptions {
    /// Number of worker threads for the multithreaded read mode
    #[arg(short = 't', long = "threads", default_value_t = DEFAULT_WORKERS)]
    pub threads: usize,
}

impl ThreadOptions {
    /// Validates the worker count.
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_worker_count(self.threads)?;
        Ok(())
    }
}

/// Per-chunk reporting switches.
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct ReportOptions {
    /// Print the wall-clock time spent on each chunk
    #[arg(long = "print-timing", default_value_t = false)]
    pub print_timing: bool,

    /// Print the read bandwidth of each chunk and of the whole read
    #[arg(long = "print-bandwidth", default_value_t = false)]
    pub print_bandwidth: bool,
}

impl ReportOptions {
    /// True if any per-chunk output was requested.
    #[must_use]
    pub fn per_chunk(&self) -> bool {
        self.print_timing || self.print_bandwidth
    }
}
