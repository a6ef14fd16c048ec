//! Write a deterministic chunked dataset.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use chunkfetch_lib::FillPattern;
use chunkfetch_lib::generator::{GenerateOptions, generate_dataset};
use chunkfetch_lib::logging::{OperationTimer, format_bytes, format_count};
use chunkfetch_lib::validation::validate_alignment;

use crate::commands::command::Command;
use crate::commands::common::LayoutOptions;

/// Generate a chunked dataset filled with a known pattern.
#[derive(Debug, Parser)]
#[command(
    name = "generate",
    about = "Write a chunked dataset filled with a deterministic pattern",
    long_about = r#"
Write a container file holding one chunked dataset of u32 elements.

Every chunk is filled with the chosen pattern, which is recorded in the file so that
`chunkfetch read` verifies against the same convention:

  sequence     element j of every chunk holds j
  chunk-index  every element of chunk i holds i

Example usage:
  chunkfetch generate -o data.chunks
  chunkfetch generate -o big.chunks -n 1073741824 -c 1048576 --alignment 4096
"#
)]
pub struct Generate {
    /// Output container file
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,

    #[command(flatten)]
    pub layout: LayoutOptions,

    /// Fill pattern written into every chunk
    #[arg(short = 'p', long = "pattern", value_enum, default_value_t = FillPattern::default())]
    pub pattern: FillPattern,

    /// Byte boundary each chunk payload starts on (1 packs chunks back to back)
    #[arg(long = "alignment", default_value_t = 1)]
    pub alignment: u32,
}

impl Command for Generate {
    fn execute(&self, command_line: &str) -> Result<()> {
        info!("{command_line}");
        let layout = self.layout.layout()?;
        validate_alignment(self.alignment)?;

        info!("Output: {}", self.output.display());
        info!(
            "Layout: {} elements in {} chunks of {} elements",
            format_count(layout.total_elements()),
            format_count(layout.chunk_count()),
            format_count(layout.chunk_elements())
        );
        info!("Pattern: {}", self.pattern);

        let timer = OperationTimer::new("Writing chunks");
        let options = GenerateOptions { pattern: self.pattern, alignment: self.alignment };
        let summary = generate_dataset(&self.output, layout, &options)
            .with_context(|| format!("Failed to generate {}", self.output.display()))?;
        timer.log_completion(summary.chunks_written);

        info!("Wrote {} of chunk data", format_bytes(summary.bytes_written));
        Ok(())
    }
}
