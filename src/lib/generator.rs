//! Writes the deterministic dataset that the read modes verify.

use std::path::Path;

use crate::container::{ContainerWriter, DatasetLayout};
use crate::errors::Result;
use crate::pattern::FillPattern;
use crate::validation::validate_alignment;

/// Options for [`generate_dataset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Pattern every chunk is filled with
    pub pattern: FillPattern,
    /// Byte boundary each chunk payload starts on (1 packs chunks together)
    pub alignment: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self { pattern: FillPattern::default(), alignment: 1 }
    }
}

/// What [`generate_dataset`] wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateSummary {
    pub chunks_written: u64,
    /// Chunk payload bytes, excluding container metadata
    pub bytes_written: u64,
}

/// Creates `path` holding one dataset with `layout`, every chunk filled with
/// `options.pattern`.
///
/// The whole dataset is written as consecutive chunk-sized strides from a single reused
/// chunk buffer.
pub fn generate_dataset<P: AsRef<Path>>(
    path: P,
    layout: DatasetLayout,
    options: &GenerateOptions,
) -> Result<GenerateSummary> {
    validate_alignment(options.alignment)?;

    let path = path.as_ref();
    let mut writer = ContainerWriter::create(path, layout, options.pattern, options.alignment)?;
    let mut chunk = vec![0u32; layout.chunk_elements() as usize];

    for chunk_index in 0..layout.chunk_count() {
        options.pattern.fill(chunk_index, &mut chunk);
        writer.write_chunk(layout.chunk_coord(chunk_index), &chunk)?;
    }
    writer.finish()?;

    log::debug!("Wrote {} chunks to {}", layout.chunk_count(), path.display());
    Ok(GenerateSummary { chunks_written: layout.chunk_count(), bytes_written: layout.total_bytes() })
}
