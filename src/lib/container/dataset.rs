//! Read side of a container: superblock validation, chunk index lookups and
//! library-level reads.

use std::cell::Cell;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use super::format::{INDEX_ENTRY_SIZE, SUPERBLOCK_SIZE, Superblock, decode_elements, decode_index_entry};
use super::{ChunkAddress, ContainerError, ContainerResult, DatasetLayout};
use crate::pattern::FillPattern;
use crate::verify::ELEMENT_SIZE;

/// An open dataset inside a container file.
///
/// Every lookup and read moves the dataset's own file cursor, so all access goes through
/// `&mut self`. The type is deliberately `!Sync`; hand chunk addresses to other threads,
/// never the dataset.
pub struct Dataset {
    file: File,
    path: PathBuf,
    superblock: Superblock,
    scratch: Vec<u8>,
    _not_sync: PhantomData<Cell<()>>,
}

impl Dataset {
    /// Opens `path` read-only and validates its superblock and index extent.
    pub fn open<P: AsRef<Path>>(path: P) -> ContainerResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path)?;

        let mut raw = [0u8; SUPERBLOCK_SIZE];
        file.read_exact(&mut raw).map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => {
                ContainerError::Format { reason: "file is shorter than the superblock".into() }
            }
            _ => ContainerError::Io(e),
        })?;
        let superblock = Superblock::decode(&raw)?;

        // Bounds the chunk count, and every allocation sized from it, by the file size.
        let file_len = file.metadata()?.len();
        let end_of_index = superblock.end_of_index()?;
        if file_len < end_of_index {
            return Err(ContainerError::Format {
                reason: format!(
                    "chunk index ends at byte {end_of_index} but the file is only {file_len} bytes"
                ),
            });
        }

        log::debug!(
            "Opened dataset {}: {} elements in {} chunks ({} pattern)",
            path.display(),
            superblock.layout.total_elements(),
            superblock.layout.chunk_count(),
            superblock.pattern
        );

        Ok(Self { file, path, superblock, scratch: Vec::new(), _not_sync: PhantomData })
    }

    /// Path the dataset was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Dataset geometry.
    #[must_use]
    pub fn layout(&self) -> DatasetLayout {
        self.superblock.layout
    }

    /// Fill pattern recorded by the generator.
    #[must_use]
    pub fn pattern(&self) -> FillPattern {
        self.superblock.pattern
    }

    /// Payload alignment recorded by the writer.
    #[must_use]
    pub fn alignment(&self) -> u32 {
        self.superblock.alignment
    }

    /// Number of chunks in the dataset.
    pub fn num_chunks(&mut self) -> ContainerResult<u64> {
        Ok(self.superblock.layout.chunk_count())
    }

    /// Looks up the physical address and size of the chunk starting at element
    /// coordinate `coord`.
    ///
    /// Not safe for concurrent use: the lookup reads the chunk index through the
    /// dataset's file cursor.
    pub fn chunk_info_by_coord(&mut self, coord: u64) -> ContainerResult<ChunkAddress> {
        let chunk_index = self.superblock.layout.chunk_index_of(coord)?;

        let mut raw = [0u8; INDEX_ENTRY_SIZE];
        self.file.seek(SeekFrom::Start(self.superblock.index_entry_offset(chunk_index)?))?;
        self.file.read_exact(&mut raw)?;
        let entry = decode_index_entry(&raw);

        if entry.size == 0 {
            return Err(ContainerError::UnwrittenChunk { chunk_index });
        }
        Ok(entry)
    }

    /// Reads the whole chunk starting at `coord` into `out`.
    ///
    /// `out` must hold exactly one chunk of elements.
    pub fn read_chunk(&mut self, coord: u64, out: &mut [u32]) -> ContainerResult<()> {
        let chunk_elements = self.superblock.layout.chunk_elements();
        if out.len() as u64 != chunk_elements {
            return Err(ContainerError::BufferSize {
                expected: chunk_elements,
                actual: out.len() as u64,
            });
        }

        let entry = self.chunk_info_by_coord(coord)?;
        let chunk_bytes = self.superblock.layout.chunk_bytes();
        if entry.size != chunk_bytes {
            return Err(ContainerError::Format {
                reason: format!(
                    "chunk at coordinate {coord} is {} bytes, expected {chunk_bytes}",
                    entry.size
                ),
            });
        }

        self.read_elements_at(entry.address, out)
    }

    /// Reads the contiguous element range `[start, start + out.len())`.
    ///
    /// The selection may start anywhere and span several chunks.
    pub fn read_hyperslab(&mut self, start: u64, out: &mut [u32]) -> ContainerResult<()> {
        let layout = self.superblock.layout;
        let count = out.len() as u64;
        if start.checked_add(count).is_none_or(|end| end > layout.total_elements()) {
            return Err(ContainerError::OutOfRange {
                coord: start,
                count,
                total_elements: layout.total_elements(),
            });
        }

        let chunk_elements = layout.chunk_elements();
        let mut filled = 0usize;
        while filled < out.len() {
            let position = start + filled as u64;
            let chunk_start = position - position % chunk_elements;
            let within = position - chunk_start;
            let take = ((chunk_elements - within) as usize).min(out.len() - filled);

            let entry = self.chunk_info_by_coord(chunk_start)?;
            let offset = entry.address.checked_add(within * ELEMENT_SIZE as u64).ok_or_else(|| {
                ContainerError::Format {
                    reason: format!(
                        "chunk at coordinate {chunk_start} has an out-of-range address {}",
                        entry.address
                    ),
                }
            })?;
            self.read_elements_at(offset, &mut out[filled..filled + take])?;
            filled += take;
        }
        Ok(())
    }

    fn read_elements_at(&mut self, offset: u64, out: &mut [u32]) -> ContainerResult<()> {
        self.scratch.resize(out.len() * ELEMENT_SIZE, 0);
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(&mut self.scratch)?;
        decode_elements(&self.scratch, out);
        Ok(())
    }
}

impl std::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("path", &self.path)
            .field("superblock", &self.superblock)
            .finish_non_exhaustive()
    }
}
