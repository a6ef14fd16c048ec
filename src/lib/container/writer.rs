//! Container creation and chunk writes.

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use super::format::{SUPERBLOCK_SIZE, Superblock, encode_elements, encode_index_entry};
use super::{ChunkAddress, ContainerError, ContainerResult, DatasetLayout};
use crate::pattern::FillPattern;

/// Buffer size for container writes.
const WRITE_BUFFER_SIZE: usize = 1024 * 1024;

/// Writes a chunked dataset into a new container file.
///
/// Chunks must be written as consecutive chunk-sized strides starting at coordinate 0.
/// [`finish`](Self::finish) writes the chunk index and the superblock; a container that
/// was never finished has a zeroed superblock and is rejected by [`super::Dataset::open`].
pub struct ContainerWriter {
    file: BufWriter<File>,
    layout: DatasetLayout,
    pattern: FillPattern,
    alignment: u32,
    /// Byte offset where the next write lands.
    position: u64,
    /// Element coordinate of the next chunk to write.
    next_coord: u64,
    index: Vec<ChunkAddress>,
    scratch: Vec<u8>,
}

impl ContainerWriter {
    /// Creates (or truncates) `path` and reserves space for the superblock.
    ///
    /// `alignment` is the byte boundary every chunk payload starts on; 1 packs chunks
    /// back to back.
    pub fn create<P: AsRef<Path>>(
        path: P,
        layout: DatasetLayout,
        pattern: FillPattern,
        alignment: u32,
    ) -> ContainerResult<Self> {
        if alignment == 0 {
            return Err(ContainerError::Layout { reason: "alignment must be at least 1".into() });
        }

        let mut file = BufWriter::with_capacity(WRITE_BUFFER_SIZE, File::create(path)?);
        file.write_all(&[0u8; SUPERBLOCK_SIZE])?;

        Ok(Self {
            file,
            layout,
            pattern,
            alignment,
            position: SUPERBLOCK_SIZE as u64,
            next_coord: 0,
            index: Vec::with_capacity(layout.chunk_count() as usize),
            scratch: Vec::with_capacity(layout.chunk_bytes() as usize),
        })
    }

    /// Writes the chunk starting at element coordinate `coord`.
    pub fn write_chunk(&mut self, coord: u64, elements: &[u32]) -> ContainerResult<()> {
        if coord != self.next_coord {
            return Err(ContainerError::OutOfOrderWrite { expected: self.next_coord, actual: coord });
        }
        self.layout.chunk_index_of(coord)?;
        if elements.len() as u64 != self.layout.chunk_elements() {
            return Err(ContainerError::BufferSize {
                expected: self.layout.chunk_elements(),
                actual: elements.len() as u64,
            });
        }

        self.pad_to_alignment()?;

        encode_elements(elements, &mut self.scratch);
        self.file.write_all(&self.scratch)?;

        let size = self.scratch.len() as u64;
        self.index.push(ChunkAddress { address: self.position, size });
        self.position += size;
        self.next_coord += self.layout.chunk_elements();
        Ok(())
    }

    /// Writes the chunk index and superblock, then syncs the file to disk.
    pub fn finish(mut self) -> ContainerResult<()> {
        let written = self.index.len() as u64;
        if written != self.layout.chunk_count() {
            return Err(ContainerError::UnwrittenChunk { chunk_index: written });
        }

        let index_offset = self.position;
        for entry in &self.index {
            self.file.write_all(&encode_index_entry(*entry))?;
        }

        let superblock = Superblock {
            layout: self.layout,
            pattern: self.pattern,
            alignment: self.alignment,
            index_offset,
        };
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&superblock.encode())?;

        let file = self.file.into_inner().map_err(|e| ContainerError::Io(e.into_error()))?;
        file.sync_all()?;
        Ok(())
    }

    fn pad_to_alignment(&mut self) -> ContainerResult<()> {
        let alignment = u64::from(self.alignment);
        let padding = (alignment - self.position % alignment) % alignment;
        if padding > 0 {
            self.file.write_all(&vec![0u8; padding as usize])?;
            self.position += padding;
        }
        Ok(())
    }
}
