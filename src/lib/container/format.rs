//! On-disk encoding of the container superblock and chunk index entries.

use super::{ChunkAddress, ContainerError, ContainerResult, DatasetLayout};
use crate::pattern::FillPattern;
use crate::verify::ELEMENT_SIZE;

/// File magic at offset 0.
pub const MAGIC: [u8; 8] = *b"CHNKFILE";

/// Current format version.
pub const FORMAT_VERSION: u32 = 1;

/// Size of the superblock at the start of the file.
pub const SUPERBLOCK_SIZE: usize = 64;

/// Size of one chunk index entry (address + size).
pub const INDEX_ENTRY_SIZE: usize = 16;

// Field offsets within the superblock.
const VERSION_OFFSET: usize = 8;
const ELEMENT_WIDTH_OFFSET: usize = 12;
const TOTAL_ELEMENTS_OFFSET: usize = 16;
const CHUNK_ELEMENTS_OFFSET: usize = 24;
const PATTERN_OFFSET: usize = 32;
const ALIGNMENT_OFFSET: usize = 36;
const INDEX_OFFSET_OFFSET: usize = 40;
const CHUNK_COUNT_OFFSET: usize = 48;

/// Decoded container superblock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Superblock {
    /// Dataset geometry
    pub layout: DatasetLayout,
    /// Pattern the dataset was generated with
    pub pattern: FillPattern,
    /// Alignment of chunk payloads, in bytes
    pub alignment: u32,
    /// Byte offset of the chunk index
    pub index_offset: u64,
}

impl Superblock {
    /// Encodes the superblock into its fixed-size on-disk form.
    #[must_use]
    pub fn encode(&self) -> [u8; SUPERBLOCK_SIZE] {
        let mut buf = [0u8; SUPERBLOCK_SIZE];
        buf[..MAGIC.len()].copy_from_slice(&MAGIC);
        write_u32(&mut buf, VERSION_OFFSET, FORMAT_VERSION);
        write_u32(&mut buf, ELEMENT_WIDTH_OFFSET, ELEMENT_SIZE as u32);
        write_u64(&mut buf, TOTAL_ELEMENTS_OFFSET, self.layout.total_elements());
        write_u64(&mut buf, CHUNK_ELEMENTS_OFFSET, self.layout.chunk_elements());
        write_u32(&mut buf, PATTERN_OFFSET, self.pattern.tag());
        write_u32(&mut buf, ALIGNMENT_OFFSET, self.alignment);
        write_u64(&mut buf, INDEX_OFFSET_OFFSET, self.index_offset);
        write_u64(&mut buf, CHUNK_COUNT_OFFSET, self.layout.chunk_count());
        buf
    }

    /// Decodes and validates a superblock.
    pub fn decode(buf: &[u8; SUPERBLOCK_SIZE]) -> ContainerResult<Self> {
        if buf[..MAGIC.len()] != MAGIC {
            return Err(format_error("bad magic"));
        }
        let version = read_u32(buf, VERSION_OFFSET);
        if version != FORMAT_VERSION {
            return Err(format_error(format!("unsupported format version {version}")));
        }
        let element_width = read_u32(buf, ELEMENT_WIDTH_OFFSET);
        if element_width as usize != ELEMENT_SIZE {
            return Err(format_error(format!("unsupported element width {element_width}")));
        }

        let layout = DatasetLayout::new(
            read_u64(buf, TOTAL_ELEMENTS_OFFSET),
            read_u64(buf, CHUNK_ELEMENTS_OFFSET),
        )
        .map_err(|e| format_error(e.to_string()))?;

        let pattern_tag = read_u32(buf, PATTERN_OFFSET);
        let pattern = FillPattern::from_tag(pattern_tag)
            .ok_or_else(|| format_error(format!("unknown fill pattern tag {pattern_tag}")))?;

        let alignment = read_u32(buf, ALIGNMENT_OFFSET);
        if alignment == 0 {
            return Err(format_error("alignment must be at least 1"));
        }

        let chunk_count = read_u64(buf, CHUNK_COUNT_OFFSET);
        if chunk_count != layout.chunk_count() {
            return Err(format_error(format!(
                "chunk count {chunk_count} disagrees with the layout ({} chunks)",
                layout.chunk_count()
            )));
        }

        let index_offset = read_u64(buf, INDEX_OFFSET_OFFSET);
        if index_offset < SUPERBLOCK_SIZE as u64 {
            return Err(format_error(format!("index offset {index_offset} overlaps the superblock")));
        }

        let superblock = Self { layout, pattern, alignment, index_offset };
        superblock.end_of_index()?;
        Ok(superblock)
    }

    /// Byte offset of the index entry for chunk `chunk_index`.
    ///
    /// Fails if the offset does not fit in a `u64`.
    pub fn index_entry_offset(&self, chunk_index: u64) -> ContainerResult<u64> {
        chunk_index
            .checked_mul(INDEX_ENTRY_SIZE as u64)
            .and_then(|len| self.index_offset.checked_add(len))
            .ok_or_else(|| {
                format_error(format!(
                    "index entry for chunk {chunk_index} lies beyond the addressable range"
                ))
            })
    }

    /// Byte offset just past the chunk index; a well-formed file is at least this long.
    pub fn end_of_index(&self) -> ContainerResult<u64> {
        self.index_entry_offset(self.layout.chunk_count())
    }
}

/// Encodes one chunk index entry.
pub(crate) fn encode_index_entry(entry: ChunkAddress) -> [u8; INDEX_ENTRY_SIZE] {
    let mut buf = [0u8; INDEX_ENTRY_SIZE];
    write_u64(&mut buf, 0, entry.address);
    write_u64(&mut buf, 8, entry.size);
    buf
}

/// Decodes one chunk index entry.
pub(crate) fn decode_index_entry(buf: &[u8; INDEX_ENTRY_SIZE]) -> ChunkAddress {
    ChunkAddress { address: read_u64(buf, 0), size: read_u64(buf, 8) }
}

/// Decodes little-endian elements from `bytes` into `out`.
pub(crate) fn decode_elements(bytes: &[u8], out: &mut [u32]) {
    for (value, raw) in out.iter_mut().zip(bytes.chunks_exact(ELEMENT_SIZE)) {
        *value = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
    }
}

/// Encodes elements as little-endian bytes, replacing the contents of `out`.
pub(crate) fn encode_elements(elements: &[u32], out: &mut Vec<u8>) {
    out.clear();
    out.reserve(elements.len() * ELEMENT_SIZE);
    for value in elements {
        out.extend_from_slice(&value.to_le_bytes());
    }
}

fn format_error(reason: impl Into<String>) -> ContainerError {
    ContainerError::Format { reason: reason.into() }
}

fn write_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn write_u64(buf: &mut [u8], offset: usize, value: u64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

fn read_u64(buf: &[u8], offset: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_le_bytes(raw)
}
