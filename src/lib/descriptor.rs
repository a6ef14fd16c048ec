//! Chunk descriptors and the serial resolver that builds them.
//!
//! Resolution is the only phase that talks to the container's chunk index. It runs on a
//! single thread against a `&mut` [`ChunkIndex`] and produces a frozen
//! [`DescriptorTable`] that worker threads can then share without locks.

use crate::container::{ChunkAddress, ContainerError, ContainerResult, Dataset, DatasetLayout};
use crate::errors::{ChunkFetchError, Result};

/// Physical location of one logical chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkDescriptor {
    /// Position of the chunk in the dataset, `0..chunk_count`
    pub logical_index: u64,
    /// Byte offset of the chunk payload in the container file
    pub physical_offset: u64,
    /// Byte length of the chunk payload
    pub byte_length: u64,
}

/// Descriptors for every chunk of a dataset, in logical order.
///
/// There is no way to mutate a table once [`resolve_descriptors`] has returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorTable {
    layout: DatasetLayout,
    descriptors: Box<[ChunkDescriptor]>,
}

impl DescriptorTable {
    /// Geometry of the dataset the table was resolved from.
    #[must_use]
    pub fn layout(&self) -> DatasetLayout {
        self.layout
    }

    /// Number of chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// True if the table holds no descriptors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Descriptor for logical chunk `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ChunkDescriptor> {
        self.descriptors.get(index)
    }

    /// Iterates descriptors in logical order.
    pub fn iter(&self) -> std::slice::Iter<'_, ChunkDescriptor> {
        self.descriptors.iter()
    }

    /// Sum of all descriptor byte lengths.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.descriptors.iter().map(|d| d.byte_length).sum()
    }
}

impl<'a> IntoIterator for &'a DescriptorTable {
    type Item = &'a ChunkDescriptor;
    type IntoIter = std::slice::Iter<'a, ChunkDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.iter()
    }
}

/// Chunk metadata lookups offered by a container library.
///
/// Lookups take `&mut self`: implementations are not safe for concurrent invocation
/// and must only be driven from the resolving thread.
pub trait ChunkIndex {
    /// Geometry of the dataset.
    fn layout(&self) -> DatasetLayout;

    /// Number of chunks the library reports for the dataset.
    fn chunk_count(&mut self) -> ContainerResult<u64>;

    /// Physical address and size of the chunk whose first element is at `coord`.
    fn chunk_location(&mut self, coord: u64) -> ContainerResult<ChunkAddress>;
}

impl ChunkIndex for Dataset {
    fn layout(&self) -> DatasetLayout {
        Dataset::layout(self)
    }

    fn chunk_count(&mut self) -> ContainerResult<u64> {
        self.num_chunks()
    }

    fn chunk_location(&mut self, coord: u64) -> ContainerResult<ChunkAddress> {
        self.chunk_info_by_coord(coord)
    }
}

/// Resolves the physical location of every chunk, one lookup per chunk, in order.
///
/// Either every chunk resolves or an error naming the first failing chunk is
/// returned; no partial table is produced.
pub fn resolve_descriptors<I: ChunkIndex + ?Sized>(index: &mut I) -> Result<DescriptorTable> {
    let layout = index.layout();
    let reported = index.chunk_count()?;
    if reported != layout.chunk_count() {
        return Err(ContainerError::Format {
            reason: format!(
                "chunk index reports {reported} chunks but the layout implies {}",
                layout.chunk_count()
            ),
        }
        .into());
    }

    let mut descriptors: Vec<ChunkDescriptor> = Vec::new();
    usize::try_from(reported)
        .ok()
        .and_then(|capacity| descriptors.try_reserve_exact(capacity).ok())
        .ok_or_else(|| ContainerError::Format {
            reason: format!("chunk index of {reported} chunks cannot be held in memory"),
        })?;
    for logical_index in 0..reported {
        let address = index
            .chunk_location(layout.chunk_coord(logical_index))
            .map_err(|source| ChunkFetchError::MetadataResolution { chunk_index: logical_index, source })?;
        descriptors.push(ChunkDescriptor {
            logical_index,
            physical_offset: address.address,
            byte_length: address.size,
        });
    }

    log::debug!("Resolved {} chunk descriptors", descriptors.len());
    Ok(DescriptorTable { layout, descriptors: descriptors.into_boxed_slice() })
}
