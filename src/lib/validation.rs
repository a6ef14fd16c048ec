//! Input validation utilities
//!
//! Common validation functions for command-line parameters and file paths, reporting
//! failures through the structured errors in [`crate::errors`].

use std::fmt::Display;
use std::path::Path;

use crate::container::{ContainerError, DatasetLayout};
use crate::errors::{ChunkFetchError, Result};

/// Validate that a file exists
///
/// # Arguments
/// * `path` - Path to validate
/// * `description` - Human-readable description of the file (e.g., "Input container")
///
/// # Example
/// ```
/// use chunkfetch_lib::validation::validate_file_exists;
///
/// let result = validate_file_exists("/nonexistent/data.chunks", "Input container");
/// assert!(result.is_err());
/// ```
pub fn validate_file_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        return Err(ChunkFetchError::InvalidFileFormat {
            file_type: description.to_string(),
            path: path_ref.display().to_string(),
            reason: "File does not exist".to_string(),
        });
    }
    Ok(())
}

/// Validate that a value is positive (> 0)
///
/// # Example
/// ```
/// use chunkfetch_lib::validation::validate_positive;
///
/// validate_positive(4, "threads").unwrap();
/// assert!(validate_positive(0, "threads").is_err());
/// ```
#[allow(clippy::needless_pass_by_value)]
pub fn validate_positive<T: Ord + Display + Default>(value: T, name: &str) -> Result<()> {
    if value <= T::default() {
        return Err(ChunkFetchError::InvalidParameter {
            parameter: name.to_string(),
            reason: format!("Must be positive (> 0), got: {value}"),
        });
    }
    Ok(())
}

/// Validate a worker thread count.
///
/// More workers than chunks is allowed; the extra workers simply stay idle.
pub fn validate_worker_count(workers: usize) -> Result<()> {
    validate_positive(workers, "threads")
}

/// Validate a chunk payload alignment in bytes.
pub fn validate_alignment(alignment: u32) -> Result<()> {
    validate_positive(alignment, "alignment")
}

/// Validate dataset dimensions and build the layout.
///
/// # Example
/// ```
/// use chunkfetch_lib::validation::validate_layout;
///
/// assert_eq!(validate_layout(4096, 1024).unwrap().chunk_count(), 4);
/// assert!(validate_layout(4096, 1000).is_err());
/// ```
pub fn validate_layout(total_elements: u64, chunk_elements: u64) -> Result<DatasetLayout> {
    DatasetLayout::new(total_elements, chunk_elements).map_err(|e| match e {
        ContainerError::Layout { reason } => {
            ChunkFetchError::InvalidParameter { parameter: "chunk-elements".to_string(), reason }
        }
        other => other.into(),
    })
}
