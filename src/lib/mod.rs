#![deny(unsafe_code)]
// Clippy lint configuration for CI
// These lints are allowed because:
// - cast_*: offsets, element counts and chunk indices move between u64/usize/u32
// - missing_*_doc: Documentation improvements tracked separately
// - module_name_repetitions: `ChunkTask` in `task`, `PoolError` in `pool`, etc.
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::uninlined_format_args
)]

//! # chunkfetch - Concurrent Chunk Fetch-and-Verify Library
//!
//! This library reads a chunked, one-dimensional dataset back from its container file
//! and verifies every chunk against the deterministic fill pattern it was written with.
//!
//! ## Overview
//!
//! Locating a chunk inside the file goes through the container's metadata index, which
//! is **not** safe to use from several threads. Moving the chunk bytes off disk, on the
//! other hand, is independent per chunk. The engine therefore runs in two phases:
//!
//! ```text
//! ┌──────────────────┐    ┌──────────────────┐    ┌──────────────────┐
//! │ Resolver         │───>│ DescriptorTable  │───>│ Worker Pool      │
//! │ (serial, &mut)   │    │ (frozen, shared) │    │ (N threads,      │
//! │ chunk_info × N   │    │                  │    │  pread + verify) │
//! └──────────────────┘    └──────────────────┘    └──────────────────┘
//! ```
//!
//! ### Core
//!
//! - **[`descriptor`]** - Chunk descriptors, the frozen descriptor table and the serial resolver
//! - **[`pool`]** - Fixed-size worker pool with submit / wait / shutdown
//! - **[`task`]** - One positioned read plus verification per chunk
//! - **[`verify`]** - Pure comparison of chunk bytes against the fill pattern
//! - **[`outcome`]** - Thread-safe batch outcome collector
//! - **[`shared_file`]** - Read-only file handle that only performs positioned reads
//!
//! ### Container and Drivers
//!
//! - **[`container`]** - The chunked container format (writer, dataset reader, chunk index)
//! - **[`generator`]** - Writes the deterministic test dataset
//! - **[`pattern`]** - Fill patterns shared by the generator and the verifier
//! - **[`modes`]** - The four read strategies (library, direct-chunk, posix, multithreaded)
//!
//! ### Utilities
//!
//! - **[`errors`]** - Structured error types
//! - **[`logging`]** - Count/duration/bandwidth formatting and operation timing
//! - **[`validation`]** - Parameter and file validation
//!
//! ## Quick Start
//!
//! ```no_run
//! use chunkfetch_lib::container::DatasetLayout;
//! use chunkfetch_lib::generator::{GenerateOptions, generate_dataset};
//! use chunkfetch_lib::modes::{ReadMode, ReadOptions, read_dataset};
//!
//! # fn main() -> anyhow::Result<()> {
//! let layout = DatasetLayout::new(1_048_576, 1_024)?;
//! generate_dataset("data.chunks", layout, &GenerateOptions::default())?;
//!
//! let options = ReadOptions { mode: ReadMode::Multithreaded, workers: 4, ..ReadOptions::default() };
//! let summary = read_dataset("data.chunks", &options)?;
//! assert!(summary.is_success());
//! # Ok(())
//! # }
//! ```

pub mod container;
pub mod descriptor;
pub mod errors;
pub mod generator;
pub mod logging;
pub mod modes;
pub mod outcome;
pub mod pattern;
pub mod pool;
pub mod shared_file;
pub mod task;
pub mod validation;
pub mod verify;

pub use descriptor::{ChunkDescriptor, ChunkIndex, DescriptorTable, resolve_descriptors};
pub use errors::{ChunkFetchError, Result};
pub use pattern::FillPattern;
