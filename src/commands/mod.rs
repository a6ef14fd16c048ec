//! CLI command implementations for chunkfetch.
//!
//! - [`generate`] - Write a deterministic chunked dataset
//! - [`read`] - Read a dataset back in one of four modes and verify every chunk

pub mod command;
pub mod common;
pub mod generate;
pub mod read;
