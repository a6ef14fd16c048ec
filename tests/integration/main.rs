//! Integration tests for the chunkfetch binary.
//!
//! These tests run the built `chunkfetch` executable end to end against container files
//! written to temporary directories.

mod helpers;
mod test_error_paths;
mod test_generate_command;
mod test_read_command;
