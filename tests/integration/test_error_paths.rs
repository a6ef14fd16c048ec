//! Integration tests for fatal error paths and exit codes.

use std::fs;

use tempfile::TempDir;

use crate::helpers::{create_dataset, run_chunkfetch, run_read, stderr_of};
use chunkfetch_lib::FillPattern;

#[test]
fn test_missing_input_file() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing.chunks");

    let result = run_read(&missing, &[]);
    assert!(!result.status.success());
    assert!(stderr_of(&result).contains("File does not exist"));
}

#[test]
fn test_not_a_container() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("garbage.chunks");
    fs::write(&path, vec![0xABu8; 4096]).unwrap();

    let result = run_read(&path, &[]);
    assert!(!result.status.success());
    assert!(stderr_of(&result).contains("Not a valid chunk container"));
}

#[test]
fn test_zero_threads_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_dataset(temp_dir.path(), "data.chunks", 4_096, 1_024, FillPattern::Sequence);

    let result = run_read(&path, &["-t", "0"]);
    assert!(!result.status.success());
    assert!(stderr_of(&result).contains("Invalid parameter 'threads'"));
}

#[test]
fn test_unresolvable_chunk_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_dataset(temp_dir.path(), "data.chunks", 4_096, 1_024, FillPattern::Sequence);

    // Zero the index entry of the last chunk so the lookup reports it as unwritten.
    let mut bytes = fs::read(&path).unwrap();
    let len = bytes.len();
    bytes[len - 16..].fill(0);
    fs::write(&path, &bytes).unwrap();

    for mode in ["posix", "multithreaded"] {
        let result = run_read(&path, &["--mode", mode]);
        assert!(!result.status.success());
        assert!(
            stderr_of(&result).contains("Failed to resolve chunk 3"),
            "unexpected stderr for {mode}: {}",
            stderr_of(&result)
        );
    }
}

#[test]
fn test_unknown_mode_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_dataset(temp_dir.path(), "data.chunks", 4_096, 1_024, FillPattern::Sequence);

    let result = run_chunkfetch(&["read", "-i", path.to_str().unwrap(), "--mode", "mmap"]);
    assert!(!result.status.success());
    assert!(stderr_of(&result).contains("invalid value 'mmap'"));
}
