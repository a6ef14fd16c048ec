//! Integration tests for the read command.

use rstest::rstest;
use tempfile::TempDir;

use crate::helpers::{
    corrupt_chunk_byte, create_dataset, create_scenario_dataset, run_read, stderr_of, stdout_of,
};
use chunkfetch_lib::FillPattern;

#[rstest]
#[case::library("library")]
#[case::direct_chunk("direct-chunk")]
#[case::posix("posix")]
#[case::multithreaded("multithreaded")]
fn test_scenario_dataset_passes(#[case] mode: &str) {
    let temp_dir = TempDir::new().unwrap();
    let path = create_scenario_dataset(temp_dir.path());

    let result = run_read(&path, &["--mode", mode]);
    assert!(result.status.success(), "{mode} failed: {}", stderr_of(&result));

    let stdout = stdout_of(&result);
    assert!(stdout.contains("PASS"), "unexpected stdout: {stdout}");
    assert!(stdout.contains("1,024 of 1,024 chunks verified"));
}

#[rstest]
#[case::library("library")]
#[case::direct_chunk("direct-chunk")]
#[case::posix("posix")]
#[case::multithreaded("multithreaded")]
fn test_corrupted_chunk_fails(#[case] mode: &str) {
    let temp_dir = TempDir::new().unwrap();
    let path = create_scenario_dataset(temp_dir.path());
    corrupt_chunk_byte(&path, 512, 0);

    let result = run_read(&path, &["--mode", mode]);
    assert!(!result.status.success());

    let stdout = stdout_of(&result);
    let stderr = stderr_of(&result);
    assert!(stdout.contains("FAIL"), "unexpected stdout: {stdout}");
    assert!(
        stderr.contains("Chunk 512 failed verification: element 0 should be 0 but is 255"),
        "unexpected stderr: {stderr}"
    );
    assert_eq!(stderr.matches("failed verification").count(), 1);
}

#[test]
fn test_multithreaded_completes_after_failure() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_scenario_dataset(temp_dir.path());
    corrupt_chunk_byte(&path, 512, 0);

    let result = run_read(&path, &["--mode", "multithreaded"]);
    assert!(!result.status.success());
    assert!(stdout_of(&result).contains("1,023 of 1,024 chunks verified, 1 failed, 0 skipped"));
}

#[rstest]
#[case::one_worker("1")]
#[case::four_workers("4")]
#[case::worker_per_chunk("1024")]
fn test_worker_counts_agree(#[case] threads: &str) {
    let temp_dir = TempDir::new().unwrap();
    let path = create_scenario_dataset(temp_dir.path());

    let clean = run_read(&path, &["-t", threads]);
    assert!(clean.status.success(), "clean read failed: {}", stderr_of(&clean));

    corrupt_chunk_byte(&path, 512, 0);
    let corrupted = run_read(&path, &["-t", threads]);
    assert!(!corrupted.status.success());
    assert!(stderr_of(&corrupted).contains("Chunk 512 failed verification"));
}

#[test]
fn test_chunk_index_pattern_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_dataset(temp_dir.path(), "ci.chunks", 65_536, 1_024, FillPattern::ChunkIndex);

    let result = run_read(&path, &[]);
    assert!(result.status.success(), "read failed: {}", stderr_of(&result));

    corrupt_chunk_byte(&path, 7, 0);
    let result = run_read(&path, &[]);
    assert!(!result.status.success());
    // Chunk 7 holds 7 everywhere; flipping the low byte of element 0 gives 0xF8.
    assert!(stderr_of(&result).contains("Chunk 7 failed verification: element 0 should be 7 but is 248"));
}

#[test]
fn test_corruption_mid_chunk_reports_element() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_dataset(temp_dir.path(), "mid.chunks", 16_384, 1_024, FillPattern::Sequence);
    // Byte 400 is the low byte of element 100.
    corrupt_chunk_byte(&path, 2, 400);

    let result = run_read(&path, &["--mode", "posix"]);
    assert!(!result.status.success());
    assert!(stderr_of(&result).contains("element 100 should be 100 but is 155"));
}

#[test]
fn test_print_timing_and_bandwidth() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_dataset(temp_dir.path(), "small.chunks", 8_192, 1_024, FillPattern::Sequence);

    let result = run_read(&path, &["--print-timing", "--print-bandwidth"]);
    assert!(result.status.success(), "read failed: {}", stderr_of(&result));

    let stdout = stdout_of(&result);
    let chunk_lines: Vec<&str> = stdout.lines().filter(|l| l.starts_with("chunk ")).collect();
    assert_eq!(chunk_lines.len(), 8);
    assert!(chunk_lines.iter().all(|l| l.contains(" time ") && l.contains(" bandwidth ")));
    assert!(stdout.lines().any(|l| l.starts_with("total: ") && l.ends_with("MiB/s)")));
}

#[test]
fn test_no_per_chunk_output_by_default() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_dataset(temp_dir.path(), "small.chunks", 8_192, 1_024, FillPattern::Sequence);

    let result = run_read(&path, &[]);
    assert!(result.status.success());
    assert!(!stdout_of(&result).lines().any(|l| l.starts_with("chunk ")));
}

#[test]
fn test_fail_fast_skips_remaining_chunks() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_scenario_dataset(temp_dir.path());
    corrupt_chunk_byte(&path, 0, 0);

    let result = run_read(&path, &["-t", "1", "--fail-fast"]);
    assert!(!result.status.success());
    let stdout = stdout_of(&result);
    // With one worker the first chunk fails before any other starts.
    assert!(
        stdout.contains("0 of 1,024 chunks verified, 1 failed, 1,023 skipped"),
        "unexpected stdout: {stdout}"
    );
}
