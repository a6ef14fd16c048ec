//! Integration tests for the generate command.

use chunkfetch_lib::FillPattern;
use chunkfetch_lib::container::{Dataset, DatasetLayout};
use rstest::rstest;
use tempfile::TempDir;

use crate::helpers::{run_chunkfetch, stderr_of};

#[test]
fn test_generate_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("data.chunks");

    let result = run_chunkfetch(&["generate", "-o", output.to_str().unwrap()]);
    assert!(result.status.success(), "generate failed: {}", stderr_of(&result));

    let mut dataset = Dataset::open(&output).unwrap();
    assert_eq!(dataset.layout(), DatasetLayout::new(1_048_576, 1_024).unwrap());
    assert_eq!(dataset.num_chunks().unwrap(), 1_024);
    assert_eq!(dataset.pattern(), FillPattern::Sequence);
    assert_eq!(dataset.alignment(), 1);
}

#[rstest]
#[case::sequence("sequence", FillPattern::Sequence)]
#[case::chunk_index("chunk-index", FillPattern::ChunkIndex)]
fn test_generate_records_pattern(#[case] name: &str, #[case] pattern: FillPattern) {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("data.chunks");

    let result = run_chunkfetch(&[
        "generate",
        "-o",
        output.to_str().unwrap(),
        "--total-elements",
        "4096",
        "--chunk-elements",
        "1024",
        "--pattern",
        name,
    ]);
    assert!(result.status.success(), "generate failed: {}", stderr_of(&result));

    let mut dataset = Dataset::open(&output).unwrap();
    assert_eq!(dataset.pattern(), pattern);
    let mut chunk = vec![0u32; 1024];
    dataset.read_chunk(3072, &mut chunk).unwrap();
    let mut expected = vec![0u32; 1024];
    pattern.fill(3, &mut expected);
    assert_eq!(chunk, expected);
}

#[test]
fn test_generate_with_alignment() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("aligned.chunks");

    let result = run_chunkfetch(&[
        "generate",
        "-o",
        output.to_str().unwrap(),
        "-n",
        "8192",
        "-c",
        "1024",
        "--alignment",
        "4096",
    ]);
    assert!(result.status.success(), "generate failed: {}", stderr_of(&result));

    let mut dataset = Dataset::open(&output).unwrap();
    for i in 0..8 {
        let info = dataset.chunk_info_by_coord(i * 1024).unwrap();
        assert_eq!(info.address % 4096, 0);
        assert_eq!(info.size, 4096);
    }
}

#[rstest]
#[case::not_dividing(&["-n", "4096", "-c", "1000"])]
#[case::zero_chunk(&["-n", "4096", "-c", "0"])]
#[case::zero_alignment(&["--alignment", "0"])]
fn test_generate_rejects_bad_parameters(#[case] extra: &[&str]) {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("bad.chunks");

    let mut args = vec!["generate", "-o", output.to_str().unwrap()];
    args.extend_from_slice(extra);
    let result = run_chunkfetch(&args);

    assert!(!result.status.success());
    assert!(stderr_of(&result).contains("Invalid parameter"));
    assert!(!output.exists());
}
