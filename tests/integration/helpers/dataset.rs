//! Dataset creation, corruption and CLI invocation helpers.

#![allow(dead_code)]

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use chunkfetch_lib::FillPattern;
use chunkfetch_lib::container::{Dataset, DatasetLayout};
use chunkfetch_lib::generator::{GenerateOptions, generate_dataset};

/// Elements in the reference scenario dataset.
pub const SCENARIO_ELEMENTS: u64 = 1_048_576;

/// Elements per chunk in the reference scenario dataset.
pub const SCENARIO_CHUNK: u64 = 1_024;

/// Writes a dataset into `dir` through the library and returns its path.
pub fn create_dataset(
    dir: &Path,
    name: &str,
    total_elements: u64,
    chunk_elements: u64,
    pattern: FillPattern,
) -> PathBuf {
    let path = dir.join(name);
    let layout = DatasetLayout::new(total_elements, chunk_elements).expect("valid layout");
    generate_dataset(&path, layout, &GenerateOptions { pattern, alignment: 1 })
        .expect("Failed to generate dataset");
    path
}

/// Writes the 1,048,576-element, 1,024-element-chunk scenario dataset.
pub fn create_scenario_dataset(dir: &Path) -> PathBuf {
    create_dataset(dir, "scenario.chunks", SCENARIO_ELEMENTS, SCENARIO_CHUNK, FillPattern::Sequence)
}

/// Flips every bit of byte `byte_offset` within the payload of chunk `chunk_index`.
pub fn corrupt_chunk_byte(path: &Path, chunk_index: u64, byte_offset: u64) {
    let address = {
        let mut dataset = Dataset::open(path).expect("Failed to open dataset");
        let coord = dataset.layout().chunk_coord(chunk_index);
        dataset.chunk_info_by_coord(coord).expect("Failed to locate chunk").address
    };

    let mut file = OpenOptions::new().read(true).write(true).open(path).expect("Failed to open file");
    let mut byte = [0u8; 1];
    file.seek(SeekFrom::Start(address + byte_offset)).unwrap();
    file.read_exact(&mut byte).unwrap();
    byte[0] ^= 0xFF;
    file.seek(SeekFrom::Start(address + byte_offset)).unwrap();
    file.write_all(&byte).unwrap();
    file.sync_all().unwrap();
}

/// Runs the `chunkfetch` binary with `args` and captures its output.
pub fn run_chunkfetch(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_chunkfetch"))
        .args(args)
        .output()
        .expect("Failed to run chunkfetch")
}

/// Runs `chunkfetch read` on `path` with extra arguments.
pub fn run_read(path: &Path, extra: &[&str]) -> Output {
    let mut args = vec!["read", "-i", path.to_str().unwrap()];
    args.extend_from_slice(extra);
    run_chunkfetch(&args)
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
