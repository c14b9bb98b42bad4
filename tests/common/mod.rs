//! Shared test utilities for integration tests.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::path::PathBuf;

use hexlay::{Config, View};
use tempfile::TempDir;

/// Writes `data` to a fresh file inside a temporary directory.
///
/// The directory is removed when the returned [`TempDir`] is dropped, so keep
/// it alive for as long as the path is used.
pub fn create_file(data: &[u8]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("sample.bin");
    std::fs::write(&path, data).expect("Failed to write test file");
    (dir, path)
}

/// Deterministic, non-repeating-looking content of `len` bytes.
pub fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i.wrapping_mul(31) ^ (i >> 8)) as u8).collect()
}

/// Creates and initializes a view of a new file holding `data`.
pub fn open_view(data: &[u8], config: Config) -> (TempDir, PathBuf, View) {
    let (dir, path) = create_file(data);
    let mut view = View::new(&path, config);
    view.init().expect("Failed to initialize view");
    (dir, path, view)
}

/// Reads the whole file back from disk.
pub fn read_back(path: &PathBuf) -> Vec<u8> {
    std::fs::read(path).expect("Failed to read test file")
}
