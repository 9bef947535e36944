#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

use csv_resolve::data::Dataset;

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// Builds a dataset from string literals: first row is the header.
pub fn dataset(rows: &[&[&str]]) -> Dataset {
    let fields = rows[0].iter().map(|f| f.to_string()).collect();
    let data = rows[1..]
        .iter()
        .map(|row| row.iter().map(|v| v.to_string()).collect())
        .collect();
    Dataset::new(fields, data).expect("valid test dataset")
}
