use std::path::{Path, PathBuf};

use crate::language::artifact_basename;

/// Holds executables, program outputs and benchmark reports of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchDir {
    dir: PathBuf,
}

impl ScratchDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn ensure(&self) -> fsutil::Result<()> {
        fsutil::mkdir_all(&self.dir)
    }

    /// `hello.cpp` -> `<dir>/hello_cpp`
    pub fn executable_path(&self, source: &Path) -> PathBuf {
        self.dir.join(artifact_basename(source))
    }

    /// `hello.cpp`, test `1` -> `<dir>/hello_cpp_1_output`
    pub fn output_path(&self, source: &Path, test_name: &str) -> PathBuf {
        let mut name = artifact_basename(source).into_os_string();
        name.push(format!("_{}_output", test_name));
        self.dir.join(name)
    }

    pub fn cleanup(&self) -> fsutil::Result<()> {
        fsutil::remove_dir_all(&self.dir)
    }
}
