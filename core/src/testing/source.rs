use std::path::{Path, PathBuf};

use crate::language::LanguageRegistry;

/// One solution file for a problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCandidate {
    path: PathBuf,
    language: String,
    problem_dir: PathBuf,
}

impl SourceCandidate {
    pub fn new(
        path: impl Into<PathBuf>,
        language: impl Into<String>,
        problem_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            path: path.into(),
            language: language.into(),
            problem_dir: problem_dir.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name, e.g. `hello.cpp`. Identifies the implementation in benchmarks.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .unwrap_or(self.path.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn problem_dir(&self) -> &Path {
        &self.problem_dir
    }

    /// Files directly in `problem_dir` whose name starts with `problem_name`
    /// and matches a registered language, sorted by file name.
    pub fn discover(
        problem_dir: impl AsRef<Path>,
        problem_name: &str,
        languages: &LanguageRegistry,
    ) -> fsutil::Result<Vec<Self>> {
        let problem_dir = problem_dir.as_ref();
        let mut res = Vec::new();
        for path in fsutil::list_dir_sorted(problem_dir)? {
            if !path.is_file() {
                continue;
            }
            let Some(filename) = path.file_name().map(|s| s.to_string_lossy().into_owned()) else {
                continue
            };
            if !filename.starts_with(problem_name) {
                continue;
            }
            match languages.find_for_filename(&filename) {
                Some(lang) => res.push(Self::new(&path, lang.name(), problem_dir)),
                None => log::debug!("No language registered for {:?}, ignored", path),
            }
        }
        Ok(res)
    }
}
