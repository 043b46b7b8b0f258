use std::path::{Path, PathBuf};

/// A matched pair of input and expected-output files.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestCase {
    name: String,
    input_path: PathBuf,
    answer_path: PathBuf,
}

pub trait TestcaseFinder {
    fn find_by_input_file_path(&self, path: &Path) -> Option<TestCase>;
}

/// Finds `<stem>.<input_ext>` files that have a sibling `<stem>.<answer_ext>`.
/// Earlier answer extensions win when several exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFinder {
    pub input_ext: String,
    pub answer_exts: Vec<String>,
}

impl Default for ExtensionFinder {
    fn default() -> Self {
        Self {
            input_ext: "in".to_owned(),
            answer_exts: vec!["ans".to_owned(), "out".to_owned()],
        }
    }
}

impl TestcaseFinder for ExtensionFinder {
    fn find_by_input_file_path(&self, path: &Path) -> Option<TestCase> {
        if path.extension()? != self.input_ext.as_str() {
            return None;
        }
        let stem = path.file_stem()?.to_string_lossy();
        self.answer_exts
            .iter()
            .map(|ext| path.with_extension(ext))
            .find(|answer| answer.is_file())
            .map(|answer| TestCase::new(stem.as_ref(), path, answer))
    }
}

impl TestCase {
    pub fn new(
        name: impl Into<String>,
        input: impl Into<PathBuf>,
        answer: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            input_path: input.into(),
            answer_path: answer.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn answer_path(&self) -> &Path {
        &self.answer_path
    }

    /// Union of the test cases found in `dirs`, ordered by stem (then path).
    /// Dirs that don't exist are skipped.
    pub fn discover(
        dirs: &[impl AsRef<Path>],
        finder: &impl TestcaseFinder,
    ) -> fsutil::Result<Vec<Self>> {
        let mut found = Vec::new();
        for dir in dirs.iter().map(AsRef::as_ref) {
            if !dir.is_dir() {
                log::debug!("Test dir {:?} does not exist, skipping", dir);
                continue;
            }
            for entry in fsutil::read_dir(dir)?.filter_map(Result::ok) {
                let Ok(ft) = entry.file_type() else {
                    continue
                };
                if ft.is_dir() {
                    continue;
                }
                if let Some(t) = finder.find_by_input_file_path(&entry.path()) {
                    found.push(t);
                }
            }
        }
        found.sort_by(|a, b| {
            (&a.name, &a.input_path).cmp(&(&b.name, &b.input_path))
        });
        found.dedup();
        Ok(found)
    }
}
