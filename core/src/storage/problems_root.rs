use std::path::{Path, PathBuf};

use crate::bench::HistoryStore;
use crate::config::Config;

/// Marks a problems root.
pub const CHUM_DIR: &str = ".chum";

#[derive(Debug, thiserror::Error)]
pub enum ProblemsRootError {
    #[error("Not in a chum problems root: cannot find '.chum' in {0:?} or its parents (run `chum init` first)")]
    NotFound(PathBuf),

    #[error(transparent)]
    Fs(#[from] fsutil::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("No such problem exists: {0}")]
    NoSuchProblem(String),

    #[error("No such problem exists: {name}\n\nDid you mean any of:\n\t{}", .candidates.join("\n\t"))]
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },

    #[error(transparent)]
    Fs(#[from] fsutil::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStatus {
    Created,
    AlreadyInitialized,
}

/// A problem folder and the folders its tests may live in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub name: String,
    pub dir: PathBuf,
    pub test_dirs: Vec<PathBuf>,
}

/// The directory holding `.chum/` and one folder per problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemsRoot {
    dir: PathBuf,
}

impl ProblemsRoot {
    const TESTS_DIR: &str = "tests";
    const BENCHMARKS_DIR: &str = "benchmarks";
    const LAST_PROBLEM_FILE: &str = "last_problem";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Nearest ancestor of `cur_dir` (inclusive) that contains `.chum/`.
    pub fn find_in_ancestors(cur_dir: impl AsRef<Path>) -> Result<Self, ProblemsRootError> {
        let cur_dir = cur_dir.as_ref();
        cur_dir
            .ancestors()
            .find(|dir| dir.join(CHUM_DIR).is_dir())
            .map(Self::new)
            .ok_or_else(|| ProblemsRootError::NotFound(cur_dir.to_owned()))
    }

    /// Creates `.chum/{tests,benchmarks}` and the example config. Existing files are kept.
    pub fn init(dir: impl AsRef<Path>) -> Result<(Self, InitStatus), ProblemsRootError> {
        let root = Self::new(dir.as_ref());
        let status = if root.chum_dir().is_dir() {
            InitStatus::AlreadyInitialized
        } else {
            InitStatus::Created
        };

        fsutil::mkdir_all(root.tests_home())?;
        fsutil::mkdir_all(root.benchmarks_home())?;

        let config_file = root.config_file();
        if !config_file.exists() {
            match Config::example_toml() {
                Ok(toml) => fsutil::write(&config_file, toml)?,
                Err(e) => log::warn!("Skipped writing {:?}: {:#}", config_file, e),
            }
        }
        Ok((root, status))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn chum_dir(&self) -> PathBuf {
        self.dir.join(CHUM_DIR)
    }

    pub fn tests_home(&self) -> PathBuf {
        self.chum_dir().join(Self::TESTS_DIR)
    }

    pub fn benchmarks_home(&self) -> PathBuf {
        self.chum_dir().join(Self::BENCHMARKS_DIR)
    }

    pub fn config_file(&self) -> PathBuf {
        self.chum_dir().join(Config::FILENAME)
    }

    pub fn load_config(&self) -> anyhow::Result<Config> {
        Config::from_toml_file_or_builtin(self.config_file())
    }

    pub fn history_store(&self, problem_name: &str) -> HistoryStore {
        HistoryStore::new(self.benchmarks_home().join(format!("{}.json", problem_name)))
    }

    fn last_problem_file(&self) -> PathBuf {
        self.chum_dir().join(Self::LAST_PROBLEM_FILE)
    }

    pub fn last_problem(&self) -> Result<Option<String>, ProblemsRootError> {
        let path = self.last_problem_file();
        if !path.is_file() {
            return Ok(None);
        }
        let name = fsutil::read_to_string(path)?;
        let name = name.trim();
        Ok((!name.is_empty()).then(|| name.to_owned()))
    }

    pub fn set_last_problem(&self, name: &str) -> Result<(), ProblemsRootError> {
        fsutil::write_with_mkdir(self.last_problem_file(), name)?;
        Ok(())
    }

    /// Folders directly under the root, hidden ones excluded, sorted.
    pub fn problem_names(&self) -> fsutil::Result<Vec<String>> {
        let names = fsutil::list_dir_sorted(&self.dir)?
            .into_iter()
            .filter(|path| path.is_dir())
            .filter_map(|path| Some(path.file_name()?.to_string_lossy().into_owned()))
            .filter(|name| !name.starts_with('.'))
            .collect();
        Ok(names)
    }

    pub fn problem(&self, name: &str) -> Problem {
        let dir = self.dir.join(name);
        Problem {
            name: name.to_owned(),
            test_dirs: vec![
                self.tests_home().join(name),
                dir.join("test"),
                dir.join("tests"),
            ],
            dir,
        }
    }

    /// Exact folder name first, otherwise the single folder whose name contains `name`.
    pub fn resolve_problem(&self, name: &str) -> Result<Problem, ResolveError> {
        let name = name.trim_end_matches(['/', '\\']);
        let is_plain = !name.is_empty() && !name.starts_with('.') && !name.contains(['/', '\\']);
        if is_plain && self.dir.join(name).is_dir() {
            return Ok(self.problem(name));
        }

        let mut candidates: Vec<String> = self
            .problem_names()?
            .into_iter()
            .filter(|dir| !name.is_empty() && dir.contains(name))
            .collect();

        match candidates.len() {
            0 => Err(ResolveError::NoSuchProblem(name.to_owned())),
            1 => {
                let found = candidates.remove(0);
                log::warn!("No such problem exists, using only match: {}", found);
                Ok(self.problem(&found))
            }
            _ => Err(ResolveError::Ambiguous {
                name: name.to_owned(),
                candidates,
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn root_with(problems: &[&str]) -> (tempfile::TempDir, ProblemsRoot) {
        let dir = tempfile::tempdir().unwrap();
        let (root, status) = ProblemsRoot::init(dir.path()).unwrap();
        assert_eq!(status, InitStatus::Created);
        for p in problems {
            fsutil::mkdir_all(dir.path().join(p)).unwrap();
        }
        (dir, root)
    }

    #[test]
    fn init_is_idempotent() {
        let (dir, root) = root_with(&[]);
        assert!(root.tests_home().is_dir());
        assert!(root.benchmarks_home().is_dir());
        assert!(root.config_file().is_file());

        fsutil::write(root.config_file(), "# mine").unwrap();
        let (_, status) = ProblemsRoot::init(dir.path()).unwrap();
        assert_eq!(status, InitStatus::AlreadyInitialized);
        assert_eq!(fsutil::read_to_string(root.config_file()).unwrap(), "# mine");
    }

    #[test]
    fn found_from_nested_dir() {
        let (dir, _) = root_with(&["hello/tests"]);
        let root = ProblemsRoot::find_in_ancestors(dir.path().join("hello/tests")).unwrap();
        assert_eq!(root.dir(), dir.path());

        let outside = tempfile::tempdir().unwrap();
        assert!(matches!(
            ProblemsRoot::find_in_ancestors(outside.path()),
            Err(ProblemsRootError::NotFound(_))
        ));
    }

    #[test]
    fn last_problem_round_trip() {
        let (_dir, root) = root_with(&[]);
        assert_eq!(root.last_problem().unwrap(), None);
        root.set_last_problem("hello").unwrap();
        assert_eq!(root.last_problem().unwrap().as_deref(), Some("hello"));
    }

    #[test]
    fn problem_has_three_test_dirs() {
        let (dir, root) = root_with(&["hello"]);
        let p = root.resolve_problem("hello").unwrap();
        assert_eq!(p.dir, dir.path().join("hello"));
        assert_eq!(
            p.test_dirs,
            [
                dir.path().join(".chum/tests/hello"),
                dir.path().join("hello/test"),
                dir.path().join("hello/tests"),
            ]
        );
        assert_eq!(
            root.history_store("hello").path(),
            dir.path().join(".chum/benchmarks/hello.json")
        );
    }

    #[test]
    fn fuzzy_resolution() {
        let (_dir, root) = root_with(&["two_sum", "three_sum", "knapsack", ".hidden_sum"]);

        assert_eq!(root.resolve_problem("knap").unwrap().name, "knapsack");
        assert_eq!(root.resolve_problem("knapsack/").unwrap().name, "knapsack");

        match root.resolve_problem("sum") {
            Err(ResolveError::Ambiguous { candidates, .. }) => {
                assert_eq!(candidates, ["three_sum", "two_sum"])
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(matches!(
            root.resolve_problem("dijkstra"),
            Err(ResolveError::NoSuchProblem(_))
        ));
        assert!(matches!(
            root.resolve_problem(""),
            Err(ResolveError::NoSuchProblem(_))
        ));
    }
}
