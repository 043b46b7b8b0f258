use serde::{de::DeserializeOwned, Serialize};
use std::{
    env,
    fs::{self, File, ReadDir},
    io::BufReader,
    path::{Path, PathBuf},
};

pub mod error {
    use std::{io, path::PathBuf};

    pub type Result<T> = std::result::Result<T, self::Error>;

    type Msg = &'static str;

    #[derive(Debug, thiserror::Error)]
    pub enum Error {
        #[error("{0} ({1}): {2}")]
        SingleIO(Msg, PathBuf, #[source] io::Error),

        #[error("Cannot serialize to JSON (dest='{0}'): {1}")]
        SerializeToJson(PathBuf, #[source] serde_json::Error),

        #[error("Cannot deserialize from JSON (src='{0}'): {1}")]
        DeserializeFromJson(PathBuf, #[source] serde_json::Error),
    }

    impl Error {
        pub fn path(&self) -> &std::path::Path {
            match self {
                Self::SingleIO(_, path, _)
                | Self::SerializeToJson(path, _)
                | Self::DeserializeFromJson(path, _) => path,
            }
        }
    }
}
pub use error::{Error, Result};

#[must_use]
pub fn mkdir_all(path: impl AsRef<Path>) -> Result<()> {
    let dir = path.as_ref();
    fs::create_dir_all(dir).map_err(|e| Error::SingleIO("Cannot create dir", dir.to_owned(), e))
}

#[must_use]
pub fn write<P, C>(filepath: P, contents: C) -> Result<()>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    fs::write(&filepath, contents)
        .map_err(|e| Error::SingleIO("Cannot write file", filepath.as_ref().to_owned(), e))
}

#[must_use]
pub fn write_with_mkdir<P, C>(filepath: P, contents: C) -> Result<()>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    if let Some(dir) = filepath.as_ref().parent() {
        self::mkdir_all(dir)?;
    }
    self::write(filepath, contents)
}

#[must_use]
pub fn read_to_string(filepath: impl AsRef<Path>) -> Result<String> {
    fs::read_to_string(&filepath)
        .map_err(|e| Error::SingleIO("Cannot read file", filepath.as_ref().to_owned(), e))
}

#[must_use]
pub fn open_file(filepath: impl AsRef<Path>) -> Result<File> {
    File::open(&filepath)
        .map_err(|e| Error::SingleIO("Cannot open file", filepath.as_ref().to_owned(), e))
}

/// Creates (or truncates) a file for writing.
#[must_use]
pub fn create_file(filepath: impl AsRef<Path>) -> Result<File> {
    File::create(&filepath)
        .map_err(|e| Error::SingleIO("Cannot create file", filepath.as_ref().to_owned(), e))
}

#[must_use]
pub fn remove_file(filepath: impl AsRef<Path>) -> Result<()> {
    fs::remove_file(&filepath)
        .map_err(|e| Error::SingleIO("Cannot remove file", filepath.as_ref().to_owned(), e))
}

/// Removes `dir` and everything below it. A missing dir is not an error.
#[must_use]
pub fn remove_dir_all(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    if !dir.exists() {
        log::debug!("Skip removing non-existent dir {:?}", dir);
        return Ok(());
    }
    fs::remove_dir_all(dir).map_err(|e| Error::SingleIO("Cannot remove dir", dir.to_owned(), e))
}

#[must_use]
pub fn read_dir(dir: impl AsRef<Path>) -> Result<ReadDir> {
    fs::read_dir(&dir).map_err(|e| Error::SingleIO("Cannot read dir", dir.as_ref().to_owned(), e))
}

/// Lists entries of `dir` sorted by path. Entries that cannot be read are skipped.
pub fn list_dir_sorted(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<_> = self::read_dir(&dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .collect();
    paths.sort();
    Ok(paths)
}

#[must_use]
pub fn write_json_pretty_with_mkdir<P, T>(filepath: P, data: &T) -> Result<()>
where
    P: AsRef<Path>,
    T: Serialize,
{
    let s = serde_json::to_string_pretty(data)
        .map_err(|e| Error::SerializeToJson(filepath.as_ref().to_owned(), e))?;
    write_with_mkdir(filepath, &s)
}

#[must_use]
pub fn read_json_with_deserialize<P, T>(filepath: P) -> Result<T>
where
    P: AsRef<Path>,
    T: DeserializeOwned,
{
    let filepath = filepath.as_ref();
    let f = self::open_file(filepath)?;
    serde_json::from_reader(BufReader::new(f))
        .map_err(|e| Error::DeserializeFromJson(filepath.to_owned(), e))
}

/// Finds an executable named `program` in `$PATH`.
/// A `program` containing a path separator is checked as-is.
pub fn find_executable(program: impl AsRef<Path>) -> Option<PathBuf> {
    let program = program.as_ref();
    if program.components().count() > 1 {
        return is_executable(program).then(|| program.to_owned());
    }
    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}

/// Strip `base` from `path` for display, falling back to `path` itself.
/// ```
/// use fsutil::relative_to;
/// use std::path::Path;
///
/// assert_eq!(relative_to("/work/probs/hello/a.in", "/work/probs"), Path::new("hello/a.in"));
/// assert_eq!(relative_to("/etc/passwd", "/work"), Path::new("/etc/passwd"));
/// assert_eq!(relative_to("/work", "/work"), Path::new("."));
/// ```
pub fn relative_to(path: impl AsRef<Path>, base: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    match path.strip_prefix(base) {
        Ok(rel) if rel.as_os_str().is_empty() => PathBuf::from("."),
        Ok(rel) => rel.to_owned(),
        Err(_) => path.to_owned(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn json_written_pretty_can_be_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/data.json");

        let mut data = BTreeMap::new();
        data.insert("hello.rs___1".to_owned(), "1.5 ms".to_owned());
        write_json_pretty_with_mkdir(&path, &data).unwrap();

        let text = read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"hello.rs___1\""));

        let back: BTreeMap<String, String> = read_json_with_deserialize(&path).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn reading_broken_json_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        write(&path, "{ not json").unwrap();

        let err = read_json_with_deserialize::<_, BTreeMap<String, String>>(&path).unwrap_err();
        assert!(matches!(err, Error::DeserializeFromJson(..)));
        assert_eq!(err.path(), path);
    }

    #[test]
    fn remove_dir_all_ignores_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("scratch");
        remove_dir_all(&target).unwrap();

        write_with_mkdir(target.join("a/b.txt"), "x").unwrap();
        remove_dir_all(&target).unwrap();
        assert!(!target.exists());
    }

    #[test]
    fn list_dir_sorted_returns_sorted_paths() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.in", "a.in", "c.ans"] {
            write(dir.path().join(name), "").unwrap();
        }
        let names: Vec<_> = list_dir_sorted(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.in", "b.in", "c.ans"]);
    }

    #[cfg(unix)]
    #[test]
    fn find_executable_finds_sh() {
        assert!(dbg!(find_executable("sh")).is_some());
        assert!(find_executable("surely-no-such-program-exists-here").is_none());
    }
}
