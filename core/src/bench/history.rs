use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use super::{
    unit::{Measurement, MeasurementParseError},
    BenchKey,
};

pub type History = BTreeMap<BenchKey, Measurement>;

/// Joins implementation and test name in history keys.
pub const KEY_SEPARATOR: &str = "___";

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error(transparent)]
    Fs(#[from] fsutil::Error),

    #[error("{path:?}: key '{key}' is not '<implementation>___<test>'")]
    MalformedKey { path: PathBuf, key: String },

    #[error("{path:?}: value of '{key}': {error}")]
    MalformedValue {
        path: PathBuf,
        key: String,
        #[source]
        error: MeasurementParseError,
    },
}

/// The measurements of the last benchmarking run of one problem, as a flat JSON object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file means empty history.
    pub fn load(&self) -> Result<History, HistoryError> {
        if !self.path.is_file() {
            return Ok(History::new());
        }
        let raw: BTreeMap<String, String> = fsutil::read_json_with_deserialize(&self.path)?;

        let mut history = History::new();
        for (key, value) in raw {
            let Some((implementation, test)) = key.split_once(KEY_SEPARATOR) else {
                return Err(HistoryError::MalformedKey {
                    path: self.path.clone(),
                    key,
                })
            };
            let m = value.parse::<Measurement>().map_err(|error| HistoryError::MalformedValue {
                path: self.path.clone(),
                key: key.clone(),
                error,
            })?;
            history.insert(BenchKey::new(implementation, test), m);
        }
        Ok(history)
    }

    /// Overwrites whatever was stored before.
    pub fn save(&self, history: &History) -> Result<(), HistoryError> {
        let raw: BTreeMap<String, String> = history
            .iter()
            .map(|(k, m)| {
                let key = format!("{}{}{}", k.implementation, KEY_SEPARATOR, k.test);
                (key, m.to_string())
            })
            .collect();
        fsutil::write_json_pretty_with_mkdir(&self.path, &raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use maplit::btreemap;

    use super::*;
    use crate::bench::unit::TimeUnit;

    fn ms(v: f64) -> Measurement {
        Measurement::new(v, TimeUnit::Millisecond)
    }

    #[test]
    fn missing_file_is_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("none.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_overwrites_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join(".chum/benchmarks/hello.json"));

        let first = btreemap! {
            BenchKey::new("hello.cpp", "1") => ms(1.5),
            BenchKey::new("hello.py", "1") => ms(30.0),
        };
        store.save(&first).unwrap();
        assert_eq!(store.load().unwrap(), first);

        let second = btreemap! {
            BenchKey::new("hello.cpp", "2") => Measurement::new(812.0, TimeUnit::Microsecond),
        };
        store.save(&second).unwrap();
        assert_eq!(store.load().unwrap(), second);
    }

    #[test]
    fn file_format_is_flat_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("hello.json"));
        store
            .save(&btreemap! { BenchKey::new("hello.cpp", "1") => ms(1.5) })
            .unwrap();
        let text = fsutil::read_to_string(store.path()).unwrap();
        assert_eq!(text, "{\n  \"hello.cpp___1\": \"1.5 ms\"\n}");
    }

    #[test]
    fn malformed_entries_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.json");
        let store = HistoryStore::new(&path);

        fsutil::write(&path, r#"{"hello.cpp": "1 ms"}"#).unwrap();
        assert!(matches!(store.load(), Err(HistoryError::MalformedKey { .. })));

        fsutil::write(&path, r#"{"hello.cpp___1": "quick"}"#).unwrap();
        assert!(matches!(store.load(), Err(HistoryError::MalformedValue { .. })));

        fsutil::write(&path, "[1, 2").unwrap();
        assert!(matches!(store.load(), Err(HistoryError::Fs(_))));
    }
}
