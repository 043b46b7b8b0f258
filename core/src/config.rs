use std::path::{Path, PathBuf};
use std::result::Result as StdResult;
use std::time::Duration;

use anyhow::Context as _;
use rust_embed::RustEmbed;
use serde::Deserialize;

use crate::bench::Hyperfine;
use crate::language::{LanguageConfig, LanguageRegistry};
use crate::testing::ExtensionFinder;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub source_config_file: Option<PathBuf>,
    #[serde(default)]
    pub test: TestConfig,
    #[serde(default)]
    pub benchmark: BenchmarkConfig,
    #[serde(default)]
    pub language: Vec<LanguageConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TestConfig {
    pub scratch_dir: PathBuf,
    pub timeout_ms: Option<u64>,
    pub input_ext: String,
    pub answer_exts: Vec<String>,
}

impl Default for TestConfig {
    fn default() -> Self {
        let finder = ExtensionFinder::default();
        Self {
            scratch_dir: PathBuf::from("chum_output"),
            timeout_ms: None,
            input_ext: finder.input_ext,
            answer_exts: finder.answer_exts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    pub program: String,
    pub extra_args: Vec<String>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            program: Hyperfine::DEFAULT_PROGRAM.to_owned(),
            extra_args: Vec::new(),
        }
    }
}

/// `CHUM_*` environment variables, applied on top of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EnvOverrides {
    pub timeout_ms: Option<u64>,
    pub scratch_dir: Option<PathBuf>,
    pub benchmark_program: Option<String>,
}

impl EnvOverrides {
    pub const PREFIX: &str = "CHUM_";

    pub fn from_env() -> anyhow::Result<Self> {
        envy::prefixed(Self::PREFIX)
            .from_env::<Self>()
            .context("Invalid CHUM_* environment variable")
    }
}

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Asset;

impl Config {
    pub const FILENAME: &str = "chum.toml";

    pub fn example_toml() -> anyhow::Result<String> {
        let file = Asset::get(Self::FILENAME)
            .with_context(|| format!("'{}' is not embedded in this binary", Self::FILENAME))?;
        let s = std::str::from_utf8(file.data.as_ref()).context("Example config is not UTF-8")?;
        Ok(s.to_owned())
    }

    pub fn from_toml(s: &str) -> StdResult<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// The embedded example; used when a problems root has no config file.
    pub fn builtin() -> anyhow::Result<Self> {
        let toml = Self::example_toml()?;
        Self::from_toml(&toml).context("Invalid builtin config")
    }

    pub fn from_toml_file(filepath: PathBuf) -> anyhow::Result<Self> {
        let toml = fsutil::read_to_string(&filepath).context("Cannot read a file")?;
        let mut cfg = Self::from_toml(&toml)
            .with_context(|| format!("Invalid config TOML: {:?}", filepath))?;
        cfg.source_config_file = Some(filepath);
        Ok(cfg)
    }

    pub fn from_toml_file_or_builtin(filepath: impl AsRef<Path>) -> anyhow::Result<Self> {
        let filepath = filepath.as_ref();
        if filepath.is_file() {
            Self::from_toml_file(filepath.to_owned())
        } else {
            log::debug!("{:?} not found, using builtin config", filepath);
            Self::builtin()
        }
    }

    pub fn with_env_overrides(mut self, env: EnvOverrides) -> Self {
        let EnvOverrides {
            timeout_ms,
            scratch_dir,
            benchmark_program,
        } = env;

        if timeout_ms.is_some() {
            self.test.timeout_ms = timeout_ms;
        }
        if let Some(dir) = scratch_dir {
            self.test.scratch_dir = dir;
        }
        if let Some(program) = benchmark_program {
            self.benchmark.program = program;
        }
        self
    }

    pub fn language_registry(&self) -> anyhow::Result<LanguageRegistry> {
        LanguageRegistry::from_configs(&self.language).with_context(|| match &self.source_config_file {
            Some(path) => format!("Invalid [[language]] entry in {:?}", path),
            None => "Invalid [[language]] entry".to_owned(),
        })
    }
}

impl TestConfig {
    /// `timeout_ms = 0` is treated as no timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
    }

    pub fn testcase_finder(&self) -> ExtensionFinder {
        ExtensionFinder {
            input_ext: self.input_ext.clone(),
            answer_exts: self.answer_exts.clone(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn example_toml_should_be_parsable() {
        let toml = Config::example_toml().unwrap();
        let cfg = dbg!(Config::from_toml(&toml)).unwrap();

        let Config {
            source_config_file,
            test,
            benchmark,
            language,
        } = cfg.clone();

        assert_eq!(source_config_file, None);
        assert_eq!(test.scratch_dir, Path::new("chum_output"));
        assert_eq!(test.timeout(), Some(Duration::from_secs(10)));
        assert_eq!(test.testcase_finder(), ExtensionFinder::default());

        assert_eq!(benchmark, BenchmarkConfig::default());

        let names: Vec<_> = language.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["cpp", "rust", "python"]);

        let registry = cfg.language_registry().unwrap();
        assert!(registry.find_for_filename("hello.cpp").unwrap().needs_compile());
        assert!(!registry.find_for_filename("hello.py").unwrap().needs_compile());
    }

    #[test]
    fn missing_sections_use_defaults() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg.test, TestConfig::default());
        assert_eq!(cfg.test.timeout(), None);
        assert!(cfg.language.is_empty());

        let cfg = Config::from_toml("[benchmark]\nextra_args = [\"--warmup\", \"3\"]\n").unwrap();
        assert_eq!(cfg.benchmark.extra_args, ["--warmup", "3"]);
        assert_eq!(cfg.benchmark.program, "hyperfine");
    }

    #[test]
    fn invalid_language_pattern_is_rejected() {
        let toml = "[[language]]\nname = \"x\"\npattern = \"[\"\nrun = [\"x\"]\n";
        assert!(Config::from_toml(toml).is_err());
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let env: EnvOverrides = envy::prefixed(EnvOverrides::PREFIX)
            .from_iter(vec![
                ("CHUM_TIMEOUT_MS".to_owned(), "250".to_owned()),
                ("CHUM_BENCHMARK_PROGRAM".to_owned(), "/opt/hyperfine".to_owned()),
                ("UNRELATED".to_owned(), "1".to_owned()),
            ])
            .unwrap();

        let cfg = Config::builtin().unwrap().with_env_overrides(env);
        assert_eq!(cfg.test.timeout(), Some(Duration::from_millis(250)));
        assert_eq!(cfg.test.scratch_dir, Path::new("chum_output"));
        assert_eq!(cfg.benchmark.program, "/opt/hyperfine");
    }

    #[test]
    fn config_file_is_remembered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(Config::FILENAME);
        fsutil::write(&path, "[test]\nscratch_dir = \"out\"\n").unwrap();

        let cfg = Config::from_toml_file_or_builtin(&path).unwrap();
        assert_eq!(cfg.source_config_file.as_deref(), Some(path.as_path()));
        assert_eq!(cfg.test.scratch_dir, Path::new("out"));

        let cfg = Config::from_toml_file_or_builtin(dir.path().join("none.toml")).unwrap();
        assert_eq!(cfg.source_config_file, None);
        assert_eq!(cfg.language.len(), 3);
    }
}
