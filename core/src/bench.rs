//! Timing of source candidates through an external benchmarking tool,
//! with history comparison across runs.

pub mod history;
pub mod hyperfine;
pub mod table;
pub mod unit;

pub use history::{History, HistoryError, HistoryStore};
pub use hyperfine::{Hyperfine, ReportParseError};
pub use table::ComparisonTable;
pub use unit::{Delta, Measurement, TimeUnit};

use std::{
    fmt, io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use crate::testing::{BoundCommand, CommandLine};

/// Which of the tool's statistics goes into the table and history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Statistic {
    #[default]
    Fastest,
    Mean,
}

impl Statistic {
    pub fn title(self) -> &'static str {
        match self {
            Self::Fastest => "Fastest executions",
            Self::Mean => "Average executions",
        }
    }
}

/// Identifies a cell of the comparison: implementation file name and test stem.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BenchKey {
    pub implementation: String,
    pub test: String,
}

impl BenchKey {
    pub fn new(implementation: impl Into<String>, test: impl Into<String>) -> Self {
        Self {
            implementation: implementation.into(),
            test: test.into(),
        }
    }
}

impl fmt::Display for BenchKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} --> {}", self.implementation, self.test)
    }
}

/// One program to time against one test input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkTask {
    key: BenchKey,
    input: PathBuf,
    command: CommandLine,
}

impl BenchmarkTask {
    pub fn new(key: BenchKey, input: impl Into<PathBuf>, command: CommandLine) -> Self {
        Self {
            key,
            input: input.into(),
            command,
        }
    }

    /// The tool feeds `input` itself, so the output redirection is dropped.
    pub fn from_bound(implementation: impl Into<String>, test: impl Into<String>, bound: &BoundCommand) -> Self {
        Self::new(
            BenchKey::new(implementation, test),
            bound.input(),
            bound.command_line().clone(),
        )
    }

    pub fn key(&self) -> &BenchKey {
        &self.key
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn command(&self) -> &CommandLine {
        &self.command
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchmarkReport {
    pub mean: Measurement,
    pub min: Measurement,
}

impl BenchmarkReport {
    pub fn pick(&self, stat: Statistic) -> Measurement {
        match stat {
            Statistic::Fastest => self.min,
            Statistic::Mean => self.mean,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("'{program}' is not installed on your system! It is required to benchmark tests.")]
    ToolNotFound { program: String },

    #[error("Failed to spawn '{command}': {error}")]
    Launch {
        command: String,
        #[source]
        error: io::Error,
    },

    #[error("'{command}' failed (exit code {code:?}):\n{stderr}")]
    ToolFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Malformed benchmark report {path:?}: {error}")]
    Report {
        path: PathBuf,
        #[source]
        error: ReportParseError,
    },

    #[error(transparent)]
    Fs(#[from] fsutil::Error),

    #[error(transparent)]
    History(#[from] HistoryError),
}

#[async_trait]
pub trait BenchmarkTool: Send + Sync {
    fn name(&self) -> &str;

    /// Checked once before anything is run.
    fn ensure_available(&self) -> Result<(), BenchError>;

    async fn measure(&self, task: &BenchmarkTask) -> Result<BenchmarkReport, BenchError>;
}

/// Runs tasks through a [`BenchmarkTool`] one at a time and compares the
/// results with the stored history.
pub struct BenchmarkEngine {
    tool: Box<dyn BenchmarkTool>,
    statistic: Statistic,
}

impl BenchmarkEngine {
    pub fn new(tool: Box<dyn BenchmarkTool>, statistic: Statistic) -> Self {
        Self { tool, statistic }
    }

    pub fn ensure_available(&self) -> Result<(), BenchError> {
        self.tool.ensure_available()
    }

    pub async fn measure(&self, task: &BenchmarkTask) -> Result<Measurement, BenchError> {
        let report = self.tool.measure(task).await?;
        log::debug!(
            "{} ({}): mean={}, min={}",
            task.key(),
            self.tool.name(),
            report.mean,
            report.min
        );
        Ok(report.pick(self.statistic))
    }

    /// Replaces the stored history with `measurements` and returns the table
    /// comparing them with what was stored before.
    pub fn compare_and_save(
        &self,
        measurements: &History,
        store: &HistoryStore,
    ) -> Result<ComparisonTable, BenchError> {
        let old = store.load()?;
        store.save(measurements)?;
        Ok(ComparisonTable::new(measurements, &old, self.statistic))
    }
}

/// Orders tasks by implementation, then input path.
pub fn sort_tasks(tasks: &mut [BenchmarkTask]) {
    tasks.sort_by(|a, b| {
        (&a.key.implementation, &a.input).cmp(&(&b.key.implementation, &b.input))
    });
}
