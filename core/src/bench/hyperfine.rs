use std::{path::PathBuf, process::Stdio};

use async_trait::async_trait;
use lazy_regex::{lazy_regex, Lazy, Regex};

use super::{
    unit::{Measurement, TimeUnit, UnitParseError},
    BenchError, BenchmarkReport, BenchmarkTask, BenchmarkTool,
};
use crate::testing::CommandLine;

static RE_HEADER_CELL: Lazy<Regex> = lazy_regex!(r"^(Mean|Min) \[(\S+)\]$");
static RE_MEAN_CELL: Lazy<Regex> = lazy_regex!(r"^([0-9.eE+-]+) ± [0-9.eE+-]+$");
static RE_NUMBER_CELL: Lazy<Regex> = lazy_regex!(r"^([0-9.eE+-]+)$");

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportParseError {
    #[error("expected at least 3 lines, got {0}")]
    TooShort(usize),

    #[error("line {line}: column {column} is missing")]
    MissingColumn { line: usize, column: usize },

    #[error("line {line}: unexpected cell '{cell}'")]
    UnexpectedCell { line: usize, cell: String },

    #[error(transparent)]
    Unit(#[from] UnitParseError),
}

/// Extracts mean and min from a report written by `hyperfine --export-markdown`:
///
/// ```text
/// | Command | Mean [ms] | Min [ms] | Max [ms] | Relative |
/// |:---|---:|---:|---:|---:|
/// | `hello.cpp --> 1` | 1.2 ± 0.3 | 0.9 | 3.1 | 1.00 |
/// ```
pub fn parse_markdown_report(text: &str) -> Result<BenchmarkReport, ReportParseError> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < 3 {
        return Err(ReportParseError::TooShort(lines.len()));
    }

    let cell = |line: usize, column: usize| -> Result<&str, ReportParseError> {
        lines[line]
            .split('|')
            .nth(column)
            .map(str::trim)
            .ok_or(ReportParseError::MissingColumn { line, column })
    };
    let unexpected = |line: usize, cell: &str| ReportParseError::UnexpectedCell {
        line,
        cell: cell.to_owned(),
    };

    let unit_of = |column: usize, label: &str| -> Result<TimeUnit, ReportParseError> {
        let header = cell(0, column)?;
        match RE_HEADER_CELL.captures(header) {
            Some(caps) if &caps[1] == label => Ok(caps[2].parse()?),
            _ => Err(unexpected(0, header)),
        }
    };
    let number_in = |column: usize, re: &Regex| -> Result<f64, ReportParseError> {
        let text = cell(2, column)?;
        re.captures(text)
            .and_then(|caps| caps[1].parse().ok())
            .ok_or_else(|| unexpected(2, text))
    };

    let mean = Measurement::new(number_in(2, &*RE_MEAN_CELL)?, unit_of(2, "Mean")?);
    let min = Measurement::new(number_in(3, &*RE_NUMBER_CELL)?, unit_of(3, "Min")?);
    Ok(BenchmarkReport { mean, min })
}

/// Runs `hyperfine` once per task and reads back its markdown export.
#[derive(Debug, Clone)]
pub struct Hyperfine {
    program: String,
    report_dir: PathBuf,
    extra_args: Vec<String>,
}

impl Hyperfine {
    pub const DEFAULT_PROGRAM: &str = "hyperfine";

    pub fn new(program: impl Into<String>, report_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            report_dir: report_dir.into(),
            extra_args: Vec::new(),
        }
    }

    /// Passed right before the benchmarked command, e.g. `--warmup 3`.
    pub fn extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    pub fn report_path(&self, task: &BenchmarkTask) -> PathBuf {
        let key = task.key();
        self.report_dir
            .join(format!("{}_{}.md", key.implementation, key.test))
    }

    pub fn command_line(&self, task: &BenchmarkTask) -> CommandLine {
        let mut args = vec![
            "--shell=none".to_owned(),
            "--export-markdown".to_owned(),
            self.report_path(task).to_string_lossy().into_owned(),
            "--command-name".to_owned(),
            task.key().to_string(),
            "--input".to_owned(),
            task.input().to_string_lossy().into_owned(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args.push(task.command().to_string());
        CommandLine::new(&self.program, args)
    }
}

#[async_trait]
impl BenchmarkTool for Hyperfine {
    fn name(&self) -> &str {
        &self.program
    }

    fn ensure_available(&self) -> Result<(), BenchError> {
        match fsutil::find_executable(&self.program) {
            Some(path) => {
                log::debug!("Using {:?}", path);
                Ok(())
            }
            None => Err(BenchError::ToolNotFound {
                program: self.program.clone(),
            }),
        }
    }

    async fn measure(&self, task: &BenchmarkTask) -> Result<BenchmarkReport, BenchError> {
        fsutil::mkdir_all(&self.report_dir)?;
        let cmd = self.command_line(task);
        log::debug!("{}", cmd);

        let output = cmd
            .to_tokio_command()
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|error| BenchError::Launch {
                command: cmd.to_string(),
                error,
            })?;
        if !output.status.success() {
            return Err(BenchError::ToolFailed {
                command: cmd.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let path = self.report_path(task);
        let text = fsutil::read_to_string(&path)?;
        parse_markdown_report(&text).map_err(|error| BenchError::Report { path, error })
    }
}
