pub mod error {
    #[allow(unused_imports)]
    pub(crate) use anyhow::{anyhow, bail, ensure, Context as _};
    pub use anyhow::{Error, Result};
}

use std::path::{Path, PathBuf};

use error::*;

use crate::bench::{self, BenchmarkEngine, BenchmarkTask, ComparisonTable, History, Hyperfine, Statistic};
use crate::config::Config;
use crate::language::{CommandContext, LanguageRegistry};
use crate::progress;
use crate::storage::{InitStatus, Problem, ProblemsRoot, ScratchDir};
use crate::style;
use crate::testing::{
    verify_files, CompileOutcome, Execution, ExecutionCommand, SourceCandidate, TestCase,
    TestRunner, TestVerdict,
};

pub fn init_problems_root(dir: impl AsRef<Path>) -> Result<(ProblemsRoot, InitStatus)> {
    ProblemsRoot::init(dir).context("Failed to init problems root")
}

/// Resolves `name` (or the last tested problem when `None`) and remembers the result.
pub fn select_problem(root: &ProblemsRoot, name: Option<&str>) -> Result<Problem> {
    let name = match name {
        Some(name) => name.to_owned(),
        None => root
            .last_problem()?
            .context("No problem given and no problem has been tested yet")?,
    };
    let problem = root.resolve_problem(&name)?;
    root.set_last_problem(&problem.name)?;
    Ok(problem)
}

pub fn hyperfine_engine(cfg: &Config, statistic: Statistic) -> BenchmarkEngine {
    let tool = Hyperfine::new(&cfg.benchmark.program, &cfg.test.scratch_dir)
        .extra_args(cfg.benchmark.extra_args.clone());
    BenchmarkEngine::new(Box::new(tool), statistic)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateReport {
    pub source: SourceCandidate,
    pub verdicts: Vec<TestVerdict>,
}

impl CandidateReport {
    pub fn all_passed(&self) -> bool {
        self.verdicts.iter().all(TestVerdict::is_pass)
    }
}

/// What one `chum test` run found and did.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunSummary {
    pub testcases: Vec<TestCase>,
    pub candidates: Vec<CandidateReport>,
    pub compile_failures: Vec<SourceCandidate>,
    pub table: Option<ComparisonTable>,
}

impl RunSummary {
    pub fn all_passed(&self) -> bool {
        self.compile_failures.is_empty() && self.candidates.iter().all(CandidateReport::all_passed)
    }
}

fn shown(path: &Path, base: &Path) -> String {
    fsutil::relative_to(path, base)
        .to_string_lossy()
        .into_owned()
}

/// Compiles every source candidate of `problem`, runs each against every test
/// case, and benchmarks the runs when `bench` is given.
///
/// A failing compile only drops that candidate. A program that cannot be
/// launched or exits abnormally aborts the whole run, leaving the scratch
/// directory in place.
pub async fn run_and_test(
    root: &ProblemsRoot,
    problem: &Problem,
    cfg: &Config,
    bench: Option<&BenchmarkEngine>,
    cleanup: bool,
) -> Result<RunSummary> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| root.dir().to_owned());
    let languages = cfg.language_registry()?;
    let mut summary = RunSummary::default();

    let sources = SourceCandidate::discover(&problem.dir, &problem.name, &languages)
        .context("Failed to list source files")?;
    if sources.is_empty() {
        style::print_no_candidates(&problem.name);
        return Ok(summary);
    }

    summary.testcases = TestCase::discover(&problem.test_dirs, &cfg.test.testcase_finder())
        .context("Failed to find testcases")?;

    if let Some(engine) = bench {
        engine.ensure_available()?;
    }

    let scratch = ScratchDir::new(&cfg.test.scratch_dir);
    scratch.ensure()?;

    let names: Vec<_> = sources.iter().map(|s| shown(s.path(), &cwd)).collect();
    style::print_compiling(&names);

    let runner = TestRunner::new().timeout(cfg.test.timeout());
    let mut commands = Vec::with_capacity(sources.len());
    for source in sources {
        match prepare(&runner, &source, &languages, &scratch, &cwd).await? {
            Some(cmd) => commands.push((source, cmd)),
            None => summary.compile_failures.push(source),
        }
    }

    if summary.testcases.is_empty() {
        let dirs: Vec<_> = problem.test_dirs.iter().map(|d| shown(d, &cwd)).collect();
        style::print_no_tests(&dirs);
        finish(&scratch, cleanup, &cwd)?;
        return Ok(summary);
    }

    let tests: Vec<_> = summary
        .testcases
        .iter()
        .map(|t| shown(t.input_path(), &cwd))
        .collect();
    style::print_running(&tests);

    let mut tasks = Vec::new();
    for (source, cmd) in commands {
        let mut verdicts = Vec::with_capacity(summary.testcases.len());
        for t in &summary.testcases {
            let bound = cmd.bind(t.input_path(), scratch.output_path(source.path(), t.name()));
            log::debug!("{}", bound);

            let verdict = match runner.execute(&bound).await {
                Err(e) => {
                    style::print_execution_error(
                        &shown(source.path(), &cwd),
                        &shown(t.input_path(), &cwd),
                        &e,
                    );
                    return Err(e).with_context(|| {
                        format!("{} failed on test '{}'", source.name(), t.name())
                    });
                }
                Ok(Execution::TimedOut { elapsed }) => TestVerdict::timed_out(t.clone(), elapsed),
                Ok(Execution::Finished { elapsed }) => {
                    let verification = verify_files(bound.output(), t.answer_path())?;
                    if bench.is_some() {
                        tasks.push(BenchmarkTask::from_bound(source.name(), t.name(), &bound));
                    }
                    TestVerdict::judged(t.clone(), elapsed, verification)
                }
            };

            if let Some(v) = &verdict.verification {
                let answer = shown(t.answer_path(), &cwd);
                if let Some(m) = &v.mismatch {
                    style::print_mismatch(&verdict, &answer, m);
                }
                if let Some(rest) = &v.trailing_output {
                    style::print_trailing_output(&answer, rest);
                }
            }
            verdicts.push(verdict);
        }

        style::print_candidate_verdicts(
            &shown(source.path(), &cwd),
            verdicts
                .iter()
                .map(|v| (v, shown(v.testcase.input_path(), &cwd))),
        );
        style::print_test_result_summary(&verdicts);
        println!();
        summary.candidates.push(CandidateReport { source, verdicts });
    }

    if let Some(engine) = bench {
        summary.table = benchmark(engine, tasks, &root.history_store(&problem.name)).await?;
    }

    finish(&scratch, cleanup, &cwd)?;
    Ok(summary)
}

/// Compiles `source` if its language needs it. `None` when compilation failed.
async fn prepare(
    runner: &TestRunner,
    source: &SourceCandidate,
    languages: &LanguageRegistry,
    scratch: &ScratchDir,
    cwd: &Path,
) -> Result<Option<ExecutionCommand>> {
    let lang = languages
        .get(source.language())
        .with_context(|| format!("Unknown language '{}'", source.language()))?;
    let exe_path: PathBuf = scratch.executable_path(source.path());
    let cmds = lang
        .commands(CommandContext {
            source: source.path(),
            exe_path: &exe_path,
            problem_dir: source.problem_dir(),
        })
        .with_context(|| format!("Cannot build commands for {:?}", source.path()))?;

    let Some(compile) = cmds.compile else {
        return Ok(Some(cmds.run));
    };

    log::info!("{}", compile);
    let spinner = progress::spinner(format!("Compiling {} ...", source.name()));
    let outcome = runner.compile(&compile).await;
    progress::finish(&spinner).await;

    let name = shown(source.path(), cwd);
    match outcome {
        CompileOutcome::Success { warnings } => {
            if let Some(w) = warnings {
                style::print_compile_warnings(&name, &w);
            }
            Ok(Some(cmds.run))
        }
        CompileOutcome::Failure { message, .. } => {
            style::print_compile_failure(&name, &message);
            Ok(None)
        }
    }
}

async fn benchmark(
    engine: &BenchmarkEngine,
    mut tasks: Vec<BenchmarkTask>,
    store: &bench::HistoryStore,
) -> Result<Option<ComparisonTable>> {
    if tasks.is_empty() {
        log::warn!("Nothing to benchmark: no test finished in time");
        return Ok(None);
    }
    bench::sort_tasks(&mut tasks);

    let mut measurements = History::new();
    for task in &tasks {
        let spinner = progress::spinner(format!("Benchmarking {} ...", task.key()));
        let res = engine.measure(task).await;
        progress::finish(&spinner).await;
        let m = res.with_context(|| format!("Failed to benchmark {}", task.key()))?;
        measurements.insert(task.key().clone(), m);
    }

    let table = engine
        .compare_and_save(&measurements, store)
        .context("Failed to update benchmark history")?;
    println!("{}", table);
    Ok(Some(table))
}

fn finish(scratch: &ScratchDir, cleanup: bool, cwd: &Path) -> Result<()> {
    if cleanup {
        scratch.cleanup()?;
    } else {
        style::print_scratch_location(&shown(scratch.path(), cwd));
    }
    Ok(())
}
