#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chum_core::action::{self, RunSummary};
use chum_core::bench::{
    BenchError, BenchKey, BenchmarkEngine, BenchmarkReport, BenchmarkTask, BenchmarkTool,
    Measurement, Statistic, TimeUnit,
};
use chum_core::storage::{Problem, ProblemsRoot, ScratchDir};
use chum_core::testing::{ExecutionError, JudgeCode};
use chum_core::Config;
use tempfile::TempDir;

const ADD: &str = "read a b\necho $((a + b))\n";

struct Fixture {
    _dir: TempDir,
    root: ProblemsRoot,
    scratch: PathBuf,
    timeout_ms: u64,
}

impl Fixture {
    fn new(timeout_ms: u64) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let (root, _) = action::init_problems_root(dir.path()).unwrap();
        let scratch = dir.path().join("scratch");
        Self {
            _dir: dir,
            root,
            scratch,
            timeout_ms,
        }
    }

    fn write(&self, rel: &str, contents: &str) {
        fsutil::write_with_mkdir(self.root.dir().join(rel), contents).unwrap();
    }

    fn config(&self) -> Config {
        let toml = format!(
            r##"
[test]
scratch_dir = '{}'
timeout_ms = {}

[[language]]
name = "sh"
pattern = "*.sh"
run = ["sh", "#{{filePath}}"]

[[language]]
name = "broken"
pattern = "*.bad"
compile = ["sh", "-c", "echo 'cannot compile' >&2; exit 1"]
run = ["true"]
"##,
            self.scratch.display(),
            self.timeout_ms
        );
        Config::from_toml(&toml).unwrap()
    }

    fn problem(&self, name: &str) -> Problem {
        self.root.resolve_problem(name).unwrap()
    }

    async fn run(
        &self,
        problem: &str,
        bench: Option<&BenchmarkEngine>,
        cleanup: bool,
    ) -> anyhow::Result<RunSummary> {
        action::run_and_test(&self.root, &self.problem(problem), &self.config(), bench, cleanup)
            .await
    }
}

#[derive(Default, Clone)]
struct FakeTool {
    calls: Arc<Mutex<Vec<BenchKey>>>,
}

#[async_trait]
impl BenchmarkTool for FakeTool {
    fn name(&self) -> &str {
        "fake"
    }

    fn ensure_available(&self) -> Result<(), BenchError> {
        Ok(())
    }

    async fn measure(&self, task: &BenchmarkTask) -> Result<BenchmarkReport, BenchError> {
        assert!(task.input().is_file());
        self.calls.lock().unwrap().push(task.key().clone());
        Ok(BenchmarkReport {
            mean: Measurement::new(3.0, TimeUnit::Millisecond),
            min: Measurement::new(1.5, TimeUnit::Millisecond),
        })
    }
}

struct MissingTool;

#[async_trait]
impl BenchmarkTool for MissingTool {
    fn name(&self) -> &str {
        "missing"
    }

    fn ensure_available(&self) -> Result<(), BenchError> {
        Err(BenchError::ToolNotFound {
            program: "missing".to_owned(),
        })
    }

    async fn measure(&self, _: &BenchmarkTask) -> Result<BenchmarkReport, BenchError> {
        unreachable!()
    }
}

fn judges(summary: &RunSummary) -> Vec<(String, Vec<JudgeCode>)> {
    summary
        .candidates
        .iter()
        .map(|c| (c.source.name(), c.verdicts.iter().map(|v| v.judge).collect()))
        .collect()
}

fn output_of(scratch: &Path, source: &Path, test: &str) -> PathBuf {
    ScratchDir::new(scratch).output_path(source, test)
}

#[tokio::test]
async fn two_correct_implementations_are_compared() {
    let f = Fixture::new(5000);
    f.write("hello/hello.sh", ADD);
    f.write("hello/hello_awk.sh", "awk '{ print $1 + $2 }'\n");
    f.write("hello/tests/1.in", "1 2\n");
    f.write("hello/tests/1.ans", "3\n");

    let tool = FakeTool::default();
    let engine = BenchmarkEngine::new(Box::new(tool.clone()), Statistic::Fastest);
    let summary = f.run("hello", Some(&engine), true).await.unwrap();

    assert!(summary.all_passed());
    assert_eq!(
        judges(&summary),
        [
            ("hello.sh".to_owned(), vec![JudgeCode::AC]),
            ("hello_awk.sh".to_owned(), vec![JudgeCode::AC]),
        ]
    );

    let table = summary.table.unwrap();
    assert_eq!(table.implementations(), ["hello.sh", "hello_awk.sh"]);
    assert_eq!(table.tests(), ["1"]);
    assert!(!table.has_history());
    assert_eq!(
        table.cell("hello.sh", "1").unwrap().current,
        Measurement::new(1.5, TimeUnit::Millisecond)
    );
    assert_eq!(tool.calls.lock().unwrap().len(), 2);

    let saved = f.root.history_store("hello").load().unwrap();
    assert_eq!(saved.len(), 2);
    assert!(!f.scratch.exists());

    // Second run compares against what the first one stored.
    let summary = f.run("hello", Some(&engine), false).await.unwrap();
    let table = summary.table.unwrap();
    assert!(table.has_history());
    assert_eq!(table.delta("hello_awk.sh", "1").unwrap().seconds(), 0.0);
    assert!(f.scratch.is_dir());
}

#[tokio::test]
async fn nonzero_exit_aborts_the_run() {
    let f = Fixture::new(5000);
    f.write("crash/crash.sh", "echo oops >&2\nexit 1\n");
    f.write("crash/tests/1.in", "\n");
    f.write("crash/tests/1.ans", "\n");
    f.write("crash/tests/2.in", "\n");
    f.write("crash/tests/2.ans", "\n");

    let err = f.run("crash", None, true).await.unwrap_err();
    match dbg!(err.downcast_ref::<ExecutionError>()) {
        Some(ExecutionError::NonZeroExit { code, stderr, .. }) => {
            assert_eq!(*code, 1);
            assert_eq!(stderr, "oops\n");
        }
        other => panic!("unexpected {:?}", other),
    }

    let source = f.root.dir().join("crash/crash.sh");
    assert!(output_of(&f.scratch, &source, "1").is_file());
    assert!(!output_of(&f.scratch, &source, "2").exists());
}

#[tokio::test]
async fn timeout_gives_tle_and_the_run_continues() {
    let f = Fixture::new(300);
    f.write("sum/sum.sh", ADD);
    f.write("sum/sum_slow.sh", "exec sleep 5\n");
    f.write("sum/tests/a.in", "2 2\n");
    f.write("sum/tests/a.out", "4\n");

    let tool = FakeTool::default();
    let engine = BenchmarkEngine::new(Box::new(tool.clone()), Statistic::Mean);
    let summary = f.run("sum", Some(&engine), true).await.unwrap();

    assert!(!summary.all_passed());
    assert_eq!(
        judges(&summary),
        [
            ("sum.sh".to_owned(), vec![JudgeCode::AC]),
            ("sum_slow.sh".to_owned(), vec![JudgeCode::TLE]),
        ]
    );
    assert_eq!(
        *tool.calls.lock().unwrap(),
        [BenchKey::new("sum.sh", "a")]
    );
    let table = summary.table.unwrap();
    assert_eq!(
        table.cell("sum.sh", "a").unwrap().current,
        Measurement::new(3.0, TimeUnit::Millisecond)
    );
}

#[tokio::test]
async fn wrong_answer_is_reported_without_aborting() {
    let f = Fixture::new(5000);
    f.write("wa/wa.sh", "echo 1\necho 5\n");
    f.write("wa/tests/1.in", "\n");
    f.write("wa/tests/1.ans", "1\n2\n");
    f.write("wa/tests/2.in", "\n");
    f.write("wa/tests/2.ans", "1   5\n");

    let summary = f.run("wa", None, true).await.unwrap();
    let verdicts = &summary.candidates[0].verdicts;
    assert_eq!(verdicts[0].judge, JudgeCode::WA);
    let mismatch = verdicts[0]
        .verification
        .as_ref()
        .and_then(|v| v.mismatch.as_ref())
        .unwrap();
    assert_eq!(mismatch.line, 1);
    assert_eq!(mismatch.actual.as_deref(), Some("5"));

    // "1\n5" against "1   5": line-for-line, so this fails on line 0.
    assert_eq!(verdicts[1].judge, JudgeCode::WA);
}

#[tokio::test]
async fn compile_failure_only_drops_that_candidate() {
    let f = Fixture::new(5000);
    f.write("mix/mix.bad", "whatever");
    f.write("mix/mix.sh", ADD);
    f.write("mix/tests/1.in", "0 0\n");
    f.write("mix/tests/1.ans", "0\n");

    let summary = f.run("mix", None, true).await.unwrap();
    assert_eq!(summary.compile_failures.len(), 1);
    assert_eq!(summary.compile_failures[0].name(), "mix.bad");
    assert_eq!(judges(&summary), [("mix.sh".to_owned(), vec![JudgeCode::AC])]);
    assert!(!summary.all_passed());
}

#[tokio::test]
async fn nothing_to_test_is_not_an_error() {
    let f = Fixture::new(5000);
    f.write("empty/empty.sh", ADD);
    f.write("empty/notes.txt", "");
    fsutil::mkdir_all(f.root.dir().join("nosrc")).unwrap();

    let summary = f.run("empty", None, true).await.unwrap();
    assert!(summary.testcases.is_empty());
    assert!(summary.candidates.is_empty());

    let summary = f.run("nosrc", None, true).await.unwrap();
    assert_eq!(summary, RunSummary::default());
}

#[tokio::test]
async fn missing_benchmark_tool_fails_before_running() {
    let f = Fixture::new(5000);
    f.write("hello/hello.sh", ADD);
    f.write("hello/tests/1.in", "1 2\n");
    f.write("hello/tests/1.ans", "3\n");

    let engine = BenchmarkEngine::new(Box::new(MissingTool), Statistic::Fastest);
    let err = f.run("hello", Some(&engine), true).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BenchError>(),
        Some(BenchError::ToolNotFound { .. })
    ));
    assert!(!f.scratch.exists());
    assert!(!f.root.history_store("hello").path().exists());
}

#[test]
fn problem_selection_remembers_last_problem() {
    let f = Fixture::new(5000);
    fsutil::mkdir_all(f.root.dir().join("knapsack")).unwrap();
    fsutil::mkdir_all(f.root.dir().join("two_sum")).unwrap();
    fsutil::mkdir_all(f.root.dir().join("three_sum")).unwrap();

    assert!(action::select_problem(&f.root, None).is_err());

    let p = action::select_problem(&f.root, Some("knap")).unwrap();
    assert_eq!(p.name, "knapsack");
    assert_eq!(action::select_problem(&f.root, None).unwrap().name, "knapsack");

    let err = action::select_problem(&f.root, Some("sum")).unwrap_err();
    let msg = format!("{:#}", err);
    assert!(msg.contains("three_sum"), "{}", msg);
    assert!(msg.contains("two_sum"), "{}", msg);
    assert_eq!(f.root.last_problem().unwrap().as_deref(), Some("knapsack"));
}
