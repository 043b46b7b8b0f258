use std::collections::HashMap;

use colored::{Color, ColoredString, Colorize};
use crossterm::terminal;

use crate::testing::{Excerpt, ExecutionError, JudgeCode, Mismatch, TestVerdict};

#[macro_export]
macro_rules! print_success {
    ($fmt:literal, $($e:tt)*) => {
        use ::colored::Colorize as _;
        println!("{}", format!($fmt, $($e)*).green())
    }
}

pub fn is_truecolor_supported() -> bool {
    let Ok(v) = std::env::var("COLORTERM") else {
        return false
    };
    matches!(v.as_str(), "truecolor" | "24bit")
}

pub trait ColorTheme {
    fn color(&self) -> Color;
}

impl ColorTheme for log::Level {
    fn color(&self) -> Color {
        use log::Level::*;
        match self {
            Error => Color::BrightRed,
            Warn => Color::BrightYellow,
            Info => Color::Cyan,
            Debug => Color::Magenta,
            Trace => Color::Blue,
        }
    }
}

impl ColorTheme for JudgeCode {
    fn color(&self) -> Color {
        use JudgeCode::*;
        if !self::is_truecolor_supported() {
            return match self {
                AC => Color::Green,
                WA => Color::Yellow,
                TLE => Color::Red,
            };
        }

        match self {
            AC => Color::TrueColor {
                r: 30,
                g: 180,
                b: 40,
            },
            WA => Color::TrueColor {
                r: 210,
                g: 138,
                b: 4,
            },
            TLE => Color::TrueColor {
                r: 220,
                g: 42,
                b: 42,
            },
        }
    }
}

pub fn judge_icon(judge: JudgeCode) -> ColoredString {
    let fg = if is_truecolor_supported() {
        Color::TrueColor {
            r: 255,
            g: 255,
            b: 255,
        }
    } else {
        Color::BrightBlack
    };
    format!(" {} ", judge)
        .on_color(judge.color())
        .bold()
        .color(fg)
}

fn bold_bar() -> ColoredString {
    let (cols, _) = terminal::size().unwrap_or((40, 40));
    "━".repeat(cols as usize).blue().bold()
}

pub fn print_compiling(sources: &[String]) {
    println!("{}", format!("Compiling source files: [{}]", sources.join(", ")).dimmed());
}

pub fn print_compile_failure(source: &str, message: &str) {
    println!();
    println!("{}", format!("{} FAILED TO COMPILE!", source).red());
    println!("{}", message.trim_end());
}

pub fn print_compile_warnings(source: &str, warnings: &str) {
    println!();
    println!("{}", format!("{} has compile warnings:", source).yellow());
    println!("{}", warnings.trim_end());
}

pub fn print_no_candidates(problem: &str) {
    println!(
        "{}",
        format!("No source files found for '{}' (see `chum langs`)", problem).yellow()
    );
}

pub fn print_no_tests(test_dirs: &[String]) {
    println!(
        "No tests found! Make sure to add both .in and .ans files to any of the folders:\n\t'{}'",
        test_dirs.join("', \n\t'")
    );
}

pub fn print_running(tests: &[String]) {
    println!("{}", format!("Running tests: [{}]", tests.join(", ")).dimmed());
    println!();
}

fn print_excerpt(excerpt: &Excerpt, color: Option<Color>) {
    for line in &excerpt.head {
        match color {
            Some(c) => println!("{}", line.color(c)),
            None => println!("{}", line),
        }
    }
    if excerpt.more > 0 {
        println!("... [{} more rows]", excerpt.more);
        println!();
    }
}

/// `verdict` must be a WA; `answer` is the expected-output file as shown to the user.
pub fn print_mismatch(verdict: &TestVerdict, answer: &str, m: &Mismatch) {
    println!(
        "\n{}: {} [{}ms]\n{}",
        verdict.testcase.name().bright_yellow().bold(),
        self::judge_icon(verdict.judge),
        verdict.execution_time.as_millis(),
        self::bold_bar(),
    );

    println!("{}", answer.yellow());
    for line in &m.context {
        println!("{}", line.trim_end());
    }
    println!("{}", "FAIL!".red());
    println!("    at: {}", format!("line {}", m.line + 1).red());
    let got = m.actual.as_deref().map(str::trim_end).unwrap_or("<EOF>");
    println!("    got: {}", got.red());
    println!("    expected: {}", m.expected.trim_end().green());

    self::print_excerpt(&m.rest_of_output, Some(Color::Red));
    if !m.rest_of_expected.is_empty() {
        println!("ANSWERS: [from line {} onwards]", m.line + 2);
        self::print_excerpt(&m.rest_of_expected, None);
        println!();
    }
}

pub fn print_trailing_output(answer: &str, rest: &str) {
    println!("{} got trailing output:", answer.yellow());
    println!("{}", rest.trim_end().red());
    println!();
}

/// One line per test case under the source name.
pub fn print_candidate_verdicts<'a>(
    source: &str,
    verdicts: impl IntoIterator<Item = (&'a TestVerdict, String)>,
) {
    println!("{}", source.blue());
    for (v, input) in verdicts {
        match v.judge {
            JudgeCode::AC => println!("{} {}", "  ✔ - PASSED".green(), input),
            JudgeCode::WA => println!("{} {}", "  ✗ - FAILED".red(), input),
            JudgeCode::TLE => println!(
                "{} {} {}",
                "  ✗ - TIMEOUT".red(),
                input,
                format!("[>{}ms]", v.execution_time.as_millis()).dimmed()
            ),
        }
    }
}

pub fn print_test_result_summary(results: &[TestVerdict]) {
    let bar = "-".repeat(5);
    print!("{} ", bar);

    let count: HashMap<JudgeCode, usize> = results.iter().fold(HashMap::new(), |mut count, r| {
        *count.entry(r.judge).or_default() += 1;
        count
    });

    let num_total_test = results.len();
    let num_passed = *count.get(&JudgeCode::AC).unwrap_or(&0);
    let num_failed = num_total_test - num_passed;

    if num_passed == num_total_test {
        let msg = format!("All {} tests passed ✨", num_total_test);
        print!("{}", msg.green());
    } else {
        let summary_msg = if num_passed > 0 {
            format!("{}/{} tests failed 💣", num_failed, num_total_test)
        } else {
            format!("All {} tests failed 💀", num_total_test)
        };

        let mut failed: Vec<_> = count
            .iter()
            .filter(|(&judge, _)| judge != JudgeCode::AC)
            .collect();
        failed.sort_by_key(|(judge, _)| judge.to_string());
        let detail_msg = failed
            .into_iter()
            .map(|(&judge, &cnt)| {
                format!(
                    "{}{}{}",
                    self::judge_icon(judge),
                    "x".dimmed(),
                    cnt.to_string().bold().bright_white(),
                )
            })
            .collect::<Vec<String>>()
            .join(", ");

        print!("{} ({})", summary_msg.bright_red(), detail_msg);
    }

    println!(" {}", bar);
}

pub fn print_execution_error(source: &str, input: &str, err: &ExecutionError) {
    println!();
    println!(
        "{}",
        format!("{} ERROR WHILE RUNNING TEST '{}'!", source, input).red()
    );
    if let Some(stderr) = err.stderr() {
        print!("{}", stderr);
    }
    if let Some(stdout) = err.stdout() {
        print!("{}", stdout);
    }
    match err {
        ExecutionError::NonZeroExit { command, .. }
        | ExecutionError::Signaled { command, .. }
        | ExecutionError::Launch { command, .. }
        | ExecutionError::Wait { command, .. } => {
            println!("while running:");
            println!("{}", command.dimmed());
        }
        ExecutionError::Redirect(_) => {}
    }
}

pub fn print_scratch_location(dir: &str) {
    println!();
    println!("See output files: '{}'", dir);
}
