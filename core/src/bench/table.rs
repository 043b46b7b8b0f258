use std::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use colored::Colorize;
use lazy_regex::{lazy_regex, Lazy, Regex};

use super::{
    history::History,
    unit::{Delta, Measurement},
    BenchKey, Statistic,
};

static RE_ANSI_ESCAPE: Lazy<Regex> = lazy_regex!(r"\x1B(?:[@-Z\\-_]|\[[0-?]*[ -/]*[@-~])");

const CELL_WIDTH: usize = 10;
const DELTA_WIDTH: usize = 13;

pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    RE_ANSI_ESCAPE.replace_all(text, "")
}

/// Number of characters a terminal shows for `text`.
pub fn visual_len(text: &str) -> usize {
    strip_ansi(text).chars().count()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub current: Measurement,
    pub delta: Option<Delta>,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.current)?;
        if let Some(delta) = &self.delta {
            write!(f, " {}", delta)?;
        }
        Ok(())
    }
}

/// Tests as rows, implementations as numbered columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonTable {
    statistic: Statistic,
    implementations: Vec<String>,
    tests: Vec<String>,
    cells: BTreeMap<BenchKey, Cell>,
    has_history: bool,
}

impl ComparisonTable {
    pub fn new(measurements: &History, history: &History, statistic: Statistic) -> Self {
        let implementations: BTreeSet<_> = measurements
            .keys()
            .map(|k| k.implementation.clone())
            .collect();
        let tests: BTreeSet<_> = measurements.keys().map(|k| k.test.clone()).collect();

        let cells = measurements
            .iter()
            .map(|(key, current)| {
                let delta = history.get(key).map(|old| Delta::between(old, current));
                (
                    key.clone(),
                    Cell {
                        current: *current,
                        delta,
                    },
                )
            })
            .collect();

        Self {
            statistic,
            implementations: implementations.into_iter().collect(),
            tests: tests.into_iter().collect(),
            cells,
            has_history: !history.is_empty(),
        }
    }

    /// Column `i` (0-based) is shown as `(i + 1)`.
    pub fn implementations(&self) -> &[String] {
        &self.implementations
    }

    pub fn tests(&self) -> &[String] {
        &self.tests
    }

    pub fn has_history(&self) -> bool {
        self.has_history
    }

    pub fn cell(&self, implementation: &str, test: &str) -> Option<&Cell> {
        self.cells.get(&BenchKey::new(implementation, test))
    }

    pub fn delta(&self, implementation: &str, test: &str) -> Option<Delta> {
        self.cell(implementation, test).and_then(|c| c.delta)
    }

    fn row_label_width(&self) -> usize {
        self.tests
            .iter()
            .map(|t| t.chars().count())
            .max()
            .unwrap_or(0)
            + 2
    }

    fn column_width(&self) -> usize {
        if self.has_history {
            CELL_WIDTH + DELTA_WIDTH
        } else {
            CELL_WIDTH
        }
    }

    pub fn render(&self) -> String {
        let label_width = self.row_label_width();
        let width = self.column_width();

        let pad = |text: &str| {
            let gap = width.saturating_sub(visual_len(text)).max(1);
            format!("{}{}", text, " ".repeat(gap))
        };

        let mut lines = vec![self.statistic.title().bold().to_string()];
        for (i, name) in self.implementations.iter().enumerate() {
            lines.push(format!(" ({}) {}", i + 1, name));
        }

        let mut header = " ".repeat(label_width);
        for i in 0..self.implementations.len() {
            header += &pad(&format!("({})", i + 1));
        }
        lines.push(header);

        for test in &self.tests {
            let mut row = format!("{:<w$}", test, w = label_width);
            for imp in &self.implementations {
                let text = self
                    .cell(imp, test)
                    .map(Cell::to_string)
                    .unwrap_or_else(|| " ".to_owned());
                row += &pad(&text);
            }
            lines.push(row);
        }

        lines
            .iter()
            .map(|line| line.trim_end())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for ComparisonTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.render())
    }
}
