//! Whitespace-tolerant comparison of a program's output against the expected answer.
//!
//! Lines are compared as token sequences. Blank expected lines are ignored and
//! blank actual lines are skipped, so only the order, count and content of tokens
//! on each non-blank line matter.

use std::{
    collections::VecDeque,
    io::{self, BufRead, BufReader},
    path::Path,
};

/// Number of matched output lines kept as context for a mismatch.
pub const CONTEXT_LINES: usize = 16;

/// Number of lines shown from what follows a mismatch.
pub const EXCERPT_LINES: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verification {
    pub mismatch: Option<Mismatch>,
    /// Non-blank output left over after every expected line matched.
    pub trailing_output: Option<String>,
}

impl Verification {
    pub fn is_pass(&self) -> bool {
        self.mismatch.is_none() && self.trailing_output.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// 0-based line index in the expected stream.
    pub line: usize,
    /// `None` when the output ended before this line.
    pub actual: Option<String>,
    pub expected: String,
    /// Most recent matched output lines, oldest first.
    pub context: Vec<String>,
    pub rest_of_output: Excerpt,
    pub rest_of_expected: Excerpt,
}

/// The first few lines of a stream's remainder and how many more there were.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Excerpt {
    pub head: Vec<String>,
    pub more: usize,
}

impl Excerpt {
    fn drain(reader: &mut impl BufRead) -> io::Result<Self> {
        let mut excerpt = Self::default();
        while let Some(line) = read_line(reader)? {
            if excerpt.head.len() < EXCERPT_LINES {
                excerpt.head.push(line);
            } else {
                excerpt.more += 1;
            }
        }
        Ok(excerpt)
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_empty()
    }
}

/// Reads one line without its terminator. Invalid UTF-8 is replaced.
fn read_line(reader: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn next_nonblank_line(reader: &mut impl BufRead) -> io::Result<Option<String>> {
    while let Some(line) = read_line(reader)? {
        if !is_blank(&line) {
            return Ok(Some(line));
        }
    }
    Ok(None)
}

fn same_tokens(a: &str, b: &str) -> bool {
    a.split_whitespace().eq(b.split_whitespace())
}

pub fn verify(mut actual: impl BufRead, mut expected: impl BufRead) -> io::Result<Verification> {
    let mut context: VecDeque<String> = VecDeque::with_capacity(CONTEXT_LINES + 1);
    let mut line_no = 0;

    while let Some(expected_line) = read_line(&mut expected)? {
        let line = line_no;
        line_no += 1;
        if is_blank(&expected_line) {
            continue;
        }

        let actual_line = next_nonblank_line(&mut actual)?;
        let matched = actual_line
            .as_deref()
            .is_some_and(|a| same_tokens(a, &expected_line));

        if !matched {
            let mismatch = Mismatch {
                line,
                actual: actual_line,
                expected: expected_line,
                context: context.into(),
                rest_of_output: Excerpt::drain(&mut actual)?,
                rest_of_expected: Excerpt::drain(&mut expected)?,
            };
            return Ok(Verification {
                mismatch: Some(mismatch),
                trailing_output: None,
            });
        }

        if let Some(a) = actual_line {
            context.push_back(a);
        }
        if context.len() > CONTEXT_LINES {
            context.pop_front();
        }
    }

    let mut rest = String::new();
    while let Some(line) = read_line(&mut actual)? {
        rest.push_str(&line);
        rest.push('\n');
    }
    let trailing_output = (!is_blank(&rest)).then_some(rest);

    Ok(Verification {
        mismatch: None,
        trailing_output,
    })
}

pub fn verify_files(
    actual: impl AsRef<Path>,
    expected: impl AsRef<Path>,
) -> fsutil::Result<Verification> {
    let (actual, expected) = (actual.as_ref(), expected.as_ref());
    let actual_reader = BufReader::new(fsutil::open_file(actual)?);
    let expected_reader = BufReader::new(fsutil::open_file(expected)?);
    verify(actual_reader, expected_reader).map_err(|e| {
        fsutil::Error::SingleIO("Cannot compare output with", expected.to_owned(), e)
    })
}
