use std::{fmt, num::ParseFloatError, str::FromStr};

use colored::Colorize;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum TimeUnit {
    #[strum(serialize = "s")]
    Second,
    #[strum(serialize = "ms")]
    Millisecond,
    #[strum(serialize = "µs")]
    Microsecond,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown time unit '{0}' (expected s, ms or µs)")]
pub struct UnitParseError(pub String);

impl TimeUnit {
    /// How many of this unit make one second.
    pub fn per_second(self) -> f64 {
        match self {
            Self::Second => 1.0,
            Self::Millisecond => 1_000.0,
            Self::Microsecond => 1_000_000.0,
        }
    }
}

impl FromStr for TimeUnit {
    type Err = UnitParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "s" => Ok(Self::Second),
            "ms" => Ok(Self::Millisecond),
            // micro sign, greek mu, ascii fallback
            "\u{00b5}s" | "\u{03bc}s" | "us" => Ok(Self::Microsecond),
            _ => Err(UnitParseError(s.to_owned())),
        }
    }
}

/// A timing value as reported by the benchmarking tool, e.g. `1.25 ms`.
/// Stored in history files by its textual form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Measurement {
    pub value: f64,
    pub unit: TimeUnit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeasurementParseError {
    #[error("Expected '<value> <unit>', got '{0}'")]
    Malformed(String),

    #[error("Invalid number '{0}': {1}")]
    Value(String, #[source] ParseFloatError),

    #[error(transparent)]
    Unit(#[from] UnitParseError),
}

impl Measurement {
    pub fn new(value: f64, unit: TimeUnit) -> Self {
        Self { value, unit }
    }

    pub fn from_seconds(seconds: f64, unit: TimeUnit) -> Self {
        Self::new(seconds * unit.per_second(), unit)
    }

    pub fn to_seconds(&self) -> f64 {
        self.value / self.unit.per_second()
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

impl FromStr for Measurement {
    type Err = MeasurementParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace();
        let (Some(value), Some(unit), None) = (tokens.next(), tokens.next(), tokens.next()) else {
            return Err(MeasurementParseError::Malformed(s.to_owned()));
        };
        let value = value
            .parse()
            .map_err(|e| MeasurementParseError::Value(value.to_owned(), e))?;
        Ok(Self::new(value, unit.parse()?))
    }
}

impl TryFrom<String> for Measurement {
    type Error = MeasurementParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Measurement> for String {
    fn from(m: Measurement) -> Self {
        m.to_string()
    }
}

const SUFFIXES: &[(&str, f64)] = &[
    ("Ts", 1e12),
    ("Gs", 1e9),
    ("Ms", 1e6),
    ("ks", 1e3),
    ("s", 1.0),
    ("ms", 1e-3),
    ("µs", 1e-6),
    ("ns", 1e-9),
    ("ps", 1e-12),
];

/// Renders seconds with the largest fitting SI suffix and at most 3 decimals.
///
/// ```
/// use chum_core::bench::unit::humanize_seconds;
///
/// assert_eq!(humanize_seconds(0.0123), "12.3 ms");
/// assert_eq!(humanize_seconds(-0.002), "-2 ms");
/// assert_eq!(humanize_seconds(1.5), "1.5 s");
/// ```
pub fn humanize_seconds(seconds: f64) -> String {
    let format = |i: usize| format!("{:.3}", seconds / SUFFIXES[i].1);

    let mut i = SUFFIXES
        .iter()
        .position(|&(_, factor)| seconds.abs() >= factor)
        .unwrap_or(SUFFIXES.len() - 1);
    let mut formatted = format(i);

    // 0.1 s reads better than 100 ms
    let rounded: f64 = formatted.parse().unwrap_or(f64::NAN);
    if i > 0 && rounded % 100.0 == 0.0 {
        i -= 1;
        formatted = format(i);
    }

    let mut value = formatted.trim_end_matches('0').trim_end_matches('.');
    if value == "-0" {
        value = "0";
    }
    format!("{} {}", value, SUFFIXES[i].0)
}

/// Signed difference `new - old` in seconds. Negative means faster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Delta(f64);

impl Delta {
    pub fn between(old: &Measurement, new: &Measurement) -> Self {
        Self(new.to_seconds() - old.to_seconds())
    }

    pub fn seconds(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let d = self.0;
        if d < 0.0 {
            write!(f, "({})", humanize_seconds(d).green())
        } else if d > 0.0 {
            write!(f, "(+{})", humanize_seconds(d).red())
        } else {
            write!(f, "(=0)")
        }
    }
}
