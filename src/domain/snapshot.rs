use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How log lines are compared when computing a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseSensitivity {
    #[default]
    Sensitive,
    Insensitive,
}

impl From<bool> for CaseSensitivity {
    /// `true` means "ignore case".
    fn from(ignore_case: bool) -> Self {
        if ignore_case {
            CaseSensitivity::Insensitive
        } else {
            CaseSensitivity::Sensitive
        }
    }
}

/// Full ordered capture of the device log at one poll instant.
///
/// Duplicate lines are kept. A snapshot is never edited after capture; the
/// poll loop replaces it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogSnapshot {
    lines: Vec<String>,
}

impl LogSnapshot {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Splits a raw log body into lines, dropping trailing `\r` and blank lines.
    pub fn from_text(text: &str) -> Self {
        text.lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .collect()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl From<Vec<String>> for LogSnapshot {
    fn from(lines: Vec<String>) -> Self {
        Self::new(lines)
    }
}

impl<S: Into<String>> FromIterator<S> for LogSnapshot {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Lines of the current snapshot whose content is absent from the previous one.
///
/// Detection is a membership test against the previous snapshot, so moving a
/// line around never makes it "new". The delta keeps the order, and any
/// repeats, of the current snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogDelta<'a> {
    lines: Vec<&'a str>,
}

impl<'a> LogDelta<'a> {
    pub fn between(
        previous: &LogSnapshot,
        current: &'a LogSnapshot,
        case: CaseSensitivity,
    ) -> Self {
        let lines = match case {
            CaseSensitivity::Sensitive => {
                let seen: HashSet<&str> = previous.iter().collect();
                current.iter().filter(|line| !seen.contains(*line)).collect()
            }
            CaseSensitivity::Insensitive => {
                let seen: HashSet<String> = previous.iter().map(str::to_lowercase).collect();
                current
                    .iter()
                    .filter(|line| !seen.contains(&line.to_lowercase()))
                    .collect()
            }
        };

        Self { lines }
    }

    pub fn lines(&self) -> &[&'a str] {
        &self.lines
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.lines.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn to_owned_lines(&self) -> Vec<String> {
        self.lines.iter().map(|line| (*line).to_string()).collect()
    }
}
