//! Loaders for the plain-text inputs of an evaluation run: wiki-style
//! article dumps and category/clue/answer question files.

pub mod corpus;
pub mod questions;

use std::fmt;

/// An input entry that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub source: String,
    /// 1-based line where the entry starts.
    pub line: usize,
    pub reason: String,
}

impl fmt::Display for SkippedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.source, self.line, self.reason)
    }
}

/// Non-empty runs of lines separated by blank lines, each with its 1-based start line.
pub(crate) fn blocks(text: &str) -> Vec<(usize, Vec<&str>)> {
    let mut out = Vec::new();
    let mut current: Option<(usize, Vec<&str>)> = None;
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            if let Some(block) = current.take() {
                out.push(block);
            }
        } else {
            current.get_or_insert_with(|| (i + 1, Vec::new())).1.push(line);
        }
    }
    out.extend(current);
    out
}
