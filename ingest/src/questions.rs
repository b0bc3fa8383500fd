//! Question files: blocks separated by blank lines, each holding a category
//! line, a clue line and the expected answer.

use crate::{blocks, SkippedEntry};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub category: String,
    pub clue: String,
    pub answer: String,
}

impl Question {
    /// The text sent to the engine: the clue, optionally led by the category.
    pub fn query_text(&self, with_category: bool) -> String {
        if with_category {
            format!("{} {}", self.category, self.clue)
        } else {
            self.clue.clone()
        }
    }
}

#[derive(Debug, Default)]
pub struct QuestionLoad {
    pub questions: Vec<Question>,
    pub skipped: Vec<SkippedEntry>,
}

pub fn parse_questions(text: &str, source: &str) -> QuestionLoad {
    let mut load = QuestionLoad::default();
    for (line, lines) in blocks(text) {
        if lines.len() < 3 {
            tracing::warn!(source, line, "question block needs category, clue and answer");
            load.skipped.push(SkippedEntry {
                source: source.to_string(),
                line,
                reason: format!("expected at least 3 lines, found {}", lines.len()),
            });
            continue;
        }
        load.questions.push(Question {
            category: lines[0].trim().to_string(),
            clue: lines[1].trim().to_string(),
            answer: lines[2..].join("\n").trim().to_string(),
        });
    }
    load
}

pub fn load_questions(path: &Path) -> Result<QuestionLoad> {
    let bytes = fs::read(path).with_context(|| format!("reading questions {}", path.display()))?;
    let text = String::from_utf8_lossy(&bytes);
    let load = parse_questions(&text, &path.display().to_string());
    tracing::info!(questions = load.questions.len(), skipped = load.skipped.len(), "questions loaded");
    Ok(load)
}
