//! Article dumps.
//!
//! A dump file holds many articles. Each starts with a `[[Title]]` header
//! line, either on the first line of the file or right after a blank line,
//! and its body runs until the next header. Text after `]]` on the header
//! line belongs to the body.

use crate::SkippedEntry;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Default)]
pub struct CorpusLoad {
    pub articles: Vec<Article>,
    pub skipped: Vec<SkippedEntry>,
    pub files: usize,
}

impl CorpusLoad {
    /// `(title, body)` pairs in load order.
    pub fn documents(&self) -> Vec<(&str, &str)> {
        self.articles.iter().map(|a| (a.title.as_str(), a.body.as_str())).collect()
    }
}

struct Pending<'a> {
    title: &'a str,
    body: Vec<&'a str>,
}

impl Pending<'_> {
    fn finish(self) -> Article {
        Article { title: self.title.trim().to_string(), body: self.body.join("\n").trim().to_string() }
    }
}

/// Parse one dump file's text, appending to `load`.
pub fn parse_dump(text: &str, source: &str, load: &mut CorpusLoad) {
    let mut current: Option<Pending> = None;
    let mut after_blank = true;
    for (i, line) in text.lines().enumerate() {
        if after_blank && line.starts_with("[[") {
            if let Some(done) = current.take() {
                load.articles.push(done.finish());
            }
            match line[2..].split_once("]]") {
                Some((title, rest)) => current = Some(Pending { title, body: vec![rest] }),
                None => {
                    tracing::warn!(source, line = i + 1, "article header without closing brackets");
                    load.skipped.push(SkippedEntry {
                        source: source.to_string(),
                        line: i + 1,
                        reason: "article header without closing `]]`".into(),
                    });
                }
            }
        } else if let Some(pending) = current.as_mut() {
            pending.body.push(line);
        }
        after_blank = line.trim().is_empty();
    }
    if let Some(done) = current {
        load.articles.push(done.finish());
    }
}

/// Load a single dump file, or every file under a directory in sorted path order.
pub fn load_corpus(path: &Path) -> Result<CorpusLoad> {
    let mut files = Vec::new();
    if path.is_dir() {
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.with_context(|| format!("walking {}", path.display()))?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
    } else if path.is_file() {
        files.push(path.to_path_buf());
    } else {
        anyhow::bail!("corpus path {} does not exist", path.display());
    }

    let mut load = CorpusLoad::default();
    for file in files {
        let bytes = fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
        let text = String::from_utf8_lossy(&bytes);
        let before = load.articles.len();
        parse_dump(&text, &file.display().to_string(), &mut load);
        load.files += 1;
        tracing::debug!(file = %file.display(), articles = load.articles.len() - before, "loaded dump file");
    }
    tracing::info!(files = load.files, articles = load.articles.len(), skipped = load.skipped.len(), "corpus loaded");
    Ok(load)
}
