//! Query parsing and boolean evaluation.
//!
//! Syntax: whitespace-separated words; a word prefixed with `+` is required.
//! Each word is analyzed with the index's analyzer and every resulting term
//! becomes a clause with the word's occurrence. Without required clauses a
//! query is a pure OR; with them, candidates are the intersection of the
//! required terms' postings and optional terms only add score.

use crate::analyzer::Analyzer;
use crate::config::Bm25Params;
use crate::error::{IndexError, ParseError, QueryError};
use crate::index::{DocId, InvertedIndex, Posting};
use crate::ranker::{term_frequency, top_k, Bm25, ScoredResult};
use std::collections::HashMap;

pub const REQUIRED_MARKER: char = '+';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occur {
    Required,
    Optional,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub term: String,
    pub occur: Occur,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    clauses: Vec<Clause>,
}

impl Query {
    pub fn parse(text: &str, analyzer: &Analyzer) -> Result<Self, ParseError> {
        let mut query = Query::default();
        for word in text.split_whitespace() {
            let position = word.as_ptr() as usize - text.as_ptr() as usize;
            let (occur, rest) = match word.strip_prefix(REQUIRED_MARKER) {
                Some(rest) if rest.starts_with(REQUIRED_MARKER) => {
                    return Err(ParseError::RepeatedMarker { position });
                }
                Some("") => return Err(ParseError::DanglingMarker { position }),
                Some(rest) => (Occur::Required, rest),
                None => (Occur::Optional, word),
            };
            for term in analyzer.analyze(rest) {
                query.add(term, occur);
            }
        }
        Ok(query)
    }

    /// Add a clause. A repeated term keeps one clause, required if any
    /// occurrence was required.
    pub fn add(&mut self, term: String, occur: Occur) {
        match self.clauses.iter_mut().find(|c| c.term == term) {
            Some(existing) => {
                if occur == Occur::Required {
                    existing.occur = Occur::Required;
                }
            }
            None => self.clauses.push(Clause { term, occur }),
        }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn has_required(&self) -> bool {
        self.clauses.iter().any(|c| c.occur == Occur::Required)
    }
}

struct ClauseStats<'a> {
    occur: Occur,
    postings: &'a [Posting],
    idf: f32,
}

/// Read-only evaluator over a committed index. Cheap to construct and safe
/// to share across threads.
#[derive(Debug, Clone, Copy)]
pub struct QueryEvaluator<'a> {
    index: &'a InvertedIndex,
    scorer: Bm25,
}

impl<'a> QueryEvaluator<'a> {
    pub fn new(index: &'a InvertedIndex, params: Bm25Params) -> Result<Self, IndexError> {
        index.ensure_committed()?;
        Ok(Self { index, scorer: Bm25::new(params) })
    }

    pub fn parse(&self, text: &str) -> Result<Query, ParseError> {
        Query::parse(text, self.index.analyzer())
    }

    /// Score every candidate document. Results come back in doc id order.
    pub fn evaluate(&self, query: &Query) -> Result<Vec<ScoredResult>, QueryError> {
        if query.is_empty() {
            return Err(QueryError::EmptyQuery);
        }
        let index = self.index;
        let n = index.document_count();
        if n == 0 {
            return Ok(Vec::new());
        }
        let avgdl = index.average_document_length();

        let stats: Vec<ClauseStats> = query
            .clauses()
            .iter()
            .map(|c| {
                let postings = index.postings_for(&c.term);
                ClauseStats { occur: c.occur, postings, idf: self.scorer.idf(postings.len() as u32, n) }
            })
            .collect();

        let contribution = |s: &ClauseStats<'_>, doc_id: DocId, tf: u32| -> f32 {
            let doc_len = index.document_length(doc_id).unwrap_or(0);
            self.scorer.term_score(s.idf, tf, doc_len, avgdl)
        };

        if !query.has_required() {
            let mut scores: HashMap<DocId, f32> = HashMap::new();
            for s in &stats {
                for p in s.postings {
                    *scores.entry(p.doc_id).or_insert(0.0) += contribution(s, p.doc_id, p.term_frequency);
                }
            }
            let mut results: Vec<ScoredResult> =
                scores.into_iter().map(|(doc_id, score)| ScoredResult { doc_id, score }).collect();
            results.sort_unstable_by_key(|r| r.doc_id);
            return Ok(results);
        }

        let mut required: Vec<&[Posting]> =
            stats.iter().filter(|s| s.occur == Occur::Required).map(|s| s.postings).collect();
        required.sort_by_key(|p| p.len());
        let candidates = intersect(&required);
        tracing::debug!(candidates = candidates.len(), "required-term intersection");

        let results = candidates
            .into_iter()
            .map(|doc_id| {
                let mut score = 0.0;
                for s in &stats {
                    if let Some(tf) = term_frequency(s.postings, doc_id) {
                        score += contribution(s, doc_id, tf);
                    }
                }
                ScoredResult { doc_id, score }
            })
            .collect();
        Ok(results)
    }

    /// Parse, evaluate and keep the best `k`.
    pub fn search(&self, text: &str, k: usize) -> Result<Vec<ScoredResult>, QueryError> {
        let query = self.parse(text)?;
        let results = self.evaluate(&query)?;
        Ok(top_k(results, k))
    }

    /// Like [`search`](Self::search) but resolved to titles.
    pub fn search_titles(&self, text: &str, k: usize) -> Result<Vec<String>, QueryError> {
        Ok(self
            .search(text, k)?
            .into_iter()
            .filter_map(|r| self.index.title_of(r.doc_id).map(str::to_string))
            .collect())
    }
}

/// Doc ids present in every list. Lists are doc-id ordered; the shortest
/// should come first.
fn intersect(lists: &[&[Posting]]) -> Vec<DocId> {
    let Some((first, rest)) = lists.split_first() else {
        return Vec::new();
    };
    first
        .iter()
        .map(|p| p.doc_id)
        .filter(|doc_id| rest.iter().all(|list| term_frequency(list, *doc_id).is_some()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build_index;

    fn occurs(q: &Query) -> Vec<(&str, Occur)> {
        q.clauses().iter().map(|c| (c.term.as_str(), c.occur)).collect()
    }

    #[test]
    fn parse_marks_required_terms() {
        let q = Query::parse("+france capital", &Analyzer::default()).unwrap();
        assert_eq!(occurs(&q), vec![("franc", Occur::Required), ("capit", Occur::Optional)]);
    }

    #[test]
    fn marker_applies_to_every_term_of_its_word() {
        let q = Query::parse("+Jean-Paul city", &Analyzer::default()).unwrap();
        assert_eq!(
            occurs(&q),
            vec![("jean", Occur::Required), ("paul", Occur::Required), ("citi", Occur::Optional)]
        );
    }

    #[test]
    fn duplicate_terms_merge_and_required_wins() {
        let q = Query::parse("river +rivers river", &Analyzer::default()).unwrap();
        assert_eq!(occurs(&q), vec![("river", Occur::Required)]);
    }

    #[test]
    fn required_stopword_is_dropped() {
        let q = Query::parse("+the moon", &Analyzer::default()).unwrap();
        assert_eq!(occurs(&q), vec![("moon", Occur::Optional)]);
    }

    #[test]
    fn malformed_markers() {
        let a = Analyzer::default();
        assert_eq!(Query::parse("moon +", &a), Err(ParseError::DanglingMarker { position: 5 }));
        assert_eq!(Query::parse("++moon", &a), Err(ParseError::RepeatedMarker { position: 0 }));
    }

    #[test]
    fn plus_inside_a_word_is_not_a_marker() {
        let q = Query::parse("c++ language", &Analyzer::default()).unwrap();
        assert!(!q.has_required());
    }

    #[test]
    fn evaluator_requires_committed_index() {
        let index = InvertedIndex::default();
        let err = QueryEvaluator::new(&index, Bm25Params::default()).unwrap_err();
        assert_eq!(err, IndexError::NotCommitted);
    }

    #[test]
    fn or_and_required_modes() {
        let build = build_index(
            Analyzer::default(),
            vec![
                ("Paris", "paris is the capital of france"),
                ("Berlin", "berlin is the capital of germany"),
                ("Lyon", "lyon is a city in france"),
            ],
        );
        let eval = QueryEvaluator::new(&build.index, Bm25Params::default()).unwrap();

        let q = eval.parse("capital france").unwrap();
        let ids: Vec<DocId> = eval.evaluate(&q).unwrap().iter().map(|r| r.doc_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);

        let q = eval.parse("+capital +france").unwrap();
        let ids: Vec<DocId> = eval.evaluate(&q).unwrap().iter().map(|r| r.doc_id).collect();
        assert_eq!(ids, vec![0]);

        let q = eval.parse("+france capital").unwrap();
        let results = eval.evaluate(&q).unwrap();
        assert_eq!(results.iter().map(|r| r.doc_id).collect::<Vec<_>>(), vec![0, 2]);
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn evaluate_agrees_with_ranker_score() {
        let build = build_index(
            Analyzer::default(),
            vec![("A", "apple banana apple"), ("B", "banana cherry"), ("C", "cherry apple date")],
        );
        let eval = QueryEvaluator::new(&build.index, Bm25Params::default()).unwrap();
        let bm25 = Bm25::default();
        for text in ["apple cherry", "+banana apple", "date"] {
            let q = eval.parse(text).unwrap();
            for r in eval.evaluate(&q).unwrap() {
                assert_eq!(r.score, bm25.score(r.doc_id, &q, &build.index), "{text}");
            }
        }
    }

    #[test]
    fn missing_required_term_yields_nothing() {
        let build = build_index(Analyzer::default(), vec![("A", "alpha"), ("B", "beta")]);
        let eval = QueryEvaluator::new(&build.index, Bm25Params::default()).unwrap();
        let q = eval.parse("+omega alpha").unwrap();
        assert!(eval.evaluate(&q).unwrap().is_empty());
    }

    #[test]
    fn empty_query_is_an_error() {
        let build = build_index(Analyzer::default(), vec![("A", "alpha")]);
        let eval = QueryEvaluator::new(&build.index, Bm25Params::default()).unwrap();
        let q = eval.parse("the of a").unwrap();
        assert_eq!(eval.evaluate(&q), Err(QueryError::EmptyQuery));
    }
}
