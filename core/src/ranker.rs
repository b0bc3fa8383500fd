//! BM25 scoring and top-k selection.

use crate::config::Bm25Params;
use crate::index::{DocId, InvertedIndex, Posting};
use crate::query::Query;
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredResult {
    pub doc_id: DocId,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Bm25 {
    params: Bm25Params,
}

impl Bm25 {
    pub fn new(params: Bm25Params) -> Self {
        Self { params }
    }

    /// IDF: ln((N - df + 0.5) / (df + 0.5) + 1). Always positive for df <= N.
    pub fn idf(&self, df: u32, num_docs: u32) -> f32 {
        let n = num_docs as f32;
        let df = df as f32;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    /// Contribution of one term to one document.
    pub fn term_score(&self, idf: f32, tf: u32, doc_len: u32, avgdl: f32) -> f32 {
        let Bm25Params { k1, b } = self.params;
        let tf = tf as f32;
        let relative_len = if avgdl > 0.0 { doc_len as f32 / avgdl } else { 1.0 };
        idf * (tf * (k1 + 1.0)) / (tf + k1 * (1.0 - b + b * relative_len))
    }

    /// Score one document against every clause of `query`. Terms the document
    /// lacks contribute nothing.
    pub fn score(&self, doc_id: DocId, query: &Query, index: &InvertedIndex) -> f32 {
        let Some(doc_len) = index.document_length(doc_id) else {
            return 0.0;
        };
        let n = index.document_count();
        let avgdl = index.average_document_length();
        let mut score = 0.0;
        for clause in query.clauses() {
            let postings = index.postings_for(&clause.term);
            if let Some(tf) = term_frequency(postings, doc_id) {
                let idf = self.idf(postings.len() as u32, n);
                score += self.term_score(idf, tf, doc_len, avgdl);
            }
        }
        score
    }
}

/// Binary search a postings list, which is kept in doc id order.
pub(crate) fn term_frequency(postings: &[Posting], doc_id: DocId) -> Option<u32> {
    postings
        .binary_search_by_key(&doc_id, |p| p.doc_id)
        .ok()
        .map(|i| postings[i].term_frequency)
}

/// Descending score, ties broken by ascending doc id (insertion order).
fn rank_order(a: &ScoredResult, b: &ScoredResult) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.doc_id.cmp(&b.doc_id))
}

/// Keep the `k` best results in rank order. The ordering is total, so the
/// output depends only on the input set, never on its arrival order.
pub fn top_k(mut results: Vec<ScoredResult>, k: usize) -> Vec<ScoredResult> {
    if k == 0 {
        return Vec::new();
    }
    if results.len() > k {
        results.select_nth_unstable_by(k - 1, rank_order);
        results.truncate(k);
    }
    results.sort_unstable_by(rank_order);
    results
}
