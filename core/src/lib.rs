//! Retrieval core for clue-style question answering.
//!
//! Build an index once from `(title, body)` pairs, then answer free-text
//! clues with ranked titles and score labeled clue sets by MRR and P@1.
//! Nothing in this crate performs I/O.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod eval;
pub mod index;
pub mod query;
pub mod ranker;

pub use analyzer::Analyzer;
pub use config::{AnalyzerConfig, Bm25Params, EngineConfig};
pub use error::{ConfigError, IndexError, ParseError, QueryError};
pub use eval::{EvalOptions, EvaluationReport, Metrics, QueryAnswerPair, QueryOutcome};
pub use index::{DocId, IndexBuild, InvertedIndex, Posting, RejectedDocument, TermId};
pub use query::{Clause, Occur, Query, QueryEvaluator};
pub use ranker::{top_k, Bm25, ScoredResult};

/// Analyze and index every document with the configured analyzer, then commit.
pub fn build_index<I, T, B>(config: &EngineConfig, documents: I) -> IndexBuild
where
    I: IntoIterator<Item = (T, B)>,
    T: AsRef<str>,
    B: AsRef<str>,
{
    index::build_index(Analyzer::new(config.analyzer.clone()), documents)
}

/// [`build_index`] with document analysis spread over the rayon pool.
pub fn build_index_parallel<T, B>(config: &EngineConfig, documents: &[(T, B)]) -> IndexBuild
where
    T: AsRef<str> + Sync,
    B: AsRef<str> + Sync,
{
    index::build_index_parallel(Analyzer::new(config.analyzer.clone()), documents)
}

/// Ranked titles for `text`, at most `k`.
///
/// Unless `config.strict_queries` is set, queries that analyze to nothing or
/// carry malformed markers return an empty list instead of an error.
pub fn query(index: &InvertedIndex, config: &EngineConfig, text: &str, k: usize) -> Result<Vec<String>, QueryError> {
    let evaluator = QueryEvaluator::new(index, config.bm25)?;
    match evaluator.search_titles(text, k) {
        Err(err) if err.is_no_results() && !config.strict_queries => {
            tracing::debug!(query = text, %err, "no results");
            Ok(Vec::new())
        }
        other => other,
    }
}

/// Score `pairs` against the index using the configured top-k cutoff.
pub fn evaluate(
    index: &InvertedIndex,
    config: &EngineConfig,
    pairs: &[QueryAnswerPair],
    parallel: bool,
) -> Result<EvaluationReport, IndexError> {
    let evaluator = QueryEvaluator::new(index, config.bm25)?;
    let options = EvalOptions { k: config.top_k, parallel };
    Ok(eval::compute_metrics(pairs, &evaluator, options))
}
