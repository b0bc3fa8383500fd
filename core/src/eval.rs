//! Batch evaluation of labeled queries: MRR and precision-at-1.

use crate::query::QueryEvaluator;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAnswerPair {
    pub query: String,
    pub expected: String,
}

impl QueryAnswerPair {
    pub fn new(query: impl Into<String>, expected: impl Into<String>) -> Self {
        Self { query: query.into(), expected: expected.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub mrr: f64,
    pub p_at_1: f64,
    /// Queries whose expected answer appeared anywhere in the ranked list.
    pub answer_present: usize,
    pub total: usize,
    /// Queries whose evaluation returned an error. Included in `total`.
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryOutcome {
    pub query: String,
    pub expected: String,
    pub predictions: Vec<String>,
    /// 1-based rank of the expected answer.
    pub rank: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub metrics: Metrics,
    pub outcomes: Vec<QueryOutcome>,
}

#[derive(Debug, Clone, Copy)]
pub struct EvalOptions {
    pub k: usize,
    pub parallel: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self { k: crate::config::DEFAULT_TOP_K, parallel: false }
    }
}

/// Run every pair and aggregate metrics. One query failing never stops the
/// batch: its error is logged and recorded, and it scores zero.
pub fn compute_metrics(
    pairs: &[QueryAnswerPair],
    evaluator: &QueryEvaluator<'_>,
    options: EvalOptions,
) -> EvaluationReport {
    let run = |pair: &QueryAnswerPair| run_one(pair, evaluator, options.k);
    let outcomes: Vec<QueryOutcome> = if options.parallel {
        pairs.par_iter().map(run).collect()
    } else {
        pairs.iter().map(run).collect()
    };

    let metrics = aggregate(&outcomes);
    tracing::info!(
        mrr = metrics.mrr,
        p_at_1 = metrics.p_at_1,
        answer_present = metrics.answer_present,
        total = metrics.total,
        failed = metrics.failed,
        "evaluation complete"
    );
    EvaluationReport { metrics, outcomes }
}

fn run_one(pair: &QueryAnswerPair, evaluator: &QueryEvaluator<'_>, k: usize) -> QueryOutcome {
    let (predictions, error) = match evaluator.search_titles(&pair.query, k) {
        Ok(titles) => (titles, None),
        Err(err) => {
            if err.is_no_results() {
                tracing::debug!(query = %pair.query, %err, "query produced no results");
            } else {
                tracing::warn!(query = %pair.query, %err, "query failed");
            }
            (Vec::new(), Some(err.to_string()))
        }
    };
    let rank = predictions.iter().position(|t| *t == pair.expected).map(|i| i + 1);
    tracing::debug!(query = %pair.query, expected = %pair.expected, ?rank, "evaluated");
    QueryOutcome {
        query: pair.query.clone(),
        expected: pair.expected.clone(),
        predictions,
        rank,
        error,
    }
}

/// Fold outcomes in input order. An empty batch yields zeros, not NaN.
pub fn aggregate(outcomes: &[QueryOutcome]) -> Metrics {
    let total = outcomes.len();
    let mut reciprocal_sum = 0.0f64;
    let mut correct_at_1 = 0usize;
    let mut answer_present = 0usize;
    let mut failed = 0usize;
    for outcome in outcomes {
        if outcome.error.is_some() {
            failed += 1;
        }
        if let Some(rank) = outcome.rank {
            reciprocal_sum += 1.0 / rank as f64;
            answer_present += 1;
            if rank == 1 {
                correct_at_1 += 1;
            }
        }
    }
    let (mrr, p_at_1) = if total == 0 {
        (0.0, 0.0)
    } else {
        (reciprocal_sum / total as f64, correct_at_1 as f64 / total as f64)
    };
    Metrics { mrr, p_at_1, answer_present, total, failed }
}
