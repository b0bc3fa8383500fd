use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::get, Json, Router};
use qa_core::{top_k, EngineConfig, InvertedIndex, QueryError, QueryEvaluator};
use qa_ingest::corpus::load_corpus;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const MAX_K: usize = 100;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { qa_core::config::DEFAULT_TOP_K }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_ms: u128,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: u32,
    pub score: f32,
    pub title: String,
}

#[derive(Serialize)]
pub struct DocResponse {
    pub doc_id: u32,
    pub title: String,
    pub length: u32,
}

#[derive(Clone)]
pub struct AppState {
    pub index: Arc<InvertedIndex>,
    pub config: Arc<EngineConfig>,
}

/// Load the corpus at `corpus_path`, build and commit the index, and serve it.
pub fn build_app(corpus_path: &std::path::Path, config: EngineConfig) -> Result<Router> {
    let corpus = load_corpus(corpus_path)?;
    let build = qa_core::build_index_parallel(&config, &corpus.documents());
    for rejected in &build.rejected {
        tracing::warn!(position = rejected.position, title = %rejected.title, error = %rejected.error, "document not indexed");
    }
    tracing::info!(documents = build.index.document_count(), rejected = build.rejected.len(), "index ready");
    router(build.index, config)
}

/// Serve an already committed index.
pub fn router(index: InvertedIndex, config: EngineConfig) -> Result<Router> {
    if !index.is_committed() {
        anyhow::bail!("index must be committed before serving");
    }
    let app_state = AppState { index: Arc::new(index), config: Arc::new(config) };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = Instant::now();
    let evaluator = QueryEvaluator::new(&state.index, state.config.bm25)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let scored = match evaluator
        .parse(&params.q)
        .map_err(QueryError::from)
        .and_then(|query| evaluator.evaluate(&query))
    {
        Ok(scored) => scored,
        // Empty after analysis or malformed markers: answer with no hits
        Err(err) if err.is_no_results() && !state.config.strict_queries => {
            tracing::debug!(query = %params.q, %err, "no results");
            Vec::new()
        }
        Err(err) => return Err((StatusCode::BAD_REQUEST, err.to_string())),
    };

    let total_hits = scored.len();
    let k = params.k.clamp(1, MAX_K);
    let results = top_k(scored, k)
        .into_iter()
        .filter_map(|r| {
            state.index.title_of(r.doc_id).map(|title| SearchHit { doc_id: r.doc_id, score: r.score, title: title.to_string() })
        })
        .collect();

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse { query: params.q, took_ms: elapsed.as_millis(), took_s: elapsed.as_secs_f64(), total_hits, results }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<u32>,
) -> Result<Json<DocResponse>, (StatusCode, String)> {
    match (state.index.title_of(doc_id), state.index.document_length(doc_id)) {
        (Some(title), Some(length)) => Ok(Json(DocResponse { doc_id, title: title.to_string(), length })),
        _ => Err((StatusCode::NOT_FOUND, format!("document {doc_id} not found"))),
    }
}
