//! Engine configuration.
//!
//! All configuration is explicit and immutable once handed to a constructor.
//! Every struct deserializes from JSON with missing fields falling back to
//! their defaults, so a config file only needs to name what it overrides.

use crate::analyzer::default_stopwords;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const DEFAULT_K1: f32 = 1.2;
pub const DEFAULT_B: f32 = 0.75;
pub const DEFAULT_TOP_K: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub stopwords_enabled: bool,
    pub stopwords: BTreeSet<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self { stopwords_enabled: true, stopwords: default_stopwords() }
    }
}

impl AnalyzerConfig {
    pub fn without_stopwords() -> Self {
        Self { stopwords_enabled: false, ..Self::default() }
    }
}

/// BM25 tuning constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f32,
    /// Document-length normalization strength, 0.0 disables it.
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: DEFAULT_K1, b: DEFAULT_B }
    }
}

impl Bm25Params {
    /// Scores stay non-negative only for finite `k1 >= 0` and `b` in `0.0..=1.0`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(ConfigError::InvalidParam { field: "bm25.k1", value: self.k1 });
        }
        if !self.b.is_finite() || !(0.0..=1.0).contains(&self.b) {
            return Err(ConfigError::InvalidParam { field: "bm25.b", value: self.b });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub analyzer: AnalyzerConfig,
    pub bm25: Bm25Params,
    pub top_k: usize,
    /// Surface EmptyQuery/ParseError to callers instead of returning no results.
    pub strict_queries: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            analyzer: AnalyzerConfig::default(),
            bm25: Bm25Params::default(),
            top_k: DEFAULT_TOP_K,
            strict_queries: false,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.bm25.validate()?;
        Ok(config)
    }
}
