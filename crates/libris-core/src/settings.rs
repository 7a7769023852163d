//! Typed configuration sections.
//!
//! Every tuning constant of the retrieval pipeline lives in `SearchSettings`.
//! The defaults are empirical values carried over from the running library;
//! they are configuration, not law, but they are fixed for the lifetime of an
//! engine and never vary per call.

use serde::{Deserialize, Serialize};

use crate::error::Error;

pub const DEFAULT_ACCEPTANCE_FLOOR: f32 = 0.25;
pub const DEFAULT_VECTOR_WEIGHT: f32 = 0.6;
pub const DEFAULT_LEXICAL_WEIGHT: f32 = 0.4;
pub const DEFAULT_INDEX_BOOST: f32 = 0.5;
pub const DEFAULT_SEMANTIC_TOP_K: usize = 50;
pub const DEFAULT_LEXICAL_CAP: usize = 100;
pub const DEFAULT_INDEX_WINDOW_CHARS: usize = 300;
pub const DEFAULT_ZERO_NORM_EPSILON: f32 = 1e-10;

const LEXICAL_CAP_RANGE: (usize, usize) = (100, 1000);
const MAX_CONCURRENT_CALLS_RANGE: (usize, usize) = (1, 3);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Vector hits scoring below this are dropped before fusion.
    pub acceptance_floor: f32,
    pub vector_weight: f32,
    pub lexical_weight: f32,
    /// Added to a candidate whose index text lists the query term.
    pub index_boost: f32,
    pub semantic_top_k: usize,
    pub lexical_cap: usize,
    pub index_window_chars: usize,
    pub zero_norm_epsilon: f32,
    pub call_timeout_ms: u64,
    pub max_concurrent_calls: usize,
    /// Entries per memo (embeddings, expansions). Zero disables memoization.
    pub cache_capacity: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            acceptance_floor: DEFAULT_ACCEPTANCE_FLOOR,
            vector_weight: DEFAULT_VECTOR_WEIGHT,
            lexical_weight: DEFAULT_LEXICAL_WEIGHT,
            index_boost: DEFAULT_INDEX_BOOST,
            semantic_top_k: DEFAULT_SEMANTIC_TOP_K,
            lexical_cap: DEFAULT_LEXICAL_CAP,
            index_window_chars: DEFAULT_INDEX_WINDOW_CHARS,
            zero_norm_epsilon: DEFAULT_ZERO_NORM_EPSILON,
            call_timeout_ms: 8_000,
            max_concurrent_calls: 2,
            cache_capacity: 100,
        }
    }
}

impl SearchSettings {
    pub fn validate(&self) -> crate::Result<()> {
        let finite = [self.acceptance_floor, self.vector_weight, self.lexical_weight, self.index_boost, self.zero_norm_epsilon];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidConfig("search constants must be finite".into()));
        }
        if self.vector_weight < 0.0 || self.lexical_weight < 0.0 {
            return Err(Error::InvalidConfig("fusion weights must be non-negative".into()));
        }
        if self.zero_norm_epsilon <= 0.0 {
            return Err(Error::InvalidConfig("zero_norm_epsilon must be positive".into()));
        }
        if self.call_timeout_ms == 0 {
            return Err(Error::InvalidConfig("call_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    /// Pulls the candidate cap and the worker count into their supported ranges.
    pub fn clamped(mut self) -> Self {
        self.lexical_cap = self.lexical_cap.clamp(LEXICAL_CAP_RANGE.0, LEXICAL_CAP_RANGE.1);
        self.max_concurrent_calls = self.max_concurrent_calls.clamp(MAX_CONCURRENT_CALLS_RANGE.0, MAX_CONCURRENT_CALLS_RANGE.1);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub api_base: String,
    pub path: String,
    pub api_key: String,
    pub model: String,
    pub dimensions: usize,
    pub timeout_ms: u64,
    pub max_input_chars: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:8080".to_string(),
            path: "/v1/embeddings".to_string(),
            api_key: String::new(),
            model: "text-embedding".to_string(),
            dimensions: 768,
            timeout_ms: 10_000,
            max_input_chars: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub api_base: String,
    pub path: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_ms: u64,
    pub max_attempts: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:8080".to_string(),
            path: "/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "reasoning".to_string(),
            temperature: 0.0,
            timeout_ms: 20_000,
            max_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub tantivy_index_dir: String,
    pub lancedb_dir: String,
    pub vector_table: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            tantivy_index_dir: "../dev_data/indexes/tantivy".to_string(),
            lancedb_dir: "../dev_data/indexes/lancedb".to_string(),
            vector_table: "book_vectors".to_string(),
        }
    }
}
