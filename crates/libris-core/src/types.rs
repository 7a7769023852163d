//! Domain types shared by the retrievers and the hybrid engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Stable identifier of a document in the library.
pub type DocId = i64;

/// A book or paper as stored by the persistence layer.
///
/// - `body`: full lexical body, opaque to the engine
/// - `index_text`: the back-of-book index, if one was extracted
/// - `embedding`: fixed-length vector; its dimension must match the query vector
///
/// The remaining fields are display metadata and are never interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub index_text: Option<String>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// Restricts which indexed column the lexical retriever matches against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldSelector {
    #[default]
    All,
    Title,
    Author,
    Index,
}

impl FromStr for FieldSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "title" => Ok(Self::Title),
            "author" => Ok(Self::Author),
            "index" => Ok(Self::Index),
            other => Err(Error::InvalidConfig(format!("unknown field selector '{other}'"))),
        }
    }
}

/// One search request. Built per call and discarded afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub limit: usize,
    pub offset: usize,
    pub use_fts: bool,
    pub use_vector: bool,
    pub use_translate: bool,
    pub use_rerank: bool,
    pub field: FieldSelector,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), ..Self::default() }
    }

    pub fn page(mut self, limit: usize, offset: usize) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    pub fn modes(mut self, use_fts: bool, use_vector: bool) -> Self {
        self.use_fts = use_fts;
        self.use_vector = use_vector;
        self
    }

    pub fn translate(mut self, on: bool) -> Self { self.use_translate = on; self }

    pub fn rerank(mut self, on: bool) -> Self { self.use_rerank = on; self }

    pub fn field(mut self, field: FieldSelector) -> Self { self.field = field; self }

    /// Rejects whitespace-only queries.
    pub fn validate(&self) -> crate::Result<()> {
        if self.query.trim().is_empty() {
            return Err(Error::EmptyQuery);
        }
        Ok(())
    }
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            limit: 20,
            offset: 0,
            use_fts: true,
            use_vector: true,
            use_translate: false,
            use_rerank: false,
            field: FieldSelector::All,
        }
    }
}

/// Which retrieval mode(s) surfaced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    Vector,
    Text,
    Both,
}

impl fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Vector => "vector",
            Self::Text => "text",
            Self::Both => "both",
        };
        f.write_str(s)
    }
}

/// Raw output of a lexical index: ordinal rank only, no comparable score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalHit {
    pub id: DocId,
    pub rank: usize,
    pub snippet: Option<String>,
}

/// Raw cosine similarity of a stored vector against the query vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SemanticHit {
    pub id: DocId,
    pub score: f32,
}

/// A display-ready result for one page position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub id: DocId,
    pub title: String,
    pub author: String,
    pub year: Option<i64>,
    pub publisher: Option<String>,
    pub summary: Option<String>,
    pub path: Option<String>,
    pub score: f32,
    pub mode: RetrievalMode,
    pub snippet: Option<String>,
    pub index_matches: Option<String>,
    /// 1-based position assigned by the reranking service.
    pub ai_rank: Option<usize>,
    pub ai_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<RankedResult>,
    pub total_count: usize,
    pub expanded_query: Option<String>,
}

impl SearchResponse {
    pub fn empty() -> Self { Self::default() }
}

/// Where an in-book match sits: a body page, or the back-of-book index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPage {
    Number(u32),
    Index,
}

impl fmt::Display for MatchPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Index => f.write_str("Index"),
        }
    }
}

/// A highlighted passage inside one book. Hits are wrapped in `<b>..</b>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookMatch {
    pub snippet: String,
    pub page: MatchPage,
}

/// What the reranking service gets to see of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankCandidate {
    pub id: DocId,
    pub title: String,
    pub author: String,
    pub snippet: Option<String>,
    pub summary: Option<String>,
}

/// One entry of the reranking service's reply, in its preferred order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankJudgement {
    pub id: DocId,
    #[serde(default)]
    pub reason: String,
}
