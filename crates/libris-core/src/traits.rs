//! Collaborators consumed by the retrieval engine.
//!
//! Local stores (`LexicalIndex`, `Catalog`) are synchronous; anything that may
//! cross the network returns a boxed future so callers can bound it with a
//! timeout and run it next to other calls.

use futures::future::BoxFuture;

use crate::types::{BookMatch, DocId, Document, FieldSelector, LexicalHit, RerankCandidate, RerankJudgement};

pub trait LexicalIndex: Send + Sync {
    /// Ranked matches for `query`, best first, at most `limit` of them.
    fn search(&self, query: &str, field: FieldSelector, limit: usize) -> anyhow::Result<Vec<LexicalHit>>;
}

pub trait Catalog: Send + Sync {
    /// Documents for the given ids. Unknown ids are omitted, order is unspecified.
    fn fetch(&self, ids: &[DocId]) -> anyhow::Result<Vec<Document>>;
}

pub trait BookMatcher: Send + Sync {
    /// Passages of document `id` that contain `query` terms, in reading order.
    /// Empty when the document is unknown or nothing matches.
    fn matches(&self, id: DocId, query: &str) -> anyhow::Result<Vec<BookMatch>>;
}

pub trait VectorStore: Send + Sync {
    /// Every stored `(id, vector)` pair. Dimensions are not validated here.
    fn load_vectors(&self) -> BoxFuture<'_, anyhow::Result<Vec<(DocId, Vec<f32>)>>>;
}

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, anyhow::Result<Vec<f32>>>;
}

pub trait QueryExpander: Send + Sync {
    fn expand<'a>(&'a self, query: &'a str) -> BoxFuture<'a, anyhow::Result<String>>;
}

pub trait Reranker: Send + Sync {
    fn rerank<'a>(
        &'a self,
        query: &'a str,
        candidates: &'a [RerankCandidate],
    ) -> BoxFuture<'a, anyhow::Result<Vec<RerankJudgement>>>;
}
