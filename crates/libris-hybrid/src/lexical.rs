use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use libris_core::traits::LexicalIndex;
use libris_core::types::{DocId, FieldSelector};
use libris_core::{Error, Result};

/// Position-normalized relevance: `1 - rank / total`, so the first of `total`
/// hits scores 1.0 and the last scores `1/total`.
pub fn rank_score(rank: usize, total: usize) -> f32 {
    if total == 0 { return 0.0; }
    1.0 - rank as f32 / total as f32
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredLexicalHit {
    pub id: DocId,
    pub score: f32,
    pub snippet: Option<String>,
}

/// Wraps a lexical index, caps the result list and turns ranks into scores
/// comparable with cosine similarity.
pub struct LexicalRetriever {
    index: Arc<dyn LexicalIndex>,
    cap: usize,
}

impl LexicalRetriever {
    pub fn new(index: Arc<dyn LexicalIndex>, cap: usize) -> Self { Self { index, cap } }

    pub fn retrieve(&self, query: &str, field: FieldSelector) -> Result<Vec<ScoredLexicalHit>> {
        let mut hits = self
            .index
            .search(query, field, self.cap)
            .map_err(Error::index_store)?;
        hits.truncate(self.cap);
        let mut seen = HashSet::with_capacity(hits.len());
        hits.retain(|h| seen.insert(h.id));

        let total = hits.len();
        debug!(query, ?field, total, "lexical search");
        Ok(hits
            .into_iter()
            .enumerate()
            .map(|(rank, h)| ScoredLexicalHit { id: h.id, score: rank_score(rank, total), snippet: h.snippet })
            .collect())
    }
}
