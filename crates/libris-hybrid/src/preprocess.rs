//! Query preparation: optional expansion and the query embedding.
//!
//! Both are remote, memoized on the exact query string and issued together.
//! A failure or timeout only disables what depended on it; nothing here
//! returns an error.

use std::sync::Arc;

use tracing::{debug, warn};

use libris_core::settings::SearchSettings;
use libris_core::traits::{Embedder, QueryExpander};

use crate::cache::QueryMemo;
use crate::gate::CallGate;

#[derive(Debug, Clone, PartialEq)]
pub struct PreparedQuery {
    /// Text for the lexical retriever: the expansion if there is one.
    pub lexical_text: String,
    pub expanded: Option<String>,
    pub vector: Option<Vec<f32>>,
}

pub struct Preprocessor {
    embedder: Option<Arc<dyn Embedder>>,
    expander: Option<Arc<dyn QueryExpander>>,
    embeddings: QueryMemo<Vec<f32>>,
    expansions: QueryMemo<String>,
}

impl Preprocessor {
    pub fn new(
        embedder: Option<Arc<dyn Embedder>>,
        expander: Option<Arc<dyn QueryExpander>>,
        settings: &SearchSettings,
    ) -> Self {
        Self {
            embedder,
            expander,
            embeddings: QueryMemo::new(settings.cache_capacity),
            expansions: QueryMemo::new(settings.cache_capacity),
        }
    }

    pub fn embedding_cache(&self) -> &QueryMemo<Vec<f32>> { &self.embeddings }

    pub fn expansion_cache(&self) -> &QueryMemo<String> { &self.expansions }

    /// Runs expansion and embedding side by side through `gate`.
    pub async fn prepare(&self, gate: &CallGate, query: &str, expand: bool, embed: bool) -> PreparedQuery {
        let expansion = async { if expand { self.expand(gate, query).await } else { None } };
        let embedding = async { if embed { self.embed(gate, query).await } else { None } };
        let (expanded, vector) = tokio::join!(expansion, embedding);
        let lexical_text = expanded.clone().unwrap_or_else(|| query.to_string());
        PreparedQuery { lexical_text, expanded, vector }
    }

    async fn expand(&self, gate: &CallGate, query: &str) -> Option<String> {
        let expander = self.expander.as_ref()?;
        if let Some(hit) = self.expansions.get(query) {
            return Some(hit);
        }
        match gate.run("expansion", expander.expand(query)).await {
            Ok(text) => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    warn!(query, "expansion came back empty, using the query as typed");
                    return None;
                }
                debug!(query, expanded = %text, "expanded query");
                self.expansions.put(query, text.clone());
                Some(text)
            }
            Err(e) => {
                warn!(error = %e, "query expansion unavailable, using the query as typed");
                None
            }
        }
    }

    async fn embed(&self, gate: &CallGate, query: &str) -> Option<Vec<f32>> {
        let embedder = self.embedder.as_ref()?;
        if let Some(hit) = self.embeddings.get(query) {
            return Some(hit);
        }
        match gate.run("embedding", embedder.embed(query)).await {
            Ok(vector) if vector.is_empty() => {
                warn!("embedding service returned an empty vector, skipping semantic retrieval");
                None
            }
            Ok(vector) => {
                self.embeddings.put(query, vector.clone());
                Some(vector)
            }
            Err(e) => {
                warn!(error = %e, "embedding unavailable, skipping semantic retrieval");
                None
            }
        }
    }
}
