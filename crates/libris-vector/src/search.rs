use anyhow::Result;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

use libris_core::settings::SearchSettings;
use libris_core::traits::VectorStore;
use libris_core::types::{DocId, SemanticHit};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionParams {
    pub top_k: usize,
    pub acceptance_floor: f32,
    /// Stand-in norm for all-zero vectors.
    pub epsilon: f32,
}

impl From<&SearchSettings> for SelectionParams {
    fn from(s: &SearchSettings) -> Self {
        Self { top_k: s.semantic_top_k, acceptance_floor: s.acceptance_floor, epsilon: s.zero_norm_epsilon }
    }
}

fn norm(v: &[f32]) -> f32 { v.iter().map(|x| x * x).sum::<f32>().sqrt() }

fn guarded(n: f32, epsilon: f32) -> f32 { if n == 0.0 { epsilon } else { n } }

fn dot(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

pub fn cosine_similarity(a: &[f32], b: &[f32], epsilon: f32) -> f32 {
    dot(a, b) / (guarded(norm(a), epsilon) * guarded(norm(b), epsilon))
}

/// Best `top_k` rows by cosine similarity, descending.
///
/// Rows whose dimension differs from the query are skipped, scores below the
/// acceptance floor (and NaN) are dropped. Only the surviving top-K slice is
/// sorted; ties keep row order, so the result is a pure function of the input.
pub fn top_k(query: &[f32], rows: &[(DocId, Vec<f32>)], params: SelectionParams) -> Vec<SemanticHit> {
    if params.top_k == 0 || query.is_empty() { return Vec::new(); }
    let q_norm = guarded(norm(query), params.epsilon);

    let mut scored: Vec<(usize, SemanticHit)> = rows
        .iter()
        .enumerate()
        .filter(|(_, (_, v))| v.len() == query.len())
        .map(|(pos, (id, v))| (pos, SemanticHit { id: *id, score: dot(query, v) / (q_norm * guarded(norm(v), params.epsilon)) }))
        .filter(|(_, hit)| hit.score >= params.acceptance_floor)
        .collect();

    let order = |a: &(usize, SemanticHit), b: &(usize, SemanticHit)| -> Ordering {
        b.1.score.total_cmp(&a.1.score).then(a.0.cmp(&b.0))
    };
    if scored.len() > params.top_k {
        scored.select_nth_unstable_by(params.top_k - 1, order);
        scored.truncate(params.top_k);
    }
    scored.sort_unstable_by(order);
    scored.into_iter().map(|(_, hit)| hit).collect()
}

pub struct SemanticRetriever {
    store: Arc<dyn VectorStore>,
    params: SelectionParams,
}

impl SemanticRetriever {
    pub fn new(store: Arc<dyn VectorStore>, settings: &SearchSettings) -> Self {
        Self { store, params: SelectionParams::from(settings) }
    }

    pub async fn retrieve(&self, query_vec: &[f32]) -> Result<Vec<SemanticHit>> {
        let rows = self.store.load_vectors().await?;
        let hits = top_k(query_vec, &rows, self.params);
        debug!(stored = rows.len(), hits = hits.len(), "semantic search");
        Ok(hits)
    }

    /// Documents nearest to `id`'s own vector, excluding itself. No acceptance
    /// floor; empty when `id` has no vector.
    pub async fn similar(&self, id: DocId, limit: usize) -> Result<Vec<SemanticHit>> {
        let rows = self.store.load_vectors().await?;
        let Some(target) = rows.iter().find(|(rid, _)| *rid == id).map(|(_, v)| v.clone()) else {
            return Ok(Vec::new());
        };
        let others: Vec<(DocId, Vec<f32>)> = rows.into_iter().filter(|(rid, _)| *rid != id).collect();
        let params = SelectionParams { top_k: limit, acceptance_floor: f32::NEG_INFINITY, ..self.params };
        Ok(top_k(&target, &others, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(top_k: usize) -> SelectionParams {
        SelectionParams { top_k, acceptance_floor: 0.25, epsilon: 1e-10 }
    }

    #[test]
    fn zero_vectors_score_zero_instead_of_nan() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0], 1e-10), 0.0);
    }

    #[test]
    fn ties_keep_row_order_across_the_partition() {
        let rows: Vec<(DocId, Vec<f32>)> = (0..10).map(|id| (id, vec![1.0, 0.0])).collect();
        let hits = top_k(&[1.0, 0.0], &rows, params(4));
        assert_eq!(hits.iter().map(|h| h.id).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }
}
