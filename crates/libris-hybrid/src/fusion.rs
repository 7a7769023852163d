//! Candidate merging and ordering.
//!
//! Semantic hits enter first with their cosine score. A lexical hit for a
//! document already in the pool is fused as
//! `existing * vector_weight + lexical * lexical_weight` and the candidate
//! becomes `Both`; otherwise it enters as `Text` with its rank score. Index
//! matches add a flat boost afterwards. The final sort is stable, so equal
//! scores keep insertion order: semantic order first, then lexical order.

use std::collections::HashMap;

use libris_core::settings::SearchSettings;
use libris_core::types::{DocId, RetrievalMode, SemanticHit};

use crate::lexical::ScoredLexicalHit;

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: DocId,
    pub score: f32,
    pub mode: RetrievalMode,
    pub snippet: Option<String>,
    pub index_matches: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub vector: f32,
    pub lexical: f32,
}

impl From<&SearchSettings> for FusionWeights {
    fn from(s: &SearchSettings) -> Self { Self { vector: s.vector_weight, lexical: s.lexical_weight } }
}

/// Per-query candidate set keyed by document id, in insertion order.
#[derive(Debug)]
pub struct CandidatePool {
    weights: FusionWeights,
    slots: HashMap<DocId, usize>,
    candidates: Vec<Candidate>,
}

impl CandidatePool {
    pub fn new(weights: FusionWeights) -> Self {
        Self { weights, slots: HashMap::new(), candidates: Vec::new() }
    }

    pub fn len(&self) -> usize { self.candidates.len() }

    pub fn is_empty(&self) -> bool { self.candidates.is_empty() }

    pub fn ids(&self) -> Vec<DocId> { self.candidates.iter().map(|c| c.id).collect() }

    pub fn get(&self, id: DocId) -> Option<&Candidate> { self.slots.get(&id).map(|&i| &self.candidates[i]) }

    pub fn add_semantic(&mut self, hits: impl IntoIterator<Item = SemanticHit>) {
        for hit in hits {
            if self.slots.contains_key(&hit.id) { continue; }
            self.push(Candidate { id: hit.id, score: hit.score, mode: RetrievalMode::Vector, snippet: None, index_matches: None });
        }
    }

    pub fn add_lexical(&mut self, hits: impl IntoIterator<Item = ScoredLexicalHit>) {
        for hit in hits {
            match self.slots.get(&hit.id).copied() {
                Some(i) => {
                    let existing = &mut self.candidates[i];
                    // a second lexical hit for the same id is ignored
                    if existing.mode != RetrievalMode::Vector { continue; }
                    existing.score = existing.score * self.weights.vector + hit.score * self.weights.lexical;
                    existing.mode = RetrievalMode::Both;
                    existing.snippet = hit.snippet;
                }
                None => self.push(Candidate {
                    id: hit.id,
                    score: hit.score,
                    mode: RetrievalMode::Text,
                    snippet: hit.snippet,
                    index_matches: None,
                }),
            }
        }
    }

    /// Attaches index page references and adds `boost` to every candidate
    /// `pages_for` returns a match for. Never adds candidates.
    pub fn apply_index_matches(&mut self, boost: f32, mut pages_for: impl FnMut(DocId) -> Option<String>) -> usize {
        let mut boosted = 0;
        for c in &mut self.candidates {
            if let Some(pages) = pages_for(c.id) {
                c.score += boost;
                c.index_matches = Some(pages);
                boosted += 1;
            }
        }
        boosted
    }

    /// Candidates by descending score, ties in insertion order.
    pub fn into_ranked(self) -> Vec<Candidate> {
        let mut ranked = self.candidates;
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }

    fn push(&mut self, candidate: Candidate) {
        self.slots.insert(candidate.id, self.candidates.len());
        self.candidates.push(candidate);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Size of the whole ranked list, independent of `offset` and `limit`.
    pub total_count: usize,
}

pub fn paginate<T>(ranked: Vec<T>, offset: usize, limit: usize) -> Page<T> {
    let total_count = ranked.len();
    let items = ranked.into_iter().skip(offset).take(limit).collect();
    Page { items, total_count }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEIGHTS: FusionWeights = FusionWeights { vector: 0.6, lexical: 0.4 };

    fn lex(id: DocId, score: f32) -> ScoredLexicalHit {
        ScoredLexicalHit { id, score, snippet: Some(format!("<b>{id}</b>")) }
    }

    #[test]
    fn overlapping_hits_are_fused() {
        let mut pool = CandidatePool::new(WEIGHTS);
        pool.add_semantic([SemanticHit { id: 1, score: 0.8 }]);
        pool.add_lexical([lex(2, 1.0), lex(1, 0.5)]);
        let c = pool.get(1).expect("present");
        assert!((c.score - 0.68).abs() < 1e-6);
        assert_eq!(c.mode, RetrievalMode::Both);
        assert_eq!(c.snippet.as_deref(), Some("<b>1</b>"));
        assert_eq!(pool.get(2).expect("present").mode, RetrievalMode::Text);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn duplicates_within_a_mode_keep_the_first() {
        let mut pool = CandidatePool::new(WEIGHTS);
        pool.add_semantic([SemanticHit { id: 1, score: 0.9 }, SemanticHit { id: 1, score: 0.3 }]);
        pool.add_lexical([lex(1, 1.0), lex(1, 0.1)]);
        let c = pool.get(1).expect("present");
        assert!((c.score - (0.9 * 0.6 + 0.4)).abs() < 1e-6);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut pool = CandidatePool::new(WEIGHTS);
        pool.add_semantic([SemanticHit { id: 5, score: 0.5 }, SemanticHit { id: 3, score: 0.9 }]);
        pool.add_lexical([lex(8, 0.5), lex(4, 0.5)]);
        let order: Vec<DocId> = pool.into_ranked().iter().map(|c| c.id).collect();
        assert_eq!(order, vec![3, 5, 8, 4]);
    }

    #[test]
    fn index_boost_only_touches_existing_candidates() {
        let mut pool = CandidatePool::new(WEIGHTS);
        pool.add_lexical([lex(1, 1.0), lex(2, 0.6)]);
        let boosted = pool.apply_index_matches(0.5, |id| (id == 2 || id == 99).then(|| "12".to_string()));
        assert_eq!(boosted, 1);
        let ranked = pool.into_ranked();
        assert_eq!(ranked[0].id, 2);
        assert!((ranked[0].score - 1.1).abs() < 1e-6);
        assert_eq!(ranked[0].index_matches.as_deref(), Some("12"));
        assert!(ranked.iter().all(|c| c.id != 99));
    }

    #[test]
    fn pagination_reports_the_full_count() {
        let ranked: Vec<u32> = (0..35).collect();
        let first = paginate(ranked.clone(), 0, 20);
        let second = paginate(ranked.clone(), 20, 20);
        assert_eq!((first.items.len(), second.items.len()), (20, 15));
        assert_eq!([first.items, second.items].concat(), ranked);
        let past = paginate(ranked, 40, 20);
        assert!(past.items.is_empty());
        assert_eq!(past.total_count, 35);
    }
}
