use std::collections::HashMap;

use libris_core::types::{DocId, RankedResult, RerankCandidate, RerankJudgement};

pub fn rerank_candidates(page: &[RankedResult]) -> Vec<RerankCandidate> {
    page.iter()
        .map(|r| RerankCandidate {
            id: r.id,
            title: r.title.clone(),
            author: r.author.clone(),
            snippet: r.snippet.clone(),
            summary: r.summary.clone(),
        })
        .collect()
}

/// Reorders `page` by the service's judgements.
///
/// Judged results come first, in judgement order, with a 1-based `ai_rank`
/// and the stated reason. Ids outside the page and repeated ids are ignored.
/// Results the service left out follow in their fused order, unannotated.
pub fn merge_judgements(page: Vec<RankedResult>, judgements: &[RerankJudgement]) -> Vec<RankedResult> {
    let position: HashMap<DocId, usize> = page.iter().enumerate().map(|(i, r)| (r.id, i)).collect();
    let mut slots: Vec<Option<RankedResult>> = page.into_iter().map(Some).collect();
    let mut merged = Vec::with_capacity(slots.len());
    for judgement in judgements {
        let Some(&i) = position.get(&judgement.id) else { continue };
        if let Some(mut result) = slots[i].take() {
            result.ai_rank = Some(merged.len() + 1);
            result.ai_reason = Some(judgement.reason.clone());
            merged.push(result);
        }
    }
    merged.extend(slots.into_iter().flatten());
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_core::types::RetrievalMode;

    fn result(id: DocId) -> RankedResult {
        RankedResult {
            id,
            title: format!("Book {id}"),
            author: "Anon".into(),
            year: None,
            publisher: None,
            summary: Some("about things".into()),
            path: None,
            score: 1.0 / id as f32,
            mode: RetrievalMode::Text,
            snippet: None,
            index_matches: None,
            ai_rank: None,
            ai_reason: None,
        }
    }

    fn judged(id: DocId, reason: &str) -> RerankJudgement { RerankJudgement { id, reason: reason.into() } }

    #[test]
    fn judged_results_lead_and_omitted_ones_follow() {
        let page = vec![result(1), result(2), result(3), result(4)];
        let merged = merge_judgements(page, &[judged(3, "exact topic"), judged(1, "related")]);
        let ids: Vec<DocId> = merged.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1, 2, 4]);
        assert_eq!(merged[0].ai_rank, Some(1));
        assert_eq!(merged[0].ai_reason.as_deref(), Some("exact topic"));
        assert_eq!(merged[1].ai_rank, Some(2));
        assert!(merged[2].ai_rank.is_none() && merged[3].ai_reason.is_none());
    }

    #[test]
    fn unknown_and_repeated_ids_are_ignored() {
        let page = vec![result(1), result(2)];
        let merged = merge_judgements(page, &[judged(9, "?"), judged(2, "a"), judged(2, "b")]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, 2);
        assert_eq!(merged[0].ai_reason.as_deref(), Some("a"));
        assert_eq!(merged[1].id, 1);
    }

    #[test]
    fn candidates_mirror_the_page() {
        let c = rerank_candidates(&[result(5)]);
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].title, "Book 5");
        assert_eq!(c[0].summary.as_deref(), Some("about things"));
    }
}
