use anyhow::{anyhow, Result};
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::fmt::Write as _;

use libris_core::traits::Reranker;
use libris_core::types::{RerankCandidate, RerankJudgement};

use crate::client::ChatClient;

const SUMMARY_PREVIEW_CHARS: usize = 200;

pub fn rerank_prompt(query: &str, candidates: &[RerankCandidate]) -> String {
    let mut prompt = format!(
        "You are a strict mathematics librarian. Rank the following book candidates for the search query: '{query}'.\n\
         Exclude irrelevant books. Focus on mathematical depth and relevance.\n\nCandidates:\n"
    );
    for c in candidates {
        let mut line = format!("Title: {} | Author: {}", c.title, c.author);
        if let Some(snippet) = c.snippet.as_deref().filter(|s| !s.is_empty()) {
            let _ = write!(line, " | Snippet: {snippet}");
        } else if let Some(summary) = c.summary.as_deref().filter(|s| !s.is_empty()) {
            let preview: String = summary.chars().take(SUMMARY_PREVIEW_CHARS).collect();
            let _ = write!(line, " | Summary: {preview}");
        }
        let _ = writeln!(prompt, "[ID {}] {}", c.id, line);
    }
    let _ = write!(
        prompt,
        "\nReturn ONLY a JSON list of objects for the top {} results, e.g. \
         [{{\"id\": 15, \"reason\": \"Detailed treatment of topic X\"}}, {{\"id\": 2, \"reason\": \"Standard reference for Y\"}}].",
        candidates.len()
    );
    prompt
}

/// Judgements from a model reply: either a bare array or an object wrapping
/// one under `results`/`ranking`. Entries without a usable id are skipped.
pub fn parse_judgements(json: &Value) -> Result<Vec<RerankJudgement>> {
    let items = json
        .as_array()
        .or_else(|| json.get("results").and_then(Value::as_array))
        .or_else(|| json.get("ranking").and_then(Value::as_array))
        .ok_or_else(|| anyhow!("Rerank reply is not a list."))?;

    Ok(items
        .iter()
        .filter_map(|item| {
            let id = item.get("id").and_then(|v| v.as_i64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok())))?;
            let reason = item.get("reason").and_then(Value::as_str).unwrap_or_default().to_string();
            Some(RerankJudgement { id, reason })
        })
        .collect())
}

pub struct LlmReranker {
    client: ChatClient,
}

impl LlmReranker {
    pub fn new(client: ChatClient) -> Self { Self { client } }

    async fn run(&self, query: &str, candidates: &[RerankCandidate]) -> Result<Vec<RerankJudgement>> {
        let reply = self.client.complete_json(&rerank_prompt(query, candidates)).await?;
        parse_judgements(&reply)
    }
}

impl Reranker for LlmReranker {
    fn rerank<'a>(&'a self, query: &'a str, candidates: &'a [RerankCandidate]) -> BoxFuture<'a, Result<Vec<RerankJudgement>>> {
        self.run(query, candidates).boxed()
    }
}
