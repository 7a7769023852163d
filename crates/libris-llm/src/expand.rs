use anyhow::{anyhow, Result};
use futures::future::{BoxFuture, FutureExt};

use libris_core::traits::QueryExpander;

use crate::client::ChatClient;

pub fn expansion_prompt(query: &str) -> String {
    format!(
        "You are a mathematical search expert. Translate this query to English if it's in another language, \
         and add 3-5 relevant mathematical keywords or synonyms to improve search recall. \
         Return ONLY the expanded query text.\nQuery: {query}"
    )
}

pub struct LlmQueryExpander {
    client: ChatClient,
}

impl LlmQueryExpander {
    pub fn new(client: ChatClient) -> Self { Self { client } }

    async fn run(&self, query: &str) -> Result<String> {
        let text = self.client.complete(&expansion_prompt(query)).await?;
        let expanded = text.trim().trim_matches('"').trim();
        if expanded.is_empty() {
            return Err(anyhow!("expansion came back empty"));
        }
        Ok(expanded.to_string())
    }
}

impl QueryExpander for LlmQueryExpander {
    fn expand<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<String>> { self.run(query).boxed() }
}
