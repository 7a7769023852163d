use anyhow::{anyhow, Result};
use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

use libris_core::settings::EmbeddingSettings;
use libris_core::traits::Embedder;

pub struct HttpEmbedder {
    client: Client,
    settings: EmbeddingSettings,
}

impl HttpEmbedder {
    pub fn new(settings: EmbeddingSettings) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_millis(settings.timeout_ms)).build()?;
        Ok(Self { client, settings })
    }

    async fn request(&self, text: &str) -> Result<Vec<f32>> {
        let input: String = text.chars().take(self.settings.max_input_chars).collect();
        let url = format!("{}{}", self.settings.api_base, self.settings.path);
        let body = serde_json::json!({
            "model": self.settings.model,
            "input": [input],
            "dimensions": self.settings.dimensions,
        });
        let mut req = self.client.post(url).json(&body);
        if !self.settings.api_key.is_empty() { req = req.bearer_auth(&self.settings.api_key); }
        let json: Value = req.send().await?.error_for_status()?.json().await?;
        let vector = parse_embedding_response(json)?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Embedding response is empty."))?;
        if vector.len() != self.settings.dimensions {
            warn!(expected = self.settings.dimensions, got = vector.len(), "embedding dimension differs from configuration");
        }
        Ok(vector)
    }
}

impl Embedder for HttpEmbedder {
    fn dim(&self) -> usize { self.settings.dimensions }

    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>>> { self.request(text).boxed() }
}

/// Vectors of an OpenAI-style `{"data": [{"index", "embedding"}]}` reply, in
/// `index` order.
pub fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow!("Embedding response is missing data array."))?;

    let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());
    for (fallback_index, item) in data.iter().enumerate() {
        let index = item.get("index").and_then(|v| v.as_u64()).map(|v| v as usize).unwrap_or(fallback_index);
        let embedding = item
            .get("embedding")
            .and_then(|v| v.as_array())
            .ok_or_else(|| anyhow!("Embedding item missing embedding array."))?;
        let vec = embedding
            .iter()
            .map(|value| value.as_f64().map(|n| n as f32).ok_or_else(|| anyhow!("Embedding value must be numeric.")))
            .collect::<Result<Vec<f32>>>()?;
        indexed.push((index, vec));
    }
    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}
