//! Embedding service clients.
//!
//! `HttpEmbedder` talks to an OpenAI-compatible `/embeddings` endpoint.
//! `HashEmbedder` is a deterministic stand-in for offline development and tests;
//! `get_default_embedder` picks it when `APP_USE_FAKE_EMBEDDINGS=1`.

pub mod hashing;
pub mod http;

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use libris_core::settings::EmbeddingSettings;
use libris_core::traits::Embedder;

pub use hashing::HashEmbedder;
pub use http::HttpEmbedder;

pub fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    if use_fake_embeddings() {
        info!(dim = settings.dimensions, "using hashing embedder");
        return Ok(Arc::new(HashEmbedder::new(settings.dimensions)));
    }
    Ok(Arc::new(HttpEmbedder::new(settings.clone())?))
}
