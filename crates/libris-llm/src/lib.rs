//! Reasoning service client (OpenAI-compatible chat completions) and the two
//! prompts the search pipeline needs: query expansion and page reranking.

pub mod client;
pub mod expand;
pub mod rerank;

pub use client::ChatClient;
pub use expand::LlmQueryExpander;
pub use rerank::{parse_judgements, LlmReranker};
