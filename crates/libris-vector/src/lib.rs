//! Semantic retrieval: exact cosine top-K over every stored vector, plus a
//! LanceDB-backed vector store.
//!
//! The store only hands out `(id, vector)` pairs; dimension checks, the
//! acceptance floor and the zero-norm guard all happen in `search`.

pub mod schema;
pub mod search;
pub mod store;
pub mod table;

pub use search::{cosine_similarity, top_k, SelectionParams, SemanticRetriever};
pub use store::LanceVectorStore;
