//! Hybrid retrieval and ranking.
//!
//! Lexical and semantic candidates are merged by document id, boosted by
//! back-of-book index hits, sorted, paginated, and optionally reordered by an
//! external reasoning service one page at a time. See `engine` for the
//! pipeline and `fusion` for the ordering rules.

pub mod booster;
pub mod cache;
pub mod engine;
pub mod fusion;
pub mod gate;
pub mod lexical;
pub mod preprocess;
pub mod rerank;

pub use engine::{EngineBuilder, HybridSearchEngine};
pub use fusion::{Candidate, CandidatePool, FusionWeights};
