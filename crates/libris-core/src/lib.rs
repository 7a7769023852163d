//! Shared vocabulary of the libris workspace: the document/query/result model,
//! the collaborator traits the retrieval engine consumes, the error taxonomy and
//! configuration loading.

pub mod config;
pub mod error;
pub mod memory;
pub mod settings;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
