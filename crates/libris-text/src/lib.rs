//! libris-text
//!
//! Tantivy-backed lexical index over titles, authors, bodies and back-of-book
//! indexes. `LibraryIndexer` builds the index, `TantivyLexicalIndex` answers
//! ranked, field-restricted queries with highlighted snippets, doubles as the
//! document catalog through its stored fields and finds passages inside one book.
pub mod tantivy_utils;
pub mod index;
pub mod matches;
pub mod search;

pub use index::LibraryIndexer;
pub use search::{query_tokens, TantivyLexicalIndex};
pub use tantivy_utils::LibraryFields;
