//! In-memory library backing `Catalog` and `VectorStore`.
//!
//! Used for development fixtures and tests; production stores live in
//! `libris-text` (catalog) and `libris-vector` (vectors).

use anyhow::Result;
use futures::future::{self, BoxFuture, FutureExt};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::traits::{Catalog, VectorStore};
use crate::types::{DocId, Document};

#[derive(Debug, Clone, Default)]
pub struct InMemoryLibrary {
    docs: BTreeMap<DocId, Document>,
}

impl InMemoryLibrary {
    pub fn new() -> Self { Self::default() }

    pub fn from_documents(docs: impl IntoIterator<Item = Document>) -> Self {
        let mut lib = Self::new();
        for d in docs { lib.insert(d); }
        lib
    }

    /// Load a JSON array of documents.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => String::from_utf8_lossy(&fs::read(path)?).to_string(),
        };
        let docs: Vec<Document> = serde_json::from_str(&raw)?;
        Ok(Self::from_documents(docs))
    }

    /// Inserts or replaces the document with the same id.
    pub fn insert(&mut self, doc: Document) -> Option<Document> { self.docs.insert(doc.id, doc) }

    pub fn get(&self, id: DocId) -> Option<&Document> { self.docs.get(&id) }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }
}

impl Catalog for InMemoryLibrary {
    fn fetch(&self, ids: &[DocId]) -> Result<Vec<Document>> {
        Ok(ids.iter().filter_map(|id| self.docs.get(id)).cloned().collect())
    }
}

impl VectorStore for InMemoryLibrary {
    fn load_vectors(&self) -> BoxFuture<'_, Result<Vec<(DocId, Vec<f32>)>>> {
        let rows = self
            .docs
            .values()
            .filter_map(|d| d.embedding.as_ref().map(|v| (d.id, v.clone())))
            .collect();
        future::ready(Ok(rows)).boxed()
    }
}
