use anyhow::Result;
use std::path::Path;
use tantivy::{Index, IndexWriter, TantivyDocument};
use tracing::info;

use libris_core::types::Document;

use crate::search::TantivyLexicalIndex;
use crate::tantivy_utils::{build_schema, register_tokenizer, LibraryFields};

/// Builds the lexical index from catalog documents.
pub struct LibraryIndexer {
	index: Index,
	fields: LibraryFields,
}

impl LibraryIndexer {
	/// Creates a fresh on-disk index, wiping whatever was at `index_dir`.
	pub fn create(index_dir: &Path) -> Result<Self> {
		if index_dir.exists() { std::fs::remove_dir_all(index_dir)?; }
		std::fs::create_dir_all(index_dir)?;
		Self::from_index(Index::create_in_dir(index_dir, build_schema())?)
	}

	pub fn create_in_ram() -> Result<Self> { Self::from_index(Index::create_in_ram(build_schema())) }

	fn from_index(index: Index) -> Result<Self> {
		register_tokenizer(&index);
		let fields = LibraryFields::from_schema(&index.schema())?;
		Ok(Self { index, fields })
	}

	pub fn add_documents(&self, docs: &[Document]) -> Result<usize> {
		let mut index_writer: IndexWriter = self.index.writer_with_num_threads(1, 50_000_000)?;
		for d in docs {
			index_writer.add_document(self.to_tantivy(d))?;
		}
		index_writer.commit()?;
		info!(count = docs.len(), "indexed documents");
		Ok(docs.len())
	}

	fn to_tantivy(&self, d: &Document) -> TantivyDocument {
		let f = &self.fields;
		let mut doc = TantivyDocument::default();
		doc.add_i64(f.id, d.id);
		doc.add_text(f.title, &d.title);
		doc.add_text(f.author, &d.author);
		doc.add_text(f.content, &d.body);
		if let Some(index_text) = d.index_text.as_deref().filter(|t| !t.is_empty()) { doc.add_text(f.index_content, index_text); }
		if let Some(year) = d.year { doc.add_i64(f.year, year); }
		if let Some(publisher) = &d.publisher { doc.add_text(f.publisher, publisher); }
		if let Some(summary) = &d.summary { doc.add_text(f.summary, summary); }
		if let Some(path) = &d.path { doc.add_text(f.path, path); }
		doc
	}

	/// Hands the committed index over to the query side.
	pub fn into_search(self) -> Result<TantivyLexicalIndex> { TantivyLexicalIndex::from_index(self.index) }
}
