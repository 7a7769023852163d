use anyhow::Result;
use regex::Regex;
use std::collections::HashSet;
use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;
use tantivy::collector::TopDocs;
use tantivy::query::{Query, QueryParser, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Value};
use tantivy::snippet::SnippetGenerator;
use tantivy::tokenizer::TokenStream;
use tantivy::{Index, IndexReader, ReloadPolicy, Searcher, TantivyDocument, Term};
use tracing::{debug, warn};

use libris_core::config::resolve_with_base;
use libris_core::settings::DataSettings;
use libris_core::traits::{BookMatcher, Catalog, LexicalIndex};
use libris_core::types::{BookMatch, DocId, Document, FieldSelector, LexicalHit};

use crate::matches::{collect_matches, highlight, outside_page_markers};
use crate::tantivy_utils::{register_tokenizer, LibraryFields};

const SNIPPET_MAX_CHARS: usize = 150;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("static regex"));

/// Lower-cased word tokens of a free-text query. Quotes, operators and other
/// punctuation never reach the query parser.
pub fn query_tokens(query: &str) -> Vec<String> {
	WORD.find_iter(&query.to_lowercase()).map(|m| m.as_str().to_string()).collect()
}

pub struct TantivyLexicalIndex {
	index: Index,
	reader: IndexReader,
	fields: LibraryFields,
}

impl TantivyLexicalIndex {
	pub fn open(index_dir: &Path) -> Result<Self> {
		let index = Index::open_in_dir(index_dir)?;
		register_tokenizer(&index);
		Self::from_index(index)
	}

	/// Opens the configured index; a relative `tantivy_index_dir` is taken from `base`.
	pub fn from_settings(data: &DataSettings, base: &Path) -> Result<Self> {
		Self::open(&resolve_with_base(base, &data.tantivy_index_dir))
	}

	pub(crate) fn from_index(index: Index) -> Result<Self> {
		let reader = index.reader_builder().reload_policy(ReloadPolicy::OnCommitWithDelay).try_into()?;
		let fields = LibraryFields::from_schema(&index.schema())?;
		Ok(Self { index, reader, fields })
	}

	pub fn num_docs(&self) -> u64 { self.reader.searcher().num_docs() }

	fn target_fields(&self, field: FieldSelector) -> Vec<Field> {
		let f = &self.fields;
		match field {
			FieldSelector::Title => vec![f.title],
			FieldSelector::Author => vec![f.author],
			FieldSelector::Index => vec![f.index_content],
			FieldSelector::All => vec![f.title, f.author, f.content, f.index_content],
		}
	}

	fn snippet_field(&self, field: FieldSelector) -> Field {
		match field {
			FieldSelector::Title => self.fields.title,
			FieldSelector::Author => self.fields.author,
			FieldSelector::Index => self.fields.index_content,
			FieldSelector::All => self.fields.content,
		}
	}

	/// OR-joined tokens for recall; falls back to the plain token list if the
	/// parser rejects the OR form.
	fn parse(&self, field: FieldSelector, tokens: &[String]) -> Result<Box<dyn Query>> {
		let parser = QueryParser::for_index(&self.index, self.target_fields(field));
		match parser.parse_query(&tokens.join(" OR ")) {
			Ok(q) => Ok(q),
			Err(e) => {
				warn!(error = %e, "OR query rejected, retrying with plain terms");
				Ok(parser.parse_query(&tokens.join(" "))?)
			}
		}
	}

	/// Generator for the field the snippet is cut from, plus the title fallback
	/// used when an all-fields match did not touch the body.
	fn snippet_generators(&self, searcher: &Searcher, query: &dyn Query, field: FieldSelector) -> Result<(SnippetGenerator, Option<SnippetGenerator>)> {
		let mut primary = SnippetGenerator::create(searcher, query, self.snippet_field(field))?;
		primary.set_max_num_chars(SNIPPET_MAX_CHARS);
		let fallback = if field == FieldSelector::All { Some(SnippetGenerator::create(searcher, query, self.fields.title)?) } else { None };
		Ok((primary, fallback))
	}

	fn stored_document(&self, searcher: &Searcher, id: DocId) -> Result<Option<TantivyDocument>> {
		let q = TermQuery::new(Term::from_field_i64(self.fields.id, id), IndexRecordOption::Basic);
		let Some((_, addr)) = searcher.search(&q, &TopDocs::with_limit(1))?.into_iter().next() else { return Ok(None) };
		Ok(Some(searcher.doc(addr)?))
	}

	/// Analyzed tokens of `text` as `field` would index them, with their byte
	/// ranges in `text`.
	fn analyze(&self, field: Field, text: &str) -> Result<Vec<(String, Range<usize>)>> {
		let mut analyzer = self.index.tokenizer_for_field(field)?;
		let mut stream = analyzer.token_stream(text);
		let mut tokens = Vec::new();
		while stream.advance() {
			let token = stream.token();
			tokens.push((token.text.clone(), token.offset_from..token.offset_to));
		}
		Ok(tokens)
	}

	fn term_hits(&self, field: Field, text: &str, terms: &HashSet<String>) -> Result<Vec<Range<usize>>> {
		Ok(self.analyze(field, text)?.into_iter().filter(|(t, _)| terms.contains(t)).map(|(_, r)| r).collect())
	}

	fn read_document(&self, doc: &TantivyDocument) -> Option<Document> {
		let f = &self.fields;
		let text = |field: Field| doc.get_first(field).and_then(|v| v.as_str()).map(str::to_string);
		let id = doc.get_first(f.id).and_then(|v| v.as_i64())?;
		Some(Document {
			id,
			title: text(f.title).unwrap_or_default(),
			author: text(f.author).unwrap_or_default(),
			body: String::new(),
			index_text: text(f.index_content),
			embedding: None,
			year: doc.get_first(f.year).and_then(|v| v.as_i64()),
			publisher: text(f.publisher),
			summary: text(f.summary),
			path: text(f.path),
		})
	}
}

impl LexicalIndex for TantivyLexicalIndex {
	fn search(&self, query: &str, field: FieldSelector, limit: usize) -> Result<Vec<LexicalHit>> {
		let tokens = query_tokens(query);
		if tokens.is_empty() || limit == 0 { return Ok(Vec::new()); }
		let searcher = self.reader.searcher();
		let parsed = self.parse(field, &tokens)?;
		let top_docs = searcher.search(&*parsed, &TopDocs::with_limit(limit))?;
		let (primary, fallback) = self.snippet_generators(&searcher, &*parsed, field)?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (_score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr)?;
			let Some(id) = doc.get_first(self.fields.id).and_then(|v| v.as_i64()) else { continue };
			let mut html = primary.snippet_from_doc(&doc).to_html();
			if html.is_empty() {
				if let Some(title) = &fallback { html = title.snippet_from_doc(&doc).to_html(); }
			}
			let snippet = if html.is_empty() { None } else { Some(html) };
			hits.push(LexicalHit { id, rank: hits.len(), snippet });
		}
		debug!(query, ?field, hits = hits.len(), "lexical search");
		Ok(hits)
	}
}

impl Catalog for TantivyLexicalIndex {
	fn fetch(&self, ids: &[DocId]) -> Result<Vec<Document>> {
		let searcher = self.reader.searcher();
		let mut docs = Vec::with_capacity(ids.len());
		for &id in ids {
			let Some(doc) = self.stored_document(&searcher, id)? else { continue };
			docs.extend(self.read_document(&doc));
		}
		Ok(docs)
	}
}

impl BookMatcher for TantivyLexicalIndex {
	fn matches(&self, id: DocId, query: &str) -> Result<Vec<BookMatch>> {
		let f = self.fields;
		let terms: HashSet<String> = self.analyze(f.content, query)?.into_iter().map(|(t, _)| t).collect();
		if terms.is_empty() { return Ok(Vec::new()); }
		let searcher = self.reader.searcher();
		let Some(doc) = self.stored_document(&searcher, id)? else {
			debug!(id, "no such document for in-book matches");
			return Ok(Vec::new());
		};
		let body = stored_text(&doc, f.content);
		let index = stored_text(&doc, f.index_content);
		let body_hits = outside_page_markers(body, self.term_hits(f.content, body, &terms)?);
		let index_hits = self.term_hits(f.index_content, index, &terms)?;
		let found = collect_matches(&highlight(body, &body_hits), &highlight(index, &index_hits));
		debug!(id, query, body_hits = body_hits.len(), index_hits = index_hits.len(), found = found.len(), "in-book matches");
		Ok(found)
	}
}

fn stored_text(doc: &TantivyDocument, field: Field) -> &str {
	doc.get_first(field).and_then(|v| v.as_str()).unwrap_or_default()
}
