use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, FAST, INDEXED, STORED};
use tantivy::tokenizer::{AsciiFoldingFilter, Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, StopWordFilter, TextAnalyzer};
use tantivy::Index;

pub const ANALYZER: &str = "libris_en";

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	schema_builder.add_i64_field("id", INDEXED | STORED | FAST);
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(ANALYZER).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let text_options = TextOptions::default().set_indexing_options(text_field_indexing).set_stored();
	schema_builder.add_text_field("title", text_options.clone());
	schema_builder.add_text_field("author", text_options.clone());
	schema_builder.add_text_field("content", text_options.clone());
	schema_builder.add_text_field("index_content", text_options);
	schema_builder.add_i64_field("year", STORED);
	schema_builder.add_text_field("publisher", STORED);
	schema_builder.add_text_field("summary", STORED);
	schema_builder.add_text_field("path", STORED);
	schema_builder.build()
}

/// English analyzer: lower-cased, diacritics folded, stop words removed, stemmed.
pub fn register_tokenizer(index: &Index) {
	let stop_words = vec![
		"a","an","and","are","as","at","be","by","for","from","has","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","there","then","than","so","if","when","where","how","what","which","who",
	];
	let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(RemoveLongFilter::limit(40))
		.filter(LowerCaser)
		.filter(AsciiFoldingFilter)
		.filter(StopWordFilter::remove(stop_words.into_iter().map(|s| s.to_string())))
		.filter(Stemmer::new(Language::English))
		.build();
	index.tokenizers().register(ANALYZER, tokenizer);
}

#[derive(Debug, Clone, Copy)]
pub struct LibraryFields {
	pub id: Field,
	pub title: Field,
	pub author: Field,
	pub content: Field,
	pub index_content: Field,
	pub year: Field,
	pub publisher: Field,
	pub summary: Field,
	pub path: Field,
}

impl LibraryFields {
	pub fn from_schema(schema: &Schema) -> tantivy::Result<Self> {
		Ok(Self {
			id: schema.get_field("id")?,
			title: schema.get_field("title")?,
			author: schema.get_field("author")?,
			content: schema.get_field("content")?,
			index_content: schema.get_field("index_content")?,
			year: schema.get_field("year")?,
			publisher: schema.get_field("publisher")?,
			summary: schema.get_field("summary")?,
			path: schema.get_field("path")?,
		})
	}
}
