use tempfile::TempDir;

use libris_core::settings::DataSettings;
use libris_core::traits::{BookMatcher, Catalog, LexicalIndex};
use libris_core::types::{Document, FieldSelector, MatchPage};
use libris_text::{query_tokens, LibraryIndexer, TantivyLexicalIndex};

fn library() -> Vec<Document> {
    vec![
        Document {
            id: 1,
            title: "Principles of Mathematical Analysis".into(),
            author: "Walter Rudin".into(),
            body: "Metric spaces, compactness and the Riemann-Stieltjes integral.".into(),
            index_text: Some("Metric spaces, 30, 32-35\nCompact set, 36".into()),
            year: Some(1976),
            publisher: Some("McGraw-Hill".into()),
            ..Document::default()
        },
        Document {
            id: 2,
            title: "Topology".into(),
            author: "James Munkres".into(),
            body: "Topological spaces, connectedness, compactness, metrization theorems.".into(),
            summary: Some("Standard first course in point-set topology.".into()),
            ..Document::default()
        },
        Document {
            id: 3,
            title: "Linear Algebra Done Right".into(),
            author: "Sheldon Axler".into(),
            body: "Vector spaces and linear maps without determinants.".into(),
            ..Document::default()
        },
    ]
}

fn in_ram() -> TantivyLexicalIndex {
    let indexer = LibraryIndexer::create_in_ram().expect("indexer");
    indexer.add_documents(&library()).expect("index");
    indexer.into_search().expect("search")
}

#[test]
fn tokens_drop_punctuation_and_case() {
    assert_eq!(query_tokens("\"Metric\" spaces!"), vec!["metric", "spaces"]);
    assert!(query_tokens("?! --").is_empty());
}

#[test]
fn all_fields_search_ranks_and_highlights() {
    let index = in_ram();
    let hits = index.search("compactness", FieldSelector::All, 10).expect("search");
    let ids: Vec<i64> = hits.iter().map(|h| h.id).collect();
    assert!(ids.contains(&1) && ids.contains(&2));
    assert!(!ids.contains(&3));
    for (i, h) in hits.iter().enumerate() { assert_eq!(h.rank, i); }
    assert!(hits.iter().all(|h| h.snippet.as_deref().is_some_and(|s| s.contains("<b>"))));
}

#[test]
fn field_selector_restricts_matching() {
    let index = in_ram();
    let by_author = index.search("rudin", FieldSelector::Author, 10).expect("author");
    assert_eq!(by_author.iter().map(|h| h.id).collect::<Vec<_>>(), vec![1]);
    let by_title = index.search("rudin", FieldSelector::Title, 10).expect("title");
    assert!(by_title.is_empty());

    let by_index = index.search("metric spaces", FieldSelector::Index, 10).expect("index");
    assert_eq!(by_index.len(), 1);
    let snippet = by_index[0].snippet.clone().unwrap_or_default();
    assert!(snippet.contains("<b>"), "snippet cut from the index text: {snippet}");
}

#[test]
fn limit_and_empty_queries() {
    let index = in_ram();
    assert_eq!(index.search("spaces", FieldSelector::All, 1).expect("limited").len(), 1);
    assert!(index.search("...", FieldSelector::All, 10).expect("punctuation").is_empty());
    assert!(index.search("spaces", FieldSelector::All, 0).expect("zero").is_empty());
}

#[test]
fn catalog_returns_stored_metadata() {
    let index = in_ram();
    let docs = index.fetch(&[2, 1, 42]).expect("fetch");
    assert_eq!(docs.len(), 2);
    let rudin = docs.iter().find(|d| d.id == 1).expect("rudin");
    assert_eq!(rudin.year, Some(1976));
    assert_eq!(rudin.publisher.as_deref(), Some("McGraw-Hill"));
    assert_eq!(rudin.index_text.as_deref(), Some("Metric spaces, 30, 32-35\nCompact set, 36"));
    let munkres = docs.iter().find(|d| d.id == 2).expect("munkres");
    assert!(munkres.index_text.is_none());
    assert_eq!(munkres.summary.as_deref(), Some("Standard first course in point-set topology."));
}

#[test]
fn on_disk_index_reopens() {
    let tmp = TempDir::new().expect("tempdir");
    let dir = tmp.path().join("tantivy");
    let indexer = LibraryIndexer::create(&dir).expect("create");
    assert_eq!(indexer.add_documents(&library()).expect("index"), 3);
    drop(indexer);

    let index = TantivyLexicalIndex::open(&dir).expect("open");
    assert_eq!(index.num_docs(), 3);
    let hits = index.search("axler", FieldSelector::All, 5).expect("search");
    assert_eq!(hits.first().map(|h| h.id), Some(3));
}

#[test]
fn configured_index_opens_relative_to_the_base() {
    let tmp = TempDir::new().expect("tempdir");
    let indexer = LibraryIndexer::create(&tmp.path().join("indexes/tantivy")).expect("create");
    indexer.add_documents(&library()).expect("index");
    drop(indexer);

    let data = DataSettings { tantivy_index_dir: "indexes/tantivy".into(), ..DataSettings::default() };
    let index = TantivyLexicalIndex::from_settings(&data, tmp.path()).expect("open");
    assert_eq!(index.num_docs(), 3);
}

fn paged_book() -> TantivyLexicalIndex {
    let indexer = LibraryIndexer::create_in_ram().expect("indexer");
    indexer
        .add_documents(&[
            Document {
                id: 7,
                title: "Real Analysis".into(),
                author: "H. L. Royden".into(),
                body: "[[PAGE_1]] Intro text. [[PAGE_2]] Compact sets are closed. [[PAGE_3]] Every compact metric space is complete.".into(),
                index_text: Some("Compact set, 36".into()),
                ..Document::default()
            },
            Document { id: 8, title: "Topology".into(), author: "Munkres".into(), body: "Compact spaces.".into(), ..Document::default() },
        ])
        .expect("index");
    indexer.into_search().expect("search")
}

#[test]
fn in_book_matches_carry_pages_and_highlights() {
    let index = paged_book();
    let found = index.matches(7, "compact").expect("matches");
    let pages: Vec<MatchPage> = found.iter().map(|m| m.page).collect();
    assert_eq!(pages, vec![MatchPage::Number(2), MatchPage::Number(3), MatchPage::Index]);
    assert!(found[0].snippet.contains("<b>Compact</b> sets"), "{}", found[0].snippet);
    assert!(found.iter().all(|m| !m.snippet.contains("[[PAGE_")));
    assert!(found[2].snippet.contains("<b>Compact</b> set, 36"));
}

#[test]
fn in_book_matches_for_unknown_books_or_terms_are_empty() {
    let index = paged_book();
    assert!(index.matches(99, "compact").expect("unknown id").is_empty());
    assert!(index.matches(7, "hilbert").expect("absent term").is_empty());
    assert!(index.matches(7, "the").expect("stop word only").is_empty());
    assert!(index.matches(7, "page").expect("marker text").is_empty());
}
