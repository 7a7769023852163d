use std::sync::Arc;

use tempfile::TempDir;

use libris_core::memory::InMemoryLibrary;
use libris_core::settings::{DataSettings, SearchSettings};
use libris_core::traits::VectorStore;
use libris_core::types::{DocId, Document};
use libris_vector::{top_k, LanceVectorStore, SelectionParams, SemanticRetriever};

fn params(top_k: usize) -> SelectionParams {
    SelectionParams { top_k, acceptance_floor: 0.25, epsilon: 1e-10 }
}

fn ids(hits: &[libris_core::types::SemanticHit]) -> Vec<DocId> {
    hits.iter().map(|h| h.id).collect()
}

#[test]
fn hits_are_sorted_and_bounded_by_k() {
    let rows: Vec<(DocId, Vec<f32>)> = vec![
        (1, vec![0.5, 0.5]),
        (2, vec![1.0, 0.0]),
        (3, vec![0.8, 0.6]),
        (4, vec![0.9, 0.1]),
    ];
    let hits = top_k(&[1.0, 0.0], &rows, params(3));
    assert_eq!(ids(&hits), vec![2, 4, 3]);
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    assert!((hits[2].score - 0.8).abs() < 1e-6);
}

#[test]
fn scores_below_floor_never_become_candidates() {
    let rows = vec![(1, vec![1.0, 0.0]), (2, vec![0.2, 0.98]), (3, vec![0.0, 1.0])];
    let hits = top_k(&[1.0, 0.0], &rows, params(50));
    assert_eq!(ids(&hits), vec![1], "0.2 and 0.0 fall under the 0.25 floor");
}

#[test]
fn mismatched_dimensions_are_skipped() {
    let rows = vec![(1, vec![1.0, 0.0, 0.0]), (2, vec![1.0, 0.0]), (3, vec![0.6, 0.8])];
    let hits = top_k(&[1.0, 0.0], &rows, params(10));
    assert_eq!(ids(&hits), vec![2, 3]);
}

#[test]
fn zero_norm_vectors_do_not_poison_the_ranking() {
    let rows = vec![(1, vec![0.0, 0.0]), (2, vec![1.0, 1.0])];
    let hits = top_k(&[1.0, 1.0], &rows, params(10));
    assert_eq!(ids(&hits), vec![2]);
    assert!(top_k(&[0.0, 0.0], &rows, params(10)).is_empty(), "zero query scores 0 everywhere");
}

#[test]
fn k_zero_or_empty_query_yields_nothing() {
    let rows = vec![(1, vec![1.0, 0.0])];
    assert!(top_k(&[1.0, 0.0], &rows, params(0)).is_empty());
    assert!(top_k(&[], &rows, params(5)).is_empty());
}

fn library() -> InMemoryLibrary {
    let doc = |id: DocId, v: Vec<f32>| Document { id, title: format!("t{id}"), embedding: Some(v), ..Document::default() };
    InMemoryLibrary::from_documents(vec![
        doc(1, vec![1.0, 0.0]),
        doc(2, vec![0.9, 0.1]),
        doc(3, vec![0.0, 1.0]),
        doc(4, vec![-1.0, 0.0]),
    ])
}

#[tokio::test]
async fn retriever_reads_the_store_and_applies_settings() {
    let settings = SearchSettings { semantic_top_k: 2, ..SearchSettings::default() };
    let retriever = SemanticRetriever::new(Arc::new(library()), &settings);
    let hits = retriever.retrieve(&[1.0, 0.0]).await.expect("retrieve");
    assert_eq!(ids(&hits), vec![1, 2]);
}

#[tokio::test]
async fn similar_excludes_the_document_itself() {
    let retriever = SemanticRetriever::new(Arc::new(library()), &SearchSettings::default());
    let hits = retriever.similar(1, 3).await.expect("similar");
    assert_eq!(ids(&hits), vec![2, 3, 4], "no floor applies to similarity browsing");
    assert!(retriever.similar(99, 3).await.expect("unknown").is_empty());
}

#[tokio::test]
async fn lance_store_round_trips_vectors() {
    let tmp = TempDir::new().expect("tempdir");
    let uri = tmp.path().join("lancedb");
    let store = LanceVectorStore::open(&uri.to_string_lossy(), "book_vectors").await.expect("open");
    assert!(store.load_vectors().await.expect("empty").is_empty());

    store.write(&[(1, vec![1.0, 0.0, 0.0]), (2, vec![0.0, 1.0, 0.0])]).await.expect("write");
    store.write(&[(3, vec![0.0, 0.0, 1.0])]).await.expect("append");
    assert!(store.write(&[(4, vec![1.0]), (5, vec![1.0, 2.0])]).await.is_err());

    let mut rows = store.load_vectors().await.expect("load");
    rows.sort_by_key(|(id, _)| *id);
    assert_eq!(rows, vec![(1, vec![1.0, 0.0, 0.0]), (2, vec![0.0, 1.0, 0.0]), (3, vec![0.0, 0.0, 1.0])]);
}

#[tokio::test]
async fn configured_store_resolves_relative_dirs_against_the_base() {
    let tmp = TempDir::new().expect("tempdir");
    let data = DataSettings { lancedb_dir: "indexes/lancedb".into(), vector_table: "papers".into(), ..DataSettings::default() };
    let store = LanceVectorStore::from_settings(&data, tmp.path()).await.expect("open");
    store.write(&[(7, vec![0.6, 0.8])]).await.expect("write");

    let reopened = LanceVectorStore::open(&tmp.path().join("indexes/lancedb").to_string_lossy(), "papers")
        .await
        .expect("reopen");
    assert_eq!(reopened.load_vectors().await.expect("load"), vec![(7, vec![0.6, 0.8])]);
}
