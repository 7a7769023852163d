use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use libris_core::settings::SearchSettings;
use libris_core::traits::{BookMatcher, Catalog, Embedder, LexicalIndex, QueryExpander, Reranker, VectorStore};
use libris_core::types::{BookMatch, DocId, Document, RankedResult, SearchRequest, SearchResponse};
use libris_core::{Error, Result};
use libris_vector::SemanticRetriever;

use crate::booster::{IndexBooster, IndexTerm};
use crate::fusion::{paginate, Candidate, CandidatePool, FusionWeights, Page};
use crate::gate::CallGate;
use crate::lexical::LexicalRetriever;
use crate::preprocess::Preprocessor;
use crate::rerank::{merge_judgements, rerank_candidates};

pub struct EngineBuilder {
    lexical: Arc<dyn LexicalIndex>,
    catalog: Arc<dyn Catalog>,
    vectors: Arc<dyn VectorStore>,
    settings: SearchSettings,
    embedder: Option<Arc<dyn Embedder>>,
    expander: Option<Arc<dyn QueryExpander>>,
    reranker: Option<Arc<dyn Reranker>>,
    matcher: Option<Arc<dyn BookMatcher>>,
}

impl EngineBuilder {
    pub fn settings(mut self, settings: SearchSettings) -> Self { self.settings = settings; self }

    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self { self.embedder = Some(embedder); self }

    pub fn expander(mut self, expander: Arc<dyn QueryExpander>) -> Self { self.expander = Some(expander); self }

    pub fn reranker(mut self, reranker: Arc<dyn Reranker>) -> Self { self.reranker = Some(reranker); self }

    pub fn matcher(mut self, matcher: Arc<dyn BookMatcher>) -> Self { self.matcher = Some(matcher); self }

    pub fn build(self) -> Result<HybridSearchEngine> {
        self.settings.validate()?;
        let settings = self.settings.clamped();
        Ok(HybridSearchEngine {
            lexical: LexicalRetriever::new(self.lexical, settings.lexical_cap),
            semantic: SemanticRetriever::new(self.vectors, &settings),
            catalog: self.catalog,
            preprocessor: Preprocessor::new(self.embedder, self.expander, &settings),
            reranker: self.reranker,
            matcher: self.matcher,
            booster: IndexBooster::from(&settings),
            weights: FusionWeights::from(&settings),
            settings,
        })
    }
}

/// Answers search requests over one library.
///
/// The engine holds no per-query state; concurrent `search` calls share only
/// the memo caches. Each call gets its own limit on outstanding remote calls.
pub struct HybridSearchEngine {
    lexical: LexicalRetriever,
    semantic: SemanticRetriever,
    catalog: Arc<dyn Catalog>,
    preprocessor: Preprocessor,
    reranker: Option<Arc<dyn Reranker>>,
    matcher: Option<Arc<dyn BookMatcher>>,
    booster: IndexBooster,
    weights: FusionWeights,
    settings: SearchSettings,
}

impl HybridSearchEngine {
    pub fn builder(lexical: Arc<dyn LexicalIndex>, catalog: Arc<dyn Catalog>, vectors: Arc<dyn VectorStore>) -> EngineBuilder {
        EngineBuilder {
            lexical,
            catalog,
            vectors,
            settings: SearchSettings::default(),
            embedder: None,
            expander: None,
            reranker: None,
            matcher: None,
        }
    }

    pub fn settings(&self) -> &SearchSettings { &self.settings }

    pub fn preprocessor(&self) -> &Preprocessor { &self.preprocessor }

    /// One page of results for `request`.
    ///
    /// Remote failures degrade the affected stage and are logged; only local
    /// store failures come back as errors.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let query = request.query.trim();
        if query.is_empty() {
            debug!("empty query");
            return Ok(SearchResponse::empty());
        }
        if !request.use_fts && !request.use_vector {
            debug!(query, "no retrieval mode enabled");
            return Ok(SearchResponse::empty());
        }
        let started = Instant::now();

        let gate = self.call_gate();
        let prepared = self.preprocessor.prepare(&gate, query, request.use_translate, request.use_vector).await;

        let mut pool = CandidatePool::new(self.weights);
        if let Some(vector) = prepared.vector.as_deref() {
            let hits = self.semantic.retrieve(vector).await.map_err(Error::index_store)?;
            pool.add_semantic(hits);
        }
        if request.use_fts {
            pool.add_lexical(self.lexical.retrieve(&prepared.lexical_text, request.field)?);
        }

        let docs = self.fetch_documents(&pool.ids())?;
        // index lookup uses the query as typed, not the expansion
        let boosted = match IndexTerm::new(query) {
            Some(term) => pool.apply_index_matches(self.booster.boost, |id| {
                self.booster.pages(docs.get(&id).and_then(|d| d.index_text.as_deref()), &term)
            }),
            None => 0,
        };

        let Page { items, total_count } = paginate(pool.into_ranked(), request.offset, request.limit);
        let mut results: Vec<RankedResult> = items.into_iter().map(|c| { let doc = docs.get(&c.id); materialize(c, doc) }).collect();

        if request.use_rerank && !results.is_empty() {
            results = self.rerank(&gate, query, results).await;
        }

        let expanded_query = prepared.expanded.filter(|e| e != query);
        info!(
            query,
            total = total_count,
            returned = results.len(),
            boosted,
            expanded = expanded_query.is_some(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search complete"
        );
        Ok(SearchResponse { results, total_count, expanded_query })
    }

    /// Documents whose stored vectors are nearest to `id`'s.
    pub async fn similar(&self, id: DocId, limit: usize) -> Result<Vec<RankedResult>> {
        let hits = self.semantic.similar(id, limit).await.map_err(Error::index_store)?;
        let ids: Vec<DocId> = hits.iter().map(|h| h.id).collect();
        let docs = self.fetch_documents(&ids)?;
        let mut pool = CandidatePool::new(self.weights);
        pool.add_semantic(hits);
        Ok(pool.into_ranked().into_iter().map(|c| { let doc = docs.get(&c.id); materialize(c, doc) }).collect())
    }

    /// Highlighted passages inside book `id`, each with its page.
    pub fn matches(&self, id: DocId, query: &str) -> Result<Vec<BookMatch>> {
        let query = query.trim();
        if query.is_empty() { return Ok(Vec::new()); }
        let Some(matcher) = &self.matcher else {
            debug!(id, "no in-book matcher configured");
            return Ok(Vec::new());
        };
        matcher.matches(id, query).map_err(Error::index_store)
    }

    fn fetch_documents(&self, ids: &[DocId]) -> Result<HashMap<DocId, Document>> {
        if ids.is_empty() { return Ok(HashMap::new()); }
        let docs = self.catalog.fetch(ids).map_err(Error::index_store)?;
        if docs.len() < ids.len() {
            debug!(requested = ids.len(), found = docs.len(), "catalog is missing some candidates");
        }
        Ok(docs.into_iter().map(|d| (d.id, d)).collect())
    }

    fn call_gate(&self) -> CallGate {
        CallGate::new(self.settings.max_concurrent_calls, Duration::from_millis(self.settings.call_timeout_ms))
    }

    async fn rerank(&self, gate: &CallGate, query: &str, page: Vec<RankedResult>) -> Vec<RankedResult> {
        let Some(reranker) = &self.reranker else { return page };
        let candidates = rerank_candidates(&page);
        match gate.run("rerank", reranker.rerank(query, &candidates)).await {
            Ok(judgements) => {
                debug!(judged = judgements.len(), page = page.len(), "reranked page");
                merge_judgements(page, &judgements)
            }
            Err(e) => {
                warn!(error = %e, "rerank unavailable, keeping fused order");
                page
            }
        }
    }
}

fn materialize(c: Candidate, doc: Option<&Document>) -> RankedResult {
    RankedResult {
        id: c.id,
        title: doc.map(|d| d.title.clone()).unwrap_or_default(),
        author: doc.map(|d| d.author.clone()).unwrap_or_default(),
        year: doc.and_then(|d| d.year),
        publisher: doc.and_then(|d| d.publisher.clone()),
        summary: doc.and_then(|d| d.summary.clone()),
        path: doc.and_then(|d| d.path.clone()),
        score: c.score,
        mode: c.mode,
        snippet: c.snippet,
        index_matches: c.index_matches,
        ai_rank: None,
        ai_reason: None,
    }
}
