//! End-to-end query pipeline.
//!
//! A query is first read into an intent, which picks the retrieval plan:
//! application questions about a known program go to the direct section
//! lookup, everything else runs dense and sparse retrieval concurrently,
//! fuses, filters/boosts and reranks. A failed signal degrades the query; only
//! both failing is an error. A failed reranker degrades to boosted order.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use tokio::task::spawn_blocking;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use studydb_core::config::{BoostConfig, RetrievalConfig, Settings};
use studydb_core::traits::{CandidateRetriever, DocumentStore, Reranker};
use studydb_core::types::{Category, Degree, QueryIntent, RankedResult, ScoredCandidate, SourceKind};
use studydb_core::vocab::Vocabulary;
use studydb_core::{Error, Result};
use studydb_intent::{slugify, IntentExtractor};

use crate::boost::filter_and_boost;
use crate::expand::expand_query;
use crate::fusion::fuse;
use crate::lookup::application_lookup;
use crate::rerank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Application sections of the identified program, straight from metadata.
    DirectLookup,
    /// Dense + sparse retrieval, fusion, filter/boost and rerank.
    Hybrid,
}

/// Per-query overrides. `None` keeps whatever the extractor found.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Program name or slug.
    pub program: Option<String>,
    pub degree: Option<Degree>,
    pub category: Option<Category>,
    /// Drop every metadata constraint; ranking is retrieval + rerank only.
    pub no_filter: bool,
    /// Keep only results whose program is the intent program, when any are.
    pub exact_match: bool,
    pub top_k: Option<usize>,
}

impl QueryOptions {
    fn apply(&self, intent: &mut QueryIntent) {
        if let Some(program) = self.program.as_deref() {
            let slug = slugify(program);
            intent.program_slug = (!slug.is_empty()).then_some(slug);
        }
        if self.degree.is_some() {
            intent.degree = self.degree;
        }
        if self.category.is_some() {
            intent.category = self.category;
        }
        if self.no_filter {
            intent.program_slug = None;
            intent.degree = None;
            intent.category = None;
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub query: String,
    pub intent: QueryIntent,
    pub strategy: Strategy,
    /// Retrieval signals that failed or timed out for this query.
    pub degraded: Vec<SourceKind>,
    /// True when the reranker failed and results are in boosted order.
    pub rerank_degraded: bool,
    /// True when filtering fell back to the relaxed program match.
    pub relaxed: bool,
    pub results: Vec<RankedResult>,
}

pub struct HybridRetriever {
    retrieval: RetrievalConfig,
    boost: BoostConfig,
    vocabulary: Vocabulary,
    extractor: IntentExtractor,
    store: Arc<dyn DocumentStore>,
    dense: Arc<dyn CandidateRetriever>,
    sparse: Arc<dyn CandidateRetriever>,
    reranker: Arc<dyn Reranker>,
}

impl HybridRetriever {
    pub fn new(
        settings: Settings,
        store: Arc<dyn DocumentStore>,
        dense: Arc<dyn CandidateRetriever>,
        sparse: Arc<dyn CandidateRetriever>,
        reranker: Arc<dyn Reranker>,
    ) -> Result<Self> {
        settings.validate()?;
        let extractor = IntentExtractor::new(&settings.vocabulary)?;
        info!(chunks = store.len(), "hybrid retriever ready");
        Ok(Self {
            retrieval: settings.retrieval,
            boost: settings.boost,
            vocabulary: settings.vocabulary,
            extractor,
            store,
            dense,
            sparse,
            reranker,
        })
    }

    pub fn extractor(&self) -> &IntentExtractor { &self.extractor }

    pub async fn search(&self, query: &str) -> Result<SearchOutcome> {
        self.search_with(query, &QueryOptions::default()).await
    }

    pub async fn search_with(&self, query: &str, opts: &QueryOptions) -> Result<SearchOutcome> {
        let mut intent = self.extractor.extract(query);
        opts.apply(&mut intent);
        let top_k = opts.top_k.unwrap_or(self.retrieval.top_k);
        let strategy = self.plan(query, &intent);
        info!(%query, ?strategy, program = ?intent.program_slug, category = ?intent.category, "search");

        let mut outcome = SearchOutcome {
            query: query.to_string(),
            intent,
            strategy,
            degraded: Vec::new(),
            rerank_degraded: false,
            relaxed: false,
            results: Vec::new(),
        };

        if strategy == Strategy::DirectLookup {
            outcome.results = application_lookup(
                self.store.as_ref(),
                &outcome.intent,
                &self.vocabulary.application_sections,
                &self.boost,
                self.retrieval.pinned_score,
                top_k,
            );
            if !outcome.results.is_empty() {
                return Ok(outcome);
            }
            debug!("application lookup found nothing, running hybrid retrieval");
            outcome.strategy = Strategy::Hybrid;
        }

        let retrieval_query = if self.retrieval.query_expansion {
            expand_query(query, &outcome.intent, &self.vocabulary)
        } else {
            query.to_string()
        };
        let (dense, sparse) = tokio::join!(
            self.gather(Arc::clone(&self.dense), SourceKind::Dense, retrieval_query.clone(), self.retrieval.n_dense),
            self.gather(Arc::clone(&self.sparse), SourceKind::Sparse, retrieval_query, self.retrieval.n_sparse),
        );
        let candidates = match (dense, sparse) {
            (Err(d), Err(s)) => return Err(Error::Retrieval(format!("dense: {d:#}; sparse: {s:#}"))),
            (dense, sparse) => {
                let mut all = Vec::new();
                for (kind, result) in [(SourceKind::Dense, dense), (SourceKind::Sparse, sparse)] {
                    match result {
                        Ok(hits) => all.extend(hits),
                        Err(e) => {
                            warn!(signal = %kind, error = %format!("{e:#}"), "retrieval signal unavailable, continuing degraded");
                            outcome.degraded.push(kind);
                        }
                    }
                }
                all
            }
        };

        let fused = fuse(candidates);
        info!(fused = fused.len(), "fusion");
        let boosted = filter_and_boost(fused, &outcome.intent, &self.boost);
        outcome.relaxed = boosted.relaxed;

        let (results, rerank_degraded) = self.rerank(query, &boosted.candidates, &outcome.intent, top_k).await;
        outcome.rerank_degraded = rerank_degraded;
        outcome.results = if opts.exact_match { exact_program(results, &outcome.intent) } else { results };
        Ok(outcome)
    }

    /// Application questions about an identified program are answered from
    /// section metadata; everything else takes the hybrid path.
    pub fn plan(&self, query: &str, intent: &QueryIntent) -> Strategy {
        if intent.program_slug.is_some() && self.extractor.is_application_query(query) {
            Strategy::DirectLookup
        } else {
            Strategy::Hybrid
        }
    }

    async fn gather(
        &self,
        retriever: Arc<dyn CandidateRetriever>,
        kind: SourceKind,
        query: String,
        k: usize,
    ) -> anyhow::Result<Vec<ScoredCandidate>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let limit = Duration::from_millis(self.retrieval.retrieval_timeout_ms);
        let task = spawn_blocking(move || retriever.retrieve(&query, k));
        let hits = match timeout(limit, task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(join)) => return Err(anyhow!("{kind} retrieval task failed: {join}")),
            Err(_) => return Err(anyhow!("{kind} retrieval timed out after {}ms", limit.as_millis())),
        };
        info!(signal = %kind, hits = hits.len(), "retrieved");
        Ok(hits)
    }

    async fn rerank(
        &self,
        query: &str,
        boosted: &[ScoredCandidate],
        intent: &QueryIntent,
        top_k: usize,
    ) -> (Vec<RankedResult>, bool) {
        let candidates = rerank::window(boosted, self.retrieval.top_m);
        if candidates.is_empty() {
            return (Vec::new(), false);
        }
        let retrieval = RetrievalConfig { top_k, ..self.retrieval.clone() };
        let reranker = Arc::clone(&self.reranker);
        let owned_query = query.to_string();
        let window = candidates.clone();
        let batch_size = retrieval.reranker_batch_size;
        let task = spawn_blocking(move || rerank::score_pairs(reranker.as_ref(), &owned_query, &window, batch_size));
        let limit = Duration::from_millis(retrieval.rerank_timeout_ms);
        let logits = match timeout(limit, task).await {
            Ok(Ok(Ok(logits))) => Ok(logits),
            Ok(Ok(Err(e))) => Err(Error::Rerank(format!("{e:#}"))),
            Ok(Err(join)) => Err(Error::Rerank(format!("rerank task failed: {join}"))),
            Err(_) => Err(Error::Rerank(format!("timed out after {}ms", limit.as_millis()))),
        };
        match logits {
            Ok(logits) => (rerank::finalize(&logits, &candidates, boosted, intent, &retrieval, &self.boost), false),
            Err(e) => {
                warn!(error = %e, "reranker unavailable, returning boosted order");
                (rerank::fallback(boosted, top_k), true)
            }
        }
    }
}

/// Post-filter for `--exact-match`: results whose program equals or contains
/// the intent program. Returns the input unchanged when none qualify.
fn exact_program(results: Vec<RankedResult>, intent: &QueryIntent) -> Vec<RankedResult> {
    let Some(name) = intent.program_name() else { return results };
    let matches = |r: &RankedResult| {
        let program = r.chunk.metadata.program.to_lowercase();
        !program.is_empty() && program.contains(&name)
    };
    if !results.iter().any(|r| matches(r)) {
        warn!(program = %name, "no exact program matches, keeping all results");
        return results;
    }
    results.into_iter().filter(|r| matches(r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use studydb_core::types::{Chunk, ChunkMeta};

    fn ranked(program: &str) -> RankedResult {
        let chunk = Arc::new(Chunk {
            id: program.into(),
            text: String::new(),
            metadata: ChunkMeta { program: program.into(), ..Default::default() },
        });
        RankedResult { chunk, score: 1.0, boosted: 1.0 }
    }

    #[test]
    fn options_override_and_clear() {
        let mut intent = QueryIntent { program_slug: Some("physics".into()), ..Default::default() };
        let opts = QueryOptions { program: Some("Information Engineering".into()), category: Some(Category::Apply), ..Default::default() };
        opts.apply(&mut intent);
        assert_eq!(intent.program_slug.as_deref(), Some("information-engineering"));
        assert_eq!(intent.category, Some(Category::Apply));

        QueryOptions { no_filter: true, ..Default::default() }.apply(&mut intent);
        assert!(!intent.has_filters());
    }

    #[test]
    fn exact_program_filters_or_keeps_all() {
        let intent = QueryIntent { program_slug: Some("physics".into()), ..Default::default() };
        let kept = exact_program(vec![ranked("Physics"), ranked("Chemistry"), ranked("Applied Physics")], &intent);
        let ids: Vec<&str> = kept.iter().map(|r| r.chunk.id.as_str()).collect();
        assert_eq!(ids, vec!["Physics", "Applied Physics"]);

        let untouched = exact_program(vec![ranked("Chemistry")], &intent);
        assert_eq!(untouched.len(), 1);
    }
}
