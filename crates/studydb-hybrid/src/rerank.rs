//! Cross-encoder reranking of boosted candidates, with priority insertion of
//! exact program + apply matches and a boosted-order fallback.

use std::cmp::Ordering;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{debug, info};

use studydb_core::config::{BoostConfig, RetrievalConfig};
use studydb_core::traits::Reranker;
use studydb_core::types::{Category, Chunk, QueryIntent, RankedResult, ScoredCandidate};

use crate::boost::program_quality;

/// Rerank window: the first `top_m` boosted candidates.
pub fn window(boosted: &[ScoredCandidate], top_m: usize) -> Vec<ScoredCandidate> {
    boosted.iter().take(top_m).cloned().collect()
}

/// Score `(query, text)` pairs batch by batch. One logit per candidate.
pub fn score_pairs(reranker: &dyn Reranker, query: &str, candidates: &[ScoredCandidate], batch_size: usize) -> Result<Vec<f32>> {
    let mut logits = Vec::with_capacity(candidates.len());
    for batch in candidates.chunks(batch_size.max(1)) {
        let pairs: Vec<(String, String)> = batch.iter().map(|c| (query.to_string(), c.chunk.text.clone())).collect();
        let scores = reranker.predict(&pairs)?;
        if scores.len() != pairs.len() {
            return Err(anyhow!("reranker returned {} scores for {} pairs", scores.len(), pairs.len()));
        }
        logits.extend(scores);
    }
    Ok(logits)
}

/// Blend logits with boosted scores, drop results under the floor, sort and
/// truncate, then apply priority insertion.
pub fn finalize(
    logits: &[f32],
    candidates: &[ScoredCandidate],
    boosted: &[ScoredCandidate],
    intent: &QueryIntent,
    retrieval: &RetrievalConfig,
    boost: &BoostConfig,
) -> Vec<RankedResult> {
    let mut results: Vec<RankedResult> = logits
        .iter()
        .zip(candidates)
        .map(|(logit, c)| RankedResult {
            chunk: Arc::clone(&c.chunk),
            score: logit + c.score * retrieval.rerank_weight,
            boosted: c.score,
        })
        .filter(|r| r.score >= retrieval.min_rerank_score)
        .collect();
    let dropped = candidates.len() - results.len();
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    results.truncate(retrieval.top_k);
    insert_priority(&mut results, boosted, intent, retrieval, boost);
    info!(candidates = candidates.len(), dropped, returned = results.len(), "reranked");
    results
}

/// For apply questions: make sure an exact program + apply chunk leads the
/// list when none of the top three is one.
pub fn insert_priority(
    results: &mut Vec<RankedResult>,
    boosted: &[ScoredCandidate],
    intent: &QueryIntent,
    retrieval: &RetrievalConfig,
    boost: &BoostConfig,
) {
    if intent.category != Some(Category::Apply) {
        return;
    }
    let is_exact = |chunk: &Chunk| {
        chunk.metadata.category.trim().eq_ignore_ascii_case(Category::Apply.as_str())
            && program_quality(intent, chunk, boost) >= boost.program_exact
    };
    if results.iter().take(3).any(|r| is_exact(&r.chunk)) {
        return;
    }
    // `boosted` is sorted, so the first exact match has the highest boosted score.
    let Some(best) = boosted.iter().find(|c| is_exact(&c.chunk)) else { return };
    results.retain(|r| r.chunk.id != best.chunk.id);
    debug!(id = %best.chunk.id, "pinning exact apply match at rank 1");
    results.insert(0, RankedResult { chunk: Arc::clone(&best.chunk), score: retrieval.pinned_score, boosted: best.score });
    results.truncate(retrieval.top_k);
}

/// Boosted order as the final ranking, used when the reranker fails.
pub fn fallback(boosted: &[ScoredCandidate], top_k: usize) -> Vec<RankedResult> {
    boosted
        .iter()
        .take(top_k)
        .map(|c| RankedResult { chunk: Arc::clone(&c.chunk), score: c.score, boosted: c.score })
        .collect()
}
