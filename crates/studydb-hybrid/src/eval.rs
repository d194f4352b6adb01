//! Offline retrieval metrics over labeled queries.

use serde::{Deserialize, Serialize};

use studydb_core::types::RankedResult;

/// A labeled query. `expected_info` is a text fragment a good answer contains.
#[derive(Debug, Clone, Deserialize)]
pub struct EvalCase {
    pub query: String,
    pub expected_program: String,
    #[serde(default)]
    pub expected_info: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryJudgement {
    pub query: String,
    /// One graded relevance per returned result, in rank order.
    pub relevance: Vec<f32>,
    /// 1-based rank of the first result from the expected program.
    pub first_hit: Option<usize>,
    /// Share of the top `k` results from the expected program.
    pub precision: f32,
}

/// 1.0 for the expected program (case-insensitive), plus 0.5 when the
/// expected info appears in the text.
pub fn relevance(case: &EvalCase, result: &RankedResult) -> f32 {
    let mut rel = 0.0;
    if result.chunk.metadata.program.trim().eq_ignore_ascii_case(case.expected_program.trim()) {
        rel += 1.0;
    }
    if let Some(info) = case.expected_info.as_deref() {
        if result.chunk.text.contains(info) {
            rel += 0.5;
        }
    }
    rel
}

pub fn judge(case: &EvalCase, results: &[RankedResult], k: usize) -> QueryJudgement {
    let matches: Vec<bool> = results
        .iter()
        .map(|r| r.chunk.metadata.program.trim().eq_ignore_ascii_case(case.expected_program.trim()))
        .collect();
    let first_hit = matches.iter().position(|m| *m).map(|i| i + 1);
    let precision = if k == 0 { 0.0 } else { matches.iter().take(k).filter(|m| **m).count() as f32 / k as f32 };
    QueryJudgement {
        query: case.query.clone(),
        relevance: results.iter().map(|r| relevance(case, r)).collect(),
        first_hit,
        precision,
    }
}

fn dcg(scores: &[f32]) -> f32 {
    scores.iter().enumerate().map(|(i, s)| s / (i as f32 + 2.0).log2()).sum()
}

/// nDCG@k against the ideal ordering of the same result list.
pub fn ndcg_at_k(relevance: &[f32], k: usize) -> f32 {
    let top: Vec<f32> = relevance.iter().take(k).copied().collect();
    let mut ideal = relevance.to_vec();
    ideal.sort_by(|a, b| b.total_cmp(a));
    ideal.truncate(k);
    let idcg = dcg(&ideal);
    if idcg > 0.0 { dcg(&top) / idcg } else { 0.0 }
}

#[derive(Debug, Clone, Serialize)]
pub struct EvalReport {
    pub k: usize,
    pub queries: usize,
    pub precision_at_k: f32,
    pub recall_at_k: f32,
    pub mrr: f32,
    pub ndcg_at_k: f32,
    pub per_query: Vec<QueryJudgement>,
}

/// Aggregate per-query judgements. An empty set scores zero everywhere.
pub fn evaluate(per_query: Vec<QueryJudgement>, k: usize) -> EvalReport {
    let n = per_query.len();
    let mean = |f: &dyn Fn(&QueryJudgement) -> f32| {
        if n == 0 { 0.0 } else { per_query.iter().map(f).sum::<f32>() / n as f32 }
    };
    let hit_within = |j: &QueryJudgement| if j.first_hit.is_some_and(|r| r <= k) { 1.0 } else { 0.0 };
    let precision_at_k = mean(&|j| j.precision);
    let recall_at_k = mean(&hit_within);
    let mrr = mean(&|j| j.first_hit.map_or(0.0, |r| 1.0 / r as f32));
    let ndcg = mean(&|j| ndcg_at_k(&j.relevance, k));
    EvalReport { k, queries: n, precision_at_k, recall_at_k, mrr, ndcg_at_k: ndcg, per_query }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ndcg_of_ideal_order_is_one() {
        assert!((ndcg_at_k(&[1.5, 1.0, 0.0], 3) - 1.0).abs() < 1e-6);
        assert_eq!(ndcg_at_k(&[0.0, 0.0], 2), 0.0);
        let swapped = ndcg_at_k(&[0.0, 1.0], 2);
        assert!((swapped - (1.0 / 3f32.log2())).abs() < 1e-6);
    }
}
