use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::debug;

use studydb_core::tokenize::tokenize;
use studydb_core::traits::{CandidateRetriever, DocumentStore, SparseIndex};
use studydb_core::types::{ScoredCandidate, SourceKind};

/// Turns raw lexical scores into `[0, 1]` similarities: the top `k` chunks,
/// each divided by the best score of the batch.
pub struct SparseRetriever {
	index: Arc<dyn SparseIndex>,
	store: Arc<dyn DocumentStore>,
}

impl SparseRetriever {
	pub fn new(index: Arc<dyn SparseIndex>, store: Arc<dyn DocumentStore>) -> Self { Self { index, store } }
}

impl CandidateRetriever for SparseRetriever {
	fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredCandidate>> {
		let tokens = tokenize(query);
		let scores = self.index.score(&tokens)?;
		let chunks = self.store.chunks();
		if scores.len() != chunks.len() {
			bail!("lexical index returned {} scores for a corpus of {} chunks", scores.len(), chunks.len());
		}
		let max = scores.iter().copied().fold(0.0_f32, f32::max);
		let norm = if max > 0.0 { max } else { 1.0 };

		let mut ranked: Vec<(usize, f32)> = scores.into_iter().enumerate().collect();
		ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
		ranked.truncate(k);
		debug!(tokens = tokens.len(), hits = ranked.len(), max, "sparse retrieval");
		Ok(ranked
			.into_iter()
			.map(|(pos, raw)| ScoredCandidate {
				chunk: Arc::clone(&chunks[pos]),
				score: (raw / norm).clamp(0.0, 1.0),
				source: SourceKind::Sparse,
			})
			.collect())
	}
}
