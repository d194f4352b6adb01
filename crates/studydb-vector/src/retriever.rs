use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, warn};

use studydb_core::traits::{CandidateRetriever, DenseIndex, DocumentStore};
use studydb_core::types::{ScoredCandidate, SourceKind};

/// Maps `(id, distance)` hits onto corpus chunks with similarity
/// `clamp(1 - distance, 0, 1)`, preserving the index's order.
pub struct DenseRetriever {
	index: Arc<dyn DenseIndex>,
	store: Arc<dyn DocumentStore>,
}

impl DenseRetriever {
	pub fn new(index: Arc<dyn DenseIndex>, store: Arc<dyn DocumentStore>) -> Self { Self { index, store } }
}

pub fn similarity(distance: f32) -> f32 {
	if distance.is_nan() { return 0.0; }
	(1.0 - distance).clamp(0.0, 1.0)
}

impl CandidateRetriever for DenseRetriever {
	fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredCandidate>> {
		let hits = self.index.search(query, k)?;
		let mut out = Vec::with_capacity(hits.len().min(k));
		for (id, distance) in hits {
			let Some(chunk) = self.store.get(&id) else {
				warn!(id = %id, "dense hit is not in the corpus, dropping");
				continue;
			};
			out.push(ScoredCandidate { chunk, score: similarity(distance), source: SourceKind::Dense });
			if out.len() == k { break; }
		}
		debug!(hits = out.len(), "dense retrieval");
		Ok(out)
	}
}
