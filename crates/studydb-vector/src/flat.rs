use anyhow::{anyhow, ensure, Result};
use std::sync::Arc;

use studydb_core::traits::{DenseIndex, Embedder};
use studydb_core::types::ChunkId;

/// Brute-force cosine index over precomputed chunk vectors held in memory.
pub struct FlatDenseIndex {
	ids: Vec<ChunkId>,
	vectors: Vec<Vec<f32>>,
	embedder: Arc<dyn Embedder>,
}

impl FlatDenseIndex {
	pub fn new(entries: Vec<(ChunkId, Vec<f32>)>, embedder: Arc<dyn Embedder>) -> Result<Self> {
		let dim = embedder.dim();
		let mut ids = Vec::with_capacity(entries.len());
		let mut vectors = Vec::with_capacity(entries.len());
		for (id, v) in entries {
			ensure!(v.len() == dim, "vector for '{id}' has {} dims, expected {dim}", v.len());
			ids.push(id);
			vectors.push(v);
		}
		Ok(Self { ids, vectors, embedder })
	}

	pub fn len(&self) -> usize { self.ids.len() }

	pub fn is_empty(&self) -> bool { self.ids.is_empty() }
}

/// `1 - cos(a, b)`; zero vectors are treated as orthogonal.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
	let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
	let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
	let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
	if na == 0.0 || nb == 0.0 { return 1.0; }
	1.0 - dot / (na * nb)
}

impl DenseIndex for FlatDenseIndex {
	fn search(&self, query: &str, k: usize) -> Result<Vec<(ChunkId, f32)>> {
		let q = self.embedder
			.embed_batch(&[query.to_string()])?
			.pop()
			.ok_or_else(|| anyhow!("embedder returned no vector"))?;
		let mut scored: Vec<(usize, f32)> = self.vectors.iter().map(|v| cosine_distance(&q, v)).enumerate().collect();
		scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
		scored.truncate(k);
		Ok(scored.into_iter().map(|(i, d)| (self.ids[i].clone(), d)).collect())
	}
}
