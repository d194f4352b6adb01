use std::sync::Arc;

use crate::types::{Chunk, ChunkId, ScoredCandidate};

/// Encodes text into L2-normalized vectors. Used at query time by dense index
/// adapters that need the query in embedding space.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Read-only view of the indexed corpus. The slice order is the fixed corpus
/// ordering that sparse scores are aligned to.
pub trait DocumentStore: Send + Sync {
    fn chunks(&self) -> &[Arc<Chunk>];
    fn get(&self, id: &str) -> Option<Arc<Chunk>>;

    fn len(&self) -> usize { self.chunks().len() }
    fn is_empty(&self) -> bool { self.chunks().is_empty() }
}

/// Vector-similarity index. Returns up to `k` `(chunk id, distance)` pairs,
/// nearest first.
pub trait DenseIndex: Send + Sync {
    fn search(&self, query: &str, k: usize) -> anyhow::Result<Vec<(ChunkId, f32)>>;
}

/// Lexical index. Returns one raw score per chunk, aligned to
/// `DocumentStore::chunks()`.
pub trait SparseIndex: Send + Sync {
    fn score(&self, tokens: &[String]) -> anyhow::Result<Vec<f32>>;
}

/// Pairwise relevance model. Returns one logit per `(query, text)` pair,
/// aligned by position.
pub trait Reranker: Send + Sync {
    fn predict(&self, pairs: &[(String, String)]) -> anyhow::Result<Vec<f32>>;
}

/// A retrieval signal as seen by the pipeline: query in, similarity-scored
/// candidates in `[0, 1]` out.
pub trait CandidateRetriever: Send + Sync {
    fn retrieve(&self, query: &str, k: usize) -> anyhow::Result<Vec<ScoredCandidate>>;
}
