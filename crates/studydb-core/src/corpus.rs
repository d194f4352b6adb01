//! In-memory document store loaded from the JSON-lines export of corpus
//! preparation (one `Chunk` object per line).

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::error::{Error, Result};
use crate::traits::DocumentStore;
use crate::types::{Chunk, ChunkId};

#[derive(Debug, Default)]
pub struct Corpus {
    chunks: Vec<Arc<Chunk>>,
    by_id: HashMap<ChunkId, usize>,
}

impl Corpus {
    /// Build a corpus, enforcing unique ids and `chunk_index < total_chunks`.
    pub fn from_chunks(chunks: Vec<Chunk>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(chunks.len());
        let mut out = Vec::with_capacity(chunks.len());
        for (pos, chunk) in chunks.into_iter().enumerate() {
            if chunk.id.is_empty() {
                return Err(Error::Initialization(format!("chunk at position {pos} has an empty id")));
            }
            if let (Some(idx), Some(total)) = (chunk.metadata.chunk_index, chunk.metadata.total_chunks) {
                if idx >= total {
                    return Err(Error::Initialization(format!(
                        "chunk '{}' has chunk_index {idx} >= total_chunks {total}",
                        chunk.id
                    )));
                }
            }
            if by_id.insert(chunk.id.clone(), pos).is_some() {
                return Err(Error::Initialization(format!("duplicate chunk id '{}'", chunk.id)));
            }
            out.push(Arc::new(chunk));
        }
        Ok(Self { chunks: out, by_id })
    }

    pub fn load_jsonl(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Initialization(format!("cannot read corpus {}: {e}", path.display())))?;
        let mut chunks = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() { continue; }
            let chunk: Chunk = serde_json::from_str(line).map_err(|e| {
                Error::Initialization(format!("{}:{}: invalid chunk: {e}", path.display(), line_no + 1))
            })?;
            chunks.push(chunk);
        }
        let corpus = Self::from_chunks(chunks)?;
        info!(chunks = corpus.chunks.len(), path = %path.display(), "loaded corpus");
        Ok(corpus)
    }

    /// Position of a chunk in the corpus ordering.
    pub fn position(&self, id: &str) -> Option<usize> { self.by_id.get(id).copied() }
}

impl DocumentStore for Corpus {
    fn chunks(&self) -> &[Arc<Chunk>] { &self.chunks }

    fn get(&self, id: &str) -> Option<Arc<Chunk>> {
        self.by_id.get(id).map(|&pos| Arc::clone(&self.chunks[pos]))
    }
}
