use std::collections::HashMap;

use studydb_core::types::{ChunkId, ScoredCandidate};

/// Deduplicate candidates by chunk id, keeping the highest score per chunk.
/// Output keeps first-seen order; the winning entry's `source` is kept.
pub fn fuse<I>(candidates: I) -> Vec<ScoredCandidate>
where
    I: IntoIterator<Item = ScoredCandidate>,
{
    let mut slots: HashMap<ChunkId, usize> = HashMap::new();
    let mut merged: Vec<ScoredCandidate> = Vec::new();
    for c in candidates {
        match slots.get(&c.chunk.id) {
            Some(&i) => {
                if c.score > merged[i].score { merged[i] = c; }
            }
            None => {
                slots.insert(c.chunk.id.clone(), merged.len());
                merged.push(c);
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use studydb_core::types::{Chunk, ChunkMeta, SourceKind};

    fn cand(id: &str, score: f32, source: SourceKind) -> ScoredCandidate {
        let chunk = Arc::new(Chunk { id: id.into(), text: String::new(), metadata: ChunkMeta::default() });
        ScoredCandidate { chunk, score, source }
    }

    #[test]
    fn keeps_max_and_first_seen_order() {
        let merged = fuse(vec![
            cand("a", 0.4, SourceKind::Dense),
            cand("b", 0.9, SourceKind::Dense),
            cand("a", 0.7, SourceKind::Sparse),
            cand("b", 0.1, SourceKind::Sparse),
        ]);
        let view: Vec<(&str, f32, SourceKind)> = merged.iter().map(|c| (c.chunk.id.as_str(), c.score, c.source)).collect();
        assert_eq!(view, vec![("a", 0.7, SourceKind::Sparse), ("b", 0.9, SourceKind::Dense)]);
    }

    #[test]
    fn empty_input() {
        assert!(fuse(Vec::new()).is_empty());
    }
}
