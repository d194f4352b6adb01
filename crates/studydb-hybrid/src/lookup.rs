//! Direct metadata lookup for "how do I apply to <program>" questions: the
//! answer lives in a handful of known sections, so scan the store for them
//! instead of running retrieval.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use studydb_core::config::BoostConfig;
use studydb_core::traits::DocumentStore;
use studydb_core::types::{Chunk, QueryIntent, RankedResult};

use crate::boost::program_quality;

fn degree_compatible(intent: &QueryIntent, chunk: &Chunk) -> bool {
    let have = chunk.metadata.degree.trim();
    match intent.degree {
        Some(want) => have.is_empty() || have.eq_ignore_ascii_case(want.as_str()),
        None => true,
    }
}

/// Application-section chunks for the intent program, one per section (lowest
/// `chunk_index` wins), ordered by `sections` priority and given `pinned_score`.
/// Empty when the intent has no program or nothing matches.
pub fn application_lookup(
    store: &dyn DocumentStore,
    intent: &QueryIntent,
    sections: &[String],
    boost: &BoostConfig,
    pinned_score: f32,
    top_k: usize,
) -> Vec<RankedResult> {
    if intent.program_slug.is_none() {
        return Vec::new();
    }
    let priority: HashMap<String, usize> = sections.iter().enumerate().map(|(i, s)| (s.to_lowercase(), i)).collect();

    let mut best: HashMap<usize, &Arc<Chunk>> = HashMap::new();
    for chunk in store.chunks() {
        let Some(&rank) = priority.get(&chunk.metadata.section.trim().to_lowercase()) else { continue };
        if program_quality(intent, chunk, boost) < boost.program_contains || !degree_compatible(intent, chunk) {
            continue;
        }
        let index = chunk.metadata.chunk_index.unwrap_or(0);
        best.entry(rank)
            .and_modify(|current| {
                if index < current.metadata.chunk_index.unwrap_or(0) {
                    *current = chunk;
                }
            })
            .or_insert(chunk);
    }

    let mut ranked: Vec<(usize, &Arc<Chunk>)> = best.into_iter().collect();
    ranked.sort_by_key(|(rank, _)| *rank);
    ranked.truncate(top_k);
    for (_, chunk) in &ranked {
        debug!(id = %chunk.id, section = %chunk.metadata.section, "application lookup hit");
    }
    info!(hits = ranked.len(), program = ?intent.program_slug, "application lookup");
    ranked
        .into_iter()
        .map(|(_, chunk)| RankedResult { chunk: Arc::clone(chunk), score: pinned_score, boosted: pinned_score })
        .collect()
}
