//! Metadata-aware filtering and boosting of fused candidates.
//!
//! Each candidate gets a program match quality and a category match quality
//! against the query intent. Together they decide admission and a tiered
//! multiplier on the fused score; a few secondary multipliers follow. When
//! strict filtering rejects everything, a relaxed program-word match keeps
//! near misses at a penalty.

use std::cmp::Ordering;

use tracing::{debug, info};

use studydb_core::config::BoostConfig;
use studydb_core::types::{Chunk, QueryIntent, ScoredCandidate};

const DEADLINE_SECTION_CUES: [&str; 2] = ["deadline", "period"];
const PRIORITY_CHUNK_TYPES: [&str; 2] = ["deadline", "application"];

/// How well a chunk's program metadata matches the intent program:
/// exact (1.0), containment (0.8), partial word overlap (0.6 × ratio) or 0.
pub fn program_quality(intent: &QueryIntent, chunk: &Chunk, cfg: &BoostConfig) -> f32 {
    let (Some(slug), Some(name)) = (intent.program_slug.as_deref(), intent.program_name()) else {
        return 0.0;
    };
    let meta = &chunk.metadata;
    let program = meta.program.trim().to_lowercase();
    let chunk_slug = meta.slug.trim().to_lowercase();

    if (!chunk_slug.is_empty() && chunk_slug == slug.to_lowercase()) || program == name {
        return cfg.program_exact;
    }
    if !program.is_empty() && (program.contains(&name) || name.contains(&program)) {
        return cfg.program_contains;
    }
    let wanted: Vec<&str> = name.split_whitespace().collect();
    if wanted.is_empty() {
        return 0.0;
    }
    let have: Vec<&str> = program.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()).collect();
    let found = wanted.iter().filter(|w| have.contains(w)).count();
    if found == 0 {
        return 0.0;
    }
    cfg.program_partial * found as f32 / wanted.len() as f32
}

/// How well a chunk's category/section/text matches the intent category.
/// `category_neutral` when the intent has no category.
pub fn category_quality(intent: &QueryIntent, chunk: &Chunk, cfg: &BoostConfig) -> f32 {
    let Some(category) = intent.category else { return cfg.category_neutral };
    let wanted = category.as_str();
    let meta = &chunk.metadata;
    let chunk_category = meta.category.trim().to_lowercase();
    let section = meta.section.trim().to_lowercase();

    if chunk_category == wanted {
        cfg.category_exact
    } else if section.contains(wanted) {
        cfg.category_in_section
    } else if (!section.is_empty() && wanted.contains(section.as_str()))
        || (!chunk_category.is_empty() && (chunk_category.contains(wanted) || wanted.contains(chunk_category.as_str())))
    {
        cfg.category_loose
    } else if chunk.text.to_lowercase().contains(wanted) {
        cfg.category_in_text
    } else {
        0.0
    }
}

/// Folds both qualities into the single tier value behind the boost factor.
pub fn combined_quality(program: f32, category: f32, cfg: &BoostConfig) -> f32 {
    if program > 0.0 {
        if category > cfg.strong_category {
            program * cfg.program_weight + category
        } else {
            program + category * cfg.weak_category_weight
        }
    } else if category > cfg.generic_category {
        category * cfg.generic_category_weight
    } else {
        cfg.passthrough_quality
    }
}

fn admitted(intent: &QueryIntent, program: f32, category: f32, cfg: &BoostConfig) -> bool {
    !intent.has_filters() || program > 0.0 || (intent.category.is_some() && category > cfg.admit_category)
}

fn secondary_multiplier(intent: &QueryIntent, c: &ScoredCandidate, program: f32, category: f32, cfg: &BoostConfig) -> f32 {
    let meta = &c.chunk.metadata;
    let mut m = 1.0;
    if intent.has_filters() && program >= cfg.program_exact && category >= cfg.category_exact {
        m *= cfg.exact_match_boost;
    }
    if intent.category.is_some() && !intent.temporal_keywords.is_empty() {
        let section = meta.section.to_lowercase();
        if DEADLINE_SECTION_CUES.iter().any(|cue| section.contains(cue)) {
            m *= cfg.deadline_priority_boost;
        }
    }
    if intent.category.is_some()
        && meta
            .chunk_type
            .as_deref()
            .is_some_and(|t| PRIORITY_CHUNK_TYPES.iter().any(|p| t.eq_ignore_ascii_case(p)))
    {
        m *= cfg.chunk_type_boost;
    }
    if intent.degree.is_some_and(|d| meta.degree.trim().eq_ignore_ascii_case(d.as_str())) {
        m *= cfg.degree_match_boost;
    }
    if c.score > cfg.semantic_threshold {
        m *= cfg.semantic_boost;
    }
    m
}

#[derive(Debug, Clone, Default)]
pub struct BoostOutcome {
    /// Sorted by boosted score, descending.
    pub candidates: Vec<ScoredCandidate>,
    /// True when the strict pass rejected everything and the relaxed program
    /// match produced the result.
    pub relaxed: bool,
}

/// Score fused candidates against the intent. The returned scores are boosted
/// scores; an empty outcome is a valid answer, not an error.
pub fn filter_and_boost(candidates: Vec<ScoredCandidate>, intent: &QueryIntent, cfg: &BoostConfig) -> BoostOutcome {
    let total = candidates.len();
    let mut kept = Vec::with_capacity(total);
    for c in &candidates {
        let program = program_quality(intent, &c.chunk, cfg);
        let category = category_quality(intent, &c.chunk, cfg);
        if !admitted(intent, program, category, cfg) {
            debug!(id = %c.chunk.id, program, category, "rejected by filters");
            continue;
        }
        let quality = combined_quality(program, category, cfg);
        let boost = (1.0 + quality * cfg.boost_scale) * secondary_multiplier(intent, c, program, category, cfg);
        debug!(id = %c.chunk.id, fused = c.score, program, category, boost, "boosted");
        kept.push(ScoredCandidate { score: c.score * boost, ..c.clone() });
    }

    let mut relaxed = false;
    if kept.is_empty() && total > 0 {
        if let Some(name) = intent.program_name() {
            let words: Vec<&str> = name.split_whitespace().filter(|w| w.chars().count() > cfg.relaxed_min_word_len).collect();
            kept = candidates
                .into_iter()
                .filter(|c| {
                    let program = c.chunk.metadata.program.to_lowercase();
                    words.iter().any(|w| program.contains(w))
                })
                .map(|c| ScoredCandidate { score: c.score * cfg.relaxed_penalty, ..c })
                .collect();
            relaxed = true;
            info!(kept = kept.len(), "strict filtering emptied the set, relaxed program match applied");
        }
    }

    kept.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    info!(input = total, kept = kept.len(), relaxed, "filter/boost");
    BoostOutcome { candidates: kept, relaxed }
}
