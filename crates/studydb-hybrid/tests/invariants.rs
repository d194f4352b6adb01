use std::collections::HashMap;
use std::sync::Arc;

use proptest::prelude::*;

use studydb_core::config::BoostConfig;
use studydb_core::types::{Category, Chunk, ChunkMeta, QueryIntent, ScoredCandidate, SourceKind};
use studydb_hybrid::boost::filter_and_boost;
use studydb_hybrid::fusion::fuse;

fn candidate(id: usize, score: f32, program: &str) -> ScoredCandidate {
    let chunk = Chunk {
        id: format!("c{id}"),
        text: String::new(),
        metadata: ChunkMeta { program: program.into(), ..Default::default() },
    };
    ScoredCandidate { chunk: Arc::new(chunk), score, source: if id % 2 == 0 { SourceKind::Dense } else { SourceKind::Sparse } }
}

fn arb_candidates() -> impl Strategy<Value = Vec<ScoredCandidate>> {
    prop::collection::vec((0usize..12, 0.0f32..1.0), 0..40)
        .prop_map(|raw| raw.into_iter().map(|(id, score)| candidate(id, score, "Physics")).collect())
}

proptest! {
    #[test]
    fn fusion_keeps_the_max_per_chunk(cands in arb_candidates()) {
        let mut best: HashMap<String, f32> = HashMap::new();
        for c in &cands {
            let e = best.entry(c.chunk.id.clone()).or_insert(c.score);
            *e = e.max(c.score);
        }
        let fused = fuse(cands.clone());
        prop_assert_eq!(fused.len(), best.len());
        for c in &fused {
            prop_assert_eq!(c.score, best[&c.chunk.id]);
        }
    }

    #[test]
    fn fusion_ignores_duplicate_submission(cands in arb_candidates()) {
        let once = fuse(cands.clone());
        let twice = fuse(cands.iter().cloned().chain(cands.iter().cloned()));
        let view = |v: &[ScoredCandidate]| v.iter().map(|c| (c.chunk.id.clone(), c.score)).collect::<Vec<_>>();
        prop_assert_eq!(view(&once), view(&twice));
    }

    #[test]
    fn unconstrained_intent_keeps_every_candidate(cands in arb_candidates()) {
        let fused = fuse(cands);
        let out = filter_and_boost(fused.clone(), &QueryIntent::default(), &BoostConfig::default());
        prop_assert_eq!(out.candidates.len(), fused.len());
        prop_assert!(!out.relaxed);
        prop_assert!(out.candidates.windows(2).all(|w| w[0].score >= w[1].score));
    }
}

#[test]
fn exact_category_beats_program_only() {
    let cfg = BoostConfig::default();
    let intent = QueryIntent {
        program_slug: Some("physics".into()),
        category: Some(Category::KeyData),
        ..Default::default()
    };
    let mut with_category = candidate(1, 0.5, "Physics");
    Arc::make_mut(&mut with_category.chunk).metadata.category = "keydata".into();
    let without = candidate(2, 0.5, "Physics");

    let out = filter_and_boost(vec![without, with_category], &intent, &cfg);
    assert_eq!(out.candidates[0].chunk.id, "c1");
    assert!(out.candidates[0].score > out.candidates[1].score);
}

#[test]
fn relaxed_program_match_rescues_near_misses() {
    let cfg = BoostConfig::default();
    let intent = QueryIntent { program_slug: Some("quantum-engineer".into()), ..Default::default() };
    let near = candidate(1, 0.5, "Engineering Physics");
    let far = candidate(2, 0.9, "Chemistry");

    let out = filter_and_boost(vec![near, far], &intent, &cfg);
    assert!(out.relaxed);
    assert_eq!(out.candidates.len(), 1);
    assert_eq!(out.candidates[0].chunk.id, "c1");
    assert!((out.candidates[0].score - 0.5 * cfg.relaxed_penalty).abs() < 1e-6);
}

#[test]
fn filters_may_empty_the_set_without_error() {
    let intent = QueryIntent { program_slug: Some("biology".into()), ..Default::default() };
    let out = filter_and_boost(vec![candidate(1, 0.5, "Chemistry")], &intent, &BoostConfig::default());
    assert!(out.candidates.is_empty());
    assert!(out.relaxed);
}
