use std::sync::Arc;

use studydb_core::types::{Chunk, ChunkMeta, RankedResult};
use studydb_hybrid::eval::{evaluate, judge, EvalCase};

fn result(program: &str, text: &str) -> RankedResult {
    let chunk = Chunk { id: format!("{program}:{text}"), text: text.into(), metadata: ChunkMeta { program: program.into(), ..Default::default() } };
    RankedResult { chunk: Arc::new(chunk), score: 1.0, boosted: 1.0 }
}

fn case(query: &str, program: &str, info: Option<&str>) -> EvalCase {
    EvalCase { query: query.into(), expected_program: program.into(), expected_info: info.map(str::to_string) }
}

#[test]
fn first_match_sets_the_rank() {
    let c = case("q", "Physics", None);
    let j = judge(&c, &[result("Chemistry", "a"), result("physics", "b"), result("Physics", "c")], 2);
    assert_eq!(j.first_hit, Some(2));
    assert!((j.precision - 0.5).abs() < 1e-6);
    assert_eq!(j.relevance, vec![0.0, 1.0, 1.0]);
}

#[test]
fn expected_info_adds_half_a_point() {
    let c = case("q", "Physics", Some("15 July"));
    let j = judge(&c, &[result("Physics", "deadline is 15 July"), result("Chemistry", "also 15 July")], 5);
    assert_eq!(j.relevance, vec![1.5, 0.5]);
}

#[test]
fn aggregate_metrics() {
    let hit_first = judge(&case("a", "Physics", None), &[result("Physics", "x")], 3);
    let hit_third = judge(
        &case("b", "Physics", None),
        &[result("Chemistry", "x"), result("Chemistry", "y"), result("Physics", "z")],
        3,
    );
    let miss = judge(&case("c", "Physics", None), &[result("Chemistry", "x")], 3);

    let report = evaluate(vec![hit_first, hit_third, miss], 3);
    assert_eq!(report.queries, 3);
    assert!((report.recall_at_k - 2.0 / 3.0).abs() < 1e-6);
    assert!((report.mrr - (1.0 + 1.0 / 3.0) / 3.0).abs() < 1e-6);
    assert!((report.precision_at_k - (1.0 / 3.0 + 1.0 / 3.0) / 3.0).abs() < 1e-6);
    // hit_first is ideal (1.0); hit_third is 0.5/1.0; miss scores 0.
    assert!((report.ndcg_at_k - 1.5 / 3.0).abs() < 1e-6);
}

#[test]
fn empty_report_is_zero() {
    let report = evaluate(Vec::new(), 5);
    assert_eq!(report.queries, 0);
    assert_eq!(report.mrr, 0.0);
}

#[test]
fn cases_parse_from_json() {
    let cases: Vec<EvalCase> = serde_json::from_str(
        r#"[{"query": "deadline?", "expected_program": "Physics"},
            {"query": "docs", "expected_program": "Physics", "expected_info": "transcript"}]"#,
    )
    .expect("cases");
    assert_eq!(cases.len(), 2);
    assert!(cases[0].expected_info.is_none());
    assert_eq!(cases[1].expected_info.as_deref(), Some("transcript"));
}
