use std::fs;
use std::path::PathBuf;

use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use tempfile::TempDir;

use studydb_core::config::{resolve_with_base, Config, Settings};
use studydb_core::corpus::Corpus;
use studydb_core::traits::DocumentStore;
use studydb_core::types::{Category, Chunk, ChunkMeta, Degree};
use studydb_core::Error;

fn chunk(id: &str, program: &str) -> Chunk {
    Chunk {
        id: id.to_string(),
        text: format!("text of {id}"),
        metadata: ChunkMeta { program: program.to_string(), ..Default::default() },
    }
}

#[test]
fn load_jsonl_skips_blank_lines_and_keeps_order() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("corpus.jsonl");
    fs::write(
        &path,
        concat!(
            r#"{"id":"c1","text":"Apply online","metadata":{"program":"Physics","section":"application_process","chunk_index":0,"total_chunks":2}}"#,
            "\n\n",
            r#"{"id":"c2","text":"Curriculum overview","metadata":{"program":"Physics","category":"info"}}"#,
            "\n",
        ),
    )
    .unwrap();

    let corpus = Corpus::load_jsonl(&path).expect("load");
    assert_eq!(corpus.len(), 2);
    assert_eq!(corpus.chunks()[0].id, "c1");
    assert_eq!(corpus.position("c2"), Some(1));
    let c1 = corpus.get("c1").expect("c1 present");
    assert_eq!(c1.metadata.section, "application_process");
    assert_eq!(c1.metadata.total_chunks, Some(2));
    assert!(corpus.get("missing").is_none());
}

#[test]
fn load_jsonl_reports_line_of_bad_record() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("corpus.jsonl");
    fs::write(&path, "{\"id\":\"a\",\"text\":\"x\"}\nnot json\n").unwrap();

    let err = Corpus::load_jsonl(&path).expect_err("invalid line");
    assert!(matches!(err, Error::Initialization(_)));
    assert!(err.to_string().contains(":2:"), "error names the line: {err}");
}

#[test]
fn missing_corpus_is_an_initialization_error() {
    let err = Corpus::load_jsonl(&PathBuf::from("/definitely/not/here.jsonl")).expect_err("missing");
    assert!(matches!(err, Error::Initialization(_)));
}

#[test]
fn duplicate_ids_are_rejected() {
    let err = Corpus::from_chunks(vec![chunk("a", "Physics"), chunk("a", "Mathematics")]).expect_err("dup");
    assert!(err.to_string().contains("duplicate"));
}

#[test]
fn chunk_index_must_be_below_total() {
    let mut bad = chunk("a", "Physics");
    bad.metadata.chunk_index = Some(3);
    bad.metadata.total_chunks = Some(3);
    assert!(Corpus::from_chunks(vec![bad]).is_err());
}

#[test]
fn empty_corpus_is_allowed() {
    let corpus = Corpus::from_chunks(Vec::new()).expect("empty");
    assert!(corpus.is_empty());
}

#[test]
fn settings_defaults_are_valid() {
    let settings = Settings::default();
    settings.validate().expect("defaults validate");
    assert_eq!(settings.retrieval.top_k, 10);
    assert_eq!(settings.retrieval.top_m, 20);
    assert!((settings.retrieval.pinned_score - 999.0).abs() < f32::EPSILON);
    assert!(!settings.retrieval.query_expansion);
}

#[test]
fn toml_overrides_merge_over_defaults() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    fs::write(
        &path,
        r#"
[retrieval]
top_k = 5

[boost]
semantic_threshold = 0.9

[vocabulary]
application_sections = ["application_deadlines"]
"#,
    )
    .unwrap();

    let figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file(&path));
    let config = Config::from_figment(figment, tmp.path().to_path_buf());
    let settings = config.settings().expect("settings");
    assert_eq!(settings.retrieval.top_k, 5);
    assert_eq!(settings.retrieval.n_dense, 40, "untouched keys keep defaults");
    assert!((settings.boost.semantic_threshold - 0.9).abs() < 1e-6);
    assert_eq!(settings.vocabulary.application_sections, vec!["application_deadlines".to_string()]);
    assert!(!settings.vocabulary.degree_patterns.is_empty());

    let top_k: usize = config.get("retrieval.top_k").expect("get");
    assert_eq!(top_k, 5);
    assert!(config.get::<usize>("retrieval.nope").is_err());
}

#[test]
fn zero_top_k_fails_validation() {
    let figment = Figment::from(Serialized::defaults(Settings::default()))
        .merge(Toml::string("[retrieval]\ntop_k = 0\n"));
    let config = Config::from_figment(figment, PathBuf::new());
    assert!(matches!(config.settings(), Err(Error::InvalidConfig(_))));
}

#[test]
fn explicit_missing_config_file_errors() {
    assert!(Config::load_from(Some(std::path::Path::new("/no/such/config.toml"))).is_err());
}

#[test]
fn relative_paths_resolve_against_config_dir() {
    let base = PathBuf::from("/srv/studydb");
    assert_eq!(resolve_with_base(&base, "data/corpus.jsonl"), base.join("data/corpus.jsonl"));
    assert_eq!(resolve_with_base(&base, "/abs/corpus.jsonl"), PathBuf::from("/abs/corpus.jsonl"));
}

#[test]
fn degree_and_category_parse_case_insensitively() {
    assert_eq!("MSc".parse::<Degree>().unwrap(), Degree::Msc);
    assert_eq!(" Apply ".parse::<Category>().unwrap(), Category::Apply);
    assert!("diploma".parse::<Degree>().is_err());
}
