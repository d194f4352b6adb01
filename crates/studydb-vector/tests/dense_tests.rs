use std::sync::Arc;

use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray};
use studydb_core::corpus::Corpus;
use studydb_core::traits::{CandidateRetriever, DenseIndex, Embedder};
use studydb_core::types::{Chunk, ChunkId, ChunkMeta, SourceKind};
use studydb_embed::FakeEmbedder;
use studydb_vector::retriever::similarity;
use studydb_vector::schema::build_arrow_schema;
use studydb_vector::table::open_db;
use studydb_vector::{DenseRetriever, FlatDenseIndex, LanceDenseIndex};

const DIM: usize = 32;

fn texts() -> Vec<(&'static str, &'static str)> {
    vec![
        ("ie-deadline", "information engineering application deadline"),
        ("ie-curriculum", "information engineering curriculum modules"),
        ("phys-docs", "physics application documents transcript"),
    ]
}

fn corpus() -> Arc<Corpus> {
    let chunks = texts()
        .into_iter()
        .map(|(id, text)| Chunk { id: id.into(), text: text.into(), metadata: ChunkMeta::default() })
        .collect();
    Arc::new(Corpus::from_chunks(chunks).expect("corpus"))
}

fn entries(embedder: &FakeEmbedder) -> Vec<(ChunkId, Vec<f32>)> {
    texts().into_iter().map(|(id, text)| (id.to_string(), embedder.embed_text(text))).collect()
}

struct FixedHits(Vec<(ChunkId, f32)>);

impl DenseIndex for FixedHits {
    fn search(&self, _query: &str, k: usize) -> anyhow::Result<Vec<(ChunkId, f32)>> {
        Ok(self.0.iter().take(k).cloned().collect())
    }
}

#[test]
fn flat_index_finds_identical_text_first() {
    let embedder = FakeEmbedder::new(DIM);
    let index = FlatDenseIndex::new(entries(&embedder), Arc::new(FakeEmbedder::new(DIM))).expect("index");
    let retriever = DenseRetriever::new(Arc::new(index), corpus());
    let hits = retriever.retrieve("physics application documents transcript", 2).expect("retrieve");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].chunk.id, "phys-docs");
    assert!((hits[0].score - 1.0).abs() < 1e-4);
    assert!(hits.iter().all(|h| h.source == SourceKind::Dense && (0.0..=1.0).contains(&h.score)));
}

#[test]
fn flat_index_rejects_wrong_dimension() {
    let embedder = Arc::new(FakeEmbedder::new(DIM));
    assert!(FlatDenseIndex::new(vec![("x".into(), vec![0.0; DIM + 1])], embedder).is_err());
}

#[test]
fn unknown_ids_are_dropped_and_order_kept() {
    let index = FixedHits(vec![
        ("phys-docs".into(), 0.1),
        ("ghost".into(), 0.2),
        ("ie-deadline".into(), 0.4),
    ]);
    let retriever = DenseRetriever::new(Arc::new(index), corpus());
    let hits = retriever.retrieve("anything", 3).expect("retrieve");
    let ids: Vec<&str> = hits.iter().map(|h| h.chunk.id.as_str()).collect();
    assert_eq!(ids, vec!["phys-docs", "ie-deadline"]);
    assert!((hits[0].score - 0.9).abs() < 1e-6);
}

#[test]
fn similarity_is_clamped_not_rescaled() {
    assert!((similarity(-0.25) - 1.0).abs() < f32::EPSILON);
    assert!((similarity(0.25) - 0.75).abs() < 1e-6);
    assert_eq!(similarity(1.7), 0.0);
    assert_eq!(similarity(f32::NAN), 0.0);
}

async fn write_table(db_dir: &std::path::Path, name: &str, embedder: &FakeEmbedder) -> anyhow::Result<()> {
    let conn = open_db(db_dir.to_string_lossy().as_ref()).await?;
    let schema = build_arrow_schema(i32::try_from(DIM)?);
    let rows = entries(embedder);
    let ids: Vec<String> = rows.iter().map(|(id, _)| id.clone()).collect();
    let programs: Vec<Option<&str>> = rows.iter().map(|_| Some("Information Engineering")).collect();
    let sections: Vec<Option<&str>> = rows.iter().map(|_| None).collect();
    let vectors: Vec<Option<Vec<Option<f32>>>> =
        rows.iter().map(|(_, v)| Some(v.iter().map(|&x| Some(x)).collect())).collect();
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(programs)),
            Arc::new(StringArray::from(sections)),
            Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(
                vectors.into_iter(),
                i32::try_from(DIM)?,
            )),
        ],
    )?;
    let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
    conn.create_table(name, reader).execute().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn lance_index_round_trip() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let embedder = FakeEmbedder::new(DIM);
    write_table(tmp.path(), "chunks", &embedder).await?;

    let query_embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(DIM));
    let index = Arc::new(LanceDenseIndex::open(tmp.path(), "chunks", query_embedder).await?);
    let retriever = DenseRetriever::new(index, corpus());
    let hits = tokio::task::spawn_blocking(move || retriever.retrieve("information engineering application deadline", 2))
        .await??;
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].chunk.id, "ie-deadline");
    assert!(hits[0].score > 0.99, "identical vector has cosine distance ~0: {}", hits[0].score);
    assert!(hits[0].score >= hits[1].score);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn lance_open_checks_table_and_dimension() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let embedder = FakeEmbedder::new(DIM);
    write_table(tmp.path(), "chunks", &embedder).await?;

    let missing = LanceDenseIndex::open(tmp.path(), "nope", Arc::new(FakeEmbedder::new(DIM))).await;
    assert!(missing.is_err());
    let wrong_dim = LanceDenseIndex::open(tmp.path(), "chunks", Arc::new(FakeEmbedder::new(DIM * 2))).await;
    assert!(wrong_dim.is_err());
    let no_dir = LanceDenseIndex::open(&tmp.path().join("absent"), "chunks", Arc::new(FakeEmbedder::new(DIM))).await;
    assert!(no_dir.is_err());
    Ok(())
}
