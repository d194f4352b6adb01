//! Wiring shared by the studydb binaries: logging setup and assembling the
//! hybrid retriever from configured on-disk indexes and models.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use studydb_core::config::Config;
use studydb_core::corpus::Corpus;
use studydb_core::traits::{CandidateRetriever, DocumentStore, Reranker};
use studydb_embed::{get_default_embedder, CrossEncoder};
use studydb_hybrid::HybridRetriever;
use studydb_text::{SparseRetriever, TantivySparseIndex};
use studydb_vector::{DenseRetriever, LanceDenseIndex};

/// Logs go to stderr so JSON on stdout stays clean. `RUST_LOG` wins over the
/// verbosity flag.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

pub async fn build_retriever(config: &Config) -> anyhow::Result<HybridRetriever> {
    let settings = config.settings()?;
    let data = &settings.data;
    let models = &settings.models;

    let corpus = Arc::new(Corpus::load_jsonl(&config.resolve(&data.corpus_path))?);
    let store: Arc<dyn DocumentStore> = corpus;
    info!(chunks = store.len(), "corpus loaded");

    let embedder = get_default_embedder(models, &config.resolve(&models.embed_model_dir))?;
    let lance = LanceDenseIndex::open(&config.resolve(&data.lancedb_dir), &data.lancedb_table, embedder).await?;
    let dense: Arc<dyn CandidateRetriever> = Arc::new(DenseRetriever::new(Arc::new(lance), Arc::clone(&store)));

    let tantivy = TantivySparseIndex::open(&config.resolve(&data.tantivy_index_dir), store.chunks())?;
    let sparse: Arc<dyn CandidateRetriever> = Arc::new(SparseRetriever::new(Arc::new(tantivy), Arc::clone(&store)));

    let reranker: Arc<dyn Reranker> =
        Arc::new(CrossEncoder::load(&config.resolve(&models.reranker_model_dir), models.reranker_max_len)?);

    Ok(HybridRetriever::new(settings, store, dense, sparse, reranker)?)
}
