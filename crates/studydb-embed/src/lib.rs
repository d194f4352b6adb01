//! studydb-embed
//!
//! Candle-based inference: the BGE-M3 query encoder used by the dense index,
//! the cross-encoder reranker, and a deterministic fake embedder for tests.
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use studydb_core::config::ModelConfig;
use studydb_core::traits::Embedder;

pub mod cross_encoder;
pub mod device;
pub mod embedder;
pub mod fake;
pub mod pool;
pub mod tokenize;
pub mod weights;

pub use cross_encoder::CrossEncoder;
pub use embedder::EmbeddingModel;
pub use fake::FakeEmbedder;
pub use pool::masked_mean_l2;

/// Dimension of BGE-M3 vectors, also used by the fake embedder.
pub const DEFAULT_DIM: usize = 1024;

/// Fake embedder when `models.use_fake_embeddings` (or `APP_USE_FAKE_EMBEDDINGS=1`)
/// is set, otherwise the model found in `model_dir`.
pub fn get_default_embedder(models: &ModelConfig, model_dir: &Path) -> Result<Arc<dyn Embedder>> {
    let env_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
    if models.use_fake_embeddings || env_fake {
        info!("using fake embedder");
        return Ok(Arc::new(FakeEmbedder::new(DEFAULT_DIM)));
    }
    Ok(Arc::new(EmbeddingModel::load(model_dir, models.embed_max_len)?))
}
