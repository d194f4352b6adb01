use anyhow::{ensure, Result};
use candle_core::Device;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use std::path::Path;
use std::time::Instant;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use studydb_core::traits::Embedder;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_on_device;
use crate::weights::{load_config, load_tokenizer, load_var_builder};

/// BGE-M3 (XLM-RoBERTa) sentence encoder: mean pooling + L2 normalization.
pub struct EmbeddingModel { model: XLMRobertaModel, tokenizer: Tokenizer, device: Device, dim: usize, max_len: usize }

impl EmbeddingModel {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading embedding model");
        let tokenizer = load_tokenizer(model_dir)?;
        let config: XLMRobertaConfig = load_config(model_dir)?;
        let dim = config.hidden_size;
        let vb = load_var_builder(model_dir, &device)?;
        let model = XLMRobertaModel::new(&config, vb)?;
        info!(dim, "embedding model loaded");
        Ok(Self { model, tokenizer, device, dim, max_len })
    }

    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_on_device(&self.tokenizer, text, self.max_len, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden_states = self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let emb = masked_mean_l2(&hidden_states, &attention_mask)?;
        let emb: Vec<f32> = emb.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1()?;
        ensure!(emb.len() == self.dim, "embedding has {} dims, expected {}", emb.len(), self.dim);
        debug!(elapsed_ms = start.elapsed().as_millis(), "embedded text");
        Ok(emb)
    }
}

impl Embedder for EmbeddingModel {
    fn dim(&self) -> usize { self.dim }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_text(t)).collect()
    }
}
