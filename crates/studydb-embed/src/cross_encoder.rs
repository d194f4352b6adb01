//! Pairwise relevance model (bge-reranker style): XLM-RoBERTa with a single
//! logit classification head over `(query, passage)` pairs.
use anyhow::{anyhow, Result};
use candle_core::{DType, Device};
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaForSequenceClassification};
use std::path::Path;
use std::time::Instant;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use studydb_core::traits::Reranker;

use crate::device::select_device;
use crate::tokenize::tokenize_pairs_on_device;
use crate::weights::{load_config, load_tokenizer, load_var_builder};

pub struct CrossEncoder { model: XLMRobertaForSequenceClassification, tokenizer: Tokenizer, device: Device }

impl CrossEncoder {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), max_len, "loading reranker model");
        let mut tokenizer = load_tokenizer(model_dir)?;
        tokenizer
            .with_truncation(Some(TruncationParams { max_length: max_len, ..Default::default() }))
            .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;
        let config: XLMRobertaConfig = load_config(model_dir)?;
        let vb = load_var_builder(model_dir, &device)?;
        let model = XLMRobertaForSequenceClassification::new(1, &config, vb)?;
        Ok(Self { model, tokenizer, device })
    }
}

impl Reranker for CrossEncoder {
    /// Raw logits, one per pair. Callers batch; the whole slice runs as one forward pass.
    fn predict(&self, pairs: &[(String, String)]) -> Result<Vec<f32>> {
        if pairs.is_empty() { return Ok(Vec::new()); }
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_pairs_on_device(&self.tokenizer, pairs, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let logits = self.model.forward(&input_ids, &attention_mask, &token_type_ids)?;
        let scores: Vec<f32> = logits.to_dtype(DType::F32)?.to_device(&Device::Cpu)?.flatten_all()?.to_vec1()?;
        if scores.len() != pairs.len() {
            return Err(anyhow!("reranker returned {} logits for {} pairs", scores.len(), pairs.len()));
        }
        debug!(pairs = pairs.len(), elapsed_ms = start.elapsed().as_millis(), "reranked batch");
        Ok(scores)
    }
}
