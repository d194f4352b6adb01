use anyhow::{anyhow, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use std::collections::HashMap;
use std::path::Path;
use tokenizers::Tokenizer;
use tracing::info;

/// Prefer `model.safetensors` (memory-mapped), fall back to `pytorch_model.bin`.
pub fn load_var_builder(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        info!(path = %safetensors.display(), "loading weights");
        // SAFETY: the weights file is mapped read-only and must not change while the model is alive.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, device)? };
        return Ok(vb);
    }
    let weights_path = model_dir.join("pytorch_model.bin");
    info!(path = %weights_path.display(), "loading weights");
    let weights = candle_core::pickle::read_all(&weights_path)
        .with_context(|| format!("read weights from {}", weights_path.display()))?;
    let weights_map: HashMap<String, Tensor> = weights.into_iter().collect();
    Ok(VarBuilder::from_tensors(weights_map, DType::F32, device))
}

pub fn load_tokenizer(model_dir: &Path) -> Result<Tokenizer> {
    let tokenizer_path = model_dir.join("tokenizer.json");
    Tokenizer::from_file(&tokenizer_path)
        .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))
}

pub fn load_config<T: serde::de::DeserializeOwned>(model_dir: &Path) -> Result<T> {
    let config_path = model_dir.join("config.json");
    let raw = std::fs::read_to_string(&config_path).with_context(|| format!("read {}", config_path.display()))?;
    Ok(serde_json::from_str(&raw)?)
}
