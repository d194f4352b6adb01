//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys, e.g.
//! `APP_RETRIEVAL__TOP_K=5`). Provides helpers to expand `~` and `${VAR}` and
//! to resolve relative paths against a known base directory.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::vocab::Vocabulary;

/// Locations of the pre-built artifacts consumed at query time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// JSON-lines export of the chunked corpus.
    pub corpus_path: String,
    pub tantivy_index_dir: String,
    pub lancedb_dir: String,
    pub lancedb_table: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            corpus_path: "data/corpus.jsonl".to_string(),
            tantivy_index_dir: "data/indexes/tantivy".to_string(),
            lancedb_dir: "data/indexes/lancedb".to_string(),
            lancedb_table: "chunks".to_string(),
        }
    }
}

/// Embedding and reranker model identifiers and their local directories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub embed_model: String,
    pub embed_model_dir: String,
    pub embed_max_len: usize,
    pub reranker_model: String,
    pub reranker_model_dir: String,
    pub reranker_max_len: usize,
    /// Use the deterministic hashing embedder instead of loading a model.
    pub use_fake_embeddings: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            embed_model: "BAAI/bge-m3".to_string(),
            embed_model_dir: "models/bge-m3".to_string(),
            embed_max_len: 256,
            reranker_model: "BAAI/bge-reranker-large".to_string(),
            reranker_model_dir: "models/bge-reranker-large".to_string(),
            reranker_max_len: 512,
            use_fake_embeddings: false,
        }
    }
}

/// Candidate counts, rerank blending and per-call timeouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub n_dense: usize,
    pub n_sparse: usize,
    /// Boosted candidates handed to the reranker.
    pub top_m: usize,
    pub top_k: usize,
    pub reranker_batch_size: usize,
    /// `final = logit + boosted * rerank_weight`.
    pub rerank_weight: f32,
    pub min_rerank_score: f32,
    /// Score given to direct-lookup and priority-inserted results.
    pub pinned_score: f32,
    pub query_expansion: bool,
    pub retrieval_timeout_ms: u64,
    pub rerank_timeout_ms: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            n_dense: 40,
            n_sparse: 40,
            top_m: 20,
            top_k: 10,
            reranker_batch_size: 16,
            rerank_weight: 0.1,
            min_rerank_score: -5.0,
            pinned_score: 999.0,
            query_expansion: false,
            retrieval_timeout_ms: 5_000,
            rerank_timeout_ms: 30_000,
        }
    }
}

/// Heuristic weights of the filter/boost stage. None of these has a derivation
/// beyond manual tuning on a handful of queries; recalibrate against real logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostConfig {
    pub program_exact: f32,
    pub program_contains: f32,
    pub program_partial: f32,
    pub category_exact: f32,
    pub category_in_section: f32,
    pub category_loose: f32,
    pub category_in_text: f32,
    /// Category quality when the intent has no category.
    pub category_neutral: f32,
    pub strong_category: f32,
    pub program_weight: f32,
    pub weak_category_weight: f32,
    pub generic_category: f32,
    pub generic_category_weight: f32,
    pub passthrough_quality: f32,
    pub admit_category: f32,
    /// `boost = 1 + quality * boost_scale`.
    pub boost_scale: f32,
    pub relaxed_penalty: f32,
    pub relaxed_min_word_len: usize,
    pub exact_match_boost: f32,
    pub deadline_priority_boost: f32,
    pub chunk_type_boost: f32,
    pub degree_match_boost: f32,
    pub semantic_boost: f32,
    pub semantic_threshold: f32,
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self {
            program_exact: 1.0,
            program_contains: 0.8,
            program_partial: 0.6,
            category_exact: 1.0,
            category_in_section: 0.8,
            category_loose: 0.6,
            category_in_text: 0.4,
            category_neutral: 0.5,
            strong_category: 0.7,
            program_weight: 1.5,
            weak_category_weight: 0.3,
            generic_category: 0.8,
            generic_category_weight: 0.5,
            passthrough_quality: 0.1,
            admit_category: 0.5,
            boost_scale: 2.0,
            relaxed_penalty: 0.8,
            relaxed_min_word_len: 3,
            exact_match_boost: 2.0,
            deadline_priority_boost: 3.0,
            chunk_type_boost: 2.0,
            degree_match_boost: 1.2,
            semantic_boost: 1.5,
            semantic_threshold: 0.8,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataConfig,
    pub models: ModelConfig,
    pub retrieval: RetrievalConfig,
    pub boost: BoostConfig,
    pub vocabulary: Vocabulary,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let r = &self.retrieval;
        if r.top_k == 0 { return Err(Error::InvalidConfig("retrieval.top_k must be > 0".into())); }
        if r.top_m == 0 { return Err(Error::InvalidConfig("retrieval.top_m must be > 0".into())); }
        if r.n_dense == 0 && r.n_sparse == 0 {
            return Err(Error::InvalidConfig("at least one of retrieval.n_dense / n_sparse must be > 0".into()));
        }
        if r.reranker_batch_size == 0 {
            return Err(Error::InvalidConfig("retrieval.reranker_batch_size must be > 0".into()));
        }
        if self.boost.boost_scale < 0.0 {
            return Err(Error::InvalidConfig("boost.boost_scale must be >= 0".into()));
        }
        Ok(())
    }
}

pub struct Config {
    figment: Figment,
    base_dir: PathBuf,
}

impl Config {
    /// Load `config.toml` (and its environment overlay) from the working directory.
    pub fn load() -> Result<Self> { Self::load_from(None) }

    /// Load from an explicit config file; its overlay `config.<env>.toml` is
    /// looked up next to it.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        let main = path.map_or_else(|| PathBuf::from("config.toml"), Path::to_path_buf);
        if path.is_some() && !main.exists() {
            return Err(Error::Initialization(format!("config file {} not found", main.display())));
        }
        let base_dir = main.parent().map(Path::to_path_buf).unwrap_or_default();

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file(&main));
        let overlay = match env_name.as_str() {
            "dev" | "development" => Some("config.dev.toml"),
            "prod" | "production" => Some("config.prod.toml"),
            "test" | "testing" => Some("config.test.toml"),
            _ => None,
        };
        if let Some(overlay) = overlay {
            figment = figment.merge(Toml::file(base_dir.join(overlay)));
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        Ok(Self { figment, base_dir })
    }

    /// Wrap an already-assembled figment (tests, embedding applications).
    pub fn from_figment(figment: Figment, base_dir: PathBuf) -> Self { Self { figment, base_dir } }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{key}': {e}")))
    }

    /// Extract and validate the full settings tree.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Resolve a configured path against the directory holding the config file.
    pub fn resolve(&self, p: &str) -> PathBuf { resolve_with_base(&self.base_dir, p) }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
