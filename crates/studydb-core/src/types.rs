//! Domain types shared by the intent extractor, the retrieval engines and the
//! fusion pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::Error;

pub type ChunkId = String;

/// A hyperlink scraped alongside a passage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub text: String,
    pub url: String,
}

/// Metadata attached to every chunk by corpus preparation.
///
/// `degree` and `category` are kept as the raw strings found in the export;
/// the booster compares them case-insensitively against the parsed intent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkMeta {
    pub program: String,
    pub slug: String,
    pub degree: String,
    pub category: String,
    pub section: String,
    pub chunk_index: Option<usize>,
    pub total_chunks: Option<usize>,
    pub links: Vec<Link>,
    pub chunk_type: Option<String>,
}

/// An immutable unit of retrievable text.
///
/// - `id`: unique across the corpus
/// - `text`: passage content handed to the reranker
/// - `metadata`: program/degree/category/section labels used for boosting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    #[serde(default)]
    pub metadata: ChunkMeta,
}

/// Indicates which retrieval signal produced a candidate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Dense,
    Sparse,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dense => f.write_str("dense"),
            Self::Sparse => f.write_str("sparse"),
        }
    }
}

/// A chunk paired with a stage-local score. Higher is always better, but the
/// meaning of `score` depends on the stage that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    pub chunk: Arc<Chunk>,
    pub score: f32,
    pub source: SourceKind,
}

/// A row of the final ranking.
///
/// `score` is the rerank score (or the pinned score for priority results);
/// `boosted` is the filter/boost score the row was ranked from.
#[derive(Debug, Clone, Serialize)]
pub struct RankedResult {
    pub chunk: Arc<Chunk>,
    pub score: f32,
    pub boosted: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Degree {
    Msc,
    Bsc,
    Phd,
    Ma,
    Ba,
}

impl Degree {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Msc => "msc",
            Self::Bsc => "bsc",
            Self::Phd => "phd",
            Self::Ma => "ma",
            Self::Ba => "ba",
        }
    }
}

impl fmt::Display for Degree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Degree {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "msc" | "master" => Ok(Self::Msc),
            "bsc" | "bachelor" => Ok(Self::Bsc),
            "phd" | "doctorate" => Ok(Self::Phd),
            "ma" => Ok(Self::Ma),
            "ba" => Ok(Self::Ba),
            other => Err(Error::InvalidConfig(format!("unknown degree '{other}'"))),
        }
    }
}

/// Information category of a passage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Info,
    Apply,
    #[serde(rename = "keydata")]
    KeyData,
    Desc,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Apply => "apply",
            Self::KeyData => "keydata",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "apply" => Ok(Self::Apply),
            "keydata" => Ok(Self::KeyData),
            "desc" => Ok(Self::Desc),
            other => Err(Error::InvalidConfig(format!("unknown category '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentType {
    Specific,
    #[default]
    General,
}

/// Structured reading of a free-text question. Created per query and
/// discarded when the query completes; `None` fields are unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryIntent {
    pub program_slug: Option<String>,
    pub degree: Option<Degree>,
    pub category: Option<Category>,
    pub intent_type: IntentType,
    pub entities: Vec<String>,
    pub temporal_keywords: Vec<String>,
}

impl QueryIntent {
    /// True when at least one metadata filter (program or category) is set.
    pub fn has_filters(&self) -> bool {
        self.program_slug.is_some() || self.category.is_some()
    }

    /// The program filter in the readable form used against `ChunkMeta::program`
    /// ("information-engineering" -> "information engineering").
    pub fn program_name(&self) -> Option<String> {
        self.program_slug
            .as_deref()
            .map(|slug| slug.replace('-', " ").to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_meta_defaults_missing_fields() {
        let chunk: Chunk = serde_json::from_str(r#"{"id":"a","text":"t","metadata":{"program":"Physics"}}"#)
            .expect("parse");
        assert_eq!(chunk.metadata.program, "Physics");
        assert!(chunk.metadata.section.is_empty());
        assert_eq!(chunk.metadata.chunk_index, None);
    }

    #[test]
    fn category_round_trips_keydata_spelling() {
        assert_eq!("keydata".parse::<Category>().expect("parse"), Category::KeyData);
        assert_eq!(serde_json::to_string(&Category::KeyData).expect("ser"), "\"keydata\"");
    }

    #[test]
    fn program_name_unslugs() {
        let intent = QueryIntent { program_slug: Some("information-engineering".into()), ..Default::default() };
        assert_eq!(intent.program_name().as_deref(), Some("information engineering"));
        assert!(intent.has_filters());
        assert!(!QueryIntent::default().has_filters());
    }
}
