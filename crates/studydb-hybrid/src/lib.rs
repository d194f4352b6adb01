//! studydb-hybrid
//!
//! The query-time pipeline: intent → (application lookup | dense + sparse
//! retrieval → fusion → filter/boost → rerank) → ranked results.
pub mod boost;
pub mod eval;
pub mod expand;
pub mod fusion;
pub mod lookup;
pub mod pipeline;
pub mod rerank;

pub use pipeline::{HybridRetriever, QueryOptions, SearchOutcome, Strategy};
