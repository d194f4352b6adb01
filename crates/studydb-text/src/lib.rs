//! studydb-text
//!
//! Lexical retrieval over the chunk corpus: a Tantivy-backed `SparseIndex`, an
//! in-memory BM25 Okapi index, and the `SparseRetriever` that normalizes their
//! raw scores into similarities.

pub mod bm25;
pub mod index;
pub mod retriever;
pub mod tantivy_utils;

pub use bm25::Bm25Index;
pub use index::TantivySparseIndex;
pub use retriever::SparseRetriever;
