//! studydb-vector
//!
//! Dense retrieval: a LanceDB-backed `DenseIndex`, a flat in-memory cosine
//! index, and the `DenseRetriever` that converts distances into similarities.
pub mod flat;
pub mod lance;
pub mod retriever;
pub mod schema;
pub mod table;

pub use flat::FlatDenseIndex;
pub use lance::LanceDenseIndex;
pub use retriever::DenseRetriever;
