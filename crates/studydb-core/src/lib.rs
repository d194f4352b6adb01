//! studydb-core
//!
//! Domain types, seams between the retrieval engines, configuration and the
//! read-only document store shared by every other crate in the workspace.
pub mod config;
pub mod corpus;
pub mod error;
pub mod tokenize;
pub mod traits;
pub mod types;
pub mod vocab;

pub use error::{Error, Result};
