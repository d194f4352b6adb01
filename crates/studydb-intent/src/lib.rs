//! Rule-based query intent extraction: degree, category, program slug,
//! temporal cues and entities from a free-text question.
pub mod extractor;
mod patterns;

pub use extractor::IntentExtractor;
pub use patterns::slugify;
