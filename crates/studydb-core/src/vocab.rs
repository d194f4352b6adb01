//! Keyword tables that drive intent extraction and the application lookup.
//!
//! The tables are plain configuration data: they deserialize from the
//! `[vocabulary]` section of the config and are compiled once by the intent
//! extractor. Keywords match whole words case-insensitively, with an optional
//! trailing "s", so only singular forms are listed.

use serde::{Deserialize, Serialize};

use crate::types::{Category, Degree};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegreePattern {
    /// Regular expression applied to the lowercased query.
    pub pattern: String,
    pub degree: Degree,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedKeyword {
    pub keyword: String,
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryKeywords {
    pub category: Category,
    pub keywords: Vec<WeightedKeyword>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramPattern {
    /// Regular expression applied to the lowercased query with degree words removed.
    pub pattern: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramKeyword {
    pub keyword: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    /// Ordered; the first matching pattern decides the degree.
    pub degree_patterns: Vec<DegreePattern>,
    /// Ordered; declaration order breaks score ties.
    pub category_keywords: Vec<CategoryKeywords>,
    /// Winning category score at or above this makes the intent "specific".
    pub specific_threshold: u32,
    pub program_patterns: Vec<ProgramPattern>,
    pub program_keywords: Vec<ProgramKeyword>,
    /// A fuzzy program keyword only counts when one of these co-occurs.
    pub discipline_words: Vec<String>,
    /// Stripped from the query before program matching.
    pub degree_words: Vec<String>,
    pub temporal_keywords: Vec<String>,
    pub technical_terms: Vec<String>,
    /// Capitalized words ignored by the program-name heuristic.
    pub phrase_stop_words: Vec<String>,
    /// Any of these in a query (with a program) enables the application lookup.
    pub application_keywords: Vec<String>,
    /// Application sections in priority order.
    pub application_sections: Vec<String>,
    pub deadline_expansion: Vec<String>,
    pub apply_expansion: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> { list.iter().map(|s| (*s).to_string()).collect() }

fn weighted(list: &[(&str, u32)]) -> Vec<WeightedKeyword> {
    list.iter().map(|(k, w)| WeightedKeyword { keyword: (*k).to_string(), weight: *w }).collect()
}

impl Default for Vocabulary {
    fn default() -> Self {
        let degree = |pattern: &str, degree| DegreePattern { pattern: pattern.to_string(), degree };
        let program = |pattern: &str, slug: &str| ProgramPattern { pattern: pattern.to_string(), slug: slug.to_string() };
        let keyword = |keyword: &str, slug: &str| ProgramKeyword { keyword: keyword.to_string(), slug: slug.to_string() };
        Self {
            degree_patterns: vec![
                degree(r"\bmasters?\b|\bmsc\b|\bm\.sc\b", Degree::Msc),
                degree(r"\bbachelors?\b|\bbsc\b|\bb\.sc\b", Degree::Bsc),
                degree(r"\bphd\b|\bdoctor", Degree::Phd),
                degree(r"\bma\b", Degree::Ma),
                degree(r"\bba\b", Degree::Ba),
            ],
            category_keywords: vec![
                CategoryKeywords {
                    category: Category::Apply,
                    keywords: weighted(&[
                        ("deadline", 3), ("when", 3), ("how to apply", 3), ("apply", 3),
                        ("document", 2), ("requirement", 2),
                        ("application", 1), ("admission", 1), ("submit", 1), ("procedure", 1),
                        ("certificate", 1), ("transcript", 1), ("fee", 1), ("status", 1),
                        ("due", 1), ("date", 1), ("period", 1), ("timeline", 1), ("schedule", 1),
                    ]),
                },
                CategoryKeywords {
                    category: Category::KeyData,
                    keywords: weighted(&[
                        ("cost", 2), ("credit", 1), ("ects", 1), ("language", 1), ("price", 1),
                        ("tuition", 1), ("duration", 1), ("semester", 1), ("year", 1),
                    ]),
                },
                CategoryKeywords {
                    category: Category::Info,
                    keywords: weighted(&[
                        ("curriculum", 1), ("structure", 1), ("course", 1), ("module", 1),
                        ("overview", 1), ("about", 1), ("description", 1), ("what is", 1),
                    ]),
                },
            ],
            specific_threshold: 3,
            program_patterns: vec![
                program(r"\b(information|informatik)\s+(engineering|ingenieurwesen)\b", "information-engineering"),
                program(r"\b(computer|computing)\s+(science|informatics|informatik)\b", "computer-science"),
                program(r"\b(data|daten)\s+(engineering|science|wissenschaft)\b", "data-engineering"),
                program(r"\b(electrical|elektro)\s+(engineering|technik)\b", "electrical-engineering"),
                program(r"\b(mechanical|maschinen)\s+(engineering|bau)\b", "mechanical-engineering"),
                program(r"\b(bioprocess|bio)\s+(engineering|technik)\b", "bioprocess-engineering"),
                program(r"\binformatics?\b", "informatics"),
                program(r"\bmathematics?\b", "mathematics"),
                program(r"\bphysics?\b", "physics"),
            ],
            program_keywords: vec![
                keyword("information", "information-engineering"),
                keyword("computer", "computer-science"),
                keyword("data", "data-engineering"),
                keyword("electrical", "electrical-engineering"),
            ],
            discipline_words: words(&["engineering", "science"]),
            degree_words: words(&["master", "masters", "bachelor", "bachelors", "msc", "bsc", "phd", "degree", "program", "programme"]),
            temporal_keywords: words(&[
                "when", "deadline", "due", "date", "period", "timeline", "schedule",
                "winter", "summer", "semester", "application period", "until",
            ]),
            technical_terms: words(&["engineering", "science", "informatics", "mathematics", "physics", "chemistry"]),
            phrase_stop_words: words(&[
                "what", "when", "where", "which", "who", "how", "why", "is", "are", "can", "do", "does",
                "the", "a", "an", "i", "deadline", "application", "admission", "documents", "master",
                "bachelor", "program", "programme", "degree",
            ]),
            application_keywords: words(&["how to apply", "apply", "application", "admission", "enrollment", "enrolment", "enroll"]),
            application_sections: words(&[
                "application_process",
                "admission_process",
                "additional_admission_requirements",
                "application_deadlines",
                "documents_required_for_online_application",
                "documents_required_for_enrollment",
            ]),
            deadline_expansion: words(&["application period", "submission deadline", "due date"]),
            apply_expansion: words(&["admission", "enrollment", "registration"]),
        }
    }
}
