use tracing::debug;

use studydb_core::types::{Category, QueryIntent};
use studydb_core::vocab::Vocabulary;

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Append intent-derived synonyms to the retrieval query. The reranker still
/// sees the original question.
pub fn expand_query(query: &str, intent: &QueryIntent, vocab: &Vocabulary) -> String {
    let mut extra: Vec<String> = Vec::new();
    if intent.temporal_keywords.iter().any(|k| k == "deadline") {
        extra.extend(vocab.deadline_expansion.iter().cloned());
    }
    if intent.category == Some(Category::Apply) {
        extra.extend(vocab.apply_expansion.iter().cloned());
    }
    if let Some(name) = intent.program_name() {
        extra.push(title_case(&name));
    }
    if extra.is_empty() {
        return query.to_string();
    }
    let expanded = format!("{query} {}", extra.join(" "));
    debug!(%query, %expanded, "expanded query");
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_deadline_apply_and_program() {
        let intent = QueryIntent {
            program_slug: Some("information-engineering".into()),
            category: Some(Category::Apply),
            temporal_keywords: vec!["deadline".into()],
            ..Default::default()
        };
        let q = expand_query("deadline?", &intent, &Vocabulary::default());
        assert_eq!(
            q,
            "deadline? application period submission deadline due date admission enrollment registration Information Engineering"
        );
    }

    #[test]
    fn nothing_to_add() {
        assert_eq!(expand_query("hello", &QueryIntent::default(), &Vocabulary::default()), "hello");
    }
}
