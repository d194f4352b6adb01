//! Query tokenization shared by the sparse retriever and the in-memory BM25
//! index: lowercase, then keep maximal runs of word characters (`\w+`).

use std::sync::LazyLock;

use regex::Regex;

static WORD: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\w+").ok());

pub fn tokenize(text: &str) -> Vec<String> {
    let Some(word) = WORD.as_ref() else { return Vec::new() };
    word.find_iter(&text.to_lowercase()).map(|m| m.as_str().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::tokenize;

    #[test]
    fn splits_on_punctuation_and_lowercases() {
        assert_eq!(tokenize("Deadline: M.Sc. Informatik_2025?"), vec!["deadline", "m", "sc", "informatik_2025"]);
    }

    #[test]
    fn combining_marks_stay_in_the_word() {
        assert_eq!(tokenize("Cafe\u{301} Menu"), vec!["cafe\u{301}", "menu"]);
        assert_eq!(tokenize("information_engineering"), vec!["information_engineering"]);
    }

    #[test]
    fn empty_and_symbol_only_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("?! -- ...").is_empty());
    }
}
