use regex::{Regex, RegexBuilder};

use studydb_core::{Error, Result};

/// Whole-word, case-insensitive matcher for a vocabulary keyword or phrase.
/// A trailing plural "s" is accepted so tables only list singular forms.
#[derive(Debug, Clone)]
pub(crate) struct Keyword {
    pub(crate) text: String,
    re: Regex,
}

impl Keyword {
    pub(crate) fn new(text: &str) -> Result<Self> {
        let text = text.trim().to_lowercase();
        if text.is_empty() {
            return Err(Error::InvalidConfig("empty vocabulary keyword".into()));
        }
        let re = compile(&format!(r"\b{}s?\b", regex::escape(&text)))?;
        Ok(Self { text, re })
    }

    pub(crate) fn is_match(&self, haystack: &str) -> bool { self.re.is_match(haystack) }
}

pub(crate) fn keywords(list: &[String]) -> Result<Vec<Keyword>> {
    list.iter().map(|k| Keyword::new(k)).collect()
}

/// Compile a case-insensitive pattern, reporting failures as configuration errors.
pub(crate) fn compile(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| Error::InvalidConfig(format!("invalid pattern '{pattern}': {e}")))
}

/// Alternation of whole words, e.g. degree words stripped before program matching.
pub(crate) fn word_alternation(words: &[String]) -> Result<Option<Regex>> {
    let escaped: Vec<String> = words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .map(regex::escape)
        .collect();
    if escaped.is_empty() {
        return Ok(None);
    }
    compile(&format!(r"\b(?:{})\b", escaped.join("|"))).map(Some)
}

/// "Information Engineering" -> "information-engineering".
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_alphanumeric() || ch == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_matches_whole_words_and_plurals() {
        let k = Keyword::new("Document").unwrap();
        assert!(k.is_match("which documents do i need"));
        assert!(k.is_match("DOCUMENT list"));
        assert!(!k.is_match("documentation"));
    }

    #[test]
    fn phrases_are_escaped() {
        let k = Keyword::new("m.sc").unwrap();
        assert!(k.is_match("an m.sc program"));
        assert!(!k.is_match("an mxsc program"));
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Information & Engineering "), "information-engineering");
        assert_eq!(slugify("Data-Science"), "data-science");
    }
}
