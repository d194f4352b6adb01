use std::collections::BTreeSet;

use regex::Regex;
use tracing::debug;

use studydb_core::types::{Category, Degree, IntentType, QueryIntent};
use studydb_core::vocab::Vocabulary;
use studydb_core::{Error, Result};

use crate::patterns::{compile, keywords, slugify, word_alternation, Keyword};

struct CategoryTable {
    category: Category,
    keywords: Vec<(Keyword, u32)>,
}

/// Vocabulary compiled into matchers. Construct once, share across queries.
pub struct IntentExtractor {
    degrees: Vec<(Regex, Degree)>,
    categories: Vec<CategoryTable>,
    specific_threshold: u32,
    degree_words: Option<Regex>,
    programs: Vec<(Regex, String)>,
    program_keywords: Vec<(Keyword, String)>,
    discipline_words: Vec<Keyword>,
    phrase_stop_words: BTreeSet<String>,
    temporal: Vec<Keyword>,
    technical_terms: Vec<Keyword>,
    application: Vec<Keyword>,
    deadline: Keyword,
    for_name_degree: Regex,
    capitalized: Regex,
}

impl IntentExtractor {
    pub fn new(vocab: &Vocabulary) -> Result<Self> {
        let degrees = vocab
            .degree_patterns
            .iter()
            .map(|p| Ok((compile(&p.pattern)?, p.degree)))
            .collect::<Result<Vec<_>>>()?;
        let categories = vocab
            .category_keywords
            .iter()
            .map(|table| {
                let keywords = table
                    .keywords
                    .iter()
                    .map(|k| Ok((Keyword::new(&k.keyword)?, k.weight)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(CategoryTable { category: table.category, keywords })
            })
            .collect::<Result<Vec<_>>>()?;
        let programs = vocab
            .program_patterns
            .iter()
            .map(|p| Ok((compile(&p.pattern)?, p.slug.clone())))
            .collect::<Result<Vec<_>>>()?;
        let program_keywords = vocab
            .program_keywords
            .iter()
            .map(|k| Ok((Keyword::new(&k.keyword)?, k.slug.clone())))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            degrees,
            categories,
            specific_threshold: vocab.specific_threshold,
            degree_words: word_alternation(&vocab.degree_words)?,
            programs,
            program_keywords,
            discipline_words: keywords(&vocab.discipline_words)?,
            phrase_stop_words: vocab.phrase_stop_words.iter().map(|w| w.to_lowercase()).collect(),
            temporal: keywords(&vocab.temporal_keywords)?,
            technical_terms: keywords(&vocab.technical_terms)?,
            application: keywords(&vocab.application_keywords)?,
            deadline: Keyword::new("deadline")?,
            // Only the "for" and the degree word are case-insensitive; the name
            // itself must start with a capital letter.
            for_name_degree: Regex::new(r"\b(?i:for)\s+([A-Z][\w&-]*(?:\s+[\w&-]+)*?)\s+(?i:master|bachelor|msc|bsc)\b")
                .map_err(|e| Error::InvalidConfig(e.to_string()))?,
            capitalized: Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\b")
                .map_err(|e| Error::InvalidConfig(e.to_string()))?,
        })
    }

    /// Parse a question into an intent. Never fails; empty or unrecognized
    /// input yields an unconstrained, general intent.
    pub fn extract(&self, query: &str) -> QueryIntent {
        let query = query.trim();
        if query.is_empty() {
            return QueryIntent::default();
        }
        let lower = query.to_lowercase();

        let mut intent = QueryIntent {
            program_slug: self.detect_program(query, &lower),
            degree: self.detect_degree(&lower),
            entities: self.extract_entities(query, &lower),
            temporal_keywords: self
                .temporal
                .iter()
                .filter(|k| k.is_match(&lower))
                .map(|k| k.text.clone())
                .collect(),
            ..QueryIntent::default()
        };
        if let Some((category, score)) = self.detect_category(&lower) {
            intent.category = Some(category);
            if score >= self.specific_threshold {
                intent.intent_type = IntentType::Specific;
            }
        }
        if !intent.temporal_keywords.is_empty() && self.deadline.is_match(&lower) {
            intent.category = Some(Category::Apply);
            intent.intent_type = IntentType::Specific;
        }

        debug!(
            query,
            program = ?intent.program_slug,
            degree = ?intent.degree,
            category = ?intent.category,
            intent_type = ?intent.intent_type,
            "extracted intent"
        );
        intent
    }

    /// True when the query carries application vocabulary ("apply",
    /// "admission", "how to apply", ...).
    pub fn is_application_query(&self, query: &str) -> bool {
        let lower = query.to_lowercase();
        self.application.iter().any(|k| k.is_match(&lower))
    }

    fn detect_degree(&self, lower: &str) -> Option<Degree> {
        self.degrees.iter().find(|(re, _)| re.is_match(lower)).map(|(_, d)| *d)
    }

    /// Highest keyword-weight sum; earlier tables win ties.
    fn detect_category(&self, lower: &str) -> Option<(Category, u32)> {
        let mut best: Option<(Category, u32)> = None;
        for table in &self.categories {
            let score: u32 = table
                .keywords
                .iter()
                .filter(|(k, _)| k.is_match(lower))
                .map(|(_, w)| *w)
                .sum();
            if score > 0 && best.map_or(true, |(_, s)| score > s) {
                best = Some((table.category, score));
            }
        }
        best
    }

    fn detect_program(&self, query: &str, lower: &str) -> Option<String> {
        let cleaned = match &self.degree_words {
            Some(re) => re.replace_all(lower, " ").into_owned(),
            None => lower.to_string(),
        };

        if let Some((_, slug)) = self.programs.iter().find(|(re, _)| re.is_match(&cleaned)) {
            return Some(slug.clone());
        }

        if self.discipline_words.iter().any(|w| w.is_match(&cleaned)) {
            if let Some((_, slug)) = self.program_keywords.iter().find(|(k, _)| k.is_match(&cleaned)) {
                return Some(slug.clone());
            }
        }

        if let Some(caps) = self.for_name_degree.captures(query) {
            let slug = slugify(&caps[1]);
            if !slug.is_empty() {
                return Some(slug);
            }
        }

        self.longest_capitalized_run(query).map(|run| slugify(&run.join(" ")))
    }

    /// Longest run of two or more consecutive capitalized words that are not
    /// question or stop words. Punctuation ends a run.
    fn longest_capitalized_run<'q>(&self, query: &'q str) -> Option<Vec<&'q str>> {
        let mut best: Vec<&str> = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        for raw in query.split_whitespace() {
            let word = raw.trim_matches(|c: char| !c.is_alphanumeric());
            let capitalized = word.chars().next().is_some_and(char::is_uppercase);
            if capitalized && !self.phrase_stop_words.contains(&word.to_lowercase()) {
                current.push(word);
            } else {
                close_run(&mut current, &mut best);
                continue;
            }
            if raw.ends_with(|c: char| !c.is_alphanumeric()) {
                close_run(&mut current, &mut best);
            }
        }
        close_run(&mut current, &mut best);
        (best.len() >= 2).then_some(best)
    }

    fn extract_entities(&self, query: &str, lower: &str) -> Vec<String> {
        let mut entities: BTreeSet<String> =
            self.capitalized.find_iter(query).map(|m| m.as_str().to_string()).collect();
        entities.extend(self.technical_terms.iter().filter(|t| t.is_match(lower)).map(|t| t.text.clone()));
        entities.into_iter().collect()
    }
}

fn close_run<'q>(current: &mut Vec<&'q str>, best: &mut Vec<&'q str>) {
    if current.len() > best.len() {
        *best = std::mem::take(current);
    }
    current.clear();
}
