//! BM25 Okapi over pre-tokenized documents, kept entirely in memory.
//!
//! Follows the classic Okapi formulation: `idf = ln((N - df + 0.5) / (df + 0.5))`,
//! with negative idf values (terms in more than half the documents) floored to
//! `EPSILON * mean_idf`.

use std::collections::HashMap;
use std::sync::Arc;

use studydb_core::tokenize::tokenize;
use studydb_core::traits::SparseIndex;
use studydb_core::types::Chunk;

pub const K1: f32 = 1.5;
pub const B: f32 = 0.75;
pub const EPSILON: f32 = 0.25;

pub struct Bm25Index {
	term_freqs: Vec<HashMap<String, u32>>,
	doc_lengths: Vec<usize>,
	avgdl: f32,
	idf: HashMap<String, f32>,
}

impl Bm25Index {
	pub fn from_chunks(chunks: &[Arc<Chunk>]) -> Self {
		Self::new(chunks.iter().map(|c| tokenize(&c.text)).collect())
	}

	pub fn new(corpus: Vec<Vec<String>>) -> Self {
		let mut doc_freq: HashMap<String, u32> = HashMap::new();
		let mut term_freqs = Vec::with_capacity(corpus.len());
		let mut doc_lengths = Vec::with_capacity(corpus.len());
		for doc in corpus {
			let mut tf: HashMap<String, u32> = HashMap::new();
			for token in &doc {
				*tf.entry(token.clone()).or_insert(0) += 1;
			}
			for term in tf.keys() {
				*doc_freq.entry(term.clone()).or_insert(0) += 1;
			}
			doc_lengths.push(doc.len());
			term_freqs.push(tf);
		}

		let n = term_freqs.len() as f32;
		let total: usize = doc_lengths.iter().sum();
		let avgdl = if doc_lengths.is_empty() { 0.0 } else { total as f32 / n };

		let mut idf: HashMap<String, f32> = HashMap::with_capacity(doc_freq.len());
		let mut idf_sum = 0.0_f32;
		let mut negative = Vec::new();
		for (term, df) in doc_freq {
			let df = df as f32;
			let value = ((n - df + 0.5) / (df + 0.5)).ln();
			idf_sum += value;
			if value < 0.0 { negative.push(term.clone()); }
			idf.insert(term, value);
		}
		if !idf.is_empty() {
			let floor = EPSILON * idf_sum / idf.len() as f32;
			for term in negative { idf.insert(term, floor); }
		}

		Self { term_freqs, doc_lengths, avgdl, idf }
	}

	pub fn len(&self) -> usize { self.term_freqs.len() }

	pub fn is_empty(&self) -> bool { self.term_freqs.is_empty() }

	/// One score per document, in corpus order.
	pub fn scores(&self, tokens: &[String]) -> Vec<f32> {
		let avgdl = if self.avgdl > 0.0 { self.avgdl } else { 1.0 };
		self.term_freqs
			.iter()
			.zip(&self.doc_lengths)
			.map(|(tf, &dl)| {
				let norm = K1 * (1.0 - B + B * dl as f32 / avgdl);
				tokens
					.iter()
					.map(|t| {
						let f = tf.get(t).copied().unwrap_or(0) as f32;
						let idf = self.idf.get(t).copied().unwrap_or(0.0);
						idf * (f * (K1 + 1.0)) / (f + norm)
					})
					.sum()
			})
			.collect()
	}
}

impl SparseIndex for Bm25Index {
	fn score(&self, tokens: &[String]) -> anyhow::Result<Vec<f32>> { Ok(self.scores(tokens)) }
}
