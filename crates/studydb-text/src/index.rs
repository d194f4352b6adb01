use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Value};
use tantivy::tokenizer::TextAnalyzer;
use tantivy::{doc, Index, IndexReader, IndexWriter, TantivyDocument, Term};
use tracing::{debug, info, warn};

use studydb_core::traits::SparseIndex;
use studydb_core::types::{Chunk, ChunkId};

use crate::tantivy_utils::{build_schema, register_tokenizer};

/// Tantivy-backed lexical index. Hits are mapped back to corpus positions
/// through the stored `id` field, so scores line up with the document store
/// regardless of the index's internal doc order.
pub struct TantivySparseIndex {
	reader: IndexReader,
	id_field: Field,
	text_field: Field,
	/// Analyzer the `text` field was indexed with; query tokens go through it too.
	analyzer: TextAnalyzer,
	positions: HashMap<ChunkId, usize>,
}

impl TantivySparseIndex {
	/// Open a pre-built index directory for the given corpus ordering.
	pub fn open(index_dir: &Path, chunks: &[Arc<Chunk>]) -> Result<Self> {
		let index = Index::open_in_dir(index_dir)
			.with_context(|| format!("open tantivy index at {}", index_dir.display()))?;
		register_tokenizer(&index);
		Self::from_index(&index, chunks)
	}

	/// Index `chunks` into RAM. Meant for small corpora and tests.
	pub fn in_memory(chunks: &[Arc<Chunk>]) -> Result<Self> {
		let schema = build_schema();
		let index = Index::create_in_ram(schema.clone());
		register_tokenizer(&index);
		let id_field = schema.get_field("id")?;
		let text_field = schema.get_field("text")?;
		let program_field = schema.get_field("program")?;
		let section_field = schema.get_field("section")?;
		let mut index_writer: IndexWriter = index.writer(50_000_000)?;
		for c in chunks {
			index_writer.add_document(doc!(
				id_field => c.id.clone(),
				text_field => c.text.clone(),
				program_field => c.metadata.program.clone(),
				section_field => c.metadata.section.clone(),
			))?;
		}
		index_writer.commit()?;
		Self::from_index(&index, chunks)
	}

	fn from_index(index: &Index, chunks: &[Arc<Chunk>]) -> Result<Self> {
		let schema = index.schema();
		let id_field = schema.get_field("id")?;
		let text_field = schema.get_field("text")?;
		let analyzer = index.tokenizer_for_field(text_field)?;
		let reader = index.reader()?;
		let positions: HashMap<ChunkId, usize> = chunks.iter().enumerate().map(|(i, c)| (c.id.clone(), i)).collect();
		let num_docs = reader.searcher().num_docs();
		if usize::try_from(num_docs).map_or(true, |n| n != chunks.len()) {
			warn!(num_docs, corpus = chunks.len(), "lexical index and corpus sizes differ");
		}
		info!(num_docs, "opened lexical index");
		Ok(Self { reader, id_field, text_field, analyzer, positions })
	}
}

impl SparseIndex for TantivySparseIndex {
	fn score(&self, tokens: &[String]) -> anyhow::Result<Vec<f32>> {
		let mut scores = vec![0.0_f32; self.positions.len()];
		if tokens.is_empty() || scores.is_empty() { return Ok(scores); }
		let mut analyzer = self.analyzer.clone();
		let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
		for t in tokens {
			analyzer.token_stream(t).process(&mut |token| {
				let term = Term::from_field_text(self.text_field, &token.text);
				clauses.push((Occur::Should, Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs))));
			});
		}
		if clauses.is_empty() { return Ok(scores); }
		let query = BooleanQuery::new(clauses);
		let searcher = self.reader.searcher();
		let limit = usize::try_from(searcher.num_docs()).unwrap_or(usize::MAX).max(1);
		let top_docs = searcher.search(&query, &TopDocs::with_limit(limit))?;
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr)?;
			let Some(id) = doc.get_first(self.id_field).and_then(|v| v.as_str()) else { continue };
			match self.positions.get(id) {
				Some(&pos) => scores[pos] = score,
				None => debug!(id, "lexical hit is not in the corpus"),
			}
		}
		Ok(scores)
	}
}
