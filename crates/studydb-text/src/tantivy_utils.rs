//! Schema and analyzer shared by the index writer and the query side.
use tantivy::schema::{Schema, TextFieldIndexing, TextOptions, IndexRecordOption, STRING, STORED};
use tantivy::tokenizer::{TextAnalyzer, SimpleTokenizer, LowerCaser, StopWordFilter};
use tantivy::Index;

pub const TOKENIZER: &str = "text_with_stopwords";

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	let _id_field = schema_builder.add_text_field("id", STRING | STORED);
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(TOKENIZER).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let text_options = TextOptions::default().set_indexing_options(text_field_indexing);
	let _text_field = schema_builder.add_text_field("text", text_options);
	let _program_field = schema_builder.add_text_field("program", STRING | STORED);
	let _section_field = schema_builder.add_text_field("section", STRING | STORED);
	schema_builder.build()
}

pub fn stop_words() -> Vec<String> {
	[
		"a","an","and","are","as","at","be","by","for","from","has","he","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","why","how","what","which","who","whom","whose","can","could","should","would","may","might","must","shall","do","does","did","have","had","having",
	]
	.into_iter()
	.map(str::to_string)
	.collect()
}

pub fn register_tokenizer(index: &Index) {
	let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(stop_words()))
		.build();
	index.tokenizers().register(TOKENIZER, tokenizer);
}
