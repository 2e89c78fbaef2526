use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer};
use tantivy::Index;

pub const TEXT_TOKENIZER: &str = "text_with_stopwords";

/// One row per canonical URL. Only `text` is tokenized; `url` and `section`
/// are raw terms used for replacement and bucket filtering.
pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	schema_builder.add_u64_field("id", STORED);
	schema_builder.add_text_field("url", STRING | STORED);
	schema_builder.add_text_field("title", STORED);
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(TEXT_TOKENIZER).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let text_options = TextOptions::default().set_indexing_options(text_field_indexing).set_stored();
	schema_builder.add_text_field("text", text_options);
	schema_builder.add_text_field("section", STRING | STORED);
	schema_builder.build()
}

#[derive(Debug, Clone, Copy)]
pub struct Fields {
	pub id: Field,
	pub url: Field,
	pub title: Field,
	pub text: Field,
	pub section: Field,
}

impl Fields {
	pub fn from_schema(schema: &Schema) -> tantivy::Result<Self> {
		Ok(Self {
			id: schema.get_field("id")?,
			url: schema.get_field("url")?,
			title: schema.get_field("title")?,
			text: schema.get_field("text")?,
			section: schema.get_field("section")?,
		})
	}
}

pub fn register_tokenizer(index: &Index) {
	let stop_words = vec![
		"a","an","and","are","as","at","be","by","for","from","has","he","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","why","how","what","which","who","whom","whose","can","could","should","would","may","might","must","shall","do","does","did","have","had","having",
	];
	let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(stop_words.into_iter().map(|s| s.to_string())))
		.build();
	index.tokenizers().register(TEXT_TOKENIZER, tokenizer);
}
