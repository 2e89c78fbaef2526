use anyhow::Result;
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, ConstScoreQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{Index, IndexReader, ReloadPolicy, TantivyDocument, Term};
use tracing::debug;

use docrag_core::error::Error;
use docrag_core::traits::RankedIndex;
use docrag_core::types::{Page, RankedDoc, Section};

use crate::tantivy_utils::{register_tokenizer, Fields};

/// Read side of a published index.
///
/// Holds one `IndexReader`; every query takes its own `Searcher` snapshot from
/// it, so one engine can be shared across threads behind an `Arc`.
pub struct TantivySearchEngine {
	index: Index,
	reader: IndexReader,
	fields: Fields,
}

impl TantivySearchEngine {
	/// Opens an existing index. A missing index is a fatal configuration error.
	pub fn open(index_dir: &Path) -> Result<Self> {
		if !index_dir.join("meta.json").is_file() {
			return Err(Error::IndexMissing(index_dir.to_path_buf()).into());
		}
		Self::from_index(Index::open_in_dir(index_dir)?)
	}

	pub fn from_index(index: Index) -> Result<Self> {
		register_tokenizer(&index);
		// the published index never changes under a running reader
		let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into()?;
		let fields = Fields::from_schema(&index.schema())?;
		Ok(Self { index, reader, fields })
	}

	pub fn num_docs(&self) -> u64 { self.reader.searcher().num_docs() }

	/// Free-text query over `text`; terms are ANDed, syntax errors are tolerated.
	fn parse(&self, query_text: &str) -> Box<dyn Query> {
		let mut query_parser = QueryParser::for_index(&self.index, vec![self.fields.text]);
		query_parser.set_conjunction_by_default();
		let (query, errors) = query_parser.parse_query_lenient(query_text);
		if !errors.is_empty() { debug!(query = query_text, errors = ?errors, "lenient query parse"); }
		query
	}

	fn str_field(&self, doc: &TantivyDocument, field: tantivy::schema::Field) -> String {
		doc.get_first(field).and_then(|v| v.as_str()).unwrap_or("").to_string()
	}

	fn id(&self, doc: &TantivyDocument) -> u64 { doc.get_first(self.fields.id).and_then(|v| v.as_u64()).unwrap_or_default() }
}

impl RankedIndex for TantivySearchEngine {
	fn ranked(&self, query: &str, section: Option<Section>, limit: usize) -> Result<Vec<RankedDoc>> {
		let searcher = self.reader.searcher();
		// result slots are allocated up front; never ask for more than the index holds
		let limit = limit.min(usize::try_from(searcher.num_docs()).unwrap_or(usize::MAX));
		if limit == 0 { return Ok(Vec::new()); }
		let text_query = self.parse(query);
		let query: Box<dyn Query> = match section {
			Some(s) => {
				let term = TermQuery::new(Term::from_field_text(self.fields.section, s.as_str()), IndexRecordOption::Basic);
				// the filter must not shift the text relevance
				Box::new(BooleanQuery::new(vec![(Occur::Must, text_query), (Occur::Must, Box::new(ConstScoreQuery::new(Box::new(term), 0.0)))]))
			}
			None => text_query,
		};
		let top_docs = searcher.search(query.as_ref(), &TopDocs::with_limit(limit))?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr)?;
			let section = self.str_field(&doc, self.fields.section).parse().unwrap_or(Section::Other);
			hits.push(RankedDoc {
				id: self.id(&doc),
				url: self.str_field(&doc, self.fields.url),
				title: self.str_field(&doc, self.fields.title),
				text: self.str_field(&doc, self.fields.text),
				section,
				// engine scores are higher-is-better
				raw_rank: -f64::from(score),
			});
		}
		Ok(hits)
	}

	fn fetch(&self, url: &str) -> Result<Option<Page>> {
		let searcher = self.reader.searcher();
		let query = TermQuery::new(Term::from_field_text(self.fields.url, url), IndexRecordOption::Basic);
		let Some((_, addr)) = searcher.search(&query, &TopDocs::with_limit(1))?.into_iter().next() else { return Ok(None) };
		let doc: TantivyDocument = searcher.doc(addr)?;
		Ok(Some(Page {
			id: self.id(&doc),
			url: self.str_field(&doc, self.fields.url),
			title: self.str_field(&doc, self.fields.title),
			text: self.str_field(&doc, self.fields.text),
		}))
	}
}
