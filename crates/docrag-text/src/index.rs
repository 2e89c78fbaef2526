use anyhow::Result;
use std::path::Path;
use tantivy::{doc, Index, IndexWriter, Term};
use tracing::debug;

use docrag_core::error::Error;
use docrag_core::traits::DocumentIndexer;
use docrag_core::types::Document;

use crate::tantivy_utils::{build_schema, register_tokenizer, Fields};

const WRITER_HEAP_BYTES: usize = 50_000_000;

/// Write side of the index. Created fresh for every build.
pub struct TantivyIndexer {
	index: Index,
	writer: IndexWriter,
	fields: Fields,
	next_id: u64,
}

impl TantivyIndexer {
	/// Recreates `index_dir` and opens a writer on it. An existing directory is
	/// only replaced when it is empty or holds a previous index (`meta.json`).
	pub fn create(index_dir: &Path) -> Result<Self> {
		if index_dir.exists() {
			let is_index = index_dir.join("meta.json").is_file();
			let is_empty = index_dir.is_dir() && std::fs::read_dir(index_dir)?.next().is_none();
			if !is_index && !is_empty {
				return Err(Error::Operation(format!("refusing to overwrite {}: not an index directory", index_dir.display())).into());
			}
			std::fs::remove_dir_all(index_dir)?;
		}
		std::fs::create_dir_all(index_dir)?;
		let index = Index::create_in_dir(index_dir, build_schema())?;
		Self::with_index(index)
	}

	pub fn create_in_ram() -> Result<Self> { Self::with_index(Index::create_in_ram(build_schema())) }

	fn with_index(index: Index) -> Result<Self> {
		register_tokenizer(&index);
		let fields = Fields::from_schema(&index.schema())?;
		let writer = index.writer(WRITER_HEAP_BYTES)?;
		Ok(Self { index, writer, fields, next_id: 1 })
	}

	pub fn index(&self) -> &Index { &self.index }

	/// Waits for background merges and releases the writer lock.
	pub fn finish(self) -> Result<()> {
		self.writer.wait_merging_threads()?;
		Ok(())
	}
}

impl DocumentIndexer for TantivyIndexer {
	fn upsert(&mut self, d: &Document) -> Result<u64> {
		let id = self.next_id;
		self.next_id += 1;
		// deletes only affect documents added before this opstamp
		self.writer.delete_term(Term::from_field_text(self.fields.url, &d.canonical_url));
		self.writer.add_document(doc!(
			self.fields.id => id,
			self.fields.url => d.canonical_url.clone(),
			self.fields.title => d.title.clone(),
			self.fields.text => d.text.clone(),
			self.fields.section => d.section.as_str(),
		))?;
		Ok(id)
	}

	fn commit(&mut self) -> Result<()> {
		self.writer.commit()?;
		Ok(())
	}

	fn compact(&mut self) -> Result<()> {
		let segments = self.index.searchable_segment_ids()?;
		debug!(segments = segments.len(), "compacting index");
		if segments.len() > 1 {
			self.writer.merge(&segments).wait()?;
		}
		self.writer.garbage_collect_files().wait()?;
		Ok(())
	}
}
