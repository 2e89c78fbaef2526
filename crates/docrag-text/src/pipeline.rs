//! Offline batch build: read -> clean -> canonicalize -> dedup -> index -> compact.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{info, warn};

use docrag_core::canonical::Canonicalizer;
use docrag_core::data_processor::{DataProcessor, IngestStats};
use docrag_core::traits::DocumentIndexer;
use docrag_core::types::Document;

use crate::index::TantivyIndexer;
use crate::search::TantivySearchEngine;

#[derive(Debug, Clone)]
pub struct BuildOptions {
	pub source: PathBuf,
	pub index_dir: PathBuf,
	pub typedoc_dir: Option<PathBuf>,
	pub canonicalizer: Canonicalizer,
	pub progress: bool,
}

#[derive(Debug, Clone)]
pub struct BuildReport {
	pub stats: IngestStats,
	pub indexed: usize,
	/// Documents visible in the published index.
	pub total_docs: u64,
	pub compacted: bool,
}

/// Full rebuild of the index at `opts.index_dir`. Fails only when the source
/// is unusable or the index cannot be written; compaction is best-effort.
pub fn build_index(opts: &BuildOptions) -> Result<BuildReport> {
	let processor = DataProcessor::new(opts.canonicalizer.clone());
	let ingested = processor.process_source(&opts.source, opts.typedoc_dir.as_deref())?;

	let mut indexer = TantivyIndexer::create(&opts.index_dir)?;
	let (indexed, compacted) = flush(&mut indexer, &ingested.documents, opts.progress)?;
	indexer.finish()?;

	let total_docs = TantivySearchEngine::open(&opts.index_dir)?.num_docs();
	info!(indexed, total_docs, index = %opts.index_dir.display(), "build complete");
	Ok(BuildReport { stats: ingested.stats, indexed, total_docs, compacted })
}

/// Upserts every document, commits once, then compacts. Returns the number of
/// documents written and whether compaction succeeded; a compaction error is
/// logged and never fails the flush.
pub fn flush<I: DocumentIndexer>(indexer: &mut I, docs: &[Document], progress: bool) -> Result<(usize, bool)> {
	let pb = if progress { ProgressBar::new(docs.len() as u64) } else { ProgressBar::hidden() };
	pb.set_style(ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages ({percent}%) {msg}")?.progress_chars("#>-"));
	for d in docs {
		indexer.upsert(d)?;
		pb.inc(1);
	}
	indexer.commit()?;
	pb.finish_with_message("indexed");
	info!(pages = docs.len(), "index commit");

	let compacted = match indexer.compact() {
		Ok(()) => true,
		Err(e) => { warn!(error = %e, "index compaction failed, continuing"); false }
	};
	Ok((docs.len(), compacted))
}
