//! Ingestion: raw records -> cleaner -> canonicalizer -> deduplicating store.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::canonical::Canonicalizer;
use crate::clean::clean_text;
use crate::source::{read_page_records, read_typedoc_markdown};
use crate::store::{DocumentStore, Offer};
use crate::types::{Document, RawRecord, Section};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Documents in the flush set.
    pub kept: usize,
    /// Records the canonicalizer marked as noise.
    pub dropped: usize,
    /// Records with an empty URL or empty cleaned text.
    pub skipped: usize,
    /// Unparseable source lines.
    pub malformed: usize,
    pub per_section: BTreeMap<Section, usize>,
}

impl IngestStats {
    pub fn section(&self, section: Section) -> usize { self.per_section.get(&section).copied().unwrap_or(0) }
}

#[derive(Debug)]
pub struct Ingested {
    pub documents: Vec<Document>,
    pub stats: IngestStats,
}

#[derive(Debug, Default)]
pub struct DataProcessor {
    canonicalizer: Canonicalizer,
}

impl DataProcessor {
    pub fn new(canonicalizer: Canonicalizer) -> Self { Self { canonicalizer } }

    /// Reads page records from `source` and, optionally, Markdown from `typedoc_dir`,
    /// and returns the deduplicated flush set.
    pub fn process_source(&self, source: &Path, typedoc_dir: Option<&Path>) -> Result<Ingested> {
        let pages = read_page_records(source)?;
        info!(records = pages.records.len(), malformed = pages.malformed, source = %source.display(), "read page records");
        let mut stats = IngestStats { malformed: pages.malformed, ..IngestStats::default() };
        let mut store = DocumentStore::new();
        self.ingest(pages.records, &mut store, &mut stats);
        if let Some(dir) = typedoc_dir {
            let md = read_typedoc_markdown(dir);
            info!(files = md.len(), dir = %dir.display(), "read typedoc markdown");
            self.ingest(md, &mut store, &mut stats);
        }
        Ok(Self::finish(store, stats))
    }

    /// Feeds records into `store`, one record at a time; bad records are counted and skipped.
    pub fn ingest(&self, records: impl IntoIterator<Item = RawRecord>, store: &mut DocumentStore, stats: &mut IngestStats) {
        for rec in records {
            let Some(doc) = self.prepare(rec, stats) else { continue };
            if store.offer(doc) == Offer::Rejected { stats.skipped += 1; }
        }
    }

    pub fn finish(store: DocumentStore, mut stats: IngestStats) -> Ingested {
        let documents = store.into_documents();
        stats.kept = documents.len();
        stats.per_section.clear();
        for d in &documents { *stats.per_section.entry(d.section).or_default() += 1; }
        Ingested { documents, stats }
    }

    fn prepare(&self, rec: RawRecord, stats: &mut IngestStats) -> Option<Document> {
        let raw_url = rec.url.trim();
        let title = match rec.title.trim() {
            "" => raw_url.to_string(),
            t => t.to_string(),
        };

        // pre-sectioned records (Markdown) skip the web cleaner and canonicalizer
        if let Some(section) = rec.section {
            let text = rec.text.trim();
            if raw_url.is_empty() || text.is_empty() { stats.skipped += 1; return None; }
            return Some(Document { canonical_url: raw_url.to_string(), title, text: text.to_string(), section });
        }

        let text = clean_text(&rec.text);
        if raw_url.is_empty() || text.is_empty() { stats.skipped += 1; return None; }
        let canon = self.canonicalizer.canonicalize(raw_url);
        if !canon.keep {
            debug!(url = raw_url, "dropping noisy url variant");
            stats.dropped += 1;
            return None;
        }
        Some(Document { canonical_url: canon.url, title, text, section: canon.section })
    }
}
