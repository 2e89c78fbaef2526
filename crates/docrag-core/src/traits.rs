use crate::types::{Document, Page, RankedDoc, Section};

/// Write side of the full-text engine. Ranking is the engine's business.
pub trait DocumentIndexer {
    /// Persist `doc` keyed by its canonical URL, replacing any earlier entry for that URL.
    fn upsert(&mut self, doc: &Document) -> anyhow::Result<u64>;
    fn commit(&mut self) -> anyhow::Result<()>;
    /// Optional post-load optimisation; callers treat failure as non-fatal.
    fn compact(&mut self) -> anyhow::Result<()>;
}

/// Read side of the full-text engine.
pub trait RankedIndex: Send + Sync {
    /// Ranked matches for `query`, best first (ascending `raw_rank`), optionally
    /// restricted to one section and capped at `limit`.
    fn ranked(&self, query: &str, section: Option<Section>, limit: usize) -> anyhow::Result<Vec<RankedDoc>>;
    /// Exact lookup by stored URL.
    fn fetch(&self, url: &str) -> anyhow::Result<Option<Page>>;
}
