//! docrag-core
//!
//! Engine-independent pieces of the documentation search service: URL
//! canonicalization, text cleaning, deduplicating ingestion, bucketed
//! retrieval with per-bucket score normalization, and preview extraction.
//! The full-text engine itself sits behind the traits in [`traits`].

pub mod canonical;
pub mod clean;
pub mod config;
pub mod data_processor;
pub mod error;
pub mod preview;
pub mod retrieve;
pub mod score;
pub mod source;
pub mod store;
pub mod traits;
pub mod types;

pub use canonical::{Canonicalized, Canonicalizer};
pub use data_processor::{DataProcessor, IngestStats, Ingested};
pub use retrieve::{BucketedRetriever, Strategy};
pub use types::{Bucket, Document, Page, PageResult, SearchHit, SearchRequest, SearchResponse, Section};
