//! docrag-text
//!
//! Tantivy-backed storage for documentation pages: the index writer, the
//! read-side engine behind `RankedIndex`, and the batch build pipeline.

pub mod index;
pub mod pipeline;
pub mod search;
pub mod tantivy_utils;

pub use index::TantivyIndexer;
pub use pipeline::{build_index, flush, BuildOptions, BuildReport};
pub use search::TantivySearchEngine;
