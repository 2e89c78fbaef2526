use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Index not found at {}. Did you build the index?", .0.display())]
    IndexMissing(PathBuf),

    #[error("{} has neither pages/pages.jsonl nor pages/extraPages.jsonl (crawl with text extraction enabled)", .0.display())]
    MissingPageRecords(PathBuf),

    #[error("Operation failed: {0}")]
    Operation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
