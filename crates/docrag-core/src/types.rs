//! Domain types shared by the ingestion pipeline and the search side.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Section tag assigned to every stored document by the canonicalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    ComponentsApi,
    ComponentsUsage,
    ComponentsOther,
    Patterns,
    Typedoc,
    Other,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::ComponentsApi,
        Section::ComponentsUsage,
        Section::ComponentsOther,
        Section::Patterns,
        Section::Typedoc,
        Section::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Section::ComponentsApi => "components_api",
            Section::ComponentsUsage => "components_usage",
            Section::ComponentsOther => "components_other",
            Section::Patterns => "patterns",
            Section::Typedoc => "typedoc",
            Section::Other => "other",
        }
    }

    /// The serve-time bucket this section feeds, if any.
    pub fn bucket(self) -> Option<Bucket> {
        match self {
            Section::ComponentsApi => Some(Bucket::ComponentsApi),
            Section::ComponentsUsage => Some(Bucket::ComponentsUsage),
            Section::Patterns => Some(Bucket::Patterns),
            Section::Typedoc => Some(Bucket::Typedoc),
            Section::ComponentsOther | Section::Other => None,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Section {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|sec| sec.as_str() == s)
            .ok_or_else(|| crate::error::Error::InvalidConfig(format!("unknown section '{s}'")))
    }
}

/// One of the four partitions a search response is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    ComponentsApi,
    ComponentsUsage,
    Patterns,
    Typedoc,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [Bucket::ComponentsApi, Bucket::ComponentsUsage, Bucket::Patterns, Bucket::Typedoc];

    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::ComponentsApi => "components.api",
            Bucket::ComponentsUsage => "components.usage",
            Bucket::Patterns => "patterns",
            Bucket::Typedoc => "typedoc",
        }
    }

    pub fn section(self) -> Section {
        match self {
            Bucket::ComponentsApi => Section::ComponentsApi,
            Bucket::ComponentsUsage => Section::ComponentsUsage,
            Bucket::Patterns => Section::Patterns,
            Bucket::Typedoc => Section::Typedoc,
        }
    }
}

/// A `{url, title, text}` tuple as produced by the page-capture and Markdown readers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub url: String,
    pub title: String,
    pub text: String,
    /// Set by readers whose records bypass URL canonicalization (TypeDoc).
    pub section: Option<Section>,
}

/// The unit of record: one live document per canonical URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub canonical_url: String,
    pub title: String,
    pub text: String,
    pub section: Section,
}

/// A document as returned by the full-text engine for one ranked query.
///
/// `raw_rank` follows the lower-is-better convention.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedDoc {
    pub id: u64,
    pub url: String,
    pub title: String,
    pub text: String,
    pub section: Section,
    pub raw_rank: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<Section>,
    pub text_preview: String,
    pub text_len: usize,
    pub score: f64,
    pub raw_rank: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub q: String,
    #[serde(default = "default_k_components")]
    pub k_components: i64,
    #[serde(default = "default_k_patterns")]
    pub k_patterns: i64,
    #[serde(default = "default_k_typedoc")]
    pub k_typedoc: i64,
}

fn default_k_components() -> i64 { 1 }
fn default_k_patterns() -> i64 { 5 }
fn default_k_typedoc() -> i64 { 3 }

impl SearchRequest {
    pub fn new(q: impl Into<String>) -> Self {
        Self { q: q.into(), k_components: default_k_components(), k_patterns: default_k_patterns(), k_typedoc: default_k_typedoc() }
    }

    /// Requested cap for a bucket; api and usage share `k_components`.
    pub fn cap(&self, bucket: Bucket) -> i64 {
        match bucket {
            Bucket::ComponentsApi | Bucket::ComponentsUsage => self.k_components,
            Bucket::Patterns => self.k_patterns,
            Bucket::Typedoc => self.k_typedoc,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentHits {
    pub api: Vec<SearchHit>,
    pub usage: Vec<SearchHit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub components: ComponentHits,
    pub patterns: Vec<SearchHit>,
    pub typedoc: Vec<SearchHit>,
}

impl SearchResponse {
    pub fn empty(query: impl Into<String>) -> Self {
        Self { query: query.into(), components: ComponentHits::default(), patterns: Vec::new(), typedoc: Vec::new() }
    }

    pub fn bucket(&self, bucket: Bucket) -> &[SearchHit] {
        match bucket {
            Bucket::ComponentsApi => &self.components.api,
            Bucket::ComponentsUsage => &self.components.usage,
            Bucket::Patterns => &self.patterns,
            Bucket::Typedoc => &self.typedoc,
        }
    }

    pub fn bucket_mut(&mut self, bucket: Bucket) -> &mut Vec<SearchHit> {
        match bucket {
            Bucket::ComponentsApi => &mut self.components.api,
            Bucket::ComponentsUsage => &mut self.components.usage,
            Bucket::Patterns => &mut self.patterns,
            Bucket::Typedoc => &mut self.typedoc,
        }
    }
}

/// Full stored document returned by a page lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: u64,
    pub url: String,
    pub title: String,
    pub text: String,
}

pub const NOT_FOUND: &str = "NOT_FOUND";

/// Outcome of a page lookup; a miss is an ordinary value, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PageResult {
    Found(Page),
    NotFound { error: &'static str, url: String },
}

impl PageResult {
    pub fn not_found(url: impl Into<String>) -> Self { PageResult::NotFound { error: NOT_FOUND, url: url.into() } }

    pub fn page(&self) -> Option<&Page> {
        match self {
            PageResult::Found(p) => Some(p),
            PageResult::NotFound { .. } => None,
        }
    }
}
