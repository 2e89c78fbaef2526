use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::types::Document;

/// What happened to a document offered to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Inserted,
    Replaced,
    /// An existing document with at least as much text was kept.
    Kept,
    /// Empty URL or empty text; never enters the store.
    Rejected,
}

/// In-memory `canonical_url -> best document` map built during one ingestion run.
///
/// On collision the strictly longer text wins; ties keep the stored document.
/// Replacement is always of the whole record.
#[derive(Debug, Default)]
pub struct DocumentStore {
    docs: BTreeMap<String, Document>,
}

impl DocumentStore {
    pub fn new() -> Self { Self::default() }

    pub fn offer(&mut self, doc: Document) -> Offer {
        if doc.canonical_url.is_empty() || doc.text.is_empty() {
            return Offer::Rejected;
        }
        match self.docs.entry(doc.canonical_url.clone()) {
            Entry::Vacant(slot) => { slot.insert(doc); Offer::Inserted }
            Entry::Occupied(mut slot) => {
                if doc.text.chars().count() > slot.get().text.chars().count() {
                    slot.insert(doc);
                    Offer::Replaced
                } else {
                    Offer::Kept
                }
            }
        }
    }

    pub fn get(&self, canonical_url: &str) -> Option<&Document> { self.docs.get(canonical_url) }
    pub fn len(&self) -> usize { self.docs.len() }
    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    /// The flush set, ordered by canonical URL.
    pub fn into_documents(self) -> Vec<Document> { self.docs.into_values().collect() }
}
