use lazy_static::lazy_static;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::error::{RankError, Result};
use crate::{DocId, TermFrequencies};

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_CATEGORY: &str = "Unknown Category";
pub const UNKNOWN_DATE: &str = "Unknown Date";

lazy_static! {
    static ref FALLBACK_META: DocMeta = DocMeta {
        category: UNKNOWN_CATEGORY.to_string(),
        title: UNKNOWN_TITLE.to_string(),
        date: UNKNOWN_DATE.to_string(),
        image_url: String::new(),
        url: String::new(),
        content: String::new(),
    };
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocMeta {
    pub category: String,
    pub title: String,
    pub date: String,
    pub image_url: String,
    pub url: String,
    pub content: String,
}

/// Read-only doc id → term-frequency table mapping.
///
/// Iteration is ordered by document id, so every pass over the store (index
/// building, scoring) visits documents in the same order.
#[derive(Debug, Clone, Default)]
pub struct TermStats {
    docs: BTreeMap<DocId, TermFrequencies>,
}

impl TermStats {
    /// Takes ownership of fully built tables. Fails if any count is zero.
    pub fn new<I>(tables: I) -> Result<Self>
    where
        I: IntoIterator<Item = (DocId, TermFrequencies)>,
    {
        let mut docs = BTreeMap::new();
        for (doc_id, table) in tables {
            if let Some((term, _)) = table.iter().find(|(_, &count)| count == 0) {
                return Err(RankError::NonPositiveCount { doc_id, term: term.clone() });
            }
            docs.insert(doc_id, table);
        }
        Ok(Self { docs })
    }

    pub fn get(&self, doc_id: DocId) -> Option<&TermFrequencies> {
        self.docs.get(&doc_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DocId, &TermFrequencies)> + '_ {
        self.docs.iter().map(|(id, table)| (*id, table))
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

/// Doc id → metadata. Lookups through [`DocumentStore::resolve`] never fail.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    docs: HashMap<DocId, DocMeta>,
}

impl DocumentStore {
    pub fn new(docs: HashMap<DocId, DocMeta>) -> Self {
        Self { docs }
    }

    pub fn get(&self, doc_id: DocId) -> Option<&DocMeta> {
        self.docs.get(&doc_id)
    }

    /// Metadata for `doc_id`, or the "Unknown ..." placeholder record.
    pub fn resolve(&self, doc_id: DocId) -> &DocMeta {
        self.docs.get(&doc_id).unwrap_or(&FALLBACK_META)
    }

    /// Category used for filtering. Missing metadata filters as the empty string.
    pub fn category_of(&self, doc_id: DocId) -> &str {
        self.docs.get(&doc_id).map(|m| m.category.as_str()).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl FromIterator<(DocId, DocMeta)> for DocumentStore {
    fn from_iter<T: IntoIterator<Item = (DocId, DocMeta)>>(iter: T) -> Self {
        Self { docs: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, u32)]) -> TermFrequencies {
        pairs.iter().map(|(t, c)| (t.to_string(), *c)).collect()
    }

    #[test]
    fn rejects_zero_counts() {
        let err = TermStats::new(vec![(7, table(&[("bali", 0)]))]).unwrap_err();
        match err {
            RankError::NonPositiveCount { doc_id, term } => {
                assert_eq!(doc_id, 7);
                assert_eq!(term, "bali");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn iterates_in_id_order() {
        let stats = TermStats::new(vec![
            (3, table(&[("c", 1)])),
            (1, table(&[("a", 1)])),
            (2, table(&[("b", 1)])),
        ])
        .unwrap();
        let ids: Vec<DocId> = stats.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn resolve_falls_back_to_placeholders() {
        let store = DocumentStore::default();
        let meta = store.resolve(42);
        assert_eq!(meta.title, UNKNOWN_TITLE);
        assert_eq!(meta.category, UNKNOWN_CATEGORY);
        assert_eq!(meta.date, UNKNOWN_DATE);
        assert!(meta.url.is_empty());
        assert_eq!(store.category_of(42), "");
    }
}
