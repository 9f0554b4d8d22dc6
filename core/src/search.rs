use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::bm25::{Bm25Index, Bm25Params};
use crate::error::Result;
use crate::index::{DocumentStore, TermStats};
use crate::similarity::{cosine, jaccard};
use crate::tokenizer::preprocess_query;
use crate::DocId;

/// Relevance model used by [`SearchEngine::search`].
///
/// Parsing never fails: unrecognised names become [`Algorithm::Unknown`],
/// which scores every document 0.0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Algorithm {
    Jaccard,
    Cosine,
    Bm25,
    Unknown(String),
}

impl Algorithm {
    pub fn as_str(&self) -> &str {
        match self {
            Algorithm::Jaccard => "jaccard",
            Algorithm::Cosine => "cosine",
            Algorithm::Bm25 => "bm25",
            Algorithm::Unknown(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Algorithm::Unknown(_))
    }
}

impl FromStr for Algorithm {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "jaccard" => Algorithm::Jaccard,
            "cosine" => Algorithm::Cosine,
            "bm25" => Algorithm::Bm25,
            other => Algorithm::Unknown(other.to_string()),
        })
    }
}

impl From<&str> for Algorithm {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(algorithm) => algorithm,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredResult {
    pub content_id: DocId,
    pub title: String,
    pub similarity: f64,
    pub category: String,
    pub date: String,
    pub image_url: String,
    pub url: String,
    pub content: String,
}

/// Immutable ranking engine: term statistics, document metadata and the BM25
/// corpus derived from them. Shareable across threads once built.
#[derive(Debug)]
pub struct SearchEngine {
    stats: TermStats,
    documents: DocumentStore,
    bm25: Bm25Index,
}

impl SearchEngine {
    pub fn new(stats: TermStats, documents: DocumentStore) -> Result<Self> {
        Self::with_params(stats, documents, Bm25Params::default())
    }

    pub fn with_params(stats: TermStats, documents: DocumentStore, params: Bm25Params) -> Result<Self> {
        let bm25 = Bm25Index::build(&stats, params)?;
        tracing::info!(
            num_docs = stats.len(),
            num_meta = documents.len(),
            vocabulary = bm25.vocabulary_len(),
            "search engine ready"
        );
        Ok(Self { stats, documents, bm25 })
    }

    pub fn stats(&self) -> &TermStats {
        &self.stats
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub fn bm25(&self) -> &Bm25Index {
        &self.bm25
    }

    /// Rank every document against `query`, best first.
    ///
    /// An empty category means no filter. Documents scoring below
    /// `min_similarity` are dropped. A query with no usable tokens returns
    /// nothing, whatever the algorithm.
    pub fn search(
        &self,
        query: &str,
        algorithm: &Algorithm,
        category: Option<&str>,
        min_similarity: f64,
    ) -> Vec<ScoredResult> {
        let tokens = preprocess_query(query);
        if tokens.is_empty() {
            return Vec::new();
        }
        if !algorithm.is_known() {
            tracing::warn!(%algorithm, "unknown algorithm, every document scores 0");
        }

        let bm25_scores: HashMap<DocId, f64> = match algorithm {
            Algorithm::Bm25 => self.bm25.normalized_scores(&tokens),
            _ => HashMap::new(),
        };
        let category = category.filter(|c| !c.is_empty()).map(str::to_lowercase);

        let mut results = Vec::new();
        for (doc_id, table) in self.stats.iter() {
            if let Some(wanted) = &category {
                if self.documents.category_of(doc_id).to_lowercase() != *wanted {
                    continue;
                }
            }

            let similarity = match algorithm {
                Algorithm::Jaccard => jaccard(&tokens, table),
                Algorithm::Cosine => cosine(&tokens, table),
                Algorithm::Bm25 => bm25_scores.get(&doc_id).copied().unwrap_or(0.0),
                Algorithm::Unknown(_) => 0.0,
            };
            if similarity < min_similarity {
                continue;
            }

            let meta = self.documents.resolve(doc_id);
            results.push(ScoredResult {
                content_id: doc_id,
                title: meta.title.clone(),
                similarity,
                category: meta.category.clone(),
                date: meta.date.clone(),
                image_url: meta.image_url.clone(),
                url: meta.url.clone(),
                content: meta.content.clone(),
            });
        }

        // stable: equal scores keep store (doc id) order
        results.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(Ordering::Equal));
        tracing::debug!(
            tokens = tokens.len(),
            %algorithm,
            hits = results.len(),
            "search complete"
        );
        results
    }
}
