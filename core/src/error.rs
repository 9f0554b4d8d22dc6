use thiserror::Error;

use crate::DocId;

pub type Result<T> = std::result::Result<T, RankError>;

/// Failures raised while loading or constructing a [`crate::SearchEngine`].
///
/// Searching itself never fails: empty queries, unknown algorithms and missing
/// metadata all resolve to defined fallback values.
#[derive(Error, Debug)]
pub enum RankError {
    /// The corpus has no documents, or no terms across all documents.
    #[error("corpus is empty: BM25 needs at least one document with at least one term")]
    EmptyCorpus,

    #[error("document {doc_id} has a non-positive count for term {term:?}")]
    NonPositiveCount { doc_id: DocId, term: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),
}

impl RankError {
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        RankError::Parse(msg.into())
    }
}
