use std::collections::HashMap;

pub mod bm25;
pub mod error;
pub mod index;
pub mod persist;
pub mod search;
pub mod similarity;
pub mod tokenizer;

pub type DocId = u32;

/// Per-document term → occurrence count. Every stored count is at least 1.
pub type TermFrequencies = HashMap<String, u32>;

pub use bm25::{Bm25Index, Bm25Params};
pub use error::{RankError, Result};
pub use index::{DocMeta, DocumentStore, TermStats};
pub use search::{Algorithm, ScoredResult, SearchEngine};
pub use similarity::{cosine, format_similarity_percentage, jaccard};
pub use tokenizer::preprocess_query;
