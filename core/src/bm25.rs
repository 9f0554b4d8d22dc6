//! Okapi BM25 over the term statistics store.
//!
//! The corpus is derived once from [`TermStats`]: each position holds one
//! document's token multiset (kept in counted form, a term with frequency `n`
//! stands for `n` tokens) and `id_map[i]` names the document at position `i`.
//! Both are produced in the same pass and never reordered.

use std::collections::{BTreeMap, HashMap};

use crate::error::{RankError, Result};
use crate::index::TermStats;
use crate::{DocId, TermFrequencies};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term frequency saturation.
    pub k1: f64,
    /// Document length normalization, 0.0 (none) to 1.0 (full).
    pub b: f64,
    /// Floor for negative idf values, as a fraction of the mean idf.
    pub epsilon: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75, epsilon: 0.25 }
    }
}

#[derive(Debug, Clone)]
pub struct Bm25Index {
    params: Bm25Params,
    corpus: Vec<TermFrequencies>,
    doc_lens: Vec<f64>,
    id_map: Vec<DocId>,
    idf: HashMap<String, f64>,
    avgdl: f64,
}

impl Bm25Index {
    pub fn build(stats: &TermStats, params: Bm25Params) -> Result<Self> {
        let mut corpus = Vec::with_capacity(stats.len());
        let mut doc_lens = Vec::with_capacity(stats.len());
        let mut id_map = Vec::with_capacity(stats.len());
        // ordered so the mean idf is summed in a fixed order
        let mut doc_freq: BTreeMap<&str, u32> = BTreeMap::new();
        let mut total_tokens = 0u64;

        for (doc_id, table) in stats.iter() {
            let len: u64 = table.values().map(|c| *c as u64).sum();
            total_tokens += len;
            for term in table.keys() {
                *doc_freq.entry(term.as_str()).or_insert(0) += 1;
            }
            corpus.push(table.clone());
            doc_lens.push(len as f64);
            id_map.push(doc_id);
        }

        if corpus.is_empty() || doc_freq.is_empty() {
            return Err(RankError::EmptyCorpus);
        }

        let n = corpus.len() as f64;
        let avgdl = total_tokens as f64 / n;

        let mut idf = HashMap::with_capacity(doc_freq.len());
        let mut idf_sum = 0.0;
        let mut negative = Vec::new();
        for (term, df) in doc_freq.iter() {
            let df = *df as f64;
            let value = (n - df + 0.5).ln() - (df + 0.5).ln();
            idf_sum += value;
            if value < 0.0 {
                negative.push(*term);
            }
            idf.insert(term.to_string(), value);
        }
        let floor = params.epsilon * idf_sum / doc_freq.len() as f64;
        for term in negative {
            idf.insert(term.to_string(), floor);
        }

        Ok(Self { params, corpus, doc_lens, id_map, idf, avgdl })
    }

    pub fn params(&self) -> Bm25Params {
        self.params
    }

    /// Number of corpus positions (documents).
    pub fn len(&self) -> usize {
        self.corpus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }

    /// Corpus position → document id.
    pub fn id_map(&self) -> &[DocId] {
        &self.id_map
    }

    /// Number of distinct terms across the corpus.
    pub fn vocabulary_len(&self) -> usize {
        self.idf.len()
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.idf.get(term).copied()
    }

    /// One raw score per corpus position. Repeated query tokens contribute
    /// once per occurrence; terms outside the vocabulary contribute nothing.
    pub fn raw_scores(&self, query: &[String]) -> Vec<f64> {
        let Bm25Params { k1, b, .. } = self.params;
        let mut scores = vec![0.0; self.corpus.len()];
        for token in query {
            let Some(idf) = self.idf.get(token.as_str()) else {
                continue;
            };
            for (pos, table) in self.corpus.iter().enumerate() {
                let tf = table.get(token.as_str()).copied().unwrap_or(0) as f64;
                if tf == 0.0 {
                    continue;
                }
                let norm = k1 * (1.0 - b + b * self.doc_lens[pos] / self.avgdl);
                scores[pos] += idf * (tf * (k1 + 1.0)) / (tf + norm);
            }
        }
        scores
    }

    /// Min-max normalized scores keyed by document id. If every raw score is
    /// equal, every document gets 0.0.
    pub fn normalized_scores(&self, query: &[String]) -> HashMap<DocId, f64> {
        let raw = self.raw_scores(query);
        let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = raw.iter().copied().fold(f64::INFINITY, f64::min);
        let range = max - min;

        self.id_map
            .iter()
            .zip(raw.iter())
            .map(|(doc_id, score)| {
                let normalized = if range == 0.0 { 0.0 } else { (score - min) / range };
                (*doc_id, normalized)
            })
            .collect()
    }
}
