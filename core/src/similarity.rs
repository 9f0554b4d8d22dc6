use std::collections::{HashMap, HashSet};

use crate::TermFrequencies;

/// Jaccard similarity between the query's term set and the document's term set.
///
/// `|Q ∩ D| / |Q ∪ D|`; frequencies are ignored. Two empty sets score 0.0.
pub fn jaccard(query: &[String], doc: &TermFrequencies) -> f64 {
    let query_set: HashSet<&str> = query.iter().map(String::as_str).collect();
    let intersection = query_set.iter().filter(|t| doc.contains_key(**t)).count();
    let union = query_set.len() + doc.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// Cosine similarity between the query's term counts and the document's counts.
///
/// The document magnitude covers its whole table, not only the overlapping
/// terms. Either vector being zero yields 0.0.
pub fn cosine(query: &[String], doc: &TermFrequencies) -> f64 {
    let mut query_freq: HashMap<&str, u32> = HashMap::new();
    for token in query {
        *query_freq.entry(token.as_str()).or_insert(0) += 1;
    }

    let mut dot = 0.0f64;
    for (term, q_count) in query_freq.iter() {
        if let Some(d_count) = doc.get(*term) {
            dot += *q_count as f64 * *d_count as f64;
        }
    }

    let query_norm = query_freq.values().map(|c| (*c as f64).powi(2)).sum::<f64>().sqrt();
    let doc_norm = doc.values().map(|c| (*c as f64).powi(2)).sum::<f64>().sqrt();
    if query_norm == 0.0 || doc_norm == 0.0 {
        return 0.0;
    }
    dot / (query_norm * doc_norm)
}

/// Render a [0, 1] similarity as a percentage with two decimals: 0.855 → "85.50%".
pub fn format_similarity_percentage(similarity: f64) -> String {
    format!("{:.2}%", similarity * 100.0)
}
