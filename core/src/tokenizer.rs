/// Lowercase, split on whitespace, drop tokens of a single character.
///
/// Duplicates are kept: Cosine and BM25 read query term frequency from them.
pub fn preprocess_query(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|token| token.chars().count() > 1)
        .map(str::to_string)
        .collect()
}
