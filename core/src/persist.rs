use anyhow::{Context, Result};
use csv::ReaderBuilder;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::RankError;
use crate::index::{DocMeta, DocumentStore, TermStats};
use crate::search::SearchEngine;
use crate::{DocId, TermFrequencies};

lazy_static! {
    static ref POSTING: Regex = Regex::new(r"\((\d+), (\d+)\)").expect("valid regex");
}

/// Locations of the two inputs an engine is loaded from.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub index: PathBuf,
    pub documents: PathBuf,
}

impl DataPaths {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(index: P, documents: Q) -> Self {
        Self { index: index.as_ref().to_path_buf(), documents: documents.as_ref().to_path_buf() }
    }

    /// `inverted_index.txt` and `merged_combined_data.csv` under `root`.
    pub fn from_root<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        Self::new(root.join("inverted_index.txt"), root.join("merged_combined_data.csv"))
    }
}

/// Only `Doc ID` is required; short rows leave the trailing fields empty.
#[derive(Debug, Deserialize)]
struct DocumentRow {
    #[serde(rename = "Doc ID")]
    doc_id: String,
    #[serde(rename = "Category", default)]
    category: String,
    #[serde(rename = "Title_clean", default)]
    title: String,
    #[serde(rename = "Date", default)]
    date: String,
    #[serde(rename = "Image URL", default)]
    image_url: String,
    #[serde(rename = "URL", default)]
    url: String,
    #[serde(rename = "Content", default)]
    content: String,
}

/// Parse `term: (doc_id, freq), (doc_id, freq), ...` lines into per-document tables.
///
/// Lines that do not split into exactly two parts on `": "` are skipped.
pub fn parse_inverted_index<R: BufRead>(reader: R) -> Result<TermStats> {
    let mut tables: HashMap<DocId, TermFrequencies> = HashMap::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let parts: Vec<&str> = line.trim().split(": ").collect();
        if parts.len() != 2 {
            continue;
        }
        let (term, postings) = (parts[0], parts[1]);
        for caps in POSTING.captures_iter(postings) {
            let doc_id: DocId = caps[1]
                .parse()
                .map_err(|e| RankError::parse(format!("line {}: doc id {:?}: {e}", line_no + 1, &caps[1])))?;
            let freq: u32 = caps[2]
                .parse()
                .map_err(|e| RankError::parse(format!("line {}: frequency {:?}: {e}", line_no + 1, &caps[2])))?;
            tables.entry(doc_id).or_default().insert(term.to_string(), freq);
        }
    }
    Ok(TermStats::new(tables)?)
}

pub fn load_term_stats<P: AsRef<Path>>(path: P) -> Result<TermStats> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("opening inverted index {}", path.display()))?;
    let stats = parse_inverted_index(BufReader::new(f))
        .with_context(|| format!("reading inverted index {}", path.display()))?;
    tracing::info!(num_docs = stats.len(), path = %path.display(), "loaded inverted index");
    Ok(stats)
}

/// Read the document metadata CSV. Later rows replace earlier ones with the same id.
pub fn parse_documents<R: Read>(reader: R) -> Result<DocumentStore> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut docs = HashMap::new();
    for row in rdr.deserialize() {
        let row: DocumentRow = row?;
        let doc_id: DocId = row
            .doc_id
            .trim()
            .parse()
            .map_err(|e| RankError::parse(format!("Doc ID {:?}: {e}", row.doc_id)))?;
        docs.insert(
            doc_id,
            DocMeta {
                category: row.category,
                title: row.title,
                date: row.date,
                image_url: row.image_url,
                url: row.url,
                content: row.content,
            },
        );
    }
    Ok(DocumentStore::new(docs))
}

pub fn load_documents<P: AsRef<Path>>(path: P) -> Result<DocumentStore> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("opening document data {}", path.display()))?;
    let docs = parse_documents(f).with_context(|| format!("reading document data {}", path.display()))?;
    tracing::info!(num_docs = docs.len(), path = %path.display(), "loaded document details");
    Ok(docs)
}

impl SearchEngine {
    /// Load both inputs from disk and build the engine.
    pub fn load(paths: &DataPaths) -> Result<Self> {
        let stats = load_term_stats(&paths.index)?;
        let documents = load_documents(&paths.documents)?;
        Ok(SearchEngine::new(stats, documents)?)
    }
}
