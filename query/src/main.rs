use anyhow::Result;
use clap::{Parser, Subcommand};
use ranker::persist::DataPaths;
use ranker::{format_similarity_percentage, Algorithm, SearchEngine};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "query")]
#[command(about = "Rank documents against a query with Jaccard, Cosine or BM25", long_about = None)]
struct Cli {
    /// Directory holding inverted_index.txt and merged_combined_data.csv
    #[arg(long, global = true, default_value = "./data")]
    data: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one search and print the ranked documents
    Search {
        /// jaccard, cosine or bm25
        #[arg(long, default_value = "jaccard")]
        algorithm: String,
        /// Only documents in this category (case-insensitive)
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = 0.01)]
        min_similarity: f64,
        /// Maximum rows to print
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Show the top documents for the same query under every algorithm
    Compare {
        #[arg(long, default_value_t = 3)]
        top: usize,
        #[arg(required = true)]
        text: Vec<String>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let engine = SearchEngine::load(&DataPaths::from_root(&cli.data))?;

    match cli.command {
        Commands::Search { algorithm, category, min_similarity, limit, text } => {
            let algorithm = Algorithm::from(algorithm.as_str());
            search(&engine, &text.join(" "), &algorithm, category.as_deref(), min_similarity, limit);
        }
        Commands::Compare { top, text } => compare(&engine, &text.join(" "), top),
    }
    Ok(())
}

fn search(engine: &SearchEngine, query: &str, algorithm: &Algorithm, category: Option<&str>, min_similarity: f64, limit: usize) {
    let results = engine.search(query, algorithm, category, min_similarity);
    println!("{} result(s) for {query:?} ({algorithm})", results.len());
    for (rank, r) in results.iter().take(limit).enumerate() {
        println!(
            "{:>3}. {:>8}  [{}] {} ({})",
            rank + 1,
            format_similarity_percentage(r.similarity),
            r.content_id,
            r.title,
            r.category
        );
    }
}

fn compare(engine: &SearchEngine, query: &str, top: usize) {
    println!("Query: {query:?}");
    println!("{}", "-".repeat(60));
    for algorithm in [Algorithm::Jaccard, Algorithm::Cosine, Algorithm::Bm25] {
        println!("\n{}:", algorithm.as_str().to_uppercase());
        for (rank, r) in engine.search(query, &algorithm, None, 0.0).iter().take(top).enumerate() {
            println!("  {}. {}: {}", rank + 1, r.title, format_similarity_percentage(r.similarity));
        }
    }
}
