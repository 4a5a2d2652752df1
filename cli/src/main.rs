use anyhow::Result;
use clap::{Parser, Subcommand};
use docrank_core::{
    build_index_with_mode, run_query_with, Bm25Params, BuildStats, OpenMode, SearchConfig, SearchResults,
    DISPLAY_LIMIT,
};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "docrank")]
#[command(about = "Index a folder of HTML documents and rank them against free-text queries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct RankingArgs {
    /// Maximum number of hits to display
    #[arg(long, default_value_t = DISPLAY_LIMIT)]
    limit: usize,
    /// BM25 term-frequency saturation
    #[arg(long, default_value_t = Bm25Params::default().k1)]
    k1: f32,
    /// BM25 length normalisation
    #[arg(long, default_value_t = Bm25Params::default().b)]
    b: f32,
}

impl RankingArgs {
    fn config(&self) -> SearchConfig {
        SearchConfig { limit: self.limit, bm25: Bm25Params { k1: self.k1, b: self.b } }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from every file under a document folder
    Build {
        /// Document folder (or a single file)
        #[arg(long)]
        docs: String,
        /// Index directory
        #[arg(long)]
        index: String,
        /// Update documents in an existing index instead of rebuilding it
        #[arg(long, default_value_t = false)]
        append: bool,
    },
    /// Query an existing index
    Search {
        /// Index directory
        #[arg(long)]
        index: String,
        /// Ranking model: VS (vector space) or OK (Okapi BM25)
        #[arg(long, default_value = "OK")]
        model: String,
        #[command(flatten)]
        ranking: RankingArgs,
        /// Query text
        query: String,
    },
    /// Rebuild the index, then run one query against it
    Run {
        docs: String,
        index: String,
        /// VS or OK
        model: String,
        query: String,
        #[command(flatten)]
        ranking: RankingArgs,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { docs, index, append } => {
            let mode = if append { OpenMode::CreateOrAppend } else { OpenMode::Create };
            build(&docs, &index, mode)
        }
        Commands::Search { index, model, ranking, query } => search(&index, &query, &model, &ranking.config()),
        Commands::Run { docs, index, model, query, ranking } => {
            build(&docs, &index, OpenMode::Create)?;
            search(&index, &query, &model, &ranking.config())
        }
    }
}

fn build(docs: &str, index: &str, mode: OpenMode) -> Result<()> {
    println!("Indexing to directory '{index}'...");
    let stats = build_index_with_mode(docs, index, mode)?;
    tracing::info!(docs, index, generation = stats.generation, indexed = stats.indexed(), "build finished");
    print_build(&stats);
    Ok(())
}

fn search(index: &str, query: &str, model: &str, config: &SearchConfig) -> Result<()> {
    tracing::info!(index, model, limit = config.limit, "searching");
    let results = run_query_with(index, query, model, config)?;
    tracing::debug!(total_hits = results.total_hits, shown = results.hits.len(), "search finished");
    print_results(&results);
    Ok(())
}

fn print_build(stats: &BuildStats) {
    println!(
        "Documents Indexed In {} Seconds ({} added, {} updated, {} skipped)",
        stats.elapsed.as_secs_f64(),
        stats.added,
        stats.updated,
        stats.skipped
    );
}

fn print_results(results: &SearchResults) {
    println!("\nUsing {}...", results.similarity);
    println!("\nSearching For: {}\n", results.query);
    println!(
        "Total {} Matching Documents Found in {} Seconds",
        results.total_hits,
        results.took.as_secs_f64()
    );
    println!("Showing Top {}\n", results.hits.len());
    for (rank, hit) in results.hits.iter().enumerate() {
        println!("{}. {}", rank + 1, hit.stored.title);
        println!("   Path: {}", hit.stored.path);
        println!("   Score: {}\n", hit.score);
    }
}
