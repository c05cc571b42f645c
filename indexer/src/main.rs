use anyhow::{Context, Result};
use bm25_core::corpus::load_corpus;
use bm25_core::search::rank;
use bm25_core::{open_or_build, Bm25, Corpus, IndexPaths, IndexSource, SearchConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build, cache and query a BM25 index over a JSON corpus", long_about = None)]
struct Cli {
    /// JSON search config; defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Corpus directory, overrides `dataDir` from the config
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the cached index or rebuild it when the corpus changed
    Build {
        /// Ignore the cache record and rebuild
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Query the index and print ranked document ids
    Search {
        /// Overrides `maxResults` from the config
        #[arg(long)]
        max_results: Option<usize>,
        #[arg(required = true)]
        query: Vec<String>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SearchConfig::from_file(path)
            .with_context(|| format!("couldn't read the config {}", path.display()))?,
        None => SearchConfig::default(),
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    match cli.command {
        Commands::Build { force } => {
            let (_, corpus, source) = open_index(&config, config.use_cache && !force)?;
            println!("{} documents, index {}", corpus.len(), describe(source));
        }
        Commands::Search { max_results, query } => {
            if let Some(k) = max_results {
                config.max_results = k;
            }
            let (engine, corpus, _) = open_index(&config, config.use_cache)?;
            let query = query.join(" ");
            let splitter = config.splitter.build();

            let start = Instant::now();
            let hits = engine.search_terms(&splitter.split(&query));
            tracing::info!(
                query = %query,
                hits = hits.len(),
                took_s = start.elapsed().as_secs_f64(),
                "searched"
            );

            for (pos, hit) in rank(&hits) {
                println!("{pos}.\t{}\t{:.4}", corpus.id(hit.row).unwrap_or("?"), hit.score);
            }
        }
    }
    Ok(())
}

fn open_index(config: &SearchConfig, use_cache: bool) -> Result<(Bm25, Corpus, IndexSource)> {
    let splitter = config.splitter.build();
    let corpus = load_corpus(&config.data_dir, config.parse_policy, splitter.as_ref())
        .with_context(|| format!("couldn't read the corpus in {}", config.data_dir.display()))?;
    tracing::info!(num_docs = corpus.len(), fingerprint = %corpus.fingerprint, "corpus ready");

    let paths = IndexPaths::new(config.matrix_path(), config.state_path());
    let (engine, source) = open_or_build(&paths, &corpus, config.engine(), use_cache);
    Ok((engine, corpus, source))
}

fn describe(source: IndexSource) -> &'static str {
    match source {
        IndexSource::Cache => "loaded from cache",
        IndexSource::Rebuilt { persisted: true } => "rebuilt and saved",
        IndexSource::Rebuilt { persisted: false } => "rebuilt (not saved)",
    }
}
