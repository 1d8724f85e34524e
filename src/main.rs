//! CLI entry point for the retrieval engine.
//!
//! Every command opens the index through `IndexManager::init`, runs, and
//! saves when it changed something. Diagnostics go to stderr through tracing;
//! results go to stdout.

use anyhow::{Context, Result};
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use ragindex::display::{
    create_progress_bar, create_results_table, create_stats_table, create_summary_table,
    with_spinner,
};
use ragindex::{
    ContextFormatter, IndexError, IndexManager, SearchHit, Settings, SimilarityKind,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Local semantic retrieval over text and source files
#[derive(Parser)]
#[command(
    name = "ragindex",
    version = env!("CARGO_PKG_VERSION"),
    about = "Local semantic retrieval over text and source files",
    long_about = "Chunk documents and source code, embed the chunks, and retrieve the most similar ones for a query.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Index file to use instead of the configured one
    #[arg(long, global = true, env = "RAGINDEX_INDEX")]
    index: Option<PathBuf>,

    /// Log lifecycle events (info level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log everything (debug level)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Initialize project
    #[command(about = "Set up .ragindex directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Index a file or a directory tree
    #[command(
        about = "Chunk, embed and store a file or directory",
        after_help = "Indexing a directory first drops every chunk previously indexed under it.\nIndexing a single file replaces that file's chunks."
    )]
    Index {
        /// File or directory to index
        path: PathBuf,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,

        /// Print the indexing summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Retrieve chunks similar to a query
    #[command(
        about = "Find the chunks most similar to a query",
        after_help = "Examples:\n  ragindex retrieve \"vector similarity\"\n  ragindex retrieve \"parse config\" --limit 10 --similarity cosine\n  ragindex retrieve \"error handling\" --context"
    )]
    Retrieve {
        /// Query text
        #[arg(num_args = 1.., required = true)]
        query: Vec<String>,

        /// Maximum number of results (defaults to retrieval.top_k)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Similarity kernel for this query: cosine, euclidean, dot_product, jaccard
        #[arg(short, long)]
        similarity: Option<SimilarityKind>,

        /// Output results as JSON
        #[arg(long, conflicts_with = "context")]
        json: bool,

        /// Render results as a prompt context block
        #[arg(long)]
        context: bool,

        /// Return raw text and score pairs without chunk metadata
        #[arg(long)]
        raw: bool,
    },

    /// Show index statistics
    Stats {
        /// Output statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evict the oldest chunks if memory ceilings are exceeded
    Evict,

    /// Remove every chunk and reset embedding statistics
    Clear,

    /// Show current configuration settings
    #[command(about = "Display active settings from .ragindex/settings.toml")]
    Config,
}

#[derive(Serialize)]
struct JsonRetrieveOutput<'a, T: Serialize> {
    query: &'a str,
    similarity: SimilarityKind,
    count: usize,
    results: Vec<T>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&cli, &settings);

    match run(cli, settings) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            if let Some(index_error) = e.downcast_ref::<IndexError>() {
                for suggestion in index_error.recovery_suggestions() {
                    eprintln!("  hint: {suggestion}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            eprintln!("Using default configuration.");
            Settings::default()
        }),
    };
    if let Some(index) = &cli.index {
        settings.index_path = index.clone();
    }
    Ok(settings)
}

/// Stderr subscriber; `RUST_LOG` overrides the flag-derived level.
fn init_tracing(cli: &Cli, settings: &Settings) {
    let level = if cli.debug || settings.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn open_manager(settings: &Settings) -> IndexManager {
    let manager = IndexManager::from_settings(settings);
    with_spinner("Loading index", || manager.init(None));
    manager
}

fn run(cli: Cli, settings: Settings) -> Result<ExitCode> {
    match cli.command {
        Commands::Init { force } => {
            let path = Settings::init_config_file(force)
                .map_err(|e| anyhow::anyhow!("{e}"))
                .context("creating configuration")?;
            println!("Created configuration file at: {}", path.display());
            println!("Edit this file to customize your settings.");
        }

        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            println!("{}", toml::to_string_pretty(&settings)?);
        }

        Commands::Index { path, quiet, json } => {
            if let Err(warning) = Settings::check_init() {
                warn!("{warning}; using defaults");
            }
            let manager = open_manager(&settings);
            index_path(&manager, &path, quiet, json)?;

            let evicted = manager.enforce_memory_limits();
            if evicted > 0 {
                eprintln!("Evicted {evicted} oldest chunks to stay within memory limits");
            }
            manager.save_index()?;
        }

        Commands::Retrieve {
            query,
            limit,
            similarity,
            json,
            context,
            raw,
        } => {
            let query = query.join(" ");
            let manager = open_manager(&settings);
            if let Some(kind) = similarity {
                manager.set_similarity(kind);
            }
            let limit = limit.unwrap_or(settings.retrieval.top_k);

            if raw {
                let hits: Vec<SearchHit> = manager
                    .retrieve(&query, limit)
                    .into_iter()
                    .map(SearchHit::from)
                    .collect();
                if hits.is_empty() {
                    eprintln!("No results for '{query}'");
                    return Ok(ExitCode::from(3));
                }
                let output = JsonRetrieveOutput {
                    query: &query,
                    similarity: manager.similarity(),
                    count: hits.len(),
                    results: hits,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
                return Ok(ExitCode::SUCCESS);
            }

            let hits = manager.retrieve_relevant(&query, limit);
            if context {
                println!("{}", ContextFormatter::default().format(&hits));
            } else if json {
                let output = JsonRetrieveOutput {
                    query: &query,
                    similarity: manager.similarity(),
                    count: hits.len(),
                    results: hits,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else if hits.is_empty() {
                eprintln!("No results for '{query}'");
                return Ok(ExitCode::from(3));
            } else {
                println!("{}", create_results_table(&hits));
            }
        }

        Commands::Stats { json } => {
            let manager = open_manager(&settings);
            let stats = manager.stats();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Index: {}", manager.index_path().display());
                println!("{}", create_stats_table(&stats));
            }
        }

        Commands::Evict => {
            let manager = open_manager(&settings);
            let evicted = manager.enforce_memory_limits();
            if evicted > 0 {
                manager.save_index()?;
            }
            println!("Evicted {evicted} chunks, {} remain", manager.len());
        }

        Commands::Clear => {
            let manager = open_manager(&settings);
            let removed = manager.len();
            manager.clear();
            manager.save_index()?;
            let path = manager.index_path();
            println!("Removed {removed} chunks from {}", path.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn index_path(manager: &IndexManager, path: &Path, quiet: bool, json: bool) -> Result<()> {
    if !path.is_dir() {
        manager.remove_chunks_from_path(path);
        let outcome = manager.index_file(path)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        } else {
            println!(
                "Indexed {}: {} chunks committed, {} skipped",
                outcome.path.display(),
                outcome.chunks_committed,
                outcome.chunks_skipped
            );
        }
        return Ok(());
    }

    let progress = (!quiet && !json).then(|| {
        let total = manager.count_indexable_files(path) as u64;
        create_progress_bar(total, "Indexing")
    });

    let summary = manager.index_project_with(path, |file| {
        if let Some(pb) = &progress {
            if let Some(name) = file.file_name() {
                pb.set_message(name.to_string_lossy().into_owned());
            }
            pb.inc(1);
        }
    })?;
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", create_summary_table(&summary));
        if summary.files_failed > 0 || summary.walk_aborted {
            eprintln!("{summary}");
        }
    }
    Ok(())
}
