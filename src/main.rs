// file: src/main.rs
// description: commandline application entry point
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use tracing::{info, warn};
use vector_ingest::models::parse_sources_file;
use vector_ingest::utils::logging::{format_error, format_success, format_warning};
use vector_ingest::{Config, PipelineOrchestrator, RunOptions, Source, Validator};

#[derive(Parser)]
#[command(name = "ingest")]
#[command(version = "0.1.0")]
#[command(about = "Crawl, parse, and embed content into a vector store", long_about = None)]
struct Cli {
    /// URLs or file paths to ingest
    sources: Vec<String>,

    /// File containing one source locator per line
    #[arg(short, long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Parser used for every source in this run
    #[arg(short = 't', long = "type", default_value = "html")]
    source_type: String,

    /// Vector store backend
    #[arg(short, long, default_value = "qdrant")]
    store: String,

    /// Target collection name
    #[arg(short, long, default_value = "documents")]
    collection: String,

    /// Crawl each URL source recursively within its path scope
    #[arg(short, long)]
    recursive: bool,

    /// Maximum crawl depth (seeds are depth 0)
    #[arg(long, default_value_t = 3)]
    depth: usize,

    /// Behavior configuration file
    #[arg(long, value_name = "FILE", default_value = "config/default.yaml")]
    config: PathBuf,

    /// Colored log output (pass `--color false` to disable)
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    /// Log at debug level
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    vector_ingest::utils::logging::init_logger(cli.color, cli.verbose);

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        Config::load(None).unwrap_or_else(|e| {
            warn!("Falling back to built-in defaults: {}", e);
            Config::default_config()
        })
    };

    let mut locators = cli.sources.clone();
    if let Some(path) = &cli.file {
        Validator::validate_file_path(path)?;
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read sources file: {}", path.display()))?;
        locators.extend(parse_sources_file(&contents));
    }

    if locators.is_empty() {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    }

    let sources: Vec<Source> = locators
        .into_iter()
        .map(|locator| Source::new(locator, cli.source_type.clone()))
        .collect();

    info!("Ingesting {} source(s)", sources.len());

    let orchestrator =
        PipelineOrchestrator::new(config).context("Failed to initialize pipeline")?;

    // Ctrl-C stops new fetches; whatever is already parsed still gets stored.
    let cancel = orchestrator.cancellation_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", format_warning("Interrupt received, finishing up"));
            cancel.store(true, Ordering::Relaxed);
        }
    });

    let options = RunOptions {
        store_type: cli.store,
        collection: cli.collection,
        recursive: cli.recursive,
        max_depth: cli.depth,
    };

    let summary = orchestrator.run(&sources, &options).await?;
    summary.log();

    if summary.failures.is_empty() {
        println!(
            "{}",
            format_success(&format!("Stored {} document(s)", summary.stored))
        );
    } else if summary.stored > 0 {
        println!(
            "{}",
            format_warning(&format!(
                "Stored {} document(s), {} failure(s)",
                summary.stored,
                summary.failures.len()
            ))
        );
    } else {
        // Still exit 0: the run completed, the failures are per-locator.
        println!("{}", format_error("No documents were stored"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "ingest",
            "--color",
            "false",
            "-r",
            "--depth",
            "2",
            "-t",
            "text",
            "https://example.com/docs/",
        ])
        .unwrap();

        assert!(!cli.color);
        assert!(cli.recursive);
        assert_eq!(cli.depth, 2);
        assert_eq!(cli.source_type, "text");
        assert_eq!(cli.sources, vec!["https://example.com/docs/"]);
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["ingest", "https://example.com/"]).unwrap();

        assert!(cli.color);
        assert!(!cli.recursive);
        assert_eq!(cli.depth, 3);
        assert_eq!(cli.source_type, "html");
        assert_eq!(cli.store, "qdrant");
        assert_eq!(cli.collection, "documents");
    }
}
