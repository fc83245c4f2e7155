use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use repograph::config::AnalyzerConfig;
use repograph::core::{
    spawn_categorization, Categorizer, CodebaseAnalyzer, DirectoryCategorizer, GraphSession,
    MergeOutcome, StaticCategorizer,
};
use repograph::formatters::{JsonFormatter, SummaryFormatter};
use repograph::parsers::cache::AnalysisCache;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "repograph",
    version = "0.1.0",
    author = "repograph developers",
    about = "Builds a file-level dependency graph from a zipped repository"
)]
struct Cli {
    /// Zip archive of the repository to analyze
    #[arg(short, long, value_name = "ZIP")]
    input: PathBuf,

    /// Output file path
    #[arg(short, long, value_name = "FILE", default_value = "repograph.json")]
    output: PathBuf,

    /// Folder inside the archive whose prefix is stripped from every path
    #[arg(short, long, value_name = "NAME")]
    root: Option<String>,

    /// Output format: json, json-compact, summary
    #[arg(short, long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// TOML file with analyzer settings
    #[arg(short, long, value_name = "TOML")]
    config: Option<PathBuf>,

    /// Pre-computed categorization response to merge into the graph
    #[arg(long, value_name = "JSON", conflicts_with = "group_by_directory")]
    categories: Option<PathBuf>,

    /// Categorize files by their top-level directory
    #[arg(long)]
    group_by_directory: bool,

    /// Directory for the on-disk analysis cache
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Worker threads for per-file analysis
    #[arg(short, long, value_name = "N")]
    threads: Option<usize>,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
#[value(rename_all = "kebab-case")]
enum OutputFormat {
    Json,
    JsonCompact,
    Summary,
}

impl OutputFormat {
    fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::JsonCompact => "json-compact",
            OutputFormat::Summary => "summary",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    let Cli {
        input,
        output,
        root,
        format,
        config,
        categories,
        group_by_directory,
        cache_dir,
        threads,
        verbose: _,
    } = cli;

    let start_time = Instant::now();

    let mut analyzer_config = match &config {
        Some(path) => AnalyzerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AnalyzerConfig::default(),
    };
    if threads.is_some() {
        analyzer_config.threads = threads;
    }
    analyzer_config.validate()?;
    let timeout = Duration::from_secs(analyzer_config.categorization_timeout_secs);

    println!("REPOGRAPH - Repository Dependency Graph");
    println!("Input: {}", input.display());
    println!("Output: {}", output.display());
    println!("Format: {}", format.as_str());
    if let Some(root) = &root {
        println!("Root: {}", root);
    }

    let archive = std::fs::read(&input)
        .with_context(|| format!("failed to read archive {}", input.display()))?;
    if archive.is_empty() {
        bail!("archive {} is empty", input.display());
    }

    let categorizer: Option<Arc<dyn Categorizer>> = match (&categories, group_by_directory) {
        (Some(path), _) => Some(Arc::new(
            StaticCategorizer::from_file(path)
                .with_context(|| format!("failed to load categories {}", path.display()))?,
        )),
        (None, true) => Some(Arc::new(DirectoryCategorizer::new())),
        (None, false) => None,
    };

    let analysis_start = Instant::now();

    let mut analyzer = CodebaseAnalyzer::new(analyzer_config);
    if let Some(dir) = cache_dir {
        analyzer = analyzer.with_cache(AnalysisCache::new(Some(dir)));
    }
    let graph = tokio::task::spawn_blocking(move || analyzer.analyze(&archive, root.as_deref()))
        .await
        .context("analysis task panicked")??;

    println!(
        "Analysis completed in {:.2}s ({} files, {} dependencies)",
        analysis_start.elapsed().as_secs_f64(),
        graph.nodes.len(),
        graph.edges.len()
    );

    let session = Arc::new(GraphSession::new());
    let epoch = session.install(graph);

    if let Some(categorizer) = categorizer {
        info!("Categorizing graph {} with the {} adapter", epoch, categorizer.name());
        if let Some(handle) = spawn_categorization(Arc::clone(&session), categorizer, timeout) {
            match handle.await.context("categorization task panicked")? {
                MergeOutcome::Applied { assigned } => {
                    println!("Categorized {} files", assigned);
                }
                MergeOutcome::Stale { result, current } => {
                    warn!(
                        "Categorization for graph {} discarded; current graph is {:?}",
                        result, current
                    );
                }
                MergeOutcome::Failed(reason) => {
                    warn!("Categorization skipped: {}", reason);
                }
            }
        }
    }

    let graph = session
        .snapshot()
        .context("no graph installed in the session")?;

    match format {
        OutputFormat::Json => {
            JsonFormatter::new().format_to_file(&graph, &output)?;
        }
        OutputFormat::JsonCompact => {
            JsonFormatter::new()
                .pretty(false)
                .format_to_file(&graph, &output)?;
        }
        OutputFormat::Summary => {
            SummaryFormatter::new().format_to_file(&graph, &output)?;
        }
    }

    println!("Analysis complete. Generated {}", output.display());
    println!(
        "Total execution time: {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}
