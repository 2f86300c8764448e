use anyhow::{anyhow, Result};
use chapter_aligner::chapters::catalog::fetch_or_empty;
use chapter_aligner::chapters::files::{load_local_chapters, load_remote_chapters};
use chapter_aligner::chapters::placeholder::is_placeholder_title;
use chapter_aligner::config::OutputFormat;
use chapter_aligner::{
    analyze, AlignmentReport, BatchProcessor, CatalogItem, ChapterAligner, Config, FileCatalog,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, EnvFilter};

#[derive(Parser)]
#[command(name = "chapter-aligner")]
#[command(version, about = "Align audiobook chapter markers with catalog chapter lists")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to the standard search paths)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Align one book's chapters against its catalog chapters
    Align {
        /// Local chapter file (.json, .md or .txt)
        #[arg(short, long)]
        local: PathBuf,
        /// Catalog chapter file; takes precedence over --asin
        #[arg(short, long)]
        remote: Option<PathBuf>,
        /// Catalog item to look up in the catalog directory
        #[arg(long)]
        asin: Option<String>,
        /// Catalog region for --asin
        #[arg(long)]
        region: Option<String>,
        /// Preferred title locale for --asin
        #[arg(long)]
        locale: Option<String>,
        /// Catalog directory for --asin lookups
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report placeholder titles without consulting a catalog
    Analyze {
        /// Local chapter file (.json, .md or .txt)
        #[arg(short, long)]
        local: PathBuf,
    },
    /// Align every book below a directory
    Batch {
        /// Root directory containing one directory per book
        root: PathBuf,
        /// Catalog directory
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Number of parallel workers
        #[arg(short, long)]
        workers: Option<usize>,
    },
    /// Show or write the effective configuration
    Config {
        /// Write the effective configuration to this path
        #[arg(long)]
        init: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging before the config is read so config errors are visible
    let env_filter = EnvFilter::try_from_default_env().ok();
    let has_env_filter = env_filter.is_some();
    let initial_filter = env_filter.unwrap_or_else(|| log_filter(if cli.verbose { "debug" } else { "info" }));
    let (filter, filter_handle) = reload::Layer::new(initial_filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };

    // RUST_LOG and --verbose win over the configured level
    if !has_env_filter && !cli.verbose {
        filter_handle.reload(log_filter(&config.output.log_level))?;
    }

    if cli.verbose {
        info!("Verbose logging enabled");
    }

    match cli.command {
        Commands::Align {
            local,
            remote,
            asin,
            region,
            locale,
            catalog,
            json,
        } => {
            config.validate()?;
            let aligner = ChapterAligner::new(config.alignment.clone())?;
            let local_chapters = load_local_chapters(&local).await?;

            let remote_chapters = match (remote, asin) {
                (Some(path), _) => load_remote_chapters(&path).await?,
                (None, Some(asin)) => {
                    let catalog_dir = catalog
                        .or_else(|| config.batch.catalog_dir.clone())
                        .unwrap_or_else(|| PathBuf::from("catalog"));
                    let mut item = CatalogItem::new(
                        asin,
                        region.unwrap_or_else(|| config.batch.default_region.clone()),
                    );
                    item.locale = locale;
                    fetch_or_empty(&FileCatalog::new(catalog_dir), &item).await
                }
                (None, None) => return Err(anyhow!("Either --remote or --asin is required")),
            };

            let result = aligner.align(&local_chapters, &remote_chapters);
            let report = AlignmentReport::new(&local_chapters, &remote_chapters, &result);

            info!(
                "🎯 {} of {} chapters matched, overall confidence {:.2}",
                result.matched_count(),
                local_chapters.len(),
                result.overall_confidence
            );
            if result.needs_update {
                warn!("⚠️ Local titles look auto-generated");
            }

            if json || config.output.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.to_markdown());
            }
        }

        Commands::Analyze { local } => {
            let chapters = load_local_chapters(&local).await?;
            let analysis = analyze(&chapters);

            info!("📊 Placeholder Analysis:");
            info!("  Chapters: {}", analysis.total);
            info!(
                "  Placeholders: {} ({:.0}%)",
                analysis.placeholder_count,
                analysis.placeholder_ratio() * 100.0
            );
            info!("  Empty titles: {}", analysis.empty_count);

            for (index, chapter) in chapters.iter().enumerate() {
                if is_placeholder_title(&chapter.title) {
                    info!("    {}. {:?}", index + 1, chapter.title);
                }
            }

            if analysis.needs_update {
                warn!("⚠️ Titles need updating");
            } else {
                info!("✅ Titles look descriptive");
            }
        }

        Commands::Batch { root, catalog, workers } => {
            let mut config = config;
            if let Some(catalog) = catalog {
                config.batch.catalog_dir = Some(catalog);
            }
            if let Some(workers) = workers {
                config.batch.max_workers = workers;
            }

            if !root.exists() {
                error!("Batch root does not exist: {}", root.display());
                return Err(anyhow!("Batch root not found"));
            }

            info!("🚀 Chapter Aligner starting...");
            info!("🔧 Workers: {}", config.batch.max_workers);

            let processor = BatchProcessor::new(config)?;
            let summary = processor.process_directory(&root).await?;

            info!("🎉 Batch completed in {:.2}s", summary.total_time.as_secs_f64());
            info!("✅ Aligned: {}", summary.aligned);
            info!("⚠️ Unmatched: {}", summary.unmatched);
            info!("❌ Failed: {}", summary.failed);
            info!("📝 Need updated titles: {}", summary.needs_update);
        }

        Commands::Config { init } => {
            config.validate()?;
            match init {
                Some(path) => config.save(&path)?,
                None => println!("{}", config.summary()),
            }
        }
    }

    Ok(())
}

fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!("chapter_aligner={},warn", level))
}
