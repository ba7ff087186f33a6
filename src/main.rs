use anyhow::Result;
use chrono::{NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use driftwatch::assessment::{assess_category, compute_confidence, ConfidenceConfig, Status};
use driftwatch::config::Config;
use driftwatch::content::normalize::FeedFile;
use driftwatch::db::Database;
use driftwatch::output::terminal;
use driftwatch::pipeline::weekly::CategoryBatch;
use driftwatch::rules::Category;
use driftwatch::scoring::severity::week_of;
use driftwatch::semantic::embeddings::SentenceEmbedder;
use driftwatch::semantic::traits::EmbeddingProvider;

/// Driftwatch: institutional drift scoring for government actions.
///
/// Scores feed items against per-category keyword rules, rolls them into
/// weekly aggregates, and compares weeks against a historical baseline.
#[derive(Parser)]
#[command(name = "driftwatch", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Score a feed batch file and update weekly aggregates
    Ingest {
        /// JSON file: a list of entries, or lists keyed by category
        file: PathBuf,

        /// Category for a bare list of entries
        #[arg(long)]
        category: Option<Category>,

        /// Score in memory only, without touching the database
        #[arg(long)]
        stateless: bool,

        /// Skip embedding generation even if the model is present
        #[arg(long)]
        no_embed: bool,

        /// Print every document score
        #[arg(long)]
        show_scores: bool,
    },

    /// Assess one category's items and print status with confidence
    Assess {
        /// JSON file of feed entries
        file: PathBuf,

        /// Category the items belong to
        #[arg(long)]
        category: Category,

        /// Status from an independent second assessment, for agreement scoring
        #[arg(long)]
        secondary: Option<Status>,
    },

    /// Recompute baselines for the configured period
    Baseline,

    /// Compare a week's embeddings against the baseline centroid
    Drift {
        /// Category to check (all categories when omitted)
        #[arg(long)]
        category: Option<Category>,

        /// Any date in the week to check (YYYY-MM-DD)
        #[arg(long)]
        week: NaiveDate,

        /// Baseline id (default: DRIFTWATCH_BASELINE_ID)
        #[arg(long)]
        baseline_id: Option<String>,
    },

    /// Show system status (last runs, DB stats, baselines)
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("driftwatch=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Init => {
            info!("Initializing Driftwatch database...");
            let db = init_database(&config)?;
            let table_count = db.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nNext: driftwatch ingest <batch.json>");
        }

        Commands::Ingest {
            file,
            category,
            stateless,
            no_embed,
            show_scores,
        } => {
            let book = config.load_rules()?;
            let batches: Vec<CategoryBatch> = FeedFile::from_path(&file)?
                .into_batches(category, Utc::now())?
                .into_iter()
                .map(|(category, items)| CategoryBatch { category, items })
                .collect();

            let db = if stateless {
                None
            } else {
                Some(init_database(&config)?)
            };
            let embedder = if no_embed || db.is_none() {
                None
            } else {
                load_embedder(&config)
            };

            let summary = driftwatch::pipeline::weekly::run(
                db.as_ref(),
                &book,
                embedder.as_ref().map(|e| e as &dyn EmbeddingProvider),
                &batches,
                config.concurrency,
                config.top_keywords,
            )
            .await?;

            if show_scores {
                for batch in &batches {
                    let scores = driftwatch::scoring::severity::score_items(
                        batch.category,
                        &batch.items,
                        &book,
                    );
                    terminal::display_document_scores(&scores);
                }
            }
            terminal::display_weekly_aggregates(&summary.aggregates);
            println!(
                "Scored {} documents into {} weekly aggregates",
                summary.documents_scored,
                summary.aggregates.len()
            );
            if summary.embeddings_saved > 0 {
                println!("Stored {} embeddings", summary.embeddings_saved);
            }
            if summary.storage_failures > 0 {
                println!(
                    "{}",
                    format!(
                        "{} storage operations failed; see log for details",
                        summary.storage_failures
                    )
                    .yellow()
                );
            }
        }

        Commands::Assess {
            file,
            category,
            secondary,
        } => {
            let book = config.load_rules()?;
            let batches = FeedFile::from_path(&file)?.into_batches(Some(category), Utc::now())?;
            let items: Vec<_> = batches
                .into_iter()
                .filter(|(c, _)| *c == category)
                .flat_map(|(_, items)| items)
                .collect();

            let result = assess_category(category, &items, &book);
            let confidence = compute_confidence(
                &result,
                &items,
                &book,
                secondary,
                &ConfidenceConfig::default(),
            );
            terminal::display_assessment(category, &result, &confidence);
        }

        Commands::Baseline => {
            let db = open_database(&config)?;
            let summary = driftwatch::pipeline::baseline::run(
                Some(&db),
                &config.baseline,
                &Category::ALL,
                config.concurrency,
            )
            .await?;
            terminal::display_baselines(&summary.baselines);
            if !summary.skipped.is_empty() {
                let names: Vec<&str> = summary.skipped.iter().map(|c| c.as_str()).collect();
                println!(
                    "{}",
                    format!("No history in period for: {}", names.join(", ")).dimmed()
                );
            }
            if !summary.failed.is_empty() {
                let names: Vec<&str> = summary.failed.iter().map(|c| c.as_str()).collect();
                println!(
                    "{}",
                    format!(
                        "History unreadable, stored baselines kept for: {}",
                        names.join(", ")
                    )
                    .yellow()
                );
            }
        }

        Commands::Drift {
            category,
            week,
            baseline_id,
        } => {
            let db = open_database(&config)?;
            let baseline_id = baseline_id.unwrap_or_else(|| config.baseline.id.clone());
            let monday = week_of(week.and_time(NaiveTime::MIN).and_utc());
            let categories: Vec<Category> = match category {
                Some(c) => vec![c],
                None => Category::ALL.to_vec(),
            };

            println!("Semantic drift for week of {monday} vs {baseline_id}:\n");
            for c in categories {
                let result =
                    driftwatch::semantic::drift::compute_semantic_drift(&db, c, monday, &baseline_id)
                        .await;
                terminal::display_drift(c, result.as_ref());
            }
        }

        Commands::Status => {
            if !std::path::Path::new(&config.db_path).exists() {
                println!("Database: not initialized");
                println!("\nRun `driftwatch init` to set up the database.");
                return Ok(());
            }
            let db = open_database(&config)?;
            driftwatch::status::show(&db, &config.db_path).await?;
        }
    }

    Ok(())
}

/// Load the local embedding model if its files are present.
///
/// Any failure just disables embeddings; the keyword pipeline doesn't need them.
fn load_embedder(config: &Config) -> Option<SentenceEmbedder> {
    match SentenceEmbedder::load_if_present(&config.model_dir) {
        Ok(Some(e)) => {
            info!(dir = %config.model_dir.display(), "Embedding model loaded");
            Some(e)
        }
        Ok(None) => {
            info!(
                dir = %config.model_dir.display(),
                "No embedding model found; semantic drift disabled"
            );
            None
        }
        Err(e) => {
            warn!(error = %e, "Failed to load embedding model; semantic drift disabled");
            None
        }
    }
}

#[cfg(feature = "sqlite")]
fn init_database(config: &Config) -> Result<Arc<dyn Database>> {
    driftwatch::db::initialize_sqlite(&config.db_path)
}

#[cfg(feature = "sqlite")]
fn open_database(config: &Config) -> Result<Arc<dyn Database>> {
    driftwatch::db::open_sqlite(&config.db_path)
}

#[cfg(not(feature = "sqlite"))]
fn init_database(_config: &Config) -> Result<Arc<dyn Database>> {
    anyhow::bail!("Built without a storage backend; enable the `sqlite` feature or use --stateless")
}

#[cfg(not(feature = "sqlite"))]
fn open_database(config: &Config) -> Result<Arc<dyn Database>> {
    init_database(config)
}
