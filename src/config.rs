use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use crate::aggregate::baseline::BaselinePeriod;
use crate::aggregate::weekly::DEFAULT_TOP_KEYWORDS;
use crate::rules::RuleBook;

pub const DEFAULT_DB_PATH: &str = "./driftwatch.db";
pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_BASELINE_ID: &str = "baseline_2024";
const DEFAULT_BASELINE_START: &str = "2024-01-01";
const DEFAULT_BASELINE_END: &str = "2024-12-31";

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Every
/// setting has a default, so an empty environment runs keyword-only with
/// the built-in rule tables.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    /// JSON rule book replacing the built-in tables (DRIFTWATCH_RULES).
    pub rules_path: Option<PathBuf>,
    /// Directory containing the embedding model files.
    pub model_dir: PathBuf,
    /// Units processed in parallel by the pipelines.
    pub concurrency: usize,
    pub baseline: BaselinePeriod,
    pub top_keywords: usize,
}

fn parse_usize(key: &str, default: usize) -> Result<usize> {
    match env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<usize>()
            .with_context(|| format!("{key} must be a non-negative integer, got {v:?}")),
        Err(_) => Ok(default),
    }
}

fn parse_date(key: &str, default: &str) -> Result<NaiveDate> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("{key} must be a YYYY-MM-DD date, got {raw:?}"))
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let model_dir = env::var("DRIFTWATCH_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::semantic::embeddings::default_model_dir());

        let start = parse_date("DRIFTWATCH_BASELINE_START", DEFAULT_BASELINE_START)?;
        let end = parse_date("DRIFTWATCH_BASELINE_END", DEFAULT_BASELINE_END)?;
        if end < start {
            anyhow::bail!("DRIFTWATCH_BASELINE_END ({end}) is before DRIFTWATCH_BASELINE_START ({start})");
        }
        let baseline_id =
            env::var("DRIFTWATCH_BASELINE_ID").unwrap_or_else(|_| DEFAULT_BASELINE_ID.to_string());

        Ok(Self {
            db_path: env::var("DRIFTWATCH_DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string()),
            rules_path: env::var("DRIFTWATCH_RULES").ok().map(PathBuf::from),
            model_dir,
            concurrency: parse_usize("DRIFTWATCH_CONCURRENCY", DEFAULT_CONCURRENCY)?.max(1),
            baseline: BaselinePeriod::new(baseline_id, start, end),
            top_keywords: parse_usize("DRIFTWATCH_TOP_KEYWORDS", DEFAULT_TOP_KEYWORDS)?,
        })
    }

    /// The rule book: the configured JSON file, or the built-in tables.
    pub fn load_rules(&self) -> Result<RuleBook> {
        match &self.rules_path {
            Some(path) => {
                let book = RuleBook::from_path(path)
                    .with_context(|| format!("Failed to load rule book from {}", path.display()))?;
                info!(path = %path.display(), categories = book.categories.len(), "Loaded rule book");
                Ok(book)
            }
            None => Ok(RuleBook::default()),
        }
    }
}
