// Data models: the records the engine produces and the storage layer keeps.
//
// These are separate from the database queries so the pure scoring and
// aggregation modules can use them without depending on rusqlite.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::keywords::{KeywordMatch, SuppressedMatch};
use crate::rules::Category;
use crate::scoring::classifier::DocumentClass;
use crate::scoring::severity::TierCounts;

/// Severity score for a single document. Keyed by (url, category).
///
/// Invariant: `final_score == severity_score * class_multiplier`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentScore {
    pub url: String,
    pub category: Category,
    pub severity_score: f64,
    pub final_score: f64,
    pub tier_counts: TierCounts,
    pub suppressed_count: u32,
    pub document_class: DocumentClass,
    pub class_multiplier: f64,
    pub is_high_authority: bool,
    pub matches: Vec<KeywordMatch>,
    pub suppressed: Vec<SuppressedMatch>,
    /// Monday of the publication week (UTC).
    pub week_of: NaiveDate,
    pub title: String,
    pub published_at: DateTime<Utc>,
}

/// Per-category, per-week rollup. Keyed by (category, week_of).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyAggregate {
    pub category: Category,
    pub week_of: NaiveDate,
    pub total_severity: f64,
    pub document_count: u32,
    pub avg_severity_per_doc: f64,
    /// Share of the week's raw matches in each tier. Sum to 1, or all 0.
    pub capture_proportion: f64,
    pub drift_proportion: f64,
    pub warning_proportion: f64,
    pub severity_mix: f64,
    pub top_keywords: Vec<String>,
}

/// Historical reference statistics for one category over a baseline period.
/// Keyed by (baseline_id, category).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBaseline {
    pub baseline_id: String,
    pub category: Category,
    pub avg_weekly_severity: f64,
    /// Sample standard deviation (N-1).
    pub stddev_weekly_severity: f64,
    pub avg_weekly_doc_count: f64,
    pub avg_severity_mix: f64,
    pub week_count: u32,
    pub drift_noise_floor: Option<f64>,
    pub embedding_centroid: Option<Vec<f64>>,
    pub computed_at: DateTime<Utc>,
}

/// A stored document embedding. Keyed by (url, category).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEmbedding {
    pub url: String,
    pub category: Category,
    pub week_of: NaiveDate,
    pub vector: Vec<f64>,
}
