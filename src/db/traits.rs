// Database trait: backend-agnostic async interface for all DB operations.
//
// Implementors: SqliteDatabase (wraps rusqlite). All methods are async so a
// sync backend behind a Mutex and a native async backend fit the same seam.
//
// Every write is an idempotent upsert keyed by the record's natural key, so
// concurrent writers for different (category, week) units never conflict and
// last-write-wins is safe for the same unit.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use super::models::{CategoryBaseline, DocumentEmbedding, DocumentScore, WeeklyAggregate};
use crate::rules::Category;

#[async_trait]
pub trait Database: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    // --- Run state ---

    /// Get a run state value by key (e.g., "last_ingest_at").
    async fn get_run_state(&self, key: &str) -> Result<Option<String>>;

    /// Set a run state value (upsert).
    async fn set_run_state(&self, key: &str, value: &str) -> Result<()>;

    /// Get all run state key-value pairs.
    async fn get_all_run_state(&self) -> Result<Vec<(String, String)>>;

    // --- Document scores ---

    /// Save or replace a document score, keyed by (url, category).
    async fn upsert_document_score(&self, score: &DocumentScore) -> Result<()>;

    /// Total number of stored document scores.
    async fn get_document_score_count(&self) -> Result<i64>;

    /// All stored document scores for one category-week.
    async fn get_document_scores(
        &self,
        category: Category,
        week_of: NaiveDate,
    ) -> Result<Vec<DocumentScore>>;

    /// Most frequent matched keywords for one category-week.
    async fn get_top_keywords(
        &self,
        category: Category,
        week_of: NaiveDate,
        limit: usize,
    ) -> Result<Vec<String>>;

    // --- Weekly aggregates ---

    /// Save or replace a weekly aggregate, keyed by (category, week_of).
    async fn upsert_weekly_aggregate(&self, aggregate: &WeeklyAggregate) -> Result<()>;

    async fn get_weekly_aggregate(
        &self,
        category: Category,
        week_of: NaiveDate,
    ) -> Result<Option<WeeklyAggregate>>;

    /// Aggregates for a category with week_of in [start, end], ordered by week.
    async fn get_weekly_aggregates(
        &self,
        category: Category,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WeeklyAggregate>>;

    // --- Document embeddings ---

    /// Save or replace a document embedding, keyed by (url, category).
    async fn save_document_embedding(&self, embedding: &DocumentEmbedding) -> Result<()>;

    async fn get_week_embeddings(
        &self,
        category: Category,
        week_of: NaiveDate,
    ) -> Result<Vec<DocumentEmbedding>>;

    /// Embeddings for a category with week_of in [start, end], ordered by week.
    async fn get_embeddings_in_range(
        &self,
        category: Category,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DocumentEmbedding>>;

    // --- Baselines ---

    /// Save or replace a baseline, keyed by (baseline_id, category).
    async fn upsert_baseline(&self, baseline: &CategoryBaseline) -> Result<()>;

    async fn get_baseline(
        &self,
        baseline_id: &str,
        category: Category,
    ) -> Result<Option<CategoryBaseline>>;

    /// Every category's baseline for one baseline id.
    async fn get_baselines(&self, baseline_id: &str) -> Result<Vec<CategoryBaseline>>;
}
