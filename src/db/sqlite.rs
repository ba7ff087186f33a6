// SqliteDatabase: rusqlite backend implementing the Database trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Send.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// The lock is never held across .await points, so concurrent pipeline
// workers serialize only on the short write itself.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{CategoryBaseline, DocumentEmbedding, DocumentScore, WeeklyAggregate};
use super::traits::Database;
use crate::rules::Category;

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn get_run_state(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        super::queries::get_run_state(&conn, key)
    }

    async fn set_run_state(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::set_run_state(&conn, key, value)
    }

    async fn get_all_run_state(&self) -> Result<Vec<(String, String)>> {
        let conn = self.conn.lock().await;
        super::queries::get_all_run_state(&conn)
    }

    async fn get_document_score_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::get_document_score_count(&conn)
    }

    async fn upsert_document_score(&self, score: &DocumentScore) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::upsert_document_score(&conn, score)
    }

    async fn get_document_scores(
        &self,
        category: Category,
        week_of: NaiveDate,
    ) -> Result<Vec<DocumentScore>> {
        let conn = self.conn.lock().await;
        super::queries::get_document_scores(&conn, category, week_of)
    }

    async fn get_top_keywords(
        &self,
        category: Category,
        week_of: NaiveDate,
        limit: usize,
    ) -> Result<Vec<String>> {
        let conn = self.conn.lock().await;
        super::queries::get_top_keywords(&conn, category, week_of, limit)
    }

    async fn upsert_weekly_aggregate(&self, aggregate: &WeeklyAggregate) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::upsert_weekly_aggregate(&conn, aggregate)
    }

    async fn get_weekly_aggregate(
        &self,
        category: Category,
        week_of: NaiveDate,
    ) -> Result<Option<WeeklyAggregate>> {
        let conn = self.conn.lock().await;
        super::queries::get_weekly_aggregate(&conn, category, week_of)
    }

    async fn get_weekly_aggregates(
        &self,
        category: Category,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WeeklyAggregate>> {
        let conn = self.conn.lock().await;
        super::queries::get_weekly_aggregates(&conn, category, start, end)
    }

    async fn save_document_embedding(&self, embedding: &DocumentEmbedding) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::save_document_embedding(&conn, embedding)
    }

    async fn get_week_embeddings(
        &self,
        category: Category,
        week_of: NaiveDate,
    ) -> Result<Vec<DocumentEmbedding>> {
        let conn = self.conn.lock().await;
        super::queries::get_week_embeddings(&conn, category, week_of)
    }

    async fn get_embeddings_in_range(
        &self,
        category: Category,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DocumentEmbedding>> {
        let conn = self.conn.lock().await;
        super::queries::get_embeddings_in_range(&conn, category, start, end)
    }

    async fn upsert_baseline(&self, baseline: &CategoryBaseline) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::upsert_baseline(&conn, baseline)
    }

    async fn get_baseline(
        &self,
        baseline_id: &str,
        category: Category,
    ) -> Result<Option<CategoryBaseline>> {
        let conn = self.conn.lock().await;
        super::queries::get_baseline(&conn, baseline_id, category)
    }

    async fn get_baselines(&self, baseline_id: &str) -> Result<Vec<CategoryBaseline>> {
        let conn = self.conn.lock().await;
        super::queries::get_baselines(&conn, baseline_id)
    }
}
