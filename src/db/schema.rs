// Database schema: table creation and migrations.
//
// Version 1 is the base schema below. Later versions live in `MIGRATIONS`
// and are applied in order; `schema_version` records each one so a version
// runs at most once per database file.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet.
///
/// This is idempotent and safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Tracks schema version for future migrations
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Run state: last ingest time, last baseline id, etc.
        CREATE TABLE IF NOT EXISTS run_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Per-document severity scores
        CREATE TABLE IF NOT EXISTS document_scores (
            url TEXT NOT NULL,
            category TEXT NOT NULL,
            severity_score REAL NOT NULL,
            final_score REAL NOT NULL,          -- severity_score * class_multiplier
            capture_count INTEGER NOT NULL DEFAULT 0,
            drift_count INTEGER NOT NULL DEFAULT 0,
            warning_count INTEGER NOT NULL DEFAULT 0,
            suppressed_count INTEGER NOT NULL DEFAULT 0,
            document_class TEXT NOT NULL,
            class_multiplier REAL NOT NULL,
            is_high_authority INTEGER NOT NULL DEFAULT 0,
            matches TEXT NOT NULL,              -- JSON array of KeywordMatch
            suppressed TEXT NOT NULL,           -- JSON array of SuppressedMatch
            week_of TEXT NOT NULL,              -- Monday of publication week (YYYY-MM-DD)
            title TEXT NOT NULL,
            published_at TEXT NOT NULL,
            scored_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (url, category)
        );

        -- One rollup row per category-week
        CREATE TABLE IF NOT EXISTS weekly_aggregates (
            category TEXT NOT NULL,
            week_of TEXT NOT NULL,
            total_severity REAL NOT NULL,
            document_count INTEGER NOT NULL,
            avg_severity_per_doc REAL NOT NULL,
            capture_proportion REAL NOT NULL,
            drift_proportion REAL NOT NULL,
            warning_proportion REAL NOT NULL,
            severity_mix REAL NOT NULL,
            top_keywords TEXT NOT NULL,         -- JSON array of strings
            computed_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (category, week_of)
        );

        -- Reference statistics per named baseline period
        CREATE TABLE IF NOT EXISTS category_baselines (
            baseline_id TEXT NOT NULL,
            category TEXT NOT NULL,
            avg_weekly_severity REAL NOT NULL,
            stddev_weekly_severity REAL NOT NULL,
            avg_weekly_doc_count REAL NOT NULL,
            avg_severity_mix REAL NOT NULL,
            week_count INTEGER NOT NULL DEFAULT 0,
            drift_noise_floor REAL,             -- null with fewer than 2 embedded weeks
            embedding_centroid TEXT,            -- JSON array of floats, nullable
            computed_at TEXT NOT NULL,
            PRIMARY KEY (baseline_id, category)
        );

        -- Index for scanning a category's document scores by week
        CREATE INDEX IF NOT EXISTS idx_scores_category_week
            ON document_scores(category, week_of);
        ",
    )
    .context("Failed to create database tables")?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    for &(version, sql) in MIGRATIONS {
        apply_migration(conn, version, sql)?;
    }

    Ok(())
}

/// Schema changes after the base tables, as (version, SQL batch).
const MIGRATIONS: &[(i64, &str)] = &[
    // Per-document embeddings for semantic drift, vectors as JSON arrays.
    // Stays empty when no embedding provider is configured.
    (
        2,
        "
        CREATE TABLE IF NOT EXISTS document_embeddings (
            url TEXT NOT NULL,
            category TEXT NOT NULL,
            week_of TEXT NOT NULL,
            vector TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (url, category)
        );
        CREATE INDEX IF NOT EXISTS idx_embeddings_category_week
            ON document_embeddings(category, week_of);
        ",
    ),
];

fn apply_migration(conn: &Connection, version: i64, sql: &str) -> Result<()> {
    let applied: i64 = conn.query_row(
        "SELECT COUNT(*) FROM schema_version WHERE version = ?1",
        [version],
        |row| row.get(0),
    )?;
    if applied > 0 {
        return Ok(());
    }

    conn.execute_batch(sql)
        .with_context(|| format!("Schema migration to v{version} failed"))?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// User tables in the file, reported by `driftwatch init`.
pub fn table_count(conn: &Connection) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )
    .context("Failed to count tables")
}
