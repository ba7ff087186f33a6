// Database queries: CRUD operations for all tables.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::models::{CategoryBaseline, DocumentEmbedding, DocumentScore, WeeklyAggregate};
use crate::keywords::{KeywordMatch, SuppressedMatch};
use crate::rules::Category;
use crate::scoring::classifier::DocumentClass;
use crate::scoring::severity::TierCounts;

/// Read a category column, surfacing unknown names as a conversion failure.
fn category_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Category> {
    let raw: String = row.get(idx)?;
    raw.parse::<Category>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

// --- Run state ---

/// Get a run state value by key (e.g., "last_ingest_at").
pub fn get_run_state(conn: &Connection, key: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT value FROM run_state WHERE key = ?1")?;
    let result = stmt.query_row(params![key], |row| row.get(0)).optional()?;
    Ok(result)
}

/// Set a run state value (upsert).
pub fn set_run_state(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO run_state (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
        params![key, value],
    )?;
    Ok(())
}

/// Get all run state key-value pairs.
pub fn get_all_run_state(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare("SELECT key, value FROM run_state ORDER BY key")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

// --- Document scores ---

/// Save or replace a document score.
pub fn upsert_document_score(conn: &Connection, score: &DocumentScore) -> Result<()> {
    let matches_json = serde_json::to_string(&score.matches)?;
    let suppressed_json = serde_json::to_string(&score.suppressed)?;
    conn.execute(
        "INSERT INTO document_scores (url, category, severity_score, final_score,
            capture_count, drift_count, warning_count, suppressed_count,
            document_class, class_multiplier, is_high_authority, matches, suppressed,
            week_of, title, published_at, scored_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, datetime('now'))
         ON CONFLICT(url, category) DO UPDATE SET
            severity_score = ?3,
            final_score = ?4,
            capture_count = ?5,
            drift_count = ?6,
            warning_count = ?7,
            suppressed_count = ?8,
            document_class = ?9,
            class_multiplier = ?10,
            is_high_authority = ?11,
            matches = ?12,
            suppressed = ?13,
            week_of = ?14,
            title = ?15,
            published_at = ?16,
            scored_at = datetime('now')",
        params![
            score.url,
            score.category.as_str(),
            score.severity_score,
            score.final_score,
            score.tier_counts.capture,
            score.tier_counts.drift,
            score.tier_counts.warning,
            score.suppressed_count,
            score.document_class.as_str(),
            score.class_multiplier,
            score.is_high_authority,
            matches_json,
            suppressed_json,
            score.week_of,
            score.title,
            score.published_at,
        ],
    )?;
    Ok(())
}

/// Document scores for one category-week, highest final score first.
pub fn get_document_scores(
    conn: &Connection,
    category: Category,
    week_of: NaiveDate,
) -> Result<Vec<DocumentScore>> {
    let mut stmt = conn.prepare(
        "SELECT url, category, severity_score, final_score, capture_count, drift_count,
                warning_count, suppressed_count, document_class, class_multiplier,
                is_high_authority, matches, suppressed, week_of, title, published_at
         FROM document_scores
         WHERE category = ?1 AND week_of = ?2
         ORDER BY final_score DESC, url ASC",
    )?;

    let rows = stmt.query_map(params![category.as_str(), week_of], |row| {
        let matches_json: String = row.get(11)?;
        let suppressed_json: String = row.get(12)?;
        let matches: Vec<KeywordMatch> = serde_json::from_str(&matches_json).unwrap_or_default();
        let suppressed: Vec<SuppressedMatch> =
            serde_json::from_str(&suppressed_json).unwrap_or_default();
        let class: String = row.get(8)?;
        Ok(DocumentScore {
            url: row.get(0)?,
            category: category_at(row, 1)?,
            severity_score: row.get(2)?,
            final_score: row.get(3)?,
            tier_counts: TierCounts {
                capture: row.get(4)?,
                drift: row.get(5)?,
                warning: row.get(6)?,
            },
            suppressed_count: row.get(7)?,
            document_class: DocumentClass::parse(&class).unwrap_or(DocumentClass::Unknown),
            class_multiplier: row.get(9)?,
            is_high_authority: row.get::<_, i32>(10)? != 0,
            matches,
            suppressed,
            week_of: row.get(13)?,
            title: row.get(14)?,
            published_at: row.get(15)?,
        })
    })?;

    let mut scores = Vec::new();
    for row in rows {
        scores.push(row?);
    }
    Ok(scores)
}

/// Most frequent matched keywords across one category-week's documents.
///
/// Each document contributes a keyword at most once. Ties break alphabetically.
pub fn get_top_keywords(
    conn: &Connection,
    category: Category,
    week_of: NaiveDate,
    limit: usize,
) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT json_extract(m.value, '$.keyword') AS keyword,
                COUNT(DISTINCT d.url) AS doc_count
         FROM document_scores d, json_each(d.matches) m
         WHERE d.category = ?1 AND d.week_of = ?2
         GROUP BY keyword
         HAVING keyword IS NOT NULL
         ORDER BY doc_count DESC, keyword ASC
         LIMIT ?3",
    )?;

    let rows = stmt.query_map(
        params![category.as_str(), week_of, limit as i64],
        |row| row.get::<_, String>(0),
    )?;

    let mut keywords = Vec::new();
    for row in rows {
        keywords.push(row?);
    }
    Ok(keywords)
}

/// Total number of stored document scores.
pub fn get_document_score_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM document_scores", [], |row| row.get(0))?;
    Ok(count)
}

// --- Weekly aggregates ---

/// Save or replace a weekly aggregate.
pub fn upsert_weekly_aggregate(conn: &Connection, agg: &WeeklyAggregate) -> Result<()> {
    let keywords_json = serde_json::to_string(&agg.top_keywords)?;
    conn.execute(
        "INSERT INTO weekly_aggregates (category, week_of, total_severity, document_count,
            avg_severity_per_doc, capture_proportion, drift_proportion, warning_proportion,
            severity_mix, top_keywords, computed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, datetime('now'))
         ON CONFLICT(category, week_of) DO UPDATE SET
            total_severity = ?3,
            document_count = ?4,
            avg_severity_per_doc = ?5,
            capture_proportion = ?6,
            drift_proportion = ?7,
            warning_proportion = ?8,
            severity_mix = ?9,
            top_keywords = ?10,
            computed_at = datetime('now')",
        params![
            agg.category.as_str(),
            agg.week_of,
            agg.total_severity,
            agg.document_count,
            agg.avg_severity_per_doc,
            agg.capture_proportion,
            agg.drift_proportion,
            agg.warning_proportion,
            agg.severity_mix,
            keywords_json,
        ],
    )?;
    Ok(())
}

const AGGREGATE_COLUMNS: &str = "category, week_of, total_severity, document_count,
    avg_severity_per_doc, capture_proportion, drift_proportion, warning_proportion,
    severity_mix, top_keywords";

fn row_to_aggregate(row: &Row<'_>) -> rusqlite::Result<WeeklyAggregate> {
    let keywords_json: String = row.get(9)?;
    Ok(WeeklyAggregate {
        category: category_at(row, 0)?,
        week_of: row.get(1)?,
        total_severity: row.get(2)?,
        document_count: row.get(3)?,
        avg_severity_per_doc: row.get(4)?,
        capture_proportion: row.get(5)?,
        drift_proportion: row.get(6)?,
        warning_proportion: row.get(7)?,
        severity_mix: row.get(8)?,
        top_keywords: serde_json::from_str(&keywords_json).unwrap_or_default(),
    })
}

pub fn get_weekly_aggregate(
    conn: &Connection,
    category: Category,
    week_of: NaiveDate,
) -> Result<Option<WeeklyAggregate>> {
    let sql = format!(
        "SELECT {AGGREGATE_COLUMNS} FROM weekly_aggregates WHERE category = ?1 AND week_of = ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let result = stmt
        .query_row(params![category.as_str(), week_of], row_to_aggregate)
        .optional()?;
    Ok(result)
}

/// Aggregates with week_of in [start, end], oldest first.
pub fn get_weekly_aggregates(
    conn: &Connection,
    category: Category,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<WeeklyAggregate>> {
    let sql = format!(
        "SELECT {AGGREGATE_COLUMNS} FROM weekly_aggregates
         WHERE category = ?1 AND week_of >= ?2 AND week_of <= ?3
         ORDER BY week_of ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![category.as_str(), start, end], row_to_aggregate)?;

    let mut aggregates = Vec::new();
    for row in rows {
        aggregates.push(row?);
    }
    Ok(aggregates)
}

// --- Document embeddings ---

/// Save or replace a document embedding. The vector is stored as a JSON array.
pub fn save_document_embedding(conn: &Connection, emb: &DocumentEmbedding) -> Result<()> {
    let vector_json = serde_json::to_string(&emb.vector)?;
    conn.execute(
        "INSERT INTO document_embeddings (url, category, week_of, vector, created_at)
         VALUES (?1, ?2, ?3, ?4, datetime('now'))
         ON CONFLICT(url, category) DO UPDATE SET
            week_of = ?3,
            vector = ?4,
            created_at = datetime('now')",
        params![emb.url, emb.category.as_str(), emb.week_of, vector_json],
    )?;
    Ok(())
}

fn row_to_embedding(row: &Row<'_>) -> rusqlite::Result<DocumentEmbedding> {
    let vector_json: String = row.get(3)?;
    let vector: Vec<f64> = serde_json::from_str(&vector_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
    Ok(DocumentEmbedding {
        url: row.get(0)?,
        category: category_at(row, 1)?,
        week_of: row.get(2)?,
        vector,
    })
}

pub fn get_week_embeddings(
    conn: &Connection,
    category: Category,
    week_of: NaiveDate,
) -> Result<Vec<DocumentEmbedding>> {
    get_embeddings_in_range(conn, category, week_of, week_of)
}

/// Embeddings with week_of in [start, end], oldest first.
pub fn get_embeddings_in_range(
    conn: &Connection,
    category: Category,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DocumentEmbedding>> {
    let mut stmt = conn.prepare(
        "SELECT url, category, week_of, vector
         FROM document_embeddings
         WHERE category = ?1 AND week_of >= ?2 AND week_of <= ?3
         ORDER BY week_of ASC, url ASC",
    )?;
    let rows = stmt.query_map(params![category.as_str(), start, end], row_to_embedding)?;

    let mut embeddings = Vec::new();
    for row in rows {
        embeddings.push(row?);
    }
    Ok(embeddings)
}

// --- Baselines ---

/// Save or replace a category baseline.
pub fn upsert_baseline(conn: &Connection, b: &CategoryBaseline) -> Result<()> {
    let centroid_json = b
        .embedding_centroid
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    conn.execute(
        "INSERT INTO category_baselines (baseline_id, category, avg_weekly_severity,
            stddev_weekly_severity, avg_weekly_doc_count, avg_severity_mix, week_count,
            drift_noise_floor, embedding_centroid, computed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(baseline_id, category) DO UPDATE SET
            avg_weekly_severity = ?3,
            stddev_weekly_severity = ?4,
            avg_weekly_doc_count = ?5,
            avg_severity_mix = ?6,
            week_count = ?7,
            drift_noise_floor = ?8,
            embedding_centroid = ?9,
            computed_at = ?10",
        params![
            b.baseline_id,
            b.category.as_str(),
            b.avg_weekly_severity,
            b.stddev_weekly_severity,
            b.avg_weekly_doc_count,
            b.avg_severity_mix,
            b.week_count,
            b.drift_noise_floor,
            centroid_json,
            b.computed_at,
        ],
    )?;
    Ok(())
}

const BASELINE_COLUMNS: &str = "baseline_id, category, avg_weekly_severity,
    stddev_weekly_severity, avg_weekly_doc_count, avg_severity_mix, week_count,
    drift_noise_floor, embedding_centroid, computed_at";

fn row_to_baseline(row: &Row<'_>) -> rusqlite::Result<CategoryBaseline> {
    let centroid_json: Option<String> = row.get(8)?;
    let computed_at: DateTime<Utc> = row.get(9)?;
    Ok(CategoryBaseline {
        baseline_id: row.get(0)?,
        category: category_at(row, 1)?,
        avg_weekly_severity: row.get(2)?,
        stddev_weekly_severity: row.get(3)?,
        avg_weekly_doc_count: row.get(4)?,
        avg_severity_mix: row.get(5)?,
        week_count: row.get(6)?,
        drift_noise_floor: row.get(7)?,
        embedding_centroid: centroid_json.and_then(|j| serde_json::from_str(&j).ok()),
        computed_at,
    })
}

pub fn get_baseline(
    conn: &Connection,
    baseline_id: &str,
    category: Category,
) -> Result<Option<CategoryBaseline>> {
    let sql = format!(
        "SELECT {BASELINE_COLUMNS} FROM category_baselines
         WHERE baseline_id = ?1 AND category = ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let result = stmt
        .query_row(params![baseline_id, category.as_str()], row_to_baseline)
        .optional()?;
    Ok(result)
}

pub fn get_baselines(conn: &Connection, baseline_id: &str) -> Result<Vec<CategoryBaseline>> {
    let sql = format!(
        "SELECT {BASELINE_COLUMNS} FROM category_baselines
         WHERE baseline_id = ?1
         ORDER BY category ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![baseline_id], row_to_baseline)?;

    let mut baselines = Vec::new();
    for row in rows {
        baselines.push(row?);
    }
    Ok(baselines)
}
