// Weekly pipeline: score a batch of items and roll them into weekly aggregates.
//
// Each category's items are scored, then grouped into (category, week) units.
// Units share no mutable state, so they run concurrently; every write is an
// idempotent upsert keyed by the unit, which makes re-runs safe.
//
// Storage and embeddings are both optional. Without a database the pipeline
// still returns the aggregates computed in memory. Without an embedding
// provider semantic drift simply has nothing to work with later; the
// keyword path never waits on it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::aggregate::weekly::aggregate_week;
use crate::content::ContentItem;
use crate::db::models::{DocumentEmbedding, DocumentScore, WeeklyAggregate};
use crate::db::Database;
use crate::output::progress_bar;
use crate::rules::{Category, RuleBook};
use crate::scoring::severity::score_items;
use crate::semantic::traits::EmbeddingProvider;

/// Run state key written after a run that had storage.
pub const LAST_RUN_KEY: &str = "last_weekly_run_at";

/// Items fetched for one category.
#[derive(Debug, Clone)]
pub struct CategoryBatch {
    pub category: Category,
    pub items: Vec<ContentItem>,
}

/// What a run produced.
#[derive(Debug, Default)]
pub struct WeeklyRunSummary {
    pub documents_scored: usize,
    /// Ordered by (category, week).
    pub aggregates: Vec<WeeklyAggregate>,
    pub embeddings_saved: usize,
    /// Storage reads or writes that failed and were skipped.
    pub storage_failures: usize,
}

/// One (category, week) unit of work.
struct WeekUnit {
    category: Category,
    week_of: NaiveDate,
    scores: Vec<DocumentScore>,
    /// Scoring text for each score, same order.
    texts: Vec<String>,
}

struct UnitOutcome {
    aggregate: WeeklyAggregate,
    embeddings_saved: usize,
    storage_failures: usize,
}

/// Score every batch and group the results into week units.
fn build_units(book: &RuleBook, batches: &[CategoryBatch]) -> Vec<WeekUnit> {
    let mut units: BTreeMap<(Category, NaiveDate), WeekUnit> = BTreeMap::new();

    for batch in batches {
        // First valid item per url wins, matching score_items
        let mut texts: HashMap<&str, String> = HashMap::new();
        for item in batch.items.iter().filter(|i| i.is_valid()) {
            texts
                .entry(item.url.as_str())
                .or_insert_with(|| item.scoring_text());
        }

        for score in score_items(batch.category, &batch.items, book) {
            let text = texts.get(score.url.as_str()).cloned().unwrap_or_default();
            let unit = units
                .entry((score.category, score.week_of))
                .or_insert_with(|| WeekUnit {
                    category: score.category,
                    week_of: score.week_of,
                    scores: Vec::new(),
                    texts: Vec::new(),
                });
            // Two batches for the same category may repeat a url
            if unit.scores.iter().any(|s| s.url == score.url) {
                continue;
            }
            unit.scores.push(score);
            unit.texts.push(text);
        }
    }

    units.into_values().collect()
}

/// Embed a unit's texts and store one embedding per document.
///
/// Returns (saved, failed writes). An embedding error skips the unit.
async fn embed_unit(
    db: &Arc<dyn Database>,
    embedder: &dyn EmbeddingProvider,
    category: Category,
    week_of: NaiveDate,
    urls: Vec<String>,
    texts: &[String],
) -> (usize, usize) {
    let vectors = match embedder.embed_batch(texts).await {
        Ok(v) => v,
        Err(e) => {
            warn!(category = %category, week = %week_of, error = %e, "Embedding failed, continuing keyword-only");
            return (0, 0);
        }
    };

    let mut saved = 0;
    let mut failed = 0;
    for (url, vector) in urls.into_iter().zip(vectors) {
        let embedding = DocumentEmbedding {
            url,
            category,
            week_of,
            vector,
        };
        match db.save_document_embedding(&embedding).await {
            Ok(()) => saved += 1,
            Err(e) => {
                warn!(url = embedding.url, error = %e, "Failed to store embedding");
                failed += 1;
            }
        }
    }
    (saved, failed)
}

/// Persist a unit's scores, aggregate it, and store embeddings.
async fn process_unit(
    unit: WeekUnit,
    db: Option<&Arc<dyn Database>>,
    book: &RuleBook,
    embedder: Option<&dyn EmbeddingProvider>,
    top_n: usize,
) -> UnitOutcome {
    let WeekUnit {
        category,
        week_of,
        scores,
        texts,
    } = unit;
    let weights = &book.tier_weights;

    let Some(db) = db else {
        return UnitOutcome {
            aggregate: aggregate_week(category, week_of, &scores, weights, None, top_n),
            embeddings_saved: 0,
            storage_failures: 0,
        };
    };

    let mut storage_failures = 0;
    for score in &scores {
        if let Err(e) = db.upsert_document_score(score).await {
            warn!(url = score.url, error = %e, "Failed to store document score, skipping");
            storage_failures += 1;
        }
    }
    let urls: Vec<String> = scores.iter().map(|s| s.url.clone()).collect();

    // Aggregate over everything stored for the week so a partial re-run
    // doesn't shrink an earlier aggregate.
    let week_scores = match db.get_document_scores(category, week_of).await {
        Ok(stored) if !stored.is_empty() => stored,
        Ok(_) => scores,
        Err(e) => {
            warn!(category = %category, week = %week_of, error = %e, "Failed to reload week scores");
            storage_failures += 1;
            scores
        }
    };

    let top_keywords = match db.get_top_keywords(category, week_of, top_n).await {
        Ok(keywords) => keywords,
        Err(e) => {
            warn!(category = %category, week = %week_of, error = %e, "Top keyword extraction failed");
            Vec::new()
        }
    };

    let aggregate = aggregate_week(
        category,
        week_of,
        &week_scores,
        weights,
        Some(top_keywords),
        top_n,
    );

    if let Err(e) = db.upsert_weekly_aggregate(&aggregate).await {
        warn!(category = %category, week = %week_of, error = %e, "Failed to store weekly aggregate");
        storage_failures += 1;
    }

    let mut embeddings_saved = 0;
    if let Some(embedder) = embedder {
        debug!(category = %category, week = %week_of, docs = urls.len(), "Embedding week");
        let (saved, failed) = embed_unit(db, embedder, category, week_of, urls, &texts).await;
        embeddings_saved = saved;
        storage_failures += failed;
    }

    UnitOutcome {
        aggregate,
        embeddings_saved,
        storage_failures,
    }
}

/// Run the weekly pipeline over a set of category batches.
///
/// Never fails on storage or embedding errors; those are logged, counted in
/// the summary, and the affected piece is skipped.
pub async fn run(
    db: Option<&Arc<dyn Database>>,
    book: &RuleBook,
    embedder: Option<&dyn EmbeddingProvider>,
    batches: &[CategoryBatch],
    concurrency: usize,
    top_n: usize,
) -> Result<WeeklyRunSummary> {
    let units = build_units(book, batches);
    let documents_scored: usize = units.iter().map(|u| u.scores.len()).sum();

    if units.is_empty() {
        info!("No scorable documents in batch");
        return Ok(WeeklyRunSummary::default());
    }

    info!(
        documents = documents_scored,
        units = units.len(),
        concurrency,
        storage = db.is_some(),
        embeddings = embedder.is_some(),
        "Running weekly pipeline"
    );

    let pb = progress_bar(units.len() as u64, "Weeks");

    let outcomes: Vec<UnitOutcome> = stream::iter(
        units
            .into_iter()
            .map(|unit| process_unit(unit, db, book, embedder, top_n)),
    )
    .buffer_unordered(concurrency.max(1))
    .inspect(|_| pb.inc(1))
    .collect()
    .await;
    pb.finish_and_clear();

    let mut summary = WeeklyRunSummary {
        documents_scored,
        ..Default::default()
    };
    for outcome in outcomes {
        summary.embeddings_saved += outcome.embeddings_saved;
        summary.storage_failures += outcome.storage_failures;
        summary.aggregates.push(outcome.aggregate);
    }
    summary
        .aggregates
        .sort_by(|a, b| (a.category, a.week_of).cmp(&(b.category, b.week_of)));

    if let Some(db) = db {
        if let Err(e) = db.set_run_state(LAST_RUN_KEY, &Utc::now().to_rfc3339()).await {
            warn!(error = %e, "Failed to record run time");
        }
    }

    info!(
        aggregates = summary.aggregates.len(),
        embeddings = summary.embeddings_saved,
        failures = summary.storage_failures,
        "Weekly pipeline complete"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(url: &str, title: &str, day: u32) -> ContentItem {
        ContentItem {
            title: title.to_string(),
            url: url.to_string(),
            summary: String::new(),
            published_at: Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap(),
            agency: None,
            doc_type: None,
            is_error: false,
            is_warning: false,
        }
    }

    #[test]
    fn test_build_units_groups_by_week_and_dedupes() {
        let book = RuleBook::default();
        let batches = vec![
            CategoryBatch {
                category: Category::Fiscal,
                items: vec![
                    item("https://a", "Impoundment of funds", 3),
                    item("https://b", "Impoundment again", 10),
                ],
            },
            CategoryBatch {
                category: Category::Fiscal,
                items: vec![item("https://a", "Impoundment of funds", 3)],
            },
        ];
        let units = build_units(&book, &batches);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].scores.len(), 1);
        assert_eq!(units[0].texts.len(), 1);
        assert!(units[0].week_of < units[1].week_of);
    }

    #[test]
    fn test_build_units_keeps_first_text_for_repeated_url() {
        let book = RuleBook::default();
        let mut placeholder = item("https://a", "Fetch failed for impoundment feed", 3);
        placeholder.is_error = true;
        let batches = vec![CategoryBatch {
            category: Category::Fiscal,
            items: vec![
                placeholder,
                item("https://a", "Impoundment of funds", 3),
                item("https://a", "Impoundment of funds, updated", 3),
            ],
        }];
        let units = build_units(&book, &batches);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].texts, vec!["Impoundment of funds".to_string()]);
    }

    #[tokio::test]
    async fn test_run_without_storage_returns_aggregates() {
        let book = RuleBook::default();
        let batches = vec![CategoryBatch {
            category: Category::Fiscal,
            items: vec![item("https://a", "Impoundment of funds", 4)],
        }];
        let summary = run(None, &book, None, &batches, 2, 10).await.unwrap();
        assert_eq!(summary.documents_scored, 1);
        assert_eq!(summary.aggregates.len(), 1);
        assert_eq!(summary.aggregates[0].capture_proportion, 1.0);
        assert_eq!(summary.aggregates[0].top_keywords, vec!["impoundment"]);
        assert_eq!(summary.storage_failures, 0);
    }

    #[tokio::test]
    async fn test_run_with_empty_batches() {
        let book = RuleBook::default();
        let summary = run(None, &book, None, &[], 4, 10).await.unwrap();
        assert!(summary.aggregates.is_empty());
    }
}
