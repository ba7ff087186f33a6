// Baseline pipeline: recompute per-category reference statistics for a period.
//
// Baselines are long-lived reference data; this is the only place that
// writes them. Categories are independent, so they run concurrently.

use std::sync::Arc;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::aggregate::baseline::{compute_baseline, BaselinePeriod};
use crate::db::models::CategoryBaseline;
use crate::db::Database;
use crate::output::progress_bar;
use crate::rules::Category;

/// Run state key holding the most recently computed baseline id.
pub const LAST_BASELINE_KEY: &str = "last_baseline_id";

#[derive(Debug, Default)]
pub struct BaselineRunSummary {
    /// Stored baselines, ordered by category.
    pub baselines: Vec<CategoryBaseline>,
    /// Categories with no history in the period.
    pub skipped: Vec<Category>,
    /// Categories whose history could not be read; not recomputed.
    pub failed: Vec<Category>,
    pub storage_failures: usize,
}

enum CategoryOutcome {
    Computed(CategoryBaseline, usize),
    Skipped(Category),
    /// History could not be read; any stored baseline is left untouched.
    Failed(Category),
}

async fn baseline_for(
    db: &Arc<dyn Database>,
    period: &BaselinePeriod,
    category: Category,
) -> CategoryOutcome {
    let aggregates = match db
        .get_weekly_aggregates(category, period.start, period.end)
        .await
    {
        Ok(a) => a,
        Err(e) => {
            warn!(category = %category, error = %e, "Failed to load weekly aggregates, keeping stored baseline");
            return CategoryOutcome::Failed(category);
        }
    };

    let embeddings = match db
        .get_embeddings_in_range(category, period.start, period.end)
        .await
    {
        Ok(e) => e,
        Err(e) => {
            warn!(category = %category, error = %e, "Failed to load embeddings, keeping stored baseline");
            return CategoryOutcome::Failed(category);
        }
    };

    if aggregates.is_empty() && embeddings.is_empty() {
        return CategoryOutcome::Skipped(category);
    }

    let baseline = compute_baseline(period, category, &aggregates, &embeddings);
    if baseline.drift_noise_floor.is_none() && baseline.embedding_centroid.is_some() {
        info!(category = %category, "Fewer than two embedded weeks; noise floor unavailable");
    }

    let mut failures = 0;
    if let Err(e) = db.upsert_baseline(&baseline).await {
        warn!(category = %category, error = %e, "Failed to store baseline");
        failures += 1;
    }

    CategoryOutcome::Computed(baseline, failures)
}

/// Compute and store baselines for `categories` over `period`.
///
/// Baselines are built from stored history, so without storage there is
/// nothing to compute and the summary is empty.
pub async fn run(
    db: Option<&Arc<dyn Database>>,
    period: &BaselinePeriod,
    categories: &[Category],
    concurrency: usize,
) -> Result<BaselineRunSummary> {
    let Some(db) = db else {
        warn!(baseline_id = period.id, "No storage configured; skipping baselines");
        return Ok(BaselineRunSummary::default());
    };

    info!(
        baseline_id = period.id,
        start = %period.start,
        end = %period.end,
        categories = categories.len(),
        "Computing baselines"
    );

    let pb = progress_bar(categories.len() as u64, "Baselines");
    let outcomes: Vec<CategoryOutcome> = stream::iter(
        categories
            .iter()
            .map(|&category| baseline_for(db, period, category)),
    )
    .buffer_unordered(concurrency.max(1))
    .inspect(|_| pb.inc(1))
    .collect()
    .await;
    pb.finish_and_clear();

    let mut summary = BaselineRunSummary::default();
    for outcome in outcomes {
        match outcome {
            CategoryOutcome::Computed(b, failures) => {
                summary.storage_failures += failures;
                summary.baselines.push(b);
            }
            CategoryOutcome::Skipped(c) => summary.skipped.push(c),
            CategoryOutcome::Failed(c) => {
                summary.storage_failures += 1;
                summary.failed.push(c);
            }
        }
    }
    summary.baselines.sort_by_key(|b| b.category);
    summary.skipped.sort();
    summary.failed.sort();

    if !summary.baselines.is_empty() {
        db.set_run_state(LAST_BASELINE_KEY, &period.id).await?;
    }

    Ok(summary)
}
