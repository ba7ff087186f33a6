// Baseline computation: what "normal" looked like over a fixed period.
//
// Two embedding summaries come out of the same vectors and must not be
// conflated:
//   - `embedding_centroid`: mean of every individual document vector
//   - `drift_noise_floor`: built from per-week centroids, as
//     mean + stddev of cosine distances between consecutive weeks

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::stats::{mean, sample_stddev};
use crate::db::models::{CategoryBaseline, DocumentEmbedding, WeeklyAggregate};
use crate::rules::Category;
use crate::semantic::vectors::{cosine_distance, mean_embedding};

/// A named historical date range (inclusive on both ends).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselinePeriod {
    pub id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl BaselinePeriod {
    pub fn new(id: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            id: id.into(),
            start,
            end,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Centroid of every document embedding, regardless of week.
pub fn document_centroid(embeddings: &[DocumentEmbedding]) -> Option<Vec<f64>> {
    let vectors: Vec<Vec<f64>> = embeddings.iter().map(|e| e.vector.clone()).collect();
    mean_embedding(&vectors)
}

/// Per-week centroids, sorted by week. Weeks with no embeddings are absent.
pub fn weekly_centroids(embeddings: &[DocumentEmbedding]) -> Vec<(NaiveDate, Vec<f64>)> {
    let mut by_week: BTreeMap<NaiveDate, Vec<Vec<f64>>> = BTreeMap::new();
    for e in embeddings {
        by_week.entry(e.week_of).or_default().push(e.vector.clone());
    }
    by_week
        .into_iter()
        .filter_map(|(week, vectors)| mean_embedding(&vectors).map(|c| (week, c)))
        .collect()
}

/// Expected week-to-week semantic movement: mean + sample stddev of the
/// cosine distances between consecutive weekly centroids.
///
/// Needs at least two weeks with embeddings.
pub fn drift_noise_floor(embeddings: &[DocumentEmbedding]) -> Option<f64> {
    let centroids = weekly_centroids(embeddings);
    if centroids.len() < 2 {
        return None;
    }
    let distances: Vec<f64> = centroids
        .windows(2)
        .map(|pair| cosine_distance(&pair[0].1, &pair[1].1))
        .collect();
    Some(mean(&distances) + sample_stddev(&distances))
}

/// Compute one category's baseline from its weekly aggregates and document
/// embeddings. Inputs outside the period or for other categories are ignored.
pub fn compute_baseline(
    period: &BaselinePeriod,
    category: Category,
    aggregates: &[WeeklyAggregate],
    embeddings: &[DocumentEmbedding],
) -> CategoryBaseline {
    let weeks: Vec<&WeeklyAggregate> = aggregates
        .iter()
        .filter(|a| a.category == category && period.contains(a.week_of))
        .collect();

    let severities: Vec<f64> = weeks.iter().map(|a| a.total_severity).collect();
    let doc_counts: Vec<f64> = weeks.iter().map(|a| a.document_count as f64).collect();
    let mixes: Vec<f64> = weeks.iter().map(|a| a.severity_mix).collect();

    let in_range: Vec<DocumentEmbedding> = embeddings
        .iter()
        .filter(|e| e.category == category && period.contains(e.week_of))
        .cloned()
        .collect();

    CategoryBaseline {
        baseline_id: period.id.clone(),
        category,
        avg_weekly_severity: mean(&severities),
        stddev_weekly_severity: sample_stddev(&severities),
        avg_weekly_doc_count: mean(&doc_counts),
        avg_severity_mix: mean(&mixes),
        week_count: weeks.len() as u32,
        drift_noise_floor: drift_noise_floor(&in_range),
        embedding_centroid: document_centroid(&in_range),
        computed_at: Utc::now(),
    }
}
