// Semantic drift: how far a week's content has moved from the baseline.
//
//   raw        = 1 - cos(current_week_centroid, baseline_centroid)
//   normalized = raw / baseline_noise_floor
//
// Normalized bands: < 1 within normal range, [1, 2) elevated, >= 2 anomalous.
// Without a usable noise floor only the raw value is reported.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::vectors::{cosine_distance, mean_embedding};
use crate::db::models::CategoryBaseline;
use crate::db::Database;
use crate::rules::Category;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticDriftResult {
    pub raw_cosine_drift: f64,
    pub normalized_drift: Option<f64>,
    pub interpretation: String,
    pub baseline_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftBand {
    WithinNormalRange,
    Elevated,
    Anomalous,
}

impl DriftBand {
    pub fn from_normalized(normalized: f64) -> Self {
        match normalized {
            n if n >= 2.0 => DriftBand::Anomalous,
            n if n >= 1.0 => DriftBand::Elevated,
            _ => DriftBand::WithinNormalRange,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DriftBand::WithinNormalRange => "within normal range",
            DriftBand::Elevated => "elevated",
            DriftBand::Anomalous => "anomalous",
        }
    }
}

/// Human-readable interpretation of a drift measurement.
pub fn interpret(raw: f64, normalized: Option<f64>) -> String {
    match normalized {
        Some(n) => format!(
            "{} ({:.2}x baseline noise floor)",
            DriftBand::from_normalized(n).as_str(),
            n
        ),
        None => format!(
            "noise floor not available; raw cosine drift {:.4} reported without normalization",
            raw
        ),
    }
}

/// Compare a current centroid against a baseline.
///
/// `None` when the baseline has no embedding centroid.
pub fn drift_from_centroid(current: &[f64], baseline: &CategoryBaseline) -> Option<SemanticDriftResult> {
    let reference = baseline.embedding_centroid.as_deref()?;
    if current.len() != reference.len() {
        // Different embedding model; the vectors are not comparable
        debug!(
            current = current.len(),
            baseline = reference.len(),
            baseline_id = baseline.baseline_id,
            "Centroid dimensions differ, skipping drift"
        );
        return None;
    }
    let raw = cosine_distance(current, reference);
    let normalized = baseline
        .drift_noise_floor
        .filter(|floor| *floor > 0.0)
        .map(|floor| raw / floor);

    Some(SemanticDriftResult {
        raw_cosine_drift: raw,
        normalized_drift: normalized,
        interpretation: interpret(raw, normalized),
        baseline_id: baseline.baseline_id.clone(),
    })
}

/// Centroid of every stored document embedding for one category-week.
///
/// `None` when there are none or storage is unavailable.
pub async fn compute_week_centroid(
    db: &Arc<dyn Database>,
    category: Category,
    week_of: NaiveDate,
) -> Option<Vec<f64>> {
    let embeddings = match db.get_week_embeddings(category, week_of).await {
        Ok(e) => e,
        Err(e) => {
            warn!(category = %category, week = %week_of, error = %e, "Failed to load week embeddings");
            return None;
        }
    };
    let vectors: Vec<Vec<f64>> = embeddings.into_iter().map(|e| e.vector).collect();
    mean_embedding(&vectors)
}

/// Storage-backed drift for one category-week against a stored baseline.
///
/// `None` when the week has no embeddings, the baseline is missing or has
/// no centroid, or storage fails.
pub async fn compute_semantic_drift(
    db: &Arc<dyn Database>,
    category: Category,
    week_of: NaiveDate,
    baseline_id: &str,
) -> Option<SemanticDriftResult> {
    let current = compute_week_centroid(db, category, week_of).await?;

    let baseline = match db.get_baseline(baseline_id, category).await {
        Ok(Some(b)) => b,
        Ok(None) => {
            debug!(category = %category, baseline_id, "No stored baseline");
            return None;
        }
        Err(e) => {
            warn!(category = %category, baseline_id, error = %e, "Failed to load baseline");
            return None;
        }
    };

    drift_from_centroid(&current, &baseline)
}
