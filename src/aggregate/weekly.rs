// Weekly aggregation: rolls document scores into one row per category-week.
//
// Tier proportions are taken from the raw match counts summed across every
// document in the week, not from per-document averages. A week with many
// lightly-matched documents therefore weighs differently from a week with
// one heavily-matched document; this is intentional and kept as is.
//
//   severity_mix = Σ_tier proportion(tier) × weight(tier)

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::db::models::{DocumentScore, WeeklyAggregate};
use crate::rules::{Category, Tier, TierWeights};
use crate::scoring::severity::TierCounts;

/// Default number of keywords reported per week.
pub const DEFAULT_TOP_KEYWORDS: usize = 10;

/// Tier proportions and the weighted mix derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TierMix {
    pub capture: f64,
    pub drift: f64,
    pub warning: f64,
    pub severity_mix: f64,
}

/// Proportions of raw match counts. All zero when there are no matches.
pub fn tier_mix(counts: &TierCounts, weights: &TierWeights) -> TierMix {
    let total = counts.total();
    if total == 0 {
        return TierMix::default();
    }
    let share = |tier: Tier| counts.get(tier) as f64 / total as f64;
    let capture = share(Tier::Capture);
    let drift = share(Tier::Drift);
    let warning = share(Tier::Warning);
    TierMix {
        capture,
        drift,
        warning,
        severity_mix: capture * weights.capture + drift * weights.drift + warning * weights.warning,
    }
}

/// The `limit` most frequent matched keywords, ties broken alphabetically.
pub fn top_keywords(scores: &[&DocumentScore], limit: usize) -> Vec<String> {
    let mut freq: HashMap<&str, usize> = HashMap::new();
    for score in scores {
        for m in &score.matches {
            *freq.entry(m.keyword.as_str()).or_default() += 1;
        }
    }
    let mut ranked: Vec<(&str, usize)> = freq.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(kw, _)| kw.to_string())
        .collect()
}

/// Aggregate the scores belonging to one (category, week).
///
/// Scores for other categories or weeks are ignored, so a whole batch can be
/// passed in. `top_keywords` comes from the caller when it was extracted
/// elsewhere (e.g. a storage query); `None` counts them from these scores.
pub fn aggregate_week(
    category: Category,
    week_of: NaiveDate,
    scores: &[DocumentScore],
    weights: &TierWeights,
    top_keywords_override: Option<Vec<String>>,
    top_n: usize,
) -> WeeklyAggregate {
    let in_week: Vec<&DocumentScore> = scores
        .iter()
        .filter(|s| s.category == category && s.week_of == week_of)
        .collect();

    let total_severity: f64 = in_week.iter().map(|s| s.final_score).sum();
    let document_count = in_week.len() as u32;
    let avg_severity_per_doc = if document_count == 0 {
        0.0
    } else {
        total_severity / document_count as f64
    };

    let mut counts = TierCounts::default();
    for s in &in_week {
        counts.merge(&s.tier_counts);
    }
    let mix = tier_mix(&counts, weights);

    let top_keywords = top_keywords_override.unwrap_or_else(|| top_keywords(&in_week, top_n));

    WeeklyAggregate {
        category,
        week_of,
        total_severity,
        document_count,
        avg_severity_per_doc,
        capture_proportion: mix.capture,
        drift_proportion: mix.drift,
        warning_proportion: mix.warning,
        severity_mix: mix.severity_mix,
        top_keywords,
    }
}
