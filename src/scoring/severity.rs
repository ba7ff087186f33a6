// Per-document severity score.
//
// Each tier contributes with logarithmic diminishing returns:
//
//   severity = Σ_tier weight(tier) × log2(1 + count(tier))
//
// so one capture hit (weight 4) scores 4.0, two score ~6.34 and three 8.0.
// The document class multiplier is applied on top:
//
//   final = severity × class_multiplier

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::content::ContentItem;
use crate::db::models::DocumentScore;
use crate::keywords::KeywordMatcher;
use crate::rules::{Category, RuleBook, Tier, TierWeights};
use crate::scoring::classifier;

/// Active match counts per tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub capture: u32,
    pub drift: u32,
    pub warning: u32,
}

impl TierCounts {
    pub fn get(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Capture => self.capture,
            Tier::Drift => self.drift,
            Tier::Warning => self.warning,
        }
    }

    pub fn add(&mut self, tier: Tier) {
        match tier {
            Tier::Capture => self.capture += 1,
            Tier::Drift => self.drift += 1,
            Tier::Warning => self.warning += 1,
        }
    }

    pub fn merge(&mut self, other: &TierCounts) {
        self.capture += other.capture;
        self.drift += other.drift;
        self.warning += other.warning;
    }

    pub fn total(&self) -> u32 {
        self.capture + self.drift + self.warning
    }
}

/// One tier's contribution: `weight × log2(1 + count)`.
pub fn tier_score(weight: f64, count: u32) -> f64 {
    weight * (1.0 + count as f64).log2()
}

/// Sum of tier contributions for a document.
pub fn severity_score(counts: &TierCounts, weights: &TierWeights) -> f64 {
    Tier::BY_SEVERITY
        .iter()
        .map(|&tier| tier_score(weights.for_tier(tier), counts.get(tier)))
        .sum()
}

/// The Monday (UTC) of the week containing `ts`.
pub fn week_of(ts: DateTime<Utc>) -> NaiveDate {
    let date = ts.date_naive();
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Score one item against a compiled category matcher.
///
/// Returns `None` for fetch error/warning placeholders, which never score.
pub fn score_item(
    item: &ContentItem,
    matcher: &KeywordMatcher,
    book: &RuleBook,
) -> Option<DocumentScore> {
    if !item.is_valid() {
        return None;
    }

    let outcome = matcher.match_text(&item.scoring_text());
    let tier_counts = outcome.tier_counts();
    let severity = severity_score(&tier_counts, matcher.weights());

    let document_class = classifier::classify(item);
    let class_multiplier = document_class.multiplier();

    Some(DocumentScore {
        url: item.url.clone(),
        category: matcher.category(),
        severity_score: severity,
        final_score: severity * class_multiplier,
        tier_counts,
        suppressed_count: outcome.suppressed.len() as u32,
        document_class,
        class_multiplier,
        is_high_authority: book.is_authoritative(item.agency.as_deref()),
        matches: outcome.matches,
        suppressed: outcome.suppressed,
        week_of: week_of(item.published_at),
        title: item.title.clone(),
        published_at: item.published_at,
    })
}

/// Score a batch of items for one category.
///
/// Invalid items are skipped and urls are deduplicated (first one wins).
/// A category with no configured rules scores nothing.
pub fn score_items(category: Category, items: &[ContentItem], book: &RuleBook) -> Vec<DocumentScore> {
    let Some(matcher) = KeywordMatcher::for_category(category, book) else {
        warn!(category = %category, "No keyword rules configured; skipping scoring");
        return Vec::new();
    };

    let mut seen_urls: HashSet<&str> = HashSet::new();
    let scores: Vec<DocumentScore> = items
        .iter()
        .filter(|item| item.is_valid())
        .filter(|item| seen_urls.insert(item.url.as_str()))
        .filter_map(|item| score_item(item, &matcher, book))
        .collect();

    debug!(
        category = %category,
        items = items.len(),
        scored = scores.len(),
        "Scored documents"
    );

    scores
}
