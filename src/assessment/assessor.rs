// Category status assessment: a batch of items becomes Stable/Warning/Drift/Capture.
//
// Escalation, highest priority first:
//   - inspectors general with the oversight portal offline: Drift, no keyword pass
//   - no rules configured: Warning
//   - 2+ distinct capture signals: Capture
//   - exactly 1 capture signal: Drift (needs corroboration)
//   - 2+ distinct drift signals: Drift
//   - 1 drift signal, or any warning signals: Warning
//   - no signal: volume thresholds (capture count → Drift, drift count → Warning)
//   - fewer than 3 valid items: Warning, insufficient data
//   - otherwise: Stable
//
// A drift match in an item that also uses pattern language ("systematic",
// "repeated", ...) additionally counts as a capture signal. Status is
// recomputed from scratch on every call.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::content::ContentItem;
use crate::keywords::matcher::PhraseMatcher;
use crate::keywords::KeywordMatcher;
use crate::rules::{Category, RuleBook, Tier};

/// Items below this count can never be assessed Stable.
pub const MIN_ITEMS_FOR_STABLE: usize = 3;

/// Matches named in a Capture reason.
const REASON_MATCH_LIMIT: usize = 3;

pub(crate) const PATTERN_SUFFIX: &str = "(systematic pattern)";

/// Qualitative status, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Status {
    Stable,
    Warning,
    Drift,
    Capture,
}

impl Status {
    /// Position on the 4-level ordering (Stable = 0 .. Capture = 3).
    pub fn level(&self) -> u8 {
        *self as u8
    }

    /// Steps between two statuses on the ordering.
    pub fn distance(&self, other: Status) -> u8 {
        self.level().abs_diff(other.level())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Stable => "Stable",
            Status::Warning => "Warning",
            Status::Drift => "Drift",
            Status::Capture => "Capture",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentDetail {
    pub capture_count: usize,
    pub drift_count: usize,
    pub warning_count: usize,
    pub items_reviewed: usize,
    pub has_authoritative: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub insufficient_data: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    pub status: Status,
    pub reason: String,
    /// Distinct signals, capture first.
    pub matches: Vec<String>,
    pub detail: AssessmentDetail,
}

impl AssessmentResult {
    fn new(status: Status, reason: impl Into<String>, detail: AssessmentDetail) -> Self {
        Self {
            status,
            reason: reason.into(),
            matches: Vec::new(),
            detail,
        }
    }
}

/// Insertion-ordered distinct strings.
#[derive(Default)]
struct Signals(Vec<String>);

impl Signals {
    fn insert(&mut self, s: String) {
        if !self.0.contains(&s) {
            self.0.push(s);
        }
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn listed(&self, limit: usize) -> String {
        self.0.iter().take(limit).cloned().collect::<Vec<_>>().join(", ")
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stable" => Ok(Status::Stable),
            "warning" => Ok(Status::Warning),
            "drift" => Ok(Status::Drift),
            "capture" => Ok(Status::Capture),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

/// Assess one category from a batch of its items.
pub fn assess_category(category: Category, items: &[ContentItem], book: &RuleBook) -> AssessmentResult {
    let valid: Vec<&ContentItem> = items.iter().filter(|i| i.is_valid()).collect();
    let items_reviewed = valid.len();
    let insufficient_data = items_reviewed < MIN_ITEMS_FOR_STABLE;

    if category == Category::Igs && items.iter().any(ContentItem::signals_portal_offline) {
        return AssessmentResult::new(
            Status::Drift,
            "Oversight.gov portal offline; inspector general reporting unavailable",
            AssessmentDetail {
                items_reviewed,
                insufficient_data,
                ..Default::default()
            },
        );
    }

    let Some(rule_set) = book.rules_for(category) else {
        return AssessmentResult::new(
            Status::Warning,
            format!("No keyword rules configured for {category}"),
            AssessmentDetail {
                items_reviewed,
                insufficient_data,
                ..Default::default()
            },
        );
    };

    let matcher = KeywordMatcher::new(category, rule_set, book);
    let patterns: Vec<PhraseMatcher> = book
        .pattern_phrases
        .iter()
        .filter_map(|p| PhraseMatcher::new(p))
        .collect();

    let mut capture = Signals::default();
    let mut drift = Signals::default();
    let mut warning = Signals::default();

    for item in &valid {
        let text = item.scoring_text();
        let outcome = matcher.match_text(&text);
        let systematic = patterns.iter().any(|p| p.is_match(&text));

        for m in outcome.matches {
            match m.tier {
                Tier::Capture => capture.insert(m.keyword),
                Tier::Drift => {
                    if systematic {
                        capture.insert(format!("{} {PATTERN_SUFFIX}", m.keyword));
                    }
                    drift.insert(m.keyword);
                }
                Tier::Warning => warning.insert(m.keyword),
            }
        }
    }

    let has_authoritative = valid
        .iter()
        .any(|i| book.is_authoritative(i.agency.as_deref()));

    let detail = AssessmentDetail {
        capture_count: capture.len(),
        drift_count: drift.len(),
        warning_count: warning.len(),
        items_reviewed,
        has_authoritative,
        insufficient_data,
    };

    let (status, reason) = if capture.len() >= 2 {
        let mut reason = format!("Capture-level signals: {}", capture.listed(REASON_MATCH_LIMIT));
        if has_authoritative {
            reason.push_str(" (corroborated by authoritative source)");
        }
        (Status::Capture, reason)
    } else if capture.len() == 1 {
        (
            Status::Drift,
            format!(
                "Single capture-level signal, needs corroboration: {}",
                capture.listed(1)
            ),
        )
    } else if drift.len() >= 2 {
        (
            Status::Drift,
            format!("Multiple drift signals: {}", drift.listed(REASON_MATCH_LIMIT)),
        )
    } else if drift.len() == 1 {
        (Status::Warning, format!("Drift signal: {}", drift.listed(1)))
    } else if !warning.is_empty() {
        (
            Status::Warning,
            format!("Warning signals: {}", warning.listed(REASON_MATCH_LIMIT)),
        )
    } else {
        match rule_set.volume {
            Some(v) if items_reviewed >= v.capture => (
                Status::Drift,
                format!("Very high activity: {items_reviewed} items"),
            ),
            Some(v) if items_reviewed >= v.drift => (
                Status::Warning,
                format!("Elevated activity: {items_reviewed} items"),
            ),
            _ if insufficient_data => (
                Status::Warning,
                format!("Insufficient data: only {items_reviewed} valid items"),
            ),
            _ => (
                Status::Stable,
                format!("No concerning signals across {items_reviewed} items"),
            ),
        }
    };

    debug!(
        category = %category,
        status = status.as_str(),
        capture = detail.capture_count,
        drift = detail.drift_count,
        warning = detail.warning_count,
        items = items_reviewed,
        "Assessed category"
    );

    let matches = capture
        .0
        .into_iter()
        .chain(drift.0)
        .chain(warning.0)
        .collect();

    AssessmentResult {
        status,
        reason,
        matches,
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ordering_and_distance() {
        assert!(Status::Capture > Status::Drift);
        assert!(Status::Warning > Status::Stable);
        assert_eq!(Status::Stable.distance(Status::Capture), 3);
        assert_eq!(Status::Drift.distance(Status::Warning), 1);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Capture".parse::<Status>(), Ok(Status::Capture));
        assert_eq!(" stable ".parse::<Status>(), Ok(Status::Stable));
        assert!("red".parse::<Status>().is_err());
    }

    #[test]
    fn test_signals_dedupe_in_order() {
        let mut s = Signals::default();
        s.insert("b".into());
        s.insert("a".into());
        s.insert("b".into());
        assert_eq!(s.listed(5), "b, a");
    }
}
