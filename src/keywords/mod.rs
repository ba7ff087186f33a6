// Keyword matching and suppression: the first stage of document scoring.
//
// `matcher` holds the phrase primitives; `suppression` compiles a category's
// rule set and resolves negation, suppression and downweighting per match.

pub mod matcher;
pub mod suppression;

use serde::{Deserialize, Serialize};

use crate::rules::Tier;

pub use suppression::{KeywordMatcher, MatchOutcome};

/// An active keyword hit after all suppression rules have been applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordMatch {
    pub keyword: String,
    /// Effective tier (after any downweight).
    pub tier: Tier,
    pub weight: f64,
    /// ~100 characters of surrounding text.
    pub context: String,
    /// The mitigating term that moved this match down a tier, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downweighted_by: Option<String>,
}

/// A keyword hit that was removed from scoring, with the reason it was removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuppressedMatch {
    pub keyword: String,
    pub tier: Tier,
    pub rule_id: String,
    pub reason: String,
}
