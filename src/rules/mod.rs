// Keyword rule configuration: the read-only tables the scoring core is handed.
//
// Categories are a closed enum so a typo in a rule file is a load error rather
// than a silently unmonitored category. The built-in tables live in
// `defaults.rs`; a JSON file can replace them wholesale via `RuleBook::from_path`.

pub mod defaults;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keywords::matcher::contains_phrase;

/// Errors raised while loading or validating rule configuration.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("failed to read rule book {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid rule book JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A monitored category of government activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    CivilService,
    Fiscal,
    /// Inspectors general.
    Igs,
    HatchAct,
    Courts,
    Military,
    Rulemaking,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::CivilService,
        Category::Fiscal,
        Category::Igs,
        Category::HatchAct,
        Category::Courts,
        Category::Military,
        Category::Rulemaking,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::CivilService => "civilService",
            Category::Fiscal => "fiscal",
            Category::Igs => "igs",
            Category::HatchAct => "hatchAct",
            Category::Courts => "courts",
            Category::Military => "military",
            Category::Rulemaking => "rulemaking",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RuleError::UnknownCategory(s.to_string()))
    }
}

/// Keyword severity tier. Ordering follows severity: Warning < Drift < Capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Warning,
    Drift,
    Capture,
}

impl Tier {
    /// Highest severity first, the order keywords are matched in.
    pub const BY_SEVERITY: [Tier; 3] = [Tier::Capture, Tier::Drift, Tier::Warning];

    /// One fixed step down. Never chained: callers apply it at most once.
    pub fn downweighted(self) -> Tier {
        match self {
            Tier::Capture => Tier::Drift,
            Tier::Drift => Tier::Warning,
            Tier::Warning => Tier::Warning,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Capture => "capture",
            Tier::Drift => "drift",
            Tier::Warning => "warning",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scoring weight carried by each tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierWeights {
    pub capture: f64,
    pub drift: f64,
    pub warning: f64,
}

impl Default for TierWeights {
    fn default() -> Self {
        Self {
            capture: 4.0,
            drift: 2.0,
            warning: 1.0,
        }
    }
}

impl TierWeights {
    pub fn for_tier(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Capture => self.capture,
            Tier::Drift => self.drift,
            Tier::Warning => self.warning,
        }
    }

    pub fn min(&self) -> f64 {
        self.capture.min(self.drift).min(self.warning)
    }

    pub fn max(&self) -> f64 {
        self.capture.max(self.drift).max(self.warning)
    }
}

/// Context rules attached to a single keyword.
///
/// `suppress_if_any` removes the match outright when any term co-occurs;
/// `downweight_if_any` drops it exactly one tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuppressionRule {
    pub keyword: String,
    pub suppress_if_any: Vec<String>,
    pub downweight_if_any: Vec<String>,
}

/// Item-count thresholds used when no keyword fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeThresholds {
    /// At or above this many items: Warning.
    pub drift: usize,
    /// At or above this many items: Drift.
    pub capture: usize,
}

/// Per-category keyword configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeywordRuleSet {
    pub capture: Vec<String>,
    pub drift: Vec<String>,
    pub warning: Vec<String>,
    pub suppressions: Vec<SuppressionRule>,
    pub volume: Option<VolumeThresholds>,
}

impl KeywordRuleSet {
    pub fn keywords(&self, tier: Tier) -> &[String] {
        match tier {
            Tier::Capture => &self.capture,
            Tier::Drift => &self.drift,
            Tier::Warning => &self.warning,
        }
    }
}

/// The complete, injected rule configuration.
///
/// Shared read-only (typically behind an `Arc`) across every category and
/// week being scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleBook {
    pub categories: HashMap<Category, KeywordRuleSet>,
    pub negation_phrases: Vec<String>,
    pub authoritative_sources: Vec<String>,
    pub pattern_phrases: Vec<String>,
    pub tier_weights: TierWeights,
}

impl Default for RuleBook {
    fn default() -> Self {
        Self {
            categories: defaults::category_rules(),
            negation_phrases: defaults::negation_phrases(),
            authoritative_sources: defaults::authoritative_sources(),
            pattern_phrases: defaults::pattern_phrases(),
            tier_weights: TierWeights::default(),
        }
    }
}

impl RuleBook {
    /// Parse a rule book from JSON. Omitted top-level sections keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, RuleError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a rule book from a JSON file on disk.
    pub fn from_path(path: &Path) -> Result<Self, RuleError> {
        let json = std::fs::read_to_string(path).map_err(|source| RuleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn rules_for(&self, category: Category) -> Option<&KeywordRuleSet> {
        self.categories.get(&category)
    }

    /// Whether an agency belongs to the fixed high-authority source list.
    ///
    /// Decided from the agency field alone, never from content keywords.
    pub fn is_authoritative(&self, agency: Option<&str>) -> bool {
        let Some(agency) = agency else {
            return false;
        };
        self.authoritative_sources
            .iter()
            .any(|source| contains_phrase(agency, source))
    }
}
