// Canonical content items: the only document shape the scoring core sees.
//
// Upstream feeds disagree about where titles and links live; `normalize`
// flattens their variants into `ContentItem` before anything is scored.

pub mod normalize;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Host of the central inspectors-general oversight portal.
pub const OVERSIGHT_PORTAL_HOST: &str = "oversight.gov";

/// A single government action handed to the engine. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub summary: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub agency: Option<String>,
    /// Source-provided type code (e.g. "Rule", "Presidential Document").
    #[serde(default, rename = "type")]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub is_warning: bool,
}

impl ContentItem {
    /// Text that keyword matching runs over: title and summary only.
    ///
    /// Agency and editorial metadata are left out so a source's name can't
    /// masquerade as a content signal.
    pub fn scoring_text(&self) -> String {
        match (self.title.trim(), self.summary.trim()) {
            ("", s) => s.to_string(),
            (t, "") => t.to_string(),
            (t, s) => format!("{t} {s}"),
        }
    }

    /// Fetch errors and warnings are placeholders, not documents.
    pub fn is_valid(&self) -> bool {
        !self.is_error && !self.is_warning
    }

    /// Whether this placeholder reports the oversight portal as unreachable.
    pub fn signals_portal_offline(&self) -> bool {
        if self.is_valid() {
            return false;
        }
        let host = OVERSIGHT_PORTAL_HOST;
        self.url.to_lowercase().contains(host)
            || self.title.to_lowercase().contains(host)
            || self.summary.to_lowercase().contains(host)
    }
}
