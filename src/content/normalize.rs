// Feed payload normalization.
//
// Feeds hand us titles as plain strings or as `{"#text": ...}` objects, and
// links as strings or `{"href": ...}` objects. Each variant is an explicit
// serde shape here; `RawFeedEntry::normalize` is the one place they collapse
// into a `ContentItem`.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use super::ContentItem;
use crate::rules::Category;

/// Text that arrives either bare or wrapped in an object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawText {
    Plain(String),
    Object {
        #[serde(alias = "#text", alias = "value", alias = "_")]
        text: Option<String>,
    },
}

impl RawText {
    pub fn into_string(self) -> String {
        match self {
            RawText::Plain(s) => s,
            RawText::Object { text } => text.unwrap_or_default(),
        }
    }
}

/// A link given as a bare URL or as an object carrying `href`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawLink {
    Href(String),
    Object {
        #[serde(alias = "@href", alias = "url")]
        href: Option<String>,
    },
}

impl RawLink {
    pub fn into_string(self) -> String {
        match self {
            RawLink::Href(s) => s,
            RawLink::Object { href } => href.unwrap_or_default(),
        }
    }
}

/// One entry as produced by a feed-fetching collaborator, before normalization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawFeedEntry {
    pub title: Option<RawText>,
    #[serde(alias = "link")]
    pub url: Option<RawLink>,
    #[serde(alias = "description", alias = "abstract")]
    pub summary: Option<RawText>,
    #[serde(alias = "pubDate", alias = "publicationDate", alias = "date")]
    pub published: Option<String>,
    pub agency: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
    pub is_error: bool,
    pub is_warning: bool,
}

impl RawFeedEntry {
    /// Flatten into the canonical item. Never fails: missing text becomes
    /// empty and an unparseable date falls back to `fallback_date`.
    pub fn normalize(self, fallback_date: DateTime<Utc>) -> ContentItem {
        let published_at = self
            .published
            .as_deref()
            .and_then(parse_date)
            .unwrap_or(fallback_date);

        ContentItem {
            title: self
                .title
                .map(RawText::into_string)
                .unwrap_or_default()
                .trim()
                .to_string(),
            url: self
                .url
                .map(RawLink::into_string)
                .unwrap_or_default()
                .trim()
                .to_string(),
            summary: self
                .summary
                .map(RawText::into_string)
                .unwrap_or_default()
                .trim()
                .to_string(),
            published_at,
            agency: self.agency.filter(|a| !a.trim().is_empty()),
            doc_type: self.doc_type.filter(|t| !t.trim().is_empty()),
            is_error: self.is_error,
            is_warning: self.is_warning,
        }
    }
}

/// A batch file: a bare list of entries, or lists keyed by category name.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FeedFile {
    Entries(Vec<RawFeedEntry>),
    ByCategory(BTreeMap<String, Vec<RawFeedEntry>>),
}

impl FeedFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("{} is not a feed batch file", path.display()))
    }

    /// Normalize into per-category item lists.
    ///
    /// A bare list needs `category`; a keyed file uses its own keys and
    /// ignores it. Unknown category keys are an error.
    pub fn into_batches(
        self,
        category: Option<Category>,
        fallback_date: DateTime<Utc>,
    ) -> Result<Vec<(Category, Vec<ContentItem>)>> {
        let normalize = |entries: Vec<RawFeedEntry>| -> Vec<ContentItem> {
            entries
                .into_iter()
                .map(|e| e.normalize(fallback_date))
                .collect()
        };

        match self {
            FeedFile::Entries(entries) => {
                let Some(category) = category else {
                    anyhow::bail!("Feed file is a bare list; pass --category to say what it holds");
                };
                Ok(vec![(category, normalize(entries))])
            }
            FeedFile::ByCategory(map) => map
                .into_iter()
                .map(|(name, entries)| {
                    let category = name.parse::<Category>()?;
                    Ok((category, normalize(entries)))
                })
                .collect(),
        }
    }
}

/// Parse the date formats feeds actually emit: RFC 3339, RFC 2822, bare dates.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
