// Document classification: maps a document to a class and its multiplier.
//
// Priority: explicit source type code, then title heuristics, then
// agency/url heuristics, then `Unknown`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::content::ContentItem;
use crate::keywords::matcher::contains_phrase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentClass {
    ExecutiveOrder,
    PresidentialMemorandum,
    FinalRule,
    ProposedRule,
    Notice,
    CourtOpinion,
    Report,
    PressRelease,
    Unknown,
}

impl DocumentClass {
    /// Severity multiplier applied to a document's keyword score.
    pub fn multiplier(&self) -> f64 {
        match self {
            DocumentClass::ExecutiveOrder => 1.5,
            DocumentClass::PresidentialMemorandum => 1.4,
            DocumentClass::FinalRule => 1.3,
            DocumentClass::CourtOpinion => 1.2,
            DocumentClass::ProposedRule => 1.1,
            DocumentClass::Notice => 1.0,
            DocumentClass::Report => 1.0,
            DocumentClass::Unknown => 1.0,
            DocumentClass::PressRelease => 0.8,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentClass::ExecutiveOrder => "executive_order",
            DocumentClass::PresidentialMemorandum => "presidential_memorandum",
            DocumentClass::FinalRule => "final_rule",
            DocumentClass::ProposedRule => "proposed_rule",
            DocumentClass::Notice => "notice",
            DocumentClass::CourtOpinion => "court_opinion",
            DocumentClass::Report => "report",
            DocumentClass::PressRelease => "press_release",
            DocumentClass::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        [
            DocumentClass::ExecutiveOrder,
            DocumentClass::PresidentialMemorandum,
            DocumentClass::FinalRule,
            DocumentClass::ProposedRule,
            DocumentClass::Notice,
            DocumentClass::CourtOpinion,
            DocumentClass::Report,
            DocumentClass::PressRelease,
            DocumentClass::Unknown,
        ]
        .into_iter()
        .find(|c| c.as_str() == s)
    }
}

impl fmt::Display for DocumentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Exact lookup of a source-provided type code.
fn from_type_code(code: &str) -> Option<DocumentClass> {
    let class = match code.trim().to_lowercase().as_str() {
        "executive order" => DocumentClass::ExecutiveOrder,
        "presidential memorandum" | "memorandum" => DocumentClass::PresidentialMemorandum,
        "rule" | "final rule" => DocumentClass::FinalRule,
        "proposed rule" | "prorule" => DocumentClass::ProposedRule,
        "notice" => DocumentClass::Notice,
        "opinion" | "court opinion" => DocumentClass::CourtOpinion,
        "report" => DocumentClass::Report,
        "press release" => DocumentClass::PressRelease,
        _ => return None,
    };
    Some(class)
}

fn from_title(title: &str) -> Option<DocumentClass> {
    if contains_phrase(title, "executive order") {
        Some(DocumentClass::ExecutiveOrder)
    } else if contains_phrase(title, "presidential memorandum") {
        Some(DocumentClass::PresidentialMemorandum)
    } else {
        None
    }
}

/// Agency and url substrings, checked in order.
const SOURCE_HEURISTICS: &[(&str, DocumentClass)] = &[
    ("supreme court", DocumentClass::CourtOpinion),
    ("supremecourt.gov", DocumentClass::CourtOpinion),
    ("court of appeals", DocumentClass::CourtOpinion),
    ("district court", DocumentClass::CourtOpinion),
    ("government accountability", DocumentClass::Report),
    ("gao", DocumentClass::Report),
    ("inspector general", DocumentClass::Report),
    ("oversight.gov", DocumentClass::Report),
    ("congressional budget office", DocumentClass::Report),
    ("department of defense", DocumentClass::PressRelease),
    ("defense.gov", DocumentClass::PressRelease),
    ("briefing-room", DocumentClass::PressRelease),
];

fn from_source(agency: Option<&str>, url: &str) -> Option<DocumentClass> {
    SOURCE_HEURISTICS.iter().find_map(|(needle, class)| {
        let in_agency = agency.is_some_and(|a| contains_phrase(a, needle));
        (in_agency || contains_phrase(url, needle)).then_some(*class)
    })
}

/// Classify a document. Total: anything unrecognized is `Unknown`.
pub fn classify(item: &ContentItem) -> DocumentClass {
    item.doc_type
        .as_deref()
        .and_then(from_type_code)
        .or_else(|| from_title(&item.title))
        .or_else(|| from_source(item.agency.as_deref(), &item.url))
        .unwrap_or(DocumentClass::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(title: &str, doc_type: Option<&str>, agency: Option<&str>, url: &str) -> ContentItem {
        ContentItem {
            title: title.to_string(),
            url: url.to_string(),
            summary: String::new(),
            published_at: Utc::now(),
            agency: agency.map(String::from),
            doc_type: doc_type.map(String::from),
            is_error: false,
            is_warning: false,
        }
    }

    #[test]
    fn test_type_code_wins() {
        let doc = item("Executive order on rules", Some("Proposed Rule"), None, "");
        assert_eq!(classify(&doc), DocumentClass::ProposedRule);
    }

    #[test]
    fn test_unmapped_type_code_falls_through_to_title() {
        let doc = item(
            "Schedule F executive order reinstated",
            Some("Presidential Document"),
            None,
            "",
        );
        assert_eq!(classify(&doc), DocumentClass::ExecutiveOrder);
        assert_eq!(classify(&doc).multiplier(), 1.5);
    }

    #[test]
    fn test_agency_heuristics() {
        let court = item("Opinion", None, Some("Supreme Court of the United States"), "");
        assert_eq!(classify(&court), DocumentClass::CourtOpinion);
        let gao = item("Audit", None, None, "https://www.gao.gov/products/gao-25-1");
        assert_eq!(classify(&gao), DocumentClass::Report);
        let dod = item("Update", None, Some("Department of Defense"), "");
        assert_eq!(classify(&dod), DocumentClass::PressRelease);
    }

    #[test]
    fn test_default_unknown() {
        assert_eq!(classify(&item("", None, None, "")), DocumentClass::Unknown);
    }

    #[test]
    fn test_parse_round_trip() {
        for class in [DocumentClass::FinalRule, DocumentClass::Unknown] {
            assert_eq!(DocumentClass::parse(class.as_str()), Some(class));
        }
    }
}
