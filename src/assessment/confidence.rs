// Confidence scoring: how much evidence backs an assessment.
//
// A weighted blend of five factors, each capped to [0, 1] against a
// configured maximum. The factor breakdown is returned alongside the score
// so the number can be audited.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::assessor::{AssessmentResult, Status, PATTERN_SUFFIX};
use crate::content::ContentItem;
use crate::rules::RuleBook;

/// Agreement by status distance (0, 1, 2, 3+ steps apart).
const AGREEMENT_BY_DISTANCE: [f64; 4] = [1.0, 0.7, 0.4, 0.2];

/// Agreement assumed when there is no secondary assessment.
const DEFAULT_AGREEMENT: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceConfig {
    pub max_sources: f64,
    pub max_authoritative: f64,
    pub max_evidence: f64,
    /// Matches per item at which density saturates.
    pub max_density: f64,
    /// Density divides by at least this many items.
    pub min_density_denominator: f64,
    pub source_weight: f64,
    pub authority_weight: f64,
    pub evidence_weight: f64,
    pub density_weight: f64,
    pub agreement_weight: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            max_sources: 6.0,
            max_authoritative: 3.0,
            max_evidence: 10.0,
            max_density: 2.0,
            min_density_denominator: 5.0,
            source_weight: 0.20,
            authority_weight: 0.25,
            evidence_weight: 0.20,
            density_weight: 0.15,
            agreement_weight: 0.20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceFactors {
    pub source_diversity: f64,
    pub authority_weight: f64,
    pub evidence_coverage: f64,
    pub keyword_density: f64,
    pub ai_agreement: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceScore {
    /// Weighted blend, rounded to two decimals.
    pub score: f64,
    pub factors: ConfidenceFactors,
}

fn capped(value: f64, max: f64) -> f64 {
    if max <= 0.0 {
        return 0.0;
    }
    (value / max).clamp(0.0, 1.0)
}

/// Agreement between the keyword status and an optional secondary status.
pub fn status_agreement(keyword: Status, secondary: Option<Status>) -> f64 {
    match secondary {
        Some(other) => {
            let d = keyword.distance(other) as usize;
            AGREEMENT_BY_DISTANCE[d.min(AGREEMENT_BY_DISTANCE.len() - 1)]
        }
        None => DEFAULT_AGREEMENT,
    }
}

/// Score confidence in `assessment` given the items it was computed from.
pub fn compute_confidence(
    assessment: &AssessmentResult,
    items: &[ContentItem],
    book: &RuleBook,
    secondary: Option<Status>,
    config: &ConfidenceConfig,
) -> ConfidenceScore {
    let valid: Vec<&ContentItem> = items.iter().filter(|i| i.is_valid()).collect();

    let agencies: HashSet<String> = valid
        .iter()
        .filter_map(|i| i.agency.as_deref())
        .map(|a| a.trim().to_lowercase())
        .collect();
    let doc_types: HashSet<String> = valid
        .iter()
        .filter_map(|i| i.doc_type.as_deref())
        .map(|t| t.trim().to_lowercase())
        .collect();
    let distinct_sources = (agencies.len() + doc_types.len()) as f64;

    let authoritative = valid
        .iter()
        .filter(|i| book.is_authoritative(i.agency.as_deref()))
        .count() as f64;

    // Pattern promotions repeat a drift keyword; count each keyword once
    let keywords: HashSet<&str> = assessment
        .matches
        .iter()
        .map(|m| {
            m.strip_suffix(PATTERN_SUFFIX)
                .map(str::trim_end)
                .unwrap_or(m.as_str())
        })
        .collect();
    let match_count = keywords.len() as f64;
    let density = match_count / (valid.len() as f64).max(config.min_density_denominator);

    let factors = ConfidenceFactors {
        source_diversity: capped(distinct_sources, config.max_sources),
        authority_weight: capped(authoritative, config.max_authoritative),
        evidence_coverage: capped(valid.len() as f64, config.max_evidence),
        keyword_density: capped(density, config.max_density),
        ai_agreement: status_agreement(assessment.status, secondary),
    };

    let blended = factors.source_diversity * config.source_weight
        + factors.authority_weight * config.authority_weight
        + factors.evidence_coverage * config.evidence_weight
        + factors.keyword_density * config.density_weight
        + factors.ai_agreement * config.agreement_weight;

    ConfidenceScore {
        score: (blended * 100.0).round() / 100.0,
        factors,
    }
}
