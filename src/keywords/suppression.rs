// Suppression engine: turns raw phrase hits into scored matches.
//
// For every keyword that occurs in the text, in this order:
//   1. negation: an occurrence with a negation phrase nearby is discarded;
//      if every occurrence is negated the keyword is recorded as suppressed
//   2. suppression: a co-occurring `suppress_if_any` term removes the match
//   3. downweight: a co-occurring `downweight_if_any` term drops it one tier
//
// Each distinct keyword counts at most once per text.

use std::collections::{HashMap, HashSet};

use super::matcher::{
    context_snippet, negation_near, PhraseMatcher, NEGATION_WINDOW_CHARS, SNIPPET_RADIUS_CHARS,
};
use super::{KeywordMatch, SuppressedMatch};
use crate::rules::{Category, KeywordRuleSet, RuleBook, Tier, TierWeights};
use crate::scoring::severity::TierCounts;

struct CompiledRule {
    suppress: Vec<PhraseMatcher>,
    downweight: Vec<PhraseMatcher>,
}

/// Matches and suppressions produced for one piece of text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    pub matches: Vec<KeywordMatch>,
    pub suppressed: Vec<SuppressedMatch>,
}

impl MatchOutcome {
    /// Active match counts per effective tier.
    pub fn tier_counts(&self) -> TierCounts {
        let mut counts = TierCounts::default();
        for m in &self.matches {
            counts.add(m.tier);
        }
        counts
    }
}

/// A category's rule set compiled once and reused across documents.
pub struct KeywordMatcher {
    category: Category,
    keywords: Vec<(Tier, PhraseMatcher)>,
    rules: HashMap<String, CompiledRule>,
    negations: Vec<PhraseMatcher>,
    weights: TierWeights,
}

impl KeywordMatcher {
    pub fn new(category: Category, rule_set: &KeywordRuleSet, book: &RuleBook) -> Self {
        let keywords = Tier::BY_SEVERITY
            .iter()
            .flat_map(|&tier| {
                rule_set
                    .keywords(tier)
                    .iter()
                    .filter_map(move |kw| PhraseMatcher::new(kw).map(|m| (tier, m)))
            })
            .collect();

        let rules = rule_set
            .suppressions
            .iter()
            .map(|rule| {
                let compile = |terms: &[String]| -> Vec<PhraseMatcher> {
                    terms.iter().filter_map(|t| PhraseMatcher::new(t)).collect()
                };
                (
                    rule.keyword.trim().to_lowercase(),
                    CompiledRule {
                        suppress: compile(&rule.suppress_if_any),
                        downweight: compile(&rule.downweight_if_any),
                    },
                )
            })
            .collect();

        let negations = book
            .negation_phrases
            .iter()
            .filter_map(|p| PhraseMatcher::new(p))
            .collect();

        Self {
            category,
            keywords,
            rules,
            negations,
            weights: book.tier_weights,
        }
    }

    /// Build a matcher for `category`, or `None` when the book has no rules for it.
    pub fn for_category(category: Category, book: &RuleBook) -> Option<Self> {
        book.rules_for(category)
            .map(|rule_set| Self::new(category, rule_set, book))
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn weights(&self) -> &TierWeights {
        &self.weights
    }

    /// Run every keyword against `text` and resolve suppression rules.
    pub fn match_text(&self, text: &str) -> MatchOutcome {
        let mut outcome = MatchOutcome::default();
        if text.trim().is_empty() {
            return outcome;
        }

        let mut seen: HashSet<&str> = HashSet::new();

        for (tier, matcher) in &self.keywords {
            let keyword = matcher.phrase();
            if seen.contains(keyword) {
                continue;
            }
            let occurrences = matcher.find_all(text);
            if occurrences.is_empty() {
                continue;
            }
            seen.insert(keyword);

            // Step 1: negation, per occurrence
            let mut negated_by: Option<&str> = None;
            let active = occurrences.iter().find(|occ| {
                match negation_near(text, occ, NEGATION_WINDOW_CHARS, &self.negations) {
                    Some(phrase) => {
                        negated_by.get_or_insert(phrase);
                        false
                    }
                    None => true,
                }
            });

            let Some(occurrence) = active else {
                let phrase = negated_by.unwrap_or_default();
                outcome.suppressed.push(SuppressedMatch {
                    keyword: keyword.to_string(),
                    tier: *tier,
                    rule_id: format!("negation:{phrase}"),
                    reason: format!("negated by \"{phrase}\" near the match"),
                });
                continue;
            };

            let mut effective_tier = *tier;
            let mut downweighted_by = None;

            if let Some(rule) = self.rules.get(keyword) {
                // Step 2: full suppression on co-occurrence anywhere in the text
                if let Some(term) = rule.suppress.iter().find(|t| t.is_match(text)) {
                    outcome.suppressed.push(SuppressedMatch {
                        keyword: keyword.to_string(),
                        tier: *tier,
                        rule_id: format!("{}:{}:suppress", self.category, keyword),
                        reason: format!("co-occurs with \"{}\"", term.phrase()),
                    });
                    continue;
                }

                // Step 3: a single one-tier downweight
                if let Some(term) = rule.downweight.iter().find(|t| t.is_match(text)) {
                    effective_tier = tier.downweighted();
                    downweighted_by = Some(term.phrase().to_string());
                }
            }

            outcome.matches.push(KeywordMatch {
                keyword: keyword.to_string(),
                tier: effective_tier,
                weight: self.weights.for_tier(effective_tier),
                context: context_snippet(text, occurrence, SNIPPET_RADIUS_CHARS),
                downweighted_by,
            });
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::SuppressionRule;

    fn book_with(rule_set: KeywordRuleSet) -> (RuleBook, KeywordMatcher) {
        let mut book = RuleBook::default();
        book.categories.clear();
        book.categories.insert(Category::Fiscal, rule_set);
        let matcher = KeywordMatcher::for_category(Category::Fiscal, &book).unwrap();
        (book, matcher)
    }

    fn fiscal_rules() -> KeywordRuleSet {
        KeywordRuleSet {
            capture: vec!["impoundment".into()],
            drift: vec!["funding freeze".into()],
            warning: vec!["rescission".into()],
            suppressions: vec![SuppressionRule {
                keyword: "funding freeze".into(),
                suppress_if_any: vec!["freeze lifted".into()],
                downweight_if_any: vec!["temporary".into()],
            }],
            volume: None,
        }
    }

    #[test]
    fn test_negated_occurrence_is_suppressed() {
        let (_, matcher) = book_with(fiscal_rules());
        let outcome = matcher.match_text("GAO found no evidence of impoundment at the agency");
        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.suppressed.len(), 1);
        assert_eq!(outcome.suppressed[0].keyword, "impoundment");
        assert!(outcome.suppressed[0].reason.contains("no evidence of"));
    }

    #[test]
    fn test_one_clean_occurrence_keeps_match() {
        let (_, matcher) = book_with(fiscal_rules());
        let padding = "filler ".repeat(20);
        let text = format!("no evidence of impoundment last year. {padding} Now impoundment is underway");
        let outcome = matcher.match_text(&text);
        assert_eq!(outcome.matches.len(), 1);
        assert!(outcome.suppressed.is_empty());
    }

    #[test]
    fn test_suppress_term_removes_match() {
        let (_, matcher) = book_with(fiscal_rules());
        let outcome = matcher.match_text("Funding freeze ends as freeze lifted by OMB");
        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.suppressed[0].rule_id, "fiscal:funding freeze:suppress");
    }

    #[test]
    fn test_downweight_moves_one_tier() {
        let (_, matcher) = book_with(fiscal_rules());
        let outcome = matcher.match_text("A temporary funding freeze on grants");
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].tier, Tier::Warning);
        assert_eq!(outcome.matches[0].weight, 1.0);
        assert_eq!(outcome.matches[0].downweighted_by.as_deref(), Some("temporary"));
    }

    #[test]
    fn test_repeated_keyword_counts_once() {
        let (_, matcher) = book_with(fiscal_rules());
        let outcome = matcher.match_text("impoundment, impoundment, impoundment");
        assert_eq!(outcome.tier_counts().capture, 1);
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        let (_, matcher) = book_with(fiscal_rules());
        assert_eq!(matcher.match_text(""), MatchOutcome::default());
    }
}
