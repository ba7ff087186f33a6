// Severity scoring and document classification tests.
//
// Pure functions only: items in, DocumentScores out. No database.

use chrono::{Datelike, NaiveDate, TimeZone, Utc, Weekday};

use driftwatch::content::ContentItem;
use driftwatch::keywords::KeywordMatcher;
use driftwatch::rules::{Category, RuleBook, Tier, TierWeights};
use driftwatch::scoring::classifier::{classify, DocumentClass};
use driftwatch::scoring::severity::{
    score_item, score_items, severity_score, tier_score, week_of, TierCounts,
};

fn item(title: &str, doc_type: Option<&str>) -> ContentItem {
    ContentItem {
        title: title.to_string(),
        url: format!("https://example.gov/{}", title.len()),
        summary: String::new(),
        published_at: Utc.with_ymd_and_hms(2025, 3, 5, 14, 0, 0).unwrap(),
        agency: None,
        doc_type: doc_type.map(String::from),
        is_error: false,
        is_warning: false,
    }
}

// ============================================================
// Logarithmic tier scoring
// ============================================================

#[test]
fn tier_score_matches_log2_examples() {
    assert!((tier_score(4.0, 1) - 4.0).abs() < 1e-9);
    assert!((tier_score(4.0, 2) - 4.0 * 3f64.log2()).abs() < 1e-9);
    assert!((tier_score(4.0, 3) - 8.0).abs() < 1e-9);
    assert_eq!(tier_score(4.0, 0), 0.0);
}

#[test]
fn tier_score_is_concave_and_non_decreasing() {
    let gains: Vec<f64> = (0..6)
        .map(|n| tier_score(2.0, n + 1) - tier_score(2.0, n))
        .collect();
    for pair in gains.windows(2) {
        assert!(pair[0] > 0.0);
        assert!(pair[1] < pair[0], "marginal gain should shrink: {gains:?}");
    }
}

#[test]
fn severity_sums_tiers() {
    let counts = TierCounts {
        capture: 1,
        drift: 1,
        warning: 1,
    };
    let w = TierWeights::default();
    assert!((severity_score(&counts, &w) - 7.0).abs() < 1e-9);
    assert_eq!(severity_score(&TierCounts::default(), &w), 0.0);
}

// ============================================================
// Week bucketing
// ============================================================

#[test]
fn week_of_is_monday_utc() {
    // Sunday late evening UTC still belongs to the preceding Monday's week
    let sunday = Utc.with_ymd_and_hms(2025, 3, 9, 23, 59, 0).unwrap();
    assert_eq!(week_of(sunday), NaiveDate::from_ymd_opt(2025, 3, 3).unwrap());

    let monday = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
    let bucket = week_of(monday);
    assert_eq!(bucket.weekday(), Weekday::Mon);
    assert_eq!(bucket, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
}

// ============================================================
// End-to-end document scoring
// ============================================================

#[test]
fn schedule_f_executive_order_scores_as_capture_with_eo_multiplier() {
    let book = RuleBook::default();
    let matcher = KeywordMatcher::for_category(Category::CivilService, &book).unwrap();
    let doc = item(
        "Schedule F executive order reinstated",
        Some("Presidential Document"),
    );

    let score = score_item(&doc, &matcher, &book).unwrap();

    assert_eq!(score.document_class, DocumentClass::ExecutiveOrder);
    assert_eq!(score.class_multiplier, 1.5);
    assert!((score.final_score - score.severity_score * 1.5).abs() < 1e-9);
    assert!(score
        .matches
        .iter()
        .any(|m| m.keyword == "schedule f" && m.tier == Tier::Capture));
    assert_eq!(score.week_of, NaiveDate::from_ymd_opt(2025, 3, 3).unwrap());
}

#[test]
fn final_score_invariant_holds_for_every_class() {
    let book = RuleBook::default();
    let items = vec![
        item("Impoundment of appropriated funds", Some("Rule")),
        item("Impoundment and funding freeze", Some("Proposed Rule")),
        item("Rescission package", Some("Press Release")),
        item("Nothing of interest", None),
    ];
    for score in score_items(Category::Fiscal, &items, &book) {
        assert!(
            (score.final_score - score.severity_score * score.class_multiplier).abs() < 1e-9,
            "{}",
            score.title
        );
        assert_eq!(score.class_multiplier, score.document_class.multiplier());
    }
}

#[test]
fn error_and_warning_items_are_excluded() {
    let book = RuleBook::default();
    let mut failed = item("Impoundment notice", None);
    failed.is_error = true;
    let mut flaky = item("Impoundment again", None);
    flaky.url = "https://example.gov/other".into();
    flaky.is_warning = true;

    let scores = score_items(Category::Fiscal, &[failed, flaky], &book);
    assert!(scores.is_empty());
}

#[test]
fn duplicate_urls_score_once() {
    let book = RuleBook::default();
    let a = item("Impoundment notice", None);
    let b = a.clone();
    assert_eq!(score_items(Category::Fiscal, &[a, b], &book).len(), 1);
}

#[test]
fn error_placeholder_does_not_shadow_real_document() {
    let book = RuleBook::default();
    let mut failed = item("Feed unavailable", None);
    failed.url = "https://x.gov/a".into();
    failed.is_error = true;
    let mut real = item("Impoundment of funds", None);
    real.url = "https://x.gov/a".into();

    let scores = score_items(Category::Fiscal, &[failed, real], &book);
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].title, "Impoundment of funds");
    assert_eq!(scores[0].tier_counts.capture, 1);
}

#[test]
fn empty_text_scores_zero_without_error() {
    let book = RuleBook::default();
    let matcher = KeywordMatcher::for_category(Category::Courts, &book).unwrap();
    let score = score_item(&item("", None), &matcher, &book).unwrap();
    assert_eq!(score.severity_score, 0.0);
    assert!(score.matches.is_empty());
}

#[test]
fn authority_comes_from_agency_not_text() {
    let book = RuleBook::default();
    let matcher = KeywordMatcher::for_category(Category::Fiscal, &book).unwrap();

    let mut gao = item("Impoundment decision", None);
    gao.agency = Some("Government Accountability Office".into());
    assert!(score_item(&gao, &matcher, &book).unwrap().is_high_authority);

    let mention = item("Impoundment, says inspector general", None);
    assert!(!score_item(&mention, &matcher, &book).unwrap().is_high_authority);
}

// ============================================================
// Classification priority
// ============================================================

#[test]
fn classification_priority_order() {
    // Type code beats title
    let coded = item("Executive order text", Some("Notice"));
    assert_eq!(classify(&coded), DocumentClass::Notice);

    // Title beats agency
    let mut titled = item("Presidential Memorandum on staffing", None);
    titled.agency = Some("Department of Defense".into());
    assert_eq!(classify(&titled), DocumentClass::PresidentialMemorandum);

    // Agency when nothing else
    let mut agency = item("Readout", None);
    agency.agency = Some("Department of Defense".into());
    assert_eq!(classify(&agency), DocumentClass::PressRelease);
    assert_eq!(classify(&agency).multiplier(), 0.8);
}
