// Weekly aggregation and baseline statistics tests.

use chrono::{Duration, NaiveDate, TimeZone, Utc};

use driftwatch::aggregate::baseline::{
    compute_baseline, document_centroid, drift_noise_floor, BaselinePeriod,
};
use driftwatch::aggregate::stats::{mean, sample_stddev};
use driftwatch::aggregate::weekly::{aggregate_week, tier_mix};
use driftwatch::db::models::{DocumentEmbedding, DocumentScore, WeeklyAggregate};
use driftwatch::keywords::KeywordMatch;
use driftwatch::rules::{Category, Tier, TierWeights};
use driftwatch::scoring::classifier::DocumentClass;
use driftwatch::scoring::severity::TierCounts;
use driftwatch::semantic::vectors::cosine_distance;

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn score(url: &str, final_score: f64, counts: TierCounts, keywords: &[&str]) -> DocumentScore {
    DocumentScore {
        url: url.to_string(),
        category: Category::Courts,
        severity_score: final_score,
        final_score,
        tier_counts: counts,
        suppressed_count: 0,
        document_class: DocumentClass::Unknown,
        class_multiplier: 1.0,
        is_high_authority: false,
        matches: keywords
            .iter()
            .map(|k| KeywordMatch {
                keyword: k.to_string(),
                tier: Tier::Drift,
                weight: 2.0,
                context: String::new(),
                downweighted_by: None,
            })
            .collect(),
        suppressed: vec![],
        week_of: monday(),
        title: url.to_string(),
        published_at: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
    }
}

fn counts(capture: u32, drift: u32, warning: u32) -> TierCounts {
    TierCounts {
        capture,
        drift,
        warning,
    }
}

fn weekly(week: NaiveDate, total: f64, docs: u32, mix: f64) -> WeeklyAggregate {
    WeeklyAggregate {
        category: Category::Courts,
        week_of: week,
        total_severity: total,
        document_count: docs,
        avg_severity_per_doc: if docs == 0 { 0.0 } else { total / docs as f64 },
        capture_proportion: 0.0,
        drift_proportion: 0.0,
        warning_proportion: 0.0,
        severity_mix: mix,
        top_keywords: vec![],
    }
}

fn emb(url: &str, week: NaiveDate, vector: Vec<f64>) -> DocumentEmbedding {
    DocumentEmbedding {
        url: url.to_string(),
        category: Category::Courts,
        week_of: week,
        vector,
    }
}

// ============================================================
// Sample statistics
// ============================================================

#[test]
fn sample_stddev_edge_cases() {
    assert_eq!(sample_stddev(&[]), 0.0);
    assert_eq!(sample_stddev(&[42.0]), 0.0);
    assert!((sample_stddev(&[10.0, 20.0, 30.0]) - 10.0).abs() < 1e-9);
    assert!((mean(&[10.0, 20.0, 30.0]) - 20.0).abs() < 1e-9);
    assert_eq!(mean(&[]), 0.0);
}

// ============================================================
// Weekly aggregate
// ============================================================

#[test]
fn proportions_come_from_raw_match_counts() {
    // One doc with 3 capture matches, one with 1 warning: 3/4 capture,
    // not the 1/2 a per-document average would give.
    let scores = vec![
        score("a", 8.0, counts(3, 0, 0), &[]),
        score("b", 1.0, counts(0, 0, 1), &[]),
    ];
    let agg = aggregate_week(
        Category::Courts,
        monday(),
        &scores,
        &TierWeights::default(),
        None,
        10,
    );
    assert!((agg.capture_proportion - 0.75).abs() < 1e-9);
    assert!((agg.warning_proportion - 0.25).abs() < 1e-9);
    assert_eq!(agg.drift_proportion, 0.0);
    assert!((agg.severity_mix - (0.75 * 4.0 + 0.25 * 1.0)).abs() < 1e-9);
    assert_eq!(agg.total_severity, 9.0);
    assert_eq!(agg.document_count, 2);
    assert!((agg.avg_severity_per_doc - 4.5).abs() < 1e-9);
}

#[test]
fn proportions_sum_to_one_or_all_zero() {
    let w = TierWeights::default();
    let some = tier_mix(&counts(2, 5, 7), &w);
    assert!((some.capture + some.drift + some.warning - 1.0).abs() < 1e-9);
    assert!(some.severity_mix >= w.min() && some.severity_mix <= w.max());

    let none = tier_mix(&TierCounts::default(), &w);
    assert_eq!((none.capture, none.drift, none.warning), (0.0, 0.0, 0.0));
    assert_eq!(none.severity_mix, 0.0);

    let all_capture = tier_mix(&counts(4, 0, 0), &w);
    assert_eq!(all_capture.severity_mix, w.max());
}

#[test]
fn empty_week_aggregates_to_zero() {
    let agg = aggregate_week(
        Category::Courts,
        monday(),
        &[],
        &TierWeights::default(),
        None,
        10,
    );
    assert_eq!(agg.document_count, 0);
    assert_eq!(agg.avg_severity_per_doc, 0.0);
    assert!(agg.top_keywords.is_empty());
}

#[test]
fn top_keywords_ranked_by_frequency() {
    let scores = vec![
        score("a", 1.0, counts(0, 2, 0), &["emergency stay", "sanctions"]),
        score("b", 1.0, counts(0, 1, 0), &["sanctions"]),
        score("c", 1.0, counts(0, 1, 0), &["court order"]),
    ];
    let agg = aggregate_week(
        Category::Courts,
        monday(),
        &scores,
        &TierWeights::default(),
        None,
        2,
    );
    assert_eq!(agg.top_keywords, vec!["sanctions", "court order"]);
}

#[test]
fn supplied_top_keywords_override_in_memory_count() {
    let scores = vec![score("a", 1.0, counts(0, 1, 0), &["sanctions"])];
    let agg = aggregate_week(
        Category::Courts,
        monday(),
        &scores,
        &TierWeights::default(),
        Some(vec![]),
        10,
    );
    assert!(agg.top_keywords.is_empty());
}

#[test]
fn other_weeks_and_categories_are_ignored() {
    let mut stray = score("x", 50.0, counts(1, 0, 0), &[]);
    stray.week_of = monday() + Duration::days(7);
    let mut other = score("y", 50.0, counts(1, 0, 0), &[]);
    other.category = Category::Fiscal;
    let scores = vec![score("a", 2.0, counts(0, 1, 0), &[]), stray, other];

    let agg = aggregate_week(
        Category::Courts,
        monday(),
        &scores,
        &TierWeights::default(),
        None,
        10,
    );
    assert_eq!(agg.document_count, 1);
    assert_eq!(agg.total_severity, 2.0);
}

// ============================================================
// Baseline
// ============================================================

#[test]
fn baseline_uses_sample_stddev_over_weeks_in_range() {
    let period = BaselinePeriod::new(
        "baseline_2024",
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
    );
    let aggregates = vec![
        weekly(monday(), 10.0, 2, 1.0),
        weekly(monday() + Duration::days(7), 20.0, 4, 2.0),
        weekly(monday() + Duration::days(14), 30.0, 6, 3.0),
        // outside the period
        weekly(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(), 999.0, 99, 4.0),
    ];

    let b = compute_baseline(&period, Category::Courts, &aggregates, &[]);
    assert_eq!(b.baseline_id, "baseline_2024");
    assert_eq!(b.week_count, 3);
    assert!((b.avg_weekly_severity - 20.0).abs() < 1e-9);
    assert!((b.stddev_weekly_severity - 10.0).abs() < 1e-9);
    assert!((b.avg_weekly_doc_count - 4.0).abs() < 1e-9);
    assert!((b.avg_severity_mix - 2.0).abs() < 1e-9);
    assert!(b.embedding_centroid.is_none());
    assert!(b.drift_noise_floor.is_none());
}

#[test]
fn centroid_is_mean_of_documents_not_of_weeks() {
    // Week 1 has three documents at [1, 0], week 2 has one at [0, 1].
    // Document mean: [0.75, 0.25]. Mean of weekly centroids would be [0.5, 0.5].
    let w1 = monday();
    let w2 = monday() + Duration::days(7);
    let embeddings = vec![
        emb("a", w1, vec![1.0, 0.0]),
        emb("b", w1, vec![1.0, 0.0]),
        emb("c", w1, vec![1.0, 0.0]),
        emb("d", w2, vec![0.0, 1.0]),
    ];
    let centroid = document_centroid(&embeddings).unwrap();
    assert!((centroid[0] - 0.75).abs() < 1e-9);
    assert!((centroid[1] - 0.25).abs() < 1e-9);
}

#[test]
fn noise_floor_needs_two_weeks() {
    let one_week = vec![emb("a", monday(), vec![1.0, 0.0])];
    assert!(drift_noise_floor(&one_week).is_none());
    assert!(document_centroid(&one_week).is_some());
}

#[test]
fn noise_floor_is_mean_plus_stddev_of_consecutive_distances() {
    let weeks: Vec<NaiveDate> = (0..3).map(|i| monday() + Duration::days(7 * i)).collect();
    let vectors = [vec![1.0, 0.0], vec![1.0, 1.0], vec![0.0, 1.0]];
    // Deliberately out of order: the floor must sort by week
    let embeddings = vec![
        emb("c", weeks[2], vectors[2].clone()),
        emb("a", weeks[0], vectors[0].clone()),
        emb("b", weeks[1], vectors[1].clone()),
    ];

    let d1 = cosine_distance(&vectors[0], &vectors[1]);
    let d2 = cosine_distance(&vectors[1], &vectors[2]);
    let expected = mean(&[d1, d2]) + sample_stddev(&[d1, d2]);

    let floor = drift_noise_floor(&embeddings).unwrap();
    assert!((floor - expected).abs() < 1e-9);
    // Both steps are 45 degrees, so the distances are equal and stddev is 0
    assert!((floor - d1).abs() < 1e-9);
}
