// Semantic drift tests: vector math and baseline comparison.

use chrono::Utc;

use driftwatch::db::models::CategoryBaseline;
use driftwatch::rules::Category;
use driftwatch::semantic::drift::{drift_from_centroid, interpret, DriftBand};
use driftwatch::semantic::vectors::{cosine_distance, cosine_similarity, mean_embedding};

fn baseline(centroid: Option<Vec<f64>>, floor: Option<f64>) -> CategoryBaseline {
    CategoryBaseline {
        baseline_id: "baseline_2024".into(),
        category: Category::Igs,
        avg_weekly_severity: 12.0,
        stddev_weekly_severity: 3.0,
        avg_weekly_doc_count: 8.0,
        avg_severity_mix: 1.5,
        week_count: 10,
        drift_noise_floor: floor,
        embedding_centroid: centroid,
        computed_at: Utc::now(),
    }
}

// ============================================================
// Vector math
// ============================================================

#[test]
fn cosine_of_identical_and_orthogonal_vectors() {
    let a = [0.3, 0.4, 0.5];
    assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-9);
    assert!(cosine_distance(&a, &a).abs() < 1e-9);

    assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-9);
    assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-9);
}

#[test]
fn cosine_of_degenerate_vectors_is_zero_similarity() {
    assert_eq!(cosine_similarity(&[], &[]), 0.0);
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
}

#[test]
fn mean_embedding_skips_mismatched_dimensions() {
    let vectors = vec![vec![2.0, 0.0], vec![0.0, 2.0, 9.0], vec![0.0, 2.0]];
    assert_eq!(mean_embedding(&vectors).unwrap(), vec![1.0, 1.0]);
    assert!(mean_embedding(&[]).is_none());
}

// ============================================================
// Drift against a baseline
// ============================================================

#[test]
fn identical_centroid_is_within_normal_range() {
    let centroid = vec![0.2, 0.7, 0.1];
    let result = drift_from_centroid(&centroid, &baseline(Some(centroid.clone()), Some(0.05)))
        .unwrap();
    assert!(result.raw_cosine_drift.abs() < 1e-9);
    assert!(result.normalized_drift.unwrap() < 1.0);
    assert!(result.interpretation.starts_with("within normal range"));
    assert_eq!(result.baseline_id, "baseline_2024");
}

#[test]
fn orthogonal_centroid_is_full_drift() {
    let result =
        drift_from_centroid(&[0.0, 1.0], &baseline(Some(vec![1.0, 0.0]), Some(0.25))).unwrap();
    assert!((result.raw_cosine_drift - 1.0).abs() < 1e-9);
    assert!((result.normalized_drift.unwrap() - 4.0).abs() < 1e-9);
    assert!(result.interpretation.starts_with("anomalous"));
}

#[test]
fn normalized_is_raw_over_noise_floor() {
    let current = [1.0, 1.0];
    let reference = vec![1.0, 0.0];
    let raw = cosine_distance(&current, &reference);
    let floor = raw / 1.5;

    let result = drift_from_centroid(&current, &baseline(Some(reference), Some(floor))).unwrap();
    assert!((result.normalized_drift.unwrap() - 1.5).abs() < 1e-9);
    assert!(result.interpretation.starts_with("elevated"));
}

#[test]
fn missing_noise_floor_reports_raw_only() {
    let result =
        drift_from_centroid(&[0.0, 1.0], &baseline(Some(vec![1.0, 0.0]), None)).unwrap();
    assert!(result.normalized_drift.is_none());
    assert!(result.interpretation.contains("noise floor not available"));

    // A zero floor is treated the same as a missing one
    let zero =
        drift_from_centroid(&[0.0, 1.0], &baseline(Some(vec![1.0, 0.0]), Some(0.0))).unwrap();
    assert!(zero.normalized_drift.is_none());
}

#[test]
fn baseline_without_centroid_gives_no_result() {
    assert!(drift_from_centroid(&[1.0, 0.0], &baseline(None, Some(0.1))).is_none());
}

#[test]
fn centroids_of_different_dimension_are_not_compared() {
    let result = drift_from_centroid(&[1.0, 0.0], &baseline(Some(vec![1.0, 0.0, 0.0]), Some(0.1)));
    assert!(result.is_none());
}

#[test]
fn interpretation_bands() {
    assert_eq!(DriftBand::from_normalized(0.5), DriftBand::WithinNormalRange);
    assert_eq!(DriftBand::from_normalized(1.2), DriftBand::Elevated);
    assert_eq!(DriftBand::from_normalized(3.0), DriftBand::Anomalous);
    assert!(interpret(0.4, Some(2.5)).contains("2.50x"));
}
