// Vector math for embedding centroids and cosine distance.

use tracing::debug;

/// Element-wise mean of a set of vectors (their centroid).
///
/// The dimension is taken from the first vector; vectors of a different
/// length are skipped. `None` when nothing usable remains.
pub fn mean_embedding(embeddings: &[Vec<f64>]) -> Option<Vec<f64>> {
    let dim = embeddings.iter().map(Vec::len).find(|&len| len > 0)?;

    let mut sum = vec![0.0_f64; dim];
    let mut used = 0usize;
    for emb in embeddings {
        if emb.len() != dim {
            debug!(expected = dim, got = emb.len(), "Skipping embedding with mismatched dimension");
            continue;
        }
        for (acc, val) in sum.iter_mut().zip(emb) {
            *acc += val;
        }
        used += 1;
    }

    let n = used as f64;
    sum.iter_mut().for_each(|v| *v /= n);
    Some(sum)
}

/// Cosine similarity in [-1, 1]. 0.0 for empty, zero or mismatched vectors.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    let denom = mag_a * mag_b;
    if denom < f64::EPSILON {
        0.0
    } else {
        (dot / denom).clamp(-1.0, 1.0)
    }
}

/// `1 - cosine_similarity`: 0 for identical directions, 1 for orthogonal.
pub fn cosine_distance(a: &[f64], b: &[f64]) -> f64 {
    1.0 - cosine_similarity(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_of_two() {
        let mean = mean_embedding(&[vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]).unwrap();
        assert_eq!(mean, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_mean_empty_is_none() {
        assert!(mean_embedding(&[]).is_none());
    }

    #[test]
    fn test_mean_skips_mismatched() {
        let mean = mean_embedding(&[vec![2.0, 2.0], vec![1.0, 2.0, 3.0], vec![0.0, 0.0]]).unwrap();
        assert_eq!(mean, vec![1.0, 1.0]);
    }

    #[test]
    fn test_cosine_identical_and_orthogonal() {
        assert!((cosine_similarity(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]) - 1.0).abs() < 1e-10);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-10);
    }

    #[test]
    fn test_cosine_opposite_is_negative() {
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-10);
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }
}
