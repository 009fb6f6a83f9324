use crate::article::Article;

/// Magnitudes below this are treated as zero vectors
pub const MIN_MAGNITUDE: f32 = 0.001;

pub fn magnitude(vec: &[f32]) -> f32 {
    vec.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// True when a vector is too small for cosine similarity to be defined
pub fn is_degenerate(vec: &[f32]) -> bool {
    let mag = magnitude(vec);
    !mag.is_finite() || mag < MIN_MAGNITUDE
}

/// Calculate cosine similarity directly between two vectors
///
/// # Arguments
/// * `vec1` - First vector
/// * `vec2` - Second vector
///
/// # Returns
/// * `Some(similarity)` in [-1, 1]
/// * `None` - if the dimensions differ or either vector has near-zero magnitude
pub fn cosine_similarity(vec1: &[f32], vec2: &[f32]) -> Option<f32> {
    if vec1.len() != vec2.len() || vec1.is_empty() {
        return None;
    }

    let mag1 = magnitude(vec1);
    let mag2 = magnitude(vec2);

    if mag1 < MIN_MAGNITUDE || mag2 < MIN_MAGNITUDE {
        return None;
    }

    let dot_product: f32 = vec1.iter().zip(vec2.iter()).map(|(a, b)| a * b).sum();
    Some((dot_product / (mag1 * mag2)).clamp(-1.0, 1.0))
}

/// Cosine distance (1 - similarity); `None` under the same conditions as `cosine_similarity`
pub fn cosine_distance(vec1: &[f32], vec2: &[f32]) -> Option<f32> {
    cosine_similarity(vec1, vec2).map(|s| 1.0 - s)
}

/// Mean of the given articles' embeddings, accumulated in f64
pub fn centroid<'a, I>(articles: I) -> Vec<f32>
where
    I: IntoIterator<Item = &'a Article>,
{
    let mut sum: Vec<f64> = Vec::new();
    let mut count = 0usize;
    for article in articles {
        if sum.is_empty() {
            sum = vec![0.0; article.embedding.len()];
        }
        for (acc, value) in sum.iter_mut().zip(article.embedding.iter()) {
            *acc += *value as f64;
        }
        count += 1;
    }
    if count == 0 {
        return Vec::new();
    }
    sum.into_iter().map(|v| (v / count as f64) as f32).collect()
}

/// Folds one more vector into a running mean over `previous_count` vectors.
pub fn update_running_mean(mean: &mut [f32], value: &[f32], previous_count: usize) {
    let n = (previous_count + 1) as f64;
    for (m, v) in mean.iter_mut().zip(value.iter()) {
        let current = *m as f64;
        *m = (current + (*v as f64 - current) / n) as f32;
    }
}

/// Population variance of a sample
pub fn variance(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|v| *v as f64).sum::<f64>() / n;
    (values
        .iter()
        .map(|v| (*v as f64 - mean).powi(2))
        .sum::<f64>()
        / n) as f32
}

pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().map(|v| *v as f64).sum::<f64>() / values.len() as f64) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::fixtures::article;

    #[test]
    fn test_cosine_similarity() {
        let sim = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);

        let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(sim.abs() < 1e-6);

        let sim = cosine_similarity(&[1.0, 1.0], &[-1.0, -1.0]).unwrap();
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).is_none());
        assert!(cosine_similarity(&[1.0], &[1.0, 0.0]).is_none());
        assert!(cosine_similarity(&[], &[]).is_none());
        assert!(is_degenerate(&[0.0, 0.0, 0.0]));
        assert!(is_degenerate(&[f32::NAN, 1.0]));
        assert!(!is_degenerate(&[0.5, 0.0]));
    }

    #[test]
    fn test_running_mean_matches_batch_mean() {
        let members = vec![
            article("a", vec![1.0, 0.0, 2.0], 0.0, 0),
            article("b", vec![0.0, 1.0, 4.0], 0.0, 1),
            article("c", vec![0.5, 0.5, 0.0], 0.0, 2),
        ];

        let mut running = members[0].embedding.clone();
        update_running_mean(&mut running, &members[1].embedding, 1);
        update_running_mean(&mut running, &members[2].embedding, 2);

        let batch = centroid(members.iter());
        for (r, b) in running.iter().zip(batch.iter()) {
            assert!((r - b).abs() < 1e-6);
        }
        assert!((batch[2] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_variance() {
        assert_eq!(variance(&[]), 0.0);
        assert!((variance(&[1.0, -1.0]) - 1.0).abs() < 1e-6);
        assert!((mean(&[0.5, 0.3, 0.1]) - 0.3).abs() < 1e-6);
    }
}
