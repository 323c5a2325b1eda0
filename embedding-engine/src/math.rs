//! Vector helpers shared by the index, the scorer and the similarity search.

/// Min-max scaling into `[0, 1]`. Degenerate ranges and non-finite operands
/// yield `0` instead of NaN or infinity.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if !value.is_finite() || !min.is_finite() || !max.is_finite() || min == max {
        return 0.0;
    }
    (value - min) / (max - min)
}

/// Cosine similarity. A zero vector is similar to nothing: the result is `0`.
/// Vectors of unequal length are compared over their common prefix.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}

/// Element-wise mean. `None` for an empty input.
pub fn centroid<'a, I>(vectors: I) -> Option<Vec<f32>>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut sum: Vec<f64> = Vec::new();
    let mut count = 0usize;
    for vector in vectors {
        if sum.is_empty() {
            sum = vec![0.0; vector.len()];
        }
        for (acc, &value) in sum.iter_mut().zip(vector.iter()) {
            *acc += f64::from(value);
        }
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(sum.into_iter().map(|s| (s / count as f64) as f32).collect())
}
