//! Cosine similarity calculations

use ndarray::ArrayView1;
use tracing::warn;

/// Calculate cosine similarity between two embeddings
///
/// Returns a value between -1.0 (opposite) and 1.0 (identical).
///
/// Formula: cos(θ) = (A · B) / (||A|| ||B||)
/// where:
/// - A · B is the dot product
/// - ||A|| and ||B|| are the magnitudes (L2 norms)
///
/// Zero vectors and mismatched dimensions yield 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        warn!(
            "Embedding dimension mismatch (got {} and {}), treating as dissimilar",
            a.len(),
            b.len()
        );
        return 0.0;
    }

    let a_view = ArrayView1::from(a);
    let b_view = ArrayView1::from(b);

    let dot_product = a_view.dot(&b_view) as f64;
    let norm_a = (a_view.dot(&a_view) as f64).sqrt();
    let norm_b = (b_view.dot(&b_view) as f64).sqrt();

    // Avoid division by zero
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot_product / (norm_a * norm_b);
    if similarity.is_finite() { similarity } else { 0.0 }
}

/// Semantic match score on the 0 - 100 scale
///
/// Negative similarity is clamped to 0.
pub fn similarity_score(a: &[f32], b: &[f32]) -> f64 {
    (cosine_similarity(a, b) * 100.0).clamp(0.0, 100.0)
}
