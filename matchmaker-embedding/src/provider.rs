//! The embedding provider abstraction

use async_trait::async_trait;

use crate::{error::Result, types::EmbeddingVector};

/// Turns free text into a fixed-length, unit-length vector.
///
/// Implementations must be deterministic for a given text and must fail
/// with [`crate::EmbeddingError::Unavailable`] when the model cannot be used.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single piece of text
    async fn embed(&self, text: &str) -> Result<EmbeddingVector>;

    /// Model identifier (used as part of cache keys)
    fn model(&self) -> &str;

    /// Dimension of every vector this provider returns
    fn dimension(&self) -> usize;
}

/// Scale a vector to unit length in place. Zero vectors are left untouched.
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 && norm.is_finite() {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_produces_unit_length() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_leaves_zero_vector() {
        let mut v = vec![0.0; 4];
        normalize(&mut v);
        assert_eq!(v, vec![0.0; 4]);
    }
}
