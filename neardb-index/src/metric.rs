//! # Distance Metric
//!
//! Checked, metric-aware distance computation on top of the SIMD kernels.
//!
//! Cosine works on normalized vectors: indices store [`Distancer::prepare`]d
//! copies and prepare each query once, so the per-pair cost is a single dot
//! product. [`Distancer::distance`] accepts raw vectors and does both steps.

use neardb_core::error::{Error, Result};
use neardb_core::DistanceMetric;

use crate::simd::{dot_product, l2_distance_squared, manhattan_distance, normalized};

/// Metric-specific distance function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Distancer {
    metric: DistanceMetric,
}

impl Distancer {
    pub fn new(metric: DistanceMetric) -> Self {
        Self { metric }
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Distance between two raw vectors.
    ///
    /// Symmetric, non-negative, and zero for identical vectors.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        if a.len() != b.len() {
            return Err(Error::dimension_mismatch(a.len(), b.len()));
        }
        match self.metric {
            DistanceMetric::Cosine => {
                Ok(self.prepared_distance(&normalized(a), &normalized(b)))
            }
            _ => Ok(self.prepared_distance(a, b)),
        }
    }

    /// Bring a vector into the form the index stores
    pub fn prepare(&self, v: &[f32]) -> Vec<f32> {
        match self.metric {
            DistanceMetric::Cosine => normalized(v),
            DistanceMetric::L2Squared | DistanceMetric::Manhattan => v.to_vec(),
        }
    }

    /// Distance between two prepared vectors of equal length
    #[inline]
    pub fn prepared_distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self.metric {
            // Rounding can push 1 - dot slightly outside [0, 2]
            DistanceMetric::Cosine => (1.0 - dot_product(a, b)).clamp(0.0, 2.0),
            DistanceMetric::L2Squared => l2_distance_squared(a, b),
            DistanceMetric::Manhattan => manhattan_distance(a, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identity_and_opposite() {
        let d = Distancer::new(DistanceMetric::Cosine);
        let a = [1.0, 2.0, 3.0];
        let neg = [-1.0, -2.0, -3.0];
        assert!(d.distance(&a, &a).unwrap() < 1e-6);
        assert!((d.distance(&a, &neg).unwrap() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_ignores_magnitude() {
        let d = Distancer::new(DistanceMetric::Cosine);
        let a = [1.0, 0.0];
        let b = [10.0, 0.0];
        assert!(d.distance(&a, &b).unwrap() < 1e-6);
    }

    #[test]
    fn test_l2_squared_and_manhattan() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 6.0, 3.0];
        let l2 = Distancer::new(DistanceMetric::L2Squared).distance(&a, &b).unwrap();
        let l1 = Distancer::new(DistanceMetric::Manhattan).distance(&a, &b).unwrap();
        assert!((l2 - 25.0).abs() < 1e-5);
        assert!((l1 - 7.0).abs() < 1e-5);
    }

    #[test]
    fn test_dimension_mismatch() {
        let d = Distancer::new(DistanceMetric::L2Squared);
        let err = d.distance(&[1.0, 2.0], &[1.0]).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 2, actual: 1 }));
    }
}
