//! # Certainty Conversion
//!
//! Maps a distance onto a normalized `[0, 1]` certainty and back.
//!
//! | Metric                   | certainty `c`     | complement `u`        | distance         |
//! |--------------------------|-------------------|-----------------------|------------------|
//! | bounded (cosine, `max`)  | `1 - d / max`     | `d / max`             | `max * u`        |
//! | l2-squared / manhattan   | `s / (s + d)`     | `1 / (1 + s / d)`     | `s * u / c`      |
//!
//! `s` is the configured reference scale: the distance reported as
//! certainty 0.5. Every quantity is monotone in `d`.
//!
//! Both `c` and `u` are computed straight from the `f32` distance in `f64`
//! and neither is derived from the other. Small distances live in `u`, large
//! ones in `c`, so converting a certainty produced here back to a distance
//! returns the original `f32` for every finite distance, subnormals
//! included. A certainty built from a plain number has no independent
//! complement, and converts back only as precisely as `1 - c` allows.

use neardb_core::config::CertaintyConfig;
use neardb_core::{Certainty, DistanceMetric};

/// Bidirectional distance <-> certainty mapping for one metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CertaintyConverter {
    metric: DistanceMetric,
    reference_scale: f64,
}

impl CertaintyConverter {
    pub fn new(metric: DistanceMetric, config: &CertaintyConfig) -> Self {
        Self {
            metric,
            reference_scale: config.reference_scale,
        }
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Certainty in `[0, 1]` for a distance
    #[inline]
    pub fn to_certainty(&self, distance: f32) -> Certainty {
        let d = f64::from(distance.max(0.0));
        match self.metric.max_distance() {
            Some(max) => {
                let u = d.min(f64::from(max)) / f64::from(max);
                Certainty::with_complement(1.0 - u, u)
            }
            None => {
                let s = self.reference_scale;
                // d = 0 gives s / d = inf and u = 0
                Certainty::with_complement(s / (s + d), 1.0 / (1.0 + s / d))
            }
        }
    }

    /// Distance for a certainty in `[0, 1]`
    ///
    /// Certainty 0 on an unbounded metric maps to `f32::INFINITY`.
    #[inline]
    pub fn to_distance(&self, certainty: Certainty) -> f32 {
        let c = certainty.value().clamp(0.0, 1.0);
        let u = certainty.complement().clamp(0.0, 1.0);
        let distance = match self.metric.max_distance() {
            Some(max) => f64::from(max) * u,
            None => {
                if c == 0.0 {
                    return f32::INFINITY;
                }
                self.reference_scale * u / c
            }
        };
        distance as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter(metric: DistanceMetric) -> CertaintyConverter {
        CertaintyConverter::new(metric, &CertaintyConfig::default())
    }

    #[test]
    fn test_cosine_endpoints() {
        let c = converter(DistanceMetric::Cosine);
        assert_eq!(c.to_certainty(0.0).value(), 1.0);
        assert_eq!(c.to_certainty(1.0).value(), 0.5);
        assert_eq!(c.to_certainty(2.0).value(), 0.0);
        assert_eq!(c.to_distance(Certainty::new(1.0)), 0.0);
        assert_eq!(c.to_distance(Certainty::new(0.0)), 2.0);
        assert_eq!(c.to_distance(Certainty::new(0.75)), 0.5);
    }

    #[test]
    fn test_unbounded_reference_scale() {
        let c = CertaintyConverter::new(
            DistanceMetric::L2Squared,
            &CertaintyConfig { reference_scale: 4.0 },
        );
        assert_eq!(c.to_certainty(4.0).value(), 0.5);
        assert_eq!(c.to_certainty(0.0).value(), 1.0);
        assert_eq!(c.to_certainty(0.0).complement(), 0.0);
        assert_eq!(c.to_distance(Certainty::new(0.5)), 4.0);
        assert_eq!(c.to_distance(Certainty::new(0.0)), f32::INFINITY);
        assert_eq!(c.to_certainty(f32::INFINITY).value(), 0.0);
    }

    #[test]
    fn test_negative_distance_clamped() {
        let c = converter(DistanceMetric::Cosine);
        assert_eq!(c.to_certainty(-1e-7).value(), 1.0);
        assert_eq!(c.to_certainty(-1e-7).complement(), 0.0);
    }

    #[test]
    fn test_tiny_distances_stay_distinct() {
        for metric in [
            DistanceMetric::Cosine,
            DistanceMetric::L2Squared,
            DistanceMetric::Manhattan,
        ] {
            let c = converter(metric);
            let zero = c.to_certainty(0.0);
            let tiny = c.to_certainty(1e-20);
            let small = c.to_certainty(1e-19);
            assert_eq!(tiny.value(), 1.0);
            assert!(zero > tiny, "{}", metric);
            assert!(tiny > small, "{}", metric);
        }
    }
}
