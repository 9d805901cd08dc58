//! # Query Model
//!
//! Request and result types for near-vector and near-object queries, and
//! the cutoff prefix filter applied to ranked index output.
//!
//! A cutoff truncates an already sorted sequence to its longest prefix whose
//! entries all pass the threshold. Both bounds are inclusive. Certainty
//! cutoffs compare in certainty space using the same conversion that
//! produces result metadata, so a result's own certainty always keeps it.

use serde::{Deserialize, Serialize};

use neardb_core::error::{Error, Result};
use neardb_core::{Certainty, ObjectId, Properties};
use neardb_index::{CertaintyConverter, SearchResult};

/// Where the query vector comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// Caller-supplied vector
    NearVector(Vec<f32>),
    /// Vector of a stored object
    NearObject(ObjectId),
}

/// Result threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cutoff {
    /// Keep `distance <= d`
    Distance(f32),
    /// Keep `certainty >= c`
    Certainty(Certainty),
}

impl Cutoff {
    pub fn validate(&self) -> Result<()> {
        match *self {
            Cutoff::Distance(d) if d.is_nan() || d < 0.0 => Err(Error::InvalidQuery {
                message: format!("distance cutoff must be a non-negative number, got {}", d),
            }),
            Cutoff::Certainty(c) if !(0.0..=1.0).contains(&c.value()) => {
                Err(Error::InvalidQuery {
                    message: format!("certainty cutoff must be within [0, 1], got {}", c),
                })
            }
            _ => Ok(()),
        }
    }

    /// Whether a result at `distance` passes this cutoff
    pub fn admits(&self, distance: f32, converter: &CertaintyConverter) -> bool {
        match *self {
            Cutoff::Distance(max) => distance <= max,
            Cutoff::Certainty(min) => converter.to_certainty(distance) >= min,
        }
    }
}

/// Truncate ascending-distance hits to the prefix passing `cutoff`
pub fn apply_cutoff(
    mut hits: Vec<SearchResult>,
    cutoff: Cutoff,
    converter: &CertaintyConverter,
) -> Vec<SearchResult> {
    let keep = hits
        .iter()
        .take_while(|hit| cutoff.admits(hit.distance, converter))
        .count();
    hits.truncate(keep);
    hits
}

/// A single query against a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub mode: QueryMode,
    #[serde(default)]
    pub cutoff: Option<Cutoff>,
    /// Max results; `None` ranks everything
    #[serde(default)]
    pub limit: Option<usize>,
    /// Results skipped after cutoff filtering
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub include_properties: bool,
    #[serde(default)]
    pub include_vector: bool,
}

impl QuerySpec {
    pub fn new(mode: QueryMode) -> Self {
        Self {
            mode,
            cutoff: None,
            limit: None,
            offset: 0,
            include_properties: false,
            include_vector: false,
        }
    }

    pub fn near_vector(vector: Vec<f32>) -> Self {
        Self::new(QueryMode::NearVector(vector))
    }

    pub fn near_object(id: ObjectId) -> Self {
        Self::new(QueryMode::NearObject(id))
    }

    pub fn with_cutoff(mut self, cutoff: Cutoff) -> Self {
        self.cutoff = Some(cutoff);
        self
    }

    pub fn with_distance(self, distance: f32) -> Self {
        self.with_cutoff(Cutoff::Distance(distance))
    }

    pub fn with_certainty(self, certainty: impl Into<Certainty>) -> Self {
        self.with_cutoff(Cutoff::Certainty(certainty.into()))
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_properties(mut self) -> Self {
        self.include_properties = true;
        self
    }

    pub fn with_vector(mut self) -> Self {
        self.include_vector = true;
        self
    }

    pub fn validate(&self) -> Result<()> {
        match self.cutoff {
            Some(cutoff) => cutoff.validate(),
            None => Ok(()),
        }
    }

    /// How many ranked hits to request from the index, given `indexed` entries
    pub(crate) fn candidate_count(&self, indexed: usize) -> usize {
        match (self.cutoff, self.limit) {
            (None, Some(limit)) => limit.saturating_add(self.offset).min(indexed),
            _ => indexed,
        }
    }
}

/// One ranked hit.
///
/// Carries the raw distance; certainty is derived from it on demand so the
/// two can never disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedResult {
    pub id: ObjectId,
    pub distance: f32,
    /// Present when the query asked for properties
    pub properties: Option<Properties>,
    /// Present when the query asked for vectors
    pub vector: Option<Vec<f32>>,
    converter: CertaintyConverter,
}

impl RankedResult {
    pub(crate) fn new(id: ObjectId, distance: f32, converter: CertaintyConverter) -> Self {
        Self {
            id,
            distance,
            properties: None,
            vector: None,
            converter,
        }
    }

    pub fn certainty(&self) -> Certainty {
        self.converter.to_certainty(self.distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neardb_core::config::CertaintyConfig;
    use neardb_core::DistanceMetric;

    fn hits(distances: &[f32]) -> Vec<SearchResult> {
        distances
            .iter()
            .enumerate()
            .map(|(i, &distance)| SearchResult {
                id: i as u64,
                distance,
            })
            .collect()
    }

    fn cosine() -> CertaintyConverter {
        CertaintyConverter::new(DistanceMetric::Cosine, &CertaintyConfig::default())
    }

    #[test]
    fn test_distance_cutoff_is_inclusive_prefix() {
        let conv = cosine();
        let kept = apply_cutoff(hits(&[0.0, 0.2, 0.2, 0.5]), Cutoff::Distance(0.2), &conv);
        assert_eq!(kept.len(), 3);

        assert!(apply_cutoff(hits(&[0.3, 0.4]), Cutoff::Distance(0.1), &conv).is_empty());
        assert_eq!(
            apply_cutoff(hits(&[0.3, 0.4]), Cutoff::Distance(5.0), &conv).len(),
            2
        );
    }

    #[test]
    fn test_certainty_cutoff_keeps_own_certainty() {
        let conv = cosine();
        let input = hits(&[0.0, 0.137, 0.5123, 0.9]);
        let third = conv.to_certainty(input[2].distance);

        let kept = apply_cutoff(input, Cutoff::Certainty(third), &conv);
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_certainty_cutoff_separates_tiny_distances() {
        let conv = CertaintyConverter::new(DistanceMetric::L2Squared, &CertaintyConfig::default());
        let input = hits(&[0.0, 1e-20, 1e-19, 0.5]);
        let second = conv.to_certainty(input[1].distance);
        assert_eq!(second.value(), 1.0);

        let kept = apply_cutoff(input.clone(), Cutoff::Certainty(second), &conv);
        assert_eq!(kept.len(), 2);

        // A plain 1.0 cannot tell these apart
        let kept = apply_cutoff(input, Cutoff::Certainty(Certainty::new(1.0)), &conv);
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_prefix_not_set_filter() {
        // Out-of-order tail is never reached once the prefix ends
        let conv = cosine();
        let kept = apply_cutoff(hits(&[0.1, 0.9, 0.05]), Cutoff::Distance(0.5), &conv);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_cutoff_validation() {
        assert!(Cutoff::Distance(0.0).validate().is_ok());
        assert!(Cutoff::Distance(-0.1).validate().is_err());
        assert!(Cutoff::Distance(f32::NAN).validate().is_err());
        assert!(Cutoff::Certainty(Certainty::new(1.0)).validate().is_ok());
        assert!(Cutoff::Certainty(Certainty::new(1.5)).validate().is_err());
        assert!(matches!(
            Cutoff::Certainty(Certainty::new(f64::NAN)).validate(),
            Err(Error::InvalidQuery { .. })
        ));
    }

    #[test]
    fn test_candidate_count() {
        let spec = QuerySpec::near_vector(vec![1.0]);
        assert_eq!(spec.candidate_count(10), 10);
        assert_eq!(spec.clone().with_limit(3).candidate_count(10), 3);
        assert_eq!(spec.clone().with_limit(3).with_offset(2).candidate_count(10), 5);
        assert_eq!(spec.clone().with_limit(usize::MAX).with_offset(2).candidate_count(10), 10);
        assert_eq!(spec.with_limit(3).with_distance(0.5).candidate_count(10), 10);
    }
}
