//! # Vector Index Traits
//!
//! Common interface for all vector index implementations.

use std::cmp::Ordering;

use neardb_core::error::{Error, Result};
use neardb_core::DistanceMetric;

/// Internal document id. Assigned in insertion order, so it doubles as the
/// tie-breaker between equal distances.
pub type DocId = u64;

/// Search result with ID and distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    pub id: DocId,
    pub distance: f32,
}

impl Eq for SearchResult {}

impl PartialOrd for SearchResult {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SearchResult {
    fn cmp(&self, other: &Self) -> Ordering {
        // Smaller distance first, then earlier insertion. In a max-heap the
        // worst candidate sits on top and is the one evicted.
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Vector index trait - implemented by Flat and Vamana indices
pub trait VectorIndex: Send + Sync {
    /// Insert a vector with given ID. Visible to searches once this returns.
    fn insert(&self, id: DocId, vector: &[f32]) -> Result<()>;

    /// Search for the `k` nearest neighbors in ascending distance order
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>>;

    /// Rank every indexed vector
    fn search_all(&self, query: &[f32]) -> Result<Vec<SearchResult>> {
        self.search(query, self.len())
    }

    /// Get the stored (prepared) vector by ID
    fn get(&self, id: DocId) -> Option<Vec<f32>>;

    fn contains(&self, id: DocId) -> bool {
        self.get(id).is_some()
    }

    /// Rebuild internal structures after bulk loading. Entries and search
    /// results for exhaustive queries stay the same.
    fn rebuild(&self) {}

    /// Number of vectors in index
    fn len(&self) -> usize;

    /// Check if empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector dimension
    fn dimension(&self) -> usize;

    fn metric(&self) -> DistanceMetric;
}

/// Index configuration
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Vector dimension
    pub dimension: usize,
    /// Distance metric
    pub metric: DistanceMetric,
}

impl IndexConfig {
    pub fn new(dimension: usize, metric: DistanceMetric) -> Self {
        Self { dimension, metric }
    }

    pub(crate) fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(Error::dimension_mismatch(self.dimension, vector.len()));
        }
        Ok(())
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dimension: 768,
            metric: DistanceMetric::Cosine,
        }
    }
}
