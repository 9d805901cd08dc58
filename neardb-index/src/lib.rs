//! # NearDB Vector Index
//!
//! Distance metrics, certainty conversion and nearest-neighbor indices.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Vector Index Layer                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │    SIMD     │    │    Flat     │    │   Vamana    │     │
//! │  │   Kernels   │    │   Index     │    │   Graph     │     │
//! │  │ (AVX2/NEON) │    │  (Exact)    │    │   (ANN)     │     │
//! │  └─────────────┘    └─────────────┘    └─────────────┘     │
//! │         │                  │                  │              │
//! │  ┌─────────────┐           └────────┬─────────┘              │
//! │  │ Distancer / │                    │                        │
//! │  │ Certainty   │            VectorIndex Trait                │
//! │  └─────────────┘                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `simd`: SIMD-accelerated distance kernels (AVX2/FMA, NEON)
//! - `metric`: Checked, metric-aware distance (`Distancer`)
//! - `certainty`: Distance <-> certainty conversion
//! - `traits`: Common VectorIndex trait
//! - `flat`: Brute-force exact search
//! - `vamana`: DiskANN graph index

pub mod certainty;
pub mod flat;
pub mod metric;
pub mod simd;
pub mod traits;
pub mod vamana;

use neardb_core::config::{CollectionConfig, IndexKindConfig};

pub use neardb_core::{Certainty, DistanceMetric};
pub use simd::{dot_product, l2_distance_squared, manhattan_distance, normalize, normalized};

pub use certainty::CertaintyConverter;
pub use flat::FlatIndex;
pub use metric::Distancer;
pub use traits::{DocId, IndexConfig, SearchResult, VectorIndex};
pub use vamana::{VamanaConfig, VamanaIndex};

/// Create the index a collection is configured for
pub fn new_index(config: &CollectionConfig) -> Box<dyn VectorIndex> {
    match &config.index {
        IndexKindConfig::Flat => Box::new(FlatIndex::new(IndexConfig::new(
            config.dimension,
            config.metric,
        ))),
        IndexKindConfig::Vamana(params) => Box::new(VamanaIndex::new(VamanaConfig::from_params(
            config.dimension,
            config.metric,
            params,
        ))),
    }
}
