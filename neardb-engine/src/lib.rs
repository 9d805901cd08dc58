//! # NearDB Engine
//!
//! Collections of objects searchable by vector similarity.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Write Path                              │
//! │                                                              │
//! │  insert(vector, props) ──> validate ──> [write lock]         │
//! │                                          │                   │
//! │                                          ▼                   │
//! │                               VectorIndex + ObjectStore      │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Read Path                               │
//! │                                                              │
//! │  QuerySpec ──> resolve vector ──> index.search ──> cutoff    │
//! │                 (near-object:        │              prefix   │
//! │                  stored vector)      ▼                │      │
//! │                               ranked (doc, dist)      ▼      │
//! │                                              RankedResult    │
//! │                                          (distance, certainty)│
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod collection;
pub mod object_store;
pub mod query;

pub use collection::{Collection, REBUILD_MIN_BATCH};
pub use object_store::{ObjectStore, StoredObject};
pub use query::{apply_cutoff, Cutoff, QueryMode, QuerySpec, RankedResult};

pub use neardb_core::{Certainty, Error, ObjectId, ObjectRecord, Properties, Result};
