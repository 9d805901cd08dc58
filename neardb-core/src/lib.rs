//! # NearDB Core
//!
//! This crate provides the fundamental building blocks for NearDB:
//! - Core data structures (object identifiers, records, properties)
//! - Error types
//! - Configuration loading and validation
//! - Metrics and logging setup
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   neardb-core                   │
//! ├─────────────────────────────────────────────────┤
//! │  • types    - Object ids, records, metrics enum │
//! │  • error    - Error handling                    │
//! │  • config   - TOML configuration                │
//! │  • metrics  - Atomic counters & timers          │
//! │  • logging  - tracing subscriber setup          │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::{Certainty, DistanceMetric, ObjectId, ObjectRecord, Properties};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
