//! # Core Types
//!
//! Fundamental data structures shared by the index and the engine.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for stored objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ObjectId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for ObjectId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque property payload attached to an object.
///
/// The core never interprets it; it is stored and handed back as-is.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Object as returned by a fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub id: ObjectId,
    /// Present only when the caller asked for it
    pub vector: Option<Vec<f32>>,
    pub properties: Properties,
}

/// Distance metric types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DistanceMetric {
    /// `1 - cos(a, b)`, bounded to `[0, 2]`
    #[default]
    Cosine,
    /// Sum of squared component differences
    L2Squared,
    /// Sum of absolute component differences
    Manhattan,
}

impl DistanceMetric {
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::L2Squared => "l2-squared",
            DistanceMetric::Manhattan => "manhattan",
        }
    }

    /// Upper bound of the distance, if the metric has one
    pub fn max_distance(&self) -> Option<f32> {
        match self {
            DistanceMetric::Cosine => Some(2.0),
            DistanceMetric::L2Squared | DistanceMetric::Manhattan => None,
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Normalized `[0, 1]` similarity score, decreasing in distance.
///
/// A certainty derived from a distance also carries its complement
/// `1 - certainty`, computed directly instead of by subtraction. Near 1.0 an
/// `f64` cannot resolve small distances, so the complement is what keeps
/// them ordered and lets them convert back to the exact distance. A
/// certainty built from a plain number only knows its value, and compares
/// by value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Certainty {
    value: f64,
    complement: Option<f64>,
}

impl Certainty {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            complement: None,
        }
    }

    /// Certainty with an independently computed complement
    pub fn with_complement(value: f64, complement: f64) -> Self {
        Self {
            value,
            complement: Some(complement),
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// `1 - value`, at full precision when derived from a distance
    pub fn complement(&self) -> f64 {
        self.complement.unwrap_or(1.0 - self.value)
    }
}

impl From<f64> for Certainty {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Certainty> for f64 {
    fn from(certainty: Certainty) -> Self {
        certainty.value
    }
}

impl PartialEq for Certainty {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Certainty {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.complement, other.complement) {
            // Smaller complement means more certain
            (Some(a), Some(b)) => match b.partial_cmp(&a)? {
                Ordering::Equal => self.value.partial_cmp(&other.value),
                ord => Some(ord),
            },
            _ => self.value.partial_cmp(&other.value),
        }
    }
}

impl fmt::Display for Certainty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
