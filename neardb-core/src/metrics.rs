//! # Metrics
//!
//! Lock-free counters for collection activity.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Metrics collector
#[derive(Clone, Default)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Default)]
struct MetricsInner {
    // Write metrics
    objects_inserted: AtomicU64,
    insert_errors: AtomicU64,

    // Read metrics
    fetches: AtomicU64,
    near_vector_queries: AtomicU64,
    near_object_queries: AtomicU64,
    query_errors: AtomicU64,
    results_returned: AtomicU64,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_insert(&self, count: u64) {
        self.inner.objects_inserted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_insert_error(&self) {
        self.inner.insert_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch(&self) {
        self.inner.fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_near_vector(&self) {
        self.inner.near_vector_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_near_object(&self) {
        self.inner.near_object_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_query_error(&self) {
        self.inner.query_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_results(&self, count: u64) {
        self.inner.results_returned.fetch_add(count, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            objects_inserted: self.inner.objects_inserted.load(Ordering::Relaxed),
            insert_errors: self.inner.insert_errors.load(Ordering::Relaxed),
            fetches: self.inner.fetches.load(Ordering::Relaxed),
            near_vector_queries: self.inner.near_vector_queries.load(Ordering::Relaxed),
            near_object_queries: self.inner.near_object_queries.load(Ordering::Relaxed),
            query_errors: self.inner.query_errors.load(Ordering::Relaxed),
            results_returned: self.inner.results_returned.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub objects_inserted: u64,
    pub insert_errors: u64,
    pub fetches: u64,
    pub near_vector_queries: u64,
    pub near_object_queries: u64,
    pub query_errors: u64,
    pub results_returned: u64,
}

impl MetricsSnapshot {
    pub fn total_queries(&self) -> u64 {
        self.near_vector_queries + self.near_object_queries
    }
}

/// Timer for measuring operation duration
pub struct Timer {
    start: Instant,
    name: &'static str,
}

impl Timer {
    /// Start new timer
    pub fn new(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
        }
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop timer and log duration
    pub fn stop(self) {
        let duration = self.elapsed();
        tracing::debug!(
            name = self.name,
            duration_us = duration.as_micros() as u64,
            "Operation completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_shared_between_clones() {
        let metrics = Metrics::new();
        let clone = metrics.clone();
        clone.record_insert(3);
        clone.record_near_vector();
        metrics.record_near_object();
        metrics.record_results(7);

        let snap = metrics.snapshot();
        assert_eq!(snap.objects_inserted, 3);
        assert_eq!(snap.total_queries(), 2);
        assert_eq!(snap.results_returned, 7);
    }
}
