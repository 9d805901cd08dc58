//! # Collection
//!
//! A named set of objects: the object store and the vector index kept in
//! lockstep behind one `RwLock`.
//!
//! ## Concurrency
//!
//! ```text
//! insert*  ──> write lock ──> index.insert ──> store.insert ──> count check
//! query    ──> read lock  ──> resolve vector ──> index.search ──> assemble
//! fetch    ──> read lock  ──> store.fetch
//! ```
//!
//! Writers hold the lock across both structures, so a reader sees an object
//! in both or in neither. Readers run in parallel with each other.
//!
//! A store/index mismatch is an invariant violation: the collection is
//! marked corrupted and every later call fails with `IndexCorruption`.
//!
//! A batch at least as large as the collection was before it, and of at
//! least `REBUILD_MIN_BATCH` objects, asks the index to rebuild itself
//! once the batch is in.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::{debug, error, info};

use neardb_core::config::CollectionConfig;
use neardb_core::error::{Error, Result};
use neardb_core::metrics::{Metrics, Timer};
use neardb_core::{DistanceMetric, ObjectId, ObjectRecord, Properties};
use neardb_index::{new_index, CertaintyConverter, SearchResult, VectorIndex};

use crate::object_store::ObjectStore;
use crate::query::{apply_cutoff, Cutoff, QueryMode, QuerySpec, RankedResult};

/// Smallest batch that triggers an index rebuild
pub const REBUILD_MIN_BATCH: usize = 1_024;

/// Store and index, always mutated together
struct CollectionState {
    store: ObjectStore,
    index: Box<dyn VectorIndex>,
}

pub struct Collection {
    config: CollectionConfig,
    converter: CertaintyConverter,
    metrics: Metrics,
    corrupted: AtomicBool,
    state: RwLock<CollectionState>,
}

impl Collection {
    /// Create an empty collection
    pub fn new(config: CollectionConfig) -> Result<Self> {
        config.validate()?;

        let index = new_index(&config);
        let converter = CertaintyConverter::new(config.metric, &config.certainty);

        info!(
            collection = %config.name,
            dimension = config.dimension,
            metric = %config.metric,
            "Created collection"
        );

        Ok(Self {
            converter,
            metrics: Metrics::new(),
            corrupted: AtomicBool::new(false),
            state: RwLock::new(CollectionState {
                store: ObjectStore::new(),
                index,
            }),
            config,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    pub fn metric(&self) -> DistanceMetric {
        self.config.metric
    }

    pub fn converter(&self) -> &CertaintyConverter {
        &self.converter
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn len(&self) -> usize {
        self.state.read().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_corrupted(&self) -> bool {
        self.corrupted.load(Ordering::Acquire)
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Store an object under a fresh identifier
    pub fn insert(&self, vector: Vec<f32>, properties: Properties) -> Result<ObjectId> {
        self.insert_with_id(ObjectId::new(), vector, properties)
    }

    /// Store an object under a caller-chosen identifier
    pub fn insert_with_id(
        &self,
        id: ObjectId,
        vector: Vec<f32>,
        properties: Properties,
    ) -> Result<ObjectId> {
        let result = self.ensure_healthy().and_then(|()| {
            self.check_vector(&vector)?;
            let mut state = self.state.write();
            if state.store.contains(&id) {
                return Err(Error::AlreadyExists { id: id.to_string() });
            }
            self.insert_unchecked(&mut state, id, vector, properties)?;
            self.check_counts(&state)
        });

        match result {
            Ok(()) => {
                self.metrics.record_insert(1);
                debug!(collection = %self.config.name, %id, "Inserted object");
                Ok(id)
            }
            Err(e) => {
                self.metrics.record_insert_error();
                debug!(collection = %self.config.name, %id, error = %e, "Insert rejected");
                Err(e)
            }
        }
    }

    /// Store several objects at once.
    ///
    /// Every item is validated before anything is written; one bad item
    /// rejects the whole batch.
    pub fn insert_batch(
        &self,
        items: Vec<(Option<ObjectId>, Vec<f32>, Properties)>,
    ) -> Result<Vec<ObjectId>> {
        let timer = Timer::new("insert_batch");
        let count = items.len();

        let result = self.ensure_healthy().and_then(|()| {
            let items: Vec<_> = items
                .into_iter()
                .map(|(id, vector, properties)| (id.unwrap_or_default(), vector, properties))
                .collect();
            for (_, vector, _) in &items {
                self.check_vector(vector)?;
            }

            let mut state = self.state.write();
            let mut seen = HashSet::with_capacity(items.len());
            for (id, _, _) in &items {
                if state.store.contains(id) || !seen.insert(*id) {
                    return Err(Error::AlreadyExists { id: id.to_string() });
                }
            }

            let len_before = state.store.len();
            let mut ids = Vec::with_capacity(items.len());
            for (id, vector, properties) in items {
                self.insert_unchecked(&mut state, id, vector, properties)?;
                ids.push(id);
            }
            if count >= REBUILD_MIN_BATCH && count >= len_before {
                debug!(
                    collection = %self.config.name,
                    count,
                    len_before,
                    "Rebuilding index after batch"
                );
                state.index.rebuild();
            }
            self.check_counts(&state)?;
            Ok(ids)
        });
        timer.stop();

        match result {
            Ok(ids) => {
                self.metrics.record_insert(ids.len() as u64);
                debug!(collection = %self.config.name, count, "Inserted batch");
                Ok(ids)
            }
            Err(e) => {
                self.metrics.record_insert_error();
                debug!(collection = %self.config.name, count, error = %e, "Batch rejected");
                Err(e)
            }
        }
    }

    /// Write one pre-validated object into index then store
    fn insert_unchecked(
        &self,
        state: &mut CollectionState,
        id: ObjectId,
        vector: Vec<f32>,
        properties: Properties,
    ) -> Result<()> {
        let doc_id = state.store.next_doc_id();
        state.index.insert(doc_id, &vector)?;
        match state.store.insert(id, vector, properties) {
            Ok(stored) if stored == doc_id => Ok(()),
            Ok(stored) => Err(self.mark_corrupted(format!(
                "object {} stored as doc {} but indexed as doc {}",
                id, stored, doc_id
            ))),
            Err(e) => Err(self.mark_corrupted(format!(
                "object {} indexed as doc {} but not stored: {}",
                id, doc_id, e
            ))),
        }
    }

    fn check_vector(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.config.dimension {
            return Err(Error::dimension_mismatch(self.config.dimension, vector.len()));
        }
        if let Some(pos) = vector.iter().position(|x| !x.is_finite()) {
            return Err(Error::InvalidVector {
                message: format!("component {} is not finite", pos),
            });
        }
        if self.config.metric == DistanceMetric::Cosine && vector.iter().all(|&x| x == 0.0) {
            return Err(Error::InvalidVector {
                message: "zero vector has no cosine direction".into(),
            });
        }
        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn fetch_by_id(&self, id: &ObjectId, include_vector: bool) -> Result<ObjectRecord> {
        self.ensure_healthy()?;
        self.metrics.record_fetch();
        self.state.read().store.fetch(id, include_vector)
    }

    /// Rank objects by distance to `vector`
    pub fn near_vector(
        &self,
        vector: Vec<f32>,
        cutoff: Option<Cutoff>,
        limit: Option<usize>,
    ) -> Result<Vec<RankedResult>> {
        self.execute(&QuerySpec {
            cutoff,
            limit,
            ..QuerySpec::near_vector(vector)
        })
    }

    /// Rank objects by distance to the vector of object `id`
    pub fn near_object(
        &self,
        id: ObjectId,
        cutoff: Option<Cutoff>,
        limit: Option<usize>,
    ) -> Result<Vec<RankedResult>> {
        self.execute(&QuerySpec {
            cutoff,
            limit,
            ..QuerySpec::near_object(id)
        })
    }

    /// Run a query
    pub fn execute(&self, spec: &QuerySpec) -> Result<Vec<RankedResult>> {
        let timer = Timer::new("query");
        match spec.mode {
            QueryMode::NearVector(_) => self.metrics.record_near_vector(),
            QueryMode::NearObject(_) => self.metrics.record_near_object(),
        }

        let result = self.ensure_healthy().and_then(|()| self.run_query(spec));
        timer.stop();

        match &result {
            Ok(results) => {
                self.metrics.record_results(results.len() as u64);
                debug!(
                    collection = %self.config.name,
                    results = results.len(),
                    "Query completed"
                );
            }
            Err(e) => {
                self.metrics.record_query_error();
                debug!(collection = %self.config.name, error = %e, "Query failed");
            }
        }
        result
    }

    fn run_query(&self, spec: &QuerySpec) -> Result<Vec<RankedResult>> {
        spec.validate()?;

        let state = self.state.read();
        let query = match &spec.mode {
            QueryMode::NearVector(vector) => {
                self.check_vector(vector)?;
                vector.as_slice()
            }
            QueryMode::NearObject(id) => state.store.vector(id)?,
        };

        let hits = state
            .index
            .search(query, spec.candidate_count(state.index.len()))?;
        let hits = match spec.cutoff {
            Some(cutoff) => apply_cutoff(hits, cutoff, &self.converter),
            None => hits,
        };

        hits.into_iter()
            .skip(spec.offset)
            .take(spec.limit.unwrap_or(usize::MAX))
            .map(|hit| self.assemble(&state, hit, spec))
            .collect()
    }

    fn assemble(
        &self,
        state: &CollectionState,
        hit: SearchResult,
        spec: &QuerySpec,
    ) -> Result<RankedResult> {
        let (id, object) = state.store.resolve(hit.id).ok_or_else(|| {
            self.mark_corrupted(format!("index returned unknown doc {}", hit.id))
        })?;

        let mut result = RankedResult::new(id, hit.distance, self.converter);
        if spec.include_properties {
            result.properties = Some(object.properties.clone());
        }
        if spec.include_vector {
            result.vector = Some(object.vector.clone());
        }
        Ok(result)
    }

    // ========================================================================
    // Integrity
    // ========================================================================

    /// Check that every stored object is indexed under its doc id and the
    /// two sides hold the same number of entries.
    pub fn verify_integrity(&self) -> Result<()> {
        self.ensure_healthy()?;
        let state = self.state.read();
        self.check_counts(&state)?;

        for (id, object) in state.store.iter() {
            if !state.index.contains(object.doc_id) {
                return Err(self.mark_corrupted(format!(
                    "object {} (doc {}) missing from index",
                    id, object.doc_id
                )));
            }
        }
        Ok(())
    }

    fn check_counts(&self, state: &CollectionState) -> Result<()> {
        let stored = state.store.len();
        let indexed = state.index.len();
        if stored != indexed {
            return Err(self.mark_corrupted(format!(
                "store holds {} objects but index holds {}",
                stored, indexed
            )));
        }
        Ok(())
    }

    fn ensure_healthy(&self) -> Result<()> {
        if self.is_corrupted() {
            return Err(Error::IndexCorruption {
                details: format!("collection '{}' is disabled", self.config.name),
            });
        }
        Ok(())
    }

    fn mark_corrupted(&self, details: String) -> Error {
        self.corrupted.store(true, Ordering::Release);
        error!(collection = %self.config.name, %details, "Index corruption detected");
        Error::IndexCorruption { details }
    }

    #[cfg(test)]
    fn with_state<R>(&self, f: impl FnOnce(&mut ObjectStore, &dyn VectorIndex) -> R) -> R {
        let mut state = self.state.write();
        let CollectionState { store, index } = &mut *state;
        f(store, &**index)
    }
}
