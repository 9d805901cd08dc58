//! # Flat Index (Brute-Force Exact Search)
//!
//! The "dumb" index that searches everything. Used for:
//! 1. Exact results (100% recall), the default for collections
//! 2. Small datasets where graph overhead isn't worth it
//! 3. Ground truth when testing graph index accuracy
//!
//! ## Architecture
//! - Vectors stored in contiguous memory (cache-friendly)
//! - Search: O(n) distance calculations, keep top-K in a bounded heap
//! - Large indices are scanned in parallel chunks and the heaps merged

use std::collections::hash_map::Entry;
use std::collections::{BinaryHeap, HashMap};

use parking_lot::RwLock;
use rayon::prelude::*;

use neardb_core::error::{Error, Result};
use neardb_core::DistanceMetric;

use crate::metric::Distancer;
use crate::traits::{DocId, IndexConfig, SearchResult, VectorIndex};

/// Below this many vectors a single-threaded scan wins
const PARALLEL_SCAN_THRESHOLD: usize = 16_384;
/// Vectors per parallel work unit
const SCAN_CHUNK: usize = 4_096;

#[derive(Default)]
struct FlatStorage {
    /// Contiguous vector storage: [v0_d0, v0_d1, ..., v0_dn, v1_d0, ...]
    vectors: Vec<f32>,
    /// Vector IDs in insertion order
    ids: Vec<DocId>,
    /// ID -> slot
    positions: HashMap<DocId, usize>,
}

/// Flat index for exact nearest neighbor search
pub struct FlatIndex {
    config: IndexConfig,
    distancer: Distancer,
    storage: RwLock<FlatStorage>,
}

impl FlatIndex {
    /// Create new flat index
    pub fn new(config: IndexConfig) -> Self {
        Self::with_capacity(config, 0)
    }

    /// Create with pre-allocated capacity
    pub fn with_capacity(config: IndexConfig, capacity: usize) -> Self {
        let dim = config.dimension;
        Self {
            distancer: Distancer::new(config.metric),
            config,
            storage: RwLock::new(FlatStorage {
                vectors: Vec::with_capacity(capacity * dim),
                ids: Vec::with_capacity(capacity),
                positions: HashMap::with_capacity(capacity),
            }),
        }
    }

    /// Top-k over a contiguous run of slots
    fn scan(
        &self,
        query: &[f32],
        vectors: &[f32],
        ids: &[DocId],
        k: usize,
    ) -> BinaryHeap<SearchResult> {
        let dim = self.config.dimension;
        // Max-heap keeps the K smallest; the worst sits on top
        let mut heap: BinaryHeap<SearchResult> = BinaryHeap::with_capacity(k + 1);

        for (vec, &id) in vectors.chunks_exact(dim).zip(ids.iter()) {
            let candidate = SearchResult {
                id,
                distance: self.distancer.prepared_distance(query, vec),
            };
            if heap.len() < k {
                heap.push(candidate);
            } else if heap.peek().is_some_and(|worst| candidate < *worst) {
                heap.pop();
                heap.push(candidate);
            }
        }

        heap
    }
}

impl VectorIndex for FlatIndex {
    fn insert(&self, id: DocId, vector: &[f32]) -> Result<()> {
        self.config.check_dimension(vector)?;
        let prepared = self.distancer.prepare(vector);

        let mut storage = self.storage.write();
        let slot = storage.ids.len();
        match storage.positions.entry(id) {
            Entry::Occupied(_) => {
                return Err(Error::AlreadyExists { id: id.to_string() });
            }
            Entry::Vacant(entry) => {
                entry.insert(slot);
            }
        }
        storage.vectors.extend_from_slice(&prepared);
        storage.ids.push(id);
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        self.config.check_dimension(query)?;

        let storage = self.storage.read();
        let n = storage.ids.len();
        if n == 0 || k == 0 {
            return Ok(Vec::new());
        }
        let k = k.min(n);
        let query = self.distancer.prepare(query);
        let dim = self.config.dimension;

        let heap = if n < PARALLEL_SCAN_THRESHOLD {
            self.scan(&query, &storage.vectors, &storage.ids, k)
        } else {
            storage
                .vectors
                .par_chunks(SCAN_CHUNK * dim)
                .zip(storage.ids.par_chunks(SCAN_CHUNK))
                .map(|(vectors, ids)| self.scan(&query, vectors, ids, k))
                .reduce(BinaryHeap::new, |mut acc, part| {
                    for candidate in part {
                        acc.push(candidate);
                        if acc.len() > k {
                            acc.pop();
                        }
                    }
                    acc
                })
        };

        // Ascending (distance, id)
        Ok(heap.into_sorted_vec())
    }

    fn get(&self, id: DocId) -> Option<Vec<f32>> {
        let storage = self.storage.read();
        let dim = self.config.dimension;
        storage.positions.get(&id).map(|&slot| {
            let start = slot * dim;
            storage.vectors[start..start + dim].to_vec()
        })
    }

    fn contains(&self, id: DocId) -> bool {
        self.storage.read().positions.contains_key(&id)
    }

    fn len(&self) -> usize {
        self.storage.read().ids.len()
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn metric(&self) -> DistanceMetric {
        self.config.metric
    }
}
