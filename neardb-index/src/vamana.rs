//! # Vamana Graph Index (DiskANN)
//!
//! Approximate nearest neighbor search using a navigable small-world graph.
//!
//! ## Algorithm Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Vamana Graph Structure                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │     ┌───┐         ┌───┐         ┌───┐                       │
//! │     │ A │─────────│ B │─────────│ C │                       │
//! │     └─┬─┘         └─┬─┘         └─┬─┘                       │
//! │       │    ╲        │        ╱    │                         │
//! │     ┌─┴─┐      ╲  ┌─┴─┐  ╱      ┌─┴─┐                       │
//! │     │ D │────────│ E │────────│ F │  ← Entry Point          │
//! │     └───┘        └───┘        └───┘                         │
//! │                                                              │
//! │  • Each node has at most R neighbors (degree bound)          │
//! │  • Edges are "diverse" - not all pointing same direction     │
//! │  • Greedy search converges to nearest neighbor               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Build Process
//! 1. Initialize random R-regular graph (seeded)
//! 2. Entry point = medoid
//! 3. Two passes (alpha = 1, then configured alpha): greedy search from
//!    the medoid for every node, RobustPrune the candidates, add reverse
//!    edges and re-prune overflowing neighborhoods
//!
//! ## Search Process
//! 1. Start from entry point
//! 2. Greedy walk keeping the best L candidates
//! 3. Return top-K
//!
//! A search asking for at least as many results as there are nodes, or one
//! whose walk reached fewer than K nodes, is answered by an exhaustive scan,
//! so result cardinality and "rank everything" queries are always exact.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};

use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::debug;

use neardb_core::config::VamanaParams;
use neardb_core::error::{Error, Result};
use neardb_core::metrics::Timer;
use neardb_core::DistanceMetric;

use crate::metric::Distancer;
use crate::simd::l2_distance_squared;
use crate::traits::{DocId, SearchResult, VectorIndex};

/// Nodes processed per parallel build batch
const BUILD_BATCH: usize = 256;

/// Vamana index configuration
#[derive(Debug, Clone)]
pub struct VamanaConfig {
    /// Vector dimension
    pub dimension: usize,
    /// Distance metric
    pub metric: DistanceMetric,
    /// Max out-degree per node (R)
    pub max_degree: usize,
    /// Candidate list size during build and search (L)
    pub search_list_size: usize,
    /// Alpha parameter for RobustPrune (typically 1.2)
    pub alpha: f32,
    /// Seed for the initial random graph
    pub seed: u64,
}

impl VamanaConfig {
    pub fn from_params(dimension: usize, metric: DistanceMetric, params: &VamanaParams) -> Self {
        Self {
            dimension,
            metric,
            max_degree: params.max_degree,
            search_list_size: params.search_list_size,
            alpha: params.alpha,
            seed: params.seed,
        }
    }
}

impl Default for VamanaConfig {
    fn default() -> Self {
        Self::from_params(768, DistanceMetric::Cosine, &VamanaParams::default())
    }
}

/// Node reached during traversal
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    distance: f32,
    node: u32,
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.node.cmp(&other.node))
    }
}

/// Graph state; guarded as one unit so an insert is never half-visible
struct Graph {
    dimension: usize,
    distancer: Distancer,
    /// All vectors stored contiguously, indexed by node
    vectors: Vec<f32>,
    /// Node -> document id
    ids: Vec<DocId>,
    /// Node -> neighbor nodes
    neighbors: Vec<Vec<u32>>,
    /// Document id -> node
    positions: HashMap<DocId, u32>,
    entry_point: u32,
}

impl Graph {
    fn new(dimension: usize, distancer: Distancer) -> Self {
        Self {
            dimension,
            distancer,
            vectors: Vec::new(),
            ids: Vec::new(),
            neighbors: Vec::new(),
            positions: HashMap::new(),
            entry_point: 0,
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    fn vector(&self, node: u32) -> &[f32] {
        let start = node as usize * self.dimension;
        &self.vectors[start..start + self.dimension]
    }

    #[inline]
    fn distance_to(&self, query: &[f32], node: u32) -> f32 {
        self.distancer.prepared_distance(query, self.vector(node))
    }

    #[inline]
    fn distance_between(&self, a: u32, b: u32) -> f32 {
        self.distancer.prepared_distance(self.vector(a), self.vector(b))
    }

    /// Append a node without edges
    fn push_node(&mut self, id: DocId, prepared: &[f32]) -> Result<u32> {
        if self.positions.contains_key(&id) {
            return Err(Error::AlreadyExists { id: id.to_string() });
        }
        let node = self.len() as u32;
        self.positions.insert(id, node);
        self.vectors.extend_from_slice(prepared);
        self.ids.push(id);
        self.neighbors.push(Vec::new());
        Ok(node)
    }

    /// Node closest to the centroid
    fn find_medoid(&self) -> u32 {
        let n = self.len();
        if n == 0 {
            return 0;
        }

        let mut centroid = vec![0.0f32; self.dimension];
        for vec in self.vectors.chunks_exact(self.dimension) {
            for (c, v) in centroid.iter_mut().zip(vec.iter()) {
                *c += v;
            }
        }
        for c in centroid.iter_mut() {
            *c /= n as f32;
        }

        let mut best = Candidate { distance: f32::MAX, node: 0 };
        for node in 0..n as u32 {
            let candidate = Candidate {
                distance: l2_distance_squared(&centroid, self.vector(node)),
                node,
            };
            if candidate < best {
                best = candidate;
            }
        }
        best.node
    }

    /// Greedy beam search from the entry point, best `search_size` first
    fn greedy_search(&self, query: &[f32], search_size: usize) -> Vec<Candidate> {
        if self.len() == 0 || search_size == 0 {
            return Vec::new();
        }

        let entry = self.entry_point;
        let start = Candidate {
            distance: self.distance_to(query, entry),
            node: entry,
        };

        // Frontier (min-heap) and best-L set (max-heap, worst on top)
        let mut frontier: BinaryHeap<Reverse<Candidate>> = BinaryHeap::new();
        let mut best: BinaryHeap<Candidate> = BinaryHeap::with_capacity(search_size + 1);
        let mut visited: HashSet<u32> = HashSet::with_capacity(search_size * 4);

        visited.insert(entry);
        frontier.push(Reverse(start));
        best.push(start);

        while let Some(Reverse(current)) = frontier.pop() {
            if best.len() >= search_size
                && best.peek().is_some_and(|worst| current.distance > worst.distance)
            {
                break;
            }

            for &neighbor in &self.neighbors[current.node as usize] {
                if !visited.insert(neighbor) {
                    continue;
                }
                let candidate = Candidate {
                    distance: self.distance_to(query, neighbor),
                    node: neighbor,
                };
                if best.len() < search_size || best.peek().is_some_and(|worst| candidate < *worst) {
                    frontier.push(Reverse(candidate));
                    best.push(candidate);
                    if best.len() > search_size {
                        best.pop();
                    }
                }
            }
        }

        best.into_sorted_vec()
    }

    /// RobustPrune: select up to `max_degree` diverse neighbors for `node`.
    /// Candidate distances are distances to `node`.
    fn robust_prune(
        &self,
        node: u32,
        candidates: Vec<Candidate>,
        alpha: f32,
        max_degree: usize,
    ) -> Vec<u32> {
        let mut remaining: Vec<Candidate> =
            candidates.into_iter().filter(|c| c.node != node).collect();
        remaining.sort_unstable();
        remaining.dedup_by_key(|c| c.node);

        let mut selected: Vec<u32> = Vec::with_capacity(max_degree);
        while !remaining.is_empty() && selected.len() < max_degree {
            let best = remaining.remove(0);
            selected.push(best.node);

            // Drop candidates that `best` already covers
            remaining.retain(|c| alpha * self.distance_between(best.node, c.node) > c.distance);
        }

        selected
    }

    /// Add edge `from -> to`, re-pruning `from` if it overflows
    fn add_reverse_edge(&mut self, from: u32, to: u32, alpha: f32, max_degree: usize) {
        let current = &self.neighbors[from as usize];
        if current.contains(&to) || from == to {
            return;
        }
        if current.len() < max_degree {
            self.neighbors[from as usize].push(to);
            return;
        }

        let candidates: Vec<Candidate> = current
            .iter()
            .copied()
            .chain(std::iter::once(to))
            .map(|n| Candidate {
                distance: self.distance_between(from, n),
                node: n,
            })
            .collect();
        let pruned = self.robust_prune(from, candidates, alpha, max_degree);
        self.neighbors[from as usize] = pruned;
    }

    /// Set the out-edges of `node` and wire up the reverse edges
    fn connect(&mut self, node: u32, selected: Vec<u32>, alpha: f32, max_degree: usize) {
        for &neighbor in &selected {
            self.add_reverse_edge(neighbor, node, alpha, max_degree);
        }
        self.neighbors[node as usize] = selected;
    }

    /// Link a freshly pushed node into the graph
    fn link_incremental(&mut self, node: u32, config: &VamanaConfig) {
        if node == 0 {
            self.entry_point = 0;
            return;
        }
        let query = self.vector(node).to_vec();
        let candidates = self.greedy_search(&query, config.search_list_size);
        let selected = self.robust_prune(node, candidates, config.alpha, config.max_degree);
        self.connect(node, selected, config.alpha, config.max_degree);
    }

    /// Full Vamana construction over the nodes already pushed
    fn build_edges(&mut self, config: &VamanaConfig) {
        let n = self.len();
        if n == 0 {
            return;
        }
        let mut rng = StdRng::seed_from_u64(config.seed);

        // Random initial neighborhoods
        let degree = config.max_degree.min(n - 1);
        for i in 0..n {
            self.neighbors[i] = rand::seq::index::sample(&mut rng, n - 1, degree)
                .into_iter()
                .map(|j| (if j >= i { j + 1 } else { j }) as u32)
                .collect();
        }

        self.entry_point = self.find_medoid();

        let mut order: Vec<u32> = (0..n as u32).collect();
        order.shuffle(&mut rng);

        for alpha in [1.0, config.alpha] {
            for batch in order.chunks(BUILD_BATCH) {
                // Parallel: search + prune against a frozen graph
                let graph = &*self;
                let updates: Vec<(u32, Vec<u32>)> = batch
                    .par_iter()
                    .map(|&node| {
                        let candidates =
                            graph.greedy_search(graph.vector(node), config.search_list_size);
                        (node, graph.robust_prune(node, candidates, alpha, config.max_degree))
                    })
                    .collect();

                // Sequential: apply updates (avoids write conflicts)
                for (node, selected) in updates {
                    self.connect(node, selected, alpha, config.max_degree);
                }
            }
        }
    }

    fn exhaustive(&self, query: &[f32]) -> Vec<SearchResult> {
        (0..self.len() as u32)
            .map(|node| SearchResult {
                id: self.ids[node as usize],
                distance: self.distance_to(query, node),
            })
            .collect()
    }
}

/// Vamana graph index
pub struct VamanaIndex {
    config: VamanaConfig,
    graph: RwLock<Graph>,
}

impl VamanaIndex {
    /// Create new empty index
    pub fn new(config: VamanaConfig) -> Self {
        let graph = Graph::new(config.dimension, Distancer::new(config.metric));
        Self {
            config,
            graph: RwLock::new(graph),
        }
    }

    /// Build index from a batch of vectors (better graph than incremental)
    pub fn build(config: VamanaConfig, entries: &[(DocId, Vec<f32>)]) -> Result<Self> {
        let distancer = Distancer::new(config.metric);
        let mut graph = Graph::new(config.dimension, distancer);

        for (id, vector) in entries {
            if vector.len() != config.dimension {
                return Err(Error::dimension_mismatch(config.dimension, vector.len()));
            }
            graph.push_node(*id, &distancer.prepare(vector))?;
        }

        let timer = Timer::new("vamana_build");
        graph.build_edges(&config);
        debug!(
            nodes = graph.len(),
            elapsed_ms = timer.elapsed().as_millis() as u64,
            "Vamana graph built"
        );

        Ok(Self {
            config,
            graph: RwLock::new(graph),
        })
    }

    pub fn config(&self) -> &VamanaConfig {
        &self.config
    }

    /// Largest out-degree currently in the graph
    pub fn max_out_degree(&self) -> usize {
        self.graph
            .read()
            .neighbors
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
    }
}

impl VectorIndex for VamanaIndex {
    fn insert(&self, id: DocId, vector: &[f32]) -> Result<()> {
        if vector.len() != self.config.dimension {
            return Err(Error::dimension_mismatch(self.config.dimension, vector.len()));
        }

        let mut graph = self.graph.write();
        let prepared = graph.distancer.prepare(vector);
        let node = graph.push_node(id, &prepared)?;
        graph.link_incremental(node, &self.config);
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if query.len() != self.config.dimension {
            return Err(Error::dimension_mismatch(self.config.dimension, query.len()));
        }

        let graph = self.graph.read();
        let n = graph.len();
        if n == 0 || k == 0 {
            return Ok(Vec::new());
        }
        let query = graph.distancer.prepare(query);

        let mut results = if k >= n {
            graph.exhaustive(&query)
        } else {
            let search_size = k.max(self.config.search_list_size);
            let walked: Vec<SearchResult> = graph
                .greedy_search(&query, search_size)
                .into_iter()
                .map(|c| SearchResult {
                    id: graph.ids[c.node as usize],
                    distance: c.distance,
                })
                .collect();
            if walked.len() < k {
                // Walk got stuck in a small component
                graph.exhaustive(&query)
            } else {
                walked
            }
        };

        results.sort_unstable();
        results.truncate(k);
        Ok(results)
    }

    fn get(&self, id: DocId) -> Option<Vec<f32>> {
        let graph = self.graph.read();
        graph
            .positions
            .get(&id)
            .map(|&node| graph.vector(node).to_vec())
    }

    fn contains(&self, id: DocId) -> bool {
        self.graph.read().positions.contains_key(&id)
    }

    /// Rebuild all edges from scratch with the batch algorithm
    fn rebuild(&self) {
        let mut graph = self.graph.write();
        let timer = Timer::new("vamana_rebuild");
        graph.build_edges(&self.config);
        debug!(
            nodes = graph.len(),
            elapsed_ms = timer.elapsed().as_millis() as u64,
            "Vamana graph rebuilt"
        );
    }

    fn len(&self) -> usize {
        self.graph.read().len()
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn metric(&self) -> DistanceMetric {
        self.config.metric
    }
}
