// Best-first search over any `SearchGraph`.
//
// Uses a `BinaryHeap` as a min-heap via reversed ordering (smallest priority
// is "greatest"), with `f32::total_cmp` for a total order and an insertion
// sequence number as the tiebreaker. Per-node bookkeeping (best known cost and
// the edge that achieved it) lives in an `FxHashMap` keyed by node, so the
// graph does not need dense integer node ids.
//
// There is no closed set. A popped entry whose recorded cost has since been
// beaten is stale and is skipped; any improvement re-pushes the node. With a
// zero heuristic this is Dijkstra. With a heuristic the estimate is added to
// the priority key only and never to the propagated cost, so reported costs
// stay exact even when the heuristic overestimates (paths may then be
// suboptimal, but never mis-costed).
//
// `PathFinder` owns the heap, the map, and an edge buffer, and clears rather
// than reallocates them between searches.
//
// See also: `path.rs` for the result cursor.

use crate::path::{Path, Step};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::hash::Hash;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Graph abstraction
// ---------------------------------------------------------------------------

/// A directed graph with non-negative edge costs.
pub trait SearchGraph {
    type Node: Copy + Eq + Hash;
    type Edge: Copy;

    /// Append every outgoing edge of `node` to `out`. `out` is empty on entry.
    fn edges_from(&self, node: Self::Node, out: &mut Vec<Self::Edge>);

    /// The node an edge arrives at.
    fn edge_target(&self, edge: &Self::Edge) -> Self::Node;

    /// Search cost of traversing an edge. Must be finite and non-negative.
    fn edge_cost(&self, edge: &Self::Edge) -> f32;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The frontier emptied without reaching an acceptable node.
    #[error("no path found after expanding {expanded} nodes")]
    NoPath { expanded: usize },
    /// The configured expansion budget ran out first.
    #[error("search gave up after {limit} node expansions")]
    ExpansionLimit { limit: usize },
}

// ---------------------------------------------------------------------------
// Open set
// ---------------------------------------------------------------------------

struct OpenEntry<N> {
    priority: f32,
    sequence: u64,
    cost: f32,
    node: N,
}

impl<N> PartialEq for OpenEntry<N> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<N> Eq for OpenEntry<N> {}

impl<N> PartialOrd for OpenEntry<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<N> Ord for OpenEntry<N> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap; earlier insertion wins ties.
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

struct Record<N, E> {
    cost: f32,
    came_from: Option<(N, E)>,
}

// ---------------------------------------------------------------------------
// PathFinder
// ---------------------------------------------------------------------------

/// Reusable search state. One per thread of pathing work; each call to a
/// `find_*` method is independent of the previous one.
pub struct PathFinder<N, E> {
    open: BinaryHeap<OpenEntry<N>>,
    records: FxHashMap<N, Record<N, E>>,
    edge_buf: Vec<E>,
    next_sequence: u64,
    max_expansions: Option<usize>,
    last_expansions: usize,
}

impl<N: Copy + Eq + Hash, E: Copy> Default for PathFinder<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Copy + Eq + Hash, E: Copy> PathFinder<N, E> {
    pub fn new() -> Self {
        Self {
            open: BinaryHeap::new(),
            records: FxHashMap::default(),
            edge_buf: Vec::new(),
            next_sequence: 0,
            max_expansions: None,
            last_expansions: 0,
        }
    }

    /// Cap the number of node expansions per search. `None` is unbounded.
    pub fn with_max_expansions(mut self, limit: Option<usize>) -> Self {
        self.max_expansions = limit;
        self
    }

    pub fn set_max_expansions(&mut self, limit: Option<usize>) {
        self.max_expansions = limit;
    }

    /// How many nodes the most recent search expanded.
    pub fn last_expansions(&self) -> usize {
        self.last_expansions
    }

    /// Least-cost path from `start` to `goal` (pure Dijkstra).
    pub fn find_path<G>(&mut self, graph: &G, start: N, goal: N) -> Result<Path<N, E>, SearchError>
    where
        G: SearchGraph<Node = N, Edge = E>,
    {
        self.search(graph, start, |n| n == goal, |_| 0.0)
    }

    /// Path from `start` to `goal`, ordering the frontier by cost plus
    /// `estimate(node)`. Optimal only if the estimate never overestimates.
    pub fn find_path_guided<G, H>(
        &mut self,
        graph: &G,
        start: N,
        goal: N,
        estimate: H,
    ) -> Result<Path<N, E>, SearchError>
    where
        G: SearchGraph<Node = N, Edge = E>,
        H: Fn(N) -> f32,
    {
        self.search(graph, start, |n| n == goal, estimate)
    }

    /// Least-cost path from `start` to the cheapest node satisfying
    /// `accept`. If `start` itself is accepted the path is trivial.
    pub fn find_nearest<G, P>(
        &mut self,
        graph: &G,
        start: N,
        accept: P,
    ) -> Result<Path<N, E>, SearchError>
    where
        G: SearchGraph<Node = N, Edge = E>,
        P: FnMut(N) -> bool,
    {
        self.search(graph, start, accept, |_| 0.0)
    }

    fn reset(&mut self) {
        self.open.clear();
        self.records.clear();
        self.edge_buf.clear();
        self.next_sequence = 0;
        self.last_expansions = 0;
    }

    fn push(&mut self, node: N, cost: f32, priority: f32) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.open.push(OpenEntry {
            priority,
            sequence,
            cost,
            node,
        });
    }

    fn search<G, P, H>(
        &mut self,
        graph: &G,
        start: N,
        mut accept: P,
        estimate: H,
    ) -> Result<Path<N, E>, SearchError>
    where
        G: SearchGraph<Node = N, Edge = E>,
        P: FnMut(N) -> bool,
        H: Fn(N) -> f32,
    {
        self.reset();
        self.records.insert(
            start,
            Record {
                cost: 0.0,
                came_from: None,
            },
        );
        self.push(start, 0.0, estimate(start));

        while let Some(entry) = self.open.pop() {
            let best = self.records.get(&entry.node).map_or(f32::INFINITY, |r| r.cost);
            if entry.cost > best {
                continue;
            }

            if accept(entry.node) {
                let path = self.reconstruct(start, entry.node, entry.cost);
                tracing::trace!(
                    expanded = self.last_expansions,
                    steps = path.remaining_len(),
                    cost = path.total_cost(),
                    "search succeeded"
                );
                return Ok(path);
            }

            if let Some(limit) = self.max_expansions {
                if self.last_expansions >= limit {
                    tracing::trace!(limit, "search hit expansion limit");
                    return Err(SearchError::ExpansionLimit { limit });
                }
            }
            self.last_expansions += 1;

            let mut edges = std::mem::take(&mut self.edge_buf);
            edges.clear();
            graph.edges_from(entry.node, &mut edges);
            for edge in &edges {
                let target = graph.edge_target(edge);
                let candidate = entry.cost + graph.edge_cost(edge);
                let improved = self
                    .records
                    .get(&target)
                    .is_none_or(|r| candidate < r.cost);
                if improved {
                    self.records.insert(
                        target,
                        Record {
                            cost: candidate,
                            came_from: Some((entry.node, *edge)),
                        },
                    );
                    self.push(target, candidate, candidate + estimate(target));
                }
            }
            self.edge_buf = edges;
        }

        tracing::trace!(expanded = self.last_expansions, "search exhausted frontier");
        Err(SearchError::NoPath {
            expanded: self.last_expansions,
        })
    }

    fn reconstruct(&self, start: N, goal: N, total_cost: f32) -> Path<N, E> {
        let mut reversed = Vec::new();
        let mut current = goal;
        while current != start {
            match self.records.get(&current).and_then(|r| r.came_from) {
                Some((prev, edge)) => {
                    reversed.push(Step {
                        edge,
                        node: current,
                    });
                    current = prev;
                }
                None => break,
            }
        }
        Path::from_reversed(start, reversed, total_cost)
    }
}
