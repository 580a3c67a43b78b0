// elve_pathfinder — graph-agnostic best-first search.
//
// This crate knows nothing about voxels, surfaces, or agents. It searches any
// graph that implements `SearchGraph` (a node type, an edge type, and three
// small functions: outgoing edges, edge target, edge cost) and hands back a
// `Path` cursor that always yields "the next step to take", regardless of how
// the steps are stored internally.
//
// Module overview:
// - `search.rs`: `SearchGraph` trait, `PathFinder` (reusable scratch buffers),
//                `SearchError`.
// - `path.rs`:   `Path` and `Step`, the forward-traversal cursor over a result.
//
// Two end conditions are supported: a specific goal node (optionally with a
// caller-supplied heuristic that biases priority only) and an arbitrary
// predicate ("nearest node matching"). Without a heuristic the search is plain
// Dijkstra and returned paths are cost-optimal.
//
// See also: `elve_sim::nav` for the voxel movement graph that implements
// `SearchGraph`, `elve_sim::pathfinding` for the world-level entry points.
//
// **Critical constraint: determinism.** Equal-priority entries pop in
// insertion order (a monotonically increasing sequence number), and the
// visited-node map uses `rustc_hash` (fixed hasher, no random seed). The same
// graph and query always produce the same path.

pub mod path;
pub mod search;

pub use path::{Path, Step};
pub use search::{PathFinder, SearchError, SearchGraph};
