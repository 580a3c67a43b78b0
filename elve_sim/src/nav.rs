// Movement graph: the connectivity map viewed as a search graph.
//
// Nodes are plain `CellPos` values; an agent's standing context (which
// surface it clings to) is not part of the node, because the legal moves out
// of a cell depend only on the grid around it. Each set bit in a cell's
// `Connections` becomes one `MoveEdge` to the corresponding neighbor, tagged
// with a `MovementKind` that selects its cost:
//
//   walk left/right          -> Walk
//   climb up/down            -> ClimbWall
//   diagonal up (either side)   -> ClimbOverLedge
//   diagonal down (either side) -> DropDownFromLedge
//
// `MovementGraph` holds only borrows, so it always reflects the latest
// connectivity and costs nothing to construct.
//
// See also: `connectivity.rs` for the bits, `pathfinding.rs` for the searches
// run over this graph, `follower.rs` which maps each edge's delta back to a
// locomotion state.

use crate::config::MovementCosts;
use crate::connectivity::{ConnectivityMap, Connections};
use crate::types::CellPos;
use elve_pathfinder::SearchGraph;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Cost category of an atomic move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementKind {
    Walk,
    ClimbWall,
    ClimbOverLedge,
    DropDownFromLedge,
}

impl MovementKind {
    /// Category of the unit move `(dx, dy)`. `None` for the zero move and
    /// anything longer than one cell.
    pub fn from_delta(dx: i32, dy: i32) -> Option<MovementKind> {
        if dx.abs() > 1 || dy.abs() > 1 {
            return None;
        }
        match (dx, dy) {
            (0, 0) => None,
            (_, 0) => Some(MovementKind::Walk),
            (0, _) => Some(MovementKind::ClimbWall),
            (_, 1) => Some(MovementKind::ClimbOverLedge),
            _ => Some(MovementKind::DropDownFromLedge),
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MovementKind::Walk => "walk",
            MovementKind::ClimbWall => "climb",
            MovementKind::ClimbOverLedge => "climb over ledge",
            MovementKind::DropDownFromLedge => "drop from ledge",
        };
        f.write_str(name)
    }
}

/// One legal atomic move between adjacent cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveEdge {
    pub from: CellPos,
    pub to: CellPos,
    pub kind: MovementKind,
}

impl MoveEdge {
    /// `(dx, dy)` from `from` to `to`; each component is in `-1..=1`.
    pub fn delta(&self) -> (i32, i32) {
        (self.to.x - self.from.x, self.to.y - self.from.y)
    }
}

// ---------------------------------------------------------------------------
// MovementGraph
// ---------------------------------------------------------------------------

/// Read-only graph view over a `ConnectivityMap` and a cost table.
#[derive(Clone, Copy)]
pub struct MovementGraph<'a> {
    connectivity: &'a ConnectivityMap,
    costs: &'a MovementCosts,
}

impl<'a> MovementGraph<'a> {
    pub fn new(connectivity: &'a ConnectivityMap, costs: &'a MovementCosts) -> Self {
        Self {
            connectivity,
            costs,
        }
    }

    /// Every legal move out of `pos`. Empty for solid or out-of-grid cells.
    pub fn edges(&self, pos: CellPos) -> SmallVec<[MoveEdge; 8]> {
        let conn = self.connectivity.connections(pos);
        conn.deltas()
            .filter_map(|(dx, dy)| {
                let kind = MovementKind::from_delta(dx, dy)?;
                Some(MoveEdge {
                    from: pos,
                    to: pos.offset(dx, dy),
                    kind,
                })
            })
            .collect()
    }

    /// Whether `edge` is still legal under the current connectivity.
    pub fn has_edge(&self, edge: &MoveEdge) -> bool {
        let (dx, dy) = edge.delta();
        MovementKind::from_delta(dx, dy) == Some(edge.kind)
            && self.connectivity.connections(edge.from).allows(dx, dy)
    }

    pub fn cost(&self, kind: MovementKind) -> f32 {
        self.costs.cost(kind)
    }

    pub fn connections(&self, pos: CellPos) -> Connections {
        self.connectivity.connections(pos)
    }
}

impl SearchGraph for MovementGraph<'_> {
    type Node = CellPos;
    type Edge = MoveEdge;

    fn edges_from(&self, node: CellPos, out: &mut Vec<MoveEdge>) {
        out.extend(self.edges(node));
    }

    fn edge_target(&self, edge: &MoveEdge) -> CellPos {
        edge.to
    }

    fn edge_cost(&self, edge: &MoveEdge) -> f32 {
        self.costs.cost(edge.kind)
    }
}

/// Priority bias toward `target`: squared straight-line distance.
pub fn squared_euclidean(target: CellPos) -> impl Fn(CellPos) -> f32 {
    move |pos| pos.squared_distance(target) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::VoxelGrid;

    #[test]
    fn kind_from_delta() {
        assert_eq!(MovementKind::from_delta(1, 0), Some(MovementKind::Walk));
        assert_eq!(MovementKind::from_delta(-1, 0), Some(MovementKind::Walk));
        assert_eq!(MovementKind::from_delta(0, -1), Some(MovementKind::ClimbWall));
        assert_eq!(MovementKind::from_delta(-1, 1), Some(MovementKind::ClimbOverLedge));
        assert_eq!(MovementKind::from_delta(1, -1), Some(MovementKind::DropDownFromLedge));
        assert_eq!(MovementKind::from_delta(0, 0), None);
        assert_eq!(MovementKind::from_delta(2, 0), None);
    }

    #[test]
    fn edges_follow_connection_bits() {
        let grid = VoxelGrid::from_ascii("...\n...\n.##\n").unwrap();
        let map = ConnectivityMap::build(&grid);
        let costs = MovementCosts::default();
        let graph = MovementGraph::new(&map, &costs);

        let from = CellPos::new(1, 1);
        let edges = graph.edges(from);
        let targets: Vec<(CellPos, MovementKind)> = edges.iter().map(|e| (e.to, e.kind)).collect();
        assert_eq!(
            targets,
            vec![
                (CellPos::new(2, 1), MovementKind::Walk),
                (CellPos::new(0, 0), MovementKind::DropDownFromLedge),
            ]
        );
        assert!(edges.iter().all(|e| graph.has_edge(e)));
    }

    #[test]
    fn solid_cell_has_no_edges() {
        let grid = VoxelGrid::from_ascii("..\n##\n").unwrap();
        let map = ConnectivityMap::build(&grid);
        let costs = MovementCosts::default();
        let graph = MovementGraph::new(&map, &costs);
        assert!(graph.edges(CellPos::new(0, 0)).is_empty());
        assert!(graph.edges(CellPos::new(5, 5)).is_empty());
    }

    #[test]
    fn edge_cost_uses_kind_table() {
        let grid = VoxelGrid::from_ascii("..\n##\n").unwrap();
        let map = ConnectivityMap::build(&grid);
        let costs = MovementCosts {
            walk: 2.5,
            ..MovementCosts::default()
        };
        let graph = MovementGraph::new(&map, &costs);
        let edge = graph.edges(CellPos::new(0, 1))[0];
        assert_eq!(edge.kind, MovementKind::Walk);
        assert_eq!(graph.edge_cost(&edge), 2.5);
        assert_eq!(graph.edge_target(&edge), CellPos::new(1, 1));
    }

    #[test]
    fn stale_edge_is_rejected() {
        let grid = VoxelGrid::from_ascii("..\n##\n").unwrap();
        let map = ConnectivityMap::build(&grid);
        let costs = MovementCosts::default();
        let graph = MovementGraph::new(&map, &costs);
        let bogus = MoveEdge {
            from: CellPos::new(0, 1),
            to: CellPos::new(0, 0),
            kind: MovementKind::ClimbWall,
        };
        assert!(!graph.has_edge(&bogus));
    }

    #[test]
    fn heuristic_is_squared_distance() {
        let h = squared_euclidean(CellPos::new(3, 4));
        assert_eq!(h(CellPos::new(0, 0)), 25.0);
        assert_eq!(h(CellPos::new(3, 4)), 0.0);
    }
}
