// World-level path queries.
//
// `Pathing` bundles the borrowed world and pathing config that every search
// needs, then runs `elve_pathfinder::PathFinder` over the world's
// `MovementGraph`. It is created on demand (it only borrows) and is the one
// place where the configured heuristic mode and expansion cap are applied.
//
// Failures come back as `PathError` values: out-of-bounds endpoints are
// rejected before any lookup, and an exhausted search is `Unreachable`.
// Nothing here panics or retries.
//
// See also: `nav.rs` for the graph, `follower.rs` which stores and consumes
// the resulting `MovePath`.
//
// **Critical constraint: determinism.** Searches are a pure function of the
// world state, config, and endpoints.

use crate::config::{HeuristicMode, PathingConfig};
use crate::grid::GridError;
use crate::nav::{MoveEdge, MovementGraph, squared_euclidean};
use crate::types::CellPos;
use crate::world::World;
use elve_pathfinder::{Path, PathFinder, SearchError};
use thiserror::Error;

/// A path through the movement graph.
pub type MovePath = Path<CellPos, MoveEdge>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error(transparent)]
    OutOfBounds(#[from] GridError),
    #[error("start cell {0} is solid")]
    StartBlocked(CellPos),
    #[error("no route from {start} to {target}")]
    Unreachable { start: CellPos, target: CellPos },
    #[error("no reachable cell from {start} matches")]
    NothingMatches { start: CellPos },
    #[error("path search exceeded {limit} expansions")]
    SearchLimit { limit: usize },
    #[error("agent is halted and cannot accept a path")]
    AgentHalted,
}

/// Path queries against one world with one pathing config.
pub struct Pathing<'a> {
    world: &'a World,
    config: &'a PathingConfig,
}

impl<'a> Pathing<'a> {
    pub fn new(world: &'a World, config: &'a PathingConfig) -> Self {
        Self { world, config }
    }

    pub fn graph(&self) -> MovementGraph<'a> {
        self.world.movement_graph(&self.config.costs)
    }

    fn finder(&self) -> PathFinder<CellPos, MoveEdge> {
        PathFinder::new().with_max_expansions(self.config.max_expansions)
    }

    fn check_start(&self, start: CellPos) -> Result<(), PathError> {
        let voxel = self.world.grid().try_get(start)?;
        if voxel.is_solid() {
            return Err(PathError::StartBlocked(start));
        }
        Ok(())
    }

    /// Route from `start` to `target`.
    pub fn find_path(&self, start: CellPos, target: CellPos) -> Result<MovePath, PathError> {
        self.check_start(start)?;
        self.world.grid().try_get(target)?;

        let graph = self.graph();
        let mut finder = self.finder();
        let result = match self.config.heuristic {
            HeuristicMode::Dijkstra => finder.find_path(&graph, start, target),
            HeuristicMode::SquaredEuclidean => {
                finder.find_path_guided(&graph, start, target, squared_euclidean(target))
            }
        };

        match result {
            Ok(path) => {
                tracing::debug!(
                    %start,
                    %target,
                    steps = path.remaining_len(),
                    cost = path.total_cost(),
                    expanded = finder.last_expansions(),
                    "path found"
                );
                Ok(path)
            }
            Err(SearchError::NoPath { expanded }) => {
                tracing::debug!(%start, %target, expanded, "no path");
                Err(PathError::Unreachable { start, target })
            }
            Err(SearchError::ExpansionLimit { limit }) => Err(PathError::SearchLimit { limit }),
        }
    }

    /// Route from `start` to the cheapest reachable cell satisfying `accept`.
    pub fn find_nearest(
        &self,
        start: CellPos,
        accept: impl FnMut(CellPos) -> bool,
    ) -> Result<MovePath, PathError> {
        self.check_start(start)?;
        let graph = self.graph();
        let mut finder = self.finder();
        match finder.find_nearest(&graph, start, accept) {
            Ok(path) => {
                tracing::debug!(
                    %start,
                    found = %path.destination(),
                    cost = path.total_cost(),
                    "nearest match found"
                );
                Ok(path)
            }
            Err(SearchError::NoPath { .. }) => Err(PathError::NothingMatches { start }),
            Err(SearchError::ExpansionLimit { limit }) => Err(PathError::SearchLimit { limit }),
        }
    }

    /// Whether every remaining step of `path` is still a legal move.
    pub fn is_still_valid(&self, path: &MovePath) -> bool {
        let graph = self.graph();
        path.remaining_steps().all(|step| graph.has_edge(&step.edge))
    }

    /// Sum of current edge costs over the remaining steps.
    pub fn path_cost(&self, path: &MovePath) -> f32 {
        path.remaining_steps()
            .map(|step| self.config.costs.cost(step.edge.kind))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MovementCosts;
    use crate::nav::MovementKind;
    use crate::types::VoxelType;

    fn pathing_config() -> PathingConfig {
        PathingConfig::default()
    }

    #[test]
    fn corridor_path() {
        let world = World::from_ascii(".....\n#####\n").unwrap();
        let config = pathing_config();
        let pathing = Pathing::new(&world, &config);
        let path = pathing
            .find_path(CellPos::new(0, 1), CellPos::new(4, 1))
            .unwrap();
        let nodes = path.nodes();
        assert_eq!(nodes.first(), Some(&CellPos::new(0, 1)));
        assert_eq!(nodes.last(), Some(&CellPos::new(4, 1)));
        assert_eq!(nodes.len(), 5);
        assert!(path.remaining_steps().all(|s| s.edge.kind == MovementKind::Walk));
        assert_eq!(path.total_cost(), 4.0);
        assert_eq!(pathing.path_cost(&path), 4.0);
    }

    #[test]
    fn trivial_path_to_self() {
        let world = World::from_ascii("..\n##\n").unwrap();
        let config = pathing_config();
        let pathing = Pathing::new(&world, &config);
        let path = pathing
            .find_path(CellPos::new(0, 1), CellPos::new(0, 1))
            .unwrap();
        assert!(path.is_finished());
        assert_eq!(path.nodes(), vec![CellPos::new(0, 1)]);
    }

    #[test]
    fn wall_without_route_is_unreachable() {
        // Two floor pockets split by a solid column that reaches the top.
        let world = World::from_ascii("..#..\n..#..\n#####\n").unwrap();
        let config = pathing_config();
        let pathing = Pathing::new(&world, &config);
        let err = pathing
            .find_path(CellPos::new(0, 1), CellPos::new(4, 1))
            .unwrap_err();
        assert_eq!(
            err,
            PathError::Unreachable {
                start: CellPos::new(0, 1),
                target: CellPos::new(4, 1)
            }
        );
    }

    #[test]
    fn out_of_bounds_and_blocked_endpoints() {
        let world = World::from_ascii("..\n##\n").unwrap();
        let config = pathing_config();
        let pathing = Pathing::new(&world, &config);
        assert!(matches!(
            pathing.find_path(CellPos::new(-1, 1), CellPos::new(1, 1)),
            Err(PathError::OutOfBounds(_))
        ));
        assert!(matches!(
            pathing.find_path(CellPos::new(0, 1), CellPos::new(0, 9)),
            Err(PathError::OutOfBounds(_))
        ));
        assert_eq!(
            pathing.find_path(CellPos::new(0, 0), CellPos::new(1, 1)),
            Err(PathError::StartBlocked(CellPos::new(0, 0)))
        );
    }

    #[test]
    fn ledge_cost_changes_route() {
        // Two ledge hops reach the upper gallery directly; the alternative
        // is walk, climb, climb, walk along the outer shaft.
        let world = World::from_ascii(
            "#######\n\
             #.....#\n\
             #.###.#\n\
             #.....#\n\
             #######\n",
        )
        .unwrap();
        let start = CellPos::new(2, 1);
        let target = CellPos::new(2, 3);

        let uniform = PathingConfig::default();
        let pathing = Pathing::new(&world, &uniform);
        let short = pathing.find_path(start, target).unwrap();
        assert_eq!(short.total_cost(), 2.0);
        assert!(
            short
                .remaining_steps()
                .all(|s| s.edge.kind == MovementKind::ClimbOverLedge)
        );

        let pricey = PathingConfig {
            costs: MovementCosts {
                climb_over_ledge: 50.0,
                ..MovementCosts::default()
            },
            ..PathingConfig::default()
        };
        let pathing = Pathing::new(&world, &pricey);
        let long = pathing.find_path(start, target).unwrap();
        assert_eq!(long.total_cost(), 4.0);
        assert!(
            long.remaining_steps()
                .all(|s| s.edge.kind != MovementKind::ClimbOverLedge)
        );
        assert_eq!(pathing.path_cost(&long), long.total_cost());
    }

    #[test]
    fn nearest_planting_spot() {
        let world = World::from_ascii("....\nD#.#\n").unwrap();
        let config = pathing_config();
        let pathing = Pathing::new(&world, &config);
        let grid = world.grid();
        let path = pathing
            .find_nearest(CellPos::new(3, 1), |p| {
                grid.get(p.down()) == Some(VoxelType::Dirt)
            })
            .unwrap();
        assert_eq!(path.destination(), CellPos::new(0, 1));
    }

    #[test]
    fn expansion_cap_is_reported() {
        let world = World::from_ascii("..........\n##########\n").unwrap();
        let config = PathingConfig {
            max_expansions: Some(2),
            ..PathingConfig::default()
        };
        let pathing = Pathing::new(&world, &config);
        assert_eq!(
            pathing.find_path(CellPos::new(0, 1), CellPos::new(9, 1)),
            Err(PathError::SearchLimit { limit: 2 })
        );
    }

    #[test]
    fn path_invalidated_by_edit() {
        let mut world = World::from_ascii(".....\n#####\n").unwrap();
        let config = pathing_config();
        let path = Pathing::new(&world, &config)
            .find_path(CellPos::new(0, 1), CellPos::new(4, 1))
            .unwrap();
        world.set_voxel(CellPos::new(2, 1), VoxelType::Dirt).unwrap();
        assert!(!Pathing::new(&world, &config).is_still_valid(&path));
    }

    #[test]
    fn guided_search_reaches_target() {
        let world = World::from_ascii("......\n.####.\n......\n######\n").unwrap();
        let config = PathingConfig {
            heuristic: HeuristicMode::SquaredEuclidean,
            ..PathingConfig::default()
        };
        let pathing = Pathing::new(&world, &config);
        let path = pathing
            .find_path(CellPos::new(0, 1), CellPos::new(4, 3))
            .unwrap();
        assert_eq!(path.destination(), CellPos::new(4, 3));
        assert_eq!(pathing.path_cost(&path), path.total_cost());
    }
}
