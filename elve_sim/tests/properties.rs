// Property tests over small random grids: connectivity stays consistent with
// the grid under edits, and every path the search returns is walkable.

use elve_sim::config::{HeuristicMode, PathingConfig};
use elve_sim::connectivity::{ConnectivityMap, Connections};
use elve_sim::grid::VoxelGrid;
use elve_sim::pathfinding::{PathError, Pathing};
use elve_sim::types::{CellPos, VoxelType};
use elve_sim::world::World;
use proptest::prelude::*;

const MAX_SIDE: u32 = 8;

fn grid_from(width: u32, height: u32, solid: &[bool]) -> VoxelGrid {
    let mut grid = VoxelGrid::new(width, height).unwrap();
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            if solid[(x + y * MAX_SIDE as i32) as usize] {
                grid.set(CellPos::new(x, y), VoxelType::Dirt).unwrap();
            }
        }
    }
    grid
}

fn arb_grid() -> impl Strategy<Value = VoxelGrid> {
    (
        2u32..=MAX_SIDE,
        2u32..=MAX_SIDE,
        prop::collection::vec(prop::bool::weighted(0.35), (MAX_SIDE * MAX_SIDE) as usize),
    )
        .prop_map(|(w, h, solid)| grid_from(w, h, &solid))
}

fn cells(grid: &VoxelGrid) -> impl Iterator<Item = CellPos> + '_ {
    (0..grid.height() as i32).flat_map(move |y| (0..grid.width() as i32).map(move |x| CellPos::new(x, y)))
}

fn clamp(grid: &VoxelGrid, x: u32, y: u32) -> CellPos {
    CellPos::new((x % grid.width()) as i32, (y % grid.height()) as i32)
}

proptest! {
    #[test]
    fn solid_cells_have_no_connections(grid in arb_grid()) {
        let map = ConnectivityMap::build(&grid);
        for pos in cells(&grid) {
            if grid.is_solid(pos) {
                prop_assert_eq!(map.connections(pos), Connections::NONE);
            }
        }
    }

    #[test]
    fn recompute_on_unchanged_grid_is_a_no_op(grid in arb_grid()) {
        let built = ConnectivityMap::build(&grid);
        let mut map = built.clone();
        for pos in cells(&grid) {
            map.recompute_around(&grid, pos).unwrap();
        }
        prop_assert_eq!(&map, &built);
        prop_assert_eq!(ConnectivityMap::build(&grid), built);
    }

    #[test]
    fn incremental_edits_match_full_rebuild(
        grid in arb_grid(),
        edits in prop::collection::vec((0u32..MAX_SIDE, 0u32..MAX_SIDE, any::<bool>()), 1..12),
    ) {
        let mut world = World::new(grid);
        for (x, y, solid) in edits {
            let pos = clamp(world.grid(), x, y);
            let voxel = if solid { VoxelType::HardRock } else { VoxelType::Empty };
            world.set_voxel(pos, voxel).unwrap();
        }
        prop_assert_eq!(world.connectivity(), &ConnectivityMap::build(world.grid()));
    }

    #[test]
    fn found_paths_are_walkable(
        grid in arb_grid(),
        (sx, sy, tx, ty) in (0u32..MAX_SIDE, 0u32..MAX_SIDE, 0u32..MAX_SIDE, 0u32..MAX_SIDE),
    ) {
        let start = clamp(&grid, sx, sy);
        let target = clamp(&grid, tx, ty);
        prop_assume!(!grid.is_solid(start));
        let world = World::new(grid);
        let config = PathingConfig::default();
        let pathing = Pathing::new(&world, &config);

        match pathing.find_path(start, target) {
            Ok(path) => {
                prop_assert_eq!(path.origin(), start);
                prop_assert_eq!(path.destination(), target);
                let graph = pathing.graph();
                let mut at = start;
                for step in path.remaining_steps() {
                    prop_assert_eq!(step.edge.from, at);
                    prop_assert!(graph.has_edge(&step.edge));
                    prop_assert!(!world.is_solid(step.edge.to));
                    at = step.edge.to;
                }
                prop_assert_eq!(at, target);
                prop_assert!((pathing.path_cost(&path) - path.total_cost()).abs() < 1e-3);
                prop_assert!(pathing.is_still_valid(&path));
            }
            Err(err) => prop_assert_eq!(err, PathError::Unreachable { start, target }),
        }
    }

    #[test]
    fn guided_search_never_beats_dijkstra(
        grid in arb_grid(),
        (sx, sy, tx, ty) in (0u32..MAX_SIDE, 0u32..MAX_SIDE, 0u32..MAX_SIDE, 0u32..MAX_SIDE),
    ) {
        let start = clamp(&grid, sx, sy);
        let target = clamp(&grid, tx, ty);
        prop_assume!(!grid.is_solid(start));
        let world = World::new(grid);
        let exact = PathingConfig::default();
        let guided = PathingConfig {
            heuristic: HeuristicMode::SquaredEuclidean,
            ..PathingConfig::default()
        };

        let a = Pathing::new(&world, &exact).find_path(start, target);
        let b = Pathing::new(&world, &guided).find_path(start, target);
        match (a, b) {
            (Ok(a), Ok(b)) => prop_assert!(a.total_cost() <= b.total_cost() + 1e-3),
            (Err(_), Err(_)) => {}
            (a, b) => prop_assert!(false, "reachability differs: {:?} vs {:?}", a.is_ok(), b.is_ok()),
        }
    }
}
