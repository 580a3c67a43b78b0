// Benchmarks for connectivity builds and long path searches.
//
// Run with: cargo bench -p elve_sim

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use elve_sim::config::{HeuristicMode, PathingConfig};
use elve_sim::connectivity::ConnectivityMap;
use elve_sim::grid::VoxelGrid;
use elve_sim::pathfinding::Pathing;
use elve_sim::types::{CellPos, VoxelType};
use elve_sim::world::World;

/// Stacked platforms every fourth row with staggered gaps, plus solid side
/// walls, so routes mix walking, climbing, and ledge moves.
fn build_grid(size: u32) -> VoxelGrid {
    let mut grid = VoxelGrid::new(size, size).unwrap();
    let n = size as i32;
    for y in 0..n {
        for x in 0..n {
            let wall = x == 0 || x == n - 1 || y == 0;
            let platform = y % 4 == 0 && (x / 6 + y / 4) % 3 != 0;
            if wall || platform {
                grid.set(CellPos::new(x, y), VoxelType::SoftRock).unwrap();
            }
        }
    }
    grid
}

fn bench_connectivity(c: &mut Criterion) {
    let mut group = c.benchmark_group("connectivity_build");
    for size in [64, 256, 512] {
        let grid = build_grid(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(ConnectivityMap::build(black_box(&grid))));
        });
    }
    group.finish();
}

fn bench_path_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("path_search");
    for size in [64, 256] {
        let world = World::new(build_grid(size));
        let start = CellPos::new(1, 1);
        let target = CellPos::new(size as i32 - 2, size as i32 - 2);
        for (name, heuristic) in [
            ("dijkstra", HeuristicMode::Dijkstra),
            ("squared_euclidean", HeuristicMode::SquaredEuclidean),
        ] {
            let config = PathingConfig {
                heuristic,
                ..PathingConfig::default()
            };
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    let pathing = Pathing::new(&world, &config);
                    black_box(pathing.find_path(black_box(start), black_box(target)).ok())
                });
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_connectivity, bench_path_search);
criterion_main!(benches);
