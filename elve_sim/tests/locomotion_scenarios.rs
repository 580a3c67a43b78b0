// End-to-end locomotion scenarios: an Elve follows a real path through a
// small ASCII world, and the test checks the exact sequence of locomotion
// states it went through and where it ended up.

use elve_sim::body::SUBCELL;
use elve_sim::config::{MotionParams, MovementCosts, PathingConfig};
use elve_sim::elve::{AgentEvent, Elve};
use elve_sim::locomotion::{LocomotionEvent, StateKind};
use elve_sim::types::{CellPos, ElveId, Surface};
use elve_sim::world::World;

/// Everything one scenario run produced.
struct Run {
    elve: Elve,
    events: Vec<LocomotionEvent>,
    surfaces: Vec<Surface>,
    ticks: u64,
}

impl Run {
    fn started(&self) -> Vec<StateKind> {
        self.events
            .iter()
            .filter_map(|e| match e {
                LocomotionEvent::Started(k) => Some(*k),
                _ => None,
            })
            .collect()
    }
}

fn run_to(world: &World, pathing: &PathingConfig, start: CellPos, surface: Surface, target: CellPos) -> Run {
    let motion = MotionParams::default();
    let mut elve = Elve::new(ElveId(0), start, surface);
    elve.start_path(world, pathing, &motion, target).unwrap();
    let mut events = elve.drain_locomotion_events();
    let mut surfaces = vec![elve.surface()];
    for ticks in 1..10_000 {
        let outcome = elve.tick(world, &motion);
        events.extend(elve.drain_locomotion_events());
        surfaces.push(elve.surface());
        match outcome {
            AgentEvent::PathCompleted => {
                return Run {
                    elve,
                    events,
                    surfaces,
                    ticks,
                };
            }
            AgentEvent::Halted => panic!("halted: {:?}", elve.fault()),
            _ => {}
        }
    }
    panic!("path never completed");
}

#[test]
fn corridor_is_four_walks_on_the_floor() {
    let world = World::from_ascii(".....\n#####\n").unwrap();
    let run = run_to(
        &world,
        &PathingConfig::default(),
        CellPos::new(0, 1),
        Surface::Floor,
        CellPos::new(4, 1),
    );
    assert_eq!(run.started(), vec![StateKind::Walk; 4]);
    let finished = run
        .events
        .iter()
        .filter(|e| **e == LocomotionEvent::Finished(StateKind::Walk))
        .count();
    assert_eq!(finished, 4);
    assert!(run.surfaces.iter().all(|s| *s == Surface::Floor));
    assert_eq!(run.elve.cell(), CellPos::new(4, 1));
    assert_eq!(run.elve.state_kind(), StateKind::Idle);
}

#[test]
fn ledge_drop_moves_to_edge_then_crosses() {
    let world = World::from_ascii("..\n#.\n").unwrap();
    let run = run_to(
        &world,
        &PathingConfig::default(),
        CellPos::new(0, 1),
        Surface::Floor,
        CellPos::new(1, 0),
    );
    assert_eq!(run.started(), vec![StateKind::MoveToEdge, StateKind::CrossLedge]);
    assert_eq!(run.elve.surface(), Surface::Floor);
    assert_eq!(run.elve.cell(), CellPos::new(1, 0));
    let offset = run.elve.body().offset;
    assert!((0..=SUBCELL).contains(&offset.x));
    assert_eq!(offset.y, 0);
}

#[test]
fn climb_wall_then_mount_ledge() {
    let world = World::from_ascii(
        "...\n\
         #..\n\
         #..\n\
         ###\n",
    )
    .unwrap();
    let run = run_to(
        &world,
        &PathingConfig::default(),
        CellPos::new(1, 1),
        Surface::Floor,
        CellPos::new(0, 3),
    );
    assert_eq!(
        run.started(),
        vec![
            StateKind::MoveToEdge,
            StateKind::ChangeSurface,
            StateKind::Climb,
            StateKind::MoveToEdge,
            StateKind::CrossLedge,
        ]
    );
    assert!(run.surfaces.contains(&Surface::LeftWall));
    assert_eq!(run.elve.cell(), CellPos::new(0, 3));
    assert_eq!(run.elve.surface(), Surface::Floor);
}

#[test]
fn floorless_stretch_is_crossed_on_the_ceiling() {
    let world = World::from_ascii(
        "#####\n\
         .....\n\
         #...#\n",
    )
    .unwrap();
    // Make the ledge detour under the bridge clearly worse than walking.
    let pathing = PathingConfig {
        costs: MovementCosts {
            climb_over_ledge: 10.0,
            drop_down_from_ledge: 10.0,
            ..MovementCosts::default()
        },
        ..PathingConfig::default()
    };
    let run = run_to(
        &world,
        &pathing,
        CellPos::new(0, 1),
        Surface::Floor,
        CellPos::new(4, 1),
    );
    assert_eq!(
        run.started(),
        vec![
            StateKind::ChangeSurface,
            StateKind::Walk,
            StateKind::Walk,
            StateKind::Walk,
            StateKind::Walk,
        ]
    );
    assert_eq!(run.elve.cell(), CellPos::new(4, 1));
    assert_eq!(run.elve.surface(), Surface::Ceiling);
    assert_eq!(run.elve.body().offset.y, SUBCELL);
}

#[test]
fn cancel_mid_walk_is_idle_next_tick() {
    let world = World::from_ascii(".....\n#####\n").unwrap();
    let motion = MotionParams::default();
    let mut elve = Elve::new(ElveId(0), CellPos::new(0, 1), Surface::Floor);
    elve.start_path(&world, &PathingConfig::default(), &motion, CellPos::new(4, 1))
        .unwrap();
    for _ in 0..3 {
        assert_eq!(elve.tick(&world, &motion), AgentEvent::Moving);
    }
    let before = elve.body().clone();
    elve.cancel_path();
    assert!(elve.follower().remaining_nodes().is_empty());
    assert_eq!(elve.tick(&world, &motion), AgentEvent::Idle);
    assert_eq!(elve.state_kind(), StateKind::Idle);
    // No rollback and no finishing the step.
    assert_eq!(elve.body().cell, before.cell);
    assert_eq!(elve.body().offset, before.offset);
}

#[test]
fn walking_time_matches_walk_speed() {
    let world = World::from_ascii("...\n###\n").unwrap();
    let run = run_to(
        &world,
        &PathingConfig::default(),
        CellPos::new(0, 1),
        Surface::Floor,
        CellPos::new(2, 1),
    );
    // Default speed is one cell per second at 100 ms ticks: two cells from
    // the middle of a cell take roughly fifteen ticks.
    assert!((14..=16).contains(&run.ticks), "took {} ticks", run.ticks);
}
