// elve_sim — 2D voxel pathing and Elve locomotion.
//
// This crate contains the simulation side of the Elves: the voxel grid, the
// per-cell connectivity derived from it, the movement graph searched by
// `elve_pathfinder`, the locomotion state machine that moves an agent across
// floors, walls, and ceilings, and a small tick-driven simulation shell with
// commands, events, and the plant-seed task. It has no rendering or engine
// dependencies and runs headless.
//
// Module overview:
// - `types.rs`:        CellPos, VoxelType catalogue, Surface, Facing, ElveId.
// - `grid.rs`:         Dense 2D voxel grid, bounds checks, ASCII fixtures.
// - `connectivity.rs`: Eight-bit movement record per cell, full (parallel) and
//                      incremental 3x3 recompute.
// - `world.rs`:        Grid + connectivity kept in sync; edits return VoxelChange.
// - `nav.rs`:          MovementGraph (SearchGraph impl), MovementKind, MoveEdge.
// - `pathfinding.rs`:  Pathing: world-level route and nearest-match queries.
// - `body.rs`:         Fixed-point agent position, surface, facing, AnimClip.
// - `locomotion.rs`:   Per-agent state machine (walk, climb, ledge, ...).
// - `follower.rs`:     PathFollower: drives locomotion one path edge at a time.
// - `elve.rs`:         Elve agent wrapper with fault isolation.
// - `task.rs`:         Plant-seed task data and plantability rules.
// - `command.rs`:      SimCommand / SimAction — all sim mutations.
// - `event.rs`:        Narrative SimEvents.
// - `sim.rs`:          SimState and the tick loop.
// - `config.rs`:       GameConfig (JSON), movement costs, MotionParams.
//
// **Critical constraint: determinism.** The simulation is a pure function:
// `(state, commands) -> (new_state, events)`. Agent motion is integer
// arithmetic, collections that are iterated are `BTreeMap`s, and there is no
// randomness and no system time.

pub mod body;
pub mod command;
pub mod config;
pub mod connectivity;
pub mod elve;
pub mod event;
pub mod follower;
pub mod grid;
pub mod locomotion;
pub mod nav;
pub mod pathfinding;
pub mod sim;
pub mod task;
pub mod types;
pub mod world;
