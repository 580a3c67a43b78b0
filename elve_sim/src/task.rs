// Tasks: multi-step jobs an Elve carries out on top of path following.
//
// The only job is planting a seed. A `PlantSeed` task walks its Elve to the
// target cell, plays a timed planting action on the floor there, and then
// writes `WoodSeed` into the cell. Tasks are keyed by the Elve running them,
// so an Elve has at most one.
//
// The sim drives tasks from the outcomes of Elve ticks and from grid edits:
//
//   MovingTo --(path completed)--> Planting --(action finished)--> done
//
// and at any point an edit can cancel the task (the cell stopped being
// plantable) or fail it (the replanned path is blocked).
//
// See also: `sim.rs` for the driver, `types.rs` for `can_plant_in` and
// `can_plant_on`.
//
// **Critical constraint: determinism.** Tasks live in a `BTreeMap` keyed by
// `ElveId` and are visited in id order.

use crate::types::{CellPos, ElveId, Surface};
use crate::world::World;
use serde::{Deserialize, Serialize};

/// Failure reason when the first path to the task cell cannot be found.
pub const REASON_PATH_BLOCKED: &str = "Path is blocked";
/// Failure reason when an edit makes the remaining route impossible.
pub const REASON_PATH_BECAME_BLOCKED: &str = "Path became blocked";
pub const REASON_CANNOT_PLANT: &str = "Cannot plant there";
pub const REASON_ELVE_HALTED: &str = "Elve halted";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    PlantSeed { pos: CellPos },
}

impl TaskKind {
    /// Cell the Elve has to reach.
    pub fn location(self) -> CellPos {
        match self {
            TaskKind::PlantSeed { pos } => pos,
        }
    }

    /// Surface the work is done on.
    pub fn work_surface(self) -> Surface {
        match self {
            TaskKind::PlantSeed { .. } => Surface::Floor,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    /// Following a path to the task location.
    MovingTo,
    /// Playing the work action at the location.
    Planting,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub elve: ElveId,
    pub kind: TaskKind,
    pub state: TaskState,
}

impl Task {
    pub fn plant_seed(elve: ElveId, pos: CellPos) -> Self {
        Self {
            elve,
            kind: TaskKind::PlantSeed { pos },
            state: TaskState::MovingTo,
        }
    }

    /// Whether the task can still be carried out in the current world.
    pub fn still_possible(&self, world: &World) -> bool {
        match self.kind {
            TaskKind::PlantSeed { pos } => is_plantable(world, pos),
        }
    }
}

/// A seed fits at `pos`: the cell accepts one and the cell below can hold it.
pub fn is_plantable(world: &World, pos: CellPos) -> bool {
    let inside = world.get(pos).is_some_and(|v| v.can_plant_in());
    let below = world.get(pos.down()).is_some_and(|v| v.can_plant_on());
    inside && below
}
