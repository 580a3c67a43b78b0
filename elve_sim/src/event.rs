// Narrative events emitted by `SimState::step`.
//
// Events are output only: the sim never reads them back. Each carries the
// tick it happened on, and within a tick they appear in processing order
// (commands first, then Elves by id, then tasks by Elve id).
//
// See also: `sim.rs` for where each kind is raised, `command.rs` for the
// inputs that cause most of them.
//
// **Critical constraint: determinism.** The event list for a step is a pure
// function of the prior state and the commands.

use crate::types::{CellPos, ElveId, Surface, VoxelType};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    pub tick: u64,
    pub kind: SimEventKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SimEventKind {
    ElveSpawned {
        elve: ElveId,
        cell: CellPos,
        surface: Surface,
    },
    VoxelChanged {
        pos: CellPos,
        old: VoxelType,
        new: VoxelType,
    },
    PathCompleted {
        elve: ElveId,
        cell: CellPos,
    },
    /// A move or task path request found no route.
    PathFailed {
        elve: ElveId,
        target: CellPos,
        reason: String,
    },
    /// An edit near an Elve's path caused a fresh search.
    PathReplanned {
        elve: ElveId,
        target: CellPos,
    },
    ElveHalted {
        elve: ElveId,
        reason: String,
    },
    TaskCancelled {
        elve: ElveId,
        pos: CellPos,
    },
    TaskFailed {
        elve: ElveId,
        pos: CellPos,
        reason: String,
    },
    SeedPlanted {
        elve: ElveId,
        pos: CellPos,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization() {
        let event = SimEvent {
            tick: 12,
            kind: SimEventKind::SeedPlanted {
                elve: ElveId(3),
                pos: CellPos::new(4, 1),
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        let restored: SimEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, event);
    }
}
