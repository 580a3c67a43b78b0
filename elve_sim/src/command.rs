// Commands that mutate simulation state.
//
// Everything outside the sim changes it through `SimCommand`: the sim is a
// function `(state, commands) -> (new_state, events)`. A command names the
// tick it applies on; `SimState::step` applies each command at the start of
// that tick, before any Elve moves.
//
// Actions:
// - `SetVoxel`   edit one grid cell (connectivity is recomputed before the
//                 tick's agents run).
// - `SpawnElve`  add an idle Elve clinging to a surface of an open cell.
// - `MoveElve`   path an Elve to a cell, replacing any current path or task.
// - `CancelMove` stop an Elve where it stands and drop its task.
// - `PlantSeed`  give an Elve a plant-seed task at a cell (see `task.rs`).
//
// See also: `sim.rs` for `apply_command`, `event.rs` for the events raised.

use crate::types::{CellPos, ElveId, Surface, VoxelType};
use serde::{Deserialize, Serialize};

/// An action targeting a specific simulation tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimCommand {
    pub tick: u64,
    pub action: SimAction,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SimAction {
    SetVoxel { pos: CellPos, voxel: VoxelType },
    SpawnElve { cell: CellPos, surface: Surface },
    MoveElve { elve: ElveId, target: CellPos },
    CancelMove { elve: ElveId },
    PlantSeed { elve: ElveId, pos: CellPos },
}

impl SimCommand {
    pub fn at(tick: u64, action: SimAction) -> Self {
        Self { tick, action }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_serialization() {
        let cmd = SimCommand::at(
            5,
            SimAction::SetVoxel {
                pos: CellPos::new(1, 2),
                voxel: VoxelType::Dirt,
            },
        );
        let json = serde_json::to_string(&cmd).unwrap();
        let restored: SimCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, cmd);
    }
}
