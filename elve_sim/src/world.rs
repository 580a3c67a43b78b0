// The voxel grid paired with its connectivity map.
//
// `World` is the single owner of both and the only place that mutates the
// grid in normal operation. Every edit recomputes the 3x3 neighborhood of
// connectivity before returning, so any path search that runs afterwards,
// even later in the same tick, sees the new state. There is no deferred or
// batched recompute.
//
// Edits return a `VoxelChange` describing what changed. The sim forwards it
// to agents and tasks (path invalidation, seed-planting checks).
//
// See also: `grid.rs`, `connectivity.rs`, `nav.rs` for the movement graph
// view over this world, `sim.rs` which owns the `World` inside `SimState`.
//
// **Critical constraint: determinism.** All world modifications must go
// through deterministic sim logic, one edit at a time.

use crate::config::MovementCosts;
use crate::connectivity::{ConnectivityMap, Connections};
use crate::grid::{GridError, VoxelGrid};
use crate::nav::MovementGraph;
use crate::types::{CellPos, VoxelType};
use serde::{Deserialize, Serialize};

/// A completed single-cell edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoxelChange {
    pub pos: CellPos,
    pub old: VoxelType,
    pub new: VoxelType,
}

impl VoxelChange {
    /// Whether the edit flipped the cell between solid and passable.
    pub fn changed_solidity(&self) -> bool {
        self.old.is_solid() != self.new.is_solid()
    }
}

#[derive(Clone, Debug)]
pub struct World {
    grid: VoxelGrid,
    connectivity: ConnectivityMap,
}

impl World {
    pub fn new(grid: VoxelGrid) -> Self {
        let connectivity = ConnectivityMap::build(&grid);
        tracing::debug!(
            width = grid.width(),
            height = grid.height(),
            "built connectivity map"
        );
        Self { grid, connectivity }
    }

    pub fn from_ascii(text: &str) -> Result<Self, GridError> {
        Ok(Self::new(VoxelGrid::from_ascii(text)?))
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    pub fn connectivity(&self) -> &ConnectivityMap {
        &self.connectivity
    }

    pub fn get(&self, pos: CellPos) -> Option<VoxelType> {
        self.grid.get(pos)
    }

    pub fn is_solid(&self, pos: CellPos) -> bool {
        self.grid.is_solid(pos)
    }

    pub fn connections(&self, pos: CellPos) -> Result<Connections, GridError> {
        self.connectivity.get(pos)
    }

    /// Write one cell and bring connectivity up to date around it.
    pub fn set_voxel(&mut self, pos: CellPos, voxel: VoxelType) -> Result<VoxelChange, GridError> {
        let old = self.grid.set(pos, voxel)?;
        // Connectivity only reads solidity, so same-solidity swaps (say
        // Empty -> WoodSeed) leave it untouched.
        if old.is_solid() != voxel.is_solid() {
            self.connectivity.recompute_around(&self.grid, pos)?;
        }
        tracing::trace!(%pos, ?old, new = ?voxel, "voxel changed");
        Ok(VoxelChange {
            pos,
            old,
            new: voxel,
        })
    }

    /// Apply several edits in order. Stops at the first out-of-bounds edit;
    /// edits before it stay applied.
    pub fn set_voxels(
        &mut self,
        edits: impl IntoIterator<Item = (CellPos, VoxelType)>,
    ) -> Result<Vec<VoxelChange>, GridError> {
        edits
            .into_iter()
            .map(|(pos, voxel)| self.set_voxel(pos, voxel))
            .collect()
    }

    /// A search-graph view over the current connectivity.
    pub fn movement_graph<'a>(&'a self, costs: &'a MovementCosts) -> MovementGraph<'a> {
        MovementGraph::new(&self.connectivity, costs)
    }
}
