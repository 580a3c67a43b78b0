// Per-cell movement connectivity derived from the voxel grid.
//
// Every passable cell gets a `Connections` bitset recording which of the 8
// atomic moves out of it are legal: walk left/right along a floor or ceiling,
// climb up/down a wall, and the four diagonal ledge moves. Solid cells always
// have an empty set. Each record is a pure function of the solidity of the
// cell's 3x3 neighborhood; a side whose neighbor lies outside the grid
// contributes no bits at all (the edge is "absent", not a wall). The one
// exception is walking along the bottom row, which counts the grid bottom as
// a floor.
//
// The full map is built row-parallel with rayon at load. A single-cell edit
// only needs the edited cell and its 8 neighbors recomputed, which
// `recompute_around` does synchronously.
//
// See also: `grid.rs` for the voxel storage, `nav.rs` which turns these bits
// into search-graph edges, `world.rs` which keeps grid and map in sync.
//
// **Critical constraint: determinism.** The parallel build writes disjoint
// rows and reads only the immutable grid, so the result is identical to a
// sequential build.

use crate::grid::{GridError, VoxelGrid};
use crate::types::CellPos;
use rayon::prelude::*;
use std::fmt;

// ---------------------------------------------------------------------------
// Connections bitset
// ---------------------------------------------------------------------------

/// Legal atomic moves out of one cell, packed into a byte.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Connections(u8);

impl Connections {
    pub const NONE: Connections = Connections(0);
    pub const WALK_LEFT: Connections = Connections(1);
    pub const WALK_RIGHT: Connections = Connections(1 << 1);
    pub const CLIMB_UP: Connections = Connections(1 << 2);
    pub const CLIMB_DOWN: Connections = Connections(1 << 3);
    /// Diagonal up-left: mount a ledge, or climb over an upside-down one.
    pub const MOVE_UP_LEFT: Connections = Connections(1 << 4);
    pub const MOVE_UP_RIGHT: Connections = Connections(1 << 5);
    /// Diagonal down-left: drop off a ledge, or round an upside-down corner.
    pub const MOVE_DOWN_LEFT: Connections = Connections(1 << 6);
    pub const MOVE_DOWN_RIGHT: Connections = Connections(1 << 7);

    /// Every bit with the cell offset its move leads to.
    pub const DELTAS: [(Connections, i32, i32); 8] = [
        (Connections::WALK_LEFT, -1, 0),
        (Connections::WALK_RIGHT, 1, 0),
        (Connections::CLIMB_UP, 0, 1),
        (Connections::CLIMB_DOWN, 0, -1),
        (Connections::MOVE_UP_LEFT, -1, 1),
        (Connections::MOVE_UP_RIGHT, 1, 1),
        (Connections::MOVE_DOWN_LEFT, -1, -1),
        (Connections::MOVE_DOWN_RIGHT, 1, -1),
    ];

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn from_bits(bits: u8) -> Self {
        Connections(bits)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Connections) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Connections) {
        self.0 |= other.0;
    }

    /// The single bit for a unit move, if `(dx, dy)` is one.
    pub fn for_delta(dx: i32, dy: i32) -> Option<Connections> {
        Self::DELTAS
            .iter()
            .find(|&&(_, ddx, ddy)| ddx == dx && ddy == dy)
            .map(|&(bit, _, _)| bit)
    }

    /// Whether the move to the neighbor at `(dx, dy)` is legal.
    pub fn allows(self, dx: i32, dy: i32) -> bool {
        Self::for_delta(dx, dy).is_some_and(|bit| self.contains(bit))
    }

    /// Offsets of every legal move, in `DELTAS` order.
    pub fn deltas(self) -> impl Iterator<Item = (i32, i32)> {
        Self::DELTAS
            .into_iter()
            .filter(move |&(bit, _, _)| self.contains(bit))
            .map(|(_, dx, dy)| (dx, dy))
    }
}

impl std::ops::BitOr for Connections {
    type Output = Connections;

    fn bitor(self, rhs: Connections) -> Connections {
        Connections(self.0 | rhs.0)
    }
}

impl fmt::Debug for Connections {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [&str; 8] = [
            "WalkLeft",
            "WalkRight",
            "ClimbUp",
            "ClimbDown",
            "MoveUpLeft",
            "MoveUpRight",
            "MoveDownLeft",
            "MoveDownRight",
        ];
        let set: Vec<&str> = NAMES
            .iter()
            .enumerate()
            .filter(|(i, _)| self.0 & (1 << i) != 0)
            .map(|(_, n)| *n)
            .collect();
        write!(f, "Connections[{}]", set.join("|"))
    }
}

// ---------------------------------------------------------------------------
// Per-cell analysis
// ---------------------------------------------------------------------------

/// Derive the connection bits of one cell from the current grid.
///
/// Cells outside the grid and solid cells get `Connections::NONE`.
pub fn compute_connections(grid: &VoxelGrid, pos: CellPos) -> Connections {
    if !grid.is_open(pos) {
        return Connections::NONE;
    }

    let mut conn = Connections::NONE;
    let up_open = grid.is_open(pos.up());
    let down_open = grid.is_open(pos.down());
    let up_solid = grid.is_solid(pos.up());
    let down_solid = grid.is_solid(pos.down());
    let at_bottom = pos.y == 0;

    for (dx, walk, up_diag, down_diag) in [
        (
            -1,
            Connections::WALK_LEFT,
            Connections::MOVE_UP_LEFT,
            Connections::MOVE_DOWN_LEFT,
        ),
        (
            1,
            Connections::WALK_RIGHT,
            Connections::MOVE_UP_RIGHT,
            Connections::MOVE_DOWN_RIGHT,
        ),
    ] {
        let side = pos.offset(dx, 0);
        if !grid.in_bounds(side) {
            continue;
        }
        let upper = pos.offset(dx, 1);
        let lower = pos.offset(dx, -1);

        if grid.is_solid(side) {
            // Clinging to the wall on this side.
            if up_open && grid.is_solid(upper) {
                conn.insert(Connections::CLIMB_UP);
            }
            if down_open && grid.is_solid(lower) {
                conn.insert(Connections::CLIMB_DOWN);
            }
            if up_open && grid.is_open(upper) {
                conn.insert(up_diag);
            }
            if down_open && grid.is_open(lower) {
                conn.insert(down_diag);
            }
        } else {
            let ceiling_continues = up_solid && grid.is_solid(upper);
            let floor_continues = at_bottom || (down_solid && grid.is_solid(lower));
            if ceiling_continues || floor_continues {
                conn.insert(walk);
            }
            if up_solid && grid.is_open(upper) {
                conn.insert(up_diag);
            }
            if down_solid && grid.is_open(lower) {
                conn.insert(down_diag);
            }
        }
    }

    conn
}

// ---------------------------------------------------------------------------
// ConnectivityMap
// ---------------------------------------------------------------------------

/// One `Connections` record per grid cell, same layout as `VoxelGrid`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectivityMap {
    records: Vec<Connections>,
    width: u32,
    height: u32,
}

impl ConnectivityMap {
    /// Compute every record from scratch.
    pub fn build(grid: &VoxelGrid) -> Self {
        let width = grid.width() as usize;
        let mut records = vec![Connections::NONE; width * grid.height() as usize];
        records
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, slot) in row.iter_mut().enumerate() {
                    *slot = compute_connections(grid, CellPos::new(x as i32, y as i32));
                }
            });
        Self {
            records,
            width: grid.width(),
            height: grid.height(),
        }
    }

    fn index(&self, pos: CellPos) -> Option<usize> {
        if pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
        {
            Some(pos.x as usize + pos.y as usize * self.width as usize)
        } else {
            None
        }
    }

    /// The record for a cell, failing outside the grid.
    pub fn get(&self, pos: CellPos) -> Result<Connections, GridError> {
        self.index(pos)
            .map(|i| self.records[i])
            .ok_or(GridError::OutOfBounds {
                pos,
                width: self.width,
                height: self.height,
            })
    }

    /// The record for a cell, `NONE` outside the grid.
    pub fn connections(&self, pos: CellPos) -> Connections {
        self.index(pos).map_or(Connections::NONE, |i| self.records[i])
    }

    /// Rewrite one cell's record from the current grid.
    pub fn recompute(&mut self, grid: &VoxelGrid, pos: CellPos) -> Result<(), GridError> {
        let i = self.index(pos).ok_or_else(|| grid.out_of_bounds(pos))?;
        self.records[i] = compute_connections(grid, pos);
        Ok(())
    }

    /// Rewrite the records of `pos` and its 8 neighbors (those in bounds).
    /// Call after any change to the solidity of `pos`.
    pub fn recompute_around(&mut self, grid: &VoxelGrid, pos: CellPos) -> Result<(), GridError> {
        if self.index(pos).is_none() {
            return Err(grid.out_of_bounds(pos));
        }
        for dy in -1..=1 {
            for dx in -1..=1 {
                let p = pos.offset(dx, dy);
                if let Some(i) = self.index(p) {
                    self.records[i] = compute_connections(grid, p);
                }
            }
        }
        tracing::trace!(%pos, "recomputed connectivity around edit");
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}
