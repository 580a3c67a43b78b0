// Agent body: where an Elve is, which surface it clings to, and what clip
// the renderer should play.
//
// Position is an explicit integer cell plus an integer sub-cell offset on
// each axis, measured in `SUBCELL` units from the cell's bottom-left corner.
// Offsets live in the closed range `0..=SUBCELL`: both 0 and `SUBCELL` are
// "flush with a boundary of this cell", and the cell field alone decides
// which cell the agent is in. Sliding past a boundary moves the cell and
// wraps the offset, so a cell crossing is an exact integer event and there is
// never any rounding to decide it.
//
// See also: `locomotion.rs` which drives the body, `config.rs` for
// `MotionParams` (steps are already in sub-cell units).

use crate::types::{CellPos, Facing, Surface};
use serde::{Deserialize, Serialize};

/// Sub-cell units per cell.
pub const SUBCELL: i32 = 1024;

/// Middle of a cell along one axis.
pub const HALF: i32 = SUBCELL / 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

/// Position within a cell, each component in `0..=SUBCELL`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCell {
    pub x: i32,
    pub y: i32,
}

impl SubCell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn get(self, axis: Axis) -> i32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    fn get_mut(&mut self, axis: Axis) -> &mut i32 {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
        }
    }
}

/// Clip identities handed to the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimClip {
    IdleFloor,
    IdleWall,
    IdleCeiling,
    Walking,
    ClimbingWall,
    ClimbingCeiling,
    MountingLedge,
    DroppingToLedge,
    MountingLedgeUpsideDown,
    DroppingToLedgeUpsideDown,
    FloorToWall,
    FloorToCeiling,
    WallToFloor,
    WallToWall,
    WallToCeiling,
    CeilingToFloor,
    CeilingToWall,
    UseMagic(Surface),
}

impl AnimClip {
    pub fn idle(surface: Surface) -> AnimClip {
        match surface {
            Surface::Floor => AnimClip::IdleFloor,
            Surface::Ceiling => AnimClip::IdleCeiling,
            Surface::LeftWall | Surface::RightWall => AnimClip::IdleWall,
        }
    }

    /// Moving along a surface.
    pub fn travel(surface: Surface) -> AnimClip {
        match surface {
            Surface::Floor => AnimClip::Walking,
            Surface::Ceiling => AnimClip::ClimbingCeiling,
            Surface::LeftWall | Surface::RightWall => AnimClip::ClimbingWall,
        }
    }

    /// Rotating from one surface onto another.
    pub fn turn(from: Surface, to: Surface) -> AnimClip {
        use Surface::*;
        match (from, to) {
            (Floor, Ceiling) => AnimClip::FloorToCeiling,
            (Floor, _) => AnimClip::FloorToWall,
            (Ceiling, Floor) => AnimClip::CeilingToFloor,
            (Ceiling, _) => AnimClip::CeilingToWall,
            (_, Floor) => AnimClip::WallToFloor,
            (_, Ceiling) => AnimClip::WallToCeiling,
            _ => AnimClip::WallToWall,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentBody {
    pub cell: CellPos,
    pub offset: SubCell,
    pub surface: Surface,
    pub facing: Facing,
    pub clip: AnimClip,
}

impl AgentBody {
    /// A body resting in the middle of `surface` inside `cell`.
    pub fn new(cell: CellPos, surface: Surface) -> Self {
        Self {
            cell,
            offset: Self::resting_offset(surface),
            surface,
            facing: Facing::default(),
            clip: AnimClip::idle(surface),
        }
    }

    pub fn resting_offset(surface: Surface) -> SubCell {
        match surface {
            Surface::Floor => SubCell::new(HALF, 0),
            Surface::Ceiling => SubCell::new(HALF, SUBCELL),
            Surface::LeftWall => SubCell::new(0, HALF),
            Surface::RightWall => SubCell::new(SUBCELL, HALF),
        }
    }

    /// Move along `axis` by `step` units in the direction of `sign`,
    /// crossing into the neighboring cell if a boundary is passed. `step`
    /// must be in `0..=SUBCELL`, so at most one boundary is crossed.
    pub fn slide(&mut self, axis: Axis, sign: i32, step: i32) {
        let v = self.offset.get_mut(axis);
        *v += sign.signum() * step;
        let carry = if *v > SUBCELL {
            *v -= SUBCELL;
            1
        } else if *v < 0 {
            *v += SUBCELL;
            -1
        } else {
            0
        };
        match axis {
            Axis::X => self.cell.x += carry,
            Axis::Y => self.cell.y += carry,
        }
    }

    /// Move along `axis` toward `edge` (0 or `SUBCELL`) without crossing
    /// it. Returns true once flush.
    pub fn slide_toward(&mut self, axis: Axis, edge: i32, step: i32) -> bool {
        let v = self.offset.get_mut(axis);
        *v = if *v < edge {
            (*v + step).min(edge)
        } else {
            (*v - step).max(edge)
        };
        *v == edge
    }

    pub fn is_flush(&self, axis: Axis, edge: i32) -> bool {
        self.offset.get(axis) == edge
    }

    pub fn set_offset(&mut self, axis: Axis, value: i32) {
        *self.offset.get_mut(axis) = value.clamp(0, SUBCELL);
    }

    /// Continuous position in cell units, for rendering only.
    pub fn world_position(&self) -> (f32, f32) {
        (
            self.cell.x as f32 + self.offset.x as f32 / SUBCELL as f32,
            self.cell.y as f32 + self.offset.y as f32 / SUBCELL as f32,
        )
    }
}
