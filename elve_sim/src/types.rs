// Core types shared across the simulation.
//
// Defines the integer cell coordinate (`CellPos`), the voxel catalogue
// (`VoxelType` and its property lookups), clinging surfaces, facing, and
// agent identifiers. All types derive `Serialize` and `Deserialize` so that
// configs, commands, and events can be written out as JSON.
//
// Coordinates are 2D: x grows to the right, y grows upward, and (0, 0) is the
// bottom-left cell of the grid.
//
// **Critical constraint: determinism.** Positions are exact integers. No
// floating-point value is ever used as a cell identity or map key.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A cell in the 2D voxel grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellPos {
    pub x: i32,
    pub y: i32,
}

impl CellPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub const fn left(self) -> Self {
        self.offset(-1, 0)
    }

    pub const fn right(self) -> Self {
        self.offset(1, 0)
    }

    pub const fn up(self) -> Self {
        self.offset(0, 1)
    }

    pub const fn down(self) -> Self {
        self.offset(0, -1)
    }

    /// Squared straight-line distance. Used as the optional search bias.
    pub fn squared_distance(self, other: Self) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dy = i64::from(self.y - other.y);
        dx * dx + dy * dy
    }

    /// King-move distance: 1 for any of the 8 neighbors.
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        (self.x - other.x)
            .unsigned_abs()
            .max((self.y - other.y).unsigned_abs())
    }
}

impl Add for CellPos {
    type Output = CellPos;

    fn add(self, rhs: CellPos) -> CellPos {
        CellPos::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for CellPos {
    type Output = CellPos;

    fn sub(self, rhs: CellPos) -> CellPos {
        CellPos::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Voxel types
// ---------------------------------------------------------------------------

/// The material of a single cell in the world grid.
///
/// Solid variants block movement and provide something to stand or cling
/// on. Tree background, seeds, and empty cells are passable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoxelType {
    SoftRock,
    HardRock,
    Dirt,
    TreeWood,
    TreeLeaf,
    TreeBackground,
    WoodSeed,
    #[default]
    Empty,
}

impl VoxelType {
    pub fn is_solid(self) -> bool {
        matches!(
            self,
            VoxelType::SoftRock
                | VoxelType::HardRock
                | VoxelType::Dirt
                | VoxelType::TreeWood
                | VoxelType::TreeLeaf
        )
    }

    pub fn is_tree(self) -> bool {
        self == VoxelType::TreeWood
    }

    /// Carried items placed in the grid.
    pub fn is_item(self) -> bool {
        self == VoxelType::WoodSeed
    }

    /// Cells a growing tree may expand into.
    pub fn is_tree_fodder(self) -> bool {
        self == VoxelType::Empty
    }

    /// A seed may be placed into a cell of this type.
    pub fn can_plant_in(self) -> bool {
        self == VoxelType::Empty
    }

    /// A seed may rest on top of a cell of this type.
    pub fn can_plant_on(self) -> bool {
        matches!(
            self,
            VoxelType::SoftRock | VoxelType::HardRock | VoxelType::Dirt
        )
    }

    /// Single-character form used by ASCII grid fixtures.
    pub fn to_char(self) -> char {
        match self {
            VoxelType::SoftRock => '#',
            VoxelType::HardRock => 'H',
            VoxelType::Dirt => 'D',
            VoxelType::TreeWood => 'W',
            VoxelType::TreeLeaf => 'L',
            VoxelType::TreeBackground => 'B',
            VoxelType::WoodSeed => 'S',
            VoxelType::Empty => '.',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            '#' => VoxelType::SoftRock,
            'H' => VoxelType::HardRock,
            'D' => VoxelType::Dirt,
            'W' => VoxelType::TreeWood,
            'L' => VoxelType::TreeLeaf,
            'B' => VoxelType::TreeBackground,
            'S' => VoxelType::WoodSeed,
            '.' => VoxelType::Empty,
            _ => return None,
        })
    }
}

// ---------------------------------------------------------------------------
// Agent-facing enums
// ---------------------------------------------------------------------------

/// Which inner face of its cell an agent is clinging to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Surface {
    Floor,
    Ceiling,
    LeftWall,
    RightWall,
}

impl Surface {
    pub fn is_wall(self) -> bool {
        matches!(self, Surface::LeftWall | Surface::RightWall)
    }

    pub fn is_horizontal(self) -> bool {
        !self.is_wall()
    }

    /// The wall on the given horizontal side (`dx < 0` is left).
    pub fn wall_toward(dx: i32) -> Surface {
        if dx < 0 {
            Surface::LeftWall
        } else {
            Surface::RightWall
        }
    }

    /// The face directly across the cell.
    pub fn opposite(self) -> Surface {
        match self {
            Surface::Floor => Surface::Ceiling,
            Surface::Ceiling => Surface::Floor,
            Surface::LeftWall => Surface::RightWall,
            Surface::RightWall => Surface::LeftWall,
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Surface::Floor => "floor",
            Surface::Ceiling => "ceiling",
            Surface::LeftWall => "left wall",
            Surface::RightWall => "right wall",
        };
        f.write_str(name)
    }
}

/// Horizontal facing, for sprite mirroring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    pub fn from_dx(dx: i32) -> Option<Facing> {
        match dx.signum() {
            -1 => Some(Facing::Left),
            1 => Some(Facing::Right),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Compact identifier for an Elve agent, assigned sequentially by the sim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElveId(pub u32);

impl fmt::Display for ElveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Elve#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_pos_neighbors() {
        let p = CellPos::new(3, 4);
        assert_eq!(p.left(), CellPos::new(2, 4));
        assert_eq!(p.right(), CellPos::new(4, 4));
        assert_eq!(p.up(), CellPos::new(3, 5));
        assert_eq!(p.down(), CellPos::new(3, 3));
        assert_eq!(p + CellPos::new(1, -1), CellPos::new(4, 3));
        assert_eq!(p - CellPos::new(3, 4), CellPos::new(0, 0));
    }

    #[test]
    fn cell_pos_distances() {
        let a = CellPos::new(0, 0);
        let b = CellPos::new(3, -4);
        assert_eq!(a.squared_distance(b), 25);
        assert_eq!(a.chebyshev_distance(b), 4);
        assert_eq!(a.chebyshev_distance(CellPos::new(1, 1)), 1);
    }

    #[test]
    fn cell_pos_ordering() {
        // CellPos keys BTreeMaps, so it needs a total order.
        assert!(CellPos::new(0, 5) < CellPos::new(1, 0));
    }

    #[test]
    fn solidity_table() {
        assert!(VoxelType::SoftRock.is_solid());
        assert!(VoxelType::HardRock.is_solid());
        assert!(VoxelType::Dirt.is_solid());
        assert!(VoxelType::TreeWood.is_solid());
        assert!(VoxelType::TreeLeaf.is_solid());
        assert!(!VoxelType::TreeBackground.is_solid());
        assert!(!VoxelType::WoodSeed.is_solid());
        assert!(!VoxelType::Empty.is_solid());
    }

    #[test]
    fn planting_rules() {
        assert!(VoxelType::Empty.can_plant_in());
        assert!(!VoxelType::WoodSeed.can_plant_in());
        assert!(VoxelType::Dirt.can_plant_on());
        assert!(!VoxelType::TreeLeaf.can_plant_on());
        assert!(VoxelType::WoodSeed.is_item());
        assert!(VoxelType::TreeWood.is_tree());
        assert!(VoxelType::Empty.is_tree_fodder());
        assert!(!VoxelType::TreeBackground.is_tree_fodder());
    }

    #[test]
    fn voxel_char_roundtrip() {
        for t in [
            VoxelType::SoftRock,
            VoxelType::HardRock,
            VoxelType::Dirt,
            VoxelType::TreeWood,
            VoxelType::TreeLeaf,
            VoxelType::TreeBackground,
            VoxelType::WoodSeed,
            VoxelType::Empty,
        ] {
            assert_eq!(VoxelType::from_char(t.to_char()), Some(t));
        }
        assert_eq!(VoxelType::from_char('?'), None);
    }

    #[test]
    fn surface_helpers() {
        assert!(Surface::LeftWall.is_wall());
        assert!(Surface::Ceiling.is_horizontal());
        assert_eq!(Surface::wall_toward(-1), Surface::LeftWall);
        assert_eq!(Surface::wall_toward(1), Surface::RightWall);
        assert_eq!(Surface::Floor.opposite(), Surface::Ceiling);
        assert_eq!(Surface::RightWall.opposite(), Surface::LeftWall);
    }
}
