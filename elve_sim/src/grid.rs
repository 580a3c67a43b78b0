// Dense 2D voxel grid.
//
// Stored as a flat `Vec<VoxelType>` indexed by `x + y * width`, with y = 0 at
// the bottom row. Reads through `get` return `None` outside the grid and
// `is_solid` treats the outside as "not solid"; writes outside the grid are
// rejected with `GridError::OutOfBounds` rather than silently ignored, since
// an out-of-bounds edit is always a caller bug.
//
// The renderer meshes the grid in `CHUNK_SIZE` squares and expects both
// dimensions to be multiples of it. Nothing in the movement core depends on
// that; any grid of at least 1x1 is accepted.
//
// See also: `connectivity.rs` which derives per-cell movement bits from this
// grid, `world.rs` which pairs the two and keeps them in sync.

use crate::types::{CellPos, VoxelType};
use thiserror::Error;

/// Side length, in cells, of a rendering chunk.
pub const CHUNK_SIZE: u32 = 8;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("cell {pos} is outside the {width}x{height} grid")]
    OutOfBounds { pos: CellPos, width: u32, height: u32 },
    #[error("grid dimensions must be at least 1x1, got {width}x{height}")]
    Empty { width: u32, height: u32 },
    #[error("unknown cell character {found:?} at row {row}, column {column}")]
    BadCell { row: usize, column: usize, found: char },
    #[error("row {row} has {len} cells, expected {expected}")]
    Ragged { row: usize, len: usize, expected: usize },
}

/// Dense 2D voxel grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelGrid {
    /// Flat storage: index = x + y * width.
    cells: Vec<VoxelType>,
    width: u32,
    height: u32,
}

impl VoxelGrid {
    /// Create a grid filled with `Empty`.
    pub fn new(width: u32, height: u32) -> Result<Self, GridError> {
        Self::filled(width, height, VoxelType::Empty)
    }

    pub fn filled(width: u32, height: u32, fill: VoxelType) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::Empty { width, height });
        }
        Ok(Self {
            cells: vec![fill; width as usize * height as usize],
            width,
            height,
        })
    }

    /// Parse a grid from text rows, top row first. See `VoxelType::from_char`
    /// for the alphabet. Blank lines are skipped.
    pub fn from_ascii(text: &str) -> Result<Self, GridError> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .collect();
        let expected = rows.first().map_or(0, |r| r.chars().count());
        let mut grid = Self::new(expected as u32, rows.len() as u32)?;
        for (row, line) in rows.iter().enumerate() {
            let len = line.chars().count();
            if len != expected {
                return Err(GridError::Ragged { row, len, expected });
            }
            let y = grid.height as i32 - 1 - row as i32;
            for (column, c) in line.chars().enumerate() {
                let voxel =
                    VoxelType::from_char(c).ok_or(GridError::BadCell { row, column, found: c })?;
                grid.set(CellPos::new(column as i32, y), voxel)?;
            }
        }
        Ok(grid)
    }

    /// Render back to text rows, top row first.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((self.width as usize + 1) * self.height as usize);
        for y in (0..self.height as i32).rev() {
            for x in 0..self.width as i32 {
                let voxel = self.get(CellPos::new(x, y)).unwrap_or_default();
                out.push(voxel.to_char());
            }
            out.push('\n');
        }
        out
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether both dimensions are multiples of `CHUNK_SIZE`.
    pub fn is_chunk_aligned(&self) -> bool {
        self.width % CHUNK_SIZE == 0 && self.height % CHUNK_SIZE == 0
    }

    pub fn in_bounds(&self, pos: CellPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// Flat index of an in-bounds cell.
    pub(crate) fn index(&self, pos: CellPos) -> Option<usize> {
        if self.in_bounds(pos) {
            Some(pos.x as usize + pos.y as usize * self.width as usize)
        } else {
            None
        }
    }

    pub(crate) fn out_of_bounds(&self, pos: CellPos) -> GridError {
        GridError::OutOfBounds {
            pos,
            width: self.width,
            height: self.height,
        }
    }

    /// Read a cell. `None` outside the grid.
    pub fn get(&self, pos: CellPos) -> Option<VoxelType> {
        self.index(pos).map(|i| self.cells[i])
    }

    /// Read a cell, failing outside the grid.
    pub fn try_get(&self, pos: CellPos) -> Result<VoxelType, GridError> {
        self.get(pos).ok_or_else(|| self.out_of_bounds(pos))
    }

    /// True only for in-bounds solid cells.
    pub fn is_solid(&self, pos: CellPos) -> bool {
        self.get(pos).is_some_and(VoxelType::is_solid)
    }

    /// True only for in-bounds passable cells.
    pub fn is_open(&self, pos: CellPos) -> bool {
        self.get(pos).is_some_and(|v| !v.is_solid())
    }

    /// Write a cell and return what was there before.
    ///
    /// This does not touch connectivity. Go through `World::set_voxel`
    /// unless the caller rebuilds connectivity itself.
    pub fn set(&mut self, pos: CellPos, voxel: VoxelType) -> Result<VoxelType, GridError> {
        let i = self.index(pos).ok_or_else(|| self.out_of_bounds(pos))?;
        Ok(std::mem::replace(&mut self.cells[i], voxel))
    }

    /// Rows of cells, bottom row first.
    pub(crate) fn rows(&self) -> std::slice::Chunks<'_, VoxelType> {
        self.cells.chunks(self.width as usize)
    }
}
