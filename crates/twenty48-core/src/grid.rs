//! Grid representation and the line slide primitive.
//!
//! This module contains:
//! - `slide`, which compacts and merges a single line toward index 0
//! - `Grid`, the fixed 4x4 matrix of tile values (0 = empty)
//!
//! All four move directions are expressed through `Grid::line` and
//! `Grid::set_line`, which extract a row or column (reversed when the
//! direction points away from index 0) and write it back.

use crate::direction::{Axis, Direction};
use crate::game::GameError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width and height of the grid
pub const GRID_SIZE: usize = 4;

/// A single row or column, ordered from the edge tiles move toward
pub type Line = [u32; GRID_SIZE];

/// Largest tile a 4x4 game can hold. Tiles of this value never merge.
pub const MAX_TILE: u32 = 1 << 17;

/// Compact a line toward index 0, merging equal neighbours once.
///
/// Returns the new line and the score gained (the sum of merged values).
/// A tile produced by a merge is never merged again in the same pass, so
/// `[2, 2, 2, 2]` becomes `[4, 4, 0, 0]` rather than `[8, 0, 0, 0]`.
pub fn slide(line: Line) -> (Line, u64) {
    let mut out = [0; GRID_SIZE];
    let mut len = 0;
    let mut gained = 0u64;
    let mut pending: Option<u32> = None;

    for value in line.into_iter().filter(|&v| v != 0) {
        match pending {
            Some(prev) if prev == value && prev < MAX_TILE => {
                out[len] = prev * 2;
                gained += u64::from(prev) * 2;
                len += 1;
                pending = None;
            }
            Some(prev) => {
                out[len] = prev;
                len += 1;
                pending = Some(value);
            }
            None => pending = Some(value),
        }
    }

    if let Some(prev) = pending {
        out[len] = prev;
    }

    (out, gained)
}

/// Whether a value may appear in a cell
fn is_valid_tile(value: u32) -> bool {
    value == 0 || (value >= 2 && value <= MAX_TILE && value.is_power_of_two())
}

/// The 4x4 tile grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    cells: [[u32; GRID_SIZE]; GRID_SIZE],
}

impl Grid {
    /// An empty grid
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a grid from explicit rows, checking every tile is 0 or a power
    /// of two between 2 and `MAX_TILE`
    pub fn from_rows(rows: [[u32; GRID_SIZE]; GRID_SIZE]) -> Result<Self, GameError> {
        if let Some(bad) = rows.iter().flatten().find(|&&v| !is_valid_tile(v)) {
            return Err(GameError::InvalidTile(*bad));
        }
        Ok(Self { cells: rows })
    }

    /// Copy of the rows, for rendering
    pub fn rows(&self) -> [[u32; GRID_SIZE]; GRID_SIZE] {
        self.cells
    }

    /// Value at a cell, or `None` outside the grid
    pub fn get(&self, row: usize, col: usize) -> Option<u32> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, value: u32) {
        debug_assert!(is_valid_tile(value));
        self.cells[row][col] = value;
    }

    /// Extract line `index` (< `GRID_SIZE`) along the direction's axis,
    /// ordered so that tiles move toward index 0.
    pub(crate) fn line(&self, direction: Direction, index: usize) -> Line {
        let mut line = match direction.axis() {
            Axis::Row => self.cells[index],
            Axis::Column => std::array::from_fn(|row| self.cells[row][index]),
        };
        if direction.is_reversed() {
            line.reverse();
        }
        line
    }

    /// Write back a line produced from `line(direction, index)`
    pub(crate) fn set_line(&mut self, direction: Direction, index: usize, mut line: Line) {
        if direction.is_reversed() {
            line.reverse();
        }
        match direction.axis() {
            Axis::Row => self.cells[index] = line,
            Axis::Column => {
                for (row, value) in line.into_iter().enumerate() {
                    self.cells[row][index] = value;
                }
            }
        }
    }

    /// Empty cells as `(row, col)`, in row-major order
    pub fn empty_cells(&self) -> Vec<(usize, usize)> {
        let mut cells = Vec::new();
        for (r, row) in self.cells.iter().enumerate() {
            for (c, &value) in row.iter().enumerate() {
                if value == 0 {
                    cells.push((r, c));
                }
            }
        }
        cells
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().flatten().all(|&v| v != 0)
    }

    /// Whether any two horizontally or vertically adjacent tiles could merge
    pub fn has_adjacent_pair(&self) -> bool {
        for r in 0..GRID_SIZE {
            for c in 0..GRID_SIZE {
                let value = self.cells[r][c];
                if value == 0 || value == MAX_TILE {
                    continue;
                }
                if c + 1 < GRID_SIZE && self.cells[r][c + 1] == value {
                    return true;
                }
                if r + 1 < GRID_SIZE && self.cells[r + 1][c] == value {
                    return true;
                }
            }
        }
        false
    }

    /// Largest tile on the grid (0 when empty)
    pub fn highest_value(&self) -> u32 {
        self.cells.iter().flatten().copied().max().unwrap_or(0)
    }

    /// Sum of all tiles
    pub fn tile_sum(&self) -> u64 {
        self.cells.iter().flatten().map(|&v| v as u64).sum()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.highest_value().max(1).to_string().len();
        for row in &self.cells {
            let cells: Vec<String> = row
                .iter()
                .map(|&v| {
                    if v == 0 {
                        format!("{:>width$}", ".")
                    } else {
                        format!("{:>width$}", v)
                    }
                })
                .collect();
            writeln!(f, "{}", cells.join(" "))?;
        }
        Ok(())
    }
}
