//! The logical drawing: a 5×5 grid of on/off cells.
//!
//! ## Rust concepts
//! - Newtype-style `Cell` whose constructor rejects out-of-range coordinates
//! - `Option` as the return type of fallible constructors
//! - Fixed-size arrays (`[[bool; 5]; 5]`) that are `Copy`

use serde::Serialize;

/// Width and height of the grid, in cells.
pub const GRID_SIZE: u8 = 5;

const N: usize = GRID_SIZE as usize;

// ── Cell ─────────────────────────────────────────────────────────────

/// A coordinate on the grid: column `x`, row `y`, both in `0..5`.
///
/// The fields are private so a `Cell` can only be built through
/// [`Cell::new`] or [`Cell::offset`], which means every `Cell` in the
/// program is in range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, utoipa::ToSchema)]
pub struct Cell {
    x: u8,
    y: u8,
}

impl Cell {
    /// Centre of the grid, where a fresh cursor appears.
    pub const CENTER: Cell = Cell { x: 2, y: 2 };

    pub fn new(x: u8, y: u8) -> Option<Self> {
        (x < GRID_SIZE && y < GRID_SIZE).then_some(Self { x, y })
    }

    pub fn x(self) -> u8 {
        self.x
    }

    pub fn y(self) -> u8 {
        self.y
    }

    /// The neighbouring cell `dx` columns and `dy` rows away, if it is
    /// still on the grid.
    pub fn offset(self, dx: i8, dy: i8) -> Option<Self> {
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        Self::new(x, y)
    }

    /// Every cell on the grid, row by row.
    pub fn all() -> impl Iterator<Item = Cell> {
        (0..GRID_SIZE).flat_map(|y| (0..GRID_SIZE).map(move |x| Cell { x, y }))
    }
}

// ── Picture ──────────────────────────────────────────────────────────

/// A binary image the size of the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Picture {
    rows: [[bool; N]; N],
}

impl Picture {
    /// A blank picture (every cell off).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, cell: Cell) -> bool {
        self.rows[cell.y as usize][cell.x as usize]
    }

    pub fn set(&mut self, cell: Cell, on: bool) {
        self.rows[cell.y as usize][cell.x as usize] = on;
    }

    /// Flip a cell and return its new value.
    pub fn toggle(&mut self, cell: Cell) -> bool {
        let on = !self.get(cell);
        self.set(cell, on);
        on
    }

    /// Turn every cell off.
    pub fn clear(&mut self) {
        self.rows = [[false; N]; N];
    }

    pub fn lit_count(&self) -> usize {
        self.rows.iter().flatten().filter(|&&on| on).count()
    }

    /// Rows of `0`/`1`, top row first. Used for status reports.
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|&on| u8::from(on)).collect())
            .collect()
    }
}
