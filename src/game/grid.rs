//! The fixed-size grid that holds all placed bubbles.
//!
//! Cells are stored densely in row-major order. The grid never grows or
//! shrinks during a game; only cell occupancy changes.

use bevy::prelude::*;
use rand::Rng;
use thiserror::Error;

use super::{
    bubble::BubbleColor,
    hex::{HexCoord, Lattice},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Occupied(BubbleColor),
}

impl Cell {
    pub fn color(self) -> Option<BubbleColor> {
        match self {
            Cell::Empty => None,
            Cell::Occupied(color) => Some(color),
        }
    }

    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell {0} is outside the grid")]
    OutOfBounds(HexCoord),
    #[error("cell {0} is already occupied")]
    Occupied(HexCoord),
}

#[derive(Debug, Clone)]
pub struct HexGrid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl HexGrid {
    /// Create an empty grid.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::Empty; rows * cols],
        }
    }

    /// Create a grid with the top `fill_rows` rows populated with random colors.
    ///
    /// The last column of odd rows is left empty: shifted right by a radius it
    /// would poke past the even rows' right edge.
    pub fn create_initial(
        rows: usize,
        cols: usize,
        fill_rows: usize,
        palette_len: usize,
        rng: &mut impl Rng,
    ) -> Self {
        let mut grid = Self::new(rows, cols);
        for row in 0..fill_rows.min(rows) {
            for col in 0..cols {
                if row % 2 == 1 && col + 1 == cols {
                    continue;
                }
                let index = row * cols + col;
                grid.cells[index] = Cell::Occupied(BubbleColor::random(rng, palette_len));
            }
        }
        grid
    }

    pub fn contains(&self, coord: HexCoord) -> bool {
        coord.row >= 0
            && coord.col >= 0
            && (coord.row as usize) < self.rows
            && (coord.col as usize) < self.cols
    }

    fn index(&self, coord: HexCoord) -> Option<usize> {
        self.contains(coord)
            .then(|| coord.row as usize * self.cols + coord.col as usize)
    }

    /// The cell at `coord`, or `None` when it lies outside the grid.
    pub fn get(&self, coord: HexCoord) -> Option<Cell> {
        self.index(coord).map(|i| self.cells[i])
    }

    pub fn is_occupied(&self, coord: HexCoord) -> bool {
        matches!(self.get(coord), Some(Cell::Occupied(_)))
    }

    /// Overwrite a cell, returning its previous content.
    pub fn set(&mut self, coord: HexCoord, cell: Cell) -> Result<Cell, GridError> {
        let index = self.index(coord).ok_or(GridError::OutOfBounds(coord))?;
        Ok(std::mem::replace(&mut self.cells[index], cell))
    }

    /// Place a bubble into an empty cell. Never overwrites an occupied cell.
    pub fn insert(&mut self, coord: HexCoord, color: BubbleColor) -> Result<(), GridError> {
        let index = self.index(coord).ok_or(GridError::OutOfBounds(coord))?;
        if !self.cells[index].is_empty() {
            return Err(GridError::Occupied(coord));
        }
        self.cells[index] = Cell::Occupied(color);
        Ok(())
    }

    /// Empty a cell, returning the color that was there.
    pub fn remove(&mut self, coord: HexCoord) -> Option<BubbleColor> {
        self.set(coord, Cell::Empty).ok()?.color()
    }

    /// Number of occupied cells.
    pub fn len(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| c.is_empty())
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|c| !c.is_empty())
    }

    /// All coordinates in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = HexCoord> + use<> {
        let cols = self.cols as i32;
        (0..self.rows as i32).flat_map(move |row| (0..cols).map(move |col| HexCoord::new(row, col)))
    }

    /// Occupied cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (HexCoord, BubbleColor)> + '_ {
        self.coords()
            .zip(self.cells.iter())
            .filter_map(|(coord, cell)| cell.color().map(|color| (coord, color)))
    }

    /// Find the empty cell whose center is closest to `point`.
    ///
    /// Scans every empty cell in row-major order; ties keep the first one seen.
    /// Occupied cells are never candidates. Returns `None` only when the grid
    /// is full.
    pub fn nearest_empty_cell(&self, lattice: &Lattice, point: Vec2) -> Option<(HexCoord, f32)> {
        let mut best: Option<(HexCoord, f32)> = None;
        for (coord, cell) in self.coords().zip(self.cells.iter()) {
            if !cell.is_empty() {
                continue;
            }
            let distance = point.distance(lattice.cell_center(coord));
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((coord, distance));
            }
        }
        best
    }
}
