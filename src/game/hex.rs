//! Staggered hexagonal lattice geometry.
//!
//! Cells are addressed by (row, col). Odd rows are shifted right by one bubble
//! radius and rows are packed `row_spacing * radius` apart (1.8 by default,
//! less than a full diameter) so each bubble touches six neighbors. This is
//! the "odd-r" offset layout used by classic bubble shooters.
//!
//! All positions are in field space: origin top-left, y pointing down.

use bevy::prelude::*;

/// Neighbor deltas (d_row, d_col) for cells on an even row.
const EVEN_ROW_NEIGHBORS: [(i32, i32); 6] = [(-1, -1), (-1, 0), (0, -1), (0, 1), (1, -1), (1, 0)];

/// Neighbor deltas (d_row, d_col) for cells on an odd (shifted) row.
const ODD_ROW_NEIGHBORS: [(i32, i32); 6] = [(-1, 0), (-1, 1), (0, -1), (0, 1), (1, 0), (1, 1)];

/// A lattice cell address. May lie outside the grid; callers bounds-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HexCoord {
    pub row: i32,
    pub col: i32,
}

impl HexCoord {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    #[inline]
    pub const fn is_odd_row(&self) -> bool {
        self.row % 2 != 0
    }

    /// The six adjacent cells. The offsets depend on this cell's row parity.
    pub fn neighbors(&self) -> [HexCoord; 6] {
        let deltas = if self.is_odd_row() {
            &ODD_ROW_NEIGHBORS
        } else {
            &EVEN_ROW_NEIGHBORS
        };
        deltas.map(|(dr, dc)| HexCoord::new(self.row + dr, self.col + dc))
    }
}

impl std::fmt::Display for HexCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Maps lattice indices to field-space pixel centers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lattice {
    /// Center of cell (0, 0).
    pub origin: Vec2,
    pub radius: f32,
    /// Vertical distance between row centers, in radii.
    pub row_spacing: f32,
}

impl Lattice {
    pub const fn new(origin: Vec2, radius: f32, row_spacing: f32) -> Self {
        Self {
            origin,
            radius,
            row_spacing,
        }
    }

    /// Pixel center of a cell.
    ///
    /// - x = origin.x + col * 2r (+ r on odd rows)
    /// - y = origin.y + row * row_spacing * r
    pub fn cell_center(&self, coord: HexCoord) -> Vec2 {
        let row_offset = if coord.is_odd_row() { self.radius } else { 0.0 };
        Vec2::new(
            self.origin.x + coord.col as f32 * 2.0 * self.radius + row_offset,
            self.origin.y + coord.row as f32 * self.row_spacing * self.radius,
        )
    }
}
