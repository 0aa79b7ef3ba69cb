//! Snapping a moving projectile into the lattice.
//!
//! A projectile snaps into the nearest empty cell once its center comes
//! within `threshold` of that cell's center. The threshold is a proximity
//! radius, not exact contact, so the projectile does not need to hit a lattice
//! point precisely. The resolver never writes to the grid; the caller places
//! the bubble at the returned coordinate.

use super::{
    grid::HexGrid,
    hex::{HexCoord, Lattice},
    projectile::Projectile,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnapOutcome {
    /// Parked at the center of this cell.
    Snapped(HexCoord),
    /// Nearest empty cell is still too far away; keep flying.
    InFlight,
    /// No empty cell exists at all.
    GridFull,
}

/// Check whether `projectile` should stop, parking it when it does.
pub fn try_snap(
    projectile: &mut Projectile,
    grid: &HexGrid,
    lattice: &Lattice,
    threshold: f32,
) -> SnapOutcome {
    let Some((coord, distance)) = grid.nearest_empty_cell(lattice, projectile.position) else {
        return SnapOutcome::GridFull;
    };

    if distance < threshold {
        projectile.park(lattice.cell_center(coord));
        SnapOutcome::Snapped(coord)
    } else {
        SnapOutcome::InFlight
    }
}
