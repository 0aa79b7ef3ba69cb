//! Cluster detection - finding and popping matching bubbles.
//!
//! Uses flood fill (BFS) to find connected groups of same-colored bubbles.
//! When a group reaches the match threshold it is cleared.
//!
//! Bubbles left hanging after a clear are not dropped; disconnected groups stay
//! where they are.

use std::collections::{HashSet, VecDeque};

use super::{bubble::BubbleColor, grid::HexGrid, hex::HexCoord};

/// Find all cells connected to `start` that hold `color`.
///
/// Neighbor offsets follow the row parity of each visited cell, not of the
/// start. Cells that are off-grid, empty or a different color are marked
/// visited and never expanded. The result is in BFS order.
pub fn connected_same_color(grid: &HexGrid, start: HexCoord, color: BubbleColor) -> Vec<HexCoord> {
    let mut cluster = Vec::new();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([start]);

    while let Some(coord) = queue.pop_front() {
        if !visited.insert(coord) {
            continue;
        }

        if grid.get(coord).and_then(|cell| cell.color()) != Some(color) {
            continue;
        }

        cluster.push(coord);
        for neighbor in coord.neighbors() {
            if !visited.contains(&neighbor) {
                queue.push_back(neighbor);
            }
        }
    }

    cluster
}

/// The cells to clear after a bubble settles at `coord`.
///
/// Empty when the cell is empty or its group is smaller than `threshold`.
pub fn check_match(grid: &HexGrid, coord: HexCoord, threshold: usize) -> Vec<HexCoord> {
    let Some(color) = grid.get(coord).and_then(|cell| cell.color()) else {
        return Vec::new();
    };

    let cluster = connected_same_color(grid, coord, color);
    if cluster.len() >= threshold {
        cluster
    } else {
        Vec::new()
    }
}

/// Empty every listed cell. Returns how many bubbles were removed.
pub fn clear(grid: &mut HexGrid, positions: &[HexCoord]) -> usize {
    positions
        .iter()
        .filter(|&&coord| grid.remove(coord).is_some())
        .count()
}
