//! The main game module for the bubble shooter.
//!
//! The core lives in plain data types:
//! - Staggered hex lattice geometry
//! - The fixed-size bubble grid
//! - Projectile motion
//! - Snapping into the grid
//! - Cluster detection and popping
//! - The per-tick orchestrator
//!
//! The launcher input, rendering and debug overlay are thin Bevy systems on top.

mod bubble;
mod cluster;
mod debug;
mod grid;
mod hex;
mod projectile;
mod render;
mod shooter;
mod snap;
mod state;

use bevy::prelude::*;

pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        state::plugin,
        shooter::plugin,
        render::plugin,
        debug::plugin,
    ));
}
