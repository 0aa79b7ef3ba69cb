//! Debug visualization for the lattice.
//!
//! Toggle with the 'D' key. Shows:
//! - An outline for every cell, occupied cells highlighted
//! - The snap radius around the projectile
//!
//! The field walls are always drawn.

use bevy::{color::palettes::css, input::common_conditions::input_just_pressed, prelude::*};

use super::{render::field_to_world, state::Playfield};

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<DebugGridVisible>();

    // Toggle debug with 'D' key
    app.add_systems(
        Update,
        toggle_debug.run_if(input_just_pressed(KeyCode::KeyD)),
    );

    // Draw debug grid when visible
    app.add_systems(Update, draw_debug_grid.run_if(debug_visible));

    app.add_systems(Update, draw_walls);
}

/// Resource to track if debug visualization is visible.
#[derive(Resource, Default)]
pub struct DebugGridVisible(pub bool);

fn debug_visible(debug: Res<DebugGridVisible>) -> bool {
    debug.0
}

fn toggle_debug(mut debug: ResMut<DebugGridVisible>) {
    debug.0 = !debug.0;
    let state = if debug.0 { "ON" } else { "OFF" };
    info!("Debug grid: {}", state);
}

/// Draw every lattice cell using Bevy's Gizmos.
fn draw_debug_grid(mut gizmos: Gizmos, playfield: Res<Playfield>) {
    let config = playfield.config();
    let lattice = playfield.lattice();
    let grid = playfield.grid();

    for coord in grid.coords() {
        let color = if grid.is_occupied(coord) {
            css::LIMEGREEN.with_alpha(0.5)
        } else if coord.row == 0 {
            // Ceiling row in different color
            css::GOLD.with_alpha(0.3)
        } else {
            css::WHITE.with_alpha(0.15)
        };

        let center = field_to_world(config, lattice.cell_center(coord));
        gizmos.circle_2d(
            Isometry2d::from_translation(center),
            lattice.radius * 0.9,
            color,
        );
    }

    let projectile = playfield.projectile();
    gizmos.circle_2d(
        Isometry2d::from_translation(field_to_world(config, projectile.position)),
        config.snap_threshold(),
        css::AQUA.with_alpha(0.6),
    );
}

/// Draw the walls and ceiling the projectile bounces off.
fn draw_walls(mut gizmos: Gizmos, playfield: Res<Playfield>) {
    let config = playfield.config();
    let wall_color = css::ORANGE.with_alpha(0.8);

    let top_left = field_to_world(config, Vec2::ZERO);
    let top_right = field_to_world(config, Vec2::new(config.field_width, 0.0));
    let bottom_left = field_to_world(config, Vec2::new(0.0, config.field_height));
    let bottom_right = field_to_world(config, Vec2::new(config.field_width, config.field_height));

    gizmos.line_2d(bottom_left, top_left, wall_color);
    gizmos.line_2d(top_left, top_right, wall_color);
    gizmos.line_2d(top_right, bottom_right, wall_color);
}
