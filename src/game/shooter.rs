//! The launcher at the bottom of the field.
//!
//! The player aims with the mouse and fires with a click or the spacebar.
//! Escape quits.

use bevy::{prelude::*, window::PrimaryWindow};

use super::{render::world_to_field, state::Playfield};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        (update_aim_direction, handle_fire_input, quit_on_escape).chain(),
    );
}

/// Maximum angle from vertical (in radians) - prevents shooting too horizontally.
const MAX_AIM_ANGLE: f32 = 1.3; // About 75 degrees

/// Angle from vertical pointing from `launcher` at `target`, clamped to the
/// firing arc. Both points are in field space (y down).
pub fn aim_angle(launcher: Vec2, target: Vec2) -> f32 {
    let dx = target.x - launcher.x;
    let dy = launcher.y - target.y;
    dx.atan2(dy).clamp(-MAX_AIM_ANGLE, MAX_AIM_ANGLE)
}

/// Update the aim angle from the mouse position.
fn update_aim_direction(
    window_query: Query<&Window, With<PrimaryWindow>>,
    camera_query: Query<(&Camera, &GlobalTransform)>,
    mut playfield: ResMut<Playfield>,
) {
    let Ok(window) = window_query.single() else {
        return;
    };
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };

    // Get cursor position in world coordinates
    let Some(cursor_pos) = window
        .cursor_position()
        .and_then(|p| camera.viewport_to_world_2d(camera_transform, p).ok())
    else {
        return;
    };

    let config = playfield.config();
    let angle = aim_angle(config.launcher(), world_to_field(config, cursor_pos));
    if angle != playfield.aim_angle() {
        playfield.aim(angle);
    }
}

/// Handle fire input (mouse click or spacebar).
fn handle_fire_input(
    mouse_input: Res<ButtonInput<MouseButton>>,
    keyboard_input: Res<ButtonInput<KeyCode>>,
    mut playfield: ResMut<Playfield>,
) {
    let fire_pressed =
        mouse_input.just_pressed(MouseButton::Left) || keyboard_input.just_pressed(KeyCode::Space);

    if fire_pressed {
        playfield.fire();
    }
}

fn quit_on_escape(keyboard_input: Res<ButtonInput<KeyCode>>, mut exit: MessageWriter<AppExit>) {
    if keyboard_input.just_pressed(KeyCode::Escape) {
        info!("Quit requested");
        exit.write(AppExit::Success);
    }
}
