//! Drawing the field.
//!
//! Everything here only reads [`Playfield::snapshot`]; the core never knows it
//! is being rendered. Grid bubbles are mesh entities kept in sync with the
//! snapshot, the launcher and outlines are gizmos redrawn every frame.

use std::collections::HashMap;

use bevy::prelude::*;

use super::{
    bubble::BubbleColor,
    hex::HexCoord,
    state::{ClusterPopped, Phase, Playfield},
};
use crate::config::GameConfig;

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<GridVisuals>();
    app.add_systems(Startup, setup_bubble_assets);
    app.add_systems(
        Update,
        (
            sync_grid_visuals,
            update_projectile_visuals,
            draw_launcher,
            draw_outlines,
            spawn_pop_effects,
            animate_pop,
        ),
    );
}

/// Length of the launcher barrel in pixels.
const LAUNCHER_LENGTH: f32 = 40.0;

/// Length of the dotted aim guide in pixels.
const AIM_LINE_LENGTH: f32 = 150.0;

/// Where the next-bubble preview sits, as an offset from the bottom-left corner.
const NEXT_PREVIEW_OFFSET: Vec2 = Vec2::new(50.0, 50.0);

/// Convert a field-space point (origin top-left, y down) to world space
/// (origin at the window center, y up).
pub fn field_to_world(config: &GameConfig, pos: Vec2) -> Vec2 {
    Vec2::new(
        pos.x - config.field_width / 2.0,
        config.field_height / 2.0 - pos.y,
    )
}

/// Inverse of [`field_to_world`].
pub fn world_to_field(config: &GameConfig, pos: Vec2) -> Vec2 {
    Vec2::new(
        pos.x + config.field_width / 2.0,
        config.field_height / 2.0 - pos.y,
    )
}

/// Shared mesh and per-palette materials for bubble rendering.
#[derive(Resource)]
pub struct BubbleAssets {
    mesh: Handle<Mesh>,
    materials: Vec<Handle<ColorMaterial>>,
}

impl BubbleAssets {
    fn material(&self, color: BubbleColor) -> Handle<ColorMaterial> {
        self.materials
            .get(color.0 as usize)
            .or_else(|| self.materials.first())
            .cloned()
            .unwrap_or_default()
    }
}

/// Bubble entities currently on screen, keyed by grid cell.
#[derive(Resource, Default)]
struct GridVisuals(HashMap<HexCoord, (Entity, BubbleColor)>);

/// Marker for the grid bubble visual entities.
#[derive(Component)]
struct GridBubbleVisual;

/// Marker for the projectile visual entity.
#[derive(Component)]
struct ProjectileVisual;

/// Marker for the next bubble visual entity.
#[derive(Component)]
struct NextBubbleVisual;

fn setup_bubble_assets(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    config: Res<GameConfig>,
) {
    let assets = BubbleAssets {
        mesh: meshes.add(Circle::new(config.bubble_radius)),
        materials: (0..config.palette.len())
            .map(|i| {
                let color = BubbleColor(i as u8).to_color(&config.palette);
                materials.add(ColorMaterial::from_color(color))
            })
            .collect(),
    };

    let launcher = field_to_world(&config, config.launcher());
    commands.spawn((
        Name::new("Projectile"),
        ProjectileVisual,
        Transform::from_translation(launcher.extend(5.0)),
        Mesh2d(assets.mesh.clone()),
        MeshMaterial2d(assets.material(BubbleColor::default())),
    ));

    let preview = Vec2::new(
        NEXT_PREVIEW_OFFSET.x,
        config.field_height - NEXT_PREVIEW_OFFSET.y,
    );
    commands.spawn((
        Name::new("Next Bubble"),
        NextBubbleVisual,
        Transform::from_translation(field_to_world(&config, preview).extend(1.0)),
        Mesh2d(assets.mesh.clone()),
        MeshMaterial2d(assets.material(BubbleColor::default())),
    ));

    commands.insert_resource(assets);
}

/// Spawn and despawn grid bubble entities so they mirror the grid.
fn sync_grid_visuals(
    mut commands: Commands,
    mut visuals: ResMut<GridVisuals>,
    playfield: Res<Playfield>,
    assets: Res<BubbleAssets>,
) {
    if !playfield.is_changed() {
        return;
    }

    let config = playfield.config();
    let snapshot = playfield.snapshot();

    let wanted: HashMap<HexCoord, _> = snapshot.cells.iter().map(|c| (c.coord, c)).collect();
    visuals.0.retain(|coord, (entity, color)| {
        let keep = wanted.get(coord).is_some_and(|cell| cell.color == *color);
        if !keep {
            commands.entity(*entity).despawn();
        }
        keep
    });

    for cell in &snapshot.cells {
        if visuals.0.contains_key(&cell.coord) {
            continue;
        }
        let world_pos = field_to_world(config, cell.center);
        let entity = commands
            .spawn((
                Name::new(format!("Bubble {:?} at {}", cell.color, cell.coord)),
                GridBubbleVisual,
                Transform::from_translation(world_pos.extend(0.0)),
                Mesh2d(assets.mesh.clone()),
                MeshMaterial2d(assets.material(cell.color)),
            ))
            .id();
        visuals.0.insert(cell.coord, (entity, cell.color));
    }
}

/// Move the projectile and recolor the loaded and next bubbles.
fn update_projectile_visuals(
    playfield: Res<Playfield>,
    assets: Res<BubbleAssets>,
    mut projectile_query: Query<
        (&mut Transform, &mut MeshMaterial2d<ColorMaterial>),
        (With<ProjectileVisual>, Without<NextBubbleVisual>),
    >,
    mut next_query: Query<&mut MeshMaterial2d<ColorMaterial>, With<NextBubbleVisual>>,
) {
    let snapshot = playfield.snapshot();

    if let Ok((mut transform, mut material)) = projectile_query.single_mut() {
        let pos = field_to_world(playfield.config(), snapshot.projectile_position);
        transform.translation = pos.extend(5.0);
        material.0 = assets.material(snapshot.projectile_color);
    }

    if let Ok(mut material) = next_query.single_mut() {
        material.0 = assets.material(snapshot.next_color);
    }
}

/// Draw the launcher barrel, plus a dotted aim guide while aiming.
fn draw_launcher(mut gizmos: Gizmos, playfield: Res<Playfield>) {
    let config = playfield.config();
    let snapshot = playfield.snapshot();
    let angle = snapshot.aim;
    let launcher = config.launcher();
    // Field-space direction, y down.
    let direction = Vec2::new(angle.sin(), -angle.cos());

    let start = field_to_world(config, launcher);
    let end = field_to_world(config, launcher + direction * LAUNCHER_LENGTH);
    gizmos.line_2d(start, end, Color::WHITE);
    gizmos.circle_2d(
        Isometry2d::from_translation(start),
        config.bubble_radius,
        Color::WHITE,
    );

    if snapshot.phase != Phase::Aiming {
        return;
    }

    let segments = 15;
    let segment_length = AIM_LINE_LENGTH / segments as f32;
    for i in (0..segments).step_by(2) {
        let seg_start = launcher + direction * (i as f32 * segment_length);
        let seg_end = launcher + direction * ((i as f32 + 0.7) * segment_length);
        gizmos.line_2d(
            field_to_world(config, seg_start),
            field_to_world(config, seg_end),
            Color::srgba(0.9, 0.9, 0.9, 0.4),
        );
    }
}

/// Thin white rim around every bubble.
fn draw_outlines(mut gizmos: Gizmos, playfield: Res<Playfield>) {
    let config = playfield.config();
    let snapshot = playfield.snapshot();

    let centers = snapshot
        .cells
        .iter()
        .map(|cell| cell.center)
        .chain([snapshot.projectile_position]);
    for center in centers {
        gizmos.circle_2d(
            Isometry2d::from_translation(field_to_world(config, center)),
            config.bubble_radius,
            Color::WHITE,
        );
    }

    let preview = Vec2::new(
        NEXT_PREVIEW_OFFSET.x,
        config.field_height - NEXT_PREVIEW_OFFSET.y,
    );
    gizmos.circle_2d(
        Isometry2d::from_translation(field_to_world(config, preview)),
        config.bubble_radius,
        Color::WHITE,
    );
}

/// A popped bubble: scales up then shrinks to nothing.
#[derive(Component)]
struct PopAnimation {
    timer: f32,
    duration: f32,
}

fn spawn_pop_effects(
    mut commands: Commands,
    mut popped: MessageReader<ClusterPopped>,
    playfield: Res<Playfield>,
    assets: Res<BubbleAssets>,
) {
    for event in popped.read() {
        for &coord in &event.coords {
            let center = playfield.lattice().cell_center(coord);
            commands.spawn((
                Name::new("Pop"),
                PopAnimation {
                    timer: 0.0,
                    duration: 0.15,
                },
                Transform::from_translation(
                    field_to_world(playfield.config(), center).extend(6.0),
                ),
                Mesh2d(assets.mesh.clone()),
                MeshMaterial2d(assets.material(event.color)),
            ));
        }
    }
}

/// Animate popping bubbles and despawn when done.
fn animate_pop(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut Transform, &mut PopAnimation)>,
) {
    for (entity, mut transform, mut pop) in &mut query {
        pop.timer += time.delta_secs();
        let progress = (pop.timer / pop.duration).min(1.0);

        // Scale up quickly, then shrink to nothing
        let scale = if progress < 0.5 {
            1.0 + 0.4 * progress * 2.0
        } else {
            1.4 * (1.0 - (progress - 0.5) * 2.0)
        };
        transform.scale = Vec3::splat(scale);

        if progress >= 1.0 {
            commands.entity(entity).despawn();
        }
    }
}
