// Support configuring Bevy lints within code.
#![cfg_attr(bevy_lint, feature(register_tool), register_tool(bevy))]

mod config;
mod game;

use std::path::PathBuf;

use bevy::{log::LogPlugin, prelude::*, window::WindowResolution};

use config::GameConfig;

fn main() -> AppExit {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = match GameConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return AppExit::error();
        }
    };

    App::new().add_plugins(AppPlugin { config }).run()
}

pub struct AppPlugin {
    config: GameConfig,
}

impl Plugin for AppPlugin {
    fn build(&self, app: &mut App) {
        let mut resolution = WindowResolution::default();
        resolution.set(self.config.field_width, self.config.field_height);

        // Add Bevy plugins.
        app.add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Window {
                        title: "Bubble Shooter".to_string(),
                        resolution,
                        resizable: false,
                        ..default()
                    }
                    .into(),
                    ..default()
                })
                .set(LogPlugin {
                    filter: "info,wgpu=error,naga=warn,bubble_shooter=debug".to_string(),
                    ..default()
                }),
        );

        app.insert_resource(ClearColor(Color::BLACK));
        // One simulation tick per frame at the configured rate.
        app.insert_resource(Time::<Fixed>::from_hz(self.config.frame_rate));
        app.insert_resource(self.config.clone());

        app.add_plugins(game::plugin);

        // Spawn the main camera.
        app.add_systems(Startup, spawn_camera);
    }
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn((Name::new("Camera"), Camera2d));
}
