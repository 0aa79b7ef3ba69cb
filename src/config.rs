//! Game configuration.
//!
//! Every tunable constant of the playing field lives here. Defaults match the
//! classic 800x600 layout; a JSON document passed on the command line may
//! override any subset of fields. The config is validated once before the app
//! is built so a bad value never surfaces mid-game.

use std::{fs, path::Path};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating a [`GameConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// An sRGB palette entry.
pub type Rgb = [u8; 3];

/// Position of the lattice's (0, 0) cell center in field space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridOrigin {
    pub x: f32,
    pub y: f32,
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub field_width: f32,
    pub field_height: f32,
    pub bubble_radius: f32,
    pub palette: Vec<Rgb>,
    pub rows: usize,
    pub cols: usize,
    /// Defaults to one radius in from the left wall, 50px below the ceiling.
    pub grid_origin: Option<GridOrigin>,
    /// Distance of the launcher above the bottom edge of the field.
    pub launcher_offset: f32,
    /// Projectile speed in pixels per tick.
    pub projectile_speed: f32,
    /// Snap threshold as a multiple of the bubble radius.
    pub snap_distance: f32,
    /// Vertical distance between rows as a multiple of the bubble radius.
    pub row_spacing: f32,
    /// Rows filled with random bubbles at the start of a game.
    pub initial_rows: usize,
    /// Smallest connected group that gets cleared.
    pub match_threshold: usize,
    /// Simulation ticks per second.
    pub frame_rate: f64,
    /// Fixed RNG seed, random when absent.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            field_width: 800.0,
            field_height: 600.0,
            bubble_radius: 20.0,
            palette: vec![
                [255, 0, 0],
                [0, 255, 0],
                [0, 0, 255],
                [255, 255, 0],
                [128, 0, 128],
            ],
            rows: 10,
            cols: 15,
            grid_origin: None,
            launcher_offset: 50.0,
            projectile_speed: 10.0,
            snap_distance: 1.5,
            row_spacing: 1.8,
            initial_rows: 3,
            match_threshold: 3,
            frame_rate: 60.0,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Load a config from an optional JSON file, falling back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_json(&text)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a (possibly partial) JSON document. Does not validate.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn grid_origin(&self) -> GridOrigin {
        self.grid_origin.unwrap_or(GridOrigin {
            x: self.bubble_radius,
            y: 50.0,
        })
    }

    /// Launcher position in field space.
    pub fn launcher(&self) -> Vec2 {
        Vec2::new(
            self.field_width / 2.0,
            self.field_height - self.launcher_offset,
        )
    }

    pub fn snap_threshold(&self) -> f32 {
        self.snap_distance * self.bubble_radius
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(msg: impl Into<String>) -> Result<(), ConfigError> {
            Err(ConfigError::Invalid(msg.into()))
        }

        let positive = [
            ("field_width", self.field_width as f64),
            ("field_height", self.field_height as f64),
            ("bubble_radius", self.bubble_radius as f64),
            ("projectile_speed", self.projectile_speed as f64),
            ("snap_distance", self.snap_distance as f64),
            ("row_spacing", self.row_spacing as f64),
            ("frame_rate", self.frame_rate),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return invalid(format!("{name} must be a positive number, got {value}"));
            }
        }

        if self.rows == 0 || self.cols == 0 {
            return invalid(format!(
                "grid must have at least one row and column, got {}x{}",
                self.rows, self.cols
            ));
        }
        if self.palette.len() < 2 {
            return invalid(format!(
                "palette needs at least 2 colors, got {}",
                self.palette.len()
            ));
        }
        if self.palette.len() > u8::MAX as usize + 1 {
            return invalid("palette has more than 256 colors");
        }
        for (i, color) in self.palette.iter().enumerate() {
            if self.palette[..i].contains(color) {
                return invalid(format!("palette color {color:?} is listed twice"));
            }
        }
        if self.match_threshold < 2 {
            return invalid(format!(
                "match_threshold must be at least 2, got {}",
                self.match_threshold
            ));
        }
        // Cell counts that overflow are rejected by the lattice fit check below.
        if self
            .rows
            .checked_mul(self.cols)
            .is_some_and(|cells| self.match_threshold > cells)
        {
            return invalid("match_threshold exceeds the number of grid cells");
        }
        if self.initial_rows > self.rows {
            return invalid(format!(
                "initial_rows ({}) exceeds rows ({})",
                self.initial_rows, self.rows
            ));
        }

        let r = self.bubble_radius;
        let origin = self.grid_origin();
        // Odd rows are shifted right by one radius.
        let odd_row_shift = if self.rows > 1 { r } else { 0.0 };
        let right_edge = origin.x + (self.cols - 1) as f32 * 2.0 * r + odd_row_shift + r;
        if origin.x - r < 0.0 || right_edge > self.field_width {
            return invalid(format!(
                "lattice spans x {}..{} which does not fit a field {} wide",
                origin.x - r,
                right_edge,
                self.field_width
            ));
        }

        let bottom_row_y = origin.y + (self.rows - 1) as f32 * self.row_spacing * r;
        let launcher = self.launcher();
        if launcher.y - r <= bottom_row_y + r || launcher.y + r > self.field_height {
            return invalid(format!(
                "launcher at y {} overlaps the lattice (bottom row at y {}) or the field edge",
                launcher.y, bottom_row_y
            ));
        }

        Ok(())
    }
}
