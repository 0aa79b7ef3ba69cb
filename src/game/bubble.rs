//! Bubble colors.
//!
//! The palette is configurable, so a color is just an index into
//! [`GameConfig::palette`](crate::config::GameConfig). Rendering resolves the
//! index to an sRGB value; the core only compares indices.

use bevy::prelude::*;
use rand::Rng;

use crate::config::Rgb;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BubbleColor(pub u8);

impl BubbleColor {
    /// A uniformly random color from a palette of `palette_len` entries.
    pub fn random(rng: &mut impl Rng, palette_len: usize) -> Self {
        Self(rng.random_range(0..palette_len) as u8)
    }

    /// Resolve this color against a palette for rendering.
    pub fn to_color(self, palette: &[Rgb]) -> Color {
        match palette.get(self.0 as usize) {
            Some(&[r, g, b]) => Color::srgb_u8(r, g, b),
            None => Color::WHITE,
        }
    }
}
