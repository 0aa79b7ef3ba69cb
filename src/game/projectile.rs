//! Projectile - the bubble being shot.
//!
//! The projectile travels in a straight line, bouncing off the side walls and
//! the ceiling, until the snap resolver parks it in the grid.

use bevy::prelude::*;

use super::bubble::BubbleColor;

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    /// Center in field space.
    pub position: Vec2,
    /// Displacement per tick.
    pub velocity: Vec2,
    pub color: BubbleColor,
    pub radius: f32,
    /// True only while in flight.
    pub moving: bool,
}

impl Projectile {
    /// A resting projectile loaded at the launcher.
    pub fn new(position: Vec2, radius: f32, color: BubbleColor) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            color,
            radius,
            moving: false,
        }
    }

    /// Launch at `angle` radians from vertical (0 is straight up, positive leans right).
    pub fn fire(&mut self, angle: f32, speed: f32) {
        self.velocity = speed * Vec2::new(angle.sin(), -angle.cos());
        self.moving = true;
    }

    /// Advance one tick and reflect off the left and right walls.
    pub fn step(&mut self, field_width: f32) {
        if !self.moving {
            return;
        }
        self.position += self.velocity;

        // Left wall bounce
        if self.position.x - self.radius <= 0.0 {
            self.position.x = self.radius;
            self.velocity.x = self.velocity.x.abs();
        }

        // Right wall bounce
        if self.position.x + self.radius >= field_width {
            self.position.x = field_width - self.radius;
            self.velocity.x = -self.velocity.x.abs();
        }
    }

    /// Reflect off the ceiling. Returns whether a bounce happened.
    pub fn bounce_off_ceiling(&mut self) -> bool {
        if self.moving && self.position.y - self.radius <= 0.0 {
            self.position.y = self.radius;
            self.velocity.y = self.velocity.y.abs();
            return true;
        }
        false
    }

    /// Stop at `center`.
    pub fn park(&mut self, center: Vec2) {
        self.position = center;
        self.velocity = Vec2::ZERO;
        self.moving = false;
    }
}
