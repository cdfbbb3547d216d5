//! Camera transform between screen and world space.
//!
//! `screen = world * scale + offset` and its exact inverse
//! `world = (screen - offset) / scale`.

use crate::model::Point;

pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 5.0;

/// Pan offset (screen pixels) and uniform zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub offset: Point,
    pub scale: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Point::default(),
            scale: 1.0,
        }
    }
}

impl Camera {
    pub fn world_from_screen(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.offset.x) / self.scale,
            (screen.y - self.offset.y) / self.scale,
        )
    }

    pub fn screen_from_world(&self, world: Point) -> Point {
        Point::new(
            world.x * self.scale + self.offset.x,
            world.y * self.scale + self.offset.y,
        )
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.offset.x += dx;
        self.offset.y += dy;
    }

    /// Set the scale to `new_scale` (clamped) keeping the world point under
    /// `anchor` fixed on screen.
    ///
    /// The offset is solved from the clamped scale so the anchor stays put
    /// even when the requested scale is out of range.
    pub fn zoom_to(&mut self, anchor: Point, new_scale: f64, min: f64, max: f64) {
        let world = self.world_from_screen(anchor);
        self.scale = new_scale.clamp(min, max);
        self.offset = Point::new(
            anchor.x - world.x * self.scale,
            anchor.y - world.y * self.scale,
        );
    }

    /// Multiplicative wheel zoom: one notch scales by `exp(intensity)`.
    /// Negative `delta_y` (wheel up) zooms in.
    pub fn zoom_at(&mut self, anchor: Point, delta_y: f64, intensity: f64, min: f64, max: f64) {
        if delta_y == 0.0 {
            return;
        }
        let direction = if delta_y < 0.0 { 1.0 } else { -1.0 };
        let factor = (direction * intensity).exp();
        self.zoom_to(anchor, self.scale * factor, min, max);
    }

    /// Offset that puts `world` at `screen_target` for the given scale.
    pub fn offset_for(world: Point, screen_target: Point, scale: f64) -> Point {
        Point::new(
            screen_target.x - world.x * scale,
            screen_target.y - world.y * scale,
        )
    }
}
