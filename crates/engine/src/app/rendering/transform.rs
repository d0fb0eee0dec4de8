use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned affine map: `screen = local * scale + translate`.
///
/// Rooms only ever pan and uniformly scale, so rotation is not modelled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine2 {
    pub scale_x: f32,
    pub scale_y: f32,
    pub translate_x: f32,
    pub translate_y: f32,
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine2 {
    pub const IDENTITY: Self = Self {
        scale_x: 1.0,
        scale_y: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
    };

    /// Applies a translation in the current local space, like `ctx.translate`.
    pub fn then_translate(self, dx: f32, dy: f32) -> Self {
        Self {
            translate_x: self.translate_x + dx * self.scale_x,
            translate_y: self.translate_y + dy * self.scale_y,
            ..self
        }
    }

    /// Applies a scale in the current local space, like `ctx.scale`.
    pub fn then_scale(self, sx: f32, sy: f32) -> Self {
        Self {
            scale_x: self.scale_x * sx,
            scale_y: self.scale_y * sy,
            ..self
        }
    }

    pub fn apply(self, point: Vec2) -> Vec2 {
        Vec2 {
            x: point.x * self.scale_x + self.translate_x,
            y: point.y * self.scale_y + self.translate_y,
        }
    }

    pub fn invert(self, point: Vec2) -> Vec2 {
        Vec2 {
            x: (point.x - self.translate_x) / non_zero(self.scale_x),
            y: (point.y - self.translate_y) / non_zero(self.scale_y),
        }
    }
}

fn non_zero(value: f32) -> f32 {
    if value.abs() < f32::EPSILON {
        f32::EPSILON
    } else {
        value
    }
}
