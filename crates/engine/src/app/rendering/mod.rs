mod pixel_canvas;
mod recording;
mod renderer;
mod transform;

pub use pixel_canvas::PixelCanvas;
pub use recording::{DrawCommand, RecordingCanvas};
pub use renderer::Renderer;
pub use transform::{Affine2, Vec2};

use crate::assets::ImageHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const GOLD: Self = Self::rgb(255, 215, 0);
    pub const CORAL: Self = Self::rgb(255, 127, 80);
    pub const DARK_RED: Self = Self::rgb(139, 0, 0);
    pub const PURPLE: Self = Self::rgb(128, 0, 128);
    pub const PAPER: Self = Self::rgb(246, 238, 219);
    pub const INK: Self = Self::rgb(42, 33, 48);
    pub const SLOT: Self = Self::rgb(64, 52, 72);
    pub const DEBUG_GREEN: Self = Self::rgb(80, 220, 120);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub const fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Canvas-style immediate drawing surface.
///
/// Coordinates passed to the fill/draw calls are local and go through the
/// current transform, which `save`/`restore` push and pop together with alpha.
pub trait DrawContext {
    fn size(&self) -> (u32, u32);
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, dx: f32, dy: f32);
    fn scale(&mut self, sx: f32, sy: f32);
    fn transform(&self) -> Affine2;
    fn set_alpha(&mut self, alpha: f32);
    fn alpha(&self) -> f32;
    /// Fills the whole surface, ignoring the transform.
    fn clear(&mut self, color: Color);
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color);
    /// Fills a convex quad given in winding order.
    fn fill_quad(&mut self, corners: [Vec2; 4], color: Color);
    fn draw_image(&mut self, image: &ImageHandle, x: f32, y: f32, width: f32, height: f32);
    fn fill_text(&mut self, text: &str, x: f32, y: f32, size: f32, color: Color);
}

/// Pixel width of `text` at `size` using the built-in bitmap font.
pub fn measure_text(text: &str, size: f32) -> f32 {
    pixel_canvas::text_advance(size) * text.chars().count() as f32
}
