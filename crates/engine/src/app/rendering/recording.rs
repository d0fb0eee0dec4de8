use crate::assets::ImageHandle;

use super::{Affine2, Color, DrawContext, Vec2};

/// One recorded draw call, already mapped into screen space.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    Rect {
        origin: Vec2,
        size: Vec2,
        color: Color,
        alpha: f32,
    },
    Quad {
        corners: [Vec2; 4],
        color: Color,
        alpha: f32,
    },
    Image {
        url: String,
        origin: Vec2,
        size: Vec2,
        alpha: f32,
    },
    Text {
        text: String,
        origin: Vec2,
        size: f32,
        alpha: f32,
    },
}

/// Headless `DrawContext` that keeps a log of what would have been drawn.
#[derive(Debug)]
pub struct RecordingCanvas {
    width: u32,
    height: u32,
    transform: Affine2,
    alpha: f32,
    stack: Vec<(Affine2, f32)>,
    commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            transform: Affine2::IDENTITY,
            alpha: 1.0,
            stack: Vec::new(),
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn images(&self) -> impl Iterator<Item = (&str, Vec2)> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Image { url, origin, .. } => Some((url.as_str(), *origin)),
            _ => None,
        })
    }

    /// Number of `save` calls still waiting for a matching `restore`.
    pub fn save_depth(&self) -> usize {
        self.stack.len()
    }

    fn scaled(&self, width: f32, height: f32) -> Vec2 {
        Vec2::new(width * self.transform.scale_x, height * self.transform.scale_y)
    }
}

impl DrawContext for RecordingCanvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn save(&mut self) {
        self.stack.push((self.transform, self.alpha));
    }

    fn restore(&mut self) {
        if let Some((transform, alpha)) = self.stack.pop() {
            self.transform = transform;
            self.alpha = alpha;
        }
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.transform = self.transform.then_translate(dx, dy);
    }

    fn scale(&mut self, sx: f32, sy: f32) {
        self.transform = self.transform.then_scale(sx, sy);
    }

    fn transform(&self) -> Affine2 {
        self.transform
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    fn alpha(&self) -> f32 {
        self.alpha
    }

    fn clear(&mut self, color: Color) {
        self.commands.push(DrawCommand::Clear(color));
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        self.commands.push(DrawCommand::Rect {
            origin: self.transform.apply(Vec2::new(x, y)),
            size: self.scaled(width, height),
            color,
            alpha: self.alpha,
        });
    }

    fn fill_quad(&mut self, corners: [Vec2; 4], color: Color) {
        self.commands.push(DrawCommand::Quad {
            corners: corners.map(|corner| self.transform.apply(corner)),
            color,
            alpha: self.alpha,
        });
    }

    fn draw_image(&mut self, image: &ImageHandle, x: f32, y: f32, width: f32, height: f32) {
        self.commands.push(DrawCommand::Image {
            url: image.url().to_string(),
            origin: self.transform.apply(Vec2::new(x, y)),
            size: self.scaled(width, height),
            alpha: self.alpha,
        });
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, size: f32, _color: Color) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            origin: self.transform.apply(Vec2::new(x, y)),
            size: size * self.transform.scale_y,
            alpha: self.alpha,
        });
    }
}
