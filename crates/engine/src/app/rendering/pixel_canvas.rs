use crate::assets::ImageHandle;

use super::{Affine2, Color, DrawContext, Vec2};

const GLYPH_ROWS: usize = 5;
const GLYPH_COLS: u8 = 3;
const GLYPH_ADVANCE_CELLS: f32 = 4.0;
const GLYPH_HEIGHT_CELLS: f32 = 6.0;

#[derive(Debug, Clone, Copy)]
struct CanvasState {
    transform: Affine2,
    alpha: f32,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            transform: Affine2::IDENTITY,
            alpha: 1.0,
        }
    }
}

/// Software rasterizer over an RGBA8 frame such as the one `pixels` hands out.
pub struct PixelCanvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
    state: CanvasState,
    stack: Vec<CanvasState>,
}

impl<'a> PixelCanvas<'a> {
    pub fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            frame,
            width,
            height,
            state: CanvasState::default(),
            stack: Vec::new(),
        }
    }

    fn blend_pixel(&mut self, x: i32, y: i32, color: Color) {
        let alpha = (color.a as f32 / 255.0) * self.state.alpha;
        blend_pixel_rgba_clipped(self.frame, self.width, self.height, x, y, color, alpha);
    }

    fn screen_rect(&self, x: f32, y: f32, width: f32, height: f32) -> Option<(i32, i32, i32, i32)> {
        let a = self.state.transform.apply(Vec2::new(x, y));
        let b = self.state.transform.apply(Vec2::new(x + width, y + height));
        let left = a.x.min(b.x).round() as i32;
        let right = a.x.max(b.x).round() as i32;
        let top = a.y.min(b.y).round() as i32;
        let bottom = a.y.max(b.y).round() as i32;

        let left = left.max(0);
        let top = top.max(0);
        let right = right.min(self.width as i32);
        let bottom = bottom.min(self.height as i32);
        (left < right && top < bottom).then_some((left, top, right, bottom))
    }
}

impl DrawContext for PixelCanvas<'_> {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.state.transform = self.state.transform.then_translate(dx, dy);
    }

    fn scale(&mut self, sx: f32, sy: f32) {
        self.state.transform = self.state.transform.then_scale(sx, sy);
    }

    fn transform(&self) -> Affine2 {
        self.state.transform
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.state.alpha = alpha.clamp(0.0, 1.0);
    }

    fn alpha(&self) -> f32 {
        self.state.alpha
    }

    fn clear(&mut self, color: Color) {
        let rgba = color.to_rgba();
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&rgba);
        }
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        let Some((left, top, right, bottom)) = self.screen_rect(x, y, width, height) else {
            return;
        };
        for py in top..bottom {
            for px in left..right {
                self.blend_pixel(px, py, color);
            }
        }
    }

    fn fill_quad(&mut self, corners: [Vec2; 4], color: Color) {
        let screen = corners.map(|corner| self.state.transform.apply(corner));
        let min_x = screen.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
        let max_x = screen.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
        let min_y = screen.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        let max_y = screen.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
        if !(min_x.is_finite() && max_x.is_finite() && min_y.is_finite() && max_y.is_finite()) {
            return;
        }

        let left = (min_x.floor() as i32).max(0);
        let right = (max_x.ceil() as i32).min(self.width as i32);
        let top = (min_y.floor() as i32).max(0);
        let bottom = (max_y.ceil() as i32).min(self.height as i32);
        for py in top..bottom {
            for px in left..right {
                let center = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                if point_in_convex_quad(&screen, center) {
                    self.blend_pixel(px, py, color);
                }
            }
        }
    }

    fn draw_image(&mut self, image: &ImageHandle, x: f32, y: f32, width: f32, height: f32) {
        if image.width() == 0 || image.height() == 0 || width <= 0.0 || height <= 0.0 {
            return;
        }
        let top_left = self.state.transform.apply(Vec2::new(x, y));
        let bottom_right = self.state.transform.apply(Vec2::new(x + width, y + height));
        let dest_w = bottom_right.x - top_left.x;
        let dest_h = bottom_right.y - top_left.y;
        if dest_w <= 0.0 || dest_h <= 0.0 {
            return;
        }
        let Some((left, top, right, bottom)) = self.screen_rect(x, y, width, height) else {
            return;
        };

        let rgba = image.rgba();
        let src_w = image.width();
        let src_h = image.height();
        for py in top..bottom {
            let v = (py as f32 + 0.5 - top_left.y) / dest_h;
            let src_y = ((v * src_h as f32).floor() as u32).min(src_h - 1) as usize;
            for px in left..right {
                let u = (px as f32 + 0.5 - top_left.x) / dest_w;
                let src_x = ((u * src_w as f32).floor() as u32).min(src_w - 1) as usize;
                let offset = (src_y * src_w as usize + src_x) * 4;
                let Some(texel) = rgba.get(offset..offset + 4) else {
                    continue;
                };
                if texel[3] == 0 {
                    continue;
                }
                self.blend_pixel(
                    px,
                    py,
                    Color {
                        r: texel[0],
                        g: texel[1],
                        b: texel[2],
                        a: texel[3],
                    },
                );
            }
        }
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, size: f32, color: Color) {
        let cell_local = size / GLYPH_HEIGHT_CELLS;
        let top_local = y - size;
        let mut pen_x = x;
        for ch in text.chars() {
            let rows = glyph(ch);
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_COLS {
                    if bits & (0b100 >> col) == 0 {
                        continue;
                    }
                    self.fill_rect(
                        pen_x + col as f32 * cell_local,
                        top_local + row as f32 * cell_local,
                        cell_local,
                        cell_local,
                        color,
                    );
                }
            }
            pen_x += cell_local * GLYPH_ADVANCE_CELLS;
        }
    }
}

pub(super) fn text_advance(size: f32) -> f32 {
    size / GLYPH_HEIGHT_CELLS * GLYPH_ADVANCE_CELLS
}

fn point_in_convex_quad(corners: &[Vec2; 4], point: Vec2) -> bool {
    let mut sign = 0.0f32;
    for index in 0..corners.len() {
        let a = corners[index];
        let b = corners[(index + 1) % corners.len()];
        let cross = (b.x - a.x) * (point.y - a.y) - (b.y - a.y) * (point.x - a.x);
        if cross.abs() < f32::EPSILON {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

fn blend_pixel_rgba_clipped(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    color: Color,
    alpha: f32,
) {
    if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 || alpha <= 0.0 {
        return;
    }
    let Some(pixel_offset) = (y as usize)
        .checked_mul(width as usize)
        .and_then(|row| row.checked_add(x as usize))
    else {
        return;
    };
    let byte_offset = pixel_offset * 4;
    let Some(dst) = frame.get_mut(byte_offset..byte_offset + 4) else {
        return;
    };

    let alpha = alpha.min(1.0);
    let src = color.to_rgba();
    for channel in 0..3 {
        let blended = src[channel] as f32 * alpha + dst[channel] as f32 * (1.0 - alpha);
        dst[channel] = blended.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = 255;
}

fn glyph(ch: char) -> [u8; GLYPH_ROWS] {
    match ch.to_ascii_uppercase() {
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b110, 0b001, 0b010, 0b100, 0b111],
        '3' => [0b110, 0b001, 0b010, 0b001, 0b110],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b110, 0b001, 0b110],
        '6' => [0b011, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b110],
        ' ' => [0; GLYPH_ROWS],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '\'' | '\u{2019}' => [0b010, 0b010, 0b000, 0b000, 0b000],
        '"' => [0b101, 0b101, 0b000, 0b000, 0b000],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '<' => [0b001, 0b010, 0b100, 0b010, 0b001],
        '>' => [0b100, 0b010, 0b001, 0b010, 0b100],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        _ => [0b110, 0b001, 0b010, 0b000, 0b010],
    }
}
