use engine::{DrawContext, ImageHandle, Vec2};
use serde::{Deserialize, Serialize};

use super::corner_box_contains;
use crate::app::world::registry::{LoadContext, Persisted, Registry, RegistryError};
use crate::app::world::thing::{
    DebugResizable, DrawView, Drawable, Placed, PointerHittable, RoomGeometry, ThingCommand,
    TickContext, Tickable,
};

fn default_looping() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnimatedObjectRecord {
    pub(crate) x: f32,
    pub(crate) y: f32,
    #[serde(default)]
    pub(crate) z: f32,
    pub(crate) frames: Vec<String>,
    /// Frames per second.
    pub(crate) frame_rate: f32,
    pub(crate) visible: bool,
    pub(crate) animating: bool,
    #[serde(default = "default_looping")]
    pub(crate) looping: bool,
}

#[derive(Debug)]
pub(crate) struct AnimatedObject {
    record: AnimatedObjectRecord,
    frames: Vec<ImageHandle>,
    t: f32,
}

impl AnimatedObject {
    /// Plays the animation again from the first frame.
    pub(crate) fn restart(&mut self) {
        self.t = 0.0;
        self.record.animating = true;
    }

    pub(crate) fn is_animating(&self) -> bool {
        self.record.animating
    }

    pub(crate) fn frame_index(&self) -> usize {
        if !self.record.animating {
            return 0;
        }
        let frame = (self.t * self.record.frame_rate).floor().max(0.0) as usize;
        frame % self.frames.len()
    }

    fn size(&self) -> (f32, f32) {
        let first = &self.frames[0];
        (first.width() as f32, first.height() as f32)
    }
}

impl Tickable for AnimatedObject {
    fn tick(&mut self, dt: f32, _ctx: &TickContext, _out: &mut Vec<ThingCommand>) {
        if !self.record.animating {
            return;
        }
        self.t += dt;
        let played = self.t * self.record.frame_rate;
        if !self.record.looping && played >= self.frames.len() as f32 {
            self.record.animating = false;
            self.t = 0.0;
        }
    }
}

impl Drawable for AnimatedObject {
    fn draw(&self, ctx: &mut dyn DrawContext, _view: &DrawView<'_>) {
        if !self.record.visible {
            return;
        }
        let (width, height) = self.size();
        let frame = &self.frames[self.frame_index()];
        ctx.draw_image(frame, self.record.x, self.record.y, width, height);
    }
}

impl PointerHittable for AnimatedObject {
    fn is_under_pointer(&self, x: f32, y: f32, _geometry: &RoomGeometry) -> bool {
        if !self.record.visible {
            return false;
        }
        let (width, height) = self.size();
        corner_box_contains(self.record.x, self.record.y, width, height, x, y)
    }
}

impl DebugResizable for AnimatedObject {
    fn debug_resize(&mut self, _dx: f32, dy: f32) {
        self.record.frame_rate = (self.record.frame_rate - dy / 1140.0).max(0.0);
    }
}

impl Placed for AnimatedObject {
    fn position(&self) -> Vec2 {
        Vec2::new(self.record.x, self.record.y)
    }

    fn set_position(&mut self, position: Vec2) {
        self.record.x = position.x;
        self.record.y = position.y;
    }

    fn z(&self) -> f32 {
        self.record.z
    }
}

impl Persisted for AnimatedObject {
    const TAG: &'static str = "AnimatedObject";
    type Record = AnimatedObjectRecord;

    fn from_record(
        record: AnimatedObjectRecord,
        ctx: &mut LoadContext<'_>,
    ) -> Result<Self, RegistryError> {
        let frames = ctx
            .assets
            .load_images(&record.frames)
            .map_err(LoadContext::asset_error(Self::TAG))?;
        let Some(first) = frames.first() else {
            return Err(RegistryError::Content {
                tag: Self::TAG,
                message: "cannot animate zero frames".to_string(),
            });
        };
        let (width, height) = (first.width(), first.height());
        if let Some(odd) = frames
            .iter()
            .find(|frame| frame.width() != width || frame.height() != height)
        {
            return Err(RegistryError::Content {
                tag: Self::TAG,
                message: format!(
                    "frame {} is {}x{} but the first frame {} is {width}x{height}",
                    odd.url(),
                    odd.width(),
                    odd.height(),
                    first.url()
                ),
            });
        }
        Ok(Self {
            record,
            frames,
            t: 0.0,
        })
    }

    fn to_record(&self, _registry: &Registry) -> Result<AnimatedObjectRecord, RegistryError> {
        Ok(self.record.clone())
    }
}
