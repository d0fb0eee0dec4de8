use engine::{Color, DrawContext, Vec2};

use crate::app::world::thing::{DrawView, Drawable, Placed, ThingCommand, TickContext, Tickable};

const PUFF_SECONDS: f32 = 0.6;
const PUFF_START_SIZE: f32 = 40.0;
const PUFF_END_SIZE: f32 = 160.0;
const PUFF_Z: f32 = 10.0;

/// Dust cloud left behind by an opened container. Removes itself when done.
#[derive(Debug)]
pub(crate) struct Puff {
    x: f32,
    y: f32,
    age: f32,
}

impl Puff {
    pub(crate) fn new(x: f32, y: f32) -> Self {
        Self { x, y, age: 0.0 }
    }

    fn progress(&self) -> f32 {
        (self.age / PUFF_SECONDS).clamp(0.0, 1.0)
    }
}

impl Tickable for Puff {
    fn tick(&mut self, dt: f32, ctx: &TickContext, out: &mut Vec<ThingCommand>) {
        let was_done = self.age >= PUFF_SECONDS;
        self.age += dt;
        if !was_done && self.age >= PUFF_SECONDS {
            out.push(ThingCommand::Disown(ctx.this));
        }
    }
}

impl Drawable for Puff {
    fn draw(&self, ctx: &mut dyn DrawContext, _view: &DrawView<'_>) {
        let t = self.progress();
        let size = PUFF_START_SIZE + (PUFF_END_SIZE - PUFF_START_SIZE) * t;
        ctx.save();
        ctx.set_alpha(1.0 - t);
        ctx.fill_rect(
            self.x - size / 2.0,
            self.y - size / 2.0,
            size,
            size,
            Color::PAPER,
        );
        ctx.restore();
    }
}

impl Placed for Puff {
    fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    fn set_position(&mut self, position: Vec2) {
        self.x = position.x;
        self.y = position.y;
    }

    fn z(&self) -> f32 {
        PUFF_Z
    }
}
