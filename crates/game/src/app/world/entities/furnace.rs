use engine::{Color, DrawContext, Vec2};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::centred_box_contains;
use crate::app::world::catalog::{ItemRef, MaterialType, PuzzleObjectType};
use crate::app::world::registry::{LoadContext, Persisted, Registry, RegistryError};
use crate::app::world::thing::{
    ClickContext, Clickable, DebugResizable, DrawView, Drawable, Placed, PointerHittable,
    RoomGeometry, ThingCommand, TickContext, Tickable,
};

const GRAVITY_STONE_SECONDS: f32 = 5.0;
const HOT_STONE_SECONDS: f32 = 0.5;

fn default_z() -> f32 {
    -1.0
}

fn default_finished() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FurnaceRecord {
    pub(crate) x: f32,
    pub(crate) y: f32,
    #[serde(default = "default_z")]
    pub(crate) z: f32,
    pub(crate) width: f32,
    pub(crate) height: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) contents: Option<ItemRef>,
    #[serde(default)]
    pub(crate) furnace_time: f32,
    #[serde(default = "default_finished")]
    pub(crate) finished_cooking: bool,
}

#[derive(Debug)]
pub(crate) struct Furnace {
    record: FurnaceRecord,
}

impl Furnace {
    pub(crate) fn contents(&self) -> Option<ItemRef> {
        self.record.contents
    }

    /// Returns true when the furnace took (or destroyed) the item.
    pub(crate) fn put_object_in(&mut self, item: ItemRef, out: &mut Vec<ThingCommand>) -> bool {
        if self.record.contents.is_some() {
            out.push(ThingCommand::toast("There's already something in the furnace"));
            return false;
        }
        match item {
            ItemRef::PuzzleObject(object) if object.is_key() => {
                out.push(ThingCommand::toast(format!(
                    "The {} melts into a puddle!",
                    item.name()
                )));
            }
            ItemRef::Material(MaterialType::GravityStone) => {
                self.start_cooking(item, GRAVITY_STONE_SECONDS);
            }
            ItemRef::PuzzleObject(PuzzleObjectType::HotGravityStone) => {
                self.start_cooking(item, HOT_STONE_SECONDS);
            }
            ItemRef::PuzzleObject(PuzzleObjectType::HotFloatingGravityStone) => {
                out.push(ThingCommand::toast(
                    "The stone floated up the flue! Maybe it's upstairs...",
                ));
                out.push(ThingCommand::IncreaseProgress(
                    "recovered-gravity-stone".to_string(),
                ));
            }
            _ => out.push(ThingCommand::toast(format!(
                "The {} burns to ash!",
                item.name()
            ))),
        }
        out.push(ThingCommand::Save);
        true
    }

    fn start_cooking(&mut self, item: ItemRef, seconds: f32) {
        self.record.contents = Some(item);
        self.record.furnace_time = seconds;
        self.record.finished_cooking = false;
    }

    fn finish_cooking(&mut self, out: &mut Vec<ThingCommand>) {
        self.record.finished_cooking = true;
        let Some(contents) = self.record.contents else {
            return;
        };
        let cooked = match contents {
            ItemRef::Material(MaterialType::GravityStone)
            | ItemRef::PuzzleObject(PuzzleObjectType::HotGravityStone) => {
                ItemRef::PuzzleObject(PuzzleObjectType::HotGravityStone)
            }
            other => other,
        };
        self.record.contents = Some(cooked);
        info!(item = %cooked, "furnace_finished");
        out.push(ThingCommand::toast(format!("Done cooking {}", cooked.name())));
        out.push(ThingCommand::Save);
    }
}

impl Tickable for Furnace {
    fn tick(&mut self, dt: f32, _ctx: &TickContext, out: &mut Vec<ThingCommand>) {
        if self.record.contents.is_none() || self.record.finished_cooking {
            return;
        }
        self.record.furnace_time -= dt;
        if self.record.furnace_time < 0.0 {
            self.finish_cooking(out);
        }
    }
}

impl PointerHittable for Furnace {
    fn is_under_pointer(&self, x: f32, y: f32, _geometry: &RoomGeometry) -> bool {
        let f = &self.record;
        centred_box_contains(f.x, f.y, f.width, f.height, x, y)
    }
}

impl Clickable for Furnace {
    fn do_click(
        &mut self,
        x: f32,
        y: f32,
        ctx: &ClickContext<'_>,
        out: &mut Vec<ThingCommand>,
    ) -> bool {
        if !self.is_under_pointer(x, y, ctx.geometry) {
            return false;
        }
        match self.record.contents {
            None => out.push(ThingCommand::toast("It's a furnace")),
            Some(_) if !self.record.finished_cooking => {
                out.push(ThingCommand::toast("It's still cooking"));
            }
            Some(_) if ctx.player.is_some_and(|player| player.free_slots == 0) => {
                out.push(ThingCommand::toast("Your pockets are full!"));
            }
            Some(contents) => {
                self.record.contents = None;
                out.push(ThingCommand::GiveItem(contents));
                out.push(ThingCommand::Save);
            }
        }
        true
    }
}

impl Drawable for Furnace {
    fn draw(&self, ctx: &mut dyn DrawContext, view: &DrawView<'_>) {
        let f = &self.record;
        if view.debug {
            ctx.fill_rect(
                f.x - f.width / 2.0,
                f.y - f.height / 2.0,
                f.width,
                f.height,
                Color::DARK_RED.with_alpha(160),
            );
        }
        if f.contents.is_some() && !f.finished_cooking {
            ctx.fill_rect(f.x - 20.0, f.y + f.height / 2.0 - 12.0, 40.0, 8.0, Color::CORAL);
        }
    }
}

impl DebugResizable for Furnace {
    fn debug_resize(&mut self, dx: f32, dy: f32) {
        self.record.width = (self.record.width + dx / 50.0).max(1.0);
        self.record.height = (self.record.height - dy / 50.0).max(1.0);
    }
}

impl Placed for Furnace {
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

impl Persisted for Furnace {
    const TAG: &'static str = "Furnace";
    type Record = FurnaceRecord;

    fn from_record(record: FurnaceRecord, _ctx: &mut LoadContext<'_>) -> Result<Self, RegistryError> {
        Ok(Self { record })
    }

    fn to_record(&self, _registry: &Registry) -> Result<FurnaceRecord, RegistryError> {
        Ok(self.record.clone())
    }
}
