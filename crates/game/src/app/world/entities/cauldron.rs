use engine::{Color, DrawContext, Vec2};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::centred_box_contains;
use crate::app::world::catalog::{find_recipe, ItemRef, MaterialType};
use crate::app::world::registry::{LoadContext, Persisted, Registry, RegistryError};
use crate::app::world::thing::{
    ClickContext, Clickable, DebugResizable, DrawView, Drawable, Placed, PointerHittable,
    RoomGeometry, ThingCommand, TickContext, Tickable,
};

pub(crate) const CAULDRON_CAPACITY: usize = 5;
const BUBBLE_SIZE: f32 = 14.0;
const BUBBLE_GAP: f32 = 6.0;

fn default_z() -> f32 {
    -1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BrewingMaterial {
    pub(crate) material_type: MaterialType,
    pub(crate) time_spent_in_cauldron: f32,
}

impl BrewingMaterial {
    fn is_ready(&self) -> bool {
        let info = self.material_type.info();
        self.time_spent_in_cauldron > info.brew_time
            && self.time_spent_in_cauldron < info.expire_time
    }

    fn is_spoiled(&self) -> bool {
        self.time_spent_in_cauldron >= self.material_type.info().expire_time
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CauldronRecord {
    pub(crate) x: f32,
    pub(crate) y: f32,
    #[serde(default = "default_z")]
    pub(crate) z: f32,
    pub(crate) width: f32,
    pub(crate) height: f32,
    #[serde(default)]
    pub(crate) brewing: Vec<BrewingMaterial>,
}

#[derive(Debug)]
pub(crate) struct Cauldron {
    record: CauldronRecord,
}

impl Cauldron {
    pub(crate) fn brewing(&self) -> &[BrewingMaterial] {
        &self.record.brewing
    }

    /// Drops a material in. Refuses when full.
    pub(crate) fn put_item(&mut self, material: MaterialType, out: &mut Vec<ThingCommand>) -> bool {
        if self.record.brewing.len() >= CAULDRON_CAPACITY {
            out.push(ThingCommand::toast("I'm a cauldron not a storage unit!"));
            return false;
        }
        self.record.brewing.push(BrewingMaterial {
            material_type: material,
            time_spent_in_cauldron: 0.0,
        });
        out.push(ThingCommand::Save);
        true
    }

    fn brew(&mut self, out: &mut Vec<ThingCommand>) {
        let successful = self.record.brewing.iter().all(BrewingMaterial::is_ready);
        if successful {
            let ingredients: Vec<MaterialType> = self
                .record
                .brewing
                .iter()
                .map(|brewing| brewing.material_type)
                .collect();
            match find_recipe(&ingredients) {
                Some(potion) => {
                    info!(potion = potion.key(), "potion_brewed");
                    out.push(ThingCommand::toast(format!("You made a {}!", potion.name())));
                    out.push(ThingCommand::GiveItem(ItemRef::Potion(potion)));
                }
                None => out.push(ThingCommand::toast("You made something dubious")),
            }
        } else {
            out.push(ThingCommand::toast("oh no"));
        }
        self.record.brewing.clear();
        out.push(ThingCommand::Save);
    }
}

impl Tickable for Cauldron {
    fn tick(&mut self, dt: f32, _ctx: &TickContext, _out: &mut Vec<ThingCommand>) {
        for brewing in &mut self.record.brewing {
            brewing.time_spent_in_cauldron += dt;
        }
    }
}

impl PointerHittable for Cauldron {
    fn is_under_pointer(&self, x: f32, y: f32, _geometry: &RoomGeometry) -> bool {
        let c = &self.record;
        centred_box_contains(c.x, c.y, c.width, c.height, x, y)
    }
}

impl Clickable for Cauldron {
    fn do_click(
        &mut self,
        x: f32,
        y: f32,
        ctx: &ClickContext<'_>,
        out: &mut Vec<ThingCommand>,
    ) -> bool {
        if !self.is_under_pointer(x, y, ctx.geometry) || self.record.brewing.is_empty() {
            return false;
        }
        if ctx.player.is_some_and(|player| player.free_slots == 0) {
            out.push(ThingCommand::toast("Make some room in your pockets first"));
            return true;
        }
        self.brew(out);
        true
    }
}

impl Drawable for Cauldron {
    fn draw(&self, ctx: &mut dyn DrawContext, view: &DrawView<'_>) {
        let c = &self.record;
        if view.debug {
            ctx.fill_rect(
                c.x - c.width / 2.0,
                c.y - c.height / 2.0,
                c.width,
                c.height,
                Color::BLACK.with_alpha(160),
            );
        }
        let count = c.brewing.len() as f32;
        let row = count * BUBBLE_SIZE + (count - 1.0).max(0.0) * BUBBLE_GAP;
        let mut bubble_x = c.x - row / 2.0;
        let bubble_y = c.y - c.height / 2.0 - BUBBLE_SIZE - BUBBLE_GAP;
        for brewing in &c.brewing {
            let color = if brewing.is_ready() {
                Color::DEBUG_GREEN
            } else if brewing.is_spoiled() {
                Color::DARK_RED
            } else {
                Color::PAPER
            };
            ctx.fill_rect(bubble_x, bubble_y, BUBBLE_SIZE, BUBBLE_SIZE, color);
            bubble_x += BUBBLE_SIZE + BUBBLE_GAP;
        }
    }
}

impl DebugResizable for Cauldron {
    fn debug_resize(&mut self, dx: f32, dy: f32) {
        self.record.width = (self.record.width + dx / 50.0).max(1.0);
        self.record.height = (self.record.height - dy / 50.0).max(1.0);
    }
}

impl Placed for Cauldron {
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

impl Persisted for Cauldron {
    const TAG: &'static str = "Cauldron";
    type Record = CauldronRecord;

    fn from_record(record: CauldronRecord, _ctx: &mut LoadContext<'_>) -> Result<Self, RegistryError> {
        Ok(Self { record })
    }

    fn to_record(&self, _registry: &Registry) -> Result<CauldronRecord, RegistryError> {
        Ok(self.record.clone())
    }
}
