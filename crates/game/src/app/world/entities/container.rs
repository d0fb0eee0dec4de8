use engine::{Color, DrawContext, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{corner_box_contains, Puff};
use crate::app::world::registry::{LoadContext, Persisted, Registry, RegistryError};
use crate::app::world::thing::{
    ClickContext, Clickable, DebugResizable, DrawView, Drawable, Placed, PointerHittable,
    RoomGeometry, Thing, ThingCommand, ThingId,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ContainerRecord {
    pub(crate) x: f32,
    pub(crate) y: f32,
    #[serde(default)]
    pub(crate) z: f32,
    pub(crate) width: f32,
    pub(crate) height: f32,
    /// Nested tagged thing records spilled into the room on open.
    #[serde(default)]
    pub(crate) items: Vec<Value>,
}

/// A cupboard or crate that empties its contents into the room when opened.
#[derive(Debug)]
pub(crate) struct Container {
    x: f32,
    y: f32,
    z: f32,
    width: f32,
    height: f32,
    items: Vec<Thing>,
    /// Reserved for the puff spawned on open.
    puff_id: Option<ThingId>,
}

impl Container {
    pub(crate) fn item_count(&self) -> usize {
        self.items.len()
    }
}

impl PointerHittable for Container {
    fn is_under_pointer(&self, x: f32, y: f32, _geometry: &RoomGeometry) -> bool {
        corner_box_contains(self.x, self.y, self.width, self.height, x, y)
    }
}

impl Clickable for Container {
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
        if !ctx.player_can_reach(self.x, self.y) {
            return false;
        }
        let mut spilled = std::mem::take(&mut self.items);
        if let Some(puff_id) = self.puff_id.take() {
            spilled.push(Thing::new(
                puff_id,
                Puff::new(self.x + self.width / 2.0, self.y + self.height / 2.0),
            ));
        }
        out.push(ThingCommand::AdoptThings(spilled));
        out.push(ThingCommand::Disown(ctx.this));
        out.push(ThingCommand::Save);
        true
    }
}

impl Drawable for Container {
    fn draw(&self, ctx: &mut dyn DrawContext, view: &DrawView<'_>) {
        if view.debug {
            ctx.fill_rect(self.x, self.y, self.width, self.height, Color::CORAL.with_alpha(160));
        }
    }
}

impl DebugResizable for Container {
    fn debug_resize(&mut self, dx: f32, dy: f32) {
        self.width = (self.width + dx / 100.0).max(1.0);
        self.height = (self.height + dy / 50.0).max(1.0);
    }
}

impl Placed for Container {
    fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    fn set_position(&mut self, position: Vec2) {
        self.x = position.x;
        self.y = position.y;
    }

    fn z(&self) -> f32 {
        self.z
    }
}

impl Persisted for Container {
    const TAG: &'static str = "Container";
    type Record = ContainerRecord;

    fn from_record(record: ContainerRecord, ctx: &mut LoadContext<'_>) -> Result<Self, RegistryError> {
        let registry = ctx.registry;
        let items = record
            .items
            .into_iter()
            .map(|item| registry.deserialize_thing(item, ctx))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            x: record.x,
            y: record.y,
            z: record.z,
            width: record.width,
            height: record.height,
            items,
            puff_id: Some(ctx.ids.allocate()),
        })
    }

    fn to_record(&self, registry: &Registry) -> Result<ContainerRecord, RegistryError> {
        let items = self
            .items
            .iter()
            .map(|item| registry.serialize_thing(item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ContainerRecord {
            x: self.x,
            y: self.y,
            z: self.z,
            width: self.width,
            height: self.height,
            items,
        })
    }
}
