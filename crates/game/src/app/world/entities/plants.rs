use engine::{Color, DrawContext, ImageHandle, Vec2};
use serde::{Deserialize, Serialize};

use super::centred_box_contains;
use crate::app::world::registry::{LoadContext, Persisted, Registry, RegistryError};
use crate::app::world::thing::{
    DrawView, Drawable, Placed, PointerHittable, RoomGeometry, ThingCommand, TickContext,
    Tickable,
};

const POT: &str = "plants/pot.png";
const SWAY: f32 = 0.2;

/// One swaying plant drawn above the pot, offset from the pot centre.
struct Leaf {
    image: &'static str,
    offset: Vec2,
    timescale: f32,
}

const LEAVES: [Leaf; 4] = [
    Leaf {
        image: "plants/big.png",
        offset: Vec2 { x: 20.0, y: -505.0 },
        timescale: 1.0,
    },
    Leaf {
        image: "plants/medium.png",
        offset: Vec2 { x: -230.0, y: -320.0 },
        timescale: 8.0,
    },
    Leaf {
        image: "plants/small.png",
        offset: Vec2 { x: -100.0, y: -195.0 },
        timescale: 12.0,
    },
    Leaf {
        image: "plants/tiny.png",
        offset: Vec2 { x: 75.0, y: -40.0 },
        timescale: 15.0,
    },
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlantsRecord {
    pub(crate) x: f32,
    pub(crate) y: f32,
    #[serde(default)]
    pub(crate) z: f32,
}

/// The singing pot plants. They sway on the game clock and can only be
/// picked up in debug mode.
#[derive(Debug)]
pub(crate) struct Plants {
    record: PlantsRecord,
    pot: ImageHandle,
    leaves: Vec<ImageHandle>,
    t: f32,
}

impl Plants {
    /// Vertical stretch of leaf `index` at the current time.
    pub(crate) fn leaf_scale(&self, index: usize) -> f32 {
        LEAVES
            .get(index)
            .map_or(1.0, |leaf| 1.0 + SWAY * (self.t * leaf.timescale).sin())
    }

    fn size(&self) -> (f32, f32) {
        (self.pot.width() as f32, self.pot.height() as f32)
    }
}

impl Tickable for Plants {
    fn tick(&mut self, dt: f32, _ctx: &TickContext, _out: &mut Vec<ThingCommand>) {
        self.t += dt;
    }
}

impl Drawable for Plants {
    fn draw(&self, ctx: &mut dyn DrawContext, view: &DrawView<'_>) {
        let (width, height) = self.size();
        let (x, y) = (self.record.x, self.record.y);
        ctx.draw_image(&self.pot, x - width / 2.0, y - height / 2.0, width, height);
        for (index, (leaf, image)) in LEAVES.iter().zip(&self.leaves).enumerate() {
            let scale = self.leaf_scale(index);
            let leaf_height = image.height() as f32;
            ctx.save();
            // Stretch upwards from the leaf's base.
            ctx.translate(
                x + leaf.offset.x,
                y + leaf.offset.y + leaf_height - leaf_height * scale,
            );
            ctx.scale(1.0, scale);
            ctx.draw_image(image, 0.0, 0.0, image.width() as f32, leaf_height);
            ctx.restore();
        }

        if view.debug {
            for index in 0..LEAVES.len() {
                let bar = (self.leaf_scale(index) - 1.0 + SWAY) * 250.0;
                ctx.fill_rect(x - 300.0 + index as f32 * 12.0, y - 100.0, 10.0, bar, Color::DARK_RED);
            }
        }
    }
}

impl PointerHittable for Plants {
    fn is_under_pointer(&self, x: f32, y: f32, _geometry: &RoomGeometry) -> bool {
        let (width, height) = self.size();
        centred_box_contains(self.record.x, self.record.y, width, height, x, y)
    }

    fn debug_only(&self) -> bool {
        true
    }
}

impl Placed for Plants {
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

impl Persisted for Plants {
    const TAG: &'static str = "Plants";
    type Record = PlantsRecord;

    fn from_record(record: PlantsRecord, ctx: &mut LoadContext<'_>) -> Result<Self, RegistryError> {
        let pot = ctx
            .assets
            .load_image(POT)
            .map_err(LoadContext::asset_error(Self::TAG))?;
        let urls: Vec<String> = LEAVES.iter().map(|leaf| leaf.image.to_string()).collect();
        let leaves = ctx
            .assets
            .load_images(&urls)
            .map_err(LoadContext::asset_error(Self::TAG))?;
        Ok(Self {
            record,
            pot,
            leaves,
            t: 0.0,
        })
    }

    fn to_record(&self, _registry: &Registry) -> Result<PlantsRecord, RegistryError> {
        Ok(self.record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::world::entities::fixtures::{geometry, thing_id};
    use crate::app::world::thing::ThingIdAllocator;
    use engine::{MemoryAssetLoader, RecordingCanvas};

    fn plants() -> Plants {
        let registry = Registry::new();
        let mut assets = MemoryAssetLoader::new();
        let mut ids = ThingIdAllocator::default();
        let mut ctx = LoadContext {
            assets: &mut assets,
            ids: &mut ids,
            registry: &registry,
            room: None,
        };
        let record = PlantsRecord {
            x: 800.0,
            y: 500.0,
            z: 2.0,
        };
        Plants::from_record(record, &mut ctx).expect("plants load")
    }

    #[test]
    fn leaves_sway_with_the_clock() {
        let mut plants = plants();
        assert_eq!(plants.leaf_scale(0), 1.0);
        let ctx = TickContext { this: thing_id() };
        plants.tick(0.1, &ctx, &mut Vec::new());
        let tiny = plants.leaf_scale(3);
        assert!((tiny - (1.0 + SWAY * 1.5f32.sin())).abs() < 1e-5);
        assert!(plants.leaf_scale(0) < tiny);
    }

    #[test]
    fn hit_box_is_the_pot_and_debug_only() {
        let plants = plants();
        let geometry = geometry();
        assert!(plants.debug_only());
        assert!(plants.is_under_pointer(810.0, 490.0, &geometry));
        assert!(!plants.is_under_pointer(900.0, 500.0, &geometry));
    }

    #[test]
    fn record_round_trips() {
        let plants = plants();
        let record = plants.to_record(&Registry::new()).expect("record");
        assert_eq!(record, PlantsRecord { x: 800.0, y: 500.0, z: 2.0 });
    }

    #[test]
    fn debug_draw_adds_sway_bars() {
        let plants = plants();
        let geometry = geometry();
        let mut quiet = RecordingCanvas::new(1600, 900);
        plants.draw(&mut quiet, &DrawView { debug: false, geometry, player: None });
        let mut debug = RecordingCanvas::new(1600, 900);
        plants.draw(&mut debug, &DrawView { debug: true, geometry, player: None });
        assert_eq!(debug.commands().len(), quiet.commands().len() + LEAVES.len());
    }
}
