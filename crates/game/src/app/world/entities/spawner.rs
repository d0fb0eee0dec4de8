use engine::{DrawContext, ImageHandle, Vec2};
use serde::{Deserialize, Serialize};

use super::centred_box_contains;
use crate::app::world::catalog::{ItemRef, MaterialType, PuzzleObjectType};
use crate::app::world::registry::{LoadContext, Persisted, Registry, RegistryError};
use crate::app::world::thing::{
    ClickContext, Clickable, DrawView, Drawable, Placed, PlayerView, PointerHittable,
    RoomGeometry, ThingCommand,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResourceSpawnerRecord {
    pub(crate) x: f32,
    pub(crate) y: f32,
    #[serde(default)]
    pub(crate) z: f32,
    pub(crate) resource_type: MaterialType,
    /// Progress level reached when the material is first taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) unlocks: Option<String>,
}

/// A material lying in the world. Never runs out.
#[derive(Debug)]
pub(crate) struct ResourceSpawner {
    record: ResourceSpawnerRecord,
    image: ImageHandle,
}

impl ResourceSpawner {
    pub(crate) fn material(&self) -> MaterialType {
        self.record.resource_type
    }

    /// Moves the spawner and its draw depth together; used by holders such as drawers.
    pub(crate) fn place(&mut self, position: Vec2, z: f32) {
        self.record.x = position.x;
        self.record.y = position.y;
        self.record.z = z;
    }

    fn size(&self) -> (f32, f32) {
        (self.image.width() as f32, self.image.height() as f32)
    }
}

impl PointerHittable for ResourceSpawner {
    fn is_under_pointer(&self, x: f32, y: f32, _geometry: &RoomGeometry) -> bool {
        let (width, height) = self.size();
        centred_box_contains(self.record.x, self.record.y, width, height, x, y)
    }
}

impl Clickable for ResourceSpawner {
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
        if !ctx.player_can_reach(self.record.x, self.record.y) {
            return false;
        }
        out.push(ThingCommand::ShowItemWindow {
            item: ItemRef::Material(self.record.resource_type),
            at: Vec2::new(self.record.x, self.record.y - self.size().1 / 2.0),
            unlocks: self.record.unlocks.clone(),
        });
        true
    }
}

impl Drawable for ResourceSpawner {
    fn draw(&self, ctx: &mut dyn DrawContext, _view: &DrawView<'_>) {
        let (width, height) = self.size();
        ctx.draw_image(
            &self.image,
            self.record.x - width / 2.0,
            self.record.y - height / 2.0,
            width,
            height,
        );
    }
}

impl Placed for ResourceSpawner {
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

impl Persisted for ResourceSpawner {
    const TAG: &'static str = "ResourceSpawner";
    type Record = ResourceSpawnerRecord;

    fn from_record(
        record: ResourceSpawnerRecord,
        ctx: &mut LoadContext<'_>,
    ) -> Result<Self, RegistryError> {
        let image = ctx
            .assets
            .load_image(&ItemRef::Material(record.resource_type).image_url())
            .map_err(LoadContext::asset_error(Self::TAG))?;
        Ok(Self { record, image })
    }

    fn to_record(&self, _registry: &Registry) -> Result<ResourceSpawnerRecord, RegistryError> {
        Ok(self.record.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PuzzleObjectSpawnerRecord {
    pub(crate) x: f32,
    pub(crate) y: f32,
    #[serde(default)]
    pub(crate) z: f32,
    pub(crate) puzzle_object_type: PuzzleObjectType,
}

/// A puzzle object in the world, hidden while the player carries one.
#[derive(Debug)]
pub(crate) struct PuzzleObjectSpawner {
    record: PuzzleObjectSpawnerRecord,
    image: ImageHandle,
}

impl PuzzleObjectSpawner {
    fn item(&self) -> ItemRef {
        ItemRef::PuzzleObject(self.record.puzzle_object_type)
    }

    fn size(&self) -> (f32, f32) {
        (self.image.width() as f32, self.image.height() as f32)
    }

    fn is_visible(&self, player: Option<&PlayerView>) -> bool {
        player.is_some_and(|player| !player.holds(self.item()))
    }
}

impl PointerHittable for PuzzleObjectSpawner {
    fn is_under_pointer(&self, x: f32, y: f32, _geometry: &RoomGeometry) -> bool {
        let (width, height) = self.size();
        centred_box_contains(self.record.x, self.record.y, width, height, x, y)
    }
}

impl Clickable for PuzzleObjectSpawner {
    fn do_click(
        &mut self,
        x: f32,
        y: f32,
        ctx: &ClickContext<'_>,
        out: &mut Vec<ThingCommand>,
    ) -> bool {
        if !self.is_under_pointer(x, y, ctx.geometry) || !self.is_visible(ctx.player) {
            return false;
        }
        if !ctx.player_can_reach(self.record.x, self.record.y) {
            return false;
        }
        out.push(ThingCommand::ShowItemWindow {
            item: self.item(),
            at: Vec2::new(self.record.x, self.record.y - self.size().1 / 2.0),
            unlocks: None,
        });
        true
    }
}

impl Drawable for PuzzleObjectSpawner {
    fn draw(&self, ctx: &mut dyn DrawContext, view: &DrawView<'_>) {
        if !self.is_visible(view.player) {
            return;
        }
        let (width, height) = self.size();
        ctx.draw_image(
            &self.image,
            self.record.x - width / 2.0,
            self.record.y - height / 2.0,
            width,
            height,
        );
    }
}

impl Placed for PuzzleObjectSpawner {
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

impl Persisted for PuzzleObjectSpawner {
    const TAG: &'static str = "PuzzleObjectSpawner";
    type Record = PuzzleObjectSpawnerRecord;

    fn from_record(
        record: PuzzleObjectSpawnerRecord,
        ctx: &mut LoadContext<'_>,
    ) -> Result<Self, RegistryError> {
        let image = ctx
            .assets
            .load_image(&ItemRef::PuzzleObject(record.puzzle_object_type).image_url())
            .map_err(LoadContext::asset_error(Self::TAG))?;
        Ok(Self { record, image })
    }

    fn to_record(&self, _registry: &Registry) -> Result<PuzzleObjectSpawnerRecord, RegistryError> {
        Ok(self.record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::world::entities::fixtures::{click_ctx, geometry, player_at};
    use crate::app::world::progress::Progress;
    use crate::app::world::thing::ThingIdAllocator;
    use engine::{MemoryAssetLoader, RecordingCanvas};

    fn load<T: Persisted>(record: serde_json::Value) -> T {
        let registry = Registry::new();
        let mut assets = MemoryAssetLoader::new();
        let mut ids = ThingIdAllocator::default();
        let mut ctx = LoadContext {
            assets: &mut assets,
            ids: &mut ids,
            registry: &registry,
            room: None,
        };
        let record = serde_json::from_value(record).expect("record");
        T::from_record(record, &mut ctx).expect("load")
    }

    #[test]
    fn resource_click_opens_item_window_above_the_item() {
        let mut spawner: ResourceSpawner =
            load(serde_json::json!({"x": 500, "y": 700, "resourceType": "coin"}));
        let geometry = geometry();
        let progress = Progress::standard();
        let player = player_at(600.0, &[]);
        let mut out = Vec::new();

        assert!(spawner.do_click(510.0, 690.0, &click_ctx(&geometry, Some(&player), &progress), &mut out));
        match out.as_slice() {
            [ThingCommand::ShowItemWindow { item, at, unlocks }] => {
                assert_eq!(*item, ItemRef::Material(MaterialType::Coin));
                assert_eq!(*at, Vec2::new(500.0, 668.0));
                assert!(unlocks.is_none());
            }
            other => panic!("unexpected commands {other:?}"),
        }
    }

    #[test]
    fn puzzle_object_hides_while_held() {
        let mut spawner: PuzzleObjectSpawner =
            load(serde_json::json!({"x": 500, "y": 700, "puzzleObjectType": "key"}));
        let geometry = geometry();
        let progress = Progress::standard();
        let holding = player_at(500.0, &[ItemRef::PuzzleObject(PuzzleObjectType::Key)]);
        let mut out = Vec::new();

        assert!(!spawner.do_click(500.0, 700.0, &click_ctx(&geometry, Some(&holding), &progress), &mut out));

        let mut canvas = RecordingCanvas::new(100, 100);
        spawner.draw(
            &mut canvas,
            &DrawView {
                debug: false,
                geometry,
                player: Some(&holding),
            },
        );
        assert!(canvas.commands().is_empty());

        let empty_handed = player_at(500.0, &[]);
        assert!(spawner.do_click(500.0, 700.0, &click_ctx(&geometry, Some(&empty_handed), &progress), &mut out));
    }

    #[test]
    fn puzzle_object_is_hidden_without_a_player() {
        let spawner: PuzzleObjectSpawner =
            load(serde_json::json!({"x": 0, "y": 0, "puzzleObjectType": "broken-radio"}));
        assert!(!spawner.is_visible(None));
    }
}
