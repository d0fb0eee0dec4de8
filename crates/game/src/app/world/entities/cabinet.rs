use engine::{DrawContext, ImageHandle, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app::world::catalog::{ItemRef, PuzzleObjectType};
use crate::app::world::registry::{LoadContext, Persisted, Registry, RegistryError};
use crate::app::world::thing::{
    ClickContext, Clickable, DrawView, Drawable, Placed, PointerHittable, RoomGeometry, Thing,
    ThingCommand, ThingKind,
};

/// The left edge of the cabinet art is transparent.
const CLICKABLE_WIDTH: f32 = 128.0;
const FRAMES: [&str; 3] = [
    "cabinet/closed.png",
    "cabinet/bottom-open.png",
    "cabinet/open.png",
];
pub(crate) const BOTTOM_DRAWER_LEVEL: &str = "opened-bottom-drawer";
pub(crate) const TOP_DRAWER_LEVEL: &str = "opened-top-drawer";

fn default_z() -> f32 {
    -1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CabinetRecord {
    pub(crate) x: f32,
    pub(crate) y: f32,
    #[serde(default = "default_z")]
    pub(crate) z: f32,
    /// Tagged ResourceSpawner records; null once the drawer is emptied.
    #[serde(default)]
    pub(crate) top_item: Option<Value>,
    #[serde(default)]
    pub(crate) bottom_item: Option<Value>,
}

/// Two locked drawers. The bottom one takes the small key, the top one the
/// big key, and each spills its material into the room once.
#[derive(Debug)]
pub(crate) struct Cabinet {
    x: f32,
    y: f32,
    z: f32,
    top_item: Option<Box<Thing>>,
    bottom_item: Option<Box<Thing>>,
    frames: Vec<ImageHandle>,
}

impl Cabinet {
    pub(crate) fn is_empty(&self) -> bool {
        self.top_item.is_none() && self.bottom_item.is_none()
    }

    pub(crate) fn has_top_item(&self) -> bool {
        self.top_item.is_some()
    }

    pub(crate) fn has_bottom_item(&self) -> bool {
        self.bottom_item.is_some()
    }

    fn frame_height(&self) -> f32 {
        self.frames[0].height() as f32
    }

    /// Lines the drawer contents up with the drawer fronts.
    fn arrange_items(&mut self) {
        let x = self.x - CLICKABLE_WIDTH / 2.0;
        let height = self.frame_height();
        let z = self.z + 1.0;
        if let Some(item) = self.top_item.as_mut() {
            place_item(item, Vec2::new(x, self.y + height / 4.0), z);
        }
        if let Some(item) = self.bottom_item.as_mut() {
            place_item(item, Vec2::new(x, self.y + height * 3.0 / 4.0), z);
        }
    }

    fn open(item: &mut Option<Box<Thing>>, level: &str, out: &mut Vec<ThingCommand>) {
        if let Some(item) = item.take() {
            out.push(ThingCommand::AdoptThings(vec![*item]));
            out.push(ThingCommand::IncreaseProgress(level.to_string()));
            out.push(ThingCommand::Save);
        }
    }
}

fn place_item(item: &mut Thing, position: Vec2, z: f32) {
    if let ThingKind::ResourceSpawner(spawner) = item.kind_mut() {
        spawner.place(position, z);
    }
}

fn load_drawer(
    record: Option<Value>,
    ctx: &mut LoadContext<'_>,
) -> Result<Option<Thing>, RegistryError> {
    let Some(record) = record else {
        return Ok(None);
    };
    let registry = ctx.registry;
    let thing = registry.deserialize_thing(record, ctx)?;
    if !matches!(thing.kind(), ThingKind::ResourceSpawner(_)) {
        return Err(RegistryError::Content {
            tag: Cabinet::TAG,
            message: format!(
                "drawers hold resource spawners, not {:?}",
                thing.kind().thing_type()
            ),
        });
    }
    Ok(Some(thing))
}

impl PointerHittable for Cabinet {
    fn is_under_pointer(&self, x: f32, y: f32, _geometry: &RoomGeometry) -> bool {
        if self.is_empty() {
            return false;
        }
        if y < self.y || y > self.y + self.frame_height() {
            return false;
        }
        x <= self.x && x > self.x - CLICKABLE_WIDTH
    }
}

impl Clickable for Cabinet {
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
        let holds = |object| {
            ctx.player
                .is_some_and(|player| player.holds(ItemRef::PuzzleObject(object)))
        };

        if self.bottom_item.is_some() {
            if holds(PuzzleObjectType::SmallKey) {
                Self::open(&mut self.bottom_item, BOTTOM_DRAWER_LEVEL, out);
            } else if holds(PuzzleObjectType::Key) {
                out.push(ThingCommand::toast("This key is too big!"));
            } else {
                out.push(ThingCommand::toast("Locked"));
            }
            return true;
        }

        if holds(PuzzleObjectType::BigKey) {
            Self::open(&mut self.top_item, TOP_DRAWER_LEVEL, out);
        } else if holds(PuzzleObjectType::Key) {
            out.push(ThingCommand::toast("This key is too small!"));
        } else if holds(PuzzleObjectType::SmallKey) {
            out.push(ThingCommand::toast("This key is much too small!"));
        } else {
            out.push(ThingCommand::toast("Locked"));
        }
        true
    }
}

impl Drawable for Cabinet {
    fn draw(&self, ctx: &mut dyn DrawContext, _view: &DrawView<'_>) {
        let index = if self.bottom_item.is_some() {
            0
        } else if self.top_item.is_some() {
            1
        } else {
            2
        };
        let frame = &self.frames[index];
        let (width, height) = (frame.width() as f32, frame.height() as f32);
        ctx.draw_image(frame, self.x - width, self.y, width, height);
    }
}

impl Placed for Cabinet {
    fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    fn set_position(&mut self, position: Vec2) {
        self.x = position.x;
        self.y = position.y;
        self.arrange_items();
    }

    fn z(&self) -> f32 {
        self.z
    }
}

impl Persisted for Cabinet {
    const TAG: &'static str = "Cabinet";
    type Record = CabinetRecord;

    fn from_record(record: CabinetRecord, ctx: &mut LoadContext<'_>) -> Result<Self, RegistryError> {
        let frames = FRAMES.map(String::from);
        let frames = ctx
            .assets
            .load_images(&frames)
            .map_err(LoadContext::asset_error(Self::TAG))?;
        let mut cabinet = Self {
            x: record.x,
            y: record.y,
            z: record.z,
            top_item: load_drawer(record.top_item, ctx)?.map(Box::new),
            bottom_item: load_drawer(record.bottom_item, ctx)?.map(Box::new),
            frames,
        };
        cabinet.arrange_items();
        Ok(cabinet)
    }

    fn to_record(&self, registry: &Registry) -> Result<CabinetRecord, RegistryError> {
        let encode = |item: &Option<Box<Thing>>| {
            item.as_ref()
                .map(|item| registry.serialize_thing(item))
                .transpose()
        };
        Ok(CabinetRecord {
            x: self.x,
            y: self.y,
            z: self.z,
            top_item: encode(&self.top_item)?,
            bottom_item: encode(&self.bottom_item)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::world::entities::fixtures::{click_ctx, geometry, player_at};
    use crate::app::world::progress::Progress;
    use crate::app::world::thing::{ThingIdAllocator, ThingType};
    use engine::MemoryAssetLoader;
    use serde_json::json;

    fn load(record: Value) -> Result<Cabinet, RegistryError> {
        let registry = Registry::with_builtin().expect("registry");
        let mut assets = MemoryAssetLoader::new();
        let mut ids = ThingIdAllocator::default();
        let mut ctx = LoadContext {
            assets: &mut assets,
            ids: &mut ids,
            registry: &registry,
            room: None,
        };
        let record = serde_json::from_value(record).expect("record");
        Cabinet::from_record(record, &mut ctx)
    }

    fn cabinet() -> Cabinet {
        load(json!({
            "x": 600, "y": 400,
            "topItem": {"@type": "ResourceSpawner", "x": 0, "y": 0, "resourceType": "feather"},
            "bottomItem": {"@type": "ResourceSpawner", "x": 0, "y": 0, "resourceType": "gunpowder"},
        }))
        .expect("cabinet loads")
    }

    fn click(cabinet: &mut Cabinet, held: &[ItemRef]) -> Vec<ThingCommand> {
        let geometry = geometry();
        let progress = Progress::standard();
        let player = player_at(600.0, held);
        let ctx = click_ctx(&geometry, Some(&player), &progress);
        let mut out = Vec::new();
        assert!(cabinet.do_click(550.0, 420.0, &ctx, &mut out));
        out
    }

    fn toasts(out: &[ThingCommand]) -> Vec<&str> {
        out.iter()
            .filter_map(|command| match command {
                ThingCommand::Toast(message) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    fn key(object: PuzzleObjectType) -> ItemRef {
        ItemRef::PuzzleObject(object)
    }

    #[test]
    fn drawers_care_about_key_size() {
        let mut cabinet = cabinet();
        assert_eq!(toasts(&click(&mut cabinet, &[])), vec!["Locked"]);
        assert_eq!(
            toasts(&click(&mut cabinet, &[key(PuzzleObjectType::Key)])),
            vec!["This key is too big!"]
        );
        assert!(cabinet.has_bottom_item());

        let out = click(&mut cabinet, &[key(PuzzleObjectType::SmallKey)]);
        match out.as_slice() {
            [ThingCommand::AdoptThings(things), ThingCommand::IncreaseProgress(level), ThingCommand::Save] =>
            {
                assert_eq!(things.len(), 1);
                assert_eq!(things[0].kind().thing_type(), ThingType::ResourceSpawner);
                assert_eq!(level, BOTTOM_DRAWER_LEVEL);
            }
            other => panic!("unexpected commands {other:?}"),
        }
        assert!(!cabinet.has_bottom_item());

        assert_eq!(
            toasts(&click(&mut cabinet, &[key(PuzzleObjectType::SmallKey)])),
            vec!["This key is much too small!"]
        );
        assert_eq!(
            toasts(&click(&mut cabinet, &[key(PuzzleObjectType::Key)])),
            vec!["This key is too small!"]
        );
        let out = click(&mut cabinet, &[key(PuzzleObjectType::BigKey)]);
        assert!(matches!(
            out.as_slice(),
            [ThingCommand::AdoptThings(_), ThingCommand::IncreaseProgress(level), ThingCommand::Save]
                if level == TOP_DRAWER_LEVEL
        ));
        assert!(cabinet.is_empty());
    }

    #[test]
    fn empty_or_distant_cabinet_ignores_clicks() {
        let geometry = geometry();
        let progress = Progress::standard();
        let far = player_at(1500.0, &[key(PuzzleObjectType::SmallKey)]);
        let mut cabinet = cabinet();
        let mut out = Vec::new();
        assert!(!cabinet.do_click(550.0, 420.0, &click_ctx(&geometry, Some(&far), &progress), &mut out));

        let mut empty = load(json!({"x": 600, "y": 400})).expect("empty cabinet");
        let near = player_at(600.0, &[]);
        assert!(!empty.do_click(550.0, 420.0, &click_ctx(&geometry, Some(&near), &progress), &mut out));
        assert!(out.is_empty());
    }

    #[test]
    fn drawer_contents_sit_in_front_of_the_drawers() {
        let cabinet = cabinet();
        let top = cabinet.top_item.as_ref().expect("top");
        let bottom = cabinet.bottom_item.as_ref().expect("bottom");
        let height = MemoryAssetLoader::PLACEHOLDER_SIZE as f32;
        assert_eq!(top.position(), Vec2::new(600.0 - 64.0, 400.0 + height / 4.0));
        assert_eq!(bottom.position(), Vec2::new(600.0 - 64.0, 400.0 + height * 3.0 / 4.0));
        assert_eq!(top.z(), 0.0);
    }

    #[test]
    fn drawers_round_trip_and_emptied_ones_save_as_null() {
        let registry = Registry::with_builtin().expect("registry");
        let mut cabinet = cabinet();
        let record = cabinet.to_record(&registry).expect("record");
        assert_eq!(record.z, -1.0);
        assert_eq!(record.bottom_item.as_ref().expect("bottom")["resourceType"], json!("gunpowder"));
        assert_eq!(record.top_item.as_ref().expect("top")["@type"], json!("ResourceSpawner"));
        let reloaded = load(serde_json::to_value(&record).expect("encode")).expect("reload");
        assert_eq!(reloaded.to_record(&registry).expect("record again"), record);

        click(&mut cabinet, &[key(PuzzleObjectType::SmallKey)]);
        let value = serde_json::to_value(cabinet.to_record(&registry).expect("record")).expect("encode");
        assert_eq!(value["bottomItem"], Value::Null);
    }

    #[test]
    fn drawers_only_hold_resource_spawners() {
        let err = load(json!({
            "x": 600, "y": 400,
            "topItem": {"@type": "Cauldron", "x": 0, "y": 0, "width": 10, "height": 10},
        }))
        .expect_err("cauldron in a drawer");
        assert!(matches!(err, RegistryError::Content { tag: "Cabinet", .. }));
    }
}
