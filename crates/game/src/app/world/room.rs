//! Rooms: z-ordered thing collections with a camera and optional entry hooks.

use engine::{Affine2, Color, DrawContext, ImageHandle, Vec2};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::catalog::{ItemRef, PuzzleObjectType};
use super::entities::{AnimatedObject, Door, NpcType};
use super::player::Player;
use super::progress::Progress;
use super::registry::{LoadContext, Registry, RegistryError};
use super::thing::{
    ClickContext, DrawView, Placed, PlayerView, RoomGeometry, RoomId, Thing, ThingCommand, ThingId,
    ThingKind, ThingType, TickContext,
};
use crate::app::hud::{Overlay, TextBoxOwner};

pub(crate) const DEFAULT_WALK_MARGIN: f32 = 250.0;

const BACKGROUND_FRAME_MIN: f32 = 0.2;
const BACKGROUND_FRAME_MAX: f32 = 0.9;
const ATTIC: &str = "attic";
const GHOST_THANKS: &str = "You fixed my radio! Thanks a bundle! Come on up!";
const GHOST_ANGRY: &str = "< angry ghost noises >";

#[derive(Debug, Error)]
pub(crate) enum RoomError {
    #[error("room {room:?} cannot remove portal {id}")]
    PortalRemoval { room: String, id: u64 },
    #[error("room {room:?} does not own thing {id}")]
    NotOwned { room: String, id: u64 },
    #[error("room {room:?} has no player")]
    NoPlayer { room: String },
    #[error("hall {room:?} needs exactly one animated object, found {found}")]
    HatchCount { room: String, found: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RoomRecord {
    pub(crate) name: String,
    pub(crate) width: f32,
    pub(crate) height: f32,
    pub(crate) vanishing_point: Vec2,
    pub(crate) floor_height: f32,
    #[serde(default)]
    pub(crate) background: Vec<String>,
    #[serde(default)]
    pub(crate) things: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) interacts: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct HallState {
    hatch: Option<ThingId>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum RoomKind {
    Plain,
    /// Entrance hall with the attic hatch and the ghost behind it.
    Hall(HallState),
}

impl RoomKind {
    pub(crate) const PLAIN_TAG: &'static str = "Room";
    pub(crate) const HALL_TAG: &'static str = "Hall";

    pub(crate) fn tag(&self) -> &'static str {
        match self {
            Self::Plain => Self::PLAIN_TAG,
            Self::Hall(_) => Self::HALL_TAG,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Camera {
    x: f32,
    scale: f32,
}

impl Camera {
    fn transform(self) -> Affine2 {
        Affine2::IDENTITY
            .then_translate(self.x, 0.0)
            .then_scale(self.scale, self.scale)
    }
}

#[derive(Debug)]
pub(crate) struct Room {
    id: RoomId,
    name: String,
    kind: RoomKind,
    geometry: RoomGeometry,
    background_urls: Vec<String>,
    background: Vec<ImageHandle>,
    interacts: Option<Vec<String>>,
    walk_margin: f32,
    camera: Camera,
    pointer: Vec2,
    hovering: bool,
    /// Debug-only things can be found under the cursor.
    debug: bool,
    /// Sorted by ascending z; ties keep adoption order.
    things: Vec<Thing>,
    portals: Vec<ThingId>,
    player: Option<ThingId>,
    animation_timer: f32,
    animation_index: usize,
    rng: SmallRng,
}

impl Room {
    pub(crate) fn load_plain(
        record: RoomRecord,
        ctx: &mut LoadContext<'_>,
    ) -> Result<Room, RegistryError> {
        Self::load(record, RoomKind::Plain, ctx)
    }

    pub(crate) fn load_hall(
        record: RoomRecord,
        ctx: &mut LoadContext<'_>,
    ) -> Result<Room, RegistryError> {
        Self::load(record, RoomKind::Hall(HallState::default()), ctx)
    }

    fn load(
        record: RoomRecord,
        kind: RoomKind,
        ctx: &mut LoadContext<'_>,
    ) -> Result<Room, RegistryError> {
        let tag = kind.tag();
        let id = ctx.room.ok_or_else(|| RegistryError::Content {
            tag,
            message: format!("room {:?} loaded without a room id", record.name),
        })?;
        let background = ctx
            .assets
            .load_images(&record.background)
            .map_err(LoadContext::asset_error(tag))?;
        let mut room = Room {
            id,
            name: record.name,
            kind,
            geometry: RoomGeometry {
                width: record.width,
                height: record.height,
                vanishing_point: record.vanishing_point,
                floor_height: record.floor_height,
            },
            background_urls: record.background,
            background,
            interacts: record.interacts,
            walk_margin: DEFAULT_WALK_MARGIN,
            camera: Camera { x: 0.0, scale: 1.0 },
            pointer: Vec2::default(),
            hovering: false,
            debug: false,
            things: Vec::new(),
            portals: Vec::new(),
            player: None,
            animation_timer: 0.0,
            animation_index: 0,
            rng: SmallRng::from_entropy(),
        };
        let registry = ctx.registry;
        for value in record.things {
            let thing = registry.deserialize_thing(value, ctx)?;
            room.adopt_thing(thing);
        }
        debug!(room = %room.name, things = room.things.len(), "room_loaded");
        Ok(room)
    }

    pub(crate) fn to_record(&self, registry: &Registry) -> Result<RoomRecord, RegistryError> {
        let things = self
            .things
            .iter()
            .filter(|thing| registry.is_serializable(thing))
            .map(|thing| registry.serialize_thing(thing))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RoomRecord {
            name: self.name.clone(),
            width: self.geometry.width,
            height: self.geometry.height,
            vanishing_point: self.geometry.vanishing_point,
            floor_height: self.geometry.floor_height,
            background: self.background_urls.clone(),
            things,
            interacts: self.interacts.clone(),
        })
    }

    pub(crate) fn id(&self) -> RoomId {
        self.id
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn kind(&self) -> &RoomKind {
        &self.kind
    }

    pub(crate) fn geometry(&self) -> &RoomGeometry {
        &self.geometry
    }

    pub(crate) fn interacts(&self) -> &[String] {
        self.interacts.as_deref().unwrap_or_default()
    }

    pub(crate) fn set_walk_margin(&mut self, margin: f32) {
        self.walk_margin = margin;
    }

    pub(crate) fn things(&self) -> &[Thing] {
        &self.things
    }

    pub(crate) fn portals(&self) -> &[ThingId] {
        &self.portals
    }

    pub(crate) fn thing(&self, id: ThingId) -> Option<&Thing> {
        self.things.iter().find(|thing| thing.id() == id)
    }

    pub(crate) fn thing_mut(&mut self, id: ThingId) -> Option<&mut Thing> {
        self.things.iter_mut().find(|thing| thing.id() == id)
    }

    pub(crate) fn set_debug(&mut self, enabled: bool) {
        self.debug = enabled;
    }

    pub(crate) fn is_hovering(&self) -> bool {
        self.hovering
    }

    /// Last pointer position in room coordinates.
    pub(crate) fn pointer(&self) -> Vec2 {
        self.pointer
    }

    pub(crate) fn player(&self) -> Option<&Player> {
        self.player
            .and_then(|id| self.thing(id))
            .and_then(|thing| thing.kind().as_player())
    }

    pub(crate) fn player_mut(&mut self) -> Option<&mut Player> {
        let id = self.player?;
        self.thing_mut(id)
            .and_then(|thing| thing.kind_mut().as_player_mut())
    }

    pub(crate) fn player_view(&self) -> Option<PlayerView> {
        self.player().map(Player::view)
    }

    pub(crate) fn find_door(&self, name: &str) -> Option<&Door> {
        self.things
            .iter()
            .filter_map(|thing| thing.kind().as_door())
            .find(|door| door.name() == name)
    }

    pub(crate) fn objects_of_type(&self, thing_type: ThingType) -> impl Iterator<Item = &Thing> {
        self.things
            .iter()
            .filter(move |thing| thing.kind().thing_type() == thing_type)
    }

    /// Inserts `thing` after every thing with z less than or equal to its own.
    pub(crate) fn adopt_thing(&mut self, mut thing: Thing) {
        thing.set_room(Some(self.id));
        if thing.kind().as_player().is_some() {
            self.player = Some(thing.id());
        }
        if thing.kind().is_portal() {
            self.portals.push(thing.id());
        }
        self.things.push(thing);
        self.things.sort_by(|a, b| a.z().total_cmp(&b.z()));
    }

    pub(crate) fn disown(&mut self, id: ThingId) -> Result<Thing, RoomError> {
        if self.portals.contains(&id) {
            return Err(RoomError::PortalRemoval {
                room: self.name.clone(),
                id: id.raw(),
            });
        }
        let index = self
            .things
            .iter()
            .position(|thing| thing.id() == id)
            .ok_or_else(|| RoomError::NotOwned {
                room: self.name.clone(),
                id: id.raw(),
            })?;
        if self.player == Some(id) {
            self.player = None;
        }
        let mut thing = self.things.remove(index);
        thing.set_room(None);
        Ok(thing)
    }

    pub(crate) fn detach_player(&mut self) -> Result<Thing, RoomError> {
        let id = self.player.ok_or_else(|| RoomError::NoPlayer {
            room: self.name.clone(),
        })?;
        self.disown(id)
    }

    /// Applies the commands a room handles itself and returns the rest.
    pub(crate) fn apply_local(
        &mut self,
        commands: Vec<ThingCommand>,
    ) -> Result<Vec<ThingCommand>, RoomError> {
        let mut remaining = Vec::new();
        for command in commands {
            match command {
                ThingCommand::AdoptThings(things) => {
                    for thing in things {
                        self.adopt_thing(thing);
                    }
                }
                ThingCommand::Disown(id) => {
                    self.disown(id)?;
                }
                other => remaining.push(other),
            }
        }
        Ok(remaining)
    }

    pub(crate) fn tick(
        &mut self,
        dt: f32,
        screen_pointer: Vec2,
    ) -> Result<Vec<ThingCommand>, RoomError> {
        self.pointer = self.camera.transform().invert(screen_pointer);
        self.hovering = self.get_thing_under_cursor().is_some();

        let mut out = Vec::new();
        for thing in &mut self.things {
            let ctx = TickContext { this: thing.id() };
            if let Some(tickable) = thing.kind_mut().as_tickable_mut() {
                tickable.tick(dt, &ctx, &mut out);
            }
        }

        self.animation_timer -= dt;
        if self.animation_timer <= 0.0 {
            if !self.background.is_empty() {
                self.animation_index = (self.animation_index + 1) % self.background.len();
            }
            self.animation_timer = self.rng.gen_range(BACKGROUND_FRAME_MIN..BACKGROUND_FRAME_MAX);
        }

        self.apply_local(out)
    }

    /// Fits the camera to `viewport`: shrink tall rooms, centre narrow ones,
    /// otherwise pan with the player so no blank margin shows.
    pub(crate) fn update_camera(&mut self, viewport: (u32, u32)) {
        let (view_width, view_height) = (viewport.0 as f32, viewport.1 as f32);
        self.camera.scale = (view_height / self.geometry.height).min(1.0);
        let Some(player_x) = self.player().map(|player| player.position().x) else {
            return;
        };
        let amount = (player_x / self.geometry.width).clamp(0.0, 1.0);
        let overflow = self.geometry.width * self.camera.scale - view_width;
        self.camera.x = if overflow < 0.0 {
            -overflow / 2.0
        } else {
            -overflow * amount
        };
    }

    pub(crate) fn camera_transform(&self) -> Affine2 {
        self.camera.transform()
    }

    pub(crate) fn overlay(&self) -> Overlay {
        Overlay {
            transform: self.camera.transform(),
            footprint: Vec2::new(
                self.geometry.width * self.camera.scale,
                self.geometry.height * self.camera.scale,
            ),
        }
    }

    pub(crate) fn draw(&mut self, ctx: &mut dyn DrawContext, debug: bool) {
        self.update_camera(ctx.size());
        let player = self.player_view();
        let view = DrawView {
            debug,
            geometry: self.geometry,
            player: player.as_ref(),
        };

        ctx.save();
        ctx.translate(self.camera.x, 0.0);
        ctx.scale(self.camera.scale, self.camera.scale);
        match self.background.get(self.animation_index) {
            Some(image) => {
                ctx.draw_image(image, 0.0, 0.0, self.geometry.width, self.geometry.height)
            }
            None => ctx.fill_rect(
                0.0,
                0.0,
                self.geometry.width,
                self.geometry.height,
                Color::PAPER,
            ),
        }
        for thing in &self.things {
            if let Some(drawable) = thing.kind().as_drawable() {
                drawable.draw(ctx, &view);
            }
        }
        if debug {
            let position = self.pointer;
            ctx.fill_rect(position.x - 3.0, position.y - 3.0, 6.0, 6.0, Color::DEBUG_GREEN);
        }
        ctx.restore();

        if debug {
            let (width, _) = ctx.size();
            ctx.fill_text(&self.name, width as f32 / 2.0, 48.0, 24.0, Color::WHITE);
        }
    }

    /// Dispatches a click top-down; unclaimed clicks walk the player.
    pub(crate) fn do_click(
        &mut self,
        screen_pointer: Vec2,
        progress: &Progress,
    ) -> Result<Vec<ThingCommand>, RoomError> {
        let point = self.camera.transform().invert(screen_pointer);
        self.pointer = point;
        let player = self.player_view();
        let geometry = self.geometry;
        let mut out = Vec::new();

        let mut consumed = false;
        for thing in self.things.iter_mut().rev() {
            let ctx = ClickContext {
                this: thing.id(),
                geometry: &geometry,
                player: player.as_ref(),
                progress,
            };
            if let Some(clickable) = thing.kind_mut().as_clickable_mut() {
                if clickable.do_click(point.x, point.y, &ctx, &mut out) {
                    consumed = true;
                    break;
                }
            }
        }

        if !consumed {
            let margin = self.walk_margin;
            let clamped = point.x.min(geometry.width - margin).max(margin);
            if let Some(player) = self.player_mut() {
                player.move_to_cursor(clamped);
            }
        }
        self.apply_local(out)
    }

    /// Topmost thing under the last known pointer position.
    pub(crate) fn get_thing_under_cursor(&self) -> Option<ThingId> {
        let point = self.pointer;
        self.things
            .iter()
            .rev()
            .find(|thing| {
                thing.kind().as_hittable().is_some_and(|hittable| {
                    (self.debug || !hittable.debug_only())
                        && hittable.is_under_pointer(point.x, point.y, &self.geometry)
                })
            })
            .map(Thing::id)
    }

    pub(crate) fn activate(&mut self, out: &mut Vec<ThingCommand>) -> Result<(), RoomError> {
        for thing in &mut self.things {
            let id = thing.id();
            if let Some(dom) = thing.kind_mut().as_dom_backed_mut() {
                dom.start_drawing_dom(id, out);
            }
        }
        if let RoomKind::Hall(state) = self.kind {
            if state.hatch.is_none() {
                let hatches: Vec<ThingId> = self
                    .objects_of_type(ThingType::AnimatedObject)
                    .map(Thing::id)
                    .collect();
                let &[hatch] = hatches.as_slice() else {
                    return Err(RoomError::HatchCount {
                        room: self.name.clone(),
                        found: hatches.len(),
                    });
                };
                self.kind = RoomKind::Hall(HallState { hatch: Some(hatch) });
            }
        }
        debug!(room = %self.name, "room_activated");
        Ok(())
    }

    pub(crate) fn deactivate(&mut self, out: &mut Vec<ThingCommand>) {
        if let RoomKind::Hall(_) = self.kind {
            out.push(ThingCommand::HideTextBox(TextBoxOwner::Room(self.id)));
        }
        for thing in &mut self.things {
            let id = thing.id();
            if let Some(dom) = thing.kind_mut().as_dom_backed_mut() {
                dom.stop_drawing_dom(id, out);
            }
        }
        debug!(room = %self.name, "room_deactivated");
    }

    pub(crate) fn handle_locked_door(&mut self, target_room: &str, out: &mut Vec<ThingCommand>) {
        let RoomKind::Hall(state) = self.kind else {
            out.push(ThingCommand::toast("Locked"));
            return;
        };
        if target_room != ATTIC {
            out.push(ThingCommand::toast("Locked"));
            return;
        }

        let fixed_radio = ItemRef::PuzzleObject(PuzzleObjectType::FixedRadio);
        let owner = TextBoxOwner::Room(self.id);
        if self.player().is_some_and(|player| player.holds(fixed_radio)) {
            out.push(ThingCommand::TossItem(fixed_radio));
            out.push(ThingCommand::ShowTextBox {
                speaker: NpcType::Ghost,
                text: GHOST_THANKS.to_string(),
                owner,
            });
            out.push(ThingCommand::StopSpeech);
            out.push(ThingCommand::StartSpeech(NpcType::Ghost));
            out.push(ThingCommand::IncreaseProgress("returned-radio".to_string()));
            return;
        }

        match state.hatch.and_then(|id| self.thing_mut(id)) {
            Some(thing) => {
                if let ThingKind::AnimatedObject(hatch) = thing.kind_mut() {
                    hatch.restart();
                }
            }
            None => warn!(room = %self.name, "hall_hatch_missing"),
        }
        out.push(ThingCommand::ShowTextBox {
            speaker: NpcType::Ghost,
            text: GHOST_ANGRY.to_string(),
            owner,
        });
        out.push(ThingCommand::StopSpeech);
        out.push(ThingCommand::StartSpeech(NpcType::Ghost));
    }

    /// Called when a text box this room opened has closed.
    pub(crate) fn on_text_box_done(&mut self, progress: &Progress, out: &mut Vec<ThingCommand>) {
        if let RoomKind::Hall(_) = self.kind {
            let after_hushroom = progress
                .level_index("recovered-hushroom")
                .is_some_and(|index| progress.level() >= index);
            let before_radio = progress
                .level_index("returned-radio")
                .is_some_and(|index| progress.level() < index);
            if after_hushroom && before_radio {
                self.give_radio(out);
            }
        }
        out.push(ThingCommand::StopSpeech);
    }

    fn give_radio(&self, out: &mut Vec<ThingCommand>) {
        let Some(player) = self.player() else {
            return;
        };
        let broken = ItemRef::PuzzleObject(PuzzleObjectType::BrokenRadio);
        let fixed = ItemRef::PuzzleObject(PuzzleObjectType::FixedRadio);
        if player.holds(broken) || player.holds(fixed) {
            return;
        }
        out.push(ThingCommand::GiveItem(broken));
    }

    pub(crate) fn hatch(&self) -> Option<&AnimatedObject> {
        let RoomKind::Hall(HallState { hatch: Some(id) }) = self.kind else {
            return None;
        };
        match self.thing(id)?.kind() {
            ThingKind::AnimatedObject(hatch) => Some(hatch),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::world::entities::Puff;
    use crate::app::world::thing::ThingIdAllocator;
    use engine::{MemoryAssetLoader, RecordingCanvas};
    use serde_json::json;

    fn load(record: Value) -> Room {
        let registry = Registry::with_builtin().expect("registry");
        let mut assets = MemoryAssetLoader::new();
        let mut ids = ThingIdAllocator::default();
        let mut ctx = LoadContext {
            assets: &mut assets,
            ids: &mut ids,
            registry: &registry,
            room: Some(RoomId(0)),
        };
        registry.deserialize_room(record, &mut ctx).expect("room loads")
    }

    fn plain_room(things: Value) -> Room {
        load(json!({
            "@type": "Room",
            "name": "greenhouse",
            "width": 2000,
            "height": 720,
            "vanishingPoint": {"x": 1000, "y": 300},
            "floorHeight": 600,
            "background": ["rooms/greenhouse.png"],
            "things": things,
        }))
    }

    #[test]
    fn disowning_a_portal_fails() {
        let mut room = plain_room(json!([
            {"@type": "Door", "name": "left", "x": 100, "width": 80, "base": 600, "height": 300, "target": ["hall", "right"]},
        ]));
        let door = room.portals()[0];
        assert!(matches!(room.disown(door), Err(RoomError::PortalRemoval { .. })));
        assert_eq!(room.things().len(), 1);
    }

    #[test]
    fn disowning_an_absent_thing_fails() {
        let mut room = plain_room(json!([]));
        let stray = ThingIdAllocator::default().allocate();
        assert!(matches!(room.disown(stray), Err(RoomError::NotOwned { .. })));
    }

    #[test]
    fn player_is_classified_and_cleared_on_detach() {
        let mut room = plain_room(json!([{"@type": "Player", "x": 500, "y": 600}]));
        assert!(room.player().is_some());
        let player = room.detach_player().expect("detach");
        assert!(player.room().is_none());
        assert!(room.player().is_none());
    }

    #[test]
    fn unclaimed_click_walks_player_inside_margin() {
        let mut room = plain_room(json!([{"@type": "Player", "x": 1000, "y": 600}]));
        room.update_camera((2000, 720));
        let commands = room
            .do_click(Vec2::new(10.0, 650.0), &Progress::standard())
            .expect("click");
        assert!(commands.is_empty());
        let player = room.player().expect("player");
        assert_eq!(player.target_x(), DEFAULT_WALK_MARGIN);
    }

    #[test]
    fn narrow_room_is_centred() {
        let mut room = load(json!({
            "@type": "Room",
            "name": "closet",
            "width": 800,
            "height": 720,
            "vanishingPoint": {"x": 400, "y": 300},
            "floorHeight": 600,
            "things": [{"@type": "Player", "x": 400, "y": 600}],
        }));
        room.update_camera((1280, 720));
        assert_eq!(room.camera_transform().translate_x, 240.0);
    }

    #[test]
    fn wide_room_pans_with_player() {
        let mut room = plain_room(json!([{"@type": "Player", "x": 2000, "y": 600}]));
        room.update_camera((1000, 720));
        assert_eq!(room.camera_transform().translate_x, -1000.0);
    }

    #[test]
    fn tall_room_is_scaled_down() {
        let mut room = plain_room(json!([]));
        room.update_camera((1280, 360));
        assert_eq!(room.camera_transform().scale_x, 0.5);
    }

    #[test]
    fn puffs_are_not_saved() {
        let mut room = plain_room(json!([]));
        let id = ThingIdAllocator::default().allocate();
        room.adopt_thing(Thing::new(id, Puff::new(10.0, 10.0)));
        let record = room
            .to_record(&Registry::with_builtin().expect("registry"))
            .expect("record");
        assert!(record.things.is_empty());
    }

    #[test]
    fn hall_activation_requires_one_animated_object() {
        let mut hall = load(json!({
            "@type": "Hall",
            "name": "hall",
            "width": 2000,
            "height": 720,
            "vanishingPoint": {"x": 1000, "y": 300},
            "floorHeight": 600,
            "things": [],
        }));
        let err = hall.activate(&mut Vec::new()).expect_err("no hatch");
        assert!(matches!(err, RoomError::HatchCount { found: 0, .. }));
    }

    #[test]
    fn plain_room_locked_door_toasts() {
        let mut room = plain_room(json!([]));
        let mut out = Vec::new();
        room.handle_locked_door("attic", &mut out);
        assert!(matches!(&out[..], [ThingCommand::Toast(message)] if message == "Locked"));
    }

    #[test]
    fn draw_paints_background_then_things() {
        let mut room = plain_room(json!([{"@type": "Player", "x": 1000, "y": 600}]));
        let mut canvas = RecordingCanvas::new(1280, 720);
        room.draw(&mut canvas, false);
        let images: Vec<&str> = canvas.images().map(|(url, _)| url).collect();
        assert_eq!(images, vec!["rooms/greenhouse.png"]);
        assert!(canvas.commands().len() > 1);
        assert_eq!(canvas.save_depth(), 0);
    }
}
