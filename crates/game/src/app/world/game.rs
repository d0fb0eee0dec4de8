//! The game: every room, the active one, and the frame contract.

use engine::{
    AssetLoader, AudioSink, Color, CursorHint, DrawContext, FrameTime, InputSnapshot,
    KeyValueStore, Pointer, PointerEdge, Vec2,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::catalog::{ItemRef, MaterialType};
use super::entities::Direction;
use super::flags::Flags;
use super::player::{Cue, InventoryError, InventorySink, Player, PotionUse};
use super::progress::{Progress, ProgressError};
use super::registry::{LoadContext, Registry, RegistryError};
use super::room::{Room, RoomError};
use super::thing::{Placed, RoomId, ThingCommand, ThingIdAllocator, ThingKind, ThingType};
use crate::app::audio::{MusicDirector, Speech};
use crate::app::config::GameConfig;
use crate::app::debug::DebugTools;
use crate::app::hud::{Hud, HudClick, HudError, ItemIcons, TextBoxOwner};

const LOUD_INTERACTION: &str = "loud";

#[derive(Debug, Error)]
pub(crate) enum GameError {
    #[error("invalid save data at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode save data: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("no room holds the player")]
    NoStartingRoom,
    #[error("couldn't find room named {0:?}")]
    RoomNotFound(String),
    #[error("couldn't find door {door:?} in room {room:?}")]
    DoorNotFound { room: String, door: String },
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Room(#[from] RoomError),
    #[error(transparent)]
    Inventory(#[from] InventoryError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
}

/// Top-level save record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GameData {
    pub(crate) rooms: Vec<Value>,
    #[serde(default)]
    pub(crate) current_progress_level: usize,
    #[serde(default, skip_serializing_if = "Flags::is_empty")]
    pub(crate) flags: Flags,
}

/// Long-lived collaborators handed to the game at construction.
pub(crate) struct GameDeps {
    pub(crate) registry: Registry,
    pub(crate) progress: Progress,
    pub(crate) audio: Box<dyn AudioSink>,
    pub(crate) store: Box<dyn KeyValueStore>,
    pub(crate) icons: ItemIcons,
}

#[derive(Debug, Clone, PartialEq)]
struct DoorRequest {
    room: String,
    door: String,
    direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Transition {
    from: RoomId,
    direction: Direction,
    start: f64,
    duration: f64,
}

impl Transition {
    fn progress(&self, now: f64) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((now - self.start) / self.duration).clamp(0.0, 1.0) as f32
    }

    fn is_done(&self, now: f64) -> bool {
        now >= self.start + self.duration
    }
}

/// What inventory changes reach: the hotbar mirror, feedback and the save flag.
pub(crate) struct Services<'a> {
    hud: &'a mut Hud,
    audio: &'a mut dyn AudioSink,
    save_requested: &'a mut bool,
    toast_at: Vec2,
}

impl InventorySink for Services<'_> {
    fn hotbar_add(&mut self, item: ItemRef) -> Result<(), HudError> {
        self.hud.hotbar_mut().add_item(item)
    }

    fn hotbar_remove(&mut self, item: ItemRef) -> Result<(), HudError> {
        self.hud.hotbar_mut().remove_item(item)
    }

    fn toast(&mut self, message: &str) {
        self.hud.toast(message, self.toast_at);
    }

    fn play_cue(&mut self, cue: Cue) {
        self.audio.play_sfx(cue.sfx_name(), 0.0);
    }

    fn request_save(&mut self) {
        *self.save_requested = true;
    }
}

pub(crate) struct Game {
    rooms: Vec<Room>,
    active: RoomId,
    next_room: Option<DoorRequest>,
    transition: Option<Transition>,
    now: f64,
    registry: Registry,
    progress: Progress,
    flags: Flags,
    hud: Hud,
    audio: Box<dyn AudioSink>,
    speech: Speech,
    music: MusicDirector,
    store: Box<dyn KeyValueStore>,
    save_key: String,
    save_requested: bool,
    pointer: Pointer,
    pointer_edge: PointerEdge,
    debug: DebugTools,
    transition_seconds: f64,
}

impl Game {
    pub(crate) fn from_data(
        data: Value,
        deps: GameDeps,
        assets: &mut dyn AssetLoader,
        config: &GameConfig,
    ) -> Result<Self, GameError> {
        let data: GameData =
            serde_path_to_error::deserialize(data).map_err(|err| GameError::Parse {
                path: err.path().to_string(),
                source: err.into_inner(),
            })?;
        let GameDeps {
            registry,
            mut progress,
            audio,
            store,
            icons,
        } = deps;

        let mut ids = ThingIdAllocator::default();
        let mut rooms = Vec::with_capacity(data.rooms.len());
        for (index, record) in data.rooms.into_iter().enumerate() {
            let mut ctx = LoadContext {
                assets: &mut *assets,
                ids: &mut ids,
                registry: &registry,
                room: Some(RoomId(index)),
            };
            let mut room = registry.deserialize_room(record, &mut ctx)?;
            room.set_walk_margin(config.walk_margin);
            if let Some(player) = room.player_mut() {
                player.configure(config.inventory_size, config.reach, config.walk_speed);
            }
            rooms.push(room);
        }

        if data.current_progress_level > 0 {
            if let Err(err) = progress.set_progress_level(data.current_progress_level) {
                warn!(error = %err, level = %progress.level_name(), "saved_progress_ignored");
            }
        }

        let active = rooms
            .iter()
            .position(|room| room.player().is_some())
            .map(RoomId)
            .ok_or(GameError::NoStartingRoom)?;

        let mut game = Self {
            rooms,
            active,
            next_room: None,
            transition: None,
            now: 0.0,
            registry,
            progress,
            flags: data.flags,
            hud: Hud::new(config.inventory_size, icons, config.toast.as_secs_f32()),
            audio,
            speech: Speech::new(config.speech_timeout),
            music: MusicDirector::default(),
            store,
            save_key: config.save_key.clone(),
            save_requested: false,
            pointer: Pointer::default(),
            pointer_edge: PointerEdge::default(),
            debug: DebugTools::new(config.debug),
            transition_seconds: config.transition.as_secs_f64(),
        };

        game.with_player(|player, services| player.rehydrate(services))
            .transpose()?;
        let mut out = Vec::new();
        game.rooms[active.0].activate(&mut out)?;
        game.apply_commands(active, out)?;
        let name = game.rooms[active.0].name().to_string();
        game.music
            .room_changed(&name, true, &game.flags, game.audio.as_mut());
        info!(
            rooms = game.rooms.len(),
            room = %name,
            level = %game.progress.level_name(),
            "game_loaded"
        );
        Ok(game)
    }

    pub(crate) fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub(crate) fn room(&self) -> &Room {
        &self.rooms[self.active.0]
    }

    pub(crate) fn room_mut(&mut self) -> &mut Room {
        &mut self.rooms[self.active.0]
    }

    pub(crate) fn room_named(&self, name: &str) -> Option<&Room> {
        self.rooms.iter().find(|room| room.name() == name)
    }

    pub(crate) fn player(&self) -> Option<&Player> {
        self.room().player()
    }

    pub(crate) fn progress(&self) -> &Progress {
        &self.progress
    }

    pub(crate) fn progress_mut(&mut self) -> &mut Progress {
        &mut self.progress
    }

    pub(crate) fn flags(&self) -> &Flags {
        &self.flags
    }

    pub(crate) fn hud(&self) -> &Hud {
        &self.hud
    }

    pub(crate) fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub(crate) fn has_pending_transition(&self) -> bool {
        self.next_room.is_some()
    }

    pub(crate) fn debug_enabled(&self) -> bool {
        self.debug.enabled()
    }

    pub(crate) fn save_requested(&self) -> bool {
        self.save_requested
    }

    /// Marks the game dirty; the write happens once at the end of the tick.
    pub(crate) fn save(&mut self) {
        self.save_requested = true;
    }

    pub(crate) fn get_state(&self) -> Result<Value, GameError> {
        let rooms = self
            .rooms
            .iter()
            .map(|room| self.registry.serialize_room(room))
            .collect::<Result<Vec<_>, _>>()?;
        let data = GameData {
            rooms,
            current_progress_level: self.progress.level(),
            flags: self.flags.clone(),
        };
        serde_json::to_value(data).map_err(GameError::Encode)
    }

    pub(crate) fn tick(&mut self, frame: FrameTime, input: &InputSnapshot) -> Result<(), GameError> {
        self.now = frame.now;
        self.pointer = input.pointer();
        self.hud.set_viewport(input.viewport());
        let clicked = self.pointer_edge.rising(self.pointer);

        if let Some(transition) = self.transition {
            if !transition.is_done(self.now) {
                return Ok(());
            }
            self.transition = None;
        }

        let screen = Vec2::new(self.pointer.x, self.pointer.y);
        if clicked {
            self.dispatch_click(screen)?;
        }

        let active = self.active;
        let commands = self.rooms[active.0].tick(frame.dt, screen)?;
        self.apply_commands(active, commands)?;
        self.debug.update(input, &mut self.rooms[active.0]);

        if let Some(owner) = self.hud.tick(frame.dt) {
            self.text_box_done(owner)?;
        }
        self.speech.tick(frame.dt, self.audio.as_mut());

        // Cleared before the attempt so a failed transition is not retried forever.
        if let Some(request) = self.next_room.take() {
            self.go_to_door_immediately(request)?;
        }

        self.persist_if_requested();
        Ok(())
    }

    pub(crate) fn draw(&mut self, ctx: &mut dyn DrawContext) {
        ctx.clear(Color::BLACK);
        let debug = self.debug.enabled();
        let (width, height) = ctx.size();

        match self.transition {
            Some(transition) if !transition.is_done(self.now) => {
                let unit = transition.direction.unit();
                let shift = transition.progress(self.now);
                let out_x = unit.x * shift * width as f32;
                let out_y = unit.y * shift * height as f32;
                ctx.save();
                ctx.translate(out_x, out_y);
                self.rooms[transition.from.0].draw(ctx, debug);
                ctx.restore();
                ctx.save();
                ctx.translate(out_x - unit.x * width as f32, out_y - unit.y * height as f32);
                self.rooms[self.active.0].draw(ctx, debug);
                ctx.restore();
            }
            Some(_) => {
                self.transition = None;
                self.rooms[self.active.0].draw(ctx, debug);
            }
            None => self.rooms[self.active.0].draw(ctx, debug),
        }

        self.hud.set_overlay(self.rooms[self.active.0].overlay());
        self.hud.draw(ctx);

        if self.pointer.active {
            let Pointer { x, y, .. } = self.pointer;
            ctx.fill_rect(x - 4.0, y - 1.0, 8.0, 2.0, Color::WHITE);
            ctx.fill_rect(x - 1.0, y - 4.0, 2.0, 8.0, Color::WHITE);
        }
    }

    pub(crate) fn cursor(&self) -> CursorHint {
        if self.debug.held().is_some() {
            CursorHint::Grab
        } else if self.room().is_hovering() {
            CursorHint::Pointer
        } else {
            CursorHint::Default
        }
    }

    /// Entry point for room changes. Locked rooms go to the current room's
    /// handler instead; unlocked ones are deferred to the end of the tick.
    pub(crate) fn go_to_door(
        &mut self,
        room: &str,
        door: &str,
        direction: Direction,
    ) -> Result<(), GameError> {
        if !self.progress.is_room_unlocked(room) {
            debug!(room, "room_locked");
            let active = self.active;
            let mut out = Vec::new();
            self.rooms[active.0].handle_locked_door(room, &mut out);
            return self.apply_commands(active, out);
        }
        self.next_room = Some(DoorRequest {
            room: room.to_string(),
            door: door.to_string(),
            direction,
        });
        Ok(())
    }

    fn go_to_door_immediately(&mut self, request: DoorRequest) -> Result<(), GameError> {
        let target = self
            .rooms
            .iter()
            .position(|room| room.name() == request.room)
            .ok_or_else(|| GameError::RoomNotFound(request.room.clone()))?;
        let door = self.rooms[target]
            .find_door(&request.door)
            .ok_or_else(|| GameError::DoorNotFound {
                room: request.room.clone(),
                door: request.door.clone(),
            })?;
        let (door_x, door_base) = (door.x(), door.base());

        let from = self.active;
        let mut out = Vec::new();
        self.rooms[from.0].deactivate(&mut out);
        self.hud.hide_item_window();
        let mut player = self.rooms[from.0].detach_player()?;
        if let Some(inner) = player.kind_mut().as_player_mut() {
            inner.place_at(door_x, door_base);
        }

        let target = RoomId(target);
        self.rooms[target.0].adopt_thing(player);
        self.active = target;
        self.rooms[target.0].activate(&mut out)?;
        self.apply_commands(target, out)?;
        self.transition = Some(Transition {
            from,
            direction: request.direction,
            start: self.now,
            duration: self.transition_seconds,
        });

        self.run_room_interactions()?;
        self.music
            .room_changed(&request.room, false, &self.flags, self.audio.as_mut());
        info!(room = %request.room, door = %request.door, "room_entered");
        self.save_requested = true;
        Ok(())
    }

    fn run_room_interactions(&mut self) -> Result<(), GameError> {
        let keys = self.room().interacts().to_vec();
        for key in keys {
            match key.as_str() {
                LOUD_INTERACTION => {
                    let wilted = self
                        .with_player(|player, services| {
                            if !player.has_material(MaterialType::Hushroom) {
                                return Ok(false);
                            }
                            player.toss_material(MaterialType::Hushroom, services)?;
                            services.toast("Your hushroom wilted from all the noise");
                            Ok::<bool, InventoryError>(true)
                        })
                        .transpose()?;
                    if wilted == Some(true) {
                        debug!(room = %self.room().name(), "hushroom_wilted");
                    }
                }
                other => warn!(room = %self.room().name(), key = other, "room_interaction_unknown"),
            }
        }
        Ok(())
    }

    fn dispatch_click(&mut self, screen: Vec2) -> Result<(), GameError> {
        match self.hud.click(screen) {
            HudClick::Ignored => {
                self.hud.hide_item_window();
                let active = self.active;
                let commands = self.rooms[active.0].do_click(screen, &self.progress)?;
                self.apply_commands(active, commands)
            }
            HudClick::Consumed => Ok(()),
            HudClick::Take { item, unlocks } => {
                let taken = self
                    .with_player(|player, services| player.take_item(item, false, services))
                    .transpose()?
                    .unwrap_or(false);
                if let (true, Some(level)) = (taken, unlocks) {
                    self.progress.increase_progress_level_name(&level)?;
                    self.save_requested = true;
                }
                Ok(())
            }
            HudClick::Activate(item) => self.activate_item(item),
            HudClick::TextBoxDone(owner) => self.text_box_done(owner),
        }
    }

    /// Uses a hotbar item on whatever nearby station accepts it.
    fn activate_item(&mut self, item: ItemRef) -> Result<(), GameError> {
        let active = self.active;
        let Some(view) = self.room().player_view() else {
            return Ok(());
        };

        if let ItemRef::Potion(potion) = item {
            let used = self
                .with_player(|player, services| player.apply_potion(potion, services))
                .transpose()?;
            if used == Some(PotionUse::NoTarget) {
                self.toast("Nothing to apply that to");
            }
            return Ok(());
        }

        let room = &self.rooms[active.0];
        let stations: Vec<_> = [ThingType::Cauldron, ThingType::Furnace]
            .into_iter()
            .flat_map(move |thing_type| room.objects_of_type(thing_type))
            .filter(|thing| {
                let position = thing.kind().placed().position();
                view.can_reach(position.x, position.y)
            })
            .map(|thing| thing.id())
            .collect();

        let mut out = Vec::new();
        let mut accepted = false;
        for id in stations {
            let Some(thing) = self.rooms[active.0].thing_mut(id) else {
                continue;
            };
            accepted = match (thing.kind_mut(), item) {
                (ThingKind::Cauldron(cauldron), ItemRef::Material(material)) => {
                    cauldron.put_item(material, &mut out)
                }
                (ThingKind::Furnace(furnace), _) => furnace.put_object_in(item, &mut out),
                _ => false,
            };
            if accepted || !out.is_empty() {
                break;
            }
        }

        if accepted {
            self.with_player(|player, services| player.toss_item(item, services))
                .transpose()?;
        } else if out.is_empty() {
            self.toast("There's nothing here to use that with");
        }
        self.apply_commands(active, out)
    }

    fn text_box_done(&mut self, owner: TextBoxOwner) -> Result<(), GameError> {
        match owner {
            TextBoxOwner::Room(room) => {
                let mut out = Vec::new();
                if let Some(target) = self.rooms.get_mut(room.0) {
                    target.on_text_box_done(&self.progress, &mut out);
                }
                self.apply_commands(room, out)
            }
            TextBoxOwner::Thing(_) => {
                self.speech.stop();
                Ok(())
            }
        }
    }

    fn apply_commands(
        &mut self,
        room: RoomId,
        commands: Vec<ThingCommand>,
    ) -> Result<(), GameError> {
        for command in commands {
            match command {
                ThingCommand::GoToDoor {
                    room: target,
                    door,
                    direction,
                } => self.go_to_door(&target, &door, direction)?,
                ThingCommand::ShowItemWindow { item, at, unlocks } => {
                    self.hud.show_item_window(item, at, unlocks)
                }
                ThingCommand::Toast(message) => self.toast(&message),
                ThingCommand::ShowTextBox {
                    speaker,
                    text,
                    owner,
                } => self.hud.show_text_box(speaker, text, owner),
                ThingCommand::HideTextBox(owner) => {
                    self.hud.hide_text_box(owner);
                }
                ThingCommand::StartSpeech(npc) => self.speech.start(npc),
                ThingCommand::StopSpeech => self.speech.stop(),
                ThingCommand::GiveItem(item) => {
                    self.with_player(|player, services| player.take_item(item, false, services))
                        .transpose()?;
                }
                ThingCommand::TossItem(item) => {
                    self.with_player(|player, services| player.toss_item(item, services))
                        .transpose()?;
                }
                ThingCommand::IncreaseProgress(level) => {
                    if self.progress.increase_progress_level_name(&level)? {
                        self.save_requested = true;
                    }
                }
                ThingCommand::SwitchFlags {
                    toggle,
                    enable,
                    disable,
                } => self.switch_flags(&toggle, &enable, &disable),
                ThingCommand::Save => self.save_requested = true,
                local @ (ThingCommand::AdoptThings(_) | ThingCommand::Disown(_)) => {
                    if let Some(target) = self.rooms.get_mut(room.0) {
                        target.apply_local(vec![local])?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Toggling any flag re-applies the current room's mix at once.
    fn switch_flags(&mut self, toggle: &[String], enable: &[String], disable: &[String]) {
        for name in toggle {
            self.flags.toggle(name);
        }
        for name in enable {
            self.flags.enable(name);
        }
        for name in disable {
            self.flags.disable(name);
        }
        if !toggle.is_empty() {
            let Game {
                rooms,
                active,
                music,
                flags,
                audio,
                ..
            } = self;
            music.room_changed(rooms[active.0].name(), true, flags, audio.as_mut());
        }
    }

    fn toast(&mut self, message: &str) {
        self.hud
            .toast(message, Vec2::new(self.pointer.x, self.pointer.y));
    }

    /// Runs `f` against the player in the active room with the inventory services wired up.
    fn with_player<R>(
        &mut self,
        f: impl FnOnce(&mut Player, &mut Services<'_>) -> R,
    ) -> Option<R> {
        let Game {
            rooms,
            active,
            hud,
            audio,
            save_requested,
            pointer,
            ..
        } = self;
        let player = rooms.get_mut(active.0)?.player_mut()?;
        let mut services = Services {
            hud,
            audio: audio.as_mut(),
            save_requested,
            toast_at: Vec2::new(pointer.x, pointer.y),
        };
        Some(f(player, &mut services))
    }

    fn persist_if_requested(&mut self) {
        if !self.save_requested {
            return;
        }
        self.save_requested = false;
        let text = match self.get_state().and_then(|state| {
            serde_json::to_string(&state).map_err(GameError::Encode)
        }) {
            Ok(text) => text,
            Err(err) => {
                error!(error = %err, "save_encode_failed");
                return;
            }
        };
        match self.store.set(&self.save_key, &text) {
            Ok(()) => debug!(key = %self.save_key, bytes = text.len(), "game_saved"),
            Err(err) => warn!(error = %err, "save_write_failed"),
        }
    }

    pub(crate) fn shutdown(&mut self) {
        self.speech.stop();
        self.persist_if_requested();
    }
}
