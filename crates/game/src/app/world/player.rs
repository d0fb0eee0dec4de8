use engine::{Color, DrawContext, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::catalog::{ItemRef, MaterialType, PotionType, PuzzleObjectType};
use super::registry::{LoadContext, Persisted, Registry, RegistryError};
use super::thing::{
    DrawView, Drawable, Placed, PlayerView, ThingCommand, TickContext, Tickable,
};
use crate::app::hud::HudError;

pub(crate) const DEFAULT_INVENTORY_SIZE: usize = 5;
pub(crate) const DEFAULT_REACH: f32 = 400.0;
pub(crate) const DEFAULT_WALK_SPEED: f32 = 400.0;

const PLAYER_WIDTH: f32 = 32.0;
const PLAYER_HEIGHT: f32 = 48.0;
const PLAYER_Z: f32 = 0.0;
const ARRIVAL_THRESHOLD: f32 = 1.0;

#[derive(Debug, Error)]
pub(crate) enum InventoryError {
    #[error("player does not hold {0}")]
    NotHeld(ItemRef),
    #[error("{0} was lost while replacing a held item")]
    Dropped(ItemRef),
    #[error(transparent)]
    Hotbar(#[from] HudError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cue {
    Pickup,
    Failure,
    Splat,
}

impl Cue {
    pub(crate) const ALL: [Cue; 3] = [Cue::Pickup, Cue::Failure, Cue::Splat];

    pub(crate) fn sfx_name(self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Failure => "failure",
            Self::Splat => "splat",
        }
    }
}

/// What happened when a potion was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PotionUse {
    Applied,
    /// Nothing held matches the potion.
    NoTarget,
    /// The result would be a material already held; nothing changed.
    Refused,
}

/// Side effects of inventory changes: the hotbar mirror, feedback and saving.
pub(crate) trait InventorySink {
    fn hotbar_add(&mut self, item: ItemRef) -> Result<(), HudError>;
    fn hotbar_remove(&mut self, item: ItemRef) -> Result<(), HudError>;
    fn toast(&mut self, message: &str);
    fn play_cue(&mut self, cue: Cue);
    fn request_save(&mut self);
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InventoryRecord {
    #[serde(default)]
    pub(crate) materials: Vec<MaterialType>,
    #[serde(default)]
    pub(crate) puzzle_objects: Vec<PuzzleObjectType>,
    #[serde(default)]
    pub(crate) potions: Vec<PotionType>,
}

impl InventoryRecord {
    fn items(&self) -> impl Iterator<Item = ItemRef> + '_ {
        self.materials
            .iter()
            .copied()
            .map(ItemRef::Material)
            .chain(self.puzzle_objects.iter().copied().map(ItemRef::PuzzleObject))
            .chain(self.potions.iter().copied().map(ItemRef::Potion))
    }

    fn push(&mut self, item: ItemRef) {
        match item {
            ItemRef::Material(material) => self.materials.push(material),
            ItemRef::PuzzleObject(object) => self.puzzle_objects.push(object),
            ItemRef::Potion(potion) => self.potions.push(potion),
        }
    }

    fn is_empty(&self) -> bool {
        self.materials.is_empty() && self.puzzle_objects.is_empty() && self.potions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlayerRecord {
    pub(crate) x: f32,
    pub(crate) y: f32,
    #[serde(default)]
    pub(crate) z: f32,
    #[serde(default)]
    pub(crate) inventory: InventoryRecord,
}

/// Held items. The three collections share one capacity.
#[derive(Debug, Clone, Default)]
pub(crate) struct Inventory {
    capacity: usize,
    held: InventoryRecord,
}

impl Inventory {
    pub(crate) fn len(&self) -> usize {
        self.held.materials.len() + self.held.puzzle_objects.len() + self.held.potions.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    pub(crate) fn items(&self) -> Vec<ItemRef> {
        self.held.items().collect()
    }
}

#[derive(Debug)]
pub(crate) struct Player {
    x: f32,
    y: f32,
    z: f32,
    target_x: f32,
    reach: f32,
    speed: f32,
    facing_left: bool,
    inventory: Inventory,
    /// Saved items waiting to be replayed through the hotbar.
    pending_restore: InventoryRecord,
}

impl Player {
    pub(crate) fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            z: PLAYER_Z,
            target_x: x,
            reach: DEFAULT_REACH,
            speed: DEFAULT_WALK_SPEED,
            facing_left: false,
            inventory: Inventory {
                capacity: DEFAULT_INVENTORY_SIZE,
                held: InventoryRecord::default(),
            },
            pending_restore: InventoryRecord::default(),
        }
    }

    pub(crate) fn configure(&mut self, capacity: usize, reach: f32, speed: f32) {
        self.inventory.capacity = capacity;
        self.reach = reach;
        self.speed = speed;
    }

    pub(crate) fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub(crate) fn target_x(&self) -> f32 {
        self.target_x
    }

    pub(crate) fn view(&self) -> PlayerView {
        PlayerView {
            x: self.x,
            y: self.y,
            reach: self.reach,
            free_slots: self.inventory.capacity.saturating_sub(self.inventory.len()),
            held: self.inventory.items(),
        }
    }

    /// Replays saved items through the normal take path without feedback or saving.
    /// Items past the capacity stay pending so the next save still carries them.
    pub(crate) fn rehydrate(&mut self, sink: &mut dyn InventorySink) -> Result<(), InventoryError> {
        let pending = std::mem::take(&mut self.pending_restore);
        for item in pending.items() {
            if let ItemRef::Material(material) = item {
                if self.has_material(material) {
                    warn!(item = %item, "saved_duplicate_dropped");
                    continue;
                }
            }
            if self.inventory.is_full() {
                warn!(item = %item, capacity = self.inventory.capacity, "saved_item_over_capacity");
                self.pending_restore.push(item);
                continue;
            }
            self.take_item(item, true, sink)?;
        }
        Ok(())
    }

    /// Places the player at a door and stops any walk in progress.
    pub(crate) fn place_at(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
        self.target_x = x;
    }

    pub(crate) fn move_to_cursor(&mut self, x: f32) {
        self.target_x = x;
    }

    pub(crate) fn can_reach(&self, x: f32, y: f32) -> bool {
        self.view().can_reach(x, y)
    }

    pub(crate) fn has_material(&self, material: MaterialType) -> bool {
        self.inventory.held.materials.contains(&material)
    }

    pub(crate) fn has_puzzle_object(&self, object: PuzzleObjectType) -> bool {
        self.inventory.held.puzzle_objects.contains(&object)
    }

    pub(crate) fn has_potion(&self, potion: PotionType) -> bool {
        self.inventory.held.potions.contains(&potion)
    }

    pub(crate) fn holds(&self, item: ItemRef) -> bool {
        match item {
            ItemRef::Material(material) => self.has_material(material),
            ItemRef::PuzzleObject(object) => self.has_puzzle_object(object),
            ItemRef::Potion(potion) => self.has_potion(potion),
        }
    }

    /// Capacity gate; plays the failure cue when the pockets are full.
    pub(crate) fn check_inventory_size(&self, sink: &mut dyn InventorySink) -> bool {
        if self.inventory.is_full() {
            sink.play_cue(Cue::Failure);
            sink.toast("Your pockets are full!");
            return false;
        }
        true
    }

    pub(crate) fn take_material(
        &mut self,
        material: MaterialType,
        is_initializing: bool,
        sink: &mut dyn InventorySink,
    ) -> Result<bool, InventoryError> {
        if self.has_material(material) {
            debug!(material = material.key(), "material_already_held");
            if !is_initializing {
                sink.play_cue(Cue::Failure);
                sink.toast(&format!("You already have {}", material.name()));
            }
            return Ok(false);
        }
        if !self.check_inventory_size(sink) {
            return Ok(false);
        }
        self.inventory.held.materials.push(material);
        self.after_take(ItemRef::Material(material), is_initializing, sink)?;
        Ok(true)
    }

    pub(crate) fn take_puzzle_object(
        &mut self,
        object: PuzzleObjectType,
        is_initializing: bool,
        sink: &mut dyn InventorySink,
    ) -> Result<bool, InventoryError> {
        if !self.check_inventory_size(sink) {
            return Ok(false);
        }
        self.inventory.held.puzzle_objects.push(object);
        self.after_take(ItemRef::PuzzleObject(object), is_initializing, sink)?;
        Ok(true)
    }

    pub(crate) fn take_potion(
        &mut self,
        potion: PotionType,
        is_initializing: bool,
        sink: &mut dyn InventorySink,
    ) -> Result<bool, InventoryError> {
        if !self.check_inventory_size(sink) {
            return Ok(false);
        }
        self.inventory.held.potions.push(potion);
        self.after_take(ItemRef::Potion(potion), is_initializing, sink)?;
        Ok(true)
    }

    pub(crate) fn take_item(
        &mut self,
        item: ItemRef,
        is_initializing: bool,
        sink: &mut dyn InventorySink,
    ) -> Result<bool, InventoryError> {
        match item {
            ItemRef::Material(material) => self.take_material(material, is_initializing, sink),
            ItemRef::PuzzleObject(object) => {
                self.take_puzzle_object(object, is_initializing, sink)
            }
            ItemRef::Potion(potion) => self.take_potion(potion, is_initializing, sink),
        }
    }

    fn after_take(
        &mut self,
        item: ItemRef,
        is_initializing: bool,
        sink: &mut dyn InventorySink,
    ) -> Result<(), InventoryError> {
        sink.hotbar_add(item)?;
        if !is_initializing {
            sink.play_cue(Cue::Pickup);
            sink.request_save();
        }
        Ok(())
    }

    pub(crate) fn toss_material(
        &mut self,
        material: MaterialType,
        sink: &mut dyn InventorySink,
    ) -> Result<(), InventoryError> {
        remove_first(&mut self.inventory.held.materials, &material)
            .ok_or(InventoryError::NotHeld(ItemRef::Material(material)))?;
        self.after_toss(ItemRef::Material(material), sink)
    }

    pub(crate) fn toss_puzzle_object(
        &mut self,
        object: PuzzleObjectType,
        sink: &mut dyn InventorySink,
    ) -> Result<(), InventoryError> {
        remove_first(&mut self.inventory.held.puzzle_objects, &object)
            .ok_or(InventoryError::NotHeld(ItemRef::PuzzleObject(object)))?;
        self.after_toss(ItemRef::PuzzleObject(object), sink)
    }

    pub(crate) fn toss_potion(
        &mut self,
        potion: PotionType,
        sink: &mut dyn InventorySink,
    ) -> Result<(), InventoryError> {
        remove_first(&mut self.inventory.held.potions, &potion)
            .ok_or(InventoryError::NotHeld(ItemRef::Potion(potion)))?;
        self.after_toss(ItemRef::Potion(potion), sink)
    }

    pub(crate) fn toss_item(
        &mut self,
        item: ItemRef,
        sink: &mut dyn InventorySink,
    ) -> Result<(), InventoryError> {
        match item {
            ItemRef::Material(material) => self.toss_material(material, sink),
            ItemRef::PuzzleObject(object) => self.toss_puzzle_object(object, sink),
            ItemRef::Potion(potion) => self.toss_potion(potion, sink),
        }
    }

    fn after_toss(&mut self, item: ItemRef, sink: &mut dyn InventorySink) -> Result<(), InventoryError> {
        sink.hotbar_remove(item)?;
        sink.request_save();
        Ok(())
    }

    /// Uses `potion` on whatever it applies to. Both collections are left
    /// alone unless the replacement can be taken.
    pub(crate) fn apply_potion(
        &mut self,
        potion: PotionType,
        sink: &mut dyn InventorySink,
    ) -> Result<PotionUse, InventoryError> {
        if !self.has_potion(potion) {
            return Err(InventoryError::NotHeld(ItemRef::Potion(potion)));
        }
        let info = potion.info();
        let (Some(target), Some(replacement)) = (info.apply_to, info.turns_into) else {
            return Ok(PotionUse::NoTarget);
        };
        if !self.holds(target) {
            return Ok(PotionUse::NoTarget);
        }
        if let ItemRef::Material(material) = replacement {
            if replacement != target && self.has_material(material) {
                debug!(potion = ?potion, material = material.key(), "potion_result_already_held");
                sink.play_cue(Cue::Failure);
                sink.toast(&format!("You already have {}", material.name()));
                return Ok(PotionUse::Refused);
            }
        }
        self.toss_potion(potion, sink)?;
        self.toss_item(target, sink)?;
        if !self.take_item(replacement, false, sink)? {
            return Err(InventoryError::Dropped(replacement));
        }
        sink.play_cue(Cue::Splat);
        Ok(PotionUse::Applied)
    }
}

fn remove_first<T: PartialEq>(items: &mut Vec<T>, wanted: &T) -> Option<T> {
    let index = items.iter().position(|item| item == wanted)?;
    Some(items.remove(index))
}

impl Placed for Player {
    fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    fn set_position(&mut self, position: Vec2) {
        self.place_at(position.x, position.y);
    }

    fn z(&self) -> f32 {
        self.z
    }
}

impl Tickable for Player {
    fn tick(&mut self, dt: f32, _ctx: &TickContext, _out: &mut Vec<ThingCommand>) {
        let remaining = self.target_x - self.x;
        if remaining.abs() <= ARRIVAL_THRESHOLD {
            self.x = self.target_x;
            return;
        }
        self.facing_left = remaining < 0.0;
        let step = (self.speed * dt).min(remaining.abs());
        self.x += step * remaining.signum();
    }
}

impl Drawable for Player {
    fn draw(&self, ctx: &mut dyn DrawContext, _view: &DrawView<'_>) {
        let left = self.x - PLAYER_WIDTH / 2.0;
        let top = self.y - PLAYER_HEIGHT;
        ctx.fill_rect(left, top, PLAYER_WIDTH, PLAYER_HEIGHT, Color::INK);
        let hat_x = if self.facing_left { left - 6.0 } else { left + 6.0 };
        ctx.fill_rect(hat_x, top - 12.0, PLAYER_WIDTH, 12.0, Color::PURPLE);
    }
}

impl Persisted for Player {
    const TAG: &'static str = "Player";
    type Record = PlayerRecord;

    fn from_record(record: PlayerRecord, _ctx: &mut LoadContext<'_>) -> Result<Self, RegistryError> {
        let mut player = Player::new(record.x, record.y);
        player.z = record.z;
        player.pending_restore = record.inventory;
        Ok(player)
    }

    fn to_record(&self, _registry: &Registry) -> Result<PlayerRecord, RegistryError> {
        let mut inventory = self.inventory.held.clone();
        if !self.pending_restore.is_empty() {
            inventory.materials.extend(&self.pending_restore.materials);
            inventory.puzzle_objects.extend(&self.pending_restore.puzzle_objects);
            inventory.potions.extend(&self.pending_restore.potions);
        }
        Ok(PlayerRecord {
            x: self.x,
            y: self.y,
            z: self.z,
            inventory,
        })
    }
}
