//! The closed set of room entities and the capabilities they opt into.

use engine::{DrawContext, Vec2};

use super::catalog::ItemRef;
use super::entities::{
    AnimatedObject, Cabinet, Cauldron, Container, Direction, Door, FlagSwitcher, Furnace, Npc,
    NpcType, Plants, Puff, PuzzleObjectSpawner, ResourceSpawner,
};
use super::player::Player;
use super::progress::Progress;
use crate::app::hud::TextBoxOwner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct ThingId(u64);

impl ThingId {
    pub(crate) fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub(crate) struct ThingIdAllocator {
    next: u64,
}

impl ThingIdAllocator {
    pub(crate) fn allocate(&mut self) -> ThingId {
        self.next = self.next.saturating_add(1);
        ThingId(self.next)
    }
}

/// Index into the game's room table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct RoomId(pub(crate) usize);

/// Room-space numbers every entity may need for hit tests and drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RoomGeometry {
    pub(crate) width: f32,
    pub(crate) height: f32,
    pub(crate) vanishing_point: Vec2,
    pub(crate) floor_height: f32,
}

/// Read-only snapshot of the player taken before dispatching to other things.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlayerView {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) reach: f32,
    pub(crate) free_slots: usize,
    pub(crate) held: Vec<ItemRef>,
}

impl PlayerView {
    pub(crate) fn holds(&self, item: ItemRef) -> bool {
        self.held.contains(&item)
    }

    pub(crate) fn can_reach(&self, x: f32, _y: f32) -> bool {
        (x - self.x).abs() <= self.reach
    }
}

/// Requests an entity makes of its room or of the game.
#[derive(Debug)]
pub(crate) enum ThingCommand {
    GoToDoor {
        room: String,
        door: String,
        direction: Direction,
    },
    ShowItemWindow {
        item: ItemRef,
        at: Vec2,
        unlocks: Option<String>,
    },
    Toast(String),
    ShowTextBox {
        speaker: NpcType,
        text: String,
        owner: TextBoxOwner,
    },
    HideTextBox(TextBoxOwner),
    StartSpeech(NpcType),
    StopSpeech,
    GiveItem(ItemRef),
    TossItem(ItemRef),
    IncreaseProgress(String),
    SwitchFlags {
        toggle: Vec<String>,
        enable: Vec<String>,
        disable: Vec<String>,
    },
    Save,
    /// Room-local: adopt these things into the issuing thing's room.
    AdoptThings(Vec<Thing>),
    /// Room-local: remove a thing from the issuing thing's room.
    Disown(ThingId),
}

impl ThingCommand {
    pub(crate) fn toast(message: impl Into<String>) -> Self {
        Self::Toast(message.into())
    }
}

pub(crate) struct DrawView<'a> {
    pub(crate) debug: bool,
    pub(crate) geometry: RoomGeometry,
    pub(crate) player: Option<&'a PlayerView>,
}

pub(crate) struct TickContext {
    pub(crate) this: ThingId,
}

pub(crate) struct ClickContext<'a> {
    pub(crate) this: ThingId,
    pub(crate) geometry: &'a RoomGeometry,
    pub(crate) player: Option<&'a PlayerView>,
    pub(crate) progress: &'a Progress,
}

impl ClickContext<'_> {
    /// False when there is no player in the room.
    pub(crate) fn player_can_reach(&self, x: f32, y: f32) -> bool {
        self.player.is_some_and(|player| player.can_reach(x, y))
    }
}

pub(crate) trait Placed {
    fn position(&self) -> Vec2;
    fn set_position(&mut self, position: Vec2);
    fn z(&self) -> f32;
}

pub(crate) trait Drawable {
    fn draw(&self, ctx: &mut dyn DrawContext, view: &DrawView<'_>);
}

pub(crate) trait Tickable {
    fn tick(&mut self, dt: f32, ctx: &TickContext, out: &mut Vec<ThingCommand>);
}

pub(crate) trait PointerHittable {
    fn is_under_pointer(&self, x: f32, y: f32, geometry: &RoomGeometry) -> bool;

    /// Only found under the cursor while debug mode is on.
    fn debug_only(&self) -> bool {
        false
    }
}

pub(crate) trait Clickable: PointerHittable {
    /// Returns true when the click was consumed.
    fn do_click(
        &mut self,
        x: f32,
        y: f32,
        ctx: &ClickContext<'_>,
        out: &mut Vec<ThingCommand>,
    ) -> bool;
}

/// Things with screen-space visuals that must follow room activation.
pub(crate) trait DomBacked {
    fn start_drawing_dom(&mut self, _this: ThingId, _out: &mut Vec<ThingCommand>) {}
    fn stop_drawing_dom(&mut self, this: ThingId, out: &mut Vec<ThingCommand>);
}

pub(crate) trait DebugResizable {
    fn debug_resize(&mut self, dx: f32, dy: f32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ThingType {
    Player,
    Door,
    ResourceSpawner,
    PuzzleObjectSpawner,
    Container,
    Cabinet,
    Cauldron,
    Furnace,
    AnimatedObject,
    Npc,
    Plants,
    FlagSwitcher,
    Puff,
}

#[derive(Debug)]
pub(crate) enum ThingKind {
    Player(Player),
    Door(Door),
    ResourceSpawner(ResourceSpawner),
    PuzzleObjectSpawner(PuzzleObjectSpawner),
    Container(Container),
    Cabinet(Cabinet),
    Cauldron(Cauldron),
    Furnace(Furnace),
    AnimatedObject(AnimatedObject),
    Npc(Npc),
    Plants(Plants),
    FlagSwitcher(FlagSwitcher),
    Puff(Puff),
}

macro_rules! impl_from_kind {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for ThingKind {
                fn from(value: $variant) -> Self {
                    ThingKind::$variant(value)
                }
            }
        )*
    };
}

impl_from_kind!(
    Player,
    Door,
    ResourceSpawner,
    PuzzleObjectSpawner,
    Container,
    Cabinet,
    Cauldron,
    Furnace,
    AnimatedObject,
    Npc,
    Plants,
    FlagSwitcher,
    Puff,
);

impl ThingKind {
    pub(crate) fn thing_type(&self) -> ThingType {
        match self {
            Self::Player(_) => ThingType::Player,
            Self::Door(_) => ThingType::Door,
            Self::ResourceSpawner(_) => ThingType::ResourceSpawner,
            Self::PuzzleObjectSpawner(_) => ThingType::PuzzleObjectSpawner,
            Self::Container(_) => ThingType::Container,
            Self::Cabinet(_) => ThingType::Cabinet,
            Self::Cauldron(_) => ThingType::Cauldron,
            Self::Furnace(_) => ThingType::Furnace,
            Self::AnimatedObject(_) => ThingType::AnimatedObject,
            Self::Npc(_) => ThingType::Npc,
            Self::Plants(_) => ThingType::Plants,
            Self::FlagSwitcher(_) => ThingType::FlagSwitcher,
            Self::Puff(_) => ThingType::Puff,
        }
    }

    pub(crate) fn is_portal(&self) -> bool {
        matches!(self, Self::Door(_))
    }

    /// Transient effects are never written to a save.
    pub(crate) fn is_serializable(&self) -> bool {
        !matches!(self, Self::Puff(_))
    }

    pub(crate) fn placed(&self) -> &dyn Placed {
        match self {
            Self::Player(thing) => thing,
            Self::Door(thing) => thing,
            Self::ResourceSpawner(thing) => thing,
            Self::PuzzleObjectSpawner(thing) => thing,
            Self::Container(thing) => thing,
            Self::Cabinet(thing) => thing,
            Self::Cauldron(thing) => thing,
            Self::Furnace(thing) => thing,
            Self::AnimatedObject(thing) => thing,
            Self::Npc(thing) => thing,
            Self::Plants(thing) => thing,
            Self::FlagSwitcher(thing) => thing,
            Self::Puff(thing) => thing,
        }
    }

    pub(crate) fn placed_mut(&mut self) -> &mut dyn Placed {
        match self {
            Self::Player(thing) => thing,
            Self::Door(thing) => thing,
            Self::ResourceSpawner(thing) => thing,
            Self::PuzzleObjectSpawner(thing) => thing,
            Self::Container(thing) => thing,
            Self::Cabinet(thing) => thing,
            Self::Cauldron(thing) => thing,
            Self::Furnace(thing) => thing,
            Self::AnimatedObject(thing) => thing,
            Self::Npc(thing) => thing,
            Self::Plants(thing) => thing,
            Self::FlagSwitcher(thing) => thing,
            Self::Puff(thing) => thing,
        }
    }

    pub(crate) fn as_drawable(&self) -> Option<&dyn Drawable> {
        match self {
            Self::Player(thing) => Some(thing),
            Self::Door(thing) => Some(thing),
            Self::ResourceSpawner(thing) => Some(thing),
            Self::PuzzleObjectSpawner(thing) => Some(thing),
            Self::Container(thing) => Some(thing),
            Self::Cabinet(thing) => Some(thing),
            Self::Cauldron(thing) => Some(thing),
            Self::Furnace(thing) => Some(thing),
            Self::AnimatedObject(thing) => Some(thing),
            Self::Npc(thing) => Some(thing),
            Self::Plants(thing) => Some(thing),
            Self::FlagSwitcher(thing) => Some(thing),
            Self::Puff(thing) => Some(thing),
        }
    }

    pub(crate) fn as_tickable_mut(&mut self) -> Option<&mut dyn Tickable> {
        match self {
            Self::Player(thing) => Some(thing),
            Self::Cauldron(thing) => Some(thing),
            Self::Furnace(thing) => Some(thing),
            Self::AnimatedObject(thing) => Some(thing),
            Self::Plants(thing) => Some(thing),
            Self::Puff(thing) => Some(thing),
            Self::Door(_)
            | Self::ResourceSpawner(_)
            | Self::PuzzleObjectSpawner(_)
            | Self::Container(_)
            | Self::Cabinet(_)
            | Self::Npc(_)
            | Self::FlagSwitcher(_) => None,
        }
    }

    pub(crate) fn as_hittable(&self) -> Option<&dyn PointerHittable> {
        match self {
            Self::Door(thing) => Some(thing),
            Self::ResourceSpawner(thing) => Some(thing),
            Self::PuzzleObjectSpawner(thing) => Some(thing),
            Self::Container(thing) => Some(thing),
            Self::Cabinet(thing) => Some(thing),
            Self::Cauldron(thing) => Some(thing),
            Self::Furnace(thing) => Some(thing),
            Self::AnimatedObject(thing) => Some(thing),
            Self::Npc(thing) => Some(thing),
            Self::Plants(thing) => Some(thing),
            Self::FlagSwitcher(thing) => Some(thing),
            Self::Player(_) | Self::Puff(_) => None,
        }
    }

    pub(crate) fn as_clickable_mut(&mut self) -> Option<&mut dyn Clickable> {
        match self {
            Self::Door(thing) => Some(thing),
            Self::ResourceSpawner(thing) => Some(thing),
            Self::PuzzleObjectSpawner(thing) => Some(thing),
            Self::Container(thing) => Some(thing),
            Self::Cabinet(thing) => Some(thing),
            Self::Cauldron(thing) => Some(thing),
            Self::Furnace(thing) => Some(thing),
            Self::Npc(thing) => Some(thing),
            Self::FlagSwitcher(thing) => Some(thing),
            Self::Player(_) | Self::AnimatedObject(_) | Self::Plants(_) | Self::Puff(_) => None,
        }
    }

    pub(crate) fn as_dom_backed_mut(&mut self) -> Option<&mut dyn DomBacked> {
        match self {
            Self::Npc(thing) => Some(thing),
            _ => None,
        }
    }

    pub(crate) fn as_debug_resizable_mut(&mut self) -> Option<&mut dyn DebugResizable> {
        match self {
            Self::Door(thing) => Some(thing),
            Self::Container(thing) => Some(thing),
            Self::Cauldron(thing) => Some(thing),
            Self::Furnace(thing) => Some(thing),
            Self::AnimatedObject(thing) => Some(thing),
            Self::Npc(thing) => Some(thing),
            Self::FlagSwitcher(thing) => Some(thing),
            _ => None,
        }
    }

    pub(crate) fn as_player(&self) -> Option<&Player> {
        match self {
            Self::Player(player) => Some(player),
            _ => None,
        }
    }

    pub(crate) fn as_player_mut(&mut self) -> Option<&mut Player> {
        match self {
            Self::Player(player) => Some(player),
            _ => None,
        }
    }

    pub(crate) fn as_door(&self) -> Option<&Door> {
        match self {
            Self::Door(door) => Some(door),
            _ => None,
        }
    }
}

/// A room entity: identity, owning room handle and behaviour.
#[derive(Debug)]
pub(crate) struct Thing {
    id: ThingId,
    room: Option<RoomId>,
    kind: ThingKind,
}

impl Thing {
    pub(crate) fn new(id: ThingId, kind: impl Into<ThingKind>) -> Self {
        Self {
            id,
            room: None,
            kind: kind.into(),
        }
    }

    pub(crate) fn id(&self) -> ThingId {
        self.id
    }

    pub(crate) fn room(&self) -> Option<RoomId> {
        self.room
    }

    pub(crate) fn set_room(&mut self, room: Option<RoomId>) {
        self.room = room;
    }

    pub(crate) fn kind(&self) -> &ThingKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut ThingKind {
        &mut self.kind
    }

    pub(crate) fn z(&self) -> f32 {
        self.kind.placed().z()
    }

    pub(crate) fn position(&self) -> Vec2 {
        self.kind.placed().position()
    }
}
