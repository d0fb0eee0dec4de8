use engine::{Color, DrawContext, Vec2};
use serde::{Deserialize, Serialize};

use crate::app::world::registry::{LoadContext, Persisted, Registry, RegistryError};
use crate::app::world::thing::{
    ClickContext, Clickable, DebugResizable, DrawView, Drawable, Placed, PointerHittable,
    RoomGeometry, ThingCommand,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Unit offset the outgoing room slides along.
    pub(crate) fn unit(self) -> Vec2 {
        match self {
            Self::Left => Vec2::new(1.0, 0.0),
            Self::Right => Vec2::new(-1.0, 0.0),
            Self::Up => Vec2::new(0.0, 1.0),
            Self::Down => Vec2::new(0.0, -1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DoorRecord {
    pub(crate) name: String,
    pub(crate) x: f32,
    pub(crate) width: f32,
    pub(crate) base: f32,
    pub(crate) height: f32,
    /// `[room, door]` on the other side.
    pub(crate) target: (String, String),
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) direction: Option<Direction>,
    #[serde(default)]
    pub(crate) z: f32,
}

/// A wall opening drawn in perspective towards the room's vanishing point.
#[derive(Debug)]
pub(crate) struct Door {
    record: DoorRecord,
}

impl Door {
    pub(crate) fn name(&self) -> &str {
        &self.record.name
    }

    pub(crate) fn base(&self) -> f32 {
        self.record.base
    }

    pub(crate) fn x(&self) -> f32 {
        self.record.x
    }

    pub(crate) fn target_room(&self) -> &str {
        &self.record.target.0
    }

    fn slope_towards(&self, vanishing_point: Vec2, y: f32) -> f32 {
        let run = vanishing_point.x - self.record.x;
        if run.abs() < f32::EPSILON {
            return 0.0;
        }
        (vanishing_point.y - y) / run
    }

    fn direction(&self, geometry: &RoomGeometry) -> Direction {
        self.record.direction.unwrap_or(if self.record.x > geometry.vanishing_point.x {
            Direction::Right
        } else {
            Direction::Left
        })
    }
}

impl PointerHittable for Door {
    fn is_under_pointer(&self, x: f32, y: f32, geometry: &RoomGeometry) -> bool {
        let door = &self.record;
        if (x - door.x).abs() > door.width / 2.0 {
            return false;
        }
        let run = geometry.vanishing_point.x - x;
        let slope = if run.abs() < f32::EPSILON {
            0.0
        } else {
            (geometry.vanishing_point.y - y) / run
        };
        let adjusted_y = y - slope * (x - door.x);
        adjusted_y <= door.base && adjusted_y >= door.base - door.height
    }
}

impl Clickable for Door {
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
        if !ctx.player_can_reach(self.record.x, self.record.base) {
            return false;
        }
        let (room, door) = self.record.target.clone();
        out.push(ThingCommand::GoToDoor {
            room,
            door,
            direction: self.direction(ctx.geometry),
        });
        true
    }
}

impl Drawable for Door {
    fn draw(&self, ctx: &mut dyn DrawContext, view: &DrawView<'_>) {
        if !view.debug {
            return;
        }
        let door = &self.record;
        let vp = view.geometry.vanishing_point;
        let floor = self.slope_towards(vp, door.base);
        let ceiling = self.slope_towards(vp, door.base - door.height);
        let half = door.width / 2.0;
        ctx.fill_quad(
            [
                Vec2::new(door.x - half, door.base - floor * half),
                Vec2::new(door.x + half, door.base + floor * half),
                Vec2::new(door.x + half, door.base - door.height + ceiling * half),
                Vec2::new(door.x - half, door.base - door.height - ceiling * half),
            ],
            Color::DEBUG_GREEN.with_alpha(160),
        );
    }
}

impl DebugResizable for Door {
    fn debug_resize(&mut self, dx: f32, dy: f32) {
        self.record.width = (self.record.width + dx / 50.0).max(1.0);
        self.record.height = (self.record.height - dy / 50.0).max(1.0);
    }
}

impl Placed for Door {
    fn position(&self) -> Vec2 {
        Vec2::new(self.record.x, self.record.base)
    }

    fn set_position(&mut self, position: Vec2) {
        self.record.x = position.x;
        self.record.base = position.y;
    }

    fn z(&self) -> f32 {
        self.record.z
    }
}

impl Persisted for Door {
    const TAG: &'static str = "Door";
    type Record = DoorRecord;

    fn from_record(record: DoorRecord, _ctx: &mut LoadContext<'_>) -> Result<Self, RegistryError> {
        Ok(Self { record })
    }

    fn to_record(&self, _registry: &Registry) -> Result<DoorRecord, RegistryError> {
        Ok(self.record.clone())
    }
}
