mod animated;
mod cabinet;
mod cauldron;
mod container;
mod door;
mod flag_switcher;
mod furnace;
mod npc;
mod plants;
mod puff;
mod spawner;

pub(crate) use animated::AnimatedObject;
pub(crate) use cabinet::{Cabinet, BOTTOM_DRAWER_LEVEL, TOP_DRAWER_LEVEL};
pub(crate) use cauldron::Cauldron;
pub(crate) use container::Container;
pub(crate) use door::{Direction, Door};
pub(crate) use flag_switcher::FlagSwitcher;
pub(crate) use furnace::Furnace;
pub(crate) use npc::{Npc, NpcType};
pub(crate) use plants::Plants;
pub(crate) use puff::Puff;
pub(crate) use spawner::{PuzzleObjectSpawner, ResourceSpawner};

/// Centre-anchored box test shared by the image-backed entities.
pub(crate) fn centred_box_contains(cx: f32, cy: f32, width: f32, height: f32, x: f32, y: f32) -> bool {
    (x - cx).abs() <= width / 2.0 && (y - cy).abs() <= height / 2.0
}

/// Top-left anchored box test.
pub(crate) fn corner_box_contains(left: f32, top: f32, width: f32, height: f32, x: f32, y: f32) -> bool {
    x >= left && x <= left + width && y >= top && y <= top + height
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::app::world::catalog::ItemRef;
    use crate::app::world::progress::Progress;
    use crate::app::world::thing::{
        ClickContext, PlayerView, RoomGeometry, ThingId, ThingIdAllocator,
    };
    use engine::Vec2;

    pub(crate) fn geometry() -> RoomGeometry {
        RoomGeometry {
            width: 2000.0,
            height: 1000.0,
            vanishing_point: Vec2::new(1000.0, 400.0),
            floor_height: 800.0,
        }
    }

    pub(crate) fn player_at(x: f32, held: &[ItemRef]) -> PlayerView {
        PlayerView {
            x,
            y: 800.0,
            reach: 400.0,
            free_slots: 5 - held.len(),
            held: held.to_vec(),
        }
    }

    pub(crate) fn thing_id() -> ThingId {
        ThingIdAllocator::default().allocate()
    }

    pub(crate) fn click_ctx<'a>(
        geometry: &'a RoomGeometry,
        player: Option<&'a PlayerView>,
        progress: &'a Progress,
    ) -> ClickContext<'a> {
        ClickContext {
            this: thing_id(),
            geometry,
            player,
            progress,
        }
    }
}
