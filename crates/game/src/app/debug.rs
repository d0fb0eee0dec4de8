//! Authoring aids: outlines, grab-and-drag and wheel resizing.

use engine::{InputSnapshot, Vec2};
use tracing::{debug, info};

use super::world::{Room, ThingId};

#[derive(Debug, Default)]
pub(crate) struct DebugTools {
    enabled: bool,
    held: Option<Grab>,
}

#[derive(Debug, Clone, Copy)]
struct Grab {
    thing: ThingId,
    /// Pointer minus thing position at grab time.
    offset: Vec2,
}

impl DebugTools {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            held: None,
        }
    }

    pub(crate) fn enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn held(&self) -> Option<ThingId> {
        self.held.map(|grab| grab.thing)
    }

    /// Room-local debug input. Expects the room pointer to be current.
    pub(crate) fn update(&mut self, input: &InputSnapshot, room: &mut Room) {
        if input.debug_toggle_pressed() {
            self.enabled = !self.enabled;
            self.held = None;
            info!(enabled = self.enabled, "debug_mode_toggled");
        }
        room.set_debug(self.enabled);
        if !self.enabled {
            return;
        }

        let pointer = room.pointer();
        if input.secondary_pressed() {
            self.held = room.get_thing_under_cursor().and_then(|thing| {
                let position = room.thing(thing)?.position();
                Some(Grab {
                    thing,
                    offset: Vec2::new(pointer.x - position.x, pointer.y - position.y),
                })
            });
        }
        if input.secondary_released() {
            if let Some(grab) = self.held.take() {
                if let Some(thing) = room.thing(grab.thing) {
                    let position = thing.position();
                    debug!(
                        thing = grab.thing.raw(),
                        x = position.x,
                        y = position.y,
                        "debug_thing_dropped"
                    );
                }
            }
        }

        let Some(grab) = self.held else {
            return;
        };
        let Some(thing) = room.thing_mut(grab.thing) else {
            self.held = None;
            return;
        };
        thing.kind_mut().placed_mut().set_position(Vec2::new(
            pointer.x - grab.offset.x,
            pointer.y - grab.offset.y,
        ));
        let wheel = input.wheel_delta();
        if wheel != Vec2::default() {
            if let Some(resizable) = thing.kind_mut().as_debug_resizable_mut() {
                resizable.debug_resize(wheel.x, wheel.y);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use engine::MemoryAssetLoader;
    use serde_json::{json, Value};

    use super::*;
    use crate::app::world::registry::{LoadContext, Registry};
    use crate::app::world::thing::{RoomId, ThingIdAllocator};

    fn room() -> Room {
        room_with(json!([{"@type": "Cauldron", "x": 1000, "y": 500, "width": 100, "height": 100}]))
    }

    fn room_with(things: Value) -> Room {
        let record: Value = json!({
            "@type": "Room",
            "name": "greenhouse",
            "width": 2000,
            "height": 720,
            "vanishingPoint": {"x": 1000, "y": 300},
            "floorHeight": 600,
            "things": things,
        });
        let registry = Registry::with_builtin().expect("registry");
        let mut assets = MemoryAssetLoader::new();
        let mut ids = ThingIdAllocator::default();
        let mut ctx = LoadContext {
            assets: &mut assets,
            ids: &mut ids,
            registry: &registry,
            room: Some(RoomId(0)),
        };
        registry.deserialize_room(record, &mut ctx).expect("room")
    }

    fn point_at(room: &mut Room, x: f32, y: f32) {
        room.tick(0.0, Vec2::new(x, y)).expect("tick");
    }

    #[test]
    fn disabled_tools_ignore_secondary_clicks() {
        let mut room = room();
        let mut tools = DebugTools::new(false);
        point_at(&mut room, 1000.0, 500.0);
        tools.update(&InputSnapshot::empty().with_secondary(true, false), &mut room);
        assert!(tools.held().is_none());
    }

    #[test]
    fn toggle_flips_mode() {
        let mut room = room();
        let mut tools = DebugTools::new(false);
        tools.update(
            &InputSnapshot::empty().with_debug_toggle_pressed(true),
            &mut room,
        );
        assert!(tools.enabled());
    }

    #[test]
    fn grab_drags_until_release() {
        let mut room = room();
        let id = room.things()[0].id();
        let mut tools = DebugTools::new(true);

        point_at(&mut room, 1010.0, 490.0);
        tools.update(&InputSnapshot::empty().with_secondary(true, false), &mut room);
        assert_eq!(tools.held(), Some(id));

        point_at(&mut room, 1210.0, 390.0);
        tools.update(&InputSnapshot::empty(), &mut room);
        assert_eq!(room.thing(id).expect("cauldron").position(), Vec2::new(1200.0, 400.0));

        tools.update(&InputSnapshot::empty().with_secondary(false, true), &mut room);
        assert!(tools.held().is_none());
        point_at(&mut room, 100.0, 100.0);
        tools.update(&InputSnapshot::empty(), &mut room);
        assert_eq!(room.thing(id).expect("cauldron").position(), Vec2::new(1200.0, 400.0));
    }

    #[test]
    fn wheel_resizes_the_held_thing() {
        let mut room = room();
        let id = room.things()[0].id();
        let mut tools = DebugTools::new(true);
        let geometry = *room.geometry();

        point_at(&mut room, 1000.0, 500.0);
        tools.update(&InputSnapshot::empty().with_secondary(true, false), &mut room);
        let hit = |room: &Room| {
            room.thing(id)
                .and_then(|thing| thing.kind().as_hittable())
                .expect("hittable")
                .is_under_pointer(1080.0, 500.0, &geometry)
        };
        assert!(!hit(&room));

        tools.update(&InputSnapshot::empty().with_wheel_delta(5000.0, 0.0), &mut room);
        assert!(hit(&room));
    }

    #[test]
    fn plants_are_only_found_in_debug_mode() {
        let mut room = room_with(json!([{"@type": "Plants", "x": 400, "y": 300}]));
        let id = room.things()[0].id();
        point_at(&mut room, 400.0, 300.0);
        assert!(room.get_thing_under_cursor().is_none());

        let mut tools = DebugTools::new(true);
        tools.update(&InputSnapshot::empty().with_secondary(true, false), &mut room);
        assert_eq!(tools.held(), Some(id));
    }
}
