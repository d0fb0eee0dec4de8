use engine::{Color, DrawContext, Vec2};
use serde::{Deserialize, Serialize};

use super::centred_box_contains;
use crate::app::world::registry::{LoadContext, Persisted, Registry, RegistryError};
use crate::app::world::thing::{
    ClickContext, Clickable, DebugResizable, DrawView, Drawable, Placed, PointerHittable,
    RoomGeometry, ThingCommand,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FlagSwitcherRecord {
    pub(crate) x: f32,
    pub(crate) y: f32,
    #[serde(default)]
    pub(crate) z: f32,
    pub(crate) width: f32,
    pub(crate) height: f32,
    #[serde(default)]
    pub(crate) flags_to_toggle: Vec<String>,
    #[serde(default)]
    pub(crate) flags_to_enable: Vec<String>,
    #[serde(default)]
    pub(crate) flags_to_disable: Vec<String>,
}

/// An invisible hotspot that flips game flags when clicked within reach.
#[derive(Debug)]
pub(crate) struct FlagSwitcher {
    record: FlagSwitcherRecord,
}

impl PointerHittable for FlagSwitcher {
    fn is_under_pointer(&self, x: f32, y: f32, _geometry: &RoomGeometry) -> bool {
        let FlagSwitcherRecord {
            x: cx,
            y: cy,
            width,
            height,
            ..
        } = self.record;
        centred_box_contains(cx, cy, width, height, x, y)
    }
}

impl Clickable for FlagSwitcher {
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
        out.push(ThingCommand::SwitchFlags {
            toggle: self.record.flags_to_toggle.clone(),
            enable: self.record.flags_to_enable.clone(),
            disable: self.record.flags_to_disable.clone(),
        });
        out.push(ThingCommand::Save);
        true
    }
}

impl Drawable for FlagSwitcher {
    fn draw(&self, ctx: &mut dyn DrawContext, view: &DrawView<'_>) {
        if !view.debug {
            return;
        }
        let FlagSwitcherRecord {
            x, y, width, height, ..
        } = self.record;
        ctx.fill_rect(
            x - width / 2.0,
            y - height / 2.0,
            width,
            height,
            Color::DARK_RED.with_alpha(160),
        );
    }
}

impl DebugResizable for FlagSwitcher {
    fn debug_resize(&mut self, dx: f32, dy: f32) {
        self.record.width = (self.record.width + dx / 100.0).max(1.0);
        self.record.height = (self.record.height + dy / 50.0).max(1.0);
    }
}

impl Placed for FlagSwitcher {
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

impl Persisted for FlagSwitcher {
    const TAG: &'static str = "FlagSwitcher";
    type Record = FlagSwitcherRecord;

    fn from_record(
        record: FlagSwitcherRecord,
        _ctx: &mut LoadContext<'_>,
    ) -> Result<Self, RegistryError> {
        Ok(Self { record })
    }

    fn to_record(&self, _registry: &Registry) -> Result<FlagSwitcherRecord, RegistryError> {
        Ok(self.record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::world::entities::fixtures::{click_ctx, geometry, player_at};
    use crate::app::world::progress::Progress;
    use serde_json::json;

    fn switcher() -> FlagSwitcher {
        let record = serde_json::from_value(json!({
            "x": 400, "y": 300, "width": 100, "height": 60,
            "flagsToToggle": ["plants-asleep"],
            "flagsToEnable": ["lamp-lit"],
        }))
        .expect("record");
        FlagSwitcher { record }
    }

    #[test]
    fn click_within_reach_switches_flags_and_saves() {
        let mut switcher = switcher();
        let geometry = geometry();
        let progress = Progress::standard();
        let player = player_at(500.0, &[]);
        let ctx = click_ctx(&geometry, Some(&player), &progress);
        let mut out = Vec::new();

        assert!(switcher.do_click(420.0, 310.0, &ctx, &mut out));
        match out.as_slice() {
            [ThingCommand::SwitchFlags {
                toggle,
                enable,
                disable,
            }, ThingCommand::Save] => {
                assert_eq!(toggle, &["plants-asleep".to_string()]);
                assert_eq!(enable, &["lamp-lit".to_string()]);
                assert!(disable.is_empty());
            }
            other => panic!("unexpected commands {other:?}"),
        }
    }

    #[test]
    fn out_of_reach_or_outside_box_is_ignored() {
        let mut switcher = switcher();
        let geometry = geometry();
        let progress = Progress::standard();
        let far = player_at(1500.0, &[]);
        let near = player_at(500.0, &[]);
        let mut out = Vec::new();
        assert!(!switcher.do_click(420.0, 310.0, &click_ctx(&geometry, Some(&far), &progress), &mut out));
        assert!(!switcher.do_click(460.0, 310.0, &click_ctx(&geometry, Some(&near), &progress), &mut out));
        assert!(out.is_empty());
    }

    #[test]
    fn record_keeps_empty_lists() {
        let switcher = switcher();
        let value = serde_json::to_value(switcher.to_record(&Registry::new()).expect("record"))
            .expect("encode");
        assert_eq!(value["flagsToDisable"], json!([]));
        assert_eq!(value["flagsToToggle"], json!(["plants-asleep"]));
    }
}
