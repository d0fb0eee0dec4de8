use engine::{Color, DrawContext, ImageHandle, Vec2};
use serde::{Deserialize, Serialize};

use super::corner_box_contains;
use crate::app::hud::TextBoxOwner;
use crate::app::world::registry::{LoadContext, Persisted, Registry, RegistryError};
use crate::app::world::thing::{
    ClickContext, Clickable, DebugResizable, DomBacked, DrawView, Drawable, Placed,
    PointerHittable, RoomGeometry, ThingCommand, ThingId,
};

/// Line shown when the current level has nothing for this NPC.
const SILENT_LINE: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub(crate) enum NpcType {
    Cat,
    Ghost,
}

impl NpcType {
    pub(crate) fn display_name(self) -> &'static str {
        match self {
            Self::Cat => "Cat",
            Self::Ghost => "Ghost",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NpcRecord {
    pub(crate) x: f32,
    pub(crate) y: f32,
    #[serde(default)]
    pub(crate) z: f32,
    pub(crate) width: f32,
    pub(crate) height: f32,
    pub(crate) npc_type: NpcType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) image: Option<String>,
}

#[derive(Debug)]
pub(crate) struct Npc {
    record: NpcRecord,
    image: Option<ImageHandle>,
}

impl Npc {
    pub(crate) fn npc_type(&self) -> NpcType {
        self.record.npc_type
    }
}

impl PointerHittable for Npc {
    fn is_under_pointer(&self, x: f32, y: f32, _geometry: &RoomGeometry) -> bool {
        let n = &self.record;
        corner_box_contains(n.x, n.y, n.width, n.height, x, y)
    }
}

impl Clickable for Npc {
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
        let speaker = self.record.npc_type;
        let text = ctx.progress.get_dialog(speaker).unwrap_or(SILENT_LINE);
        out.push(ThingCommand::ShowTextBox {
            speaker,
            text: text.to_string(),
            owner: TextBoxOwner::Thing(ctx.this),
        });
        out.push(ThingCommand::StopSpeech);
        out.push(ThingCommand::StartSpeech(speaker));
        true
    }
}

impl DomBacked for Npc {
    fn stop_drawing_dom(&mut self, this: ThingId, out: &mut Vec<ThingCommand>) {
        out.push(ThingCommand::HideTextBox(TextBoxOwner::Thing(this)));
        out.push(ThingCommand::StopSpeech);
    }
}

impl Drawable for Npc {
    fn draw(&self, ctx: &mut dyn DrawContext, _view: &DrawView<'_>) {
        let n = &self.record;
        match &self.image {
            Some(image) => ctx.draw_image(image, n.x, n.y, n.width, n.height),
            None => ctx.fill_rect(n.x, n.y, n.width, n.height, Color::PURPLE),
        }
    }
}

impl DebugResizable for Npc {
    fn debug_resize(&mut self, dx: f32, dy: f32) {
        self.record.width = (self.record.width + dx / 50.0).max(1.0);
        self.record.height = (self.record.height - dy / 50.0).max(1.0);
    }
}

impl Placed for Npc {
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

impl Persisted for Npc {
    const TAG: &'static str = "Npc";
    type Record = NpcRecord;

    fn from_record(record: NpcRecord, ctx: &mut LoadContext<'_>) -> Result<Self, RegistryError> {
        let image = record
            .image
            .as_deref()
            .map(|url| ctx.assets.load_image(url))
            .transpose()
            .map_err(LoadContext::asset_error(Self::TAG))?;
        Ok(Self { record, image })
    }

    fn to_record(&self, _registry: &Registry) -> Result<NpcRecord, RegistryError> {
        Ok(self.record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::world::entities::fixtures::{click_ctx, geometry};
    use crate::app::world::progress::{LevelRecord, Progress};

    fn npc(npc_type: NpcType) -> Npc {
        Npc {
            record: NpcRecord {
                x: 100.0,
                y: 100.0,
                z: 0.0,
                width: 100.0,
                height: 100.0,
                npc_type,
                image: None,
            },
            image: None,
        }
    }

    #[test]
    fn click_shows_current_dialog_and_restarts_speech() {
        let mut cat = npc(NpcType::Cat);
        let geometry = geometry();
        let progress = Progress::standard();
        let ctx = click_ctx(&geometry, None, &progress);
        let mut out = Vec::new();

        assert!(cat.do_click(150.0, 150.0, &ctx, &mut out));
        match out.as_slice() {
            [ThingCommand::ShowTextBox { speaker, text, owner }, ThingCommand::StopSpeech, ThingCommand::StartSpeech(NpcType::Cat)] =>
            {
                assert_eq!(*speaker, NpcType::Cat);
                assert_eq!(Some(text.as_str()), progress.get_dialog(NpcType::Cat));
                assert_eq!(*owner, TextBoxOwner::Thing(ctx.this));
            }
            other => panic!("unexpected commands {other:?}"),
        }
    }

    #[test]
    fn unmapped_npc_says_ellipsis() {
        let mut ghost = npc(NpcType::Ghost);
        let geometry = geometry();
        let progress = Progress::new(vec![LevelRecord {
            name: "quiet".to_string(),
            dialog: Default::default(),
            unlocked_rooms: Vec::new(),
        }])
        .expect("progress");
        let mut out = Vec::new();

        ghost.do_click(150.0, 150.0, &click_ctx(&geometry, None, &progress), &mut out);
        assert!(matches!(&out[0], ThingCommand::ShowTextBox { text, .. } if text == "..."));
    }

    #[test]
    fn stopping_dom_hides_own_text_box_and_speech() {
        let mut cat = npc(NpcType::Cat);
        let id = crate::app::world::entities::fixtures::thing_id();
        let mut out = Vec::new();
        cat.stop_drawing_dom(id, &mut out);
        assert!(matches!(
            out.as_slice(),
            [ThingCommand::HideTextBox(TextBoxOwner::Thing(owner)), ThingCommand::StopSpeech] if *owner == id
        ));
    }
}
