//! Screen-space widgets drawn over the active room.

use std::collections::HashMap;

use engine::{measure_text, Affine2, Color, DrawContext, ImageHandle, Vec2};
use thiserror::Error;
use tracing::debug;

use super::world::{ItemRef, NpcType, RoomId, ThingId};

const SLOT_SIZE: f32 = 64.0;
const SLOT_GAP: f32 = 8.0;
const HOTBAR_MARGIN: f32 = 16.0;
const TEXT_SIZE: f32 = 18.0;
const TEXT_BOX_HEIGHT: f32 = 140.0;
const TEXT_BOX_MARGIN: f32 = 40.0;
const TEXT_BOX_PADDING: f32 = 16.0;
const REVEAL_CHARS_PER_SECOND: f32 = 40.0;
const TEXT_HOLD_SECONDS: f32 = 1.5;
const TEXT_HOLD_PER_CHAR: f32 = 0.03;
const ITEM_WINDOW_WIDTH: f32 = 280.0;
const ITEM_WINDOW_HEIGHT: f32 = 190.0;
const TAKE_BUTTON_WIDTH: f32 = 100.0;
const TAKE_BUTTON_HEIGHT: f32 = 28.0;
const TOAST_FADE_SECONDS: f32 = 0.4;
const TOAST_RISE: f32 = 15.0;
const TOAST_SIZE: f32 = 20.0;

pub(crate) type ItemIcons = HashMap<ItemRef, ImageHandle>;

#[derive(Debug, Error)]
pub(crate) enum HudError {
    #[error("hotbar is full ({capacity} slots)")]
    HotbarFull { capacity: usize },
    #[error("{0} is not in the hotbar")]
    NotInHotbar(ItemRef),
}

/// Who opened the text box, so the right party hears when it closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TextBoxOwner {
    Room(RoomId),
    Thing(ThingId),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum HudClick {
    Ignored,
    Consumed,
    Take {
        item: ItemRef,
        unlocks: Option<String>,
    },
    Activate(ItemRef),
    TextBoxDone(TextBoxOwner),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rect {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl Rect {
    fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// Room camera and footprint, used to place room-anchored widgets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Overlay {
    pub(crate) transform: Affine2,
    pub(crate) footprint: Vec2,
}

impl Default for Overlay {
    fn default() -> Self {
        Self {
            transform: Affine2::IDENTITY,
            footprint: Vec2::default(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Hotbar {
    capacity: usize,
    items: Vec<ItemRef>,
}

impl Hotbar {
    pub(crate) fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    pub(crate) fn items(&self) -> &[ItemRef] {
        &self.items
    }

    pub(crate) fn add_item(&mut self, item: ItemRef) -> Result<(), HudError> {
        if self.items.len() >= self.capacity {
            return Err(HudError::HotbarFull {
                capacity: self.capacity,
            });
        }
        self.items.push(item);
        Ok(())
    }

    pub(crate) fn remove_item(&mut self, item: ItemRef) -> Result<(), HudError> {
        let index = self
            .items
            .iter()
            .position(|held| *held == item)
            .ok_or(HudError::NotInHotbar(item))?;
        self.items.remove(index);
        Ok(())
    }

    fn slot_rect(&self, index: usize, viewport: (u32, u32)) -> Rect {
        let count = self.capacity as f32;
        let total = count * SLOT_SIZE + (count - 1.0).max(0.0) * SLOT_GAP;
        let left = (viewport.0 as f32 - total) / 2.0;
        Rect {
            x: left + index as f32 * (SLOT_SIZE + SLOT_GAP),
            y: viewport.1 as f32 - SLOT_SIZE - HOTBAR_MARGIN,
            width: SLOT_SIZE,
            height: SLOT_SIZE,
        }
    }

    fn slot_at(&self, point: Vec2, viewport: (u32, u32)) -> Option<usize> {
        (0..self.capacity).find(|index| self.slot_rect(*index, viewport).contains(point))
    }

    fn draw(&self, ctx: &mut dyn DrawContext, icons: &ItemIcons, viewport: (u32, u32)) {
        for index in 0..self.capacity {
            let slot = self.slot_rect(index, viewport);
            ctx.fill_rect(slot.x, slot.y, slot.width, slot.height, Color::SLOT.with_alpha(220));
            let Some(item) = self.items.get(index) else {
                continue;
            };
            match icons.get(item) {
                Some(icon) => ctx.draw_image(icon, slot.x + 4.0, slot.y + 4.0, 56.0, 56.0),
                None => {
                    let initials: String = item
                        .name()
                        .split_whitespace()
                        .filter_map(|word| word.chars().next())
                        .take(2)
                        .collect();
                    ctx.fill_text(&initials, slot.x + 8.0, slot.y + 40.0, 24.0, Color::PAPER);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct OpenItemWindow {
    item: ItemRef,
    anchor: Vec2,
    unlocks: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct ItemWindow {
    open: Option<OpenItemWindow>,
}

impl ItemWindow {
    pub(crate) fn item(&self) -> Option<ItemRef> {
        self.open.as_ref().map(|open| open.item)
    }

    fn panel(&self, overlay: &Overlay) -> Option<Rect> {
        let open = self.open.as_ref()?;
        let anchor = overlay.transform.apply(open.anchor);
        Some(Rect {
            x: anchor.x - ITEM_WINDOW_WIDTH / 2.0,
            y: anchor.y - ITEM_WINDOW_HEIGHT - 10.0,
            width: ITEM_WINDOW_WIDTH,
            height: ITEM_WINDOW_HEIGHT,
        })
    }

    fn take_button(panel: Rect) -> Rect {
        Rect {
            x: panel.x + (panel.width - TAKE_BUTTON_WIDTH) / 2.0,
            y: panel.y + panel.height - TAKE_BUTTON_HEIGHT - 10.0,
            width: TAKE_BUTTON_WIDTH,
            height: TAKE_BUTTON_HEIGHT,
        }
    }

    fn draw(&self, ctx: &mut dyn DrawContext, overlay: &Overlay, icons: &ItemIcons) {
        let (Some(open), Some(panel)) = (self.open.as_ref(), self.panel(overlay)) else {
            return;
        };
        ctx.fill_rect(panel.x, panel.y, panel.width, panel.height, Color::PAPER);
        if let Some(icon) = icons.get(&open.item) {
            ctx.draw_image(icon, panel.x + 10.0, panel.y + 10.0, 48.0, 48.0);
        }
        ctx.fill_text(open.item.name(), panel.x + 68.0, panel.y + 34.0, TEXT_SIZE, Color::INK);
        let traits = open.item.traits().join(", ");
        if !traits.is_empty() {
            ctx.fill_text(&traits, panel.x + 68.0, panel.y + 56.0, 12.0, Color::PURPLE);
        }
        let mut line_y = panel.y + 84.0;
        for line in wrap_text(open.item.description(), panel.width - 20.0, 12.0)
            .into_iter()
            .take(3)
        {
            ctx.fill_text(&line, panel.x + 10.0, line_y, 12.0, Color::INK);
            line_y += 16.0;
        }
        let button = Self::take_button(panel);
        ctx.fill_rect(button.x, button.y, button.width, button.height, Color::INK);
        ctx.fill_text("TAKE", button.x + 24.0, button.y + 22.0, TEXT_SIZE, Color::GOLD);
    }
}

#[derive(Debug, Clone, PartialEq)]
struct OpenTextBox {
    speaker: NpcType,
    text: String,
    owner: TextBoxOwner,
    revealed: f32,
    hold: f32,
}

impl OpenTextBox {
    fn total_chars(&self) -> usize {
        self.text.chars().count()
    }

    fn fully_revealed(&self) -> bool {
        self.revealed >= self.total_chars() as f32
    }
}

/// RPG-style dialog box that types its text out, then closes on its own.
#[derive(Debug, Default)]
pub(crate) struct TextBox {
    open: Option<OpenTextBox>,
}

impl TextBox {
    pub(crate) fn owner(&self) -> Option<TextBoxOwner> {
        self.open.as_ref().map(|open| open.owner)
    }

    pub(crate) fn text(&self) -> Option<&str> {
        self.open.as_ref().map(|open| open.text.as_str())
    }

    fn show(&mut self, speaker: NpcType, text: String, owner: TextBoxOwner) {
        let hold = TEXT_HOLD_SECONDS + TEXT_HOLD_PER_CHAR * text.chars().count() as f32;
        self.open = Some(OpenTextBox {
            speaker,
            text,
            owner,
            revealed: 0.0,
            hold,
        });
    }

    fn tick(&mut self, dt: f32) -> Option<TextBoxOwner> {
        let open = self.open.as_mut()?;
        if !open.fully_revealed() {
            open.revealed += dt * REVEAL_CHARS_PER_SECOND;
            return None;
        }
        open.hold -= dt;
        if open.hold > 0.0 {
            return None;
        }
        self.open.take().map(|open| open.owner)
    }

    /// First click reveals everything, the next one dismisses.
    fn click(&mut self) -> Option<TextBoxOwner> {
        let open = self.open.as_mut()?;
        if !open.fully_revealed() {
            open.revealed = open.total_chars() as f32;
            return None;
        }
        self.open.take().map(|open| open.owner)
    }

    fn rect(viewport: (u32, u32)) -> Rect {
        let width = viewport.0 as f32 - TEXT_BOX_MARGIN * 2.0;
        Rect {
            x: TEXT_BOX_MARGIN,
            y: viewport.1 as f32 - SLOT_SIZE - HOTBAR_MARGIN * 2.0 - TEXT_BOX_HEIGHT,
            width,
            height: TEXT_BOX_HEIGHT,
        }
    }

    fn draw(&self, ctx: &mut dyn DrawContext, viewport: (u32, u32)) {
        let Some(open) = self.open.as_ref() else {
            return;
        };
        let rect = Self::rect(viewport);
        ctx.fill_rect(rect.x, rect.y, rect.width, rect.height, Color::INK.with_alpha(230));
        ctx.fill_text(
            open.speaker.display_name(),
            rect.x + TEXT_BOX_PADDING,
            rect.y + TEXT_BOX_PADDING + TEXT_SIZE,
            TEXT_SIZE,
            Color::GOLD,
        );
        let shown: String = open.text.chars().take(open.revealed as usize).collect();
        let mut line_y = rect.y + TEXT_BOX_PADDING + TEXT_SIZE * 2.0 + 8.0;
        for line in wrap_text(&shown, rect.width - TEXT_BOX_PADDING * 2.0, TEXT_SIZE) {
            ctx.fill_text(&line, rect.x + TEXT_BOX_PADDING, line_y, TEXT_SIZE, Color::PAPER);
            line_y += TEXT_SIZE + 6.0;
        }
    }
}

/// Transient message near the pointer. A new toast replaces the current one.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Toast {
    message: String,
    at: Vec2,
    remaining: f32,
    fade: f32,
}

impl Toast {
    fn new(message: String, at: Vec2, seconds: f32) -> Self {
        Self {
            message,
            at,
            remaining: seconds,
            fade: TOAST_FADE_SECONDS,
        }
    }

    fn is_done(&self) -> bool {
        self.remaining < 0.0
    }

    fn tick(&mut self, dt: f32) {
        self.fade -= dt;
        self.remaining -= dt;
    }

    fn draw(&self, ctx: &mut dyn DrawContext) {
        let shown = 1.0 - (self.fade / TOAST_FADE_SECONDS).max(0.0);
        ctx.save();
        ctx.set_alpha(shown);
        ctx.fill_text(
            &self.message,
            self.at.x + 1.0,
            self.at.y - shown * TOAST_RISE + 1.0,
            TOAST_SIZE,
            Color::BLACK,
        );
        ctx.fill_text(
            &self.message,
            self.at.x,
            self.at.y - shown * TOAST_RISE,
            TOAST_SIZE,
            Color::GOLD,
        );
        ctx.restore();
    }
}

#[derive(Debug)]
pub(crate) struct Hud {
    hotbar: Hotbar,
    item_window: ItemWindow,
    text_box: TextBox,
    toast: Option<Toast>,
    overlay: Overlay,
    icons: ItemIcons,
    viewport: (u32, u32),
    toast_seconds: f32,
}

impl Hud {
    pub(crate) fn new(capacity: usize, icons: ItemIcons, toast_seconds: f32) -> Self {
        Self {
            hotbar: Hotbar {
                capacity,
                items: Vec::new(),
            },
            item_window: ItemWindow::default(),
            text_box: TextBox::default(),
            toast: None,
            overlay: Overlay::default(),
            icons,
            viewport: (0, 0),
            toast_seconds,
        }
    }

    pub(crate) fn hotbar(&self) -> &Hotbar {
        &self.hotbar
    }

    pub(crate) fn hotbar_mut(&mut self) -> &mut Hotbar {
        &mut self.hotbar
    }

    pub(crate) fn item_window(&self) -> &ItemWindow {
        &self.item_window
    }

    pub(crate) fn text_box(&self) -> &TextBox {
        &self.text_box
    }

    pub(crate) fn toast_message(&self) -> Option<&str> {
        self.toast.as_ref().map(|toast| toast.message.as_str())
    }

    pub(crate) fn set_viewport(&mut self, viewport: (u32, u32)) {
        self.viewport = viewport;
    }

    pub(crate) fn set_overlay(&mut self, overlay: Overlay) {
        self.overlay = overlay;
    }

    pub(crate) fn show_item_window(&mut self, item: ItemRef, anchor: Vec2, unlocks: Option<String>) {
        self.item_window.open = Some(OpenItemWindow {
            item,
            anchor,
            unlocks,
        });
    }

    pub(crate) fn hide_item_window(&mut self) {
        self.item_window.open = None;
    }

    pub(crate) fn show_text_box(&mut self, speaker: NpcType, text: String, owner: TextBoxOwner) {
        self.text_box.show(speaker, text, owner);
    }

    /// Hides the text box only if `owner` opened it.
    pub(crate) fn hide_text_box(&mut self, owner: TextBoxOwner) -> bool {
        if self.text_box.owner() != Some(owner) {
            return false;
        }
        self.text_box.open = None;
        true
    }

    pub(crate) fn toast(&mut self, message: &str, at: Vec2) {
        debug!(message, "toast");
        self.toast = Some(Toast::new(message.to_string(), at, self.toast_seconds));
    }

    /// Advances widget timers; reports a text box that closed on its own.
    pub(crate) fn tick(&mut self, dt: f32) -> Option<TextBoxOwner> {
        if let Some(toast) = self.toast.as_mut() {
            toast.tick(dt);
            if toast.is_done() {
                self.toast = None;
            }
        }
        self.text_box.tick(dt)
    }

    /// Routes a screen-space click; anything but `Ignored` means the room must not see it.
    pub(crate) fn click(&mut self, point: Vec2) -> HudClick {
        if self.text_box.open.is_some() && TextBox::rect(self.viewport).contains(point) {
            return match self.text_box.click() {
                Some(owner) => HudClick::TextBoxDone(owner),
                None => HudClick::Consumed,
            };
        }
        if let Some(panel) = self.item_window.panel(&self.overlay) {
            if ItemWindow::take_button(panel).contains(point) {
                if let Some(open) = self.item_window.open.take() {
                    return HudClick::Take {
                        item: open.item,
                        unlocks: open.unlocks,
                    };
                }
            }
            if panel.contains(point) {
                return HudClick::Consumed;
            }
        }
        if let Some(slot) = self.hotbar.slot_at(point, self.viewport) {
            return match self.hotbar.items.get(slot) {
                Some(item) => HudClick::Activate(*item),
                None => HudClick::Consumed,
            };
        }
        HudClick::Ignored
    }

    #[cfg(test)]
    pub(crate) fn slot_centre(&self, index: usize) -> Vec2 {
        let slot = self.hotbar.slot_rect(index, self.viewport);
        Vec2::new(slot.x + slot.width / 2.0, slot.y + slot.height / 2.0)
    }

    #[cfg(test)]
    pub(crate) fn take_button_centre(&self) -> Option<Vec2> {
        let button = ItemWindow::take_button(self.item_window.panel(&self.overlay)?);
        Some(Vec2::new(
            button.x + button.width / 2.0,
            button.y + button.height / 2.0,
        ))
    }

    pub(crate) fn draw(&self, ctx: &mut dyn DrawContext) {
        let viewport = ctx.size();
        self.item_window.draw(ctx, &self.overlay, &self.icons);
        self.text_box.draw(ctx, viewport);
        self.hotbar.draw(ctx, &self.icons, viewport);
        if let Some(toast) = self.toast.as_ref() {
            toast.draw(ctx);
        }
    }
}

/// Greedy word wrap against the bitmap font metrics.
fn wrap_text(text: &str, max_width: f32, size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if !current.is_empty() && measure_text(&candidate, size) > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::world::{MaterialType, PuzzleObjectType};
    use engine::RecordingCanvas;

    const VIEWPORT: (u32, u32) = (1280, 720);

    fn hud() -> Hud {
        let mut hud = Hud::new(5, ItemIcons::new(), 2.0);
        hud.set_viewport(VIEWPORT);
        hud
    }

    fn owner() -> TextBoxOwner {
        TextBoxOwner::Room(RoomId(0))
    }

    #[test]
    fn hotbar_rejects_overflow_and_missing_items() {
        let mut hotbar = Hotbar::default();
        hotbar.set_capacity(1);
        hotbar
            .add_item(ItemRef::Material(MaterialType::Coin))
            .expect("first item");
        assert!(matches!(
            hotbar.add_item(ItemRef::Material(MaterialType::Feather)),
            Err(HudError::HotbarFull { capacity: 1 })
        ));
        assert!(matches!(
            hotbar.remove_item(ItemRef::Material(MaterialType::Feather)),
            Err(HudError::NotInHotbar(_))
        ));
    }

    #[test]
    fn clicking_a_filled_slot_activates_its_item() {
        let mut hud = hud();
        let key = ItemRef::PuzzleObject(PuzzleObjectType::Key);
        hud.hotbar_mut().add_item(key).expect("add key");
        let slot = hud.hotbar().slot_rect(0, VIEWPORT);

        assert_eq!(
            hud.click(Vec2::new(slot.x + 5.0, slot.y + 5.0)),
            HudClick::Activate(key)
        );
        let empty = hud.hotbar().slot_rect(3, VIEWPORT);
        assert_eq!(hud.click(Vec2::new(empty.x + 5.0, empty.y + 5.0)), HudClick::Consumed);
        assert_eq!(hud.click(Vec2::new(5.0, 5.0)), HudClick::Ignored);
    }

    #[test]
    fn take_button_closes_window_and_reports_item() {
        let mut hud = hud();
        let coin = ItemRef::Material(MaterialType::Coin);
        hud.show_item_window(coin, Vec2::new(640.0, 500.0), Some("start".to_string()));
        let panel = hud.item_window.panel(&hud.overlay).expect("window open");
        let button = ItemWindow::take_button(panel);

        let click = hud.click(Vec2::new(button.x + 1.0, button.y + 1.0));
        assert_eq!(
            click,
            HudClick::Take {
                item: coin,
                unlocks: Some("start".to_string())
            }
        );
        assert!(hud.item_window().item().is_none());
    }

    #[test]
    fn text_box_reveals_then_closes_itself() {
        let mut hud = hud();
        hud.show_text_box(NpcType::Cat, "meow".to_string(), owner());
        assert_eq!(hud.tick(0.2), None);
        assert_eq!(hud.tick(1.0), None);
        assert_eq!(hud.tick(2.0), Some(owner()));
        assert!(hud.text_box().owner().is_none());
    }

    #[test]
    fn text_box_click_reveals_before_dismissing() {
        let mut hud = hud();
        hud.show_text_box(NpcType::Ghost, "boo ".repeat(20), owner());
        let rect = TextBox::rect(VIEWPORT);
        let inside = Vec2::new(rect.x + 10.0, rect.y + 10.0);

        assert_eq!(hud.click(inside), HudClick::Consumed);
        assert_eq!(hud.click(inside), HudClick::TextBoxDone(owner()));
    }

    #[test]
    fn hide_text_box_respects_owner() {
        let mut hud = hud();
        hud.show_text_box(NpcType::Cat, "hi".to_string(), owner());
        assert!(!hud.hide_text_box(TextBoxOwner::Room(RoomId(7))));
        assert!(hud.hide_text_box(owner()));
    }

    #[test]
    fn new_toast_replaces_old_and_expires() {
        let mut hud = hud();
        hud.toast("first", Vec2::new(10.0, 10.0));
        hud.toast("second", Vec2::new(10.0, 10.0));
        assert_eq!(hud.toast_message(), Some("second"));
        hud.tick(2.1);
        assert_eq!(hud.toast_message(), None);
    }

    #[test]
    fn draw_renders_hotbar_slots() {
        let hud = hud();
        let mut canvas = RecordingCanvas::new(VIEWPORT.0, VIEWPORT.1);
        hud.draw(&mut canvas);
        assert_eq!(canvas.commands().len(), 5);
    }

    #[test]
    fn wrap_breaks_on_word_boundaries() {
        let lines = wrap_text("aaa bbb ccc", measure_text("aaa bbb", 12.0), 12.0);
        assert_eq!(lines, vec!["aaa bbb".to_string(), "ccc".to_string()]);
    }
}
