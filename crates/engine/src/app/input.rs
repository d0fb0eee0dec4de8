use super::Vec2;

/// Normalized pointer: viewport pixels plus whether the primary button or a
/// touch is currently held.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pointer {
    pub x: f32,
    pub y: f32,
    pub active: bool,
}

/// What the host should show as the mouse cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CursorHint {
    #[default]
    Default,
    Pointer,
    Grab,
}

/// Turns the level-triggered `Pointer::active` into one event per press.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerEdge {
    was_active: bool,
}

impl PointerEdge {
    /// Returns true only on the frame the pointer goes from released to held.
    pub fn rising(&mut self, pointer: Pointer) -> bool {
        let rising = pointer.active && !self.was_active;
        self.was_active = pointer.active;
        rising
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    pointer: Pointer,
    debug_toggle_pressed: bool,
    secondary_pressed: bool,
    secondary_released: bool,
    wheel_delta: Vec2,
    viewport: (u32, u32),
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        pointer: Pointer,
        debug_toggle_pressed: bool,
        secondary_pressed: bool,
        secondary_released: bool,
        wheel_delta: Vec2,
        viewport: (u32, u32),
    ) -> Self {
        Self {
            pointer,
            debug_toggle_pressed,
            secondary_pressed,
            secondary_released,
            wheel_delta,
            viewport,
        }
    }

    pub fn pointer(&self) -> Pointer {
        self.pointer
    }

    pub fn debug_toggle_pressed(&self) -> bool {
        self.debug_toggle_pressed
    }

    pub fn secondary_pressed(&self) -> bool {
        self.secondary_pressed
    }

    pub fn secondary_released(&self) -> bool {
        self.secondary_released
    }

    pub fn wheel_delta(&self) -> Vec2 {
        self.wheel_delta
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn with_pointer(mut self, x: f32, y: f32, active: bool) -> Self {
        self.pointer = Pointer { x, y, active };
        self
    }

    pub fn with_debug_toggle_pressed(mut self, pressed: bool) -> Self {
        self.debug_toggle_pressed = pressed;
        self
    }

    pub fn with_secondary(mut self, pressed: bool, released: bool) -> Self {
        self.secondary_pressed = pressed;
        self.secondary_released = released;
        self
    }

    pub fn with_wheel_delta(mut self, dx: f32, dy: f32) -> Self {
        self.wheel_delta = Vec2::new(dx, dy);
        self
    }

    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = (width, height);
        self
    }
}
