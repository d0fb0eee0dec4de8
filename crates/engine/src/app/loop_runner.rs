use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{error, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorIcon, WindowBuilder};

use super::metrics::FrameStatsAccumulator;
use super::{CursorHint, DrawContext, InputSnapshot, MetricsHandle, Pointer, Renderer, Vec2};

/// Browser-style wheel units per line notch.
const WHEEL_PIXELS_PER_LINE: f32 = 100.0;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub max_frame_delta: Duration,
    pub metrics_log_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Cottage".to_string(),
            window_width: 1280,
            window_height: 720,
            max_frame_delta: Duration::from_millis(250),
            metrics_log_interval: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
    #[error("game tick failed: {message}")]
    Host { message: String },
}

/// Wall-clock timing handed to the host once per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTime {
    /// Seconds since the loop started.
    pub now: f64,
    /// Seconds since the previous frame, clamped.
    pub dt: f32,
}

/// The application driven by `run_app`: one `tick` then one `draw` per frame.
pub trait Host {
    type Error: std::error::Error;

    fn tick(&mut self, frame: FrameTime, input: &InputSnapshot) -> Result<(), Self::Error>;
    fn draw(&mut self, ctx: &mut dyn DrawContext);

    fn cursor(&self) -> CursorHint {
        CursorHint::Default
    }

    fn shutdown(&mut self) {}
}

pub fn run_app<H: Host>(config: LoopConfig, host: H) -> Result<(), AppError> {
    run_app_with_metrics(config, host, MetricsHandle::default())
}

pub fn run_app_with_metrics<H: Host>(
    config: LoopConfig,
    mut host: H,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(5));
    let (initial_width, initial_height) = renderer.size();
    let mut input_collector = InputCollector::new(initial_width, initial_height);
    info!(
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        width = initial_width,
        height = initial_height,
        "loop_config"
    );

    let started_at = Instant::now();
    let mut last_frame_instant = started_at;
    let mut frame_stats = FrameStatsAccumulator::new(metrics_log_interval);
    let mut applied_cursor = CursorHint::Default;
    let mut fatal: Option<String> = None;
    let fatal_slot = &mut fatal;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    input_collector.set_viewport(new_size.width, new_size.height);
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    input_collector.set_viewport(size.width, size.height);
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    input_collector.set_pointer_position(position.x as f32, position.y as f32);
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    input_collector.handle_mouse_input(button, state);
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    input_collector.handle_mouse_wheel(delta);
                }
                WindowEvent::Touch(touch) => {
                    input_collector.handle_touch(
                        touch.phase,
                        touch.location.x as f32,
                        touch.location.y as f32,
                    );
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        input_collector.handle_key(code, event.state);
                    }
                    if input_collector.quit_requested {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;
                    let frame = FrameTime {
                        now: now.saturating_duration_since(started_at).as_secs_f64(),
                        dt: clamp_frame_delta(raw_frame_dt, max_frame_delta).as_secs_f32(),
                    };

                    let input = input_collector.snapshot_for_frame();
                    if let Err(err) = host.tick(frame, &input) {
                        error!(error = %err, "host_tick_failed");
                        *fatal_slot = Some(err.to_string());
                        window_target.exit();
                        return;
                    }

                    if renderer.is_drawable() {
                        {
                            let mut canvas = renderer.canvas();
                            host.draw(&mut canvas);
                        }
                        if let Err(error) = renderer.present() {
                            warn!(error = %error, "renderer_draw_failed");
                            window_target.exit();
                        }
                    }

                    let cursor = host.cursor();
                    if cursor != applied_cursor {
                        window.set_cursor_icon(cursor_icon(cursor));
                        applied_cursor = cursor;
                    }

                    frame_stats.record_frame(raw_frame_dt);
                    if let Some(stats) = frame_stats.maybe_finish(now) {
                        metrics_handle.publish(stats);
                        info!(
                            fps = stats.fps,
                            frame_time_ms = stats.frame_time_ms,
                            worst_frame_ms = stats.worst_frame_ms,
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                host.shutdown();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)?;

    match fatal {
        Some(message) => Err(AppError::Host { message }),
        None => Ok(()),
    }
}

fn cursor_icon(hint: CursorHint) -> CursorIcon {
    match hint {
        CursorHint::Default => CursorIcon::Default,
        CursorHint::Pointer => CursorIcon::Pointer,
        CursorHint::Grab => CursorIcon::Grab,
    }
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    pointer: Pointer,
    debug_toggle_is_down: bool,
    debug_toggle_pressed_edge: bool,
    secondary_is_down: bool,
    secondary_pressed_edge: bool,
    secondary_released_edge: bool,
    pending_wheel: Vec2,
    viewport_width: u32,
    viewport_height: u32,
}

impl InputCollector {
    fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            viewport_width,
            viewport_height,
            ..Self::default()
        }
    }

    fn snapshot_for_frame(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot::new(
            self.pointer,
            self.debug_toggle_pressed_edge,
            self.secondary_pressed_edge,
            self.secondary_released_edge,
            self.pending_wheel,
            (self.viewport_width, self.viewport_height),
        );
        self.debug_toggle_pressed_edge = false;
        self.secondary_pressed_edge = false;
        self.secondary_released_edge = false;
        self.pending_wheel = Vec2::default();
        snapshot
    }

    fn handle_key(&mut self, code: KeyCode, state: ElementState) {
        match code {
            KeyCode::Backquote | KeyCode::F3 => match state {
                ElementState::Pressed => {
                    if !self.debug_toggle_is_down {
                        self.debug_toggle_pressed_edge = true;
                    }
                    self.debug_toggle_is_down = true;
                }
                ElementState::Released => self.debug_toggle_is_down = false,
            },
            KeyCode::Escape => {
                if state == ElementState::Pressed {
                    self.quit_requested = true;
                }
            }
            _ => {}
        }
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport_width = width;
        self.viewport_height = height;
    }

    fn set_pointer_position(&mut self, x: f32, y: f32) {
        self.pointer.x = x;
        self.pointer.y = y;
    }

    fn handle_mouse_wheel(&mut self, delta: MouseScrollDelta) {
        let (dx, dy) = wheel_pixels(delta);
        self.pending_wheel.x += dx;
        self.pending_wheel.y += dy;
    }

    fn handle_touch(&mut self, phase: TouchPhase, x: f32, y: f32) {
        self.set_pointer_position(x, y);
        self.pointer.active = matches!(phase, TouchPhase::Started | TouchPhase::Moved);
    }

    fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        match button {
            MouseButton::Left => self.pointer.active = state == ElementState::Pressed,
            MouseButton::Right => match state {
                ElementState::Pressed => {
                    if !self.secondary_is_down {
                        self.secondary_pressed_edge = true;
                    }
                    self.secondary_is_down = true;
                }
                ElementState::Released => {
                    if self.secondary_is_down {
                        self.secondary_released_edge = true;
                    }
                    self.secondary_is_down = false;
                }
            },
            _ => {}
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

/// Converts to browser wheel convention: positive y scrolls content down.
fn wheel_pixels(delta: MouseScrollDelta) -> (f32, f32) {
    match delta {
        MouseScrollDelta::LineDelta(x, y) => (-x * WHEEL_PIXELS_PER_LINE, -y * WHEEL_PIXELS_PER_LINE),
        MouseScrollDelta::PixelDelta(position) => (-position.x as f32, -position.y as f32),
    }
}
