mod input;
mod loop_runner;
mod metrics;
mod rendering;

pub use input::{CursorHint, InputSnapshot, Pointer, PointerEdge};
pub use loop_runner::{run_app, run_app_with_metrics, AppError, FrameTime, Host, LoopConfig};
pub use metrics::{FrameStats, MetricsHandle};
pub use rendering::{
    measure_text, Affine2, Color, DrawCommand, DrawContext, PixelCanvas, RecordingCanvas,
    Renderer, Vec2,
};
