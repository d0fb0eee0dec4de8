use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

static FRAME_STATS_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_poison_once(operation: &'static str) {
    if FRAME_STATS_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "frame stats lock poisoned; using last value");
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub fps: f32,
    pub frame_time_ms: f32,
    pub worst_frame_ms: f32,
}

/// Shared read side of the loop's frame statistics, e.g. for a debug overlay.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    stats: Arc<RwLock<FrameStats>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> FrameStats {
        match self.stats.read() {
            Ok(guard) => *guard,
            Err(poisoned) => {
                warn_poison_once("read");
                *poisoned.into_inner()
            }
        }
    }

    pub(crate) fn publish(&self, stats: FrameStats) {
        match self.stats.write() {
            Ok(mut guard) => *guard = stats,
            Err(poisoned) => {
                warn_poison_once("write");
                *poisoned.into_inner() = stats;
            }
        }
    }
}

#[derive(Debug)]
pub(crate) struct FrameStatsAccumulator {
    window_start: Instant,
    window: Duration,
    frames: u32,
    frame_time_sum: Duration,
    worst_frame: Duration,
}

impl FrameStatsAccumulator {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            window_start: Instant::now(),
            window,
            frames: 0,
            frame_time_sum: Duration::ZERO,
            worst_frame: Duration::ZERO,
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration) {
        self.frames = self.frames.saturating_add(1);
        self.frame_time_sum = self.frame_time_sum.saturating_add(frame_dt);
        self.worst_frame = self.worst_frame.max(frame_dt);
    }

    pub(crate) fn maybe_finish(&mut self, now: Instant) -> Option<FrameStats> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.window {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = if self.frames == 0 {
            0.0
        } else {
            self.frame_time_sum.as_secs_f32() / self.frames as f32 * 1000.0
        };
        let stats = FrameStats {
            fps: self.frames as f32 / elapsed_seconds,
            frame_time_ms,
            worst_frame_ms: self.worst_frame.as_secs_f32() * 1000.0,
        };

        self.window_start = now;
        self.frames = 0;
        self.frame_time_sum = Duration::ZERO;
        self.worst_frame = Duration::ZERO;
        Some(stats)
    }
}
