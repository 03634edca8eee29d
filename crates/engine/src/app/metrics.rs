use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

use super::state::{CameraPose, SceneKind};

static METRICS_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_metrics_lock_poison_once(operation: &'static str) {
    if METRICS_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "metrics lock poisoned; recovered inner value");
    }
}

fn read_recovering<T: Copy>(lock: &RwLock<T>, operation: &'static str) -> T {
    match lock.read() {
        Ok(guard) => *guard,
        Err(poisoned) => {
            warn_metrics_lock_poison_once(operation);
            *poisoned.into_inner()
        }
    }
}

fn write_recovering<T>(lock: &RwLock<T>, value: T, operation: &'static str) {
    match lock.write() {
        Ok(mut guard) => *guard = value,
        Err(poisoned) => {
            warn_metrics_lock_poison_once(operation);
            let mut guard = poisoned.into_inner();
            *guard = value;
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub frame_time_ms: f32,
}

/// What the renderer is showing, refreshed every presented frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewTelemetry {
    pub camera: CameraPose,
    pub scene: Option<SceneKind>,
    pub node_count: usize,
}

/// Cloneable read side of the loop's telemetry, safe to hand to the UI layer.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    snapshot: Arc<RwLock<LoopMetricsSnapshot>>,
    view: Arc<RwLock<ViewTelemetry>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        read_recovering(&self.snapshot, "read")
    }

    pub fn view(&self) -> ViewTelemetry {
        read_recovering(&self.view, "read_view")
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        write_recovering(&self.snapshot, snapshot, "write");
    }

    pub(crate) fn publish_view(&self, view: ViewTelemetry) {
        write_recovering(&self.view, view, "write_view");
    }
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    frames: u32,
    ticks: u32,
    frame_time_sum: Duration,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval_start: Instant::now(),
            interval,
            frames: 0,
            ticks: 0,
            frame_time_sum: Duration::ZERO,
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration) {
        self.frames = self.frames.saturating_add(1);
        self.frame_time_sum = self.frame_time_sum.saturating_add(frame_dt);
    }

    pub(crate) fn record_tick(&mut self) {
        self.ticks = self.ticks.saturating_add(1);
    }

    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = if self.frames == 0 {
            0.0
        } else {
            (self.frame_time_sum.as_secs_f32() / self.frames as f32) * 1000.0
        };

        let snapshot = LoopMetricsSnapshot {
            fps: self.frames as f32 / elapsed_seconds,
            tps: self.ticks as f32 / elapsed_seconds,
            frame_time_ms,
        };

        self.interval_start = now;
        self.frames = 0;
        self.ticks = 0;
        self.frame_time_sum = Duration::ZERO;

        Some(snapshot)
    }
}
