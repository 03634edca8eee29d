use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;

use super::state::CameraPose;

pub const CAMERA_ZOOM_MIN: f32 = 0.5;
pub const CAMERA_ZOOM_MAX: f32 = 2.0;
pub const CAMERA_ZOOM_DEFAULT: f32 = 1.0;
pub const CAMERA_LERP_FACTOR: f32 = 0.12;
/// Update deltas are expressed in 60 Hz frames; this converts them to milliseconds.
pub const MS_PER_FRAME: f32 = 16.67;

const WHEEL_ZOOM_OUT_FACTOR: f32 = 0.9;
const WHEEL_ZOOM_IN_FACTOR: f32 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 900.0,
            height: 550.0,
        }
    }
}

/// Scale + translate applied to the scene container: `screen = world * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageTransform {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Default for StageTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl StageTransform {
    pub fn screen_to_world(&self, screen_x: f32, screen_y: f32) -> (f32, f32) {
        let scale = if self.scale.abs() > f32::EPSILON {
            self.scale
        } else {
            1.0
        };
        (
            (screen_x - self.offset_x) / scale,
            (screen_y - self.offset_y) / scale,
        )
    }

    pub fn world_to_screen(&self, world_x: f32, world_y: f32) -> (f32, f32) {
        (
            world_x * self.scale + self.offset_x,
            world_y * self.scale + self.offset_y,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSettings {
    pub lerp_factor: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            lerp_factor: CAMERA_LERP_FACTOR,
            min_zoom: CAMERA_ZOOM_MIN,
            max_zoom: CAMERA_ZOOM_MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomStatus {
    Pending,
    Completed,
    /// Superseded by a newer `zoom_to` or interrupted by `snap_to`.
    Cancelled,
}

/// Settlement handle for an animated zoom. Settles exactly once.
#[derive(Debug, Clone)]
pub struct ZoomTicket {
    status: Rc<Cell<ZoomStatus>>,
}

impl ZoomTicket {
    pub fn status(&self) -> ZoomStatus {
        self.status.get()
    }

    pub fn is_settled(&self) -> bool {
        self.status() != ZoomStatus::Pending
    }
}

#[derive(Debug)]
struct ZoomAnimation {
    start_zoom: f32,
    end_zoom: f32,
    point_x: f32,
    point_y: f32,
    elapsed_ms: f32,
    duration_ms: f32,
    status: Rc<Cell<ZoomStatus>>,
}

impl ZoomAnimation {
    fn settle(&self, status: ZoomStatus) {
        if self.status.get() == ZoomStatus::Pending {
            self.status.set(status);
        }
    }
}

/// Viewport controller with a lerp mode and a time-driven zoom animation mode.
#[derive(Debug)]
pub struct Camera {
    x: f32,
    y: f32,
    zoom: f32,
    target_x: f32,
    target_y: f32,
    target_zoom: f32,
    settings: CameraSettings,
    bounds: Bounds,
    view_width: f32,
    view_height: f32,
    animation: Option<ZoomAnimation>,
    transform: StageTransform,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(CameraSettings::default())
    }
}

impl Camera {
    pub fn new(settings: CameraSettings) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: CAMERA_ZOOM_DEFAULT,
            target_x: 0.0,
            target_y: 0.0,
            target_zoom: CAMERA_ZOOM_DEFAULT,
            settings,
            bounds: Bounds::default(),
            view_width: 0.0,
            view_height: 0.0,
            animation: None,
            transform: StageTransform::default(),
        }
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.view_width = width;
        self.view_height = height;
    }

    pub fn set_bounds(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.bounds = Bounds {
            x,
            y,
            width,
            height,
        };
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn viewport(&self) -> (f32, f32) {
        (self.view_width, self.view_height)
    }

    /// Sets current and target pose instantly and cancels any zoom animation.
    pub fn snap_to(&mut self, x: f32, y: f32, zoom: Option<f32>) {
        if let Some(animation) = self.animation.take() {
            animation.settle(ZoomStatus::Cancelled);
            debug!("camera_zoom_cancelled_by_snap");
        }
        self.x = x;
        self.target_x = x;
        self.y = y;
        self.target_y = y;
        if let Some(zoom) = zoom {
            self.zoom = zoom;
            self.target_zoom = zoom;
        }
    }

    pub fn pan_to(&mut self, x: f32, y: f32) {
        self.target_x = x;
        self.target_y = y;
    }

    /// Drag-relative pan measured in screen pixels.
    pub fn move_by(&mut self, dx: f32, dy: f32) {
        self.target_x -= dx / self.zoom;
        self.target_y -= dy / self.zoom;
    }

    /// Wheel zoom that keeps the world point under the pointer fixed.
    /// Positive `delta` zooms out, matching browser wheel sign.
    pub fn adjust_zoom(&mut self, delta: f32, pointer_x: f32, pointer_y: f32) {
        let factor = if delta > 0.0 {
            WHEEL_ZOOM_OUT_FACTOR
        } else {
            WHEEL_ZOOM_IN_FACTOR
        };
        let new_zoom = self.clamp_zoom(self.target_zoom * factor);

        let from_center_x = pointer_x - self.view_width / 2.0;
        let from_center_y = pointer_y - self.view_height / 2.0;
        let world_x = from_center_x / self.zoom + self.x;
        let world_y = from_center_y / self.zoom + self.y;

        self.target_x = world_x - from_center_x / new_zoom;
        self.target_y = world_y - from_center_y / new_zoom;
        self.target_zoom = new_zoom;
    }

    /// Starts a time-driven zoom toward `(point_x, point_y)`.
    ///
    /// A previous animation still in flight is superseded and its ticket
    /// reports [`ZoomStatus::Cancelled`].
    pub fn zoom_to(&mut self, point_x: f32, point_y: f32, zoom: f32, duration_ms: f32) -> ZoomTicket {
        if let Some(previous) = self.animation.take() {
            previous.settle(ZoomStatus::Cancelled);
            debug!("camera_zoom_superseded");
        }
        let status = Rc::new(Cell::new(ZoomStatus::Pending));
        self.animation = Some(ZoomAnimation {
            start_zoom: self.zoom,
            end_zoom: self.clamp_zoom(zoom),
            point_x,
            point_y,
            elapsed_ms: 0.0,
            duration_ms: duration_ms.max(0.0),
            status: Rc::clone(&status),
        });
        self.target_x = point_x;
        self.target_y = point_y;
        ZoomTicket { status }
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Advances the active mode by `dt` frames, clamps to bounds and refreshes
    /// the stage transform.
    pub fn update(&mut self, dt: f32) {
        let lerp = self.settings.lerp_factor;
        if let Some(mut animation) = self.animation.take() {
            animation.elapsed_ms += dt * MS_PER_FRAME;
            let t = if animation.duration_ms > 0.0 {
                (animation.elapsed_ms / animation.duration_ms).min(1.0)
            } else {
                1.0
            };
            self.zoom = animation.start_zoom + (animation.end_zoom - animation.start_zoom) * t;
            self.target_zoom = self.zoom;

            let factor = (lerp * 2.0).min(1.0);
            self.x += (animation.point_x - self.x) * factor;
            self.y += (animation.point_y - self.y) * factor;
            self.target_x = self.x;
            self.target_y = self.y;

            if t >= 1.0 {
                animation.settle(ZoomStatus::Completed);
            } else {
                self.animation = Some(animation);
            }
        } else {
            self.x += (self.target_x - self.x) * lerp;
            self.y += (self.target_y - self.y) * lerp;
            self.zoom += (self.target_zoom - self.zoom) * lerp;
        }

        self.clamp();
        self.apply_transform();
    }

    pub fn state(&self) -> CameraPose {
        CameraPose {
            x: self.x,
            y: self.y,
            zoom: self.zoom,
        }
    }

    pub fn target(&self) -> CameraPose {
        CameraPose {
            x: self.target_x,
            y: self.target_y,
            zoom: self.target_zoom,
        }
    }

    /// Transform written by the most recent `update`.
    pub fn transform(&self) -> StageTransform {
        self.transform
    }

    /// Visible world rectangle as `(left, top, right, bottom)`.
    pub fn visible_rect(&self) -> (f32, f32, f32, f32) {
        let half_w = self.view_width / 2.0 / self.zoom;
        let half_h = self.view_height / 2.0 / self.zoom;
        (
            self.x - half_w,
            self.y - half_h,
            self.x + half_w,
            self.y + half_h,
        )
    }

    fn clamp_zoom(&self, zoom: f32) -> f32 {
        if !zoom.is_finite() {
            return CAMERA_ZOOM_DEFAULT;
        }
        zoom.clamp(self.settings.min_zoom, self.settings.max_zoom)
    }

    fn clamp(&mut self) {
        let half_w = self.view_width / 2.0 / self.zoom;
        let half_h = self.view_height / 2.0 / self.zoom;
        let bounds = self.bounds;

        let min_x = bounds.x + half_w;
        let max_x = bounds.x + bounds.width - half_w;
        if max_x > min_x {
            self.x = self.x.clamp(min_x, max_x);
            self.target_x = self.target_x.clamp(min_x, max_x);
        } else {
            self.x = bounds.x + bounds.width / 2.0;
            self.target_x = self.x;
        }

        let min_y = bounds.y + half_h;
        let max_y = bounds.y + bounds.height - half_h;
        if max_y > min_y {
            self.y = self.y.clamp(min_y, max_y);
            self.target_y = self.target_y.clamp(min_y, max_y);
        } else {
            self.y = bounds.y + bounds.height / 2.0;
            self.target_y = self.y;
        }
    }

    fn apply_transform(&mut self) {
        self.transform = StageTransform {
            scale: self.zoom,
            offset_x: self.view_width / 2.0 - self.x * self.zoom,
            offset_y: self.view_height / 2.0 - self.y * self.zoom,
        };
    }
}
