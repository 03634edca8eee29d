pub mod bridge;
mod camera;
pub mod display;
mod input;
mod loop_runner;
mod metrics;
pub mod rendering;
mod scene;
pub mod sprites;
mod state;
mod tilemap;
mod world_renderer;

pub use camera::{
    Bounds, Camera, CameraSettings, StageTransform, ZoomStatus, ZoomTicket, CAMERA_LERP_FACTOR,
    CAMERA_ZOOM_DEFAULT, CAMERA_ZOOM_MAX, CAMERA_ZOOM_MIN, MS_PER_FRAME,
};
pub use input::{InputManager, PointerRelease, DRAG_THRESHOLD_PX};
pub use loop_runner::{
    run_app, run_app_with_metrics, AppAssets, AppError, AppShell, LoopConfig, ShellCommand,
};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle, ViewTelemetry};
pub use scene::{Scene, SceneBase, SceneContext, SceneError, SceneFactory};
pub use state::{CameraPose, SceneKind, TransitionState, UnknownSceneError, User, WorldState};
pub use tilemap::TilemapLayer;
pub use world_renderer::{RendererConfig, RendererInitError, WorldRenderer};
