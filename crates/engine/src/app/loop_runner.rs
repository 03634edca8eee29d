use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use super::display::{rgb, Color};
use super::metrics::{MetricsAccumulator, ViewTelemetry};
use super::rendering::{Canvas, Renderer};
use super::world_renderer::WorldRenderer;
use super::MetricsHandle;
use crate::assets::{AssetManifest, TextureLoader};

/// Update deltas handed to the renderer are in 60 Hz frames.
const FRAMES_PER_SECOND_BASIS: f32 = 60.0;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub max_render_fps: Option<u32>,
    pub clear_color: Color,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Campus".to_string(),
            window_width: 900,
            window_height: 550,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            max_render_fps: None,
            clear_color: rgb(0x1A1A2E),
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
}

/// Keyboard shortcuts forwarded to the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCommand {
    Confirm,
    Back,
    Logout,
}

const SHELL_COMMAND_COUNT: usize = 3;

impl ShellCommand {
    fn index(self) -> usize {
        match self {
            ShellCommand::Confirm => 0,
            ShellCommand::Back => 1,
            ShellCommand::Logout => 2,
        }
    }
}

/// The UI layer driven by the native loop. It owns the application state,
/// pushes it into the renderer and paints screen-space chrome over the scene.
pub trait AppShell {
    /// Runs once after the renderer has been initialised, successfully or not.
    fn start(&mut self, world: &mut WorldRenderer);
    fn command(&mut self, command: ShellCommand, world: &mut WorldRenderer);
    /// One fixed step after the renderer's own tick; `dt` is in 60 Hz frames.
    fn tick(&mut self, dt: f32, world: &mut WorldRenderer);
    fn paint(&self, canvas: &mut Canvas<'_>);
    fn title(&self) -> Option<String> {
        None
    }
    fn shutdown(&mut self) {}
}

/// Texture table plus the loader that turns it into pixels.
pub struct AppAssets {
    pub manifest: AssetManifest,
    pub loader: Box<dyn TextureLoader>,
}

pub fn run_app(
    config: LoopConfig,
    world: WorldRenderer,
    shell: Box<dyn AppShell>,
    assets: AppAssets,
) -> Result<(), AppError> {
    run_app_with_metrics(config, world, shell, assets, MetricsHandle::default())
}

pub fn run_app_with_metrics(
    config: LoopConfig,
    mut world: WorldRenderer,
    mut shell: Box<dyn AppShell>,
    assets: AppAssets,
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
    let mut renderer =
        Renderer::new(Arc::clone(&window), config.clear_color).map_err(AppError::CreateRenderer)?;

    let size = window.inner_size();
    if world
        .init(
            (size.width as f32, size.height as f32),
            &assets.manifest,
            assets.loader.as_ref(),
        )
        .is_err()
    {
        warn!("renderer_uninitialized; navigation disabled for this session");
    }
    shell.start(&mut world);

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let tick_frames = fixed_dt.as_secs_f32() * FRAMES_PER_SECOND_BASIS;
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);
    let mut input_collector = InputCollector::default();

    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        render_fps_cap = %format_render_cap(effective_render_cap),
        "loop_config"
    );

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut last_applied_title: Option<String> = None;
    let window_for_loop = Arc::clone(&window);

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window_for_loop.id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        info!(reason = "window_close", "shutdown_requested");
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                        world.resize(new_size.width as f32, new_size.height as f32);
                    }
                    WindowEvent::ScaleFactorChanged { .. } => {
                        let size = window_for_loop.inner_size();
                        if let Err(error) = renderer.resize(size.width, size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                        world.resize(size.width as f32, size.height as f32);
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        let (x, y) = (position.x as f32, position.y as f32);
                        input_collector.set_cursor_position_px(x, y);
                        world.pointer_move(x, y);
                    }
                    WindowEvent::CursorLeft { .. } => {
                        input_collector.clear_cursor_position();
                        world.pointer_cancel();
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        match input_collector.handle_mouse_input(button, state) {
                            Some(PointerEdge::Down(x, y)) => world.pointer_down(x, y),
                            Some(PointerEdge::Up(x, y)) => {
                                world.pointer_up(x, y);
                            }
                            None => {}
                        }
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        if let Some((x, y)) = input_collector.cursor_position_px {
                            world.wheel(wheel_delta_y(delta), x, y);
                        }
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        input_collector.handle_key(event.physical_key, event.state);
                        if input_collector.quit_requested {
                            info!(reason = "escape_key", "shutdown_requested");
                            window_target.exit();
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        for command in input_collector.take_commands() {
                            info!(?command, "shell_command");
                            shell.command(command, &mut world);
                        }

                        let now = Instant::now();
                        let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                        last_frame_instant = now;

                        let clamped_frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);
                        accumulator = accumulator.saturating_add(clamped_frame_dt);

                        let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                        for _ in 0..step_plan.ticks_to_run {
                            world.tick(tick_frames);
                            shell.tick(tick_frames, &mut world);
                            metrics_accumulator.record_tick();
                        }
                        accumulator = step_plan.remaining_accumulator;

                        if step_plan.dropped_backlog > Duration::ZERO {
                            warn!(
                                dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                                max_ticks_per_frame, "sim_clamp_triggered"
                            );
                        }

                        // Single authoritative FPS cap sleep point for render pacing.
                        let elapsed_since_last_present =
                            Instant::now().saturating_duration_since(last_present_instant);
                        let cap_sleep =
                            compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                        if cap_sleep > Duration::ZERO {
                            thread::sleep(cap_sleep);
                        }

                        let stage = world.camera().transform();
                        if let Err(error) =
                            renderer.render(world.tree(), stage, |canvas| shell.paint(canvas))
                        {
                            warn!(error = %error, "renderer_draw_failed");
                            window_target.exit();
                        }
                        last_present_instant = Instant::now();
                        metrics_handle.publish_view(ViewTelemetry {
                            camera: world.camera().state(),
                            scene: world.current_scene(),
                            node_count: world.tree().node_count(),
                        });

                        let next_title = shell.title();
                        if next_title != last_applied_title {
                            match &next_title {
                                Some(title) => window_for_loop.set_title(title),
                                None => window_for_loop.set_title(&config.window_title),
                            }
                            last_applied_title = next_title;
                        }
                        metrics_accumulator.record_frame(raw_frame_dt);

                        if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                            metrics_handle.publish(snapshot);
                            let camera = world.camera().state();
                            info!(
                                fps = snapshot.fps,
                                tps = snapshot.tps,
                                frame_time_ms = snapshot.frame_time_ms,
                                node_count = world.tree().node_count(),
                                scene = ?world.current_scene(),
                                camera_x = camera.x,
                                camera_y = camera.y,
                                camera_zoom = camera.zoom,
                                "loop_metrics"
                            );
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                window_for_loop.request_redraw();
            }
            Event::LoopExiting => {
                shell.shutdown();
                world.destroy();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PointerEdge {
    Down(f32, f32),
    Up(f32, f32),
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    command_keys_down: [bool; SHELL_COMMAND_COUNT],
    pending_commands: Vec<ShellCommand>,
    cursor_position_px: Option<(f32, f32)>,
    left_mouse_is_down: bool,
}

impl InputCollector {
    fn handle_key(&mut self, key: PhysicalKey, state: ElementState) {
        if key == PhysicalKey::Code(KeyCode::Escape) && state == ElementState::Pressed {
            self.quit_requested = true;
            return;
        }
        let Some(command) = command_for_key(key) else {
            return;
        };
        let is_down = &mut self.command_keys_down[command.index()];
        match state {
            ElementState::Pressed => {
                if !*is_down {
                    self.pending_commands.push(command);
                }
                *is_down = true;
            }
            ElementState::Released => *is_down = false,
        }
    }

    fn take_commands(&mut self) -> Vec<ShellCommand> {
        std::mem::take(&mut self.pending_commands)
    }

    fn set_cursor_position_px(&mut self, x: f32, y: f32) {
        self.cursor_position_px = Some((x, y));
    }

    fn clear_cursor_position(&mut self) {
        self.cursor_position_px = None;
        self.left_mouse_is_down = false;
    }

    /// Left-button transitions at the last known cursor position.
    fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) -> Option<PointerEdge> {
        if button != MouseButton::Left {
            return None;
        }
        let (x, y) = self.cursor_position_px?;
        match state {
            ElementState::Pressed if !self.left_mouse_is_down => {
                self.left_mouse_is_down = true;
                Some(PointerEdge::Down(x, y))
            }
            ElementState::Released if self.left_mouse_is_down => {
                self.left_mouse_is_down = false;
                Some(PointerEdge::Up(x, y))
            }
            _ => None,
        }
    }
}

fn command_for_key(key: PhysicalKey) -> Option<ShellCommand> {
    match key {
        PhysicalKey::Code(KeyCode::Enter) | PhysicalKey::Code(KeyCode::NumpadEnter) => {
            Some(ShellCommand::Confirm)
        }
        PhysicalKey::Code(KeyCode::Backspace) => Some(ShellCommand::Back),
        PhysicalKey::Code(KeyCode::KeyL) => Some(ShellCommand::Logout),
        _ => None,
    }
}

/// Browser wheel sign: positive scrolls down and zooms out.
fn wheel_delta_y(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y,
        MouseScrollDelta::PixelDelta(position) => -(position.y as f32),
    }
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
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

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        assert_eq!(
            clamp_frame_delta(Duration::from_millis(600), max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let result = plan_sim_steps(Duration::from_millis(48), Duration::from_millis(16), 5);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let result = plan_sim_steps(Duration::from_millis(120), Duration::from_millis(16), 3);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn sixty_hz_tick_is_one_frame() {
        let fixed_dt = Duration::from_secs_f64(1.0 / 60.0);
        assert!((fixed_dt.as_secs_f32() * FRAMES_PER_SECOND_BASIS - 1.0).abs() < 1e-4);
    }

    #[test]
    fn held_command_key_does_not_repeat() {
        let mut input = InputCollector::default();
        let enter = PhysicalKey::Code(KeyCode::Enter);

        input.handle_key(enter, ElementState::Pressed);
        input.handle_key(enter, ElementState::Pressed);
        assert_eq!(input.take_commands(), vec![ShellCommand::Confirm]);

        input.handle_key(enter, ElementState::Released);
        input.handle_key(enter, ElementState::Pressed);
        assert_eq!(input.take_commands(), vec![ShellCommand::Confirm]);
        assert!(input.take_commands().is_empty());
    }

    #[test]
    fn keys_map_to_shell_commands() {
        let mut input = InputCollector::default();
        input.handle_key(PhysicalKey::Code(KeyCode::Backspace), ElementState::Pressed);
        input.handle_key(PhysicalKey::Code(KeyCode::KeyL), ElementState::Pressed);
        input.handle_key(PhysicalKey::Code(KeyCode::KeyW), ElementState::Pressed);

        assert_eq!(
            input.take_commands(),
            vec![ShellCommand::Back, ShellCommand::Logout]
        );
        assert!(!input.quit_requested);
    }

    #[test]
    fn escape_requests_quit() {
        let mut input = InputCollector::default();
        input.handle_key(PhysicalKey::Code(KeyCode::Escape), ElementState::Pressed);
        assert!(input.quit_requested);
        assert!(input.take_commands().is_empty());
    }

    #[test]
    fn mouse_edges_use_last_cursor_position() {
        let mut input = InputCollector::default();
        assert_eq!(
            input.handle_mouse_input(MouseButton::Left, ElementState::Pressed),
            None
        );

        input.set_cursor_position_px(100.0, 200.0);
        assert_eq!(
            input.handle_mouse_input(MouseButton::Left, ElementState::Pressed),
            Some(PointerEdge::Down(100.0, 200.0))
        );
        assert_eq!(
            input.handle_mouse_input(MouseButton::Left, ElementState::Pressed),
            None
        );
        input.set_cursor_position_px(110.0, 190.0);
        assert_eq!(
            input.handle_mouse_input(MouseButton::Left, ElementState::Released),
            Some(PointerEdge::Up(110.0, 190.0))
        );
        assert_eq!(
            input.handle_mouse_input(MouseButton::Right, ElementState::Pressed),
            None
        );
    }

    #[test]
    fn leaving_the_window_forgets_the_button() {
        let mut input = InputCollector::default();
        input.set_cursor_position_px(5.0, 5.0);
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        input.clear_cursor_position();
        input.set_cursor_position_px(6.0, 6.0);

        assert_eq!(
            input.handle_mouse_input(MouseButton::Left, ElementState::Released),
            None
        );
    }

    #[test]
    fn wheel_up_zooms_in() {
        assert!(wheel_delta_y(MouseScrollDelta::LineDelta(0.0, 1.0)) < 0.0);
        assert!(
            wheel_delta_y(MouseScrollDelta::PixelDelta(
                winit::dpi::PhysicalPosition::new(0.0, -3.0)
            )) > 0.0
        );
    }

    #[test]
    fn compute_cap_sleep_respects_budget() {
        let target = target_frame_duration(Some(60));
        assert_eq!(compute_cap_sleep(Duration::from_millis(20), target), Duration::ZERO);
        assert!(compute_cap_sleep(Duration::from_millis(5), target) > Duration::ZERO);
        assert_eq!(compute_cap_sleep(Duration::from_millis(5), None), Duration::ZERO);
    }

    #[test]
    fn normalize_render_fps_cap_disables_zero() {
        assert_eq!(normalize_render_fps_cap(Some(0)), None);
        assert_eq!(normalize_render_fps_cap(Some(60)), Some(60));
    }
}
