use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::bridge::{
    FadeDirection, GameBridge, Navigate, NavigateRequest, RequestFade, RequestFadeChannel,
    Subscription,
};
use super::camera::{Camera, CameraSettings, ZoomTicket, MS_PER_FRAME};
use super::display::{DisplayTree, Node, NodeId};
use super::input::{InputManager, PointerRelease};
use super::scene::{Scene, SceneContext, SceneFactory};
use super::sprites::CharacterFactory;
use super::state::{SceneKind, WorldState};
use crate::assets::{AssetError, AssetManifest, TextureLoader, TextureRegistry};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererConfig {
    pub focus_zoom: f32,
    pub focus_zoom_duration_ms: f32,
    /// Wait between `requestFade(out)` and the scene switch. Must cover the
    /// UI's fade-out animation; nothing acknowledges it.
    pub fade_delay_ms: f32,
    pub camera: CameraSettings,
    pub avatar_sheets: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            focus_zoom: 1.5,
            focus_zoom_duration_ms: 150.0,
            fade_delay_ms: 120.0,
            camera: CameraSettings::default(),
            avatar_sheets: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum RendererInitError {
    #[error("asset loading failed: {0}")]
    Assets(#[from] AssetError),
}

#[derive(Debug)]
enum NavPhase {
    Idle,
    FocusZoom {
        request: NavigateRequest,
        ticket: ZoomTicket,
    },
    FadeOut {
        request: NavigateRequest,
        remaining_ms: f32,
    },
}

struct ActiveScene {
    kind: SceneKind,
    scene: Box<dyn Scene>,
}

/// Owns the display tree, camera, input and the active scene, and runs the
/// zoom, fade and switch choreography for navigation requests.
///
/// Navigation requests arriving on the bridge land in a single slot; a
/// newer request replaces a queued one and runs after the one in flight.
pub struct WorldRenderer {
    config: RendererConfig,
    bridge: GameBridge,
    scenes: Box<dyn SceneFactory>,
    camera: Camera,
    input: InputManager,
    tree: DisplayTree,
    scene_layer: NodeId,
    textures: TextureRegistry,
    factory: CharacterFactory,
    current: Option<ActiveScene>,
    last_state: Option<WorldState>,
    last_switch: Option<NavigateRequest>,
    pending: Rc<RefCell<Option<NavigateRequest>>>,
    phase: NavPhase,
    navigate_subscription: Option<Subscription>,
    initialized: bool,
}

impl WorldRenderer {
    pub fn new(bridge: GameBridge, scenes: Box<dyn SceneFactory>, config: RendererConfig) -> Self {
        let mut tree = DisplayTree::new();
        let root = tree.root();
        let scene_layer = tree.add_child(root, Node::group());
        Self {
            camera: Camera::new(config.camera),
            factory: CharacterFactory::new(config.avatar_sheets),
            config,
            bridge,
            scenes,
            input: InputManager::new(),
            tree,
            scene_layer,
            textures: TextureRegistry::new(),
            current: None,
            last_state: None,
            last_switch: None,
            pending: Rc::new(RefCell::new(None)),
            phase: NavPhase::Idle,
            navigate_subscription: None,
            initialized: false,
        }
    }

    /// Replaces the character factory, e.g. with a seeded one.
    pub fn with_character_factory(mut self, factory: CharacterFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Loads every texture, then starts listening for navigation. On failure
    /// the renderer stays uninitialized and ignores navigation for good.
    pub fn init(
        &mut self,
        viewport: (f32, f32),
        manifest: &AssetManifest,
        loader: &dyn TextureLoader,
    ) -> Result<(), RendererInitError> {
        if self.initialized {
            debug!("renderer_already_initialized");
            return Ok(());
        }
        self.camera.set_viewport(viewport.0, viewport.1);

        if let Err(err) = self.textures.load_all(manifest, loader) {
            error!(error = %err, "renderer_init_failed");
            return Err(err.into());
        }

        let slot = Rc::clone(&self.pending);
        self.navigate_subscription = Some(self.bridge.on::<Navigate, _>(move |request| {
            let replaced = slot.borrow_mut().replace(request.clone());
            if let Some(replaced) = replaced {
                debug!(dropped = %replaced.scene, scene = %request.scene, "navigation_superseded");
            }
        }));
        self.initialized = true;
        info!(
            texture_count = self.textures.len(),
            viewport_width = viewport.0,
            viewport_height = viewport.1,
            "renderer_initialized"
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// One frame: camera, navigation choreography, then the active scene.
    pub fn tick(&mut self, dt: f32) {
        if !self.initialized {
            return;
        }
        self.camera.update(dt);
        self.advance_navigation(dt * MS_PER_FRAME);
        if let Some(active) = self.current.as_mut() {
            let mut ctx = SceneContext {
                tree: &mut self.tree,
                textures: &self.textures,
                bridge: &self.bridge,
                factory: &mut self.factory,
                layer: self.scene_layer,
            };
            active.scene.update(dt, &mut ctx);
        }
    }

    fn advance_navigation(&mut self, elapsed_ms: f32) {
        match std::mem::replace(&mut self.phase, NavPhase::Idle) {
            NavPhase::Idle => {
                let next = self.pending.borrow_mut().take();
                if let Some(request) = next {
                    self.begin_navigation(request);
                }
            }
            NavPhase::FocusZoom { request, ticket } => {
                if ticket.is_settled() {
                    debug!(status = ?ticket.status(), "focus_zoom_settled");
                    self.start_fade_out(request);
                } else {
                    self.phase = NavPhase::FocusZoom { request, ticket };
                }
            }
            NavPhase::FadeOut {
                request,
                remaining_ms,
            } => {
                let remaining_ms = remaining_ms - elapsed_ms;
                if remaining_ms > 0.0 {
                    self.phase = NavPhase::FadeOut {
                        request,
                        remaining_ms,
                    };
                } else {
                    self.switch_scene(&request);
                    self.bridge.emit::<RequestFadeChannel>(RequestFade {
                        direction: FadeDirection::In,
                    });
                    info!(scene = %request.scene, target = ?request.target_id, "navigation_complete");
                }
            }
        }
    }

    fn begin_navigation(&mut self, request: NavigateRequest) {
        info!(
            scene = %request.scene,
            target = ?request.target_id,
            focus = request.focus_point.is_some(),
            "navigation_started"
        );
        if request.scene == SceneKind::Login {
            self.teardown_current();
            self.tree.clear_children(self.scene_layer);
            return;
        }
        match (request.focus_point, self.current.is_some()) {
            (Some(focus), true) => {
                let ticket = self.camera.zoom_to(
                    focus.x,
                    focus.y,
                    self.config.focus_zoom,
                    self.config.focus_zoom_duration_ms,
                );
                self.phase = NavPhase::FocusZoom { request, ticket };
            }
            _ => self.start_fade_out(request),
        }
    }

    fn start_fade_out(&mut self, request: NavigateRequest) {
        self.bridge.emit::<RequestFadeChannel>(RequestFade {
            direction: FadeDirection::Out,
        });
        self.phase = NavPhase::FadeOut {
            request,
            remaining_ms: self.config.fade_delay_ms,
        };
    }

    fn switch_scene(&mut self, request: &NavigateRequest) {
        self.last_switch = Some(request.clone());
        self.teardown_current();
        self.tree.clear_children(self.scene_layer);

        let Some(mut scene) = self
            .scenes
            .create(request.scene, request.target_id.as_deref())
        else {
            warn!(scene = %request.scene, "scene_kind_unsupported");
            return;
        };

        let mut ctx = SceneContext {
            tree: &mut self.tree,
            textures: &self.textures,
            bridge: &self.bridge,
            factory: &mut self.factory,
            layer: self.scene_layer,
        };
        if let Err(err) = scene.setup(&mut ctx) {
            error!(
                scene = scene.debug_name(),
                target = ?request.target_id,
                error = %err,
                "scene_setup_failed"
            );
            scene.teardown(ctx.tree);
            return;
        }

        let (width, height) = scene.scene_size();
        self.camera.set_bounds(0.0, 0.0, width, height);
        self.camera.snap_to(width / 2.0, height / 2.0, Some(1.0));
        self.camera.update(0.0);

        if let Some(state) = self.last_state.as_ref() {
            scene.sync_state(state, &mut ctx);
        }
        info!(
            scene = scene.debug_name(),
            width,
            height,
            node_count = self.tree.node_count(),
            "scene_switched"
        );
        self.current = Some(ActiveScene {
            kind: request.scene,
            scene,
        });
    }

    fn teardown_current(&mut self) {
        if let Some(mut active) = self.current.take() {
            active.scene.teardown(&mut self.tree);
            self.input.reset_hover();
        }
    }

    /// Records the latest UI state and forwards it to the active scene.
    pub fn sync_state(&mut self, state: &WorldState) {
        self.last_state = Some(state.clone());
        if let Some(active) = self.current.as_mut() {
            let mut ctx = SceneContext {
                tree: &mut self.tree,
                textures: &self.textures,
                bridge: &self.bridge,
                factory: &mut self.factory,
                layer: self.scene_layer,
            };
            active.scene.sync_state(state, &mut ctx);
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.camera.set_viewport(width, height);
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.input.pointer_down(x, y);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.input
            .pointer_move(x, y, &mut self.camera, &mut self.tree);
    }

    pub fn pointer_up(&mut self, x: f32, y: f32) -> PointerRelease {
        self.input
            .pointer_up(x, y, &self.camera, &self.tree, &self.bridge)
    }

    pub fn pointer_cancel(&mut self) -> PointerRelease {
        self.input.pointer_cancel(&self.camera, &self.bridge)
    }

    pub fn wheel(&mut self, delta_y: f32, x: f32, y: f32) {
        self.input
            .wheel(delta_y, x, y, &mut self.camera, &self.bridge);
    }

    /// Detaches input, drops the navigation listener and releases every node.
    pub fn destroy(&mut self) {
        self.input.detach();
        if let Some(subscription) = self.navigate_subscription.take() {
            subscription.unsubscribe();
        }
        self.teardown_current();
        let root = self.tree.root();
        self.tree.clear_children(root);
        self.pending.borrow_mut().take();
        self.last_switch = None;
        self.phase = NavPhase::Idle;
        self.initialized = false;
        info!("renderer_destroyed");
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn tree(&self) -> &DisplayTree {
        &self.tree
    }

    pub fn textures(&self) -> &TextureRegistry {
        &self.textures
    }

    pub fn bridge(&self) -> &GameBridge {
        &self.bridge
    }

    pub fn scene_layer(&self) -> NodeId {
        self.scene_layer
    }

    pub fn current_scene(&self) -> Option<SceneKind> {
        self.current.as_ref().map(|active| active.kind)
    }

    pub fn current_scene_size(&self) -> Option<(f32, f32)> {
        self.current.as_ref().map(|active| active.scene.scene_size())
    }

    /// The request behind the most recent scene switch, whether or not its
    /// setup succeeded. Read it when `requestFade(in)` arrives.
    pub fn last_switch(&self) -> Option<&NavigateRequest> {
        self.last_switch.as_ref()
    }

    pub fn is_navigating(&self) -> bool {
        !matches!(self.phase, NavPhase::Idle) || self.pending.borrow().is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::app::bridge::{EntityClickedChannel, FocusPoint};
    use crate::app::scene::{SceneBase, SceneError};
    use crate::assets::{PlaceholderTextureLoader, TextureEntry, Texture};

    type Log = Rc<RefCell<Vec<String>>>;

    struct ScriptedScene {
        name: &'static str,
        size: (f32, f32),
        fail: bool,
        base: SceneBase,
        log: Log,
    }

    impl Scene for ScriptedScene {
        fn setup(&mut self, ctx: &mut SceneContext<'_>) -> Result<(), SceneError> {
            self.log.borrow_mut().push(format!("setup:{}", self.name));
            let container = self.base.attach(ctx.tree, ctx.layer);
            ctx.tree.add_child(container, Node::group());
            if self.fail {
                return Err(SceneError::Asset(AssetError::MissingTexture {
                    key: "prop_throne".to_string(),
                }));
            }
            Ok(())
        }

        fn update(&mut self, _dt: f32, _ctx: &mut SceneContext<'_>) {}

        fn sync_state(&mut self, _state: &WorldState, _ctx: &mut SceneContext<'_>) {
            self.log.borrow_mut().push(format!("sync:{}", self.name));
        }

        fn teardown(&mut self, tree: &mut DisplayTree) {
            self.log.borrow_mut().push(format!("teardown:{}", self.name));
            self.base.teardown(tree, self.name);
        }

        fn scene_size(&self) -> (f32, f32) {
            self.size
        }

        fn container(&self) -> Option<NodeId> {
            self.base.container()
        }

        fn debug_name(&self) -> &'static str {
            self.name
        }
    }

    struct ScriptedFactory {
        log: Log,
    }

    impl SceneFactory for ScriptedFactory {
        fn create(&self, kind: SceneKind, target_id: Option<&str>) -> Option<Box<dyn Scene>> {
            let (name, size) = match kind {
                SceneKind::Login => return None,
                SceneKind::World => ("world", (896.0, 544.0)),
                SceneKind::Building => ("building", (600.0, 450.0)),
                SceneKind::Room => ("room", (500.0, 400.0)),
            };
            Some(Box::new(ScriptedScene {
                name,
                size,
                fail: target_id == Some("broken"),
                base: SceneBase::new(),
                log: Rc::clone(&self.log),
            }))
        }
    }

    struct Harness {
        renderer: WorldRenderer,
        bridge: GameBridge,
        log: Log,
    }

    fn harness() -> Harness {
        let bridge = GameBridge::new();
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let fade_log = Rc::clone(&log);
        let _ = bridge.on::<RequestFadeChannel, _>(move |fade| {
            let direction = match fade.direction {
                FadeDirection::In => "in",
                FadeDirection::Out => "out",
            };
            fade_log.borrow_mut().push(format!("fade:{direction}"));
        });
        let mut renderer = WorldRenderer::new(
            bridge.clone(),
            Box::new(ScriptedFactory {
                log: Rc::clone(&log),
            }),
            RendererConfig::default(),
        )
        .with_character_factory(CharacterFactory::with_seed(false, 9));
        renderer
            .init((400.0, 300.0), &AssetManifest::builtin(), &PlaceholderTextureLoader)
            .expect("init");
        Harness {
            renderer,
            bridge,
            log,
        }
    }

    fn run_frames(renderer: &mut WorldRenderer, frames: usize) {
        for _ in 0..frames {
            renderer.tick(1.0);
        }
    }

    fn settle(renderer: &mut WorldRenderer) {
        let mut guard = 0;
        while renderer.is_navigating() && guard < 200 {
            renderer.tick(1.0);
            guard += 1;
        }
        assert!(!renderer.is_navigating(), "navigation never finished");
    }

    #[test]
    fn navigation_without_focus_fades_out_switches_then_fades_in() {
        let mut h = harness();
        h.renderer.sync_state(&WorldState::default());
        h.bridge.emit::<Navigate>(NavigateRequest::to(SceneKind::World));
        settle(&mut h.renderer);
        h.log.borrow_mut().clear();

        h.bridge
            .emit::<Navigate>(NavigateRequest::to(SceneKind::Room).with_target("pod-3"));
        settle(&mut h.renderer);

        assert_eq!(
            h.log.borrow().as_slice(),
            &["fade:out", "teardown:world", "setup:room", "sync:room", "fade:in"]
        );
        assert_eq!(h.renderer.current_scene(), Some(SceneKind::Room));
        assert_eq!(h.renderer.tree().children_count(h.renderer.scene_layer()), 1);
    }

    #[test]
    fn switch_resets_camera_to_scene_centre() {
        let mut h = harness();
        h.bridge.emit::<Navigate>(NavigateRequest::to(SceneKind::Building).with_target("hub-main"));
        settle(&mut h.renderer);

        assert_eq!(h.renderer.current_scene_size(), Some((600.0, 450.0)));
        let camera = h.renderer.camera();
        let bounds = camera.bounds();
        assert_eq!((bounds.width, bounds.height), (600.0, 450.0));
        let pose = camera.state();
        assert!((pose.x - 300.0).abs() < 1e-3);
        assert!((pose.y - 225.0).abs() < 1e-3);
        assert!((pose.zoom - 1.0).abs() < 1e-6);
    }

    #[test]
    fn fade_delay_holds_the_switch() {
        let mut h = harness();
        h.bridge.emit::<Navigate>(NavigateRequest::to(SceneKind::World));

        run_frames(&mut h.renderer, 1);
        assert_eq!(h.log.borrow().as_slice(), &["fade:out"]);

        // 120 ms is a little over seven 60 Hz frames.
        run_frames(&mut h.renderer, 7);
        assert_eq!(h.log.borrow().len(), 1);

        run_frames(&mut h.renderer, 1);
        assert_eq!(h.log.borrow().as_slice(), &["fade:out", "setup:world", "fade:in"]);
    }

    #[test]
    fn focus_point_zooms_before_fading() {
        let mut h = harness();
        h.bridge.emit::<Navigate>(NavigateRequest::to(SceneKind::World));
        settle(&mut h.renderer);
        h.log.borrow_mut().clear();

        h.bridge.emit::<Navigate>(
            NavigateRequest::to(SceneKind::Building)
                .with_target("hub-main")
                .with_focus(FocusPoint { x: 170.0, y: 170.0 }),
        );
        run_frames(&mut h.renderer, 3);
        assert!(h.log.borrow().is_empty());
        assert!(h.renderer.camera().is_animating());
        assert!(h.renderer.camera().state().zoom > 1.0);

        settle(&mut h.renderer);
        assert_eq!(
            h.log.borrow().as_slice(),
            &["fade:out", "teardown:world", "setup:building", "fade:in"]
        );
    }

    #[test]
    fn choreography_never_emits_entity_clicks() {
        let mut h = harness();
        let clicks = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&clicks);
        let _ = h
            .bridge
            .on::<EntityClickedChannel, _>(move |clicked| sink.borrow_mut().push(clicked.clone()));

        h.bridge.emit::<Navigate>(NavigateRequest::to(SceneKind::World));
        settle(&mut h.renderer);
        h.bridge.emit::<Navigate>(
            NavigateRequest::to(SceneKind::Building)
                .with_target("hub-main")
                .with_focus(FocusPoint { x: 170.0, y: 170.0 }),
        );
        settle(&mut h.renderer);

        assert_eq!(h.renderer.current_scene(), Some(SceneKind::Building));
        assert_eq!(
            h.log.borrow().iter().filter(|entry| *entry == "fade:in").count(),
            2
        );
        assert!(clicks.borrow().is_empty());
    }

    #[test]
    fn focus_point_is_ignored_without_an_active_scene() {
        let mut h = harness();
        h.bridge.emit::<Navigate>(
            NavigateRequest::to(SceneKind::World).with_focus(FocusPoint { x: 10.0, y: 10.0 }),
        );
        run_frames(&mut h.renderer, 1);
        assert_eq!(h.log.borrow().as_slice(), &["fade:out"]);
        assert!(!h.renderer.camera().is_animating());
    }

    #[test]
    fn overlapping_requests_keep_only_the_latest_queued() {
        let mut h = harness();
        h.bridge.emit::<Navigate>(NavigateRequest::to(SceneKind::World));
        run_frames(&mut h.renderer, 2);

        h.bridge.emit::<Navigate>(NavigateRequest::to(SceneKind::Building).with_target("a"));
        h.bridge.emit::<Navigate>(NavigateRequest::to(SceneKind::Room).with_target("b"));
        settle(&mut h.renderer);

        let log = h.log.borrow();
        let setups: Vec<&str> = log
            .iter()
            .filter(|entry| entry.starts_with("setup:"))
            .map(String::as_str)
            .collect();
        assert_eq!(setups, ["setup:world", "setup:room"]);
        let last = h.renderer.last_switch().expect("last switch");
        assert_eq!((last.scene, last.target_id.as_deref()), (SceneKind::Room, Some("b")));
        assert_eq!(log.iter().filter(|entry| *entry == "fade:in").count(), 2);
    }

    #[test]
    fn login_tears_down_without_fading() {
        let mut h = harness();
        h.bridge.emit::<Navigate>(NavigateRequest::to(SceneKind::World));
        settle(&mut h.renderer);
        h.log.borrow_mut().clear();

        h.bridge.emit::<Navigate>(NavigateRequest::to(SceneKind::Login));
        run_frames(&mut h.renderer, 1);

        assert_eq!(h.log.borrow().as_slice(), &["teardown:world"]);
        assert!(h.renderer.current_scene().is_none());
        assert_eq!(h.renderer.tree().children_count(h.renderer.scene_layer()), 0);
    }

    #[test]
    fn failed_setup_leaves_blank_scene_and_still_fades_in() {
        let mut h = harness();
        h.bridge.emit::<Navigate>(NavigateRequest::to(SceneKind::Room).with_target("broken"));
        settle(&mut h.renderer);

        assert_eq!(
            h.log.borrow().as_slice(),
            &["fade:out", "setup:room", "teardown:room", "fade:in"]
        );
        assert!(h.renderer.current_scene().is_none());
        assert_eq!(h.renderer.tree().children_count(h.renderer.scene_layer()), 0);
    }

    struct BrokenLoader;

    impl TextureLoader for BrokenLoader {
        fn load(&self, entry: &TextureEntry) -> Result<Texture, AssetError> {
            Err(AssetError::MissingTexture {
                key: entry.key.clone(),
            })
        }
    }

    #[test]
    fn init_failure_leaves_renderer_inert() {
        let bridge = GameBridge::new();
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let mut renderer = WorldRenderer::new(
            bridge.clone(),
            Box::new(ScriptedFactory {
                log: Rc::clone(&log),
            }),
            RendererConfig::default(),
        );

        let result = renderer.init((400.0, 300.0), &AssetManifest::builtin(), &BrokenLoader);
        assert!(matches!(result, Err(RendererInitError::Assets(_))));
        assert!(!renderer.is_initialized());
        assert_eq!(bridge.listener_count::<Navigate>(), 0);

        bridge.emit::<Navigate>(NavigateRequest::to(SceneKind::World));
        run_frames(&mut renderer, 20);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn destroy_releases_listener_and_nodes() {
        let mut h = harness();
        h.bridge.emit::<Navigate>(NavigateRequest::to(SceneKind::World));
        settle(&mut h.renderer);

        h.renderer.destroy();

        assert_eq!(h.bridge.listener_count::<Navigate>(), 0);
        assert_eq!(h.renderer.tree().node_count(), 1);
        assert!(h.log.borrow().iter().any(|entry| entry == "teardown:world"));
    }
}
