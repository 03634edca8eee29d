use std::cell::RefCell;
use std::rc::Rc;

use campus_engine::app::bridge::{
    CameraChanged, CameraChangedChannel, EntityClicked, EntityClickedChannel, EntityType,
    FadeDirection, FocusPoint, Navigate, NavigateRequest, PlayerMovedChannel, RequestFadeChannel,
    Subscription,
};
use campus_engine::app::display::{rgb, with_alpha, Color};
use campus_engine::app::rendering::{paint_veil, text_width, Canvas};
use campus_engine::app::sprites::{building_size, CharacterStatus};
use campus_engine::app::MS_PER_FRAME;
use campus_engine::{AppShell, MetricsHandle, SceneKind, ShellCommand, WorldRenderer, WorldState};
use tracing::{debug, info, warn};

use super::store::{Action, CameraPatch, WorldStore};
use crate::app::scenes::door_anchor;

/// How long the fade overlay takes to reach a new target.
const FADE_MS: f32 = 100.0;
const HUD_HEIGHT: i32 = 20;

const INK: Color = rgb(0x2B2B2B);
const PAPER: Color = rgb(0xF0E8D8);
const ACCENT: Color = rgb(0xFF9060);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ShellSettings {
    /// Address used when the sign-in screen is confirmed.
    pub(crate) login_email: String,
    /// Sign in as soon as the window opens.
    pub(crate) auto_login: bool,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            login_email: "guest@acme.com".to_string(),
            auto_login: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum BridgeEvent {
    Clicked(EntityClicked),
    Fade(FadeDirection),
    BackgroundClicked,
    Camera(CameraChanged),
}

/// Native UI layer: owns the store, turns renderer messages into actions,
/// asks for navigation and paints the chrome around the scene.
pub(crate) struct CampusShell {
    store: WorldStore,
    settings: ShellSettings,
    metrics: MetricsHandle,
    inbox: Rc<RefCell<Vec<BridgeEvent>>>,
    subscriptions: Vec<Subscription>,
    veil: f32,
}

impl CampusShell {
    pub(crate) fn new(store: WorldStore, settings: ShellSettings, metrics: MetricsHandle) -> Self {
        Self {
            store,
            settings,
            metrics,
            inbox: Rc::new(RefCell::new(Vec::new())),
            subscriptions: Vec::new(),
            veil: 0.0,
        }
    }

    pub(crate) fn state(&self) -> &WorldState {
        self.store.state()
    }

    /// Displayed overlay opacity, eased toward `1 - transition.opacity`.
    pub(crate) fn veil(&self) -> f32 {
        self.veil
    }

    fn listen(&mut self, world: &WorldRenderer) {
        let bridge = world.bridge();
        let inbox = Rc::clone(&self.inbox);
        self.subscriptions
            .push(bridge.on::<EntityClickedChannel, _>(move |clicked| {
                inbox.borrow_mut().push(BridgeEvent::Clicked(clicked.clone()));
            }));
        let inbox = Rc::clone(&self.inbox);
        self.subscriptions
            .push(bridge.on::<RequestFadeChannel, _>(move |fade| {
                inbox.borrow_mut().push(BridgeEvent::Fade(fade.direction));
            }));
        let inbox = Rc::clone(&self.inbox);
        self.subscriptions
            .push(bridge.on::<PlayerMovedChannel, _>(move |_| {
                inbox.borrow_mut().push(BridgeEvent::BackgroundClicked);
            }));
        let inbox = Rc::clone(&self.inbox);
        self.subscriptions
            .push(bridge.on::<CameraChangedChannel, _>(move |camera| {
                inbox.borrow_mut().push(BridgeEvent::Camera(*camera));
            }));
    }

    fn login(&mut self, world: &mut WorldRenderer) {
        let email = self.settings.login_email.clone();
        info!(email = email.as_str(), "user_login");
        self.store.dispatch(Action::Login { email });
        self.transition_to(world, SceneKind::World, None, None);
    }

    fn logout(&mut self, world: &mut WorldRenderer) {
        if self.store.state().user.is_none() {
            return;
        }
        info!("user_logout");
        self.store.dispatch(Action::Logout);
        if world.is_initialized() {
            world.bridge().emit::<Navigate>(NavigateRequest::to(SceneKind::Login));
        }
    }

    /// Starts a transition and asks the renderer for it. The store follows
    /// the renderer's fade messages from here on.
    fn transition_to(
        &mut self,
        world: &mut WorldRenderer,
        scene: SceneKind,
        target_id: Option<String>,
        focus_point: Option<FocusPoint>,
    ) {
        self.store.dispatch(Action::StartTransition {
            scene,
            target_id: target_id.clone(),
            focus_point,
        });
        if !world.is_initialized() {
            warn!(scene = %scene, "renderer_uninitialized; navigating without a scene");
            self.store.dispatch(Action::Navigate { scene, target_id });
            self.store.dispatch(Action::CompleteTransition);
            return;
        }
        let mut request = NavigateRequest::to(scene);
        request.target_id = target_id;
        request.focus_point = focus_point;
        world.bridge().emit::<Navigate>(request);
    }

    fn handle(&mut self, event: BridgeEvent, world: &mut WorldRenderer) {
        match event {
            BridgeEvent::Clicked(clicked) => self.on_click(clicked, world),
            BridgeEvent::Fade(FadeDirection::Out) => {
                self.store.dispatch(Action::SetTransitionOpacity(0.0));
            }
            BridgeEvent::Fade(FadeDirection::In) => self.on_fade_in(world),
            BridgeEvent::BackgroundClicked => {
                if self.store.state().selected_character_id.is_some() {
                    self.store.dispatch(Action::CloseCharacter);
                }
            }
            BridgeEvent::Camera(camera) => self.store.dispatch(Action::SetCamera(CameraPatch {
                x: Some(camera.x),
                y: Some(camera.y),
                zoom: Some(camera.zoom),
            })),
        }
    }

    fn on_click(&mut self, clicked: EntityClicked, world: &mut WorldRenderer) {
        debug!(id = clicked.id.as_str(), entity = ?clicked.entity_type, "entity_clicked");
        match clicked.entity_type {
            EntityType::Building => {
                let focus = self.store.roster().building(&clicked.id).map(|building| {
                    let (_, height) = building_size(world.textures(), building.building_type);
                    FocusPoint {
                        x: building.position.x,
                        y: building.position.y - height / 2.0,
                    }
                });
                self.transition_to(world, SceneKind::Building, Some(clicked.id), focus);
            }
            EntityType::Door => {
                let focus = door_anchor(self.store.roster(), &clicked.id)
                    .map(|(x, y)| FocusPoint { x, y });
                self.transition_to(world, SceneKind::Room, Some(clicked.id), focus);
            }
            EntityType::Character => self.store.dispatch(Action::OpenCharacter(clicked.id)),
        }
    }

    /// The renderer has switched scenes. A transition cancelled by logout
    /// is left alone; a queued navigation keeps the transition open.
    fn on_fade_in(&mut self, world: &mut WorldRenderer) {
        if !self.store.state().transition.is_transitioning {
            self.store.dispatch(Action::SetTransitionOpacity(1.0));
            return;
        }
        if let Some(request) = world.last_switch().cloned() {
            self.store.dispatch(Action::Navigate {
                scene: request.scene,
                target_id: request.target_id,
            });
        }
        let pose = world.camera().state();
        self.store.dispatch(Action::SetCamera(CameraPatch {
            x: Some(pose.x),
            y: Some(pose.y),
            zoom: Some(pose.zoom),
        }));
        self.store.dispatch(Action::SetTransitionOpacity(1.0));
        if !world.is_navigating() {
            self.store.dispatch(Action::CompleteTransition);
        }
    }

    fn back(&mut self, world: &mut WorldRenderer) {
        let state = self.store.state();
        if state.selected_character_id.is_some() {
            self.store.dispatch(Action::CloseCharacter);
            return;
        }
        match state.scene {
            SceneKind::Room => {
                let building = state.building_id.clone();
                self.transition_to(world, SceneKind::Building, building, None);
            }
            SceneKind::Building => self.transition_to(world, SceneKind::World, None, None),
            SceneKind::World | SceneKind::Login => {}
        }
    }

    fn ease_veil(&mut self, dt: f32) {
        let target = 1.0 - self.store.state().transition.opacity;
        let step = dt * MS_PER_FRAME / FADE_MS;
        self.veil = if self.veil < target {
            (self.veil + step).min(target)
        } else {
            (self.veil - step).max(target)
        };
    }

    fn paint_login(&self, canvas: &mut Canvas<'_>) {
        let (width, height) = (canvas.width() as i32, canvas.height() as i32);
        canvas.fill_rect(0, 0, width, height, PAPER);
        let (cx, cy) = (width / 2, height / 2);
        canvas.draw_text_centered("CAMPUS", cx, cy - 40, 4, INK);
        canvas.draw_text_centered("PRESS ENTER TO SIGN IN AS", cx, cy + 4, 2, INK);
        canvas.draw_text_centered(&self.settings.login_email, cx, cy + 24, 2, ACCENT);
        canvas.draw_text_centered("ESC TO QUIT", cx, cy + 56, 1, with_alpha(INK, 0.6));
    }

    fn paint_hud(&self, canvas: &mut Canvas<'_>) {
        let state = self.store.state();
        let width = canvas.width() as i32;
        canvas.fill_rect(0, 0, width, HUD_HEIGHT, with_alpha(INK, 0.85));
        canvas.draw_text(&breadcrumb(state), 8, 7, 1, PAPER);

        let fps = self.metrics.snapshot().fps;
        let name = state.user.as_ref().map_or("", |user| user.name.as_str());
        let status = format!("{name}  {fps:.0} FPS  BACKSPACE UP  L LOGOUT");
        let left = width - text_width(&status, 1) - 8;
        canvas.draw_text(&status, left, 7, 1, PAPER);
    }

    fn paint_card(&self, canvas: &mut Canvas<'_>) {
        let Some(id) = self.store.state().selected_character_id.as_deref() else {
            return;
        };
        let (name, kind, status) = match self.store.roster().character(id) {
            Some(occupant) => (
                occupant.name.as_str(),
                if occupant.is_ai { "AI" } else { "HUMAN" },
                status_label(occupant.status),
            ),
            None => (id, "VISITOR", status_label(CharacterStatus::Idle)),
        };
        let left = canvas.width() as i32 - 178;
        let top = HUD_HEIGHT + 10;
        canvas.fill_rect(left, top, 168, 70, PAPER);
        canvas.stroke_rect(left, top, 168, 70, 2, INK);
        canvas.draw_text(name, left + 10, top + 10, 2, INK);
        canvas.draw_text(kind, left + 10, top + 30, 1, ACCENT);
        canvas.draw_text(status, left + 10, top + 42, 1, INK);
        canvas.draw_text("BACKSPACE TO CLOSE", left + 10, top + 56, 1, with_alpha(INK, 0.6));
    }
}

fn status_label(status: CharacterStatus) -> &'static str {
    match status {
        CharacterStatus::Idle => "IDLE",
        CharacterStatus::Working => "WORKING",
        CharacterStatus::Done => "DONE",
        CharacterStatus::Waiting => "WAITING",
    }
}

/// Where the user is, e.g. `Campus / hub-main / lobby`.
pub(crate) fn breadcrumb(state: &WorldState) -> String {
    let building = state.building_id.as_deref().unwrap_or("?");
    match state.scene {
        SceneKind::Login => "Sign in".to_string(),
        SceneKind::World => "Campus".to_string(),
        SceneKind::Building => format!("Campus / {building}"),
        SceneKind::Room => {
            let room = state.room_id.as_deref().unwrap_or("?");
            let short = room.rsplit('-').next().unwrap_or(room);
            format!("Campus / {building} / {short}")
        }
    }
}

impl AppShell for CampusShell {
    fn start(&mut self, world: &mut WorldRenderer) {
        self.listen(world);
        if !world.is_initialized() {
            warn!("shell_started_without_renderer");
        }
        if self.settings.auto_login {
            self.login(world);
        }
        world.sync_state(self.store.state());
        self.store.take_dirty();
    }

    fn command(&mut self, command: ShellCommand, world: &mut WorldRenderer) {
        match command {
            ShellCommand::Confirm => {
                if self.store.state().scene == SceneKind::Login
                    && !self.store.state().transition.is_transitioning
                {
                    self.login(world);
                }
            }
            ShellCommand::Back => self.back(world),
            ShellCommand::Logout => self.logout(world),
        }
    }

    fn tick(&mut self, dt: f32, world: &mut WorldRenderer) {
        let events = std::mem::take(&mut *self.inbox.borrow_mut());
        for event in events {
            self.handle(event, world);
        }
        self.ease_veil(dt);
        if self.store.take_dirty() {
            world.sync_state(self.store.state());
        }
    }

    fn paint(&self, canvas: &mut Canvas<'_>) {
        let state = self.state();
        if state.scene == SceneKind::Login && !leaving_login(state) {
            self.paint_login(canvas);
        } else {
            self.paint_hud(canvas);
            self.paint_card(canvas);
        }
        paint_veil(canvas, PAPER, self.veil());
    }

    fn title(&self) -> Option<String> {
        Some(format!("Campus - {}", breadcrumb(self.state())))
    }

    fn shutdown(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
        info!("shell_shutdown");
    }
}

/// The sign-in screen gives way once the fade toward the first scene starts.
fn leaving_login(state: &WorldState) -> bool {
    state.transition.is_transitioning && state.transition.opacity < 1.0
}
