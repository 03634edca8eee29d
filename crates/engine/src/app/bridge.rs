use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::state::SceneKind;

/// A named bridge channel and the payload type carried on it.
///
/// Channels need no registration: a channel nobody listens to simply has
/// zero handlers when emitted.
pub trait Channel: 'static {
    const NAME: &'static str;
    type Payload: 'static;
}

type Handler<P> = Box<dyn Fn(&P)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    handler: Rc<dyn Any>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    channels: HashMap<&'static str, Vec<Listener>>,
}

/// Session-scoped publish/subscribe bus shared by the UI layer and the renderer.
///
/// Cloning is cheap and every clone refers to the same listener registry.
#[derive(Clone, Default)]
pub struct GameBridge {
    registry: Rc<RefCell<Registry>>,
}

impl fmt::Debug for GameBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.borrow();
        let listener_count: usize = registry.channels.values().map(Vec::len).sum();
        f.debug_struct("GameBridge")
            .field("channels", &registry.channels.len())
            .field("listeners", &listener_count)
            .finish()
    }
}

impl GameBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` on channel `C`; the returned subscription removes
    /// exactly this handler.
    pub fn on<C, F>(&self, handler: F) -> Subscription
    where
        C: Channel,
        F: Fn(&C::Payload) + 'static,
    {
        let boxed: Handler<C::Payload> = Box::new(handler);
        let mut registry = self.registry.borrow_mut();
        let id = ListenerId(registry.next_id);
        registry.next_id = registry.next_id.saturating_add(1);
        registry.channels.entry(C::NAME).or_default().push(Listener {
            id,
            handler: Rc::new(boxed),
        });
        Subscription {
            registry: Rc::downgrade(&self.registry),
            channel: C::NAME,
            id,
        }
    }

    /// Calls every handler registered on `C` in registration order.
    ///
    /// The handler list is snapshotted first, so handlers may subscribe,
    /// unsubscribe or emit re-entrantly; such changes apply to the next emit.
    /// A panicking handler is not isolated from the others or from the caller.
    pub fn emit<C: Channel>(&self, payload: C::Payload) {
        let handlers: Vec<Rc<dyn Any>> = {
            let registry = self.registry.borrow();
            match registry.channels.get(C::NAME) {
                Some(listeners) => listeners
                    .iter()
                    .map(|listener| Rc::clone(&listener.handler))
                    .collect(),
                None => return,
            }
        };
        for handler in handlers {
            match handler.downcast_ref::<Handler<C::Payload>>() {
                Some(handler) => handler(&payload),
                None => debug!(channel = C::NAME, "bridge_payload_type_mismatch"),
            }
        }
    }

    pub fn listener_count<C: Channel>(&self) -> usize {
        self.registry
            .borrow()
            .channels
            .get(C::NAME)
            .map_or(0, Vec::len)
    }

    pub fn total_listener_count(&self) -> usize {
        self.registry.borrow().channels.values().map(Vec::len).sum()
    }

    /// Drops every registration on every channel.
    pub fn remove_all(&self) {
        self.registry.borrow_mut().channels.clear();
    }
}

/// Handle returned by [`GameBridge::on`]. Dropping it keeps the handler
/// registered; call [`Subscription::unsubscribe`] to remove it.
#[derive(Debug)]
#[must_use = "dropping a subscription leaves the handler registered"]
pub struct Subscription {
    registry: Weak<RefCell<Registry>>,
    channel: &'static str,
    id: ListenerId,
}

impl Subscription {
    pub fn channel(&self) -> &'static str {
        self.channel
    }

    pub fn unsubscribe(self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry.borrow_mut();
        if let Some(listeners) = registry.channels.get_mut(self.channel) {
            listeners.retain(|listener| listener.id != self.id);
            if listeners.is_empty() {
                registry.channels.remove(self.channel);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocusPoint {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavigateRequest {
    pub scene: SceneKind,
    pub target_id: Option<String>,
    pub focus_point: Option<FocusPoint>,
}

impl NavigateRequest {
    pub fn to(scene: SceneKind) -> Self {
        Self {
            scene,
            target_id: None,
            focus_point: None,
        }
    }

    pub fn with_target(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    pub fn with_focus(mut self, focus_point: FocusPoint) -> Self {
        self.focus_point = Some(focus_point);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Building,
    Character,
    Door,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityClicked {
    pub id: String,
    pub entity_type: EntityType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FadeDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestFade {
    pub direction: FadeDirection,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerMoved {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraChanged {
    pub x: f32,
    pub y: f32,
    pub zoom: f32,
}

/// UI -> renderer: request a scene transition.
pub enum Navigate {}
/// Renderer -> UI: an interactive entity was clicked.
pub enum EntityClickedChannel {}
/// Renderer -> UI: drive the fade overlay.
pub enum RequestFadeChannel {}
/// Renderer -> UI: background click in world coordinates.
pub enum PlayerMovedChannel {}
/// Renderer -> UI: camera pose after a user pan or zoom settles.
pub enum CameraChangedChannel {}

impl Channel for Navigate {
    const NAME: &'static str = "navigate";
    type Payload = NavigateRequest;
}

impl Channel for EntityClickedChannel {
    const NAME: &'static str = "entityClicked";
    type Payload = EntityClicked;
}

impl Channel for RequestFadeChannel {
    const NAME: &'static str = "requestFade";
    type Payload = RequestFade;
}

impl Channel for PlayerMovedChannel {
    const NAME: &'static str = "playerMoved";
    type Payload = PlayerMoved;
}

impl Channel for CameraChangedChannel {
    const NAME: &'static str = "cameraChanged";
    type Payload = CameraChanged;
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    enum Ping {}

    impl Channel for Ping {
        const NAME: &'static str = "ping";
        type Payload = u32;
    }

    #[test]
    fn emit_calls_handlers_in_registration_order() {
        let bridge = GameBridge::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for tag in ["a", "b", "c"] {
            let seen = Rc::clone(&seen);
            let _ = bridge.on::<Ping, _>(move |value| seen.borrow_mut().push((tag, *value)));
        }

        bridge.emit::<Ping>(7);

        assert_eq!(*seen.borrow(), vec![("a", 7), ("b", 7), ("c", 7)]);
    }

    #[test]
    fn emit_on_unknown_channel_is_a_no_op() {
        let bridge = GameBridge::new();
        bridge.emit::<Ping>(1);
        assert_eq!(bridge.listener_count::<Ping>(), 0);
    }

    #[test]
    fn unsubscribe_removes_exactly_one_handler() {
        let bridge = GameBridge::new();
        let count = Rc::new(RefCell::new(0u32));
        let first = {
            let count = Rc::clone(&count);
            bridge.on::<Ping, _>(move |_| *count.borrow_mut() += 1)
        };
        let _second = {
            let count = Rc::clone(&count);
            bridge.on::<Ping, _>(move |_| *count.borrow_mut() += 10)
        };

        first.unsubscribe();
        bridge.emit::<Ping>(0);

        assert_eq!(*count.borrow(), 10);
        assert_eq!(bridge.listener_count::<Ping>(), 1);
    }

    #[test]
    fn remove_all_drops_every_channel() {
        let bridge = GameBridge::new();
        let _a = bridge.on::<Ping, _>(|_| {});
        let _b = bridge.on::<PlayerMovedChannel, _>(|_| {});
        assert_eq!(bridge.total_listener_count(), 2);

        bridge.remove_all();

        assert_eq!(bridge.total_listener_count(), 0);
    }

    #[test]
    fn handler_registered_during_emit_runs_from_next_emit() {
        let bridge = GameBridge::new();
        let hits = Rc::new(RefCell::new(0u32));
        let late_subs = Rc::new(RefCell::new(Vec::new()));
        {
            let bridge_inner = bridge.clone();
            let hits = Rc::clone(&hits);
            let late_subs = Rc::clone(&late_subs);
            let _ = bridge.on::<Ping, _>(move |_| {
                let hits = Rc::clone(&hits);
                let sub = bridge_inner.on::<Ping, _>(move |_| *hits.borrow_mut() += 1);
                late_subs.borrow_mut().push(sub);
            });
        }

        bridge.emit::<Ping>(0);
        assert_eq!(*hits.borrow(), 0);

        bridge.emit::<Ping>(0);
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn unsubscribe_after_bridge_dropped_is_harmless() {
        let bridge = GameBridge::new();
        let sub = bridge.on::<Ping, _>(|_| {});
        drop(bridge);
        sub.unsubscribe();
    }

    #[test]
    fn payload_is_passed_unmodified() {
        let bridge = GameBridge::new();
        let seen = Rc::new(RefCell::new(None));
        {
            let seen = Rc::clone(&seen);
            let _ = bridge.on::<EntityClickedChannel, _>(move |payload| {
                *seen.borrow_mut() = Some(payload.clone());
            });
        }

        bridge.emit::<EntityClickedChannel>(EntityClicked {
            id: "hub-main".to_string(),
            entity_type: EntityType::Building,
        });

        let seen = seen.borrow().clone().expect("payload");
        assert_eq!(seen.id, "hub-main");
        assert_eq!(seen.entity_type, EntityType::Building);
    }
}
