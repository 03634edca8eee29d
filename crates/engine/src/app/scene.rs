use thiserror::Error;
use tracing::debug;

use super::bridge::{GameBridge, Subscription};
use super::display::{DisplayTree, Node, NodeId};
use super::sprites::CharacterFactory;
use super::state::{SceneKind, WorldState};
use crate::assets::{AssetError, TextureRegistry};

#[derive(Debug, Error)]
pub enum SceneError {
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Shared resources a scene builds into. `layer` is the renderer-owned node
/// every scene container is attached to.
pub struct SceneContext<'a> {
    pub tree: &'a mut DisplayTree,
    pub textures: &'a TextureRegistry,
    pub bridge: &'a GameBridge,
    pub factory: &'a mut CharacterFactory,
    pub layer: NodeId,
}

/// One self-contained visual mode. Exactly one is active at a time; a
/// switch tears the old one down completely before the next is set up.
pub trait Scene {
    /// Builds the whole subtree. An unresolvable target builds an empty
    /// scene instead of failing; a missing texture is an error.
    fn setup(&mut self, ctx: &mut SceneContext<'_>) -> Result<(), SceneError>;
    /// Per-frame work with `dt` in 60 Hz frames.
    fn update(&mut self, dt: f32, ctx: &mut SceneContext<'_>);
    /// Must be idempotent: repeated calls never duplicate the player.
    fn sync_state(&mut self, state: &WorldState, ctx: &mut SceneContext<'_>);
    /// Releases every node and bridge listener the scene owns.
    fn teardown(&mut self, tree: &mut DisplayTree);
    fn scene_size(&self) -> (f32, f32);
    fn container(&self) -> Option<NodeId>;
    fn debug_name(&self) -> &'static str;
}

/// Builds the scene for a navigation target. `Login` has no scene.
pub trait SceneFactory {
    fn create(&self, kind: SceneKind, target_id: Option<&str>) -> Option<Box<dyn Scene>>;
}

/// Container and listener bookkeeping shared by concrete scenes.
#[derive(Debug, Default)]
pub struct SceneBase {
    container: Option<NodeId>,
    subscriptions: Vec<Subscription>,
}

impl SceneBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the scene container under the shared layer. Calling it again
    /// replaces the previous container.
    pub fn attach(&mut self, tree: &mut DisplayTree, layer: NodeId) -> NodeId {
        if let Some(previous) = self.container.take() {
            tree.destroy(previous);
        }
        let container = tree.add_child(layer, Node::group());
        self.container = Some(container);
        container
    }

    pub fn container(&self) -> Option<NodeId> {
        self.container
    }

    pub fn track(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    pub fn listener_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn teardown(&mut self, tree: &mut DisplayTree, scene: &'static str) {
        let listeners = self.subscriptions.len();
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
        let destroyed = self
            .container
            .take()
            .map(|container| tree.destroy(container))
            .unwrap_or(false);
        debug!(scene, listeners, destroyed, "scene_teardown");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::bridge::{PlayerMoved, PlayerMovedChannel};

    #[test]
    fn teardown_empties_layer_and_unsubscribes() {
        let bridge = GameBridge::new();
        let mut tree = DisplayTree::new();
        let root = tree.root();
        let layer = tree.add_child(root, Node::group());
        let mut base = SceneBase::new();

        let container = base.attach(&mut tree, layer);
        tree.add_child(container, Node::group());
        base.track(bridge.on::<PlayerMovedChannel, _>(|_: &PlayerMoved| {}));
        assert_eq!(bridge.listener_count::<PlayerMovedChannel>(), 1);

        base.teardown(&mut tree, "test");

        assert_eq!(tree.children_count(layer), 0);
        assert!(!tree.contains(container));
        assert_eq!(bridge.listener_count::<PlayerMovedChannel>(), 0);
        assert!(base.container().is_none());
    }

    #[test]
    fn reattach_replaces_container() {
        let mut tree = DisplayTree::new();
        let root = tree.root();
        let mut base = SceneBase::new();
        let first = base.attach(&mut tree, root);
        let second = base.attach(&mut tree, root);

        assert_ne!(first, second);
        assert_eq!(tree.children(root), &[second]);
    }
}
