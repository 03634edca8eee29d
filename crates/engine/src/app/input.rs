use tracing::debug;

use super::bridge::{
    CameraChanged, CameraChangedChannel, EntityClicked, EntityClickedChannel, GameBridge,
    PlayerMoved, PlayerMovedChannel,
};
use super::camera::Camera;
use super::display::{DisplayTree, NodeId};

/// Per-axis screen distance a press must travel before it counts as a drag.
pub const DRAG_THRESHOLD_PX: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    Pressed { start_x: f32, start_y: f32 },
    /// Anchor is the previous pointer sample; motion is frame-relative.
    Dragging { anchor_x: f32, anchor_y: f32 },
}

/// What a pointer release resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerRelease {
    Ignored,
    Clicked(EntityClicked),
    Background(PlayerMoved),
    DragEnded,
}

/// Turns raw pointer and wheel samples into camera moves and click events.
#[derive(Debug)]
pub struct InputManager {
    gesture: Gesture,
    hovered: Option<NodeId>,
    attached: bool,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            gesture: Gesture::Idle,
            hovered: None,
            attached: true,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Dragging { .. })
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        if !self.attached {
            return;
        }
        self.gesture = Gesture::Pressed {
            start_x: x,
            start_y: y,
        };
    }

    pub fn pointer_move(&mut self, x: f32, y: f32, camera: &mut Camera, tree: &mut DisplayTree) {
        if !self.attached {
            return;
        }
        match self.gesture {
            Gesture::Idle => self.update_hover(x, y, camera, tree),
            Gesture::Pressed { start_x, start_y } => {
                let dx = x - start_x;
                let dy = y - start_y;
                if dx.abs() >= DRAG_THRESHOLD_PX || dy.abs() >= DRAG_THRESHOLD_PX {
                    camera.move_by(dx, dy);
                    self.gesture = Gesture::Dragging {
                        anchor_x: x,
                        anchor_y: y,
                    };
                    self.set_hover(None, tree);
                }
            }
            Gesture::Dragging { anchor_x, anchor_y } => {
                camera.move_by(x - anchor_x, y - anchor_y);
                self.gesture = Gesture::Dragging {
                    anchor_x: x,
                    anchor_y: y,
                };
            }
        }
    }

    /// Resolves the gesture. A press that never crossed the threshold is a
    /// click: on an interactive entity it emits `entityClicked`, otherwise
    /// `playerMoved` with the world-space position.
    pub fn pointer_up(
        &mut self,
        x: f32,
        y: f32,
        camera: &Camera,
        tree: &DisplayTree,
        bridge: &GameBridge,
    ) -> PointerRelease {
        if !self.attached {
            return PointerRelease::Ignored;
        }
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        match gesture {
            Gesture::Idle => PointerRelease::Ignored,
            Gesture::Dragging { .. } => {
                publish_camera(camera, bridge);
                PointerRelease::DragEnded
            }
            Gesture::Pressed { .. } => {
                let (world_x, world_y) = camera.transform().screen_to_world(x, y);
                if let Some((_, interaction)) = tree.pick(world_x, world_y) {
                    let clicked = EntityClicked {
                        id: interaction.id.clone(),
                        entity_type: interaction.entity_type,
                    };
                    debug!(id = clicked.id.as_str(), kind = ?clicked.entity_type, "entity_clicked");
                    bridge.emit::<EntityClickedChannel>(clicked.clone());
                    PointerRelease::Clicked(clicked)
                } else {
                    let moved = PlayerMoved {
                        x: world_x,
                        y: world_y,
                    };
                    bridge.emit::<PlayerMovedChannel>(moved);
                    PointerRelease::Background(moved)
                }
            }
        }
    }

    /// Pointer left the surface. A drag in progress ends as if released,
    /// so `cameraChanged` still fires; a pending press never becomes a click.
    pub fn pointer_cancel(&mut self, camera: &Camera, bridge: &GameBridge) -> PointerRelease {
        if !self.attached {
            return PointerRelease::Ignored;
        }
        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Dragging { .. } => {
                publish_camera(camera, bridge);
                PointerRelease::DragEnded
            }
            Gesture::Idle | Gesture::Pressed { .. } => PointerRelease::Ignored,
        }
    }

    pub fn wheel(&mut self, delta_y: f32, x: f32, y: f32, camera: &mut Camera, bridge: &GameBridge) {
        if !self.attached || delta_y == 0.0 {
            return;
        }
        camera.adjust_zoom(delta_y, x, y);
        publish_camera(camera, bridge);
    }

    /// Forgets hover state, e.g. after the scene holding the hovered node
    /// was torn down.
    pub fn reset_hover(&mut self) {
        self.hovered = None;
    }

    /// Stops reacting to any further input.
    pub fn detach(&mut self) {
        self.attached = false;
        self.gesture = Gesture::Idle;
        self.hovered = None;
    }

    fn update_hover(&mut self, x: f32, y: f32, camera: &Camera, tree: &mut DisplayTree) {
        let (world_x, world_y) = camera.transform().screen_to_world(x, y);
        let next = tree.pick(world_x, world_y).map(|(id, _)| id);
        self.set_hover(next, tree);
    }

    fn set_hover(&mut self, next: Option<NodeId>, tree: &mut DisplayTree) {
        if self.hovered == next {
            return;
        }
        if let Some(previous) = self.hovered.take() {
            toggle_outline(tree, previous, false);
        }
        if let Some(next) = next {
            toggle_outline(tree, next, true);
        }
        self.hovered = next;
    }
}

fn publish_camera(camera: &Camera, bridge: &GameBridge) {
    let target = camera.target();
    bridge.emit::<CameraChangedChannel>(CameraChanged {
        x: target.x,
        y: target.y,
        zoom: target.zoom,
    });
}

fn toggle_outline(tree: &mut DisplayTree, id: NodeId, visible: bool) {
    let outline = tree
        .get(id)
        .and_then(|node| node.interaction.as_ref())
        .and_then(|interaction| interaction.hover_outline);
    if let Some(outline) = outline {
        tree.set_visible(outline, visible);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::app::bridge::EntityType;
    use crate::app::display::{rgb, HitRect, Interaction, Node};

    fn camera() -> Camera {
        let mut camera = Camera::default();
        camera.set_viewport(400.0, 300.0);
        camera.set_bounds(0.0, 0.0, 1000.0, 1000.0);
        camera.snap_to(500.0, 500.0, Some(1.0));
        camera.update(0.0);
        camera
    }

    fn record<C: crate::app::bridge::Channel>(bridge: &GameBridge) -> Rc<RefCell<Vec<C::Payload>>>
    where
        C::Payload: Clone,
    {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _ = bridge.on::<C, _>(move |payload| sink.borrow_mut().push(payload.clone()));
        seen
    }

    #[test]
    fn small_wiggle_is_a_click_in_world_space() {
        let bridge = GameBridge::new();
        let moved = record::<PlayerMovedChannel>(&bridge);
        let mut camera = camera();
        let mut tree = DisplayTree::new();
        let mut input = InputManager::new();

        input.pointer_down(200.0, 150.0);
        input.pointer_move(203.0, 146.0, &mut camera, &mut tree);
        let release = input.pointer_up(203.0, 146.0, &camera, &tree, &bridge);

        assert!(matches!(release, PointerRelease::Background(_)));
        let moved = moved.borrow();
        assert_eq!(moved.len(), 1);
        assert!((moved[0].x - 503.0).abs() < 1e-3);
        assert!((moved[0].y - 496.0).abs() < 1e-3);
    }

    #[test]
    fn drag_past_threshold_moves_camera_and_suppresses_click() {
        let bridge = GameBridge::new();
        let moved = record::<PlayerMovedChannel>(&bridge);
        let clicked = record::<EntityClickedChannel>(&bridge);
        let mut camera = camera();
        let mut tree = DisplayTree::new();
        let mut input = InputManager::new();

        input.pointer_down(200.0, 150.0);
        input.pointer_move(204.0, 150.0, &mut camera, &mut tree);
        assert!(!input.is_dragging());
        input.pointer_move(205.0, 150.0, &mut camera, &mut tree);
        assert!(input.is_dragging());
        input.pointer_move(215.0, 150.0, &mut camera, &mut tree);
        let release = input.pointer_up(215.0, 150.0, &camera, &tree, &bridge);

        assert_eq!(release, PointerRelease::DragEnded);
        assert!(!input.is_dragging());
        assert!(moved.borrow().is_empty());
        assert!(clicked.borrow().is_empty());
        assert!((camera.target().x - 485.0).abs() < 1e-3);
    }

    #[test]
    fn drag_motion_is_frame_relative() {
        let mut camera = camera();
        let mut tree = DisplayTree::new();
        let mut input = InputManager::new();

        input.pointer_down(100.0, 100.0);
        for step in 1..=4 {
            input.pointer_move(100.0, 100.0 + step as f32 * 10.0, &mut camera, &mut tree);
        }

        assert!((camera.target().y - 460.0).abs() < 1e-3);
    }

    #[test]
    fn click_on_interactive_node_emits_entity_clicked() {
        let bridge = GameBridge::new();
        let clicked = record::<EntityClickedChannel>(&bridge);
        let moved = record::<PlayerMovedChannel>(&bridge);
        let camera = camera();
        let mut tree = DisplayTree::new();
        let mut node = Node::group().at(500.0, 500.0);
        node.interaction = Some(Interaction {
            id: "hub-main".to_string(),
            entity_type: EntityType::Building,
            hit: HitRect {
                x: -20.0,
                y: -40.0,
                width: 40.0,
                height: 40.0,
            },
            hover_outline: None,
        });
        let root = tree.root();
        tree.add_child(root, node);
        let mut input = InputManager::new();

        input.pointer_down(200.0, 140.0);
        input.pointer_up(200.0, 140.0, &camera, &tree, &bridge);

        assert_eq!(
            clicked.borrow().as_slice(),
            &[EntityClicked {
                id: "hub-main".to_string(),
                entity_type: EntityType::Building,
            }]
        );
        assert!(moved.borrow().is_empty());
    }

    #[test]
    fn hover_toggles_outline_visibility() {
        let mut camera = camera();
        let mut tree = DisplayTree::new();
        let root = tree.root();
        let sprite = tree.add_child(root, Node::group().at(500.0, 500.0));
        let outline = tree.add_child(sprite, Node::outline(-23.0, -33.0, 46.0, 46.0, rgb(0xFFD050)).hidden());
        if let Some(node) = tree.get_mut(sprite) {
            node.interaction = Some(Interaction {
                id: "room-a".to_string(),
                entity_type: EntityType::Door,
                hit: HitRect {
                    x: -20.0,
                    y: -30.0,
                    width: 40.0,
                    height: 40.0,
                },
                hover_outline: Some(outline),
            });
        }
        let mut input = InputManager::new();

        input.pointer_move(200.0, 140.0, &mut camera, &mut tree);
        assert_eq!(tree.get(outline).map(|node| node.visible), Some(true));

        input.pointer_move(20.0, 20.0, &mut camera, &mut tree);
        assert_eq!(tree.get(outline).map(|node| node.visible), Some(false));
        assert!(input.hovered().is_none());
    }

    #[test]
    fn detached_manager_ignores_everything() {
        let bridge = GameBridge::new();
        let moved = record::<PlayerMovedChannel>(&bridge);
        let mut camera = camera();
        let tree = DisplayTree::new();
        let mut input = InputManager::new();
        assert!(input.is_attached());
        input.detach();
        assert!(!input.is_attached());

        input.pointer_down(10.0, 10.0);
        input.wheel(-1.0, 10.0, 10.0, &mut camera, &bridge);
        let release = input.pointer_up(10.0, 10.0, &camera, &tree, &bridge);

        assert_eq!(release, PointerRelease::Ignored);
        assert!(moved.borrow().is_empty());
        assert_eq!(camera.target().zoom, 1.0);
    }

    #[test]
    fn leaving_the_surface_mid_drag_still_publishes_the_camera() {
        let bridge = GameBridge::new();
        let changed = record::<CameraChangedChannel>(&bridge);
        let moved = record::<PlayerMovedChannel>(&bridge);
        let mut camera = camera();
        let mut tree = DisplayTree::new();
        let mut input = InputManager::new();

        input.pointer_down(200.0, 150.0);
        input.pointer_move(200.0, 170.0, &mut camera, &mut tree);
        let release = input.pointer_cancel(&camera, &bridge);

        assert_eq!(release, PointerRelease::DragEnded);
        assert!(!input.is_dragging());
        let changed = changed.borrow();
        assert_eq!(changed.len(), 1);
        assert!((changed[0].y - 480.0).abs() < 1e-3);
        assert!(moved.borrow().is_empty());
    }

    #[test]
    fn leaving_the_surface_before_a_drag_drops_the_press() {
        let bridge = GameBridge::new();
        let changed = record::<CameraChangedChannel>(&bridge);
        let moved = record::<PlayerMovedChannel>(&bridge);
        let camera = camera();
        let tree = DisplayTree::new();
        let mut input = InputManager::new();

        input.pointer_down(200.0, 150.0);
        assert_eq!(input.pointer_cancel(&camera, &bridge), PointerRelease::Ignored);
        let release = input.pointer_up(200.0, 150.0, &camera, &tree, &bridge);

        assert_eq!(release, PointerRelease::Ignored);
        assert!(changed.borrow().is_empty());
        assert!(moved.borrow().is_empty());
    }
}
