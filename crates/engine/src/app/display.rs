//! Arena-backed display tree. Nodes are addressed by [`NodeId`] handles that
//! are never reused; destroying a node destroys its whole subtree.

use std::collections::HashMap;

use tracing::warn;

use super::bridge::EntityType;
use crate::assets::TextureHandle;

pub type Color = [u8; 4];

pub const fn rgb(hex: u32) -> Color {
    [(hex >> 16) as u8, (hex >> 8) as u8, hex as u8, 255]
}

pub fn with_alpha(color: Color, alpha: f32) -> Color {
    let a = (alpha.clamp(0.0, 1.0) * color[3] as f32).round() as u8;
    [color[0], color[1], color[2], a]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

/// Source rectangle inside a texture, in texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Group,
    /// `anchor` is the normalised point of the frame placed at the node origin.
    Sprite {
        texture: TextureHandle,
        frame: Option<FrameRect>,
        anchor: (f32, f32),
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Option<Color>,
        stroke: Option<Color>,
    },
    Ellipse {
        cx: f32,
        cy: f32,
        rx: f32,
        ry: f32,
        fill: Color,
    },
    /// Pixel-font text centred on the node origin.
    Label { text: String, color: Color },
}

/// Local-space rectangle used for pointer hit tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl HitRect {
    fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub id: String,
    pub entity_type: EntityType,
    pub hit: HitRect,
    pub hover_outline: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub x: f32,
    pub y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub alpha: f32,
    pub visible: bool,
    pub kind: NodeKind,
    pub interaction: Option<Interaction>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    seq: u64,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            alpha: 1.0,
            visible: true,
            kind,
            interaction: None,
            parent: None,
            children: Vec::new(),
            seq: 0,
        }
    }

    pub fn group() -> Self {
        Self::new(NodeKind::Group)
    }

    pub fn rect(x: f32, y: f32, width: f32, height: f32, fill: Color) -> Self {
        Self::new(NodeKind::Rect {
            x,
            y,
            width,
            height,
            fill: Some(fill),
            stroke: None,
        })
    }

    pub fn outline(x: f32, y: f32, width: f32, height: f32, stroke: Color) -> Self {
        Self::new(NodeKind::Rect {
            x,
            y,
            width,
            height,
            fill: None,
            stroke: Some(stroke),
        })
    }

    pub fn ellipse(cx: f32, cy: f32, rx: f32, ry: f32, fill: Color) -> Self {
        Self::new(NodeKind::Ellipse {
            cx,
            cy,
            rx,
            ry,
            fill,
        })
    }

    pub fn sprite(texture: TextureHandle, anchor: (f32, f32)) -> Self {
        Self::new(NodeKind::Sprite {
            texture,
            frame: None,
            anchor,
        })
    }

    pub fn label(text: impl Into<String>, color: Color) -> Self {
        Self::new(NodeKind::Label {
            text: text.into(),
            color,
        })
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_scale(mut self, scale_x: f32, scale_y: f32) -> Self {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        self
    }

    pub fn with_stroke(mut self, color: Color) -> Self {
        if let NodeKind::Rect { stroke, .. } = &mut self.kind {
            *stroke = Some(color);
        }
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Accumulated world-space placement of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldPlacement {
    pub x: f32,
    pub y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub alpha: f32,
}

impl WorldPlacement {
    const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        scale_x: 1.0,
        scale_y: 1.0,
        alpha: 1.0,
    };

    fn child(&self, node: &Node) -> Self {
        Self {
            x: self.x + node.x * self.scale_x,
            y: self.y + node.y * self.scale_y,
            scale_x: self.scale_x * node.scale_x,
            scale_y: self.scale_y * node.scale_y,
            alpha: self.alpha * node.alpha,
        }
    }

    pub fn apply(&self, local_x: f32, local_y: f32) -> (f32, f32) {
        (
            self.x + local_x * self.scale_x,
            self.y + local_y * self.scale_y,
        )
    }
}

#[derive(Debug)]
pub struct DisplayTree {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    next_id: u64,
}

impl Default for DisplayTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayTree {
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(root, Node::group());
        Self {
            nodes,
            root,
            next_id: 1,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let parent = if self.nodes.contains_key(&parent) {
            parent
        } else {
            warn!(parent = parent.0, "display_parent_missing");
            self.root
        };
        let id = NodeId(self.next_id);
        self.next_id += 1;
        node.parent = Some(parent);
        node.children.clear();
        node.seq = id.0;
        self.nodes.insert(id, node);
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.push(id);
        }
        id
    }

    /// Removes the node and its subtree. Destroying the root only clears it.
    pub fn destroy(&mut self, id: NodeId) -> bool {
        if id == self.root {
            self.clear_children(id);
            return true;
        }
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        if let Some(parent) = node.parent {
            if let Some(parent_node) = self.nodes.get_mut(&parent) {
                parent_node.children.retain(|child| *child != id);
            }
        }
        self.remove_subtree(id);
        true
    }

    pub fn clear_children(&mut self, id: NodeId) {
        let children = match self.nodes.get_mut(&id) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        for child in children {
            self.remove_subtree(child);
        }
    }

    fn remove_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children);
            }
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn children_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    /// Total live nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn set_position(&mut self, id: NodeId, x: f32, y: f32) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.x = x;
            node.y = y;
        }
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.visible = visible;
        }
    }

    /// Painter's order by `y`, ties kept in insertion order.
    pub fn sort_children_by_y(&mut self, parent: NodeId) {
        let Some(parent_node) = self.nodes.get(&parent) else {
            return;
        };
        let mut keyed: Vec<(f32, u64, NodeId)> = parent_node
            .children
            .iter()
            .filter_map(|child| self.nodes.get(child).map(|node| (node.y, node.seq, *child)))
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children = keyed.into_iter().map(|(_, _, id)| id).collect();
        }
    }

    pub fn placement(&self, id: NodeId) -> Option<WorldPlacement> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.nodes.get(&current)?;
            chain.push(node);
            cursor = node.parent;
        }
        Some(
            chain
                .iter()
                .rev()
                .fold(WorldPlacement::IDENTITY, |acc, node| acc.child(node)),
        )
    }

    /// Visits visible nodes in draw order (parents before children, siblings
    /// in child order).
    pub fn visit_visible(&self, mut visit: impl FnMut(NodeId, &Node, WorldPlacement)) {
        let mut stack = vec![(self.root, WorldPlacement::IDENTITY)];
        while let Some((id, parent_placement)) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            if !node.visible || node.alpha <= 0.0 {
                continue;
            }
            let placement = parent_placement.child(node);
            visit(id, node, placement);
            for child in node.children.iter().rev() {
                stack.push((*child, placement));
            }
        }
    }

    /// Topmost visible interactive node whose hit rectangle contains the
    /// world-space point.
    pub fn pick(&self, world_x: f32, world_y: f32) -> Option<(NodeId, &Interaction)> {
        let mut hit = None;
        self.visit_visible(|id, node, placement| {
            let Some(interaction) = node.interaction.as_ref() else {
                return;
            };
            if placement.scale_x == 0.0 || placement.scale_y == 0.0 {
                return;
            }
            let local_x = (world_x - placement.x) / placement.scale_x;
            let local_y = (world_y - placement.y) / placement.scale_y;
            if interaction.hit.contains(local_x, local_y) {
                hit = Some(id);
            }
        });
        let id = hit?;
        let interaction = self.nodes.get(&id)?.interaction.as_ref()?;
        Some((id, interaction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interactive(id: &str, size: f32) -> Interaction {
        Interaction {
            id: id.to_string(),
            entity_type: EntityType::Building,
            hit: HitRect {
                x: -size / 2.0,
                y: -size,
                width: size,
                height: size,
            },
            hover_outline: None,
        }
    }

    #[test]
    fn destroy_cascades_to_descendants() {
        let mut tree = DisplayTree::new();
        let root = tree.root();
        let layer = tree.add_child(root, Node::group());
        let sprite = tree.add_child(layer, Node::group());
        let shadow = tree.add_child(sprite, Node::ellipse(0.0, 0.0, 4.0, 2.0, rgb(0)));

        assert!(tree.destroy(layer));

        assert!(!tree.contains(sprite));
        assert!(!tree.contains(shadow));
        assert_eq!(tree.children_count(root), 0);
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn ids_are_not_reused_after_destroy() {
        let mut tree = DisplayTree::new();
        let root = tree.root();
        let first = tree.add_child(root, Node::group());
        tree.destroy(first);
        let second = tree.add_child(root, Node::group());
        assert_ne!(first, second);
        assert!(tree.get(first).is_none());
    }

    #[test]
    fn y_sort_breaks_ties_by_insertion_order() {
        let mut tree = DisplayTree::new();
        let root = tree.root();
        let low = tree.add_child(root, Node::group().at(0.0, 300.0));
        let tie_a = tree.add_child(root, Node::group().at(10.0, 100.0));
        let high = tree.add_child(root, Node::group().at(0.0, 50.0));
        let tie_b = tree.add_child(root, Node::group().at(-10.0, 100.0));

        tree.sort_children_by_y(root);

        assert_eq!(tree.children(root), &[high, tie_a, tie_b, low]);
    }

    #[test]
    fn placement_accumulates_parent_scale() {
        let mut tree = DisplayTree::new();
        let root = tree.root();
        let parent = tree.add_child(root, Node::group().at(100.0, 50.0).with_scale(2.0, 2.0));
        let child = tree.add_child(parent, Node::group().at(5.0, -3.0).with_alpha(0.5));

        let placement = tree.placement(child).expect("placement");
        assert_eq!((placement.x, placement.y), (110.0, 44.0));
        assert_eq!(placement.scale_x, 2.0);
        assert_eq!(placement.alpha, 0.5);
    }

    #[test]
    fn pick_returns_topmost_in_draw_order() {
        let mut tree = DisplayTree::new();
        let root = tree.root();
        let mut back = Node::group().at(100.0, 100.0);
        back.interaction = Some(interactive("back", 40.0));
        let mut front = Node::group().at(110.0, 100.0);
        front.interaction = Some(interactive("front", 40.0));
        tree.add_child(root, back);
        let front_id = tree.add_child(root, front);

        let (id, interaction) = tree.pick(105.0, 90.0).expect("hit");
        assert_eq!(id, front_id);
        assert_eq!(interaction.id, "front");
        assert!(tree.pick(300.0, 300.0).is_none());
    }

    #[test]
    fn pick_skips_hidden_subtrees() {
        let mut tree = DisplayTree::new();
        let root = tree.root();
        let layer = tree.add_child(root, Node::group().hidden());
        let mut node = Node::group();
        node.interaction = Some(interactive("ghost", 20.0));
        tree.add_child(layer, node);

        assert!(tree.pick(0.0, -5.0).is_none());
    }

    #[test]
    fn with_alpha_scales_channel() {
        assert_eq!(with_alpha(rgb(0xFF9060), 0.5), [0xFF, 0x90, 0x60, 128]);
    }
}
