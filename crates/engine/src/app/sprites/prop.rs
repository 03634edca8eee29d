use crate::app::display::{rgb, with_alpha, DisplayTree, Node, NodeId};
use crate::assets::{AssetError, PropKind, TextureRegistry};

/// Static decoration anchored at its bottom centre, with a ground shadow for
/// the kinds that cast one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropSprite {
    pub node: NodeId,
    pub kind: PropKind,
}

impl PropSprite {
    pub fn spawn(
        tree: &mut DisplayTree,
        parent: NodeId,
        kind: PropKind,
        x: f32,
        y: f32,
        textures: &TextureRegistry,
    ) -> Result<Self, AssetError> {
        let texture = textures.resolve(kind.texture_key())?;
        let node = tree.add_child(parent, Node::group().at(x, y));
        if kind.casts_shadow() {
            let (width, _) = kind.size();
            tree.add_child(
                node,
                Node::ellipse(0.0, 2.0, width * 0.3, 4.0, with_alpha(rgb(0x000000), 0.12)),
            );
        }
        tree.add_child(node, Node::sprite(texture, (0.5, 1.0)));
        Ok(Self { node, kind })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::display::NodeKind;
    use crate::assets::Texture;

    fn registry() -> TextureRegistry {
        let mut registry = TextureRegistry::new();
        for kind in [PropKind::Bench, PropKind::Lamp] {
            let (w, h) = kind.size();
            registry.insert(Texture::solid(kind.texture_key(), w as u32, h as u32, [9, 9, 9, 255]));
        }
        registry
    }

    #[test]
    fn shadow_is_drawn_beneath_the_sprite() {
        let mut tree = DisplayTree::new();
        let root = tree.root();
        let prop = PropSprite::spawn(&mut tree, root, PropKind::Bench, 210.0, 250.0, &registry())
            .expect("bench");

        let children = tree.children(prop.node).to_vec();
        assert_eq!(children.len(), 2);
        assert!(matches!(tree.get(children[0]).map(|n| &n.kind), Some(NodeKind::Ellipse { .. })));
        assert!(matches!(tree.get(children[1]).map(|n| &n.kind), Some(NodeKind::Sprite { .. })));
    }

    #[test]
    fn lamps_cast_no_shadow() {
        let mut tree = DisplayTree::new();
        let root = tree.root();
        let prop = PropSprite::spawn(&mut tree, root, PropKind::Lamp, 80.0, 250.0, &registry())
            .expect("lamp");
        assert_eq!(tree.children_count(prop.node), 1);
    }

    #[test]
    fn unregistered_prop_is_an_error() {
        let mut tree = DisplayTree::new();
        let root = tree.root();
        let result = PropSprite::spawn(&mut tree, root, PropKind::Fountain, 0.0, 0.0, &registry());
        assert!(matches!(result, Err(AssetError::MissingTexture { .. })));
        assert_eq!(tree.node_count(), 1);
    }
}
