use super::character::HOVER_OUTLINE_COLOR;
use crate::app::bridge::EntityType;
use crate::app::display::{rgb, with_alpha, DisplayTree, HitRect, Interaction, Node, NodeId};
use crate::assets::{AssetError, BuildingType, TextureRegistry};

const FALLBACK_SIZE: (f32, f32) = (80.0, 80.0);

/// Footprint of a building type as drawn; 80x80 when its facade is not loaded.
pub fn building_size(textures: &TextureRegistry, building_type: BuildingType) -> (f32, f32) {
    textures
        .get(building_type.texture_key())
        .map(|texture| (texture.width() as f32, texture.height() as f32))
        .unwrap_or(FALLBACK_SIZE)
}

/// Clickable building exterior anchored at its bottom centre.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingSprite {
    pub node: NodeId,
    pub building_type: BuildingType,
    pub width: f32,
    pub height: f32,
}

impl BuildingSprite {
    pub fn spawn(
        tree: &mut DisplayTree,
        parent: NodeId,
        id: &str,
        building_type: BuildingType,
        x: f32,
        y: f32,
        textures: &TextureRegistry,
    ) -> Result<Self, AssetError> {
        let texture = textures.resolve(building_type.texture_key())?;
        let width = texture.width() as f32;
        let height = texture.height() as f32;

        let node = tree.add_child(parent, Node::group().at(x, y));
        tree.add_child(
            node,
            Node::ellipse(0.0, 0.0, width * 0.35, 8.0, with_alpha(rgb(0x000000), 0.12)).at(0.0, 4.0),
        );
        tree.add_child(node, Node::sprite(texture, (0.5, 1.0)));
        let outline = tree.add_child(
            node,
            Node::outline(
                -width / 2.0 - 3.0,
                -height - 3.0,
                width + 6.0,
                height + 6.0,
                rgb(HOVER_OUTLINE_COLOR),
            )
            .hidden(),
        );
        if let Some(group) = tree.get_mut(node) {
            group.interaction = Some(Interaction {
                id: id.to_string(),
                entity_type: EntityType::Building,
                hit: HitRect {
                    x: -width / 2.0,
                    y: -height,
                    width,
                    height,
                },
                hover_outline: Some(outline),
            });
        }

        Ok(Self {
            node,
            building_type,
            width,
            height,
        })
    }
}
