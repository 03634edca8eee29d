use super::display::{DisplayTree, Node, NodeId};
use crate::assets::{AssetError, TextureRegistry, TileId};

/// Grid of tile ids rendered as one sprite per cell, each stretched to
/// `tile_size` world pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilemapLayer {
    pub node: NodeId,
    pub columns: usize,
    pub rows: usize,
}

impl TilemapLayer {
    pub fn build(
        tree: &mut DisplayTree,
        parent: NodeId,
        map: &[Vec<TileId>],
        tile_size: f32,
        textures: &TextureRegistry,
    ) -> Result<Self, AssetError> {
        // Resolve everything first so a missing key leaves no half-built layer.
        let mut cells = Vec::with_capacity(map.iter().map(Vec::len).sum());
        for (y, row) in map.iter().enumerate() {
            for (x, tile) in row.iter().enumerate() {
                cells.push((x, y, textures.resolve(tile.texture_key())?));
            }
        }

        let node = tree.add_child(parent, Node::group());
        for (x, y, texture) in cells {
            let scale_x = tile_size / texture.width() as f32;
            let scale_y = tile_size / texture.height() as f32;
            tree.add_child(
                node,
                Node::sprite(texture, (0.0, 0.0))
                    .at(x as f32 * tile_size, y as f32 * tile_size)
                    .with_scale(scale_x, scale_y),
            );
        }

        Ok(Self {
            node,
            columns: map.iter().map(Vec::len).max().unwrap_or(0),
            rows: map.len(),
        })
    }
}
