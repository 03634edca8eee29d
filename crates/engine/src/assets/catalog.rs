//! Texture keys and the lookup tables from tile, building and prop kinds to them.

use serde::{Deserialize, Serialize};

pub mod keys {
    pub const TILE_GRASS_1: &str = "tile_grass_1";
    pub const TILE_GRASS_2: &str = "tile_grass_2";
    pub const TILE_PATH_1: &str = "tile_path_1";
    pub const TILE_PATH_2: &str = "tile_path_2";
    pub const TILE_PATH_EDGE: &str = "tile_path_edge";
    pub const TILE_WATER_1: &str = "tile_water_1";
    pub const TILE_FLOWER_1: &str = "tile_flower_1";
    pub const TILE_FLOWER_2: &str = "tile_flower_2";

    pub const BUILDING_GLASS: &str = "building_glass";
    pub const BUILDING_INDUSTRIAL: &str = "building_industrial";
    pub const BUILDING_PURPLE: &str = "building_purple";

    pub const PROP_TREE_SMALL: &str = "prop_tree_small";
    pub const PROP_TREE_MEDIUM: &str = "prop_tree_medium";
    pub const PROP_TREE_LARGE: &str = "prop_tree_large";
    pub const PROP_BUSH_1: &str = "prop_bush_1";
    pub const PROP_BUSH_2: &str = "prop_bush_2";
    pub const PROP_FLOWERS_PATCH: &str = "prop_flowers_patch";
    pub const PROP_BENCH: &str = "prop_bench";
    pub const PROP_LAMP: &str = "prop_lamp";
    pub const PROP_FOUNTAIN: &str = "prop_fountain";
    pub const PROP_FENCE: &str = "prop_fence";
    pub const PROP_DESK: &str = "prop_desk";
    pub const PROP_COMPUTER: &str = "prop_computer";
    pub const PROP_WHITEBOARD: &str = "prop_whiteboard";
    pub const PROP_BOOKSHELF: &str = "prop_bookshelf";
    pub const PROP_SHELF: &str = "prop_shelf";

    pub const AVATAR_1: &str = "avatar1";
    pub const AVATAR_2: &str = "avatar2";
    pub const AVATAR_3: &str = "avatar3";
    pub const AVATARS: [&str; 3] = [AVATAR_1, AVATAR_2, AVATAR_3];

    pub const UI_HOME: &str = "ui_home";
    pub const UI_PEOPLE: &str = "ui_people";
    pub const UI_CLOSE: &str = "ui_close";
    pub const UI_RUNNING: &str = "ui_running";
    pub const UI_BLOCKED: &str = "ui_blocked";
    pub const UI_APPROVAL: &str = "ui_approval";
}

/// Every key with its default path relative to the asset directory.
pub(crate) const DEFAULT_TEXTURE_PATHS: &[(&str, &str)] = &[
    (keys::TILE_GRASS_1, "tiles/grass_1.png"),
    (keys::TILE_GRASS_2, "tiles/grass_2.png"),
    (keys::TILE_PATH_1, "tiles/path_1.png"),
    (keys::TILE_PATH_2, "tiles/path_2.png"),
    (keys::TILE_PATH_EDGE, "tiles/path_edge.png"),
    (keys::TILE_WATER_1, "tiles/water_1.png"),
    (keys::TILE_FLOWER_1, "tiles/flower_1.png"),
    (keys::TILE_FLOWER_2, "tiles/flower_2.png"),
    (keys::BUILDING_GLASS, "buildings/building_glass.png"),
    (keys::BUILDING_INDUSTRIAL, "buildings/building_industrial.png"),
    (keys::BUILDING_PURPLE, "buildings/building_purple.png"),
    (keys::PROP_TREE_SMALL, "props/tree_small.png"),
    (keys::PROP_TREE_MEDIUM, "props/tree_medium.png"),
    (keys::PROP_TREE_LARGE, "props/tree_large.png"),
    (keys::PROP_BUSH_1, "props/bush_1.png"),
    (keys::PROP_BUSH_2, "props/bush_2.png"),
    (keys::PROP_FLOWERS_PATCH, "props/flowers_patch.png"),
    (keys::PROP_BENCH, "props/bench.png"),
    (keys::PROP_LAMP, "props/lamp.png"),
    (keys::PROP_FOUNTAIN, "props/fountain.png"),
    (keys::PROP_FENCE, "props/fence.png"),
    (keys::PROP_DESK, "props/desk.png"),
    (keys::PROP_COMPUTER, "props/computer.png"),
    (keys::PROP_WHITEBOARD, "props/whiteboard.png"),
    (keys::PROP_BOOKSHELF, "props/bookshelf.png"),
    (keys::PROP_SHELF, "props/shelf.png"),
    (keys::AVATAR_1, "characters/avatar1.png"),
    (keys::AVATAR_2, "characters/avatar2.png"),
    (keys::AVATAR_3, "characters/avatar3.png"),
    (keys::UI_HOME, "ui/icon_home.png"),
    (keys::UI_PEOPLE, "ui/icon_people.png"),
    (keys::UI_CLOSE, "ui/icon_close.png"),
    (keys::UI_RUNNING, "ui/icon_running.png"),
    (keys::UI_BLOCKED, "ui/icon_blocked.png"),
    (keys::UI_APPROVAL, "ui/icon_approval.png"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TileId {
    Grass,
    GrassAlt,
    Path,
    PathEdge,
    Water,
    Flower,
    Floor,
    FloorAlt,
}

impl TileId {
    pub fn texture_key(self) -> &'static str {
        match self {
            TileId::Grass => keys::TILE_GRASS_1,
            TileId::GrassAlt => keys::TILE_GRASS_2,
            TileId::Path | TileId::Floor => keys::TILE_PATH_1,
            TileId::PathEdge => keys::TILE_PATH_EDGE,
            TileId::Water => keys::TILE_WATER_1,
            TileId::Flower => keys::TILE_FLOWER_1,
            TileId::FloorAlt => keys::TILE_PATH_2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildingType {
    Hub,
    Workshop,
    Library,
    Cafe,
    Greenhouse,
    Postoffice,
}

impl BuildingType {
    pub fn texture_key(self) -> &'static str {
        match self {
            BuildingType::Hub | BuildingType::Greenhouse => keys::BUILDING_GLASS,
            BuildingType::Workshop | BuildingType::Cafe => keys::BUILDING_INDUSTRIAL,
            BuildingType::Library | BuildingType::Postoffice => keys::BUILDING_PURPLE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuildingType::Hub => "hub",
            BuildingType::Workshop => "workshop",
            BuildingType::Library => "library",
            BuildingType::Cafe => "cafe",
            BuildingType::Greenhouse => "greenhouse",
            BuildingType::Postoffice => "postoffice",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropKind {
    TreeSmall,
    TreeMedium,
    TreeLarge,
    #[serde(rename = "bush_1")]
    Bush1,
    #[serde(rename = "bush_2")]
    Bush2,
    FlowersPatch,
    Bench,
    Lamp,
    Fountain,
    Fence,
    Desk,
    Computer,
    Whiteboard,
    Bookshelf,
    Shelf,
}

impl PropKind {
    pub const ALL: [PropKind; 15] = [
        PropKind::TreeSmall,
        PropKind::TreeMedium,
        PropKind::TreeLarge,
        PropKind::Bush1,
        PropKind::Bush2,
        PropKind::FlowersPatch,
        PropKind::Bench,
        PropKind::Lamp,
        PropKind::Fountain,
        PropKind::Fence,
        PropKind::Desk,
        PropKind::Computer,
        PropKind::Whiteboard,
        PropKind::Bookshelf,
        PropKind::Shelf,
    ];

    pub fn texture_key(self) -> &'static str {
        match self {
            PropKind::TreeSmall => keys::PROP_TREE_SMALL,
            PropKind::TreeMedium => keys::PROP_TREE_MEDIUM,
            PropKind::TreeLarge => keys::PROP_TREE_LARGE,
            PropKind::Bush1 => keys::PROP_BUSH_1,
            PropKind::Bush2 => keys::PROP_BUSH_2,
            PropKind::FlowersPatch => keys::PROP_FLOWERS_PATCH,
            PropKind::Bench => keys::PROP_BENCH,
            PropKind::Lamp => keys::PROP_LAMP,
            PropKind::Fountain => keys::PROP_FOUNTAIN,
            PropKind::Fence => keys::PROP_FENCE,
            PropKind::Desk => keys::PROP_DESK,
            PropKind::Computer => keys::PROP_COMPUTER,
            PropKind::Whiteboard => keys::PROP_WHITEBOARD,
            PropKind::Bookshelf => keys::PROP_BOOKSHELF,
            PropKind::Shelf => keys::PROP_SHELF,
        }
    }

    /// Nominal footprint in world pixels, used for shadows and placeholder art.
    pub fn size(self) -> (f32, f32) {
        match self {
            PropKind::TreeSmall => (32.0, 48.0),
            PropKind::TreeMedium => (40.0, 56.0),
            PropKind::TreeLarge => (48.0, 64.0),
            PropKind::Bush1 => (32.0, 24.0),
            PropKind::Bush2 => (40.0, 28.0),
            PropKind::FlowersPatch => (32.0, 16.0),
            PropKind::Bench => (32.0, 16.0),
            PropKind::Lamp => (16.0, 32.0),
            PropKind::Fountain => (64.0, 48.0),
            PropKind::Fence => (32.0, 16.0),
            PropKind::Desk => (48.0, 32.0),
            PropKind::Computer => (16.0, 16.0),
            PropKind::Whiteboard => (64.0, 40.0),
            PropKind::Bookshelf => (48.0, 48.0),
            PropKind::Shelf => (48.0, 32.0),
        }
    }

    pub fn casts_shadow(self) -> bool {
        !matches!(self, PropKind::Whiteboard | PropKind::Fence | PropKind::Lamp)
    }

    pub fn from_texture_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.texture_key() == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_tiles_reuse_path_textures() {
        assert_eq!(TileId::Floor.texture_key(), keys::TILE_PATH_1);
        assert_eq!(TileId::FloorAlt.texture_key(), keys::TILE_PATH_2);
    }

    #[test]
    fn building_types_share_three_facades() {
        assert_eq!(BuildingType::Hub.texture_key(), BuildingType::Greenhouse.texture_key());
        assert_eq!(BuildingType::Workshop.texture_key(), BuildingType::Cafe.texture_key());
        assert_eq!(BuildingType::Library.texture_key(), BuildingType::Postoffice.texture_key());
    }

    #[test]
    fn every_catalog_key_has_a_default_path() {
        let mut referenced: Vec<&str> = PropKind::ALL.iter().map(|kind| kind.texture_key()).collect();
        referenced.extend(keys::AVATARS);
        referenced.push(TileId::Water.texture_key());
        for key in referenced {
            assert!(
                DEFAULT_TEXTURE_PATHS.iter().any(|(candidate, _)| *candidate == key),
                "key={key}"
            );
        }
    }
}
