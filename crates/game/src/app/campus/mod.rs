//! Campus content: who works where and how the grounds are laid out.

mod layout;
mod roster;

pub(crate) use layout::{
    desk_positions, interior_floor, room_door_positions, world_tiles, TREES, WORLD_HEIGHT,
    WORLD_PLAYER_SPAWN, WORLD_PROPS, WORLD_TILE_SIZE, WORLD_WIDTH,
};
pub(crate) use roster::{name_from_email, Building, Room, Roster};
