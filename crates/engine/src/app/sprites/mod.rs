mod building;
mod character;
mod factory;
mod prop;

pub use building::{building_size, BuildingSprite};
pub use character::{
    Appearance, CharacterOptions, CharacterSpec, CharacterSprite, CharacterStatus, SheetConfig,
    AVATAR_ANIMATION_SPEED, AVATAR_SHEET, HOVER_OUTLINE_COLOR,
};
pub use factory::{
    avatar_key, body_dims, hash_string, make_style, palette_colors, AccessoryType, BodyType,
    CharacterFactory, CharacterStyle, HairType, HeldProp, Palette, PaletteType, SeededRandom,
};
pub use prop::PropSprite;
