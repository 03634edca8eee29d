//! Deterministic character styling from a string identity.

use rand::rngs::SmallRng;
use rand::{Rng as _, SeedableRng};

use super::character::{Appearance, CharacterOptions, CharacterSprite, CharacterSpec, AVATAR_SHEET};
use crate::app::display::{rgb, Color, DisplayTree, NodeId};
use crate::app::scene::SceneError;
use crate::assets::{texture_keys, TextureRegistry};

/// DJB2 over UTF-16 code units with the xor step, wrapped to 32 bits.
pub fn hash_string(value: &str) -> u32 {
    let mut hash: i32 = 5381;
    for unit in value.encode_utf16() {
        hash = (hash << 5).wrapping_add(hash) ^ i32::from(unit);
    }
    hash as u32
}

/// 32-bit linear congruential generator yielding values in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    state: u32,
}

impl SeededRandom {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        f64::from(self.state) / f64::from(u32::MAX)
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        let index = (self.next_f64() * items.len() as f64).floor() as usize;
        &items[index.min(items.len().saturating_sub(1))]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyType {
    Round,
    Tall,
    BigHead,
    Hoodie,
    Coat,
    Robot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaletteType {
    Warm,
    Cool,
    Neutral,
    Bright,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HairType {
    Short,
    Bun,
    Curly,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessoryType {
    GlassesRound,
    GlassesSquare,
    Headphones,
    Beanie,
    Cap,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeldProp {
    Coffee,
    Book,
    Laptop,
    Clipboard,
    Wrench,
    Plant,
    None,
}

const BODY_TYPES: [BodyType; 6] = [
    BodyType::Round,
    BodyType::Tall,
    BodyType::BigHead,
    BodyType::Hoodie,
    BodyType::Coat,
    BodyType::Robot,
];
const PALETTES: [PaletteType; 4] = [
    PaletteType::Warm,
    PaletteType::Cool,
    PaletteType::Neutral,
    PaletteType::Bright,
];
const HAIR_TYPES: [HairType; 4] = [HairType::Short, HairType::Bun, HairType::Curly, HairType::None];
const ACCESSORIES: [AccessoryType; 6] = [
    AccessoryType::GlassesRound,
    AccessoryType::GlassesSquare,
    AccessoryType::Headphones,
    AccessoryType::Beanie,
    AccessoryType::Cap,
    AccessoryType::None,
];
const HELD_PROPS: [HeldProp; 7] = [
    HeldProp::Coffee,
    HeldProp::Book,
    HeldProp::Laptop,
    HeldProp::Clipboard,
    HeldProp::Wrench,
    HeldProp::Plant,
    HeldProp::None,
];
const IDLE_VARIANTS: [u8; 3] = [0, 1, 2];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharacterStyle {
    pub body: BodyType,
    pub palette: PaletteType,
    pub hair: HairType,
    pub accessory: AccessoryType,
    pub prop: HeldProp,
    pub idle_variant: u8,
}

pub fn make_style(id: &str) -> CharacterStyle {
    let mut rng = SeededRandom::new(hash_string(id));
    CharacterStyle {
        body: *rng.pick(&BODY_TYPES),
        palette: *rng.pick(&PALETTES),
        hair: *rng.pick(&HAIR_TYPES),
        accessory: *rng.pick(&ACCESSORIES),
        prop: *rng.pick(&HELD_PROPS),
        idle_variant: *rng.pick(&IDLE_VARIANTS),
    }
}

/// Nominal body size `(width, height)` per archetype.
pub fn body_dims(body: BodyType) -> (f32, f32) {
    match body {
        BodyType::Round => (24.0, 32.0),
        BodyType::Tall => (20.0, 36.0),
        BodyType::BigHead => (28.0, 32.0),
        BodyType::Hoodie => (26.0, 34.0),
        BodyType::Coat => (24.0, 36.0),
        BodyType::Robot => (24.0, 34.0),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub skin: Color,
    pub body: Color,
    pub accent: Color,
}

pub fn palette_colors(palette: PaletteType) -> Palette {
    match palette {
        PaletteType::Warm => Palette {
            skin: rgb(0xFFD5B8),
            body: rgb(0xE07050),
            accent: rgb(0xFF9060),
        },
        PaletteType::Cool => Palette {
            skin: rgb(0xFFE4D6),
            body: rgb(0x5088C0),
            accent: rgb(0x70A8E0),
        },
        PaletteType::Neutral => Palette {
            skin: rgb(0xF0C8A0),
            body: rgb(0x60A060),
            accent: rgb(0x80C880),
        },
        PaletteType::Bright => Palette {
            skin: rgb(0xD4A07A),
            body: rgb(0xA070C0),
            accent: rgb(0xFFD050),
        },
    }
}

/// Avatar sheet key (1-based) chosen from the identity hash.
pub fn avatar_key(id: &str) -> &'static str {
    texture_keys::AVATARS[(hash_string(id) % 3) as usize]
}

/// Builds character sprites. Appearance is fixed by the identity; only the
/// animation phase comes from the factory's own RNG.
#[derive(Debug)]
pub struct CharacterFactory {
    avatar_sheets: bool,
    rng: SmallRng,
}

impl CharacterFactory {
    pub fn new(avatar_sheets: bool) -> Self {
        Self {
            avatar_sheets,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(avatar_sheets: bool, seed: u64) -> Self {
        Self {
            avatar_sheets,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn spec(&self, id: &str, options: CharacterOptions) -> CharacterSpec {
        let style = make_style(id);
        let appearance = if self.avatar_sheets {
            Appearance::Avatar {
                texture_key: avatar_key(id),
                sheet: AVATAR_SHEET,
            }
        } else {
            Appearance::Procedural
        };
        CharacterSpec {
            id: id.to_string(),
            style,
            dims: body_dims(style.body),
            palette: palette_colors(style.palette),
            appearance,
            options,
        }
    }

    pub fn create(
        &mut self,
        tree: &mut DisplayTree,
        parent: NodeId,
        id: &str,
        options: CharacterOptions,
        textures: &TextureRegistry,
    ) -> Result<CharacterSprite, SceneError> {
        let spec = self.spec(id, options);
        let rng = SmallRng::seed_from_u64(self.rng.gen());
        CharacterSprite::spawn(tree, parent, spec, textures, rng)
    }
}
