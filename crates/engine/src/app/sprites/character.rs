use std::f32::consts::TAU;

use rand::rngs::SmallRng;
use rand::Rng as _;
use serde::{Deserialize, Serialize};

use super::factory::{AccessoryType, BodyType, CharacterStyle, HairType, HeldProp, Palette};
use crate::app::bridge::EntityType;
use crate::app::camera::MS_PER_FRAME;
use crate::app::display::{
    rgb, with_alpha, Color, DisplayTree, FrameRect, HitRect, Interaction, Node, NodeId, NodeKind,
};
use crate::app::scene::SceneError;
use crate::assets::{AssetError, TextureHandle, TextureRegistry};

pub const HOVER_OUTLINE_COLOR: u32 = 0xFFD050;
const INK: u32 = 0x2B2B2B;
const BOB_AMPLITUDES: [f32; 3] = [1.5, 2.0, 1.0];
const IDLE_PHASE_RATE: f32 = 0.05;
const BLINK_CLOSED_MS: f32 = 100.0;
const BLINK_MIN_INTERVAL_MS: f32 = 2000.0;
const BLINK_JITTER_MS: f32 = 3000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterStatus {
    #[default]
    Idle,
    Working,
    Done,
    Waiting,
}

impl CharacterStatus {
    pub fn glyph(self) -> char {
        match self {
            CharacterStatus::Working => '\u{2699}',
            CharacterStatus::Done => '\u{2714}',
            CharacterStatus::Waiting => '\u{23F3}',
            CharacterStatus::Idle => '\u{00B7}',
        }
    }
}

/// Frame layout inside an avatar sprite sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetConfig {
    pub frame_width: u32,
    pub frame_height: u32,
    pub row: u32,
    pub frames: u32,
}

pub const AVATAR_SHEET: SheetConfig = SheetConfig {
    frame_width: 64,
    frame_height: 64,
    row: 2,
    frames: 4,
};
/// Sheet frames advanced per 60 Hz tick.
pub const AVATAR_ANIMATION_SPEED: f32 = 0.12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appearance {
    Procedural,
    Avatar {
        texture_key: &'static str,
        sheet: SheetConfig,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterOptions {
    pub scale: f32,
    pub interactive: bool,
}

impl Default for CharacterOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            interactive: false,
        }
    }
}

impl CharacterOptions {
    pub fn interactive(scale: f32) -> Self {
        Self {
            scale,
            interactive: true,
        }
    }
}

/// Everything needed to build one character; produced by the factory.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterSpec {
    pub id: String,
    pub style: CharacterStyle,
    pub dims: (f32, f32),
    pub palette: Palette,
    pub appearance: Appearance,
    pub options: CharacterOptions,
}

#[derive(Debug)]
enum Rig {
    Procedural {
        body: NodeId,
        head: NodeId,
        eyes: NodeId,
        prop: NodeId,
        body_height: f32,
        head_height: f32,
    },
    Avatar {
        sprite: NodeId,
        sheet: SheetConfig,
        frame_cursor: f32,
    },
}

#[derive(Debug, Clone, Copy)]
struct Blink {
    timer_ms: f32,
    interval_ms: f32,
    closed: bool,
}

/// A character: shadow, body rig, hover outline and status bubble under one
/// root node whose origin is at the feet.
#[derive(Debug)]
pub struct CharacterSprite {
    id: String,
    root: NodeId,
    rig: Rig,
    status_bubble: NodeId,
    status_icon: NodeId,
    status: CharacterStatus,
    idle_time: f32,
    idle_variant: u8,
    blink: Blink,
    rng: SmallRng,
}

fn head_size(body: BodyType, body_width: f32) -> (f32, f32) {
    match body {
        BodyType::BigHead => (body_width + 6.0, 20.0),
        BodyType::Robot => (body_width + 2.0, 16.0),
        _ => (body_width + 4.0, 18.0),
    }
}

fn torso_size(body: BodyType, body_width: f32, body_height: f32) -> (f32, f32) {
    match body {
        BodyType::BigHead => (body_width - 4.0, (body_height - 12.0).max(14.0)),
        _ => (body_width - 2.0, (body_height - 10.0).max(16.0)),
    }
}

fn rect(tree: &mut DisplayTree, parent: NodeId, x: f32, y: f32, w: f32, h: f32, fill: Color) {
    tree.add_child(parent, Node::rect(x, y, w, h, fill));
}

impl CharacterSprite {
    pub fn spawn(
        tree: &mut DisplayTree,
        parent: NodeId,
        spec: CharacterSpec,
        textures: &TextureRegistry,
        mut rng: SmallRng,
    ) -> Result<Self, SceneError> {
        // Resolve before touching the tree so a failure leaves nothing behind.
        let avatar = match spec.appearance {
            Appearance::Avatar { texture_key, sheet } => {
                let texture = textures.resolve(texture_key)?;
                check_sheet(&texture, sheet)?;
                Some((texture, sheet))
            }
            Appearance::Procedural => None,
        };

        let scale = spec.options.scale;
        let (bw, _) = spec.dims;
        let root = tree.add_child(parent, Node::group().with_scale(scale, scale));
        let shadow = tree.add_child(
            root,
            Node::ellipse(0.0, 0.0, bw * 0.45, 4.0, with_alpha(rgb(0x000000), 0.15)),
        );

        let (rig, outline_w, outline_h, head_h) = match avatar {
            Some((texture, sheet)) => {
                let frame_w = sheet.frame_width as f32;
                let frame_h = sheet.frame_height as f32;
                let sprite = tree.add_child(
                    root,
                    Node::new(NodeKind::Sprite {
                        texture,
                        frame: Some(sheet_frame(sheet, 0)),
                        anchor: (0.5, 1.0),
                    }),
                );
                if bw > 0.0 {
                    if let Some(node) = tree.get_mut(shadow) {
                        node.scale_x = frame_w / bw * 0.9;
                    }
                }
                let head_h = (frame_h * 0.55).round();
                let rig = Rig::Avatar {
                    sprite,
                    sheet,
                    frame_cursor: 0.0,
                };
                (rig, frame_w, frame_h, head_h)
            }
            None => build_procedural(tree, root, &spec),
        };

        let outline = tree.add_child(
            root,
            Node::outline(
                -outline_w / 2.0 - 3.0,
                -outline_h - head_h - 3.0,
                outline_w + 6.0,
                outline_h + head_h + 6.0,
                rgb(HOVER_OUTLINE_COLOR),
            )
            .hidden(),
        );

        let status_bubble = tree.add_child(
            root,
            Node::group().at(0.0, -outline_h - head_h - 12.0).hidden(),
        );
        tree.add_child(
            status_bubble,
            Node::rect(-8.0, -8.0, 16.0, 16.0, with_alpha(rgb(0xFFFFFF), 0.85))
                .with_stroke(rgb(INK)),
        );
        let status_icon = tree.add_child(status_bubble, Node::label("", rgb(INK)));

        if spec.options.interactive {
            if let Some(node) = tree.get_mut(root) {
                node.interaction = Some(Interaction {
                    id: spec.id.clone(),
                    entity_type: EntityType::Character,
                    hit: HitRect {
                        x: -outline_w / 2.0 - 3.0,
                        y: -outline_h - head_h - 3.0,
                        width: outline_w + 6.0,
                        height: outline_h + head_h + 6.0,
                    },
                    hover_outline: Some(outline),
                });
            }
        }

        let blink = Blink {
            timer_ms: 0.0,
            interval_ms: BLINK_MIN_INTERVAL_MS + rng.gen::<f32>() * BLINK_JITTER_MS,
            closed: false,
        };
        let idle_time = rng.gen::<f32>() * TAU;

        Ok(Self {
            id: spec.id,
            root,
            rig,
            status_bubble,
            status_icon,
            status: CharacterStatus::Idle,
            idle_time,
            idle_variant: spec.style.idle_variant.min(2),
            blink,
            rng,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn node(&self) -> NodeId {
        self.root
    }

    pub fn status(&self) -> CharacterStatus {
        self.status
    }

    pub fn is_blinking(&self) -> bool {
        self.blink.closed
    }

    pub fn uses_avatar_sheet(&self) -> bool {
        matches!(self.rig, Rig::Avatar { .. })
    }

    pub fn set_position(&self, tree: &mut DisplayTree, x: f32, y: f32) {
        tree.set_position(self.root, x, y);
    }

    pub fn position(&self, tree: &DisplayTree) -> Option<(f32, f32)> {
        tree.get(self.root).map(|node| (node.x, node.y))
    }

    /// `idle` hides the bubble; every other status shows its glyph.
    pub fn set_status(&mut self, tree: &mut DisplayTree, status: CharacterStatus) {
        self.status = status;
        if status == CharacterStatus::Idle {
            tree.set_visible(self.status_bubble, false);
            return;
        }
        tree.set_visible(self.status_bubble, true);
        if let Some(node) = tree.get_mut(self.status_icon) {
            if let NodeKind::Label { text, .. } = &mut node.kind {
                *text = status.glyph().to_string();
            }
        }
    }

    /// Advances idle bob, blink and sheet animation by `dt` 60 Hz frames.
    pub fn update_animation(&mut self, dt: f32, tree: &mut DisplayTree) {
        self.idle_time += dt * IDLE_PHASE_RATE;
        let amplitude = BOB_AMPLITUDES[usize::from(self.idle_variant)];
        let bob = self.idle_time.sin() * amplitude;

        let eyes = match &mut self.rig {
            Rig::Avatar {
                sprite,
                sheet,
                frame_cursor,
            } => {
                *frame_cursor += dt * AVATAR_ANIMATION_SPEED;
                let frame_index = (*frame_cursor as u32) % sheet.frames.max(1);
                if let Some(node) = tree.get_mut(*sprite) {
                    node.y = bob;
                    if let NodeKind::Sprite { frame, .. } = &mut node.kind {
                        *frame = Some(sheet_frame(*sheet, frame_index));
                    }
                }
                None
            }
            Rig::Procedural {
                body,
                head,
                eyes,
                prop,
                body_height,
                head_height,
            } => {
                let body_y = -*body_height + bob;
                if let Some(node) = tree.get_mut(*body) {
                    node.y = body_y;
                }
                if let Some(node) = tree.get_mut(*head) {
                    node.y = body_y - *head_height + 6.0 + bob * 0.5;
                }
                if let Some(node) = tree.get_mut(*prop) {
                    node.y = body_y + *body_height * 0.6 + bob * 0.2;
                }
                Some(*eyes)
            }
        };
        if let Some(eyes) = eyes {
            self.advance_blink(dt, tree, eyes);
        }
    }

    fn advance_blink(&mut self, dt: f32, tree: &mut DisplayTree, eyes: NodeId) {
        self.blink.timer_ms += dt * MS_PER_FRAME;
        if self.blink.closed {
            if self.blink.timer_ms > BLINK_CLOSED_MS {
                tree.set_visible(eyes, true);
                self.blink.closed = false;
                self.blink.timer_ms = 0.0;
                self.blink.interval_ms =
                    BLINK_MIN_INTERVAL_MS + self.rng.gen::<f32>() * BLINK_JITTER_MS;
            }
        } else if self.blink.timer_ms > self.blink.interval_ms {
            tree.set_visible(eyes, false);
            self.blink.closed = true;
            self.blink.timer_ms = 0.0;
        }
    }
}

fn sheet_frame(sheet: SheetConfig, index: u32) -> FrameRect {
    FrameRect {
        x: index * sheet.frame_width,
        y: sheet.row * sheet.frame_height,
        width: sheet.frame_width,
        height: sheet.frame_height,
    }
}

fn check_sheet(texture: &TextureHandle, sheet: SheetConfig) -> Result<(), AssetError> {
    let needed_w = sheet.frames * sheet.frame_width;
    let needed_h = (sheet.row + 1) * sheet.frame_height;
    if texture.width() < needed_w || texture.height() < needed_h {
        return Err(AssetError::FrameOutOfBounds {
            key: texture.key().to_string(),
            width: texture.width(),
            height: texture.height(),
        });
    }
    Ok(())
}

/// Builds body, head and prop groups; returns the rig plus the torso size
/// and head height used for the outline and bubble placement.
fn build_procedural(
    tree: &mut DisplayTree,
    root: NodeId,
    spec: &CharacterSpec,
) -> (Rig, f32, f32, f32) {
    let style = spec.style;
    let palette = spec.palette;
    let (bw, bh) = spec.dims;
    let (head_w, head_h) = head_size(style.body, bw);
    let (torso_w, torso_h) = torso_size(style.body, bw, bh);

    let body = tree.add_child(root, Node::group().at(-torso_w / 2.0, -torso_h));
    draw_torso(tree, body, style.body, torso_w, torso_h, palette);

    let head = tree.add_child(root, Node::group().at(-head_w / 2.0, -torso_h - head_h + 6.0));
    rect(tree, head, 0.0, 0.0, head_w, head_h, palette.skin);

    let eyes = tree.add_child(head, Node::group());
    let eye_y = (head_h * 0.5).round();
    let spacing = head_w * 0.22;
    rect(tree, eyes, (head_w / 2.0 - spacing - 2.0).round(), eye_y, 3.0, 3.0, rgb(INK));
    rect(tree, eyes, (head_w / 2.0 + spacing - 1.0).round(), eye_y, 3.0, 3.0, rgb(INK));

    let blush = with_alpha(rgb(0xE8A598), 0.6);
    rect(tree, head, 3.0, head_h - 6.0, 3.0, 2.0, blush);
    rect(tree, head, head_w - 6.0, head_h - 6.0, 3.0, 2.0, blush);
    rect(tree, head, (head_w / 2.0).round() - 2.0, (head_h * 0.7).round(), 4.0, 1.0, rgb(0x5A3A3A));

    draw_hair(tree, head, style.hair, head_w, palette.accent);
    draw_accessory(tree, head, style.accessory, head_w, head_h, palette.accent);

    let prop = tree.add_child(root, Node::group().at(0.0, -torso_h + torso_h * 0.6));
    draw_held_prop(tree, prop, style.prop, torso_w, torso_h, palette.accent);

    let rig = Rig::Procedural {
        body,
        head,
        eyes,
        prop,
        body_height: torso_h,
        head_height: head_h,
    };
    (rig, torso_w, torso_h, head_h)
}

fn draw_torso(
    tree: &mut DisplayTree,
    body: NodeId,
    kind: BodyType,
    w: f32,
    h: f32,
    palette: Palette,
) {
    rect(tree, body, 0.0, 0.0, w, h, palette.body);
    let crease = with_alpha(rgb(0x000000), 0.1);
    match kind {
        BodyType::Hoodie => {
            rect(tree, body, 2.0, 0.0, w - 4.0, 6.0, palette.body);
            rect(tree, body, 2.0, h - 6.0, w - 4.0, 2.0, crease);
        }
        BodyType::Coat => {
            rect(tree, body, w / 2.0 - 1.0, 0.0, 2.0, h, crease);
            rect(tree, body, 2.0, h - 6.0, w - 4.0, 2.0, crease);
        }
        BodyType::Robot => {
            rect(tree, body, w / 2.0 - 1.0, -4.0, 2.0, 4.0, rgb(0x666666));
            rect(tree, body, w / 2.0 - 2.0, -6.0, 4.0, 3.0, rgb(0x888888));
            rect(tree, body, 3.0, 4.0, w - 6.0, 4.0, with_alpha(rgb(0x000000), 0.15));
        }
        _ => rect(tree, body, 2.0, h * 0.4, w - 4.0, 3.0, palette.accent),
    }
}

fn draw_hair(tree: &mut DisplayTree, head: NodeId, hair: HairType, head_w: f32, color: Color) {
    match hair {
        HairType::Short => {
            rect(tree, head, 1.0, -2.0, head_w - 2.0, 4.0, color);
            rect(tree, head, 3.0, -4.0, 4.0, 3.0, color);
            rect(tree, head, head_w - 7.0, -4.0, 4.0, 3.0, color);
        }
        HairType::Bun => {
            rect(tree, head, head_w / 2.0 - 4.0, -6.0, 8.0, 6.0, color);
            rect(tree, head, 2.0, 0.0, head_w - 4.0, 4.0, color);
        }
        HairType::Curly => {
            rect(tree, head, -2.0, -2.0, head_w + 4.0, 5.0, color);
            rect(tree, head, 0.0, -4.0, head_w, 3.0, color);
        }
        HairType::None => {}
    }
}

fn draw_accessory(
    tree: &mut DisplayTree,
    head: NodeId,
    accessory: AccessoryType,
    head_w: f32,
    head_h: f32,
    color: Color,
) {
    let ink = rgb(INK);
    match accessory {
        AccessoryType::GlassesRound => {
            rect(tree, head, 4.0, head_h * 0.45, 6.0, 5.0, ink);
            rect(tree, head, head_w - 10.0, head_h * 0.45, 6.0, 5.0, ink);
            rect(tree, head, head_w / 2.0 - 2.0, head_h * 0.5, 4.0, 1.0, ink);
        }
        AccessoryType::GlassesSquare => {
            rect(tree, head, 3.0, head_h * 0.45, 7.0, 5.0, ink);
            rect(tree, head, head_w - 10.0, head_h * 0.45, 7.0, 5.0, ink);
            rect(tree, head, head_w / 2.0 - 2.0, head_h * 0.5, 4.0, 1.0, ink);
        }
        AccessoryType::Headphones => {
            rect(tree, head, 2.0, head_h * 0.3, 3.0, 9.0, ink);
            rect(tree, head, head_w - 5.0, head_h * 0.3, 3.0, 9.0, ink);
            rect(tree, head, 4.0, head_h * 0.2, head_w - 8.0, 2.0, ink);
        }
        AccessoryType::Beanie => {
            rect(tree, head, 2.0, -2.0, head_w - 4.0, 6.0, color);
            rect(tree, head, head_w / 2.0 - 2.0, -5.0, 4.0, 3.0, with_alpha(rgb(0xFFFFFF), 0.7));
        }
        AccessoryType::Cap => {
            rect(tree, head, 2.0, -1.0, head_w - 4.0, 4.0, color);
            rect(tree, head, head_w / 2.0 - 8.0, 2.0, 16.0, 2.0, with_alpha(ink, 0.2));
        }
        AccessoryType::None => {}
    }
}

fn draw_held_prop(
    tree: &mut DisplayTree,
    group: NodeId,
    prop: HeldProp,
    body_w: f32,
    body_h: f32,
    color: Color,
) {
    let x = body_w / 2.0 + 2.0;
    let y = body_h * 0.4;
    match prop {
        HeldProp::Coffee => {
            rect(tree, group, x, y, 4.0, 5.0, rgb(0x8B6B4A));
            rect(tree, group, x + 4.0, y + 1.0, 2.0, 2.0, rgb(0x8B6B4A));
        }
        HeldProp::Book => rect(tree, group, x, y, 6.0, 5.0, rgb(0x5088C0)),
        HeldProp::Laptop => {
            rect(tree, group, x, y, 6.0, 4.0, rgb(0x333333));
            rect(tree, group, x + 1.0, y + 1.0, 4.0, 2.0, rgb(0x60A060));
        }
        HeldProp::Clipboard => {
            rect(tree, group, x, y, 5.0, 6.0, rgb(0xD0C8B8));
            rect(tree, group, x + 1.0, y + 1.0, 3.0, 1.0, rgb(INK));
        }
        HeldProp::Wrench => {
            rect(tree, group, x, y + 1.0, 5.0, 2.0, rgb(0x888888));
            rect(tree, group, x + 4.0, y, 2.0, 4.0, rgb(0x888888));
        }
        HeldProp::Plant => {
            rect(tree, group, x + 1.0, y + 2.0, 4.0, 3.0, rgb(0x8B6B4A));
            rect(tree, group, x, y, 6.0, 2.0, color);
        }
        HeldProp::None => {}
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::app::sprites::factory::CharacterFactory;
    use crate::assets::{texture_keys, AssetManifest, PlaceholderTextureLoader};

    fn textures() -> TextureRegistry {
        let mut registry = TextureRegistry::new();
        registry
            .load_all(&AssetManifest::builtin(), &PlaceholderTextureLoader)
            .expect("placeholder textures");
        registry
    }

    fn spawn(factory: &mut CharacterFactory, id: &str, options: CharacterOptions) -> (DisplayTree, CharacterSprite) {
        let mut tree = DisplayTree::new();
        let root = tree.root();
        let sprite = factory
            .create(&mut tree, root, id, options, &textures())
            .expect("character");
        (tree, sprite)
    }

    #[test]
    fn idle_hides_bubble_and_other_statuses_show_glyph() {
        let mut factory = CharacterFactory::with_seed(false, 7);
        let (mut tree, mut sprite) = spawn(&mut factory, "char-001", CharacterOptions::default());

        sprite.set_status(&mut tree, CharacterStatus::Working);
        assert_eq!(tree.get(sprite.status_bubble).map(|n| n.visible), Some(true));
        match tree.get(sprite.status_icon).map(|n| &n.kind) {
            Some(NodeKind::Label { text, .. }) => assert_eq!(text, "\u{2699}"),
            other => panic!("unexpected icon node {other:?}"),
        }

        sprite.set_status(&mut tree, CharacterStatus::Idle);
        assert_eq!(tree.get(sprite.status_bubble).map(|n| n.visible), Some(false));
    }

    #[test]
    fn blink_closes_then_reopens_after_100ms() {
        let mut factory = CharacterFactory::with_seed(false, 11);
        let (mut tree, mut sprite) = spawn(&mut factory, "char-002", CharacterOptions::default());
        let eyes = match sprite.rig {
            Rig::Procedural { eyes, .. } => eyes,
            Rig::Avatar { .. } => panic!("expected procedural rig"),
        };

        // Longest possible interval is 5 s.
        let mut frames = 0;
        while !sprite.is_blinking() && frames < 400 {
            sprite.update_animation(1.0, &mut tree);
            frames += 1;
        }
        assert!(sprite.is_blinking());
        assert_eq!(tree.get(eyes).map(|n| n.visible), Some(false));

        for _ in 0..7 {
            sprite.update_animation(1.0, &mut tree);
        }
        assert!(!sprite.is_blinking());
        assert_eq!(tree.get(eyes).map(|n| n.visible), Some(true));
    }

    #[test]
    fn bob_stays_within_variant_amplitude() {
        let mut factory = CharacterFactory::with_seed(false, 3);
        let (mut tree, mut sprite) = spawn(&mut factory, "char-003", CharacterOptions::default());
        let (body, body_height) = match sprite.rig {
            Rig::Procedural { body, body_height, .. } => (body, body_height),
            Rig::Avatar { .. } => panic!("expected procedural rig"),
        };

        for _ in 0..200 {
            sprite.update_animation(1.0, &mut tree);
            let y = tree.get(body).map(|n| n.y).unwrap_or_default();
            assert!((y + body_height).abs() <= 2.0 + 1e-4, "y={y}");
        }
    }

    #[test]
    fn interactive_character_is_pickable_at_its_scale() {
        let mut factory = CharacterFactory::with_seed(false, 5);
        let (mut tree, sprite) =
            spawn(&mut factory, "char-004", CharacterOptions::interactive(1.6));
        sprite.set_position(&mut tree, 200.0, 235.0);

        let (_, interaction) = tree.pick(200.0, 200.0).expect("character hit");
        assert_eq!(interaction.id, "char-004");
        assert_eq!(interaction.entity_type, EntityType::Character);
        assert!(tree.pick(200.0, 240.0).is_none());
    }

    #[test]
    fn avatar_mode_uses_sheet_row_two() {
        let mut factory = CharacterFactory::with_seed(true, 1);
        let (mut tree, mut sprite) = spawn(&mut factory, "char-005", CharacterOptions::default());
        assert!(sprite.uses_avatar_sheet());

        for _ in 0..12 {
            sprite.update_animation(1.0, &mut tree);
        }
        let Rig::Avatar { sprite: node, .. } = sprite.rig else {
            panic!("expected avatar rig");
        };
        match tree.get(node).map(|n| &n.kind) {
            Some(NodeKind::Sprite { frame: Some(frame), .. }) => {
                assert_eq!(frame.y, 128);
                assert_eq!(frame.x, 64);
            }
            other => panic!("unexpected sprite node {other:?}"),
        }
    }

    #[test]
    fn missing_avatar_texture_fails_without_leftovers() {
        let factory = CharacterFactory::with_seed(true, 1);
        let mut tree = DisplayTree::new();
        let root = tree.root();
        let spec = factory.spec("char-006", CharacterOptions::default());
        let result = CharacterSprite::spawn(
            &mut tree,
            root,
            spec,
            &TextureRegistry::new(),
            SmallRng::seed_from_u64(0),
        );

        assert!(matches!(
            result,
            Err(SceneError::Asset(AssetError::MissingTexture { key })) if texture_keys::AVATARS.contains(&key.as_str())
        ));
        assert_eq!(tree.node_count(), 1);
    }
}
