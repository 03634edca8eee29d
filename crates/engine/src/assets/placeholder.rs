use super::catalog::keys;
use super::{AssetError, PropKind, Texture, TextureEntry, TextureLoader};

pub const AVATAR_FRAME_SIZE: u32 = 64;
pub const AVATAR_SHEET_COLUMNS: u32 = 4;
pub const AVATAR_SHEET_ROWS: u32 = 3;

/// Generates flat-shaded stand-in art sized like the real assets, so the
/// scenes can run without any files on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderTextureLoader;

impl TextureLoader for PlaceholderTextureLoader {
    fn load(&self, entry: &TextureEntry) -> Result<Texture, AssetError> {
        let texture = match entry.key.as_str() {
            keys::TILE_GRASS_1 => tile(&entry.key, 0x8CC084, 0x7DB476),
            keys::TILE_GRASS_2 => tile(&entry.key, 0x84B87C, 0x94C88C),
            keys::TILE_PATH_1 => tile(&entry.key, 0xE8D8B8, 0xDCCCAC),
            keys::TILE_PATH_2 => tile(&entry.key, 0xE0CCA8, 0xD4C09C),
            keys::TILE_PATH_EDGE => tile(&entry.key, 0xC8D8A0, 0xD8C8A0),
            keys::TILE_WATER_1 => tile(&entry.key, 0x78B8E0, 0x90C8E8),
            keys::TILE_FLOWER_1 | keys::TILE_FLOWER_2 => tile(&entry.key, 0x8CC084, 0xF0A0C0),
            keys::BUILDING_GLASS => building(&entry.key, 96, 96, 0xB8D8E8, 0x5088C0),
            keys::BUILDING_INDUSTRIAL => building(&entry.key, 112, 88, 0xC8B8A8, 0x8A6A50),
            keys::BUILDING_PURPLE => building(&entry.key, 88, 104, 0xD8C8E8, 0x8060A0),
            keys::AVATAR_1 => avatar_sheet(&entry.key, 0x5088C0),
            keys::AVATAR_2 => avatar_sheet(&entry.key, 0xE07050),
            keys::AVATAR_3 => avatar_sheet(&entry.key, 0x60A060),
            other => match PropKind::from_texture_key(other) {
                Some(kind) => prop(&entry.key, kind),
                None => blob(&entry.key, 16, 16, 0x6A6A6A),
            },
        };
        Ok(texture)
    }
}

fn rgb(hex: u32) -> [u8; 4] {
    [(hex >> 16) as u8, (hex >> 8) as u8, hex as u8, 255]
}

fn darken(color: [u8; 4]) -> [u8; 4] {
    [
        (color[0] as u16 * 3 / 4) as u8,
        (color[1] as u16 * 3 / 4) as u8,
        (color[2] as u16 * 3 / 4) as u8,
        color[3],
    ]
}

struct Canvas {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Canvas {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba: vec![0; width as usize * height as usize * 4],
        }
    }

    fn set(&mut self, x: u32, y: u32, color: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        self.rgba[offset..offset + 4].copy_from_slice(&color);
    }

    fn fill(&mut self, x0: u32, y0: u32, w: u32, h: u32, color: [u8; 4]) {
        for y in y0..y0.saturating_add(h).min(self.height) {
            for x in x0..x0.saturating_add(w).min(self.width) {
                self.set(x, y, color);
            }
        }
    }

    fn ellipse(&mut self, x0: u32, y0: u32, w: u32, h: u32, color: [u8; 4]) {
        let rx = w as f32 / 2.0;
        let ry = h as f32 / 2.0;
        for y in y0..y0.saturating_add(h).min(self.height) {
            for x in x0..x0.saturating_add(w).min(self.width) {
                let dx = (x - x0) as f32 + 0.5 - rx;
                let dy = (y - y0) as f32 + 0.5 - ry;
                if (dx * dx) / (rx * rx) + (dy * dy) / (ry * ry) <= 1.0 {
                    self.set(x, y, color);
                }
            }
        }
    }

    fn into_texture(self, key: &str) -> Texture {
        Texture::from_rgba(key, self.width, self.height, self.rgba)
            .unwrap_or_else(|_| Texture::solid(key, 1, 1, [255, 0, 255, 255]))
    }
}

fn tile(key: &str, base: u32, speck: u32) -> Texture {
    let mut canvas = Canvas::new(16, 16);
    canvas.fill(0, 0, 16, 16, rgb(base));
    for (x, y) in [(3, 4), (11, 2), (7, 9), (13, 12), (2, 13)] {
        canvas.set(x, y, rgb(speck));
    }
    canvas.into_texture(key)
}

fn building(key: &str, width: u32, height: u32, wall: u32, roof: u32) -> Texture {
    let mut canvas = Canvas::new(width, height);
    let roof_h = height / 4;
    canvas.fill(4, roof_h, width - 8, height - roof_h, rgb(wall));
    canvas.fill(0, 0, width, roof_h, rgb(roof));
    let window = darken(rgb(wall));
    let mut x = 12;
    while x + 12 < width - 8 {
        canvas.fill(x, roof_h + 10, 10, 10, window);
        x += 20;
    }
    canvas.fill(width / 2 - 8, height - 22, 16, 22, darken(rgb(roof)));
    canvas.into_texture(key)
}

fn prop(key: &str, kind: PropKind) -> Texture {
    let (w, h) = kind.size();
    let (w, h) = (w as u32, h as u32);
    let mut canvas = Canvas::new(w, h);
    match kind {
        PropKind::TreeSmall | PropKind::TreeMedium | PropKind::TreeLarge => {
            canvas.fill(w / 2 - 3, h * 2 / 3, 6, h / 3, rgb(0x8A6A50));
            canvas.ellipse(0, 0, w, h * 3 / 4, rgb(0x5A9A50));
        }
        PropKind::Bush1 | PropKind::Bush2 => canvas.ellipse(0, 0, w, h, rgb(0x6AAA60)),
        PropKind::FlowersPatch => {
            canvas.ellipse(0, 0, w, h, rgb(0x7DB476));
            for (x, y) in [(6, 5), (14, 8), (22, 4), (26, 10), (10, 11)] {
                canvas.fill(x, y, 2, 2, rgb(0xF0A0C0));
            }
        }
        PropKind::Lamp => {
            canvas.fill(w / 2 - 1, 6, 2, h - 6, rgb(0x4A4A4A));
            canvas.fill(w / 2 - 4, 0, 8, 7, rgb(0xF8E0A0));
        }
        PropKind::Fountain => {
            canvas.ellipse(0, h / 3, w, h * 2 / 3, rgb(0xB0B0B8));
            canvas.ellipse(6, h / 3 + 5, w - 12, h * 2 / 3 - 10, rgb(0x78B8E0));
            canvas.fill(w / 2 - 3, 4, 6, h / 2, rgb(0xB0B0B8));
        }
        PropKind::Computer => {
            canvas.fill(1, 1, w - 2, h - 5, rgb(0x3A3A4A));
            canvas.fill(3, 3, w - 6, h - 9, rgb(0x90C8E8));
            canvas.fill(w / 2 - 3, h - 4, 6, 4, rgb(0x3A3A4A));
        }
        PropKind::Whiteboard => {
            canvas.fill(0, 0, w, h, rgb(0x8A8A8A));
            canvas.fill(2, 2, w - 4, h - 4, rgb(0xF8F8F8));
        }
        _ => {
            let color = match kind {
                PropKind::Bench | PropKind::Fence => 0xA07850,
                PropKind::Desk => 0xC09870,
                _ => 0x9A7050,
            };
            blob_into(&mut canvas, rgb(color));
        }
    }
    canvas.into_texture(key)
}

fn blob(key: &str, width: u32, height: u32, color: u32) -> Texture {
    let mut canvas = Canvas::new(width, height);
    blob_into(&mut canvas, rgb(color));
    canvas.into_texture(key)
}

fn blob_into(canvas: &mut Canvas, color: [u8; 4]) {
    let (w, h) = (canvas.width, canvas.height);
    canvas.fill(0, 0, w, h, darken(color));
    canvas.fill(1, 1, w.saturating_sub(2), h.saturating_sub(2), color);
}

/// Four walk frames per row, three rows; each frame a little figure.
fn avatar_sheet(key: &str, shirt: u32) -> Texture {
    let frame = AVATAR_FRAME_SIZE;
    let mut canvas = Canvas::new(frame * AVATAR_SHEET_COLUMNS, frame * AVATAR_SHEET_ROWS);
    for row in 0..AVATAR_SHEET_ROWS {
        for col in 0..AVATAR_SHEET_COLUMNS {
            let ox = col * frame;
            let oy = row * frame;
            let step = col % 2;
            canvas.fill(ox + 22, oy + 34, 20, 20, rgb(shirt));
            canvas.fill(ox + 24 + step * 2, oy + 54, 6, 8, rgb(0x3A3A4A));
            canvas.fill(ox + 34 - step * 2, oy + 54, 6, 8, rgb(0x3A3A4A));
            canvas.ellipse(ox + 20, oy + 10, 24, 26, rgb(0xF5D0B0));
            canvas.fill(ox + 20, oy + 10, 24, 6, rgb(0x4A3020));
            canvas.fill(ox + 26, oy + 22, 3, 3, rgb(0x2B2B2B));
            canvas.fill(ox + 35, oy + 22, 3, 3, rgb(0x2B2B2B));
        }
    }
    canvas.into_texture(key)
}
