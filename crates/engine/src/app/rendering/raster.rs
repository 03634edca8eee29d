//! Software rasterizer over an RGBA8 frame. All drawing clips to the frame
//! and blends with straight alpha onto an opaque background.

use crate::app::display::{Color, FrameRect};
use crate::assets::Texture;

pub const GLYPH_WIDTH: i32 = 3;
pub const GLYPH_HEIGHT: i32 = 5;

pub struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    pub fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            frame,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self, color: Color) {
        let opaque = [color[0], color[1], color[2], 255];
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&opaque);
        }
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        let offset = self.byte_offset(x, y)?;
        let mut out = [0; 4];
        out.copy_from_slice(&self.frame[offset..offset + 4]);
        Some(out)
    }

    fn byte_offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let pixel = (y as usize)
            .checked_mul(self.width as usize)?
            .checked_add(x as usize)?;
        let offset = pixel.checked_mul(4)?;
        (offset.checked_add(4)? <= self.frame.len()).then_some(offset)
    }

    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Color) {
        if color[3] == 0 {
            return;
        }
        let Some(offset) = self.byte_offset(x, y) else {
            return;
        };
        let dst = &mut self.frame[offset..offset + 4];
        if color[3] == 255 {
            dst.copy_from_slice(&color);
            return;
        }
        let alpha = u32::from(color[3]);
        for channel in 0..3 {
            let src = u32::from(color[channel]);
            let old = u32::from(dst[channel]);
            dst[channel] = ((src * alpha + old * (255 - alpha) + 127) / 255) as u8;
        }
        dst[3] = 255;
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, rect_width: i32, rect_height: i32, color: Color) {
        let start_x = x.max(0);
        let start_y = y.max(0);
        let end_x = x.saturating_add(rect_width).min(self.width as i32);
        let end_y = y.saturating_add(rect_height).min(self.height as i32);
        for py in start_y..end_y {
            for px in start_x..end_x {
                self.blend_pixel(px, py, color);
            }
        }
    }

    /// Outline drawn inside the rectangle, `thickness` pixels wide.
    pub fn stroke_rect(
        &mut self,
        x: i32,
        y: i32,
        rect_width: i32,
        rect_height: i32,
        thickness: i32,
        color: Color,
    ) {
        if rect_width <= 0 || rect_height <= 0 {
            return;
        }
        let t = thickness.clamp(1, rect_width.min(rect_height));
        self.fill_rect(x, y, rect_width, t, color);
        self.fill_rect(x, y + rect_height - t, rect_width, t, color);
        self.fill_rect(x, y + t, t, rect_height - 2 * t, color);
        self.fill_rect(x + rect_width - t, y + t, t, rect_height - 2 * t, color);
    }

    pub fn fill_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, color: Color) {
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }
        let top = (cy - ry).floor() as i32;
        let bottom = (cy + ry).ceil() as i32;
        let left = (cx - rx).floor() as i32;
        let right = (cx + rx).ceil() as i32;
        for py in top.max(0)..bottom.min(self.height as i32) {
            let ny = (py as f32 + 0.5 - cy) / ry;
            for px in left.max(0)..right.min(self.width as i32) {
                let nx = (px as f32 + 0.5 - cx) / rx;
                if nx * nx + ny * ny <= 1.0 {
                    self.blend_pixel(px, py, color);
                }
            }
        }
    }

    /// Nearest-neighbour blit of `source` stretched to the destination box.
    #[allow(clippy::too_many_arguments)]
    pub fn blit(
        &mut self,
        texture: &Texture,
        source: FrameRect,
        left: f32,
        top: f32,
        dest_width: f32,
        dest_height: f32,
        alpha: f32,
    ) {
        if source.width == 0 || source.height == 0 || dest_width < 0.5 || dest_height < 0.5 {
            return;
        }
        let left_px = left.round() as i32;
        let top_px = top.round() as i32;
        let width_px = dest_width.round().max(1.0) as i32;
        let height_px = dest_height.round().max(1.0) as i32;
        let x_ratio = source.width as f32 / width_px as f32;
        let y_ratio = source.height as f32 / height_px as f32;
        let alpha = alpha.clamp(0.0, 1.0);

        let draw_left = left_px.max(0);
        let draw_top = top_px.max(0);
        let draw_right = (left_px + width_px).min(self.width as i32);
        let draw_bottom = (top_px + height_px).min(self.height as i32);

        for out_y in draw_top..draw_bottom {
            let src_y = (((out_y - top_px) as f32 * y_ratio) as u32).min(source.height - 1);
            for out_x in draw_left..draw_right {
                let src_x = (((out_x - left_px) as f32 * x_ratio) as u32).min(source.width - 1);
                let Some(mut texel) = texture.pixel(source.x + src_x, source.y + src_y) else {
                    continue;
                };
                if alpha < 1.0 {
                    texel[3] = (f32::from(texel[3]) * alpha).round() as u8;
                }
                self.blend_pixel(out_x, out_y, texel);
            }
        }
    }

    pub fn draw_text(&mut self, text: &str, left: i32, top: i32, scale: i32, color: Color) {
        let scale = scale.max(1);
        let mut x = left;
        for ch in text.chars() {
            let rows = glyph_rows(ch);
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0 {
                        self.fill_rect(
                            x + col * scale,
                            top + row as i32 * scale,
                            scale,
                            scale,
                            color,
                        );
                    }
                }
            }
            x += (GLYPH_WIDTH + 1) * scale;
        }
    }

    pub fn draw_text_centered(&mut self, text: &str, cx: i32, cy: i32, scale: i32, color: Color) {
        let scale = scale.max(1);
        let left = cx - text_width(text, scale) / 2;
        let top = cy - GLYPH_HEIGHT * scale / 2;
        self.draw_text(text, left, top, scale, color);
    }
}

/// Width in pixels of `text` drawn at `scale`, without trailing spacing.
pub fn text_width(text: &str, scale: i32) -> i32 {
    let count = text.chars().count() as i32;
    if count == 0 {
        return 0;
    }
    (count * (GLYPH_WIDTH + 1) - 1) * scale.max(1)
}

const GLYPHS: &[(char, [u8; 5])] = &[
    (' ', [0b000, 0b000, 0b000, 0b000, 0b000]),
    ('A', [0b010, 0b101, 0b111, 0b101, 0b101]),
    ('B', [0b110, 0b101, 0b110, 0b101, 0b110]),
    ('C', [0b011, 0b100, 0b100, 0b100, 0b011]),
    ('D', [0b110, 0b101, 0b101, 0b101, 0b110]),
    ('E', [0b111, 0b100, 0b110, 0b100, 0b111]),
    ('F', [0b111, 0b100, 0b110, 0b100, 0b100]),
    ('G', [0b011, 0b100, 0b101, 0b101, 0b011]),
    ('H', [0b101, 0b101, 0b111, 0b101, 0b101]),
    ('I', [0b111, 0b010, 0b010, 0b010, 0b111]),
    ('J', [0b001, 0b001, 0b001, 0b101, 0b010]),
    ('K', [0b101, 0b101, 0b110, 0b101, 0b101]),
    ('L', [0b100, 0b100, 0b100, 0b100, 0b111]),
    ('M', [0b101, 0b111, 0b111, 0b101, 0b101]),
    ('N', [0b110, 0b101, 0b101, 0b101, 0b101]),
    ('O', [0b010, 0b101, 0b101, 0b101, 0b010]),
    ('P', [0b110, 0b101, 0b110, 0b100, 0b100]),
    ('Q', [0b010, 0b101, 0b101, 0b110, 0b011]),
    ('R', [0b110, 0b101, 0b110, 0b101, 0b101]),
    ('S', [0b011, 0b100, 0b010, 0b001, 0b110]),
    ('T', [0b111, 0b010, 0b010, 0b010, 0b010]),
    ('U', [0b101, 0b101, 0b101, 0b101, 0b111]),
    ('V', [0b101, 0b101, 0b101, 0b101, 0b010]),
    ('W', [0b101, 0b101, 0b111, 0b111, 0b101]),
    ('X', [0b101, 0b101, 0b010, 0b101, 0b101]),
    ('Y', [0b101, 0b101, 0b010, 0b010, 0b010]),
    ('Z', [0b111, 0b001, 0b010, 0b100, 0b111]),
    ('0', [0b111, 0b101, 0b101, 0b101, 0b111]),
    ('1', [0b010, 0b110, 0b010, 0b010, 0b111]),
    ('2', [0b110, 0b001, 0b010, 0b100, 0b111]),
    ('3', [0b110, 0b001, 0b010, 0b001, 0b110]),
    ('4', [0b101, 0b101, 0b111, 0b001, 0b001]),
    ('5', [0b111, 0b100, 0b110, 0b001, 0b110]),
    ('6', [0b011, 0b100, 0b111, 0b101, 0b111]),
    ('7', [0b111, 0b001, 0b010, 0b010, 0b010]),
    ('8', [0b111, 0b101, 0b111, 0b101, 0b111]),
    ('9', [0b111, 0b101, 0b111, 0b001, 0b110]),
    ('.', [0b000, 0b000, 0b000, 0b000, 0b010]),
    (',', [0b000, 0b000, 0b000, 0b010, 0b100]),
    (':', [0b000, 0b010, 0b000, 0b010, 0b000]),
    ('-', [0b000, 0b000, 0b111, 0b000, 0b000]),
    ('_', [0b000, 0b000, 0b000, 0b000, 0b111]),
    ('/', [0b001, 0b001, 0b010, 0b100, 0b100]),
    ('@', [0b010, 0b101, 0b111, 0b100, 0b011]),
    ('!', [0b010, 0b010, 0b010, 0b000, 0b010]),
    ('?', [0b110, 0b001, 0b010, 0b000, 0b010]),
    ('\'', [0b010, 0b010, 0b000, 0b000, 0b000]),
    ('(', [0b001, 0b010, 0b010, 0b010, 0b001]),
    (')', [0b100, 0b010, 0b010, 0b010, 0b100]),
    ('+', [0b000, 0b010, 0b111, 0b010, 0b000]),
    ('<', [0b001, 0b010, 0b100, 0b010, 0b001]),
    ('>', [0b100, 0b010, 0b001, 0b010, 0b100]),
    ('#', [0b101, 0b111, 0b101, 0b111, 0b101]),
    ('&', [0b010, 0b101, 0b010, 0b101, 0b011]),
    // Status pictograms.
    ('⚙', [0b010, 0b111, 0b101, 0b111, 0b010]),
    ('✔', [0b000, 0b001, 0b101, 0b010, 0b000]),
    ('⏳', [0b111, 0b101, 0b010, 0b101, 0b111]),
    ('·', [0b000, 0b000, 0b010, 0b000, 0b000]),
];

const UNKNOWN_GLYPH: [u8; 5] = [0b111, 0b101, 0b101, 0b101, 0b111];

fn glyph_rows(ch: char) -> [u8; 5] {
    let upper = ch.to_ascii_uppercase();
    GLYPHS
        .iter()
        .find(|(glyph, _)| *glyph == upper)
        .map(|(_, rows)| *rows)
        .unwrap_or(UNKNOWN_GLYPH)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(width: u32, height: u32) -> Vec<u8> {
        vec![0; (width * height * 4) as usize]
    }

    #[test]
    fn blend_mixes_half_alpha_over_background() {
        let mut frame = blank(2, 1);
        let mut canvas = Canvas::new(&mut frame, 2, 1);
        canvas.clear([0, 0, 0, 255]);
        canvas.blend_pixel(0, 0, [255, 100, 0, 128]);

        let mixed = canvas.pixel(0, 0).expect("pixel");
        assert_eq!(mixed, [128, 50, 0, 255]);
        assert_eq!(canvas.pixel(1, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn drawing_outside_the_frame_is_clipped() {
        let mut frame = blank(4, 4);
        let mut canvas = Canvas::new(&mut frame, 4, 4);
        canvas.fill_rect(-10, -10, 12, 12, [255, 0, 0, 255]);
        canvas.fill_ellipse(100.0, 100.0, 5.0, 5.0, [0, 255, 0, 255]);
        canvas.blend_pixel(4, 0, [0, 0, 255, 255]);

        assert_eq!(canvas.pixel(1, 1), Some([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(2, 2), Some([0, 0, 0, 0]));
        assert_eq!(canvas.pixel(4, 0), None);
    }

    #[test]
    fn stroke_leaves_interior_untouched() {
        let mut frame = blank(8, 8);
        let mut canvas = Canvas::new(&mut frame, 8, 8);
        canvas.stroke_rect(0, 0, 8, 8, 2, [9, 9, 9, 255]);

        assert_eq!(canvas.pixel(1, 1), Some([9, 9, 9, 255]));
        assert_eq!(canvas.pixel(6, 7), Some([9, 9, 9, 255]));
        assert_eq!(canvas.pixel(3, 3), Some([0, 0, 0, 0]));
    }

    #[test]
    fn blit_scales_a_frame_region() {
        let mut rgba = vec![0; 4 * 2 * 4];
        // Left column red, right column blue.
        for y in 0..2 {
            rgba[(y * 4) * 4..(y * 4) * 4 + 4].copy_from_slice(&[255, 0, 0, 255]);
            rgba[(y * 4 + 1) * 4..(y * 4 + 1) * 4 + 4].copy_from_slice(&[0, 0, 255, 255]);
        }
        let texture = Texture::from_rgba("sheet", 4, 2, rgba).expect("texture");
        let mut frame = blank(4, 4);
        let mut canvas = Canvas::new(&mut frame, 4, 4);
        let source = FrameRect {
            x: 0,
            y: 0,
            width: 2,
            height: 2,
        };

        canvas.blit(&texture, source, 0.0, 0.0, 4.0, 4.0, 1.0);

        assert_eq!(canvas.pixel(1, 3), Some([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(2, 0), Some([0, 0, 255, 255]));
    }

    #[test]
    fn text_width_counts_glyph_spacing() {
        assert_eq!(text_width("", 2), 0);
        assert_eq!(text_width("A", 1), 3);
        assert_eq!(text_width("AB", 2), 14);
    }

    #[test]
    fn lowercase_and_status_glyphs_resolve() {
        assert_eq!(glyph_rows('a'), glyph_rows('A'));
        assert_ne!(glyph_rows('⚙'), UNKNOWN_GLYPH);
        assert_ne!(glyph_rows('✔'), UNKNOWN_GLYPH);
        assert_eq!(glyph_rows('€'), UNKNOWN_GLYPH);
    }
}
