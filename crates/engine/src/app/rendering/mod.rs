mod raster;
mod surface;

pub use raster::{text_width, Canvas, GLYPH_HEIGHT, GLYPH_WIDTH};
pub use surface::{paint_tree, paint_veil, Renderer, Viewport};
