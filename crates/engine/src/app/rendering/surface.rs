use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use super::raster::Canvas;
use crate::app::camera::StageTransform;
use crate::app::display::{with_alpha, Color, DisplayTree, FrameRect, NodeKind};

const OUTLINE_WORLD_PX: f32 = 2.0;
const LABEL_WORLD_SCALE: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Draws every visible node of `tree` through the stage transform.
pub fn paint_tree(canvas: &mut Canvas<'_>, tree: &DisplayTree, stage: StageTransform) {
    let zoom = stage.scale;
    tree.visit_visible(|_, node, placement| match &node.kind {
        NodeKind::Group => {}
        NodeKind::Sprite {
            texture,
            frame,
            anchor,
        } => {
            let source = frame.unwrap_or(FrameRect {
                x: 0,
                y: 0,
                width: texture.width(),
                height: texture.height(),
            });
            let world_w = source.width as f32 * placement.scale_x.abs();
            let world_h = source.height as f32 * placement.scale_y.abs();
            let (left, top) = stage.world_to_screen(
                placement.x - anchor.0 * world_w,
                placement.y - anchor.1 * world_h,
            );
            canvas.blit(
                texture,
                source,
                left,
                top,
                world_w * zoom,
                world_h * zoom,
                placement.alpha,
            );
        }
        NodeKind::Rect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
        } => {
            let (wx, wy) = placement.apply(*x, *y);
            let (left, top) = stage.world_to_screen(wx, wy);
            let w = (width * placement.scale_x * zoom).round() as i32;
            let h = (height * placement.scale_y * zoom).round() as i32;
            let (left, top) = (left.round() as i32, top.round() as i32);
            if let Some(fill) = fill {
                canvas.fill_rect(left, top, w, h, with_alpha(*fill, placement.alpha));
            }
            if let Some(stroke) = stroke {
                let thickness = (OUTLINE_WORLD_PX * placement.scale_x * zoom).round() as i32;
                canvas.stroke_rect(
                    left,
                    top,
                    w,
                    h,
                    thickness.max(1),
                    with_alpha(*stroke, placement.alpha),
                );
            }
        }
        NodeKind::Ellipse {
            cx,
            cy,
            rx,
            ry,
            fill,
        } => {
            let (wx, wy) = placement.apply(*cx, *cy);
            let (sx, sy) = stage.world_to_screen(wx, wy);
            canvas.fill_ellipse(
                sx,
                sy,
                rx * placement.scale_x * zoom,
                ry * placement.scale_y * zoom,
                with_alpha(*fill, placement.alpha),
            );
        }
        NodeKind::Label { text, color } => {
            let (sx, sy) = stage.world_to_screen(placement.x, placement.y);
            let scale = (LABEL_WORLD_SCALE * placement.scale_y * zoom).round() as i32;
            canvas.draw_text_centered(
                text,
                sx.round() as i32,
                sy.round() as i32,
                scale.max(1),
                with_alpha(*color, placement.alpha),
            );
        }
    });
}

/// Full-frame colour wash, used for the navigation fade.
pub fn paint_veil(canvas: &mut Canvas<'_>, color: Color, opacity: f32) {
    if opacity <= 0.0 {
        return;
    }
    let (width, height) = (canvas.width() as i32, canvas.height() as i32);
    canvas.fill_rect(0, 0, width, height, with_alpha(color, opacity));
}

/// Window-backed pixel surface.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    clear_color: Color,
}

impl Renderer {
    pub fn new(window: Arc<Window>, clear_color: Color) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            clear_color,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Clears, paints the tree, lets `overlay` draw screen-space UI on top,
    /// then presents.
    pub fn render(
        &mut self,
        tree: &DisplayTree,
        stage: StageTransform,
        overlay: impl FnOnce(&mut Canvas<'_>),
    ) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }
        let Viewport { width, height } = self.viewport;
        let mut canvas = Canvas::new(self.pixels.frame_mut(), width, height);
        canvas.clear(self.clear_color);
        paint_tree(&mut canvas, tree, stage);
        overlay(&mut canvas);
        self.pixels.render()
    }
}
