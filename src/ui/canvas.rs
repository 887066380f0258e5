//! Render-target backed drawing surface.

use macroquad::prelude::*;

use crate::{layout::FontMetrics, surface::{Surface, Target}};

/// Double-buffered offscreen canvas. The front buffer persists between
/// frames and is blitted to the screen every frame.
pub struct Canvas {
    back: RenderTarget,
    front: RenderTarget,
    scratch: RenderTarget,
    size: Vec2,
    font_size: u16,
    baseline: f32,
}

fn new_target(size: Vec2) -> RenderTarget {
    let rt = render_target(size.x.max(1.0) as u32, size.y.max(1.0) as u32);
    rt.texture.set_filter(FilterMode::Nearest);
    rt
}

/// Measures the default font at `font_size`.
pub fn font_metrics(font_size: u16) -> FontMetrics {
    let dim = measure_text("0", None, font_size, 1.0);
    FontMetrics::new(dim.width.round(), (font_size as f32 * 1.2).round())
}

impl Canvas {
    pub fn new(size: Vec2, font_size: u16) -> Self {
        let dim = measure_text("X", None, font_size, 1.0);
        let metrics = font_metrics(font_size);
        Self {
            back: new_target(size),
            front: new_target(size),
            scratch: new_target(size),
            size,
            font_size,
            baseline: ((metrics.row_height + dim.height) * 0.5).round(),
        }
    }

    fn target(&self, target: Target) -> &RenderTarget {
        match target {
            Target::Back => &self.back,
            Target::Front => &self.front,
        }
    }

    fn begin(&self, rt: &RenderTarget) {
        let mut camera = Camera2D::from_display_rect(Rect::new(0.0, 0.0, self.size.x, self.size.y));
        camera.render_target = Some(rt.clone());
        set_camera(&camera);
    }

    fn blit(&self, from: &RenderTarget, to: &RenderTarget, src: Rect, dst: Vec2) {
        self.begin(to);
        draw_texture_ex(&from.texture, dst.x, dst.y, WHITE, DrawTextureParams {
            source: Some(src),
            dest_size: Some(src.size()),
            ..Default::default()
        });
        set_default_camera();
    }

    /// Draws the front buffer to the window.
    pub fn draw_to_screen(&self) {
        draw_texture_ex(&self.front.texture, 0.0, 0.0, WHITE, DrawTextureParams {
            dest_size: Some(self.size),
            flip_y: true,
            ..Default::default()
        });
    }
}

impl Surface for Canvas {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn resize(&mut self, size: Vec2) {
        log::debug!("canvas resized to {}x{}", size.x, size.y);
        self.back = new_target(size);
        self.front = new_target(size);
        self.scratch = new_target(size);
        self.size = size;
    }

    fn fill_rect(&mut self, target: Target, rect: Rect, color: Color) {
        self.begin(self.target(target));
        draw_rectangle(rect.x, rect.y, rect.w, rect.h, color);
        set_default_camera();
    }

    fn draw_text(&mut self, target: Target, pos: Vec2, text: &str, color: Color) {
        self.begin(self.target(target));
        draw_text_ex(text, pos.x, pos.y + self.baseline, TextParams {
            font_size: self.font_size,
            color,
            ..Default::default()
        });
        set_default_camera();
    }

    fn copy_within(&mut self, src: Rect, dst: Vec2) {
        // a target can't sample itself, so go through scratch
        self.blit(&self.back, &self.scratch, src, src.point());
        self.blit(&self.scratch, &self.back, src, dst);
    }

    fn present(&mut self, rect: Rect) {
        self.blit(&self.back, &self.front, rect, rect.point());
    }
}
