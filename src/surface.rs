//! Drawing target for the grid painter.

use macroquad::{color::Color, math::{Rect, Vec2}};

/// Which buffer a drawing call goes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// Offscreen buffer holding everything but the cursor cell.
    Back,
    /// What the user sees.
    Front,
}

/// A double-buffered drawing surface. Coordinates are window pixels.
pub trait Surface {
    fn size(&self) -> Vec2;
    /// Reallocates both buffers. Contents are undefined afterward.
    fn resize(&mut self, size: Vec2);
    fn fill_rect(&mut self, target: Target, rect: Rect, color: Color);
    /// Draws text with its top-left corner at `pos`.
    fn draw_text(&mut self, target: Target, pos: Vec2, text: &str, color: Color);
    /// Moves a region of the back buffer to `dst`.
    fn copy_within(&mut self, src: Rect, dst: Vec2);
    /// Copies a region of the back buffer to the front.
    fn present(&mut self, rect: Rect);
}

#[cfg(test)]
pub mod recording {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    pub enum Op {
        Resize(Vec2),
        Fill(Target, Rect, Color),
        Text(Target, Vec2, String, Color),
        Copy(Rect, Vec2),
        Present(Rect),
    }

    /// Surface that records calls.
    #[derive(Default)]
    pub struct RecordingSurface {
        pub size: Vec2,
        pub ops: Vec<Op>,
    }

    impl RecordingSurface {
        pub fn new(size: Vec2) -> Self {
            Self { size, ops: Vec::new() }
        }

        pub fn take(&mut self) -> Vec<Op> {
            std::mem::take(&mut self.ops)
        }

        /// Text drawn to a target, in call order.
        pub fn texts(&self, target: Target) -> Vec<&str> {
            self.ops.iter().filter_map(|op| match op {
                Op::Text(t, _, s, _) if *t == target => Some(s.as_str()),
                _ => None,
            }).collect()
        }

        pub fn count(&self, f: impl Fn(&Op) -> bool) -> usize {
            self.ops.iter().filter(|op| f(op)).count()
        }
    }

    impl Surface for RecordingSurface {
        fn size(&self) -> Vec2 {
            self.size
        }

        fn resize(&mut self, size: Vec2) {
            self.size = size;
            self.ops.push(Op::Resize(size));
        }

        fn fill_rect(&mut self, target: Target, rect: Rect, color: Color) {
            self.ops.push(Op::Fill(target, rect, color));
        }

        fn draw_text(&mut self, target: Target, pos: Vec2, text: &str, color: Color) {
            self.ops.push(Op::Text(target, pos, text.to_owned(), color));
        }

        fn copy_within(&mut self, src: Rect, dst: Vec2) {
            self.ops.push(Op::Copy(src, dst));
        }

        fn present(&mut self, rect: Rect) {
            self.ops.push(Op::Present(rect));
        }
    }
}
