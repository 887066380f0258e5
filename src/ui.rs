//! Drawing: colors, the grid painter and the window canvas.

pub mod canvas;
pub mod pattern;
pub mod theme;
