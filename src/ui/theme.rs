//! Color themes.

use std::{error::Error, path::Path};

use macroquad::color::Color;
use palette::{FromColor, Lchuv, Srgb};
use serde::{Deserialize, Serialize};

const DEFAULT_ACCENT1_HUE: f32 = 180.0;
const DEFAULT_ACCENT2_HUE: f32 = -90.0;
const DEFAULT_ACCENT_CHROMA: f32 = 45.0;

const HEADER_L_OFFSET: f32 = 4.0;
const HIGHLIGHT1_L_OFFSET: f32 = 4.0;
const HIGHLIGHT2_L_OFFSET: f32 = 8.0;
const CURSOR_ROW_L_OFFSET: f32 = 12.0;
const ACCENT_L_OFFSET: f32 = 15.0;

const ACCENT_BG_CHROMA_MULTIPLIER: f32 = 1.0/3.0;
const SHADE_MIX: f32 = 0.6;

/// Color theme using four seed colors. Seed colors use the CIE L*C*uv h°uv
/// color space, which is cylindrical and perceptually uniform. (Although in
/// practice, we gamma correct.)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Theme {
    pub fg: Lchuv,
    pub bg: Lchuv,
    /// Selection and cursor.
    pub accent1: Lchuv,
    /// Effects, drag targets and the play row.
    pub accent2: Lchuv,
    pub gamma: f32,
}

impl Theme {
    /// Returns the default light theme.
    pub fn light(gamma: f32) -> Theme {
        Theme {
            fg: Lchuv::new(10.0, 0.0, 0.0),
            bg: Lchuv::new(95.0, 0.0, 0.0),
            accent1: Lchuv::new(50.0, DEFAULT_ACCENT_CHROMA, DEFAULT_ACCENT1_HUE),
            accent2: Lchuv::new(50.0, DEFAULT_ACCENT_CHROMA, DEFAULT_ACCENT2_HUE),
            gamma,
        }
    }

    /// Returns the default dark theme.
    pub fn dark(gamma: f32) -> Theme {
        Theme {
            fg: Lchuv::new(90.0, 0.0, 0.0),
            bg: Lchuv::new(5.0, 0.0, 0.0),
            accent1: Lchuv::new(50.0, DEFAULT_ACCENT_CHROMA, DEFAULT_ACCENT1_HUE),
            accent2: Lchuv::new(50.0, DEFAULT_ACCENT_CHROMA, DEFAULT_ACCENT2_HUE),
            gamma,
        }
    }

    /// Load theme from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&s)?)
    }

    /// Save theme to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn Error>> {
        let s = toml::to_string_pretty(self)?;
        Ok(std::fs::write(path, s)?)
    }

    fn is_light(&self) -> bool {
        self.bg.l >= 50.0
    }

    fn sign(&self) -> f32 {
        if self.is_light() { -1.0 } else { 1.0 }
    }

    pub fn fg(&self) -> Color {
        self.color_from_lchuv(self.fg)
    }

    /// Text color for rows of adjacent frames.
    pub fn shaded(&self, color: Color) -> Color {
        let bg = self.row_bg();
        Color::new(
            color.r + (bg.r - color.r) * SHADE_MIX,
            color.g + (bg.g - color.g) * SHADE_MIX,
            color.b + (bg.b - color.b) * SHADE_MIX,
            1.0,
        )
    }

    fn accent_bg(&self, accent: Lchuv) -> Color {
        let c = Lchuv::new(self.bg.l + self.sign() * ACCENT_L_OFFSET,
            accent.chroma * ACCENT_BG_CHROMA_MULTIPLIER, accent.hue);
        self.color_from_lchuv(c)
    }

    fn accent_fg(&self, accent: Lchuv) -> Color {
        let c = Lchuv::new(self.fg.l - self.sign() * ACCENT_L_OFFSET,
            accent.chroma, accent.hue);
        self.color_from_lchuv(c)
    }

    pub fn accent1_fg(&self) -> Color {
        self.accent_fg(self.accent1)
    }

    pub fn accent2_fg(&self) -> Color {
        self.accent_fg(self.accent2)
    }

    fn bg_plus(&self, offset: f32) -> Color {
        let bg = Lchuv::new(self.bg.l + self.sign() * offset, self.bg.chroma, self.bg.hue);
        self.color_from_lchuv(bg)
    }

    pub fn row_bg(&self) -> Color {
        self.color_from_lchuv(self.bg)
    }

    /// Background of rows on the first highlight interval.
    pub fn highlight1_bg(&self) -> Color {
        self.bg_plus(HIGHLIGHT1_L_OFFSET)
    }

    /// Background of rows on the second highlight interval.
    pub fn highlight2_bg(&self) -> Color {
        self.bg_plus(HIGHLIGHT2_L_OFFSET)
    }

    pub fn cursor_row_bg(&self, focused: bool) -> Color {
        if focused {
            self.bg_plus(CURSOR_ROW_L_OFFSET)
        } else {
            self.bg_plus(HIGHLIGHT2_L_OFFSET)
        }
    }

    pub fn header_bg(&self) -> Color {
        self.bg_plus(HEADER_L_OFFSET)
    }

    pub fn selection_bg(&self) -> Color {
        self.accent_bg(self.accent1)
    }

    pub fn drag_bg(&self) -> Color {
        self.accent_bg(self.accent2)
    }

    pub fn play_row_bg(&self) -> Color {
        Color { a: 0.25, ..self.accent2_fg() }
    }

    pub fn cursor_bg(&self, focused: bool) -> Color {
        if focused {
            self.accent1_fg()
        } else {
            self.border()
        }
    }

    pub fn cursor_fg(&self) -> Color {
        self.row_bg()
    }

    pub fn border(&self) -> Color {
        let c = Lchuv::new(
            (self.bg.l + self.fg.l) * 0.5,
            (self.bg.chroma + self.fg.chroma) * 0.5,
            self.bg.hue);
        self.color_from_lchuv(c)
    }

    pub fn note_fg(&self) -> Color {
        self.fg()
    }

    pub fn instrument_fg(&self) -> Color {
        self.accent1_fg()
    }

    pub fn volume_fg(&self) -> Color {
        self.border()
    }

    pub fn effect_fg(&self) -> Color {
        self.accent2_fg()
    }

    fn color_from_lchuv(&self, lchuv: Lchuv) -> Color {
        let lchuv = Lchuv {
            l: (lchuv.l * 0.01).powf(1.0/self.gamma) * 100.0,
            ..lchuv
        };
        let rgb = Srgb::from_color(lchuv);
        Color::new(rgb.red, rgb.green, rgb.blue, 1.0)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark(1.8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("theme.toml");
        let theme = Theme::light(2.0);
        theme.save(&path).unwrap();
        assert_eq!(Theme::load(&path).unwrap(), theme);
        assert!(Theme::load(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_highlights_differ() {
        for theme in [Theme::light(1.8), Theme::dark(1.8)] {
            assert_ne!(theme.row_bg(), theme.highlight1_bg());
            assert_ne!(theme.highlight1_bg(), theme.highlight2_bg());
            assert_ne!(theme.cursor_row_bg(true), theme.cursor_row_bg(false));
        }
    }
}
