//! Painting the pattern grid onto a surface.

use macroquad::{color::Color, math::{vec2, Rect}};

use crate::{
    cursor::CursorPos,
    hit::{line_row, EffectArrow, HeaderHit, LineRow},
    layout::{Layout, Viewport},
    module::PatternStore,
    pattern::Column,
    redraw::{Body, RedrawPlan},
    selection::Selection,
    surface::{Surface, Target},
};

use super::theme::Theme;

/// Editor state that affects how the grid looks.
#[derive(Clone, Debug, Default)]
pub struct GridState {
    pub view: Viewport,
    pub cursor: CursorPos,
    /// Normalized.
    pub selection: Option<Selection>,
    /// Normalized.
    pub drag_target: Option<Selection>,
    pub focused: bool,
    /// Row highlight intervals; zero disables.
    pub highlight: (usize, usize),
    pub adjacent: bool,
    pub play: Option<(usize, usize)>,
    pub hover: Option<HeaderHit>,
}

pub struct Painter<'a> {
    pub layout: &'a Layout,
    pub theme: &'a Theme,
    pub store: &'a dyn PatternStore,
    pub state: &'a GridState,
}

impl Painter<'_> {
    /// Carries out a redraw plan.
    pub fn execute(&self, plan: &RedrawPlan, surface: &mut dyn Surface) {
        let layout = self.layout;
        match &plan.body {
            Body::Nothing => (),
            Body::Full { relayout } => {
                if *relayout || surface.size() != layout.size {
                    surface.resize(layout.size);
                }
                let body = layout.body_area();
                surface.fill_rect(Target::Back, body, self.theme.row_bg());
                for line in 0..layout.lines_visible {
                    self.draw_line(surface, line);
                }
                self.draw_header(surface);
                surface.present(Rect::new(0.0, 0.0, layout.size.x, layout.size.y));
            }
            Body::Scroll { rows, lines } => {
                let n = rows.unsigned_abs();
                let h = (layout.lines_visible - n) as f32 * layout.metrics.row_height;
                let (src, dst) = if *rows > 0 {
                    (Rect::new(0.0, layout.line_y(n), layout.size.x, h), vec2(0.0, layout.line_y(0)))
                } else {
                    (Rect::new(0.0, layout.line_y(0), layout.size.x, h), vec2(0.0, layout.line_y(n)))
                };
                surface.copy_within(src, dst);
                for &line in lines {
                    self.draw_line(surface, line);
                }
                surface.present(layout.body_area());
            }
            Body::Lines(lines) => {
                for &line in lines {
                    self.draw_line(surface, line);
                    surface.present(layout.line_rect(line));
                }
            }
            Body::Cursor { from, .. } => {
                if let Some(rect) = self.cursor_rect(from.0, from.1) {
                    surface.present(rect);
                }
            }
        }

        if plan.header && !matches!(plan.body, Body::Full { .. }) {
            self.draw_header(surface);
            surface.present(layout.header_area());
        }
        if plan.body != Body::Nothing {
            self.draw_cursor(surface);
        }
    }

    fn cursor_rect(&self, channel: usize, column: usize) -> Option<Rect> {
        let view = &self.state.view;
        let layout = self.layout;
        let visible = layout.channels_visible(view.first_channel);
        if channel < view.first_channel || channel >= view.first_channel + visible
            || column >= layout.channels[channel].columns {
            return None
        }
        Some(layout.cell_rect(view.first_channel, channel, column, layout.middle_line()))
    }

    /// Draws the cursor cell straight onto the front buffer.
    pub fn draw_cursor(&self, surface: &mut dyn Surface) {
        let cursor = &self.state.cursor;
        let Some(rect) = self.cursor_rect(cursor.channel, cursor.column) else { return };
        let cell = self.store.cell(cursor.frame, cursor.row, cursor.channel);
        surface.fill_rect(Target::Front, rect, self.theme.cursor_bg(self.state.focused));
        surface.draw_text(Target::Front, rect.point(),
            &cell.column_text(cursor.column_kind()), self.theme.cursor_fg());
    }

    fn row_bg(&self, line: usize, r: &LineRow) -> Color {
        let theme = self.theme;
        let (hl1, hl2) = self.state.highlight;
        if r.preview {
            theme.row_bg()
        } else if line == self.layout.middle_line() {
            theme.cursor_row_bg(self.state.focused)
        } else if hl2 > 0 && r.row % hl2 == 0 {
            theme.highlight2_bg()
        } else if hl1 > 0 && r.row % hl1 == 0 {
            theme.highlight1_bg()
        } else {
            theme.row_bg()
        }
    }

    fn column_fg(&self, column: Column) -> Color {
        match column {
            Column::Note => self.theme.note_fg(),
            Column::Instrument => self.theme.instrument_fg(),
            Column::Volume => self.theme.volume_fg(),
            Column::EffectType(_) | Column::EffectParam(_) => self.theme.effect_fg(),
        }
    }

    /// Draws one screen line into the back buffer.
    pub fn draw_line(&self, surface: &mut dyn Surface, line: usize) {
        let layout = self.layout;
        let theme = self.theme;
        let state = self.state;
        let rect = layout.line_rect(line);

        let Some(r) = line_row(self.store, layout, &state.view, line, state.adjacent) else {
            surface.fill_rect(Target::Back, rect, theme.row_bg());
            return
        };

        surface.fill_rect(Target::Back, rect, self.row_bg(line, &r));
        if state.play == Some((r.frame, r.row)) {
            surface.fill_rect(Target::Back, rect, theme.play_row_bg());
        }

        let shade = |c: Color| if r.preview { theme.shaded(c) } else { c };
        let y = rect.y;
        surface.draw_text(Target::Back, vec2(layout.metrics.char_width * 0.5, y),
            &format!("{:02X}", r.row), shade(theme.fg()));

        let first = state.view.first_channel;
        for channel in first..first + layout.channels_visible(first) {
            let x = layout.channel_x(channel, first);
            surface.fill_rect(Target::Back, Rect::new(x, y, 1.0, rect.h), theme.border());
            let cell = self.store.cell(r.frame, r.row, channel);
            for column in 0..layout.channels[channel].columns {
                let pos = CursorPos { frame: r.frame, row: r.row, channel, column };
                let cell_rect = layout.cell_rect(first, channel, column, line);
                if state.drag_target.is_some_and(|t| t.contains(&pos)) {
                    surface.fill_rect(Target::Back, cell_rect, theme.drag_bg());
                } else if state.selection.is_some_and(|s| s.contains(&pos)) {
                    surface.fill_rect(Target::Back, cell_rect, theme.selection_bg());
                }
                let kind = Column::from_index(column);
                surface.draw_text(Target::Back, cell_rect.point(), &cell.column_text(kind),
                    shade(self.column_fg(kind)));
            }
        }
    }

    /// Draws channel names and effect column arrows into the back buffer.
    pub fn draw_header(&self, surface: &mut dyn Surface) {
        let layout = self.layout;
        let theme = self.theme;
        let m = &layout.metrics;
        surface.fill_rect(Target::Back, layout.header_area(), theme.header_bg());

        let first = self.state.view.first_channel;
        for channel in first..first + layout.channels_visible(first) {
            let x = layout.channel_x(channel, first);
            surface.fill_rect(Target::Back, Rect::new(x, 0.0, 1.0, layout.header_height),
                theme.border());
            surface.draw_text(Target::Back, vec2(x + m.gap(), 0.0),
                self.store.channel_name(channel), theme.fg());
            surface.draw_text(Target::Back, vec2(x + m.gap(), m.row_height),
                &format!("fx{}", self.store.effect_columns(channel)), theme.volume_fg());

            let hover = self.state.hover
                .filter(|h| h.channel == channel)
                .and_then(|h| h.arrow);
            let (remove, add) = layout.effect_arrows(first, channel);
            for (rect, text, arrow) in [(remove, "<", EffectArrow::Remove), (add, ">", EffectArrow::Add)] {
                let color = if hover == Some(arrow) { theme.accent1_fg() } else { theme.fg() };
                surface.draw_text(Target::Back, rect.point(), text, color);
            }
        }
    }
}
