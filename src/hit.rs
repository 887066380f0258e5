//! Translation between screen points and grid positions.

use macroquad::math::{vec2, Vec2};

use crate::{cursor::CursorPos, layout::{column_x, Layout, Viewport}, module::PatternStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Region {
    Header,
    Pattern,
    Outside,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectArrow {
    Remove,
    Add,
}

/// A point over a channel header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeaderHit {
    pub channel: usize,
    pub arrow: Option<EffectArrow>,
}

/// Song row shown on a screen line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineRow {
    pub frame: usize,
    pub row: usize,
    /// The row belongs to an adjacent frame.
    pub preview: bool,
}

/// Resolves the row shown on `line`, if any. Rows outside the viewed frame
/// resolve only when adjacent frames are shown.
pub fn line_row(store: &dyn PatternStore, layout: &Layout, view: &Viewport,
    line: usize, adjacent: bool
) -> Option<LineRow> {
    let row = view.center_row as isize + line as isize - layout.middle_line() as isize;
    let len = store.pattern_length(view.frame) as isize;

    if (0..len).contains(&row) {
        Some(LineRow { frame: view.frame, row: row as usize, preview: false })
    } else if !adjacent {
        None
    } else if row < 0 {
        let frame = view.frame.checked_sub(1)?;
        let row = store.pattern_length(frame) as isize + row;
        (row >= 0).then_some(LineRow { frame, row: row as usize, preview: true })
    } else {
        let frame = view.frame + 1;
        if frame >= store.frame_count() {
            return None
        }
        let row = row - len;
        (row < store.pattern_length(frame) as isize)
            .then_some(LineRow { frame, row: row as usize, preview: true })
    }
}

/// Hit-tester for one layout and viewport.
pub struct HitTester<'a> {
    pub layout: &'a Layout,
    pub view: Viewport,
    pub adjacent: bool,
}

impl<'a> HitTester<'a> {
    pub fn new(layout: &'a Layout, view: Viewport, adjacent: bool) -> Self {
        Self { layout, view, adjacent }
    }

    /// Returns which area of the grid a point is in. The row number column
    /// counts as outside.
    pub fn classify(&self, point: Vec2) -> Region {
        let size = self.layout.size;
        if point.x < 0.0 || point.y < 0.0 || point.x >= size.x || point.y >= size.y
            || self.channel_at(point.x).is_none() {
            Region::Outside
        } else if point.y < self.layout.header_height {
            Region::Header
        } else {
            Region::Pattern
        }
    }

    /// Returns the visible channel under an x coordinate.
    pub fn channel_at(&self, x: f32) -> Option<usize> {
        let layout = self.layout;
        if x < layout.row_number_width || x >= layout.size.x {
            return None
        }
        let first = layout.channels.get(self.view.first_channel)?;
        let rel = x - layout.row_number_width + first.x;
        layout.channels.iter().enumerate()
            .skip(self.view.first_channel)
            .find(|(_, c)| rel >= c.x && rel < c.x + c.width)
            .map(|(i, _)| i)
    }

    /// Returns the screen line under a y coordinate in the pattern area.
    pub fn line_at(&self, y: f32) -> Option<usize> {
        let layout = self.layout;
        if y < layout.header_height {
            return None
        }
        let line = ((y - layout.header_height) / layout.metrics.row_height) as usize;
        (line < layout.lines_visible).then_some(line)
    }

    pub fn point_to_cursor(&self, point: Vec2, store: &dyn PatternStore) -> Option<CursorPos> {
        if self.classify(point) != Region::Pattern {
            return None
        }
        let channel = self.channel_at(point.x)?;
        let line = self.line_at(point.y)?;
        let LineRow { frame, row, .. } =
            line_row(store, self.layout, &self.view, line, self.adjacent)?;
        let x = point.x - self.layout.channel_x(channel, self.view.first_channel);
        let column = self.layout.column_at(channel, x);
        Some(CursorPos { frame, row, channel, column })
    }

    /// Like `point_to_cursor`, but clamps points outside the pattern area
    /// onto its edges. Used while dragging out a selection.
    pub fn point_to_cursor_clamped(&self, point: Vec2, store: &dyn PatternStore) -> CursorPos {
        let layout = self.layout;
        let last_line = layout.lines_full_visible.max(1).min(layout.lines_visible.max(1)) - 1;
        let visible = layout.channels_visible(self.view.first_channel).max(1);
        let last_channel = self.view.first_channel + visible - 1;
        let left = layout.row_number_width;
        let right = layout.channel_x(last_channel, self.view.first_channel)
            + layout.channels[last_channel].width;
        let p = vec2(
            point.x.clamp(left, (right.min(layout.size.x) - 1.0).max(left)),
            point.y.clamp(layout.line_y(0), layout.line_y(last_line + 1) - 1.0),
        );
        self.point_to_cursor(p, store).unwrap_or_else(|| {
            // lines past the pattern end with no preview
            let mut pos = CursorPos {
                frame: self.view.frame,
                row: self.view.center_row,
                channel: self.channel_at(p.x).unwrap_or(self.view.first_channel),
                column: 0,
            };
            let line = self.line_at(p.y).unwrap_or(0);
            if line < layout.middle_line() {
                pos.row = 0;
            } else {
                pos.row = store.pattern_length(pos.frame) - 1;
            }
            let x = p.x - layout.channel_x(pos.channel, self.view.first_channel);
            pos.column = layout.column_at(pos.channel, x);
            pos
        })
    }

    /// Returns the top-left point of a cursor position, if it's on screen.
    pub fn cursor_to_point(&self, pos: &CursorPos, store: &dyn PatternStore) -> Option<Vec2> {
        let layout = self.layout;
        let view = &self.view;
        let offset = if pos.frame == view.frame {
            pos.row as isize - view.center_row as isize
        } else if self.adjacent && pos.frame + 1 == view.frame {
            pos.row as isize - store.pattern_length(pos.frame) as isize
                - view.center_row as isize
        } else if self.adjacent && pos.frame == view.frame + 1 {
            store.pattern_length(view.frame) as isize + pos.row as isize
                - view.center_row as isize
        } else {
            return None
        };
        let line = layout.middle_line() as isize + offset;
        if line < 0 || line >= layout.lines_visible as isize {
            return None
        }
        if pos.channel < view.first_channel
            || pos.channel >= view.first_channel + layout.channels_visible(view.first_channel) {
            return None
        }
        let x = layout.channel_x(pos.channel, view.first_channel)
            + column_x(pos.column, &layout.metrics);
        if x >= layout.size.x {
            return None
        }
        Some(vec2(x, layout.line_y(line as usize)))
    }

    /// Returns the channel header under a point, and the effect arrow if
    /// the point is on one.
    pub fn header_hit(&self, point: Vec2) -> Option<HeaderHit> {
        if self.classify(point) != Region::Header {
            return None
        }
        let channel = self.channel_at(point.x)?;
        let (remove, add) = self.layout.effect_arrows(self.view.first_channel, channel);
        let arrow = if remove.contains(point) {
            Some(EffectArrow::Remove)
        } else if add.contains(point) {
            Some(EffectArrow::Add)
        } else {
            None
        };
        Some(HeaderHit { channel, arrow })
    }
}

#[cfg(test)]
mod tests {
    use crate::{layout::FontMetrics, module::Module, pattern::{Cell, Effect}};

    use super::*;

    const CHANNELS: &[&str] = &["A", "B", "C", "D"];

    fn setup() -> (Module, Layout) {
        let mut module = Module::new(CHANNELS, 3, 16);
        module.set_effect_columns(1, 3);
        let columns: Vec<_> = (0..4)
            .map(|c| crate::pattern::column_count(module.effect_columns(c)))
            .collect();
        // header is 24px, 11 lines of 10px, 330px of channel space
        let layout = Layout::compute(vec2(354.0, 134.0), &columns,
            FontMetrics::new(8.0, 10.0));
        (module, layout)
    }

    #[test]
    fn test_classify() {
        let (_, layout) = setup();
        let hit = HitTester::new(&layout, Viewport::default(), false);
        assert_eq!(hit.classify(vec2(30.0, 5.0)), Region::Header);
        assert_eq!(hit.classify(vec2(30.0, 50.0)), Region::Pattern);
        assert_eq!(hit.classify(vec2(5.0, 50.0)), Region::Outside);
        assert_eq!(hit.classify(vec2(-1.0, 50.0)), Region::Outside);
        assert_eq!(hit.classify(vec2(30.0, 500.0)), Region::Outside);
    }

    #[test]
    fn test_point_to_cursor() {
        let (module, layout) = setup();
        let view = Viewport { frame: 1, center_row: 8, first_channel: 0 };
        let hit = HitTester::new(&layout, view, false);
        // middle line is 5, so line 0 is row 3
        let pos = hit.point_to_cursor(vec2(25.0, 25.0), &module);
        assert_eq!(pos, Some(CursorPos::new(1, 3, 0, 0)));
        let x = layout.channel_x(1, 0) + column_x(4, &layout.metrics) + 1.0;
        let pos = hit.point_to_cursor(vec2(x, layout.line_y(7) + 3.0), &module);
        assert_eq!(pos, Some(CursorPos::new(1, 10, 1, 4)));
    }

    #[test]
    fn test_adjacent_frames() {
        let (module, layout) = setup();
        let view = Viewport { frame: 1, center_row: 1, first_channel: 0 };
        let y = layout.line_y(0) + 1.0;

        let hit = HitTester::new(&layout, view, false);
        assert_eq!(hit.point_to_cursor(vec2(25.0, y), &module), None);

        let hit = HitTester::new(&layout, view, true);
        assert_eq!(hit.point_to_cursor(vec2(25.0, y), &module),
            Some(CursorPos::new(0, 12, 0, 0)));

        // the first frame has nothing before it
        let view = Viewport { frame: 0, ..view };
        let hit = HitTester::new(&layout, view, true);
        assert_eq!(hit.point_to_cursor(vec2(25.0, y), &module), None);
    }

    #[test]
    fn test_line_row_after_short_pattern() {
        let (mut module, layout) = setup();
        module.set_cell(1, 3, 0, Cell {
            effects: [Some(Effect::new('C', 0)), None, None, None],
            ..Cell::EMPTY
        });
        let view = Viewport { frame: 1, center_row: 3, first_channel: 0 };
        assert_eq!(line_row(&module, &layout, &view, 6, true),
            Some(LineRow { frame: 2, row: 0, preview: true }));
        assert_eq!(line_row(&module, &layout, &view, 6, false), None);
        assert_eq!(line_row(&module, &layout, &view, 5, false),
            Some(LineRow { frame: 1, row: 3, preview: false }));
    }

    #[test]
    fn test_cursor_point_round_trip() {
        let (module, layout) = setup();
        for adjacent in [false, true] {
            for first_channel in 0..2 {
                let view = Viewport { frame: 1, center_row: 2, first_channel };
                let hit = HitTester::new(&layout, view, adjacent);
                for line in 0..layout.lines_visible {
                    let Some(r) = line_row(&module, &layout, &view, line, adjacent) else {
                        continue
                    };
                    for channel in 0..module.channel_count() {
                        for column in 0..layout.channels[channel].columns {
                            let pos = CursorPos::new(r.frame, r.row, channel, column);
                            if let Some(p) = hit.cursor_to_point(&pos, &module) {
                                assert_eq!(hit.point_to_cursor(p, &module), Some(pos));
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_offscreen_cursor() {
        let (module, layout) = setup();
        let view = Viewport { frame: 1, center_row: 8, first_channel: 1 };
        let hit = HitTester::new(&layout, view, false);
        assert_eq!(hit.cursor_to_point(&CursorPos::new(1, 8, 0, 0), &module), None);
        assert_eq!(hit.cursor_to_point(&CursorPos::new(1, 0, 1, 0), &module), None);
        assert_eq!(hit.cursor_to_point(&CursorPos::new(2, 8, 1, 0), &module), None);
        assert!(hit.cursor_to_point(&CursorPos::new(1, 8, 1, 0), &module).is_some());
    }

    #[test]
    fn test_header_hit() {
        let (_, layout) = setup();
        let hit = HitTester::new(&layout, Viewport::default(), false);
        let (remove, add) = layout.effect_arrows(0, 1);
        assert_eq!(hit.header_hit(remove.center()),
            Some(HeaderHit { channel: 1, arrow: Some(EffectArrow::Remove) }));
        assert_eq!(hit.header_hit(add.center()),
            Some(HeaderHit { channel: 1, arrow: Some(EffectArrow::Add) }));
        assert_eq!(hit.header_hit(vec2(layout.channel_x(1, 0) + 2.0, 2.0)),
            Some(HeaderHit { channel: 1, arrow: None }));
        assert_eq!(hit.header_hit(vec2(30.0, 50.0)), None);
    }

    #[test]
    fn test_clamped_point() {
        let (module, layout) = setup();
        let view = Viewport { frame: 1, center_row: 8, first_channel: 0 };
        let hit = HitTester::new(&layout, view, false);
        let pos = hit.point_to_cursor_clamped(vec2(-50.0, -50.0), &module);
        assert_eq!(pos, CursorPos::new(1, 3, 0, 0));
    }
}
