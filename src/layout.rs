//! Grid geometry: where channels, columns and lines sit on screen.

use macroquad::math::{Rect, Vec2};

use crate::pattern::Column;

/// Characters reserved for the row number column, including padding.
pub const ROW_NUMBER_CHARS: usize = 3;

/// Lines of text in the channel header.
pub const HEADER_LINES: usize = 2;

/// Size of a character cell in the grid font.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FontMetrics {
    pub char_width: f32,
    pub row_height: f32,
}

impl FontMetrics {
    pub fn new(char_width: f32, row_height: f32) -> Self {
        Self {
            char_width: char_width.max(1.0),
            row_height: row_height.max(1.0),
        }
    }

    /// Horizontal space between columns.
    pub fn gap(&self) -> f32 {
        (self.char_width * 0.5).round().max(1.0)
    }
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self::new(8.0, 14.0)
    }
}

/// Which part of the song the grid is showing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Viewport {
    pub frame: usize,
    /// Row drawn on the middle line.
    pub center_row: usize,
    pub first_channel: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelGeometry {
    /// Offset from the left edge of the first channel.
    pub x: f32,
    pub width: f32,
    pub columns: usize,
}

/// Cached geometry for the current window, font and channel setup.
/// Replaced wholesale when any of those change.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    pub size: Vec2,
    pub metrics: FontMetrics,
    pub channels: Vec<ChannelGeometry>,
    pub header_height: f32,
    pub row_number_width: f32,
    /// Lines that are at least partly visible.
    pub lines_visible: usize,
    /// Lines that are fully visible.
    pub lines_full_visible: usize,
}

/// Returns the x offset of a column within its channel.
pub fn column_x(column: usize, metrics: &FontMetrics) -> f32 {
    let mut x = metrics.gap();
    for i in 0..column {
        let c = Column::from_index(i);
        x += c.chars() as f32 * metrics.char_width;
        if c.gap_after() {
            x += metrics.gap();
        }
    }
    x
}

/// Returns the width of a column's text.
pub fn column_width(column: usize, metrics: &FontMetrics) -> f32 {
    Column::from_index(column).chars() as f32 * metrics.char_width
}

/// Returns the width of a channel with `columns` cursor columns.
pub fn channel_width(columns: usize, metrics: &FontMetrics) -> f32 {
    column_x(columns, metrics)
}

impl Layout {
    pub fn compute(size: Vec2, channel_columns: &[usize], metrics: FontMetrics) -> Self {
        let mut x = 0.0;
        let channels = channel_columns.iter().map(|&columns| {
            let width = channel_width(columns, &metrics);
            let geometry = ChannelGeometry { x, width, columns };
            x += width;
            geometry
        }).collect();

        let header_height = HEADER_LINES as f32 * metrics.row_height + metrics.gap();
        let pattern_height = (size.y - header_height).max(0.0);
        let lines = pattern_height / metrics.row_height;

        Self {
            size,
            metrics,
            channels,
            header_height,
            row_number_width: ROW_NUMBER_CHARS as f32 * metrics.char_width,
            lines_visible: lines.ceil() as usize,
            lines_full_visible: lines.floor() as usize,
        }
    }

    /// Returns true if nothing can be drawn.
    pub fn is_empty(&self) -> bool {
        self.lines_visible == 0 || self.size.x <= self.row_number_width
    }

    /// Number of cursor columns per channel, as passed to `compute`.
    pub fn channel_columns(&self) -> Vec<usize> {
        self.channels.iter().map(|c| c.columns).collect()
    }

    /// Index of the line that shows the center row.
    pub fn middle_line(&self) -> usize {
        self.lines_visible / 2
    }

    /// Total width of all channels.
    pub fn pattern_width(&self) -> f32 {
        self.channels.last().map(|c| c.x + c.width).unwrap_or(0.0)
    }

    pub fn header_area(&self) -> Rect {
        Rect::new(0.0, 0.0, self.size.x, self.header_height)
    }

    /// Area below the header, including the row number column.
    pub fn body_area(&self) -> Rect {
        Rect::new(0.0, self.header_height, self.size.x,
            (self.size.y - self.header_height).max(0.0))
    }

    /// Width available to channels.
    pub fn channel_area_width(&self) -> f32 {
        (self.size.x - self.row_number_width).max(0.0)
    }

    /// Screen x of a channel's left edge, given the first visible channel.
    pub fn channel_x(&self, channel: usize, first_channel: usize) -> f32 {
        self.row_number_width + self.channels[channel].x - self.channels[first_channel].x
    }

    /// Number of channels at least partly visible from `first_channel`.
    pub fn channels_visible(&self, first_channel: usize) -> usize {
        let Some(first) = self.channels.get(first_channel) else { return 0 };
        let width = self.channel_area_width();
        self.channels[first_channel..].iter()
            .take_while(|c| c.x - first.x < width)
            .count()
    }

    /// Number of channels fully visible from `first_channel`.
    pub fn channels_full_visible(&self, first_channel: usize) -> usize {
        let Some(first) = self.channels.get(first_channel) else { return 0 };
        let width = self.channel_area_width();
        self.channels[first_channel..].iter()
            .take_while(|c| c.x - first.x + c.width <= width)
            .count()
    }

    /// Returns the lowest first channel that keeps `channel` fully visible,
    /// moving as little as possible from `first_channel`.
    pub fn scroll_to_channel(&self, channel: usize, first_channel: usize) -> usize {
        if channel < first_channel {
            return channel
        }
        let mut first = first_channel;
        while first < channel && self.channels_full_visible(first) + first <= channel {
            first += 1;
        }
        first
    }

    /// Screen y of a line's top edge.
    pub fn line_y(&self, line: usize) -> f32 {
        self.header_height + line as f32 * self.metrics.row_height
    }

    /// Full-width rectangle of a line.
    pub fn line_rect(&self, line: usize) -> Rect {
        Rect::new(0.0, self.line_y(line), self.size.x, self.metrics.row_height)
    }

    /// Rectangle covering a channel's part of a line.
    pub fn channel_rect(&self, first_channel: usize, channel: usize, line: usize) -> Rect {
        Rect::new(self.channel_x(channel, first_channel), self.line_y(line),
            self.channels[channel].width, self.metrics.row_height)
    }

    /// Rectangle of a single cursor column on a line.
    pub fn cell_rect(&self, first_channel: usize, channel: usize, column: usize,
        line: usize
    ) -> Rect {
        Rect::new(
            self.channel_x(channel, first_channel) + column_x(column, &self.metrics),
            self.line_y(line),
            column_width(column, &self.metrics),
            self.metrics.row_height,
        )
    }

    /// Returns the column under an x offset within a channel. The leading
    /// gap belongs to the first column and trailing gaps to the column
    /// before them.
    pub fn column_at(&self, channel: usize, x: f32) -> usize {
        let columns = self.channels[channel].columns;
        (0..columns)
            .find(|&i| i + 1 == columns || x < column_x(i + 1, &self.metrics))
            .unwrap_or(0)
    }

    /// Returns the remove and add arrow rectangles in a channel header.
    pub fn effect_arrows(&self, first_channel: usize, channel: usize) -> (Rect, Rect) {
        let m = &self.metrics;
        let right = self.channel_x(channel, first_channel) + self.channels[channel].width
            - m.gap();
        let y = m.row_height;
        (
            Rect::new(right - 2.0 * m.char_width, y, m.char_width, m.row_height),
            Rect::new(right - m.char_width, y, m.char_width, m.row_height),
        )
    }
}
