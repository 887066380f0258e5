//! Cursor position within the pattern grid and its movement rules.

use crate::{module::PatternStore, pattern::{column_count, Column, Field}};

/// Location of the edit cursor. Positions handed out by this module always
/// refer to an existing frame, row, channel and column of the store they
/// were normalized against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CursorPos {
    pub frame: usize,
    pub row: usize,
    pub channel: usize,
    pub column: usize,
}

/// Edge behavior for cursor movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WrapPolicy {
    /// Wrap horizontally around the channel list, and vertically within a
    /// pattern when frame wrapping is off.
    pub cursor: bool,
    /// Move into adjacent frames when stepping past a pattern edge.
    pub frames: bool,
}

impl Default for WrapPolicy {
    fn default() -> Self {
        Self { cursor: true, frames: true }
    }
}

/// Returns the number of cursor columns in a channel. Panics if the channel
/// doesn't exist.
pub fn channel_columns(store: &dyn PatternStore, channel: usize) -> usize {
    assert!(channel < store.channel_count(),
        "channel {} out of range ({} channels)", channel, store.channel_count());
    column_count(store.effect_columns(channel))
}

impl CursorPos {
    pub fn new(frame: usize, row: usize, channel: usize, column: usize) -> Self {
        Self { frame, row, channel, column }
    }

    /// Returns the column kind under the cursor.
    pub fn column_kind(&self) -> Column {
        Column::from_index(self.column)
    }

    /// Returns the cell field under the cursor.
    pub fn field(&self) -> Field {
        self.column_kind().field()
    }

    /// Returns a copy clamped to the bounds of `store`.
    pub fn clamped(self, store: &dyn PatternStore) -> Self {
        let frame = self.frame.min(store.frame_count().saturating_sub(1));
        let channel = self.channel.min(store.channel_count().saturating_sub(1));
        Self {
            frame,
            row: self.row.min(store.pattern_length(frame).saturating_sub(1)),
            channel,
            column: self.column.min(channel_columns(store, channel) - 1),
        }
    }

    /// Moves by `delta` rows, following `wrap` at pattern edges.
    pub fn move_rows(&mut self, delta: isize, store: &dyn PatternStore, wrap: WrapPolicy) {
        let len = |frame: usize| store.pattern_length(frame) as isize;
        let mut frame = self.frame;
        let mut row = self.row as isize + delta;

        if wrap.frames {
            while row < 0 {
                if frame == 0 {
                    row = 0;
                    break
                }
                frame -= 1;
                row += len(frame);
            }
            while row >= len(frame) {
                if frame + 1 >= store.frame_count() {
                    row = len(frame) - 1;
                    break
                }
                row -= len(frame);
                frame += 1;
            }
        } else {
            let n = len(frame).max(1);
            row = if wrap.cursor { row.rem_euclid(n) } else { row.clamp(0, n - 1) };
        }

        self.frame = frame;
        self.row = row.max(0) as usize;
    }

    /// Moves one column left, entering the previous channel at its last
    /// column.
    pub fn move_left(&mut self, store: &dyn PatternStore, wrap: WrapPolicy) {
        if self.column > 0 {
            self.column -= 1;
        } else if self.channel > 0 {
            self.channel -= 1;
            self.column = channel_columns(store, self.channel) - 1;
        } else if wrap.cursor {
            self.channel = store.channel_count() - 1;
            self.column = channel_columns(store, self.channel) - 1;
        }
    }

    /// Moves one column right, entering the next channel at its first
    /// column.
    pub fn move_right(&mut self, store: &dyn PatternStore, wrap: WrapPolicy) {
        if self.column + 1 < channel_columns(store, self.channel) {
            self.column += 1;
        } else if self.channel + 1 < store.channel_count() {
            self.channel += 1;
            self.column = 0;
        } else if wrap.cursor {
            self.channel = 0;
            self.column = 0;
        }
    }

    /// Moves to the next channel's first column, wrapping around.
    pub fn next_channel(&mut self, store: &dyn PatternStore) {
        self.channel = (self.channel + 1) % store.channel_count();
        self.column = 0;
    }

    /// Moves to the previous channel's first column, wrapping around.
    pub fn previous_channel(&mut self, store: &dyn PatternStore) {
        let n = store.channel_count();
        self.channel = (self.channel + n - 1) % n;
        self.column = 0;
    }

    /// Moves to the previous channel, keeping the column where possible.
    pub fn channel_left(&mut self, store: &dyn PatternStore) {
        let n = store.channel_count();
        self.channel = (self.channel + n - 1) % n;
        self.column = self.column.min(channel_columns(store, self.channel) - 1);
    }

    /// Moves to the next channel, keeping the column where possible.
    pub fn channel_right(&mut self, store: &dyn PatternStore) {
        self.channel = (self.channel + 1) % store.channel_count();
        self.column = self.column.min(channel_columns(store, self.channel) - 1);
    }

    pub fn first_channel(&mut self) {
        self.channel = 0;
        self.column = 0;
    }

    pub fn last_channel(&mut self, store: &dyn PatternStore) {
        self.channel = store.channel_count() - 1;
        self.column = 0;
    }

    pub fn to_top(&mut self) {
        self.row = 0;
    }

    pub fn to_bottom(&mut self, store: &dyn PatternStore) {
        self.row = store.pattern_length(self.frame) - 1;
    }

    /// Home key: first column, then first channel, then first row.
    pub fn home(&mut self) {
        if self.column != 0 {
            self.column = 0;
        } else if self.channel != 0 {
            self.channel = 0;
        } else {
            self.row = 0;
        }
    }

    /// End key: last column, then last channel, then last row.
    pub fn end(&mut self, store: &dyn PatternStore) {
        let last_column = channel_columns(store, self.channel) - 1;
        let last_channel = store.channel_count() - 1;
        if self.column != last_column {
            self.column = last_column;
        } else if self.channel != last_channel {
            self.channel = last_channel;
            self.column = channel_columns(store, last_channel) - 1;
        } else {
            self.to_bottom(store);
        }
    }

    pub fn next_frame(&mut self, store: &dyn PatternStore, wrap: WrapPolicy) {
        let n = store.frame_count();
        let frame = if self.frame + 1 < n {
            self.frame + 1
        } else if wrap.frames {
            0
        } else {
            self.frame
        };
        self.set_frame(frame, store);
    }

    pub fn previous_frame(&mut self, store: &dyn PatternStore, wrap: WrapPolicy) {
        let frame = if self.frame > 0 {
            self.frame - 1
        } else if wrap.frames {
            store.frame_count() - 1
        } else {
            0
        };
        self.set_frame(frame, store);
    }

    /// Sets the frame, clamping the row to the new pattern length.
    pub fn set_frame(&mut self, frame: usize, store: &dyn PatternStore) {
        self.frame = frame.min(store.frame_count() - 1);
        self.row = self.row.min(store.pattern_length(self.frame) - 1);
    }

    pub fn set_row(&mut self, row: usize, store: &dyn PatternStore) {
        self.row = row.min(store.pattern_length(self.frame) - 1);
    }

    /// Sets the channel, clamping the column to the new channel's columns.
    pub fn set_channel(&mut self, channel: usize, store: &dyn PatternStore) {
        self.channel = channel.min(store.channel_count() - 1);
        self.column = self.column.min(channel_columns(store, self.channel) - 1);
    }

    pub fn set_column(&mut self, column: usize, store: &dyn PatternStore) {
        self.column = column.min(channel_columns(store, self.channel) - 1);
    }

    /// Position of the cursor in (channel, column) reading order.
    pub fn x_tuple(&self) -> (usize, usize) {
        (self.channel, self.column)
    }
}
