//! Rectangular block selections.

use crate::{
    cursor::{channel_columns, CursorPos},
    module::PatternStore,
    pattern::{last_field, Column, Field},
};

/// A block between two cursor positions, in either order. Use `normalized`
/// before reading bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub start: CursorPos,
    pub end: CursorPos,
}

impl Selection {
    pub fn new(start: CursorPos, end: CursorPos) -> Self {
        Self { start, end }
    }

    /// Selection covering only `pos`.
    pub fn single(pos: CursorPos) -> Self {
        Self { start: pos, end: pos }
    }

    pub fn set_start(&mut self, pos: CursorPos) {
        self.start = pos;
    }

    pub fn set_end(&mut self, pos: CursorPos) {
        self.end = pos;
    }

    /// The frame the selection lives in.
    pub fn frame(&self) -> usize {
        self.start.frame
    }

    /// Returns the selection with ordered rows, channels and columns, column
    /// bounds widened to whole fields, and everything clamped to `store`.
    /// An end in a different frame is clamped to the first or last row of
    /// the start frame. In full-row mode each channel is selected whole.
    pub fn normalized(&self, store: &dyn PatternStore, full_row: bool) -> Selection {
        let frame = self.start.frame.min(store.frame_count() - 1);
        let len = store.pattern_length(frame);
        let clamp_row = |p: &CursorPos| {
            if p.frame < frame {
                0
            } else if p.frame > frame {
                len - 1
            } else {
                p.row.min(len - 1)
            }
        };
        let (r0, r1) = min_max(clamp_row(&self.start), clamp_row(&self.end));

        let last_channel = store.channel_count() - 1;
        let mut a = (self.start.channel.min(last_channel), self.start.column);
        let mut b = (self.end.channel.min(last_channel), self.end.column);
        if a > b {
            std::mem::swap(&mut a, &mut b);
        }
        a.1 = a.1.min(channel_columns(store, a.0) - 1);
        b.1 = b.1.min(channel_columns(store, b.0) - 1);

        if full_row {
            a.1 = 0;
            b.1 = channel_columns(store, b.0) - 1;
        } else {
            a.1 = Column::from_index(a.1).field().first_column();
            b.1 = Column::from_index(b.1).field().last_column();
        }

        Selection {
            start: CursorPos { frame, row: r0, channel: a.0, column: a.1 },
            end: CursorPos { frame, row: r1, channel: b.0, column: b.1 },
        }
    }

    /// First field of the first channel. Assumes a normalized selection.
    pub fn start_field(&self) -> Field {
        self.start.field()
    }

    /// Last field of the last channel. Assumes a normalized selection.
    pub fn end_field(&self) -> Field {
        self.end.field()
    }

    pub fn row_count(&self) -> usize {
        self.start.row.abs_diff(self.end.row) + 1
    }

    pub fn channel_count(&self) -> usize {
        self.start.channel.abs_diff(self.end.channel) + 1
    }

    /// Returns true if a cell column is inside the block. Assumes a
    /// normalized selection.
    pub fn contains(&self, pos: &CursorPos) -> bool {
        pos.frame == self.start.frame
            && (self.start.row..=self.end.row).contains(&pos.row)
            && (self.start.x_tuple()..=self.end.x_tuple()).contains(&pos.x_tuple())
    }

    /// Returns true if the block covers whole channels from its first to its
    /// last channel. Assumes a normalized selection.
    pub fn is_whole_channels(&self, store: &dyn PatternStore) -> bool {
        self.start.column == 0 && self.end.column == channel_columns(store, self.end.channel) - 1
    }

    /// Fields of `channel` inside the block, up to the channel's last
    /// displayed effect column. Assumes a normalized selection and a channel
    /// within it.
    pub fn channel_fields(&self, channel: usize, store: &dyn PatternStore) -> (Field, Field) {
        let first = if channel == self.start.channel { self.start_field() } else { Field::Note };
        let shown = last_field(store.effect_columns(channel));
        let last = if channel == self.end.channel { self.end_field().min(shown) } else { shown };
        (first, last)
    }
}

fn min_max(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Selects every row of one channel.
pub fn channel_selection(store: &dyn PatternStore, frame: usize, channel: usize) -> Selection {
    let last_row = store.pattern_length(frame) - 1;
    Selection {
        start: CursorPos { frame, row: 0, channel, column: 0 },
        end: CursorPos {
            frame,
            row: last_row,
            channel,
            column: channel_columns(store, channel) - 1,
        },
    }
}

/// Selects every channel over a row range.
pub fn all_channels_selection(store: &dyn PatternStore, frame: usize,
    rows: (usize, usize)
) -> Selection {
    let last_channel = store.channel_count() - 1;
    Selection {
        start: CursorPos { frame, row: rows.0, channel: 0, column: 0 },
        end: CursorPos {
            frame,
            row: rows.1,
            channel: last_channel,
            column: channel_columns(store, last_channel) - 1,
        },
    }
}

/// Selects the whole pattern of a frame.
pub fn all_selection(store: &dyn PatternStore, frame: usize) -> Selection {
    all_channels_selection(store, frame, (0, store.pattern_length(frame) - 1))
}
