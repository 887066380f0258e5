//! Clipboard data and the copy/paste operations on a store.

use std::{error::Error, io::{Read, Write}};

use bitflags::bitflags;
use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use serde::{Deserialize, Serialize};

use crate::{
    cursor::CursorPos,
    module::PatternStore,
    pattern::{Cell, Effect, Field, Note, FIELD_COUNT, MAX_EFFECT_COLUMNS},
    selection::Selection,
};

bitflags! {
    /// Set of cell fields captured in a clip cell.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Fields: u8 {
        const NOTE = 1 << 0;
        const INSTRUMENT = 1 << 1;
        const VOLUME = 1 << 2;
        const EFFECT1 = 1 << 3;
        const EFFECT2 = 1 << 4;
        const EFFECT3 = 1 << 5;
        const EFFECT4 = 1 << 6;
    }
}

impl Fields {
    pub fn of(field: Field) -> Self {
        Self::from_bits_truncate(1 << field.index())
    }

    /// Fields from `start` to `end`, inclusive.
    pub fn span(start: Field, end: Field) -> Self {
        Field::range(start, end).fold(Self::empty(), |acc, f| acc | Self::of(f))
    }

    pub fn has(self, field: Field) -> bool {
        self.contains(Self::of(field))
    }

    pub fn fields(self) -> impl Iterator<Item = Field> {
        (0..FIELD_COUNT).map(Field::from_index).filter(move |&f| self.has(f))
    }
}

/// A captured cell. Only fields in `fields` were captured; the rest of
/// `cell` is empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipCell {
    pub cell: Cell,
    pub fields: Fields,
}

impl ClipCell {
    pub fn note(&self) -> Option<Note> {
        self.fields.has(Field::Note).then_some(self.cell.note)
    }

    pub fn instrument(&self) -> Option<Option<u8>> {
        self.fields.has(Field::Instrument).then_some(self.cell.instrument)
    }

    pub fn volume(&self) -> Option<Option<u8>> {
        self.fields.has(Field::Volume).then_some(self.cell.volume)
    }

    pub fn effect(&self, n: usize) -> Option<Option<Effect>> {
        self.fields.has(Field::Effect(n)).then_some(self.cell.effects[n])
    }
}

/// Document-independent block of pattern data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipData {
    pub channels: usize,
    pub rows: usize,
    pub start_field: Field,
    pub end_field: Field,
    /// Captured with every field of every channel.
    pub whole_rows: bool,
    /// Channel-major.
    cells: Vec<ClipCell>,
}

impl ClipData {
    pub fn cell(&self, channel: usize, row: usize) -> &ClipCell {
        &self.cells[channel * self.rows + row]
    }

    /// True if the clip is one channel of effect fields only.
    pub fn is_effect_only(&self) -> bool {
        self.channels == 1 && matches!(self.start_field, Field::Effect(_))
    }

    /// Serializes the clip into a compressed byte payload.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Box<dyn Error>> {
        let data = rmp_serde::to_vec(self)?;
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&data)?;
        Ok(encoder.finish()?)
    }

    /// Reads a payload made by `to_bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Box<dyn Error>> {
        let mut data = Vec::new();
        ZlibDecoder::new(bytes).read_to_end(&mut data)?;
        let clip: Self = rmp_serde::from_slice(&data)?;
        if !clip.is_well_formed() {
            return Err("malformed clip data".into())
        }
        Ok(clip)
    }

    fn is_well_formed(&self) -> bool {
        let in_range = |field: Field| match field {
            Field::Effect(n) => n < MAX_EFFECT_COLUMNS,
            _ => true,
        };
        let cell_count = self.channels.checked_mul(self.rows);
        in_range(self.start_field) && in_range(self.end_field)
            && (self.channels != 1 || self.start_field <= self.end_field)
            && cell_count.is_some_and(|n| n > 0 && n == self.cells.len())
    }
}

/// Copies the fields inside a selection.
pub fn copy(store: &dyn PatternStore, selection: &Selection) -> ClipData {
    let sel = selection.normalized(store, false);
    let mut cells = Vec::with_capacity(sel.channel_count() * sel.row_count());

    for channel in sel.start.channel..=sel.end.channel {
        let (first, last) = sel.channel_fields(channel, store);
        let fields = Fields::span(first, last);
        for row in sel.start.row..=sel.end.row {
            let src = store.cell(sel.frame(), row, channel);
            let mut cell = Cell::EMPTY;
            for field in fields.fields() {
                cell.copy_field(&src, field);
            }
            cells.push(ClipCell { cell, fields });
        }
    }

    ClipData {
        channels: sel.channel_count(),
        rows: sel.row_count(),
        start_field: sel.start_field(),
        end_field: sel.end_field(),
        whole_rows: false,
        cells,
    }
}

/// Copies entire rows over the selection's row range, in every channel.
pub fn copy_entire(store: &dyn PatternStore, selection: &Selection) -> ClipData {
    let sel = selection.normalized(store, false);
    let channels = store.channel_count();
    let mut cells = Vec::with_capacity(channels * sel.row_count());

    for channel in 0..channels {
        for row in sel.start.row..=sel.end.row {
            cells.push(ClipCell {
                cell: store.cell(sel.frame(), row, channel),
                fields: Fields::all(),
            });
        }
    }

    ClipData {
        channels,
        rows: sel.row_count(),
        start_field: Field::Note,
        end_field: Field::LAST,
        whole_rows: true,
        cells,
    }
}

/// Clears the fields inside a selection.
pub fn clear(store: &mut dyn PatternStore, selection: &Selection) {
    let sel = selection.normalized(store, false);
    for channel in sel.start.channel..=sel.end.channel {
        let (first, last) = sel.channel_fields(channel, store);
        for row in sel.start.row..=sel.end.row {
            let mut cell = store.cell(sel.frame(), row, channel);
            for field in Field::range(first, last) {
                cell.clear_field(field);
            }
            store.set_cell(sel.frame(), row, channel, cell);
        }
    }
}

/// Copies a selection, then clears it.
pub fn cut(store: &mut dyn PatternStore, selection: &Selection) -> ClipData {
    let clip = copy(store, selection);
    clear(store, selection);
    clip
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PasteMode {
    /// Write captured fields.
    Normal,
    /// Write captured fields where the destination is empty.
    Mix,
    /// Overwrite whole cells.
    Entire,
}

/// Pastes captured fields at a position, truncating at the last channel and
/// the end of the pattern. A single-channel effect clip lands on the
/// effect column under the cursor.
pub fn paste(store: &mut dyn PatternStore, clip: &ClipData, at: &CursorPos) {
    paste_with(store, clip, at, PasteMode::Normal);
}

/// Like `paste`, but never overwrites existing data.
pub fn paste_mix(store: &mut dyn PatternStore, clip: &ClipData, at: &CursorPos) {
    paste_with(store, clip, at, PasteMode::Mix);
}

/// Overwrites whole cells. Clips made by `copy_entire` start at the first
/// channel.
pub fn paste_entire(store: &mut dyn PatternStore, clip: &ClipData, at: &CursorPos) {
    let at = if clip.whole_rows { CursorPos { channel: 0, ..*at } } else { *at };
    paste_with(store, clip, &at, PasteMode::Entire);
}

/// Pastes into a drop target, whose start column picks the effect column
/// for single-channel effect clips.
pub fn drag_paste(store: &mut dyn PatternStore, clip: &ClipData, target: &Selection,
    mix: bool
) {
    let mode = if mix { PasteMode::Mix } else { PasteMode::Normal };
    paste_with(store, clip, &target.start, mode);
}

fn paste_with(store: &mut dyn PatternStore, clip: &ClipData, at: &CursorPos, mode: PasteMode) {
    let len = store.pattern_length(at.frame);
    let channel_count = store.channel_count();

    // effect clips move with the cursor's effect column
    let shift = match (mode, clip.start_field, at.field()) {
        (PasteMode::Normal | PasteMode::Mix, Field::Effect(src), Field::Effect(dst))
            if clip.channels == 1 => dst as isize - src as isize,
        _ => 0,
    };

    for i in 0..clip.channels {
        let channel = at.channel + i;
        if channel >= channel_count {
            break
        }
        for r in 0..clip.rows {
            let row = at.row + r;
            if row >= len {
                break
            }
            let src = clip.cell(i, r);
            let mut dst = store.cell(at.frame, row, channel);
            if mode == PasteMode::Entire {
                dst = src.cell;
            } else {
                for field in src.fields.fields() {
                    let Some(target) = shift_field(field, shift) else { continue };
                    if mode == PasteMode::Mix && !dst.field_is_empty(target) {
                        continue
                    }
                    transfer(&mut dst, target, &src.cell, field);
                }
            }
            store.set_cell(at.frame, row, channel, dst);
        }
    }
}

fn shift_field(field: Field, shift: isize) -> Option<Field> {
    match field {
        Field::Effect(n) => {
            let n = n as isize + shift;
            (0..MAX_EFFECT_COLUMNS as isize).contains(&n).then_some(Field::Effect(n as usize))
        }
        _ => Some(field),
    }
}

/// Copies `src_field` of `src` into `dst_field` of `dst`. Both fields are
/// the same kind.
fn transfer(dst: &mut Cell, dst_field: Field, src: &Cell, src_field: Field) {
    match (dst_field, src_field) {
        (Field::Effect(d), Field::Effect(s)) => dst.effects[d] = src.effects[s],
        _ => dst.copy_field(src, src_field),
    }
}
