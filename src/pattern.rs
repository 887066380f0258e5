//! Pattern cell data and the mapping between cursor columns and cell fields.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum number of effect columns a channel can display.
pub const MAX_EFFECT_COLUMNS: usize = 4;

/// Number of cursor columns before the first effect column.
pub const FIXED_COLUMNS: usize = 3;

/// Number of selectable fields in a cell.
pub const FIELD_COUNT: usize = FIXED_COLUMNS + MAX_EFFECT_COLUMNS;

const PITCH_NAMES: [&str; 12] =
    ["C-", "C#", "D-", "D#", "E-", "F-", "F#", "G-", "G#", "A-", "A#", "B-"];

/// Effect kinds that end a pattern early.
pub const EFFECT_JUMP: char = 'B';
pub const EFFECT_HALT: char = 'C';
pub const EFFECT_SKIP: char = 'D';

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Note {
    #[default]
    Empty,
    Key { pitch: u8, octave: u8 },
    Halt,
    Release,
}

impl Note {
    pub fn new(pitch: u8, octave: u8) -> Self {
        Self::Key { pitch: pitch % 12, octave }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Note::Empty => write!(f, "..."),
            Note::Key { pitch, octave } =>
                write!(f, "{}{}", PITCH_NAMES[*pitch as usize % 12], octave),
            Note::Halt => write!(f, "---"),
            Note::Release => write!(f, "==="),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    pub kind: char,
    pub param: u8,
}

impl Effect {
    pub fn new(kind: char, param: u8) -> Self {
        Self { kind, param }
    }

    /// Returns true if this effect cuts the pattern short.
    pub fn ends_pattern(&self) -> bool {
        matches!(self.kind, EFFECT_JUMP | EFFECT_HALT | EFFECT_SKIP)
    }
}

/// One channel's data on one row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub note: Note,
    pub instrument: Option<u8>,
    pub volume: Option<u8>,
    pub effects: [Option<Effect>; MAX_EFFECT_COLUMNS],
}

impl Cell {
    pub const EMPTY: Cell = Cell {
        note: Note::Empty,
        instrument: None,
        volume: None,
        effects: [None; MAX_EFFECT_COLUMNS],
    };

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// Returns true if `field` holds no data.
    pub fn field_is_empty(&self, field: Field) -> bool {
        match field {
            Field::Note => self.note == Note::Empty,
            Field::Instrument => self.instrument.is_none(),
            Field::Volume => self.volume.is_none(),
            Field::Effect(i) => self.effects[i].is_none(),
        }
    }

    /// Copies a single field from `src`.
    pub fn copy_field(&mut self, src: &Cell, field: Field) {
        match field {
            Field::Note => self.note = src.note,
            Field::Instrument => self.instrument = src.instrument,
            Field::Volume => self.volume = src.volume,
            Field::Effect(i) => self.effects[i] = src.effects[i],
        }
    }

    /// Clears a single field.
    pub fn clear_field(&mut self, field: Field) {
        self.copy_field(&Self::EMPTY, field);
    }

    /// Returns the display text for a cursor column.
    pub fn column_text(&self, column: Column) -> String {
        match column {
            Column::Note => self.note.to_string(),
            Column::Instrument => match self.instrument {
                Some(v) => format!("{:02X}", v),
                None => String::from(".."),
            },
            Column::Volume => match self.volume {
                Some(v) => format!("{:X}", v),
                None => String::from("."),
            },
            Column::EffectType(i) => match self.effects[i] {
                Some(e) => e.kind.to_string(),
                None => String::from("."),
            },
            Column::EffectParam(i) => match self.effects[i] {
                Some(e) => format!("{:02X}", e.param),
                None => String::from(".."),
            },
        }
    }
}

/// A cursor stop within a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Column {
    Note,
    Instrument,
    Volume,
    EffectType(usize),
    EffectParam(usize),
}

impl Column {
    /// Maps a cursor column index onto a column. Panics past the last
    /// possible effect column.
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Column::Note,
            1 => Column::Instrument,
            2 => Column::Volume,
            i if i < column_count(MAX_EFFECT_COLUMNS) => {
                let n = (i - FIXED_COLUMNS) / 2;
                if (i - FIXED_COLUMNS) % 2 == 0 {
                    Column::EffectType(n)
                } else {
                    Column::EffectParam(n)
                }
            }
            _ => panic!("invalid cursor column {index}"),
        }
    }

    pub fn index(self) -> usize {
        match self {
            Column::Note => 0,
            Column::Instrument => 1,
            Column::Volume => 2,
            Column::EffectType(n) => FIXED_COLUMNS + n * 2,
            Column::EffectParam(n) => FIXED_COLUMNS + n * 2 + 1,
        }
    }

    pub fn field(self) -> Field {
        match self {
            Column::Note => Field::Note,
            Column::Instrument => Field::Instrument,
            Column::Volume => Field::Volume,
            Column::EffectType(n) | Column::EffectParam(n) => Field::Effect(n),
        }
    }

    /// Width of the column, in characters.
    pub fn chars(self) -> usize {
        match self {
            Column::Note => 3,
            Column::Instrument => 2,
            Column::Volume => 1,
            Column::EffectType(_) => 1,
            Column::EffectParam(_) => 2,
        }
    }

    /// Whether a gap separates this column from the next one. Effect type
    /// and parameter are drawn as one word.
    pub fn gap_after(self) -> bool {
        !matches!(self, Column::EffectType(_))
    }
}

/// A selectable part of a cell. Clip data and selections work in fields;
/// the cursor works in columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    Note,
    Instrument,
    Volume,
    Effect(usize),
}

impl Field {
    pub const LAST: Field = Field::Effect(MAX_EFFECT_COLUMNS - 1);

    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Field::Note,
            1 => Field::Instrument,
            2 => Field::Volume,
            i if i < FIELD_COUNT => Field::Effect(i - FIXED_COLUMNS),
            _ => panic!("invalid field {index}"),
        }
    }

    pub fn index(self) -> usize {
        match self {
            Field::Note => 0,
            Field::Instrument => 1,
            Field::Volume => 2,
            Field::Effect(n) => FIXED_COLUMNS + n,
        }
    }

    /// First cursor column belonging to this field.
    pub fn first_column(self) -> usize {
        match self {
            Field::Effect(n) => Column::EffectType(n).index(),
            _ => self.index(),
        }
    }

    /// Last cursor column belonging to this field.
    pub fn last_column(self) -> usize {
        match self {
            Field::Effect(n) => Column::EffectParam(n).index(),
            _ => self.index(),
        }
    }

    /// Iterates over fields in `start..=end`.
    pub fn range(start: Field, end: Field) -> impl Iterator<Item = Field> {
        (start.index()..=end.index()).map(Field::from_index)
    }
}

/// Number of cursor columns in a channel with `effect_columns` effect columns.
pub fn column_count(effect_columns: usize) -> usize {
    FIXED_COLUMNS + effect_columns * 2
}

/// Number of effect columns in a channel with `columns` cursor columns.
pub fn effect_column_count(columns: usize) -> usize {
    columns.saturating_sub(FIXED_COLUMNS) / 2
}

/// Last field visible in a channel with `effect_columns` effect columns.
pub fn last_field(effect_columns: usize) -> Field {
    Field::Effect(effect_columns.clamp(1, MAX_EFFECT_COLUMNS) - 1)
}
