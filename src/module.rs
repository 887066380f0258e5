//! Song data as seen by the pattern editor.

use crate::pattern::{Cell, MAX_EFFECT_COLUMNS};

/// Read/write access to song data. The editor never owns the song; it asks
/// through this trait every time it needs data.
pub trait PatternStore {
    fn frame_count(&self) -> usize;
    fn channel_count(&self) -> usize;
    /// Effective number of rows in a frame.
    fn pattern_length(&self, frame: usize) -> usize;
    fn effect_columns(&self, channel: usize) -> usize;
    fn set_effect_columns(&mut self, channel: usize, count: usize);
    fn cell(&self, frame: usize, row: usize, channel: usize) -> Cell;
    fn set_cell(&mut self, frame: usize, row: usize, channel: usize, cell: Cell);
    fn channel_name(&self, channel: usize) -> &str;
}

/// Per-channel song data.
pub struct Track {
    pub name: String,
    pub effect_columns: usize,
    /// Patterns indexed by pattern number; each is a list of rows.
    pub patterns: Vec<Vec<Cell>>,
}

impl Track {
    pub fn new(name: &str, pattern_count: usize, rows: usize) -> Self {
        Self {
            name: name.to_owned(),
            effect_columns: 1,
            patterns: vec![vec![Cell::EMPTY; rows]; pattern_count],
        }
    }
}

/// In-memory song. Each frame references one pattern per track, so frames
/// sharing a pattern number share data.
pub struct Module {
    pub title: String,
    pub rows: usize,
    pub tracks: Vec<Track>,
    /// Pattern numbers per frame, one per track.
    pub frames: Vec<Vec<usize>>,
}

impl Module {
    /// Creates a module where frame `i` uses pattern `i` in every track.
    pub fn new(channel_names: &[&str], frames: usize, rows: usize) -> Self {
        let frames = frames.max(1);
        let rows = rows.max(1);
        Self {
            title: String::new(),
            rows,
            tracks: channel_names.iter().map(|name| Track::new(name, frames, rows)).collect(),
            frames: (0..frames).map(|i| vec![i; channel_names.len()]).collect(),
        }
    }

    /// Points a frame's channel at a different pattern, growing the pattern
    /// list if needed.
    pub fn set_pattern_index(&mut self, frame: usize, channel: usize, index: usize) {
        let track = &mut self.tracks[channel];
        if track.patterns.len() <= index {
            track.patterns.resize(index + 1, vec![Cell::EMPTY; self.rows]);
        }
        self.frames[frame][channel] = index;
    }

    fn pattern(&self, frame: usize, channel: usize) -> &[Cell] {
        let index = self.frames[frame][channel];
        &self.tracks[channel].patterns[index]
    }
}

impl PatternStore for Module {
    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn channel_count(&self) -> usize {
        self.tracks.len()
    }

    fn pattern_length(&self, frame: usize) -> usize {
        // the first row holding a jump, halt or skip effect is the last one played
        for row in 0..self.rows {
            for (channel, track) in self.tracks.iter().enumerate() {
                let cell = &self.pattern(frame, channel)[row];
                if cell.effects[..track.effect_columns].iter()
                    .flatten()
                    .any(|e| e.ends_pattern()) {
                    return row + 1
                }
            }
        }
        self.rows
    }

    fn effect_columns(&self, channel: usize) -> usize {
        self.tracks[channel].effect_columns
    }

    fn set_effect_columns(&mut self, channel: usize, count: usize) {
        self.tracks[channel].effect_columns = count.clamp(1, MAX_EFFECT_COLUMNS);
    }

    fn cell(&self, frame: usize, row: usize, channel: usize) -> Cell {
        self.pattern(frame, channel)[row]
    }

    fn set_cell(&mut self, frame: usize, row: usize, channel: usize, cell: Cell) {
        let index = self.frames[frame][channel];
        self.tracks[channel].patterns[index][row] = cell;
    }

    fn channel_name(&self, channel: usize) -> &str {
        &self.tracks[channel].name
    }
}

#[cfg(test)]
mod tests {
    use crate::pattern::{Effect, Note};

    use super::*;

    #[test]
    fn test_new_module() {
        let module = Module::new(&["A", "B"], 3, 16);
        assert_eq!(module.frame_count(), 3);
        assert_eq!(module.channel_count(), 2);
        assert_eq!(module.pattern_length(1), 16);
        assert_eq!(module.channel_name(1), "B");
        assert_eq!(module.effect_columns(0), 1);
    }

    #[test]
    fn test_shared_patterns() {
        let mut module = Module::new(&["A"], 2, 8);
        module.set_pattern_index(1, 0, 0);
        let cell = Cell { note: Note::new(0, 3), ..Cell::EMPTY };
        module.set_cell(0, 2, 0, cell);
        assert_eq!(module.cell(1, 2, 0), cell);
    }

    #[test]
    fn test_pattern_length_effects() {
        let mut module = Module::new(&["A", "B"], 2, 32);
        let cell = Cell {
            effects: [Some(Effect::new('D', 0)), None, None, None],
            ..Cell::EMPTY
        };
        module.set_cell(0, 11, 1, cell);
        assert_eq!(module.pattern_length(0), 12);
        assert_eq!(module.pattern_length(1), 32);

        // hidden effect columns don't count
        let hidden = Cell {
            effects: [None, Some(Effect::new('C', 0)), None, None],
            ..Cell::EMPTY
        };
        module.set_cell(1, 4, 0, hidden);
        assert_eq!(module.pattern_length(1), 32);
        module.set_effect_columns(0, 2);
        assert_eq!(module.pattern_length(1), 5);
    }

    #[test]
    fn test_effect_column_clamp() {
        let mut module = Module::new(&["A"], 1, 4);
        module.set_effect_columns(0, 9);
        assert_eq!(module.effect_columns(0), MAX_EFFECT_COLUMNS);
        module.set_effect_columns(0, 0);
        assert_eq!(module.effect_columns(0), 1);
    }
}
