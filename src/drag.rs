//! Drag and drop of pattern blocks.

use macroquad::math::Vec2;

use crate::{
    clip::{self, ClipData},
    cursor::{channel_columns, CursorPos},
    module::PatternStore,
    pattern::{Column, Field, MAX_EFFECT_COLUMNS},
    selection::Selection,
};

/// State of a drag, from mouse-down inside a selection (or an external
/// drag entering the grid) until drop or cancel.
#[derive(Clone, Debug)]
pub struct DragSession {
    origin: Vec2,
    threshold: Vec2,
    /// Normalized block being dragged; none for external drags.
    source: Option<Selection>,
    payload: Option<ClipData>,
    /// Offset of the grabbed cell from the block's first row and channel.
    grab: (usize, usize),
    target: Option<Selection>,
}

impl DragSession {
    /// Arms a drag of `source`, grabbed at `grabbed`. The drag only starts
    /// once the pointer moves past `threshold`.
    pub fn arm(origin: Vec2, threshold: Vec2, source: Selection, grabbed: &CursorPos) -> Self {
        Self {
            origin,
            threshold,
            grab: (
                grabbed.row.saturating_sub(source.start.row),
                grabbed.channel.saturating_sub(source.start.channel),
            ),
            source: Some(source),
            payload: None,
            target: None,
        }
    }

    /// Starts a drag carrying data from outside the grid.
    pub fn external(payload: ClipData) -> Self {
        Self {
            origin: Vec2::ZERO,
            threshold: Vec2::ZERO,
            source: None,
            payload: Some(payload),
            grab: (0, 0),
            target: None,
        }
    }

    /// True once the payload is captured.
    pub fn is_active(&self) -> bool {
        self.payload.is_some()
    }

    pub fn source(&self) -> Option<&Selection> {
        self.source.as_ref()
    }

    pub fn target(&self) -> Option<&Selection> {
        self.target.as_ref()
    }

    pub fn payload(&self) -> Option<&ClipData> {
        self.payload.as_ref()
    }

    /// Returns true if `point` is far enough from the origin to start
    /// dragging.
    pub fn exceeds_threshold(&self, point: Vec2) -> bool {
        let d = (point - self.origin).abs();
        d.x > self.threshold.x || d.y > self.threshold.y
    }

    /// Captures the payload from the source block.
    pub fn activate(&mut self, store: &dyn PatternStore) {
        if let Some(source) = &self.source {
            log::debug!("drag started from {:?}", source);
            self.payload = Some(clip::copy(store, source));
        }
    }

    /// Moves the drop target under `pos`. Returns true if it changed.
    pub fn retarget(&mut self, pos: &CursorPos, store: &dyn PatternStore) -> bool {
        let Some(payload) = &self.payload else { return false };
        let target = drop_target(payload, pos, self.grab, store);
        let changed = self.target != Some(target);
        self.target = Some(target);
        changed
    }

    /// Drops the payload onto the target. Moves clear the source first.
    /// Returns the block that now holds the data, or none if nothing was
    /// written.
    pub fn drop_onto(self, store: &mut dyn PatternStore, copy: bool, mix: bool)
        -> Option<Selection>
    {
        let payload = self.payload?;
        let target = self.target?;
        if target.start.channel >= store.channel_count() {
            return None
        }
        if let Some(source) = &self.source {
            if source.start == target.start {
                log::debug!("dropped onto source, ignoring");
                return None
            }
            if !copy {
                clip::clear(store, source);
            }
        }
        clip::drag_paste(store, &payload, &target, mix);
        Some(target.normalized(store, false))
    }

    /// Abandons the drag. Returns the selection to restore.
    pub fn cancel(self) -> Option<Selection> {
        self.source
    }
}

/// Block the payload would occupy if dropped with the grabbed cell at `pos`.
fn drop_target(payload: &ClipData, pos: &CursorPos, grab: (usize, usize),
    store: &dyn PatternStore
) -> Selection {
    let row = pos.row.saturating_sub(grab.0);
    let channel = pos.channel.saturating_sub(grab.1);
    let end_channel = channel + payload.channels - 1;

    let (start_field, end_field) = match (payload.start_field, payload.end_field) {
        // single-channel effect blocks can move between effect columns
        (Field::Effect(s), Field::Effect(e)) if payload.channels == 1 => {
            let n = match pos.field() {
                Field::Effect(n) => n,
                _ => 0,
            };
            let width = e.saturating_sub(s).min(MAX_EFFECT_COLUMNS - 1);
            let n = n.min(MAX_EFFECT_COLUMNS - 1 - width);
            (Field::Effect(n), Field::Effect(n + width))
        }
        fields => fields,
    };

    let start = CursorPos {
        frame: pos.frame,
        row,
        channel,
        column: start_field.first_column(),
    };
    let mut end = CursorPos {
        frame: pos.frame,
        row: row + payload.rows - 1,
        channel: end_channel,
        column: end_field.last_column(),
    };
    // keep the end column meaningful in narrower channels
    if end_channel < store.channel_count() {
        let columns = channel_columns(store, end_channel);
        end.column = end.column.min(columns - 1);
        if payload.channels == 1 && end.column < start.column {
            end.column = Column::from_index(start.column).field().last_column();
        }
    }
    Selection { start, end }
}

#[cfg(test)]
mod tests {
    use macroquad::math::vec2;

    use crate::{module::Module, pattern::{Cell, Note}};

    use super::*;

    fn module() -> Module {
        let mut m = Module::new(&["A", "B", "C"], 1, 32);
        for row in 0..32 {
            for channel in 0..3 {
                m.set_cell(0, row, channel, Cell {
                    note: Note::new(row as u8, channel as u8),
                    instrument: Some(row as u8),
                    ..Cell::EMPTY
                });
            }
        }
        m
    }

    fn source(m: &Module) -> Selection {
        Selection::new(CursorPos::new(0, 4, 0, 0), CursorPos::new(0, 7, 0, 1))
            .normalized(m, false)
    }

    #[test]
    fn test_threshold() {
        let m = module();
        let drag = DragSession::arm(vec2(100.0, 100.0), vec2(4.0, 4.0), source(&m),
            &CursorPos::new(0, 5, 0, 0));
        assert!(!drag.exceeds_threshold(vec2(103.0, 100.0)));
        assert!(!drag.exceeds_threshold(vec2(97.0, 103.0)));
        assert!(drag.exceeds_threshold(vec2(110.0, 100.0)));
        assert!(drag.exceeds_threshold(vec2(100.0, 90.0)));
        assert!(!drag.is_active());
    }

    #[test]
    fn test_retarget_keeps_grab_offset() {
        let m = module();
        let mut drag = DragSession::arm(Vec2::ZERO, Vec2::ZERO, source(&m),
            &CursorPos::new(0, 5, 0, 0));
        assert!(!drag.retarget(&CursorPos::new(0, 10, 1, 0), &m));
        drag.activate(&m);
        assert!(drag.retarget(&CursorPos::new(0, 10, 1, 0), &m));
        assert!(!drag.retarget(&CursorPos::new(0, 10, 1, 0), &m));
        let target = drag.target().unwrap();
        assert_eq!(target.start, CursorPos::new(0, 9, 1, 0));
        assert_eq!(target.end, CursorPos::new(0, 12, 1, 1));
    }

    #[test]
    fn test_move_drop() {
        let mut m = module();
        let original = m.cell(0, 4, 0);
        let mut drag = DragSession::arm(Vec2::ZERO, Vec2::ZERO, source(&m),
            &CursorPos::new(0, 4, 0, 0));
        drag.activate(&m);
        drag.retarget(&CursorPos::new(0, 20, 2, 0), &m);
        let placed = drag.drop_onto(&mut m, false, false).unwrap();
        assert_eq!(placed.start, CursorPos::new(0, 20, 2, 0));
        assert_eq!(m.cell(0, 20, 2).note, original.note);
        assert_eq!(m.cell(0, 20, 2).instrument, original.instrument);
        assert!(m.cell(0, 4, 0).is_empty());
        assert!(m.cell(0, 7, 0).is_empty());
    }

    #[test]
    fn test_move_onto_overlapping_block() {
        let mut m = module();
        let moved: Vec<_> = (4..8).map(|r| m.cell(0, r, 0)).collect();
        let mut drag = DragSession::arm(Vec2::ZERO, Vec2::ZERO, source(&m),
            &CursorPos::new(0, 4, 0, 0));
        drag.activate(&m);
        drag.retarget(&CursorPos::new(0, 6, 0, 0), &m);
        drag.drop_onto(&mut m, false, false);
        for (i, cell) in moved.iter().enumerate() {
            assert_eq!(m.cell(0, 6 + i, 0), *cell);
        }
        assert!(m.cell(0, 4, 0).is_empty());
        assert!(m.cell(0, 5, 0).is_empty());
    }

    #[test]
    fn test_copy_drop_keeps_source() {
        let mut m = module();
        let before = m.cell(0, 4, 0);
        let mut drag = DragSession::arm(Vec2::ZERO, Vec2::ZERO, source(&m),
            &CursorPos::new(0, 4, 0, 0));
        drag.activate(&m);
        drag.retarget(&CursorPos::new(0, 20, 1, 0), &m);
        drag.drop_onto(&mut m, true, false);
        assert_eq!(m.cell(0, 4, 0), before);
        assert_eq!(m.cell(0, 20, 1).note, before.note);
    }

    #[test]
    fn test_mix_drop() {
        let mut m = module();
        m.set_cell(0, 20, 1, Cell { instrument: Some(99), ..Cell::EMPTY });
        let mut drag = DragSession::arm(Vec2::ZERO, Vec2::ZERO, source(&m),
            &CursorPos::new(0, 4, 0, 0));
        drag.activate(&m);
        drag.retarget(&CursorPos::new(0, 20, 1, 0), &m);
        drag.drop_onto(&mut m, true, true);
        assert_eq!(m.cell(0, 20, 1).instrument, Some(99));
        assert_eq!(m.cell(0, 20, 1).note, Note::new(4, 0));
    }

    #[test]
    fn test_drop_onto_source_is_noop() {
        let mut m = module();
        let before: Vec<_> = (0..32).map(|r| m.cell(0, r, 0)).collect();
        let mut drag = DragSession::arm(Vec2::ZERO, Vec2::ZERO, source(&m),
            &CursorPos::new(0, 5, 0, 0));
        drag.activate(&m);
        drag.retarget(&CursorPos::new(0, 5, 0, 1), &m);
        assert_eq!(drag.drop_onto(&mut m, false, false), None);
        let after: Vec<_> = (0..32).map(|r| m.cell(0, r, 0)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_cancel_restores_selection() {
        let m = module();
        let mut drag = DragSession::arm(Vec2::ZERO, Vec2::ZERO, source(&m),
            &CursorPos::new(0, 5, 0, 0));
        drag.activate(&m);
        drag.retarget(&CursorPos::new(0, 20, 1, 0), &m);
        assert_eq!(drag.cancel(), Some(source(&m)));
    }

    #[test]
    fn test_external_drag() {
        let mut m = module();
        let payload = clip::copy(&m, &source(&m));
        let before = m.cell(0, 4, 0);
        let mut drag = DragSession::external(payload);
        assert!(drag.is_active());
        drag.retarget(&CursorPos::new(0, 0, 2, 0), &m);
        drag.drop_onto(&mut m, false, false);
        assert_eq!(m.cell(0, 4, 0), before);
        assert_eq!(m.cell(0, 0, 2).note, before.note);
        assert_eq!(DragSession::external(clip::copy(&m, &source(&m))).cancel(), None);
    }

    #[test]
    fn test_reversed_effect_payload() {
        let mut m = module();
        m.set_effect_columns(1, 3);
        let mut payload = clip::copy(&m, &source(&m));
        payload.start_field = Field::Effect(2);
        payload.end_field = Field::Effect(0);
        let mut drag = DragSession::external(payload);
        assert!(drag.retarget(&CursorPos::new(0, 2, 1, 7), &m));
        let target = drag.target().unwrap();
        assert_eq!(target.start.field(), Field::Effect(2));
        assert_eq!(target.end.field(), Field::Effect(2));
    }

    #[test]
    fn test_effect_block_follows_column() {
        let mut m = module();
        m.set_effect_columns(0, 3);
        m.set_effect_columns(1, 3);
        let src = Selection::new(CursorPos::new(0, 0, 0, 3), CursorPos::new(0, 1, 0, 4))
            .normalized(&m, false);
        let mut drag = DragSession::arm(Vec2::ZERO, Vec2::ZERO, src,
            &CursorPos::new(0, 0, 0, 3));
        drag.activate(&m);
        drag.retarget(&CursorPos::new(0, 0, 1, 8), &m);
        let target = drag.target().unwrap();
        assert_eq!((target.start.column, target.end.column), (7, 8));
    }
}
