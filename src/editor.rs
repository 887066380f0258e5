//! Pattern editor: cursor, selection, mouse and keyboard handling, and
//! incremental drawing of the grid.

use macroquad::math::{vec2, Vec2};

use crate::{
    clip::{self, ClipData},
    config::Config,
    cursor::{CursorPos, WrapPolicy},
    drag::DragSession,
    hit::{EffectArrow, HeaderHit, HitTester, Region},
    input::{Action, Modifiers},
    layout::{FontMetrics, Layout, Viewport},
    module::PatternStore,
    pattern::{column_count, MAX_EFFECT_COLUMNS},
    redraw::{Invalidation, RedrawPlan, RedrawScheduler, RedrawStats, Regions, Snapshot},
    selection::{all_channels_selection, all_selection, channel_selection, Selection},
    surface::Surface,
    ui::{pattern::{GridState, Painter}, theme::Theme},
};

/// Editor behavior taken from the config.
#[derive(Clone, Debug, PartialEq)]
pub struct EditorSettings {
    pub wrap: WrapPolicy,
    pub follow: bool,
    pub full_row_select: bool,
    pub drag_threshold: Vec2,
    pub highlight: (usize, usize),
    pub adjacent: bool,
    pub page_rows: usize,
    pub wheel_rows: usize,
}

impl From<&Config> for EditorSettings {
    fn from(config: &Config) -> Self {
        Self {
            wrap: WrapPolicy { cursor: config.wrap_cursor, frames: config.wrap_frames },
            follow: config.follow_mode,
            full_row_select: config.full_row_select,
            drag_threshold: vec2(config.drag_threshold_x, config.drag_threshold_y),
            highlight: (config.highlight, config.second_highlight),
            adjacent: config.show_adjacent_frames,
            page_rows: config.page_rows.max(1),
            wheel_rows: config.wheel_rows.max(1),
        }
    }
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScrollDir {
    Up,
    Down,
    Left,
    Right,
}

pub struct PatternEditor {
    cursor: CursorPos,
    /// Start is the anchor, end follows the cursor or pointer.
    selection: Option<Selection>,
    first_channel: usize,
    layout: Layout,
    window: Vec2,
    metrics: FontMetrics,
    scheduler: RedrawScheduler,
    settings: EditorSettings,
    clipboard: Option<ClipData>,
    drag: Option<DragSession>,
    /// Where a mouse selection started, while the button is held.
    mouse_anchor: Option<CursorPos>,
    pointer: Vec2,
    auto_scroll: Option<ScrollDir>,
    hover: Option<HeaderHit>,
    focused: bool,
    play: Option<(usize, usize)>,
}

impl PatternEditor {
    pub fn new(settings: EditorSettings) -> Self {
        let mut scheduler = RedrawScheduler::new();
        scheduler.invalidate(Regions::BACKGROUND);
        let metrics = FontMetrics::default();
        Self {
            cursor: CursorPos::default(),
            selection: None,
            first_channel: 0,
            layout: Layout::compute(Vec2::ZERO, &[], metrics),
            window: Vec2::ZERO,
            metrics,
            scheduler,
            settings,
            clipboard: None,
            drag: None,
            mouse_anchor: None,
            pointer: Vec2::ZERO,
            auto_scroll: None,
            hover: None,
            focused: true,
            play: None,
        }
    }

    pub fn cursor(&self) -> CursorPos {
        self.cursor
    }

    pub fn first_channel(&self) -> usize {
        self.first_channel
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: EditorSettings) {
        self.settings = settings;
        self.scheduler.invalidate(Regions::BACKGROUND);
    }

    pub fn stats(&self) -> &RedrawStats {
        self.scheduler.stats()
    }

    pub fn pending(&self) -> &Invalidation {
        self.scheduler.pending()
    }

    pub fn clipboard(&self) -> Option<&ClipData> {
        self.clipboard.as_ref()
    }

    pub fn set_clipboard(&mut self, clip: Option<ClipData>) {
        self.clipboard = clip;
    }

    fn view(&self) -> Viewport {
        Viewport {
            frame: self.cursor.frame,
            center_row: self.cursor.row,
            first_channel: self.first_channel,
        }
    }

    fn hit(&self) -> HitTester<'_> {
        HitTester::new(&self.layout, self.view(), self.settings.adjacent)
    }

    /// Screen point of a grid position, if visible.
    pub fn point_of(&self, pos: &CursorPos, store: &dyn PatternStore) -> Option<Vec2> {
        self.hit().cursor_to_point(pos, store)
    }

    // invalidation

    pub fn invalidate_pattern(&mut self) {
        self.scheduler.invalidate(Regions::PATTERN);
    }

    pub fn invalidate_rows(&mut self, start: usize, end: usize) {
        self.scheduler.invalidate_rows(start, end);
    }

    pub fn invalidate_cursor(&mut self) {
        self.scheduler.invalidate(Regions::CURSOR);
    }

    pub fn invalidate_background(&mut self) {
        self.scheduler.invalidate(Regions::BACKGROUND);
    }

    pub fn invalidate_header(&mut self) {
        self.scheduler.invalidate(Regions::HEADER);
    }

    /// Marks the rows a block covers.
    fn invalidate_block(&mut self, block: Option<Selection>, store: &dyn PatternStore) {
        let Some(block) = block else { return };
        let block = block.normalized(store, self.settings.full_row_select);
        if block.frame() == self.cursor.frame {
            self.invalidate_rows(block.start.row, block.end.row);
        } else {
            self.invalidate_pattern();
        }
    }

    // window setup

    pub fn set_window_size(&mut self, size: Vec2) {
        if size != self.window {
            self.window = size;
            self.invalidate_background();
        }
    }

    pub fn set_font_metrics(&mut self, metrics: FontMetrics) {
        if metrics != self.metrics {
            self.metrics = metrics;
            self.invalidate_background();
        }
    }

    pub fn set_highlight(&mut self, highlight: (usize, usize)) {
        if highlight != self.settings.highlight {
            self.settings.highlight = highlight;
            self.invalidate_background();
        }
    }

    pub fn set_follow(&mut self, follow: bool) {
        self.settings.follow = follow;
    }

    /// Updates the playing row. In follow mode the cursor jumps to it.
    pub fn set_play_position(&mut self, play: Option<(usize, usize)>, store: &dyn PatternStore) {
        if play == self.play {
            return
        }
        for (frame, row) in [self.play, play].into_iter().flatten() {
            if frame == self.cursor.frame {
                self.invalidate_rows(row, row);
            } else {
                self.invalidate_pattern();
            }
        }
        self.play = play;
        if let (true, Some((frame, row))) = (self.settings.follow, play) {
            self.set_cursor(CursorPos { frame, row, ..self.cursor }, store);
        }
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Losing focus abandons drags and mouse selection.
    pub fn set_focus(&mut self, focused: bool, store: &dyn PatternStore) {
        if focused == self.focused {
            return
        }
        self.focused = focused;
        if !focused {
            self.cancel_dragging(store);
            self.mouse_anchor = None;
            self.auto_scroll = None;
            if self.hover.take().is_some() {
                self.invalidate_header();
            }
        }
        let row = self.cursor.row;
        self.invalidate_rows(row, row);
        self.invalidate_cursor();
    }

    fn relayout(&mut self, store: &dyn PatternStore) {
        let columns: Vec<_> = (0..store.channel_count())
            .map(|c| column_count(store.effect_columns(c)))
            .collect();
        self.layout = Layout::compute(self.window, &columns, self.metrics);
        log::debug!("layout: {} lines, {} channels", self.layout.lines_visible, columns.len());
    }

    fn layout_is_current(&self, store: &dyn PatternStore) -> bool {
        self.layout.size == self.window
            && self.layout.metrics == self.metrics
            && self.layout.channels.len() == store.channel_count()
            && self.layout.channels.iter().enumerate()
                .all(|(i, c)| c.columns == column_count(store.effect_columns(i)))
    }

    fn keep_cursor_visible(&mut self) {
        let count = self.layout.channels.len();
        if count == 0 {
            return
        }
        let first = self.first_channel.min(count - 1);
        let channel = self.cursor.channel.min(count - 1);
        self.first_channel = self.layout.scroll_to_channel(channel, first);
    }

    // cursor and selection

    /// Moves the cursor, clamped to the store.
    pub fn set_cursor(&mut self, pos: CursorPos, store: &dyn PatternStore) {
        let pos = pos.clamped(store);
        if pos != self.cursor {
            self.cursor = pos;
            self.invalidate_cursor();
        }
        self.keep_cursor_visible();
    }

    /// The current selection, normalized.
    pub fn selection(&self, store: &dyn PatternStore) -> Option<Selection> {
        self.selection.map(|s| s.normalized(store, self.settings.full_row_select))
    }

    pub fn set_selection(&mut self, selection: Option<Selection>, store: &dyn PatternStore) {
        if selection == self.selection {
            return
        }
        self.invalidate_block(self.selection, store);
        self.invalidate_block(selection, store);
        self.selection = selection;
        self.invalidate_cursor();
    }

    pub fn cancel_selection(&mut self, store: &dyn PatternStore) {
        self.set_selection(None, store);
    }

    fn move_cursor(&mut self, mods: Modifiers, store: &dyn PatternStore,
        f: impl FnOnce(&mut CursorPos)
    ) {
        let old = self.cursor;
        let mut pos = self.cursor;
        f(&mut pos);
        if mods.shift {
            let anchor = self.selection.map_or(old, |s| s.start);
            self.set_cursor(pos, store);
            self.set_selection(Some(Selection::new(anchor, self.cursor)), store);
        } else {
            self.cancel_selection(store);
            self.set_cursor(pos, store);
        }
    }

    pub fn select_channel(&mut self, store: &dyn PatternStore) {
        let sel = channel_selection(store, self.cursor.frame, self.cursor.channel);
        self.set_selection(Some(sel), store);
    }

    /// Selects every channel over the selected rows, or the whole pattern.
    pub fn select_all_channels(&mut self, store: &dyn PatternStore) {
        let rows = match self.selection(store) {
            Some(s) => (s.start.row, s.end.row),
            None => (0, store.pattern_length(self.cursor.frame) - 1),
        };
        self.set_selection(Some(all_channels_selection(store, self.cursor.frame, rows)), store);
    }

    /// Selects the cursor channel, or the whole pattern if the channel is
    /// already selected.
    pub fn select_all(&mut self, store: &dyn PatternStore) {
        let channel = channel_selection(store, self.cursor.frame, self.cursor.channel);
        if self.selection(store) == Some(channel) {
            self.set_selection(Some(all_selection(store, self.cursor.frame)), store);
        } else {
            self.set_selection(Some(channel), store);
        }
    }

    /// Scrolls the view horizontally, keeping the cursor on screen.
    pub fn scroll_channels(&mut self, delta: isize, store: &dyn PatternStore) -> bool {
        let count = store.channel_count();
        let full = self.layout.channels_full_visible(self.first_channel).max(1);
        let max_first = count.saturating_sub(full);
        let first = self.first_channel.saturating_add_signed(delta).min(max_first);
        if first == self.first_channel {
            return false
        }
        self.first_channel = first;
        let visible = self.layout.channels_full_visible(first).max(1);
        let channel = self.cursor.channel.clamp(first, first + visible - 1);
        if channel != self.cursor.channel {
            let mut pos = self.cursor;
            pos.set_channel(channel, store);
            self.cursor = pos;
            self.invalidate_cursor();
        }
        true
    }

    fn set_effect_columns(&mut self, channel: usize, count: usize, store: &mut dyn PatternStore) {
        let count = count.clamp(1, MAX_EFFECT_COLUMNS);
        if count == store.effect_columns(channel) {
            return
        }
        store.set_effect_columns(channel, count);
        log::debug!("channel {} effect columns: {}", channel, count);
        let cursor = self.cursor;
        self.set_cursor(cursor, store);
        self.invalidate_background();
    }

    // clipboard

    fn selection_or_cursor(&self, store: &dyn PatternStore) -> Selection {
        self.selection(store)
            .unwrap_or_else(|| Selection::single(self.cursor).normalized(store, false))
    }

    /// Marks rows written by a paste, or everything if the pattern length
    /// changed.
    fn after_edit(&mut self, rows: (usize, usize), old_len: usize, store: &dyn PatternStore) {
        if store.pattern_length(self.cursor.frame) != old_len {
            self.invalidate_pattern();
            let cursor = self.cursor;
            self.set_cursor(cursor, store);
        } else {
            self.invalidate_rows(rows.0, rows.1);
        }
    }

    pub fn copy(&mut self, store: &dyn PatternStore) -> bool {
        let Some(sel) = self.selection(store) else { return false };
        self.clipboard = Some(clip::copy(store, &sel));
        true
    }

    pub fn copy_entire(&mut self, store: &dyn PatternStore) -> bool {
        let sel = self.selection_or_cursor(store);
        self.clipboard = Some(clip::copy_entire(store, &sel));
        true
    }

    pub fn cut(&mut self, store: &mut dyn PatternStore) -> bool {
        let Some(sel) = self.selection(store) else { return false };
        let old_len = store.pattern_length(self.cursor.frame);
        self.clipboard = Some(clip::cut(store, &sel));
        self.after_edit((sel.start.row, sel.end.row), old_len, store);
        true
    }

    pub fn delete_selection(&mut self, store: &mut dyn PatternStore) {
        let sel = self.selection_or_cursor(store);
        let old_len = store.pattern_length(self.cursor.frame);
        clip::clear(store, &sel);
        self.after_edit((sel.start.row, sel.end.row), old_len, store);
    }

    fn paste_with(&mut self, store: &mut dyn PatternStore,
        f: fn(&mut dyn PatternStore, &ClipData, &CursorPos)
    ) -> bool {
        let Some(clip) = self.clipboard.take() else { return false };
        let old_len = store.pattern_length(self.cursor.frame);
        f(store, &clip, &self.cursor);
        let rows = (self.cursor.row, self.cursor.row + clip.rows - 1);
        self.clipboard = Some(clip);
        self.after_edit(rows, old_len, store);
        true
    }

    pub fn paste(&mut self, store: &mut dyn PatternStore) -> bool {
        self.paste_with(store, clip::paste)
    }

    pub fn paste_mix(&mut self, store: &mut dyn PatternStore) -> bool {
        self.paste_with(store, clip::paste_mix)
    }

    pub fn paste_entire(&mut self, store: &mut dyn PatternStore) -> bool {
        self.paste_with(store, clip::paste_entire)
    }

    // keyboard

    /// Performs a key action. Returns true if the action applied.
    pub fn action(&mut self, action: Action, mods: Modifiers, store: &mut dyn PatternStore)
        -> bool
    {
        let wrap = self.settings.wrap;
        let page = self.settings.page_rows as isize;
        let s: &dyn PatternStore = store;

        match action {
            Action::PrevRow => self.move_cursor(mods, s, |p| p.move_rows(-1, s, wrap)),
            Action::NextRow => self.move_cursor(mods, s, |p| p.move_rows(1, s, wrap)),
            Action::PrevPage => self.move_cursor(mods, s, |p| p.move_rows(-page, s, wrap)),
            Action::NextPage => self.move_cursor(mods, s, |p| p.move_rows(page, s, wrap)),
            Action::PrevColumn => self.move_cursor(mods, s, |p| p.move_left(s, wrap)),
            Action::NextColumn => self.move_cursor(mods, s, |p| p.move_right(s, wrap)),
            Action::PrevChannel => self.move_cursor(mods, s, |p| p.previous_channel(s)),
            Action::NextChannel => self.move_cursor(mods, s, |p| p.next_channel(s)),
            Action::ChannelLeft => self.move_cursor(mods, s, |p| p.channel_left(s)),
            Action::ChannelRight => self.move_cursor(mods, s, |p| p.channel_right(s)),
            Action::FirstChannel => self.move_cursor(mods, s, |p| p.first_channel()),
            Action::LastChannel => self.move_cursor(mods, s, |p| p.last_channel(s)),
            Action::Home => self.move_cursor(mods, s, |p| p.home()),
            Action::End => self.move_cursor(mods, s, |p| p.end(s)),
            Action::Top => self.move_cursor(mods, s, |p| p.to_top()),
            Action::Bottom => self.move_cursor(mods, s, |p| p.to_bottom(s)),
            Action::PrevFrame => {
                self.cancel_selection(s);
                let mut pos = self.cursor;
                pos.previous_frame(s, wrap);
                self.set_cursor(pos, s);
            }
            Action::NextFrame => {
                self.cancel_selection(s);
                let mut pos = self.cursor;
                pos.next_frame(s, wrap);
                self.set_cursor(pos, s);
            }
            Action::ScrollLeft => return self.scroll_channels(-1, s),
            Action::ScrollRight => return self.scroll_channels(1, s),
            Action::Cut => return self.cut(store),
            Action::Copy => return self.copy(store),
            Action::CopyEntire => return self.copy_entire(store),
            Action::Paste => return self.paste(store),
            Action::PasteMix => return self.paste_mix(store),
            Action::PasteEntire => return self.paste_entire(store),
            Action::Delete => self.delete_selection(store),
            Action::SelectChannel => self.select_channel(s),
            Action::SelectAllChannels => self.select_all_channels(s),
            Action::SelectAll => self.select_all(s),
            Action::SelectionStart => {
                let end = self.selection.map_or(self.cursor, |sel| sel.end);
                self.set_selection(Some(Selection::new(self.cursor, end)), s);
            }
            Action::SelectionEnd => {
                let start = self.selection.map_or(self.cursor, |sel| sel.start);
                self.set_selection(Some(Selection::new(start, self.cursor)), s);
            }
            Action::Cancel => if self.is_dragging() {
                self.cancel_dragging(s);
            } else if self.selection.is_some() {
                self.cancel_selection(s);
            } else {
                return false
            }
            Action::ToggleFollow => self.settings.follow = !self.settings.follow,
            Action::ToggleFullRowSelect => {
                self.settings.full_row_select = !self.settings.full_row_select;
                self.invalidate_pattern();
            }
            Action::IncreaseEffectColumns => {
                let (channel, n) = (self.cursor.channel, store.effect_columns(self.cursor.channel));
                self.set_effect_columns(channel, n + 1, store);
            }
            Action::DecreaseEffectColumns => {
                let (channel, n) = (self.cursor.channel, store.effect_columns(self.cursor.channel));
                self.set_effect_columns(channel, n.saturating_sub(1), store);
            }
        }
        true
    }

    // mouse

    pub fn on_mouse_down(&mut self, point: Vec2, mods: Modifiers, store: &mut dyn PatternStore) {
        self.pointer = point;
        match self.hit().classify(point) {
            Region::Header => self.header_click(point, mods, store),
            Region::Pattern => {
                let Some(pos) = self.hit().point_to_cursor(point, store) else { return };
                let selection = self.selection(store);
                match selection {
                    Some(sel) if !mods.shift && sel.contains(&pos) => {
                        self.drag = Some(DragSession::arm(point, self.settings.drag_threshold,
                            sel, &pos));
                    }
                    Some(sel) if mods.shift => {
                        let anchor = self.selection.map_or(sel.start, |s| s.start);
                        self.set_selection(Some(Selection::new(anchor, pos)), store);
                        self.mouse_anchor = Some(anchor);
                    }
                    _ => {
                        self.cancel_selection(store);
                        self.set_cursor(pos, store);
                        self.mouse_anchor = Some(self.cursor);
                    }
                }
            }
            Region::Outside => (),
        }
    }

    fn header_click(&mut self, point: Vec2, mods: Modifiers, store: &mut dyn PatternStore) {
        let Some(hit) = self.hit().header_hit(point) else { return };
        let n = store.effect_columns(hit.channel);
        match hit.arrow {
            Some(EffectArrow::Remove) =>
                self.set_effect_columns(hit.channel, n.saturating_sub(1), store),
            Some(EffectArrow::Add) => self.set_effect_columns(hit.channel, n + 1, store),
            None => {
                let frame = self.cursor.frame;
                let clicked = channel_selection(store, frame, hit.channel);
                let mut sel = clicked;
                if let (true, Some(old)) = (mods.shift, self.selection) {
                    // keep the anchor channel as the raw start
                    let anchor = channel_selection(store, frame, old.start.channel);
                    sel = if hit.channel >= old.start.channel {
                        Selection::new(anchor.start, clicked.end)
                    } else {
                        Selection::new(anchor.end, clicked.start)
                    };
                } else {
                    let mut pos = self.cursor;
                    pos.set_channel(hit.channel, store);
                    pos.column = 0;
                    self.set_cursor(pos, store);
                }
                self.set_selection(Some(sel), store);
            }
        }
    }

    pub fn on_mouse_move(&mut self, point: Vec2, store: &dyn PatternStore) {
        self.pointer = point;

        let hover = self.hit().header_hit(point);
        if hover != self.hover {
            self.hover = hover;
            self.invalidate_header();
        }

        if let Some(drag) = &mut self.drag {
            if !drag.is_active() {
                if !drag.exceeds_threshold(point) {
                    return
                }
                drag.activate(store);
            }
            self.update_drag_target(store);
            self.auto_scroll = self.scroll_direction(point);
        } else if let Some(anchor) = self.mouse_anchor {
            let pos = self.hit().point_to_cursor_clamped(point, store);
            if pos != anchor || self.selection.is_some() {
                self.set_selection(Some(Selection::new(anchor, pos)), store);
            }
            self.auto_scroll = self.scroll_direction(point);
        }
    }

    fn update_drag_target(&mut self, store: &dyn PatternStore) {
        let pos = self.hit().point_to_cursor_clamped(self.pointer, store);
        let old = self.drag_target();
        let Some(drag) = &mut self.drag else { return };
        if drag.retarget(&pos, store) {
            let new = drag.target().copied();
            self.invalidate_block(old, store);
            self.invalidate_block(new, store);
        }
    }

    fn scroll_direction(&self, point: Vec2) -> Option<ScrollDir> {
        let layout = &self.layout;
        if layout.is_empty() {
            return None
        }
        let h = layout.metrics.row_height;
        if point.y < layout.header_height + h {
            Some(ScrollDir::Up)
        } else if point.y >= layout.line_y(layout.lines_full_visible.max(1)) - h {
            Some(ScrollDir::Down)
        } else if point.x < layout.row_number_width {
            Some(ScrollDir::Left)
        } else if point.x >= layout.size.x - layout.metrics.char_width {
            Some(ScrollDir::Right)
        } else {
            None
        }
    }

    /// Steps auto-scroll while dragging or selecting near an edge. Returns
    /// false, touching nothing, if there's nothing to scroll.
    pub fn on_scroll_timer(&mut self, store: &dyn PatternStore) -> bool {
        let dragging = self.drag.as_ref().is_some_and(|d| d.is_active());
        if !dragging && self.mouse_anchor.is_none() {
            return false
        }
        let Some(dir) = self.auto_scroll else { return false };

        let scrolled = match dir {
            ScrollDir::Up | ScrollDir::Down => {
                let last = store.pattern_length(self.cursor.frame) - 1;
                let row = match dir {
                    ScrollDir::Up => self.cursor.row.saturating_sub(1),
                    _ => (self.cursor.row + 1).min(last),
                };
                if row == self.cursor.row {
                    false
                } else {
                    let pos = CursorPos { row, ..self.cursor };
                    self.set_cursor(pos, store);
                    true
                }
            }
            ScrollDir::Left => self.scroll_channels(-1, store),
            ScrollDir::Right => self.scroll_channels(1, store),
        };

        if scrolled {
            let point = self.pointer;
            self.on_mouse_move(point, store);
        }
        scrolled
    }

    pub fn on_mouse_up(&mut self, point: Vec2, mods: Modifiers, store: &mut dyn PatternStore) {
        self.pointer = point;
        self.mouse_anchor = None;
        self.auto_scroll = None;

        let Some(drag) = self.drag.take() else { return };
        if drag.is_active() {
            self.finish_drop(drag, mods.ctrl, mods.shift, store);
        } else if let Some(pos) = self.hit().point_to_cursor(point, store) {
            // a click inside the selection without dragging
            self.cancel_selection(store);
            self.set_cursor(pos, store);
        }
    }

    pub fn on_double_click(&mut self, point: Vec2, store: &dyn PatternStore) {
        match self.hit().classify(point) {
            Region::Header => {
                let sel = all_selection(store, self.cursor.frame);
                self.set_selection(Some(sel), store);
            }
            Region::Pattern => {
                if let Some(pos) = self.hit().point_to_cursor(point, store) {
                    self.set_cursor(pos, store);
                    self.select_channel(store);
                }
            }
            Region::Outside => (),
        }
        self.mouse_anchor = None;
    }

    /// Right click moves the cursor unless it lands in the selection.
    pub fn on_right_down(&mut self, point: Vec2, store: &dyn PatternStore) {
        let Some(pos) = self.hit().point_to_cursor(point, store) else { return };
        if !self.selection(store).is_some_and(|s| s.contains(&pos)) {
            self.cancel_selection(store);
            self.set_cursor(pos, store);
        }
    }

    /// Mouse wheel, in steps; positive is up.
    pub fn on_mouse_scroll(&mut self, steps: f32, mods: Modifiers, store: &dyn PatternStore) {
        if steps == 0.0 {
            return
        }
        let dir = if steps > 0.0 { -1 } else { 1 };
        if mods.ctrl {
            self.scroll_channels(dir, store);
        } else if !(self.settings.follow && self.play.is_some()) {
            let mut pos = self.cursor;
            pos.move_rows(dir * self.settings.wheel_rows as isize, store, self.settings.wrap);
            self.set_cursor(pos, store);
        }
    }

    // drag and drop

    pub fn is_dragging(&self) -> bool {
        self.drag.as_ref().is_some_and(|d| d.is_active())
    }

    pub fn drag_target(&self) -> Option<Selection> {
        self.drag.as_ref().and_then(|d| d.target().copied())
    }

    /// Starts a drag of data from outside the editor.
    pub fn begin_external_drag(&mut self, clip: ClipData) {
        self.drag = Some(DragSession::external(clip));
    }

    /// Moves an external drag's target.
    pub fn update_external_drag(&mut self, point: Vec2, store: &dyn PatternStore) {
        self.pointer = point;
        if self.is_dragging() {
            self.update_drag_target(store);
        }
    }

    /// Drops the current drag. Returns true if anything was written.
    pub fn perform_drop(&mut self, copy: bool, mix: bool, store: &mut dyn PatternStore) -> bool {
        self.mouse_anchor = None;
        self.auto_scroll = None;
        match self.drag.take() {
            Some(drag) if drag.is_active() => self.finish_drop(drag, copy, mix, store),
            _ => false,
        }
    }

    fn finish_drop(&mut self, drag: DragSession, copy: bool, mix: bool,
        store: &mut dyn PatternStore
    ) -> bool {
        let target = drag.target().copied();
        let source = drag.source().copied();
        self.invalidate_block(target, store);
        match drag.drop_onto(store, copy, mix) {
            Some(placed) => {
                log::debug!("dropped at {:?}", placed.start);
                self.invalidate_pattern();
                self.set_selection(Some(placed), store);
                let cursor = self.cursor;
                self.set_cursor(cursor, store);
                true
            }
            None => {
                if let Some(source) = source {
                    self.set_selection(Some(source), store);
                }
                false
            }
        }
    }

    /// Abandons a drag, restoring the selection it started from.
    pub fn cancel_dragging(&mut self, store: &dyn PatternStore) {
        let Some(drag) = self.drag.take() else { return };
        self.invalidate_block(drag.target().copied(), store);
        if let Some(source) = drag.cancel() {
            self.set_selection(Some(source), store);
        }
        self.auto_scroll = None;
    }

    // drawing

    fn grid_state(&self, store: &dyn PatternStore) -> GridState {
        GridState {
            view: self.view(),
            cursor: self.cursor,
            selection: self.selection(store),
            drag_target: self.drag_target().map(|t| t.normalized(store, false)),
            focused: self.focused,
            highlight: self.settings.highlight,
            adjacent: self.settings.adjacent,
            play: self.play,
            hover: self.hover,
        }
    }

    /// Repaints whatever is out of date.
    pub fn draw(&mut self, store: &dyn PatternStore, surface: &mut dyn Surface, theme: &Theme)
        -> RedrawPlan
    {
        if !self.layout_is_current(store) {
            self.relayout(store);
            self.invalidate_background();
        }
        let cursor = self.cursor.clamped(store);
        if cursor != self.cursor {
            self.cursor = cursor;
            self.invalidate_cursor();
        }
        self.keep_cursor_visible();

        let snapshot = Snapshot {
            view: self.view(),
            cursor: (self.cursor.channel, self.cursor.column),
        };
        let plan = self.scheduler.next_plan(snapshot, self.layout.lines_visible);
        if !plan.is_empty() {
            let state = self.grid_state(store);
            let painter = Painter { layout: &self.layout, theme, store, state: &state };
            painter.execute(&plan, surface);
        }
        plan
    }
}

impl Default for PatternEditor {
    fn default() -> Self {
        Self::new(EditorSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        module::Module,
        pattern::{Cell, Note},
        redraw::Body,
        surface::recording::RecordingSurface,
    };

    use super::*;

    const CHANNELS: &[&str] = &["A", "B", "C", "D"];

    fn module() -> Module {
        let mut m = Module::new(CHANNELS, 3, 32);
        for row in 0..32 {
            for channel in 0..4 {
                m.set_cell(0, row, channel, Cell {
                    note: Note::new(row as u8, 4),
                    instrument: Some(channel as u8),
                    ..Cell::EMPTY
                });
            }
        }
        m
    }

    /// Editor over a 20-line window with all four channels visible.
    fn editor(m: &Module) -> (PatternEditor, RecordingSurface, Theme) {
        let mut e = PatternEditor::default();
        e.set_font_metrics(FontMetrics::new(8.0, 10.0));
        e.set_window_size(vec2(400.0, 224.0));
        let mut surface = RecordingSurface::new(Vec2::ZERO);
        let theme = Theme::default();
        e.draw(m, &mut surface, &theme);
        surface.take();
        (e, surface, theme)
    }

    fn point(e: &PatternEditor, m: &Module, pos: CursorPos) -> Vec2 {
        e.point_of(&pos, m).unwrap() + vec2(1.0, 1.0)
    }

    fn block(a: (usize, usize, usize), b: (usize, usize, usize)) -> Selection {
        Selection::new(CursorPos::new(0, a.0, a.1, a.2), CursorPos::new(0, b.0, b.1, b.2))
    }

    fn cells(m: &Module) -> Vec<Cell> {
        (0..32).flat_map(|r| (0..4).map(move |c| (r, c)))
            .map(|(r, c)| m.cell(0, r, c))
            .collect()
    }

    #[test]
    fn test_resize_then_row_move() {
        let mut m = module();
        let mut e = PatternEditor::default();
        let mut surface = RecordingSurface::new(Vec2::ZERO);
        let theme = Theme::default();
        e.set_font_metrics(FontMetrics::new(8.0, 10.0));
        e.set_window_size(vec2(800.0, 600.0));
        assert_eq!(e.draw(&m, &mut surface, &theme).body, Body::Full { relayout: true });

        e.set_window_size(vec2(1024.0, 600.0));
        assert!(e.pending().regions.contains(Regions::BACKGROUND));
        let plan = e.draw(&m, &mut surface, &theme);
        assert_eq!(plan.body, Body::Full { relayout: true });
        assert!(e.pending().is_empty());
        assert_eq!(e.layout().size, vec2(1024.0, 600.0));
        assert_eq!(surface.size, vec2(1024.0, 600.0));

        let layout = e.layout().clone();
        e.action(Action::NextRow, Modifiers::NONE, &mut m);
        let plan = e.draw(&m, &mut surface, &theme);
        assert!(matches!(plan.body, Body::Scroll { rows: 1, .. }));
        assert_eq!(*e.layout(), layout);
        assert_eq!(e.stats().full, 2);
        assert_eq!(e.stats().scroll, 1);

        // nothing pending, nothing drawn
        surface.take();
        assert!(e.draw(&m, &mut surface, &theme).is_empty());
        assert!(surface.ops.is_empty());
    }

    #[test]
    fn test_zero_window() {
        let m = module();
        let mut e = PatternEditor::default();
        let mut surface = RecordingSurface::new(Vec2::ZERO);
        let theme = Theme::default();
        assert!(e.draw(&m, &mut surface, &theme).is_empty());
        assert!(e.pending().regions.contains(Regions::BACKGROUND));
        e.set_window_size(vec2(400.0, 224.0));
        assert_eq!(e.draw(&m, &mut surface, &theme).body, Body::Full { relayout: true });
    }

    #[test]
    fn test_cursor_move_in_row() {
        let mut m = module();
        let (mut e, mut surface, theme) = editor(&m);
        e.action(Action::NextColumn, Modifiers::NONE, &mut m);
        let plan = e.draw(&m, &mut surface, &theme);
        assert_eq!(plan.body, Body::Cursor { from: (0, 0), to: (0, 1) });
    }

    #[test]
    fn test_shift_extends_selection() {
        let mut m = module();
        let (mut e, _, _) = editor(&m);
        e.set_cursor(CursorPos::new(0, 4, 1, 0), &m);
        e.action(Action::NextRow, Modifiers::SHIFT, &mut m);
        e.action(Action::NextRow, Modifiers::SHIFT, &mut m);
        e.action(Action::NextColumn, Modifiers::SHIFT, &mut m);
        let sel = e.selection(&m).unwrap();
        assert_eq!(sel.start, CursorPos::new(0, 4, 1, 0));
        assert_eq!(sel.end, CursorPos::new(0, 6, 1, 1));

        e.action(Action::NextRow, Modifiers::NONE, &mut m);
        assert_eq!(e.selection(&m), None);
    }

    #[test]
    fn test_copy_paste_actions() {
        let mut m = module();
        let (mut e, _, _) = editor(&m);
        e.set_selection(Some(block((4, 1, 0), (7, 1, 1))), &m);
        assert!(e.action(Action::Copy, Modifiers::NONE, &mut m));
        let clip = e.clipboard().unwrap();
        assert_eq!((clip.channels, clip.rows), (1, 4));

        let mut other = Module::new(CHANNELS, 3, 32);
        e.set_cursor(CursorPos::new(0, 10, 2, 0), &other);
        assert!(e.action(Action::Paste, Modifiers::NONE, &mut other));
        assert_eq!(other.cell(0, 10, 2).note, m.cell(0, 4, 1).note);
        assert_eq!(other.cell(0, 10, 2).instrument, Some(1));
        assert!(other.cell(0, 14, 2).is_empty());
        assert!(e.pending().regions.contains(Regions::PATTERN));
    }

    #[test]
    fn test_cut_and_delete() {
        let mut m = module();
        let (mut e, _, _) = editor(&m);
        assert!(!e.action(Action::Cut, Modifiers::NONE, &mut m));
        e.set_selection(Some(block((0, 0, 1), (1, 0, 1))), &m);
        assert!(e.action(Action::Cut, Modifiers::NONE, &mut m));
        assert_eq!(m.cell(0, 0, 0).instrument, None);
        assert!(m.cell(0, 0, 0).note != Note::Empty);

        e.cancel_selection(&m);
        e.set_cursor(CursorPos::new(0, 5, 2, 0), &m);
        e.action(Action::Delete, Modifiers::NONE, &mut m);
        assert_eq!(m.cell(0, 5, 2).note, Note::Empty);
        assert_eq!(m.cell(0, 5, 2).instrument, Some(2));
    }

    #[test]
    fn test_select_all_cycles() {
        let mut m = module();
        let (mut e, _, _) = editor(&m);
        e.set_cursor(CursorPos::new(0, 3, 2, 1), &m);
        e.action(Action::SelectAll, Modifiers::NONE, &mut m);
        assert_eq!(e.selection(&m), Some(channel_selection(&m, 0, 2)));
        e.action(Action::SelectAll, Modifiers::NONE, &mut m);
        assert_eq!(e.selection(&m), Some(all_selection(&m, 0)));

        e.set_selection(Some(block((2, 1, 0), (5, 1, 0))), &m);
        e.action(Action::SelectAllChannels, Modifiers::NONE, &mut m);
        let sel = e.selection(&m).unwrap();
        assert_eq!((sel.start.row, sel.end.row), (2, 5));
        assert_eq!((sel.start.channel, sel.end.channel), (0, 3));
    }

    #[test]
    fn test_drag_threshold() {
        let mut m = module();
        let (mut e, _, _) = editor(&m);
        let sel = block((4, 1, 0), (7, 1, 1));
        e.set_selection(Some(sel), &m);
        let p = point(&e, &m, CursorPos::new(0, 5, 1, 0));

        // three pixels is a click
        e.on_mouse_down(p, Modifiers::NONE, &mut m);
        e.on_mouse_move(p + vec2(3.0, 0.0), &m);
        assert!(!e.is_dragging());
        assert_eq!(e.selection(&m), Some(sel.normalized(&m, false)));
        e.on_mouse_up(p + vec2(3.0, 0.0), Modifiers::NONE, &mut m);
        assert_eq!(e.selection(&m), None);
        assert_eq!(e.cursor(), CursorPos::new(0, 5, 1, 0));

        // ten pixels starts a drag
        e.set_selection(Some(sel), &m);
        let p = point(&e, &m, CursorPos::new(0, 5, 1, 0));
        e.on_mouse_down(p, Modifiers::NONE, &mut m);
        e.on_mouse_move(p + vec2(10.0, 0.0), &m);
        assert!(e.is_dragging());
    }

    #[test]
    fn test_cancel_dragging() {
        let mut m = module();
        let (mut e, _, _) = editor(&m);
        let sel = block((4, 1, 0), (7, 1, 1));
        e.set_selection(Some(sel), &m);
        let before = cells(&m);
        let p = point(&e, &m, CursorPos::new(0, 5, 1, 0));
        e.on_mouse_down(p, Modifiers::NONE, &mut m);
        let to = point(&e, &m, CursorPos::new(0, 9, 3, 0));
        e.on_mouse_move(to, &m);
        assert!(e.is_dragging());
        assert_eq!(e.drag_target().map(|t| t.start), Some(CursorPos::new(0, 8, 3, 0)));

        e.cancel_dragging(&m);
        assert!(!e.is_dragging());
        assert_eq!(e.selection(&m), Some(sel.normalized(&m, false)));
        assert_eq!(cells(&m), before);
    }

    #[test]
    fn test_drag_move_and_copy() {
        let mut m = module();
        let (mut e, _, _) = editor(&m);
        let moved = m.cell(0, 4, 1);
        e.set_cursor(CursorPos::new(0, 8, 0, 0), &m);
        e.set_selection(Some(block((4, 1, 0), (7, 1, 1))), &m);
        let p = point(&e, &m, CursorPos::new(0, 4, 1, 0));
        e.on_mouse_down(p, Modifiers::NONE, &mut m);
        let to = point(&e, &m, CursorPos::new(0, 12, 3, 0));
        e.on_mouse_move(to, &m);
        e.on_mouse_up(to, Modifiers::NONE, &mut m);
        assert_eq!(m.cell(0, 12, 3), moved);
        assert!(m.cell(0, 4, 1).is_empty());
        assert_eq!(e.selection(&m).map(|s| s.start), Some(CursorPos::new(0, 12, 3, 0)));

        // ctrl copies
        let copied = m.cell(0, 12, 3);
        let p = point(&e, &m, CursorPos::new(0, 12, 3, 0));
        e.on_mouse_down(p, Modifiers::NONE, &mut m);
        let to = point(&e, &m, CursorPos::new(0, 0, 0, 0));
        e.on_mouse_move(to, &m);
        e.on_mouse_up(to, Modifiers::CTRL, &mut m);
        assert_eq!(m.cell(0, 0, 0), copied);
        assert_eq!(m.cell(0, 12, 3), copied);
    }

    #[test]
    fn test_external_drop() {
        let mut m = module();
        let (mut e, _, _) = editor(&m);
        let clip = clip::copy(&m, &block((0, 0, 0), (1, 0, 1)));
        let mut target = Module::new(CHANNELS, 3, 32);
        e.begin_external_drag(clip);
        let p = point(&e, &target, CursorPos::new(0, 2, 1, 0));
        e.update_external_drag(p, &target);
        assert!(e.perform_drop(false, false, &mut target));
        assert_eq!(target.cell(0, 2, 1), m.cell(0, 0, 0));
        assert!(!e.is_dragging());
        assert!(!e.perform_drop(false, false, &mut m));
    }

    #[test]
    fn test_mouse_selection() {
        let mut m = module();
        let (mut e, _, _) = editor(&m);
        let p = point(&e, &m, CursorPos::new(0, 2, 0, 0));
        e.on_mouse_down(p, Modifiers::NONE, &mut m);
        assert_eq!(e.cursor(), CursorPos::new(0, 2, 0, 0));
        assert_eq!(e.selection(&m), None);
        let to = point(&e, &m, CursorPos::new(0, 6, 1, 1));
        e.on_mouse_move(to, &m);
        e.on_mouse_up(to, Modifiers::NONE, &mut m);
        let sel = e.selection(&m).unwrap();
        assert_eq!(sel.start, CursorPos::new(0, 2, 0, 0));
        assert_eq!(sel.end, CursorPos::new(0, 6, 1, 1));
    }

    #[test]
    fn test_header_clicks() {
        let mut m = module();
        let (mut e, mut surface, theme) = editor(&m);
        let layout = e.layout().clone();
        let (_, add) = layout.effect_arrows(0, 1);
        e.on_mouse_down(add.center(), Modifiers::NONE, &mut m);
        assert_eq!(m.effect_columns(1), 2);
        assert!(e.pending().regions.contains(Regions::BACKGROUND));
        assert_eq!(e.draw(&m, &mut surface, &theme).body, Body::Full { relayout: true });
        assert_eq!(e.layout().channels[1].columns, 7);

        let (remove, _) = e.layout().effect_arrows(0, 1);
        e.on_mouse_down(remove.center(), Modifiers::NONE, &mut m);
        e.on_mouse_down(remove.center(), Modifiers::NONE, &mut m);
        assert_eq!(m.effect_columns(1), 1);

        let name = vec2(e.layout().channel_x(2, 0) + 2.0, 2.0);
        e.on_mouse_down(name, Modifiers::NONE, &mut m);
        assert_eq!(e.selection(&m), Some(channel_selection(&m, 0, 2)));
        assert_eq!(e.cursor().channel, 2);
    }

    #[test]
    fn test_header_hover() {
        let m = module();
        let (mut e, _, _) = editor(&m);
        let (remove, _) = e.layout().effect_arrows(0, 0);
        e.on_mouse_move(remove.center(), &m);
        assert!(e.pending().regions.contains(Regions::HEADER));
    }

    #[test]
    fn test_scroll_timer() {
        let mut m = module();
        let (mut e, mut surface, theme) = editor(&m);
        assert!(!e.on_scroll_timer(&m));

        // selecting at the top of the song has nowhere to go
        let p = point(&e, &m, CursorPos::new(0, 0, 0, 0));
        e.on_mouse_down(p, Modifiers::NONE, &mut m);
        e.on_mouse_move(vec2(p.x, e.layout().line_y(0) + 1.0), &m);
        e.draw(&m, &mut surface, &theme);
        assert!(!e.on_scroll_timer(&m));
        assert!(e.pending().is_empty());

        // near the bottom edge it scrolls down
        let bottom = vec2(p.x, e.layout().line_y(19) + 2.0);
        e.on_mouse_move(bottom, &m);
        assert!(e.on_scroll_timer(&m));
        assert_eq!(e.cursor().row, 1);
        e.on_mouse_up(bottom, Modifiers::NONE, &mut m);
        assert!(!e.on_scroll_timer(&m));
    }

    #[test]
    fn test_focus_loss_cancels_drag() {
        let mut m = module();
        let (mut e, _, _) = editor(&m);
        let sel = block((4, 1, 0), (7, 1, 1));
        e.set_selection(Some(sel), &m);
        let p = point(&e, &m, CursorPos::new(0, 5, 1, 0));
        e.on_mouse_down(p, Modifiers::NONE, &mut m);
        e.on_mouse_move(p + vec2(0.0, 40.0), &m);
        assert!(e.is_dragging());
        e.set_focus(false, &m);
        assert!(!e.is_dragging());
        assert_eq!(e.selection(&m), Some(sel.normalized(&m, false)));
    }

    #[test]
    fn test_follow_mode() {
        let m = module();
        let (mut e, _, _) = editor(&m);
        e.set_play_position(Some((1, 5)), &m);
        assert_eq!((e.cursor().frame, e.cursor().row), (1, 5));
        e.set_follow(false);
        e.set_play_position(Some((2, 9)), &m);
        assert_eq!((e.cursor().frame, e.cursor().row), (1, 5));
    }

    #[test]
    fn test_wheel() {
        let m = module();
        let (mut e, _, _) = editor(&m);
        e.set_follow(false);
        e.on_mouse_scroll(-1.0, Modifiers::NONE, &m);
        assert_eq!(e.cursor().row, 4);
        e.on_mouse_scroll(1.0, Modifiers::NONE, &m);
        assert_eq!(e.cursor().row, 0);
    }

    #[test]
    fn test_effect_column_actions() {
        let mut m = module();
        let (mut e, _, _) = editor(&m);
        e.set_cursor(CursorPos::new(0, 0, 0, 4), &m);
        e.action(Action::IncreaseEffectColumns, Modifiers::NONE, &mut m);
        assert_eq!(m.effect_columns(0), 2);
        e.action(Action::DecreaseEffectColumns, Modifiers::NONE, &mut m);
        e.action(Action::DecreaseEffectColumns, Modifiers::NONE, &mut m);
        assert_eq!(m.effect_columns(0), 1);
        assert_eq!(e.cursor().column, 4);
    }
}
