//! Decides how much of the grid to repaint.
//!
//! Callers accumulate invalidations between paints. At paint time
//! [`plan`] compares the pending set and the view that was last drawn with
//! the view about to be drawn, and picks the cheapest body repaint:
//! everything, a buffer blit plus exposed lines, individual lines, or just
//! the cursor cell.

use bitflags::bitflags;

use crate::layout::Viewport;

bitflags! {
    /// Screen regions waiting to be repainted.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Regions: u8 {
        /// Pattern data changed.
        const PATTERN = 1 << 0;
        /// Cursor or selection moved.
        const CURSOR = 1 << 1;
        /// Geometry or colors changed; implies everything.
        const BACKGROUND = 1 << 2;
        /// Channel header changed.
        const HEADER = 1 << 3;
    }
}

/// Song rows of the viewed frame known to be dirty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowSpan {
    Rows(usize, usize),
    All,
}

impl RowSpan {
    fn union(self, other: RowSpan) -> RowSpan {
        match (self, other) {
            (RowSpan::Rows(a0, a1), RowSpan::Rows(b0, b1)) => RowSpan::Rows(a0.min(b0), a1.max(b1)),
            _ => RowSpan::All,
        }
    }
}

/// Accumulated invalidations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Invalidation {
    pub regions: Regions,
    pub rows: Option<RowSpan>,
}

impl Invalidation {
    pub fn mark(&mut self, regions: Regions) {
        self.regions |= regions;
        if regions.contains(Regions::PATTERN) {
            self.rows = Some(RowSpan::All);
        }
    }

    /// Marks a range of rows as changed.
    pub fn mark_rows(&mut self, start: usize, end: usize) {
        let span = RowSpan::Rows(start.min(end), start.max(end));
        self.regions |= Regions::PATTERN;
        self.rows = Some(self.rows.map_or(span, |rows| rows.union(span)));
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Clears what a paint serviced.
    pub fn clear(&mut self, serviced: Regions) {
        self.regions.remove(serviced);
        if !self.regions.contains(Regions::PATTERN) {
            self.rows = None;
        }
    }
}

/// What is on screen, as far as repainting is concerned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub view: Viewport,
    /// Channel and column of the cursor cell.
    pub cursor: (usize, usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Body {
    Nothing,
    /// Repaint every line. `relayout` is set when geometry changed.
    Full { relayout: bool },
    /// Shift the buffer by `rows` lines and repaint `lines`.
    Scroll { rows: isize, lines: Vec<usize> },
    /// Repaint these lines.
    Lines(Vec<usize>),
    /// Erase the old cursor cell and draw the new one.
    Cursor { from: (usize, usize), to: (usize, usize) },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedrawPlan {
    pub body: Body,
    pub header: bool,
    /// Flags this plan takes care of.
    pub serviced: Regions,
}

impl RedrawPlan {
    pub fn nothing() -> Self {
        Self { body: Body::Nothing, header: false, serviced: Regions::empty() }
    }

    pub fn is_empty(&self) -> bool {
        self.body == Body::Nothing && !self.header
    }
}

/// Picks a repaint plan. Pure; callers clear `plan.serviced` afterward.
pub fn plan(pending: &Invalidation, prev: Option<&Snapshot>, next: &Snapshot,
    lines_visible: usize
) -> RedrawPlan {
    if lines_visible == 0 {
        return RedrawPlan::nothing()
    }

    let regions = pending.regions;
    let middle = lines_visible / 2;

    let (body, serviced) = match prev {
        None => (Body::Full { relayout: true }, Regions::all()),
        Some(_) if regions.contains(Regions::BACKGROUND) =>
            (Body::Full { relayout: true }, Regions::all()),
        Some(prev) if prev.view.frame != next.view.frame
            || prev.view.first_channel != next.view.first_channel =>
            (Body::Full { relayout: false }, Regions::all()),
        Some(prev) if prev.view.center_row != next.view.center_row => {
            let d = next.view.center_row as isize - prev.view.center_row as isize;
            if regions.contains(Regions::PATTERN) || d.unsigned_abs() >= lines_visible {
                (Body::Full { relayout: false }, Regions::all())
            } else {
                let lines = scroll_lines(d, middle, lines_visible);
                (Body::Scroll { rows: d, lines }, Regions::PATTERN | Regions::CURSOR)
            }
        }
        Some(_) if regions.contains(Regions::PATTERN) => {
            let lines = dirty_lines(pending.rows, next.view.center_row, middle,
                lines_visible);
            (Body::Lines(lines), Regions::PATTERN | Regions::CURSOR)
        }
        Some(prev) if regions.contains(Regions::CURSOR) =>
            (Body::Cursor { from: prev.cursor, to: next.cursor }, Regions::CURSOR),
        Some(_) => (Body::Nothing, Regions::empty()),
    };

    let header = matches!(body, Body::Full { .. })
        || regions.intersects(Regions::HEADER | Regions::BACKGROUND);
    let serviced = if header { serviced | Regions::HEADER } else { serviced };

    RedrawPlan { body, header, serviced }
}

/// Lines to repaint after shifting the buffer by `d` rows: the exposed
/// lines and the old and new cursor lines.
fn scroll_lines(d: isize, middle: usize, lines_visible: usize) -> Vec<usize> {
    let n = d.unsigned_abs();
    let mut lines: Vec<usize> = if d > 0 {
        (lines_visible - n..lines_visible).collect()
    } else {
        (0..n).collect()
    };
    lines.push(middle);
    let old_cursor = middle as isize - d;
    if (0..lines_visible as isize).contains(&old_cursor) {
        lines.push(old_cursor as usize);
    }
    lines.sort_unstable();
    lines.dedup();
    lines
}

/// Screen lines showing dirty rows, always including the cursor line.
fn dirty_lines(rows: Option<RowSpan>, center_row: usize, middle: usize,
    lines_visible: usize
) -> Vec<usize> {
    let mut lines = match rows {
        Some(RowSpan::Rows(start, end)) => {
            let first_row = center_row as isize - middle as isize;
            let start = (start as isize - first_row).max(0);
            let end = (end as isize - first_row).min(lines_visible as isize - 1);
            (start..=end).map(|l| l as usize).collect()
        }
        Some(RowSpan::All) => (0..lines_visible).collect(),
        None => Vec::new(),
    };
    if !lines.contains(&middle) {
        lines.push(middle);
        lines.sort_unstable();
    }
    lines
}

/// Counts of executed plans.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RedrawStats {
    pub full: u64,
    pub scroll: u64,
    pub lines: u64,
    pub cursor: u64,
    pub header: u64,
}

impl RedrawStats {
    fn record(&mut self, plan: &RedrawPlan) {
        match plan.body {
            Body::Nothing => (),
            Body::Full { .. } => self.full += 1,
            Body::Scroll { .. } => self.scroll += 1,
            Body::Lines(_) => self.lines += 1,
            Body::Cursor { .. } => self.cursor += 1,
        }
        if plan.header {
            self.header += 1;
        }
    }
}

/// Holds pending invalidations and the last drawn snapshot.
#[derive(Debug, Default)]
pub struct RedrawScheduler {
    pending: Invalidation,
    last: Option<Snapshot>,
    stats: RedrawStats,
}

impl RedrawScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(&mut self, regions: Regions) {
        self.pending.mark(regions);
    }

    pub fn invalidate_rows(&mut self, start: usize, end: usize) {
        self.pending.mark_rows(start, end);
    }

    pub fn pending(&self) -> &Invalidation {
        &self.pending
    }

    pub fn stats(&self) -> &RedrawStats {
        &self.stats
    }

    /// Plans the next paint and assumes it will be carried out.
    pub fn next_plan(&mut self, next: Snapshot, lines_visible: usize) -> RedrawPlan {
        let plan = plan(&self.pending, self.last.as_ref(), &next, lines_visible);
        if lines_visible == 0 {
            log::trace!("nothing visible, keeping {:?}", self.pending.regions);
            return plan
        }
        self.pending.clear(plan.serviced);
        self.last = Some(next);
        if !plan.is_empty() {
            self.stats.record(&plan);
            log::debug!("redraw {:?}, header: {}", plan.body, plan.header);
            log::trace!("redraw counts {:?}", self.stats);
        }
        plan
    }
}
