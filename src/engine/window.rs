//! Bounded sliding window of day columns.
//!
//! The window grows by [`BUFFER_DAYS`] when scrolling approaches either edge
//! and drops the same number of days from the far edge once it would exceed
//! [`MAX_DAYS_IN_VIEW`]. Every extension reports how far the scroll offset
//! must move so the days under the viewport stay put.

use chrono::{Duration, NaiveDate};
use tracing::debug;

use crate::model::DateCell;

pub const MAX_DAYS_IN_VIEW: usize = 365;
pub const BUFFER_DAYS: usize = 60;
pub const INITIAL_SPAN_DAYS: usize = 180;
/// Distance from an edge, in pixels, at which the window extends.
pub const EDGE_THRESHOLD_PX: f32 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
}

/// Where a recentered date should land in the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Start,
    Center,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtendOutcome {
    pub edge: Edge,
    pub added: usize,
    pub trimmed: usize,
    /// Add this to the horizontal scroll offset to cancel the visual jump.
    pub scroll_delta_px: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateWindow {
    cells: Vec<DateCell>,
}

impl DateWindow {
    /// A fresh window of [`INITIAL_SPAN_DAYS`] with `center` in the middle.
    pub fn centered(center: NaiveDate, today: NaiveDate) -> Self {
        let half = (INITIAL_SPAN_DAYS / 2) as i64;
        Self::span(center - Duration::days(half), INITIAL_SPAN_DAYS, today)
    }

    fn span(first: NaiveDate, len: usize, today: NaiveDate) -> Self {
        let cells = (0..len as i64)
            .map(|offset| DateCell::new(first + Duration::days(offset), today))
            .collect();
        Self { cells }
    }

    pub fn cells(&self) -> &[DateCell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.cells.first().map(|c| c.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.cells.last().map(|c| c.date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        matches!((self.first_date(), self.last_date()), (Some(a), Some(b)) if a <= date && date <= b)
    }

    pub fn total_width(&self, column_width: f32) -> f32 {
        self.cells.len() as f32 * column_width
    }

    /// The day under an x offset measured from the window's left edge.
    pub fn date_at(&self, x: f32, column_width: f32) -> Option<NaiveDate> {
        if x < 0.0 || column_width <= 0.0 {
            return None;
        }
        self.cells.get((x / column_width) as usize).map(|c| c.date)
    }

    /// Add [`BUFFER_DAYS`] at `edge`, trimming the opposite edge when the
    /// window would outgrow [`MAX_DAYS_IN_VIEW`].
    pub fn extend(&mut self, edge: Edge, today: NaiveDate, column_width: f32) -> ExtendOutcome {
        let added = BUFFER_DAYS;
        let mut trimmed = 0;
        match edge {
            Edge::Start => {
                let first = self.first_date().unwrap_or(today);
                let fresh = Self::span(first - Duration::days(added as i64), added, today);
                self.cells.splice(0..0, fresh.cells);
                if self.cells.len() > MAX_DAYS_IN_VIEW {
                    trimmed = added.min(self.cells.len());
                    self.cells.truncate(self.cells.len() - trimmed);
                }
            }
            Edge::End => {
                let next = self
                    .last_date()
                    .map(|d| d + Duration::days(1))
                    .unwrap_or(today);
                self.cells.extend(Self::span(next, added, today).cells);
                if self.cells.len() > MAX_DAYS_IN_VIEW {
                    trimmed = added.min(self.cells.len());
                    self.cells.drain(0..trimmed);
                }
            }
        }

        let scroll_delta_px = match edge {
            Edge::Start => added as f32 * column_width,
            Edge::End => -(trimmed as f32 * column_width),
        };
        debug!(?edge, added, trimmed, len = self.cells.len(), "date window extended");
        ExtendOutcome {
            edge,
            added,
            trimmed,
            scroll_delta_px,
        }
    }

    /// Throw the window away and build a fresh span around `target`.
    pub fn recenter(&mut self, target: NaiveDate, today: NaiveDate) {
        *self = Self::centered(target, today);
    }

    /// Scroll offset that puts `date` at `placement` inside a viewport of
    /// `viewport_width`. `None` if the date is outside the window.
    pub fn scroll_offset_for(
        &self,
        date: NaiveDate,
        placement: Placement,
        viewport_width: f32,
        column_width: f32,
    ) -> Option<f32> {
        let first = self.first_date()?;
        if !self.contains(date) {
            return None;
        }
        let left = (date - first).num_days() as f32 * column_width;
        let raw = match placement {
            Placement::Start => left,
            Placement::Center => left + column_width / 2.0 - viewport_width / 2.0,
            Placement::End => left + column_width - viewport_width,
        };
        let max = (self.total_width(column_width) - viewport_width).max(0.0);
        Some(raw.clamp(0.0, max))
    }

    /// Which edge, if any, the viewport is close enough to for an extension.
    ///
    /// An extension that would trim days currently inside the viewport is
    /// not offered.
    pub fn edge_near(&self, scroll_x: f32, viewport_width: f32, column_width: f32) -> Option<Edge> {
        let total = self.total_width(column_width);
        let buffer_px = BUFFER_DAYS as f32 * column_width;
        let would_trim = self.cells.len() + BUFFER_DAYS > MAX_DAYS_IN_VIEW;

        let to_start = scroll_x;
        let to_end = total - (scroll_x + viewport_width);

        let start_ok = to_start < EDGE_THRESHOLD_PX
            && !(would_trim && scroll_x + viewport_width > total - buffer_px);
        let end_ok = to_end < EDGE_THRESHOLD_PX && !(would_trim && scroll_x < buffer_px);

        match (start_ok, end_ok) {
            (true, true) if to_end < to_start => Some(Edge::End),
            (true, _) => Some(Edge::Start),
            (false, true) => Some(Edge::End),
            (false, false) => None,
        }
    }
}
