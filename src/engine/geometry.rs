use std::collections::HashMap;

use egui::{Pos2, Rect, Vec2};

use super::index::DateIndex;
use super::layout::RowLayout;
use crate::model::{GanttTask, TaskDates, TaskId};

/// Screen rectangle of a task bar, relative to the timeline's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskPosition {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl TaskPosition {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn rect(&self) -> Rect {
        Rect::from_min_size(Pos2::new(self.x, self.y), Vec2::new(self.width, self.height))
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.y + self.height
    }
}

/// Fixed sizes used to turn columns and rows into pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryMetrics {
    pub column_width: f32,
    pub header_height: f32,
    pub row_height: f32,
    /// Vertical gap between a bar and its row edges.
    pub bar_inset: f32,
}

impl Default for GeometryMetrics {
    fn default() -> Self {
        Self {
            column_width: 40.0,
            header_height: 44.0,
            row_height: 32.0,
            bar_inset: 5.0,
        }
    }
}

impl GeometryMetrics {
    pub fn row_top(&self, row: usize) -> f32 {
        self.header_height + row as f32 * self.row_height
    }
}

/// First and last column of a span, or `None` if either end is out of view.
pub fn column_span(dates: TaskDates, index: &DateIndex) -> Option<(usize, usize)> {
    let start = index.get(dates.start)?;
    let end = index.get(dates.end)?;
    Some((start, end.max(start)))
}

/// Span of a dragged bar, clipped to the window so the bar never leaves the
/// chart while the pointer is still down.
pub fn clipped_span(dates: TaskDates, index: &DateIndex) -> Option<(usize, usize)> {
    let clipped = TaskDates::new(index.clamp(dates.start)?, index.clamp(dates.end)?);
    column_span(clipped, index)
}

/// Bar rectangle for a column span on `row`. A single-day task is one full column wide.
pub fn bar_position((start_col, end_col): (usize, usize), row: usize, metrics: &GeometryMetrics) -> TaskPosition {
    TaskPosition {
        x: start_col as f32 * metrics.column_width,
        y: metrics.row_top(row) + metrics.bar_inset,
        width: (end_col - start_col + 1) as f32 * metrics.column_width,
        height: (metrics.row_height - metrics.bar_inset * 2.0).max(1.0),
    }
}

/// Position every task that is fully resolvable in the current window.
/// `overrides` replaces the dates of tasks being dragged; those are clipped
/// to the window instead of skipped.
pub fn project(
    tasks: &[GanttTask],
    overrides: &HashMap<TaskId, TaskDates>,
    index: &DateIndex,
    layout: &RowLayout,
    metrics: &GeometryMetrics,
) -> HashMap<TaskId, TaskPosition> {
    tasks
        .iter()
        .filter_map(|task| {
            let row = layout.row_of(task.id)?;
            let span = match overrides.get(&task.id) {
                Some(dragged) => clipped_span(*dragged, index)?,
                None => column_span(task.dates, index)?,
            };
            Some((task.id, bar_position(span, row, metrics)))
        })
        .collect()
}

/// Positions recomputed lazily once the inputs have settled.
#[derive(Debug, Clone, Default)]
pub struct GeometryCache {
    positions: HashMap<TaskId, TaskPosition>,
    dirty: bool,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self {
            positions: HashMap::new(),
            dirty: true,
        }
    }

    /// Mark positions stale; the next [`GeometryCache::settle`] recomputes them.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn settle(
        &mut self,
        tasks: &[GanttTask],
        overrides: &HashMap<TaskId, TaskDates>,
        index: &DateIndex,
        layout: &RowLayout,
        metrics: &GeometryMetrics,
    ) -> &HashMap<TaskId, TaskPosition> {
        if self.dirty {
            self.positions = project(tasks, overrides, index, layout, metrics);
            self.dirty = false;
        }
        &self.positions
    }

    pub fn positions(&self) -> &HashMap<TaskId, TaskPosition> {
        &self.positions
    }

    /// Topmost task whose bar contains the point.
    pub fn task_at(&self, x: f32, y: f32) -> Option<TaskId> {
        self.positions
            .iter()
            .find(|(_, pos)| pos.contains(x, y))
            .map(|(id, _)| *id)
    }
}
