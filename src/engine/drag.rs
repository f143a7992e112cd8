//! Drag and resize of a single task bar.
//!
//! `idle → dragging(kind) → idle`. While dragging, the dragged task renders
//! from a local override; the override is committed through the task store
//! on drop and discarded on every exit path.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use tracing::{debug, info, warn};

use crate::backend::{DragListener, TaskBackend};
use crate::error::BackendError;
use crate::model::{BoardTask, TaskDates, TaskFields, TaskId};

/// Which part of a bar is being manipulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Move,
    ResizeStart,
    ResizeEnd,
}

impl DragKind {
    /// Pick the drag kind from where on the bar the pointer went down.
    pub fn from_grab(pointer_x: f32, bar_left: f32, bar_right: f32, handle_width: f32) -> Self {
        let handle = handle_width.min((bar_right - bar_left) / 3.0);
        if pointer_x <= bar_left + handle {
            DragKind::ResizeStart
        } else if pointer_x >= bar_right - handle {
            DragKind::ResizeEnd
        } else {
            DragKind::Move
        }
    }
}

/// State of one drag gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    pub task_id: TaskId,
    pub kind: DragKind,
    pub local_override: HashMap<TaskId, TaskDates>,
    /// Dates the task had when the gesture began.
    pub original_override: HashMap<TaskId, TaskDates>,
}

impl DragState {
    fn current(&self) -> Option<TaskDates> {
        self.local_override.get(&self.task_id).copied()
    }

    fn original(&self) -> Option<TaskDates> {
        self.original_override.get(&self.task_id).copied()
    }
}

/// New dates for `current` when the pointer hovers `hovered` during a drag of `kind`.
pub fn dates_for_hover(kind: DragKind, original: TaskDates, current: TaskDates, hovered: NaiveDate) -> TaskDates {
    match kind {
        DragKind::Move => {
            let span = original.duration_days();
            TaskDates::new(hovered, hovered + Duration::days(span - 1))
        }
        DragKind::ResizeStart => TaskDates::new(hovered.min(current.end), current.end),
        DragKind::ResizeEnd => TaskDates::new(current.start, hovered.max(current.start)),
    }
}

/// How a gesture ended.
#[derive(Debug)]
pub enum DragOutcome {
    /// Dropped; the final dates were sent to the store.
    Committed {
        task_id: TaskId,
        dates: TaskDates,
        result: Result<BoardTask, BackendError>,
    },
    /// Cancelled by pointer-cancel or Escape; nothing was sent.
    Cancelled { task_id: TaskId },
}

#[derive(Debug, Default)]
pub struct DragController {
    state: Option<DragState>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&DragState> {
        self.state.as_ref()
    }

    pub fn dragged_task(&self) -> Option<TaskId> {
        self.state.as_ref().map(|s| s.task_id)
    }

    /// Overrides to apply when projecting geometry. Empty when idle.
    pub fn overrides(&self) -> HashMap<TaskId, TaskDates> {
        self.state
            .as_ref()
            .map(|s| s.local_override.clone())
            .unwrap_or_default()
    }

    /// Pointer-down on a handle. Ignored (returns false) while another drag is active.
    pub fn begin(
        &mut self,
        task_id: TaskId,
        kind: DragKind,
        dates: TaskDates,
        listener: &mut dyn DragListener,
    ) -> bool {
        if self.state.is_some() {
            debug!(%task_id, "pointer-down ignored, drag already active");
            return false;
        }
        let snapshot = HashMap::from([(task_id, dates)]);
        self.state = Some(DragState {
            task_id,
            kind,
            local_override: snapshot.clone(),
            original_override: snapshot,
        });
        listener.drag_started(task_id);
        debug!(%task_id, ?kind, "drag started");
        true
    }

    /// Pointer moved over a day column. Returns the dragged task's new dates.
    pub fn hover(&mut self, hovered: NaiveDate) -> Option<TaskDates> {
        let state = self.state.as_mut()?;
        let original = state.original()?;
        let current = state.current().unwrap_or(original);
        let next = dates_for_hover(state.kind, original, current, hovered);
        state.local_override.insert(state.task_id, next);
        Some(next)
    }

    /// Pointer-up: send the final override to the store. Always commits, even
    /// if the task ends where it started. State is cleared whatever the result.
    pub fn finish(
        &mut self,
        backend: &mut dyn TaskBackend,
        listener: &mut dyn DragListener,
    ) -> Option<DragOutcome> {
        let state = self.state.take()?;
        listener.drag_ended(state.task_id);
        let dates = state.current().or_else(|| state.original())?;

        let result = backend.update_task(state.task_id, &TaskFields::from(dates));
        match &result {
            Ok(_) => info!(task_id = %state.task_id, start = %dates.start, end = %dates.end, "drag committed"),
            // No rollback: the snapshot still holds the store's dates.
            Err(e) => warn!(task_id = %state.task_id, error = %e, "drag commit failed"),
        }
        Some(DragOutcome::Committed {
            task_id: state.task_id,
            dates,
            result,
        })
    }

    /// Pointer-cancel or Escape: drop the override without committing.
    pub fn cancel(&mut self, listener: &mut dyn DragListener) -> Option<DragOutcome> {
        let state = self.state.take()?;
        listener.drag_ended(state.task_id);
        debug!(task_id = %state.task_id, "drag cancelled");
        Some(DragOutcome::Cancelled {
            task_id: state.task_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NoopDragListener;
    use crate::model::{BoardSnapshot, TaskUpdate};
    use uuid::Uuid;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[derive(Default)]
    struct RecordingBackend {
        updates: Vec<(TaskId, TaskFields)>,
        fail: bool,
    }

    impl TaskBackend for RecordingBackend {
        fn fetch_tasks_by_column(&mut self, _board_id: Uuid) -> Result<BoardSnapshot, BackendError> {
            Ok(BoardSnapshot::new("test"))
        }

        fn update_task(&mut self, task_id: TaskId, fields: &TaskFields) -> Result<BoardTask, BackendError> {
            self.updates.push((task_id, fields.clone()));
            if self.fail {
                return Err(BackendError::status(500, "down"));
            }
            let mut task = BoardTask::new("t", Uuid::new_v4(), 0);
            task.id = task_id;
            task.apply(fields);
            Ok(task)
        }

        fn batch_update_tasks(&mut self, _updates: &[TaskUpdate]) -> Result<Vec<BoardTask>, BackendError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct Events(Vec<(&'static str, TaskId)>);

    impl DragListener for Events {
        fn drag_started(&mut self, task_id: TaskId) {
            self.0.push(("start", task_id));
        }
        fn drag_ended(&mut self, task_id: TaskId) {
            self.0.push(("end", task_id));
        }
    }

    #[test]
    fn move_keeps_inclusive_duration() {
        let original = TaskDates::new(day(10), day(12));
        let moved = dates_for_hover(DragKind::Move, original, original, day(20));
        assert_eq!(moved, TaskDates::new(day(20), day(22)));
    }

    #[test]
    fn resize_start_clamps_to_end() {
        let dates = TaskDates::new(day(10), day(12));
        assert_eq!(dates_for_hover(DragKind::ResizeStart, dates, dates, day(8)).start, day(8));
        assert_eq!(
            dates_for_hover(DragKind::ResizeStart, dates, dates, day(15)),
            TaskDates::new(day(12), day(12))
        );
    }

    #[test]
    fn resize_end_clamps_to_start() {
        let dates = TaskDates::new(day(10), day(12));
        assert_eq!(dates_for_hover(DragKind::ResizeEnd, dates, dates, day(14)).end, day(14));
        assert_eq!(
            dates_for_hover(DragKind::ResizeEnd, dates, dates, day(1)),
            TaskDates::new(day(10), day(10))
        );
    }

    #[test]
    fn grab_zones_pick_drag_kind() {
        assert_eq!(DragKind::from_grab(101.0, 100.0, 200.0, 7.0), DragKind::ResizeStart);
        assert_eq!(DragKind::from_grab(150.0, 100.0, 200.0, 7.0), DragKind::Move);
        assert_eq!(DragKind::from_grab(198.0, 100.0, 200.0, 7.0), DragKind::ResizeEnd);
        // A narrow bar keeps a grabbable middle.
        assert_eq!(DragKind::from_grab(110.0, 100.0, 120.0, 7.0), DragKind::Move);
    }

    #[test]
    fn second_pointer_down_is_ignored() {
        let mut drag = DragController::new();
        let mut listener = NoopDragListener;
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let dates = TaskDates::new(day(1), day(2));
        assert!(drag.begin(a, DragKind::Move, dates, &mut listener));
        assert!(!drag.begin(b, DragKind::ResizeEnd, dates, &mut listener));
        assert_eq!(drag.dragged_task(), Some(a));
    }

    #[test]
    fn only_final_override_is_committed() {
        let mut drag = DragController::new();
        let mut backend = RecordingBackend::default();
        let mut events = Events::default();
        let id = Uuid::new_v4();
        drag.begin(id, DragKind::Move, TaskDates::new(day(1), day(3)), &mut events);
        drag.hover(day(5));
        drag.hover(day(7));
        assert_eq!(drag.overrides()[&id], TaskDates::new(day(7), day(9)));

        let outcome = drag.finish(&mut backend, &mut events).unwrap();
        assert!(matches!(outcome, DragOutcome::Committed { result: Ok(_), .. }));
        assert_eq!(backend.updates.len(), 1);
        assert_eq!(backend.updates[0].1, TaskFields::from(TaskDates::new(day(7), day(9))));
        assert_eq!(events.0, vec![("start", id), ("end", id)]);
        assert!(!drag.is_dragging());
    }

    #[test]
    fn drop_without_movement_still_commits_original_dates() {
        let mut drag = DragController::new();
        let mut backend = RecordingBackend::default();
        let id = Uuid::new_v4();
        let dates = TaskDates::new(day(4), day(6));
        drag.begin(id, DragKind::ResizeEnd, dates, &mut NoopDragListener);
        drag.finish(&mut backend, &mut NoopDragListener);
        assert_eq!(backend.updates, vec![(id, TaskFields::from(dates))]);
    }

    #[test]
    fn failed_commit_still_clears_state() {
        let mut drag = DragController::new();
        let mut backend = RecordingBackend {
            fail: true,
            ..Default::default()
        };
        let id = Uuid::new_v4();
        drag.begin(id, DragKind::Move, TaskDates::new(day(4), day(6)), &mut NoopDragListener);
        drag.hover(day(9));
        let outcome = drag.finish(&mut backend, &mut NoopDragListener).unwrap();
        assert!(matches!(outcome, DragOutcome::Committed { result: Err(_), .. }));
        assert!(!drag.is_dragging());
        assert!(drag.overrides().is_empty());
    }

    #[test]
    fn cancel_clears_without_commit() {
        let mut drag = DragController::new();
        let mut backend = RecordingBackend::default();
        let mut events = Events::default();
        let id = Uuid::new_v4();
        drag.begin(id, DragKind::Move, TaskDates::new(day(4), day(6)), &mut events);
        drag.hover(day(9));
        assert!(matches!(drag.cancel(&mut events), Some(DragOutcome::Cancelled { .. })));
        assert!(drag.finish(&mut backend, &mut events).is_none());
        assert!(backend.updates.is_empty());
        assert_eq!(events.0, vec![("start", id), ("end", id)]);
    }

    #[test]
    fn hover_while_idle_does_nothing() {
        let mut drag = DragController::new();
        assert_eq!(drag.hover(day(3)), None);
        assert!(drag.overrides().is_empty());
    }
}
