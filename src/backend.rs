//! Collaborators the timeline needs from the surrounding application.
//!
//! The engine never owns task data; it reads snapshots and asks these traits
//! to mutate. Calls are made from the UI thread and return when the store has
//! answered.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::BackendError;
use crate::model::{BoardSnapshot, BoardTask, RelationshipEdge, RelationshipKind, TaskFields, TaskId, TaskUpdate};

pub trait TaskBackend {
    fn fetch_tasks_by_column(&mut self, board_id: Uuid) -> Result<BoardSnapshot, BackendError>;

    fn update_task(&mut self, task_id: TaskId, fields: &TaskFields) -> Result<BoardTask, BackendError>;

    /// All-or-nothing: an error means no update was applied.
    fn batch_update_tasks(&mut self, updates: &[TaskUpdate]) -> Result<Vec<BoardTask>, BackendError>;
}

pub trait RelationshipBackend {
    /// Edges whose `from_task` is `task_id`.
    fn get_task_relationships(&mut self, task_id: TaskId) -> Result<Vec<RelationshipEdge>, BackendError>;

    fn add_task_relationship(
        &mut self,
        from: TaskId,
        kind: RelationshipKind,
        to: TaskId,
    ) -> Result<RelationshipEdge, BackendError>;

    fn remove_task_relationship(&mut self, from: TaskId, edge_id: Uuid) -> Result<(), BackendError>;
}

/// Opaque per-board key-value store for the last scrolled-to date.
pub trait ScrollPositionStore {
    fn load(&self, board_id: Uuid) -> Option<NaiveDate>;

    fn save(&mut self, board_id: Uuid, date: NaiveDate) -> Result<(), BackendError>;
}

/// Told when a timeline drag begins and ends, so competing interactions can pause.
pub trait DragListener {
    fn drag_started(&mut self, task_id: TaskId);
    fn drag_ended(&mut self, task_id: TaskId);
}

/// Listener that ignores drag notifications.
#[derive(Debug, Default)]
pub struct NoopDragListener;

impl DragListener for NoopDragListener {
    fn drag_started(&mut self, _task_id: TaskId) {}
    fn drag_ended(&mut self, _task_id: TaskId) {}
}

/// Remote change pushed by the board's live channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteChange {
    TaskCreated(TaskId),
    TaskUpdated(TaskId),
    TaskDeleted(TaskId),
}

impl RemoteChange {
    /// Created and deleted tasks change the snapshot's shape and need a refetch;
    /// updates are applied upstream.
    pub fn needs_refetch(&self) -> bool {
        !matches!(self, RemoteChange::TaskUpdated(_))
    }
}
