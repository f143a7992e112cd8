//! A board kept in a single JSON file, acting as the task and relationship
//! store. Relationship rules match what the board server enforces.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::backend::{RelationshipBackend, TaskBackend};
use crate::error::BackendError;
use crate::model::{
    BoardSnapshot, BoardTask, Column, ColumnTasks, EdgeId, RelationshipEdge, RelationshipKind, TaskFields, TaskId,
    TaskUpdate,
};

/// On-disk layout of a board file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardDocument {
    pub board: BoardSnapshot,
    #[serde(default)]
    pub relationships: Vec<RelationshipEdge>,
}

impl BoardDocument {
    pub fn new(board: BoardSnapshot) -> Self {
        Self {
            board,
            relationships: Vec::new(),
        }
    }

    fn has_task(&self, id: TaskId) -> bool {
        self.board.task(id).is_some()
    }

    /// True if `target` is reachable from `start` along dependency edges.
    fn reaches(&self, start: TaskId, target: TaskId) -> bool {
        let mut stack = vec![start];
        let mut seen = HashSet::new();
        while let Some(node) = stack.pop() {
            if node == target {
                return true;
            }
            if !seen.insert(node) {
                continue;
            }
            stack.extend(
                self.relationships
                    .iter()
                    .filter(|e| e.kind == RelationshipKind::Parent && e.from_task == node)
                    .map(|e| e.to_task),
            );
        }
        false
    }

    fn add_relationship(
        &mut self,
        from: TaskId,
        kind: RelationshipKind,
        to: TaskId,
    ) -> Result<RelationshipEdge, BackendError> {
        if from == to {
            return Err(BackendError::status(400, "a task cannot be related to itself"));
        }
        if !self.has_task(from) || !self.has_task(to) {
            return Err(BackendError::not_found("task not found"));
        }
        if self
            .relationships
            .iter()
            .any(|e| e.from_task == from && e.to_task == to && e.kind == kind)
        {
            return Err(BackendError::status(409, "relationship already exists"));
        }

        // Normalise to parent -> child before looking for a cycle.
        let dependency = match kind {
            RelationshipKind::Parent => Some((from, to)),
            RelationshipKind::Child => Some((to, from)),
            RelationshipKind::Related => None,
        };
        if let Some((parent, child)) = dependency {
            if self.reaches(child, parent) {
                return Err(BackendError::status(409, "relationship would create a cycle"));
            }
        }

        let edge = RelationshipEdge::confirmed(from, to, kind);
        self.relationships.push(edge.clone());
        self.relationships
            .push(RelationshipEdge::confirmed(to, from, kind.inverse()));
        Ok(edge)
    }

    fn remove_relationship(&mut self, from: TaskId, edge_id: Uuid) -> Result<(), BackendError> {
        let id = EdgeId::Confirmed(edge_id);
        let edge = self
            .relationships
            .iter()
            .find(|e| e.id == id && e.from_task == from)
            .cloned()
            .ok_or_else(|| BackendError::not_found("relationship not found"))?;
        let inverse = edge.kind.inverse();
        self.relationships.retain(|e| {
            e.id != id && !(e.from_task == edge.to_task && e.to_task == edge.from_task && e.kind == inverse)
        });
        Ok(())
    }

    fn apply_updates(&mut self, updates: &[TaskUpdate]) -> Result<Vec<BoardTask>, BackendError> {
        if let Some(missing) = updates.iter().find(|u| !self.has_task(u.task_id)) {
            return Err(BackendError::not_found(format!("task {} not found", missing.task_id)));
        }
        let mut updated = Vec::with_capacity(updates.len());
        for update in updates {
            if let Some(task) = self.board.task_mut(update.task_id) {
                task.apply(&update.fields);
                updated.push(task.clone());
            }
        }
        Ok(updated)
    }
}

/// Write a board document as pretty JSON.
pub fn save_document(doc: &BoardDocument, path: &Path) -> Result<(), BackendError> {
    let json = serde_json::to_string_pretty(doc)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_document(path: &Path) -> Result<BoardDocument, BackendError> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Board store backed by a JSON file. Every accepted mutation is written
/// through before it is reported as applied.
#[derive(Debug, Clone)]
pub struct LocalBoard {
    doc: BoardDocument,
    path: Option<PathBuf>,
}

impl LocalBoard {
    /// A board that lives only in memory until [`LocalBoard::save_as`].
    pub fn in_memory(board: BoardSnapshot) -> Self {
        Self {
            doc: BoardDocument::new(board),
            path: None,
        }
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let path = path.into();
        let doc = load_document(&path)?;
        info!(path = %path.display(), tasks = doc.board.task_count(), "board file opened");
        Ok(Self { doc, path: Some(path) })
    }

    pub fn save_as(&mut self, path: impl Into<PathBuf>) -> Result<(), BackendError> {
        let path = path.into();
        save_document(&self.doc, &path)?;
        info!(path = %path.display(), "board file saved");
        self.path = Some(path);
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn board_id(&self) -> Uuid {
        self.doc.board.board_id
    }

    pub fn document(&self) -> &BoardDocument {
        &self.doc
    }

    /// Run a mutation on a copy and keep it only if it succeeds and is saved.
    fn transact<T>(
        &mut self,
        change: impl FnOnce(&mut BoardDocument) -> Result<T, BackendError>,
    ) -> Result<T, BackendError> {
        let mut next = self.doc.clone();
        let value = change(&mut next)?;
        if let Some(path) = &self.path {
            save_document(&next, path)?;
        }
        self.doc = next;
        Ok(value)
    }

    /// A small demo board spread around `today`.
    pub fn sample(today: NaiveDate) -> Self {
        let mut board = BoardSnapshot::new("Sample board");
        let day = |offset: i64| Some(today + Duration::days(offset));

        let mut todo = ColumnTasks {
            column: Column::new("To do", 0),
            tasks: Vec::new(),
        };
        let mut doing = ColumnTasks {
            column: Column::new("In progress", 1),
            tasks: Vec::new(),
        };
        let mut done = ColumnTasks {
            column: Column::new("Done", 2),
            tasks: Vec::new(),
        };
        done.column.is_finished = true;

        let mut requirements = BoardTask::new("Write requirements", done.column.id, 0).with_dates(day(-12), day(-6));
        requirements.ticket = Some("KB-1".into());
        let design = BoardTask::new("Design data model", doing.column.id, 0).with_dates(day(-4), day(3));
        let api = BoardTask::new("Build API", doing.column.id, 1).with_dates(day(1), day(9));
        let ui = BoardTask::new("Build UI", todo.column.id, 0).with_dates(day(5), day(16));
        let launch = BoardTask::new("Launch", todo.column.id, 1).with_dates(None, day(20));
        let backlog = BoardTask::new("Unscheduled idea", todo.column.id, 2);

        let links = [(requirements.id, design.id), (design.id, api.id), (api.id, ui.id), (ui.id, launch.id)];
        done.tasks.push(requirements);
        doing.tasks.extend([design, api]);
        todo.tasks.extend([ui, launch, backlog]);
        board.columns = vec![todo, doing, done];

        let mut doc = BoardDocument::new(board);
        for (parent, child) in links {
            // Sample links form a chain, so none can be rejected.
            let _ = doc.add_relationship(parent, RelationshipKind::Parent, child);
        }
        Self { doc, path: None }
    }
}

impl TaskBackend for LocalBoard {
    fn fetch_tasks_by_column(&mut self, board_id: Uuid) -> Result<BoardSnapshot, BackendError> {
        if board_id != self.doc.board.board_id {
            return Err(BackendError::not_found(format!("board {board_id} not found")));
        }
        Ok(self.doc.board.clone())
    }

    fn update_task(&mut self, task_id: TaskId, fields: &TaskFields) -> Result<BoardTask, BackendError> {
        let update = TaskUpdate {
            task_id,
            fields: fields.clone(),
        };
        let mut updated = self.transact(|doc| doc.apply_updates(std::slice::from_ref(&update)))?;
        debug!(%task_id, "task updated");
        updated
            .pop()
            .ok_or_else(|| BackendError::not_found(format!("task {task_id} not found")))
    }

    fn batch_update_tasks(&mut self, updates: &[TaskUpdate]) -> Result<Vec<BoardTask>, BackendError> {
        let updated = self.transact(|doc| doc.apply_updates(updates))?;
        debug!(count = updated.len(), "batch update applied");
        Ok(updated)
    }
}

impl RelationshipBackend for LocalBoard {
    fn get_task_relationships(&mut self, task_id: TaskId) -> Result<Vec<RelationshipEdge>, BackendError> {
        if !self.doc.has_task(task_id) {
            return Err(BackendError::not_found(format!("task {task_id} not found")));
        }
        Ok(self
            .doc
            .relationships
            .iter()
            .filter(|e| e.from_task == task_id)
            .cloned()
            .collect())
    }

    fn add_task_relationship(
        &mut self,
        from: TaskId,
        kind: RelationshipKind,
        to: TaskId,
    ) -> Result<RelationshipEdge, BackendError> {
        self.transact(|doc| doc.add_relationship(from, kind, to))
    }

    fn remove_task_relationship(&mut self, from: TaskId, edge_id: Uuid) -> Result<(), BackendError> {
        self.transact(|doc| doc.remove_relationship(from, edge_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn board_with(n: usize) -> (LocalBoard, Vec<TaskId>) {
        let mut snapshot = BoardSnapshot::new("test");
        let column = Column::new("To do", 0);
        let tasks: Vec<BoardTask> = (0..n)
            .map(|i| BoardTask::new(format!("t{i}"), column.id, i as u32).with_dates(Some(day(1)), Some(day(3))))
            .collect();
        let ids = tasks.iter().map(|t| t.id).collect();
        snapshot.columns.push(ColumnTasks { column, tasks });
        (LocalBoard::in_memory(snapshot), ids)
    }

    #[test]
    fn self_reference_is_rejected_with_400() {
        let (mut store, ids) = board_with(1);
        let err = store
            .add_task_relationship(ids[0], RelationshipKind::Parent, ids[0])
            .unwrap_err();
        assert_eq!(err.status_code(), Some(400));
    }

    #[test]
    fn unknown_task_is_404() {
        let (mut store, ids) = board_with(1);
        let err = store
            .add_task_relationship(ids[0], RelationshipKind::Parent, Uuid::new_v4())
            .unwrap_err();
        assert_eq!(err.status_code(), Some(404));
    }

    #[test]
    fn duplicate_and_cycle_are_409() {
        let (mut store, ids) = board_with(3);
        store.add_task_relationship(ids[0], RelationshipKind::Parent, ids[1]).unwrap();
        store.add_task_relationship(ids[1], RelationshipKind::Parent, ids[2]).unwrap();

        let dup = store
            .add_task_relationship(ids[0], RelationshipKind::Parent, ids[1])
            .unwrap_err();
        assert_eq!(dup.status_code(), Some(409));

        let cycle = store
            .add_task_relationship(ids[2], RelationshipKind::Parent, ids[0])
            .unwrap_err();
        assert_eq!(cycle.status_code(), Some(409));

        // Expressed from the child side it is the same cycle.
        let cycle = store
            .add_task_relationship(ids[0], RelationshipKind::Child, ids[2])
            .unwrap_err();
        assert_eq!(cycle.status_code(), Some(409));
    }

    #[test]
    fn parent_edge_records_child_mirror_and_removal_drops_both() {
        let (mut store, ids) = board_with(2);
        let edge = store.add_task_relationship(ids[0], RelationshipKind::Parent, ids[1]).unwrap();

        let mirror = store.get_task_relationships(ids[1]).unwrap();
        assert_eq!(mirror.len(), 1);
        assert_eq!(mirror[0].kind, RelationshipKind::Child);
        assert_eq!(mirror[0].to_task, ids[0]);

        let id = edge.id.confirmed().unwrap();
        store.remove_task_relationship(ids[0], id).unwrap();
        assert!(store.document().relationships.is_empty());

        let err = store.remove_task_relationship(ids[0], id).unwrap_err();
        assert_eq!(err.status_code(), Some(404));
    }

    #[test]
    fn batch_with_unknown_task_applies_nothing() {
        let (mut store, ids) = board_with(2);
        let before = store.document().clone();
        let fields = TaskFields {
            start_date: Some(day(5)),
            due_date: Some(day(6)),
        };
        let updates = vec![
            TaskUpdate {
                task_id: ids[0],
                fields: fields.clone(),
            },
            TaskUpdate {
                task_id: Uuid::new_v4(),
                fields,
            },
        ];
        assert!(store.batch_update_tasks(&updates).is_err());
        assert_eq!(store.document(), &before);
    }

    #[test]
    fn updates_are_written_through_to_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");
        let (mut store, ids) = board_with(1);
        store.save_as(&path).unwrap();

        let fields = TaskFields {
            start_date: Some(day(10)),
            due_date: Some(day(12)),
        };
        let task = store.update_task(ids[0], &fields).unwrap();
        assert_eq!(task.start_date, Some(day(10)));

        let mut reopened = LocalBoard::open(&path).unwrap();
        let snapshot = reopened.fetch_tasks_by_column(store.board_id()).unwrap();
        assert_eq!(snapshot.task(ids[0]).unwrap().due_date, Some(day(12)));
    }

    #[test]
    fn fetching_another_board_is_404() {
        let (mut store, _) = board_with(1);
        let err = store.fetch_tasks_by_column(Uuid::new_v4()).unwrap_err();
        assert_eq!(err.status_code(), Some(404));
    }

    #[test]
    fn sample_board_links_form_a_chain() {
        let sample = LocalBoard::sample(day(15));
        let parents = sample
            .document()
            .relationships
            .iter()
            .filter(|e| e.kind == RelationshipKind::Parent)
            .count();
        assert_eq!(parents, 4);
        assert_eq!(sample.document().board.task_count(), 6);
    }
}
