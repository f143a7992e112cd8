//! Dependency edges visible on the timeline, with optimistic create/delete.
//!
//! Every mutation snapshots what it changes before touching local state, so
//! a rejected request restores exactly what was there.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::backend::RelationshipBackend;
use crate::error::{BackendError, RelationshipError};
use crate::model::{EdgeId, RelationshipEdge, RelationshipKind, TaskId};

/// Repeated create requests inside this window are dropped.
pub const CREATE_DEBOUNCE: Duration = Duration::from_millis(500);

/// Token for an optimistic create waiting on the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCreate {
    pub temp_id: EdgeId,
    pub from_task: TaskId,
    pub to_task: TaskId,
}

/// An optimistically removed edge and where it sat, for rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub edge: RelationshipEdge,
    position: usize,
}

#[derive(Debug, Default)]
pub struct RelationshipStore {
    edges: Vec<RelationshipEdge>,
    last_create: Option<Instant>,
    next_temp_id: u64,
}

impl RelationshipStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edges(&self) -> &[RelationshipEdge] {
        &self.edges
    }

    pub fn get(&self, id: EdgeId) -> Option<&RelationshipEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Edges that are drawn as dependency arrows.
    pub fn dependencies(&self) -> impl Iterator<Item = &RelationshipEdge> {
        self.edges.iter().filter(|e| e.is_dependency())
    }

    /// Edges touching `task_id`, either direction.
    pub fn for_task(&self, task_id: TaskId) -> impl Iterator<Item = &RelationshipEdge> {
        self.edges
            .iter()
            .filter(move |e| e.from_task == task_id || e.to_task == task_id)
    }

    pub fn exists(&self, from: TaskId, to: TaskId, kind: RelationshipKind) -> bool {
        self.edges
            .iter()
            .any(|e| e.from_task == from && e.to_task == to && e.kind == kind)
    }

    /// Replace local edges with the store's view, deduplicated by id.
    pub fn replace(&mut self, edges: impl IntoIterator<Item = RelationshipEdge>) {
        let mut seen = HashSet::new();
        self.edges = edges.into_iter().filter(|e| seen.insert(e.id)).collect();
    }

    /// Load every edge starting at one of `task_ids`.
    pub fn load(
        &mut self,
        task_ids: impl IntoIterator<Item = TaskId>,
        backend: &mut dyn RelationshipBackend,
    ) -> Result<(), BackendError> {
        let mut edges = Vec::new();
        for id in task_ids {
            edges.extend(backend.get_task_relationships(id)?);
        }
        self.replace(edges);
        debug!(count = self.edges.len(), "relationships loaded");
        Ok(())
    }

    /// Drop edges whose endpoints are no longer on the board.
    pub fn retain_visible(&mut self, task_ids: &HashSet<TaskId>) {
        self.edges
            .retain(|e| task_ids.contains(&e.from_task) && task_ids.contains(&e.to_task));
    }

    /// Validate a create and insert the optimistic edge.
    pub fn begin_create(
        &mut self,
        from: TaskId,
        to: TaskId,
        now: Instant,
    ) -> Result<PendingCreate, RelationshipError> {
        if let Some(last) = self.last_create {
            if now.saturating_duration_since(last) < CREATE_DEBOUNCE {
                debug!(%from, %to, "relationship create debounced");
                return Err(RelationshipError::Debounced);
            }
        }
        if self.exists(from, to, RelationshipKind::Parent) {
            return Err(RelationshipError::Duplicate);
        }
        self.last_create = Some(now);

        self.next_temp_id += 1;
        let temp_id = EdgeId::Pending(self.next_temp_id);
        self.edges.push(RelationshipEdge {
            id: temp_id,
            from_task: from,
            to_task: to,
            kind: RelationshipKind::Parent,
        });
        Ok(PendingCreate {
            temp_id,
            from_task: from,
            to_task: to,
        })
    }

    /// Reconcile an optimistic create with the store's answer.
    pub fn finish_create(
        &mut self,
        pending: PendingCreate,
        result: Result<RelationshipEdge, BackendError>,
    ) -> Result<EdgeId, RelationshipError> {
        match result {
            Ok(confirmed) => {
                // Swap the id in place so the arrow is not torn down and redrawn.
                match self.edges.iter_mut().find(|e| e.id == pending.temp_id) {
                    Some(edge) => edge.id = confirmed.id,
                    None => self.edges.push(confirmed.clone()),
                }
                info!(from = %pending.from_task, to = %pending.to_task, "relationship created");
                Ok(confirmed.id)
            }
            Err(err) => {
                self.edges.retain(|e| e.id != pending.temp_id);
                warn!(from = %pending.from_task, to = %pending.to_task, error = %err, "relationship create rolled back");
                Err(RelationshipError::from_create_failure(&err))
            }
        }
    }

    /// Create a finish-to-start dependency `from → to`.
    pub fn create(
        &mut self,
        from: TaskId,
        to: TaskId,
        now: Instant,
        backend: &mut dyn RelationshipBackend,
    ) -> Result<EdgeId, RelationshipError> {
        let pending = self.begin_create(from, to, now)?;
        let result = backend.add_task_relationship(from, RelationshipKind::Parent, to);
        self.finish_create(pending, result)
    }

    /// Remove an edge locally, keeping it for rollback.
    pub fn begin_delete(&mut self, edge_id: EdgeId) -> Result<PendingDelete, RelationshipError> {
        let position = self
            .edges
            .iter()
            .position(|e| e.id == edge_id)
            .ok_or(RelationshipError::EdgeNotFound(edge_id))?;
        let edge = self.edges.remove(position);
        Ok(PendingDelete { edge, position })
    }

    pub fn finish_delete(
        &mut self,
        pending: PendingDelete,
        result: Result<(), BackendError>,
    ) -> Result<(), RelationshipError> {
        match result {
            Ok(()) => {
                info!(edge = ?pending.edge.id, "relationship deleted");
                Ok(())
            }
            Err(err) => {
                warn!(edge = ?pending.edge.id, error = %err, "relationship delete rolled back");
                let at = pending.position.min(self.edges.len());
                self.edges.insert(at, pending.edge);
                Err(RelationshipError::from_delete_failure(&err))
            }
        }
    }

    pub fn delete(
        &mut self,
        edge_id: EdgeId,
        from: TaskId,
        backend: &mut dyn RelationshipBackend,
    ) -> Result<(), RelationshipError> {
        let pending = self.begin_delete(edge_id)?;
        let result = match edge_id.confirmed() {
            Some(id) => backend.remove_task_relationship(from, id),
            // Never confirmed, so the store has nothing to remove.
            None => Err(BackendError::status(409, "relationship is still being created")),
        };
        self.finish_delete(pending, result)
    }
}
