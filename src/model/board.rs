use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task::{BoardTask, GanttTask, TaskId};

/// A kanban column. Finished and archived columns never block their tasks' successors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: Uuid,
    pub title: String,
    pub position: u32,
    #[serde(default)]
    pub is_finished: bool,
    #[serde(default)]
    pub is_archived: bool,
}

impl Column {
    pub fn new(title: impl Into<String>, position: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            position,
            is_finished: false,
            is_archived: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTasks {
    pub column: Column,
    pub tasks: Vec<BoardTask>,
}

/// Tasks of one board grouped by column, as returned by the task store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub board_id: Uuid,
    pub name: String,
    pub columns: Vec<ColumnTasks>,
}

impl BoardSnapshot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            board_id: Uuid::new_v4(),
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn tasks(&self) -> impl Iterator<Item = &BoardTask> {
        self.columns.iter().flat_map(|c| c.tasks.iter())
    }

    pub fn task(&self, id: TaskId) -> Option<&BoardTask> {
        self.tasks().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut BoardTask> {
        self.columns
            .iter_mut()
            .flat_map(|c| c.tasks.iter_mut())
            .find(|t| t.id == id)
    }

    pub fn task_count(&self) -> usize {
        self.columns.iter().map(|c| c.tasks.len()).sum()
    }

    /// Replace a task with the store's updated copy. Returns false if unknown.
    pub fn replace_task(&mut self, updated: BoardTask) -> bool {
        match self.task_mut(updated.id) {
            Some(task) => {
                *task = updated;
                true
            }
            None => false,
        }
    }

    /// Timeline projection of every dated task.
    pub fn gantt_tasks(&self) -> Vec<GanttTask> {
        self.columns
            .iter()
            .flat_map(|group| {
                group
                    .tasks
                    .iter()
                    .filter_map(move |task| GanttTask::project(task, &group.column))
            })
            .collect()
    }
}
