//! Keyboard nudging of the multi-selection.
//!
//! ArrowLeft / ArrowRight shift every selected task by one day. Keystrokes
//! are staged per task and sent as one batch once the keyboard has been quiet
//! for [`BATCH_DEBOUNCE`].

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::{Duration, Instant};

use egui::Modifiers;
use tracing::{debug, info, warn};

use crate::backend::TaskBackend;
use crate::error::BackendError;
use crate::model::{BoardTask, TaskDates, TaskFields, TaskId, TaskUpdate};

pub const BATCH_DEBOUNCE: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nudge {
    Earlier,
    Later,
}

impl Nudge {
    pub fn days(self) -> i64 {
        match self {
            Nudge::Earlier => -1,
            Nudge::Later => 1,
        }
    }
}

/// Multi-select mode and the tasks picked in it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    multi: bool,
    tasks: BTreeSet<TaskId>,
}

impl Selection {
    pub fn is_multi(&self) -> bool {
        self.multi
    }

    /// Leaving multi-select mode clears the selection.
    pub fn set_multi(&mut self, on: bool) {
        self.multi = on;
        if !on {
            self.tasks.clear();
        }
    }

    pub fn toggle(&mut self, id: TaskId) {
        if !self.tasks.remove(&id) {
            self.tasks.insert(id);
        }
    }

    pub fn select_only(&mut self, id: TaskId) {
        self.tasks.clear();
        self.tasks.insert(id);
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Keep only ids still on the board.
    pub fn retain(&mut self, mut keep: impl FnMut(TaskId) -> bool) {
        self.tasks.retain(|id| keep(*id));
    }

    /// Batch moves apply only in multi-select mode with something selected.
    pub fn is_active(&self) -> bool {
        self.multi && !self.tasks.is_empty()
    }
}

/// Result of one flushed batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub updated: Vec<BoardTask>,
    pub failed: Vec<(TaskId, BackendError)>,
    /// The batch call failed and tasks were updated one by one.
    pub used_fallback: bool,
}

#[derive(Debug, Default)]
pub struct BatchMover {
    pending: BTreeMap<TaskId, TaskDates>,
    in_flight: bool,
    deadline: Option<Instant>,
}

impl BatchMover {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &BTreeMap<TaskId, TaskDates> {
        &self.pending
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Handle an arrow key press. `dates` gives each task's current dates.
    /// Returns true when the key was consumed.
    pub fn key_down(
        &mut self,
        nudge: Nudge,
        modifiers: Modifiers,
        selection: &Selection,
        dates: &HashMap<TaskId, TaskDates>,
        now: Instant,
    ) -> bool {
        if !selection.is_active() || !modifiers.is_none() {
            return false;
        }
        if self.in_flight {
            return true;
        }
        self.in_flight = true;

        for id in selection.ids() {
            if let Some(current) = dates.get(&id) {
                self.pending.insert(id, current.shifted(nudge.days()));
            }
        }
        self.deadline = Some(now + BATCH_DEBOUNCE);
        debug!(staged = self.pending.len(), ?nudge, "batch move staged");
        true
    }

    /// Arrow key released: the next press is accepted immediately.
    pub fn key_up(&mut self) {
        self.in_flight = false;
    }

    /// Flush staged moves once the debounce has elapsed.
    pub fn tick(&mut self, now: Instant, backend: &mut dyn TaskBackend) -> Option<BatchOutcome> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.deadline = None;
        self.in_flight = false;
        let staged = std::mem::take(&mut self.pending);
        if staged.is_empty() {
            return None;
        }
        Some(commit(staged, backend))
    }
}

fn commit(staged: BTreeMap<TaskId, TaskDates>, backend: &mut dyn TaskBackend) -> BatchOutcome {
    let updates: Vec<TaskUpdate> = staged
        .iter()
        .map(|(id, dates)| TaskUpdate {
            task_id: *id,
            fields: TaskFields::from(*dates),
        })
        .collect();

    match backend.batch_update_tasks(&updates) {
        Ok(updated) => {
            info!(count = updated.len(), "batch move committed");
            BatchOutcome {
                updated,
                failed: Vec::new(),
                used_fallback: false,
            }
        }
        Err(err) => {
            warn!(error = %err, count = updates.len(), "batch move failed, updating tasks one by one");
            let mut outcome = BatchOutcome {
                used_fallback: true,
                ..Default::default()
            };
            for update in &updates {
                match backend.update_task(update.task_id, &update.fields) {
                    Ok(task) => outcome.updated.push(task),
                    Err(e) => {
                        warn!(task_id = %update.task_id, error = %e, "task move failed");
                        outcome.failed.push((update.task_id, e));
                    }
                }
            }
            outcome
        }
    }
}
