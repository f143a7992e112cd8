use chrono::{Duration, NaiveDate};
use egui::Color32;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::board::Column;

pub type TaskId = Uuid;

/// Priority badge attached to a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Priority {
    pub label: String,
    #[serde(with = "hex_color")]
    pub color: Color32,
}

/// A task as the board store knows it. Either date may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardTask {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub ticket: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub column_id: Uuid,
    /// Position of the task inside its column.
    pub position: u32,
    #[serde(default)]
    pub priority: Option<Priority>,
}

impl BoardTask {
    pub fn new(title: impl Into<String>, column_id: Uuid, position: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            ticket: None,
            start_date: None,
            due_date: None,
            column_id,
            position,
            priority: None,
        }
    }

    pub fn with_dates(mut self, start: Option<NaiveDate>, due: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.due_date = due;
        self
    }

    /// Apply an update payload in place.
    pub fn apply(&mut self, fields: &TaskFields) {
        if let Some(start) = fields.start_date {
            self.start_date = Some(start);
        }
        if let Some(due) = fields.due_date {
            self.due_date = Some(due);
        }
    }
}

/// Inclusive calendar span of a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskDates {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TaskDates {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Inclusive length in days (`end - start + 1`).
    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn shifted(&self, days: i64) -> Self {
        Self {
            start: self.start + Duration::days(days),
            end: self.end + Duration::days(days),
        }
    }
}

/// Fields sent to the task store on update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskFields {
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

impl From<TaskDates> for TaskFields {
    fn from(dates: TaskDates) -> Self {
        Self {
            start_date: Some(dates.start),
            due_date: Some(dates.end),
        }
    }
}

/// One entry of a batch update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub task_id: TaskId,
    pub fields: TaskFields,
}

/// Read-only projection of a [`BoardTask`] for the timeline, rebuilt on every
/// snapshot change.
#[derive(Debug, Clone, PartialEq)]
pub struct GanttTask {
    pub id: TaskId,
    pub title: String,
    pub ticket: Option<String>,
    /// Resolved span: a missing start borrows the due date and vice versa.
    pub dates: TaskDates,
    pub declared_start: Option<NaiveDate>,
    pub declared_end: Option<NaiveDate>,
    pub column_id: Uuid,
    pub column_position: u32,
    pub task_position: u32,
    pub priority: Option<Priority>,
    /// Title of the owning column.
    pub status: String,
    /// Owning column is flagged finished or archived.
    pub column_closed: bool,
}

impl GanttTask {
    /// Project a board task. Returns `None` when it has neither date.
    pub fn project(task: &BoardTask, column: &Column) -> Option<Self> {
        let start = task.start_date.or(task.due_date)?;
        let end = task.due_date.or(task.start_date)?;
        // A start after the due date is stored data we do not own; draw it as one day.
        let dates = TaskDates::new(start, end.max(start));
        Some(Self {
            id: task.id,
            title: task.title.clone(),
            ticket: task.ticket.clone(),
            dates,
            declared_start: task.start_date,
            declared_end: task.due_date,
            column_id: column.id,
            column_position: column.position,
            task_position: task.position,
            priority: task.priority.clone(),
            status: column.title.clone(),
            column_closed: column.is_finished || column.is_archived,
        })
    }

    pub fn label(&self) -> String {
        match &self.ticket {
            Some(ticket) => format!("{ticket} {}", self.title),
            None => self.title.clone(),
        }
    }
}

/// Serde helper for `Color32` stored as a `#RRGGBB` / `#RRGGBBAA` string.
pub mod hex_color {
    use egui::Color32;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(color: &Color32, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let [r, g, b, a] = color.to_array();
        if a == 255 {
            serializer.serialize_str(&format!("#{:02X}{:02X}{:02X}", r, g, b))
        } else {
            serializer.serialize_str(&format!("#{:02X}{:02X}{:02X}{:02X}", r, g, b, a))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Color32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_hex_color(&s).map_err(serde::de::Error::custom)
    }

    pub fn parse_hex_color(s: &str) -> Result<Color32, String> {
        let s = s.trim().trim_start_matches('#');
        let channel = |range: std::ops::Range<usize>| {
            s.get(range)
                .ok_or_else(|| format!("Invalid hex color '{}'", s))
                .and_then(|c| u8::from_str_radix(c, 16).map_err(|e| e.to_string()))
        };
        match s.len() {
            6 => Ok(Color32::from_rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            8 => Ok(Color32::from_rgba_unmultiplied(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => Err(format!("Invalid hex color '{}': expected 6 or 8 hex digits", s)),
        }
    }
}
