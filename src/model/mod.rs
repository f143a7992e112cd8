pub mod board;
pub mod relationship;
pub mod task;
pub mod timeline;

pub use board::{BoardSnapshot, Column, ColumnTasks};
pub use relationship::{EdgeId, RelationshipEdge, RelationshipKind};
pub use task::{BoardTask, GanttTask, Priority, TaskDates, TaskFields, TaskId, TaskUpdate};
pub use timeline::{DateCell, ViewMode};
