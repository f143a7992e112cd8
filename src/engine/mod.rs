pub mod arrows;
pub mod batch;
pub mod board;
pub mod drag;
pub mod geometry;
pub mod index;
pub mod layout;
pub mod relationships;
pub mod scroll;
pub mod window;

pub use arrows::{ArrowRouter, DependencyArrow, Schedule};
pub use batch::{BatchMover, BatchOutcome, Nudge, Selection};
pub use board::{GanttBoard, Notice, NoticeLevel};
pub use drag::{DragController, DragKind, DragOutcome};
pub use geometry::{GeometryCache, GeometryMetrics, TaskPosition};
pub use index::DateIndex;
pub use layout::{LayoutRow, RowLayout};
pub use relationships::RelationshipStore;
pub use window::{DateWindow, Edge, Placement};
