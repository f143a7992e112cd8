use std::collections::HashMap;

use uuid::Uuid;

use crate::model::{GanttTask, TaskId};

/// One row of the timeline body.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutRow {
    /// Column header grouping the task rows below it.
    Group {
        column_id: Uuid,
        title: String,
        task_count: usize,
    },
    Task(TaskId),
}

/// Deterministic row assignment for the timeline.
///
/// Tasks are grouped by column (ordered by column position) and ordered by
/// their position inside the column; each group starts with a header row.
#[derive(Debug, Clone, Default)]
pub struct RowLayout {
    rows: Vec<LayoutRow>,
    task_rows: HashMap<TaskId, usize>,
}

impl RowLayout {
    pub fn build(tasks: &[GanttTask]) -> Self {
        let mut ordered: Vec<&GanttTask> = tasks.iter().collect();
        ordered.sort_by(|a, b| {
            (a.column_position, a.column_id, a.task_position, a.id)
                .cmp(&(b.column_position, b.column_id, b.task_position, b.id))
        });

        let mut rows = Vec::with_capacity(ordered.len() + 8);
        let mut task_rows = HashMap::with_capacity(ordered.len());
        let mut current_column: Option<Uuid> = None;
        let mut header_at = 0;

        for task in ordered {
            if current_column != Some(task.column_id) {
                current_column = Some(task.column_id);
                header_at = rows.len();
                rows.push(LayoutRow::Group {
                    column_id: task.column_id,
                    title: task.status.clone(),
                    task_count: 0,
                });
            }
            if let Some(LayoutRow::Group { task_count, .. }) = rows.get_mut(header_at) {
                *task_count += 1;
            }
            task_rows.insert(task.id, rows.len());
            rows.push(LayoutRow::Task(task.id));
        }

        Self { rows, task_rows }
    }

    pub fn rows(&self) -> &[LayoutRow] {
        &self.rows
    }

    pub fn row_of(&self, task_id: TaskId) -> Option<usize> {
        self.task_rows.get(&task_id).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Task ids in display order.
    pub fn task_order(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.rows.iter().filter_map(|row| match row {
            LayoutRow::Task(id) => Some(*id),
            LayoutRow::Group { .. } => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoardTask, Column};
    use chrono::NaiveDate;

    fn gantt(title: &str, column: &Column, position: u32) -> GanttTask {
        let day = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let task = BoardTask::new(title, column.id, position).with_dates(Some(day), Some(day));
        GanttTask::project(&task, column).unwrap()
    }

    #[test]
    fn rows_follow_column_then_task_position() {
        let todo = Column::new("To do", 0);
        let done = Column::new("Done", 2);
        let tasks = vec![
            gantt("shipped", &done, 0),
            gantt("second", &todo, 5),
            gantt("first", &todo, 1),
        ];
        let layout = RowLayout::build(&tasks);

        assert_eq!(layout.len(), 5);
        assert!(matches!(
            &layout.rows()[0],
            LayoutRow::Group { title, task_count: 2, .. } if title == "To do"
        ));
        assert_eq!(layout.row_of(tasks[2].id), Some(1));
        assert_eq!(layout.row_of(tasks[1].id), Some(2));
        assert!(matches!(&layout.rows()[3], LayoutRow::Group { task_count: 1, .. }));
        assert_eq!(layout.row_of(tasks[0].id), Some(4));
    }

    #[test]
    fn layout_is_stable_for_reordered_input() {
        let col = Column::new("Doing", 1);
        let mut tasks = vec![gantt("a", &col, 0), gantt("b", &col, 1), gantt("c", &col, 2)];
        let first: Vec<_> = RowLayout::build(&tasks).task_order().collect();
        tasks.reverse();
        let second: Vec<_> = RowLayout::build(&tasks).task_order().collect();
        assert_eq!(first, second);
    }
}
