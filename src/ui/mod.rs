pub mod gantt_chart;
pub mod task_panel;
pub mod theme;
pub mod toolbar;
