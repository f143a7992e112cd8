use std::time::Instant;

use chrono::Datelike;
use egui::{Color32, Pos2, Rect, Rounding, Sense, Shape, Stroke, Ui, Vec2};

use crate::engine::{DependencyArrow, DragKind, GanttBoard, LayoutRow, TaskPosition};
use crate::model::{EdgeId, GanttTask, TaskId, ViewMode};
use crate::ui::theme;

/// Chart state that outlives a single frame.
#[derive(Debug, Default)]
pub struct ChartState {
    /// Clicking two bars links them instead of selecting.
    pub link_mode: bool,
    link_source: Option<TaskId>,
    drag_kind: Option<DragKind>,
    /// Pointer distance from the bar's left edge when a move began.
    grab_offset: f32,
    forced_scroll: Option<f32>,
}

impl ChartState {
    /// Scroll the timeline to `x` on the next frame.
    pub fn force_scroll(&mut self, x: f32) {
        self.forced_scroll = Some(x);
    }

    pub fn link_source(&self) -> Option<TaskId> {
        self.link_source
    }

    pub fn set_link_mode(&mut self, on: bool) {
        self.link_mode = on;
        self.link_source = None;
    }
}

/// Pointer gesture on a bar, handed to the app to run against the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChartDrag {
    Begin { task_id: TaskId, kind: DragKind },
    /// Pointer over timeline x (content coordinates).
    Hover { x: f32 },
    Finish,
}

/// What the user asked for this frame.
#[derive(Debug, Default)]
pub struct ChartInteraction {
    pub drag: Option<ChartDrag>,
    pub link: Option<(TaskId, TaskId)>,
    pub remove_edge: Option<EdgeId>,
}

/// Render the timeline body.
pub fn show_gantt_chart(
    board: &mut GanttBoard,
    state: &mut ChartState,
    focused: &mut Option<TaskId>,
    ui: &mut Ui,
) -> ChartInteraction {
    let mut interaction = ChartInteraction::default();
    let available = ui.available_size();
    let content = board.content_size();
    let canvas = Vec2::new(content.x.max(available.x), (content.y + 40.0).max(available.y));

    let mut scroll = egui::ScrollArea::both()
        .id_salt("timeline")
        .auto_shrink([false, false]);
    if let Some(x) = state.forced_scroll.take() {
        scroll = scroll.horizontal_scroll_offset(x);
    }

    let output = scroll.show(ui, |ui| {
        let (response, painter) = ui.allocate_painter(canvas, Sense::click());
        let origin = response.rect.min;
        let visible = ui.clip_rect();
        let mut consumed_click = false;

        painter.rect_filled(response.rect, 0.0, theme::BG_DARK);
        draw_day_columns(&painter, origin, board, visible, canvas.y);
        draw_group_rows(&painter, origin, board, canvas.x);

        let positions: Vec<(TaskId, TaskPosition)> = board.positions().iter().map(|(id, p)| (*id, *p)).collect();
        let arrows = board.arrows().to_vec();
        let blocked: Vec<TaskId> = arrows.iter().filter(|a| a.is_blocked).map(|a| a.to_task).collect();
        for arrow in &arrows {
            draw_arrow(&painter, origin, arrow);
        }

        let pointer = ui.input(|i| i.pointer.interact_pos());
        let command = ui.input(|i| i.modifiers.command);
        for (task_id, pos) in positions {
            let Some(task) = board.task(task_id).cloned() else {
                continue;
            };
            let bar = pos.rect().translate(origin.to_vec2());
            if !bar.intersects(visible) && board.drag().dragged_task() != Some(task_id) {
                continue;
            }
            let highlighted = *focused == Some(task_id) || board.selection().contains(task_id);
            let is_link_source = state.link_source == Some(task_id);
            draw_task_bar(&painter, bar, &task, highlighted, is_link_source);

            let bar_response = ui.interact(
                bar,
                ui.make_persistent_id(("task-bar", task_id)),
                Sense::click_and_drag(),
            );

            if bar_response.clicked() {
                consumed_click = true;
                if state.link_mode {
                    match state.link_source.take() {
                        Some(source) if source != task_id => interaction.link = Some((source, task_id)),
                        Some(_) => {}
                        None => state.link_source = Some(task_id),
                    }
                } else if command || board.selection().is_multi() {
                    let selection = board.selection_mut();
                    if !selection.is_multi() {
                        selection.set_multi(true);
                    }
                    selection.toggle(task_id);
                } else {
                    *focused = Some(task_id);
                }
            }

            if bar_response.drag_started() && !state.link_mode {
                if let Some(p) = bar_response.interact_pointer_pos() {
                    let local_x = p.x - origin.x;
                    let kind = DragKind::from_grab(local_x, pos.x, pos.right(), theme::HANDLE_WIDTH);
                    state.drag_kind = Some(kind);
                    state.grab_offset = local_x - pos.x;
                    interaction.drag = Some(ChartDrag::Begin { task_id, kind });
                    *focused = Some(task_id);
                }
            }

            if bar_response.hovered() && !board.drag().is_dragging() {
                if let Some(p) = pointer {
                    let kind = DragKind::from_grab(p.x - origin.x, pos.x, pos.right(), theme::HANDLE_WIDTH);
                    if kind != DragKind::Move {
                        ui.ctx().set_cursor_icon(egui::CursorIcon::ResizeHorizontal);
                        draw_handles(&painter, bar);
                    }
                }
                let is_blocked = blocked.contains(&task_id);
                egui::show_tooltip_at_pointer(
                    ui.ctx(),
                    ui.layer_id(),
                    egui::Id::new(("task-tip", task_id)),
                    |ui| {
                        ui.strong(task.label());
                        ui.label(format!(
                            "{} → {}",
                            task.dates.start.format("%d/%m/%Y"),
                            task.dates.end.format("%d/%m/%Y"),
                        ));
                        ui.label(format!("{} · {} day(s)", task.status, task.dates.duration_days()));
                        if is_blocked {
                            ui.colored_label(theme::NOTICE_ERROR, "Blocked by an unfinished dependency");
                        }
                    },
                );
            }
        }

        // Follow the pointer and the release globally: the dragged bar can
        // lose its response when the window shifts under it.
        if let (Some(kind), None) = (state.drag_kind, interaction.drag) {
            if !ui.input(|i| i.pointer.any_down()) {
                state.drag_kind = None;
                interaction.drag = Some(ChartDrag::Finish);
            } else if let Some(p) = pointer {
                ui.ctx().set_cursor_icon(match kind {
                    DragKind::Move => egui::CursorIcon::Grabbing,
                    _ => egui::CursorIcon::ResizeHorizontal,
                });
                let column_width = board.metrics().column_width;
                let x = match kind {
                    // Snap the bar's left edge to the nearest day.
                    DragKind::Move => p.x - origin.x - state.grab_offset + column_width / 2.0,
                    _ => p.x - origin.x,
                };
                interaction.drag = Some(ChartDrag::Hover { x });
            }
        }

        draw_header(&painter, origin, board, visible);

        if response.secondary_clicked() {
            if let Some(p) = response.interact_pointer_pos() {
                let local = p - origin.to_vec2();
                if let Some(arrow) = board.arrow_near(local, theme::ARROW_HIT_TOLERANCE) {
                    interaction.remove_edge = Some(arrow.edge_id);
                    consumed_click = true;
                }
            }
        }

        if response.clicked() && !consumed_click {
            *focused = None;
            state.link_source = None;
            if !board.selection().is_multi() {
                board.selection_mut().clear();
            }
        }
    });

    let offset = output.state.offset.x;
    if let Some(x) = board.set_viewport_width(output.inner_rect.width()) {
        state.forced_scroll = Some(x);
        ui.ctx().request_repaint();
    } else {
        let adjusted = board.on_scroll(offset, Instant::now());
        if (adjusted - offset).abs() > 0.5 {
            state.forced_scroll = Some(adjusted);
            ui.ctx().request_repaint();
        }
    }

    interaction
}

fn visible_columns(origin: Pos2, visible: Rect, column_width: f32, len: usize) -> std::ops::Range<usize> {
    let first = ((visible.min.x - origin.x) / column_width).floor().max(0.0) as usize;
    let last = ((visible.max.x - origin.x) / column_width).ceil().max(0.0) as usize + 1;
    first.min(len)..last.min(len)
}

fn draw_day_columns(painter: &egui::Painter, origin: Pos2, board: &GanttBoard, visible: Rect, height: f32) {
    let cw = board.metrics().column_width;
    let top = origin.y + board.metrics().header_height;
    let cells = board.window().cells();
    for i in visible_columns(origin, visible, cw, cells.len()) {
        let cell = &cells[i];
        let x = origin.x + i as f32 * cw;
        let column = Rect::from_min_size(Pos2::new(x, top), Vec2::new(cw, height));
        if cell.is_today {
            painter.rect_filled(column, 0.0, theme::BG_TODAY);
        } else if cell.is_weekend {
            painter.rect_filled(column, 0.0, theme::BG_WEEKEND);
        }
        let grid = match board.view_mode() {
            ViewMode::Days => true,
            ViewMode::Weeks => cell.date.weekday().num_days_from_monday() == 0,
            ViewMode::Months => cell.date.day() == 1,
        };
        if grid {
            painter.line_segment(
                [Pos2::new(x, top), Pos2::new(x, origin.y + height)],
                Stroke::new(0.5, theme::GRID_LINE),
            );
        }
        if cell.is_today {
            let center = x + cw / 2.0;
            painter.line_segment(
                [Pos2::new(center, top), Pos2::new(center, origin.y + height)],
                Stroke::new(1.5, theme::TODAY_LINE),
            );
        }
    }
}

fn draw_header(painter: &egui::Painter, origin: Pos2, board: &GanttBoard, visible: Rect) {
    let metrics = board.metrics();
    let cw = metrics.column_width;
    let header = Rect::from_min_size(
        Pos2::new(visible.min.x, origin.y),
        Vec2::new(visible.width(), metrics.header_height),
    );
    painter.rect_filled(header, 0.0, theme::BG_HEADER);
    painter.line_segment(
        [header.left_bottom(), header.right_bottom()],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );

    let cells = board.window().cells();
    let range = visible_columns(origin, visible, cw, cells.len());
    let first_visible = range.start;
    for i in range {
        let cell = &cells[i];
        let x = origin.x + i as f32 * cw;

        if cell.date.day() == 1 || i == first_visible {
            painter.text(
                Pos2::new(x + 3.0, origin.y + 12.0),
                egui::Align2::LEFT_CENTER,
                cell.date.format("%b %Y").to_string(),
                theme::font_header(),
                theme::TEXT_PRIMARY,
            );
        }

        let label = match board.view_mode() {
            ViewMode::Days => Some(cell.date.format("%d").to_string()),
            ViewMode::Weeks if cell.date.weekday().num_days_from_monday() == 0 => {
                Some(cell.date.format("W%V").to_string())
            }
            _ => None,
        };
        if let Some(label) = label {
            let color = if cell.is_today {
                theme::TODAY_LINE
            } else if cell.is_weekend {
                theme::TEXT_DIM
            } else {
                theme::TEXT_SECONDARY
            };
            painter.text(
                Pos2::new(x + 3.0, origin.y + 30.0),
                egui::Align2::LEFT_CENTER,
                label,
                theme::font_sub(),
                color,
            );
        }
    }
}

fn draw_group_rows(painter: &egui::Painter, origin: Pos2, board: &GanttBoard, width: f32) {
    let metrics = board.metrics();
    for (row, entry) in board.layout().rows().iter().enumerate() {
        let LayoutRow::Group { title, task_count, .. } = entry else {
            continue;
        };
        let y = origin.y + metrics.row_top(row);
        let rect = Rect::from_min_size(Pos2::new(origin.x, y), Vec2::new(width, metrics.row_height));
        painter.rect_filled(rect, 0.0, theme::BG_GROUP_ROW);
        painter.text(
            Pos2::new(painter.clip_rect().left() + 8.0, rect.center().y),
            egui::Align2::LEFT_CENTER,
            format!("{title} ({task_count})"),
            theme::font_header(),
            theme::TEXT_SECONDARY,
        );
    }
}

fn draw_task_bar(painter: &egui::Painter, bar: Rect, task: &GanttTask, highlighted: bool, link_source: bool) {
    let rounding = Rounding::same(theme::BAR_ROUNDING);
    let fill = if task.column_closed {
        theme::BAR_CLOSED
    } else {
        task.priority.as_ref().map(|p| p.color).unwrap_or(theme::BAR_DEFAULT)
    };

    painter.rect_filled(bar.translate(Vec2::new(1.0, 2.0)), rounding, Color32::from_black_alpha(35));
    painter.rect_filled(bar, rounding, fill);

    if link_source {
        painter.rect_stroke(bar.expand(2.0), Rounding::same(theme::BAR_ROUNDING + 2.0), Stroke::new(2.0, theme::LINK_SOURCE));
    } else if highlighted {
        painter.rect_stroke(bar.expand(1.5), Rounding::same(theme::BAR_ROUNDING + 1.5), Stroke::new(2.0, theme::BORDER_ACCENT));
    }

    if bar.width() > 30.0 {
        let galley = painter.layout_no_wrap(task.label(), theme::font_bar(), theme::TEXT_ON_BAR);
        let text_y = bar.top() + (bar.height() - galley.size().y) / 2.0;
        painter
            .with_clip_rect(bar.intersect(painter.clip_rect()))
            .galley(Pos2::new(bar.left() + 6.0, text_y), galley, Color32::TRANSPARENT);
    }
}

fn draw_handles(painter: &egui::Painter, bar: Rect) {
    let handle_h = bar.height() * 0.55;
    let handle_y = bar.center().y - handle_h / 2.0;
    for x in [bar.left() - 1.5, bar.right() - 2.5] {
        painter.rect_filled(
            Rect::from_min_size(Pos2::new(x, handle_y), Vec2::new(4.0, handle_h)),
            Rounding::same(2.0),
            theme::HANDLE_COLOR,
        );
    }
}

fn draw_arrow(painter: &egui::Painter, origin: Pos2, arrow: &DependencyArrow) {
    let offset = origin.to_vec2();
    let points: Vec<Pos2> = arrow.path.iter().map(|p| *p + offset).collect();
    let Some(&tip) = points.last() else {
        return;
    };
    let stroke = Stroke::new(arrow.stroke_width, arrow.color);
    painter.add(Shape::line(points, stroke));

    let head = 3.0 + arrow.stroke_width * 2.0;
    painter.add(Shape::convex_polygon(
        vec![tip, tip + Vec2::new(-head, -head * 0.6), tip + Vec2::new(-head, head * 0.6)],
        arrow.color,
        Stroke::NONE,
    ));
}
