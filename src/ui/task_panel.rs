use egui::{Color32, RichText, Ui};
use egui_phosphor::regular as icons;

use crate::engine::GanttBoard;
use crate::model::{EdgeId, RelationshipKind, TaskFields, TaskId};
use crate::ui::theme;

/// Actions the side panel can request.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelAction {
    None,
    UpdateDates(TaskId, TaskFields),
    RemoveEdge(EdgeId),
    Link(TaskId, TaskId),
    Jump(TaskId),
}

/// Persistent state for the "add successor" picker.
#[derive(Debug, Default)]
pub struct PanelState {
    successor: Option<TaskId>,
}

fn section_label(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).size(10.0).color(theme::TEXT_DIM).strong());
}

/// Render details of the focused task, or a hint when nothing is focused.
pub fn show_task_panel(
    board: &GanttBoard,
    focused: Option<TaskId>,
    state: &mut PanelState,
    ui: &mut Ui,
) -> PanelAction {
    let mut action = PanelAction::None;

    let selection = board.selection();
    if selection.is_multi() {
        ui.add_space(6.0);
        ui.label(
            RichText::new(format!("{} Multi-select: {} task(s)", icons::CHECK_SQUARE, selection.len()))
                .strong()
                .color(theme::ACCENT),
        );
        ui.label(
            RichText::new("← / → shift every selected task by one day")
                .size(10.5)
                .color(theme::TEXT_SECONDARY),
        );
        if board.batch().is_in_flight() || !board.batch().pending().is_empty() {
            ui.label(RichText::new("Saving…").size(10.5).color(theme::TEXT_DIM));
        }
        ui.separator();
    }

    let Some(task) = focused.and_then(|id| board.task(id)) else {
        ui.add_space(6.0);
        ui.label(
            RichText::new("Click a bar to see its details.")
                .color(theme::TEXT_DIM)
                .size(11.0),
        );
        return action;
    };
    let task_id = task.id;

    ui.add_space(6.0);
    ui.horizontal(|ui| {
        ui.label(RichText::new(task.label()).strong().size(13.0).color(theme::TEXT_PRIMARY));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let jump = ui.add(egui::Button::new(icons::CROSSHAIR).frame(false));
            if jump.on_hover_text("Scroll to task").clicked() {
                action = PanelAction::Jump(task_id);
            }
        });
    });
    ui.label(RichText::new(&task.status).size(11.0).color(theme::TEXT_SECONDARY));
    if let Some(priority) = &task.priority {
        ui.label(RichText::new(&priority.label).size(11.0).color(priority.color));
    }
    ui.add_space(4.0);

    // ── Dates ──────────────────────────────────────────────────────
    let mut start = task.dates.start;
    let mut end = task.dates.end;
    ui.horizontal(|ui| {
        ui.vertical(|ui| {
            section_label(ui, "Start");
            let resp = ui.add(egui_extras::DatePickerButton::new(&mut start).id_salt("panel_start"));
            if resp.changed() {
                end = end.max(start);
                action = PanelAction::UpdateDates(
                    task_id,
                    TaskFields {
                        start_date: Some(start),
                        due_date: Some(end),
                    },
                );
            }
        });
        ui.add_space(8.0);
        ui.vertical(|ui| {
            section_label(ui, "Due");
            let resp = ui.add(egui_extras::DatePickerButton::new(&mut end).id_salt("panel_due"));
            if resp.changed() {
                start = start.min(end);
                action = PanelAction::UpdateDates(
                    task_id,
                    TaskFields {
                        start_date: Some(start),
                        due_date: Some(end),
                    },
                );
            }
        });
    });
    if task.declared_start.is_none() || task.declared_end.is_none() {
        ui.label(
            RichText::new("Only one date is set; the bar shows a single day.")
                .size(10.0)
                .color(theme::TEXT_DIM),
        );
    }

    ui.add_space(6.0);
    ui.separator();

    // ── Dependencies ───────────────────────────────────────────────
    section_label(ui, "Dependencies");
    let edges: Vec<_> = board
        .relationships()
        .dependencies()
        .filter(|e| e.from_task == task_id || e.to_task == task_id)
        .cloned()
        .collect();
    if edges.is_empty() {
        ui.label(RichText::new("None").size(11.0).color(theme::TEXT_DIM));
    }
    for edge in &edges {
        let outgoing = edge.from_task == task_id;
        let other = if outgoing { edge.to_task } else { edge.from_task };
        let other_name = board.task(other).map(|t| t.label()).unwrap_or_else(|| "?".into());
        let arrow = if outgoing { icons::ARROW_RIGHT } else { icons::ARROW_LEFT };
        let pending = edge.id.is_pending();

        ui.horizontal(|ui| {
            let color = if pending { theme::TEXT_DIM } else { theme::TEXT_SECONDARY };
            ui.label(RichText::new(format!("{arrow} {other_name}")).size(11.0).color(color));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let del = ui.add_enabled(
                    !pending,
                    egui::Button::new(RichText::new(icons::X).size(9.0).color(theme::TEXT_DIM)).frame(false),
                );
                if del.on_hover_text("Remove dependency").clicked() {
                    action = PanelAction::RemoveEdge(edge.id);
                }
            });
        });
    }

    ui.add_space(4.0);
    let candidates: Vec<(TaskId, String)> = board
        .tasks()
        .iter()
        .filter(|t| t.id != task_id && !board.relationships().exists(task_id, t.id, RelationshipKind::Parent))
        .map(|t| (t.id, t.label()))
        .collect();
    let selected_text = state
        .successor
        .and_then(|id| candidates.iter().find(|(c, _)| *c == id))
        .map(|(_, name)| name.clone())
        .unwrap_or_else(|| "Pick a successor…".into());

    ui.horizontal(|ui| {
        egui::ComboBox::from_id_salt("successor_combo")
            .selected_text(RichText::new(selected_text).size(11.0))
            .width(ui.available_width() - 40.0)
            .show_ui(ui, |ui| {
                for (id, name) in &candidates {
                    ui.selectable_value(&mut state.successor, Some(*id), name);
                }
            });
        let add = ui.add_enabled(
            state.successor.is_some(),
            egui::Button::new(RichText::new(icons::PLUS).color(Color32::WHITE)).fill(theme::ACCENT),
        );
        if add.on_hover_text("Add dependency").clicked() {
            if let Some(successor) = state.successor.take() {
                action = PanelAction::Link(task_id, successor);
            }
        }
    });

    action
}
