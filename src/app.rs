use std::path::Path;
use std::time::Instant;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::backend::DragListener;
use crate::config::{self, Settings};
use crate::engine::{DragOutcome, GanttBoard, NoticeLevel, Nudge, Placement};
use crate::io::{LocalBoard, ScrollFile};
use crate::model::{TaskId, ViewMode};
use crate::ui;
use crate::ui::gantt_chart::{ChartDrag, ChartState};
use crate::ui::task_panel::{PanelAction, PanelState};

/// Remembers which task is being dragged so competing actions can wait.
#[derive(Debug, Default)]
struct DragTracker {
    active: Option<TaskId>,
}

impl DragListener for DragTracker {
    fn drag_started(&mut self, task_id: TaskId) {
        debug!(%task_id, "pausing board reloads during drag");
        self.active = Some(task_id);
    }

    fn drag_ended(&mut self, _task_id: TaskId) {
        self.active = None;
    }
}

/// Main application state.
pub struct GanttApp {
    pub store: LocalBoard,
    pub board: GanttBoard,
    pub chart: ChartState,
    pub focused_task: Option<TaskId>,

    scroll_store: ScrollFile,
    settings: Settings,
    panel: PanelState,
    drag_tracker: DragTracker,

    status_message: String,
    status_is_error: bool,
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

impl GanttApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        // Register Phosphor icon font as a fallback so icons render inline with text
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);
        ui::theme::apply_theme(&cc.egui_ctx);

        let settings = Settings::load();
        let mut status_message = "Ready".to_string();
        let mut store = match settings.last_board_path.as_deref().map(|path| LocalBoard::open(path)) {
            Some(Ok(store)) => store,
            Some(Err(e)) => {
                warn!(error = %e, "could not reopen last board, showing the sample");
                status_message = format!("Could not reopen last board: {e}");
                LocalBoard::sample(today())
            }
            None => LocalBoard::sample(today()),
        };
        let scroll_store = ScrollFile::open(config::scroll_positions_path());
        let board = build_board(&mut store, &scroll_store, &settings);

        Self {
            store,
            board,
            chart: ChartState::default(),
            focused_task: None,
            scroll_store,
            settings,
            panel: PanelState::default(),
            drag_tracker: DragTracker::default(),
            status_message,
            status_is_error: false,
        }
    }

    fn set_status(&mut self, message: impl Into<String>, is_error: bool) {
        self.status_message = message.into();
        self.status_is_error = is_error;
    }

    fn save_settings(&mut self) {
        if let Err(e) = self.settings.save() {
            warn!(error = %e, "failed to save settings");
        }
    }

    // --- Board file operations ---

    pub fn store_path(&self) -> Option<&Path> {
        self.store.path()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_tracker.active.is_some()
    }

    fn replace_store(&mut self, store: LocalBoard) {
        self.store = store;
        self.board = build_board(&mut self.store, &self.scroll_store, &self.settings);
        self.focused_task = None;
        self.chart = ChartState::default();
    }

    pub fn open_board(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Board", &["board.json", "json"])
            .pick_file()
        else {
            return;
        };
        match LocalBoard::open(&path) {
            Ok(store) => {
                self.replace_store(store);
                self.settings.last_board_path = Some(path);
                self.save_settings();
                self.set_status("Board loaded", false);
            }
            Err(e) => self.set_status(format!("Error loading: {e}"), true),
        }
    }

    pub fn save_board_as(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Board", &["board.json", "json"])
            .set_file_name(format!("{}.board.json", self.board.snapshot().name))
            .save_file()
        else {
            return;
        };
        match self.store.save_as(&path) {
            Ok(()) => {
                self.settings.last_board_path = Some(path);
                self.save_settings();
                self.set_status("Board saved", false);
            }
            Err(e) => self.set_status(format!("Error saving: {e}"), true),
        }
    }

    /// Pick up edits made to the board file by someone else.
    pub fn reload_board(&mut self) {
        if self.is_dragging() {
            return;
        }
        let Some(path) = self.store.path().map(Path::to_path_buf) else {
            return;
        };
        let store = match LocalBoard::open(&path) {
            Ok(store) => store,
            Err(e) => {
                self.set_status(format!("Error reloading: {e}"), true);
                return;
            }
        };
        if store.board_id() != self.board.board_id() {
            self.replace_store(store);
            self.set_status("Board reloaded", false);
            return;
        }
        self.store = store;
        match self.board.refresh(&mut self.store) {
            Ok(()) => self.set_status("Board reloaded", false),
            Err(e) => self.set_status(format!("Error reloading: {e}"), true),
        }
    }

    pub fn load_sample(&mut self) {
        self.replace_store(LocalBoard::sample(today()));
        self.settings.last_board_path = None;
        self.save_settings();
        self.set_status("Sample board loaded", false);
    }

    // --- Timeline operations ---

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        let x = self.board.set_view_mode(mode);
        self.chart.force_scroll(x);
        self.settings.view_mode = mode;
        self.save_settings();
    }

    pub fn jump_to_today(&mut self) {
        let x = self.board.jump_to_today();
        self.chart.force_scroll(x);
    }

    fn handle_chart_drag(&mut self, drag: ChartDrag) {
        match drag {
            ChartDrag::Begin { task_id, kind } => {
                self.board.begin_drag(task_id, kind, &mut self.drag_tracker);
            }
            ChartDrag::Hover { x } => {
                self.board.drag_to_x(x);
            }
            ChartDrag::Finish => {
                let outcome = self.board.finish_drag(&mut self.store, &mut self.drag_tracker);
                if let Some(DragOutcome::Committed { task_id, dates, result: Ok(_) }) = outcome {
                    let name = self.board.task(task_id).map(|t| t.label()).unwrap_or_default();
                    self.set_status(
                        format!(
                            "Updated '{}' ({} → {})",
                            name,
                            dates.start.format("%Y-%m-%d"),
                            dates.end.format("%Y-%m-%d")
                        ),
                        false,
                    );
                }
            }
        }
    }

    fn handle_panel_action(&mut self, action: PanelAction) {
        match action {
            PanelAction::None => {}
            PanelAction::UpdateDates(task_id, fields) => {
                if self.board.update_task_dates(task_id, &fields, &mut self.store).is_ok() {
                    self.set_status("Task dates updated", false);
                }
            }
            PanelAction::RemoveEdge(edge_id) => {
                let _ = self.board.delete_relationship(edge_id, &mut self.store);
            }
            PanelAction::Link(from, to) => {
                let _ = self.board.create_relationship(from, to, Instant::now(), &mut self.store);
            }
            PanelAction::Jump(task_id) => {
                if let Some(x) = self.board.jump_to_task(task_id, Placement::Center) {
                    self.chart.force_scroll(x);
                }
            }
        }
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context, now: Instant) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (escape, modifiers, pressed, released) = ctx.input(|i| {
            let pressed = if i.key_pressed(egui::Key::ArrowLeft) {
                Some(Nudge::Earlier)
            } else if i.key_pressed(egui::Key::ArrowRight) {
                Some(Nudge::Later)
            } else {
                None
            };
            let released = i.key_released(egui::Key::ArrowLeft) || i.key_released(egui::Key::ArrowRight);
            (i.key_pressed(egui::Key::Escape), i.modifiers, pressed, released)
        });

        if escape {
            if self.board.cancel_drag(&mut self.drag_tracker).is_some() {
                self.set_status("Drag cancelled", false);
            } else if self.chart.link_source().is_some() {
                self.chart.set_link_mode(self.chart.link_mode);
            }
        }
        if let Some(nudge) = pressed {
            self.board.key_down(nudge, modifiers, now);
        }
        if released {
            self.board.key_up();
        }
    }

    fn drain_notices(&mut self) {
        if let Some(notice) = self.board.take_notices().pop() {
            self.set_status(notice.text, notice.level == NoticeLevel::Error);
        }
    }
}

fn build_board(store: &mut LocalBoard, scroll_store: &ScrollFile, settings: &Settings) -> GanttBoard {
    let board_id = store.board_id();
    let mut board = match GanttBoard::load(board_id, store, scroll_store, today(), settings.view_mode) {
        Ok(board) => board,
        Err(e) => {
            warn!(error = %e, "board load failed, showing stored tasks without relationships");
            GanttBoard::from_snapshot(store.document().board.clone(), today(), settings.view_mode)
        }
    };
    board.set_row_metrics(settings.row_height, settings.header_height);
    board
}

impl eframe::App for GanttApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.handle_keyboard(ctx, now);

        // Top panel: toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        // Bottom panel: status bar
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(ui::theme::STATUS_BAR_HEIGHT)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_HEADER)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    let color = if self.status_is_error {
                        ui::theme::NOTICE_ERROR
                    } else {
                        ui::theme::TEXT_SECONDARY
                    };
                    ui.label(egui::RichText::new(&self.status_message).size(11.0).color(color));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let window = self.board.window();
                        if let (Some(first), Some(last)) = (window.first_date(), window.last_date()) {
                            ui.label(
                                egui::RichText::new(format!("{first} – {last}"))
                                    .size(10.5)
                                    .color(ui::theme::TEXT_DIM),
                            );
                        }
                        ui.label(
                            egui::RichText::new(format!(
                                "Tasks: {} · Dependencies: {} · ",
                                self.board.tasks().len(),
                                self.board.relationships().dependencies().count()
                            ))
                            .size(10.5)
                            .color(ui::theme::TEXT_DIM),
                        );
                    });
                });
            });

        // Left panel: task details
        let mut panel_action = PanelAction::None;
        egui::SidePanel::left("task_panel")
            .default_width(ui::theme::SIDE_PANEL_WIDTH)
            .resizable(true)
            .show(ctx, |ui| {
                panel_action = ui::task_panel::show_task_panel(&self.board, self.focused_task, &mut self.panel, ui);
            });
        self.handle_panel_action(panel_action);

        // Central panel: timeline
        let chart_frame = egui::Frame::default()
            .fill(ui::theme::BG_DARK)
            .inner_margin(egui::Margin::ZERO);
        let interaction = egui::CentralPanel::default()
            .frame(chart_frame)
            .show(ctx, |ui| {
                ui::gantt_chart::show_gantt_chart(&mut self.board, &mut self.chart, &mut self.focused_task, ui)
            })
            .inner;

        if let Some(drag) = interaction.drag {
            self.handle_chart_drag(drag);
            ctx.request_repaint();
        }
        if let Some((from, to)) = interaction.link {
            let _ = self.board.create_relationship(from, to, now, &mut self.store);
        }
        if let Some(edge_id) = interaction.remove_edge {
            let _ = self.board.delete_relationship(edge_id, &mut self.store);
        }

        self.board.tick(now, &mut self.store, &mut self.scroll_store);
        self.drain_notices();

        if let Some(deadline) = self.board.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(Instant::now()));
        }
    }
}
