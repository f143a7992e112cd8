//! One board's timeline: owns every engine component and is the only thing
//! the UI talks to.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use chrono::NaiveDate;
use egui::Modifiers;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::arrows::{ArrowRouter, DependencyArrow, Schedule};
use super::batch::{BatchMover, Nudge, Selection};
use super::drag::{DragController, DragKind, DragOutcome};
use super::geometry::{GeometryCache, GeometryMetrics, TaskPosition};
use super::index::DateIndex;
use super::layout::RowLayout;
use super::relationships::RelationshipStore;
use super::scroll::{ScrollPersistence, ScrollThrottle};
use super::window::{DateWindow, Placement};
use crate::backend::{DragListener, RelationshipBackend, RemoteChange, ScrollPositionStore, TaskBackend};
use crate::error::{BackendError, RelationshipError};
use crate::model::{BoardSnapshot, BoardTask, EdgeId, GanttTask, TaskDates, TaskFields, TaskId, ViewMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient message for the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

pub struct GanttBoard {
    snapshot: BoardSnapshot,
    tasks: Vec<GanttTask>,
    task_lookup: HashMap<TaskId, usize>,

    window: DateWindow,
    index: DateIndex,
    layout: RowLayout,
    geometry: GeometryCache,
    metrics: GeometryMetrics,
    view_mode: ViewMode,

    drag: DragController,
    relationships: RelationshipStore,
    arrows: ArrowRouter,
    arrows_dirty: bool,

    selection: Selection,
    batch: BatchMover,

    scroll_x: f32,
    viewport_width: f32,
    pending_jump: Option<(NaiveDate, Placement)>,
    throttle: ScrollThrottle,
    persistence: ScrollPersistence,

    today: NaiveDate,
    notices: Vec<Notice>,
}

impl GanttBoard {
    /// Build a timeline for `snapshot` without talking to any store.
    pub fn from_snapshot(snapshot: BoardSnapshot, today: NaiveDate, view_mode: ViewMode) -> Self {
        let window = DateWindow::centered(today, today);
        let index = DateIndex::build(&window);
        let metrics = GeometryMetrics {
            column_width: view_mode.column_width(),
            ..GeometryMetrics::default()
        };
        let mut board = Self {
            snapshot,
            tasks: Vec::new(),
            task_lookup: HashMap::new(),
            window,
            index,
            layout: RowLayout::default(),
            geometry: GeometryCache::new(),
            metrics,
            view_mode,
            drag: DragController::new(),
            relationships: RelationshipStore::new(),
            arrows: ArrowRouter::new(),
            arrows_dirty: true,
            selection: Selection::default(),
            batch: BatchMover::new(),
            scroll_x: 0.0,
            viewport_width: 0.0,
            pending_jump: Some((today, Placement::Center)),
            throttle: ScrollThrottle::default(),
            persistence: ScrollPersistence::default(),
            today,
            notices: Vec::new(),
        };
        board.reproject();
        board
    }

    /// Fetch the board, its relationships and the saved scroll date.
    pub fn load<B>(
        board_id: Uuid,
        backend: &mut B,
        scroll_store: &dyn ScrollPositionStore,
        today: NaiveDate,
        view_mode: ViewMode,
    ) -> Result<Self, BackendError>
    where
        B: TaskBackend + RelationshipBackend,
    {
        let snapshot = backend.fetch_tasks_by_column(board_id)?;
        let mut board = Self::from_snapshot(snapshot, today, view_mode);
        if let Some(saved) = scroll_store.load(board_id) {
            board.window.recenter(saved, today);
            board.index = DateIndex::build(&board.window);
            board.geometry.invalidate();
            board.pending_jump = Some((saved, Placement::Start));
        }
        board.reload_relationships(backend)?;
        info!(%board_id, tasks = board.tasks.len(), "board loaded");
        Ok(board)
    }

    // ── Accessors ───────────────────────────────────────────────

    pub fn snapshot(&self) -> &BoardSnapshot {
        &self.snapshot
    }

    pub fn board_id(&self) -> Uuid {
        self.snapshot.board_id
    }

    pub fn tasks(&self) -> &[GanttTask] {
        &self.tasks
    }

    pub fn task(&self, id: TaskId) -> Option<&GanttTask> {
        self.task_lookup.get(&id).and_then(|&i| self.tasks.get(i))
    }

    pub fn window(&self) -> &DateWindow {
        &self.window
    }

    pub fn index(&self) -> &DateIndex {
        &self.index
    }

    pub fn layout(&self) -> &RowLayout {
        &self.layout
    }

    pub fn metrics(&self) -> &GeometryMetrics {
        &self.metrics
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn scroll_x(&self) -> f32 {
        self.scroll_x
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn relationships(&self) -> &RelationshipStore {
        &self.relationships
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn batch(&self) -> &BatchMover {
        &self.batch
    }

    /// Total size of the timeline body in pixels.
    pub fn content_size(&self) -> egui::Vec2 {
        egui::vec2(
            self.window.total_width(self.metrics.column_width),
            self.metrics.row_top(self.layout.len()),
        )
    }

    /// Dates a task currently renders with, honouring an active drag.
    pub fn display_dates(&self, id: TaskId) -> Option<TaskDates> {
        self.drag
            .state()
            .and_then(|s| s.local_override.get(&id).copied())
            .or_else(|| self.task(id).map(|t| t.dates))
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn set_row_metrics(&mut self, row_height: f32, header_height: f32) {
        self.metrics.row_height = row_height.max(self.metrics.bar_inset * 2.0 + 4.0);
        self.metrics.header_height = header_height.max(0.0);
        self.geometry.invalidate();
        self.arrows_dirty = true;
    }

    // ── Snapshot ────────────────────────────────────────────────

    fn reproject(&mut self) {
        self.tasks = self.snapshot.gantt_tasks();
        self.task_lookup = self.tasks.iter().enumerate().map(|(i, t)| (t.id, i)).collect();
        self.layout = RowLayout::build(&self.tasks);

        let visible: HashSet<TaskId> = self.tasks.iter().map(|t| t.id).collect();
        self.selection.retain(|id| visible.contains(&id));
        self.relationships.retain_visible(&visible);
        self.geometry.invalidate();
        self.arrows_dirty = true;
    }

    /// Swap in a fresh snapshot from the store.
    pub fn set_snapshot(&mut self, snapshot: BoardSnapshot) {
        self.snapshot = snapshot;
        self.reproject();
    }

    pub fn refresh<B>(&mut self, backend: &mut B) -> Result<(), BackendError>
    where
        B: TaskBackend + RelationshipBackend,
    {
        let snapshot = backend.fetch_tasks_by_column(self.snapshot.board_id)?;
        self.set_snapshot(snapshot);
        self.reload_relationships(backend)
    }

    pub fn reload_relationships(&mut self, backend: &mut dyn RelationshipBackend) -> Result<(), BackendError> {
        let ids: Vec<TaskId> = self.tasks.iter().map(|t| t.id).collect();
        self.relationships.load(ids, backend)?;
        let visible: HashSet<TaskId> = self.tasks.iter().map(|t| t.id).collect();
        self.relationships.retain_visible(&visible);
        self.arrows_dirty = true;
        Ok(())
    }

    /// React to a live change. Returns true if the board was refetched.
    pub fn apply_remote_change<B>(&mut self, change: RemoteChange, backend: &mut B) -> Result<bool, BackendError>
    where
        B: TaskBackend + RelationshipBackend,
    {
        if !change.needs_refetch() {
            debug!(?change, "remote update applied upstream, not refetching");
            return Ok(false);
        }
        self.refresh(backend)?;
        Ok(true)
    }

    fn apply_updated(&mut self, tasks: impl IntoIterator<Item = BoardTask>) {
        let mut changed = false;
        for task in tasks {
            changed |= self.snapshot.replace_task(task);
        }
        if changed {
            self.reproject();
        }
    }

    // ── Viewport ────────────────────────────────────────────────

    /// Tell the board how wide the visible area is. Returns the offset to
    /// scroll to when a pending jump (initial or restored position) applied.
    pub fn set_viewport_width(&mut self, width: f32) -> Option<f32> {
        self.viewport_width = width.max(0.0);
        if self.viewport_width <= 0.0 {
            return None;
        }
        let (date, placement) = self.pending_jump.take()?;
        let x = self
            .window
            .scroll_offset_for(date, placement, self.viewport_width, self.metrics.column_width)?;
        self.scroll_x = x;
        Some(x)
    }

    /// Day at the viewport's left edge.
    pub fn first_visible_date(&self) -> Option<NaiveDate> {
        self.window.date_at(self.scroll_x, self.metrics.column_width)
    }

    /// Record a new scroll offset. Extends the window when close to an edge
    /// and returns the compensated offset the view must adopt.
    pub fn on_scroll(&mut self, scroll_x: f32, now: Instant) -> f32 {
        self.scroll_x = scroll_x.max(0.0);
        if self.throttle.ready(now) {
            if let Some(edge) = self.window.edge_near(self.scroll_x, self.viewport_width, self.metrics.column_width) {
                let outcome = self.window.extend(edge, self.today, self.metrics.column_width);
                self.index = DateIndex::build(&self.window);
                self.scroll_x = (self.scroll_x + outcome.scroll_delta_px).max(0.0);
                self.geometry.invalidate();
                self.arrows_dirty = true;
            }
        }
        if let Some(date) = self.first_visible_date() {
            self.persistence.note(date, now);
        }
        self.scroll_x
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) -> f32 {
        if mode == self.view_mode {
            return self.scroll_x;
        }
        let anchor = self
            .window
            .date_at(self.scroll_x + self.viewport_width / 2.0, self.metrics.column_width);
        self.view_mode = mode;
        self.metrics.column_width = mode.column_width();
        self.geometry.invalidate();
        self.arrows_dirty = true;
        if let Some(x) = anchor.and_then(|date| {
            self.window
                .scroll_offset_for(date, Placement::Center, self.viewport_width, self.metrics.column_width)
        }) {
            self.scroll_x = x;
        }
        self.scroll_x
    }

    /// Scroll to `date`, rebuilding the window around it if it is out of view.
    pub fn jump_to_date(&mut self, date: NaiveDate, placement: Placement) -> f32 {
        if !self.window.contains(date) {
            self.window.recenter(date, self.today);
            self.index = DateIndex::build(&self.window);
            self.geometry.invalidate();
            self.arrows_dirty = true;
        }
        if let Some(x) = self
            .window
            .scroll_offset_for(date, placement, self.viewport_width, self.metrics.column_width)
        {
            self.scroll_x = x;
        }
        self.scroll_x
    }

    pub fn jump_to_today(&mut self) -> f32 {
        self.jump_to_date(self.today, Placement::Center)
    }

    pub fn jump_to_task(&mut self, id: TaskId, placement: Placement) -> Option<f32> {
        let start = self.task(id)?.dates.start;
        Some(self.jump_to_date(start, placement))
    }

    // ── Geometry ────────────────────────────────────────────────

    pub fn positions(&mut self) -> &HashMap<TaskId, TaskPosition> {
        if self.geometry.is_dirty() {
            self.arrows_dirty = true;
        }
        let overrides = self.drag.overrides();
        self.geometry
            .settle(&self.tasks, &overrides, &self.index, &self.layout, &self.metrics)
    }

    pub fn task_at(&mut self, x: f32, y: f32) -> Option<TaskId> {
        self.positions();
        self.geometry.task_at(x, y)
    }

    fn schedules(&self) -> HashMap<TaskId, Schedule> {
        self.tasks
            .iter()
            .map(|t| (t.id, Schedule::of(t, self.drag.state().and_then(|s| s.local_override.get(&t.id).copied()))))
            .collect()
    }

    pub fn arrows(&mut self) -> &[DependencyArrow] {
        self.positions();
        if self.arrows_dirty {
            let schedules = self.schedules();
            let recomputed = self.arrows.refresh(
                self.relationships.dependencies(),
                self.geometry.positions(),
                &schedules,
                self.metrics.column_width,
            );
            if recomputed > 0 {
                debug!(recomputed, "dependency arrows updated");
            }
            self.arrows_dirty = false;
        }
        self.arrows.arrows()
    }

    pub fn arrow_near(&mut self, point: egui::Pos2, tolerance: f32) -> Option<DependencyArrow> {
        self.arrows();
        self.arrows.arrow_near(point, tolerance).cloned()
    }

    // ── Drag ────────────────────────────────────────────────────

    pub fn begin_drag(&mut self, id: TaskId, kind: DragKind, listener: &mut dyn DragListener) -> bool {
        let Some(dates) = self.task(id).map(|t| t.dates) else {
            return false;
        };
        self.drag.begin(id, kind, dates, listener)
    }

    pub fn drag_to(&mut self, hovered: NaiveDate) -> Option<TaskDates> {
        let dates = self.drag.hover(hovered)?;
        self.geometry.invalidate();
        self.arrows_dirty = true;
        Some(dates)
    }

    /// Drag to the day under `x` (timeline coordinates).
    pub fn drag_to_x(&mut self, x: f32) -> Option<TaskDates> {
        let hovered = self.window.date_at(x, self.metrics.column_width)?;
        self.drag_to(hovered)
    }

    pub fn finish_drag(
        &mut self,
        backend: &mut dyn TaskBackend,
        listener: &mut dyn DragListener,
    ) -> Option<DragOutcome> {
        let outcome = self.drag.finish(backend, listener)?;
        self.geometry.invalidate();
        self.arrows_dirty = true;
        if let DragOutcome::Committed { result, task_id, .. } = &outcome {
            match result {
                Ok(task) => self.apply_updated([task.clone()]),
                Err(e) => {
                    warn!(%task_id, error = %e, "task keeps its stored dates");
                    self.notices.push(Notice::error("Failed to update task dates"));
                }
            }
        }
        Some(outcome)
    }

    pub fn cancel_drag(&mut self, listener: &mut dyn DragListener) -> Option<DragOutcome> {
        let outcome = self.drag.cancel(listener)?;
        self.geometry.invalidate();
        self.arrows_dirty = true;
        Some(outcome)
    }

    /// Edit a task's dates outside of a drag, e.g. from a date picker.
    pub fn update_task_dates(
        &mut self,
        id: TaskId,
        fields: &TaskFields,
        backend: &mut dyn TaskBackend,
    ) -> Result<(), BackendError> {
        match backend.update_task(id, fields) {
            Ok(task) => {
                self.apply_updated([task]);
                Ok(())
            }
            Err(e) => {
                warn!(task_id = %id, error = %e, "task date edit failed");
                self.notices.push(Notice::error("Failed to update task dates"));
                Err(e)
            }
        }
    }

    // ── Relationships ───────────────────────────────────────────

    pub fn create_relationship(
        &mut self,
        from: TaskId,
        to: TaskId,
        now: Instant,
        backend: &mut dyn RelationshipBackend,
    ) -> Result<EdgeId, RelationshipError> {
        let result = self.relationships.create(from, to, now, backend);
        self.arrows_dirty = true;
        match &result {
            Ok(_) => self.notices.push(Notice::info("Dependency added")),
            Err(RelationshipError::Debounced) => {}
            Err(e) => self.notices.push(Notice::error(e.to_string())),
        }
        result
    }

    pub fn delete_relationship(
        &mut self,
        edge_id: EdgeId,
        backend: &mut dyn RelationshipBackend,
    ) -> Result<(), RelationshipError> {
        let from = self
            .relationships
            .get(edge_id)
            .map(|e| e.from_task)
            .ok_or(RelationshipError::EdgeNotFound(edge_id))?;
        let result = self.relationships.delete(edge_id, from, backend);
        self.arrows_dirty = true;
        match &result {
            Ok(()) => self.notices.push(Notice::info("Dependency removed")),
            Err(e) => self.notices.push(Notice::error(e.to_string())),
        }
        result
    }

    // ── Keyboard ────────────────────────────────────────────────

    pub fn key_down(&mut self, nudge: Nudge, modifiers: Modifiers, now: Instant) -> bool {
        let dates: HashMap<TaskId, TaskDates> = self.tasks.iter().map(|t| (t.id, t.dates)).collect();
        self.batch.key_down(nudge, modifiers, &self.selection, &dates, now)
    }

    pub fn key_up(&mut self) {
        self.batch.key_up();
    }

    /// Earliest instant at which [`GanttBoard::tick`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.batch.deadline(), self.persistence.due()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Run timers: flush staged batch moves and the debounced scroll save.
    pub fn tick(
        &mut self,
        now: Instant,
        backend: &mut dyn TaskBackend,
        scroll_store: &mut dyn ScrollPositionStore,
    ) {
        if let Some(outcome) = self.batch.tick(now, backend) {
            let moved = outcome.updated.len();
            self.apply_updated(outcome.updated);
            if outcome.failed.is_empty() {
                self.notices.push(Notice::info(format!("Moved {moved} task(s)")));
            } else {
                self.notices.push(Notice::error(format!(
                    "Moved {moved} task(s), {} failed",
                    outcome.failed.len()
                )));
            }
        }

        if let Some(date) = self.persistence.take_due(now) {
            if let Err(e) = scroll_store.save(self.snapshot.board_id, date) {
                warn!(error = %e, "failed to save scroll position");
            }
        }
    }
}
