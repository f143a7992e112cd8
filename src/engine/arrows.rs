//! Finish-to-start arrows between task bars.

use std::collections::HashMap;

use chrono::NaiveDate;
use egui::{Color32, Pos2};

use super::geometry::TaskPosition;
use crate::model::{EdgeId, GanttTask, RelationshipEdge, TaskDates, TaskId};

/// Horizontal run, in column widths, before an arrow turns.
pub const STEP_OUT_COLUMNS: f32 = 1.5;
/// Distance of the horizontal rail from the source bar's centre line.
pub const RAIL_OFFSET: f32 = 30.0;
/// Offset from each bar's exact centre so arrows sharing a bar stay apart.
pub const CENTER_NUDGE: f32 = 2.0;

pub const ARROW_COLOR: Color32 = Color32::from_rgb(59, 130, 246);
pub const BLOCKED_ARROW_COLOR: Color32 = Color32::from_rgb(239, 68, 68);
pub const ARROW_WIDTH: f32 = 1.5;
pub const BLOCKED_ARROW_WIDTH: f32 = 2.5;

/// Orthogonal path from the right edge of `from` to the left edge of `to`.
pub fn route_path(from: &TaskPosition, to: &TaskPosition, column_width: f32) -> Vec<Pos2> {
    let start = Pos2::new(from.right(), from.center_y() + CENTER_NUDGE);
    let end = Pos2::new(to.x, to.center_y() - CENTER_NUDGE);
    let step = STEP_OUT_COLUMNS * column_width;
    let exit_x = start.x + step;
    let entry_x = end.x - step;

    let rail_y = if from.center_y() > to.center_y() {
        from.center_y() - RAIL_OFFSET
    } else {
        from.center_y() + RAIL_OFFSET
    };

    vec![
        start,
        Pos2::new(exit_x, start.y),
        Pos2::new(exit_x, rail_y),
        Pos2::new(entry_x, rail_y),
        Pos2::new(entry_x, end.y),
        end,
    ]
}

/// The parts of a task that decide whether it blocks a successor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Schedule {
    pub column_closed: bool,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl Schedule {
    /// Declared dates of `task`, or the drag override when one is active.
    pub fn of(task: &GanttTask, dragged: Option<TaskDates>) -> Self {
        match dragged {
            Some(dates) => Self {
                column_closed: task.column_closed,
                start: Some(dates.start),
                end: Some(dates.end),
            },
            None => Self {
                column_closed: task.column_closed,
                start: task.declared_start,
                end: task.declared_end,
            },
        }
    }
}

/// A parent blocks its child while the parent is still open, the child has a
/// start date, and the parent has no end date or ends on or after that start.
pub fn is_blocked(parent: &Schedule, child: &Schedule) -> bool {
    if parent.column_closed {
        return false;
    }
    let Some(child_start) = child.start else {
        return false;
    };
    match parent.end {
        None => true,
        Some(parent_end) => child_start <= parent_end,
    }
}

/// A drawable dependency arrow.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyArrow {
    pub edge_id: EdgeId,
    pub from_task: TaskId,
    pub to_task: TaskId,
    pub from_pos: TaskPosition,
    pub to_pos: TaskPosition,
    pub path: Vec<Pos2>,
    pub is_blocked: bool,
    pub color: Color32,
    pub stroke_width: f32,
    /// Bumped every time the path is recomputed.
    pub revision: u64,
}

impl DependencyArrow {
    fn unchanged(&self, from: &TaskPosition, to: &TaskPosition, blocked: bool) -> bool {
        let same = |a: &TaskPosition, b: &TaskPosition| a.x == b.x && a.y == b.y && a.width == b.width;
        self.is_blocked == blocked && same(&self.from_pos, from) && same(&self.to_pos, to)
    }
}

/// Keeps arrows between renders and rebuilds only the ones whose endpoints moved.
///
/// Arrows are keyed by their endpoints, so a pending edge that gets its
/// confirmed id keeps its arrow.
#[derive(Debug, Default)]
pub struct ArrowRouter {
    arrows: Vec<DependencyArrow>,
    next_revision: u64,
}

impl ArrowRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arrows(&self) -> &[DependencyArrow] {
        &self.arrows
    }

    /// Refresh from the current edges and positions. Returns how many arrows
    /// were (re)computed.
    pub fn refresh<'a>(
        &mut self,
        edges: impl IntoIterator<Item = &'a RelationshipEdge>,
        positions: &HashMap<TaskId, TaskPosition>,
        schedules: &HashMap<TaskId, Schedule>,
        column_width: f32,
    ) -> usize {
        let mut previous: HashMap<(TaskId, TaskId), DependencyArrow> = self
            .arrows
            .drain(..)
            .map(|a| ((a.from_task, a.to_task), a))
            .collect();
        let mut recomputed = 0;

        for edge in edges.into_iter().filter(|e| e.is_dependency()) {
            let (Some(from_pos), Some(to_pos)) = (positions.get(&edge.from_task), positions.get(&edge.to_task))
            else {
                continue;
            };
            let blocked = match (schedules.get(&edge.from_task), schedules.get(&edge.to_task)) {
                (Some(parent), Some(child)) => is_blocked(parent, child),
                _ => false,
            };

            let key = (edge.from_task, edge.to_task);
            match previous.remove(&key) {
                Some(mut arrow) if arrow.unchanged(from_pos, to_pos, blocked) => {
                    arrow.edge_id = edge.id;
                    self.arrows.push(arrow);
                }
                _ => {
                    self.next_revision += 1;
                    recomputed += 1;
                    self.arrows.push(DependencyArrow {
                        edge_id: edge.id,
                        from_task: edge.from_task,
                        to_task: edge.to_task,
                        from_pos: *from_pos,
                        to_pos: *to_pos,
                        path: route_path(from_pos, to_pos, column_width),
                        is_blocked: blocked,
                        color: if blocked { BLOCKED_ARROW_COLOR } else { ARROW_COLOR },
                        stroke_width: if blocked { BLOCKED_ARROW_WIDTH } else { ARROW_WIDTH },
                        revision: self.next_revision,
                    });
                }
            }
        }
        recomputed
    }

    /// Arrow whose path passes within `tolerance` of `point`.
    pub fn arrow_near(&self, point: Pos2, tolerance: f32) -> Option<&DependencyArrow> {
        self.arrows.iter().find(|arrow| {
            arrow
                .path
                .windows(2)
                .any(|seg| distance_to_segment(point, seg[0], seg[1]) <= tolerance)
        })
    }
}

fn distance_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RelationshipKind;
    use uuid::Uuid;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn pos(x: f32, y: f32, width: f32) -> TaskPosition {
        TaskPosition {
            x,
            y,
            width,
            height: 22.0,
        }
    }

    fn open(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Schedule {
        Schedule {
            column_closed: false,
            start,
            end,
        }
    }

    #[test]
    fn child_starting_on_parent_end_is_blocked() {
        let parent = open(Some(day(1)), Some(day(10)));
        let child = open(Some(day(10)), Some(day(12)));
        assert!(is_blocked(&parent, &child));
    }

    #[test]
    fn finished_parent_never_blocks() {
        let parent = Schedule {
            column_closed: true,
            ..open(Some(day(1)), Some(day(10)))
        };
        assert!(!is_blocked(&parent, &open(Some(day(10)), None)));
    }

    #[test]
    fn child_starting_after_parent_end_is_clear() {
        let parent = open(Some(day(1)), Some(day(10)));
        assert!(!is_blocked(&parent, &open(Some(day(11)), None)));
    }

    #[test]
    fn open_ended_parent_blocks_any_scheduled_child() {
        let parent = open(Some(day(1)), None);
        assert!(is_blocked(&parent, &open(Some(day(28)), None)));
        assert!(!is_blocked(&parent, &open(None, Some(day(28)))));
    }

    #[test]
    fn route_leaves_right_edge_and_enters_left_edge() {
        let from = pos(100.0, 50.0, 80.0);
        let to = pos(400.0, 82.0, 40.0);
        let path = route_path(&from, &to, 40.0);
        assert_eq!(path.first(), Some(&Pos2::new(180.0, 61.0 + CENTER_NUDGE)));
        assert_eq!(path.last(), Some(&Pos2::new(400.0, 93.0 - CENTER_NUDGE)));
        assert_eq!(path[1].x, 180.0 + 60.0);
        assert_eq!(path[3].x, 400.0 - 60.0);
        // Source above target: rail runs below the source.
        assert_eq!(path[2].y, 61.0 + RAIL_OFFSET);
        for seg in path.windows(2) {
            assert!(seg[0].x == seg[1].x || seg[0].y == seg[1].y, "segment not orthogonal");
        }
    }

    #[test]
    fn rail_runs_above_when_source_is_below() {
        let from = pos(100.0, 200.0, 80.0);
        let to = pos(40.0, 50.0, 40.0);
        let path = route_path(&from, &to, 40.0);
        assert_eq!(path[2].y, 211.0 - RAIL_OFFSET);
    }

    #[test]
    fn unchanged_arrows_are_not_recomputed() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let edges = vec![
            RelationshipEdge::confirmed(a, b, RelationshipKind::Parent),
            RelationshipEdge::confirmed(b, c, RelationshipKind::Related),
        ];
        let mut positions = HashMap::from([
            (a, pos(0.0, 10.0, 40.0)),
            (b, pos(200.0, 40.0, 40.0)),
            (c, pos(400.0, 70.0, 40.0)),
        ]);
        let schedules = HashMap::new();
        let mut router = ArrowRouter::new();

        assert_eq!(router.refresh(&edges, &positions, &schedules, 40.0), 1);
        let first_revision = router.arrows()[0].revision;

        // Moving an unrelated task leaves the arrow alone.
        positions.insert(c, pos(480.0, 70.0, 40.0));
        assert_eq!(router.refresh(&edges, &positions, &schedules, 40.0), 0);
        assert_eq!(router.arrows()[0].revision, first_revision);

        positions.insert(b, pos(240.0, 40.0, 40.0));
        assert_eq!(router.refresh(&edges, &positions, &schedules, 40.0), 1);
        assert!(router.arrows()[0].revision > first_revision);
    }

    #[test]
    fn blocked_change_recomputes_and_recolors() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let edges = vec![RelationshipEdge::confirmed(a, b, RelationshipKind::Parent)];
        let positions = HashMap::from([(a, pos(0.0, 10.0, 40.0)), (b, pos(200.0, 40.0, 40.0))]);
        let mut schedules = HashMap::from([
            (a, open(Some(day(1)), Some(day(10)))),
            (b, open(Some(day(11)), Some(day(12)))),
        ]);
        let mut router = ArrowRouter::new();
        router.refresh(&edges, &positions, &schedules, 40.0);
        assert_eq!(router.arrows()[0].color, ARROW_COLOR);

        schedules.insert(b, open(Some(day(9)), Some(day(12))));
        assert_eq!(router.refresh(&edges, &positions, &schedules, 40.0), 1);
        assert!(router.arrows()[0].is_blocked);
        assert_eq!(router.arrows()[0].color, BLOCKED_ARROW_COLOR);
        assert_eq!(router.arrows()[0].stroke_width, BLOCKED_ARROW_WIDTH);
    }

    #[test]
    fn confirmed_id_keeps_the_same_arrow() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let positions = HashMap::from([(a, pos(0.0, 10.0, 40.0)), (b, pos(200.0, 40.0, 40.0))]);
        let mut pending = RelationshipEdge::confirmed(a, b, RelationshipKind::Parent);
        pending.id = EdgeId::Pending(1);
        let mut router = ArrowRouter::new();
        router.refresh([&pending], &positions, &HashMap::new(), 40.0);

        let confirmed = RelationshipEdge::confirmed(a, b, RelationshipKind::Parent);
        assert_eq!(router.refresh([&confirmed], &positions, &HashMap::new(), 40.0), 0);
        assert_eq!(router.arrows()[0].edge_id, confirmed.id);
    }

    #[test]
    fn arrows_skip_out_of_view_endpoints_and_hit_test() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let edges = vec![RelationshipEdge::confirmed(a, b, RelationshipKind::Parent)];
        let mut positions = HashMap::from([(a, pos(0.0, 10.0, 40.0))]);
        let mut router = ArrowRouter::new();
        assert_eq!(router.refresh(&edges, &positions, &HashMap::new(), 40.0), 0);
        assert!(router.arrows().is_empty());

        positions.insert(b, pos(300.0, 80.0, 40.0));
        router.refresh(&edges, &positions, &HashMap::new(), 40.0);
        let on_path = router.arrows()[0].path[1];
        assert!(router.arrow_near(on_path, 3.0).is_some());
        assert!(router.arrow_near(Pos2::new(-100.0, -100.0), 3.0).is_none());
    }
}
