//! Pointer-driven move/resize gestures on timeline bars.
//!
//! The controller is an explicit state machine fed by discrete events. All
//! candidate ranges are computed from the anchor captured when the gesture
//! started, never from the previous sample, so rounding does not accumulate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::Date;

use crate::date::{DateRange, shift};
use crate::error::DragError;
use crate::id::ItemId;
use crate::task::Task;

/// Which part of the bar is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DragKind {
    /// Whole bar; both dates shift.
    Move,
    /// Left handle; only the start shifts.
    ResizeStart,
    /// Right handle; only the end shifts.
    ResizeEnd,
}

impl FromStr for DragKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "move" => Ok(Self::Move),
            "resize-start" => Ok(Self::ResizeStart),
            "resize-end" => Ok(Self::ResizeEnd),
            other => Err(format!("unknown drag kind '{other}'")),
        }
    }
}

impl fmt::Display for DragKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Move => "move",
            Self::ResizeStart => "resize-start",
            Self::ResizeEnd => "resize-end",
        })
    }
}

/// Candidate range emitted while dragging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DragUpdate {
    /// Dragged task.
    pub task_id: ItemId,
    /// Candidate range (both ends always set).
    pub range: DateRange,
}

#[derive(Debug, Clone, PartialEq)]
struct DragSession {
    task_id: ItemId,
    kind: DragKind,
    anchor: (Date, Date),
    pointer_origin: f64,
    pixels_per_day: f64,
}

impl DragSession {
    #[allow(clippy::cast_possible_truncation)]
    fn delta_days(&self, pointer_x: f64) -> i64 {
        let days = ((pointer_x - self.pointer_origin) / self.pixels_per_day).round();
        if days.is_finite() { days as i64 } else { 0 }
    }

    fn candidate(&self, pointer_x: f64) -> DragUpdate {
        let delta = self.delta_days(pointer_x);
        let (start, end) = self.anchor;
        let (start, end) = match self.kind {
            DragKind::Move => (shift(start, delta), shift(end, delta)),
            DragKind::ResizeStart => (shift(start, delta).min(end), end),
            DragKind::ResizeEnd => (start, shift(end, delta).max(start)),
        };
        DragUpdate {
            task_id: self.task_id.clone(),
            range: DateRange::new(start, end),
        }
    }
}

/// Gesture state.
#[derive(Debug, Clone, PartialEq, Default)]
enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// State machine translating pointer movement into date-range updates.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    /// Idle controller.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a gesture is in progress.
    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Task being dragged, if any.
    #[must_use]
    pub const fn active_task(&self) -> Option<&ItemId> {
        match &self.state {
            DragState::Dragging(session) => Some(&session.task_id),
            DragState::Idle => None,
        }
    }

    /// Start a gesture on `task` at `pointer_x`.
    ///
    /// # Errors
    /// Fails when another gesture is active, the task is not fully dated, or the
    /// scale is not a positive finite number.
    pub fn begin(&mut self, task: &Task, kind: DragKind, pointer_x: f64, pixels_per_day: f64) -> Result<(), DragError> {
        if let DragState::Dragging(session) = &self.state {
            return Err(DragError::AlreadyDragging(session.task_id.to_string()));
        }
        if !(pixels_per_day.is_finite() && pixels_per_day > 0.0) || !pointer_x.is_finite() {
            return Err(DragError::InvalidScale);
        }
        let anchor = task
            .range
            .bounds()
            .ok_or_else(|| DragError::IncompleteRange(task.id.to_string()))?;
        tracing::debug!(task = %task.id, %kind, "drag started");
        self.state = DragState::Dragging(DragSession {
            task_id: task.id.clone(),
            kind,
            anchor,
            pointer_origin: pointer_x,
            pixels_per_day,
        });
        Ok(())
    }

    /// Candidate range for the current pointer position; `None` when idle.
    #[must_use]
    pub fn update(&self, pointer_x: f64) -> Option<DragUpdate> {
        match &self.state {
            DragState::Dragging(session) => Some(session.candidate(pointer_x)),
            DragState::Idle => None,
        }
    }

    /// Finish the gesture at `pointer_x`, returning the final range.
    pub fn end(&mut self, pointer_x: f64) -> Option<DragUpdate> {
        match std::mem::take(&mut self.state) {
            DragState::Dragging(session) => {
                let update = session.candidate(pointer_x);
                tracing::debug!(task = %update.task_id, "drag finished");
                Some(update)
            }
            DragState::Idle => None,
        }
    }

    /// Abort the gesture, returning the anchor range so the bar can be restored.
    pub fn cancel(&mut self) -> Option<DragUpdate> {
        match std::mem::take(&mut self.state) {
            DragState::Dragging(session) => Some(DragUpdate {
                task_id: session.task_id,
                range: DateRange::new(session.anchor.0, session.anchor.1),
            }),
            DragState::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Item;
    use std::collections::BTreeMap;
    use time::macros::date;

    fn task(range: DateRange) -> Task {
        Task {
            id: "t1".into(),
            name: "Task".into(),
            range,
            progress: 0.0,
            color: String::new(),
            group: String::new(),
            board_id: "b".into(),
            board_name: "B".into(),
            parent_id: None,
            item: Item {
                id: "t1".into(),
                name: "Task".into(),
                group_id: None,
                fields: Vec::new(),
                subitems: Vec::new(),
            },
            mirror_data: BTreeMap::new(),
        }
    }

    fn jan(start: u8, end: u8) -> DateRange {
        let day = |d: u8| shift(date!(2024 - 01 - 01), i64::from(d) - 1);
        DateRange::new(day(start), day(end))
    }

    fn begin(controller: &mut DragController, kind: DragKind) {
        controller
            .begin(&task(jan(10, 15)), kind, 100.0, 20.0)
            .unwrap_or_else(|err| panic!("begin: {err}"));
    }

    #[test]
    fn move_shifts_both_ends_from_the_anchor() {
        let mut controller = DragController::new();
        begin(&mut controller, DragKind::Move);
        assert_eq!(controller.update(140.0).map(|u| u.range), Some(jan(12, 17)));
        // 29px rounds to one day; computed from the anchor, not from the previous sample.
        assert_eq!(controller.update(129.0).map(|u| u.range), Some(jan(11, 16)));
        assert_eq!(controller.update(55.0).map(|u| u.range), Some(jan(8, 13)));
        assert_eq!(controller.end(160.0).map(|u| u.range), Some(jan(13, 18)));
        assert!(!controller.is_dragging());
        assert!(controller.update(200.0).is_none());
    }

    #[test]
    fn resize_start_clamps_at_the_end() {
        let mut controller = DragController::new();
        begin(&mut controller, DragKind::ResizeStart);
        assert_eq!(controller.update(60.0).map(|u| u.range), Some(jan(8, 15)));
        assert_eq!(controller.update(100.0 + 20.0 * 30.0).map(|u| u.range), Some(jan(15, 15)));
    }

    #[test]
    fn resize_end_clamps_at_the_start() {
        let mut controller = DragController::new();
        begin(&mut controller, DragKind::ResizeEnd);
        assert_eq!(controller.update(160.0).map(|u| u.range), Some(jan(10, 18)));
        assert_eq!(controller.update(-1000.0).map(|u| u.range), Some(jan(10, 10)));
    }

    #[test]
    fn huge_pointer_travel_saturates_instead_of_overflowing() {
        let mut controller = DragController::new();
        controller
            .begin(&task(jan(10, 15)), DragKind::Move, 0.0, 20.0)
            .unwrap_or_else(|err| panic!("begin: {err}"));
        assert_eq!(
            controller.update(1e17).map(|u| u.range),
            Some(DateRange::new(Date::MAX, Date::MAX))
        );
        assert_eq!(
            controller.update(-1e17).map(|u| u.range),
            Some(DateRange::new(Date::MIN, Date::MIN))
        );
        let resized = controller.end(f64::MAX).map(|u| u.range);
        assert!(resized.is_some());
    }

    #[test]
    fn only_one_drag_at_a_time() {
        let mut controller = DragController::new();
        begin(&mut controller, DragKind::Move);
        let err = controller.begin(&task(jan(1, 2)), DragKind::Move, 0.0, 20.0);
        assert_eq!(err, Err(DragError::AlreadyDragging("t1".into())));
        assert_eq!(controller.active_task(), Some(&ItemId::from("t1")));
    }

    #[test]
    fn begin_rejects_bad_input() {
        let mut controller = DragController::new();
        let half = DateRange {
            start: Some(date!(2024 - 01 - 01)),
            end: None,
        };
        assert_eq!(
            controller.begin(&task(half), DragKind::Move, 0.0, 20.0),
            Err(DragError::IncompleteRange("t1".into()))
        );
        assert_eq!(
            controller.begin(&task(jan(1, 2)), DragKind::Move, 0.0, 0.0),
            Err(DragError::InvalidScale)
        );
        assert!(!controller.is_dragging());
    }

    #[test]
    fn cancel_restores_the_anchor() {
        let mut controller = DragController::new();
        begin(&mut controller, DragKind::Move);
        let _ = controller.update(300.0);
        assert_eq!(controller.cancel().map(|u| u.range), Some(jan(10, 15)));
        assert!(controller.cancel().is_none());
        assert!(controller.end(0.0).is_none());
    }

    #[test]
    fn drag_kind_parses() {
        assert_eq!("resize-start".parse::<DragKind>(), Ok(DragKind::ResizeStart));
        assert!("stretch".parse::<DragKind>().is_err());
        assert_eq!(DragKind::ResizeEnd.to_string(), "resize-end");
    }
}
