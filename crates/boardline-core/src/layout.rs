//! Date window, pixel scale and bar geometry for the timeline.

use serde::Serialize;
use time::Date;

use crate::date::{days_between, shift};
use crate::iso_date;
use crate::id::ItemId;
use crate::task::Task;

/// Calendar days added on both sides of the task span.
pub const PADDING_DAYS: i64 = 7;
/// Lower bound on the horizontal scale.
pub const MIN_PIXELS_PER_DAY: f64 = 20.0;
/// Lower bound on the width available to bars.
pub const MIN_AVAILABLE_WIDTH: f64 = 800.0;
/// Width reserved for the task list next to the chart.
pub const SIDEBAR_WIDTH: f64 = 350.0;
/// Minimum bar width, in days.
pub const MIN_BAR_DAYS: f64 = 0.5;

/// Visible date window and its scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimelineWindow {
    /// First visible day.
    #[serde(with = "iso_date")]
    pub start: Date,
    /// Last visible day.
    #[serde(with = "iso_date")]
    pub end: Date,
    /// Horizontal scale.
    pub pixels_per_day: f64,
}

impl TimelineWindow {
    /// Span of the window in days (`end - start`).
    #[must_use]
    pub fn day_count(&self) -> i64 {
        days_between(self.start, self.end)
    }

    /// Horizontal offset of `day`, or `None` when it lies outside the window.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn offset_of(&self, day: Date) -> Option<f64> {
        (self.start..=self.end)
            .contains(&day)
            .then(|| days_between(self.start, day) as f64 * self.pixels_per_day)
    }

    /// Every day in the window, for header ticks.
    pub fn days(&self) -> impl Iterator<Item = Date> + use<> {
        let end = self.end;
        std::iter::successors(Some(self.start), move |day| day.next_day().filter(|next| *next <= end))
    }

    /// Total chart width in pixels.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn width_px(&self) -> f64 {
        self.day_count() as f64 * self.pixels_per_day
    }
}

/// Horizontal placement of one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BarGeometry {
    /// Distance from the window start.
    pub offset_px: f64,
    /// Bar width.
    pub width_px: f64,
}

/// A bar placed on a row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedBar {
    /// Task drawn by the bar.
    pub task_id: ItemId,
    /// Row index in display order.
    pub row: usize,
    /// Placement.
    pub geometry: BarGeometry,
}

/// Window plus placed bars for a task list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutResult {
    /// Window, absent when no task is fully dated.
    pub window: Option<TimelineWindow>,
    /// Bars for tasks with both dates, in row order.
    pub bars: Vec<PositionedBar>,
    /// Scrollable timeline width; zero without a window.
    pub total_width_px: f64,
}

/// Compute the padded window covering every date of `tasks`.
///
/// Returns `None` when no task has both a start and an end.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compute_window(tasks: &[Task], viewport_width: f64) -> Option<TimelineWindow> {
    if !tasks.iter().any(|task| task.range.bounds().is_some()) {
        return None;
    }
    let dates = tasks
        .iter()
        .flat_map(|task| [task.range.start, task.range.end])
        .flatten();
    let (min, max) = dates.fold(None, |acc: Option<(Date, Date)>, day| {
        Some(acc.map_or((day, day), |(lo, hi)| (lo.min(day), hi.max(day))))
    })?;

    let start = shift(min, -PADDING_DAYS);
    let end = shift(max, PADDING_DAYS);
    let total_days = days_between(start, end).max(1) as f64;
    let viewport = if viewport_width.is_finite() { viewport_width } else { 0.0 };
    let available = (viewport - SIDEBAR_WIDTH).max(MIN_AVAILABLE_WIDTH);
    Some(TimelineWindow {
        start,
        end,
        pixels_per_day: (available / total_days).max(MIN_PIXELS_PER_DAY),
    })
}

/// Place a task's bar inside `window`; `None` unless both dates are set.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn position_bar(task: &Task, window: &TimelineWindow) -> Option<BarGeometry> {
    let (start, end) = task.range.bounds()?;
    let ppd = window.pixels_per_day;
    let duration_days = (days_between(start, end) + 1) as f64;
    Some(BarGeometry {
        offset_px: days_between(window.start, start) as f64 * ppd,
        width_px: (ppd * duration_days).max(ppd * MIN_BAR_DAYS),
    })
}

/// Window and bars for `tasks`, rows following the given order.
#[must_use]
pub fn compute_layout(tasks: &[Task], viewport_width: f64) -> LayoutResult {
    let Some(window) = compute_window(tasks, viewport_width) else {
        return LayoutResult {
            window: None,
            bars: Vec::new(),
            total_width_px: 0.0,
        };
    };
    let bars = tasks
        .iter()
        .enumerate()
        .filter_map(|(row, task)| {
            position_bar(task, &window).map(|geometry| PositionedBar {
                task_id: task.id.clone(),
                row,
                geometry,
            })
        })
        .collect();
    LayoutResult {
        total_width_px: window.width_px(),
        window: Some(window),
        bars,
    }
}
