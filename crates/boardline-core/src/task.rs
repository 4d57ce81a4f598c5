//! Task entity and the builder that derives tasks from board items.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::board::{Board, Item};
use crate::date::DateRange;
use crate::field::{extract_color, extract_group, extract_progress, extract_timeline_range};
use crate::id::{BoardId, FieldId, ItemId};
use crate::mirror::{MirrorDatum, MirrorMapping, resolve_mirror_data};
use crate::settings::TimelineSettings;

/// Schedulable representation of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Same as the originating item id.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Scheduled days.
    #[serde(flatten)]
    pub range: DateRange,
    /// Completion percentage in `[0, 100]`.
    pub progress: f64,
    /// Bar colour token.
    pub color: String,
    /// Group label.
    pub group: String,
    /// Owning board.
    pub board_id: BoardId,
    /// Owning board name.
    pub board_name: String,
    /// Parent task for subitems.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ItemId>,
    /// Originating item.
    pub item: Item,
    /// Mirrored values keyed by mirror field id.
    #[serde(default)]
    pub mirror_data: BTreeMap<FieldId, MirrorDatum>,
}

impl Task {
    /// Whether the task is a top-level row.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// New snapshot of this task with a replaced date range.
    #[must_use]
    pub fn with_range(&self, range: DateRange) -> Self {
        Self {
            range,
            ..self.clone()
        }
    }
}

/// Derives tasks for the items of a single board.
#[derive(Debug, Clone, Copy)]
pub struct TaskBuilder<'a> {
    board: &'a Board,
    mappings: &'a [MirrorMapping],
    settings: &'a TimelineSettings,
}

impl<'a> TaskBuilder<'a> {
    /// Bind the builder to a board, its mirror mappings and the active settings.
    #[must_use]
    pub const fn new(board: &'a Board, mappings: &'a [MirrorMapping], settings: &'a TimelineSettings) -> Self {
        Self {
            board,
            mappings,
            settings,
        }
    }

    /// Build tasks for `items` in arrival order.
    ///
    /// Items without any date are skipped. With subitems enabled, each subitem
    /// follows as a child task even when its parent was skipped.
    #[must_use]
    pub fn build(&self, items: &[Item]) -> Vec<Task> {
        let mut tasks = Vec::with_capacity(items.len());
        for item in items {
            if let Some(task) = self.build_one(item, None) {
                tasks.push(task);
            }
            if !self.settings.show_subitems {
                continue;
            }
            for sub in &item.subitems {
                let mut child = sub.clone();
                if child.group_id.is_none() {
                    child.group_id.clone_from(&item.group_id);
                }
                // Only one level of nesting is modelled; deeper subitems are ignored.
                child.subitems.clear();
                if let Some(task) = self.build_one(&child, Some(&item.id)) {
                    tasks.push(task);
                }
            }
        }
        debug!(board = %self.board.id, items = items.len(), tasks = tasks.len(), "built tasks");
        tasks
    }

    fn build_one(&self, item: &Item, parent: Option<&ItemId>) -> Option<Task> {
        let range = extract_timeline_range(item, self.settings.timeline_column.as_ref());
        if range.is_empty() {
            return None;
        }
        let mirror_data = resolve_mirror_data(item, self.mappings);
        let color = extract_color(item, self.board, self.settings.color_by_column.as_ref(), &mirror_data);
        let group = extract_group(item, self.board, self.settings.group_by_column.as_ref(), &mirror_data);
        Some(Task {
            id: item.id.clone(),
            name: item.name.clone(),
            range,
            progress: extract_progress(item),
            color,
            group,
            board_id: self.board.id.clone(),
            board_name: self.board.name.clone(),
            parent_id: parent.cloned(),
            item: item.clone(),
            mirror_data,
        })
    }
}
