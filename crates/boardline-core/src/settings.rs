//! Persisted derivation settings.

use serde::{Deserialize, Serialize};

use crate::id::{BoardId, FieldId};
use crate::sort::{SortDirection, SortKey};

/// User-facing options controlling derivation. This is the only persisted structure.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimelineSettings {
    /// Field carrying the date range; `None` auto-detects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline_column: Option<FieldId>,
    /// Field used to colour bars.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_by_column: Option<FieldId>,
    /// Field used to group rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by_column: Option<FieldId>,
    /// Sort key (`name`, `start_date`, `end_date` or a field id).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by_column: Option<String>,
    /// Sort direction.
    pub sort_direction: SortDirection,
    /// Whether subitems become child tasks.
    pub show_subitems: bool,
    /// Boards to include; empty means all.
    pub selected_boards: Vec<BoardId>,
}

impl TimelineSettings {
    /// Parsed sort key, if a sort column is configured.
    #[must_use]
    pub fn sort_key(&self) -> Option<SortKey> {
        self.sort_by_column
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(SortKey::parse)
    }

    /// Whether `board` passes the board selection.
    #[must_use]
    pub fn includes_board(&self, board: &BoardId) -> bool {
        self.selected_boards.is_empty() || self.selected_boards.contains(board)
    }
}
