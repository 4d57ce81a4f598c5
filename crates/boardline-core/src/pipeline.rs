//! End-to-end derivation: build, order, group.

use std::collections::HashMap;
use std::hash::BuildHasher;

use crate::board::{Board, Item};
use crate::date::DateRange;
use crate::hierarchy::{TaskGroups, group_tasks};
use crate::id::{BoardId, ItemId};
use crate::mirror::{FieldCatalog, MirrorMapping, resolve_mirror_mappings};
use crate::settings::TimelineSettings;
use crate::sort::sort_tasks;
use crate::task::{Task, TaskBuilder};

/// One board's items together with its resolved mirror mappings.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardSnapshot {
    /// Board metadata.
    pub board: Board,
    /// Items fetched for the board.
    pub items: Vec<Item>,
    /// Mirror mappings resolved once per refresh.
    pub mappings: Vec<MirrorMapping>,
}

impl BoardSnapshot {
    /// Bundle a board with its items, resolving mirror mappings against `catalog`.
    pub fn resolve<C>(board: Board, items: Vec<Item>, catalog: &C) -> Self
    where
        C: FieldCatalog + ?Sized,
    {
        let mappings = resolve_mirror_mappings(&board, catalog);
        Self {
            board,
            items,
            mappings,
        }
    }
}

/// Everything derivation needs for one refresh cycle.
///
/// Constructed by the caller and passed explicitly; derivation keeps no state
/// between calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivationContext {
    boards: Vec<BoardSnapshot>,
}

impl DerivationContext {
    /// Context over the given board snapshots, in board order.
    #[must_use]
    pub const fn new(boards: Vec<BoardSnapshot>) -> Self {
        Self { boards }
    }

    /// Board snapshots in board order.
    #[must_use]
    pub fn boards(&self) -> &[BoardSnapshot] {
        &self.boards
    }

    /// Snapshot of a specific board.
    #[must_use]
    pub fn board(&self, id: &BoardId) -> Option<&BoardSnapshot> {
        self.boards.iter().find(|snapshot| &snapshot.board.id == id)
    }

    /// Derive grouped tasks across every selected board.
    #[must_use]
    pub fn derive_groups(&self, settings: &TimelineSettings) -> TaskGroups {
        self.derive_groups_with(settings, &HashMap::new())
    }

    /// Like [`derive_groups`](Self::derive_groups), with some task ranges replaced
    /// before ordering, e.g. by edits that have not reached the board yet.
    #[must_use]
    pub fn derive_groups_with<S: BuildHasher>(
        &self,
        settings: &TimelineSettings,
        ranges: &HashMap<ItemId, DateRange, S>,
    ) -> TaskGroups {
        let mut tasks: Vec<Task> = self
            .boards
            .iter()
            .filter(|snapshot| settings.includes_board(&snapshot.board.id))
            .flat_map(|snapshot| {
                TaskBuilder::new(&snapshot.board, &snapshot.mappings, settings).build(&snapshot.items)
            })
            .collect();
        for task in &mut tasks {
            if let Some(range) = ranges.get(&task.id) {
                task.range = *range;
            }
        }
        order_and_group(tasks, settings)
    }

    /// Derive the flat display-ordered task list across every selected board.
    #[must_use]
    pub fn derive(&self, settings: &TimelineSettings) -> Vec<Task> {
        self.derive_groups(settings).flatten()
    }

    /// Flat display-ordered task list with replaced ranges; see [`derive_groups_with`](Self::derive_groups_with).
    #[must_use]
    pub fn derive_with<S: BuildHasher>(
        &self,
        settings: &TimelineSettings,
        ranges: &HashMap<ItemId, DateRange, S>,
    ) -> Vec<Task> {
        self.derive_groups_with(settings, ranges).flatten()
    }
}

/// Derive the display-ordered task list for a single board.
#[must_use]
pub fn derive_tasks(
    items: &[Item],
    board: &Board,
    settings: &TimelineSettings,
    mappings: &[MirrorMapping],
) -> Vec<Task> {
    let tasks = TaskBuilder::new(board, mappings, settings).build(items);
    order_and_group(tasks, settings).flatten()
}

fn order_and_group(mut tasks: Vec<Task>, settings: &TimelineSettings) -> TaskGroups {
    if let Some(key) = settings.sort_key() {
        sort_tasks(&mut tasks, &key, settings.sort_direction);
    }
    group_tasks(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{FieldKind, FieldValue, Group};
    use crate::mirror::BoardCatalog;
    use crate::sort::SortDirection;

    fn dated(id: &str, group: &str, day: &str, subitems: Vec<Item>) -> Item {
        Item {
            id: id.into(),
            name: id.to_uppercase(),
            group_id: Some(group.into()),
            fields: vec![FieldValue {
                id: "due".into(),
                title: "Due".into(),
                kind: FieldKind::Date,
                value: Some(format!(r#"{{"date":"{day}"}}"#)),
                text: Some(day.into()),
            }],
            subitems,
        }
    }

    fn board(id: &str) -> Board {
        Board {
            id: id.into(),
            name: format!("Board {id}"),
            kind: "public".into(),
            fields: Vec::new(),
            groups: vec![
                Group {
                    id: "todo".into(),
                    title: "To do".into(),
                    color: None,
                    position: 0,
                },
                Group {
                    id: "done".into(),
                    title: "Done".into(),
                    color: None,
                    position: 1,
                },
            ],
        }
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn derive_sorts_then_groups_with_children_after_parents() {
        let items = vec![
            dated("b", "todo", "2024-01-05", vec![dated("b1", "todo", "2024-01-06", Vec::new())]),
            dated("a", "done", "2024-01-01", Vec::new()),
            dated("c", "todo", "2024-01-02", Vec::new()),
        ];
        let settings = TimelineSettings {
            sort_by_column: Some("start_date".into()),
            show_subitems: true,
            ..TimelineSettings::default()
        };
        let tasks = derive_tasks(&items, &board("1"), &settings, &[]);
        assert_eq!(ids(&tasks), ["a", "c", "b", "b1"]);

        let settings = TimelineSettings {
            sort_direction: SortDirection::Desc,
            ..settings
        };
        let tasks = derive_tasks(&items, &board("1"), &settings, &[]);
        assert_eq!(ids(&tasks), ["b", "b1", "c", "a"]);
    }

    #[test]
    fn derivation_is_deterministic() {
        let items = vec![
            dated("x", "todo", "2024-02-01", Vec::new()),
            dated("y", "done", "2024-01-01", Vec::new()),
        ];
        let settings = TimelineSettings {
            sort_by_column: Some("name".into()),
            ..TimelineSettings::default()
        };
        let first = derive_tasks(&items, &board("1"), &settings, &[]);
        let second = derive_tasks(&items, &board("1"), &settings, &[]);
        assert_eq!(first, second);
    }

    #[test]
    fn replaced_ranges_are_ordered_like_fetched_ones() {
        let catalog = BoardCatalog::new();
        let context = DerivationContext::new(vec![BoardSnapshot::resolve(
            board("1"),
            vec![
                dated("early", "todo", "2024-01-01", Vec::new()),
                dated("late", "todo", "2024-01-10", Vec::new()),
            ],
            &catalog,
        )]);
        let settings = TimelineSettings {
            sort_by_column: Some("start_date".into()),
            ..TimelineSettings::default()
        };
        assert_eq!(ids(&context.derive(&settings)), ["early", "late"]);

        let moved = DateRange::single(time::macros::date!(2024 - 01 - 20));
        let ranges = HashMap::from([(ItemId::from("early"), moved)]);
        let tasks = context.derive_with(&settings, &ranges);
        assert_eq!(ids(&tasks), ["late", "early"]);
        assert_eq!(tasks[1].range, moved);
    }

    #[test]
    fn context_honours_board_selection() {
        let catalog = BoardCatalog::new();
        let context = DerivationContext::new(vec![
            BoardSnapshot::resolve(board("1"), vec![dated("one", "todo", "2024-01-01", Vec::new())], &catalog),
            BoardSnapshot::resolve(board("2"), vec![dated("two", "todo", "2024-01-02", Vec::new())], &catalog),
        ]);

        let all = context.derive(&TimelineSettings::default());
        assert_eq!(ids(&all), ["one", "two"]);

        let settings = TimelineSettings {
            selected_boards: vec![BoardId::from("2")],
            ..TimelineSettings::default()
        };
        let selected = context.derive(&settings);
        assert_eq!(ids(&selected), ["two"]);
        assert_eq!(selected[0].board_name, "Board 2");
        assert!(context.board(&BoardId::from("1")).is_some());
    }
}
