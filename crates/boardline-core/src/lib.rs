//! Task derivation and timeline layout for board items.
//!
//! Items on one or more boards are decoded into typed field values, turned into
//! tasks, ordered and grouped, then placed on a pixel-space timeline where bars
//! can be moved and resized. Everything here is synchronous and deterministic.

/// Board, item and field snapshots.
pub mod board;
/// Calendar date helpers and [`DateRange`](date::DateRange).
pub mod date;
/// Error types.
pub mod error;
/// Field payload decoding and semantic extraction.
pub mod field;
/// Grouping with parent/child nesting.
pub mod hierarchy;
/// Identifier newtypes.
pub mod id;
/// Drag gesture state machine.
pub mod interaction;
/// Timeline window and bar geometry.
pub mod layout;
/// Mirror field resolution.
pub mod mirror;
/// Build, order and group in one pass.
pub mod pipeline;
/// Derivation settings.
pub mod settings;
/// Task comparison.
pub mod sort;
/// Task entity and builder.
pub mod task;

use time::Date;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

pub use board::{Board, FieldDef, FieldKind, FieldValue, Group, Item};
pub use date::DateRange;
pub use error::{DecodeError, DragError};
pub use field::{DEFAULT_COLOR, FieldPayload, NO_GROUP};
pub use hierarchy::{TaskGroup, TaskGroups, group_tasks};
pub use id::{BoardId, FieldId, GroupId, ItemId};
pub use interaction::{DragController, DragKind, DragUpdate};
pub use layout::{BarGeometry, LayoutResult, PositionedBar, TimelineWindow, compute_layout, compute_window, position_bar};
pub use mirror::{BoardCatalog, CatalogEntry, FieldCatalog, MirrorDatum, MirrorMapping, mirror_sources};
pub use pipeline::{BoardSnapshot, DerivationContext, derive_tasks};
pub use settings::TimelineSettings;
pub use sort::{SortDirection, SortKey, compare_tasks, sort_tasks};
pub use task::{Task, TaskBuilder};
