//! Cross-board mirror field resolution.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

use crate::board::{Board, FieldDef, FieldKind, Item};
use crate::field::FieldPayload;
use crate::id::{BoardId, FieldId};

/// Field definitions of one board as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Board display name.
    pub board_name: String,
    /// Field definitions.
    pub fields: Vec<FieldDef>,
}

impl From<&Board> for CatalogEntry {
    fn from(board: &Board) -> Self {
        Self {
            board_name: board.name.clone(),
            fields: board.fields.clone(),
        }
    }
}

/// Lookup of field definitions by board.
pub trait FieldCatalog {
    /// Field definitions of `board`, or `None` when the board is unknown.
    fn board_fields(&self, board: &BoardId) -> Option<CatalogEntry>;
}

/// In-memory catalog, filled by the host before derivation.
#[derive(Debug, Clone, Default)]
pub struct BoardCatalog {
    entries: HashMap<BoardId, CatalogEntry>,
}

impl BoardCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the entry for a board.
    pub fn insert(&mut self, board: BoardId, entry: CatalogEntry) {
        self.entries.insert(board, entry);
    }

    /// Whether `board` has an entry.
    #[must_use]
    pub fn contains(&self, board: &BoardId) -> bool {
        self.entries.contains_key(board)
    }

    /// Number of known boards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog knows no boards.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> FromIterator<&'a Board> for BoardCatalog {
    fn from_iter<I: IntoIterator<Item = &'a Board>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|board| (board.id.clone(), CatalogEntry::from(board)))
                .collect(),
        }
    }
}

impl FieldCatalog for BoardCatalog {
    fn board_fields(&self, board: &BoardId) -> Option<CatalogEntry> {
        self.entries.get(board).cloned()
    }
}

/// Resolved reference from a mirror field to the field it mirrors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorMapping {
    /// Board the mirrored value lives on.
    pub source_board_id: BoardId,
    /// Name of that board.
    pub source_board_name: String,
    /// Mirrored field.
    pub source_field_id: FieldId,
    /// Title of the mirrored field.
    pub source_field_title: String,
    /// Type of the mirrored field.
    pub source_field_kind: FieldKind,
    /// Local mirror field.
    pub mirror_field_id: FieldId,
    /// Title of the local mirror field.
    pub mirror_field_title: String,
    /// Board owning the mirror field.
    pub target_board_id: BoardId,
}

/// Mirrored value attached to a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorDatum {
    /// Text shown to the user.
    pub display_value: String,
    /// Structured payload, or the display text when the payload did not decode.
    pub raw_value: Value,
    /// Title of the mirrored field.
    pub source_title: String,
    /// Name of the board the value comes from.
    pub source_board: String,
    /// Type of the mirrored field.
    pub kind: FieldKind,
}

#[derive(Debug, Deserialize)]
struct MirrorSettings {
    #[serde(default)]
    displayed_linked_columns: BTreeMap<String, Vec<FieldId>>,
    #[serde(default)]
    source_board_id: Option<BoardId>,
    #[serde(default)]
    source_field_id: Option<FieldId>,
}

impl MirrorSettings {
    fn source(self) -> Option<(BoardId, FieldId)> {
        if let (Some(board), Some(field)) = (self.source_board_id, self.source_field_id) {
            return Some((board, field));
        }
        self.displayed_linked_columns
            .into_iter()
            .find_map(|(board, fields)| fields.into_iter().next().map(|field| (BoardId::new(board), field)))
    }
}

/// Resolve every mirror field on `board` to its source field.
///
/// Fields whose settings cannot be parsed or whose source cannot be found are
/// skipped with a warning; the rest of the board still resolves.
pub fn resolve_mirror_mappings<C>(board: &Board, catalog: &C) -> Vec<MirrorMapping>
where
    C: FieldCatalog + ?Sized,
{
    board
        .fields
        .iter()
        .filter(|def| def.kind == FieldKind::Mirror && !def.archived)
        .filter_map(|def| resolve_one(board, def, catalog))
        .collect()
}

/// Boards referenced by the mirror fields of `board`, excluding the board itself.
///
/// Lets a host fetch the field catalogs it needs before resolving mappings.
#[must_use]
pub fn mirror_sources(board: &Board) -> BTreeSet<BoardId> {
    board
        .fields
        .iter()
        .filter(|def| def.kind == FieldKind::Mirror && !def.archived)
        .filter_map(|def| serde_json::from_str::<MirrorSettings>(def.settings.as_deref()?).ok())
        .filter_map(|settings| settings.source().map(|(source, _)| source))
        .filter(|source| source != &board.id)
        .collect()
}

fn resolve_one<C>(board: &Board, def: &FieldDef, catalog: &C) -> Option<MirrorMapping>
where
    C: FieldCatalog + ?Sized,
{
    let Some(raw) = def.settings.as_deref() else {
        warn!(board = %board.id, field = %def.id, "mirror field has no settings");
        return None;
    };
    let settings: MirrorSettings = match serde_json::from_str(raw) {
        Ok(settings) => settings,
        Err(err) => {
            warn!(board = %board.id, field = %def.id, "unparsable mirror settings: {err}");
            return None;
        }
    };
    let Some((source_board_id, source_field_id)) = settings.source() else {
        warn!(board = %board.id, field = %def.id, "mirror settings name no source field");
        return None;
    };
    let Some(entry) = catalog.board_fields(&source_board_id) else {
        warn!(board = %board.id, field = %def.id, source = %source_board_id, "mirror source board not found");
        return None;
    };
    let Some(source) = entry.fields.iter().find(|field| field.id == source_field_id) else {
        warn!(
            board = %board.id,
            field = %def.id,
            source = %source_board_id,
            source_field = %source_field_id,
            "mirror source field not found"
        );
        return None;
    };

    Some(MirrorMapping {
        source_board_id,
        source_board_name: entry.board_name,
        source_field_id,
        source_field_title: source.title.clone(),
        source_field_kind: source.kind.clone(),
        mirror_field_id: def.id.clone(),
        mirror_field_title: def.title.clone(),
        target_board_id: board.id.clone(),
    })
}

/// Collect the mirrored values present on `item`, keyed by mirror field id.
///
/// Payloads that fail to decode keep their display text as both raw and display value.
#[must_use]
pub fn resolve_mirror_data(item: &Item, mappings: &[MirrorMapping]) -> BTreeMap<FieldId, MirrorDatum> {
    mappings
        .iter()
        .filter_map(|mapping| {
            let field = item.field(&mapping.mirror_field_id)?;
            if field.is_empty() {
                return None;
            }
            let text = field.display_text().unwrap_or_default().to_owned();
            let (display_value, raw_value) = match field.decode() {
                Ok(FieldPayload::Mirror(json)) => (display_of(&json, &text), json),
                Ok(other) => {
                    let label = other.label().unwrap_or_else(|| text.clone());
                    (label, Value::String(text))
                }
                Err(err) => {
                    debug!(item = %item.id, field = %field.id, "mirror decode failed: {err}");
                    (text.clone(), Value::String(text))
                }
            };
            Some((
                mapping.mirror_field_id.clone(),
                MirrorDatum {
                    display_value,
                    raw_value,
                    source_title: mapping.source_field_title.clone(),
                    source_board: mapping.source_board_name.clone(),
                    kind: mapping.source_field_kind.clone(),
                },
            ))
        })
        .collect()
}

fn display_of(json: &Value, text: &str) -> String {
    match json.get("display_value") {
        Some(Value::String(display)) if !display.trim().is_empty() => display.clone(),
        _ if !text.is_empty() => text.to_owned(),
        _ => match json {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    }
}
