//! Read-only board snapshots as handed over by the board source.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::id::{BoardId, FieldId, GroupId, ItemId};

/// Type tag of a field; selects the decoder applied to its payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Start/end date pair.
    Timeline,
    /// Single calendar date.
    Date,
    /// Plain number.
    Numeric,
    /// Star rating.
    Rating,
    /// Labelled status with a palette index.
    Status,
    /// Colour token.
    Color,
    /// Multi-select labels.
    Dropdown,
    /// Free text.
    Text,
    /// Value mirrored from a field on another board.
    Mirror,
    /// Item creation timestamp.
    CreationLog,
    /// Any tag this crate does not decode.
    Other(String),
}

impl FieldKind {
    /// Parse a source type tag. Unknown tags become [`FieldKind::Other`].
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "timeline" => Self::Timeline,
            "date" => Self::Date,
            "numeric" | "numbers" => Self::Numeric,
            "rating" => Self::Rating,
            "status" => Self::Status,
            "color" => Self::Color,
            "dropdown" => Self::Dropdown,
            "text" | "long_text" => Self::Text,
            "mirror" | "lookup" => Self::Mirror,
            "creation_log" => Self::CreationLog,
            _ => Self::Other(tag.to_owned()),
        }
    }

    /// Canonical type tag.
    #[must_use]
    pub fn as_tag(&self) -> &str {
        match self {
            Self::Timeline => "timeline",
            Self::Date => "date",
            Self::Numeric => "numeric",
            Self::Rating => "rating",
            Self::Status => "status",
            Self::Color => "color",
            Self::Dropdown => "dropdown",
            Self::Text => "text",
            Self::Mirror => "mirror",
            Self::CreationLog => "creation_log",
            Self::Other(tag) => tag,
        }
    }

    /// Kinds that can carry a task's date range.
    #[must_use]
    pub const fn is_dated(&self) -> bool {
        matches!(self, Self::Timeline | Self::Date | Self::CreationLog)
    }

    /// Kinds compared numerically when sorting.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric | Self::Rating)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl Serialize for FieldKind {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(self.as_tag())
    }
}

impl<'de> Deserialize<'de> for FieldKind {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag = String::deserialize(d)?;
        Ok(Self::from_tag(&tag))
    }
}

/// A typed value stored on an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    /// Field the value belongs to.
    pub id: FieldId,
    /// Display title of the field.
    #[serde(default)]
    pub title: String,
    /// Type tag.
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Raw JSON-encoded payload.
    #[serde(default)]
    pub value: Option<String>,
    /// Precomputed display text.
    #[serde(default)]
    pub text: Option<String>,
}

impl FieldValue {
    /// Display text trimmed, or `None` when blank.
    #[must_use]
    pub fn display_text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Whether the field carries anything at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let blank_value = self
            .value
            .as_deref()
            .is_none_or(|raw| matches!(raw.trim(), "" | "null" | "{}"));
        blank_value && self.display_text().is_none()
    }
}

/// Field (column) definition on a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field identifier.
    pub id: FieldId,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Type tag.
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Raw JSON settings.
    #[serde(default)]
    pub settings: Option<String>,
    /// Archived fields are ignored by mirror resolution.
    #[serde(default)]
    pub archived: bool,
}

/// Named bucket of items on a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group identifier.
    pub id: GroupId,
    /// Display title.
    pub title: String,
    /// Colour token.
    #[serde(default)]
    pub color: Option<String>,
    /// Ordering position on the board.
    #[serde(default)]
    pub position: i64,
}

/// One unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Item identifier.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Group the item sits in.
    #[serde(default)]
    pub group_id: Option<GroupId>,
    /// Field values, unique by id.
    #[serde(default)]
    pub fields: Vec<FieldValue>,
    /// Child items (one level).
    #[serde(default)]
    pub subitems: Vec<Item>,
}

impl Item {
    /// Look a field value up by id.
    #[must_use]
    pub fn field(&self, id: &FieldId) -> Option<&FieldValue> {
        self.fields.iter().find(|field| &field.id == id)
    }
}

/// Board metadata snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Board identifier.
    pub id: BoardId,
    /// Display name.
    pub name: String,
    /// Board kind as reported by the source (`public`, `private`, ...).
    #[serde(default)]
    pub kind: String,
    /// Field definitions in board order.
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    /// Groups in board order.
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl Board {
    /// Look a group up by id.
    #[must_use]
    pub fn group(&self, id: &GroupId) -> Option<&Group> {
        self.groups.iter().find(|group| &group.id == id)
    }

    /// Look a field definition up by id.
    #[must_use]
    pub fn field(&self, id: &FieldId) -> Option<&FieldDef> {
        self.fields.iter().find(|field| &field.id == id)
    }

    /// Group an item belongs to, if it exists on this board.
    #[must_use]
    pub fn group_of(&self, item: &Item) -> Option<&Group> {
        item.group_id.as_ref().and_then(|id| self.group(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_kind_tags_roundtrip_through_aliases() {
        assert_eq!(FieldKind::from_tag("numbers"), FieldKind::Numeric);
        assert_eq!(FieldKind::from_tag("lookup"), FieldKind::Mirror);
        assert_eq!(FieldKind::from_tag("LONG_TEXT"), FieldKind::Text);
        assert_eq!(FieldKind::from_tag("people"), FieldKind::Other("people".into()));
        assert_eq!(FieldKind::Numeric.as_tag(), "numeric");
    }

    #[test]
    fn item_deserializes_with_defaults() {
        let json = r#"{"id": 42, "name": "Ship it", "fields": [
            {"id": "timeline", "title": "Timeline", "type": "timeline",
             "value": "{\"from\":\"2024-01-10\",\"to\":\"2024-01-15\"}", "text": "Jan 10 - 15"}
        ]}"#;
        let item: Item = serde_json::from_str(json).unwrap_or_else(|err| panic!("item: {err}"));
        assert_eq!(item.id.as_str(), "42");
        assert!(item.group_id.is_none());
        assert!(item.subitems.is_empty());
        let field = item
            .field(&FieldId::from("timeline"))
            .unwrap_or_else(|| panic!("timeline field"));
        assert_eq!(field.kind, FieldKind::Timeline);
    }

    #[test]
    fn empty_values_are_detected() {
        let mut value = FieldValue {
            id: "f".into(),
            title: "F".into(),
            kind: FieldKind::Text,
            value: Some("null".into()),
            text: Some("  ".into()),
        };
        assert!(value.is_empty());
        value.text = Some("x".into());
        assert!(!value.is_empty());
    }
}
