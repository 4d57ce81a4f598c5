//! Typed decoding of field payloads and the semantic extractors built on it.
//!
//! Every decoder returns a [`DecodeError`] on malformed input; the extractors in
//! this module are the only place where the documented defaults are applied.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use time::Date;
use tracing::debug;

use crate::board::{Board, FieldDef, FieldKind, FieldValue, Item};
use crate::date::{DateRange, parse_date, parse_timestamp_date};
use crate::error::DecodeError;
use crate::id::FieldId;
use crate::mirror::MirrorDatum;

/// Colour used when nothing else resolves.
pub const DEFAULT_COLOR: &str = "#579bfc";
/// Group label used when nothing else resolves.
pub const NO_GROUP: &str = "No Group";

const PROGRESS_MARKERS: [&str; 3] = ["progress", "complete", "%"];

/// Decoded field payload, one variant per recognized type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPayload {
    /// Independent start/end dates.
    Timeline {
        /// Start day.
        from: Option<Date>,
        /// End day.
        to: Option<Date>,
    },
    /// Single day.
    Date(Date),
    /// Plain number.
    Numeric(f64),
    /// Rating value.
    Rating(f64),
    /// Status with palette index and display label.
    Status {
        /// Palette index.
        index: Option<u32>,
        /// Display label.
        label: Option<String>,
    },
    /// Colour token, or a palette index to resolve through field settings.
    Color {
        /// Explicit colour token.
        token: Option<String>,
        /// Palette index.
        index: Option<u32>,
    },
    /// Selected labels.
    Dropdown(Vec<String>),
    /// Free text.
    Text(String),
    /// Structured mirror payload.
    Mirror(Value),
    /// Creation day.
    Created(Date),
    /// Payload of a kind this crate does not interpret.
    Unrecognized(String),
}

impl FieldPayload {
    /// Display label carried by the payload, if the kind has one.
    #[must_use]
    pub fn label(&self) -> Option<String> {
        match self {
            Self::Status { label, .. } => label.clone(),
            Self::Dropdown(labels) if !labels.is_empty() => Some(labels.join(", ")),
            Self::Text(text) | Self::Unrecognized(text) => Some(text.clone()),
            Self::Numeric(n) | Self::Rating(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct TimelineRaw {
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
}

#[derive(Deserialize)]
struct DateRaw {
    date: Option<String>,
}

#[derive(Deserialize)]
struct CreationRaw {
    created_at: Option<String>,
}

#[derive(Deserialize)]
struct RatingRaw {
    rating: Option<Value>,
}

#[derive(Deserialize)]
struct IndexedRaw {
    #[serde(default)]
    index: Option<u32>,
    #[serde(default)]
    color: Option<String>,
}

impl FieldValue {
    /// Decode the raw payload according to the field's type tag.
    ///
    /// # Errors
    /// Returns a [`DecodeError`] when the payload is missing or does not match the
    /// encoding of the declared type.
    pub fn decode(&self) -> Result<FieldPayload, DecodeError> {
        let kind = &self.kind;
        if let FieldKind::Other(_) = kind {
            let raw = self
                .display_text()
                .or(self.value.as_deref())
                .ok_or_else(|| DecodeError::MissingPayload { kind: kind.clone() })?;
            return Ok(FieldPayload::Unrecognized(raw.to_owned()));
        }

        let raw = self
            .value
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .ok_or_else(|| DecodeError::MissingPayload { kind: kind.clone() })?;
        let json: Value = serde_json::from_str(raw).map_err(|source| DecodeError::Json {
            kind: kind.clone(),
            source,
        })?;
        if json.is_null() {
            return Err(DecodeError::MissingPayload { kind: kind.clone() });
        }

        match kind {
            FieldKind::Timeline => {
                let parsed: TimelineRaw = from_value(kind, json)?;
                Ok(FieldPayload::Timeline {
                    from: optional_date(parsed.from.as_deref())?,
                    to: optional_date(parsed.to.as_deref())?,
                })
            }
            FieldKind::Date => {
                let parsed: DateRaw = from_value(kind, json)?;
                let raw = parsed
                    .date
                    .ok_or_else(|| DecodeError::MissingPayload { kind: kind.clone() })?;
                Ok(FieldPayload::Date(parse_date(&raw)?))
            }
            FieldKind::CreationLog => {
                let parsed: CreationRaw = from_value(kind, json)?;
                let raw = parsed
                    .created_at
                    .ok_or_else(|| DecodeError::MissingPayload { kind: kind.clone() })?;
                Ok(FieldPayload::Created(parse_timestamp_date(&raw)?))
            }
            FieldKind::Numeric => Ok(FieldPayload::Numeric(number(&json)?)),
            FieldKind::Rating => {
                let parsed: RatingRaw = from_value(kind, json)?;
                let rating = parsed
                    .rating
                    .ok_or_else(|| DecodeError::MissingPayload { kind: kind.clone() })?;
                Ok(FieldPayload::Rating(number(&rating)?))
            }
            FieldKind::Status => {
                let parsed: IndexedRaw = from_value(kind, json)?;
                Ok(FieldPayload::Status {
                    index: parsed.index,
                    label: self.display_text().map(str::to_owned),
                })
            }
            FieldKind::Color => {
                let parsed: IndexedRaw = from_value(kind, json)?;
                if parsed.color.is_none() && parsed.index.is_none() {
                    return Err(DecodeError::UnexpectedShape { kind: kind.clone() });
                }
                Ok(FieldPayload::Color {
                    token: parsed.color,
                    index: parsed.index,
                })
            }
            FieldKind::Dropdown => {
                if !json.is_object() {
                    return Err(DecodeError::UnexpectedShape { kind: kind.clone() });
                }
                let labels = self
                    .display_text()
                    .map(|text| {
                        text.split(',')
                            .map(str::trim)
                            .filter(|label| !label.is_empty())
                            .map(str::to_owned)
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(FieldPayload::Dropdown(labels))
            }
            FieldKind::Text => match json {
                Value::String(text) => Ok(FieldPayload::Text(text)),
                _ => Err(DecodeError::UnexpectedShape { kind: kind.clone() }),
            },
            FieldKind::Mirror => Ok(FieldPayload::Mirror(json)),
            FieldKind::Other(_) => Err(DecodeError::UnexpectedShape { kind: kind.clone() }),
        }
    }

    /// Decode as a number (numeric or rating kinds).
    ///
    /// # Errors
    /// Returns a [`DecodeError`] when the payload is not numeric.
    pub fn decode_number(&self) -> Result<f64, DecodeError> {
        match self.decode()? {
            FieldPayload::Numeric(n) | FieldPayload::Rating(n) => Ok(n),
            _ => Err(DecodeError::UnexpectedShape {
                kind: self.kind.clone(),
            }),
        }
    }
}

fn from_value<T>(kind: &FieldKind, json: Value) -> Result<T, DecodeError>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_value(json).map_err(|source| DecodeError::Json {
        kind: kind.clone(),
        source,
    })
}

fn optional_date(raw: Option<&str>) -> Result<Option<Date>, DecodeError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date(value).map(Some),
    }
}

fn number(json: &Value) -> Result<f64, DecodeError> {
    let parsed = match json {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|n| n.is_finite())
        .ok_or_else(|| DecodeError::InvalidNumber {
            raw: json.to_string(),
        })
}

/// Decode the item's date range.
///
/// Uses `explicit` when given; otherwise the first timeline, date, or
/// creation-log field. Every failure yields [`DateRange::EMPTY`].
#[must_use]
pub fn extract_timeline_range(item: &Item, explicit: Option<&FieldId>) -> DateRange {
    let field = explicit.map_or_else(
        || item.fields.iter().find(|field| field.kind.is_dated()),
        |id| item.field(id),
    );
    let Some(field) = field else {
        return DateRange::EMPTY;
    };
    match field.decode() {
        Ok(FieldPayload::Timeline { from, to }) => DateRange { start: from, end: to },
        Ok(FieldPayload::Date(day) | FieldPayload::Created(day)) => DateRange::single(day),
        Ok(_) => DateRange::EMPTY,
        Err(err) => {
            debug!(item = %item.id, field = %field.id, "timeline decode failed: {err}");
            DateRange::EMPTY
        }
    }
}

/// Progress percentage in `[0, 100]`; 0 when no progress field decodes.
#[must_use]
pub fn extract_progress(item: &Item) -> f64 {
    let Some(field) = item.fields.iter().find(|field| {
        field.kind == FieldKind::Numeric && {
            let title = field.title.to_lowercase();
            PROGRESS_MARKERS.iter().any(|marker| title.contains(marker))
        }
    }) else {
        return 0.0;
    };
    field.decode_number().map_or(0.0, |n| n.clamp(0.0, 100.0))
}

/// Colour token for a task bar.
///
/// With an explicit field: mirror data first, then the item's own field, then the
/// item's group colour. Without: group colour. [`DEFAULT_COLOR`] when all fail.
#[must_use]
pub fn extract_color(
    item: &Item,
    board: &Board,
    explicit: Option<&FieldId>,
    mirror_data: &BTreeMap<FieldId, MirrorDatum>,
) -> String {
    let from_field = explicit.and_then(|id| {
        mirror_data
            .get(id)
            .map(|datum| datum.display_value.trim())
            .filter(|value| looks_like_color(value))
            .map(str::to_owned)
            .or_else(|| {
                item.field(id)
                    .and_then(|field| field_color(field, board.field(id)))
            })
    });
    from_field
        .or_else(|| {
            board
                .group_of(item)
                .and_then(|group| group.color.clone())
                .filter(|color| !color.trim().is_empty())
        })
        .unwrap_or_else(|| DEFAULT_COLOR.to_owned())
}

/// Group label for a task.
///
/// With an explicit field: mirror data first, then the item's own field label.
/// Falls back to the item's group title and finally [`NO_GROUP`].
#[must_use]
pub fn extract_group(
    item: &Item,
    board: &Board,
    explicit: Option<&FieldId>,
    mirror_data: &BTreeMap<FieldId, MirrorDatum>,
) -> String {
    let from_field = explicit.and_then(|id| {
        mirror_data
            .get(id)
            .map(|datum| datum.display_value.trim().to_owned())
            .filter(|label| !label.is_empty())
            .or_else(|| item.field(id).and_then(field_label))
    });
    from_field
        .or_else(|| {
            board
                .group_of(item)
                .map(|group| group.title.trim().to_owned())
                .filter(|title| !title.is_empty())
        })
        .unwrap_or_else(|| NO_GROUP.to_owned())
}

/// Display label for a field: decoded label when available, else its display text.
#[must_use]
pub fn field_label(field: &FieldValue) -> Option<String> {
    let decoded = match field.decode() {
        Ok(payload) => payload.label(),
        Err(err) => {
            debug!(field = %field.id, "label decode failed: {err}");
            None
        }
    };
    decoded
        .map(|label| label.trim().to_owned())
        .filter(|label| !label.is_empty())
        .or_else(|| field.display_text().map(str::to_owned))
}

fn field_color(field: &FieldValue, def: Option<&FieldDef>) -> Option<String> {
    match field.decode() {
        Ok(FieldPayload::Color {
            token: Some(token), ..
        }) if !token.trim().is_empty() => Some(token),
        Ok(
            FieldPayload::Color {
                index: Some(index), ..
            }
            | FieldPayload::Status {
                index: Some(index), ..
            },
        ) => def.and_then(|def| palette_color(def, index)),
        Ok(_) => None,
        Err(err) => {
            debug!(field = %field.id, "colour decode failed: {err}");
            None
        }
    }
}

#[derive(Deserialize)]
struct PaletteSettings {
    #[serde(default)]
    labels_colors: BTreeMap<String, PaletteEntry>,
}

#[derive(Deserialize)]
struct PaletteEntry {
    color: String,
}

fn palette_color(def: &FieldDef, index: u32) -> Option<String> {
    let settings = def.settings.as_deref()?;
    let parsed: PaletteSettings = serde_json::from_str(settings).ok()?;
    parsed
        .labels_colors
        .get(&index.to_string())
        .map(|entry| entry.color.clone())
}

fn looks_like_color(value: &str) -> bool {
    value.starts_with('#') || value.starts_with("rgb") || value.starts_with("var(")
}
