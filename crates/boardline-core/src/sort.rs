//! Total ordering of tasks across heterogeneous sort keys.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::board::FieldValue;
use crate::field::field_label;
use crate::id::FieldId;
use crate::task::Task;

/// Direction of an ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending, absent values last.
    #[default]
    Asc,
    /// Exact reversal of ascending.
    Desc,
}

impl SortDirection {
    /// Apply the direction to an ascending comparison.
    #[must_use]
    pub const fn apply(self, ascending: Ordering) -> Ordering {
        match self {
            Self::Asc => ascending,
            Self::Desc => ascending.reverse(),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort direction '{other}' (expected asc or desc)")),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        })
    }
}

/// What tasks are ordered by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    /// Task name.
    Name,
    /// Start date.
    StartDate,
    /// End date.
    EndDate,
    /// Value of a field on the originating item.
    Field(FieldId),
}

impl SortKey {
    /// Interpret a configured sort column.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "name" => Self::Name,
            "start_date" => Self::StartDate,
            "end_date" => Self::EndDate,
            other => Self::Field(FieldId::from(other)),
        }
    }
}

#[derive(Debug)]
enum SortValue {
    Number(f64),
    Text(String),
}

fn field_value(task: &Task, id: &FieldId) -> Option<SortValue> {
    sort_value(task.item.field(id)?)
}

/// Blank non-numeric fields count as absent; numeric fields fall back to zero.
fn sort_value(field: &FieldValue) -> Option<SortValue> {
    if field.kind.is_numeric() {
        return Some(SortValue::Number(field.decode_number().unwrap_or(0.0)));
    }
    if field.is_empty() {
        return None;
    }
    field_label(field)
        .map(|text| text.trim().to_lowercase())
        .filter(|text| !text.is_empty())
        .map(SortValue::Text)
}

fn compare_values(a: &SortValue, b: &SortValue) -> Ordering {
    match (a, b) {
        (SortValue::Number(x), SortValue::Number(y)) => x.total_cmp(y),
        (SortValue::Text(x), SortValue::Text(y)) => x.cmp(y),
        (SortValue::Number(_), SortValue::Text(_)) => Ordering::Less,
        (SortValue::Text(_), SortValue::Number(_)) => Ordering::Greater,
    }
}

/// Absent values sort after present ones.
fn absent_last<T>(a: Option<T>, b: Option<T>, cmp: impl FnOnce(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(&x, &y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_ascending(a: &Task, b: &Task, key: &SortKey) -> Ordering {
    let primary = match key {
        SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortKey::StartDate => absent_last(a.range.start, b.range.start, Ord::cmp),
        SortKey::EndDate => absent_last(a.range.end, b.range.end, Ord::cmp),
        SortKey::Field(id) => absent_last(field_value(a, id), field_value(b, id), compare_values),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

/// Compare two tasks under `key` and `direction`.
///
/// Descending is the reversal of ascending; ties on the key fall back to task id,
/// which makes the order total.
#[must_use]
pub fn compare_tasks(a: &Task, b: &Task, key: &SortKey, direction: SortDirection) -> Ordering {
    direction.apply(compare_ascending(a, b, key))
}

/// Sort tasks in place.
pub fn sort_tasks(tasks: &mut [Task], key: &SortKey, direction: SortDirection) {
    tasks.sort_by(|a, b| compare_tasks(a, b, key, direction));
}
