//! Error types for field decoding and drag gestures.

use thiserror::Error;

use crate::board::FieldKind;

/// A field payload did not match the encoding of its declared type.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The field carries no payload.
    #[error("{kind} field has no payload")]
    MissingPayload {
        /// Declared type of the field.
        kind: FieldKind,
    },

    /// The payload is not valid JSON.
    #[error("{kind} payload is not valid JSON: {source}")]
    Json {
        /// Declared type of the field.
        kind: FieldKind,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },

    /// A date string could not be parsed.
    #[error("invalid date '{raw}'")]
    InvalidDate {
        /// Offending input.
        raw: String,
    },

    /// A numeric payload could not be parsed.
    #[error("invalid number '{raw}'")]
    InvalidNumber {
        /// Offending input.
        raw: String,
    },

    /// The JSON is well-formed but has an unexpected structure.
    #[error("{kind} payload has unexpected shape")]
    UnexpectedShape {
        /// Declared type of the field.
        kind: FieldKind,
    },
}

/// A drag gesture could not be started.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DragError {
    /// Another drag is already in progress.
    #[error("a drag is already in progress for task {0}")]
    AlreadyDragging(String),

    /// The task lacks a start or an end date.
    #[error("task {0} has no complete date range to drag")]
    IncompleteRange(String),

    /// The pixel scale is zero, negative, or not finite.
    #[error("invalid timeline scale")]
    InvalidScale,
}
