//! Identifier newtypes for boards, items, fields and groups.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{convert::Infallible, fmt, str::FromStr};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier string.
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Borrow the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_owned()))
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                s.serialize_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(d: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                // Remote sources hand out ids as either strings or numbers.
                match serde_json::Value::deserialize(d)? {
                    serde_json::Value::String(s) => Ok(Self(s)),
                    serde_json::Value::Number(n) => Ok(Self(n.to_string())),
                    other => Err(serde::de::Error::custom(format!(
                        "expected string or number identifier, got {other}"
                    ))),
                }
            }
        }
    };
}

string_id!(
    /// Identifier of a board.
    BoardId
);
string_id!(
    /// Identifier of an item (and of the task derived from it).
    ItemId
);
string_id!(
    /// Identifier of a field (column) on a board.
    FieldId
);
string_id!(
    /// Identifier of a group on a board.
    GroupId
);
