//! Cleaned form values.
//!
//! Field cleaning turns raw submitted strings into a [`Value`]. Text fields
//! clean to [`Value::String`], single model choices to [`Value::Int`] (or
//! [`Value::Null`] when left empty), and multiple choices to a
//! [`Value::List`] of ids.

use std::fmt;

use serde::Serialize;

/// A cleaned, typed form value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// No value (an empty optional choice).
    Null,
    /// A text value.
    String(String),
    /// An integer, typically a primary key.
    Int(i64),
    /// A list of values from a multi-valued field.
    List(Vec<Value>),
}

impl Value {
    /// Returns the string content, if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer, if this is an `Int`.
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the integer members of a `List`. Non-integer members are
    /// skipped; any other variant yields an empty vector.
    pub fn as_ids(&self) -> Vec<i64> {
        match self {
            Self::List(items) => items.iter().filter_map(Self::as_int).collect(),
            _ => Vec::new(),
        }
    }

    /// Returns `true` for `Null`, an empty string, or an empty list.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.is_empty(),
            Self::Int(_) => false,
            Self::List(items) => items.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::String(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join(", "))
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}
