use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// Identity
///
/// Opaque persisted key for one entity. Absent until first persisted; once
/// assigned it never changes. Ordered and hashable so it can key maps.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Identity {
    Int(i64),
    Text(String),
}

impl Identity {
    /// The identity as a statement parameter.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(n) => Value::Int(*n),
            Self::Text(s) => Value::Text(s.clone()),
        }
    }

    /// Read an identity back from a row cell, if the cell holds one.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(n) => Some(Self::Int(*n)),
            Value::Uint(n) => i64::try_from(*n).ok().map(Self::Int),
            Value::Text(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Identity {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}
