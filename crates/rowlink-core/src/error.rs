use crate::{multiset::MultisetError, sql::BuilderError, store::StoreError};
use rowlink_schema::SchemaError;
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Structured runtime error with a stable kind + origin taxonomy.
/// Configuration kinds (InvalidConfiguration, UnknownEntity,
/// UnknownRelation, InvalidArgument) are programmer errors and fail fast;
/// ConstraintViolation and NotFound are expected, recoverable outcomes;
/// Storage is opaque pass-through from the store collaborator.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    /// Construct an engine-origin constraint violation.
    pub(crate) fn constraint(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConstraintViolation, ErrorOrigin::Engine, message)
    }

    /// Construct an engine-origin not-found error.
    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, ErrorOrigin::Engine, message)
    }

    /// Construct an entity-origin unknown-relation error.
    pub(crate) fn unknown_relation(entity: &str, relation: &str) -> Self {
        Self::new(
            ErrorKind::UnknownRelation,
            ErrorOrigin::Entity,
            format!("relation '{relation}' is not registered for entity '{entity}'"),
        )
    }

    /// Construct an entity-origin invalid-argument error.
    pub(crate) fn entity_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, ErrorOrigin::Entity, message)
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.kind, ErrorKind::NotFound)
    }

    #[must_use]
    pub const fn is_constraint_violation(&self) -> bool {
        matches!(self.kind, ErrorKind::ConstraintViolation)
    }

    #[must_use]
    pub fn display_with_kind(&self) -> String {
        format!("{}:{}: {}", self.origin, self.kind, self.message)
    }
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        let kind = if err.is_unknown_entity() {
            ErrorKind::UnknownEntity
        } else {
            ErrorKind::InvalidConfiguration
        };
        Self::new(kind, ErrorOrigin::Schema, err.to_string())
    }
}

impl From<MultisetError> for Error {
    fn from(err: MultisetError) -> Self {
        Self::new(
            ErrorKind::InvalidArgument,
            ErrorOrigin::Relation,
            err.to_string(),
        )
    }
}

impl From<BuilderError> for Error {
    fn from(err: BuilderError) -> Self {
        Self::new(
            ErrorKind::InvalidArgument,
            ErrorOrigin::Sql,
            err.to_string(),
        )
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Self::new(ErrorKind::Storage, ErrorOrigin::Store, err.to_string())
    }
}

///
/// ErrorKind
/// Stable classification callers branch on.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Bad relation or entity registration parameters.
    InvalidConfiguration,

    /// Entity type not present in the registry.
    UnknownEntity,

    /// Relation name not registered for the type.
    UnknownRelation,

    /// Cardinality bounds breached, or an unresolvable save cycle.
    ConstraintViolation,

    /// Load found no base-level row.
    NotFound,

    /// Negative multiset delta, builder misuse, or similar caller fault.
    InvalidArgument,

    /// Underlying store call failed; opaque, passed through untouched.
    Storage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InvalidConfiguration => "invalid_configuration",
            Self::UnknownEntity => "unknown_entity",
            Self::UnknownRelation => "unknown_relation",
            Self::ConstraintViolation => "constraint_violation",
            Self::NotFound => "not_found",
            Self::InvalidArgument => "invalid_argument",
            Self::Storage => "storage",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Which layer raised the error.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Schema,
    Relation,
    Entity,
    Engine,
    Sql,
    Store,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Schema => "schema",
            Self::Relation => "relation",
            Self::Entity => "entity",
            Self::Engine => "engine",
            Self::Sql => "sql",
            Self::Store => "store",
        };
        write!(f, "{label}")
    }
}
