//! Design-time schema for rowlink: entity and relation descriptors, the
//! registry that owns them, and the table/column naming convention.
//!
//! Everything here is built explicitly at application start and validated
//! at registration time. The runtime never introspects types; it is handed
//! a [`Registry`] and trusts it.

pub mod entity;
pub mod error;
pub mod ident;
pub mod naming;
pub mod registry;
pub mod relation;

pub use entity::EntityDef;
pub use error::SchemaError;
pub use registry::Registry;
pub use relation::{RelationDef, RelationKind, RelationSpec};
