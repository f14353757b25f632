//! Runtime core for rowlink: value and identity types, the counted
//! relation multiset, relation groups, dynamic entities, the SQL statement
//! builder, the store contract, and the save/load reconciliation engine.

pub mod engine;
pub mod entity;
pub mod error;
pub mod identity;
pub mod multiset;
pub mod relation;
pub mod sql;
pub mod store;
pub mod timestamp;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Error, ErrorKind, ErrorOrigin};

///
/// Prelude
///
/// Domain vocabulary only; executors and errors are imported explicitly.
///

pub mod prelude {
    pub use crate::{
        engine::Engine,
        entity::{Entity, EntityRef, PeerKey},
        identity::Identity,
        multiset::RelationMultiset,
        relation::{LoadState, RelationGroup},
        store::{Row, Store},
        timestamp::Timestamp,
        value::Value,
    };
    pub use rowlink_schema::{EntityDef, Registry, RelationDef, RelationKind};
}
