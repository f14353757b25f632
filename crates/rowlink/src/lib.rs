//! rowlink — typed entity relationships over a relational store
//!
//! This is the public meta-crate. Downstream users depend on **rowlink**
//! only.
//!
//! It re-exports the stable public API from:
//!   - `rowlink-schema`  (entity and relation descriptors, registry, naming)
//!   - `rowlink-core`    (entities, relation groups, SQL builder, engine)

pub use rowlink_core as core;
pub use rowlink_schema as schema;

pub use rowlink_core::{Error, ErrorKind, ErrorOrigin};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//
// Prelude
//

pub mod prelude {
    pub use rowlink_core::prelude::*;
}
