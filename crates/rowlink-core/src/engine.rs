mod load;
mod related;
mod save;

use crate::{
    entity::EntityRef,
    error::Error,
    identity::Identity,
    sql::Statement,
    store::{Row, Store},
};
use std::{collections::BTreeSet, rc::Rc};
use tracing::{debug, trace};

///
/// Engine
///
/// Orchestrates save/load across an entity's type hierarchy: scalar rows
/// first, then relation reconciliation, then multiset commit. Synchronous
/// and single-threaded; the engine assumes exclusive ownership of an
/// entity's relation-group state for the duration of one call, and leaves
/// atomicity across the statements of one pass to the store.
///

pub struct Engine<S: Store> {
    registry: Rc<rowlink_schema::Registry>,
    store: S,
}

impl<S: Store> Engine<S> {
    #[must_use]
    pub const fn new(registry: Rc<rowlink_schema::Registry>, store: S) -> Self {
        Self { registry, store }
    }

    #[must_use]
    pub fn registry(&self) -> &rowlink_schema::Registry {
        &self.registry
    }

    /// Direct access to the store collaborator, for transaction control.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Tear the engine down into its store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    // ======================================================================
    // Statement boundary
    // ======================================================================

    pub(crate) fn run(&mut self, statement: &Statement) -> Result<u64, Error> {
        debug!(sql = %statement.sql, params = statement.params.len(), "execute");
        Ok(self.store.execute(statement)?)
    }

    pub(crate) fn fetch(&mut self, statement: &Statement) -> Result<Vec<Row>, Error> {
        trace!(sql = %statement.sql, params = statement.params.len(), "query");
        Ok(self.store.query(statement)?)
    }

    /// Resolve a peer's identity, saving it first when unpersisted. Carries
    /// the caller's visiting set so save cycles stay detectable.
    pub(crate) fn ensure_saved(
        &mut self,
        peer: &EntityRef,
        visiting: &mut BTreeSet<usize>,
    ) -> Result<Identity, Error> {
        let existing = peer.borrow().identity().cloned();
        match existing {
            Some(identity) => Ok(identity),
            None => self.save_inner(peer, visiting),
        }
    }
}
