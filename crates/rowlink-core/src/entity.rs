#[cfg(test)]
mod tests;

use crate::{
    error::Error,
    identity::Identity,
    multiset::RelationMultiset,
    relation::RelationGroup,
    timestamp::Timestamp,
    value::Value,
};
use rowlink_schema::{EntityDef, Registry, RelationKind};
use std::{
    cell::RefCell,
    collections::BTreeMap,
    rc::Rc,
};

/// Shared, single-threaded handle to one entity instance.
pub type EntityRef = Rc<RefCell<Entity>>;

/// Shared handle to one relation group instance.
pub type GroupRef = Rc<RefCell<RelationGroup>>;

///
/// PeerKey
///
/// Identity rule for multiset membership: two peers are the same key iff
/// both are persisted and share identity, or both are unpersisted and are
/// the same in-memory instance.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum PeerKey {
    Persisted(Identity),
    Instance(usize),
}

impl PeerKey {
    /// Key for an entity reference under its current persistence state.
    #[must_use]
    pub fn of(entity: &EntityRef) -> Self {
        let identity = entity.borrow().identity().cloned();
        match identity {
            Some(id) => Self::Persisted(id),
            None => Self::Instance(Rc::as_ptr(entity) as usize),
        }
    }
}

///
/// Entity
///
/// Dynamic record over a registered type: identity, timestamps, scalar
/// field values, and relation groups dual-indexed by (declaring type,
/// relation name) and (declaring type, relation kind). Both indexes share
/// the same group instances.
///

#[derive(Debug)]
pub struct Entity {
    /// Hierarchy defs, root ancestor first; the last entry is the concrete
    /// leaf type.
    defs: Vec<Rc<EntityDef>>,
    source: String,
    identity: Option<Identity>,
    created_at: Timestamp,
    altered_at: Timestamp,
    fields: BTreeMap<String, Value>,
    by_name: BTreeMap<(String, String), GroupRef>,
    by_kind: BTreeMap<(String, RelationKind), Vec<GroupRef>>,
}

impl Entity {
    /// Build a fresh, unpersisted instance of a registered type, with one
    /// group instance per relation declared anywhere in its hierarchy.
    pub fn spawn(registry: &Registry, type_name: &str) -> Result<EntityRef, Error> {
        let defs = registry.hierarchy_of(type_name)?;
        let source = defs
            .last()
            .map_or_else(|| EntityDef::DEFAULT_SOURCE.to_string(), |def| {
                def.source_name().to_string()
            });

        let mut by_name = BTreeMap::new();
        let mut by_kind: BTreeMap<(String, RelationKind), Vec<GroupRef>> = BTreeMap::new();

        for def in &defs {
            for relation in def.relations() {
                let group = Rc::new(RefCell::new(RelationGroup::new(relation.clone())));
                by_name.insert(
                    (def.name().to_string(), relation.name().to_string()),
                    group.clone(),
                );
                by_kind
                    .entry((def.name().to_string(), relation.kind()))
                    .or_default()
                    .push(group);
            }
        }

        let now = Timestamp::now();
        Ok(Rc::new(RefCell::new(Self {
            defs,
            source,
            identity: None,
            created_at: now,
            altered_at: now,
            fields: BTreeMap::new(),
            by_name,
            by_kind,
        })))
    }

    // ======================================================================
    // Identity & metadata
    // ======================================================================

    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        self.identity.is_some()
    }

    /// Assign the identity after the first persist. Re-binding the same
    /// identity is idempotent; changing it is forbidden.
    pub fn bind_identity(&mut self, identity: Identity) -> Result<(), Error> {
        match &self.identity {
            None => {
                self.identity = Some(identity);
                Ok(())
            }
            Some(existing) if *existing == identity => Ok(()),
            Some(existing) => Err(Error::entity_argument(format!(
                "identity is immutable once assigned: have {existing}, got {identity}"
            ))),
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        // spawn never produces an empty hierarchy
        self.defs.last().map_or("", |def| def.name())
    }

    #[must_use]
    pub fn defs(&self) -> &[Rc<EntityDef>] {
        &self.defs
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub const fn created_at(&self) -> Timestamp {
        self.created_at
    }

    #[must_use]
    pub const fn altered_at(&self) -> Timestamp {
        self.altered_at
    }

    pub(crate) fn touch(&mut self) {
        self.altered_at = Timestamp::now();
    }

    // ======================================================================
    // Scalar fields
    // ======================================================================

    /// Set one persisted scalar field. The field must be declared at some
    /// hierarchy level.
    pub fn set_field(&mut self, name: &str, value: impl Into<Value>) -> Result<(), Error> {
        if !self.defs.iter().any(|def| def.has_field(name)) {
            return Err(Error::entity_argument(format!(
                "field '{name}' is not declared for entity '{}'",
                self.type_name()
            )));
        }
        self.fields.insert(name.to_string(), value.into());
        Ok(())
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub(crate) fn set_field_raw(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }

    // ======================================================================
    // Relations
    // ======================================================================

    /// Resolve a relation group by name, searching leaf-to-root so the most
    /// derived declaration wins.
    pub fn group(&self, name: &str) -> Result<GroupRef, Error> {
        for def in self.defs.iter().rev() {
            if let Some(group) = self.by_name.get(&(def.name().to_string(), name.to_string())) {
                return Ok(group.clone());
            }
        }
        Err(Error::unknown_relation(self.type_name(), name))
    }

    /// Groups of one kind declared at the given hierarchy level.
    #[must_use]
    pub fn groups_declared(&self, type_name: &str, kind: RelationKind) -> Vec<GroupRef> {
        self.by_kind
            .get(&(type_name.to_string(), kind))
            .cloned()
            .unwrap_or_default()
    }

    /// Every group instance across the hierarchy.
    #[must_use]
    pub fn groups(&self) -> Vec<GroupRef> {
        self.by_name.values().cloned().collect()
    }

    /// Add a peer to a named relation. Returns the relation's total count
    /// after the add, so callers can check it against `max_count` early;
    /// the binding check runs at save time.
    pub fn add_related(
        &mut self,
        name: &str,
        peer: &EntityRef,
        count: u64,
        meta: BTreeMap<String, Value>,
    ) -> Result<u64, Error> {
        let group = self.group(name)?;
        let total = group.borrow_mut().add(peer, count, meta);
        Ok(total)
    }

    /// Remove a peer from a named relation, tracking the deletion so that
    /// reconciliation retracts it from storage. Returns how much was
    /// removed.
    pub fn remove_related(
        &mut self,
        name: &str,
        peer: &EntityRef,
        count: u64,
    ) -> Result<u64, Error> {
        let group = self.group(name)?;
        let removed = group.borrow_mut().remove(peer, count, true);
        Ok(removed)
    }

    /// Current in-memory view of a named relation (`loaded` + `added`).
    /// Does not touch the store; use the engine's `related` for lazy reads.
    pub fn snapshot_related(&self, name: &str) -> Result<RelationMultiset, Error> {
        let group = self.group(name)?;
        let snapshot = group.borrow().snapshot(false);
        Ok(snapshot)
    }
}
