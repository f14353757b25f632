
use crate::{
    entity::{EntityRef, PeerKey},
    multiset::RelationMultiset,
    value::Value,
};
use rowlink_schema::{RelationDef, RelationKind};
use std::{collections::BTreeMap, rc::Rc};

///
/// LoadState
///
/// Monotonic: `Unloaded -> Loaded`, never back. Marking an already-loaded
/// group is a no-op.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LoadState {
    #[default]
    Unloaded,
    Loaded,
}

///
/// RelationGroup
///
/// Per-instance state of one declared relation: the shared definition plus
/// the three bookkeeping multisets. `loaded` mirrors persisted rows,
/// `added` holds in-memory additions, `deleted` holds removals that must be
/// retracted from storage at the next save.
///

#[derive(Debug)]
pub struct RelationGroup {
    def: Rc<RelationDef>,
    load_state: LoadState,
    loaded: RelationMultiset,
    added: RelationMultiset,
    deleted: RelationMultiset,
}

impl RelationGroup {
    #[must_use]
    pub fn new(def: Rc<RelationDef>) -> Self {
        Self {
            def,
            load_state: LoadState::Unloaded,
            loaded: RelationMultiset::new(),
            added: RelationMultiset::new(),
            deleted: RelationMultiset::new(),
        }
    }

    #[must_use]
    pub fn def(&self) -> &RelationDef {
        &self.def
    }

    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self.load_state, LoadState::Loaded)
    }

    /// Mark the group as backed by a store read. Idempotent.
    pub fn mark_loaded(&mut self) {
        self.load_state = LoadState::Loaded;
    }

    /// True when the session has pending additions or removals.
    #[must_use]
    pub fn is_touched(&self) -> bool {
        !self.added.is_empty() || !self.deleted.is_empty()
    }

    // ======================================================================
    // Mutation
    // ======================================================================

    /// Add a peer. Many-to-one holds at most one peer, so any existing peer
    /// is cleared from `loaded` and `added` first (replacement semantics).
    /// Returns the group's total count after the add.
    pub fn add(&mut self, peer: &EntityRef, count: u64, meta: BTreeMap<String, Value>) -> u64 {
        if self.def.kind() == RelationKind::ManyToOne {
            self.loaded.clear();
            self.added.clear();
        }
        self.added.increment(peer, count, meta);

        self.loaded.total() + self.added.total()
    }

    /// Remove up to `count` of a peer: `added` first, any shortfall from
    /// `loaded`. The portion taken from `loaded` is recorded in `deleted`
    /// when `track_deletion` is set, so reconciliation retracts it.
    /// Returns how much was removed in total.
    pub fn remove(&mut self, peer: &EntityRef, count: u64, track_deletion: bool) -> u64 {
        // A peer persisted since it was added may still sit under its old
        // instance key; rekey first so the lookup sees one entry.
        self.added.rekey();
        self.loaded.rekey();
        let key = PeerKey::of(peer);

        let from_added = self.added.decrement(&key, count);
        let shortfall = count - from_added;
        if shortfall == 0 {
            return from_added;
        }

        let from_loaded = self.loaded.decrement(&key, shortfall);
        if track_deletion && from_loaded > 0 {
            self.deleted.increment(peer, from_loaded, BTreeMap::new());
        }

        from_added + from_loaded
    }

    // ======================================================================
    // Views
    // ======================================================================

    /// Fresh multiset = `loaded` merged with `added` (and optionally
    /// `deleted`); never mutates the group's own state.
    #[must_use]
    pub fn snapshot(&self, include_deleted: bool) -> RelationMultiset {
        let mut snapshot = self.loaded.clone();
        snapshot.merge(&self.added);
        if include_deleted {
            snapshot.merge(&self.deleted);
        }
        snapshot
    }

    #[must_use]
    pub const fn loaded(&self) -> &RelationMultiset {
        &self.loaded
    }

    #[must_use]
    pub const fn added(&self) -> &RelationMultiset {
        &self.added
    }

    #[must_use]
    pub const fn deleted(&self) -> &RelationMultiset {
        &self.deleted
    }

    pub(crate) fn loaded_mut(&mut self) -> &mut RelationMultiset {
        &mut self.loaded
    }

    // ======================================================================
    // Commit
    // ======================================================================

    /// Fold `added` into `loaded`, clear `added` and `deleted`, and mark
    /// the group loaded. Called once per save pass after writes succeed;
    /// idempotent. Entries are rekeyed so peers persisted during the pass
    /// are addressed by identity from now on.
    pub fn commit(&mut self) {
        self.loaded.merge(&self.added);
        self.loaded.rekey();
        self.added.clear();
        self.deleted.clear();
        self.load_state = LoadState::Loaded;
    }
}
