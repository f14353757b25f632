
use crate::{
    entity::{EntityRef, PeerKey},
    value::Value,
};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// MultisetError
///
/// Caller faults on the signed entry points. The unsigned operations make
/// negative deltas unrepresentable.
///

#[derive(Debug, ThisError)]
pub enum MultisetError {
    #[error("negative multiset delta: {delta}")]
    NegativeDelta { delta: i64 },
}

///
/// MultisetEntry
///
/// One counted peer: the shared entity reference, a count >= 1, and the
/// per-pair junction metadata. Count-zero entries are never stored.
///

#[derive(Clone, Debug)]
pub struct MultisetEntry {
    pub peer: EntityRef,
    pub count: u64,
    pub meta: BTreeMap<String, Value>,
}

///
/// RelationMultiset
///
/// Counted multiset of related-entity references, peer-key unique. The
/// atomic bookkeeping unit behind every relation group.
///

#[derive(Clone, Debug, Default)]
pub struct RelationMultiset {
    entries: BTreeMap<PeerKey, MultisetEntry>,
}

impl RelationMultiset {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored count for one peer key; 0 when absent.
    #[must_use]
    pub fn get(&self, key: &PeerKey) -> u64 {
        self.entries.get(key).map_or(0, |e| e.count)
    }

    #[must_use]
    pub fn entry(&self, key: &PeerKey) -> Option<&MultisetEntry> {
        self.entries.get(key)
    }

    /// Replace the count for a peer and merge metadata; count 0 removes.
    pub fn set(&mut self, peer: &EntityRef, count: u64, meta: BTreeMap<String, Value>) {
        let key = PeerKey::of(peer);
        if count == 0 {
            self.entries.remove(&key);
            return;
        }
        let entry = self.entries.entry(key).or_insert_with(|| MultisetEntry {
            peer: peer.clone(),
            count: 0,
            meta: BTreeMap::new(),
        });
        entry.count = count;
        entry.meta.extend(meta);
    }

    /// Add `delta` to the stored count, merging metadata. Returns the new
    /// count. A zero delta reads without creating an entry.
    pub fn increment(&mut self, peer: &EntityRef, delta: u64, meta: BTreeMap<String, Value>) -> u64 {
        let key = PeerKey::of(peer);
        if delta == 0 {
            return self.get(&key);
        }
        let entry = self.entries.entry(key).or_insert_with(|| MultisetEntry {
            peer: peer.clone(),
            count: 0,
            meta: BTreeMap::new(),
        });
        entry.count += delta;
        entry.meta.extend(meta);
        entry.count
    }

    /// Remove up to `delta` from the stored count, never going below zero;
    /// reaching zero removes the entry. Returns how much was removed.
    pub fn decrement(&mut self, key: &PeerKey, delta: u64) -> u64 {
        let Some(entry) = self.entries.get_mut(key) else {
            return 0;
        };
        if entry.count <= delta {
            let removed = entry.count;
            self.entries.remove(key);
            removed
        } else {
            entry.count -= delta;
            delta
        }
    }

    /// Signed front end for [`Self::increment`]; negative deltas are a
    /// caller fault.
    pub fn increment_signed(
        &mut self,
        peer: &EntityRef,
        delta: i64,
        meta: BTreeMap<String, Value>,
    ) -> Result<u64, MultisetError> {
        let delta = u64::try_from(delta).map_err(|_| MultisetError::NegativeDelta { delta })?;
        Ok(self.increment(peer, delta, meta))
    }

    /// Signed front end for [`Self::decrement`].
    pub fn decrement_signed(&mut self, key: &PeerKey, delta: i64) -> Result<u64, MultisetError> {
        let delta = u64::try_from(delta).map_err(|_| MultisetError::NegativeDelta { delta })?;
        Ok(self.decrement(key, delta))
    }

    /// Unconditional removal.
    pub fn remove(&mut self, key: &PeerKey) {
        self.entries.remove(key);
    }

    /// Fold `other` into this multiset: every key's count and metadata are
    /// added. Commutative and associative over the set of counts.
    pub fn merge(&mut self, other: &Self) -> &mut Self {
        for entry in other.entries.values() {
            self.increment(&entry.peer, entry.count, entry.meta.clone());
        }
        self
    }

    /// Sum of all counts: how many related rows, counting duplicates.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.entries.values().map(|e| e.count).sum()
    }

    /// Stable, restartable iteration over the stored entries.
    pub fn entries(&self) -> impl Iterator<Item = (&PeerKey, &MultisetEntry)> {
        self.entries.iter()
    }

    /// Key-to-count projection, for comparisons that ignore references and
    /// metadata.
    #[must_use]
    pub fn counts(&self) -> BTreeMap<PeerKey, u64> {
        self.entries
            .iter()
            .map(|(k, e)| (k.clone(), e.count))
            .collect()
    }

    /// Rebuild every entry under its peer's current key, merging entries
    /// that collide. Peers saved mid-session move from instance keys to
    /// identity keys; this keeps committed state addressable.
    pub fn rekey(&mut self) {
        let stale = std::mem::take(&mut self.entries);
        for entry in stale.into_values() {
            self.increment(&entry.peer, entry.count, entry.meta);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
