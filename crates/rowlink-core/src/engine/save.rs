use super::Engine;
use crate::{
    entity::{EntityRef, GroupRef, PeerKey},
    error::Error,
    identity::Identity,
    sql::StatementBuilder,
    store::Store,
    value::Value,
};
use rowlink_schema::{EntityDef, RelationKind, naming};
use std::{
    collections::{BTreeMap, BTreeSet},
    rc::Rc,
};

// One many-to-many reconciliation unit: a peer's counts across the three
// multisets plus its merged metadata.
struct JunctionItem {
    peer: EntityRef,
    loaded: u64,
    added: u64,
    deleted: u64,
    meta: BTreeMap<String, Value>,
}

impl<S: Store> Engine<S> {
    /// Persist one entity: scalar rows root-to-leaf (many-to-one foreign
    /// keys resolved first), then relation reconciliation, then commit.
    /// Returns the entity's identity, generating it on first persist.
    pub fn save(&mut self, entity: &EntityRef) -> Result<Identity, Error> {
        let mut visiting = BTreeSet::new();
        self.save_inner(entity, &mut visiting)
    }

    pub(crate) fn save_inner(
        &mut self,
        entity: &EntityRef,
        visiting: &mut BTreeSet<usize>,
    ) -> Result<Identity, Error> {
        let addr = Rc::as_ptr(entity) as usize;
        if !visiting.insert(addr) {
            return Err(Error::constraint(format!(
                "cyclic many-to-one save detected at entity '{}'",
                entity.borrow().type_name()
            )));
        }

        let result = self.save_levels(entity, visiting);
        visiting.remove(&addr);
        result
    }

    fn save_levels(
        &mut self,
        entity: &EntityRef,
        visiting: &mut BTreeSet<usize>,
    ) -> Result<Identity, Error> {
        let defs = entity.borrow().defs().to_vec();
        let fresh = !entity.borrow().is_persisted();

        self.check_cardinality(entity, fresh)?;

        // Scalar rows, root ancestor first. Level 0 generates the identity
        // on first persist; child levels carry the hierarchy key.
        for (level, def) in defs.iter().enumerate() {
            let parent = level.checked_sub(1).map(|i| defs[i].name().to_string());
            self.write_level(entity, def, parent.as_deref(), fresh, visiting)?;
        }

        let identity = entity
            .borrow()
            .identity()
            .cloned()
            .ok_or_else(|| Error::constraint("save produced no identity"))?;

        // Relation writes, after every scalar row exists.
        for def in &defs {
            let groups = entity
                .borrow()
                .groups_declared(def.name(), RelationKind::OneToMany);
            for group in groups {
                self.reconcile_one_to_many(&identity, &group, visiting)?;
            }

            let groups = entity
                .borrow()
                .groups_declared(def.name(), RelationKind::ManyToMany);
            for group in groups {
                self.reconcile_many_to_many(&identity, &group, visiting)?;
            }
        }

        // Commit every group this pass wrote (many-to-one included, so
        // `added` folds into `loaded` and a later lazy read cannot double
        // the peer). A skipped group stays Unloaded: its storage state is
        // still unknown, and committing would make later lazy reads return
        // nothing.
        let groups = entity.borrow().groups();
        for group in groups {
            let mut group = group.borrow_mut();
            if fresh || group.is_loaded() || group.is_touched() {
                group.commit();
            }
        }
        entity.borrow_mut().touch();

        Ok(identity)
    }

    // Save-time cardinality enforcement: the effective count of every group
    // must sit within its declared bounds before any write is issued. An
    // untouched, never-read group on an already-persisted entity holds no
    // in-memory truth and is skipped.
    fn check_cardinality(&self, entity: &EntityRef, fresh: bool) -> Result<(), Error> {
        let groups = entity.borrow().groups();
        for group in groups {
            let group = group.borrow();
            if !fresh && !group.is_loaded() && !group.is_touched() {
                continue;
            }
            let def = group.def();
            let count = group.snapshot(false).total();

            if count < def.min_count() {
                return Err(Error::constraint(format!(
                    "relation '{}' on '{}' holds {count} peers, below min_count {}",
                    def.name(),
                    def.owner_type(),
                    def.min_count()
                )));
            }
            if let Some(max) = def.max_count() {
                if count > max {
                    return Err(Error::constraint(format!(
                        "relation '{}' on '{}' holds {count} peers, above max_count {max}",
                        def.name(),
                        def.owner_type()
                    )));
                }
            }
        }
        Ok(())
    }

    // Write one hierarchy level's scalar row. Many-to-one resolution must
    // complete before the owning row is written, so the foreign-key cells
    // join the column set here.
    fn write_level(
        &mut self,
        entity: &EntityRef,
        def: &Rc<EntityDef>,
        parent: Option<&str>,
        fresh: bool,
        visiting: &mut BTreeSet<usize>,
    ) -> Result<(), Error> {
        let mut columns: Vec<(String, Value)> = Vec::new();
        {
            let entity = entity.borrow();
            for field in def.fields() {
                if let Some(value) = entity.field(field) {
                    columns.push((field.clone(), value.clone()));
                }
            }
        }

        let mto_groups = entity
            .borrow()
            .groups_declared(def.name(), RelationKind::ManyToOne);
        for group in mto_groups {
            let (fk, peer) = {
                let group = group.borrow();
                // An untouched, never-read group says nothing about the
                // stored foreign key; writing Null here would clobber it.
                if !fresh && !group.is_loaded() && !group.is_touched() {
                    continue;
                }
                let snapshot = group.snapshot(false);
                let peer = snapshot.entries().next().map(|(_, e)| e.peer.clone());
                (naming::fk_column(group.def().peer_name()), peer)
            };
            let value = match peer {
                Some(peer) => self.ensure_saved(&peer, visiting)?.to_value(),
                None => Value::Null,
            };
            columns.push((fk, value));
        }

        let table = naming::table_name(def.name());

        if fresh {
            if let Some(parent) = parent {
                let identity = entity
                    .borrow()
                    .identity()
                    .cloned()
                    .ok_or_else(|| Error::constraint("base level assigned no identity"))?;
                columns.push((naming::hierarchy_column(parent), identity.to_value()));
            }

            let (names, values): (Vec<String>, Vec<Value>) = columns.into_iter().unzip();
            let statement = StatementBuilder::new()
                .insert_into(&table, names)
                .values(values)
                .build()?;
            self.run(&statement)?;

            if parent.is_none() {
                let identity = self.store.last_insert_identity().map_err(Error::from)?;
                entity.borrow_mut().bind_identity(identity)?;
            }
        } else {
            if columns.is_empty() {
                return Ok(());
            }
            let identity = entity
                .borrow()
                .identity()
                .cloned()
                .ok_or_else(|| Error::constraint("updating an entity without identity"))?;
            let key_column = parent.map_or_else(|| "id".to_string(), naming::hierarchy_column);

            let mut builder = StatementBuilder::new().update(&table);
            for (column, value) in columns {
                builder = builder.set(column, value);
            }
            let statement = builder
                .where_eq(key_column, identity.to_value())
                .build()?;
            self.run(&statement)?;
        }

        Ok(())
    }

    // One-to-many: removed peers get their back-reference nulled, added
    // peers are saved and pointed back at this entity.
    fn reconcile_one_to_many(
        &mut self,
        owner: &Identity,
        group: &GroupRef,
        visiting: &mut BTreeSet<usize>,
    ) -> Result<(), Error> {
        let (back_column, peer_table, deleted, added) = {
            let group = group.borrow();
            let def = group.def();
            let root = self.registry.root_of(def.peer_type())?;
            (
                naming::fk_column(def.owner_name()),
                naming::table_name(root.name()),
                collect_peers(group.deleted().entries()),
                collect_peers(group.added().entries()),
            )
        };

        for peer in deleted {
            // A peer that was never persisted has no row to detach.
            let Some(peer_id) = peer.borrow().identity().cloned() else {
                continue;
            };
            let statement = StatementBuilder::new()
                .update(&peer_table)
                .set(&back_column, Value::Null)
                .where_eq("id", peer_id.to_value())
                .build()?;
            self.run(&statement)?;
        }

        for peer in added {
            let peer_id = self.ensure_saved(&peer, visiting)?;
            let statement = StatementBuilder::new()
                .update(&peer_table)
                .set(&back_column, owner.to_value())
                .where_eq("id", peer_id.to_value())
                .build()?;
            self.run(&statement)?;
        }

        Ok(())
    }

    // Many-to-many three-way reconciliation. For every peer in the union of
    // the three multisets, with l/a/d its loaded/added/deleted counts:
    // untouched (l>0, a=0, d=0) writes nothing; fully removed (l=0, a=0,
    // d>0) deletes the junction row; anything else with l+a>0 upserts the
    // row with count l+a. Order-independent and idempotent: after commit a
    // second pass finds every peer untouched.
    fn reconcile_many_to_many(
        &mut self,
        owner: &Identity,
        group: &GroupRef,
        visiting: &mut BTreeSet<usize>,
    ) -> Result<(), Error> {
        let (parts, items) = {
            let group = group.borrow();
            let parts = naming::junction_parts(group.def());

            let mut keys: BTreeSet<PeerKey> = BTreeSet::new();
            keys.extend(group.loaded().counts().into_keys());
            keys.extend(group.added().counts().into_keys());
            keys.extend(group.deleted().counts().into_keys());

            let mut items = Vec::with_capacity(keys.len());
            for key in keys {
                let loaded = group.loaded().entry(&key);
                let added = group.added().entry(&key);
                let deleted = group.deleted().entry(&key);

                let Some(peer) = added
                    .or(loaded)
                    .or(deleted)
                    .map(|entry| entry.peer.clone())
                else {
                    continue;
                };

                let mut meta = BTreeMap::new();
                if let Some(entry) = loaded {
                    meta.extend(entry.meta.clone());
                }
                if let Some(entry) = added {
                    meta.extend(entry.meta.clone());
                }

                items.push(JunctionItem {
                    peer,
                    loaded: loaded.map_or(0, |e| e.count),
                    added: added.map_or(0, |e| e.count),
                    deleted: deleted.map_or(0, |e| e.count),
                    meta,
                });
            }
            (parts, items)
        };

        for item in items {
            // Untouched: present in storage, no session mutation.
            if item.loaded > 0 && item.added == 0 && item.deleted == 0 {
                continue;
            }

            // Fully removed: retract the junction row.
            if item.loaded == 0 && item.added == 0 && item.deleted > 0 {
                let Some(peer_id) = item.peer.borrow().identity().cloned() else {
                    continue;
                };
                let statement = StatementBuilder::new()
                    .delete_from(&parts.table)
                    .where_eq(&parts.owner_column, owner.to_value())
                    .where_eq(&parts.peer_column, peer_id.to_value())
                    .build()?;
                self.run(&statement)?;
                continue;
            }

            // Everything else with a surviving count (including
            // remove-then-re-add within one session) upserts l + a.
            let count = item.loaded + item.added;
            if count == 0 {
                continue;
            }

            let peer_id = self.ensure_saved(&item.peer, visiting)?;

            let probe = StatementBuilder::new()
                .select(["count"])
                .from(&parts.table)
                .where_eq(&parts.owner_column, owner.to_value())
                .where_eq(&parts.peer_column, peer_id.to_value())
                .build()?;
            let existing = self.fetch(&probe)?;

            if existing.is_empty() {
                let mut values = Vec::with_capacity(parts.columns.len());
                for column in &parts.columns {
                    let value = if *column == parts.owner_column {
                        owner.to_value()
                    } else if *column == parts.peer_column {
                        peer_id.to_value()
                    } else if column.as_str() == "count" {
                        Value::Uint(count)
                    } else {
                        item.meta.get(column).cloned().unwrap_or(Value::Null)
                    };
                    values.push(value);
                }
                let statement = StatementBuilder::new()
                    .insert_into(&parts.table, parts.columns.clone())
                    .values(values)
                    .build()?;
                self.run(&statement)?;
            } else {
                let mut builder = StatementBuilder::new()
                    .update(&parts.table)
                    .set("count", Value::Uint(count));
                for column in parts.columns.iter().skip(3) {
                    let value = item.meta.get(column).cloned().unwrap_or(Value::Null);
                    builder = builder.set(column.clone(), value);
                }
                let statement = builder
                    .where_eq(&parts.owner_column, owner.to_value())
                    .where_eq(&parts.peer_column, peer_id.to_value())
                    .build()?;
                self.run(&statement)?;
            }
        }

        Ok(())
    }
}

fn collect_peers<'a>(
    entries: impl Iterator<Item = (&'a PeerKey, &'a crate::multiset::MultisetEntry)>,
) -> Vec<EntityRef> {
    entries.map(|(_, entry)| entry.peer.clone()).collect()
}
