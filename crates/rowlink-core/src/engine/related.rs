use super::Engine;
use crate::{
    entity::{Entity, EntityRef, GroupRef},
    error::{Error, ErrorKind, ErrorOrigin},
    identity::Identity,
    multiset::RelationMultiset,
    sql::StatementBuilder,
    store::{Row, Store},
    value::Value,
};
use rowlink_schema::{RelationKind, naming};
use std::collections::BTreeMap;

impl<S: Store> Engine<S> {
    /// Current view of a named relation. The first access on a persisted
    /// entity triggers exactly one read against the store, populating
    /// `loaded`; later accesses are pure in-memory snapshots, as are all
    /// accesses on an unpersisted entity.
    pub fn related(&mut self, entity: &EntityRef, name: &str) -> Result<RelationMultiset, Error> {
        let group = entity.borrow().group(name)?;

        let needs_read = !group.borrow().is_loaded() && entity.borrow().is_persisted();
        if needs_read {
            self.read_group(entity, &group)?;
        }

        Ok(group.borrow().snapshot(false))
    }

    fn read_group(&mut self, entity: &EntityRef, group: &GroupRef) -> Result<(), Error> {
        let Some(identity) = entity.borrow().identity().cloned() else {
            return Ok(());
        };

        let kind = group.borrow().def().kind();
        match kind {
            RelationKind::OneToMany => self.read_one_to_many(&identity, group)?,
            RelationKind::ManyToOne => self.read_many_to_one(entity, &identity, group)?,
            RelationKind::ManyToMany => self.read_many_to_many(&identity, group)?,
        }

        group.borrow_mut().mark_loaded();
        Ok(())
    }

    // One-to-many: peers are the rows whose back-reference column points at
    // this entity.
    fn read_one_to_many(&mut self, owner: &Identity, group: &GroupRef) -> Result<(), Error> {
        let (peer_type, back_column) = {
            let group = group.borrow();
            let def = group.def();
            (
                def.peer_type().to_string(),
                naming::fk_column(def.owner_name()),
            )
        };
        let root = self.registry.root_of(&peer_type)?;
        let table = naming::table_name(root.name());

        let statement = StatementBuilder::new()
            .select(["id"])
            .from(&table)
            .where_eq(back_column, owner.to_value())
            .build()?;
        let rows = self.fetch(&statement)?;

        for row in rows {
            let peer_id = required_identity(&row, "id", &table)?;
            let peer = self.hydrate(&peer_type, peer_id)?;
            group
                .borrow_mut()
                .loaded_mut()
                .increment(&peer, 1, BTreeMap::new());
        }

        Ok(())
    }

    // Many-to-one: the foreign-key cell sits on the row of the hierarchy
    // level that declared the relation.
    fn read_many_to_one(
        &mut self,
        entity: &EntityRef,
        owner: &Identity,
        group: &GroupRef,
    ) -> Result<(), Error> {
        let (owner_type, peer_type, fk_column) = {
            let group = group.borrow();
            let def = group.def();
            (
                def.owner_type().to_string(),
                def.peer_type().to_string(),
                naming::fk_column(def.peer_name()),
            )
        };

        let defs = entity.borrow().defs().to_vec();
        let level = defs
            .iter()
            .position(|def| def.name() == owner_type)
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::UnknownRelation,
                    ErrorOrigin::Engine,
                    format!("declaring type '{owner_type}' missing from hierarchy"),
                )
            })?;
        let table = naming::table_name(defs[level].name());
        let key_column = level
            .checked_sub(1)
            .map_or_else(|| "id".to_string(), |i| naming::hierarchy_column(defs[i].name()));

        let statement = StatementBuilder::new()
            .select([fk_column.clone()])
            .from(&table)
            .where_eq(key_column, owner.to_value())
            .build()?;
        let rows = self.fetch(&statement)?;

        let Some(row) = rows.first() else {
            return Ok(());
        };
        match row.get(&fk_column) {
            None | Some(Value::Null) => {}
            Some(cell) => {
                let peer_id = Identity::from_value(cell).ok_or_else(|| {
                    malformed_cell(&table, &fk_column)
                })?;
                let peer = self.hydrate(&peer_type, peer_id)?;
                group
                    .borrow_mut()
                    .loaded_mut()
                    .set(&peer, 1, BTreeMap::new());
            }
        }

        Ok(())
    }

    // Many-to-many: one junction read yields peer id, count, and the
    // declared metadata columns.
    fn read_many_to_many(&mut self, owner: &Identity, group: &GroupRef) -> Result<(), Error> {
        let (peer_type, parts, meta_columns) = {
            let group = group.borrow();
            let def = group.def();
            (
                def.peer_type().to_string(),
                naming::junction_parts(def),
                def.meta_columns().to_vec(),
            )
        };

        let mut columns = vec![parts.peer_column.clone(), "count".to_string()];
        columns.extend(meta_columns.iter().cloned());

        let statement = StatementBuilder::new()
            .select(columns)
            .from(&parts.table)
            .where_eq(parts.owner_column.clone(), owner.to_value())
            .build()?;
        let rows = self.fetch(&statement)?;

        for row in rows {
            let peer_id = required_identity(&row, &parts.peer_column, &parts.table)?;
            let count = row
                .get("count")
                .and_then(Value::as_u64)
                .ok_or_else(|| malformed_cell(&parts.table, "count"))?;

            let mut meta = BTreeMap::new();
            for column in &meta_columns {
                match row.get(column) {
                    None | Some(Value::Null) => {}
                    Some(value) => {
                        meta.insert(column.clone(), value.clone());
                    }
                }
            }

            let peer = self.hydrate(&peer_type, peer_id)?;
            group.borrow_mut().loaded_mut().set(&peer, count, meta);
        }

        Ok(())
    }

    // A lazily-read peer is materialized with its identity only; callers
    // pull scalar fields through `load` when they need them.
    fn hydrate(&self, type_name: &str, identity: Identity) -> Result<EntityRef, Error> {
        let peer = Entity::spawn(&self.registry, type_name)?;
        peer.borrow_mut().bind_identity(identity)?;
        Ok(peer)
    }
}

fn required_identity(row: &Row, column: &str, table: &str) -> Result<Identity, Error> {
    row.get(column)
        .and_then(Identity::from_value)
        .ok_or_else(|| malformed_cell(table, column))
}

fn malformed_cell(table: &str, column: &str) -> Error {
    Error::new(
        ErrorKind::Storage,
        ErrorOrigin::Store,
        format!("malformed row from '{table}': column '{column}' is not usable"),
    )
}
