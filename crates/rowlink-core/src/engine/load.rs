use super::Engine;
use crate::{
    entity::{Entity, EntityRef},
    error::Error,
    identity::Identity,
    sql::StatementBuilder,
    store::Store,
};
use rowlink_schema::naming;

impl<S: Store> Engine<S> {
    /// Materialize one entity by identity: one read per hierarchy level,
    /// root first, each child level joined to its parent by the hierarchy
    /// foreign key. Relation groups are left Unloaded and populated lazily
    /// on first access.
    pub fn load(&mut self, type_name: &str, identity: &Identity) -> Result<EntityRef, Error> {
        let entity = Entity::spawn(&self.registry, type_name)?;
        let defs = entity.borrow().defs().to_vec();

        for (level, def) in defs.iter().enumerate() {
            let table = naming::table_name(def.name());
            let parent = level.checked_sub(1).map(|i| defs[i].name());

            // The base table always has its id column, so the base-level
            // read doubles as the existence probe.
            let mut columns: Vec<String> = Vec::new();
            if parent.is_none() {
                columns.push("id".to_string());
            }
            columns.extend(def.fields().iter().cloned());

            if columns.is_empty() {
                continue;
            }

            let key_column = parent.map_or_else(|| "id".to_string(), naming::hierarchy_column);
            let statement = StatementBuilder::new()
                .select(columns)
                .from(&table)
                .where_eq(key_column, identity.to_value())
                .build()?;
            let rows = self.fetch(&statement)?;

            match rows.first() {
                None if parent.is_none() => {
                    return Err(Error::not_found(format!(
                        "no '{type_name}' row for identity {identity}"
                    )));
                }
                // A missing child-level row leaves that level's fields
                // unset; only the base level decides existence.
                None => {}
                Some(row) => {
                    let mut entity = entity.borrow_mut();
                    for field in def.fields() {
                        if let Some(value) = row.get(field) {
                            entity.set_field_raw(field, value.clone());
                        }
                    }
                }
            }
        }

        entity.borrow_mut().bind_identity(identity.clone())?;
        Ok(entity)
    }

    /// Remove the entity's per-level rows, leaf first. Relationship rows
    /// (junction rows, peers' back-references) are deliberately untouched.
    pub fn delete(&mut self, entity: &EntityRef) -> Result<(), Error> {
        let Some(identity) = entity.borrow().identity().cloned() else {
            return Err(Error::not_found(format!(
                "cannot delete unpersisted entity '{}'",
                entity.borrow().type_name()
            )));
        };

        let defs = entity.borrow().defs().to_vec();
        for (level, def) in defs.iter().enumerate().rev() {
            let table = naming::table_name(def.name());
            let parent = level.checked_sub(1).map(|i| defs[i].name());
            let key_column = parent.map_or_else(|| "id".to_string(), naming::hierarchy_column);

            let statement = StatementBuilder::new()
                .delete_from(&table)
                .where_eq(key_column, identity.to_value())
                .build()?;
            self.run(&statement)?;
        }

        Ok(())
    }
}
