
use crate::{entity::EntityDef, error::SchemaError, ident};
use std::{collections::BTreeMap, rc::Rc};

///
/// Registry
///
/// Explicit schema registry, constructed at application start and passed to
/// the engine and entity factories. There is no ambient global state; the
/// registry's lifetime is the process (or the test case).
///

#[derive(Debug, Default)]
pub struct Registry {
    entities: BTreeMap<String, Rc<EntityDef>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one entity type. Fails fast on identifier-policy breaches,
    /// duplicates, or an unregistered parent; parents must be registered
    /// before their children, which rules out inheritance cycles by
    /// construction.
    pub fn register(&mut self, def: EntityDef) -> Result<(), SchemaError> {
        ident::check("entity type", def.name())?;

        if self.entities.contains_key(def.name()) {
            return Err(SchemaError::DuplicateEntity {
                entity: def.name().to_string(),
            });
        }

        if let Some(parent) = def.parent() {
            if parent == def.name() {
                return Err(SchemaError::SelfParent {
                    entity: def.name().to_string(),
                });
            }
            if !self.entities.contains_key(parent) {
                return Err(SchemaError::UnknownParent {
                    entity: def.name().to_string(),
                    parent: parent.to_string(),
                });
            }
        }

        let mut seen_fields = std::collections::BTreeSet::new();
        for field in def.fields() {
            ident::check("field", field)?;
            if !seen_fields.insert(field.as_str()) {
                return Err(SchemaError::DuplicateField {
                    entity: def.name().to_string(),
                    field: field.clone(),
                });
            }
        }

        let mut seen_relations = std::collections::BTreeSet::new();
        for relation in def.relations() {
            if relation.owner_type() != def.name() {
                return Err(SchemaError::ForeignRelation {
                    relation: relation.name().to_string(),
                    declared: def.name().to_string(),
                    owner: relation.owner_type().to_string(),
                });
            }
            if !seen_relations.insert(relation.name().to_string()) {
                return Err(SchemaError::DuplicateRelation {
                    entity: def.name().to_string(),
                    relation: relation.name().to_string(),
                });
            }
        }

        self.entities
            .insert(def.name().to_string(), Rc::new(def));

        Ok(())
    }

    /// Look up one registered entity type.
    pub fn entity(&self, name: &str) -> Result<Rc<EntityDef>, SchemaError> {
        self.entities
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownEntity {
                entity: name.to_string(),
            })
    }

    /// The type hierarchy from root ancestor to the named type, root first.
    pub fn hierarchy_of(&self, name: &str) -> Result<Vec<Rc<EntityDef>>, SchemaError> {
        let mut chain = Vec::new();
        let mut cursor = self.entity(name)?;

        loop {
            chain.push(cursor.clone());
            // Registration order makes cycles unreachable, but a corrupted
            // chain must not loop forever.
            if chain.len() > self.entities.len() {
                return Err(SchemaError::HierarchyCycle {
                    entity: name.to_string(),
                });
            }
            match cursor.parent() {
                Some(parent) => {
                    let parent = parent.to_string();
                    cursor = self.entity(&parent)?;
                }
                None => break,
            }
        }

        chain.reverse();
        Ok(chain)
    }

    /// Root ancestor of the named type (the level that owns the identity).
    pub fn root_of(&self, name: &str) -> Result<Rc<EntityDef>, SchemaError> {
        let chain = self.hierarchy_of(name)?;
        // hierarchy_of never returns an empty chain
        Ok(chain[0].clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
