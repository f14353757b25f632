use crate::relation::RelationDef;
use std::rc::Rc;

///
/// EntityDef
///
/// Explicit descriptor for one persisted entity type: scalar field names in
/// declaration order, an optional parent type (single inheritance), and the
/// relations declared at this level. Replaces runtime reflection; built
/// once and registered, then shared immutably.
///

#[derive(Clone, Debug)]
pub struct EntityDef {
    name: String,
    parent: Option<String>,
    source: String,
    fields: Vec<String>,
    relations: Vec<Rc<RelationDef>>,
}

impl EntityDef {
    pub const DEFAULT_SOURCE: &'static str = "default";

    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            source: Self::DEFAULT_SOURCE.to_string(),
            fields: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Declare the parent type; the parent must be registered first.
    #[must_use]
    pub fn extends(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    /// Bind instances of this type to a named data source.
    #[must_use]
    pub fn source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    /// Declare one persisted scalar field. Field order is authoritative for
    /// column ordering; fields not declared here are simply not persisted.
    #[must_use]
    pub fn field(mut self, name: &str) -> Self {
        self.fields.push(name.to_string());
        self
    }

    /// Declare a relation owned by this type.
    #[must_use]
    pub fn relation(mut self, def: RelationDef) -> Self {
        self.relations.push(Rc::new(def));
        self
    }

    // ======================================================================
    // Accessors
    // ======================================================================

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    #[must_use]
    pub fn source_name(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    #[must_use]
    pub fn relations(&self) -> &[Rc<RelationDef>] {
        &self.relations
    }

    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }
}
