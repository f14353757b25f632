use crate::{
    identity::Identity,
    sql::Statement,
    store::{Row, Store, StoreError},
};
use rowlink_schema::{EntityDef, Registry, RelationDef, RelationSpec};
use std::collections::VecDeque;

///
/// RecordingStore
///
/// Scripted store double: records every statement, replays queued query
/// results in order, and hands out queued (or auto-incremented) insert
/// identities. Tests assert on the recorded SQL and parameters.
///

pub(crate) struct RecordingStore {
    pub executed: Vec<Statement>,
    pub queried: Vec<Statement>,
    query_results: VecDeque<Vec<Row>>,
    identities: VecDeque<Identity>,
    next_auto: i64,
    pub fail_next_execute: bool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            executed: Vec::new(),
            queried: Vec::new(),
            query_results: VecDeque::new(),
            identities: VecDeque::new(),
            next_auto: 0,
            fail_next_execute: false,
        }
    }

    pub fn queue_rows(&mut self, rows: Vec<Row>) {
        self.query_results.push_back(rows);
    }

    pub fn queue_identity(&mut self, identity: Identity) {
        self.identities.push_back(identity);
    }

    /// Recorded write statements, rendered.
    pub fn executed_sql(&self) -> Vec<String> {
        self.executed.iter().map(|s| s.sql.clone()).collect()
    }

    pub fn write_count(&self) -> usize {
        self.executed.len()
    }

    pub fn read_count(&self) -> usize {
        self.queried.len()
    }
}

impl Store for RecordingStore {
    fn execute(&mut self, statement: &Statement) -> Result<u64, StoreError> {
        if self.fail_next_execute {
            self.fail_next_execute = false;
            return Err(StoreError::new("scripted failure"));
        }
        self.executed.push(statement.clone());
        Ok(1)
    }

    fn query(&mut self, statement: &Statement) -> Result<Vec<Row>, StoreError> {
        self.queried.push(statement.clone());
        Ok(self.query_results.pop_front().unwrap_or_default())
    }

    fn last_insert_identity(&mut self) -> Result<Identity, StoreError> {
        if let Some(identity) = self.identities.pop_front() {
            return Ok(identity);
        }
        self.next_auto += 1;
        Ok(Identity::Int(self.next_auto))
    }
}

/// A small library schema covering all three relation kinds:
/// Book --many-to-one--> Author, Book --one-to-many--> Chapter,
/// Book --many-to-many--> Tag (junction metadata column `note`).
pub(crate) fn library_registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .register(EntityDef::new("Author").field("name"))
        .unwrap();
    registry
        .register(EntityDef::new("Chapter").field("heading"))
        .unwrap();
    registry
        .register(EntityDef::new("Tag").field("label"))
        .unwrap();
    registry
        .register(
            EntityDef::new("Book")
                .field("title")
                .relation(RelationDef::many_to_one("Book", "Author", "books", "author").unwrap())
                .relation(RelationDef::one_to_many("Book", "Chapter", "book", "chapters").unwrap())
                .relation(
                    RelationDef::new(
                        RelationSpec::bare(
                            rowlink_schema::RelationKind::ManyToMany,
                            "Book",
                            "Tag",
                            "books",
                            "tags",
                        )
                        .meta_columns(["note"]),
                    )
                    .unwrap(),
                ),
        )
        .unwrap();
    registry
}

/// Two-level hierarchy: Derived extends Base.
pub(crate) fn hierarchy_registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .register(EntityDef::new("Base").field("label"))
        .unwrap();
    registry
        .register(EntityDef::new("Derived").extends("Base").field("width"))
        .unwrap();
    registry
}
