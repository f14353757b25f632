use crate::{identity::Identity, sql::Statement, value::Value};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

/// One result row: column name to cell value.
pub type Row = BTreeMap<String, Value>;

///
/// StoreError
///
/// Opaque failure from the store collaborator. The core never interprets
/// store-specific codes; the message is passed through untouched.
///

#[derive(Debug, ThisError)]
#[error("store error: {message}")]
pub struct StoreError {
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + 'static>>,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

///
/// Store
///
/// The SQL execution contract the engine consumes. Synchronous: every call
/// blocks until complete. Atomicity across the statements of one save pass
/// is the implementor's concern (wrap the pass in a transaction); the
/// engine issues statements one at a time and never rolls back.
///

pub trait Store {
    /// Execute a write statement; returns the affected row count.
    fn execute(&mut self, statement: &Statement) -> Result<u64, StoreError>;

    /// Execute a read statement; returns the result rows.
    fn query(&mut self, statement: &Statement) -> Result<Vec<Row>, StoreError>;

    /// The identity generated by the most recent insert.
    fn last_insert_identity(&mut self) -> Result<Identity, StoreError>;

    /// Render a value as a safe literal. Only needed when the concrete
    /// store cannot bind parameters; the default is a plain quote-doubling
    /// text escape.
    fn escape(&self, value: &Value) -> String {
        match value {
            Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
            other => other.to_string(),
        }
    }
}
