#[cfg(test)]
mod tests;

use crate::value::Value;
use std::fmt;
use thiserror::Error as ThisError;

///
/// BuilderError
///
/// Statement-shape faults. These are programmer errors: the engine only
/// ever builds well-formed statements.
///

#[derive(Debug, ThisError)]
pub enum BuilderError {
    #[error("statement has no verb clause (select, insert-into, update, delete-from)")]
    MissingVerb,

    #[error("statement mixes verb clauses")]
    ConflictingVerbs,

    #[error("select statement has no from clause")]
    MissingFrom,

    #[error("insert declares {columns} columns but {values} values")]
    ValuesArityMismatch { columns: usize, values: usize },

    #[error("insert statement has no values clause")]
    MissingValues,

    #[error("update statement has no set clause")]
    MissingSet,

    #[error("duplicate {0} clause")]
    DuplicateClause(&'static str),
}

///
/// Clause
///
/// One enumerated statement clause. The builder collects clauses in any
/// call order; assembly happens in a fixed clause order, so call order
/// never changes the SQL.
///

#[derive(Clone, Debug)]
pub enum Clause {
    Select(Vec<String>),
    From(String),
    InsertInto { table: String, columns: Vec<String> },
    Values(Vec<Value>),
    Update(String),
    Set(String, Value),
    DeleteFrom(String),
    WhereEq(String, Value),
    OrderBy(String),
}

///
/// Statement
///
/// Rendered SQL with `?` placeholders and its parameters in placeholder
/// order. The store binds the parameters; nothing here is escaped.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)
    }
}

// Singleton clause slots resolved during assembly.
#[derive(Default)]
struct Slots {
    select: Option<Vec<String>>,
    from: Option<String>,
    insert: Option<(String, Vec<String>)>,
    values: Option<Vec<Value>>,
    update: Option<String>,
    delete: Option<String>,
    set: Vec<(String, Value)>,
    where_eq: Vec<(String, Value)>,
    order_by: Vec<String>,
}

///
/// StatementBuilder
///
/// One method per clause kind, each pushing one [`Clause`]; `build`
/// validates the clause set and assembles it in the fixed order.
///

#[derive(Debug, Default)]
pub struct StatementBuilder {
    clauses: Vec<Clause>,
}

impl StatementBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn select(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.clauses
            .push(Clause::Select(columns.into_iter().map(Into::into).collect()));
        self
    }

    #[must_use]
    pub fn from(mut self, table: impl Into<String>) -> Self {
        self.clauses.push(Clause::From(table.into()));
        self
    }

    #[must_use]
    pub fn insert_into(
        mut self,
        table: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.clauses.push(Clause::InsertInto {
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        });
        self
    }

    #[must_use]
    pub fn values(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.clauses
            .push(Clause::Values(values.into_iter().collect()));
        self
    }

    #[must_use]
    pub fn update(mut self, table: impl Into<String>) -> Self {
        self.clauses.push(Clause::Update(table.into()));
        self
    }

    /// One `column = ?` assignment; repeatable, rendered in call order.
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: Value) -> Self {
        self.clauses.push(Clause::Set(column.into(), value));
        self
    }

    #[must_use]
    pub fn delete_from(mut self, table: impl Into<String>) -> Self {
        self.clauses.push(Clause::DeleteFrom(table.into()));
        self
    }

    /// One `column = ?` equality predicate; repeated predicates are ANDed.
    #[must_use]
    pub fn where_eq(mut self, column: impl Into<String>, value: Value) -> Self {
        self.clauses.push(Clause::WhereEq(column.into(), value));
        self
    }

    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.clauses.push(Clause::OrderBy(column.into()));
        self
    }

    /// Validate the clause set and assemble the statement.
    pub fn build(self) -> Result<Statement, BuilderError> {
        let slots = Self::slot(self.clauses)?;

        let verbs = usize::from(slots.select.is_some())
            + usize::from(slots.insert.is_some())
            + usize::from(slots.update.is_some())
            + usize::from(slots.delete.is_some());
        match verbs {
            0 => return Err(BuilderError::MissingVerb),
            1 => {}
            _ => return Err(BuilderError::ConflictingVerbs),
        }

        if let Some((table, columns)) = slots.insert {
            let values = slots.values.ok_or(BuilderError::MissingValues)?;
            if columns.len() != values.len() {
                return Err(BuilderError::ValuesArityMismatch {
                    columns: columns.len(),
                    values: values.len(),
                });
            }
            // A column-free insert still has to produce a row; the
            // parenthesized form is rejected by most dialects.
            if columns.is_empty() {
                return Ok(Statement {
                    sql: format!("INSERT INTO {table} DEFAULT VALUES"),
                    params: values,
                });
            }
            let placeholders = vec!["?"; values.len()].join(", ");
            let sql = format!(
                "INSERT INTO {table} ({}) VALUES ({placeholders})",
                columns.join(", ")
            );
            return Ok(Statement {
                sql,
                params: values,
            });
        }

        if let Some(table) = slots.update {
            if slots.set.is_empty() {
                return Err(BuilderError::MissingSet);
            }
            let assignments: Vec<String> =
                slots.set.iter().map(|(c, _)| format!("{c} = ?")).collect();
            let mut sql = format!("UPDATE {table} SET {}", assignments.join(", "));
            let mut params: Vec<Value> = slots.set.into_iter().map(|(_, v)| v).collect();
            Self::render_where(&mut sql, &mut params, slots.where_eq);
            return Ok(Statement { sql, params });
        }

        if let Some(table) = slots.delete {
            let mut sql = format!("DELETE FROM {table}");
            let mut params = Vec::new();
            Self::render_where(&mut sql, &mut params, slots.where_eq);
            return Ok(Statement { sql, params });
        }

        // select is the only verb left
        let columns = slots.select.unwrap_or_default();
        let table = slots.from.ok_or(BuilderError::MissingFrom)?;
        let mut sql = format!("SELECT {} FROM {table}", columns.join(", "));
        let mut params = Vec::new();
        Self::render_where(&mut sql, &mut params, slots.where_eq);
        if !slots.order_by.is_empty() {
            sql.push_str(&format!(" ORDER BY {}", slots.order_by.join(", ")));
        }
        Ok(Statement { sql, params })
    }

    // Bucket clauses into their slots; singleton slots reject repeats.
    fn slot(clauses: Vec<Clause>) -> Result<Slots, BuilderError> {
        let mut slots = Slots::default();

        for clause in clauses {
            match clause {
                Clause::Select(columns) => {
                    Self::fill(&mut slots.select, columns, "select")?;
                }
                Clause::From(table) => Self::fill(&mut slots.from, table, "from")?,
                Clause::InsertInto { table, columns } => {
                    Self::fill(&mut slots.insert, (table, columns), "insert-into")?;
                }
                Clause::Values(values) => Self::fill(&mut slots.values, values, "values")?,
                Clause::Update(table) => Self::fill(&mut slots.update, table, "update")?,
                Clause::DeleteFrom(table) => {
                    Self::fill(&mut slots.delete, table, "delete-from")?;
                }
                Clause::Set(column, value) => slots.set.push((column, value)),
                Clause::WhereEq(column, value) => slots.where_eq.push((column, value)),
                Clause::OrderBy(column) => slots.order_by.push(column),
            }
        }

        Ok(slots)
    }

    fn fill<T>(slot: &mut Option<T>, value: T, name: &'static str) -> Result<(), BuilderError> {
        if slot.is_some() {
            return Err(BuilderError::DuplicateClause(name));
        }
        *slot = Some(value);
        Ok(())
    }

    fn render_where(sql: &mut String, params: &mut Vec<Value>, where_eq: Vec<(String, Value)>) {
        if where_eq.is_empty() {
            return;
        }
        let predicates: Vec<String> = where_eq.iter().map(|(c, _)| format!("{c} = ?")).collect();
        sql.push_str(&format!(" WHERE {}", predicates.join(" AND ")));
        params.extend(where_eq.into_iter().map(|(_, v)| v));
    }
}
