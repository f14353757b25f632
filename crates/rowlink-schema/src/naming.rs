
use crate::relation::RelationDef;
use convert_case::{Case, Casing};

///
/// Naming convention
///
/// Bit-exact mapping from schema names to tables and columns; an existing
/// schema depends on these strings, so changes here are breaking.
///

/// `FooBar` -> `foo_bars`: word boundary before uppercase becomes an
/// underscore, lowercased, pluralized by a bare `s` suffix.
#[must_use]
pub fn table_name(type_name: &str) -> String {
    format!("{}s", type_name.to_case(Case::Snake))
}

/// A role name maps to its foreign-key column: `{role}_id`.
#[must_use]
pub fn fk_column(role: &str) -> String {
    format!("{role}_id")
}

/// Hierarchy edges carry no role name; the child level's parent-key column
/// is derived from the parent type: `Base` -> `base_id`.
#[must_use]
pub fn hierarchy_column(parent_type: &str) -> String {
    fk_column(&parent_type.to_case(Case::Snake))
}

///
/// JunctionParts
///
/// Resolved junction-table identifiers for one many-to-many relation:
/// table name, the two key columns addressed by side, and the full column
/// list in persisted order.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JunctionParts {
    pub table: String,
    pub owner_column: String,
    pub peer_column: String,
    /// `{first}_id`, `{second}_id`, `count`, then metadata columns in
    /// declaration order.
    pub columns: Vec<String>,
}

/// Junction naming: `r__{a}__{b}` with the two pluralized, snake-cased type
/// names sorted lexicographically. When both sides share a type the role
/// names decide the trailing segments instead.
#[must_use]
pub fn junction_parts(def: &RelationDef) -> JunctionParts {
    let owner_segment = table_name(def.owner_type());
    let peer_segment = table_name(def.peer_type());

    let (segments, owner_first) = if owner_segment == peer_segment {
        let owner_role = def.owner_name().to_case(Case::Snake);
        let peer_role = def.peer_name().to_case(Case::Snake);
        let owner_first = owner_role <= peer_role;
        (order(owner_role, peer_role, owner_first), owner_first)
    } else {
        let owner_first = owner_segment <= peer_segment;
        (order(owner_segment, peer_segment, owner_first), owner_first)
    };

    let table = format!("r__{}__{}", segments.0, segments.1);
    let owner_column = fk_column(def.owner_name());
    let peer_column = fk_column(def.peer_name());

    let (first_column, second_column) = if owner_first {
        (owner_column.clone(), peer_column.clone())
    } else {
        (peer_column.clone(), owner_column.clone())
    };

    let mut columns = vec![first_column, second_column, "count".to_string()];
    columns.extend(def.meta_columns().iter().cloned());

    JunctionParts {
        table,
        owner_column,
        peer_column,
        columns,
    }
}

fn order(a: String, b: String, a_first: bool) -> (String, String) {
    if a_first { (a, b) } else { (b, a) }
}
