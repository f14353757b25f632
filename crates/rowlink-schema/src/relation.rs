
use crate::{error::SchemaError, ident};
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// RelationKind
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum RelationKind {
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::OneToMany => "one_to_many",
            Self::ManyToOne => "many_to_one",
            Self::ManyToMany => "many_to_many",
        };
        write!(f, "{label}")
    }
}

///
/// RelationSpec
///
/// Raw registration parameters for one relation. Turned into a validated
/// [`RelationDef`] by [`RelationDef::new`]; never used directly afterwards.
///

#[derive(Clone, Debug)]
pub struct RelationSpec {
    pub kind: RelationKind,
    /// Role name of the owning side; names the back-reference column.
    pub owner_name: String,
    /// Role name of the peer side; this is the name callers address the
    /// relation by, and it names the owner-side foreign-key column.
    pub peer_name: String,
    pub owner_type: String,
    pub peer_type: String,
    pub min_count: u64,
    pub max_count: Option<u64>,
    /// Extra junction-table columns, declaration order preserved.
    pub meta_columns: Vec<String>,
}

impl RelationSpec {
    /// Bare spec with open bounds and no metadata columns.
    #[must_use]
    pub fn bare(
        kind: RelationKind,
        owner_type: &str,
        peer_type: &str,
        owner_name: &str,
        peer_name: &str,
    ) -> Self {
        Self {
            kind,
            owner_name: owner_name.to_string(),
            peer_name: peer_name.to_string(),
            owner_type: owner_type.to_string(),
            peer_type: peer_type.to_string(),
            min_count: 0,
            max_count: None,
            meta_columns: Vec::new(),
        }
    }

    #[must_use]
    pub const fn bounds(mut self, min_count: u64, max_count: Option<u64>) -> Self {
        self.min_count = min_count;
        self.max_count = max_count;
        self
    }

    #[must_use]
    pub fn meta_columns(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.meta_columns = columns.into_iter().map(Into::into).collect();
        self
    }
}

///
/// RelationDef
///
/// Validated, immutable registration of one relation. Shared between every
/// instance of the owning entity type; per-instance multiset state lives in
/// the runtime relation group, not here.
///

#[derive(Clone, Debug)]
pub struct RelationDef {
    kind: RelationKind,
    owner_name: String,
    peer_name: String,
    owner_type: String,
    peer_type: String,
    min_count: u64,
    max_count: Option<u64>,
    meta_columns: Vec<String>,
}

impl RelationDef {
    /// Validate a spec into a definition. Fails fast at registration time;
    /// use-time code never re-checks these invariants.
    pub fn new(spec: RelationSpec) -> Result<Self, SchemaError> {
        ident::check("owner role", &spec.owner_name)?;
        ident::check("peer role", &spec.peer_name)?;
        ident::check("owner type", &spec.owner_type)?;
        ident::check("peer type", &spec.peer_type)?;

        if let Some(max) = spec.max_count {
            if max < spec.min_count {
                return Err(SchemaError::BoundsInverted {
                    relation: spec.peer_name,
                    min_count: spec.min_count,
                    max_count: max,
                });
            }
        }

        if spec.kind == RelationKind::ManyToOne
            && (spec.min_count > 1 || spec.max_count.is_none_or(|max| max > 1))
        {
            return Err(SchemaError::ManyToOneBounds {
                relation: spec.peer_name,
            });
        }

        if !spec.meta_columns.is_empty() && spec.kind != RelationKind::ManyToMany {
            return Err(SchemaError::MetaColumnsNotJunction {
                relation: spec.peer_name,
            });
        }

        // Identical role names would render both junction key columns as
        // the same string, corrupting every junction statement.
        if spec.kind == RelationKind::ManyToMany && spec.owner_name == spec.peer_name {
            return Err(SchemaError::JunctionRoleCollision {
                relation: spec.peer_name,
            });
        }

        let mut seen = std::collections::BTreeSet::new();
        for column in &spec.meta_columns {
            ident::check("metadata column", column)?;
            if !seen.insert(column.as_str()) {
                return Err(SchemaError::DuplicateMetaColumn {
                    relation: spec.peer_name,
                    column: column.clone(),
                });
            }
        }

        Ok(Self {
            kind: spec.kind,
            owner_name: spec.owner_name,
            peer_name: spec.peer_name,
            owner_type: spec.owner_type,
            peer_type: spec.peer_type,
            min_count: spec.min_count,
            max_count: spec.max_count,
            meta_columns: spec.meta_columns,
        })
    }

    /// One-to-many: the peer rows hold the back-reference column.
    pub fn one_to_many(
        owner_type: &str,
        peer_type: &str,
        owner_name: &str,
        peer_name: &str,
    ) -> Result<Self, SchemaError> {
        Self::new(RelationSpec::bare(
            RelationKind::OneToMany,
            owner_type,
            peer_type,
            owner_name,
            peer_name,
        ))
    }

    /// Many-to-one: the owner row holds the foreign key; at most one peer.
    pub fn many_to_one(
        owner_type: &str,
        peer_type: &str,
        owner_name: &str,
        peer_name: &str,
    ) -> Result<Self, SchemaError> {
        Self::new(
            RelationSpec::bare(
                RelationKind::ManyToOne,
                owner_type,
                peer_type,
                owner_name,
                peer_name,
            )
            .bounds(0, Some(1)),
        )
    }

    /// Many-to-many: persisted through a junction table.
    pub fn many_to_many(
        owner_type: &str,
        peer_type: &str,
        owner_name: &str,
        peer_name: &str,
    ) -> Result<Self, SchemaError> {
        Self::new(RelationSpec::bare(
            RelationKind::ManyToMany,
            owner_type,
            peer_type,
            owner_name,
            peer_name,
        ))
    }

    // ======================================================================
    // Accessors
    // ======================================================================

    /// The name callers address this relation by (the peer role name).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.peer_name
    }

    #[must_use]
    pub const fn kind(&self) -> RelationKind {
        self.kind
    }

    #[must_use]
    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    #[must_use]
    pub fn peer_name(&self) -> &str {
        &self.peer_name
    }

    #[must_use]
    pub fn owner_type(&self) -> &str {
        &self.owner_type
    }

    #[must_use]
    pub fn peer_type(&self) -> &str {
        &self.peer_type
    }

    #[must_use]
    pub const fn min_count(&self) -> u64 {
        self.min_count
    }

    #[must_use]
    pub const fn max_count(&self) -> Option<u64> {
        self.max_count
    }

    #[must_use]
    pub fn meta_columns(&self) -> &[String] {
        &self.meta_columns
    }
}
