use thiserror::Error as ThisError;

///
/// SchemaError
///
/// Registration-time failures. These are programmer errors: a correctly
/// wired application never produces one after startup.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum SchemaError {
    #[error("invalid identifier '{ident}' for {role}")]
    InvalidIdentifier { role: &'static str, ident: String },

    #[error("entity '{entity}' is already registered")]
    DuplicateEntity { entity: String },

    #[error("entity '{entity}' declares duplicate field '{field}'")]
    DuplicateField { entity: String, field: String },

    #[error("entity '{entity}' declares duplicate relation '{relation}'")]
    DuplicateRelation { entity: String, relation: String },

    #[error("entity '{entity}' extends '{parent}', which is not registered")]
    UnknownParent { entity: String, parent: String },

    #[error("entity '{entity}' cannot extend itself")]
    SelfParent { entity: String },

    #[error("inheritance cycle detected at entity '{entity}'")]
    HierarchyCycle { entity: String },

    #[error(
        "relation '{relation}': max_count {max_count} is below min_count {min_count}"
    )]
    BoundsInverted {
        relation: String,
        min_count: u64,
        max_count: u64,
    },

    #[error("many-to-one relation '{relation}' must have min_count <= 1 and max_count <= 1")]
    ManyToOneBounds { relation: String },

    #[error("relation '{relation}' declares metadata columns but is not many-to-many")]
    MetaColumnsNotJunction { relation: String },

    #[error("many-to-many relation '{relation}' needs distinct owner and peer role names")]
    JunctionRoleCollision { relation: String },

    #[error("relation '{relation}' declares duplicate metadata column '{column}'")]
    DuplicateMetaColumn { relation: String, column: String },

    #[error("relation '{relation}' is declared on '{declared}' but owned by '{owner}'")]
    ForeignRelation {
        relation: String,
        declared: String,
        owner: String,
    },

    #[error("entity '{entity}' is not registered")]
    UnknownEntity { entity: String },
}

impl SchemaError {
    /// True for the lookup variant; everything else is a configuration fault.
    #[must_use]
    pub const fn is_unknown_entity(&self) -> bool {
        matches!(self, Self::UnknownEntity { .. })
    }
}
