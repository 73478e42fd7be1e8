//! Fatal configuration errors.
//!
//! Everything in here indicates a schema-authoring bug. These errors
//! surface while a registry is being built (or from lookups against a
//! frozen registry) and must abort startup; they are never caught and
//! retried. Per-request failures live in [`crate::validate::outcome`].

use thiserror::Error;

/// Schema configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An entity name was registered twice.
    #[error("duplicate entity registration: {0}")]
    DuplicateEntity(String),

    /// An enum name was registered twice.
    #[error("duplicate enum registration: {0}")]
    DuplicateEnum(String),

    /// A field references an enum that was never registered.
    #[error("field {entity}.{field} references unknown enum {enum_name}")]
    UnknownEnumReference {
        /// Entity declaring the field.
        entity: String,
        /// Field name.
        field: String,
        /// The missing enum.
        enum_name: String,
    },

    /// An entity declares the same field name twice.
    #[error("duplicate field {field} on entity {entity}")]
    DuplicateField {
        /// Entity declaring the field.
        entity: String,
        /// Duplicated field name.
        field: String,
    },

    /// An entity declares the same relation name twice.
    #[error("duplicate relation {relation} on entity {entity}")]
    DuplicateRelation {
        /// Entity declaring the relation.
        entity: String,
        /// Duplicated relation name.
        relation: String,
    },

    /// An entity declares the same unique key name twice.
    #[error("duplicate unique key {key} on entity {entity}")]
    DuplicateUniqueKey {
        /// Entity declaring the key.
        entity: String,
        /// Duplicated key name.
        key: String,
    },

    /// A relation targets an entity that was never registered.
    #[error("relation {entity}.{relation} targets unknown entity {target}")]
    UnresolvedRelationTarget {
        /// Entity declaring the relation.
        entity: String,
        /// Relation name.
        relation: String,
        /// The missing target.
        target: String,
    },

    /// A relation names a field the entity does not declare.
    #[error("relation {entity}.{relation} references undeclared field {field}")]
    UnknownRelationField {
        /// Entity declaring the relation.
        entity: String,
        /// Relation name.
        relation: String,
        /// The missing field.
        field: String,
    },

    /// A relation name collides with a declared field name.
    #[error("relation {entity}.{relation} collides with a field of the same name")]
    RelationFieldCollision {
        /// Entity declaring the relation.
        entity: String,
        /// Colliding name.
        relation: String,
    },

    /// A unique key names a field the entity does not declare.
    #[error("unique key {key} on {entity} references undeclared field {field}")]
    UnknownUniqueField {
        /// Entity declaring the key.
        entity: String,
        /// Unique key name.
        key: String,
        /// The missing field.
        field: String,
    },

    /// A polymorphic relation declares no targets.
    #[error("polymorphic relation {entity}.{relation} declares no targets")]
    EmptyPolymorphicTargets {
        /// Entity declaring the relation.
        entity: String,
        /// Relation name.
        relation: String,
    },

    /// A polymorphic relation declares the same tag twice.
    #[error("polymorphic relation {entity}.{relation} declares duplicate tag {tag}")]
    DuplicatePolymorphicTag {
        /// Entity declaring the relation.
        entity: String,
        /// Relation name.
        relation: String,
        /// The duplicated tag.
        tag: String,
    },

    /// An aggregate function was offered on a field kind that cannot
    /// support it. Caught when the schema is registered, before any
    /// request is validated against it.
    #[error("aggregate {function} offered on non-numeric field {entity}.{field}")]
    AggregateOnNonNumeric {
        /// Entity declaring the field.
        entity: String,
        /// Field name.
        field: String,
        /// Offending aggregate function.
        function: &'static str,
    },

    /// Lookup of an entity that was never registered.
    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    /// Lookup of an enum that was never registered.
    #[error("unknown enum: {0}")]
    UnknownEnum(String),

    /// Lookup of a relation that the entity does not declare.
    #[error("unknown relation {relation} on entity {entity}")]
    UnknownRelation {
        /// Entity name.
        entity: String,
        /// Relation name.
        relation: String,
    },
}
