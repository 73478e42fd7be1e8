//! Relation descriptors between entities.

use serde::{Deserialize, Serialize};

/// Cardinality of a relation, as seen from the declaring entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    /// Exactly one related row.
    ToOneRequired,
    /// Zero or one related row.
    ToOneOptional,
    /// Any number of related rows.
    ToMany,
}

impl Cardinality {
    /// Check if this is a to-many relation.
    pub fn is_to_many(&self) -> bool {
        matches!(self, Cardinality::ToMany)
    }

    /// Check if this is a to-one relation (required or optional).
    pub fn is_to_one(&self) -> bool {
        !self.is_to_many()
    }

    /// Short name, used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Cardinality::ToOneRequired => "required to-one",
            Cardinality::ToOneOptional => "optional to-one",
            Cardinality::ToMany => "to-many",
        }
    }
}

/// One permissible target of a polymorphic relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolymorphicTarget {
    /// Discriminator tag selecting this target (the value stored in the
    /// discriminator field).
    pub tag: String,
    /// Target entity name.
    pub entity: String,
}

/// What a relation points at.
///
/// Targets are held by name and resolved during registry build, so
/// entities whose relations reference each other register cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RelationTarget {
    /// A single target entity.
    Entity(String),
    /// One of several target entities, selected by a discriminator field.
    ///
    /// The engine validates that the discriminator value is a member of
    /// the closed tag set; whether the referenced row exists is the
    /// persistence layer's invariant, since the storage layer cannot
    /// express a foreign key across several tables.
    Polymorphic {
        /// Field holding the tag (e.g. `parentTable`).
        discriminator_field: String,
        /// Sibling field holding the referenced id (e.g. `parentId`).
        id_field: String,
        /// Closed set of permissible targets.
        targets: Vec<PolymorphicTarget>,
    },
}

/// A relation declaration on an entity. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    /// Relation name (unique among the entity's fields and relations).
    pub name: String,
    /// Cardinality from the declaring side.
    pub cardinality: Cardinality,
    /// Target entity (or entities).
    pub target: RelationTarget,
    /// The declaring entity's scalar foreign-key field, when the
    /// declaring side owns the reference. `None` for polymorphic
    /// relations (the id lives in the target descriptor's `id_field`)
    /// and for relations whose foreign key lives on the other side.
    pub foreign_key: Option<String>,
}

impl RelationDescriptor {
    /// Create a required to-one relation.
    pub fn to_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cardinality: Cardinality::ToOneRequired,
            target: RelationTarget::Entity(target.into()),
            foreign_key: None,
        }
    }

    /// Create an optional to-one relation.
    pub fn to_one_optional(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cardinality: Cardinality::ToOneOptional,
            target: RelationTarget::Entity(target.into()),
            foreign_key: None,
        }
    }

    /// Create a to-many relation.
    pub fn to_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cardinality: Cardinality::ToMany,
            target: RelationTarget::Entity(target.into()),
            foreign_key: None,
        }
    }

    /// Create a polymorphic to-one relation.
    pub fn polymorphic(
        name: impl Into<String>,
        discriminator_field: impl Into<String>,
        id_field: impl Into<String>,
        targets: Vec<PolymorphicTarget>,
    ) -> Self {
        Self {
            name: name.into(),
            cardinality: Cardinality::ToOneRequired,
            target: RelationTarget::Polymorphic {
                discriminator_field: discriminator_field.into(),
                id_field: id_field.into(),
                targets,
            },
            foreign_key: None,
        }
    }

    /// Set the declaring side's foreign-key field.
    pub fn with_foreign_key(mut self, field: impl Into<String>) -> Self {
        self.foreign_key = Some(field.into());
        self
    }

    /// Make the relation optional.
    pub fn optional(mut self) -> Self {
        if self.cardinality == Cardinality::ToOneRequired {
            self.cardinality = Cardinality::ToOneOptional;
        }
        self
    }

    /// Check if this relation is polymorphic.
    pub fn is_polymorphic(&self) -> bool {
        matches!(self.target, RelationTarget::Polymorphic { .. })
    }

    /// Get the single target entity name, if not polymorphic.
    pub fn target_entity(&self) -> Option<&str> {
        match &self.target {
            RelationTarget::Entity(name) => Some(name),
            RelationTarget::Polymorphic { .. } => None,
        }
    }

    /// Get the permissible discriminator tags of a polymorphic relation.
    pub fn allowed_tags(&self) -> Vec<&str> {
        match &self.target {
            RelationTarget::Polymorphic { targets, .. } => {
                targets.iter().map(|t| t.tag.as_str()).collect()
            }
            RelationTarget::Entity(_) => Vec::new(),
        }
    }
}

impl PolymorphicTarget {
    /// Create a target whose tag and entity name are given separately.
    pub fn new(tag: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            entity: entity.into(),
        }
    }
}
