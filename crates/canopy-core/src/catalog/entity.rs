//! Entity descriptors.

use super::field::FieldDescriptor;
use super::relation::RelationDescriptor;
use serde::{Deserialize, Serialize};

/// A single- or multi-field unique key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniqueKey {
    /// Key name. Compound keys default to the member fields joined with
    /// `_`, which is also the key a where-unique selector uses.
    pub name: String,
    /// Member fields, in declaration order.
    pub fields: Vec<String>,
}

impl UniqueKey {
    /// Create a compound key named after its member fields.
    pub fn compound(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        Self {
            name: fields.join("_"),
            fields,
        }
    }

    /// Override the key name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Check if this key covers a single field.
    pub fn is_single(&self) -> bool {
        self.fields.len() == 1
    }
}

/// An entity declaration. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    /// Entity name (unique within the schema).
    pub name: String,
    /// Field declarations, in order.
    pub fields: Vec<FieldDescriptor>,
    /// Relation declarations.
    pub relations: Vec<RelationDescriptor>,
    /// Declared compound unique keys. Single-field uniqueness is
    /// expressed with [`FieldDescriptor::unique`].
    pub unique_keys: Vec<UniqueKey>,
}

impl EntityDescriptor {
    /// Create a new entity with no fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            relations: Vec::new(),
            unique_keys: Vec::new(),
        }
    }

    /// Add a field.
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Add multiple fields.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Add a relation.
    pub fn with_relation(mut self, relation: RelationDescriptor) -> Self {
        self.relations.push(relation);
        self
    }

    /// Add a compound unique key.
    pub fn with_unique_key(mut self, key: UniqueKey) -> Self {
        self.unique_keys.push(key);
        self
    }

    /// Get a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Get a relation by name.
    pub fn relation(&self, name: &str) -> Option<&RelationDescriptor> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Get a compound unique key by name.
    pub fn unique_key(&self, name: &str) -> Option<&UniqueKey> {
        self.unique_keys.iter().find(|k| k.name == name)
    }

    /// All single-field unique fields.
    pub fn unique_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.unique)
    }
}
