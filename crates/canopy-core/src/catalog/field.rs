//! Field descriptors.

use super::types::ScalarType;
use serde::{Deserialize, Serialize};

/// A field declaration within an entity. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Scalar kind.
    pub scalar: ScalarType,
    /// Whether absence or explicit null is accepted.
    pub nullable: bool,
    /// Whether the store assigns a value when the caller omits one.
    /// The validator never fabricates the default itself.
    pub has_default: bool,
    /// Whether this field alone identifies a row.
    pub unique: bool,
}

impl FieldDescriptor {
    /// Create a new required, non-defaulted field.
    pub fn new(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self {
            name: name.into(),
            scalar,
            nullable: false,
            has_default: false,
            unique: false,
        }
    }

    /// Mark as nullable.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark as server-defaulted.
    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    /// Mark as unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_builder() {
        let field = FieldDescriptor::new("id", ScalarType::String)
            .with_default()
            .unique();

        assert_eq!(field.name, "id");
        assert!(!field.nullable);
        assert!(field.has_default);
        assert!(field.unique);
    }

    #[test]
    fn test_nullable_field() {
        let field = FieldDescriptor::new("notes", ScalarType::String).nullable();

        assert!(field.nullable);
        assert!(!field.has_default);
        assert!(!field.unique);
    }
}
