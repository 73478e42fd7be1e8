//! Enum descriptors and the enum registry.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A closed, ordered set of string variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDescriptor {
    /// Enum name (unique within the schema).
    pub name: String,
    /// Permissible variants, in declaration order.
    pub variants: Vec<String>,
}

impl EnumDescriptor {
    /// Create a new enum descriptor.
    pub fn new(
        name: impl Into<String>,
        variants: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    /// Case-sensitive membership test. No coercion, no trimming.
    pub fn contains(&self, value: &str) -> bool {
        self.variants.iter().any(|v| v == value)
    }
}

/// Registry of all enums in a schema.
///
/// Populated during registry build; read-only afterwards.
#[derive(Debug, Default)]
pub struct EnumRegistry {
    enums: BTreeMap<String, EnumDescriptor>,
}

impl EnumRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an enum. Re-registering an existing name is a fatal
    /// configuration error.
    pub fn register(&mut self, descriptor: EnumDescriptor) -> Result<(), ConfigError> {
        if self.enums.contains_key(&descriptor.name) {
            return Err(ConfigError::DuplicateEnum(descriptor.name));
        }
        tracing::debug!(name = %descriptor.name, variants = descriptor.variants.len(), "registered enum");
        self.enums.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Get an enum by name.
    pub fn get(&self, name: &str) -> Option<&EnumDescriptor> {
        self.enums.get(name)
    }

    /// Check a value against a registered enum's variant set.
    pub fn is_variant(&self, name: &str, value: &str) -> Result<bool, ConfigError> {
        self.get(name)
            .map(|e| e.contains(value))
            .ok_or_else(|| ConfigError::UnknownEnum(name.to_string()))
    }

    /// Number of registered enums.
    pub fn len(&self) -> usize {
        self.enums.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.enums.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_is_case_sensitive() {
        let unit = EnumDescriptor::new("UnitType", ["hectares", "acres"]);

        assert!(unit.contains("hectares"));
        assert!(!unit.contains("Hectares"));
        assert!(!unit.contains(" hectares"));
        assert!(!unit.contains("tons"));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = EnumRegistry::new();
        registry
            .register(EnumDescriptor::new("TreatmentType", ["ARR"]))
            .unwrap();

        let err = registry
            .register(EnumDescriptor::new("TreatmentType", ["other"]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateEnum(name) if name == "TreatmentType"));
    }

    #[test]
    fn test_unknown_enum_lookup() {
        let registry = EnumRegistry::new();
        let err = registry.is_variant("Missing", "x").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownEnum(_)));
    }

    #[test]
    fn test_is_variant() {
        let mut registry = EnumRegistry::new();
        registry
            .register(EnumDescriptor::new(
                "TreatmentType",
                ["ARR", "improved_forest_management"],
            ))
            .unwrap();

        assert!(registry.is_variant("TreatmentType", "ARR").unwrap());
        assert!(!registry.is_variant("TreatmentType", "unknown").unwrap());
    }
}
