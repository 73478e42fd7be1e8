//! Two-phase schema registry.
//!
//! Phase 1 ([`SchemaBuilder`]) collects entity and enum descriptors by
//! name without resolving anything, so entities whose relations reference
//! each other (including cycles) register in any order. Phase 2
//! ([`SchemaBuilder::build`]) resolves every reference by name lookup and
//! freezes the result into an immutable [`SchemaRegistry`].
//!
//! The registry is the only shared state in the engine. It holds no
//! interior mutability, so once `build` returns it may be shared across
//! any number of threads; validators borrow it and resolve related
//! entities by name at validation time rather than holding direct
//! references, which is what keeps cyclic schema graphs safe.

use super::entity::EntityDescriptor;
use super::enums::{EnumDescriptor, EnumRegistry};
use super::relation::RelationTarget;
use crate::error::ConfigError;
use crate::mutation::relation::{RelationMutationValidator, WriteContext};
use crate::query::aggregate::{AggregateSelectValidator, AggregateSpec, GroupByValidator};
use crate::query::order_by::OrderByValidator;
use crate::query::where_builder::WhereValidator;
use crate::validate::entity::{EntityValidator, ValidationMode, WhereUniqueValidator};
use std::collections::BTreeMap;

/// Phase 1: collects descriptors. Consumed by [`SchemaBuilder::build`],
/// which makes re-registration after the build impossible by
/// construction.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    enums: Vec<EnumDescriptor>,
    entities: Vec<EntityDescriptor>,
}

impl SchemaBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an enum by name and variant set.
    pub fn register_enum(
        &mut self,
        name: impl Into<String>,
        variants: impl IntoIterator<Item = impl Into<String>>,
    ) -> &mut Self {
        self.enums.push(EnumDescriptor::new(name, variants));
        self
    }

    /// Register an entity descriptor.
    pub fn register_entity(&mut self, entity: EntityDescriptor) -> &mut Self {
        tracing::debug!(name = %entity.name, fields = entity.fields.len(), "registered entity");
        self.entities.push(entity);
        self
    }

    /// Phase 2: resolve all references and freeze.
    ///
    /// Any failure here is a schema-authoring bug and must abort startup.
    pub fn build(self) -> Result<SchemaRegistry, ConfigError> {
        let mut enums = EnumRegistry::new();
        for descriptor in self.enums {
            enums.register(descriptor)?;
        }

        let mut entities: BTreeMap<String, EntityDescriptor> = BTreeMap::new();
        for entity in self.entities {
            if entities.contains_key(&entity.name) {
                return Err(ConfigError::DuplicateEntity(entity.name));
            }
            entities.insert(entity.name.clone(), entity);
        }

        for entity in entities.values() {
            check_fields(entity, &enums)?;
            check_relations(entity, &entities)?;
            check_unique_keys(entity)?;
        }

        let mut aggregates = BTreeMap::new();
        for (name, entity) in &entities {
            aggregates.insert(name.clone(), AggregateSpec::for_entity(entity)?);
        }

        tracing::info!(
            entities = entities.len(),
            enums = enums.len(),
            "schema registry built"
        );

        Ok(SchemaRegistry {
            enums,
            entities,
            aggregates,
        })
    }
}

/// Duplicate field names and unresolvable enum references.
fn check_fields(entity: &EntityDescriptor, enums: &EnumRegistry) -> Result<(), ConfigError> {
    let mut seen = Vec::new();
    for field in &entity.fields {
        if seen.contains(&&field.name) {
            return Err(ConfigError::DuplicateField {
                entity: entity.name.clone(),
                field: field.name.clone(),
            });
        }
        seen.push(&field.name);

        if let Some(enum_name) = field.scalar.enum_name() {
            if enums.get(enum_name).is_none() {
                return Err(ConfigError::UnknownEnumReference {
                    entity: entity.name.clone(),
                    field: field.name.clone(),
                    enum_name: enum_name.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Relation name collisions, target resolution, and field presence.
fn check_relations(
    entity: &EntityDescriptor,
    entities: &BTreeMap<String, EntityDescriptor>,
) -> Result<(), ConfigError> {
    let mut seen = Vec::new();
    for relation in &entity.relations {
        if seen.contains(&&relation.name) {
            return Err(ConfigError::DuplicateRelation {
                entity: entity.name.clone(),
                relation: relation.name.clone(),
            });
        }
        seen.push(&relation.name);

        if entity.field(&relation.name).is_some() {
            return Err(ConfigError::RelationFieldCollision {
                entity: entity.name.clone(),
                relation: relation.name.clone(),
            });
        }

        if let Some(fk) = &relation.foreign_key {
            if entity.field(fk).is_none() {
                return Err(ConfigError::UnknownRelationField {
                    entity: entity.name.clone(),
                    relation: relation.name.clone(),
                    field: fk.clone(),
                });
            }
        }

        match &relation.target {
            RelationTarget::Entity(target) => {
                if !entities.contains_key(target) {
                    return Err(ConfigError::UnresolvedRelationTarget {
                        entity: entity.name.clone(),
                        relation: relation.name.clone(),
                        target: target.clone(),
                    });
                }
            }
            RelationTarget::Polymorphic {
                discriminator_field,
                id_field,
                targets,
            } => {
                if targets.is_empty() {
                    return Err(ConfigError::EmptyPolymorphicTargets {
                        entity: entity.name.clone(),
                        relation: relation.name.clone(),
                    });
                }
                let mut tags = Vec::new();
                for target in targets {
                    if tags.contains(&&target.tag) {
                        return Err(ConfigError::DuplicatePolymorphicTag {
                            entity: entity.name.clone(),
                            relation: relation.name.clone(),
                            tag: target.tag.clone(),
                        });
                    }
                    tags.push(&target.tag);

                    if !entities.contains_key(&target.entity) {
                        return Err(ConfigError::UnresolvedRelationTarget {
                            entity: entity.name.clone(),
                            relation: relation.name.clone(),
                            target: target.entity.clone(),
                        });
                    }
                }
                for field in [discriminator_field, id_field] {
                    if entity.field(field).is_none() {
                        return Err(ConfigError::UnknownRelationField {
                            entity: entity.name.clone(),
                            relation: relation.name.clone(),
                            field: field.clone(),
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

/// Unique key name collisions and member field presence.
fn check_unique_keys(entity: &EntityDescriptor) -> Result<(), ConfigError> {
    let mut seen = Vec::new();
    for key in &entity.unique_keys {
        if seen.contains(&&key.name) {
            return Err(ConfigError::DuplicateUniqueKey {
                entity: entity.name.clone(),
                key: key.name.clone(),
            });
        }
        seen.push(&key.name);

        for field in &key.fields {
            if entity.field(field).is_none() {
                return Err(ConfigError::UnknownUniqueField {
                    entity: entity.name.clone(),
                    key: key.name.clone(),
                    field: field.clone(),
                });
            }
        }
    }
    Ok(())
}

/// The frozen schema registry. `Send + Sync`; safe to share once built.
#[derive(Debug)]
pub struct SchemaRegistry {
    enums: EnumRegistry,
    entities: BTreeMap<String, EntityDescriptor>,
    aggregates: BTreeMap<String, AggregateSpec>,
}

impl SchemaRegistry {
    /// Get an entity descriptor by name.
    pub fn entity(&self, name: &str) -> Result<&EntityDescriptor, ConfigError> {
        self.entities
            .get(name)
            .ok_or_else(|| ConfigError::UnknownEntity(name.to_string()))
    }

    /// Get an enum descriptor by name.
    pub fn enum_def(&self, name: &str) -> Result<&EnumDescriptor, ConfigError> {
        self.enums
            .get(name)
            .ok_or_else(|| ConfigError::UnknownEnum(name.to_string()))
    }

    /// The enum registry.
    pub fn enums(&self) -> &EnumRegistry {
        &self.enums
    }

    /// List all entity names.
    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.keys().map(|s| s.as_str()).collect()
    }

    /// Get the aggregate spec for an entity.
    pub(crate) fn aggregate_spec(&self, entity: &str) -> Result<&AggregateSpec, ConfigError> {
        self.aggregates
            .get(entity)
            .ok_or_else(|| ConfigError::UnknownEntity(entity.to_string()))
    }

    /// Build an entity payload validator in the given mode.
    pub fn validator(
        &self,
        entity: &str,
        mode: ValidationMode,
    ) -> Result<EntityValidator<'_>, ConfigError> {
        Ok(EntityValidator::new(self, self.entity(entity)?, mode))
    }

    /// Build the where-filter validator for an entity.
    pub fn where_validator(&self, entity: &str) -> Result<WhereValidator<'_>, ConfigError> {
        Ok(WhereValidator::new(self, self.entity(entity)?))
    }

    /// Build the where-unique selector validator for an entity.
    pub fn where_unique_validator(
        &self,
        entity: &str,
    ) -> Result<WhereUniqueValidator<'_>, ConfigError> {
        Ok(WhereUniqueValidator::new(self, self.entity(entity)?))
    }

    /// Build the order-by validator for an entity.
    pub fn order_by_validator(&self, entity: &str) -> Result<OrderByValidator<'_>, ConfigError> {
        Ok(OrderByValidator::new(self.entity(entity)?))
    }

    /// Build the group-by validator for an entity.
    pub fn group_by_validator(&self, entity: &str) -> Result<GroupByValidator<'_>, ConfigError> {
        Ok(GroupByValidator::new(self.entity(entity)?))
    }

    /// Build the aggregate-selection validator for an entity.
    pub fn aggregate_validator(
        &self,
        entity: &str,
    ) -> Result<AggregateSelectValidator<'_>, ConfigError> {
        Ok(AggregateSelectValidator::new(
            self.entity(entity)?,
            self.aggregate_spec(entity)?,
        ))
    }

    /// Build the nested-mutation validator for one relation of an entity.
    pub fn relation_validator(
        &self,
        entity: &str,
        relation: &str,
        context: WriteContext,
    ) -> Result<RelationMutationValidator<'_>, ConfigError> {
        let descriptor = self.entity(entity)?;
        let relation = descriptor
            .relation(relation)
            .ok_or_else(|| ConfigError::UnknownRelation {
                entity: entity.to_string(),
                relation: relation.to_string(),
            })?;
        Ok(RelationMutationValidator::new(
            self, descriptor, relation, context,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::field::FieldDescriptor;
    use crate::catalog::relation::{PolymorphicTarget, RelationDescriptor};
    use crate::catalog::types::ScalarType;

    fn land_entity() -> EntityDescriptor {
        EntityDescriptor::new("Land")
            .with_field(FieldDescriptor::new("id", ScalarType::String).unique())
            .with_field(FieldDescriptor::new(
                "treatmentType",
                ScalarType::Enum("TreatmentType".into()),
            ))
            .with_field(FieldDescriptor::new("projectId", ScalarType::String))
            .with_relation(
                RelationDescriptor::to_one("project", "Project").with_foreign_key("projectId"),
            )
    }

    fn project_entity() -> EntityDescriptor {
        EntityDescriptor::new("Project")
            .with_field(FieldDescriptor::new("id", ScalarType::String).unique())
            .with_field(FieldDescriptor::new("name", ScalarType::String))
            .with_relation(RelationDescriptor::to_many("lands", "Land"))
    }

    fn builder() -> SchemaBuilder {
        let mut builder = SchemaBuilder::new();
        builder.register_enum("TreatmentType", ["ARR", "improved_forest_management"]);
        builder.register_entity(project_entity());
        builder.register_entity(land_entity());
        builder
    }

    #[test]
    fn test_cyclic_registration_builds() {
        // Project -> lands -> Land -> project -> Project is a cycle; the
        // two-phase build must resolve it without recursion.
        let registry = builder().build().unwrap();

        assert_eq!(registry.entity_names(), vec!["Land", "Project"]);
        assert!(registry.entity("Land").is_ok());
        assert!(registry.entity("Missing").is_err());
    }

    #[test]
    fn test_registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>(_: &T) {}
        let registry = builder().build().unwrap();
        assert_send_sync(&registry);
    }

    #[test]
    fn test_duplicate_entity_fails() {
        let mut b = builder();
        b.register_entity(EntityDescriptor::new("Land"));
        let err = b.build().unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateEntity(name) if name == "Land"));
    }

    #[test]
    fn test_unresolved_relation_target_fails() {
        let mut b = SchemaBuilder::new();
        b.register_entity(
            EntityDescriptor::new("Orphan")
                .with_relation(RelationDescriptor::to_many("ghosts", "Ghost")),
        );
        let err = b.build().unwrap_err();
        assert!(matches!(err, ConfigError::UnresolvedRelationTarget { .. }));
    }

    #[test]
    fn test_unknown_enum_reference_fails() {
        let mut b = SchemaBuilder::new();
        b.register_entity(
            EntityDescriptor::new("Land").with_field(FieldDescriptor::new(
                "treatmentType",
                ScalarType::Enum("TreatmentType".into()),
            )),
        );
        let err = b.build().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownEnumReference { .. }));
    }

    #[test]
    fn test_foreign_key_must_be_declared() {
        let mut b = SchemaBuilder::new();
        b.register_entity(project_entity());
        b.register_entity(
            EntityDescriptor::new("Land")
                .with_field(FieldDescriptor::new("id", ScalarType::String).unique())
                .with_relation(
                    RelationDescriptor::to_one("project", "Project")
                        .with_foreign_key("projectId"),
                ),
        );
        // Land is missing the projectId scalar; Project.lands also targets
        // Land so register a Land that resolves.
        let err = b.build().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownRelationField { field, .. } if field == "projectId"
        ));
    }

    #[test]
    fn test_polymorphic_targets_resolved() {
        let mut b = SchemaBuilder::new();
        b.register_entity(project_entity());
        b.register_entity(land_entity());
        b.register_enum("TreatmentType", ["ARR"]);
        b.register_entity(
            EntityDescriptor::new("Source")
                .with_field(FieldDescriptor::new("id", ScalarType::String).unique())
                .with_field(FieldDescriptor::new("parentId", ScalarType::String))
                .with_field(FieldDescriptor::new("parentTable", ScalarType::String))
                .with_relation(RelationDescriptor::polymorphic(
                    "parent",
                    "parentTable",
                    "parentId",
                    vec![
                        PolymorphicTarget::new("projectTable", "Project"),
                        PolymorphicTarget::new("landTable", "Land"),
                    ],
                )),
        );

        let registry = b.build().unwrap();
        let source = registry.entity("Source").unwrap();
        assert!(source.relation("parent").unwrap().is_polymorphic());
    }

    #[test]
    fn test_empty_polymorphic_targets_fail() {
        let mut b = SchemaBuilder::new();
        b.register_entity(
            EntityDescriptor::new("Source")
                .with_field(FieldDescriptor::new("parentId", ScalarType::String))
                .with_field(FieldDescriptor::new("parentTable", ScalarType::String))
                .with_relation(RelationDescriptor::polymorphic(
                    "parent",
                    "parentTable",
                    "parentId",
                    vec![],
                )),
        );
        let err = b.build().unwrap_err();
        assert!(matches!(err, ConfigError::EmptyPolymorphicTargets { .. }));
    }

    #[test]
    fn test_unique_key_field_must_exist() {
        use crate::catalog::entity::UniqueKey;

        let mut b = SchemaBuilder::new();
        b.register_entity(
            EntityDescriptor::new("Crop")
                .with_field(FieldDescriptor::new("id", ScalarType::String).unique())
                .with_unique_key(UniqueKey::compound(["projectId", "name"])),
        );
        let err = b.build().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownUniqueField { .. }));
    }
}
