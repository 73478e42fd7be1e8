//! Nested relation mutation validation.
//!
//! Each relation entry in a write payload is a strict object of mutation
//! operations. Which operations are legal depends on the relation's
//! cardinality and on the write context: create payloads accept
//! `create`/`connect`/`connectOrCreate`; update payloads additionally
//! accept `update`, `updateMany`, `upsert`, `delete`, `deleteMany`,
//! `disconnect`, and `set` where the cardinality allows them. Nested
//! payloads recurse through the *target* entity's own validators.

use crate::catalog::{EntityDescriptor, RelationDescriptor, SchemaRegistry};
use crate::query::where_builder::WhereValidator;
use crate::validate::entity::{EntityValidator, ValidationMode, WhereUniqueValidator};
use crate::validate::field::json_kind;
use crate::validate::outcome::{Failure, Failures, ValidationError, ValidationResult};
use canopy_proto::{
    DeleteSpec, DisconnectSpec, FilteredUpdate, NestedConnectOrCreate, NestedUpdate, NestedUpsert,
    RelationMutation, UniqueSelector,
};
use serde_json::Value as Json;

/// Whether the enclosing payload is a create or an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteContext {
    /// The enclosing document creates a row.
    Create,
    /// The enclosing document updates a row.
    Update,
}

/// Validates nested mutations for one relation.
pub struct RelationMutationValidator<'a> {
    registry: &'a SchemaRegistry,
    source: &'a EntityDescriptor,
    relation: &'a RelationDescriptor,
    context: WriteContext,
}

impl<'a> RelationMutationValidator<'a> {
    pub(crate) fn new(
        registry: &'a SchemaRegistry,
        source: &'a EntityDescriptor,
        relation: &'a RelationDescriptor,
        context: WriteContext,
    ) -> Self {
        Self {
            registry,
            source,
            relation,
            context,
        }
    }

    fn target(&self) -> &'a EntityDescriptor {
        let name = self
            .relation
            .target_entity()
            .expect("polymorphic relations rejected before target lookup");
        self.registry
            .entity(name)
            .expect("relation targets resolved at build time")
    }

    /// Foreign keys on the target that point back at the source entity.
    /// A nested payload identifies the parent row by itself, so these
    /// fields are implied in nested documents (the checked variant).
    fn implied_foreign_keys(&self) -> Vec<(String, String)> {
        self.target()
            .relations
            .iter()
            .filter(|r| r.target_entity() == Some(self.source.name.as_str()))
            .filter_map(|r| r.foreign_key.clone().map(|fk| (r.name.clone(), fk)))
            .collect()
    }

    fn document_validator(&self, mode: ValidationMode) -> EntityValidator<'a> {
        EntityValidator::with_implied(
            self.registry,
            self.target(),
            mode,
            self.implied_foreign_keys(),
        )
    }

    /// Validate a raw relation payload into its mutations.
    pub fn validate(&self, raw: &Json) -> ValidationResult<Vec<RelationMutation>> {
        if self.relation.is_polymorphic() {
            return Err(Failures::one(Failure::root(
                ValidationError::PolymorphicNested {
                    relation: self.relation.name.clone(),
                },
            )));
        }

        let Json::Object(map) = raw else {
            return Err(Failures::one(Failure::root(ValidationError::TypeMismatch {
                expected: "object",
                actual: json_kind(raw),
            })));
        };

        let mut failures = Failures::new();
        let mut mutations = Vec::new();
        let to_many = self.relation.cardinality.is_to_many();

        for (op, value) in map {
            // Operations outside the create set require an update context.
            let update_only = !matches!(op.as_str(), "create" | "connect" | "connectOrCreate");
            if update_only && self.context == WriteContext::Create {
                if matches!(
                    op.as_str(),
                    "update"
                        | "updateMany"
                        | "upsert"
                        | "delete"
                        | "deleteMany"
                        | "disconnect"
                        | "set"
                ) {
                    failures.push(Failure::at(
                        op.clone(),
                        ValidationError::UpdateOnlyOperation {
                            operation: op.clone(),
                        },
                    ));
                } else {
                    failures.push(Failure::at(op.clone(), ValidationError::UnknownKey(op.clone())));
                }
                continue;
            }

            let result = match op.as_str() {
                "create" => self.validate_create(value),
                "connect" => self.validate_selectors(value).map(RelationMutation::Connect),
                "connectOrCreate" => self.validate_connect_or_create(value),
                "update" => self.validate_update(value),
                "updateMany" if to_many => self.validate_update_many(value),
                "upsert" => self.validate_upsert(value),
                "delete" => self.validate_delete(value).map(RelationMutation::Delete),
                "deleteMany" if to_many => self.validate_delete_many(value),
                "disconnect" => self.validate_disconnect(value),
                "set" if to_many => self.validate_selectors(value).map(RelationMutation::Set),
                "updateMany" | "deleteMany" | "set" => {
                    Err(Failures::one(Failure::root(
                        ValidationError::CardinalityMismatch {
                            operation: op.clone(),
                            cardinality: self.relation.cardinality.name(),
                        },
                    )))
                }
                other => Err(Failures::one(Failure::root(ValidationError::UnknownKey(
                    other.to_string(),
                )))),
            };

            match result {
                Ok(mutation) => mutations.push(mutation),
                Err(nested) => failures.extend_under(op, nested),
            }
        }

        failures.into_result(mutations)
    }

    /// Split a one-or-many payload into items with their path segments.
    /// To-one relations take exactly one object; to-many take an object
    /// or an array of them.
    fn items<'j>(&self, value: &'j Json) -> Result<Vec<(Option<String>, &'j Json)>, Failures> {
        match value {
            Json::Array(entries) if self.relation.cardinality.is_to_many() => Ok(entries
                .iter()
                .enumerate()
                .map(|(i, entry)| (Some(i.to_string()), entry))
                .collect()),
            Json::Array(_) => Err(Failures::one(Failure::root(ValidationError::TypeMismatch {
                expected: "object",
                actual: "array".to_string(),
            }))),
            other => Ok(vec![(None, other)]),
        }
    }

    /// Run `parse` per item, nesting failures under item indexes.
    fn each_item<T>(
        &self,
        value: &Json,
        mut parse: impl FnMut(&Json) -> ValidationResult<T>,
    ) -> ValidationResult<Vec<T>> {
        let items = self.items(value)?;
        let mut failures = Failures::new();
        let mut parsed = Vec::with_capacity(items.len());
        for (index, item) in items {
            match parse(item) {
                Ok(value) => parsed.push(value),
                Err(nested) => match index {
                    Some(index) => failures.extend_under(&index, nested),
                    None => failures.extend(nested),
                },
            }
        }
        failures.into_result(parsed)
    }

    fn validate_create(&self, value: &Json) -> ValidationResult<RelationMutation> {
        let validator = self.document_validator(ValidationMode::CreateWithDefaults);
        self.each_item(value, |item| validator.validate(item))
            .map(RelationMutation::Create)
    }

    fn validate_selectors(&self, value: &Json) -> ValidationResult<Vec<UniqueSelector>> {
        let validator = WhereUniqueValidator::new(self.registry, self.target());
        self.each_item(value, |item| validator.validate(item))
    }

    fn validate_connect_or_create(&self, value: &Json) -> ValidationResult<RelationMutation> {
        let unique = WhereUniqueValidator::new(self.registry, self.target());
        let create = self.document_validator(ValidationMode::CreateWithDefaults);
        self.each_item(value, |item| {
            let map = require_keys(item, &["where", "create"])?;
            let mut failures = Failures::new();
            let selector = collect(&unique.validate(&map["where"]), "where", &mut failures);
            let payload = collect(&create.validate(&map["create"]), "create", &mut failures);
            match (selector, payload) {
                (Some(selector), Some(create)) if failures.is_empty() => {
                    Ok(NestedConnectOrCreate { selector, create })
                }
                _ => Err(failures),
            }
        })
        .map(RelationMutation::ConnectOrCreate)
    }

    fn validate_update(&self, value: &Json) -> ValidationResult<RelationMutation> {
        let update = self.document_validator(ValidationMode::Update);
        if self.relation.cardinality.is_to_many() {
            let unique = WhereUniqueValidator::new(self.registry, self.target());
            self.each_item(value, |item| {
                let map = require_keys(item, &["where", "data"])?;
                let mut failures = Failures::new();
                let selector = collect(&unique.validate(&map["where"]), "where", &mut failures);
                let data = collect(&update.validate(&map["data"]), "data", &mut failures);
                match (selector, data) {
                    (Some(selector), Some(data)) if failures.is_empty() => Ok(NestedUpdate {
                        selector: Some(selector),
                        data,
                    }),
                    _ => Err(failures),
                }
            })
            .map(RelationMutation::Update)
        } else {
            // To-one: the related row is identified by the parent; the
            // payload is the update document itself.
            update.validate(value).map(|data| {
                RelationMutation::Update(vec![NestedUpdate {
                    selector: None,
                    data,
                }])
            })
        }
    }

    fn validate_update_many(&self, value: &Json) -> ValidationResult<RelationMutation> {
        let filter = WhereValidator::new(self.registry, self.target());
        let update = self.document_validator(ValidationMode::Update);
        self.each_item(value, |item| {
            let map = require_keys(item, &["where", "data"])?;
            let mut failures = Failures::new();
            let node = collect(&filter.validate(&map["where"]), "where", &mut failures);
            let data = collect(&update.validate(&map["data"]), "data", &mut failures);
            match (node, data) {
                (Some(filter), Some(data)) if failures.is_empty() => {
                    Ok(FilteredUpdate { filter, data })
                }
                _ => Err(failures),
            }
        })
        .map(RelationMutation::UpdateMany)
    }

    fn validate_upsert(&self, value: &Json) -> ValidationResult<RelationMutation> {
        let to_many = self.relation.cardinality.is_to_many();
        let keys: &[&str] = if to_many {
            &["where", "update", "create"]
        } else {
            &["update", "create"]
        };
        let unique = WhereUniqueValidator::new(self.registry, self.target());
        let update = self.document_validator(ValidationMode::Update);
        let create = self.document_validator(ValidationMode::CreateWithDefaults);
        self.each_item(value, |item| {
            let map = require_keys(item, keys)?;
            let mut failures = Failures::new();
            let selector = if to_many {
                collect(&unique.validate(&map["where"]), "where", &mut failures)
            } else {
                None
            };
            let update_doc = collect(&update.validate(&map["update"]), "update", &mut failures);
            let create_doc = collect(&create.validate(&map["create"]), "create", &mut failures);
            match (update_doc, create_doc) {
                (Some(update), Some(create))
                    if failures.is_empty() && (selector.is_some() || !to_many) =>
                {
                    Ok(NestedUpsert {
                        selector,
                        update,
                        create,
                    })
                }
                _ => Err(failures),
            }
        })
        .map(RelationMutation::Upsert)
    }

    fn validate_delete(&self, value: &Json) -> ValidationResult<DeleteSpec> {
        if self.relation.cardinality.is_to_many() {
            return self.validate_selectors(value).map(DeleteSpec::Many);
        }
        if self.relation.cardinality == crate::catalog::Cardinality::ToOneRequired {
            return Err(Failures::one(Failure::root(
                ValidationError::CardinalityMismatch {
                    operation: "delete".into(),
                    cardinality: self.relation.cardinality.name(),
                },
            )));
        }
        expect_true(value).map(|()| DeleteSpec::One)
    }

    fn validate_delete_many(&self, value: &Json) -> ValidationResult<RelationMutation> {
        let filter = WhereValidator::new(self.registry, self.target());
        self.each_item(value, |item| filter.validate(item))
            .map(RelationMutation::DeleteMany)
    }

    fn validate_disconnect(&self, value: &Json) -> ValidationResult<RelationMutation> {
        if self.relation.cardinality.is_to_many() {
            return self
                .validate_selectors(value)
                .map(|s| RelationMutation::Disconnect(DisconnectSpec::Many(s)));
        }
        if self.relation.cardinality == crate::catalog::Cardinality::ToOneRequired {
            return Err(Failures::one(Failure::root(
                ValidationError::CardinalityMismatch {
                    operation: "disconnect".into(),
                    cardinality: self.relation.cardinality.name(),
                },
            )));
        }
        expect_true(value).map(|()| RelationMutation::Disconnect(DisconnectSpec::One))
    }
}

/// Require a strict object with exactly the given keys.
fn require_keys<'j>(
    raw: &'j Json,
    keys: &[&str],
) -> Result<&'j serde_json::Map<String, Json>, Failures> {
    let Json::Object(map) = raw else {
        return Err(Failures::one(Failure::root(ValidationError::TypeMismatch {
            expected: "object",
            actual: json_kind(raw),
        })));
    };
    let mut failures = Failures::new();
    for key in keys {
        if !map.contains_key(*key) {
            failures.push(Failure::at(key.to_string(), ValidationError::MissingField));
        }
    }
    for key in map.keys() {
        if !keys.contains(&key.as_str()) {
            failures.push(Failure::at(key.clone(), ValidationError::UnknownKey(key.clone())));
        }
    }
    if failures.is_empty() {
        Ok(map)
    } else {
        Err(failures)
    }
}

/// Nest a sub-result's failures under a key, returning its value.
fn collect<T: Clone>(
    result: &ValidationResult<T>,
    key: &str,
    failures: &mut Failures,
) -> Option<T> {
    match result {
        Ok(value) => Some(value.clone()),
        Err(nested) => {
            failures.extend_under(key, nested.clone());
            None
        }
    }
}

/// A boolean-flag operation (`delete: true`, `disconnect: true`).
fn expect_true(raw: &Json) -> Result<(), Failures> {
    if raw == &Json::Bool(true) {
        Ok(())
    } else {
        Err(Failures::one(Failure::root(ValidationError::TypeMismatch {
            expected: "true",
            actual: raw.to_string(),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        EntityDescriptor, FieldDescriptor, RelationDescriptor, ScalarType, SchemaBuilder,
        UniqueKey,
    };
    use canopy_proto::FilterNode;
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        let mut builder = SchemaBuilder::new();
        builder.register_entity(
            EntityDescriptor::new("Project")
                .with_field(FieldDescriptor::new("id", ScalarType::String).unique())
                .with_field(FieldDescriptor::new("name", ScalarType::String))
                .with_relation(RelationDescriptor::to_many("crops", "Crop"))
                .with_relation(
                    RelationDescriptor::to_one_optional("organization", "Organization")
                        .with_foreign_key("organizationId"),
                )
                .with_field(FieldDescriptor::new("organizationId", ScalarType::String).nullable()),
        );
        builder.register_entity(
            EntityDescriptor::new("Crop")
                .with_field(FieldDescriptor::new("id", ScalarType::String).with_default().unique())
                .with_field(FieldDescriptor::new("name", ScalarType::String))
                .with_field(FieldDescriptor::new("projectId", ScalarType::String))
                .with_relation(
                    RelationDescriptor::to_one("project", "Project").with_foreign_key("projectId"),
                )
                .with_unique_key(UniqueKey::compound(["projectId", "name"])),
        );
        builder.register_entity(
            EntityDescriptor::new("Organization")
                .with_field(FieldDescriptor::new("id", ScalarType::String).unique())
                .with_field(FieldDescriptor::new("name", ScalarType::String)),
        );
        builder.build().unwrap()
    }

    fn crops_validator(registry: &SchemaRegistry, context: WriteContext) -> RelationMutationValidator<'_> {
        registry.relation_validator("Project", "crops", context).unwrap()
    }

    #[test]
    fn test_nested_create_one_and_many() {
        let registry = registry();
        let validator = crops_validator(&registry, WriteContext::Create);

        let mutations = validator
            .validate(&json!({"create": {"name": "oak"}}))
            .unwrap();
        assert!(matches!(
            mutations[0],
            RelationMutation::Create(ref docs) if docs.len() == 1
        ));

        let mutations = validator
            .validate(&json!({"create": [{"name": "oak"}, {"name": "willow"}]}))
            .unwrap();
        assert!(matches!(
            mutations[0],
            RelationMutation::Create(ref docs) if docs.len() == 2
        ));
    }

    #[test]
    fn test_nested_create_failures_carry_index() {
        let registry = registry();
        let validator = crops_validator(&registry, WriteContext::Create);

        let err = validator
            .validate(&json!({"create": [{"name": "oak"}, {}]}))
            .unwrap_err();
        let failure = err.iter().next().unwrap();
        assert_eq!(failure.path, vec!["create", "1", "name"]);
        assert_eq!(failure.error, ValidationError::MissingField);
    }

    #[test]
    fn test_connect_uses_target_unique_selectors() {
        let registry = registry();
        let validator = crops_validator(&registry, WriteContext::Create);

        let mutations = validator
            .validate(&json!({"connect": [
                {"id": "c1"},
                {"projectId_name": {"projectId": "p1", "name": "oak"}},
            ]}))
            .unwrap();
        assert!(matches!(
            mutations[0],
            RelationMutation::Connect(ref sels) if sels.len() == 2
        ));

        // Non-unique single field is rejected by the target's validator.
        let err = validator
            .validate(&json!({"connect": {"name": "oak"}}))
            .unwrap_err();
        assert!(matches!(
            err.iter().next().unwrap().error,
            ValidationError::InvalidUniqueSelector { .. }
        ));
    }

    #[test]
    fn test_connect_or_create_shape_is_strict() {
        let registry = registry();
        let validator = crops_validator(&registry, WriteContext::Create);

        let mutations = validator
            .validate(&json!({"connectOrCreate": {
                "where": {"id": "c1"},
                "create": {"name": "oak"},
            }}))
            .unwrap();
        assert!(matches!(mutations[0], RelationMutation::ConnectOrCreate(_)));

        let err = validator
            .validate(&json!({"connectOrCreate": {"where": {"id": "c1"}}}))
            .unwrap_err();
        let failure = err.iter().next().unwrap();
        assert_eq!(failure.path, vec!["connectOrCreate", "create"]);
        assert_eq!(failure.error, ValidationError::MissingField);
    }

    #[test]
    fn test_update_context_gates_operations() {
        let registry = registry();
        let validator = crops_validator(&registry, WriteContext::Create);

        let err = validator
            .validate(&json!({"deleteMany": {"name": "oak"}}))
            .unwrap_err();
        assert!(matches!(
            err.iter().next().unwrap().error,
            ValidationError::UpdateOnlyOperation { .. }
        ));
    }

    #[test]
    fn test_update_many_pairs_filter_and_data() {
        let registry = registry();
        let validator = crops_validator(&registry, WriteContext::Update);

        let mutations = validator
            .validate(&json!({"updateMany": {
                "where": {"name": {"contains": "oak"}},
                "data": {"name": {"set": "red oak"}},
            }}))
            .unwrap();
        match &mutations[0] {
            RelationMutation::UpdateMany(updates) => {
                assert_eq!(updates.len(), 1);
                assert!(matches!(updates[0].filter, FilterNode::Scalar(_)));
            }
            other => panic!("expected UpdateMany, got {other:?}"),
        }
    }

    #[test]
    fn test_to_many_only_ops_rejected_on_to_one() {
        let registry = registry();
        let validator = registry
            .relation_validator("Project", "organization", WriteContext::Update)
            .unwrap();

        let err = validator.validate(&json!({"set": [{"id": "o1"}]})).unwrap_err();
        assert!(matches!(
            err.iter().next().unwrap().error,
            ValidationError::CardinalityMismatch { .. }
        ));
    }

    #[test]
    fn test_to_one_update_takes_document_directly() {
        let registry = registry();
        let validator = registry
            .relation_validator("Project", "organization", WriteContext::Update)
            .unwrap();

        let mutations = validator
            .validate(&json!({"update": {"name": {"set": "Rainforest Trust"}}}))
            .unwrap();
        match &mutations[0] {
            RelationMutation::Update(updates) => {
                assert!(updates[0].selector.is_none());
                assert_eq!(updates[0].data.fields.len(), 1);
            }
            other => panic!("expected Update, got {other:?}"),
        }
    }

    #[test]
    fn test_disconnect_cardinality_rules() {
        let registry = registry();

        // Optional to-one: flag form.
        let validator = registry
            .relation_validator("Project", "organization", WriteContext::Update)
            .unwrap();
        let mutations = validator.validate(&json!({"disconnect": true})).unwrap();
        assert!(matches!(
            mutations[0],
            RelationMutation::Disconnect(DisconnectSpec::One)
        ));
        assert!(validator.validate(&json!({"disconnect": "yes"})).is_err());

        // Required to-one: never legal.
        let validator = registry
            .relation_validator("Crop", "project", WriteContext::Update)
            .unwrap();
        let err = validator.validate(&json!({"disconnect": true})).unwrap_err();
        assert!(matches!(
            err.iter().next().unwrap().error,
            ValidationError::CardinalityMismatch { .. }
        ));

        // To-many: selector list.
        let validator = crops_validator(&registry, WriteContext::Update);
        let mutations = validator
            .validate(&json!({"disconnect": [{"id": "c1"}]}))
            .unwrap();
        assert!(matches!(
            mutations[0],
            RelationMutation::Disconnect(DisconnectSpec::Many(ref sels)) if sels.len() == 1
        ));
    }

    #[test]
    fn test_upsert_shapes() {
        let registry = registry();

        let validator = crops_validator(&registry, WriteContext::Update);
        let mutations = validator
            .validate(&json!({"upsert": {
                "where": {"id": "c1"},
                "update": {"name": {"set": "oak"}},
                "create": {"name": "oak"},
            }}))
            .unwrap();
        assert!(matches!(mutations[0], RelationMutation::Upsert(_)));

        let validator = registry
            .relation_validator("Project", "organization", WriteContext::Update)
            .unwrap();
        let mutations = validator
            .validate(&json!({"upsert": {
                "update": {"name": {"set": "x"}},
                "create": {"id": "o1", "name": "x"},
            }}))
            .unwrap();
        match &mutations[0] {
            RelationMutation::Upsert(upserts) => assert!(upserts[0].selector.is_none()),
            other => panic!("expected Upsert, got {other:?}"),
        }
    }

    #[test]
    fn test_delete_cardinality_rules() {
        let registry = registry();

        let validator = crops_validator(&registry, WriteContext::Update);
        let mutations = validator.validate(&json!({"delete": [{"id": "c1"}]})).unwrap();
        assert!(matches!(
            mutations[0],
            RelationMutation::Delete(DeleteSpec::Many(_))
        ));

        let validator = registry
            .relation_validator("Crop", "project", WriteContext::Update)
            .unwrap();
        let err = validator.validate(&json!({"delete": true})).unwrap_err();
        assert!(matches!(
            err.iter().next().unwrap().error,
            ValidationError::CardinalityMismatch { .. }
        ));
    }

    #[test]
    fn test_checked_variant_rejects_back_reference_foreign_key() {
        let registry = registry();
        let validator = crops_validator(&registry, WriteContext::Create);

        // The parent row is identified by the nested mutation itself;
        // the back-reference foreign key must not also be supplied.
        let err = validator
            .validate(&json!({"create": {"name": "oak", "projectId": "p1"}}))
            .unwrap_err();
        let failure = err.iter().next().unwrap();
        assert_eq!(failure.path, vec!["create", "projectId"]);
        assert!(matches!(
            failure.error,
            ValidationError::MixedRelationPayload { .. }
        ));
    }

    #[test]
    fn test_unknown_operation_rejected() {
        let registry = registry();
        let validator = crops_validator(&registry, WriteContext::Update);

        let err = validator.validate(&json!({"merge": {}})).unwrap_err();
        assert!(matches!(
            err.iter().next().unwrap().error,
            ValidationError::UnknownKey(ref k) if k == "merge"
        ));
    }
}
