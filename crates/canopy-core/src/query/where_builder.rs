//! Where-filter validation for one entity.
//!
//! Produces a [`FilterNode`] tree; never executes anything. Validators
//! for related entities are resolved by name through the registry at
//! validation time, not held as direct references, so entities whose
//! relation graphs contain cycles validate without any eager
//! construction. Repeated use of the same validator is stable.

use crate::catalog::{EntityDescriptor, RelationDescriptor, SchemaRegistry};
use crate::query::scalar_filter::validate_scalar_filter;
use crate::validate::field::json_kind;
use crate::validate::outcome::{Failure, Failures, ValidationError, ValidationResult};
use canopy_proto::{FilterNode, RelationLeaf, RelationQuantifier};
use serde_json::Value as Json;

/// Validates where-filters for one entity.
pub struct WhereValidator<'a> {
    registry: &'a SchemaRegistry,
    entity: &'a EntityDescriptor,
}

impl<'a> WhereValidator<'a> {
    pub(crate) fn new(registry: &'a SchemaRegistry, entity: &'a EntityDescriptor) -> Self {
        Self { registry, entity }
    }

    /// Validate a raw where-filter into a [`FilterNode`].
    ///
    /// A payload with several top-level keys is an implicit conjunction.
    /// An empty payload (or an empty `AND` array) is the identity filter.
    pub fn validate(&self, raw: &Json) -> ValidationResult<FilterNode> {
        let Json::Object(map) = raw else {
            return Err(Failures::one(Failure::root(ValidationError::TypeMismatch {
                expected: "object",
                actual: json_kind(raw),
            })));
        };

        let mut failures = Failures::new();
        let mut children: Vec<FilterNode> = Vec::new();

        for (key, value) in map {
            match key.as_str() {
                "AND" | "OR" => match self.validate_node_list(key, value, &mut failures) {
                    Some(nodes) if key == "AND" => children.push(FilterNode::And(nodes)),
                    Some(nodes) => children.push(FilterNode::Or(nodes)),
                    None => {}
                },
                "NOT" => {
                    // NOT accepts a single node or an array (negated-AND).
                    if value.is_array() {
                        if let Some(nodes) = self.validate_node_list(key, value, &mut failures) {
                            children.push(FilterNode::not(FilterNode::And(nodes)));
                        }
                    } else {
                        match self.validate(value) {
                            Ok(node) => children.push(FilterNode::not(node)),
                            Err(nested) => failures.extend_under(key, nested),
                        }
                    }
                }
                _ => {
                    if let Some(field) = self.entity.field(key) {
                        match validate_scalar_filter(self.registry.enums(), field, value) {
                            Ok(leaf) => children.push(FilterNode::Scalar(leaf)),
                            Err(error) => failures.push(Failure::at(key.clone(), error)),
                        }
                    } else if let Some(relation) = self.entity.relation(key) {
                        self.validate_relation(relation, value, &mut children, &mut failures);
                    } else {
                        failures.push(Failure::at(
                            key.clone(),
                            ValidationError::UnknownKey(key.clone()),
                        ));
                    }
                }
            }
        }

        let node = match children.len() {
            1 => children.pop().expect("len checked above"),
            _ => FilterNode::And(children),
        };
        failures.into_result(node)
    }

    /// Validate an `AND`/`OR`/array-`NOT` operand: an array of nodes.
    fn validate_node_list(
        &self,
        key: &str,
        value: &Json,
        failures: &mut Failures,
    ) -> Option<Vec<FilterNode>> {
        let Json::Array(items) = value else {
            failures.push(Failure::at(
                key.to_string(),
                ValidationError::TypeMismatch {
                    expected: "array",
                    actual: json_kind(value),
                },
            ));
            return None;
        };

        let mut nodes = Vec::with_capacity(items.len());
        let mut ok = true;
        for (index, item) in items.iter().enumerate() {
            match self.validate(item) {
                Ok(node) => nodes.push(node),
                Err(nested) => {
                    let mut under_index = Failures::new();
                    under_index.extend_under(&index.to_string(), nested);
                    failures.extend_under(key, under_index);
                    ok = false;
                }
            }
        }
        ok.then_some(nodes)
    }

    /// Validate a relation key's quantifier object. Nested filters are
    /// validated against the target entity's own where-validator.
    fn validate_relation(
        &self,
        relation: &RelationDescriptor,
        value: &Json,
        children: &mut Vec<FilterNode>,
        failures: &mut Failures,
    ) {
        if relation.is_polymorphic() {
            failures.push(Failure::at(
                relation.name.clone(),
                ValidationError::PolymorphicNested {
                    relation: relation.name.clone(),
                },
            ));
            return;
        }
        let target = relation
            .target_entity()
            .expect("non-polymorphic relation has a single target");
        let target_validator = WhereValidator::new(
            self.registry,
            self.registry
                .entity(target)
                .expect("relation targets resolved at build time"),
        );

        let Json::Object(quantifiers) = value else {
            failures.push(Failure::at(
                relation.name.clone(),
                ValidationError::TypeMismatch {
                    expected: "object",
                    actual: json_kind(value),
                },
            ));
            return;
        };

        for (qkey, qvalue) in quantifiers {
            let quantifier = match (qkey.as_str(), relation.cardinality.is_to_many()) {
                ("is", false) => RelationQuantifier::Is,
                ("isNot", false) => RelationQuantifier::IsNot,
                ("every", true) => RelationQuantifier::Every,
                ("some", true) => RelationQuantifier::Some,
                ("none", true) => RelationQuantifier::None,
                ("is" | "isNot" | "every" | "some" | "none", _) => {
                    failures.push(Failure::at(
                        relation.name.clone(),
                        ValidationError::QuantifierMismatch {
                            quantifier: qkey.clone(),
                            cardinality: relation.cardinality.name(),
                        },
                    ));
                    continue;
                }
                _ => {
                    failures.push(Failure::at(
                        relation.name.clone(),
                        ValidationError::UnknownKey(qkey.clone()),
                    ));
                    continue;
                }
            };

            // `is: null` / `isNot: null` test the relation itself.
            let filter = if qvalue.is_null()
                && matches!(quantifier, RelationQuantifier::Is | RelationQuantifier::IsNot)
            {
                None
            } else {
                match target_validator.validate(qvalue) {
                    Ok(node) => Some(Box::new(node)),
                    Err(nested) => {
                        let mut under_quantifier = Failures::new();
                        under_quantifier.extend_under(qkey, nested);
                        failures.extend_under(&relation.name, under_quantifier);
                        continue;
                    }
                }
            };

            children.push(FilterNode::Relation(RelationLeaf {
                relation: relation.name.clone(),
                quantifier,
                filter,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        EntityDescriptor, FieldDescriptor, PolymorphicTarget, RelationDescriptor, ScalarType,
        SchemaBuilder,
    };
    use canopy_proto::{ScalarCondition, StringMode, Value};
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        let mut builder = SchemaBuilder::new();
        builder.register_entity(
            EntityDescriptor::new("Project")
                .with_field(FieldDescriptor::new("id", ScalarType::String).unique())
                .with_field(FieldDescriptor::new("name", ScalarType::String))
                .with_field(FieldDescriptor::new("deleted", ScalarType::Boolean))
                .with_relation(RelationDescriptor::to_many("lands", "Land"))
                .with_relation(
                    RelationDescriptor::to_one_optional("organization", "Organization")
                        .with_foreign_key("organizationId"),
                )
                .with_field(
                    FieldDescriptor::new("organizationId", ScalarType::String).nullable(),
                ),
        );
        builder.register_entity(
            EntityDescriptor::new("Land")
                .with_field(FieldDescriptor::new("id", ScalarType::String).unique())
                .with_field(FieldDescriptor::new("area", ScalarType::Decimal))
                .with_field(FieldDescriptor::new("projectId", ScalarType::String))
                .with_relation(
                    RelationDescriptor::to_one("project", "Project").with_foreign_key("projectId"),
                ),
        );
        builder.register_entity(
            EntityDescriptor::new("Organization")
                .with_field(FieldDescriptor::new("id", ScalarType::String).unique())
                .with_field(FieldDescriptor::new("name", ScalarType::String)),
        );
        builder.register_entity(
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
        builder.build().unwrap()
    }

    #[test]
    fn test_combinators_with_negation() {
        let registry = registry();
        let validator = registry.where_validator("Project").unwrap();

        let node = validator
            .validate(&json!({
                "AND": [
                    {"name": {"contains": "oak", "mode": "insensitive"}},
                    {"NOT": {"deleted": true}},
                ]
            }))
            .unwrap();

        let FilterNode::And(children) = node else {
            panic!("expected top-level And");
        };
        assert_eq!(children.len(), 2);
        match &children[0] {
            FilterNode::Scalar(leaf) => {
                assert_eq!(leaf.mode, StringMode::Insensitive);
                assert_eq!(leaf.conditions, vec![ScalarCondition::Contains("oak".into())]);
            }
            other => panic!("expected scalar leaf, got {other:?}"),
        }
        match &children[1] {
            FilterNode::Not(inner) => assert!(matches!(**inner, FilterNode::Scalar(_))),
            other => panic!("expected negation, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_combinators_are_identity() {
        let registry = registry();
        let validator = registry.where_validator("Project").unwrap();

        assert_eq!(
            validator.validate(&json!({"AND": []})).unwrap(),
            FilterNode::And(vec![])
        );
        assert_eq!(
            validator.validate(&json!({"OR": []})).unwrap(),
            FilterNode::Or(vec![])
        );
        assert_eq!(validator.validate(&json!({})).unwrap(), FilterNode::And(vec![]));
    }

    #[test]
    fn test_top_level_keys_are_implicitly_anded() {
        let registry = registry();
        let validator = registry.where_validator("Project").unwrap();

        let node = validator
            .validate(&json!({"name": "Oak Hill", "deleted": false}))
            .unwrap();
        assert!(matches!(node, FilterNode::And(ref children) if children.len() == 2));
    }

    #[test]
    fn test_not_accepts_array() {
        let registry = registry();
        let validator = registry.where_validator("Project").unwrap();

        let node = validator
            .validate(&json!({"NOT": [{"deleted": true}, {"name": "x"}]}))
            .unwrap();
        match node {
            FilterNode::Not(inner) => {
                assert!(matches!(*inner, FilterNode::And(ref nodes) if nodes.len() == 2));
            }
            other => panic!("expected Not, got {other:?}"),
        }
    }

    #[test]
    fn test_relation_quantifiers() {
        let registry = registry();
        let validator = registry.where_validator("Project").unwrap();

        let node = validator
            .validate(&json!({"lands": {"some": {"area": {"gt": "10"}}}}))
            .unwrap();
        match node {
            FilterNode::Relation(leaf) => {
                assert_eq!(leaf.quantifier, RelationQuantifier::Some);
                assert!(leaf.filter.is_some());
            }
            other => panic!("expected relation leaf, got {other:?}"),
        }
    }

    #[test]
    fn test_quantifier_cardinality_mismatch() {
        let registry = registry();
        let validator = registry.where_validator("Project").unwrap();

        let err = validator
            .validate(&json!({"lands": {"is": {"area": "1"}}}))
            .unwrap_err();
        assert!(matches!(
            err.iter().next().unwrap().error,
            ValidationError::QuantifierMismatch { .. }
        ));

        let err = validator
            .validate(&json!({"organization": {"every": {}}}))
            .unwrap_err();
        assert!(matches!(
            err.iter().next().unwrap().error,
            ValidationError::QuantifierMismatch { .. }
        ));
    }

    #[test]
    fn test_to_one_null_test() {
        let registry = registry();
        let validator = registry.where_validator("Project").unwrap();

        let node = validator.validate(&json!({"organization": {"is": null}})).unwrap();
        match node {
            FilterNode::Relation(leaf) => {
                assert_eq!(leaf.quantifier, RelationQuantifier::Is);
                assert!(leaf.filter.is_none());
            }
            other => panic!("expected relation leaf, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_filter_validated_against_target() {
        let registry = registry();
        let validator = registry.where_validator("Project").unwrap();

        // "deleted" is a Project field, not a Land field.
        let err = validator
            .validate(&json!({"lands": {"some": {"deleted": true}}}))
            .unwrap_err();
        let failure = err.iter().next().unwrap();
        assert_eq!(failure.path, vec!["lands", "some", "deleted"]);
        assert!(matches!(failure.error, ValidationError::UnknownKey(_)));
    }

    #[test]
    fn test_cyclic_filters_resolve_lazily() {
        let registry = registry();
        let validator = registry.where_validator("Project").unwrap();

        // Project -> lands -> project -> Project again.
        let raw = json!({
            "lands": {"some": {"project": {"is": {"name": "Oak Hill"}}}}
        });
        let first = validator.validate(&raw).unwrap();
        let second = validator.validate(&raw).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let registry = registry();
        let validator = registry.where_validator("Project").unwrap();

        let err = validator.validate(&json!({"XOR": []})).unwrap_err();
        assert!(matches!(
            err.iter().next().unwrap().error,
            ValidationError::UnknownKey(ref k) if k == "XOR"
        ));

        let err = validator
            .validate(&json!({"lands": {"any": {}}}))
            .unwrap_err();
        assert!(matches!(
            err.iter().next().unwrap().error,
            ValidationError::UnknownKey(ref k) if k == "any"
        ));
    }

    #[test]
    fn test_polymorphic_relation_not_filterable() {
        let registry = registry();
        let validator = registry.where_validator("Source").unwrap();

        // The raw discriminator scalar is filterable; the relation is not.
        assert!(validator
            .validate(&json!({"parentTable": "projectTable"}))
            .is_ok());
        let err = validator
            .validate(&json!({"parent": {"is": {}}}))
            .unwrap_err();
        assert!(matches!(
            err.iter().next().unwrap().error,
            ValidationError::PolymorphicNested { .. }
        ));
    }

    #[test]
    fn test_failure_paths_in_combinator_lists() {
        let registry = registry();
        let validator = registry.where_validator("Project").unwrap();

        let err = validator
            .validate(&json!({"OR": [{"name": "ok"}, {"bogus": 1}]}))
            .unwrap_err();
        let failure = err.iter().next().unwrap();
        assert_eq!(failure.path, vec!["OR", "1", "bogus"]);
    }

    #[test]
    fn test_implicit_equals_on_scalar() {
        let registry = registry();
        let validator = registry.where_validator("Project").unwrap();

        let node = validator.validate(&json!({"name": "Oak Hill"})).unwrap();
        match node {
            FilterNode::Scalar(leaf) => {
                assert_eq!(
                    leaf.conditions,
                    vec![ScalarCondition::Equals(Value::String("Oak Hill".into()))]
                );
            }
            other => panic!("expected scalar leaf, got {other:?}"),
        }
    }
}
