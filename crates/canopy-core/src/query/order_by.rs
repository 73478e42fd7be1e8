//! Order-by validation.

use crate::catalog::EntityDescriptor;
use crate::validate::field::json_kind;
use crate::validate::outcome::{Failure, Failures, ValidationError, ValidationResult};
use canopy_proto::{NullsOrder, OrderSpec, OrderTarget, SortDirection};
use serde_json::Value as Json;

/// Validates order-by inputs for one entity: field names mapped to
/// `asc`/`desc` (optionally with a nulls modifier on nullable fields),
/// or a to-many relation's `_count`.
pub struct OrderByValidator<'a> {
    entity: &'a EntityDescriptor,
}

impl<'a> OrderByValidator<'a> {
    pub(crate) fn new(entity: &'a EntityDescriptor) -> Self {
        Self { entity }
    }

    /// Validate one ordering object or an array of them.
    pub fn validate(&self, raw: &Json) -> ValidationResult<Vec<OrderSpec>> {
        let mut failures = Failures::new();
        let mut specs = Vec::new();

        match raw {
            Json::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    match self.validate_one(item) {
                        Ok(inner) => specs.extend(inner),
                        Err(nested) => failures.extend_under(&index.to_string(), nested),
                    }
                }
            }
            _ => match self.validate_one(raw) {
                Ok(inner) => specs.extend(inner),
                Err(nested) => failures.extend(nested),
            },
        }

        failures.into_result(specs)
    }

    fn validate_one(&self, raw: &Json) -> ValidationResult<Vec<OrderSpec>> {
        let Json::Object(map) = raw else {
            return Err(Failures::one(Failure::root(ValidationError::TypeMismatch {
                expected: "object",
                actual: json_kind(raw),
            })));
        };

        let mut failures = Failures::new();
        let mut specs = Vec::new();

        for (key, value) in map {
            if let Some(field) = self.entity.field(key) {
                match self.validate_field_order(key, field.nullable, value) {
                    Ok(spec) => specs.push(spec),
                    Err(error) => failures.push(Failure::at(key.clone(), error)),
                }
            } else if let Some(relation) = self.entity.relation(key) {
                if !relation.cardinality.is_to_many() {
                    failures.push(Failure::at(
                        key.clone(),
                        ValidationError::CardinalityMismatch {
                            operation: "_count".into(),
                            cardinality: relation.cardinality.name(),
                        },
                    ));
                    continue;
                }
                match self.validate_count_order(key, value) {
                    Ok(spec) => specs.push(spec),
                    Err(error) => failures.push(Failure::at(key.clone(), error)),
                }
            } else {
                failures.push(Failure::at(
                    key.clone(),
                    ValidationError::UnknownKey(key.clone()),
                ));
            }
        }

        failures.into_result(specs)
    }

    fn validate_field_order(
        &self,
        field: &str,
        nullable: bool,
        raw: &Json,
    ) -> Result<OrderSpec, ValidationError> {
        match raw {
            Json::String(_) => Ok(OrderSpec {
                target: OrderTarget::Field(field.to_string()),
                direction: parse_direction(raw)?,
                nulls: None,
            }),
            Json::Object(map) => {
                let mut direction = None;
                let mut nulls = None;
                for (key, value) in map {
                    match key.as_str() {
                        "sort" => direction = Some(parse_direction(value)?),
                        "nulls" => {
                            if !nullable {
                                return Err(ValidationError::OperatorNotSupported {
                                    operator: "nulls".into(),
                                    kind: "non-nullable",
                                });
                            }
                            nulls = Some(parse_nulls(value)?);
                        }
                        other => return Err(ValidationError::UnknownKey(other.to_string())),
                    }
                }
                Ok(OrderSpec {
                    target: OrderTarget::Field(field.to_string()),
                    direction: direction.ok_or(ValidationError::EmptyOperation)?,
                    nulls,
                })
            }
            other => Err(ValidationError::TypeMismatch {
                expected: "\"asc\", \"desc\", or a sort object",
                actual: json_kind(other),
            }),
        }
    }

    fn validate_count_order(&self, relation: &str, raw: &Json) -> Result<OrderSpec, ValidationError> {
        let Json::Object(map) = raw else {
            return Err(ValidationError::TypeMismatch {
                expected: "object",
                actual: json_kind(raw),
            });
        };
        let mut direction = None;
        for (key, value) in map {
            if key != "_count" {
                return Err(ValidationError::UnknownKey(key.clone()));
            }
            direction = Some(parse_direction(value)?);
        }
        Ok(OrderSpec {
            target: OrderTarget::RelationCount(relation.to_string()),
            direction: direction.ok_or(ValidationError::EmptyOperation)?,
            nulls: None,
        })
    }
}

fn parse_direction(raw: &Json) -> Result<SortDirection, ValidationError> {
    match raw.as_str() {
        Some("asc") => Ok(SortDirection::Asc),
        Some("desc") => Ok(SortDirection::Desc),
        _ => Err(ValidationError::TypeMismatch {
            expected: "\"asc\" or \"desc\"",
            actual: raw.to_string(),
        }),
    }
}

fn parse_nulls(raw: &Json) -> Result<NullsOrder, ValidationError> {
    match raw.as_str() {
        Some("first") => Ok(NullsOrder::First),
        Some("last") => Ok(NullsOrder::Last),
        _ => Err(ValidationError::TypeMismatch {
            expected: "\"first\" or \"last\"",
            actual: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        FieldDescriptor, RelationDescriptor, ScalarType, SchemaBuilder, SchemaRegistry,
    };
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        let mut builder = SchemaBuilder::new();
        builder.register_entity(
            EntityDescriptor::new("Project")
                .with_field(FieldDescriptor::new("id", ScalarType::String).unique())
                .with_field(FieldDescriptor::new("name", ScalarType::String))
                .with_field(FieldDescriptor::new("closedAt", ScalarType::DateTime).nullable())
                .with_relation(RelationDescriptor::to_many("lands", "Land"))
                .with_relation(
                    RelationDescriptor::to_one_optional("organization", "Organization")
                        .with_foreign_key("organizationId"),
                )
                .with_field(FieldDescriptor::new("organizationId", ScalarType::String).nullable()),
        );
        builder.register_entity(
            EntityDescriptor::new("Land")
                .with_field(FieldDescriptor::new("id", ScalarType::String).unique()),
        );
        builder.register_entity(
            EntityDescriptor::new("Organization")
                .with_field(FieldDescriptor::new("id", ScalarType::String).unique()),
        );
        builder.build().unwrap()
    }

    #[test]
    fn test_simple_direction() {
        let registry = registry();
        let validator = registry.order_by_validator("Project").unwrap();

        let specs = validator.validate(&json!({"name": "asc"})).unwrap();
        assert_eq!(specs, vec![OrderSpec::asc("name")]);
    }

    #[test]
    fn test_array_of_terms() {
        let registry = registry();
        let validator = registry.order_by_validator("Project").unwrap();

        let specs = validator
            .validate(&json!([{"name": "desc"}, {"id": "asc"}]))
            .unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].direction, SortDirection::Desc);
    }

    #[test]
    fn test_nulls_modifier_on_nullable_field() {
        let registry = registry();
        let validator = registry.order_by_validator("Project").unwrap();

        let specs = validator
            .validate(&json!({"closedAt": {"sort": "desc", "nulls": "last"}}))
            .unwrap();
        assert_eq!(specs[0].nulls, Some(NullsOrder::Last));

        let err = validator
            .validate(&json!({"name": {"sort": "asc", "nulls": "first"}}))
            .unwrap_err();
        assert!(matches!(
            err.iter().next().unwrap().error,
            ValidationError::OperatorNotSupported { .. }
        ));
    }

    #[test]
    fn test_relation_count_ordering() {
        let registry = registry();
        let validator = registry.order_by_validator("Project").unwrap();

        let specs = validator
            .validate(&json!({"lands": {"_count": "desc"}}))
            .unwrap();
        assert_eq!(
            specs[0].target,
            OrderTarget::RelationCount("lands".to_string())
        );

        // _count on a to-one relation makes no sense.
        let err = validator
            .validate(&json!({"organization": {"_count": "asc"}}))
            .unwrap_err();
        assert!(matches!(
            err.iter().next().unwrap().error,
            ValidationError::CardinalityMismatch { .. }
        ));
    }

    #[test]
    fn test_invalid_direction_and_unknown_field() {
        let registry = registry();
        let validator = registry.order_by_validator("Project").unwrap();

        assert!(validator.validate(&json!({"name": "up"})).is_err());
        let err = validator.validate(&json!({"bogus": "asc"})).unwrap_err();
        assert!(matches!(
            err.iter().next().unwrap().error,
            ValidationError::UnknownKey(_)
        ));
    }
}
