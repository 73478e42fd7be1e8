//! Filter-operand validation for single scalar fields.
//!
//! A filter operand is either a bare value (implicit equals) or a strict
//! operator object. Unknown operator keys are a validation failure by
//! design: silently ignoring them would turn caller typos into filters
//! that match everything.

use crate::catalog::{EnumRegistry, FieldDescriptor};
use crate::validate::decimal::is_parts_object;
use crate::validate::field::{json_kind, validate_non_null, validate_scalar};
use crate::validate::outcome::ValidationError;
use canopy_proto::{ScalarCondition, ScalarLeaf, StringMode, Value};
use serde_json::Value as Json;

/// Validate one field's filter operand into a [`ScalarLeaf`].
pub fn validate_scalar_filter(
    enums: &EnumRegistry,
    field: &FieldDescriptor,
    raw: &Json,
) -> Result<ScalarLeaf, ValidationError> {
    match raw {
        Json::Object(map) if !is_parts_object(map) => {
            let mut mode = StringMode::Default;
            let conditions = validate_operator_object(enums, field, map, &mut mode)?;
            Ok(ScalarLeaf {
                field: field.name.clone(),
                conditions,
                mode,
            })
        }
        _ => {
            let value = validate_scalar(enums, field, raw)?;
            Ok(ScalarLeaf {
                field: field.name.clone(),
                conditions: vec![ScalarCondition::Equals(value)],
                mode: StringMode::Default,
            })
        }
    }
}

fn validate_operator_object(
    enums: &EnumRegistry,
    field: &FieldDescriptor,
    map: &serde_json::Map<String, Json>,
    mode: &mut StringMode,
) -> Result<Vec<ScalarCondition>, ValidationError> {
    let mut conditions = Vec::new();

    for (key, operand) in map {
        match key.as_str() {
            "equals" => {
                conditions.push(ScalarCondition::Equals(validate_operand(
                    enums, field, operand,
                )?));
            }
            "in" | "notIn" => {
                let Json::Array(items) = operand else {
                    return Err(ValidationError::TypeMismatch {
                        expected: "array",
                        actual: json_kind(operand),
                    });
                };
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(validate_operand(enums, field, item)?);
                }
                conditions.push(if key == "in" {
                    ScalarCondition::In(values)
                } else {
                    ScalarCondition::NotIn(values)
                });
            }
            "lt" | "lte" | "gt" | "gte" => {
                if !field.scalar.is_orderable() {
                    return Err(ValidationError::OperatorNotSupported {
                        operator: key.clone(),
                        kind: field.scalar.kind_name(),
                    });
                }
                let value = validate_operand(enums, field, operand)?;
                conditions.push(match key.as_str() {
                    "lt" => ScalarCondition::Lt(value),
                    "lte" => ScalarCondition::Lte(value),
                    "gt" => ScalarCondition::Gt(value),
                    _ => ScalarCondition::Gte(value),
                });
            }
            "contains" | "startsWith" | "endsWith" => {
                if !field.scalar.is_string() {
                    return Err(ValidationError::OperatorNotSupported {
                        operator: key.clone(),
                        kind: field.scalar.kind_name(),
                    });
                }
                let needle = operand
                    .as_str()
                    .ok_or_else(|| ValidationError::TypeMismatch {
                        expected: "string",
                        actual: json_kind(operand),
                    })?
                    .to_string();
                conditions.push(match key.as_str() {
                    "contains" => ScalarCondition::Contains(needle),
                    "startsWith" => ScalarCondition::StartsWith(needle),
                    _ => ScalarCondition::EndsWith(needle),
                });
            }
            "mode" => {
                if !field.scalar.is_string() {
                    return Err(ValidationError::OperatorNotSupported {
                        operator: key.clone(),
                        kind: field.scalar.kind_name(),
                    });
                }
                *mode = match operand.as_str() {
                    Some("default") => StringMode::Default,
                    Some("insensitive") => StringMode::Insensitive,
                    _ => {
                        return Err(ValidationError::TypeMismatch {
                            expected: "\"default\" or \"insensitive\"",
                            actual: operand.to_string(),
                        })
                    }
                };
            }
            "not" => {
                // `not` nests either a bare value or another operator
                // object; its conditions negate as a group.
                let nested = match operand {
                    Json::Object(inner) if !is_parts_object(inner) => {
                        validate_operator_object(enums, field, inner, mode)?
                    }
                    _ => vec![ScalarCondition::Equals(validate_operand(
                        enums, field, operand,
                    )?)],
                };
                conditions.push(ScalarCondition::Not(nested));
            }
            other => return Err(ValidationError::UnknownKey(other.to_string())),
        }
    }

    Ok(conditions)
}

/// A filter operand value: the field's own kind, or null for nullable
/// fields (every operator accepts null there).
fn validate_operand(
    enums: &EnumRegistry,
    field: &FieldDescriptor,
    raw: &Json,
) -> Result<Value, ValidationError> {
    if raw.is_null() {
        return if field.nullable {
            Ok(Value::Null)
        } else {
            Err(ValidationError::NotNullable)
        };
    }
    validate_non_null(enums, &field.scalar, raw)
}
