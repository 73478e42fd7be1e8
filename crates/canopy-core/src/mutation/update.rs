//! Update-operation wrappers on scalar fields.
//!
//! In update payloads a scalar field accepts either a bare replacement
//! value or an operation wrapper: numeric fields take `set`, `increment`,
//! `decrement`, `multiply`, or `divide`; everything else takes `set`
//! only. A wrapper must carry exactly one operator key.

use crate::catalog::{EnumRegistry, FieldDescriptor};
use crate::validate::decimal::is_parts_object;
use crate::validate::field::{validate_non_null, validate_scalar};
use crate::validate::outcome::ValidationError;
use canopy_proto::WriteOp;
use serde_json::Value as Json;

const OPERATORS: [&str; 5] = ["set", "increment", "decrement", "multiply", "divide"];

/// Validate a scalar entry of an update payload into a [`WriteOp`].
pub fn validate_write_op(
    enums: &EnumRegistry,
    field: &FieldDescriptor,
    raw: &Json,
) -> Result<WriteOp, ValidationError> {
    match raw {
        // A decimal parts object is a bare value, not an operation
        // wrapper; everything else object-shaped must be a wrapper.
        Json::Object(map) if !is_parts_object(map) => validate_wrapper(enums, field, map),
        _ => validate_scalar(enums, field, raw).map(WriteOp::Set),
    }
}

fn validate_wrapper(
    enums: &EnumRegistry,
    field: &FieldDescriptor,
    map: &serde_json::Map<String, Json>,
) -> Result<WriteOp, ValidationError> {
    let mut operator: Option<&str> = None;
    for key in map.keys() {
        if !OPERATORS.contains(&key.as_str()) {
            return Err(ValidationError::UnknownKey(key.clone()));
        }
        if let Some(first) = operator {
            return Err(ValidationError::ConflictingOperators {
                first: first.to_string(),
                second: key.clone(),
            });
        }
        operator = Some(key);
    }
    let operator = operator.ok_or(ValidationError::EmptyOperation)?;
    let operand = &map[operator];

    if operator == "set" {
        return validate_scalar(enums, field, operand).map(WriteOp::Set);
    }

    if !field.scalar.is_numeric() {
        return Err(ValidationError::OperatorNotSupported {
            operator: operator.to_string(),
            kind: field.scalar.kind_name(),
        });
    }

    let value = validate_non_null(enums, &field.scalar, operand)?;
    Ok(match operator {
        "increment" => WriteOp::Increment(value),
        "decrement" => WriteOp::Decrement(value),
        "multiply" => WriteOp::Multiply(value),
        _ => WriteOp::Divide(value),
    })
}
