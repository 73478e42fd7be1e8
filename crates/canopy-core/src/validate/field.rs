//! Bare-value validation for single fields.

use crate::catalog::{EnumRegistry, FieldDescriptor, ScalarType};
use crate::validate::decimal::coerce_decimal;
use crate::validate::outcome::ValidationError;
use canopy_proto::Value;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value as Json;

/// Short name of a raw JSON value's kind, used in diagnostics.
pub fn json_kind(raw: &Json) -> String {
    match raw {
        Json::Null => "null".to_string(),
        Json::Bool(_) => "boolean".to_string(),
        Json::Number(_) => "number".to_string(),
        Json::String(_) => "string".to_string(),
        Json::Array(_) => "array".to_string(),
        Json::Object(_) => "object".to_string(),
    }
}

/// Validate a bare value against a field's declared kind and nullability.
///
/// Produces the typed, coerced value; the raw input is never mutated.
/// Defaults are not fabricated here; absence handling is the entity
/// validator's concern.
pub fn validate_scalar(
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

/// Validate a bare, non-null value against a scalar kind.
pub fn validate_non_null(
    enums: &EnumRegistry,
    scalar: &ScalarType,
    raw: &Json,
) -> Result<Value, ValidationError> {
    let mismatch = |expected: &'static str| ValidationError::TypeMismatch {
        expected,
        actual: json_kind(raw),
    };

    match scalar {
        ScalarType::Boolean => raw.as_bool().map(Value::Bool).ok_or(mismatch("boolean")),
        ScalarType::Int => raw.as_i64().map(Value::Int).ok_or(mismatch("integer")),
        ScalarType::Float => raw.as_f64().map(Value::Float).ok_or(mismatch("float")),
        ScalarType::Decimal => coerce_decimal(raw).map(Value::Decimal),
        ScalarType::String => raw
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or(mismatch("string")),
        ScalarType::DateTime => parse_datetime(raw).map(Value::DateTime),
        ScalarType::Enum(enum_name) => {
            let value = raw.as_str().ok_or(mismatch("enum variant"))?;
            let known = enums
                .get(enum_name)
                .map(|e| e.contains(value))
                .unwrap_or(false);
            if known {
                Ok(Value::String(value.to_string()))
            } else {
                Err(ValidationError::EnumViolation {
                    enum_name: enum_name.clone(),
                    value: value.to_string(),
                })
            }
        }
    }
}

/// Accept anything coercible to an absolute instant: an RFC 3339 string
/// or integer epoch milliseconds.
fn parse_datetime(raw: &Json) -> Result<DateTime<Utc>, ValidationError> {
    match raw {
        Json::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|_| ValidationError::InvalidDateTime { value: s.clone() }),
        Json::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .ok_or_else(|| ValidationError::InvalidDateTime {
                value: n.to_string(),
            }),
        other => Err(ValidationError::TypeMismatch {
            expected: "datetime",
            actual: json_kind(other),
        }),
    }
}
