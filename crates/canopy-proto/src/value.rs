//! Runtime value types shared between the validation engine and its callers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A validated runtime value.
///
/// This enum represents all values that can appear in validated payloads,
/// filter operands, and unique selectors. It maps to the scalar kinds
/// declared in the schema catalog. Enum values are carried as strings;
/// membership has already been checked against the enum's variant set by
/// the time a `Value` exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value (only produced for nullable fields).
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// Exact decimal value. All accepted decimal input notations normalize
    /// into this one representation.
    Decimal(Decimal),
    /// UTF-8 string (also carries enum variant values).
    String(String),
    /// Absolute instant in UTC.
    DateTime(DateTime<Utc>),
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is numeric (int, float, or decimal).
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_) | Value::Decimal(_))
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to get as an exact decimal.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as a datetime.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::DateTime(t) => Some(*t),
            _ => None,
        }
    }

    /// Short name of this value's kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::DateTime(_) => "datetime",
        }
    }

    /// Widen a numeric value to an exact decimal, if possible.
    ///
    /// Integers convert exactly; floats go through their shortest
    /// round-trip rendering so `0.1f64` widens to decimal `0.1`.
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Int(i) => Some(Decimal::from(*i)),
            Value::Decimal(d) => Some(*d),
            Value::Float(f) if f.is_finite() => format!("{f}").parse().ok(),
            _ => None,
        }
    }
}

/// Check if two values are equal.
///
/// Numeric values compare through the decimal representation, so the
/// notation used to construct either operand never affects the result:
/// `Int(16)` equals `Decimal(16)` regardless of whether the decimal was
/// parsed from `"16"` or `"0x10"`.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::DateTime(a), Value::DateTime(b)) => a == b,
        _ if a.is_numeric() && b.is_numeric() => match (a.to_decimal(), b.to_decimal()) {
            (Some(da), Some(db)) => da == db,
            _ => false,
        },
        _ => false,
    }
}

/// Compare two values, returning their ordering if comparable.
///
/// Numeric kinds cross-compare through the decimal representation;
/// strings and datetimes compare within their own kind. Booleans and
/// nulls are not ordered.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
        _ if a.is_numeric() && b.is_numeric() => {
            match (a.to_decimal(), b.to_decimal()) {
                (Some(da), Some(db)) => Some(da.cmp(&db)),
                // Non-finite floats have no decimal form.
                _ => None,
            }
        }
        _ => None,
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::DateTime(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_kind_numeric_equality() {
        let int = Value::Int(16);
        let dec = Value::Decimal(Decimal::from(16));
        let float = Value::Float(16.0);

        assert!(values_equal(&int, &dec));
        assert!(values_equal(&int, &float));
        assert!(values_equal(&dec, &float));
    }

    #[test]
    fn test_float_widens_exactly() {
        // 0.1 must widen to decimal 0.1, not its binary expansion.
        let widened = Value::Float(0.1).to_decimal().unwrap();
        assert_eq!(widened, "0.1".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_compare_across_kinds() {
        let a = Value::Int(3);
        let b = Value::Decimal("3.5".parse().unwrap());
        assert_eq!(compare_values(&a, &b), Some(Ordering::Less));
        assert_eq!(compare_values(&b, &a), Some(Ordering::Greater));
    }

    #[test]
    fn test_incomparable_kinds() {
        assert_eq!(compare_values(&Value::Bool(true), &Value::Bool(false)), None);
        assert_eq!(
            compare_values(&Value::String("a".into()), &Value::Int(1)),
            None
        );
        assert!(!values_equal(&Value::Null, &Value::Int(0)));
    }

    #[test]
    fn test_non_finite_float_has_no_decimal() {
        assert!(Value::Float(f64::INFINITY).to_decimal().is_none());
        assert!(Value::Float(f64::NAN).to_decimal().is_none());
    }
}
