//! Validated write documents: field assignments, update operations, and
//! nested relation mutations.

use crate::filter::FilterNode;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when applying an update operation to a stored value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApplyError {
    /// Arithmetic on incompatible kinds.
    #[error("cannot apply {operation} to {current} with {operand} operand")]
    TypeMismatch {
        /// Operation name.
        operation: &'static str,
        /// Kind of the stored value.
        current: &'static str,
        /// Kind of the operand.
        operand: &'static str,
    },
    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// The result does not fit the value's representation.
    #[error("arithmetic overflow applying {operation}")]
    Overflow {
        /// Operation name.
        operation: &'static str,
    },
}

/// A validated write operation on one scalar field.
///
/// Create payloads only ever carry `Set`; update payloads may carry any
/// variant on numeric fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WriteOp {
    /// Replace the stored value.
    Set(Value),
    /// Add the operand to the stored value.
    Increment(Value),
    /// Subtract the operand from the stored value.
    Decrement(Value),
    /// Multiply the stored value by the operand.
    Multiply(Value),
    /// Divide the stored value by the operand.
    Divide(Value),
}

impl WriteOp {
    /// Operation name, used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            WriteOp::Set(_) => "set",
            WriteOp::Increment(_) => "increment",
            WriteOp::Decrement(_) => "decrement",
            WriteOp::Multiply(_) => "multiply",
            WriteOp::Divide(_) => "divide",
        }
    }

    /// Apply this operation to the currently stored value.
    ///
    /// Arithmetic never round-trips through floating point unless both
    /// operands are floats: integer pairs use checked 64-bit arithmetic,
    /// and any decimal operand promotes the whole operation to exact
    /// decimal arithmetic.
    pub fn apply(&self, current: &Value) -> Result<Value, ApplyError> {
        let (operation, operand) = match self {
            WriteOp::Set(v) => return Ok(v.clone()),
            WriteOp::Increment(v) => ("increment", v),
            WriteOp::Decrement(v) => ("decrement", v),
            WriteOp::Multiply(v) => ("multiply", v),
            WriteOp::Divide(v) => ("divide", v),
        };

        match (current, operand) {
            (Value::Int(a), Value::Int(b)) => {
                let result = match operation {
                    "increment" => a.checked_add(*b),
                    "decrement" => a.checked_sub(*b),
                    "multiply" => a.checked_mul(*b),
                    _ => {
                        if *b == 0 {
                            return Err(ApplyError::DivisionByZero);
                        }
                        a.checked_div(*b)
                    }
                };
                result.map(Value::Int).ok_or(ApplyError::Overflow { operation })
            }
            (Value::Float(a), b) if b.is_numeric() && !matches!(b, Value::Decimal(_)) => {
                let b = match b {
                    Value::Float(f) => *f,
                    Value::Int(i) => *i as f64,
                    _ => unreachable!(),
                };
                Ok(Value::Float(match operation {
                    "increment" => a + b,
                    "decrement" => a - b,
                    "multiply" => a * b,
                    _ => a / b,
                }))
            }
            (a, b) if a.is_numeric() && b.is_numeric() => {
                let (da, db) = match (a.to_decimal(), b.to_decimal()) {
                    (Some(da), Some(db)) => (da, db),
                    _ => {
                        return Err(ApplyError::TypeMismatch {
                            operation,
                            current: a.kind_name(),
                            operand: b.kind_name(),
                        })
                    }
                };
                let result = match operation {
                    "increment" => da.checked_add(db),
                    "decrement" => da.checked_sub(db),
                    "multiply" => da.checked_mul(db),
                    _ => {
                        if db.is_zero() {
                            return Err(ApplyError::DivisionByZero);
                        }
                        da.checked_div(db)
                    }
                };
                result
                    .map(Value::Decimal)
                    .ok_or(ApplyError::Overflow { operation })
            }
            (a, b) => Err(ApplyError::TypeMismatch {
                operation,
                current: a.kind_name(),
                operand: b.kind_name(),
            }),
        }
    }
}

/// A field name paired with a plain value (used in unique selectors).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    /// Field name.
    pub field: String,
    /// Field value.
    pub value: Value,
}

impl FieldValue {
    /// Create a new field-value pair.
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// A field name paired with a write operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAssign {
    /// Field name.
    pub field: String,
    /// Operation to perform.
    pub op: WriteOp,
}

impl FieldAssign {
    /// Create a plain `Set` assignment.
    pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: WriteOp::Set(value.into()),
        }
    }
}

/// A validated entity payload.
///
/// One generic document type serves both create and update contexts;
/// create-mode validation only ever emits `Set` assignments.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityDocument {
    /// Scalar field assignments.
    pub fields: Vec<FieldAssign>,
    /// Nested relation mutations.
    pub relations: Vec<RelationWrite>,
}

impl EntityDocument {
    /// Look up an assignment by field name.
    pub fn field(&self, name: &str) -> Option<&FieldAssign> {
        self.fields.iter().find(|a| a.field == name)
    }
}

/// A validated reference to exactly one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UniqueSelector {
    /// A single unique field.
    Single {
        /// Unique field name.
        field: String,
        /// Field value.
        value: Value,
    },
    /// A declared compound unique key.
    Compound {
        /// Compound key name.
        key: String,
        /// One value per member field.
        fields: Vec<FieldValue>,
    },
}

/// A where-unique selector paired with a create payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedConnectOrCreate {
    /// Row to connect if it exists.
    pub selector: UniqueSelector,
    /// Payload to create otherwise.
    pub create: EntityDocument,
}

/// A targeted nested update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedUpdate {
    /// Row to update; `None` on to-one relations (the related row is
    /// already identified by the parent).
    pub selector: Option<UniqueSelector>,
    /// Update payload.
    pub data: EntityDocument,
}

/// A filtered bulk update on a to-many relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredUpdate {
    /// Rows to update.
    pub filter: FilterNode,
    /// Update payload.
    pub data: EntityDocument,
}

/// A nested upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedUpsert {
    /// Row to upsert; `None` on to-one relations.
    pub selector: Option<UniqueSelector>,
    /// Payload applied when the row exists.
    pub update: EntityDocument,
    /// Payload applied when it does not.
    pub create: EntityDocument,
}

/// Rows affected by a delete through a relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeleteSpec {
    /// Delete the single related row (to-one).
    One,
    /// Delete the selected rows (to-many).
    Many(Vec<UniqueSelector>),
}

/// Rows detached by a disconnect through a relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DisconnectSpec {
    /// Detach the single related row (optional to-one).
    One,
    /// Detach the selected rows (to-many).
    Many(Vec<UniqueSelector>),
}

/// One validated mutation through a relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RelationMutation {
    /// Create related rows.
    Create(Vec<EntityDocument>),
    /// Connect existing rows.
    Connect(Vec<UniqueSelector>),
    /// Connect if present, create otherwise.
    ConnectOrCreate(Vec<NestedConnectOrCreate>),
    /// Update related rows by unique selector.
    Update(Vec<NestedUpdate>),
    /// Update related rows by filter (to-many only).
    UpdateMany(Vec<FilteredUpdate>),
    /// Update or create related rows.
    Upsert(Vec<NestedUpsert>),
    /// Delete related rows.
    Delete(DeleteSpec),
    /// Delete related rows by filter (to-many only).
    DeleteMany(Vec<FilterNode>),
    /// Detach related rows without deleting them.
    Disconnect(DisconnectSpec),
    /// Replace the whole related collection (to-many only).
    Set(Vec<UniqueSelector>),
}

/// All mutations supplied for one relation in a payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationWrite {
    /// Relation name on the enclosing entity.
    pub relation: String,
    /// Mutations, in payload order.
    pub mutations: Vec<RelationMutation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_set_replaces() {
        let op = WriteOp::Set(Value::Int(10));
        assert_eq!(op.apply(&Value::Int(3)).unwrap(), Value::Int(10));
    }

    #[test]
    fn test_integer_arithmetic_is_checked() {
        let op = WriteOp::Increment(Value::Int(1));
        assert_eq!(op.apply(&Value::Int(41)).unwrap(), Value::Int(42));

        let op = WriteOp::Increment(Value::Int(1));
        assert_eq!(
            op.apply(&Value::Int(i64::MAX)),
            Err(ApplyError::Overflow { operation: "increment" })
        );

        let op = WriteOp::Divide(Value::Int(0));
        assert_eq!(op.apply(&Value::Int(10)), Err(ApplyError::DivisionByZero));
    }

    #[test]
    fn test_decimal_arithmetic_is_exact() {
        // 0.1 + 0.2 is not exactly representable in binary floating point;
        // the decimal path must still produce exactly 0.3.
        let stored = Value::Decimal("0.1".parse().unwrap());
        let op = WriteOp::Increment(Value::Decimal("0.2".parse().unwrap()));
        assert_eq!(
            op.apply(&stored).unwrap(),
            Value::Decimal("0.3".parse().unwrap())
        );
    }

    #[test]
    fn test_int_operand_promotes_to_decimal() {
        let stored = Value::Decimal("2.5".parse().unwrap());
        let op = WriteOp::Multiply(Value::Int(4));
        assert_eq!(
            op.apply(&stored).unwrap(),
            Value::Decimal(Decimal::from(10))
        );
    }

    #[test]
    fn test_decimal_division_by_zero() {
        let stored = Value::Decimal(Decimal::from(1));
        let op = WriteOp::Divide(Value::Decimal(Decimal::ZERO));
        assert_eq!(op.apply(&stored), Err(ApplyError::DivisionByZero));
    }

    #[test]
    fn test_arithmetic_on_strings_is_rejected() {
        let op = WriteOp::Increment(Value::Int(1));
        assert!(matches!(
            op.apply(&Value::String("oak".into())),
            Err(ApplyError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_document_field_lookup() {
        let doc = EntityDocument {
            fields: vec![FieldAssign::set("name", "oak")],
            relations: vec![],
        };
        assert!(doc.field("name").is_some());
        assert!(doc.field("missing").is_none());
    }
}
