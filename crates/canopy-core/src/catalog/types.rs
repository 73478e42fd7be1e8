//! Scalar kind definitions for the catalog.

use serde::{Deserialize, Serialize};

/// Scalar kinds a field may take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarType {
    /// Boolean value.
    Boolean,
    /// 64-bit signed integer.
    Int,
    /// 64-bit floating point.
    Float,
    /// Exact decimal (the canonical decimal representation).
    Decimal,
    /// UTF-8 string.
    String,
    /// Absolute instant.
    DateTime,
    /// A registered enum, referenced by name.
    Enum(String),
}

impl ScalarType {
    /// Check if this kind is numeric (valid for arithmetic update
    /// operations and for `_avg`/`_sum` aggregates).
    pub fn is_numeric(&self) -> bool {
        matches!(self, ScalarType::Int | ScalarType::Float | ScalarType::Decimal)
    }

    /// Check if this kind has a total order (valid for `lt`/`lte`/`gt`/
    /// `gte` filters and `_min`/`_max` aggregates).
    pub fn is_orderable(&self) -> bool {
        matches!(
            self,
            ScalarType::Int
                | ScalarType::Float
                | ScalarType::Decimal
                | ScalarType::String
                | ScalarType::DateTime
        )
    }

    /// Check if this kind is a string.
    pub fn is_string(&self) -> bool {
        matches!(self, ScalarType::String)
    }

    /// Get the referenced enum name, if this is an enum kind.
    pub fn enum_name(&self) -> Option<&str> {
        match self {
            ScalarType::Enum(name) => Some(name),
            _ => None,
        }
    }

    /// Short name of this kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ScalarType::Boolean => "boolean",
            ScalarType::Int => "integer",
            ScalarType::Float => "float",
            ScalarType::Decimal => "decimal",
            ScalarType::String => "string",
            ScalarType::DateTime => "datetime",
            ScalarType::Enum(_) => "enum",
        }
    }
}
