//! Validated ordering, grouping, and aggregation inputs.

use serde::{Deserialize, Serialize};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

/// Placement of nulls when ordering by a nullable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NullsOrder {
    /// Nulls sort before all values.
    First,
    /// Nulls sort after all values.
    Last,
}

/// What an order specification sorts by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderTarget {
    /// A scalar field on the entity.
    Field(String),
    /// The row count of a to-many relation.
    RelationCount(String),
}

/// One validated ordering term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpec {
    /// What to sort by.
    pub target: OrderTarget,
    /// Sort direction.
    pub direction: SortDirection,
    /// Null placement; only ever set for nullable fields.
    pub nulls: Option<NullsOrder>,
}

impl OrderSpec {
    /// Ascending order on a field.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            target: OrderTarget::Field(field.into()),
            direction: SortDirection::Asc,
            nulls: None,
        }
    }

    /// Descending order on a field.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            target: OrderTarget::Field(field.into()),
            direction: SortDirection::Desc,
            nulls: None,
        }
    }
}

/// Which rows `_count` covers in an aggregate selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountSelect {
    /// Count all rows.
    All,
    /// Count non-null values of the named fields.
    Fields(Vec<String>),
}

/// A validated aggregate selection.
///
/// `avg`/`sum` only ever name numeric fields and `min`/`max` only
/// orderable ones; the validator enforces this before the value exists.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AggregateSelect {
    /// Row or per-field counting.
    pub count: Option<CountSelect>,
    /// Fields to average.
    pub avg: Vec<String>,
    /// Fields to sum.
    pub sum: Vec<String>,
    /// Fields to take the minimum of.
    pub min: Vec<String>,
    /// Fields to take the maximum of.
    pub max: Vec<String>,
}

impl AggregateSelect {
    /// Check whether the selection selects anything at all.
    pub fn is_empty(&self) -> bool {
        self.count.is_none()
            && self.avg.is_empty()
            && self.sum.is_empty()
            && self.min.is_empty()
            && self.max.is_empty()
    }
}
