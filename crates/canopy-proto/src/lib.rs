//! Canopy IR types.
//!
//! This crate defines the validated intermediate representation produced
//! by the Canopy engine and consumed by a persistence/query layer:
//!
//! # Modules
//!
//! - [`value`] - Runtime value types, including the canonical decimal
//! - [`filter`] - Validated where-filter expression trees
//! - [`query`] - Order-by, group-by, and aggregate selections
//! - [`mutation`] - Write documents, update operations, and nested
//!   relation mutations
//!
//! All types derive `serde::Serialize` / `serde::Deserialize` so callers
//! can ship them across process boundaries.

pub mod filter;
pub mod mutation;
pub mod query;
pub mod value;

// Re-export commonly used types at crate root
pub use filter::{
    FilterNode, RelationLeaf, RelationQuantifier, ScalarCondition, ScalarLeaf, StringMode,
};
pub use mutation::{
    ApplyError, DeleteSpec, DisconnectSpec, EntityDocument, FieldAssign, FieldValue,
    FilteredUpdate, NestedConnectOrCreate, NestedUpdate, NestedUpsert, RelationMutation,
    RelationWrite, UniqueSelector, WriteOp,
};
pub use query::{
    AggregateSelect, CountSelect, NullsOrder, OrderSpec, OrderTarget, SortDirection,
};
pub use value::{compare_values, values_equal, Value};

/// Re-export the canonical decimal type.
pub use rust_decimal::Decimal;
