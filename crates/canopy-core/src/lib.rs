//! Canopy Core - Schema catalog, validators, and filter builders.
//!
//! Canopy turns a declarative entity schema (fields, nullability,
//! enums, relations, unique keys) into strict input validators and
//! composable filter builders. A caller registers descriptors once
//! through [`SchemaBuilder`], then uses the frozen [`SchemaRegistry`]
//! to validate payloads into the typed IR defined in `canopy-proto`.
//! The engine performs no I/O: filter trees and write documents are
//! handed to a persistence layer for execution.

pub mod catalog;
pub mod error;
pub mod mutation;
pub mod query;
pub mod validate;

pub use catalog::{
    Cardinality, EntityDescriptor, EnumDescriptor, EnumRegistry, FieldDescriptor,
    PolymorphicTarget, RelationDescriptor, RelationTarget, ScalarType, SchemaBuilder,
    SchemaRegistry, UniqueKey,
};
pub use error::ConfigError;
pub use mutation::{RelationMutationValidator, WriteContext};
pub use query::{
    AggregateSelectValidator, AggregateSpec, GroupByValidator, OrderByValidator, WhereValidator,
};
pub use validate::{
    coerce_decimal, validate_polymorphic_ref, EntityValidator, Failure, Failures,
    ValidationError, ValidationMode, ValidationResult, WhereUniqueValidator,
};

/// Re-export the IR types.
pub use canopy_proto as proto;
