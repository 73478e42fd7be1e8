//! Canopy - A schema-driven validation and filter-construction engine.
//!
//! Register an entity schema once, then validate create/update payloads,
//! where-filters, ordering, grouping, aggregation, and nested relation
//! mutations against it. Validation produces typed IR for a persistence
//! layer to execute; the engine itself performs no I/O.
//!
//! ```
//! use canopy::{EntityDescriptor, FieldDescriptor, ScalarType, SchemaBuilder, ValidationMode};
//! use serde_json::json;
//!
//! let mut builder = SchemaBuilder::new();
//! builder.register_enum("TreatmentType", ["ARR", "improved_forest_management"]);
//! builder.register_entity(
//!     EntityDescriptor::new("Land")
//!         .with_field(FieldDescriptor::new("id", ScalarType::String).unique())
//!         .with_field(FieldDescriptor::new(
//!             "treatmentType",
//!             ScalarType::Enum("TreatmentType".into()),
//!         )),
//! );
//! let registry = builder.build().expect("schema is well-formed");
//!
//! let validator = registry.validator("Land", ValidationMode::Strict).unwrap();
//! assert!(validator
//!     .validate(&json!({"id": "l1", "treatmentType": "ARR"}))
//!     .is_ok());
//! ```

pub use canopy_core::{
    catalog, coerce_decimal, error, mutation, query, validate, validate_polymorphic_ref,
    AggregateSelectValidator, AggregateSpec, Cardinality, ConfigError, EntityDescriptor,
    EntityValidator, EnumDescriptor, EnumRegistry, Failure, Failures, FieldDescriptor,
    GroupByValidator, OrderByValidator, PolymorphicTarget, RelationDescriptor,
    RelationMutationValidator, RelationTarget, ScalarType, SchemaBuilder, SchemaRegistry,
    UniqueKey, ValidationError, ValidationMode, ValidationResult, WhereUniqueValidator,
    WhereValidator, WriteContext,
};

/// Re-export the IR types.
pub use canopy_proto as proto;
