//! Schema catalog: descriptors and the two-phase registry.

mod entity;
mod enums;
mod field;
mod registry;
mod relation;
mod types;

pub use entity::{EntityDescriptor, UniqueKey};
pub use enums::{EnumDescriptor, EnumRegistry};
pub use field::FieldDescriptor;
pub use registry::{SchemaBuilder, SchemaRegistry};
pub use relation::{Cardinality, PolymorphicTarget, RelationDescriptor, RelationTarget};
pub use types::ScalarType;
