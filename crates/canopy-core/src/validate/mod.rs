//! Per-request validation: outcomes, scalar coercion, and whole-entity
//! payloads.

pub mod decimal;
pub mod entity;
pub mod field;
pub mod outcome;
pub mod polymorphic;

pub use decimal::coerce_decimal;
pub use entity::{EntityValidator, ValidationMode, WhereUniqueValidator};
pub use field::validate_scalar;
pub use outcome::{Failure, Failures, ValidationError, ValidationResult};
pub use polymorphic::validate_polymorphic_ref;
