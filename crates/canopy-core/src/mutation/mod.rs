//! Write-side input validation: update operations and nested relation
//! mutations.

pub mod relation;
pub mod update;

pub use relation::{RelationMutationValidator, WriteContext};
pub use update::validate_write_op;
