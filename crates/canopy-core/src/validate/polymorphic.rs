//! Polymorphic reference validation.
//!
//! A polymorphic relation stores a `(discriminator, id)` field pair that
//! must jointly resolve to a row in one of several tables. The storage
//! layer has no native support for such a reference, so the only
//! shape-level guarantee the engine can give is that the discriminator
//! value is a member of the closed tag set. Whether the referenced row
//! exists is an invariant the persistence layer must enforce at
//! write/read time. It is deliberately not checked here, because checking
//! it would make the store a hard dependency of validation.

use crate::catalog::{RelationDescriptor, RelationTarget};
use crate::validate::outcome::{Failure, ValidationError};
use canopy_proto::Value;

/// Validate a discriminator value against the permissible tag set.
pub fn validate_polymorphic_ref(
    discriminator_value: &str,
    allowed_tags: &[&str],
) -> Result<(), ValidationError> {
    if allowed_tags.contains(&discriminator_value) {
        Ok(())
    } else {
        Err(ValidationError::UnknownDiscriminator {
            value: discriminator_value.to_string(),
            allowed: allowed_tags.join(", "),
        })
    }
}

/// Check a polymorphic relation's discriminator field inside an entity
/// payload, if the payload assigned it. Returns a failure attributed to
/// the discriminator field's path.
pub fn check_discriminator_assignment(
    relation: &RelationDescriptor,
    assigned: &[(String, Value)],
) -> Result<(), Failure> {
    let RelationTarget::Polymorphic {
        discriminator_field,
        ..
    } = &relation.target
    else {
        return Ok(());
    };

    let Some((_, value)) = assigned.iter().find(|(name, _)| name == discriminator_field) else {
        return Ok(());
    };
    let Value::String(tag) = value else {
        // Kind errors were already reported by the field validator.
        return Ok(());
    };

    let tags = relation.allowed_tags();
    validate_polymorphic_ref(tag, &tags)
        .map_err(|error| Failure::at(discriminator_field.clone(), error))
}
