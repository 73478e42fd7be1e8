//! Whole-entity payload validation.

use crate::catalog::{EntityDescriptor, SchemaRegistry};
use crate::mutation::relation::{RelationMutationValidator, WriteContext};
use crate::mutation::update::validate_write_op;
use crate::validate::field::{json_kind, validate_scalar};
use crate::validate::outcome::{Failure, Failures, ValidationError, ValidationResult};
use crate::validate::polymorphic::check_discriminator_assignment;
use canopy_proto::{
    EntityDocument, FieldAssign, FieldValue, RelationWrite, UniqueSelector, Value, WriteOp,
};
use serde_json::Value as Json;

/// How strictly an entity payload is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Every non-nullable field required; unknown keys rejected.
    Strict,
    /// Every field optional; unknown keys still rejected.
    Partial,
    /// Strict, except server-defaulted fields become optional. The
    /// validator never fabricates the default; the store supplies it at
    /// write time.
    CreateWithDefaults,
    /// Every field optional; scalar entries accept operation wrappers
    /// and relation entries accept update-context mutations.
    Update,
}

impl ValidationMode {
    fn is_update(self) -> bool {
        matches!(self, ValidationMode::Update)
    }

    fn requires(self, nullable: bool, has_default: bool) -> bool {
        match self {
            ValidationMode::Strict => !nullable,
            ValidationMode::CreateWithDefaults => !nullable && !has_default,
            ValidationMode::Partial | ValidationMode::Update => false,
        }
    }
}

/// Validates one entity's payloads in a fixed mode.
///
/// Cheap to construct; borrows the registry and resolves related
/// entities by name only when a payload actually nests them.
pub struct EntityValidator<'a> {
    registry: &'a SchemaRegistry,
    entity: &'a EntityDescriptor,
    mode: ValidationMode,
    /// Foreign keys implied by the enclosing nested mutation, as
    /// `(back-relation name, field name)` pairs. Implied fields are
    /// neither required nor accepted: the nested mutation itself
    /// identifies the parent row (the checked write variant).
    implied: Vec<(String, String)>,
}

impl<'a> EntityValidator<'a> {
    pub(crate) fn new(
        registry: &'a SchemaRegistry,
        entity: &'a EntityDescriptor,
        mode: ValidationMode,
    ) -> Self {
        Self {
            registry,
            entity,
            mode,
            implied: Vec::new(),
        }
    }

    pub(crate) fn with_implied(
        registry: &'a SchemaRegistry,
        entity: &'a EntityDescriptor,
        mode: ValidationMode,
        implied: Vec<(String, String)>,
    ) -> Self {
        Self {
            registry,
            entity,
            mode,
            implied,
        }
    }

    /// Validate a raw payload into an [`EntityDocument`].
    ///
    /// All failures are accumulated and attributed to field paths; the
    /// raw input is never mutated.
    pub fn validate(&self, raw: &Json) -> ValidationResult<EntityDocument> {
        let Json::Object(map) = raw else {
            return Err(Failures::one(Failure::root(ValidationError::TypeMismatch {
                expected: "object",
                actual: json_kind(raw),
            })));
        };

        let mut failures = Failures::new();
        let mut fields: Vec<FieldAssign> = Vec::new();
        let mut relations: Vec<RelationWrite> = Vec::new();

        for (key, value) in map {
            if let Some((relation, field)) = self
                .implied
                .iter()
                .find(|(_, field)| field == key)
            {
                failures.push(Failure::at(
                    key.clone(),
                    ValidationError::MixedRelationPayload {
                        relation: relation.clone(),
                        field: field.clone(),
                    },
                ));
            } else if let Some(field) = self.entity.field(key) {
                let parsed = if self.mode.is_update() {
                    validate_write_op(self.registry.enums(), field, value)
                } else {
                    validate_scalar(self.registry.enums(), field, value).map(WriteOp::Set)
                };
                match parsed {
                    Ok(op) => fields.push(FieldAssign {
                        field: key.clone(),
                        op,
                    }),
                    Err(error) => failures.push(Failure::at(key.clone(), error)),
                }
            } else if let Some(relation) = self.entity.relation(key) {
                let context = if self.mode.is_update() {
                    WriteContext::Update
                } else {
                    WriteContext::Create
                };
                let validator =
                    RelationMutationValidator::new(self.registry, self.entity, relation, context);
                match validator.validate(value) {
                    Ok(mutations) => relations.push(RelationWrite {
                        relation: key.clone(),
                        mutations,
                    }),
                    Err(nested) => failures.extend_under(key, nested),
                }
            } else {
                failures.push(Failure::at(
                    key.clone(),
                    ValidationError::UnknownKey(key.clone()),
                ));
            }
        }

        for field in &self.entity.fields {
            if self.mode.requires(field.nullable, field.has_default)
                && !map.contains_key(&field.name)
                && !self.implied.iter().any(|(_, implied)| implied == &field.name)
            {
                failures.push(Failure::at(
                    field.name.clone(),
                    ValidationError::MissingField,
                ));
            }
        }

        // A relation must be written either through its nested mutation
        // or through its raw foreign-key scalar, never both at once.
        for relation in &self.entity.relations {
            if let Some(fk) = &relation.foreign_key {
                if map.contains_key(&relation.name) && map.contains_key(fk) {
                    failures.push(Failure::at(
                        fk.clone(),
                        ValidationError::MixedRelationPayload {
                            relation: relation.name.clone(),
                            field: fk.clone(),
                        },
                    ));
                }
            }
        }

        let assigned: Vec<(String, Value)> = fields
            .iter()
            .filter_map(|a| match &a.op {
                WriteOp::Set(value) => Some((a.field.clone(), value.clone())),
                _ => None,
            })
            .collect();
        for relation in &self.entity.relations {
            if let Err(failure) = check_discriminator_assignment(relation, &assigned) {
                failures.push(failure);
            }
        }

        failures.into_result(EntityDocument { fields, relations })
    }
}

/// Validates where-unique selectors for one entity: a single unique
/// field, or a declared compound key as an object. Exactly one selector
/// shape must match.
pub struct WhereUniqueValidator<'a> {
    registry: &'a SchemaRegistry,
    entity: &'a EntityDescriptor,
}

impl<'a> WhereUniqueValidator<'a> {
    pub(crate) fn new(registry: &'a SchemaRegistry, entity: &'a EntityDescriptor) -> Self {
        Self { registry, entity }
    }

    fn expected_shapes(&self) -> String {
        let mut shapes: Vec<&str> = self
            .entity
            .unique_fields()
            .map(|f| f.name.as_str())
            .collect();
        shapes.extend(self.entity.unique_keys.iter().map(|k| k.name.as_str()));
        shapes.join(", ")
    }

    fn reject(&self) -> Failures {
        Failures::one(Failure::root(ValidationError::InvalidUniqueSelector {
            expected: self.expected_shapes(),
        }))
    }

    /// Validate a raw where-unique selector.
    pub fn validate(&self, raw: &Json) -> ValidationResult<UniqueSelector> {
        let Json::Object(map) = raw else {
            return Err(self.reject());
        };
        if map.len() != 1 {
            return Err(self.reject());
        }
        let (key, value) = map.iter().next().expect("len checked above");

        if let Some(field) = self.entity.field(key) {
            if !field.unique {
                return Err(self.reject());
            }
            if value.is_null() {
                return Err(Failures::one(Failure::at(
                    key.clone(),
                    ValidationError::NotNullable,
                )));
            }
            return match validate_scalar(self.registry.enums(), field, value) {
                Ok(typed) => Ok(UniqueSelector::Single {
                    field: key.clone(),
                    value: typed,
                }),
                Err(error) => Err(Failures::one(Failure::at(key.clone(), error))),
            };
        }

        if let Some(unique_key) = self.entity.unique_key(key) {
            let Json::Object(parts) = value else {
                return Err(Failures::one(Failure::at(
                    key.clone(),
                    ValidationError::TypeMismatch {
                        expected: "object",
                        actual: json_kind(value),
                    },
                )));
            };

            let mut failures = Failures::new();
            let mut fields = Vec::new();
            for member in &unique_key.fields {
                let descriptor = self
                    .entity
                    .field(member)
                    .expect("unique key members checked at build time");
                match parts.get(member) {
                    Some(part) if !part.is_null() => {
                        match validate_scalar(self.registry.enums(), descriptor, part) {
                            Ok(typed) => fields.push(FieldValue {
                                field: member.clone(),
                                value: typed,
                            }),
                            Err(error) => {
                                failures.push(Failure::at(member.clone(), error));
                            }
                        }
                    }
                    _ => failures.push(Failure::at(member.clone(), ValidationError::MissingField)),
                }
            }
            for part_key in parts.keys() {
                if !unique_key.fields.iter().any(|f| f == part_key) {
                    failures.push(Failure::at(
                        part_key.clone(),
                        ValidationError::UnknownKey(part_key.clone()),
                    ));
                }
            }

            let mut prefixed = Failures::new();
            prefixed.extend_under(key, failures);
            return prefixed.into_result(UniqueSelector::Compound {
                key: key.clone(),
                fields,
            });
        }

        Err(self.reject())
    }
}
