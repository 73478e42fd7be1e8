//! Group-by and aggregate-selection validation.
//!
//! Which aggregate functions an entity offers per field is decided when
//! the schema is registered, not per request: offering `_avg`/`_sum` on
//! a non-numeric field is a [`ConfigError`] at build time. Requests can
//! then only fail in ordinary, recoverable ways.

use crate::catalog::{EntityDescriptor, ScalarType};
use crate::error::ConfigError;
use crate::validate::field::json_kind;
use crate::validate::outcome::{Failure, Failures, ValidationError, ValidationResult};
use canopy_proto::{AggregateSelect, CountSelect};
use serde_json::Value as Json;

/// Which fields each aggregate function is offered on. Built once per
/// entity during registry construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateSpec {
    avg: Vec<String>,
    sum: Vec<String>,
    min: Vec<String>,
    max: Vec<String>,
}

impl AggregateSpec {
    /// Build a spec from explicit field sets, enforcing that `avg`/`sum`
    /// only cover numeric fields and `min`/`max` only orderable ones.
    pub fn new(
        entity: &EntityDescriptor,
        avg: Vec<String>,
        sum: Vec<String>,
        min: Vec<String>,
        max: Vec<String>,
    ) -> Result<Self, ConfigError> {
        let check = |fields: &[String],
                     function: &'static str,
                     allowed: fn(&ScalarType) -> bool|
         -> Result<(), ConfigError> {
            for name in fields {
                let numeric_enough = entity.field(name).map(|f| allowed(&f.scalar));
                if numeric_enough != Some(true) {
                    return Err(ConfigError::AggregateOnNonNumeric {
                        entity: entity.name.clone(),
                        field: name.clone(),
                        function,
                    });
                }
            }
            Ok(())
        };

        check(&avg, "_avg", ScalarType::is_numeric)?;
        check(&sum, "_sum", ScalarType::is_numeric)?;
        check(&min, "_min", ScalarType::is_orderable)?;
        check(&max, "_max", ScalarType::is_orderable)?;

        Ok(Self { avg, sum, min, max })
    }

    /// Derive the spec from an entity's field kinds.
    pub fn for_entity(entity: &EntityDescriptor) -> Result<Self, ConfigError> {
        let numeric: Vec<String> = entity
            .fields
            .iter()
            .filter(|f| f.scalar.is_numeric())
            .map(|f| f.name.clone())
            .collect();
        let orderable: Vec<String> = entity
            .fields
            .iter()
            .filter(|f| f.scalar.is_orderable())
            .map(|f| f.name.clone())
            .collect();
        Self::new(entity, numeric.clone(), numeric, orderable.clone(), orderable)
    }

    fn offered(&self, function: &str) -> &[String] {
        match function {
            "_avg" => &self.avg,
            "_sum" => &self.sum,
            "_min" => &self.min,
            _ => &self.max,
        }
    }
}

/// Validates group-by inputs: an array of the entity's own scalar field
/// names, without duplicates.
pub struct GroupByValidator<'a> {
    entity: &'a EntityDescriptor,
}

impl<'a> GroupByValidator<'a> {
    pub(crate) fn new(entity: &'a EntityDescriptor) -> Self {
        Self { entity }
    }

    /// Validate a raw group-by list.
    pub fn validate(&self, raw: &Json) -> ValidationResult<Vec<String>> {
        let Json::Array(items) = raw else {
            return Err(Failures::one(Failure::root(ValidationError::TypeMismatch {
                expected: "array",
                actual: json_kind(raw),
            })));
        };

        let mut failures = Failures::new();
        let mut fields = Vec::new();
        for (index, item) in items.iter().enumerate() {
            let at_index = |error| Failure::at(index.to_string(), error);
            match item.as_str() {
                Some(name) if self.entity.field(name).is_some() => {
                    if fields.iter().any(|f| f == name) {
                        failures.push(at_index(ValidationError::DuplicateKey(name.to_string())));
                    } else {
                        fields.push(name.to_string());
                    }
                }
                Some(name) => {
                    failures.push(at_index(ValidationError::UnknownKey(name.to_string())));
                }
                None => failures.push(at_index(ValidationError::TypeMismatch {
                    expected: "field name",
                    actual: json_kind(item),
                })),
            }
        }
        failures.into_result(fields)
    }
}

/// Validates aggregate selections (`_count`, `_avg`, `_sum`, `_min`,
/// `_max`) against the entity's aggregate spec.
pub struct AggregateSelectValidator<'a> {
    entity: &'a EntityDescriptor,
    spec: &'a AggregateSpec,
}

impl<'a> AggregateSelectValidator<'a> {
    pub(crate) fn new(entity: &'a EntityDescriptor, spec: &'a AggregateSpec) -> Self {
        Self { entity, spec }
    }

    /// Validate a raw aggregate selection.
    pub fn validate(&self, raw: &Json) -> ValidationResult<AggregateSelect> {
        let Json::Object(map) = raw else {
            return Err(Failures::one(Failure::root(ValidationError::TypeMismatch {
                expected: "object",
                actual: json_kind(raw),
            })));
        };

        let mut failures = Failures::new();
        let mut select = AggregateSelect::default();

        for (key, value) in map {
            match key.as_str() {
                "_count" => match value {
                    Json::Bool(true) => select.count = Some(CountSelect::All),
                    Json::Object(fields) => {
                        let mut named = Vec::new();
                        self.collect_fields(key, fields, None, &mut named, &mut failures);
                        select.count = Some(CountSelect::Fields(named));
                    }
                    other => failures.push(Failure::at(
                        key.clone(),
                        ValidationError::TypeMismatch {
                            expected: "true or a field selection",
                            actual: json_kind(other),
                        },
                    )),
                },
                "_avg" | "_sum" | "_min" | "_max" => {
                    let Json::Object(fields) = value else {
                        failures.push(Failure::at(
                            key.clone(),
                            ValidationError::TypeMismatch {
                                expected: "field selection",
                                actual: json_kind(value),
                            },
                        ));
                        continue;
                    };
                    let mut named = Vec::new();
                    self.collect_fields(
                        key,
                        fields,
                        Some(self.spec.offered(key)),
                        &mut named,
                        &mut failures,
                    );
                    match key.as_str() {
                        "_avg" => select.avg = named,
                        "_sum" => select.sum = named,
                        "_min" => select.min = named,
                        _ => select.max = named,
                    }
                }
                other => failures.push(Failure::at(
                    key.to_string(),
                    ValidationError::UnknownKey(other.to_string()),
                )),
            }
        }

        failures.into_result(select)
    }

    /// Collect `{field: true}` selections, restricted to `offered` when
    /// given (otherwise any declared field counts).
    fn collect_fields(
        &self,
        function: &str,
        fields: &serde_json::Map<String, Json>,
        offered: Option<&[String]>,
        named: &mut Vec<String>,
        failures: &mut Failures,
    ) {
        for (field, flag) in fields {
            if flag != &Json::Bool(true) {
                failures.push(Failure {
                    path: vec![function.to_string(), field.clone()],
                    error: ValidationError::TypeMismatch {
                        expected: "true",
                        actual: flag.to_string(),
                    },
                });
                continue;
            }
            let declared = self.entity.field(field);
            let allowed = match offered {
                Some(offered) => offered.iter().any(|f| f == field),
                None => declared.is_some(),
            };
            if allowed {
                named.push(field.clone());
            } else if declared.is_some() {
                failures.push(Failure {
                    path: vec![function.to_string(), field.clone()],
                    error: ValidationError::OperatorNotSupported {
                        operator: function.to_string(),
                        kind: declared.map(|f| f.scalar.kind_name()).unwrap_or("unknown"),
                    },
                });
            } else {
                failures.push(Failure {
                    path: vec![function.to_string(), field.clone()],
                    error: ValidationError::UnknownKey(field.clone()),
                });
            }
        }
    }
}
