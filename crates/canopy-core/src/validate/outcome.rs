//! Validation outcomes: path-tagged failures, accumulated per request.
//!
//! Validation failures are expected, recoverable, and always returned as
//! values so callers can render every failure for a request at once.
//! Nothing in this module is ever thrown across the validate boundary.

use thiserror::Error;

/// One validation failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Value has the wrong type or shape for the field kind.
    #[error("expected {expected}, got {actual}")]
    TypeMismatch {
        /// What the field kind accepts.
        expected: &'static str,
        /// What the payload supplied.
        actual: String,
    },

    /// Null supplied for a non-nullable field.
    #[error("null is not allowed here")]
    NotNullable,

    /// A required field is absent.
    #[error("missing required field")]
    MissingField,

    /// The payload carries a key the schema does not declare.
    #[error("unknown key: {0}")]
    UnknownKey(String),

    /// The payload repeats a key that must be unique.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// Value is not a variant of the field's enum.
    #[error("{value:?} is not a variant of enum {enum_name}")]
    EnumViolation {
        /// Enum name.
        enum_name: String,
        /// The rejected value.
        value: String,
    },

    /// Input does not coerce into the canonical decimal representation.
    /// Carries the original notation for diagnostics.
    #[error("invalid decimal notation: {notation}")]
    InvalidDecimal {
        /// The rejected input, rendered as supplied.
        notation: String,
    },

    /// The grammar recognizes the notation, but the canonical decimal
    /// type is finite by construction.
    #[error("non-finite decimal is not representable: {notation}")]
    NonFiniteDecimal {
        /// The rejected input.
        notation: String,
    },

    /// Input does not parse as an absolute instant.
    #[error("invalid datetime: {value}")]
    InvalidDateTime {
        /// The rejected input.
        value: String,
    },

    /// A filter operator applied to a field kind that does not support it.
    #[error("operator {operator} is not supported for {kind} fields")]
    OperatorNotSupported {
        /// Operator key.
        operator: String,
        /// Field kind name.
        kind: &'static str,
    },

    /// An operation wrapper carries more than one operator key.
    #[error("conflicting operator keys: {first} and {second}")]
    ConflictingOperators {
        /// First operator seen.
        first: String,
        /// Second operator seen.
        second: String,
    },

    /// An operation wrapper carries no operator key at all.
    #[error("expected exactly one operator key")]
    EmptyOperation,

    /// A relation quantifier that does not match the relation's
    /// cardinality (e.g. `every` on a to-one relation).
    #[error("quantifier {quantifier} is not valid for a {cardinality} relation")]
    QuantifierMismatch {
        /// Quantifier key.
        quantifier: String,
        /// Relation cardinality name.
        cardinality: &'static str,
    },

    /// A relation mutation that does not match the relation's
    /// cardinality (e.g. `disconnect` on a required to-one relation).
    #[error("operation {operation} is not valid for a {cardinality} relation")]
    CardinalityMismatch {
        /// Operation key.
        operation: String,
        /// Relation cardinality name.
        cardinality: &'static str,
    },

    /// A relation mutation only available in update payloads appeared in
    /// a create payload.
    #[error("operation {operation} is only valid in update payloads")]
    UpdateOnlyOperation {
        /// Operation key.
        operation: String,
    },

    /// The payload supplies both a nested relation mutation and the
    /// relation's raw foreign-key scalar.
    #[error("payload mixes a nested mutation for relation {relation} with foreign key {field}")]
    MixedRelationPayload {
        /// Relation name.
        relation: String,
        /// Foreign-key field name.
        field: String,
    },

    /// A polymorphic discriminator value outside the declared tag set.
    #[error("{value:?} is not an allowed tag (expected one of: {allowed})")]
    UnknownDiscriminator {
        /// The rejected tag.
        value: String,
        /// Comma-joined allowed tags.
        allowed: String,
    },

    /// Polymorphic relations cannot be filtered or mutated through a
    /// nested payload; only their raw discriminator and id scalars.
    #[error("polymorphic relation {relation} does not accept nested payloads")]
    PolymorphicNested {
        /// Relation name.
        relation: String,
    },

    /// No declared unique-selector shape matched the payload.
    #[error("no unique selector matched (expected one of: {expected})")]
    InvalidUniqueSelector {
        /// Comma-joined selector shapes the entity declares.
        expected: String,
    },
}

/// A failure attributed to a payload path.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    /// Field-name sequence from the payload root.
    pub path: Vec<String>,
    /// What went wrong.
    pub error: ValidationError,
}

impl Failure {
    /// Create a failure at the payload root.
    pub fn root(error: ValidationError) -> Self {
        Self {
            path: Vec::new(),
            error,
        }
    }

    /// Create a failure at a single-segment path.
    pub fn at(segment: impl Into<String>, error: ValidationError) -> Self {
        Self {
            path: vec![segment.into()],
            error,
        }
    }

    /// Rendered path, `$` for the root.
    pub fn path_string(&self) -> String {
        if self.path.is_empty() {
            "$".to_string()
        } else {
            self.path.join(".")
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path_string(), self.error)
    }
}

/// An ordered collection of failures for one payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Failures(Vec<Failure>);

impl Failures {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// A collection holding one failure.
    pub fn one(failure: Failure) -> Self {
        Self(vec![failure])
    }

    /// Append a failure.
    pub fn push(&mut self, failure: Failure) {
        self.0.push(failure);
    }

    /// Append all failures from another collection.
    pub fn extend(&mut self, other: Failures) {
        self.0.extend(other.0);
    }

    /// Append all failures from another collection, prefixing each path
    /// with the given segment (used when descending into nested
    /// payloads).
    pub fn extend_under(&mut self, segment: &str, other: Failures) {
        for mut failure in other.0 {
            failure.path.insert(0, segment.to_string());
            self.0.push(failure);
        }
    }

    /// Check if any failure was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failures.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the failures in order.
    pub fn iter(&self) -> impl Iterator<Item = &Failure> {
        self.0.iter()
    }

    /// Turn an accumulated collection into a result.
    pub fn into_result<T>(self, value: T) -> ValidationResult<T> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl IntoIterator for Failures {
    type Item = Failure;
    type IntoIter = std::vec::IntoIter<Failure>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl std::fmt::Display for Failures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

/// Result of validating one payload.
pub type ValidationResult<T> = Result<T, Failures>;
