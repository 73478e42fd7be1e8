//! Validated filter expression trees.
//!
//! A [`FilterNode`] is the output of the where-validator: a boolean
//! expression over one entity's fields and relations. The engine only
//! constructs and validates these trees; evaluating them against stored
//! data is the persistence layer's job.

use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Case sensitivity for string match conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StringMode {
    /// Exact, case-sensitive matching.
    #[default]
    Default,
    /// Case-insensitive matching.
    Insensitive,
}

/// A single condition on one scalar field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarCondition {
    /// Field equals the operand (operand may be `Null` for nullable fields).
    Equals(Value),
    /// Field is one of the operands.
    In(Vec<Value>),
    /// Field is none of the operands.
    NotIn(Vec<Value>),
    /// Field is strictly less than the operand.
    Lt(Value),
    /// Field is less than or equal to the operand.
    Lte(Value),
    /// Field is strictly greater than the operand.
    Gt(Value),
    /// Field is greater than or equal to the operand.
    Gte(Value),
    /// String field contains the operand.
    Contains(String),
    /// String field starts with the operand.
    StartsWith(String),
    /// String field ends with the operand.
    EndsWith(String),
    /// Negation of the conjunction of the nested conditions.
    Not(Vec<ScalarCondition>),
}

/// All conditions on one scalar field, implicitly ANDed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarLeaf {
    /// Field name on the filtered entity.
    pub field: String,
    /// Conditions to satisfy (all of them).
    pub conditions: Vec<ScalarCondition>,
    /// Case sensitivity for any string conditions in this leaf.
    pub mode: StringMode,
}

/// Existence quantifier applied to a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationQuantifier {
    /// To-one: the related row matches (or is null when the filter is absent).
    Is,
    /// To-one: the related row does not match (or is not null).
    IsNot,
    /// To-many: every related row matches.
    Every,
    /// To-many: at least one related row matches.
    Some,
    /// To-many: no related row matches.
    None,
}

/// A quantified condition over a relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationLeaf {
    /// Relation name on the filtered entity.
    pub relation: String,
    /// Quantifier to apply.
    pub quantifier: RelationQuantifier,
    /// Filter on the target entity. `None` with `Is`/`IsNot` is the null
    /// test on an optional to-one relation.
    pub filter: Option<Box<FilterNode>>,
}

/// A validated boolean filter expression over one entity.
///
/// An empty `And` is the identity filter (always true); an empty `Or` is
/// always false. Consumers must honor this convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterNode {
    /// All children must match. Empty means always-true.
    And(Vec<FilterNode>),
    /// At least one child must match. Empty means always-false.
    Or(Vec<FilterNode>),
    /// The child must not match.
    Not(Box<FilterNode>),
    /// Conditions on one scalar field.
    Scalar(ScalarLeaf),
    /// Quantified condition over one relation.
    Relation(RelationLeaf),
}

impl FilterNode {
    /// Conjunction of the given nodes.
    pub fn and(nodes: Vec<FilterNode>) -> Self {
        FilterNode::And(nodes)
    }

    /// Disjunction of the given nodes.
    pub fn or(nodes: Vec<FilterNode>) -> Self {
        FilterNode::Or(nodes)
    }

    /// Negation of the given node.
    pub fn not(node: FilterNode) -> Self {
        FilterNode::Not(Box::new(node))
    }

    /// Equality leaf on a single field.
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterNode::Scalar(ScalarLeaf {
            field: field.into(),
            conditions: vec![ScalarCondition::Equals(value.into())],
            mode: StringMode::Default,
        })
    }

    /// The identity filter (matches everything).
    pub fn always_true() -> Self {
        FilterNode::And(Vec::new())
    }

    /// The empty filter (matches nothing).
    pub fn always_false() -> Self {
        FilterNode::Or(Vec::new())
    }
}
