//! Rule set model.
//!
//! These types are plain data, usually deserialized from storage. They carry
//! raw operand values that may still contain `${name}` placeholders.

use rowguard_core::AccessValue;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::node::PredicateNode;

/// Comparison operator of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operator {
    /// Equality with exactly one value.
    Eq,

    /// Membership in one or more values.
    In,

    /// Inclusive range with exactly two values.
    Between,

    /// Prefix or suffix string match with exactly one pattern.
    Like,
}

impl Operator {
    /// Upper-case name, used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "EQ",
            Self::In => "IN",
            Self::Between => "BETWEEN",
            Self::Like => "LIKE",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the predicates of one rule are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CombineMode {
    /// All predicates must hold.
    #[default]
    And,

    /// Any predicate may hold.
    Or,
}

impl CombineMode {
    /// Join two nodes with this mode, left-associatively.
    pub fn combine(&self, left: PredicateNode, right: PredicateNode) -> PredicateNode {
        match self {
            Self::And => left.and(right),
            Self::Or => left.or(right),
        }
    }

    /// Upper-case name, used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// One predicate: a field, an operator and raw operand values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredicateDef {
    /// Logical field key, resolved through the resource registry.
    pub field_key: String,

    /// The operator.
    pub operator: Operator,

    /// Raw operand values, possibly containing placeholders.
    #[serde(default)]
    pub values: Vec<AccessValue>,
}

impl PredicateDef {
    /// Create a predicate.
    pub fn new<V: Into<AccessValue>>(
        field_key: impl Into<String>,
        operator: Operator,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            field_key: field_key.into(),
            operator,
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// A prioritized group of predicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleDef {
    /// Higher priorities are compiled first.
    #[serde(default)]
    pub priority: i32,

    /// How predicates are joined; AND when absent.
    #[serde(default)]
    pub combine: Option<CombineMode>,

    /// The predicates.
    #[serde(default)]
    pub predicates: Vec<PredicateDef>,
}

impl RuleDef {
    /// Create an empty rule at the given priority.
    pub fn new(priority: i32) -> Self {
        Self {
            priority,
            ..Self::default()
        }
    }

    /// Set the combine mode.
    pub fn with_combine(mut self, combine: CombineMode) -> Self {
        self.combine = Some(combine);
        self
    }

    /// Append a predicate.
    pub fn with_predicate(mut self, predicate: PredicateDef) -> Self {
        self.predicates.push(predicate);
        self
    }
}

/// The rules guarding one resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    /// The resource these rules restrict.
    pub resource_id: String,

    /// The rules, in authoring order.
    #[serde(default)]
    pub rules: Vec<RuleDef>,
}

impl RuleSet {
    /// Create an empty rule set.
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            rules: Vec::new(),
        }
    }

    /// Append a rule.
    pub fn with_rule(mut self, rule: RuleDef) -> Self {
        self.rules.push(rule);
        self
    }
}
