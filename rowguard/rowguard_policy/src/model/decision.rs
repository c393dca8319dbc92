//! Decision results.

use rowguard_core::{DecisionType, Explain};
use serde::{Deserialize, Serialize};

use crate::model::ColumnConstraint;

/// The verdict of one evaluation.
///
/// `row_filter` and `column_constraint` are only ever set on ALLOW. An absent
/// row filter means no additional row restriction, not deny.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision<F> {
    /// ALLOW or DENY.
    pub decision_type: DecisionType,

    /// Short human readable reason.
    pub reason: String,

    /// Row filter built from ROW-scoped ALLOW policies.
    pub row_filter: Option<F>,

    /// Column restrictions from COLUMN-scoped ALLOW policies.
    pub column_constraint: Option<ColumnConstraint>,
}

impl<F> Decision<F> {
    /// A DENY with the given reason.
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            decision_type: DecisionType::Deny,
            reason: reason.into(),
            row_filter: None,
            column_constraint: None,
        }
    }

    /// An ALLOW with its constraints.
    pub fn allow(
        reason: impl Into<String>,
        row_filter: Option<F>,
        column_constraint: Option<ColumnConstraint>,
    ) -> Self {
        Self {
            decision_type: DecisionType::Allow,
            reason: reason.into(),
            row_filter,
            column_constraint,
        }
    }

    /// Whether the request may proceed.
    pub fn is_allow(&self) -> bool {
        self.decision_type.is_allow()
    }
}

/// A decision together with its audit detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionExplain<F> {
    /// The decision itself.
    pub decision: Decision<F>,

    /// Ids of matching ALLOW policies.
    pub allow_policy_ids: Vec<String>,

    /// Ids of matching DENY policies.
    pub deny_policy_ids: Vec<String>,

    /// Range expressions that went into the row filter.
    pub applied_ranges: Vec<String>,

    /// Whether any matching policy applied through resource inheritance.
    pub inherited: bool,

    /// Step-by-step diagnostic log.
    pub explain: Explain,
}

impl<F> DecisionExplain<F> {
    /// The decision type.
    pub fn decision_type(&self) -> DecisionType {
        self.decision.decision_type
    }
}
