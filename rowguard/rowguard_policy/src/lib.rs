//! # Rowguard Policy
//!
//! `rowguard_policy` decides whether a subject may perform an action on a
//! resource and, when it may, what row and column restrictions apply.
//!
//! Key concepts:
//!
//! 1. **Policy**: an ALLOW or DENY statement scoped by tenant, action and
//!    resource range, optionally carrying a row range expression or column
//!    lists.
//!
//! 2. **Filtering**: only policies that are effective (tenant, expiry) and
//!    match the action and resource take part in a decision.
//!
//! 3. **Aggregation**: deny overrides allow, and no applicable policy means
//!    deny.
//!
//! 4. **Constraint resolution**: on ALLOW, row-scoped range expressions are
//!    parsed, OR-ed and built into a row filter through pluggable range
//!    collaborators; column-scoped policies contribute allow/deny column
//!    sets.

pub mod engine;
pub mod integration;
pub mod model;
pub mod range;
pub mod store;

// Re-export key types and traits for convenience
pub use engine::{DecisionAudit, PolicyAggregator, PolicyEngine, PolicyMatcher};
pub use integration::ConstraintResolver;
pub use model::{
    ColumnConstraint, Decision, DecisionContext, DecisionExplain, Policy, Resource, Subject,
};
pub use range::{
    RangeContext, RangeDslParser, RangeExpr, RangeFilterBuilder, RowFilter, TemplateFilterBuilder,
    TemplateRangeParser,
};
pub use store::{InMemoryPolicyStore, PolicySource};
