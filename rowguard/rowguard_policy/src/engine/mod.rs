//! Policy decision engine.
//!
//! This module provides filtering, aggregation, evaluation and auditing.

mod aggregator;
mod audit;
mod evaluator;
mod matcher;

pub use aggregator::{MergeOutcome, PolicyAggregator};
pub use audit::{AuditRecord, DecisionAudit};
pub use evaluator::PolicyEngine;
pub use matcher::{PolicyMatcher, ResourceMatch};
