//! Policy models.
//!
//! This module defines policies, the decision context and decision results.

pub mod constraint;
pub mod context;
pub mod decision;
pub mod policy;

pub use constraint::ColumnConstraint;
pub use context::{DecisionContext, Resource, Subject};
pub use decision::{Decision, DecisionExplain};
pub use policy::Policy;
