//! Policy integration.
//!
//! This module derives enforceable row and column constraints from the
//! policies that granted a request.

mod resolver;

pub use resolver::{ConstraintResolver, ResolvedRowFilter};
