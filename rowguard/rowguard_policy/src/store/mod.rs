//! Policy storage.
//!
//! The engine only needs candidate policies per decision. Where they come
//! from is up to the caller; this module defines the seam and an in-memory
//! implementation.

mod in_memory;

pub use in_memory::InMemoryPolicyStore;

use rowguard_core::PolicyError;

use crate::model::{DecisionContext, Policy};

/// Trait for policy sources.
///
/// A policy source yields the candidate policies for a decision. It may
/// prefilter (by tenant, say), but the engine applies the full matching
/// rules again, so returning too many candidates is safe.
pub trait PolicySource {
    /// Get candidate policies for a decision.
    ///
    /// # Arguments
    ///
    /// * `context` - The decision being prepared.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Policy>)` - The candidates.
    /// * `Err` - If the candidates could not be loaded.
    fn policies_for(&self, context: &DecisionContext) -> Result<Vec<Policy>, PolicyError>;
}

impl<F> PolicySource for F
where
    F: Fn(&DecisionContext) -> Result<Vec<Policy>, PolicyError>,
{
    fn policies_for(&self, context: &DecisionContext) -> Result<Vec<Policy>, PolicyError> {
        self(context)
    }
}
