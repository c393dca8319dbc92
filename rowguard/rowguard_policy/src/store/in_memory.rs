//! In-memory policy store.
//!
//! This module provides an in-memory implementation of the policy source.

use dashmap::DashMap;
use rowguard_core::PolicyError;
use std::sync::Arc;

use super::PolicySource;
use crate::model::{DecisionContext, Policy};

/// An in-memory policy store.
#[derive(Clone, Default)]
pub struct InMemoryPolicyStore {
    /// The policies, indexed by ID.
    policies: Arc<DashMap<String, Policy>>,
}

impl InMemoryPolicyStore {
    /// Create a new in-memory policy store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a policy to the store.
    ///
    /// # Arguments
    ///
    /// * `policy` - The policy to add.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the policy was successfully added.
    /// * `Err` - If a policy with the same ID already exists.
    pub fn add_policy(&self, policy: Policy) -> Result<(), PolicyError> {
        if self.policies.contains_key(&policy.id) {
            return Err(PolicyError::Conflict(format!(
                "Policy {} already exists",
                policy.id
            )));
        }

        self.policies.insert(policy.id.clone(), policy);

        Ok(())
    }

    /// Get a policy by ID.
    pub fn get_policy(&self, policy_id: &str) -> Result<Policy, PolicyError> {
        self.policies
            .get(policy_id)
            .map(|p| p.value().clone())
            .ok_or_else(|| PolicyError::NotFound(policy_id.to_string()))
    }

    /// Replace an existing policy.
    ///
    /// # Arguments
    ///
    /// * `policy` - The updated policy.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the policy was successfully updated.
    /// * `Err` - If no policy with that ID exists.
    pub fn update_policy(&self, policy: Policy) -> Result<(), PolicyError> {
        if !self.policies.contains_key(&policy.id) {
            return Err(PolicyError::NotFound(policy.id.clone()));
        }

        self.policies.insert(policy.id.clone(), policy);

        Ok(())
    }

    /// Remove a policy.
    pub fn remove_policy(&self, policy_id: &str) -> Result<(), PolicyError> {
        if self.policies.remove(policy_id).is_none() {
            return Err(PolicyError::NotFound(policy_id.to_string()));
        }

        Ok(())
    }

    /// List all policies, ordered by ID.
    pub fn list_policies(&self) -> Vec<Policy> {
        let mut policies: Vec<Policy> = self.policies.iter().map(|p| p.value().clone()).collect();
        policies.sort_by(|a, b| a.id.cmp(&b.id));
        policies
    }

    /// Remove all policies.
    pub fn clear(&self) {
        self.policies.clear();
    }

    /// Number of stored policies.
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl PolicySource for InMemoryPolicyStore {
    fn policies_for(&self, context: &DecisionContext) -> Result<Vec<Policy>, PolicyError> {
        // Tenant prefilter only; the engine does the full match
        let tenant = context.tenant_code.as_deref();
        Ok(self
            .list_policies()
            .into_iter()
            .filter(|p| match p.tenant_code.as_deref().map(str::trim) {
                None | Some("") => true,
                Some(code) => Some(code) == tenant,
            })
            .collect())
    }
}
