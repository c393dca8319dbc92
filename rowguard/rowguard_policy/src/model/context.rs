//! Decision context.
//!
//! Everything a single evaluation needs: who asks, for what, on which
//! resource, when, and which candidate policies to consider.

use chrono::{DateTime, Utc};
use rowguard_core::{AccessContext, AccessValue, PolicyError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::model::Policy;
use crate::store::PolicySource;

/// The requesting subject.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// The subject id, if authenticated.
    #[serde(default)]
    pub id: Option<String>,

    /// Subject attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, AccessValue>,
}

impl Subject {
    /// Create a subject with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            attributes: BTreeMap::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AccessValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

impl AccessContext for Subject {
    fn subject_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn attributes(&self) -> &BTreeMap<String, AccessValue> {
        &self.attributes
    }
}

/// The resource being accessed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// The resource type, e.g. `dept`.
    #[serde(default)]
    pub type_code: Option<String>,

    /// The resource code, e.g. `dept:11`.
    #[serde(default)]
    pub code: Option<String>,

    /// The direct parent code.
    #[serde(default)]
    pub parent_code: Option<String>,

    /// All ancestor codes.
    #[serde(default)]
    pub parent_codes: BTreeSet<String>,
}

impl Resource {
    /// Create a resource with a code.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::default()
        }
    }

    /// Set the resource type.
    pub fn with_type(mut self, type_code: impl Into<String>) -> Self {
        self.type_code = Some(type_code.into());
        self
    }

    /// Set the direct parent.
    pub fn with_parent(mut self, parent_code: impl Into<String>) -> Self {
        self.parent_code = Some(parent_code.into());
        self
    }

    /// Add ancestor codes.
    pub fn with_ancestors<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parent_codes.extend(codes.into_iter().map(Into::into));
        self
    }

    /// Whether `code` is an ancestor of this resource.
    ///
    /// The ancestor set is checked first, then the single parent code.
    /// Both comparisons are exact.
    pub fn is_descendant_of(&self, code: &str) -> bool {
        self.parent_codes.contains(code) || self.parent_code.as_deref() == Some(code)
    }
}

/// Input of one decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionContext {
    /// The tenant of the request.
    #[serde(default)]
    pub tenant_code: Option<String>,

    /// Who is asking.
    #[serde(default)]
    pub subject: Subject,

    /// What is being accessed.
    #[serde(default)]
    pub resource: Resource,

    /// The requested action.
    #[serde(default)]
    pub action_code: Option<String>,

    /// When the request was made. Policy expiry is checked against it.
    pub request_time: DateTime<Utc>,

    /// Request environment (client address, channel, ...).
    #[serde(default)]
    pub environment: BTreeMap<String, AccessValue>,

    /// Candidate policies.
    #[serde(default)]
    pub policies: Vec<Policy>,
}

impl DecisionContext {
    /// Create a context for an action on a resource, timed now.
    pub fn new(subject: Subject, action_code: impl Into<String>, resource: Resource) -> Self {
        Self {
            tenant_code: None,
            subject,
            resource,
            action_code: Some(action_code.into()),
            request_time: Utc::now(),
            environment: BTreeMap::new(),
            policies: Vec::new(),
        }
    }

    /// Set the tenant.
    pub fn with_tenant(mut self, tenant_code: impl Into<String>) -> Self {
        self.tenant_code = Some(tenant_code.into());
        self
    }

    /// Set the request time.
    pub fn at(mut self, request_time: DateTime<Utc>) -> Self {
        self.request_time = request_time;
        self
    }

    /// Add an environment entry.
    pub fn with_environment(mut self, key: impl Into<String>, value: impl Into<AccessValue>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    /// Replace the candidate policies.
    pub fn with_policies(mut self, policies: Vec<Policy>) -> Self {
        self.policies = policies;
        self
    }

    /// Fill the candidate list from a policy source.
    ///
    /// # Arguments
    ///
    /// * `source` - Where candidate policies come from.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - The number of candidates loaded.
    /// * `Err` - If the source failed. The context is left unchanged.
    pub fn load_policies<S>(&mut self, source: &S) -> Result<usize, PolicyError>
    where
        S: PolicySource + ?Sized,
    {
        let policies = source.policies_for(self)?;
        let count = policies.len();
        self.policies = policies;
        Ok(count)
    }
}
