//! Policy model.

use chrono::{DateTime, Utc};
use rowguard_core::{Effect, PolicyScope, ResourceRange};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A data-access policy.
///
/// Policies are plain data, usually loaded from storage. Optional fields
/// mirror what storage may leave unset; the matcher and the engine decide
/// how absent values behave.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// The unique identifier for this policy.
    pub id: String,

    /// The tenant this policy is restricted to. Blank means every tenant.
    #[serde(default)]
    pub tenant_code: Option<String>,

    /// The action this policy governs, matched case-insensitively.
    #[serde(default)]
    pub action_code: Option<String>,

    /// The resource type, matched case-insensitively when both sides carry one.
    #[serde(default)]
    pub resource_type_code: Option<String>,

    /// The resource code the range is anchored at.
    #[serde(default)]
    pub resource_code: Option<String>,

    /// How far the policy reaches from its resource code.
    #[serde(default)]
    pub resource_range: Option<ResourceRange>,

    /// ALLOW or DENY. Policies without an effect never contribute to a decision.
    #[serde(default)]
    pub effect: Option<Effect>,

    /// Whether the policy ignores its expiry time.
    #[serde(default)]
    pub never_expire: bool,

    /// When the policy stops applying (inclusive).
    #[serde(default)]
    pub expire_time: Option<DateTime<Utc>>,

    /// Whether the policy extends to descendant resources.
    #[serde(default)]
    pub inherit_flag: bool,

    /// Which dimension the policy restricts. Inferred when absent.
    #[serde(default)]
    pub scope: Option<PolicyScope>,

    /// Row range expression, interpreted by the range collaborators.
    #[serde(default)]
    pub range_dsl: Option<String>,

    /// Columns this policy exposes.
    #[serde(default)]
    pub allow_columns: BTreeSet<String>,

    /// Columns this policy hides.
    #[serde(default)]
    pub deny_columns: BTreeSet<String>,

    /// Informational priority; aggregation does not depend on it.
    #[serde(default)]
    pub priority: i32,
}

impl Policy {
    /// Create a policy for an action on a resource.
    pub fn new(
        id: impl Into<String>,
        action_code: impl Into<String>,
        resource_code: impl Into<String>,
        effect: Effect,
    ) -> Self {
        Self {
            id: id.into(),
            action_code: Some(action_code.into()),
            resource_code: Some(resource_code.into()),
            effect: Some(effect),
            ..Self::default()
        }
    }

    /// Shorthand for an ALLOW policy.
    pub fn allow(
        id: impl Into<String>,
        action_code: impl Into<String>,
        resource_code: impl Into<String>,
    ) -> Self {
        Self::new(id, action_code, resource_code, Effect::Allow)
    }

    /// Shorthand for a DENY policy.
    pub fn deny(
        id: impl Into<String>,
        action_code: impl Into<String>,
        resource_code: impl Into<String>,
    ) -> Self {
        Self::new(id, action_code, resource_code, Effect::Deny)
    }

    /// Restrict the policy to a tenant.
    pub fn with_tenant(mut self, tenant_code: impl Into<String>) -> Self {
        self.tenant_code = Some(tenant_code.into());
        self
    }

    /// Set the resource type.
    pub fn with_resource_type(mut self, resource_type_code: impl Into<String>) -> Self {
        self.resource_type_code = Some(resource_type_code.into());
        self
    }

    /// Set the resource range and inheritance flag.
    pub fn with_range(mut self, range: ResourceRange, inherit: bool) -> Self {
        self.resource_range = Some(range);
        self.inherit_flag = inherit;
        self
    }

    /// Set the expiry time.
    pub fn expires_at(mut self, expire_time: DateTime<Utc>) -> Self {
        self.expire_time = Some(expire_time);
        self.never_expire = false;
        self
    }

    /// Mark the policy as never expiring.
    pub fn never_expiring(mut self) -> Self {
        self.never_expire = true;
        self
    }

    /// Set an explicit scope.
    pub fn with_scope(mut self, scope: PolicyScope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Attach a row range expression.
    pub fn with_range_dsl(mut self, range_dsl: impl Into<String>) -> Self {
        self.range_dsl = Some(range_dsl.into());
        self
    }

    /// Add exposed columns.
    pub fn with_allow_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Add hidden columns.
    pub fn with_deny_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deny_columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// The non-blank range expression, if any.
    pub fn range_text(&self) -> Option<&str> {
        self.range_dsl
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// The effective scope.
    ///
    /// An explicit scope wins. Otherwise a range expression means ROW,
    /// column lists mean COLUMN, and anything else is RESOURCE.
    pub fn resolved_scope(&self) -> PolicyScope {
        if let Some(scope) = self.scope {
            return scope;
        }
        if self.range_text().is_some() {
            PolicyScope::Row
        } else if !self.allow_columns.is_empty() || !self.deny_columns.is_empty() {
            PolicyScope::Column
        } else {
            PolicyScope::Resource
        }
    }

    /// Whether the effect is ALLOW.
    pub fn is_allow(&self) -> bool {
        self.effect == Some(Effect::Allow)
    }
}
