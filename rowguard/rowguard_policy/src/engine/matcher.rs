//! Policy applicability checks.

use rowguard_core::ResourceRange;

use crate::model::{DecisionContext, Policy, Resource};

/// How a policy reached the requested resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceMatch {
    /// The policy names the resource itself.
    Direct,

    /// The policy names an ancestor and is inherited.
    Inherited,
}

/// Decides whether a policy applies to a decision context.
///
/// A policy applies when it is effective, its action matches and its
/// resource range covers the requested resource.
#[derive(Debug, Clone, Default)]
pub struct PolicyMatcher {
    default_range: ResourceRange,
}

impl PolicyMatcher {
    /// Create a matcher with the range used for policies that carry none.
    pub fn new(default_range: ResourceRange) -> Self {
        Self { default_range }
    }

    /// Check every condition and report how the resource matched.
    pub fn matches(&self, policy: &Policy, context: &DecisionContext) -> Option<ResourceMatch> {
        if !Self::is_effective(policy, context) || !Self::action_matches(policy, context) {
            return None;
        }
        self.resource_match(policy, &context.resource)
    }

    /// Tenant and expiry check.
    ///
    /// A non-blank policy tenant must equal the request tenant exactly.
    /// Expiry is inclusive: a policy expiring at the request time still
    /// applies.
    pub fn is_effective(policy: &Policy, context: &DecisionContext) -> bool {
        if let Some(tenant) = policy.tenant_code.as_deref() {
            if !tenant.trim().is_empty() && Some(tenant) != context.tenant_code.as_deref() {
                return false;
            }
        }

        if policy.never_expire {
            return true;
        }
        match policy.expire_time {
            Some(expire_time) => expire_time >= context.request_time,
            None => true,
        }
    }

    /// Case-insensitive action comparison. A missing action never matches.
    pub fn action_matches(policy: &Policy, context: &DecisionContext) -> bool {
        match (policy.action_code.as_deref(), context.action_code.as_deref()) {
            (Some(a), Some(b)) => eq_ignore_case(a, b),
            _ => false,
        }
    }

    /// Whether the policy's range covers the resource.
    pub fn resource_matches(&self, policy: &Policy, resource: &Resource) -> bool {
        self.resource_match(policy, resource).is_some()
    }

    /// Like [`resource_matches`](Self::resource_matches), reporting whether
    /// the match went through inheritance.
    pub fn resource_match(&self, policy: &Policy, resource: &Resource) -> Option<ResourceMatch> {
        if let (Some(expected), Some(actual)) = (
            non_blank(policy.resource_type_code.as_deref()),
            non_blank(resource.type_code.as_deref()),
        ) {
            if !eq_ignore_case(expected, actual) {
                return None;
            }
        }

        let policy_code = policy.resource_code.as_deref()?;
        let direct = || {
            resource
                .code
                .as_deref()
                .is_some_and(|code| eq_ignore_case(code, policy_code))
        };
        let inherited = || policy.inherit_flag && resource.is_descendant_of(policy_code);

        match policy.resource_range.as_ref().unwrap_or(&self.default_range) {
            ResourceRange::SelfOnly => direct().then_some(ResourceMatch::Direct),
            ResourceRange::Children => inherited().then_some(ResourceMatch::Inherited),
            ResourceRange::SelfAndChildren => {
                if direct() {
                    Some(ResourceMatch::Direct)
                } else if inherited() {
                    Some(ResourceMatch::Inherited)
                } else {
                    None
                }
            }
            ResourceRange::Other(_) => None,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}
