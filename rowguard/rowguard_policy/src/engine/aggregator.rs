//! Policy aggregation.
//!
//! This module merges the effects of applicable policies into one decision
//! type. Deny overrides allow; no applicable policy means deny.

use rowguard_core::{DecisionType, Effect};

use crate::model::Policy;

/// Result of [`PolicyAggregator::merge_with_explain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// The merged decision type.
    pub decision_type: DecisionType,

    /// Ids of ALLOW policies, in input order.
    pub allow_ids: Vec<String>,

    /// Ids of DENY policies, in input order.
    pub deny_ids: Vec<String>,
}

/// Merges policy effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyAggregator;

impl PolicyAggregator {
    /// Merge the effects of applicable policies.
    ///
    /// # Arguments
    ///
    /// * `policies` - The policies that passed filtering.
    ///
    /// # Returns
    ///
    /// DENY if the list is empty or holds any DENY, ALLOW if it holds at
    /// least one ALLOW, DENY otherwise.
    pub fn merge<'a, I>(policies: I) -> DecisionType
    where
        I: IntoIterator<Item = &'a Policy>,
    {
        let mut allowed = false;
        for policy in policies {
            match policy.effect {
                Some(Effect::Deny) => return DecisionType::Deny,
                Some(Effect::Allow) => allowed = true,
                None => {}
            }
        }

        if allowed {
            DecisionType::Allow
        } else {
            DecisionType::Deny
        }
    }

    /// Same decision as [`merge`](Self::merge), also collecting the ids of
    /// the contributing policies. Policies without an effect are skipped.
    pub fn merge_with_explain<'a, I>(policies: I) -> MergeOutcome
    where
        I: IntoIterator<Item = &'a Policy>,
    {
        let mut allow_ids = Vec::new();
        let mut deny_ids = Vec::new();

        for policy in policies {
            match policy.effect {
                Some(Effect::Allow) => allow_ids.push(policy.id.clone()),
                Some(Effect::Deny) => deny_ids.push(policy.id.clone()),
                None => {}
            }
        }

        let decision_type = if deny_ids.is_empty() && !allow_ids.is_empty() {
            DecisionType::Allow
        } else {
            DecisionType::Deny
        };

        MergeOutcome {
            decision_type,
            allow_ids,
            deny_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_deny() {
        let none: Vec<Policy> = Vec::new();
        assert_eq!(PolicyAggregator::merge(&none), DecisionType::Deny);
        assert_eq!(
            PolicyAggregator::merge_with_explain(&none).decision_type,
            DecisionType::Deny
        );
    }

    #[test]
    fn test_deny_overrides() {
        let policies = vec![
            Policy::allow("a1", "read", "x"),
            Policy::deny("d1", "read", "x"),
            Policy::allow("a2", "read", "x"),
        ];
        assert_eq!(PolicyAggregator::merge(&policies), DecisionType::Deny);

        let outcome = PolicyAggregator::merge_with_explain(&policies);
        assert_eq!(outcome.decision_type, DecisionType::Deny);
        assert_eq!(outcome.allow_ids, vec!["a1", "a2"]);
        assert_eq!(outcome.deny_ids, vec!["d1"]);
    }

    #[test]
    fn test_effectless_policies_are_skipped() {
        let mut blank = Policy::allow("n", "read", "x");
        blank.effect = None;

        assert_eq!(PolicyAggregator::merge([&blank]), DecisionType::Deny);

        let policies = vec![blank, Policy::allow("a", "read", "x")];
        assert_eq!(PolicyAggregator::merge(&policies), DecisionType::Allow);
        let outcome = PolicyAggregator::merge_with_explain(&policies);
        assert_eq!(outcome.allow_ids, vec!["a"]);
        assert!(outcome.deny_ids.is_empty());
    }
}
