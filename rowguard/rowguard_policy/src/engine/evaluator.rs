//! Policy decision engine.
//!
//! This module provides the engine that filters candidate policies, merges
//! them and, on ALLOW, resolves row and column constraints.

use rowguard_core::{DecisionType, EngineConfig, Explain};
use tracing::{debug, warn};

use crate::engine::aggregator::PolicyAggregator;
use crate::engine::audit::{AuditRecord, DecisionAudit};
use crate::engine::matcher::{PolicyMatcher, ResourceMatch};
use crate::integration::ConstraintResolver;
use crate::model::{Decision, DecisionContext, DecisionExplain, Policy};
use crate::range::{RangeDslParser, RangeFilterBuilder, TemplateFilterBuilder, TemplateRangeParser};

/// Policy decision engine.
///
/// Evaluation never fails: every problem resolves to DENY with a reason.
pub struct PolicyEngine<P = TemplateRangeParser, B = TemplateFilterBuilder> {
    /// Applicability checks.
    matcher: PolicyMatcher,

    /// Range text parser.
    parser: P,

    /// Row filter builder.
    builder: B,

    /// Optional decision history.
    audit: Option<DecisionAudit>,
}

impl PolicyEngine {
    /// Create an engine using the bundled template range collaborators.
    pub fn new() -> Self {
        Self::with_collaborators(TemplateRangeParser, TemplateFilterBuilder)
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, B> PolicyEngine<P, B>
where
    P: RangeDslParser,
    B: RangeFilterBuilder<P::Expr>,
{
    /// Create a policy engine with custom range collaborators.
    ///
    /// # Arguments
    ///
    /// * `parser` - Parses the range text of ROW-scoped policies.
    /// * `builder` - Builds the row filter from the combined expression.
    ///
    /// # Returns
    ///
    /// A new policy engine with the default configuration.
    pub fn with_collaborators(parser: P, builder: B) -> Self {
        Self {
            matcher: PolicyMatcher::default(),
            parser,
            builder,
            audit: None,
        }
    }

    /// Apply an engine configuration.
    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.matcher = PolicyMatcher::new(config.default_resource_range.clone());
        self
    }

    /// Record every decision in the given audit trail.
    pub fn with_audit(mut self, audit: DecisionAudit) -> Self {
        self.audit = Some(audit);
        self
    }

    /// The attached audit trail, if any.
    pub fn audit(&self) -> Option<&DecisionAudit> {
        self.audit.as_ref()
    }

    /// Policies of the context that apply to it.
    pub fn filter<'c>(&self, context: &'c DecisionContext) -> Vec<&'c Policy> {
        context
            .policies
            .iter()
            .filter(|policy| self.matcher.matches(policy, context).is_some())
            .collect()
    }

    /// Evaluate a decision context.
    pub fn evaluate(&self, context: &DecisionContext) -> Decision<B::Filter> {
        self.evaluate_with_explain(context).decision
    }

    /// Evaluate a decision context, returning the audit detail as well.
    ///
    /// # Arguments
    ///
    /// * `context` - The decision context, including candidate policies.
    ///
    /// # Returns
    ///
    /// The decision with the ids of contributing policies, the applied range
    /// texts, the inheritance flag and the step log.
    pub fn evaluate_with_explain(&self, context: &DecisionContext) -> DecisionExplain<B::Filter> {
        let mut explain = Explain::new();
        explain.info(format!("{} candidate policies", context.policies.len()));

        let mut matched = Vec::new();
        let mut inherited = false;
        for policy in &context.policies {
            match self.matcher.matches(policy, context) {
                Some(how) => {
                    inherited |= how == ResourceMatch::Inherited;
                    explain.info(format!("policy '{}' applies", policy.id));
                    matched.push(policy);
                }
                None => explain.info(format!("policy '{}' does not apply", policy.id)),
            }
        }

        let outcome = PolicyAggregator::merge_with_explain(matched.iter().copied());

        let (decision, applied_ranges) = match outcome.decision_type {
            DecisionType::Deny => {
                let reason = if let Some(id) = outcome.deny_ids.first() {
                    format!("denied by policy '{}'", id)
                } else if matched.is_empty() {
                    "no applicable policy".to_string()
                } else {
                    "no applicable policy allows the request".to_string()
                };
                explain.info(reason.clone());
                (Decision::deny(reason), Vec::new())
            }
            DecisionType::Allow => self.allow(&matched, context, &outcome.allow_ids, &mut explain),
        };

        debug!(
            subject = ?context.subject.id,
            action = ?context.action_code,
            resource = ?context.resource.code,
            candidates = context.policies.len(),
            matched = matched.len(),
            decision = %decision.decision_type,
            "Evaluated access decision"
        );

        let explained = DecisionExplain {
            decision,
            allow_policy_ids: outcome.allow_ids,
            deny_policy_ids: outcome.deny_ids,
            applied_ranges,
            inherited,
            explain,
        };

        if let Some(audit) = &self.audit {
            audit.record(AuditRecord::new(context, &explained));
        }

        explained
    }

    fn allow(
        &self,
        matched: &[&Policy],
        context: &DecisionContext,
        allow_ids: &[String],
        explain: &mut Explain,
    ) -> (Decision<B::Filter>, Vec<String>) {
        let resolver = ConstraintResolver::new(&self.parser, &self.builder);

        let (row_filter, applied_ranges) =
            match resolver.row_filter(matched.iter().copied(), context) {
                Ok(Some(resolved)) => {
                    explain.info(format!(
                        "row filter built from {} range expression(s)",
                        resolved.applied_ranges.len()
                    ));
                    (Some(resolved.filter), resolved.applied_ranges)
                }
                Ok(None) => {
                    explain.info("no row restriction");
                    (None, Vec::new())
                }
                Err(err) => {
                    // Fail closed
                    warn!(error = %err, "Row filter resolution failed");
                    explain.error(format!("row filter failed: {}", err));
                    let reason = format!("row filter could not be built: {}", err);
                    return (Decision::deny(reason), Vec::new());
                }
            };

        let column_constraint = resolver.column_constraint(matched.iter().copied());
        if let Some(constraint) = &column_constraint {
            explain.info(format!(
                "column constraint: {} allowed, {} denied",
                constraint.allow_columns.len(),
                constraint.deny_columns.len()
            ));
            let conflicts = constraint.conflicts();
            if !conflicts.is_empty() {
                explain.warn(format!(
                    "{} column(s) both allowed and denied; deny wins",
                    conflicts.len()
                ));
            }
        }

        let reason = format!("allowed by policy '{}'", allow_ids.join("', '"));
        (
            Decision::allow(reason, row_filter, column_constraint),
            applied_ranges,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Resource, Subject};
    use rowguard_core::{AccessValue, ExplainLevel, ResourceRange};

    fn context(policies: Vec<Policy>) -> DecisionContext {
        DecisionContext::new(Subject::new("u-1"), "read", Resource::new("dept:11").with_parent("dept:10"))
            .with_tenant("acme")
            .with_policies(policies)
    }

    #[test]
    fn test_no_policies_is_deny() {
        let explained = PolicyEngine::new().evaluate_with_explain(&context(vec![]));
        assert_eq!(explained.decision_type(), DecisionType::Deny);
        assert_eq!(explained.decision.reason, "no applicable policy");
    }

    #[test]
    fn test_non_matching_is_deny() {
        let decision = PolicyEngine::new().evaluate(&context(vec![
            Policy::allow("p", "write", "dept:11"),
            Policy::allow("q", "read", "dept:99"),
        ]));
        assert!(!decision.is_allow());
        assert!(decision.row_filter.is_none());
    }

    #[test]
    fn test_deny_overrides_allow() {
        let explained = PolicyEngine::new().evaluate_with_explain(&context(vec![
            Policy::allow("a", "read", "dept:11").with_range_dsl("owner = ${subjectId}"),
            Policy::deny("d", "read", "dept:11"),
        ]));
        assert_eq!(explained.decision_type(), DecisionType::Deny);
        assert_eq!(explained.deny_policy_ids, vec!["d"]);
        assert!(explained.decision.row_filter.is_none());
        assert!(explained.decision.column_constraint.is_none());
    }

    #[test]
    fn test_allow_with_constraints() {
        let explained = PolicyEngine::new().evaluate_with_explain(&context(vec![
            Policy::allow("rows", "read", "dept:11").with_range_dsl("owner = ${subjectId}"),
            Policy::allow("cols", "read", "dept:11").with_deny_columns(["salary"]),
            Policy::allow("plain", "read", "dept:11"),
        ]));

        assert_eq!(explained.decision_type(), DecisionType::Allow);
        let filter = explained.decision.row_filter.as_ref().unwrap();
        assert_eq!(filter.sql, "(owner = ?)");
        assert_eq!(filter.params, vec![AccessValue::from("u-1")]);
        assert_eq!(explained.applied_ranges, vec!["owner = ${subjectId}"]);

        let columns = explained.decision.column_constraint.as_ref().unwrap();
        assert!(!columns.is_column_allowed("salary"));
        assert_eq!(explained.allow_policy_ids.len(), 3);
        assert!(!explained.inherited);
    }

    #[test]
    fn test_inheritance_flag() {
        let explained = PolicyEngine::new().evaluate_with_explain(&context(vec![
            Policy::allow("p", "read", "dept:10").with_range(ResourceRange::SelfAndChildren, true),
        ]));
        assert!(explained.decision.is_allow());
        assert!(explained.inherited);
    }

    #[test]
    fn test_range_failure_fails_closed() {
        let explained = PolicyEngine::new().evaluate_with_explain(&context(vec![
            Policy::allow("p", "read", "dept:11").with_range_dsl("x = ${missing}"),
        ]));
        assert_eq!(explained.decision_type(), DecisionType::Deny);
        assert!(explained.explain.has_error());
        assert!(explained.decision.reason.contains("missing"));
    }

    #[test]
    fn test_default_range_from_config() {
        let engine = PolicyEngine::new().with_config(&EngineConfig {
            default_resource_range: ResourceRange::SelfAndChildren,
        });
        let mut policy = Policy::allow("p", "read", "dept:10");
        policy.inherit_flag = true;

        assert!(engine.evaluate(&context(vec![policy.clone()])).is_allow());
        assert!(!PolicyEngine::new().evaluate(&context(vec![policy])).is_allow());
    }

    #[test]
    fn test_audit_records_decisions() {
        let audit = DecisionAudit::new(10);
        let engine = PolicyEngine::new().with_audit(audit.clone());

        engine.evaluate(&context(vec![Policy::allow("p", "read", "dept:11")]));
        engine.evaluate(&context(vec![]));

        assert_eq!(audit.records_for_subject(Some("u-1")).len(), 2);
        assert_eq!(audit.records_by_policy("p").len(), 1);
        assert_eq!(audit.records_by_decision(DecisionType::Deny).len(), 1);
        assert!(engine.audit().is_some());
    }

    #[test]
    fn test_filter_and_explain_steps() {
        let ctx = context(vec![
            Policy::allow("a", "read", "dept:11"),
            Policy::allow("b", "read", "dept:12"),
        ]);
        let engine = PolicyEngine::new();
        let ids: Vec<_> = engine.filter(&ctx).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);

        let explained = engine.evaluate_with_explain(&ctx);
        assert!(explained.explain.at_level(ExplainLevel::Info).count() >= 3);
    }
}
