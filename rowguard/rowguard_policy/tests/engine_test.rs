use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rowguard_core::{DecisionType, Effect, PolicyError, ResourceRange};
use rowguard_policy::{
    DecisionAudit, DecisionContext, InMemoryPolicyStore, Policy, PolicyEngine, Resource, Subject,
};

fn request(resource: Resource) -> DecisionContext {
    DecisionContext::new(Subject::new("u-1"), "read", resource)
        .with_tenant("acme")
        .at(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
}

#[test]
fn self_and_children_matches_descendant() {
    let policy = Policy::allow("p", "read", "dept:10").with_range(ResourceRange::SelfAndChildren, true);
    let ctx = request(Resource::new("dept:11").with_ancestors(["dept:10"]))
        .with_policies(vec![policy]);

    let explained = PolicyEngine::new().evaluate_with_explain(&ctx);
    assert_eq!(explained.decision_type(), DecisionType::Allow);
    assert!(explained.inherited);
    assert_eq!(explained.allow_policy_ids, vec!["p"]);
}

#[test]
fn expired_and_foreign_tenant_policies_are_ignored() {
    let ctx = request(Resource::new("dept:1"));
    let expired = Policy::allow("old", "read", "dept:1")
        .expires_at(ctx.request_time - Duration::minutes(5));
    let foreign = Policy::allow("other", "read", "dept:1").with_tenant("globex");

    let decision = PolicyEngine::new().evaluate(&ctx.with_policies(vec![expired, foreign]));
    assert_eq!(decision.decision_type, DecisionType::Deny);
    assert_eq!(decision.reason, "no applicable policy");
}

#[test]
fn store_backed_decision_with_audit() {
    let store = InMemoryPolicyStore::new();
    store
        .add_policy(
            Policy::allow("rows", "READ", "dept:1")
                .with_tenant("acme")
                .with_range_dsl("tenant = ${tenantCode} AND owner = ${subjectId}"),
        )
        .unwrap();
    store
        .add_policy(Policy::allow("cols", "read", "dept:1").with_allow_columns(["name", "code"]))
        .unwrap();
    store
        .add_policy(Policy::deny("elsewhere", "read", "dept:2"))
        .unwrap();

    let mut ctx = request(Resource::new("dept:1"));
    assert_eq!(ctx.load_policies(&store).unwrap(), 3);

    let audit = DecisionAudit::new(100);
    let engine = PolicyEngine::new().with_audit(audit.clone());
    let decision = engine.evaluate(&ctx);

    assert!(decision.is_allow());
    let filter = decision.row_filter.unwrap();
    assert_eq!(filter.sql, "(tenant = ? AND owner = ?)");
    assert_eq!(filter.params.len(), 2);

    let columns = decision.column_constraint.unwrap();
    assert!(columns.is_column_allowed("name"));
    assert!(!columns.is_column_allowed("salary"));

    let records = audit.records_for_subject(Some("u-1"));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].decision_type, DecisionType::Allow);
}

#[test]
fn escaping_range_text_fails_closed() {
    let ctx = request(Resource::new("dept:1")).with_policies(vec![
        Policy::allow("own", "read", "dept:1").with_range_dsl("owner = ${subjectId}) OR (1 = 1"),
        Policy::allow("drop", "read", "dept:1").with_range_dsl("x = 1; DELETE FROM users --"),
    ]);

    let explained = PolicyEngine::new().evaluate_with_explain(&ctx);
    assert_eq!(explained.decision_type(), DecisionType::Deny);
    assert!(explained.decision.row_filter.is_none());
    assert!(explained.explain.has_error());

    let single = request(Resource::new("dept:1")).with_policies(vec![
        Policy::allow("own", "read", "dept:1").with_range_dsl("owner = ${subjectId} OR public = 1"),
    ]);
    let decision = PolicyEngine::new().evaluate(&single);
    assert_eq!(decision.row_filter.unwrap().sql, "(owner = ? OR public = 1)");
}

#[test]
fn unknown_range_policy_loads_but_never_matches() {
    let policies: Vec<Policy> = serde_json::from_str(
        r#"[
            {"id": "up", "action_code": "read", "resource_code": "dept:1",
             "resource_range": "PARENT", "effect": "ALLOW", "inherit_flag": true},
            {"id": "self", "action_code": "read", "resource_code": "dept:1", "effect": "ALLOW"}
        ]"#,
    )
    .unwrap();
    assert_eq!(policies.len(), 2);

    let explained = PolicyEngine::new()
        .evaluate_with_explain(&request(Resource::new("dept:1")).with_policies(policies));
    assert_eq!(explained.decision_type(), DecisionType::Allow);
    assert_eq!(explained.allow_policy_ids, vec!["self"]);
}

#[test]
fn failing_source_leaves_context_untouched() {
    let source = |_: &DecisionContext| -> Result<Vec<Policy>, PolicyError> {
        Err(PolicyError::SourceFailed("backend unavailable".to_string()))
    };
    let mut ctx = request(Resource::new("dept:1"))
        .with_policies(vec![Policy::allow("p", "read", "dept:1")]);

    assert!(ctx.load_policies(&source).is_err());
    assert_eq!(ctx.policies.len(), 1);
}

fn arb_effect() -> impl Strategy<Value = Option<Effect>> {
    prop_oneof![
        Just(Some(Effect::Allow)),
        Just(Some(Effect::Deny)),
        Just(None),
    ]
}

fn arb_policy() -> impl Strategy<Value = Policy> {
    (0u32..1000, arb_effect(), any::<bool>(), any::<bool>()).prop_map(
        |(n, effect, matching_action, with_range)| {
            let action = if matching_action { "read" } else { "write" };
            let mut policy = Policy::allow(format!("p{}", n), action, "dept:1");
            policy.effect = effect;
            if with_range {
                policy = policy.with_range_dsl("owner = ${subjectId}");
            }
            policy
        },
    )
}

proptest! {
    #[test]
    fn deny_overrides_allow(policies in prop::collection::vec(arb_policy(), 0..12)) {
        let ctx = request(Resource::new("dept:1")).with_policies(policies.clone());
        let explained = PolicyEngine::new().evaluate_with_explain(&ctx);

        let applicable = policies.iter().filter(|p| p.action_code.as_deref() == Some("read"));
        let any_deny = applicable.clone().any(|p| p.effect == Some(Effect::Deny));
        let any_allow = applicable.clone().any(|p| p.effect == Some(Effect::Allow));

        if any_deny || !any_allow {
            prop_assert_eq!(explained.decision_type(), DecisionType::Deny);
            prop_assert!(explained.decision.row_filter.is_none());
            prop_assert!(explained.decision.column_constraint.is_none());
        } else {
            prop_assert_eq!(explained.decision_type(), DecisionType::Allow);
        }
    }

    #[test]
    fn non_matching_policies_always_deny(policies in prop::collection::vec(arb_policy(), 0..8)) {
        let ctx = request(Resource::new("dept:999")).with_policies(policies);
        prop_assert!(!PolicyEngine::new().evaluate(&ctx).is_allow());
    }
}
