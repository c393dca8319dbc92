//! Decision auditing.
//!
//! This module keeps a bounded, per-subject history of decisions. Both the
//! records per subject and the number of subjects are capped; when a new
//! subject arrives at the cap, the subject idle the longest is evicted.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rowguard_core::DecisionType;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::model::{DecisionContext, DecisionExplain};

/// Key used for requests without a subject id.
const ANONYMOUS: &str = "<anonymous>";

/// Default cap on tracked subjects.
const DEFAULT_MAX_SUBJECTS: usize = 10_000;

/// One recorded decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique record id.
    pub id: Uuid,

    /// When the decision was recorded.
    pub timestamp: DateTime<Utc>,

    /// The requesting subject.
    pub subject_id: Option<String>,

    /// The tenant of the request.
    pub tenant_code: Option<String>,

    /// The requested action.
    pub action_code: Option<String>,

    /// The accessed resource.
    pub resource_code: Option<String>,

    /// The verdict.
    pub decision_type: DecisionType,

    /// The verdict's reason.
    pub reason: String,

    /// Ids of matching ALLOW policies.
    pub allow_policy_ids: Vec<String>,

    /// Ids of matching DENY policies.
    pub deny_policy_ids: Vec<String>,
}

impl AuditRecord {
    /// Summarize an explained decision.
    pub fn new<F>(context: &DecisionContext, explained: &DecisionExplain<F>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            subject_id: context.subject.id.clone(),
            tenant_code: context.tenant_code.clone(),
            action_code: context.action_code.clone(),
            resource_code: context.resource.code.clone(),
            decision_type: explained.decision.decision_type,
            reason: explained.decision.reason.clone(),
            allow_policy_ids: explained.allow_policy_ids.clone(),
            deny_policy_ids: explained.deny_policy_ids.clone(),
        }
    }

    /// Whether a policy contributed to this decision.
    pub fn involves_policy(&self, policy_id: &str) -> bool {
        self.allow_policy_ids.iter().any(|id| id == policy_id)
            || self.deny_policy_ids.iter().any(|id| id == policy_id)
    }
}

/// A decision audit trail.
///
/// Clones share the same storage, so a handle kept by the caller sees what
/// the engine records.
#[derive(Clone)]
pub struct DecisionAudit {
    /// The records, keyed by subject id.
    entries: Arc<DashMap<String, Vec<AuditRecord>>>,

    /// The maximum number of records to keep per subject.
    max_entries_per_subject: usize,

    /// The maximum number of subjects to track.
    max_subjects: usize,
}

impl DecisionAudit {
    /// Create a new decision audit.
    ///
    /// # Arguments
    ///
    /// * `max_entries_per_subject` - Older records beyond this bound are
    ///   dropped.
    pub fn new(max_entries_per_subject: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            max_entries_per_subject,
            max_subjects: DEFAULT_MAX_SUBJECTS,
        }
    }

    /// Cap the number of tracked subjects.
    pub fn with_max_subjects(mut self, max_subjects: usize) -> Self {
        self.max_subjects = max_subjects.max(1);
        self
    }

    /// Number of subjects with recorded decisions.
    pub fn subject_count(&self) -> usize {
        self.entries.len()
    }

    /// Record a decision.
    pub fn record(&self, record: AuditRecord) {
        let key = record
            .subject_id
            .clone()
            .unwrap_or_else(|| ANONYMOUS.to_string());

        if !self.entries.contains_key(&key) {
            while self.entries.len() >= self.max_subjects {
                match self.idlest_subject() {
                    Some(victim) => {
                        self.entries.remove(&victim);
                    }
                    None => break,
                }
            }
        }

        let mut records = self.entries.entry(key).or_default();
        records.push(record);
        if records.len() > self.max_entries_per_subject {
            let to_remove = records.len() - self.max_entries_per_subject;
            records.drain(0..to_remove);
        }
    }

    /// Records for a subject, oldest first. `None` selects anonymous requests.
    pub fn records_for_subject(&self, subject_id: Option<&str>) -> Vec<AuditRecord> {
        self.entries
            .get(subject_id.unwrap_or(ANONYMOUS))
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Drop the records of a subject.
    pub fn clear_subject(&self, subject_id: Option<&str>) {
        self.entries.remove(subject_id.unwrap_or(ANONYMOUS));
    }

    /// All records.
    pub fn all_records(&self) -> Vec<AuditRecord> {
        self.filtered(|_| true)
    }

    /// Records with the given verdict.
    pub fn records_by_decision(&self, decision_type: DecisionType) -> Vec<AuditRecord> {
        self.filtered(|record| record.decision_type == decision_type)
    }

    /// Records a policy contributed to.
    pub fn records_by_policy(&self, policy_id: &str) -> Vec<AuditRecord> {
        self.filtered(|record| record.involves_policy(policy_id))
    }

    /// The subject whose latest record is the oldest.
    fn idlest_subject(&self) -> Option<String> {
        self.entries
            .iter()
            .min_by_key(|entry| entry.value().last().map(|r| r.timestamp))
            .map(|entry| entry.key().clone())
    }

    fn filtered<F>(&self, predicate: F) -> Vec<AuditRecord>
    where
        F: Fn(&AuditRecord) -> bool,
    {
        let mut records = Vec::new();
        for entry in self.entries.iter() {
            records.extend(entry.value().iter().filter(|r| predicate(r)).cloned());
        }
        records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        records
    }
}

impl Default for DecisionAudit {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Decision, Resource, Subject};
    use rowguard_core::Explain;

    fn record(subject: Option<&str>, decision: DecisionType, ids: &[&str]) -> AuditRecord {
        let subject = match subject {
            Some(id) => Subject::new(id),
            None => Subject::default(),
        };
        let context = DecisionContext::new(subject, "read", Resource::new("dept:1"));
        let decision: Decision<()> = match decision {
            DecisionType::Allow => Decision::allow("ok", None, None),
            DecisionType::Deny => Decision::deny("no"),
        };
        let explained = DecisionExplain {
            decision,
            allow_policy_ids: ids.iter().map(|s| s.to_string()).collect(),
            deny_policy_ids: Vec::new(),
            applied_ranges: Vec::new(),
            inherited: false,
            explain: Explain::new(),
        };
        AuditRecord::new(&context, &explained)
    }

    #[test]
    fn test_record_and_query() {
        let audit = DecisionAudit::new(10);
        audit.record(record(Some("u-1"), DecisionType::Allow, &["p1"]));
        audit.record(record(Some("u-1"), DecisionType::Deny, &[]));
        audit.record(record(Some("u-2"), DecisionType::Allow, &["p2"]));
        audit.record(record(None, DecisionType::Deny, &[]));

        assert_eq!(audit.records_for_subject(Some("u-1")).len(), 2);
        assert_eq!(audit.records_for_subject(None).len(), 1);
        assert_eq!(audit.records_by_decision(DecisionType::Allow).len(), 2);
        assert_eq!(audit.records_by_policy("p2").len(), 1);
        assert_eq!(audit.all_records().len(), 4);

        audit.clear_subject(Some("u-1"));
        assert!(audit.records_for_subject(Some("u-1")).is_empty());
    }

    #[test]
    fn test_bounded_per_subject() {
        let audit = DecisionAudit::new(2);
        for id in ["p1", "p2", "p3"] {
            audit.record(record(Some("u-1"), DecisionType::Allow, &[id]));
        }

        let records = audit.records_for_subject(Some("u-1"));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].allow_policy_ids, vec!["p2"]);
        assert_eq!(records[1].allow_policy_ids, vec!["p3"]);
    }

    #[test]
    fn test_subject_count_is_capped() {
        let audit = DecisionAudit::new(10).with_max_subjects(2);
        let start = Utc::now();
        for (offset, subject) in ["u-1", "u-2", "u-1", "u-3"].into_iter().enumerate() {
            let mut entry = record(Some(subject), DecisionType::Allow, &[]);
            entry.timestamp = start + chrono::Duration::seconds(offset as i64);
            audit.record(entry);
        }

        assert_eq!(audit.subject_count(), 2);
        assert!(audit.records_for_subject(Some("u-2")).is_empty());
        assert_eq!(audit.records_for_subject(Some("u-1")).len(), 2);
        assert_eq!(audit.records_for_subject(Some("u-3")).len(), 1);
    }

    #[test]
    fn test_clones_share_storage() {
        let audit = DecisionAudit::default();
        let handle = audit.clone();
        audit.record(record(Some("u-1"), DecisionType::Deny, &[]));
        assert_eq!(handle.all_records().len(), 1);
    }
}
