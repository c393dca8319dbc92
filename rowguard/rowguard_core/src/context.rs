//! Access context.
//!
//! The access context describes who is asking. It is supplied by the caller
//! (typically populated by the web layer from the authenticated request) and
//! is only ever read by rowguard.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::value::AccessValue;

/// Read-only view of the requesting subject.
pub trait AccessContext {
    /// The id of the requesting subject, if authenticated.
    fn subject_id(&self) -> Option<&str>;

    /// Additional subject attributes, keyed by name.
    fn attributes(&self) -> &BTreeMap<String, AccessValue>;

    /// Look up one attribute.
    fn attribute(&self, name: &str) -> Option<&AccessValue> {
        self.attributes().get(name)
    }
}

/// A plain, owned access context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessContextValue {
    /// The subject id.
    #[serde(default)]
    pub subject_id: Option<String>,

    /// The subject attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, AccessValue>,
}

impl AccessContextValue {
    /// Create a context for the given subject with no attributes.
    pub fn new(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: Some(subject_id.into()),
            attributes: BTreeMap::new(),
        }
    }

    /// Create a context with no subject.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AccessValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

impl AccessContext for AccessContextValue {
    fn subject_id(&self) -> Option<&str> {
        self.subject_id.as_deref()
    }

    fn attributes(&self) -> &BTreeMap<String, AccessValue> {
        &self.attributes
    }
}
