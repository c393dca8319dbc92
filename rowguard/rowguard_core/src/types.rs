//! Enumerations shared across the rowguard crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a policy grants or revokes access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Effect {
    /// Grant access.
    Allow,

    /// Revoke access. Always wins over [`Effect::Allow`].
    Deny,
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "ALLOW"),
            Self::Deny => write!(f, "DENY"),
        }
    }
}

/// How far a policy's resource scope extends.
///
/// Stored policies may carry range names this crate does not know. They load
/// as [`ResourceRange::Other`] and never match any resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceRange {
    /// Only the named resource.
    #[default]
    SelfOnly,

    /// Only descendants of the named resource.
    Children,

    /// The named resource and its descendants.
    SelfAndChildren,

    /// An unrecognized range name, kept as written.
    Other(String),
}

impl ResourceRange {
    /// Upper-case name of this range.
    pub fn as_str(&self) -> &str {
        match self {
            Self::SelfOnly => "SELF",
            Self::Children => "CHILDREN",
            Self::SelfAndChildren => "SELF_AND_CHILDREN",
            Self::Other(name) => name,
        }
    }

    /// Whether this is one of the known ranges.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for ResourceRange {
    fn from(name: String) -> Self {
        name.parse().unwrap_or(Self::Other(name))
    }
}

impl From<ResourceRange> for String {
    fn from(range: ResourceRange) -> Self {
        match range {
            ResourceRange::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for ResourceRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SELF" => Ok(Self::SelfOnly),
            "CHILDREN" => Ok(Self::Children),
            "SELF_AND_CHILDREN" => Ok(Self::SelfAndChildren),
            other => Err(format!("unknown resource range '{}'", other)),
        }
    }
}

impl fmt::Display for ResourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which dimension of a resource a policy restricts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PolicyScope {
    /// Restricts which rows are visible.
    Row,

    /// Restricts which columns are visible.
    Column,

    /// Grants or revokes the resource as a whole.
    Resource,
}

/// Outcome of a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DecisionType {
    /// The request may proceed, subject to any row and column constraints.
    Allow,

    /// The request must be rejected.
    Deny,
}

impl DecisionType {
    /// `true` for [`DecisionType::Allow`].
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

impl From<Effect> for DecisionType {
    fn from(effect: Effect) -> Self {
        match effect {
            Effect::Allow => Self::Allow,
            Effect::Deny => Self::Deny,
        }
    }
}

impl fmt::Display for DecisionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "ALLOW"),
            Self::Deny => write!(f, "DENY"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_range_serde_names() {
        assert_eq!(
            serde_json::to_string(&ResourceRange::SelfOnly).unwrap(),
            "\"SELF\""
        );
        assert_eq!(
            serde_json::to_string(&ResourceRange::SelfAndChildren).unwrap(),
            "\"SELF_AND_CHILDREN\""
        );
        let range: ResourceRange = serde_json::from_str("\"CHILDREN\"").unwrap();
        assert_eq!(range, ResourceRange::Children);
    }

    #[test]
    fn test_unknown_resource_range_loads() {
        let range: ResourceRange = serde_json::from_str("\"PARENT\"").unwrap();
        assert_eq!(range, ResourceRange::Other("PARENT".to_string()));
        assert!(!range.is_known());
        assert_eq!(serde_json::to_string(&range).unwrap(), "\"PARENT\"");
    }

    #[test]
    fn test_resource_range_from_str() {
        assert_eq!("self".parse::<ResourceRange>(), Ok(ResourceRange::SelfOnly));
        assert_eq!(
            "Self_And_Children".parse::<ResourceRange>(),
            Ok(ResourceRange::SelfAndChildren)
        );
        assert!("PARENT".parse::<ResourceRange>().is_err());
    }

    #[test]
    fn test_decision_from_effect() {
        assert_eq!(DecisionType::from(Effect::Allow), DecisionType::Allow);
        assert_eq!(DecisionType::from(Effect::Deny), DecisionType::Deny);
        assert!(DecisionType::Allow.is_allow());
    }
}
