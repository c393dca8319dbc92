//! Column constraint model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Column restrictions collected from COLUMN-scoped ALLOW policies.
///
/// The two sets are plain unions of what the policies declared. A column may
/// appear in both; the helper methods resolve that with deny winning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConstraint {
    /// Union of exposed columns.
    pub allow_columns: BTreeSet<String>,

    /// Union of hidden columns.
    pub deny_columns: BTreeSet<String>,
}

impl ColumnConstraint {
    /// Whether both sets are empty.
    pub fn is_empty(&self) -> bool {
        self.allow_columns.is_empty() && self.deny_columns.is_empty()
    }

    /// Whether a column may be returned.
    ///
    /// Denied columns are never allowed. When an allow list exists the column
    /// must be on it; an empty allow list restricts nothing.
    pub fn is_column_allowed(&self, column: &str) -> bool {
        if self.deny_columns.contains(column) {
            return false;
        }
        self.allow_columns.is_empty() || self.allow_columns.contains(column)
    }

    /// Allowed columns minus denied ones.
    pub fn effective_allow_columns(&self) -> BTreeSet<String> {
        self.allow_columns
            .difference(&self.deny_columns)
            .cloned()
            .collect()
    }

    /// Columns present in both sets.
    pub fn conflicts(&self) -> BTreeSet<String> {
        self.allow_columns
            .intersection(&self.deny_columns)
            .cloned()
            .collect()
    }
}
