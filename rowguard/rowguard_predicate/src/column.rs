//! Alias-aware column rendering.
//!
//! A compiled tree may be rendered several times in one query, once per
//! occurrence of a table, each occurrence possibly under a different alias.
//! Every render call checks pinned columns against the live table, so a
//! condition compiled for one table cannot attach to another.

use rowguard_core::RenderError;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::expr::SqlExpr;

/// A logical column, optionally pinned to a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Owning table, if the column must only render against that table.
    #[serde(default)]
    pub table: Option<String>,

    /// Column name.
    pub column: String,
}

impl ColumnRef {
    /// A column that renders against whatever table is current.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            table: None,
            column: column.into(),
        }
    }

    /// A column pinned to the given table.
    pub fn pinned(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            column: column.into(),
        }
    }

    fn pinned_table(&self) -> Option<&str> {
        self.table.as_deref().filter(|t| !t.trim().is_empty())
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pinned_table() {
            Some(table) => write!(f, "{}.{}", table, self.column),
            None => write!(f, "{}", self.column),
        }
    }
}

/// The table occurrence currently being rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    /// Base table name.
    pub name: String,

    /// Alias of this occurrence, if any.
    #[serde(default)]
    pub alias: Option<String>,
}

impl TableRef {
    /// An unaliased table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    /// An aliased table occurrence.
    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }

    /// The alias, ignoring blank ones.
    pub fn alias(&self) -> Option<&str> {
        self.alias
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }
}

/// Trimmed, case-folded table name used for comparisons.
pub fn normalize_table_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Renders [`ColumnRef`]s against a [`TableRef`].
pub struct ColumnRenderer;

impl ColumnRenderer {
    /// Render a column for the current table.
    ///
    /// Unpinned columns use the alias when present and are left unqualified
    /// otherwise (which may be ambiguous in joins). Pinned columns must name
    /// the current base table; they then use the alias, falling back to the
    /// base table name.
    pub fn render(column: &ColumnRef, table: &TableRef) -> Result<SqlExpr, RenderError> {
        match column.pinned_table() {
            None => Ok(SqlExpr::column(table.alias(), column.column.as_str())),
            Some(pinned) => {
                if normalize_table_name(pinned) != normalize_table_name(&table.name) {
                    return Err(RenderError::CrossTable {
                        column: column.column.clone(),
                        pinned_table: pinned.to_string(),
                        current_table: table.name.clone(),
                    });
                }

                let qualifier = table.alias().unwrap_or_else(|| table.name.trim());
                Ok(SqlExpr::column(Some(qualifier), column.column.as_str()))
            }
        }
    }
}
