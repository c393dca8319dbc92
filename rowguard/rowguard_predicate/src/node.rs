//! Deferred predicate tree.

use rowguard_core::RenderError;

use crate::column::{ColumnRef, ColumnRenderer, TableRef};
use crate::expr::SqlExpr;

/// A compiled condition whose columns are not yet bound to a table.
///
/// Operands are literal [`SqlExpr`] nodes fixed at compile time. Only the
/// column side is rendered later, once per table occurrence.
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateNode {
    /// Both sides must hold.
    And(Box<PredicateNode>, Box<PredicateNode>),

    /// Either side may hold.
    Or(Box<PredicateNode>, Box<PredicateNode>),

    /// `column = value`
    Eq {
        /// The column.
        column: ColumnRef,

        /// A literal.
        value: SqlExpr,
    },

    /// `column IN (values)`
    In {
        /// The column.
        column: ColumnRef,

        /// Non-empty literal list.
        values: Vec<SqlExpr>,
    },

    /// `column BETWEEN low AND high`
    Between {
        /// The column.
        column: ColumnRef,

        /// Lower bound literal.
        low: SqlExpr,

        /// Upper bound literal.
        high: SqlExpr,
    },

    /// `column LIKE pattern`
    Like {
        /// The column.
        column: ColumnRef,

        /// A validated prefix or suffix pattern.
        pattern: String,
    },
}

impl PredicateNode {
    /// `self AND other`
    pub fn and(self, other: PredicateNode) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// `self OR other`
    pub fn or(self, other: PredicateNode) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Render this tree against a table occurrence.
    ///
    /// Fails if any pinned column belongs to a different table.
    pub fn render(&self, table: &TableRef) -> Result<SqlExpr, RenderError> {
        match self {
            Self::And(l, r) => Ok(l.render(table)?.and(r.render(table)?)),
            Self::Or(l, r) => Ok(l.render(table)?.or(r.render(table)?)),
            Self::Eq { column, value } => {
                Ok(ColumnRenderer::render(column, table)?.eq(value.clone()))
            }
            Self::In { column, values } => Ok(SqlExpr::In(
                Box::new(ColumnRenderer::render(column, table)?),
                values.clone(),
            )),
            Self::Between { column, low, high } => Ok(SqlExpr::Between {
                expr: Box::new(ColumnRenderer::render(column, table)?),
                low: Box::new(low.clone()),
                high: Box::new(high.clone()),
            }),
            Self::Like { column, pattern } => Ok(SqlExpr::Like {
                expr: Box::new(ColumnRenderer::render(column, table)?),
                pattern: pattern.clone(),
            }),
        }
    }

    /// Number of leaf conditions in the tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::And(l, r) | Self::Or(l, r) => l.leaf_count() + r.leaf_count(),
            _ => 1,
        }
    }

    /// Columns referenced by the tree, left to right.
    pub fn columns(&self) -> Vec<&ColumnRef> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a ColumnRef>) {
        match self {
            Self::And(l, r) | Self::Or(l, r) => {
                l.collect_columns(out);
                r.collect_columns(out);
            }
            Self::Eq { column, .. }
            | Self::In { column, .. }
            | Self::Between { column, .. }
            | Self::Like { column, .. } => out.push(column),
        }
    }
}
