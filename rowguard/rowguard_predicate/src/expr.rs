//! SQL expression AST.
//!
//! [`SqlExpr`] is what a compiled predicate renders to. Values appear only as
//! typed literal nodes; identifiers come from the resource registry and the
//! query rewriter, never from rule operands.
//!
//! `Display` produces readable SQL with escaped string literals for audit
//! output. Query rewriters should use [`SqlExpr::to_simple_expr`], which
//! hands the literals to `sea_query` as bound values.

use sea_query::{Alias, Expr, IntoColumnRef, SimpleExpr, Value};
use std::fmt;

/// A rendered SQL boolean or value expression.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlExpr {
    /// A column, optionally qualified by a table name or alias.
    Column {
        /// Table name or alias.
        qualifier: Option<String>,

        /// Column name.
        name: String,
    },

    /// A string literal.
    StringLiteral(String),

    /// An integer literal. Booleans are encoded as 1/0.
    LongLiteral(i64),

    /// A floating-point literal.
    DoubleLiteral(f64),

    /// Logical conjunction.
    And(Box<SqlExpr>, Box<SqlExpr>),

    /// Logical disjunction.
    Or(Box<SqlExpr>, Box<SqlExpr>),

    /// Equality.
    Eq(Box<SqlExpr>, Box<SqlExpr>),

    /// Membership in a literal list.
    In(Box<SqlExpr>, Vec<SqlExpr>),

    /// Inclusive range.
    Between {
        /// The tested expression.
        expr: Box<SqlExpr>,

        /// Lower bound.
        low: Box<SqlExpr>,

        /// Upper bound.
        high: Box<SqlExpr>,
    },

    /// Pattern match against a validated pattern.
    Like {
        /// The tested expression.
        expr: Box<SqlExpr>,

        /// The pattern.
        pattern: String,
    },
}

impl SqlExpr {
    /// A column reference.
    pub fn column(qualifier: Option<&str>, name: impl Into<String>) -> Self {
        Self::Column {
            qualifier: qualifier.map(str::to_string),
            name: name.into(),
        }
    }

    /// A string literal.
    pub fn string(value: impl Into<String>) -> Self {
        Self::StringLiteral(value.into())
    }

    /// `self AND other`
    pub fn and(self, other: SqlExpr) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// `self OR other`
    pub fn or(self, other: SqlExpr) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// `self = other`
    pub fn eq(self, other: SqlExpr) -> Self {
        Self::Eq(Box::new(self), Box::new(other))
    }

    /// Check if this node is a literal.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Self::StringLiteral(_) | Self::LongLiteral(_) | Self::DoubleLiteral(_)
        )
    }

    /// Convert into a `sea_query` expression with literals as bound values.
    pub fn to_simple_expr(&self) -> SimpleExpr {
        match self {
            Self::Column { qualifier, name } => {
                let column = match qualifier {
                    Some(q) => (Alias::new(q.as_str()), Alias::new(name.as_str())).into_column_ref(),
                    None => Alias::new(name.as_str()).into_column_ref(),
                };
                SimpleExpr::Column(column)
            }
            Self::StringLiteral(s) => SimpleExpr::Value(Value::from(s.clone())),
            Self::LongLiteral(i) => SimpleExpr::Value(Value::from(*i)),
            Self::DoubleLiteral(d) => SimpleExpr::Value(Value::from(*d)),
            Self::And(l, r) => l.to_simple_expr().and(r.to_simple_expr()),
            Self::Or(l, r) => l.to_simple_expr().or(r.to_simple_expr()),
            Self::Eq(l, r) => Expr::expr(l.to_simple_expr()).eq(r.to_simple_expr()),
            Self::In(e, items) => Expr::expr(e.to_simple_expr())
                .is_in(items.iter().map(SqlExpr::to_simple_expr)),
            Self::Between { expr, low, high } => Expr::expr(expr.to_simple_expr())
                .between(low.to_simple_expr(), high.to_simple_expr()),
            Self::Like { expr, pattern } => Expr::expr(expr.to_simple_expr()).like(pattern.as_str()),
        }
    }
}

fn write_string_literal(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    write!(f, "'{}'", value.replace('\'', "''"))
}

impl fmt::Display for SqlExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column { qualifier, name } => match qualifier {
                Some(q) => write!(f, "{}.{}", q, name),
                None => write!(f, "{}", name),
            },
            Self::StringLiteral(s) => write_string_literal(f, s),
            Self::LongLiteral(i) => write!(f, "{}", i),
            Self::DoubleLiteral(d) => write!(f, "{:?}", d),
            Self::And(l, r) => write!(f, "({} AND {})", l, r),
            Self::Or(l, r) => write!(f, "({} OR {})", l, r),
            Self::Eq(l, r) => write!(f, "{} = {}", l, r),
            Self::In(e, items) => {
                write!(f, "{} IN (", e)?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Self::Between { expr, low, high } => {
                write!(f, "{} BETWEEN {} AND {}", expr, low, high)
            }
            Self::Like { expr, pattern } => {
                write!(f, "{} LIKE ", expr)?;
                write_string_literal(f, pattern)
            }
        }
    }
}
