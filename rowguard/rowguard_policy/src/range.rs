//! Range expression collaborators.
//!
//! The engine never interprets range text itself. It asks a
//! [`RangeDslParser`] to turn each ROW-scoped policy's text into an
//! expression, combines the expressions with OR, and hands the result to a
//! [`RangeFilterBuilder`] together with a [`RangeContext`] to substitute
//! from.
//!
//! [`TemplateRangeParser`] and [`TemplateFilterBuilder`] are the bundled
//! implementation: range text is an opaque SQL-like template whose `${name}`
//! placeholders become positional parameters. Templates are confined to a
//! single parenthesized boolean expression: statement separators, comments
//! and unbalanced parentheses outside quoted literals are rejected.

use rowguard_core::placeholder::{self, PlaceholderError};
use rowguard_core::{AccessValue, RangeDslError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::model::{DecisionContext, Resource, Subject};

/// Parses range text into an expression.
pub trait RangeDslParser {
    /// The parsed expression type.
    type Expr;

    /// Parse one policy's range text.
    fn parse(&self, text: &str) -> Result<Self::Expr, RangeDslError>;

    /// Combine two expressions so that either one grants access.
    fn or(&self, left: Self::Expr, right: Self::Expr) -> Self::Expr;
}

/// Builds a row filter from a combined expression.
pub trait RangeFilterBuilder<E> {
    /// The row filter type handed to the enforcement layer.
    type Filter;

    /// Build the filter, substituting values from the context.
    fn build(&self, expr: E, context: &RangeContext<'_>) -> Result<Self::Filter, RangeDslError>;
}

/// Placeholder resolved to the tenant code.
pub const TENANT_CODE: &str = "tenantCode";

/// Placeholder resolved to the subject id.
pub const SUBJECT_ID: &str = "subjectId";

/// Placeholder resolved to the resource code.
pub const RESOURCE_CODE: &str = "resourceCode";

/// Placeholder resolved to the resource type code.
pub const RESOURCE_TYPE_CODE: &str = "resourceTypeCode";

/// Substitution sources for range expressions.
#[derive(Debug, Clone, Copy)]
pub struct RangeContext<'a> {
    /// The tenant of the request.
    pub tenant_code: Option<&'a str>,

    /// The requesting subject.
    pub subject: &'a Subject,

    /// The accessed resource.
    pub resource: &'a Resource,

    /// The request environment.
    pub environment: &'a BTreeMap<String, AccessValue>,
}

impl<'a> RangeContext<'a> {
    /// Look up a placeholder.
    ///
    /// The four well-known names map to context fields; anything else is
    /// looked up in the environment. A well-known name whose field is unset
    /// resolves to nothing.
    pub fn lookup(&self, name: &str) -> Option<AccessValue> {
        let field = match name {
            TENANT_CODE => self.tenant_code,
            SUBJECT_ID => self.subject.id.as_deref(),
            RESOURCE_CODE => self.resource.code.as_deref(),
            RESOURCE_TYPE_CODE => self.resource.type_code.as_deref(),
            _ => return self.environment.get(name).cloned(),
        };
        field.map(AccessValue::from)
    }
}

impl<'a> From<&'a DecisionContext> for RangeContext<'a> {
    fn from(context: &'a DecisionContext) -> Self {
        Self {
            tenant_code: context.tenant_code.as_deref(),
            subject: &context.subject,
            resource: &context.resource,
            environment: &context.environment,
        }
    }
}

/// A parsed range template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeExpr {
    /// One policy's template text.
    Text(String),

    /// Either side grants access.
    Or(Box<RangeExpr>, Box<RangeExpr>),
}

impl fmt::Display for RangeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{}", text),
            Self::Or(l, r) => write!(f, "({}) OR ({})", l, r),
        }
    }
}

/// A parameterized row filter.
///
/// `sql` contains one `?` per entry of `params`, in order. Placeholder values
/// are never spliced into the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowFilter {
    /// Filter text with positional markers.
    pub sql: String,

    /// Bound values.
    pub params: Vec<AccessValue>,
}

/// Parser for `${name}` templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRangeParser;

impl RangeDslParser for TemplateRangeParser {
    type Expr = RangeExpr;

    fn parse(&self, text: &str) -> Result<RangeExpr, RangeDslError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(RangeDslError::Parse("empty range expression".to_string()));
        }
        placeholder::scan(text).map_err(placeholder_error)?;
        check_confined(text)?;
        Ok(RangeExpr::Text(text.to_string()))
    }

    fn or(&self, left: RangeExpr, right: RangeExpr) -> RangeExpr {
        RangeExpr::Or(Box::new(left), Box::new(right))
    }
}

/// Builds [`RowFilter`]s from [`RangeExpr`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateFilterBuilder;

impl TemplateFilterBuilder {
    fn render(
        expr: &RangeExpr,
        context: &RangeContext<'_>,
        sql: &mut String,
        params: &mut Vec<AccessValue>,
    ) -> Result<(), RangeDslError> {
        match expr {
            RangeExpr::Text(text) => {
                sql.push('(');
                let mut cursor = 0;
                for found in placeholder::scan(text).map_err(placeholder_error)? {
                    let value = context
                        .lookup(found.name)
                        .ok_or_else(|| RangeDslError::UnknownPlaceholder(found.name.to_string()))?;
                    sql.push_str(&text[cursor..found.start]);
                    sql.push('?');
                    params.push(value);
                    cursor = found.end;
                }
                sql.push_str(&text[cursor..]);
                sql.push(')');
            }
            RangeExpr::Or(l, r) => {
                Self::render(l, context, sql, params)?;
                sql.push_str(" OR ");
                Self::render(r, context, sql, params)?;
            }
        }
        Ok(())
    }
}

impl RangeFilterBuilder<RangeExpr> for TemplateFilterBuilder {
    type Filter = RowFilter;

    fn build(&self, expr: RangeExpr, context: &RangeContext<'_>) -> Result<RowFilter, RangeDslError> {
        let mut sql = String::new();
        let mut params = Vec::new();
        Self::render(&expr, context, &mut sql, &mut params)?;
        Ok(RowFilter { sql, params })
    }
}

fn placeholder_error(err: PlaceholderError) -> RangeDslError {
    RangeDslError::Parse(err.to_string())
}

/// Reject text that could escape its own parenthesized group.
///
/// Single-quoted literals (with `''` as an escaped quote) are skipped.
fn check_confined(text: &str) -> Result<(), RangeDslError> {
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quote {
            match c {
                '\'' if chars.peek() == Some(&'\'') => {
                    chars.next();
                }
                '\'' => in_quote = false,
                '$' if chars.peek() == Some(&'{') => {
                    return Err(confinement_error("placeholder inside a string literal"))
                }
                _ => {}
            }
            continue;
        }
        match c {
            '\'' => in_quote = true,
            ';' => return Err(confinement_error("statement separator ';'")),
            '-' if chars.peek() == Some(&'-') => {
                return Err(confinement_error("line comment '--'"))
            }
            '/' if chars.peek() == Some(&'*') => {
                return Err(confinement_error("block comment '/*'"))
            }
            '*' if chars.peek() == Some(&'/') => {
                return Err(confinement_error("block comment '*/'"))
            }
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| confinement_error("unbalanced ')'"))?;
            }
            _ => {}
        }
    }

    if in_quote {
        return Err(confinement_error("unterminated string literal"));
    }
    if depth != 0 {
        return Err(confinement_error("unbalanced '('"));
    }
    Ok(())
}

fn confinement_error(what: &str) -> RangeDslError {
    RangeDslError::Parse(format!("range expression contains {}", what))
}
