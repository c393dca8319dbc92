//! Constraint resolution.
//!
//! This module turns the ALLOW policies of a decision into a row filter and
//! a column constraint.

use rowguard_core::{PolicyScope, RangeDslError};

use crate::model::{ColumnConstraint, DecisionContext, Policy};
use crate::range::{RangeContext, RangeDslParser, RangeFilterBuilder};

/// A built row filter and the range texts that went into it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRowFilter<F> {
    /// The filter.
    pub filter: F,

    /// The range texts, in combination order.
    pub applied_ranges: Vec<String>,
}

/// A resolver that derives constraints from applicable policies.
pub struct ConstraintResolver<'a, P, B> {
    /// Parses range texts.
    parser: &'a P,

    /// Builds the final row filter.
    builder: &'a B,
}

impl<'a, P, B> ConstraintResolver<'a, P, B>
where
    P: RangeDslParser,
    B: RangeFilterBuilder<P::Expr>,
{
    /// Create a new constraint resolver.
    ///
    /// # Arguments
    ///
    /// * `parser` - The range parser.
    /// * `builder` - The row filter builder.
    ///
    /// # Returns
    ///
    /// A new constraint resolver.
    pub fn new(parser: &'a P, builder: &'a B) -> Self {
        Self { parser, builder }
    }

    /// Build the row filter.
    ///
    /// Every ALLOW policy with ROW scope and non-blank range text
    /// contributes. Expressions are OR-ed left to right.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(_))` - The built filter.
    /// * `Ok(None)` - No policy restricts rows.
    /// * `Err` - A range text failed to parse or the filter failed to build.
    pub fn row_filter<'p, I>(
        &self,
        policies: I,
        context: &DecisionContext,
    ) -> Result<Option<ResolvedRowFilter<B::Filter>>, RangeDslError>
    where
        I: IntoIterator<Item = &'p Policy>,
    {
        let mut combined: Option<P::Expr> = None;
        let mut applied_ranges = Vec::new();

        for policy in policies {
            if !policy.is_allow() || policy.resolved_scope() != PolicyScope::Row {
                continue;
            }
            let Some(text) = policy.range_text() else {
                continue;
            };

            let expr = self.parser.parse(text)?;
            combined = Some(match combined {
                Some(acc) => self.parser.or(acc, expr),
                None => expr,
            });
            applied_ranges.push(text.to_string());
        }

        let Some(expr) = combined else {
            return Ok(None);
        };

        let filter = self.builder.build(expr, &RangeContext::from(context))?;
        Ok(Some(ResolvedRowFilter {
            filter,
            applied_ranges,
        }))
    }

    /// Union the column sets of every ALLOW policy with COLUMN scope.
    ///
    /// Returns `None` when no such policy exists.
    pub fn column_constraint<'p, I>(&self, policies: I) -> Option<ColumnConstraint>
    where
        I: IntoIterator<Item = &'p Policy>,
    {
        let mut constraint: Option<ColumnConstraint> = None;

        for policy in policies {
            if !policy.is_allow() || policy.resolved_scope() != PolicyScope::Column {
                continue;
            }
            let c = constraint.get_or_insert_with(ColumnConstraint::default);
            c.allow_columns.extend(policy.allow_columns.iter().cloned());
            c.deny_columns.extend(policy.deny_columns.iter().cloned());
        }

        constraint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Resource, Subject};
    use crate::range::{TemplateFilterBuilder, TemplateRangeParser};
    use rowguard_core::AccessValue;

    type Resolver<'a> = ConstraintResolver<'a, TemplateRangeParser, TemplateFilterBuilder>;

    fn context() -> DecisionContext {
        DecisionContext::new(Subject::new("u-1"), "read", Resource::new("dept:1"))
    }

    #[test]
    fn test_row_filter_or_combines_left_to_right() {
        let policies = vec![
            Policy::allow("a", "read", "dept:1").with_range_dsl("owner = ${subjectId}"),
            Policy::allow("b", "read", "dept:1").with_deny_columns(["salary"]),
            Policy::allow("c", "read", "dept:1").with_range_dsl("dept = ${resourceCode}"),
            Policy::allow("d", "read", "dept:1").with_range_dsl("public = 1"),
        ];

        let resolved = Resolver::new(&TemplateRangeParser, &TemplateFilterBuilder)
            .row_filter(&policies, &context())
            .unwrap()
            .unwrap();

        assert_eq!(
            resolved.filter.sql,
            "(owner = ?) OR (dept = ?) OR (public = 1)"
        );
        assert_eq!(
            resolved.filter.params,
            vec![AccessValue::from("u-1"), AccessValue::from("dept:1")]
        );
        assert_eq!(resolved.applied_ranges.len(), 3);
    }

    #[test]
    fn test_no_row_policies_means_no_filter() {
        let policies = vec![Policy::allow("a", "read", "dept:1")];
        let resolved = Resolver::new(&TemplateRangeParser, &TemplateFilterBuilder)
            .row_filter(&policies, &context())
            .unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn test_parse_failure_propagates() {
        let policies = vec![Policy::allow("a", "read", "dept:1").with_range_dsl("x = ${broken")];
        let result = Resolver::new(&TemplateRangeParser, &TemplateFilterBuilder)
            .row_filter(&policies, &context());
        assert!(matches!(result, Err(RangeDslError::Parse(_))));
    }

    #[test]
    fn test_column_constraint_union() {
        let policies = vec![
            Policy::allow("a", "read", "dept:1").with_allow_columns(["name", "code"]),
            Policy::allow("b", "read", "dept:1")
                .with_allow_columns(["salary"])
                .with_deny_columns(["salary"]),
            Policy::deny("c", "read", "dept:1").with_deny_columns(["name"]),
            Policy::allow("d", "read", "dept:1").with_range_dsl("x = 1"),
        ];

        let resolver = Resolver::new(&TemplateRangeParser, &TemplateFilterBuilder);
        let constraint = resolver.column_constraint(&policies).unwrap();
        assert_eq!(constraint.allow_columns.len(), 3);
        assert_eq!(constraint.deny_columns.len(), 1);
        assert!(!constraint.is_column_allowed("salary"));

        let none: Vec<Policy> = vec![Policy::allow("a", "read", "dept:1")];
        assert!(resolver.column_constraint(&none).is_none());
    }

    #[test]
    fn test_custom_collaborators() {
        struct Upper;
        impl RangeDslParser for Upper {
            type Expr = Vec<String>;
            fn parse(&self, text: &str) -> Result<Vec<String>, RangeDslError> {
                Ok(vec![text.to_uppercase()])
            }
            fn or(&self, mut left: Vec<String>, right: Vec<String>) -> Vec<String> {
                left.extend(right);
                left
            }
        }
        struct Join;
        impl RangeFilterBuilder<Vec<String>> for Join {
            type Filter = String;
            fn build(&self, expr: Vec<String>, _: &RangeContext<'_>) -> Result<String, RangeDslError> {
                Ok(expr.join(" | "))
            }
        }

        let policies = vec![
            Policy::allow("a", "read", "dept:1").with_range_dsl("a"),
            Policy::allow("b", "read", "dept:1").with_range_dsl("b"),
        ];
        let resolved = ConstraintResolver::new(&Upper, &Join)
            .row_filter(&policies, &context())
            .unwrap()
            .unwrap();
        assert_eq!(resolved.filter, "A | B");
    }
}
