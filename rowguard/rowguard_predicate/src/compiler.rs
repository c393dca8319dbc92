//! Rule compiler.
//!
//! Turns a [`RuleSet`] into a [`CompiledPredicate`]. Rules are compiled in
//! descending priority order; the predicates of a rule are joined by the
//! rule's combine mode and the rules are OR-ed together. Any validation
//! failure aborts the whole compile and returns the explain log collected so
//! far inside the [`CompileError`].

use rowguard_core::{
    AccessContext, CompileError, CompileErrorKind, CompilerConfig, Explain, RenderError,
};
use sea_query::SimpleExpr;
use tracing::{debug, warn};

use crate::column::{ColumnRef, TableRef};
use crate::expr::SqlExpr;
use crate::literal::{is_between_compatible, is_safe_like_pattern, to_literal};
use crate::model::{Operator, PredicateDef, RuleDef, RuleSet};
use crate::node::PredicateNode;
use crate::registry::ResourceRegistry;
use crate::variable::VariableResolver;

/// A compiled rule set, ready to render against a table occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPredicate {
    resource_id: String,
    root: PredicateNode,
    explain: Explain,
}

impl CompiledPredicate {
    /// The resource the rule set guards.
    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    /// The root of the predicate tree.
    pub fn root(&self) -> &PredicateNode {
        &self.root
    }

    /// The compile-time explain log.
    pub fn explain(&self) -> &Explain {
        &self.explain
    }

    /// Render against the table currently being rewritten.
    ///
    /// Pure and repeatable: the same tree can be rendered for every
    /// occurrence of a table in one query.
    pub fn to_expression(&self, table: &TableRef) -> Result<SqlExpr, RenderError> {
        self.root.render(table)
    }

    /// Render and convert into a `sea_query` condition with bound values.
    pub fn to_simple_expr(&self, table: &TableRef) -> Result<SimpleExpr, RenderError> {
        Ok(self.to_expression(table)?.to_simple_expr())
    }
}

/// Compiles rule sets into predicate trees.
#[derive(Debug, Clone, Default)]
pub struct RuleCompiler {
    config: CompilerConfig,
}

impl RuleCompiler {
    /// Create a compiler with the given configuration.
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile a rule set for one access context.
    pub fn compile<C, R>(
        &self,
        rule_set: &RuleSet,
        context: &C,
        registry: &R,
    ) -> Result<CompiledPredicate, CompileError>
    where
        C: AccessContext + ?Sized,
        R: ResourceRegistry + ?Sized,
    {
        let mut explain = Explain::new();
        let resource_id = rule_set.resource_id.as_str();

        if rule_set.rules.is_empty() {
            return Err(fail(
                CompileErrorKind::EmptyRuleSet(resource_id.to_string()),
                explain,
            ));
        }

        // Stable sort keeps authoring order among equal priorities
        let mut rules: Vec<&RuleDef> = rule_set.rules.iter().collect();
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));

        let resolver = VariableResolver::new(context, &self.config);
        let mut root: Option<PredicateNode> = None;

        for rule in rules {
            let combine = rule.combine.unwrap_or_default();
            let mut rule_node: Option<PredicateNode> = None;

            for predicate in &rule.predicates {
                let node = match self.compile_predicate(
                    resource_id,
                    predicate,
                    &resolver,
                    registry,
                    &mut explain,
                ) {
                    Ok(node) => node,
                    Err(kind) => return Err(fail(kind, explain)),
                };

                rule_node = Some(match rule_node {
                    Some(acc) => combine.combine(acc, node),
                    None => node,
                });
            }

            match rule_node {
                Some(node) => {
                    explain.info(format!(
                        "rule priority {} compiled: {} predicate(s) joined by {}",
                        rule.priority,
                        rule.predicates.len(),
                        combine.as_str()
                    ));
                    root = Some(match root {
                        Some(acc) => acc.or(node),
                        None => node,
                    });
                }
                None => {
                    explain.warn(format!("rule priority {} has no predicates", rule.priority));
                }
            }
        }

        let root = match root {
            Some(root) => root,
            None => {
                return Err(fail(
                    CompileErrorKind::NoValidExpression(resource_id.to_string()),
                    explain,
                ))
            }
        };

        debug!(
            resource_id = %resource_id,
            rules = rule_set.rules.len(),
            leaves = root.leaf_count(),
            "Compiled rule set"
        );

        Ok(CompiledPredicate {
            resource_id: resource_id.to_string(),
            root,
            explain,
        })
    }

    fn compile_predicate<C, R>(
        &self,
        resource_id: &str,
        predicate: &PredicateDef,
        resolver: &VariableResolver<'_, C>,
        registry: &R,
        explain: &mut Explain,
    ) -> Result<PredicateNode, CompileErrorKind>
    where
        C: AccessContext + ?Sized,
        R: ResourceRegistry + ?Sized,
    {
        let field_key = predicate.field_key.as_str();
        let operator = predicate.operator;

        let column: ColumnRef =
            registry
                .resolve(resource_id, field_key)
                .ok_or_else(|| CompileErrorKind::UnknownField {
                    resource_id: resource_id.to_string(),
                    field_key: field_key.to_string(),
                })?;

        let values = resolver.resolve(field_key, &predicate.values, explain)?;

        let node = match operator {
            Operator::Eq => {
                expect_arity(operator, field_key, &values, 1, "exactly 1")?;
                PredicateNode::Eq {
                    column,
                    value: to_literal(&values[0], operator)?,
                }
            }
            Operator::In => {
                if values.is_empty() {
                    return Err(arity_error(operator, field_key, "at least 1", 0));
                }
                let literals = values
                    .iter()
                    .map(|v| to_literal(v, operator))
                    .collect::<Result<Vec<_>, _>>()?;
                PredicateNode::In {
                    column,
                    values: literals,
                }
            }
            Operator::Between => {
                expect_arity(operator, field_key, &values, 2, "exactly 2")?;
                let (low, high) = (&values[0], &values[1]);
                if !is_between_compatible(low, high) {
                    return Err(CompileErrorKind::BetweenTypeMismatch {
                        field_key: field_key.to_string(),
                        lower: low.type_name(),
                        upper: high.type_name(),
                    });
                }
                PredicateNode::Between {
                    column,
                    low: to_literal(low, operator)?,
                    high: to_literal(high, operator)?,
                }
            }
            Operator::Like => {
                expect_arity(operator, field_key, &values, 1, "exactly 1")?;
                let pattern = values[0].as_str().ok_or(CompileErrorKind::UnsupportedLiteral {
                    operator: operator.as_str(),
                    type_name: values[0].type_name(),
                })?;
                if pattern.is_empty() {
                    return Err(CompileErrorKind::EmptyLikePattern(field_key.to_string()));
                }
                if !is_safe_like_pattern(pattern) {
                    return Err(CompileErrorKind::UnsafeLikePattern(field_key.to_string()));
                }
                PredicateNode::Like {
                    column,
                    pattern: pattern.to_string(),
                }
            }
        };

        explain.info(format!("{} on field '{}' compiled", operator, field_key));
        Ok(node)
    }
}

fn expect_arity(
    operator: Operator,
    field_key: &str,
    values: &[rowguard_core::AccessValue],
    expected_len: usize,
    expected: &'static str,
) -> Result<(), CompileErrorKind> {
    if values.len() != expected_len {
        return Err(arity_error(operator, field_key, expected, values.len()));
    }
    Ok(())
}

fn arity_error(
    operator: Operator,
    field_key: &str,
    expected: &'static str,
    actual: usize,
) -> CompileErrorKind {
    CompileErrorKind::Arity {
        operator: operator.as_str(),
        field_key: field_key.to_string(),
        expected,
        actual,
    }
}

fn fail(kind: CompileErrorKind, mut explain: Explain) -> CompileError {
    warn!(error = %kind, "Rule compilation failed");
    explain.error(kind.to_string());
    CompileError::new(kind, explain)
}
