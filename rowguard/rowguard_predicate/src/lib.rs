//! # Rowguard Predicate
//!
//! `rowguard_predicate` compiles declarative rule sets into a deferred
//! SQL predicate tree. The tree is built once per rule set and access
//! context, then rendered once per table occurrence when a query rewriter
//! knows which table (and alias) it is processing.
//!
//! Key concepts:
//!
//! 1. **Rule set**: prioritized rules, each a list of predicates over logical
//!    field keys combined with AND or OR. Rules are OR-ed together.
//!
//! 2. **Resource registry**: maps a logical field key to a physical column,
//!    optionally pinned to a table.
//!
//! 3. **Compiled predicate**: the node tree plus the compile-time explain log.
//!    Rendering checks every pinned column against the live table, so a tree
//!    compiled for `dept` can never attach to a differently named table.
//!
//! 4. **SQL expression**: the fixed output AST. Values only ever appear as
//!    typed literal nodes, which the `sea_query` bridge binds as parameters.

pub mod column;
pub mod compiler;
pub mod expr;
pub mod literal;
pub mod model;
pub mod node;
pub mod registry;
pub mod variable;

// Re-export key types for convenience
pub use column::{ColumnRef, ColumnRenderer, TableRef};
pub use compiler::{CompiledPredicate, RuleCompiler};
pub use expr::SqlExpr;
pub use model::{CombineMode, Operator, PredicateDef, RuleDef, RuleSet};
pub use node::PredicateNode;
pub use registry::{InMemoryResourceRegistry, ResourceRegistry};
pub use variable::VariableResolver;
