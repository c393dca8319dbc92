//! Error types for the rowguard system.
//!
//! Errors are organized by phase. Compilation failures are structural and
//! carry the [`Explain`] log gathered up to the point of failure. Render
//! failures are contextual: they only surface once the concrete table being
//! rewritten is known. Decision evaluation never fails; it resolves to deny.
//!
//! The root error type, `Error`, can wrap any of the phase-specific errors,
//! allowing for uniform error handling at the top level.

use crate::explain::Explain;
use thiserror::Error;

/// Result alias using the root error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the rowguard system.
#[derive(Debug, Error)]
pub enum Error {
    /// Policy storage and lookup errors
    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    /// Rule compilation errors
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    /// Predicate rendering errors
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Range expression parse or build errors
    #[error("Range error: {0}")]
    Range(#[from] RangeDslError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Value conversion errors
    #[error("Value error: {0}")]
    Value(#[from] ValueError),
}

/// Errors related to policy storage.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Policy with the given id was not found
    #[error("Policy not found: {0}")]
    NotFound(String),

    /// Policy conflicts with an existing one
    #[error("Policy conflict: {0}")]
    Conflict(String),

    /// The policy source could not produce candidates
    #[error("Policy source failed: {0}")]
    SourceFailed(String),
}

/// A failed rule-set compilation.
///
/// Carries the diagnostic log of the whole compile call so the caller can
/// audit every step that led to the failure.
#[derive(Debug, Clone, Error)]
#[error("{kind}")]
pub struct CompileError {
    /// What went wrong.
    pub kind: CompileErrorKind,

    /// The diagnostic log accumulated before the failure.
    pub explain: Explain,
}

impl CompileError {
    /// Create a compile error from its kind and the log gathered so far.
    pub fn new(kind: CompileErrorKind, explain: Explain) -> Self {
        Self { kind, explain }
    }

    /// The failure category.
    pub fn kind(&self) -> &CompileErrorKind {
        &self.kind
    }

    /// The diagnostic log.
    pub fn explain(&self) -> &Explain {
        &self.explain
    }
}

/// Categories of compile failures.
///
/// Messages name operators, field keys and variable names. They never echo
/// predicate values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileErrorKind {
    /// The rule set has no rules
    #[error("rule set '{0}' has no rules")]
    EmptyRuleSet(String),

    /// Every rule was empty, so there is nothing to compile
    #[error("rule set '{0}' produced no valid rule expression")]
    NoValidExpression(String),

    /// The resource registry does not know the field
    #[error("field '{field_key}' is not registered for resource '{resource_id}'")]
    UnknownField {
        /// Resource id of the rule set
        resource_id: String,

        /// The unresolved field key
        field_key: String,
    },

    /// Wrong number of resolved values for the operator
    #[error("{operator} on field '{field_key}' expects {expected} value(s), got {actual}")]
    Arity {
        /// Operator name
        operator: &'static str,

        /// Field key of the predicate
        field_key: String,

        /// Human readable expectation, e.g. "exactly 2"
        expected: &'static str,

        /// Number of values after resolution
        actual: usize,
    },

    /// A value of an unsupported kind reached the literal converter
    #[error("{operator} does not accept values of type {type_name}")]
    UnsupportedLiteral {
        /// Operator name
        operator: &'static str,

        /// Kind of the rejected value
        type_name: &'static str,
    },

    /// A null value reached the literal converter
    #[error("{operator} does not accept null values")]
    NullValue {
        /// Operator name
        operator: &'static str,
    },

    /// The LIKE pattern is not a pure prefix or suffix match
    #[error("LIKE pattern on field '{0}' must be a pure prefix or suffix match")]
    UnsafeLikePattern(String),

    /// The LIKE pattern is empty
    #[error("LIKE pattern on field '{0}' is empty")]
    EmptyLikePattern(String),

    /// BETWEEN bounds of incompatible kinds
    #[error("BETWEEN on field '{field_key}' has incompatible bounds ({lower} and {upper})")]
    BetweenTypeMismatch {
        /// Field key of the predicate
        field_key: String,

        /// Kind of the lower bound
        lower: &'static str,

        /// Kind of the upper bound
        upper: &'static str,
    },

    /// A `${name}` variable could not be resolved
    #[error("variable '{0}' is not present in the access context")]
    MissingVariable(String),

    /// A map was supplied where a scalar or collection was expected
    #[error("map values are not accepted as predicate values (field '{0}')")]
    MapValue(String),

    /// Collection nesting exceeded the configured bound
    #[error("value nesting on field '{field_key}' exceeds depth {max_depth}")]
    NestingTooDeep {
        /// Field key of the predicate
        field_key: String,

        /// Configured bound
        max_depth: usize,
    },
}

/// Errors raised while rendering a compiled predicate against a table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A column pinned to one table was rendered against another
    #[error("column '{column}' belongs to table '{pinned_table}' but is rendered against '{current_table}'")]
    CrossTable {
        /// Column name
        column: String,

        /// Table the column is pinned to
        pinned_table: String,

        /// Table currently being rewritten
        current_table: String,
    },
}

/// Errors raised by range-expression collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeDslError {
    /// The range text could not be parsed
    #[error("Failed to parse range expression: {0}")]
    Parse(String),

    /// A placeholder in the range text has no value in the decision context
    #[error("Unknown range placeholder: {0}")]
    UnknownPlaceholder(String),

    /// The row filter could not be built
    #[error("Failed to build row filter: {0}")]
    Build(String),
}

/// Errors raised when converting host values into access values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// An integer does not fit the 64-bit integer kind
    #[error("{0} value does not fit a 64-bit integer")]
    IntegerOutOfRange(&'static str),
}

/// Errors that can occur in configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    /// The file is not valid TOML for the configuration schema
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// The configuration is well-formed but unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
