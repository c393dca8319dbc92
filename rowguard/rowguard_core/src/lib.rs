//! # Rowguard Core
//!
//! `rowguard_core` provides the building blocks shared by the rowguard
//! data-access policy crates: the error hierarchy, the append-only
//! [`Explain`] diagnostic log, the dynamic [`AccessValue`] model, the
//! [`AccessContext`] seam through which callers supply subject data, the
//! `${name}` placeholder syntax, configuration and logging helpers.
//!
//! ## Core Principles
//!
//! 1. **Fail closed**: decisions default to deny, compilation aborts on any
//!    structural problem, and nothing untrusted is ever spliced into SQL text.
//!
//! 2. **Explicit context**: every call receives its tenant, subject and
//!    attribute data as arguments. There is no ambient or thread-local state.
//!
//! 3. **Auditable**: every evaluation and compilation produces an [`Explain`]
//!    log that records structure (ids, operators, counts) but never raw values.
//!
//! ## Crate Structure
//!
//! - **error**: Error types for all rowguard components
//! - **explain**: The per-call diagnostic log
//! - **value**: Dynamic values for attributes and predicate operands
//! - **context**: The access-context trait and a plain implementation
//! - **placeholder**: The `${name}` variable syntax
//! - **types**: Small enums shared by the policy and predicate crates
//! - **config**: Configuration loading and validation
//! - **logging**: Log levels and subscriber setup

pub mod config;
pub mod context;
pub mod error;
pub mod explain;
pub mod logging;
pub mod placeholder;
pub mod types;
pub mod value;

// Re-export key types for convenience
pub use config::{CompilerConfig, EngineConfig, GuardConfig, LoggingConfig};
pub use context::{AccessContext, AccessContextValue};
pub use error::{
    CompileError, CompileErrorKind, ConfigError, Error, PolicyError, RangeDslError, RenderError,
    Result, ValueError,
};
pub use explain::{Explain, ExplainEntry, ExplainLevel};
pub use logging::LogLevel;
pub use types::{DecisionType, Effect, PolicyScope, ResourceRange};
pub use value::{AccessValue, Temporal};
