//! Per-call diagnostic log.
//!
//! An [`Explain`] is created at the start of one decision or compilation,
//! appended to while the call runs, and handed back to the caller (inside
//! the result or inside the error). It is never shared between calls.
//!
//! Entries describe structure only: policy ids, field keys, operators and
//! counts. Raw predicate or attribute values must never be written here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of an explain entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExplainLevel {
    /// Normal progress.
    Info,

    /// Something was skipped or looks suspicious.
    Warn,

    /// A validation failure.
    Error,
}

impl ExplainLevel {
    /// Upper-case name of this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for ExplainLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of an explain log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainEntry {
    /// The severity.
    pub level: ExplainLevel,

    /// The diagnostic text.
    pub message: String,
}

impl fmt::Display for ExplainEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// Append-only diagnostic log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explain {
    entries: Vec<ExplainEntry>,
}

impl Explain {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at the given level.
    pub fn push(&mut self, level: ExplainLevel, message: impl Into<String>) {
        self.entries.push(ExplainEntry {
            level,
            message: message.into(),
        });
    }

    /// Append an INFO entry.
    pub fn info(&mut self, message: impl Into<String>) {
        self.push(ExplainLevel::Info, message);
    }

    /// Append a WARN entry.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(ExplainLevel::Warn, message);
    }

    /// Append an ERROR entry.
    pub fn error(&mut self, message: impl Into<String>) {
        self.push(ExplainLevel::Error, message);
    }

    /// `true` iff at least one ERROR entry was recorded.
    pub fn has_error(&self) -> bool {
        self.entries.iter().any(|e| e.level == ExplainLevel::Error)
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[ExplainEntry] {
        &self.entries
    }

    /// Entries at the given level, in insertion order.
    pub fn at_level(&self, level: ExplainLevel) -> impl Iterator<Item = &ExplainEntry> {
        self.entries.iter().filter(move |e| e.level == level)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Explain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}
