//! The `${name}` variable syntax.
//!
//! Both the rule compiler and the range-filter templates reference runtime
//! values with the same syntax. This module owns the recognition rules so
//! the two paths cannot drift apart.

use thiserror::Error;

/// Opening delimiter of a placeholder.
pub const OPEN: &str = "${";

/// Closing delimiter of a placeholder.
pub const CLOSE: char = '}';

/// A placeholder found inside a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// The variable name between the delimiters.
    pub name: &'a str,

    /// Byte offset of the opening delimiter.
    pub start: usize,

    /// Byte offset one past the closing delimiter.
    pub end: usize,
}

/// Malformed placeholder in a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderError {
    /// `${` without a matching `}`
    #[error("unterminated placeholder at offset {0}")]
    Unterminated(usize),

    /// `${}`
    #[error("empty placeholder at offset {0}")]
    Empty(usize),
}

/// Recognize a value that is exactly one placeholder.
///
/// The raw text is trimmed first; it must then start with `${`, end with `}`
/// and be at least four characters long. The returned name is the text
/// between the delimiters. Names containing braces are not placeholders.
pub fn variable_name(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.len() < 4 || !trimmed.starts_with(OPEN) || !trimmed.ends_with(CLOSE) {
        return None;
    }

    let name = &trimmed[OPEN.len()..trimmed.len() - 1];
    if name.contains(['{', '}']) {
        return None;
    }
    Some(name)
}

/// Find every placeholder in a template, in order of appearance.
pub fn scan(template: &str) -> Result<Vec<Placeholder<'_>>, PlaceholderError> {
    let mut found = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = template[cursor..].find(OPEN) {
        let start = cursor + offset;
        let body = start + OPEN.len();
        let close = template[body..]
            .find(CLOSE)
            .ok_or(PlaceholderError::Unterminated(start))?;
        if close == 0 {
            return Err(PlaceholderError::Empty(start));
        }

        let end = body + close + 1;
        found.push(Placeholder {
            name: &template[body..body + close],
            start,
            end,
        });
        cursor = end;
    }

    Ok(found)
}
