//! Conversion of resolved values into literal nodes.

use rowguard_core::{AccessValue, CompileErrorKind};

use crate::expr::SqlExpr;
use crate::model::Operator;

/// Convert a resolved scalar into a literal node.
///
/// Strings and enum names become string literals, booleans become 1/0,
/// numbers keep their family, and temporal values are serialized as
/// ISO-8601 strings. Null, collections and non-finite floats are rejected.
pub fn to_literal(value: &AccessValue, operator: Operator) -> Result<SqlExpr, CompileErrorKind> {
    match value {
        AccessValue::Null => Err(CompileErrorKind::NullValue {
            operator: operator.as_str(),
        }),
        AccessValue::String(s) => Ok(SqlExpr::StringLiteral(s.clone())),
        AccessValue::Enum(name) => Ok(SqlExpr::StringLiteral(name.clone())),
        AccessValue::Bool(b) => Ok(SqlExpr::LongLiteral(i64::from(*b))),
        AccessValue::Integer(i) => Ok(SqlExpr::LongLiteral(*i)),
        AccessValue::Float(f) if f.is_finite() => Ok(SqlExpr::DoubleLiteral(*f)),
        AccessValue::Float(_) => Err(CompileErrorKind::UnsupportedLiteral {
            operator: operator.as_str(),
            type_name: "non-finite float",
        }),
        AccessValue::Temporal(t) => Ok(SqlExpr::StringLiteral(t.to_iso8601())),
        AccessValue::Array(_) | AccessValue::Map(_) => Err(CompileErrorKind::UnsupportedLiteral {
            operator: operator.as_str(),
            type_name: value.type_name(),
        }),
    }
}

/// Whether two values can bound a BETWEEN: both numeric, or both
/// string-or-temporal.
pub fn is_between_compatible(low: &AccessValue, high: &AccessValue) -> bool {
    (low.is_number() && high.is_number())
        || (low.is_text_or_temporal() && high.is_text_or_temporal())
}

/// Whether a LIKE pattern is safe to use.
///
/// Accepted: a literal without `%`, a pure prefix match (`abc%`) or a pure
/// suffix match (`%abc`). Anything with several `%`, a lone `%`, or an empty
/// pattern is rejected.
pub fn is_safe_like_pattern(pattern: &str) -> bool {
    match pattern.matches('%').count() {
        0 => !pattern.is_empty(),
        1 => pattern.len() > 1 && (pattern.starts_with('%') || pattern.ends_with('%')),
        _ => false,
    }
}
