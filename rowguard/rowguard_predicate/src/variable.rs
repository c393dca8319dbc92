//! Placeholder resolution and value flattening.

use rowguard_core::placeholder;
use rowguard_core::{AccessContext, AccessValue, CompileErrorKind, CompilerConfig, Explain};

/// Resolves `${name}` operands against an access context.
///
/// The configured subject variable (`userId` by default) resolves to the
/// subject id; any other name is looked up in the attributes. Resolved
/// values are flattened: nulls are dropped, arrays are expanded
/// recursively, and maps are refused.
pub struct VariableResolver<'a, C: ?Sized> {
    context: &'a C,
    config: &'a CompilerConfig,
}

impl<'a, C> VariableResolver<'a, C>
where
    C: AccessContext + ?Sized,
{
    /// Create a resolver over the given context.
    pub fn new(context: &'a C, config: &'a CompilerConfig) -> Self {
        Self { context, config }
    }

    /// Resolve and flatten the raw operands of one predicate.
    ///
    /// In strict mode a missing variable or a map value fails the call. In
    /// lenient mode it is recorded as an explain error and the value is
    /// dropped, so the result may be shorter than the input.
    pub fn resolve(
        &self,
        field_key: &str,
        raw_values: &[AccessValue],
        explain: &mut Explain,
    ) -> Result<Vec<AccessValue>, CompileErrorKind> {
        let mut flattened = Vec::with_capacity(raw_values.len());

        for raw in raw_values {
            let resolved = match raw {
                AccessValue::String(s) => match placeholder::variable_name(s) {
                    Some(name) => match self.lookup(name) {
                        Some(value) => value,
                        None => {
                            let kind = CompileErrorKind::MissingVariable(name.to_string());
                            if self.config.strict_variables {
                                return Err(kind);
                            }
                            explain.error(format!("{} (field '{}'); value dropped", kind, field_key));
                            continue;
                        }
                    },
                    None => raw.clone(),
                },
                other => other.clone(),
            };

            self.flatten(field_key, resolved, 0, &mut flattened, explain)?;
        }

        Ok(flattened)
    }

    fn lookup(&self, name: &str) -> Option<AccessValue> {
        if name == self.config.subject_variable {
            return self.context.subject_id().map(AccessValue::from);
        }
        self.context.attribute(name).cloned()
    }

    fn flatten(
        &self,
        field_key: &str,
        value: AccessValue,
        depth: usize,
        out: &mut Vec<AccessValue>,
        explain: &mut Explain,
    ) -> Result<(), CompileErrorKind> {
        match value {
            AccessValue::Null => {
                explain.warn(format!("null value dropped on field '{}'", field_key));
            }
            AccessValue::Map(_) => {
                let kind = CompileErrorKind::MapValue(field_key.to_string());
                if self.config.strict_variables {
                    return Err(kind);
                }
                explain.error(format!("{}; value dropped", kind));
            }
            AccessValue::Array(items) => {
                if depth >= self.config.max_value_depth {
                    return Err(CompileErrorKind::NestingTooDeep {
                        field_key: field_key.to_string(),
                        max_depth: self.config.max_value_depth,
                    });
                }
                for item in items {
                    self.flatten(field_key, item, depth + 1, out, explain)?;
                }
            }
            scalar => out.push(scalar),
        }
        Ok(())
    }
}
