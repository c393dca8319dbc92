//! Resource registry.
//!
//! Maps `(resource_id, field_key)` to a physical column. Rule authors only
//! ever name logical field keys; physical identifiers come from here.

use dashmap::DashMap;

use crate::column::ColumnRef;

/// Resolves logical field keys to columns.
pub trait ResourceRegistry {
    /// The column for a field of a resource, if registered.
    fn resolve(&self, resource_id: &str, field_key: &str) -> Option<ColumnRef>;
}

impl<F> ResourceRegistry for F
where
    F: Fn(&str, &str) -> Option<ColumnRef>,
{
    fn resolve(&self, resource_id: &str, field_key: &str) -> Option<ColumnRef> {
        self(resource_id, field_key)
    }
}

/// Thread-safe in-memory registry.
#[derive(Debug, Default)]
pub struct InMemoryResourceRegistry {
    fields: DashMap<(String, String), ColumnRef>,
}

impl InMemoryResourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a field, replacing any previous mapping.
    pub fn register(
        &self,
        resource_id: impl Into<String>,
        field_key: impl Into<String>,
        column: ColumnRef,
    ) {
        self.fields
            .insert((resource_id.into(), field_key.into()), column);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_field(
        self,
        resource_id: impl Into<String>,
        field_key: impl Into<String>,
        column: ColumnRef,
    ) -> Self {
        self.register(resource_id, field_key, column);
        self
    }

    /// Number of registered fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl ResourceRegistry for InMemoryResourceRegistry {
    fn resolve(&self, resource_id: &str, field_key: &str) -> Option<ColumnRef> {
        self.fields
            .get(&(resource_id.to_string(), field_key.to_string()))
            .map(|entry| entry.value().clone())
    }
}
