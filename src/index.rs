//! Operation indexing - walks `paths` into a keyed operation list.

use std::fmt;

use serde_json::Value;

use crate::types::OperationRef;

/// The fixed HTTP method list, in comparison order.
pub(crate) const HTTP_METHODS: &[&str] = &[
    "get", "post", "put", "patch", "delete", "options", "head", "trace",
];

/// Identity of one operation: upper-cased method plus the literal path
/// template. Two keys are equal iff both components match byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct OperationKey {
    pub method: String,
    pub path: String,
}

impl OperationKey {
    pub fn new(method: &str, path: &str) -> Self {
        OperationKey {
            method: method.to_uppercase(),
            path: path.to_string(),
        }
    }

    pub fn op_ref(&self) -> OperationRef {
        OperationRef {
            path: self.path.clone(),
            method: self.method.clone(),
        }
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// One indexed operation. The operation node and its enclosing path item
/// are borrowed from the document, never copied.
pub(crate) struct OperationView<'a> {
    pub key: OperationKey,
    pub operation: &'a Value,
    pub path_item: &'a Value,
}

/// Walk `spec.paths` and emit a view per `(method, path)` pair.
///
/// Outer iteration follows the document's `paths` order, inner iteration
/// the fixed method list. Entries that are not maps are skipped silently,
/// as is a missing or non-map `paths`.
pub(crate) fn index_operations(spec: &Value) -> Vec<OperationView<'_>> {
    let mut views = Vec::new();
    let Some(paths) = spec.get("paths").and_then(Value::as_object) else {
        return views;
    };

    for (path, path_item) in paths {
        if !path_item.is_object() {
            continue;
        }
        for method in HTTP_METHODS {
            if let Some(operation) = path_item.get(*method) {
                if operation.is_object() {
                    views.push(OperationView {
                        key: OperationKey::new(method, path),
                        operation,
                        path_item,
                    });
                }
            }
        }
    }

    views
}
