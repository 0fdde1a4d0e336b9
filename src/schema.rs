//! Recursive structural comparison of two schema trees.
//!
//! The walk never resolves `$ref` indirections; references participate
//! only through their signature strings. Severity depends on where the
//! schema lives: request bodies treat tightening as the risk, response
//! bodies treat removal as the risk.

use std::collections::HashSet;

use serde_json::Value;

use crate::types::{Finding, FindingCode, OperationRef, SchemaContext, Severity};

/// Identity sets of nodes already entered on the current root call.
/// Re-entry on either side abandons the subtree without a finding.
pub(crate) type Visited = HashSet<usize>;

fn node_id(value: &Value) -> usize {
    value as *const Value as usize
}

/// Compare `base` against `head` at `path`, appending findings to `sink`.
///
/// All steps run in a fixed order; only a type-signature mismatch stops
/// the walk at the current node. Malformed subtrees (non-map `properties`,
/// non-sequence `enum`, and so on) degrade to fewer findings rather than
/// errors.
#[allow(clippy::too_many_arguments)]
pub(crate) fn compare_schemas(
    base: &Value,
    head: &Value,
    path: &str,
    context: SchemaContext,
    operation: &OperationRef,
    sink: &mut Vec<Finding>,
    visited_base: &mut Visited,
    visited_head: &mut Visited,
) {
    if !visited_base.insert(node_id(base)) {
        return;
    }
    if !visited_head.insert(node_id(head)) {
        return;
    }

    // Nullability.
    let base_nullable = is_nullable(base);
    let head_nullable = is_nullable(head);
    if base_nullable && !head_nullable {
        push(
            sink,
            Severity::Breaking,
            FindingCode::SchemaNullableRemoved,
            format!("Nullable removed at {path}"),
            operation,
        );
    } else if !base_nullable && head_nullable {
        push(
            sink,
            Severity::Info,
            FindingCode::SchemaNullableAdded,
            format!("Nullable added at {path}"),
            operation,
        );
    }

    // Type signature. A changed type makes the rest of the shape
    // incomparable, so the walk stops here for this node.
    let base_sig = type_signature(base);
    let head_sig = type_signature(head);
    if !base_sig.is_empty() && !head_sig.is_empty() && base_sig != head_sig {
        push(
            sink,
            Severity::Breaking,
            FindingCode::SchemaTypeChanged,
            format!("Type changed at {path} ({base_sig} -> {head_sig})"),
            operation,
        );
        return;
    }

    // Union alternatives, compared as signature sets.
    let base_unions = union_signatures(base);
    let head_unions = union_signatures(head);
    for sig in &base_unions {
        if !head_unions.contains(sig) {
            push(
                sink,
                Severity::Breaking,
                FindingCode::SchemaUnionRemoved,
                format!("Removed union option at {path} ({sig})"),
                operation,
            );
        }
    }
    for sig in &head_unions {
        if !base_unions.contains(sig) {
            push(
                sink,
                Severity::Info,
                FindingCode::SchemaUnionAdded,
                format!("Added union option at {path} ({sig})"),
                operation,
            );
        }
    }

    // Enums: one finding covering removals and additions together.
    let base_enum = enum_values(base);
    let head_enum = enum_values(head);
    if base_enum.is_some() || head_enum.is_some() {
        let base_values = base_enum.unwrap_or_default();
        let head_values = head_enum.unwrap_or_default();
        let removed: Vec<&str> = base_values
            .iter()
            .filter(|value| !head_values.contains(value))
            .map(String::as_str)
            .collect();
        let added: Vec<&str> = head_values
            .iter()
            .filter(|value| !base_values.contains(value))
            .map(String::as_str)
            .collect();
        if !removed.is_empty() || !added.is_empty() {
            let mut details = Vec::new();
            if !removed.is_empty() {
                details.push(format!("removed: {}", removed.join(",")));
            }
            if !added.is_empty() {
                details.push(format!("added: {}", added.join(",")));
            }
            push(
                sink,
                Severity::Breaking,
                FindingCode::SchemaEnumChanged,
                format!("Enum changed at {path} ({})", details.join("; ")),
                operation,
            );
        }
    }

    // Array element schemas.
    let array_like = has_type(base, "array")
        || has_type(head, "array")
        || is_map(base.get("items"))
        || is_map(head.get("items"));
    if array_like {
        if let (Some(base_items), Some(head_items)) = (base.get("items"), head.get("items")) {
            compare_schemas(
                base_items,
                head_items,
                &format!("{path}[]"),
                context,
                operation,
                sink,
                visited_base,
                visited_head,
            );
        }
    }

    // Object shape: allOf-merged property maps on each side.
    let base_props = shape_properties(base);
    let head_props = shape_properties(head);
    if base_props.is_empty() || head_props.is_empty() {
        return;
    }

    let base_required = required_set(base);
    for name in required_set(head) {
        if !base_required.contains(&name) {
            let severity = if context == SchemaContext::Request {
                Severity::Warning
            } else {
                Severity::Info
            };
            push(
                sink,
                severity,
                FindingCode::SchemaRequiredAdded,
                format!("New required field {path}.{name}"),
                operation,
            );
        }
    }

    for (name, _) in &base_props {
        if !head_props.iter().any(|(other, _)| other == name) {
            push(
                sink,
                Severity::Breaking,
                FindingCode::SchemaFieldRemoved,
                format!("Removed field {path}.{name}"),
                operation,
            );
        }
    }

    for (name, base_prop) in &base_props {
        if let Some((_, head_prop)) = head_props.iter().find(|(other, _)| other == name) {
            compare_schemas(
                base_prop,
                head_prop,
                &format!("{path}.{name}"),
                context,
                operation,
                sink,
                visited_base,
                visited_head,
            );
        }
    }

    // Additions only matter to clients reading responses; a request-side
    // addition widens what the server accepts and stays silent.
    if context == SchemaContext::Response {
        for (name, _) in &head_props {
            if !base_props.iter().any(|(other, _)| other == name) {
                push(
                    sink,
                    Severity::Info,
                    FindingCode::SchemaFieldAdded,
                    format!("Added field {path}.{name}"),
                    operation,
                );
            }
        }
    }
}

fn push(
    sink: &mut Vec<Finding>,
    severity: Severity,
    code: FindingCode,
    message: String,
    operation: &OperationRef,
) {
    sink.push(Finding {
        severity,
        code,
        message,
        operation: Some(operation.clone()),
    });
}

fn is_map(value: Option<&Value>) -> bool {
    value.is_some_and(Value::is_object)
}

/// The schema's declared types as a list: singleton strings wrap, arrays
/// keep their string members, anything else is no declaration.
fn type_list(schema: &Value) -> Vec<&str> {
    match schema.get("type") {
        Some(Value::String(single)) => vec![single.as_str()],
        Some(Value::Array(many)) => many.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn has_type(schema: &Value, wanted: &str) -> bool {
    type_list(schema).iter().any(|t| *t == wanted)
}

fn is_nullable(schema: &Value) -> bool {
    schema
        .get("nullable")
        .and_then(Value::as_bool)
        .unwrap_or(false)
        || has_type(schema, "null")
}

/// Non-null types, sorted lexicographically and joined with `|`. Empty
/// string when no type is declared.
fn type_signature(schema: &Value) -> String {
    let mut types: Vec<&str> = type_list(schema)
        .into_iter()
        .filter(|t| *t != "null")
        .collect();
    types.sort_unstable();
    types.join("|")
}

/// Signature used when comparing union alternatives. `$ref` wins outright;
/// otherwise the type signature plus distinguishing decorations.
fn schema_signature(schema: &Value) -> String {
    if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
        return format!("ref:{reference}");
    }
    let types = type_signature(schema);
    let mut signature = if types.is_empty() {
        "type:unknown".to_string()
    } else {
        format!("type:{types}")
    };
    if is_nullable(schema) {
        signature.push_str("|nullable");
    }
    if let Some(format) = schema.get("format").and_then(Value::as_str) {
        signature.push_str("|format:");
        signature.push_str(format);
    }
    if let Some(title) = schema.get("title").and_then(Value::as_str) {
        signature.push_str("|title:");
        signature.push_str(title);
    }
    signature
}

/// Signatures of all `oneOf`/`anyOf` alternatives (map-typed entries
/// only), deduplicated in first-seen order.
fn union_signatures(schema: &Value) -> Vec<String> {
    let mut signatures = Vec::new();
    for key in ["oneOf", "anyOf"] {
        let Some(members) = schema.get(key).and_then(Value::as_array) else {
            continue;
        };
        for member in members.iter().filter(|m| m.is_object()) {
            let signature = schema_signature(member);
            if !signatures.contains(&signature) {
                signatures.push(signature);
            }
        }
    }
    signatures
}

/// Enum members JSON-serialized for canonical equality, or `None` when no
/// enum array is declared.
fn enum_values(schema: &Value) -> Option<Vec<String>> {
    schema
        .get("enum")
        .and_then(Value::as_array)
        .map(|values| values.iter().map(Value::to_string).collect())
}

/// The effective property map: `allOf` member maps merged first
/// (recursively, without diffing them), then overlaid by the node's own
/// `properties`. Later entries replace earlier values but keep the
/// original position.
fn shape_properties(schema: &Value) -> Vec<(&str, &Value)> {
    let mut properties: Vec<(&str, &Value)> = Vec::new();
    if let Some(members) = schema.get("allOf").and_then(Value::as_array) {
        for member in members.iter().filter(|m| m.is_object()) {
            for (name, value) in shape_properties(member) {
                overlay(&mut properties, name, value);
            }
        }
    }
    if let Some(own) = schema.get("properties").and_then(Value::as_object) {
        for (name, value) in own {
            overlay(&mut properties, name, value);
        }
    }
    properties
}

fn overlay<'a>(properties: &mut Vec<(&'a str, &'a Value)>, name: &'a str, value: &'a Value) {
    if let Some(slot) = properties.iter_mut().find(|(existing, _)| *existing == name) {
        slot.1 = value;
    } else {
        properties.push((name, value));
    }
}

fn required_set(schema: &Value) -> Vec<&str> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}
