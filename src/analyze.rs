//! Parameter and request-body analysis for a single operation.

use serde_json::Value;

/// Collect the required-parameter IDs for an operation.
///
/// Path-item parameters come first, then operation parameters; either list
/// is treated as empty when absent or not a sequence. A parameter is
/// required iff `required == true` or it lives in the path (path
/// parameters are required regardless of the declared flag). IDs have the
/// form `"<in>:<name>"`; duplicates coalesce, first occurrence wins.
pub(crate) fn required_parameters(path_item: &Value, operation: &Value) -> Vec<String> {
    let mut ids = Vec::new();
    for list in [path_item.get("parameters"), operation.get("parameters")] {
        let Some(params) = list.and_then(Value::as_array) else {
            continue;
        };
        for param in params {
            let Some(map) = param.as_object() else {
                continue;
            };
            let location = map.get("in").and_then(Value::as_str).unwrap_or("");
            let required = map
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(false)
                || location == "path";
            if !required {
                continue;
            }
            let name = map.get("name").and_then(Value::as_str).unwrap_or("");
            let id = format!("{location}:{name}");
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    ids
}

/// Whether the operation declares its request body required.
pub(crate) fn request_body_required(operation: &Value) -> bool {
    operation
        .get("requestBody")
        .and_then(|body| body.get("required"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// The literal status keys of the operation's `responses` map.
pub(crate) fn response_statuses(operation: &Value) -> Vec<&str> {
    operation
        .get("responses")
        .and_then(Value::as_object)
        .map(|responses| responses.keys().map(String::as_str).collect())
        .unwrap_or_default()
}

/// The request body schema, if one can be extracted from `content`.
pub(crate) fn request_schema(operation: &Value) -> Option<&Value> {
    pick_content_schema(operation.get("requestBody")?)
}

/// Response body schemas keyed by the literal status string.
///
/// Statuses whose response carries no extractable schema are skipped; the
/// keys are never interpreted, so `"200"`, `"2XX"`, and `"default"` are
/// three distinct entries.
pub(crate) fn response_schemas(operation: &Value) -> Vec<(&str, &Value)> {
    let Some(responses) = operation.get("responses").and_then(Value::as_object) else {
        return Vec::new();
    };
    responses
        .iter()
        .filter_map(|(status, response)| {
            pick_content_schema(response).map(|schema| (status.as_str(), schema))
        })
        .collect()
}

/// Pick the schema of the most JSON-like media type under `content`:
/// `application/json`, else the first key containing `json` or ending
/// `+json`, else the first entry at all.
fn pick_content_schema(holder: &Value) -> Option<&Value> {
    let content = holder.get("content")?.as_object()?;
    let entry = content
        .get("application/json")
        .or_else(|| {
            content
                .iter()
                .find(|(key, _)| key.contains("json") || key.ends_with("+json"))
                .map(|(_, value)| value)
        })
        .or_else(|| content.values().next())?;
    entry.get("schema")
}
