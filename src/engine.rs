//! Operation pairing and the top-level diff façade.

use serde_json::Value;

use crate::analyze::{
    request_body_required, request_schema, required_parameters, response_schemas,
    response_statuses,
};
use crate::error::DiffError;
use crate::index::{index_operations, OperationView};
use crate::schema::{compare_schemas, Visited};
use crate::types::{json_type_name, Finding, FindingCode, Report, SchemaContext, Severity};

/// Compute the drift between a base and a head revision of an API
/// document.
///
/// Findings accumulate in a single ordered sink: removed operations (base
/// order), added operations (head order), then per shared operation the
/// response set, required parameters, request-body flag, and body schema
/// comparisons. Identical byte input always produces an identical report.
///
/// # Errors
///
/// Returns `DiffError::InputInvalid` when either document is not a map.
pub fn diff(base: &Value, head: &Value) -> Result<Report, DiffError> {
    for (side, doc) in [("base", base), ("head", head)] {
        if !doc.is_object() {
            return Err(DiffError::InputInvalid {
                side,
                actual: json_type_name(doc),
            });
        }
    }

    let base_ops = index_operations(base);
    let head_ops = index_operations(head);
    let mut sink = Vec::new();

    for view in &base_ops {
        if !head_ops.iter().any(|other| other.key == view.key) {
            sink.push(Finding {
                severity: Severity::Breaking,
                code: FindingCode::OperationRemoved,
                message: format!("Removed operation {}", view.key),
                operation: Some(view.key.op_ref()),
            });
        }
    }

    for view in &head_ops {
        if !base_ops.iter().any(|other| other.key == view.key) {
            sink.push(Finding {
                severity: Severity::Info,
                code: FindingCode::OperationAdded,
                message: format!("Added operation {}", view.key),
                operation: Some(view.key.op_ref()),
            });
        }
    }

    for base_view in &base_ops {
        if let Some(head_view) = head_ops.iter().find(|other| other.key == base_view.key) {
            compare_operation(base_view, head_view, &mut sink);
        }
    }

    Ok(Report::from_findings(sink))
}

/// Compare one shared operation pair, appending findings to the sink.
fn compare_operation(base: &OperationView<'_>, head: &OperationView<'_>, sink: &mut Vec<Finding>) {
    let key = &base.key;
    let operation = key.op_ref();

    // Response statuses, compared as literal key strings.
    let base_statuses = response_statuses(base.operation);
    let head_statuses = response_statuses(head.operation);
    for status in &base_statuses {
        if !head_statuses.contains(status) {
            sink.push(Finding {
                severity: Severity::Breaking,
                code: FindingCode::ResponseRemoved,
                message: format!("Removed response {status} for {key}"),
                operation: Some(operation.clone()),
            });
        }
    }
    for status in &head_statuses {
        if !base_statuses.contains(status) {
            sink.push(Finding {
                severity: Severity::Info,
                code: FindingCode::ResponseAdded,
                message: format!("Added response {status} for {key}"),
                operation: Some(operation.clone()),
            });
        }
    }

    // Newly required parameters.
    let base_required = required_parameters(base.path_item, base.operation);
    let head_required = required_parameters(head.path_item, head.operation);
    for id in &head_required {
        if !base_required.contains(id) {
            sink.push(Finding {
                severity: Severity::Warning,
                code: FindingCode::RequiredParamAdded,
                message: format!("New required parameter {id} for {key}"),
                operation: Some(operation.clone()),
            });
        }
    }

    // Request body becoming required.
    if !request_body_required(base.operation) && request_body_required(head.operation) {
        sink.push(Finding {
            severity: Severity::Warning,
            code: FindingCode::RequestBodyRequired,
            message: format!("Request body now required for {key}"),
            operation: Some(operation.clone()),
        });
    }

    // Request body schema.
    if let (Some(base_schema), Some(head_schema)) =
        (request_schema(base.operation), request_schema(head.operation))
    {
        let mut visited_base = Visited::new();
        let mut visited_head = Visited::new();
        compare_schemas(
            base_schema,
            head_schema,
            "request.body",
            SchemaContext::Request,
            &operation,
            sink,
            &mut visited_base,
            &mut visited_head,
        );
    }

    // Response body schemas, for statuses present on both sides.
    let head_schemas = response_schemas(head.operation);
    for (status, base_schema) in response_schemas(base.operation) {
        let Some((_, head_schema)) = head_schemas.iter().find(|(other, _)| *other == status)
        else {
            continue;
        };
        let mut visited_base = Visited::new();
        let mut visited_head = Visited::new();
        compare_schemas(
            base_schema,
            head_schema,
            &format!("response.{status}.body"),
            SchemaContext::Response,
            &operation,
            sink,
            &mut visited_base,
            &mut visited_head,
        );
    }
}
