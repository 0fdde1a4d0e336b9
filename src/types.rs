//! Core types for the differential engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Severity of a finding, ordered by downstream impact.
///
/// `Breaking` marks a client-visible backward-incompatible change,
/// `Warning` a likely-incompatible tightening, `Info` a non-breaking
/// addition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Breaking,
    Warning,
    Info,
}

impl Severity {
    /// Fixed rendering order for report sections.
    pub const ALL: [Severity; 3] = [Severity::Breaking, Severity::Warning, Severity::Info];

    /// Title-case label used in Markdown section headers.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Breaking => "Breaking",
            Severity::Warning => "Warning",
            Severity::Info => "Info",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Breaking => "breaking",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

/// The closed set of finding codes. Downstream tooling keys on these
/// identifiers; they never change spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingCode {
    OperationRemoved,
    OperationAdded,
    ResponseRemoved,
    ResponseAdded,
    RequiredParamAdded,
    RequestBodyRequired,
    SchemaTypeChanged,
    SchemaNullableRemoved,
    SchemaNullableAdded,
    SchemaUnionRemoved,
    SchemaUnionAdded,
    SchemaEnumChanged,
    SchemaFieldRemoved,
    SchemaFieldAdded,
    SchemaRequiredAdded,
}

impl FindingCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingCode::OperationRemoved => "operation-removed",
            FindingCode::OperationAdded => "operation-added",
            FindingCode::ResponseRemoved => "response-removed",
            FindingCode::ResponseAdded => "response-added",
            FindingCode::RequiredParamAdded => "required-param-added",
            FindingCode::RequestBodyRequired => "request-body-required",
            FindingCode::SchemaTypeChanged => "schema-type-changed",
            FindingCode::SchemaNullableRemoved => "schema-nullable-removed",
            FindingCode::SchemaNullableAdded => "schema-nullable-added",
            FindingCode::SchemaUnionRemoved => "schema-union-removed",
            FindingCode::SchemaUnionAdded => "schema-union-added",
            FindingCode::SchemaEnumChanged => "schema-enum-changed",
            FindingCode::SchemaFieldRemoved => "schema-field-removed",
            FindingCode::SchemaFieldAdded => "schema-field-added",
            FindingCode::SchemaRequiredAdded => "schema-required-added",
        }
    }
}

/// The operation a finding belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationRef {
    pub path: String,
    pub method: String,
}

/// A single observation about the delta between base and head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub code: FindingCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<OperationRef>,
}

/// Counts of findings by severity. Always recomputed from the items,
/// never tracked incrementally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub breaking: usize,
    pub warning: usize,
    pub info: usize,
    pub total: usize,
}

/// The result of one diff run: summary counts plus the ordered findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub summary: Summary,
    pub items: Vec<Finding>,
}

impl Report {
    /// Build a report from an ordered finding sequence, recounting the
    /// summary from the items.
    pub fn from_findings(items: Vec<Finding>) -> Self {
        let mut summary = Summary::default();
        for finding in &items {
            match finding.severity {
                Severity::Breaking => summary.breaking += 1,
                Severity::Warning => summary.warning += 1,
                Severity::Info => summary.info += 1,
            }
        }
        summary.total = items.len();
        Report { summary, items }
    }

    pub fn has_breaking(&self) -> bool {
        self.summary.breaking > 0
    }
}

/// Where in an operation a schema lives. Additions and removals have
/// opposite polarity between request and response bodies, so the walk
/// carries this explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaContext {
    Request,
    Response,
    Other,
}
