//! HTTP adapter for the reports service.
//!
//! Three routes over the engine and the store: ingest a diff request,
//! list persisted reports for a repository, fetch one report. Transport
//! concerns only; every request builds its own engine state and the store
//! is the single blocking collaborator, touched strictly after `diff`
//! returns.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::engine::diff;
use crate::loader::{load_spec_str, load_spec_value};
use crate::render::render_markdown;
use crate::store::{ReportRecord, ReportStore};
use crate::types::json_type_name;

/// Shared state for all report handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ReportStore>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn ReportStore>, config: Arc<ServerConfig>) -> Self {
        Self { store, config }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz_handler))
        .route(
            "/reports",
            get(list_reports_handler).post(create_report_handler),
        )
        .route("/reports/:id", get(get_report_handler))
        .with_state(state)
}

/// Bind and serve until the listener fails.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "reports service listening");
    axum::serve(listener, build_router(state)).await
}

async fn healthz_handler() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn create_report_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(expected) = &state.config.ingest_token {
        if !token_matches(&headers, expected) {
            return error_response(StatusCode::FORBIDDEN, "missing or invalid token");
        }
    }

    let base = match parse_spec_field(&body, "base") {
        Ok(doc) => doc,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, &message),
    };
    let head = match parse_spec_field(&body, "head") {
        Ok(doc) => doc,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, &message),
    };

    let report = match diff(&base, &head) {
        Ok(report) => report,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, &err.to_string()),
    };
    let markdown = render_markdown(&report);

    let repo = string_field(&body, "repo").unwrap_or_else(|| "unknown".to_string());
    let source = string_field(&body, "source").unwrap_or_else(|| "api".to_string());
    let id = Uuid::new_v4().to_string();
    let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    let items_json = serde_json::to_string(&report.items).unwrap_or_else(|_| "[]".to_string());
    let limit = state.config.truncate_limit;
    let (stored_markdown, markdown_truncated) = truncate_text(&markdown, limit);
    let (stored_items, items_truncated) = truncate_text(&items_json, limit);

    let record = ReportRecord {
        id: id.clone(),
        repo: repo.clone(),
        source,
        created_at,
        summary: report.summary,
        markdown: stored_markdown,
        markdown_truncated,
        items_json: stored_items,
        items_truncated,
    };
    if let Err(err) = state.store.put(&record) {
        return internal_error(&state, &err.to_string());
    }

    Json(json!({
        "reportId": id,
        "repo": repo,
        "summary": report.summary,
        "markdown": markdown,
        "items": report.items,
    }))
    .into_response()
}

async fn list_reports_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !admin_authorized(&state, &headers) {
        return error_response(StatusCode::FORBIDDEN, "missing or invalid token");
    }
    let Some(repo) = params.get("repo").filter(|r| !r.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "missing repo");
    };
    let limit = params.get("limit").and_then(|value| value.parse().ok());
    let page_size = state.config.clamp_page_size(limit);
    let token = params
        .get("nextRowKey")
        .map(String::as_str)
        .filter(|t| !t.is_empty());

    match state.store.list_page(repo, page_size, token) {
        Ok(page) => Json(json!({
            "repo": repo,
            "items": page.items,
            "nextPartitionKey": page.next_token.as_ref().map(|_| repo),
            "nextRowKey": page.next_token,
        }))
        .into_response(),
        Err(err) => internal_error(&state, &err.to_string()),
    }
}

async fn get_report_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !admin_authorized(&state, &headers) {
        return error_response(StatusCode::FORBIDDEN, "missing or invalid token");
    }

    match state.store.get_by_id(&id) {
        Ok(Some(record)) => {
            // Truncated items are no longer valid JSON; fall back to the
            // raw string so the payload is still inspectable.
            let items: Value = serde_json::from_str(&record.items_json)
                .unwrap_or(Value::String(record.items_json.clone()));
            Json(json!({
                "reportId": record.id,
                "repo": record.repo,
                "source": record.source,
                "createdAt": record.created_at,
                "summary": record.summary,
                "markdown": record.markdown,
                "markdownTruncated": record.markdown_truncated,
                "items": items,
                "itemsTruncated": record.items_truncated,
            }))
            .into_response()
        }
        Ok(None) => error_response(StatusCode::NOT_FOUND, "report not found"),
        Err(err) => internal_error(&state, &err.to_string()),
    }
}

/// Extract `base`/`head` from the request body: an embedded object is a
/// document as-is, a string is parsed as JSON or YAML.
fn parse_spec_field(body: &Value, field: &'static str) -> Result<Value, String> {
    let Some(raw) = body.get(field) else {
        return Err(format!("missing {field}"));
    };
    let parsed = match raw {
        Value::Object(_) => load_spec_value(raw.clone()),
        Value::String(text) => match load_spec_str(text) {
            Ok(parsed) => parsed,
            Err(err) => return Err(err.to_string()),
        },
        other => {
            return Err(format!(
                "{field} must be an object or a string, got {}",
                json_type_name(other)
            ))
        }
    };
    parsed.ok_or_else(|| format!("{field} is not a parseable spec document"))
}

fn string_field(body: &Value, field: &str) -> Option<String> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Accept the token via `X-Report-Token` or `Authorization: Bearer`.
fn token_matches(headers: &HeaderMap, expected: &str) -> bool {
    if let Some(value) = headers.get("x-report-token").and_then(|v| v.to_str().ok()) {
        if value == expected {
            return true;
        }
    }
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = value.strip_prefix("Bearer ") {
            if token == expected {
                return true;
            }
        }
    }
    false
}

/// Read endpoints require a configured admin token; without one they
/// always refuse.
fn admin_authorized(state: &AppState, headers: &HeaderMap) -> bool {
    match &state.config.admin_token {
        Some(token) => token_matches(headers, token),
        None => false,
    }
}

/// Cap a stored text field, marking the cut with a trailing ellipsis.
fn truncate_text(text: &str, limit: usize) -> (String, bool) {
    if text.chars().count() <= limit {
        return (text.to_string(), false);
    }
    let mut out: String = text.chars().take(limit).collect();
    out.push_str("...");
    (out, true)
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"error": message}))).into_response()
}

fn internal_error(state: &AppState, detail: &str) -> Response {
    error!(error = %detail, "report request failed");
    let message = if state.config.debug {
        detail
    } else {
        "internal error"
    };
    error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
}
