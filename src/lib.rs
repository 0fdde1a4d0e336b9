//! TrueSpec OpenAPI Differential Engine
//!
//! Compares two revisions of an OpenAPI document and reports how the head
//! deviates from the base, classified by severity (breaking, warning,
//! info) and by a stable finding code that CI tooling can key on.
//!
//! The walk is purely structural: operations pair by `(METHOD, path)`,
//! response sets compare by literal status key, and schemas diff
//! recursively with request/response polarity (a field removal is always
//! breaking; a field addition only matters to response readers).
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//!
//! let base = json!({
//!     "paths": {
//!         "/pets": { "get": { "responses": { "200": {} } } }
//!     }
//! });
//! let head = json!({ "paths": {} });
//!
//! let report = truespec::diff(&base, &head).unwrap();
//! assert_eq!(report.summary.breaking, 1);
//! assert_eq!(report.items[0].message, "Removed operation GET /pets");
//!
//! let markdown = truespec::render_markdown(&report);
//! assert!(markdown.starts_with("## TrueSpec Summary\n"));
//! ```
//!
//! Documents load from JSON or YAML text, bytes, files, or (with the
//! `remote` feature) URLs; everything becomes the same generic tree, so
//! the engine never knows which syntax the input used. Reports persist
//! through the [`store::ReportStore`] abstraction behind the axum adapter
//! in [`server`].

mod analyze;
mod engine;
mod error;
mod index;
mod loader;
mod render;
mod schema;
mod types;

pub mod config;
pub mod server;
pub mod store;

pub use engine::diff;
pub use error::{DiffError, LoadError, StoreError};
pub use loader::{is_url, load_spec_auto, load_spec_bytes, load_spec_file, load_spec_str, load_spec_value};
pub use render::render_markdown;
pub use types::{Finding, FindingCode, OperationRef, Report, Severity, Summary};

#[cfg(feature = "remote")]
pub use loader::load_spec_url;
