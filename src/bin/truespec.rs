//! TrueSpec CLI
//!
//! Command-line interface for diffing OpenAPI documents and running the
//! reports service.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use truespec::config::ServerConfig;
use truespec::server::{serve, AppState};
use truespec::store::SqliteReportStore;
use truespec::{diff, load_spec_auto, render_markdown, Report, Severity};

#[derive(Parser)]
#[command(name = "truespec")]
#[command(about = "Diff OpenAPI documents and report contract drift")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two OpenAPI documents and print the drift report
    Diff {
        /// Base revision: file path or URL (http:// or https://)
        base: String,

        /// Head revision: file path or URL
        head: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Exit non-zero when breaking findings are present
        #[arg(long)]
        fail_on_breaking: bool,
    },

    /// Run the reports HTTP service
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: String,

        /// SQLite database path (defaults to the configured connection
        /// string, else an in-memory store)
        #[arg(long)]
        db: Option<String>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
    Markdown,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Diff {
            base,
            head,
            format,
            output,
            fail_on_breaking,
        } => run_diff(&base, &head, format, output, fail_on_breaking),

        Commands::Serve { addr, db } => run_serve(&addr, db),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_diff(
    base_source: &str,
    head_source: &str,
    format: Format,
    output: Option<PathBuf>,
    fail_on_breaking: bool,
) -> Result<(), u8> {
    let base = load_document(base_source)?;
    let head = load_document(head_source)?;

    let report = diff(&base, &head).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let rendered = match format {
        Format::Markdown => render_markdown(&report),
        Format::Json => serde_json::to_string_pretty(&report).map_err(|e| {
            eprintln!("Error serializing report: {}", e);
            2u8
        })?,
        Format::Text => render_text(&report),
    };

    match output {
        Some(path) => {
            std::fs::write(&path, &rendered).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            print!("{}", rendered);
        }
    }

    if fail_on_breaking && report.has_breaking() {
        return Err(1);
    }
    Ok(())
}

fn load_document(source: &str) -> Result<serde_json::Value, u8> {
    match load_spec_auto(source) {
        Ok(Some(doc)) => Ok(doc),
        Ok(None) => {
            eprintln!("Error: {} is not a parseable OpenAPI document", source);
            Err(2)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Err(e.exit_code() as u8)
        }
    }
}

/// Terminal rendering: one colored line per finding plus a summary line.
fn render_text(report: &Report) -> String {
    let mut out = String::new();

    for finding in &report.items {
        let color = match finding.severity {
            Severity::Breaking => "\x1b[31m",
            Severity::Warning => "\x1b[33m",
            Severity::Info => "\x1b[36m",
        };
        out.push_str(&format!(
            "  {}{}\x1b[0m[{}]: {}\n",
            color,
            finding.severity.as_str(),
            finding.code.as_str(),
            finding.message
        ));
    }

    if report.items.is_empty() {
        out.push_str("\x1b[32m✓ no differences found\x1b[0m\n");
    } else {
        let s = &report.summary;
        out.push_str(&format!(
            "\x1b[31m✗ {} finding(s): {} breaking, {} warning, {} info\x1b[0m\n",
            s.total, s.breaking, s.warning, s.info
        ));
    }

    out
}

fn run_serve(addr: &str, db: Option<String>) -> Result<(), u8> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let addr: SocketAddr = addr.parse().map_err(|e| {
        eprintln!("Error: invalid address {}: {}", addr, e);
        2u8
    })?;

    let config = Arc::new(ServerConfig::from_env());
    let db_path = db
        .or_else(|| config.connection_string.clone())
        .unwrap_or_else(|| ":memory:".to_string());
    let store = SqliteReportStore::open(&db_path, &config.table_name).map_err(|e| {
        eprintln!("Error: {}", e);
        3u8
    })?;
    let state = AppState::new(Arc::new(store), config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            eprintln!("Error: failed to start runtime: {}", e);
            3u8
        })?;

    runtime.block_on(serve(addr, state)).map_err(|e| {
        eprintln!("Error: {}", e);
        3u8
    })
}
