//! Report persistence behind a pluggable store.
//!
//! The store is a partitioned key-value surface: reports partition by
//! repository and key by report id. Inserting an id twice is success, not
//! an error, so retried webhook deliveries stay idempotent.

use std::sync::Mutex;

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::types::Summary;

/// One persisted report row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub id: String,
    pub repo: String,
    pub source: String,
    /// ISO-8601 UTC timestamp of ingestion.
    pub created_at: String,
    pub summary: Summary,
    pub markdown: String,
    pub markdown_truncated: bool,
    /// The findings serialized as a JSON string (possibly truncated).
    pub items_json: String,
    pub items_truncated: bool,
}

/// Listing view of a report: everything except the large payload fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStub {
    pub id: String,
    pub repo: String,
    pub source: String,
    pub created_at: String,
    pub summary: Summary,
}

impl ReportStub {
    fn of(record: &ReportRecord) -> Self {
        ReportStub {
            id: record.id.clone(),
            repo: record.repo.clone(),
            source: record.source.clone(),
            created_at: record.created_at.clone(),
            summary: record.summary,
        }
    }
}

/// One page of report stubs plus an opaque continuation token.
#[derive(Debug, Clone)]
pub struct ReportPage {
    pub items: Vec<ReportStub>,
    pub next_token: Option<String>,
}

/// Abstract report persistence.
pub trait ReportStore: Send + Sync {
    /// Persist a record. A duplicate `(repo, id)` pair is treated as
    /// success.
    fn put(&self, record: &ReportRecord) -> Result<(), StoreError>;

    /// List a page of stubs for one repository, newest first.
    fn list_page(
        &self,
        repo: &str,
        page_size: usize,
        token: Option<&str>,
    ) -> Result<ReportPage, StoreError>;

    /// Fetch a full record by its id, across all repositories.
    fn get_by_id(&self, id: &str) -> Result<Option<ReportRecord>, StoreError>;
}

/// In-memory store for tests. Not durable, but good for unit and
/// adapter-level scenario tests.
#[derive(Default)]
pub struct MemoryReportStore {
    rows: Mutex<Vec<ReportRecord>>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportStore for MemoryReportStore {
    fn put(&self, record: &ReportRecord) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|row| row.repo == record.repo && row.id == record.id)
        {
            return Ok(());
        }
        rows.push(record.clone());
        Ok(())
    }

    fn list_page(
        &self,
        repo: &str,
        page_size: usize,
        token: Option<&str>,
    ) -> Result<ReportPage, StoreError> {
        let rows = self.rows.lock().unwrap();
        let newest_first: Vec<&ReportRecord> =
            rows.iter().rev().filter(|row| row.repo == repo).collect();
        let start = match token {
            Some(cursor) => newest_first
                .iter()
                .position(|row| row.id == cursor)
                .map_or(newest_first.len(), |idx| idx + 1),
            None => 0,
        };
        let window: Vec<&ReportRecord> =
            newest_first.into_iter().skip(start).take(page_size + 1).collect();
        let has_more = window.len() > page_size;
        let page: Vec<ReportStub> = window
            .iter()
            .take(page_size)
            .map(|row| ReportStub::of(row))
            .collect();
        let next_token = if has_more {
            page.last().map(|stub| stub.id.clone())
        } else {
            None
        };
        Ok(ReportPage {
            items: page,
            next_token,
        })
    }

    fn get_by_id(&self, id: &str) -> Result<Option<ReportRecord>, StoreError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|row| row.id == id).cloned())
    }
}

/// SQLite-backed store. The table name comes from configuration, so it is
/// restricted to identifier characters before being spliced into SQL.
pub struct SqliteReportStore {
    conn: Mutex<Connection>,
    table: String,
}

impl SqliteReportStore {
    /// Open (or create) the database at `path` and ensure the reports
    /// table exists. `":memory:"` is accepted for an ephemeral store.
    pub fn open(path: &str, table: &str) -> Result<Self, StoreError> {
        if table.is_empty()
            || !table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(StoreError::Unavailable {
                message: format!("invalid table name: {table:?}"),
            });
        }
        let conn = Connection::open(path).map_err(|e| StoreError::Unavailable {
            message: e.to_string(),
        })?;
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                row_id INTEGER PRIMARY KEY AUTOINCREMENT,
                repo TEXT NOT NULL,
                id TEXT NOT NULL,
                source TEXT NOT NULL,
                created_at TEXT NOT NULL,
                summary_breaking INTEGER NOT NULL,
                summary_warning INTEGER NOT NULL,
                summary_info INTEGER NOT NULL,
                summary_total INTEGER NOT NULL,
                markdown TEXT NOT NULL,
                markdown_truncated INTEGER NOT NULL,
                items TEXT NOT NULL,
                items_truncated INTEGER NOT NULL,
                UNIQUE(repo, id)
            );
            CREATE INDEX IF NOT EXISTS {table}_repo_row ON {table}(repo, row_id);"
        ))?;
        Ok(Self {
            conn: Mutex::new(conn),
            table: table.to_string(),
        })
    }
}

impl ReportStore for SqliteReportStore {
    fn put(&self, record: &ReportRecord) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        // INSERT OR IGNORE keeps a duplicate delivery from erroring.
        conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {} (repo, id, source, created_at,
                    summary_breaking, summary_warning, summary_info, summary_total,
                    markdown, markdown_truncated, items, items_truncated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                self.table
            ),
            params![
                record.repo,
                record.id,
                record.source,
                record.created_at,
                record.summary.breaking as i64,
                record.summary.warning as i64,
                record.summary.info as i64,
                record.summary.total as i64,
                record.markdown,
                record.markdown_truncated,
                record.items_json,
                record.items_truncated,
            ],
        )?;
        Ok(())
    }

    fn list_page(
        &self,
        repo: &str,
        page_size: usize,
        token: Option<&str>,
    ) -> Result<ReportPage, StoreError> {
        let conn = self.conn.lock().unwrap();
        let cursor: i64 = token
            .and_then(|t| t.parse().ok())
            .unwrap_or(i64::MAX);
        let mut stmt = conn.prepare(&format!(
            "SELECT row_id, id, repo, source, created_at,
                    summary_breaking, summary_warning, summary_info, summary_total
             FROM {} WHERE repo = ?1 AND row_id < ?2
             ORDER BY row_id DESC LIMIT ?3",
            self.table
        ))?;
        let rows = stmt.query_map(
            params![repo, cursor, (page_size + 1) as i64],
            |row| {
                let row_id: i64 = row.get(0)?;
                Ok((
                    row_id,
                    ReportStub {
                        id: row.get(1)?,
                        repo: row.get(2)?,
                        source: row.get(3)?,
                        created_at: row.get(4)?,
                        summary: Summary {
                            breaking: row.get::<_, i64>(5)? as usize,
                            warning: row.get::<_, i64>(6)? as usize,
                            info: row.get::<_, i64>(7)? as usize,
                            total: row.get::<_, i64>(8)? as usize,
                        },
                    },
                ))
            },
        )?;

        let mut window = Vec::new();
        for row in rows {
            window.push(row?);
        }
        let has_more = window.len() > page_size;
        window.truncate(page_size);
        let next_token = if has_more {
            window.last().map(|(row_id, _)| row_id.to_string())
        } else {
            None
        };
        Ok(ReportPage {
            items: window.into_iter().map(|(_, stub)| stub).collect(),
            next_token,
        })
    }

    fn get_by_id(&self, id: &str) -> Result<Option<ReportRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, repo, source, created_at,
                    summary_breaking, summary_warning, summary_info, summary_total,
                    markdown, markdown_truncated, items, items_truncated
             FROM {} WHERE id = ?1 LIMIT 1",
            self.table
        ))?;
        let mut rows = stmt.query_map(params![id], |row| {
            Ok(ReportRecord {
                id: row.get(0)?,
                repo: row.get(1)?,
                source: row.get(2)?,
                created_at: row.get(3)?,
                summary: Summary {
                    breaking: row.get::<_, i64>(4)? as usize,
                    warning: row.get::<_, i64>(5)? as usize,
                    info: row.get::<_, i64>(6)? as usize,
                    total: row.get::<_, i64>(7)? as usize,
                },
                markdown: row.get(8)?,
                markdown_truncated: row.get(9)?,
                items_json: row.get(10)?,
                items_truncated: row.get(11)?,
            })
        })?;
        match rows.next() {
            Some(record) => Ok(Some(record?)),
            None => Ok(None),
        }
    }
}
