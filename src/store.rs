//! SQLite-backed event store.
//!
//! The store is a single `logs` table with a store-assigned autoincrement
//! primary key. The connection sits behind a mutex, which serializes id
//! assignment; WAL mode lets queries read a consistent snapshot while a
//! write commits, so a reader never observes a partially-written row.
//!
//! Every value that reaches SQL text is bound as a parameter. The filtered
//! query is assembled as a clause list plus a parameter list of equal
//! length; nothing caller-controlled is ever interpolated.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::types::ToSql;
use rusqlite::{params, Connection, Row};
use thiserror::Error;

use crate::record::{LogRecord, NewLogRecord};

/// Schema SQL embedded at compile time.
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Errors surfaced by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O error during database operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Filter and pagination bounds for a read query.
///
/// `None` means the predicate is not applied; the caller has already
/// resolved sentinels and defaults before the filter reaches the store.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub service: Option<String>,
    pub severity: Option<String>,
    pub timestamp_start: Option<String>,
    pub timestamp_end: Option<String>,
    pub received_at_start: Option<String>,
    pub received_at_end: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Durable, append-mostly collection of log records.
pub struct LogStore {
    conn: Arc<Mutex<Connection>>,
}

impl LogStore {
    /// Opens or creates the store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Creates an in-memory store, used by tests.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Persists one validated record and returns its assigned id.
    ///
    /// The insert is atomic: the row is fully visible or not visible at all.
    pub fn insert(&self, record: &NewLogRecord) -> Result<i64, StoreError> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO logs (timestamp, service, severity, message, received_at, token_used)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.timestamp,
                record.service,
                record.severity,
                record.message,
                record.received_at,
                record.token_used,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Returns records matching the filter, newest-received first.
    ///
    /// Ties on `received_at` break by descending id, so pagination stays
    /// stable under concurrent inserts: new rows with larger ids sort ahead
    /// of every existing page instead of displacing a page's tail.
    pub fn query(&self, filter: &LogFilter) -> Result<Vec<LogRecord>, StoreError> {
        let mut clauses: Vec<&'static str> = Vec::new();
        let mut values: Vec<&dyn ToSql> = Vec::new();

        if let Some(service) = &filter.service {
            clauses.push("service = ?");
            values.push(service);
        }
        if let Some(severity) = &filter.severity {
            clauses.push("severity = ?");
            values.push(severity);
        }
        if let Some(start) = &filter.timestamp_start {
            clauses.push("timestamp >= ?");
            values.push(start);
        }
        if let Some(end) = &filter.timestamp_end {
            clauses.push("timestamp <= ?");
            values.push(end);
        }
        if let Some(start) = &filter.received_at_start {
            clauses.push("received_at >= ?");
            values.push(start);
        }
        if let Some(end) = &filter.received_at_end {
            clauses.push("received_at <= ?");
            values.push(end);
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT id, timestamp, service, severity, message, received_at, token_used
             FROM logs{where_sql}
             ORDER BY received_at DESC, id DESC
             LIMIT ? OFFSET ?"
        );
        values.push(&filter.limit);
        values.push(&filter.offset);

        let conn = self.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(values), row_to_record)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Cheap connectivity probe for readiness checks.
    pub fn ping(&self) -> Result<(), StoreError> {
        let conn = self.lock();
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<LogRecord> {
    Ok(LogRecord {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        service: row.get(2)?,
        severity: row.get(3)?,
        message: row.get(4)?,
        received_at: row.get(5)?,
        token_used: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(service: &str, severity: &str, message: &str, received_at: &str) -> NewLogRecord {
        NewLogRecord {
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            service: service.to_string(),
            severity: severity.to_string(),
            message: message.to_string(),
            received_at: received_at.to_string(),
            token_used: "token123".to_string(),
        }
    }

    fn filter() -> LogFilter {
        LogFilter {
            limit: 100,
            ..LogFilter::default()
        }
    }

    #[test]
    fn insert_assigns_strictly_increasing_ids() {
        let store = LogStore::in_memory().unwrap();
        let mut last = 0;
        for i in 0..5 {
            let id = store
                .insert(&record("auth-service", "INFO", &format!("m{i}"), "2024-01-02T00:00:00Z"))
                .unwrap();
            assert!(id > last);
            last = id;
        }
    }

    #[test]
    fn query_orders_newest_received_first_then_id_desc() {
        let store = LogStore::in_memory().unwrap();
        store.insert(&record("a", "INFO", "old", "2024-01-01T00:00:00Z")).unwrap();
        store.insert(&record("a", "INFO", "new-1", "2024-01-03T00:00:00Z")).unwrap();
        store.insert(&record("a", "INFO", "new-2", "2024-01-03T00:00:00Z")).unwrap();

        let results = store.query(&filter()).unwrap();
        let messages: Vec<&str> = results.iter().map(|r| r.message.as_str()).collect();
        // Same received_at: the later insert (larger id) sorts first.
        assert_eq!(messages, ["new-2", "new-1", "old"]);
    }

    #[test]
    fn pagination_returns_disjoint_contiguous_pages() {
        let store = LogStore::in_memory().unwrap();
        for i in 0..6 {
            store
                .insert(&record("a", "INFO", &format!("m{i}"), "2024-01-02T00:00:00Z"))
                .unwrap();
        }

        let mut seen = Vec::new();
        for offset in [0, 2, 4] {
            let page = store
                .query(&LogFilter {
                    limit: 2,
                    offset,
                    ..LogFilter::default()
                })
                .unwrap();
            assert_eq!(page.len(), 2);
            seen.extend(page.into_iter().map(|r| r.id));
        }
        let mut sorted = seen.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();
        assert_eq!(seen, sorted);
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn service_and_severity_filters_match_exactly() {
        let store = LogStore::in_memory().unwrap();
        store.insert(&record("auth-service", "INFO", "a", "2024-01-02T00:00:00Z")).unwrap();
        store.insert(&record("payment-service", "ERROR", "b", "2024-01-02T00:00:00Z")).unwrap();

        let results = store
            .query(&LogFilter {
                service: Some("auth-service".to_string()),
                limit: 100,
                ..LogFilter::default()
            })
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].message, "a");

        let results = store
            .query(&LogFilter {
                severity: Some("ERROR".to_string()),
                limit: 100,
                ..LogFilter::default()
            })
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].message, "b");
    }

    #[test]
    fn timestamp_range_bounds_are_independent() {
        let store = LogStore::in_memory().unwrap();
        for (ts, msg) in [
            ("2024-01-01T00:00:00Z", "jan"),
            ("2024-02-01T00:00:00Z", "feb"),
            ("2024-03-01T00:00:00Z", "mar"),
        ] {
            let mut r = record("a", "INFO", msg, "2024-06-01T00:00:00Z");
            r.timestamp = ts.to_string();
            store.insert(&r).unwrap();
        }

        let results = store
            .query(&LogFilter {
                timestamp_start: Some("2024-02-01T00:00:00Z".to_string()),
                limit: 100,
                ..LogFilter::default()
            })
            .unwrap();
        assert_eq!(results.len(), 2);

        let results = store
            .query(&LogFilter {
                timestamp_start: Some("2024-01-15T00:00:00Z".to_string()),
                timestamp_end: Some("2024-02-15T00:00:00Z".to_string()),
                limit: 100,
                ..LogFilter::default()
            })
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].message, "feb");
    }

    #[test]
    fn received_at_range_filters_apply() {
        let store = LogStore::in_memory().unwrap();
        store.insert(&record("a", "INFO", "early", "2024-01-01T00:00:00Z")).unwrap();
        store.insert(&record("a", "INFO", "late", "2024-05-01T00:00:00Z")).unwrap();

        let results = store
            .query(&LogFilter {
                received_at_end: Some("2024-02-01T00:00:00Z".to_string()),
                limit: 100,
                ..LogFilter::default()
            })
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].message, "early");
    }

    #[test]
    fn filter_values_are_bound_not_interpolated() {
        let store = LogStore::in_memory().unwrap();
        store.insert(&record("a", "INFO", "kept", "2024-01-02T00:00:00Z")).unwrap();

        // A hostile filter value must behave as an ordinary non-matching
        // string, not as SQL.
        let results = store
            .query(&LogFilter {
                service: Some("a'; DROP TABLE logs; --".to_string()),
                limit: 100,
                ..LogFilter::default()
            })
            .unwrap();
        assert!(results.is_empty());

        let results = store.query(&filter()).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn offset_beyond_rows_yields_empty_page() {
        let store = LogStore::in_memory().unwrap();
        store.insert(&record("a", "INFO", "only", "2024-01-02T00:00:00Z")).unwrap();
        let results = store
            .query(&LogFilter {
                limit: 10,
                offset: 50,
                ..LogFilter::default()
            })
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn open_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.db");
        {
            let store = LogStore::open(&path).unwrap();
            store.insert(&record("a", "INFO", "durable", "2024-01-02T00:00:00Z")).unwrap();
        }
        let store = LogStore::open(&path).unwrap();
        let results = store.query(&filter()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].message, "durable");
    }
}
