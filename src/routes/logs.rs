//! Log ingestion and query endpoints.
//!
//! `POST /logs` accepts one record or a batch behind the token middleware
//! and reports per-record outcomes; `GET /logs` builds a filtered,
//! paginated query from the supplied parameters.

use crate::error::{ServerError, ServerResult};
use crate::middleware::AuthContext;
use crate::record::{validate_record, LogRecord, NewLogRecord};
use crate::state::ServerState;
use crate::store::LogFilter;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::Utc;
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Page size applied when `limit` is absent. An explicit `limit` always
/// wins; this default only covers omission, never invalid input.
pub const DEFAULT_PAGE_SIZE: i64 = 100;

/// Write request body: a single record object, or a batch under `logs`.
///
/// A `logs` key holding anything but an array falls through to
/// single-record treatment and fails validation field-by-field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum IngestBody {
    Batch { logs: Vec<Value> },
    Single(Value),
}

impl IngestBody {
    fn into_records(self) -> Vec<Value> {
        match self {
            IngestBody::Batch { logs } => logs,
            IngestBody::Single(record) => vec![record],
        }
    }
}

/// Per-batch outcome accounting.
#[derive(Debug, Default, Serialize)]
pub struct IngestReport {
    pub accepted: u64,
    pub failed: u64,
    pub errors: Vec<String>,
}

/// Query response: `count` is the size of this page, not a total. Callers
/// wanting totals page until a short page comes back.
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub count: usize,
    pub results: Vec<LogRecord>,
}

/// Raw query parameters as they arrive on the wire.
///
/// `limit` and `offset` stay strings here so that "absent" and "present
/// but invalid" remain distinguishable; parsing is an explicit step.
#[derive(Debug, Default, Deserialize)]
pub struct LogQueryParams {
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub offset: Option<String>,
    #[serde(default)]
    pub timestamp_start: Option<String>,
    #[serde(default)]
    pub timestamp_end: Option<String>,
    #[serde(default)]
    pub received_at_start: Option<String>,
    #[serde(default)]
    pub received_at_end: Option<String>,
}

impl LogQueryParams {
    /// Build the store filter, rejecting malformed pagination input before
    /// any query is constructed.
    fn into_filter(self) -> ServerResult<LogFilter> {
        let limit = parse_limit(self.limit.as_deref())?;
        let offset = parse_offset(self.offset.as_deref())?;

        Ok(LogFilter {
            service: match_filter(self.service),
            severity: match_filter(self.severity),
            timestamp_start: range_filter(self.timestamp_start),
            timestamp_end: range_filter(self.timestamp_end),
            received_at_start: range_filter(self.received_at_start),
            received_at_end: range_filter(self.received_at_end),
            limit,
            offset,
        })
    }
}

/// `"all"`, empty, or absent disables an exact-match filter.
fn match_filter(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && v != "all")
}

fn range_filter(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn parse_limit(raw: Option<&str>) -> ServerResult<i64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_PAGE_SIZE);
    };
    match raw.parse::<i64>() {
        Ok(n) if n >= 1 => Ok(n),
        Ok(n) => Err(ServerError::InvalidParameter(format!(
            "limit must be at least 1, got {n}"
        ))),
        Err(_) => Err(ServerError::InvalidParameter(format!(
            "limit must be a positive integer, got {raw:?}"
        ))),
    }
}

fn parse_offset(raw: Option<&str>) -> ServerResult<i64> {
    let Some(raw) = raw else {
        return Ok(0);
    };
    match raw.parse::<i64>() {
        Ok(n) if n >= 0 => Ok(n),
        Ok(n) => Err(ServerError::InvalidParameter(format!(
            "offset must not be negative, got {n}"
        ))),
        Err(_) => Err(ServerError::InvalidParameter(format!(
            "offset must be a non-negative integer, got {raw:?}"
        ))),
    }
}

/// Ingest one record or a batch.
///
/// Every record is validated and inserted independently; a defective
/// record is tallied and reported without short-circuiting its siblings.
/// The whole batch shares one server-assigned `received_at`. The response
/// is 200 as soon as anything was accepted, 400 only when nothing was.
pub async fn ingest_logs(
    State(state): State<Arc<ServerState>>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<IngestBody>,
) -> ServerResult<impl IntoResponse> {
    let records = body.into_records();
    let received_at = Utc::now().to_rfc3339();
    let store = state.store.clone();
    let token = auth.token.clone();

    let report = tokio::task::spawn_blocking(move || {
        let mut report = IngestReport::default();
        for record in &records {
            match validate_record(record) {
                Err(message) => {
                    report.failed += 1;
                    report.errors.push(message);
                }
                Ok(fields) => {
                    let new_record = NewLogRecord::from_payload(fields, &received_at, &token);
                    match store.insert(&new_record) {
                        Ok(_) => report.accepted += 1,
                        Err(err) => {
                            report.failed += 1;
                            report.errors.push(err.to_string());
                        }
                    }
                }
            }
        }
        report
    })
    .await
    .map_err(|err| ServerError::Internal(format!("ingest task failed: {err}")))?;

    counter!("logsink_records_accepted_total").increment(report.accepted);
    counter!("logsink_records_rejected_total").increment(report.failed);

    tracing::debug!(
        accepted = report.accepted,
        failed = report.failed,
        service = %auth.service,
        "batch processed"
    );

    let status = if report.accepted > 0 {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(report)))
}

/// Query stored records with optional filters and pagination.
///
/// Results come back newest-received first, ties broken by descending id,
/// which keeps pages disjoint under concurrent inserts. Store failures
/// surface as a generic server fault; the detail stays in the log.
pub async fn query_logs(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<LogQueryParams>,
) -> ServerResult<impl IntoResponse> {
    let filter = params.into_filter()?;
    let store = state.store.clone();

    let results = tokio::task::spawn_blocking(move || store.query(&filter))
        .await
        .map_err(|err| ServerError::Internal(format!("query task failed: {err}")))??;

    counter!("logsink_queries_total").increment(1);

    Ok(Json(QueryResponse {
        count: results.len(),
        results,
    }))
}
