//! Diagnostic sleep handler
//!
//! Runs a storage-side `pg_sleep` so operators can observe the
//! deadline/cancellation behavior end to end: a requested duration at or
//! above the per-call budget is aborted by server-side cancellation, either
//! when the deadline fires or when the client hangs up mid-request.

use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use std::sync::Arc;

const DEFAULT_SLEEP_SECS: i64 = 5;

/// Query parameters for the sleep endpoint
#[derive(Debug, Deserialize)]
pub struct SleepParams {
    /// Sleep duration in seconds
    #[serde(default)]
    pub d: Option<String>,
}

/// Emits the completion entry on every exit path, early returns included.
struct CompletionLog;

impl Drop for CompletionLog {
    fn drop(&mut self) {
        tracing::info!("finished call to sleep");
    }
}

/// Simulate a long-running query
pub async fn sleep(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<SleepParams>,
) -> ServerResult<impl IntoResponse> {
    let seconds = parse_duration(params.d.as_deref())?;

    tracing::info!(seconds, "call to sleep");
    let _completion = CompletionLog;

    state
        .db
        .sleep(seconds, state.config.db_timeout())
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "sleep query failed");
            ServerError::Storage(e)
        })?;

    Ok("ok")
}

fn parse_duration(raw: Option<&str>) -> ServerResult<i64> {
    match raw {
        None | Some("") => Ok(DEFAULT_SLEEP_SECS),
        Some(raw) => raw
            .parse()
            .map_err(|_| ServerError::BadRequest("non numeric duration")),
    }
}
