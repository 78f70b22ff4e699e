// Log, blocked-packet and alert endpoints.

use axum::Json;
use axum::extract::State;

use netgate_core::{BlockedPacket, LogEntry, LogQuery};

use crate::extract::{CurrentUser, QueryParams};
use crate::state::AppState;

pub async fn list_logs(
    State(state): State<AppState>,
    _user: CurrentUser,
    QueryParams(query): QueryParams<LogQuery>,
) -> Json<Vec<LogEntry>> {
    Json(state.controller().logs().entries(&query))
}

pub async fn list_blocked(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Json<Vec<BlockedPacket>> {
    Json(state.controller().logs().blocked())
}

pub async fn list_alerts(State(state): State<AppState>, _user: CurrentUser) -> Json<Vec<LogEntry>> {
    Json(state.controller().logs().alerts())
}
