// ── Request log middleware ──
//
// Appends one INFO entry per request to the controller's log book.

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use netgate_core::RequestRecord;

use crate::state::AppState;

pub async fn record_request(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_owned();
    let query_string = req.uri().query().map(str::to_owned);
    // Absent when the router is driven without a socket (tests).
    let source_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let resp = next.run(req).await;

    state.controller().logs().record_request(RequestRecord {
        source_ip,
        method,
        path,
        query_string,
        status_code: resp.status().as_u16(),
        process_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    });
    resp
}
