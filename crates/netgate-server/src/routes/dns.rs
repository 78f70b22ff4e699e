// DNS blocking endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::{info, warn};

use netgate_core::{
    AdblockListRequest, BlockedDomain, Command, CommandResult, DataResponse, DomainDraft,
    MessageResponse,
};

use super::unexpected;
use crate::error::ApiError;
use crate::extract::{AdminUser, CurrentUser, JsonBody};
use crate::state::AppState;

pub async fn list_domains(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Json<Arc<Vec<Arc<BlockedDomain>>>> {
    Json(state.controller().blocked_domains())
}

pub async fn block_domain(
    State(state): State<AppState>,
    _admin: AdminUser,
    JsonBody(draft): JsonBody<DomainDraft>,
) -> Result<Json<DataResponse<BlockedDomain>>, ApiError> {
    match state.execute(Command::BlockDomain(draft)).await? {
        CommandResult::Domain(domain) => {
            let message = format!("{} blocked", domain.domain);
            Ok(Json(DataResponse::new(message, domain)))
        }
        other => Err(unexpected(&other)),
    }
}

pub async fn unblock_domain(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(domain): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.execute(Command::UnblockDomain { domain }).await?;
    Ok(Json(MessageResponse::new("Domain unblocked")))
}

/// Download a hosts/adblock list and merge it into the blocklist.
pub async fn import_adblock_list(
    State(state): State<AppState>,
    _admin: AdminUser,
    JsonBody(req): JsonBody<AdblockListRequest>,
) -> Result<Json<DataResponse<usize>>, ApiError> {
    let url: reqwest::Url = req
        .url
        .parse()
        .map_err(|e| ApiError::bad_request(format!("invalid list URL: {e}")))?;

    let contents = fetch_list(state.http(), url.clone()).await.map_err(|e| {
        warn!(%url, error = %e, "adblock list download failed");
        ApiError::new(
            StatusCode::BAD_GATEWAY,
            format!("failed to download list: {e}"),
        )
    })?;

    match state.execute(Command::ImportBlocklist { contents }).await? {
        CommandResult::Count(added) => {
            info!(%url, added, "adblock list imported");
            Ok(Json(DataResponse::new(
                format!("{added} domain(s) imported"),
                added,
            )))
        }
        other => Err(unexpected(&other)),
    }
}

async fn fetch_list(http: &reqwest::Client, url: reqwest::Url) -> Result<String, reqwest::Error> {
    http.get(url).send().await?.error_for_status()?.text().await
}

pub async fn block_doh(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<DataResponse<usize>>, ApiError> {
    match state.execute(Command::BlockDoh).await? {
        CommandResult::Count(created) => {
            let message = if created > 0 {
                "DNS-over-HTTPS blocking enabled"
            } else {
                "DNS-over-HTTPS blocking already enabled"
            };
            Ok(Json(DataResponse::new(message, created)))
        }
        other => Err(unexpected(&other)),
    }
}
