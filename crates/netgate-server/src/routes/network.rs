// Interface, NAT and static-route endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};

use netgate_core::{
    Command, CommandResult, DataResponse, EntityId, InterfaceConfig, InterfaceDraft,
    MessageResponse, NatConfig, RouteDraft, StaticRoute,
};

use super::unexpected;
use crate::error::ApiError;
use crate::extract::{AdminUser, CurrentUser, JsonBody};
use crate::state::AppState;

// ── Interfaces ──────────────────────────────────────────────────────

pub async fn list_interfaces(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Json<Arc<Vec<Arc<InterfaceConfig>>>> {
    Json(state.controller().interfaces())
}

pub async fn save_interface(
    State(state): State<AppState>,
    _admin: AdminUser,
    JsonBody(draft): JsonBody<InterfaceDraft>,
) -> Result<Json<DataResponse<InterfaceConfig>>, ApiError> {
    match state.execute(Command::SaveInterface(draft)).await? {
        CommandResult::Interface(iface) => {
            Ok(Json(DataResponse::new("Interface saved", iface)))
        }
        other => Err(unexpected(&other)),
    }
}

pub async fn update_interface(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(name): Path<String>,
    JsonBody(draft): JsonBody<InterfaceDraft>,
) -> Result<Json<DataResponse<InterfaceConfig>>, ApiError> {
    match state.execute(Command::UpdateInterface { name, draft }).await? {
        CommandResult::Interface(iface) => {
            Ok(Json(DataResponse::new("Interface updated", iface)))
        }
        other => Err(unexpected(&other)),
    }
}

pub async fn delete_interface(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.execute(Command::DeleteInterface { name }).await?;
    Ok(Json(MessageResponse::new("Interface deleted")))
}

// ── NAT ─────────────────────────────────────────────────────────────

pub async fn get_nat(State(state): State<AppState>, _user: CurrentUser) -> Json<NatConfig> {
    Json(state.controller().nat())
}

pub async fn set_nat(
    State(state): State<AppState>,
    _admin: AdminUser,
    JsonBody(cfg): JsonBody<NatConfig>,
) -> Result<Json<DataResponse<NatConfig>>, ApiError> {
    match state.execute(Command::SetNat(cfg)).await? {
        CommandResult::Nat(nat) => Ok(Json(DataResponse::new("NAT updated", nat))),
        other => Err(unexpected(&other)),
    }
}

// ── Static routes ───────────────────────────────────────────────────

pub async fn list_routes(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Json<Arc<Vec<Arc<StaticRoute>>>> {
    Json(state.controller().routes())
}

pub async fn create_route(
    State(state): State<AppState>,
    _admin: AdminUser,
    JsonBody(draft): JsonBody<RouteDraft>,
) -> Result<Json<DataResponse<StaticRoute>>, ApiError> {
    match state.execute(Command::CreateRoute(draft)).await? {
        CommandResult::Route(route) => Ok(Json(DataResponse::new("Route created", route))),
        other => Err(unexpected(&other)),
    }
}

pub async fn update_route(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    JsonBody(draft): JsonBody<RouteDraft>,
) -> Result<Json<DataResponse<StaticRoute>>, ApiError> {
    let cmd = Command::UpdateRoute {
        id: EntityId::from(id),
        draft,
    };
    match state.execute(cmd).await? {
        CommandResult::Route(route) => Ok(Json(DataResponse::new("Route updated", route))),
        other => Err(unexpected(&other)),
    }
}

pub async fn delete_route(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .execute(Command::DeleteRoute {
            id: EntityId::from(id),
        })
        .await?;
    Ok(Json(MessageResponse::new("Route deleted")))
}
