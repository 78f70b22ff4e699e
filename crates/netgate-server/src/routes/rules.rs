// Firewall rule endpoints and connection evaluation.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};

use netgate_core::{
    Command, CommandResult, Connection, DataResponse, Decision, EntityId, MessageResponse,
    ReorderRulesRequest, Rule, RuleDraft,
};

use super::unexpected;
use crate::error::ApiError;
use crate::extract::{AdminUser, CurrentUser, JsonBody};
use crate::state::AppState;

pub async fn list_rules(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Json<Vec<Arc<Rule>>> {
    Json(state.controller().rules())
}

pub async fn get_rule(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Arc<Rule>>, ApiError> {
    Ok(Json(state.controller().rule(&EntityId::from(id))?))
}

pub async fn create_rule(
    State(state): State<AppState>,
    _admin: AdminUser,
    JsonBody(draft): JsonBody<RuleDraft>,
) -> Result<Json<DataResponse<Rule>>, ApiError> {
    match state.execute(Command::CreateRule(draft)).await? {
        CommandResult::Rule(rule) => Ok(Json(DataResponse::new("Rule created", rule))),
        other => Err(unexpected(&other)),
    }
}

pub async fn update_rule(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    JsonBody(draft): JsonBody<RuleDraft>,
) -> Result<Json<DataResponse<Rule>>, ApiError> {
    let cmd = Command::UpdateRule {
        id: EntityId::from(id),
        draft,
    };
    match state.execute(cmd).await? {
        CommandResult::Rule(rule) => Ok(Json(DataResponse::new("Rule updated", rule))),
        other => Err(unexpected(&other)),
    }
}

pub async fn delete_rule(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .execute(Command::DeleteRule {
            id: EntityId::from(id),
        })
        .await?;
    Ok(Json(MessageResponse::new("Rule deleted")))
}

pub async fn reorder_rules(
    State(state): State<AppState>,
    _admin: AdminUser,
    JsonBody(req): JsonBody<ReorderRulesRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .execute(Command::ReorderRules {
            ordered_ids: req.ordered_ids,
        })
        .await?;
    Ok(Json(MessageResponse::new("Rules reordered")))
}

pub async fn evaluate(
    State(state): State<AppState>,
    _user: CurrentUser,
    JsonBody(conn): JsonBody<Connection>,
) -> Result<Json<Decision>, ApiError> {
    Ok(Json(state.controller().evaluate(&conn)?))
}
