// Rule-group endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};

use netgate_core::{
    Command, CommandResult, DataResponse, EnableRequest, EntityId, GroupDraft, GroupSummary,
    MessageResponse, Rule, RuleGroup,
};

use super::unexpected;
use crate::error::ApiError;
use crate::extract::{AdminUser, CurrentUser, JsonBody};
use crate::state::AppState;

pub async fn list_groups(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Json<Vec<GroupSummary>> {
    Json(state.controller().groups())
}

pub async fn group_rules(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<Arc<Rule>>>, ApiError> {
    Ok(Json(state.controller().group_rules(&EntityId::from(id))?))
}

pub async fn create_group(
    State(state): State<AppState>,
    _admin: AdminUser,
    JsonBody(draft): JsonBody<GroupDraft>,
) -> Result<Json<DataResponse<RuleGroup>>, ApiError> {
    match state.execute(Command::CreateGroup(draft)).await? {
        CommandResult::Group(group) => Ok(Json(DataResponse::new("Group created", group))),
        other => Err(unexpected(&other)),
    }
}

pub async fn update_group(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    JsonBody(draft): JsonBody<GroupDraft>,
) -> Result<Json<DataResponse<RuleGroup>>, ApiError> {
    let cmd = Command::UpdateGroup {
        id: EntityId::from(id),
        draft,
    };
    match state.execute(cmd).await? {
        CommandResult::Group(group) => Ok(Json(DataResponse::new("Group updated", group))),
        other => Err(unexpected(&other)),
    }
}

pub async fn delete_group(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let cmd = Command::DeleteGroup {
        id: EntityId::from(id),
    };
    match state.execute(cmd).await? {
        CommandResult::Count(detached) => Ok(Json(MessageResponse::new(format!(
            "Group deleted, {detached} rule(s) ungrouped"
        )))),
        other => Err(unexpected(&other)),
    }
}

pub async fn set_rules_enabled(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<EnableRequest>,
) -> Result<Json<DataResponse<usize>>, ApiError> {
    let cmd = Command::SetGroupRulesEnabled {
        id: EntityId::from(id),
        enabled: req.enable,
    };
    match state.execute(cmd).await? {
        CommandResult::Count(n) => {
            let verb = if req.enable { "enabled" } else { "disabled" };
            Ok(Json(DataResponse::new(format!("{n} rule(s) {verb}"), n)))
        }
        other => Err(unexpected(&other)),
    }
}
