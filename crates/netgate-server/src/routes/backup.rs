// Configuration export and restore.

use axum::Json;
use axum::extract::State;

use netgate_core::{Backup, Command, MessageResponse};

use crate::error::ApiError;
use crate::extract::{AdminUser, JsonBody};
use crate::state::AppState;

pub async fn export_backup(State(state): State<AppState>, _admin: AdminUser) -> Json<Backup> {
    Json(state.controller().export_backup())
}

pub async fn import_backup(
    State(state): State<AppState>,
    _admin: AdminUser,
    JsonBody(backup): JsonBody<Backup>,
) -> Result<Json<MessageResponse>, ApiError> {
    if backup.is_empty() {
        return Err(ApiError::bad_request("backup contains no sections"));
    }
    state.execute(Command::ImportBackup(Box::new(backup))).await?;
    Ok(Json(MessageResponse::new("Configuration restored")))
}
