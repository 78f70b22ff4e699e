// Service root and account endpoints.

use axum::Json;
use axum::extract::State;
use secrecy::SecretString;

use netgate_core::{AccessToken, LoginRequest, MessageResponse, RegisterResponse, UserInfo};

use crate::error::ApiError;
use crate::extract::{CurrentUser, JsonBody};
use crate::state::AppState;

pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse::new("NetGate API is running"))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<AccessToken>, ApiError> {
    let token = state
        .controller()
        .auth()
        .login(&req.username, &SecretString::from(req.password))?;
    Ok(Json(token))
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let user = state
        .controller()
        .auth()
        .register(&req.username, SecretString::from(req.password))?;
    Ok(Json(RegisterResponse {
        message: "User created".into(),
        user_id: user.username,
    }))
}

pub async fn me(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<UserInfo>, ApiError> {
    Ok(Json(state.controller().auth().user_info(&session.username)?))
}
