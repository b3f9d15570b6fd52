/*
 * Responsibility
 * - POST /login: username/password → signed access token
 * - public endpoint (RequiredRoles 空) なので、壊れた Authorization header があっても到達できる
 */
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::api::v1::dto::{login_request::LoginRequest, token_response::TokenResponse};
use crate::error::AppError;
use crate::state::AppState;

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    req.validate()
        .map_err(|msg| AppError::bad_request("INVALID_LOGIN_REQUEST", msg))?;

    let out = state.issuer.issue(&req.username, &req.password).await?;

    Ok((
        StatusCode::OK,
        Json(TokenResponse {
            token: out.token,
            token_type: out.token_type,
            expires_in: out.expires_in,
        }),
    ))
}
