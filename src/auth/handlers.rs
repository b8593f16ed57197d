use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthResponse, SignInRequest},
        services::{validate_sign_in, AuthService},
    },
    error::AppError,
    response::{ApiJson, ApiResponse},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signin", post(sign_in))
        .route("/auth/signout", get(sign_out))
}

#[instrument(skip(auth, payload))]
pub async fn sign_in(
    State(auth): State<AuthService>,
    ApiJson(payload): ApiJson<SignInRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let credentials = validate_sign_in(payload).map_err(AppError::Validation)?;
    let (token, user) = auth.sign_in(credentials).await?;
    Ok(Json(auth.respond("Signin successful", token, &user)))
}

/// Tokens are not revoked server-side; the client discards its copy.
#[instrument]
pub async fn sign_out() -> Json<ApiResponse<()>> {
    Json(ApiResponse::message("Signout successful"))
}
