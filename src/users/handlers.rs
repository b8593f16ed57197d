use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthResponse, SignInRequest},
        extractors::{AdminUser, AuthUser},
        services::{validate_sign_in, AuthService},
    },
    error::AppError,
    response::{ApiJson, ApiResponse},
    state::AppState,
    users::{
        dto::{PublicUser, UserPayload},
        repo_types::Role,
        services,
    },
};

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/register", post(register))
        .route("/api/users/login", post(login))
        .route("/api/users/profile", get(get_profile).put(update_profile))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<UserPayload>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let user = services::create_user(&state, &payload, Role::User).await?;
    let auth = AuthService::from_ref(&state);
    let user = auth.record_login(&user).await?;
    let token = auth.issue_token(&user)?;
    Ok((
        StatusCode::CREATED,
        Json(auth.respond("User registered successfully", token, &user)),
    ))
}

#[instrument(skip(auth, payload))]
pub async fn login(
    State(auth): State<AuthService>,
    ApiJson(payload): ApiJson<SignInRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let credentials = validate_sign_in(payload).map_err(AppError::Validation)?;
    let (token, user) = auth.sign_in(credentials).await?;
    Ok(Json(auth.respond("Login successful", token, &user)))
}

#[instrument(skip(user), fields(user_id = %user.id))]
pub async fn get_profile(AuthUser(user): AuthUser) -> Json<ApiResponse<PublicUser>> {
    Json(ApiResponse::data(user.into()))
}

/// Self-service edit; a `role` in the body is ignored.
#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<UserPayload>,
) -> Result<Json<ApiResponse<PublicUser>>, AppError> {
    let updated = services::update_user(&state, user.id, &payload, None).await?;
    Ok(Json(
        ApiResponse::data(updated.into()).with_message("Profile updated successfully"),
    ))
}

#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<Vec<PublicUser>>>, AppError> {
    let users = services::list_users(&state).await?;
    Ok(Json(ApiResponse::list(
        users.into_iter().map(PublicUser::from).collect(),
    )))
}

#[instrument(skip(state, _admin, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(payload): ApiJson<UserPayload>,
) -> Result<(StatusCode, Json<ApiResponse<PublicUser>>), AppError> {
    let role = payload.role.unwrap_or_default();
    let user = services::create_user(&state, &payload, role).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(user.into()).with_message("User created successfully")),
    ))
}

#[instrument(skip(state, _admin))]
pub async fn get_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PublicUser>>, AppError> {
    let id = services::parse_user_id(&id)?;
    let user = services::get_user(&state, id).await?;
    Ok(Json(ApiResponse::data(user.into())))
}

#[instrument(skip(state, _admin, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UserPayload>,
) -> Result<Json<ApiResponse<PublicUser>>, AppError> {
    let id = services::parse_user_id(&id)?;
    let role = payload.role;
    let user = services::update_user(&state, id, &payload, role).await?;
    Ok(Json(
        ApiResponse::data(user.into()).with_message("User updated successfully"),
    ))
}

#[instrument(skip(state, _admin))]
pub async fn delete_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PublicUser>>, AppError> {
    let id = services::parse_user_id(&id)?;
    let user = services::delete_user(&state, id).await?;
    Ok(Json(
        ApiResponse::data(user.into()).with_message("User deleted successfully"),
    ))
}
