use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;

use crate::{
    auth::{
        access::Access,
        error::AuthError,
        services::{require_admin, AuthService},
    },
    error::AppError,
    state::AppState,
    users::repo_types::User,
};

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingToken)?;
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidAuthHeader)
}

/// Any signed-in user.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let user = AuthService::from_ref(state).verify_token(token).await?;
        Ok(AuthUser(user))
    }
}

/// A signed-in user with the admin role.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        require_admin(&user)?;
        Ok(AdminUser(user))
    }
}

/// Gate for routes whose access level is only known at runtime.
///
/// Public access never looks at the header, so a stale token does not
/// break anonymous endpoints.
pub async fn authorize(
    state: &AppState,
    headers: &HeaderMap,
    access: Access,
) -> Result<Option<User>, AppError> {
    if !access.requires_identity() {
        return Ok(None);
    }
    let token = bearer_token(headers)?;
    let user = AuthService::from_ref(state).verify_token(token).await?;
    if !access.permits(Some(user.role)) {
        warn!(user_id = %user.id, ?access, "access refused");
        return Err(AuthError::Forbidden.into());
    }
    Ok(Some(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Ok("abc"));
        assert_eq!(bearer_token(&headers("bearer abc")), Ok("abc"));
        assert_eq!(bearer_token(&HeaderMap::new()), Err(AuthError::MissingToken));
        assert_eq!(bearer_token(&headers("Basic abc")), Err(AuthError::InvalidAuthHeader));
        assert_eq!(bearer_token(&headers("Bearer ")), Err(AuthError::InvalidAuthHeader));
    }

    #[tokio::test]
    async fn public_access_ignores_bad_headers() {
        let state = AppState::fake();
        let user = authorize(&state, &headers("garbage"), Access::Public).await.unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn admin_access_without_token_is_unauthorized() {
        let state = AppState::fake();
        let err = authorize(&state, &HeaderMap::new(), Access::Admin).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::MissingToken)));

        let err = authorize(&state, &headers("Bearer nope"), Access::Admin).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::InvalidToken)));
    }
}
