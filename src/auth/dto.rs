use serde::{Deserialize, Serialize};

use crate::users::dto::PublicUser;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignInRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Returned by sign-in and registration.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    pub user: PublicUser,
}
