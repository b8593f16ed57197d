use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::{
    auth::error::AuthError, state::AppState, users::repo::UserRepoError,
    validation::FieldViolation,
};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation errors")]
    Validation(Vec<FieldViolation>),
    #[error("Malformed request body: {0}")]
    MalformedBody(String),
    /// Carries the lowercase resource noun, e.g. `project`.
    #[error("Invalid {0} ID format")]
    InvalidId(&'static str),
    /// Carries the resource label, e.g. `Project`.
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Server Error")]
    Internal(#[from] anyhow::Error),
}

/// Detail of an internal failure, attached to the response so that
/// [`expose_internal_detail`] can surface it in development.
#[derive(Debug, Clone)]
pub struct InternalDetail(pub String);

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldViolation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_failed",
            AppError::MalformedBody(_) => "malformed_body",
            AppError::InvalidId(_) => "invalid_id",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Auth(e) => e.error_code(),
            AppError::Internal(_) => "server_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::MalformedBody(_)
            | AppError::InvalidId(_)
            | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Auth(e) => e.status_code(),
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedBody(rejection.body_text())
    }
}

impl From<UserRepoError> for AppError {
    fn from(e: UserRepoError) -> Self {
        match e {
            UserRepoError::DuplicateEmail => AppError::Conflict(e.to_string()),
            UserRepoError::Other(e) => AppError::Internal(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let message = self.to_string();
        match self {
            AppError::Validation(violations) => (
                status,
                Json(ErrorBody {
                    success: false,
                    code,
                    message,
                    errors: Some(violations),
                    error: None,
                }),
            )
                .into_response(),
            AppError::Internal(e) => {
                error!(error = ?e, "request failed");
                let mut response = (
                    status,
                    Json(ErrorBody {
                        success: false,
                        code,
                        message,
                        errors: None,
                        error: None,
                    }),
                )
                    .into_response();
                response
                    .extensions_mut()
                    .insert(InternalDetail(format!("{e:#}")));
                response
            }
            _ => (
                status,
                Json(ErrorBody {
                    success: false,
                    code,
                    message,
                    errors: None,
                    error: None,
                }),
            )
                .into_response(),
        }
    }
}

/// Response middleware: in development, rewrites internal-error bodies to
/// include the underlying error chain. Production responses are untouched.
pub async fn expose_internal_detail(State(state): State<AppState>, mut response: Response) -> Response {
    let Some(InternalDetail(detail)) = response.extensions_mut().remove::<InternalDetail>() else {
        return response;
    };
    if !state.config.is_development() {
        return response;
    }
    let body = ErrorBody {
        success: false,
        code: "server_error",
        message: "Server Error".into(),
        errors: None,
        error: Some(detail),
    };
    (response.status(), Json(body)).into_response()
}
