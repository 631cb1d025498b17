use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::guard::AccessDenied;

/// A user-correctable input problem. Shown inline on the re-rendered form;
/// nothing has been written when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Username is required.")]
    MissingUsername,
    #[error("Password is required.")]
    MissingPassword,
    #[error("User {0} is already registered.")]
    Duplicate(String),
    #[error("Incorrect username.")]
    BadUsername,
    #[error("Incorrect password.")]
    BadPassword,
    #[error("Title is required.")]
    MissingTitle,
}

/// Anything that ends the request without rendering the requested page.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Denied(#[from] AccessDenied),
    #[error("no such page")]
    PageNotFound,
    #[error("malformed request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Denied(denied) => denied.into_response(),
            AppError::PageNotFound => StatusCode::NOT_FOUND.into_response(),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Internal(e) => {
                error!("Request failed: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
