//! Access checks for post mutation.
//!
//! Each guard either hands back what it checked or an [`AccessDenied`]
//! that the caller returns as-is. Mutating post handlers go through
//! [`authorize_post_mutation`], which applies them in a fixed order:
//! existence, then authentication, then ownership.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use quill_types::models::{Post, User};

use crate::middleware::RequestIdentity;

pub const LOGIN_PATH: &str = "/auth/login";

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("login required")]
    LoginRequired,
    #[error("not the author of this post")]
    Forbidden,
    #[error("Post id {0} doesn't exist.")]
    NotFound(i64),
}

impl IntoResponse for AccessDenied {
    fn into_response(self) -> Response {
        match self {
            AccessDenied::LoginRequired => Redirect::to(LOGIN_PATH).into_response(),
            AccessDenied::Forbidden => StatusCode::FORBIDDEN.into_response(),
            AccessDenied::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()).into_response(),
        }
    }
}

pub fn require_user(identity: &RequestIdentity) -> Result<&User, AccessDenied> {
    identity.user().ok_or(AccessDenied::LoginRequired)
}

pub fn require_exists(id: i64, post: Option<Post>) -> Result<Post, AccessDenied> {
    post.ok_or(AccessDenied::NotFound(id))
}

pub fn require_author<'a>(identity: &'a RequestIdentity, post: &Post) -> Result<&'a User, AccessDenied> {
    let user = require_user(identity)?;
    if !post.is_authored_by(user) {
        return Err(AccessDenied::Forbidden);
    }
    Ok(user)
}

/// Full guard chain for update and delete. Short-circuits at the first failure.
pub fn authorize_post_mutation<'a>(
    identity: &'a RequestIdentity,
    id: i64,
    post: Option<Post>,
) -> Result<(&'a User, Post), AccessDenied> {
    let post = require_exists(id, post)?;
    require_user(identity)?;
    let user = require_author(identity, &post)?;
    Ok((user, post))
}
