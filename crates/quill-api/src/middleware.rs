use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use quill_types::models::User;

use crate::auth::AppState;
use crate::error::AppError;
use crate::guard;

/// The user behind the current request, or `None` for anonymous visitors.
/// Resolved once per request by [`load_identity`] and handed to handlers
/// through request extensions.
#[derive(Debug, Clone, Default)]
pub struct RequestIdentity(pub Option<User>);

impl RequestIdentity {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }
}

/// Resolve the session cookie to a user before any handler runs.
///
/// A session whose user no longer exists resolves to anonymous; the stale
/// session row is left in place.
pub async fn load_identity(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let jar = CookieJar::from_headers(req.headers());

    let user = match state.sessions.current_user_id(&state.db, &jar)? {
        None => None,
        Some(user_id) => {
            let user = state.db.get_user_by_id(user_id)?;
            if user.is_none() {
                warn!("Session refers to missing user {}", user_id);
            }
            user.map(User::from)
        }
    };

    req.extensions_mut().insert(RequestIdentity(user));
    Ok(next.run(req).await)
}

/// Route layer for pages that only make sense with a logged-in user.
/// Must run inside [`load_identity`].
pub async fn require_login(req: Request, next: Next) -> Response {
    let identity = req
        .extensions()
        .get::<RequestIdentity>()
        .cloned()
        .unwrap_or_default();

    match guard::require_user(&identity) {
        Ok(_) => next.run(req).await,
        Err(denied) => denied.into_response(),
    }
}
