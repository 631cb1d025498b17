use std::sync::Arc;

use axum::{
    Extension, Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, warn};

use quill_db::{Database, DuplicateUsername};
use quill_types::forms::{LoginForm, RegisterForm};
use quill_types::models::User;

use crate::error::{AppError, ValidationError};
use crate::middleware::RequestIdentity;
use crate::password::{hash_password, verify_password};
use crate::session::SessionManager;
use crate::views;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub sessions: SessionManager,
}

impl AppStateInner {
    pub fn new(db: Database, secret_key: &str, session_lifetime: chrono::Duration) -> AppState {
        Arc::new(Self {
            db,
            sessions: SessionManager::new(secret_key, session_lifetime),
        })
    }
}

/// Registration checks, first failure wins: empty username, empty password,
/// taken username. The unique index backs up the lookup for concurrent
/// registrations.
pub fn register_user(db: &Database, form: &RegisterForm) -> anyhow::Result<Result<i64, ValidationError>> {
    if form.username.is_empty() {
        return Ok(Err(ValidationError::MissingUsername));
    }
    if form.password.is_empty() {
        return Ok(Err(ValidationError::MissingPassword));
    }
    if db.get_user_by_username(&form.username)?.is_some() {
        return Ok(Err(ValidationError::Duplicate(form.username.clone())));
    }

    let password_hash = hash_password(&form.password)?;

    match db.create_user(&form.username, &password_hash) {
        Ok(id) => Ok(Ok(id)),
        Err(e) if e.is::<DuplicateUsername>() => Ok(Err(ValidationError::Duplicate(form.username.clone()))),
        Err(e) => Err(e),
    }
}

/// Unknown username is reported before a wrong password.
pub fn authenticate(db: &Database, form: &LoginForm) -> anyhow::Result<Result<User, ValidationError>> {
    let Some(user) = db.get_user_by_username(&form.username)? else {
        return Ok(Err(ValidationError::BadUsername));
    };

    if !verify_password(&form.password, &user.password) {
        return Ok(Err(ValidationError::BadPassword));
    }

    Ok(Ok(user.into()))
}

pub async fn register_page(Extension(identity): Extension<RequestIdentity>) -> Html<String> {
    views::register(&identity, "", None)
}

pub async fn register(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    match register_user(&state.db, &form)? {
        Ok(user_id) => {
            info!("Registered {} as user {}", form.username, user_id);
            Ok(Redirect::to("/auth/login").into_response())
        }
        Err(e) => {
            info!("Registration rejected: {}", e);
            Ok(views::register(&identity, &form.username, Some(&e)).into_response())
        }
    }
}

pub async fn login_page(Extension(identity): Extension<RequestIdentity>) -> Html<String> {
    views::login(&identity, "", None)
}

pub async fn login(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match authenticate(&state.db, &form)? {
        Ok(user) => {
            let jar = state.sessions.login(&state.db, jar, user.id)?;
            info!("{} ({}) logged in", user.username, user.id);
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err(e) => {
            warn!("Failed login for '{}': {}", form.username, e);
            Ok(views::login(&identity, &form.username, Some(&e)).into_response())
        }
    }
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Result<impl IntoResponse, AppError> {
    let jar = state.sessions.logout(&state.db, jar)?;
    Ok((jar, Redirect::to("/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(username: &str, password: &str) -> RegisterForm {
        RegisterForm {
            username: username.into(),
            password: password.into(),
        }
    }

    #[test]
    fn registration_checks_in_order() {
        let db = Database::open_in_memory().unwrap();

        assert_eq!(register_user(&db, &form("", "")).unwrap(), Err(ValidationError::MissingUsername));
        assert_eq!(register_user(&db, &form("", "pw")).unwrap(), Err(ValidationError::MissingUsername));
        assert_eq!(register_user(&db, &form("a", "")).unwrap(), Err(ValidationError::MissingPassword));

        let id = register_user(&db, &form("a", "a")).unwrap().unwrap();
        let stored = db.get_user_by_id(id).unwrap().unwrap();
        assert_ne!(stored.password, "a");

        for pw in ["a", "b", ""] {
            let err = register_user(&db, &form("a", pw)).unwrap().unwrap_err();
            if pw.is_empty() {
                assert_eq!(err, ValidationError::MissingPassword);
            } else {
                assert_eq!(err, ValidationError::Duplicate("a".into()));
            }
        }
    }

    #[test]
    fn same_password_different_hashes() {
        let db = Database::open_in_memory().unwrap();
        let a = register_user(&db, &form("a", "same")).unwrap().unwrap();
        let b = register_user(&db, &form("b", "same")).unwrap().unwrap();

        let a = db.get_user_by_id(a).unwrap().unwrap().password;
        let b = db.get_user_by_id(b).unwrap().unwrap().password;
        assert_ne!(a, b);
    }

    #[test]
    fn authenticate_reports_username_first() {
        let db = Database::open_in_memory().unwrap();
        register_user(&db, &form("a", "a")).unwrap().unwrap();

        let login = |u: &str, p: &str| {
            authenticate(
                &db,
                &LoginForm {
                    username: u.into(),
                    password: p.into(),
                },
            )
            .unwrap()
        };

        assert_eq!(login("b", "wrong"), Err(ValidationError::BadUsername));
        assert_eq!(login("a", "wrong"), Err(ValidationError::BadPassword));
        assert_eq!(login("a", "a").unwrap().username, "a");
    }
}
