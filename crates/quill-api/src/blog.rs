use axum::{
    Extension, Form,
    extract::{
        Path, State,
        rejection::{FormRejection, PathRejection},
    },
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::{error, info, warn};

use quill_db::Database;
use quill_types::forms::PostForm;
use quill_types::models::{Post, User};

use crate::auth::AppState;
use crate::error::{AppError, ValidationError};
use crate::guard::{self, AccessDenied};
use crate::middleware::RequestIdentity;
use crate::views;

pub async fn index(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
) -> Result<Html<String>, AppError> {
    // Run the listing query off the async runtime
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_posts())
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            anyhow::anyhow!("listing posts panicked")
        })??;

    let posts: Vec<Post> = rows.into_iter().map(Post::from).collect();
    Ok(views::index(&identity, &posts))
}

pub async fn create_page(Extension(identity): Extension<RequestIdentity>) -> Html<String> {
    views::create(&identity, "", "", None)
}

/// Runs behind `require_login`; the guard is repeated to get at the user.
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Form(form): Form<PostForm>,
) -> Result<Response, AppError> {
    let user = guard::require_user(&identity)?;

    if form.title.is_empty() {
        let e = ValidationError::MissingTitle;
        return Ok(views::create(&identity, &form.title, &form.body, Some(&e)).into_response());
    }

    let id = state.db.create_post(&form.title, &form.body, user.id)?;
    info!("{} created post {}", user.username, id);
    Ok(Redirect::to("/").into_response())
}

pub async fn update_page(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    Extension(identity): Extension<RequestIdentity>,
) -> Result<Html<String>, AppError> {
    let id = post_id(id)?;
    let (_, post) = authorize(&state, &identity, id)?;
    Ok(views::update(&identity, &post, &post.title, &post.body, None))
}

/// The body is only looked at once every guard has passed.
pub async fn update(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    Extension(identity): Extension<RequestIdentity>,
    form: Result<Form<PostForm>, FormRejection>,
) -> Result<Response, AppError> {
    let id = post_id(id)?;
    let (user, post) = authorize(&state, &identity, id)?;
    let Form(form) = form.map_err(|e| AppError::BadRequest(e.body_text()))?;

    if form.title.is_empty() {
        let e = ValidationError::MissingTitle;
        return Ok(views::update(&identity, &post, &form.title, &form.body, Some(&e)).into_response());
    }

    update_existing(&state.db, id, &form)?;
    info!("{} updated post {}", user.username, id);
    Ok(Redirect::to("/").into_response())
}

pub async fn delete(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    Extension(identity): Extension<RequestIdentity>,
) -> Result<Redirect, AppError> {
    let id = post_id(id)?;
    let (user, _) = authorize(&state, &identity, id)?;

    delete_existing(&state.db, id)?;
    info!("{} deleted post {}", user.username, id);
    Ok(Redirect::to("/"))
}

/// Ids that are not integers cannot name a post.
fn post_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    path.map(|Path(id)| id).map_err(|_| AppError::PageNotFound)
}

// The guards ran before these writes; a post deleted in between is still a 404.

fn update_existing(db: &Database, id: i64, form: &PostForm) -> Result<(), AppError> {
    if !db.update_post(id, &form.title, &form.body)? {
        return Err(AccessDenied::NotFound(id).into());
    }
    Ok(())
}

fn delete_existing(db: &Database, id: i64) -> Result<(), AppError> {
    if !db.delete_post(id)? {
        return Err(AccessDenied::NotFound(id).into());
    }
    Ok(())
}

fn authorize<'a>(state: &AppState, identity: &'a RequestIdentity, id: i64) -> Result<(&'a User, Post), AppError> {
    let post = state.db.get_post(id)?.map(Post::from);

    guard::authorize_post_mutation(identity, id, post).map_err(|denied| {
        if denied == AccessDenied::Forbidden {
            if let Some(user) = identity.user() {
                warn!("{} ({}) tried to modify post {} of another author", user.username, user.id, id);
            }
        }
        denied.into()
    })
}
