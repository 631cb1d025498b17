use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState};
use crate::blog;
use crate::middleware::{load_identity, require_login};

/// Full application router. Every route sees a resolved `RequestIdentity`.
pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/auth/register", get(auth::register_page).post(auth::register))
        .route("/auth/login", get(auth::login_page).post(auth::login))
        .route("/auth/logout", get(auth::logout));

    let login_routes = Router::new()
        .route("/create", get(blog::create_page).post(blog::create))
        .route_layer(middleware::from_fn(require_login));

    // Update and delete check existence before login, so they sit outside require_login.
    let post_routes = Router::new()
        .route("/", get(blog::index))
        .route("/{id}/update", get(blog::update_page).post(blog::update))
        .route("/{id}/delete", post(blog::delete));

    Router::new()
        .route("/hello", get(hello))
        .merge(auth_routes)
        .merge(login_routes)
        .merge(post_routes)
        .layer(middleware::from_fn_with_state(state.clone(), load_identity))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn hello() -> &'static str {
    "Hello, World!"
}
