pub mod auth;
pub mod blog;
pub mod error;
pub mod guard;
pub mod middleware;
pub mod password;
pub mod routes;
pub mod session;
pub mod views;

pub use auth::{AppState, AppStateInner};
pub use routes::router;
