//! In-process test harness: an in-memory database seeded with two users
//! and one post, and helpers to drive the router with session cookies.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use quill_api::password::hash_password;
use quill_api::{AppState, AppStateInner};
use quill_db::Database;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

/// Users `test`/`test` (id 1) and `other`/`other` (id 2); post 1
/// "test title" by `test`, created 2018-01-01.
pub fn app() -> TestApp {
    let db = Database::open_in_memory().unwrap();
    db.create_user("test", &hash_password("test").unwrap()).unwrap();
    db.create_user("other", &hash_password("other").unwrap()).unwrap();
    db.create_post("test title", "test\nbody", 1).unwrap();
    db.with_conn_mut(|conn| {
        conn.execute("UPDATE post SET created = '2018-01-01 00:00:00' WHERE id = 1", [])?;
        Ok(())
    })
    .unwrap();

    let state = AppStateInner::new(db, "test-secret", chrono::Duration::days(1));
    TestApp {
        router: quill_api::router(state.clone()),
        state,
    }
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Response<Body> {
        let mut req = Request::builder().uri(path);
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        self.send(req.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, path: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut req = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        self.send(req.body(Body::from(form.to_string())).unwrap()).await
    }

    /// POST with no body at all, as a bare form submit button would.
    pub async fn post_empty(&self, path: &str, cookie: Option<&str>) -> Response<Body> {
        let mut req = Request::builder().method("POST").uri(path);
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        self.send(req.body(Body::empty()).unwrap()).await
    }

    /// Log in and return the `Cookie` header value for the new session.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let resp = self
            .post_form("/auth/login", &format!("username={username}&password={password}"), None)
            .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        session_cookie(&resp).expect("login sets a session cookie")
    }
}

/// `session=<token>` from the response's Set-Cookie headers.
pub fn session_cookie(resp: &Response<Body>) -> Option<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn location(resp: &Response<Body>) -> &str {
    resp.headers()[header::LOCATION].to_str().unwrap()
}

pub async fn body_string(resp: Response<Body>) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
