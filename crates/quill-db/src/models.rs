//! Database row types: these map directly to SQLite rows.
//! Distinct from quill-types models to keep the password hash inside the store layer.

use chrono::NaiveDateTime;
use tracing::warn;

use quill_types::models::{Post, User};

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
}

pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub created: String,
    pub author_id: i64,
    pub author_username: String,
}

pub struct SessionRow {
    pub id: String,
    pub user_id: Option<i64>,
    pub created: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
        }
    }
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
        let created = NaiveDateTime::parse_from_str(&row.created, "%Y-%m-%d %H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(&row.created, "%Y-%m-%d %H:%M:%S%.f"))
            .unwrap_or_else(|e| {
                warn!("Corrupt created '{}' on post {}: {}", row.created, row.id, e);
                NaiveDateTime::default()
            });

        Post {
            id: row.id,
            title: row.title,
            body: row.body,
            created,
            author_id: row.author_id,
            author_username: row.author_username,
        }
    }
}
