use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A registered account. The password hash never leaves the store layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub body: String,
    /// SQLite `CURRENT_TIMESTAMP`, always UTC.
    pub created: NaiveDateTime,
    pub author_id: i64,
    pub author_username: String,
}

impl Post {
    pub fn is_authored_by(&self, user: &User) -> bool {
        self.author_id == user.id
    }
}
