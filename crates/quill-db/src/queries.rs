use crate::models::{PostRow, SessionRow, UserRow};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, ErrorCode};

/// Returned (inside `anyhow::Error`) when an insert hits the unique
/// constraint on `user.username`.
#[derive(Debug, thiserror::Error)]
#[error("User {0} is already registered.")]
pub struct DuplicateUsername(pub String);

const POST_SELECT: &str = "SELECT p.id, p.title, p.body, p.created, p.author_id, u.username
     FROM post p
     LEFT JOIN user u ON p.author_id = u.id";

impl Database {
    // -- Users --

    /// Insert a user and return its id. Uniqueness is enforced by the
    /// schema, so two racing registrations cannot both succeed.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<i64> {
        self.with_conn_mut(|conn| {
            match conn.execute(
                "INSERT INTO user (username, password) VALUES (?1, ?2)",
                (username, password_hash),
            ) {
                Ok(_) => Ok(conn.last_insert_rowid()),
                Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                    Err(DuplicateUsername(username.to_string()).into())
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    // -- Posts --

    pub fn create_post(&self, title: &str, body: &str, author_id: i64) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO post (title, body, author_id) VALUES (?1, ?2, ?3)",
                rusqlite::params![title, body, author_id],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_post(&self, id: i64) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{POST_SELECT} WHERE p.id = ?1"))?;
            let row = stmt.query_row([id], map_post).optional()?;
            Ok(row)
        })
    }

    /// All posts, newest first.
    pub fn list_posts(&self) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{POST_SELECT} ORDER BY p.created DESC, p.id DESC"))?;
            let rows = stmt
                .query_map([], map_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_posts(&self) -> Result<i64> {
        self.with_conn(|conn| Ok(conn.query_row("SELECT COUNT(id) FROM post", [], |row| row.get(0))?))
    }

    /// Returns false when no post has this id.
    pub fn update_post(&self, id: i64, title: &str, body: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE post SET title = ?1, body = ?2 WHERE id = ?3",
                rusqlite::params![title, body, id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Returns false when no post has this id.
    pub fn delete_post(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM post WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    // -- Sessions --

    pub fn insert_session(&self, id: &str, user_id: Option<i64>) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO session (id, user_id) VALUES (?1, ?2)",
                rusqlite::params![id, user_id],
            )?;
            Ok(())
        })
    }

    pub fn get_session(&self, id: &str) -> Result<Option<SessionRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, user_id, created FROM session WHERE id = ?1",
                    [id],
                    |row| {
                        Ok(SessionRow {
                            id: row.get(0)?,
                            user_id: row.get(1)?,
                            created: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Returns false when the session was already gone.
    pub fn delete_session(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM session WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }
}

fn query_user<P: rusqlite::ToSql>(conn: &Connection, column: &str, value: P) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare(&format!("SELECT id, username, password FROM user WHERE {column} = ?1"))?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn map_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        created: row.get(3)?,
        author_id: row.get(4)?,
        author_username: row.get::<_, Option<String>>(5)?.unwrap_or_else(|| "unknown".to_string()),
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_types::models::Post;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn create_and_find_user() {
        let db = db();
        let id = db.create_user("alice", "hash").unwrap();

        let by_name = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(by_name.id, id);
        assert_eq!(by_name.password, "hash");

        let by_id = db.get_user_by_id(id).unwrap().unwrap();
        assert_eq!(by_id.username, "alice");

        assert!(db.get_user_by_username("Alice").unwrap().is_none());
        assert!(db.get_user_by_id(id + 1).unwrap().is_none());
    }

    #[test]
    fn duplicate_username_is_typed() {
        let db = db();
        db.create_user("alice", "one").unwrap();

        let err = db.create_user("alice", "two").unwrap_err();
        let dup = err.downcast_ref::<DuplicateUsername>().expect("typed duplicate error");
        assert_eq!(dup.0, "alice");

        // Matching is case-sensitive
        db.create_user("ALICE", "three").unwrap();
    }

    #[test]
    fn post_lifecycle() {
        let db = db();
        let author = db.create_user("alice", "hash").unwrap();

        let id = db.create_post("first", "", author).unwrap();
        assert_eq!(db.count_posts().unwrap(), 1);

        let post: Post = db.get_post(id).unwrap().unwrap().into();
        assert_eq!(post.title, "first");
        assert_eq!(post.author_id, author);
        assert_eq!(post.author_username, "alice");

        assert!(db.update_post(id, "renamed", "text").unwrap());
        let post = db.get_post(id).unwrap().unwrap();
        assert_eq!(post.title, "renamed");
        assert_eq!(post.body, "text");

        assert!(db.delete_post(id).unwrap());
        assert!(db.get_post(id).unwrap().is_none());
        assert!(!db.delete_post(id).unwrap());
        assert!(!db.update_post(id, "x", "y").unwrap());
    }

    #[test]
    fn posts_listed_newest_first() {
        let db = db();
        let author = db.create_user("alice", "hash").unwrap();
        db.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO post (title, body, author_id, created) VALUES ('old', '', ?1, '2018-01-01 00:00:00')",
                [author],
            )?;
            Ok(())
        })
        .unwrap();
        db.create_post("new", "", author).unwrap();

        let titles: Vec<String> = db.list_posts().unwrap().into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["new", "old"]);

        let old: Post = db.get_post(1).unwrap().unwrap().into();
        assert_eq!(old.created.format("%Y-%m-%d").to_string(), "2018-01-01");
    }

    #[test]
    fn session_rows() {
        let db = db();
        db.insert_session("s1", None).unwrap();
        db.insert_session("s2", Some(7)).unwrap();

        assert_eq!(db.get_session("s1").unwrap().unwrap().user_id, None);
        assert_eq!(db.get_session("s2").unwrap().unwrap().user_id, Some(7));

        assert!(db.delete_session("s2").unwrap());
        assert!(db.get_session("s2").unwrap().is_none());
        assert!(!db.delete_session("s2").unwrap());
    }

    #[test]
    fn reset_clears_everything() {
        let db = db();
        let author = db.create_user("alice", "hash").unwrap();
        db.create_post("first", "", author).unwrap();
        db.insert_session("s1", Some(author)).unwrap();

        db.reset().unwrap();

        assert!(db.get_user_by_username("alice").unwrap().is_none());
        assert_eq!(db.count_posts().unwrap(), 0);
        assert!(db.get_session("s1").unwrap().is_none());

        // Ids restart after a reset
        assert_eq!(db.create_user("bob", "hash").unwrap(), 1);
    }
}
