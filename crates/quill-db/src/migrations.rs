use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS user (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        username    TEXT NOT NULL UNIQUE,
        password    TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS post (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        author_id   INTEGER NOT NULL REFERENCES user(id),
        created     TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        title       TEXT NOT NULL,
        body        TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_post_created
        ON post(created);

    -- No foreign key on user_id: a session may outlive its user.
    CREATE TABLE IF NOT EXISTS session (
        id          TEXT PRIMARY KEY,
        user_id     INTEGER,
        created     TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
";

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    info!("Database migrations complete");
    Ok(())
}

pub fn reset(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        DROP TABLE IF EXISTS session;
        DROP TABLE IF EXISTS post;
        DROP TABLE IF EXISTS user;
        ",
    )?;
    conn.execute_batch(SCHEMA)?;

    info!("Database schema reset");
    Ok(())
}
