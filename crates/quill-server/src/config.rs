use std::path::PathBuf;

use anyhow::Context;

/// Signing key used when `QUILL_SECRET_KEY` is unset. Fine for local
/// development, never for a deployed instance.
pub const DEV_SECRET_KEY: &str = "dev";

/// Accepted range for `QUILL_SESSION_DAYS`.
pub const SESSION_DAYS: std::ops::RangeInclusive<i64> = 1..=3650;

#[derive(Debug, Clone)]
pub struct Config {
    pub secret_key: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub session_lifetime: chrono::Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let secret_key = std::env::var("QUILL_SECRET_KEY").unwrap_or_else(|_| DEV_SECRET_KEY.into());
        let db_path = std::env::var("QUILL_DB_PATH").unwrap_or_else(|_| "quill.sqlite".into());
        let host = std::env::var("QUILL_HOST").unwrap_or_else(|_| "127.0.0.1".into());
        let port: u16 = std::env::var("QUILL_PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .context("QUILL_PORT must be a port number")?;
        let session_lifetime = parse_session_days(
            &std::env::var("QUILL_SESSION_DAYS").unwrap_or_else(|_| "31".into()),
        )
        .context("invalid QUILL_SESSION_DAYS")?;

        Ok(Self {
            secret_key,
            db_path: db_path.into(),
            host,
            port,
            session_lifetime,
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.secret_key == DEV_SECRET_KEY
    }
}

fn parse_session_days(raw: &str) -> anyhow::Result<chrono::Duration> {
    let days: i64 = raw
        .trim()
        .parse()
        .with_context(|| format!("'{}' is not a whole number of days", raw))?;
    if !SESSION_DAYS.contains(&days) {
        anyhow::bail!(
            "{} days is outside {}..={}",
            days,
            SESSION_DAYS.start(),
            SESSION_DAYS.end()
        );
    }
    Ok(chrono::Duration::days(days))
}
