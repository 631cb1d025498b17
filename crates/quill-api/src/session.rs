use anyhow::Result;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use quill_db::Database;

pub const SESSION_COOKIE: &str = "session";

/// Signed payload of the session cookie. It only names a server-side
/// session row; the user id lives in the store so that logout can revoke it.
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sid: Uuid,
    exp: usize,
}

/// Issues, resolves and revokes sessions. The cookie carries a signed
/// token, the `session` table carries the identity claim.
pub struct SessionManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: chrono::Duration,
}

impl SessionManager {
    pub fn new(secret: &str, lifetime: chrono::Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        }
    }

    /// Session id from a cookie whose signature and expiry check out.
    /// Anything else reads as "no session".
    pub fn session_id(&self, jar: &CookieJar) -> Option<Uuid> {
        let cookie = jar.get(SESSION_COOKIE)?;
        match decode::<SessionClaims>(cookie.value(), &self.decoding, &Validation::default()) {
            Ok(data) => Some(data.claims.sid),
            Err(e) => {
                debug!("Ignoring invalid session token: {}", e);
                None
            }
        }
    }

    /// The user id stored for the presented session, if any. Read-only.
    pub fn current_user_id(&self, db: &Database, jar: &CookieJar) -> Result<Option<i64>> {
        let Some(sid) = self.session_id(jar) else {
            return Ok(None);
        };
        Ok(db.get_session(&sid.to_string())?.and_then(|row| row.user_id))
    }

    /// Drop whatever session the client presented and bind a brand new one
    /// to `user_id`, so a token handed out before login never gains identity.
    pub fn login(&self, db: &Database, jar: CookieJar, user_id: i64) -> Result<CookieJar> {
        if let Some(old) = self.session_id(&jar) {
            db.delete_session(&old.to_string())?;
        }

        let sid = Uuid::new_v4();
        let token = self.issue(sid)?;
        db.insert_session(&sid.to_string(), Some(user_id))?;

        Ok(jar.add(
            Cookie::build((SESSION_COOKIE, token))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax),
        ))
    }

    /// Revoke the presented session and tell the client to forget the cookie.
    pub fn logout(&self, db: &Database, jar: CookieJar) -> Result<CookieJar> {
        if let Some(sid) = self.session_id(&jar) {
            db.delete_session(&sid.to_string())?;
        }
        Ok(jar.remove(Cookie::build(SESSION_COOKIE).path("/")))
    }

    fn issue(&self, sid: Uuid) -> Result<String> {
        let expires = chrono::Utc::now()
            .checked_add_signed(self.lifetime)
            .ok_or_else(|| anyhow::anyhow!("session lifetime {} overflows the clock", self.lifetime))?;
        let claims = SessionClaims {
            sid,
            exp: expires.timestamp().max(0) as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok(token)
    }
}
