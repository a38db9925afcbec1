use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::types::Session;

pub const SESSION_COOKIE: &str = "scoresheet_session";

const TOKEN_PREFIX: &str = "ss";
const SECRET_BYTES: usize = 32;

/// A freshly issued session: the row to persist and the raw cookie value.
/// The raw token is never stored.
pub struct IssuedSession {
    pub session: Session,
    pub token: String,
}

/// Issues a new session for `user_id`. `ttl_hours` of `None`, or one too large
/// to represent as a timestamp, means the session lives until logout.
#[must_use]
pub fn issue_session(user_id: i64, ttl_hours: Option<i64>) -> IssuedSession {
    let token = generate_token();
    let now = Utc::now();

    IssuedSession {
        session: Session {
            id: Uuid::new_v4().to_string(),
            token_hash: hash_token(&token),
            user_id,
            created_at: now,
            expires_at: ttl_hours
                .and_then(Duration::try_hours)
                .and_then(|ttl| now.checked_add_signed(ttl)),
        },
        token,
    }
}

/// Generates the raw token with the format: ss_<64 hex chars>
#[must_use]
fn generate_token() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::thread_rng().fill(&mut bytes);
    format!("{TOKEN_PREFIX}_{}", hex::encode(bytes))
}

/// Sessions are looked up by the SHA-256 of the raw token.
#[must_use]
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Cheap shape check before touching the database.
#[must_use]
pub fn is_well_formed(token: &str) -> bool {
    token
        .strip_prefix(TOKEN_PREFIX)
        .and_then(|rest| rest.strip_prefix('_'))
        .is_some_and(|secret| {
            secret.len() == SECRET_BYTES * 2 && secret.chars().all(|c| c.is_ascii_hexdigit())
        })
}

#[must_use]
pub fn is_expired(session: &Session, now: DateTime<Utc>) -> bool {
    session.expires_at.is_some_and(|at| at <= now)
}
