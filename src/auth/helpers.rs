use chrono::Utc;

use super::session::{hash_token, is_expired, is_well_formed};
use crate::error::Result;
use crate::store::Store;
use crate::types::User;

/// Resolves a raw session token to its user.
/// Returns None for malformed, unknown or expired tokens, and for sessions
/// whose user no longer exists. Expired sessions are deleted on sight.
pub fn resolve_session(store: &dyn Store, raw_token: &str) -> Result<Option<User>> {
    if !is_well_formed(raw_token) {
        return Ok(None);
    }

    let token_hash = hash_token(raw_token);
    let Some(session) = store.get_session_by_hash(&token_hash)? else {
        return Ok(None);
    };

    if is_expired(&session, Utc::now()) {
        if let Err(e) = store.delete_session_by_hash(&token_hash) {
            tracing::warn!("Failed to delete expired session: {e}");
        }
        return Ok(None);
    }

    store.get_user(session.user_id)
}
