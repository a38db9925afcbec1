//! Authorization rules. Callers authenticate first; these checks only decide
//! whether an already-known user may perform an action.

use crate::error::{Error, Result};
use crate::types::{Score, User};

pub fn require_admin(user: Option<&User>) -> Result<&User> {
    match user {
        Some(user) if user.is_admin() => Ok(user),
        _ => Err(Error::Forbidden),
    }
}

pub fn require_owner_or_admin(user: &User, score: &Score) -> Result<()> {
    if user.is_admin() || score.created_by == Some(user.id) {
        Ok(())
    } else {
        Err(Error::Forbidden)
    }
}

/// Admins may not change their own role or delete their own account.
pub fn require_not_self(actor: &User, target_id: i64) -> Result<()> {
    if actor.id == target_id {
        Err(Error::SelfModificationDenied)
    } else {
        Ok(())
    }
}

/// Resolves the activity a score is recorded against. A locked user always
/// gets their bound activity, whatever the request asked for.
#[must_use]
pub fn effective_activity(user: &User, requested: Option<i64>) -> Option<i64> {
    user.locked_activity().or(requested)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::types::Role;

    fn user(id: i64, role: Role, activity_id: Option<i64>) -> User {
        User {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            password_hash: String::new(),
            role,
            activity_id,
            created_at: Utc::now(),
        }
    }

    fn score_by(created_by: Option<i64>) -> Score {
        Score {
            id: 1,
            team_id: 1,
            activity_id: 1,
            score: 10,
            notes: None,
            created_by,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_require_admin() {
        let admin = user(1, Role::Admin, None);
        let judge = user(2, Role::User, None);

        assert!(require_admin(Some(&admin)).is_ok());
        assert!(matches!(require_admin(Some(&judge)), Err(Error::Forbidden)));
        assert!(matches!(require_admin(None), Err(Error::Forbidden)));
    }

    #[test]
    fn test_owner_or_admin() {
        let admin = user(1, Role::Admin, None);
        let owner = user(2, Role::User, None);
        let other = user(3, Role::User, None);
        let score = score_by(Some(2));

        assert!(require_owner_or_admin(&admin, &score).is_ok());
        assert!(require_owner_or_admin(&owner, &score).is_ok());
        assert!(matches!(
            require_owner_or_admin(&other, &score),
            Err(Error::Forbidden)
        ));
        // Orphaned scores belong to admins only.
        assert!(require_owner_or_admin(&owner, &score_by(None)).is_err());
    }

    #[test]
    fn test_require_not_self() {
        let admin = user(1, Role::Admin, None);
        assert!(matches!(
            require_not_self(&admin, 1),
            Err(Error::SelfModificationDenied)
        ));
        assert!(require_not_self(&admin, 2).is_ok());
    }

    #[test]
    fn test_effective_activity_overrides_locked_users() {
        let locked = user(2, Role::User, Some(7));
        let free = user(3, Role::User, None);
        let admin_with_activity = user(1, Role::Admin, Some(7));

        assert_eq!(effective_activity(&locked, Some(9)), Some(7));
        assert_eq!(effective_activity(&locked, None), Some(7));
        assert_eq!(effective_activity(&free, Some(9)), Some(9));
        assert_eq!(effective_activity(&admin_with_activity, Some(9)), Some(9));
    }
}
