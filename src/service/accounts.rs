use super::validation::{validate_email, validate_password, validate_username};
use crate::auth::{IssuedSession, Passwords, hash_token, issue_session, policy};
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{NewUser, Role, User};

pub struct Registration<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
}

/// Fields of the admin "quick user" form.
pub struct ActivityUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub activity_id: i64,
}

/// Validates credentials and uniqueness, then stores the new user.
fn create_account(
    store: &dyn Store,
    passwords: &Passwords,
    username: &str,
    email: &str,
    password: &str,
    role: Role,
    activity_id: Option<i64>,
) -> Result<User> {
    let username = validate_username(username)?;
    let email = validate_email(email)?;
    validate_password(password)?;

    if store.get_user_by_username(&username)?.is_some() {
        return Err(Error::DuplicateUsername);
    }
    if store.get_user_by_email(&email)?.is_some() {
        return Err(Error::DuplicateEmail);
    }

    let user = store.create_user(&NewUser {
        username,
        email,
        password_hash: passwords.hash(password)?,
        role,
        activity_id,
    })?;

    tracing::info!("Created {} account '{}'", user.role, user.username);
    Ok(user)
}

pub fn register(store: &dyn Store, passwords: &Passwords, form: &Registration<'_>) -> Result<User> {
    validate_username(form.username)?;
    validate_email(form.email)?;
    validate_password(form.password)?;

    if form.password != form.confirm_password {
        return Err(Error::PasswordMismatch);
    }

    create_account(
        store,
        passwords,
        form.username,
        form.email,
        form.password,
        Role::User,
        None,
    )
}

/// Creates a user locked to one activity.
pub fn create_activity_user(
    store: &dyn Store,
    passwords: &Passwords,
    form: &ActivityUser<'_>,
) -> Result<User> {
    if store.get_activity(form.activity_id)?.is_none() {
        return Err(Error::Validation("Not a valid activity".to_string()));
    }

    create_account(
        store,
        passwords,
        form.username,
        form.email,
        form.password,
        Role::User,
        Some(form.activity_id),
    )
}

/// Creates an admin account. Used when bootstrapping a fresh install.
pub fn create_admin(
    store: &dyn Store,
    passwords: &Passwords,
    username: &str,
    email: &str,
    password: &str,
) -> Result<User> {
    create_account(store, passwords, username, email, password, Role::Admin, None)
}

/// Checks credentials and opens a session.
pub fn login(
    store: &dyn Store,
    passwords: &Passwords,
    username: &str,
    password: &str,
    ttl_hours: Option<i64>,
) -> Result<(User, IssuedSession)> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(Error::Validation(
            "Username and password are required".to_string(),
        ));
    }

    let user = store
        .get_user_by_username(username.trim())?
        .ok_or(Error::InvalidCredentials)?;

    if !passwords.verify(password, &user.password_hash)? {
        return Err(Error::InvalidCredentials);
    }

    let issued = issue_session(user.id, ttl_hours);
    store.create_session(&issued.session)?;

    if let Err(e) = store.delete_expired_sessions() {
        tracing::warn!("Failed to purge expired sessions: {e}");
    }

    tracing::info!("User '{}' logged in", user.username);
    Ok((user, issued))
}

/// Ends a session. Unknown tokens are ignored.
pub fn logout(store: &dyn Store, raw_token: &str) -> Result<()> {
    store.delete_session_by_hash(&hash_token(raw_token))?;
    Ok(())
}

/// Flips a user between admin and user. Admins cannot change their own role.
pub fn toggle_role(store: &dyn Store, actor: &User, target_id: i64) -> Result<User> {
    let mut target = store.get_user(target_id)?.ok_or(Error::NotFound)?;
    policy::require_not_self(actor, target.id)?;

    target.role = target.role.toggled();
    store.update_user_role(target.id, target.role)?;

    tracing::info!("User '{}' role changed to {}", target.username, target.role);
    Ok(target)
}

/// Deletes a user account. Admins cannot delete themselves.
pub fn delete_user(store: &dyn Store, actor: &User, target_id: i64) -> Result<User> {
    let target = store.get_user(target_id)?.ok_or(Error::NotFound)?;
    policy::require_not_self(actor, target.id)?;

    store.delete_user(target.id)?;

    tracing::info!("User '{}' deleted", target.username);
    Ok(target)
}
