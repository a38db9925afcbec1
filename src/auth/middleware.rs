use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use serde_json::json;

use super::helpers::resolve_session;
use super::policy;
use super::session::SESSION_COOKIE;
use crate::server::AppState;
use crate::types::User;

/// The signed-in user, if any. Never rejects an anonymous request.
pub struct CurrentUser(pub Option<User>);

/// Extractor that requires a signed-in user
pub struct RequireAuth(pub User);

/// Extractor that requires a signed-in admin
pub struct RequireAdmin(pub User);

#[derive(Debug)]
pub enum AuthError {
    LoginRequired,
    NotAdmin,
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::LoginRequired => (
                StatusCode::UNAUTHORIZED,
                "Please log in to access this page.",
            ),
            AuthError::NotAdmin => (StatusCode::FORBIDDEN, "Admin access required"),
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = json!({ "data": null, "error": message });
        (status, Json(body)).into_response()
    }
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = current_user(parts, state)?;
        Ok(CurrentUser(user))
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = current_user(parts, state)?.ok_or(AuthError::LoginRequired)?;
        Ok(RequireAuth(user))
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        // Authentication before authorization: anonymous callers get 401, not 403.
        let user = current_user(parts, state)?.ok_or(AuthError::LoginRequired)?;

        policy::require_admin(Some(&user)).map_err(|_| AuthError::NotAdmin)?;

        Ok(RequireAdmin(user))
    }
}

fn current_user(parts: &Parts, state: &Arc<AppState>) -> Result<Option<User>, AuthError> {
    let jar = CookieJar::from_headers(&parts.headers);
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };

    resolve_session(state.store.as_ref(), cookie.value()).map_err(|e| {
        tracing::error!("Failed to resolve session: {e}");
        AuthError::InternalError
    })
}
