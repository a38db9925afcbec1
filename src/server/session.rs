use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde_json::json;

use super::dto::{LoginRequest, LoginResponse, NextParams, RegisterRequest};
use super::response::{ApiError, ApiResponse};
use super::router::{AppState, blocking};
use crate::auth::{CurrentUser, SESSION_COOKIE};
use crate::service::accounts::{self, Registration};

pub fn session_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/register", get(register_page).post(register))
        .route("/logout", get(logout))
}

/// Only local paths are honoured as post-login targets.
fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\") => {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

async fn login_page(
    CurrentUser(user): CurrentUser,
    Query(params): Query<NextParams>,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    let next = safe_next(params.next.as_deref());
    Json(ApiResponse::success(json!({ "next": next }))).into_response()
}

async fn login(
    CurrentUser(current): CurrentUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<NextParams>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    if current.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let (user, issued) = blocking(&state, move |state| {
        accounts::login(
            state.store.as_ref(),
            &state.passwords,
            &req.username,
            &req.password,
            state.config.session_ttl_hours,
        )
    })
    .await?;

    let jar = jar.add(session_cookie(issued.token, state.config.secure_cookies));
    let body = LoginResponse {
        user,
        redirect: safe_next(params.next.as_deref()),
    };

    Ok((jar, Json(ApiResponse::success(body))).into_response())
}

async fn register_page(CurrentUser(user): CurrentUser) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    Json(ApiResponse::success(json!({}))).into_response()
}

async fn register(
    CurrentUser(current): CurrentUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    if current.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let user = blocking(&state, move |state| {
        accounts::register(
            state.store.as_ref(),
            &state.passwords,
            &Registration {
                username: &req.username,
                email: &req.email,
                password: &req.password,
                confirm_password: &req.confirm_password,
            },
        )
    })
    .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))).into_response())
}

/// Always clears the cookie, even when the session is already gone.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Err(e) = accounts::logout(state.store.as_ref(), cookie.value()) {
            tracing::warn!("Failed to delete session on logout: {e}");
        }
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/"))
}
