use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::router::AppState;
use crate::service::accounts;

pub async fn list_users(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let users = state.store.list_users().api_err("Failed to list users")?;
    Ok(Json(ApiResponse::success(users)))
}

pub async fn toggle_role(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let user = accounts::toggle_role(state.store.as_ref(), &admin, id)?;
    Ok(Json(ApiResponse::success(user)))
}

pub async fn delete_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let user = accounts::delete_user(state.store.as_ref(), &admin, id)?;
    Ok(Json(ApiResponse::success(user)))
}
