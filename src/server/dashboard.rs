use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};

use super::dto::{AdminDashboardView, IndexView, UserDashboardView};
use super::response::{ApiError, ApiResponse, StoreResultExt};
use super::router::AppState;
use crate::auth::{CurrentUser, RequireAdmin, RequireAuth};
use crate::service::standings::{all_team_statistics, compute_standings};
use crate::types::User;

pub fn dashboard_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/dashboard", get(dashboard))
        .route("/admin/dashboard", get(admin_dashboard))
        .route("/user/dashboard", get(user_dashboard))
}

fn dashboard_for(user: &User) -> Redirect {
    if user.is_admin() {
        Redirect::to("/admin/dashboard")
    } else {
        Redirect::to("/user/dashboard")
    }
}

async fn index(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    if let Some(user) = user {
        return Ok(dashboard_for(&user).into_response());
    }

    let teams = state.store.list_teams().api_err("Failed to list teams")?;
    let scores = state.store.list_scores().api_err("Failed to list scores")?;
    let activities = state
        .store
        .list_activities()
        .api_err("Failed to list activities")?;

    let view = IndexView {
        standings: compute_standings(&teams, &scores),
        activities,
        scores,
    };
    Ok(Json(ApiResponse::success(view)).into_response())
}

async fn dashboard(RequireAuth(user): RequireAuth) -> Redirect {
    dashboard_for(&user)
}

async fn admin_dashboard(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let teams = state.store.list_teams().api_err("Failed to list teams")?;
    let scores = state.store.list_scores().api_err("Failed to list scores")?;
    let activities = state
        .store
        .list_activities()
        .api_err("Failed to list activities")?;
    let users = state.store.list_users().api_err("Failed to list users")?;

    let view = AdminDashboardView {
        team_stats: all_team_statistics(&teams, &scores),
        activities,
        users,
        teams,
    };
    Ok(Json(ApiResponse::success(view)))
}

async fn user_dashboard(
    RequireAuth(user): RequireAuth,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let teams = state.store.list_teams().api_err("Failed to list teams")?;
    let scores = state.store.list_scores().api_err("Failed to list scores")?;
    let activities = state
        .store
        .list_activities()
        .api_err("Failed to list activities")?;
    let my_scores = state
        .store
        .list_user_scores(user.id)
        .api_err("Failed to list scores")?;

    let view = UserDashboardView {
        standings: compute_standings(&teams, &scores),
        activities,
        my_scores,
    };
    Ok(Json(ApiResponse::success(view)))
}
