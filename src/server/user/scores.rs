use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAuth;
use crate::server::dto::{EditScoreView, ScoreRequest, ScoresView};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::router::AppState;
use crate::service::scores::{self, ScoreRules};
use crate::service::standings::compute_standings;
use crate::types::{Activity, User};

fn rules(state: &AppState) -> ScoreRules {
    ScoreRules {
        enforce_max_score: state.config.enforce_max_score,
    }
}

/// Activities the user may score: just the bound one for locked users.
fn selectable_activities(state: &AppState, user: &User) -> Result<Vec<Activity>, ApiError> {
    let activities = state
        .store
        .list_activities()
        .api_err("Failed to list activities")?;

    Ok(match user.locked_activity() {
        Some(bound) => activities.into_iter().filter(|a| a.id == bound).collect(),
        None => activities,
    })
}

pub async fn list_scores(
    RequireAuth(user): RequireAuth,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let teams = state.store.list_teams().api_err("Failed to list teams")?;
    let scores = state.store.list_scores().api_err("Failed to list scores")?;

    let view = ScoresView {
        standings: compute_standings(&teams, &scores),
        activities: selectable_activities(&state, &user)?,
        scores,
        teams,
    };
    Ok(Json(ApiResponse::success(view)))
}

pub async fn submit_score(
    RequireAuth(user): RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScoreRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let score = scores::submit_score(state.store.as_ref(), &user, &req.into(), rules(&state))?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(score))))
}

pub async fn get_score(
    RequireAuth(user): RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let score = scores::owned_score(state.store.as_ref(), &user, id)?;
    let teams = state.store.list_teams().api_err("Failed to list teams")?;

    let view = EditScoreView {
        score,
        teams,
        activities: selectable_activities(&state, &user)?,
    };
    Ok(Json(ApiResponse::success(view)))
}

pub async fn edit_score(
    RequireAuth(user): RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<ScoreRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let score = scores::edit_score(state.store.as_ref(), &user, id, &req.into(), rules(&state))?;
    Ok(Json(ApiResponse::success(score)))
}

pub async fn delete_score(
    RequireAuth(user): RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let score = scores::delete_score(state.store.as_ref(), &user, id)?;
    Ok(Json(ApiResponse::success(score)))
}
