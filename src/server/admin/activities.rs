use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::server::dto::{ActivitiesForm, ActivitiesFormResponse, ActivitiesView, ActivityRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::router::{AppState, blocking};
use crate::service::accounts::{self, ActivityUser};
use crate::service::activities;

pub async fn list_activities(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let activities = state
        .store
        .list_activities()
        .api_err("Failed to list activities")?;
    let users = state.store.list_users().api_err("Failed to list users")?;

    Ok(Json(ApiResponse::success(ActivitiesView { activities, users })))
}

/// Handles both the activity form and the quick user form.
pub async fn submit_activities_form(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(form): Json<ActivitiesForm>,
) -> Result<impl IntoResponse, ApiError> {
    let created = match form {
        ActivitiesForm::Activity(req) => {
            let activity = activities::create_activity(state.store.as_ref(), &req.into())?;
            ActivitiesFormResponse::Activity(activity)
        }
        ActivitiesForm::User(req) => {
            let user = blocking(&state, move |state| {
                accounts::create_activity_user(
                    state.store.as_ref(),
                    &state.passwords,
                    &ActivityUser {
                        username: &req.username,
                        email: &req.email,
                        password: &req.password,
                        activity_id: req.activity_id,
                    },
                )
            })
            .await?;
            ActivitiesFormResponse::User(user)
        }
    };

    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

pub async fn get_activity(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let activity = state
        .store
        .get_activity(id)
        .api_err("Failed to get activity")?
        .or_not_found("Activity not found")?;

    Ok(Json(ApiResponse::success(activity)))
}

pub async fn edit_activity(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<ActivityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let activity = activities::edit_activity(state.store.as_ref(), id, &req.into())?;
    Ok(Json(ApiResponse::success(activity)))
}

pub async fn delete_activity(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let activity = activities::delete_activity(state.store.as_ref(), id)?;
    Ok(Json(ApiResponse::success(activity)))
}
