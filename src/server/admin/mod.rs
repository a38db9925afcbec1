mod activities;
mod scores;
mod teams;
mod users;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        // Team routes
        .route("/teams", get(teams::list_teams).post(teams::create_teams))
        .route("/teams/{id}/edit", get(teams::get_team).post(teams::edit_team))
        .route("/teams/{id}/delete", get(teams::delete_team))
        // Activity routes, including quick user creation
        .route(
            "/activities",
            get(activities::list_activities).post(activities::submit_activities_form),
        )
        .route(
            "/activities/{id}/edit",
            get(activities::get_activity).post(activities::edit_activity),
        )
        .route("/activities/{id}/delete", get(activities::delete_activity))
        // User routes
        .route("/admin/users", get(users::list_users))
        .route("/admin/users/{id}/toggle_role", get(users::toggle_role))
        .route("/admin/users/{id}/delete", get(users::delete_user))
        // Score routes
        .route("/admin/reset-scores", post(scores::reset_scores))
}
