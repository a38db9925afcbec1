use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::auth::RequireAdmin;
use crate::server::dto::ResetScoresResponse;
use crate::server::response::{ApiError, ApiResponse};
use crate::server::router::AppState;
use crate::service::scores;

pub async fn reset_scores(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = scores::reset_scores(state.store.as_ref())?;
    tracing::info!("Scores reset by '{}'", admin.username);
    Ok(Json(ApiResponse::success(ResetScoresResponse { deleted })))
}
