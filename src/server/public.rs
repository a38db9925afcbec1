use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
};

use super::response::{ApiError, StoreResultExt};
use super::router::AppState;
use crate::service::import::{SAMPLE_FILENAME, SAMPLE_TEAMS_CSV};
use crate::service::standings::load_leaderboard;

pub fn public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/leaderboard", get(leaderboard))
        .route("/download/sample-teams-csv", get(sample_teams_csv))
}

/// Bare array, no envelope: external scoreboards poll this.
async fn leaderboard(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let entries = load_leaderboard(state.store.as_ref()).api_err("Failed to load leaderboard")?;
    Ok(Json(entries))
}

async fn sample_teams_csv() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={SAMPLE_FILENAME}"),
            ),
        ],
        SAMPLE_TEAMS_CSV,
    )
}
