mod scores;

use std::sync::Arc;

use axum::{Router, routing::get};

use crate::server::AppState;

/// Routes open to any signed-in user. Ownership is checked per score.
pub fn user_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/scores", get(scores::list_scores).post(scores::submit_score))
        .route(
            "/scores/{id}/edit",
            get(scores::get_score).post(scores::edit_score),
        )
        .route("/scores/{id}/delete", get(scores::delete_score))
}
