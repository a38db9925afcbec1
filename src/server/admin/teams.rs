use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
    response::IntoResponse,
};
use bytes::Bytes;

use crate::auth::RequireAdmin;
use crate::server::dto::TeamsFormResponse;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::router::AppState;
use crate::service::teams::{self, ImageUpload};

/// Fields of the team form. Empty file inputs are dropped.
#[derive(Default)]
struct TeamForm {
    name: Option<String>,
    image: Option<ImageUpload>,
    csv_file: Option<(String, Bytes)>,
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(e.body_text())
    } else {
        ApiError::bad_request(e.body_text())
    }
}

async fn read_team_form(mut multipart: Multipart) -> Result<TeamForm, ApiError> {
    let mut form = TeamForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => form.name = Some(field.text().await.map_err(multipart_error)?),
            "image" | "csv_file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                if filename.is_empty() {
                    continue;
                }
                if field_name == "image" {
                    form.image = Some(ImageUpload { filename, data });
                } else {
                    form.csv_file = Some((filename, data));
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

pub async fn list_teams(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let teams = state.store.list_teams().api_err("Failed to list teams")?;
    Ok(Json(ApiResponse::success(teams)))
}

/// A CSV upload takes precedence over the single-team fields.
pub async fn create_teams(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_team_form(multipart).await?;

    if let Some((filename, data)) = form.csv_file {
        let summary = teams::bulk_import_teams(state.store.as_ref(), &filename, &data)?;
        return Ok((
            StatusCode::OK,
            Json(ApiResponse::success(TeamsFormResponse::Import(summary))),
        ));
    }

    let name = form.name.filter(|n| !n.trim().is_empty()).ok_or_else(|| {
        ApiError::bad_request("Provide a team name or upload a CSV file")
    })?;

    let team = teams::create_team(
        state.store.as_ref(),
        &state.images,
        &name,
        form.image.as_ref(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(TeamsFormResponse::Team(team))),
    ))
}

pub async fn get_team(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let team = state
        .store
        .get_team(id)
        .api_err("Failed to get team")?
        .or_not_found("Team not found")?;

    Ok(Json(ApiResponse::success(team)))
}

pub async fn edit_team(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_team_form(multipart).await?;
    let name = form.name.unwrap_or_default();

    let team = teams::edit_team(
        state.store.as_ref(),
        &state.images,
        id,
        &name,
        form.image.as_ref(),
    )
    .await?;

    Ok(Json(ApiResponse::success(team)))
}

pub async fn delete_team(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let team = teams::delete_team(state.store.as_ref(), &state.images, id).await?;
    Ok(Json(ApiResponse::success(team)))
}
