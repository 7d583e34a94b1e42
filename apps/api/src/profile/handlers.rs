use std::path::Path as FsPath;

use axum::{
    extract::{Multipart, Path, State},
    http::header::CONTENT_TYPE,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::warn;

use crate::auth::registry::AuthSession;
use crate::errors::AppError;
use crate::profile::manager::{update_profile, ProfileInput};
use crate::profile::models::Profile;
use crate::profile::pictures::{resolve_picture_path, store_upload};
use crate::state::AppState;
use crate::tasks::run_blocking;

const PICTURE_FIELD: &str = "file";

#[derive(Serialize)]
pub struct ProfileResponse {
    pub username: String,
    pub profile: Profile,
    pub picture: String,
    pub warnings: Vec<String>,
}

#[derive(Serialize)]
pub struct PictureResponse {
    pub picture: String,
    pub warnings: Vec<String>,
}

/// GET /api/v1/profile
pub async fn handle_get_profile(auth: AuthSession) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        username: auth.user.username,
        profile: auth.user.profile,
        picture: auth.user.picture,
        warnings: Vec::new(),
    })
}

/// PUT /api/v1/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    auth: AuthSession,
    Json(input): Json<ProfileInput>,
) -> Result<Json<ProfileResponse>, AppError> {
    let store = state.store.clone();
    let username = auth.user.username.clone();
    let saved = run_blocking(move || update_profile(&store, &username, &input)).await??;

    let profile = saved.value.clone();
    state
        .sessions
        .with_user(auth.token, |u| u.profile = profile)
        .await;

    Ok(Json(ProfileResponse {
        username: auth.user.username,
        profile: saved.value,
        picture: auth.user.picture,
        warnings: saved.warning.into_iter().collect(),
    }))
}

/// POST /api/v1/profile/picture
pub async fn handle_upload_picture(
    State(state): State<AppState>,
    auth: AuthSession,
    mut multipart: Multipart,
) -> Result<Json<PictureResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        if field.name() != Some(PICTURE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes: Bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let store = state.store.clone();
        let uploads_dir = state.config.uploads_dir.clone();
        let username = auth.user.username.clone();
        let stored = run_blocking(move || {
            store_upload(
                &store,
                &uploads_dir,
                &username,
                file_name.as_deref(),
                content_type.as_deref(),
                &bytes,
            )
        })
        .await??;

        let picture = stored.value.clone();
        state
            .sessions
            .with_user(auth.token, |u| u.picture = picture)
            .await;

        return Ok(Json(PictureResponse {
            picture: stored.value,
            warnings: stored.warning.into_iter().collect(),
        }));
    }

    Err(AppError::Validation(format!(
        "Missing multipart field '{PICTURE_FIELD}'"
    )))
}

/// GET /api/v1/users/:username/picture
pub async fn handle_get_picture(
    State(state): State<AppState>,
    _auth: AuthSession,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.clone();
    let default_picture = state.config.default_profile_pic.clone();
    let lookup = username.clone();
    let path = run_blocking(move || resolve_picture_path(&store, &lookup, &default_picture))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No picture for {username}")))?;

    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        warn!("Could not read picture {}: {e}", path.display());
        AppError::NotFound(format!("No picture for {username}"))
    })?;

    Ok(([(CONTENT_TYPE, image_content_type(&path))], bytes))
}

fn image_content_type(path: &FsPath) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "image/png",
    }
}
