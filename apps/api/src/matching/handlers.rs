use axum::{extract::State, Json};
use serde::Serialize;

use crate::auth::registry::AuthSession;
use crate::auth::session::UserContext;
use crate::errors::AppError;
use crate::export::reports::{matches_file_name, matches_report};
use crate::export::Attachment;
use crate::matching::engine::{find_matches, MatchResult};
use crate::profile::manager::all_profiles;
use crate::profile::pictures::picture_locator;
use crate::state::AppState;
use crate::store::RecordStore;
use crate::tasks::run_blocking;

/// Matches shown on screen.
pub const DISPLAY_LIMIT: usize = 5;
/// Matches included in the exported report.
pub const EXPORT_LIMIT: usize = 10;

#[derive(Serialize)]
pub struct MatchView {
    #[serde(flatten)]
    pub result: MatchResult,
    pub picture: String,
}

#[derive(Serialize)]
pub struct MatchesResponse {
    /// Number of peers with a positive score, before truncation.
    pub total: usize,
    pub matches: Vec<MatchView>,
}

fn ranked(store: &RecordStore, user: &UserContext) -> Vec<MatchResult> {
    find_matches(&user.username, &user.profile, &all_profiles(store))
}

/// GET /api/v1/matches
pub async fn handle_get_matches(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<MatchesResponse>, AppError> {
    let store = state.store.clone();
    let default_picture = state.config.default_profile_pic.clone();
    let response = run_blocking(move || {
        let all = ranked(&store, &auth.user);
        let total = all.len();
        let matches = all
            .into_iter()
            .take(DISPLAY_LIMIT)
            .map(|result| MatchView {
                picture: picture_locator(&store, &result.candidate_username)
                    .unwrap_or_else(|| default_picture.clone()),
                result,
            })
            .collect();
        MatchesResponse { total, matches }
    })
    .await?;
    Ok(Json(response))
}

/// GET /api/v1/matches/export
pub async fn handle_export_matches(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Attachment, AppError> {
    let store = state.store.clone();
    let renderer = state.renderer.clone();
    let attachment = run_blocking(move || {
        let mut top = ranked(&store, &auth.user);
        top.truncate(EXPORT_LIMIT);
        Attachment::render(
            renderer.as_ref(),
            &matches_report(&top),
            matches_file_name(&auth.user.username),
        )
    })
    .await??;
    Ok(attachment)
}
