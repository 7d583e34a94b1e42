use axum::{extract::State, Json};
use serde::Serialize;

use crate::auth::registry::AuthSession;
use crate::errors::AppError;
use crate::export::reports::{career_report, history_file_name, history_report, CAREER_REPORT_FILE};
use crate::export::Attachment;
use crate::history::ledger::{clear_history, most_recent_first, HistoryEntry};
use crate::state::AppState;
use crate::tasks::run_blocking;

#[derive(Serialize)]
pub struct HistoryResponse {
    /// Most recent first.
    pub entries: Vec<HistoryEntry>,
}

#[derive(Serialize)]
pub struct ClearResponse {
    pub cleared: bool,
    pub warnings: Vec<String>,
}

/// GET /api/v1/history
pub async fn handle_get_history(auth: AuthSession) -> Json<HistoryResponse> {
    let entries = most_recent_first(&auth.user.history)
        .into_iter()
        .cloned()
        .collect();
    Json(HistoryResponse { entries })
}

/// DELETE /api/v1/history
pub async fn handle_clear_history(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<ClearResponse>, AppError> {
    let store = state.store.clone();
    let username = auth.user.username.clone();
    let cleared = run_blocking(move || clear_history(&store, &username)).await?;
    state
        .sessions
        .with_user(auth.token, |u| u.history.clear())
        .await;
    Ok(Json(ClearResponse {
        cleared: true,
        warnings: cleared.warning.into_iter().collect(),
    }))
}

/// GET /api/v1/history/export
pub async fn handle_export_history(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Attachment, AppError> {
    let renderer = state.renderer.clone();
    let attachment = run_blocking(move || {
        Attachment::render(
            renderer.as_ref(),
            &history_report(&auth.user.history),
            history_file_name(&auth.user.username),
        )
    })
    .await??;
    Ok(attachment)
}

/// GET /api/v1/history/latest/export
pub async fn handle_export_latest(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Attachment, AppError> {
    let latest = auth
        .user
        .history
        .last()
        .cloned()
        .ok_or_else(|| AppError::NotFound("No recommendations yet".to_string()))?;
    let renderer = state.renderer.clone();
    let attachment = run_blocking(move || {
        Attachment::render(renderer.as_ref(), &career_report(&latest), CAREER_REPORT_FILE)
    })
    .await??;
    Ok(attachment)
}
