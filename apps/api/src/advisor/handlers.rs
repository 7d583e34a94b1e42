use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::advisor::prompts::profile_summary;
use crate::advisor::{is_placeholder, AdvisoryRequest};
use crate::auth::registry::AuthSession;
use crate::auth::session::{ChatTurn, UserContext};
use crate::errors::AppError;
use crate::history::ledger::{append_entry, HistoryEntry};
use crate::state::AppState;
use crate::tasks::run_blocking;

#[derive(Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub goal: String,
}

#[derive(Serialize)]
pub struct RecommendationResponse {
    pub response: String,
    pub entry: HistoryEntry,
    pub warnings: Vec<String>,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub transcript: Vec<ChatTurn>,
}

/// The profile fields the advisor sees, with skills and interests
/// comma-joined.
fn advisory_request(user: &UserContext, goal: &str) -> AdvisoryRequest {
    AdvisoryRequest {
        education: user.profile.education.as_str().to_string(),
        skills: user.profile.skills_joined(),
        interests: user.profile.interests_joined(),
        goal: goal.to_string(),
    }
}

/// POST /api/v1/advisor/recommendations
pub async fn handle_recommendations(
    State(state): State<AppState>,
    auth: AuthSession,
    Json(req): Json<RecommendationRequest>,
) -> Result<Json<RecommendationResponse>, AppError> {
    let request = advisory_request(&auth.user, req.goal.trim());
    let response = state
        .advisor
        .advise(&profile_summary(&request), &request)
        .await;
    if is_placeholder(&response) {
        warn!("Advisor gave no recommendation for {}", auth.user.username);
    }

    let entry = HistoryEntry {
        education: request.education,
        skills: request.skills,
        interests: request.interests,
        goal: request.goal,
        response: response.clone(),
        created_at: Some(Utc::now()),
    };
    let store = state.store.clone();
    let username = auth.user.username.clone();
    let stored = entry.clone();
    let appended = run_blocking(move || append_entry(&store, &username, stored)).await?;
    let history = appended.value;
    state
        .sessions
        .with_user(auth.token, |u| u.history = history)
        .await;

    Ok(Json(RecommendationResponse {
        response,
        entry,
        warnings: appended.warning.into_iter().collect(),
    }))
}

/// POST /api/v1/advisor/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    auth: AuthSession,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(AppError::Validation("Message must not be empty".to_string()));
    }

    let request = advisory_request(&auth.user, "");
    let reply = state.advisor.advise(message, &request).await;

    let turn = ChatTurn {
        user: message.to_string(),
        ai: reply.clone(),
    };
    let transcript = state
        .sessions
        .with_user(auth.token, |u| {
            u.chat.push(turn);
            u.chat.clone()
        })
        .await
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(ChatResponse { reply, transcript }))
}

/// GET /api/v1/advisor/chat
pub async fn handle_get_chat(auth: AuthSession) -> Json<Vec<ChatTurn>> {
    Json(auth.user.chat)
}
