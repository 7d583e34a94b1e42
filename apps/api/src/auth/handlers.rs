use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::credentials::SignupRequest;
use crate::auth::registry::AuthSession;
use crate::auth::session::{AuthError, Session, SessionState};
use crate::errors::AppError;
use crate::state::AppState;
use crate::tasks::run_blocking;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub token: Uuid,
    pub session: Session,
    pub warnings: Vec<String>,
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub state: SessionState,
}

/// POST /api/v1/auth/signup
pub async fn handle_signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let store = state.store.clone();
    let default_picture = state.config.default_profile_pic.clone();
    let (session, warnings) = run_blocking(move || {
        let mut session = Session::new();
        let warnings = session.signup(&store, &default_picture, &req)?;
        Ok::<_, AuthError>((session, warnings))
    })
    .await??;
    let token = state.sessions.open(session.clone()).await;
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            token,
            session,
            warnings,
        }),
    ))
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let store = state.store.clone();
    let default_picture = state.config.default_profile_pic.clone();
    let (session, warnings) = run_blocking(move || {
        let mut session = Session::new();
        let warnings = session.login(&store, &default_picture, &req.username, &req.password)?;
        Ok::<_, AuthError>((session, warnings))
    })
    .await??;
    let token = state.sessions.open(session.clone()).await;
    Ok(Json(SessionResponse {
        token,
        session,
        warnings,
    }))
}

/// POST /api/v1/auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Json<LogoutResponse> {
    let state = state
        .sessions
        .close(auth.token)
        .await
        .map(|s| s.state())
        .unwrap_or_default();
    Json(LogoutResponse { state })
}

/// GET /api/v1/session
pub async fn handle_get_session(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<Session>, AppError> {
    let session = state
        .sessions
        .session(auth.token)
        .await
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(session))
}
