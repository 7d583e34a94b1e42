pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::advisor::handlers as advisor;
use crate::auth::handlers as auth;
use crate::history::handlers as history;
use crate::matching::handlers as matching;
use crate::profile::handlers as profile;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Accounts and sessions
        .route("/api/v1/auth/signup", post(auth::handle_signup))
        .route("/api/v1/auth/login", post(auth::handle_login))
        .route("/api/v1/auth/logout", post(auth::handle_logout))
        .route("/api/v1/session", get(auth::handle_get_session))
        // Profile
        .route(
            "/api/v1/profile",
            get(profile::handle_get_profile).put(profile::handle_update_profile),
        )
        .route(
            "/api/v1/profile/picture",
            post(profile::handle_upload_picture),
        )
        .route(
            "/api/v1/users/:username/picture",
            get(profile::handle_get_picture),
        )
        // Peer matching
        .route("/api/v1/matches", get(matching::handle_get_matches))
        .route(
            "/api/v1/matches/export",
            get(matching::handle_export_matches),
        )
        // Advisor
        .route(
            "/api/v1/advisor/recommendations",
            post(advisor::handle_recommendations),
        )
        .route(
            "/api/v1/advisor/chat",
            get(advisor::handle_get_chat).post(advisor::handle_chat),
        )
        // History
        .route(
            "/api/v1/history",
            get(history::handle_get_history).delete(history::handle_clear_history),
        )
        .route("/api/v1/history/export", get(history::handle_export_history))
        .route(
            "/api/v1/history/latest/export",
            get(history::handle_export_latest),
        )
        .with_state(state)
}
