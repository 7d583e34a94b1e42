use std::sync::Arc;

use crate::advisor::Advisor;
use crate::auth::registry::SessionRegistry;
use crate::config::Config;
use crate::export::DocumentRenderer;
use crate::store::RecordStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub sessions: SessionRegistry,
    /// Pluggable advisor. Default: GeminiAdvisor; tests swap in a stub.
    pub advisor: Arc<dyn Advisor>,
    pub renderer: Arc<dyn DocumentRenderer>,
    pub config: Config,
}
