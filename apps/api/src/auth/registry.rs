use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::auth::session::{Session, UserContext};
use crate::errors::AppError;
use crate::state::AppState;

/// A session untouched for this long is logged out.
pub const SESSION_IDLE_TTL: Duration = Duration::from_secs(2 * 60 * 60);
/// How often the background sweeper drops idle sessions.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

struct Entry {
    session: Session,
    last_seen: Instant,
}

/// Live sessions keyed by their opaque bearer token. Every lookup refreshes
/// the session's idle timer.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Entry>>>,
    idle_ttl: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_idle_ttl(SESSION_IDLE_TTL)
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl,
        }
    }

    fn is_idle(&self, entry: &Entry) -> bool {
        entry.last_seen.elapsed() >= self.idle_ttl
    }

    /// Resolves a token to its session and marks it as active. An idle
    /// session is dropped instead.
    fn touch<'a>(
        &self,
        sessions: &'a mut HashMap<Uuid, Entry>,
        token: Uuid,
    ) -> Option<&'a mut Session> {
        if self.is_idle(sessions.get(&token)?) {
            expire(sessions, token);
            return None;
        }
        let entry = sessions.get_mut(&token)?;
        entry.last_seen = Instant::now();
        Some(&mut entry.session)
    }

    /// Stores a logged-in session and hands back its token.
    pub async fn open(&self, session: Session) -> Uuid {
        let token = Uuid::new_v4();
        self.sessions.write().await.insert(
            token,
            Entry {
                session,
                last_seen: Instant::now(),
            },
        );
        token
    }

    pub async fn session(&self, token: Uuid) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        self.touch(&mut sessions, token).map(|s| s.clone())
    }

    pub async fn user(&self, token: Uuid) -> Option<UserContext> {
        let mut sessions = self.sessions.write().await;
        self.touch(&mut sessions, token)
            .and_then(|s| s.user().cloned())
    }

    /// Runs `f` against the session's user context, if the session is live.
    pub async fn with_user<R>(
        &self,
        token: Uuid,
        f: impl FnOnce(&mut UserContext) -> R,
    ) -> Option<R> {
        let mut sessions = self.sessions.write().await;
        self.touch(&mut sessions, token)
            .and_then(|s| s.user_mut())
            .map(f)
    }

    /// Logs the session out and forgets its token.
    pub async fn close(&self, token: Uuid) -> Option<Session> {
        let mut session = self.sessions.write().await.remove(&token)?.session;
        session.logout();
        Some(session)
    }

    /// Logs out every idle session. Returns how many were dropped.
    pub async fn sweep(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let idle: Vec<Uuid> = sessions
            .iter()
            .filter(|(_, entry)| self.is_idle(entry))
            .map(|(token, _)| *token)
            .collect();
        for token in &idle {
            expire(&mut sessions, *token);
        }
        idle.len()
    }

    /// Sweeps idle sessions every `every` until the runtime shuts down.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let dropped = registry.sweep().await;
                if dropped > 0 {
                    info!("Expired {dropped} idle sessions");
                }
            }
        })
    }

    /// Sessions that have not gone idle.
    pub async fn len(&self) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|entry| !self.is_idle(entry))
            .count()
    }
}

fn expire(sessions: &mut HashMap<Uuid, Entry>, token: Uuid) {
    if let Some(mut entry) = sessions.remove(&token) {
        entry.session.logout();
    }
}

/// Extractor for handlers that need a logged-in caller. Reads
/// `Authorization: Bearer <token>` and resolves it against the registry.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: Uuid,
    pub user: UserContext,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .and_then(|t| Uuid::parse_str(t.trim()).ok())
            .ok_or(AppError::Unauthorized)?;

        let user = state
            .sessions
            .user(token)
            .await
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthSession { token, user })
    }
}
