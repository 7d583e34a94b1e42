//! Session/Account lifecycle.
//!
//! A [`Session`] is the explicit per-user context handed to every handler:
//! built on login or signup, torn down on logout. Nothing about the logged-in
//! user lives anywhere else in memory.
//!
//! ```text
//! LoggedOut ──login──▶ LoggingIn ──ok──▶ LoggedIn ──logout──▶ LoggedOut
//!     │                    └──fail──▶ LoggedOut
//!     └──signup─▶ SigningUp ──ok──▶ LoggedIn
//!                     └──fail──▶ LoggedOut
//! ```

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::auth::credentials::{
    hash_password, validate_signup, verify_password, SignupError, SignupRequest,
};
use crate::history::ledger::{load_history, HistoryEntry};
use crate::profile::manager::{get_or_bootstrap, save_profile};
use crate::profile::models::Profile;
use crate::profile::pictures::{get_or_bootstrap_picture, set_picture};
use crate::store::{Collection, RecordStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    LoggedOut,
    LoggingIn,
    SigningUp,
    LoggedIn,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown user and wrong password are deliberately indistinguishable.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error(transparent)]
    Signup(#[from] SignupError),

    #[error("cannot start a new login from state {0:?}")]
    InvalidTransition(SessionState),
}

/// One exchange with the chat advisor. Lives only as long as the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatTurn {
    pub user: String,
    pub ai: String,
}

/// Everything loaded for a logged-in user.
#[derive(Debug, Clone, Serialize)]
pub struct UserContext {
    pub username: String,
    pub profile: Profile,
    pub picture: String,
    pub history: Vec<HistoryEntry>,
    pub chat: Vec<ChatTurn>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Session {
    state: SessionState,
    user: Option<UserContext>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn user(&self) -> Option<&UserContext> {
        self.user.as_ref()
    }

    pub fn user_mut(&mut self) -> Option<&mut UserContext> {
        self.user.as_mut()
    }

    /// Verifies credentials, then loads (or bootstraps) the profile and
    /// picture and loads the history. Returns storage warnings raised while
    /// bootstrapping.
    pub fn login(
        &mut self,
        store: &RecordStore,
        default_picture: &str,
        username: &str,
        password: &str,
    ) -> Result<Vec<String>, AuthError> {
        self.begin(SessionState::LoggingIn)?;
        let username = username.trim();

        let digest: Option<String> = store.get(Collection::Users, username);
        let verified = digest
            .map(|d| verify_password(password, &d))
            .unwrap_or(false);
        if !verified {
            self.state = SessionState::LoggedOut;
            return Err(AuthError::InvalidCredentials);
        }

        let profile = get_or_bootstrap(store, username);
        let picture = get_or_bootstrap_picture(store, username, default_picture);
        let warnings = [profile.warning, picture.warning]
            .into_iter()
            .flatten()
            .collect();

        self.enter(UserContext {
            username: username.to_string(),
            profile: profile.value,
            picture: picture.value,
            history: load_history(store, username),
            chat: Vec::new(),
        });
        info!("User {username} logged in");
        Ok(warnings)
    }

    /// Creates the credential, default profile and default picture ref, then
    /// logs straight in. A rejected signup writes nothing.
    pub fn signup(
        &mut self,
        store: &RecordStore,
        default_picture: &str,
        req: &SignupRequest,
    ) -> Result<Vec<String>, AuthError> {
        self.begin(SessionState::SigningUp)?;

        let created = store.try_modify(Collection::Users, |users| {
            let username = validate_signup(req, |u| users.contains_key(u))?;
            users.insert(username.clone(), hash_password(&req.password).into());
            Ok::<_, SignupError>(username)
        });
        let created = match created {
            Ok(c) => c,
            Err(e) => {
                self.state = SessionState::LoggedOut;
                return Err(e.into());
            }
        };
        let username = created.value;

        let profile = save_profile(store, &username, Profile::bootstrap(&username));
        let picture = set_picture(store, &username, default_picture);
        let warnings = [created.warning, profile.warning, picture.warning]
            .into_iter()
            .flatten()
            .collect();

        self.enter(UserContext {
            history: load_history(store, &username),
            username: username.clone(),
            profile: profile.value,
            picture: picture.value,
            chat: Vec::new(),
        });
        info!("Created account {username}");
        Ok(warnings)
    }

    /// Drops all in-memory user data. Persisted data is untouched.
    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            info!("User {} logged out", user.username);
        }
        self.state = SessionState::LoggedOut;
    }

    fn begin(&mut self, next: SessionState) -> Result<(), AuthError> {
        if self.state != SessionState::LoggedOut {
            return Err(AuthError::InvalidTransition(self.state));
        }
        self.state = next;
        Ok(())
    }

    fn enter(&mut self, user: UserContext) {
        self.user = Some(user);
        self.state = SessionState::LoggedIn;
    }
}
