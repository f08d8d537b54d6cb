//! Session Management
//!
//! Owns the bearer token and the client's belief about who is logged in.
//!
//! ## Lifecycle
//!
//! 1. At startup the token is read from a [`TokenStore`]; none means logged out.
//! 2. A held token is verified against the server. Any failure clears it.
//! 3. Login stores a fresh token; logout and expiry delete it.
//!
//! Every transition bumps an epoch. A verification that was in flight across
//! a newer transition does not get to overwrite the newer state.

mod store;

pub use store::{FileTokenStore, MemoryTokenStore, StoreError, StoreResult, TokenStore};

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::api::{ActivityApi, ApiError, FailureKind};

/// Authentication state derived from the server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub authenticated: bool,
    pub teacher_name: String,
}

impl AuthState {
    pub fn logged_out() -> Self {
        Self::default()
    }

    pub fn logged_in(teacher_name: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            teacher_name: teacher_name.into(),
        }
    }
}

/// Text to show on the login dialog after a failed login
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct LoginFailure {
    pub message: String,
}

impl LoginFailure {
    fn from_api(err: &ApiError) -> Self {
        let message = match err.kind() {
            FailureKind::Transport => "Login failed. Please try again.".to_string(),
            _ => err.detail().unwrap_or("Login failed").to_string(),
        };
        Self { message }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    auth: AuthState,
    epoch: u64,
}

/// Token storage, verification, login and logout
pub struct SessionManager {
    api: Arc<dyn ActivityApi>,
    store: Arc<dyn TokenStore>,
    state: RwLock<SessionState>,
}

impl SessionManager {
    /// Create a logged-out session. Call [`load_token`](Self::load_token) to pick
    /// up a stored token.
    pub fn new(api: Arc<dyn ActivityApi>, store: Arc<dyn TokenStore>) -> Self {
        Self {
            api,
            store,
            state: RwLock::new(SessionState::default()),
        }
    }

    /// Read the persisted token. Absence, or a store that cannot be read, means
    /// unauthenticated.
    pub async fn load_token(&self) -> Option<String> {
        let token = match self.store.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read stored token");
                None
            }
        };

        let mut state = self.state.write().await;
        state.token = token.clone();
        token
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }

    /// Snapshot of the current authentication state
    pub async fn auth(&self) -> AuthState {
        self.state.read().await.auth.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.auth.authenticated
    }

    /// The token to send on a protected call; `None` unless authenticated
    pub async fn bearer(&self) -> Option<String> {
        let state = self.state.read().await;
        state
            .auth
            .authenticated
            .then(|| state.token.clone())
            .flatten()
    }

    /// Verify the held token, if any. Without a token no request is made.
    pub async fn refresh(&self) -> AuthState {
        let (token, epoch) = {
            let state = self.state.read().await;
            (state.token.clone(), state.epoch)
        };

        match token {
            Some(token) => self.verify_at(&token, epoch).await,
            None => {
                tracing::debug!("No stored token; starting logged out");
                self.auth().await
            }
        }
    }

    /// Verify `token` with the server.
    ///
    /// On success the session holds `token` and is authenticated. On any
    /// failure the stored token is cleared and the session is logged out.
    pub async fn verify(&self, token: &str) -> AuthState {
        let epoch = self.state.read().await.epoch;
        self.verify_at(token, epoch).await
    }

    async fn verify_at(&self, token: &str, epoch: u64) -> AuthState {
        let result = self.api.verify(token).await;

        let mut state = self.state.write().await;
        if state.epoch != epoch {
            tracing::debug!("Session changed during verification; discarding result");
            return state.auth.clone();
        }

        state.epoch += 1;
        match result {
            Ok(response) => {
                tracing::info!(teacher = %response.teacher_name, "Session verified");
                state.token = Some(token.to_string());
                state.auth = AuthState::logged_in(response.teacher_name);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token verification failed; clearing session");
                self.clear_locked(&mut state);
            }
        }
        state.auth.clone()
    }

    /// Submit credentials. A failure leaves any stored token untouched.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthState, LoginFailure> {
        let response = match self.api.login(username, password).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%username, error = %e, "Login failed");
                return Err(LoginFailure::from_api(&e));
            }
        };

        let mut state = self.state.write().await;
        state.epoch += 1;
        if let Err(e) = self.store.save(&response.token) {
            tracing::warn!(error = %e, "Could not persist token; session will not survive a restart");
        }
        state.token = Some(response.token);
        state.auth = AuthState::logged_in(response.teacher_name);
        tracing::info!(teacher = %state.auth.teacher_name, "Logged in");
        Ok(state.auth.clone())
    }

    /// Forget the token. No server call is made.
    pub async fn logout(&self) -> AuthState {
        let mut state = self.state.write().await;
        state.epoch += 1;
        self.clear_locked(&mut state);
        tracing::info!("Logged out");
        state.auth.clone()
    }

    /// The server rejected `token` on a protected call.
    ///
    /// Only ends the session if `token` is still the one held. Returns `false`
    /// when a newer login or logout has already replaced it.
    pub async fn expire(&self, token: &str) -> bool {
        let mut state = self.state.write().await;
        if state.token.as_deref() != Some(token) {
            tracing::debug!("Rejected token is no longer current; keeping session");
            return false;
        }

        state.epoch += 1;
        self.clear_locked(&mut state);
        tracing::warn!("Session expired");
        true
    }

    fn clear_locked(&self, state: &mut SessionState) {
        state.token = None;
        state.auth = AuthState::logged_out();
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "Could not remove stored token");
        }
    }
}
