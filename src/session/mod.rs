// src/session/mod.rs
//! Authenticated identity lifecycle: login, registration, password reset,
//! logout, and the read-only identity gate used before aggregation.

pub mod store;

use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::api::{AuthBackend, SendError};
use crate::schema::{RegisterRequest, ResetPasswordRequest};
use store::{KeyValueStore, StoreError};

pub const TOKEN_KEY: &str = "authToken";
pub const PLAYER_ID_KEY: &str = "playerId";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticating,
    Authenticated,
    AuthFailed,
}

/// Resolved session token and player identifier
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub token: String,
    pub player_id: String,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("token", &"<redacted>")
            .field("player_id", &self.player_id)
            .finish()
    }
}

pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Account details submitted at registration
pub struct Profile {
    pub fullname: String,
    pub phone: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug)]
pub enum SessionError {
    /// No persisted identity; the caller must log in
    AuthRequired,
    /// The identity backend rejected or failed the request
    AuthFailed(String),
    /// Local precondition failed; nothing was sent
    Validation(String),
    Store(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::AuthRequired => write!(f, "not logged in"),
            SessionError::AuthFailed(e) => write!(f, "authentication failed: {}", e),
            SessionError::Validation(e) => write!(f, "invalid input: {}", e),
            SessionError::Store(e) => write!(f, "session store error: {}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<StoreError> for SessionError {
    fn from(e: StoreError) -> Self {
        SessionError::Store(e.to_string())
    }
}

impl From<SendError> for SessionError {
    fn from(e: SendError) -> Self {
        SessionError::AuthFailed(e.to_string())
    }
}

/// Owns the persisted identity. Only `login` and `logout` write it; writes
/// are serialized so concurrent callers never interleave a token and id.
pub struct SessionGate {
    store: Arc<dyn KeyValueStore>,
    backend: Arc<dyn AuthBackend>,
    state: Mutex<SessionState>,
    write_lock: tokio::sync::Mutex<()>,
}

impl SessionGate {
    /// Initial state is Authenticated when the store already holds a complete
    /// identity, Anonymous otherwise.
    pub fn new(store: Arc<dyn KeyValueStore>, backend: Arc<dyn AuthBackend>) -> Self {
        let initial = match read_identity(store.as_ref()) {
            Ok(Some(_)) => SessionState::Authenticated,
            _ => SessionState::Anonymous,
        };
        Self {
            store,
            backend,
            state: Mutex::new(initial),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn state(&self) -> SessionState {
        match self.state.lock() {
            Ok(state) => *state,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn set_state(&self, next: SessionState) {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        debug!(from = ?*state, to = ?next, "session state transition");
        *state = next;
    }

    /// Authenticate and persist the returned identity as one pair.
    /// On any failure the previously persisted identity is cleared.
    #[tracing::instrument(name = "login", skip(self, credentials))]
    pub async fn login(&self, credentials: &Credentials) -> Result<Identity, SessionError> {
        let _guard = self.write_lock.lock().await;
        self.set_state(SessionState::Authenticating);

        let result = match self.authenticate(credentials).await {
            Ok(identity) => self
                .store
                .put_many(&[
                    (TOKEN_KEY, identity.token.as_str()),
                    (PLAYER_ID_KEY, identity.player_id.as_str()),
                ])
                .map(|_| identity)
                .map_err(SessionError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(identity) => {
                self.set_state(SessionState::Authenticated);
                info!(player_id = %identity.player_id, "logged in");
                Ok(identity)
            }
            Err(e) => {
                warn!(error = %e, "login failed");
                if let Err(clear_err) = self.store.remove_many(&[TOKEN_KEY, PLAYER_ID_KEY]) {
                    warn!(error = %clear_err, "failed to clear stale identity");
                }
                self.set_state(SessionState::AuthFailed);
                Err(e)
            }
        }
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<Identity, SessionError> {
        let response = self
            .backend
            .login(&credentials.email, &credentials.password)
            .await?;

        if response.is_error {
            let message = response
                .error_message
                .unwrap_or_else(|| "login rejected".to_string());
            return Err(SessionError::AuthFailed(message));
        }
        if response.token.is_empty() {
            return Err(SessionError::AuthFailed(
                "login response carried no token".to_string(),
            ));
        }
        let player_id = response
            .player_id
            .map(|id| id.to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                SessionError::AuthFailed(
                    "account has no player profile on the server; ask the coach to link one"
                        .to_string(),
                )
            })?;

        Ok(Identity {
            token: response.token,
            player_id,
        })
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, profile: &Profile) -> Result<(), SessionError> {
        if profile.password != profile.confirm_password {
            return Err(SessionError::Validation(
                "password and confirmation do not match".to_string(),
            ));
        }
        if profile.email.trim().is_empty() {
            return Err(SessionError::Validation("email is required".to_string()));
        }

        let request = RegisterRequest {
            fullname: profile.fullname.clone(),
            phone: profile.phone.clone(),
            username: profile.email.clone(),
            email: profile.email.clone(),
            password: profile.password.clone(),
        };
        let response = self.backend.register(&request).await?;
        if !response.success {
            return Err(SessionError::AuthFailed("registration rejected".to_string()));
        }

        info!("account registered");
        Ok(())
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), SessionError> {
        let request = ResetPasswordRequest {
            email: email.to_string(),
        };
        let response = self.backend.reset_password(&request).await?;
        if !response.success {
            return Err(SessionError::AuthFailed(
                "password reset rejected".to_string(),
            ));
        }
        Ok(())
    }

    /// Persisted identity, read without touching the network. Nothing is
    /// returned while a login is in flight or after one failed, even if a
    /// stale pair could not be cleared from the store.
    pub fn require_identity(&self) -> Result<Identity, SessionError> {
        match self.state() {
            SessionState::Authenticating | SessionState::AuthFailed => {
                return Err(SessionError::AuthRequired)
            }
            SessionState::Anonymous | SessionState::Authenticated => {}
        }
        read_identity(self.store.as_ref())?.ok_or(SessionError::AuthRequired)
    }

    pub async fn logout(&self) -> Result<(), SessionError> {
        let _guard = self.write_lock.lock().await;
        self.store.remove_many(&[TOKEN_KEY, PLAYER_ID_KEY])?;
        self.set_state(SessionState::Anonymous);
        info!("logged out");
        Ok(())
    }
}

/// Both halves must be present and non-empty
fn read_identity(store: &dyn KeyValueStore) -> Result<Option<Identity>, StoreError> {
    let mut values = store.get_many(&[TOKEN_KEY, PLAYER_ID_KEY])?.into_iter();
    let token = values.next().flatten().filter(|t| !t.is_empty());
    let player_id = values.next().flatten().filter(|p| !p.is_empty());

    Ok(match (token, player_id) {
        (Some(token), Some(player_id)) => Some(Identity { token, player_id }),
        _ => None,
    })
}
