// src/api/sender.rs
use crate::schema::{
    AuthResponse, CoachReply, LoginResponse, MetricPayload, RegisterRequest, ResetPasswordRequest,
};

/// Errors that can occur when talking to the coaching API
#[derive(Debug)]
pub enum SendError {
    Timeout,
    Http { status: u16, endpoint: String },
    Network(String),
    Serialize(String),
    Decode(String),
}

impl std::fmt::Display for SendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendError::Timeout => write!(f, "request timed out"),
            SendError::Http { status, endpoint } => {
                write!(f, "HTTP {} from {}", status, endpoint)
            }
            SendError::Network(msg) => write!(f, "network error: {}", msg),
            SendError::Serialize(msg) => write!(f, "serialization error: {}", msg),
            SendError::Decode(msg) => write!(f, "invalid response body: {}", msg),
        }
    }
}

impl std::error::Error for SendError {}

/// Trait for posting a metric snapshot (abstracts HTTP client).
/// Returns the response status; any response at all counts as delivered.
#[async_trait::async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, payload: &MetricPayload) -> Result<u16, SendError>;
}

/// Trait for the identity endpoints (abstracts HTTP client)
#[async_trait::async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, SendError>;

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, SendError>;

    async fn reset_password(
        &self,
        request: &ResetPasswordRequest,
    ) -> Result<AuthResponse, SendError>;
}

/// Trait for the coach chat endpoint
#[async_trait::async_trait]
pub trait CoachBackend: Send + Sync {
    async fn ask(&self, message: &str) -> Result<CoachReply, SendError>;
}
