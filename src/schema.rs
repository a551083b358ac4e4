//! Request and response bodies for the coaching API.
//!
//! Encoding and decoding here are pure functions over bytes so they can be
//! tested without a transport.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Body of `POST /player_metric`. The key set is fixed by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPayload {
    pub player_id: String,
    pub step_count: i64,
    pub heart_rate: i64,
    pub blood_oxygen_level: i64,
    pub hrv: f64,
    pub vo_max: f64,
    pub cadence: f64,
    pub elevation_gain: i64,
}

/// Response of `GET /login`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: String,
    #[serde(default, rename = "type")]
    pub token_type: String,
    #[serde(default)]
    pub expires: String,
    pub is_error: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub player_id: Option<PlayerId>,
}

/// Player identifiers arrive as integers from some backends and strings from others
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PlayerId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerId::Number(n) => write!(f, "{}", n),
            PlayerId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Body of `POST /register`
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub fullname: String,
    pub phone: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Body of `POST /reset-password`
#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordRequest {
    pub email: String,
}

/// Response of `/register` and `/reset-password`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
}

/// Body of `POST /coach`
#[derive(Debug, Clone, Serialize)]
pub struct CoachRequest {
    pub message: String,
}

/// Response of `POST /coach`
#[derive(Debug, Clone, Deserialize)]
pub struct CoachReply {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub player_name: Option<String>,
    #[serde(default)]
    pub player_report: Option<String>,
    #[serde(default)]
    pub is_error: Option<bool>,
    #[serde(default)]
    pub error_message: Option<String>,
}

pub fn encode<T: Serialize>(body: &T) -> Result<Bytes, String> {
    serde_json::to_vec(body)
        .map(Bytes::from)
        .map_err(|e| e.to_string())
}

pub fn decode<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T, String> {
    serde_json::from_slice(body).map_err(|e| e.to_string())
}
