use crate::api::sender::{AuthBackend, CoachBackend, SendError, Submitter};
use crate::schema::{
    self, AuthResponse, CoachReply, CoachRequest, LoginResponse, MetricPayload, RegisterRequest,
    ResetPasswordRequest,
};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const METRIC_PATH: &str = "/player_metric";
const LOGIN_PATH: &str = "/login";
const REGISTER_PATH: &str = "/register";
const RESET_PASSWORD_PATH: &str = "/reset-password";
const COACH_PATH: &str = "/coach";

/// HTTP client for the coaching API (identity, metrics and chat endpoints)
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new client for the given base URL.
    /// Returns an error if the URL is not http(s) or the HTTP client fails to build.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, String> {
        let base_url = normalize_base_url(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("vitals2coach/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| format!("failed to build HTTP client: {}", e))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, SendError> {
        let endpoint = self.endpoint(path);
        let body = schema::encode(body).map_err(SendError::Serialize)?;

        let response = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        read_json(response, &endpoint).await
    }
}

/// Trim trailing slashes and require an http(s) scheme
pub fn normalize_base_url(url: &str) -> Result<String, String> {
    let url = url.trim().trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_string())
    } else {
        Err(format!("API URL must start with http:// or https://: {}", url))
    }
}

fn transport_error(e: reqwest::Error) -> SendError {
    if e.is_timeout() {
        SendError::Timeout
    } else {
        SendError::Network(e.to_string())
    }
}

/// Decode a JSON body. A body that does not decode on a non-2xx response is
/// reported as an HTTP error rather than a decode error.
async fn read_json<T: DeserializeOwned>(response: Response, endpoint: &str) -> Result<T, SendError> {
    let status = response.status().as_u16();
    let body = response.bytes().await.map_err(transport_error)?;

    match schema::decode(&body) {
        Ok(decoded) => Ok(decoded),
        Err(_) if !(200..300).contains(&status) => {
            error!(endpoint, status, "API returned error status");
            Err(SendError::Http {
                status,
                endpoint: endpoint.to_string(),
            })
        }
        Err(e) => Err(SendError::Decode(e)),
    }
}

#[async_trait::async_trait]
impl Submitter for ApiClient {
    #[tracing::instrument(
        name = "metric_submit",
        skip(self, payload),
        fields(player_id = %payload.player_id)
    )]
    async fn submit(&self, payload: &MetricPayload) -> Result<u16, SendError> {
        let endpoint = self.endpoint(METRIC_PATH);
        let body = schema::encode(payload).map_err(SendError::Serialize)?;
        debug!(endpoint, body_size = body.len(), "posting metric snapshot");

        let response = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!(endpoint, error = %e, "metric submission failed");
                transport_error(e)
            })?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            // Delivery is what counts here; the service's verdict is only logged
            let resp_body = response
                .text()
                .await
                .unwrap_or_else(|_| "(failed to read body)".to_string());
            warn!(
                endpoint,
                status,
                response_body = %resp_body,
                "metric endpoint returned non-success status"
            );
        }

        Ok(status)
    }
}

#[async_trait::async_trait]
impl AuthBackend for ApiClient {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, SendError> {
        let endpoint = self.endpoint(LOGIN_PATH);
        debug!(endpoint, "requesting login");

        let response = self
            .client
            .get(&endpoint)
            .query(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(transport_error)?;

        read_json(response, &endpoint).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, SendError> {
        self.post_json(REGISTER_PATH, request).await
    }

    async fn reset_password(
        &self,
        request: &ResetPasswordRequest,
    ) -> Result<AuthResponse, SendError> {
        self.post_json(RESET_PASSWORD_PATH, request).await
    }
}

#[async_trait::async_trait]
impl CoachBackend for ApiClient {
    async fn ask(&self, message: &str) -> Result<CoachReply, SendError> {
        let request = CoachRequest {
            message: message.to_string(),
        };
        self.post_json(COACH_PATH, &request).await
    }
}
