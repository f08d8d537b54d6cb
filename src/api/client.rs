//! Signup Service REST Client
//!
//! HTTP client for the activity and auth endpoints.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use super::dto::{error_detail, Activities, LoginResponse, MessageResponse, VerifyResponse};
use super::error::{ApiError, ApiResult};
use super::ActivityApi;

/// reqwest-backed implementation of [`ActivityApi`]
pub struct HttpActivityApi {
    client: Client,
    config: ApiConfig,
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the signup service (e.g., "http://localhost:8000")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

impl HttpActivityApi {
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .user_agent(concat!("signup-desk/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// `/activities/{name}/{action}` with the name encoded as one path segment
    fn activity_url(&self, activity: &str, action: &str) -> String {
        self.url(&format!(
            "/activities/{}/{}",
            urlencoding::encode(activity),
            action
        ))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(status = status.as_u16(), bytes = body.len(), "Response received");

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()));
        }

        let detail = error_detail(&body);
        if status == StatusCode::UNAUTHORIZED {
            Err(ApiError::Unauthorized { detail })
        } else {
            Err(ApiError::Rejected {
                status: status.as_u16(),
                detail,
            })
        }
    }
}

#[async_trait]
impl ActivityApi for HttpActivityApi {
    async fn list_activities(&self) -> ApiResult<Activities> {
        let url = self.url("/activities");
        tracing::debug!(%url, "Fetching activities");
        self.send(self.client.get(&url)).await
    }

    async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse> {
        let url = self.url("/auth/login");
        tracing::debug!(%url, %username, "Submitting credentials");
        self.send(
            self.client
                .post(&url)
                .form(&[("username", username), ("password", password)]),
        )
        .await
    }

    async fn verify(&self, token: &str) -> ApiResult<VerifyResponse> {
        let url = self.url("/auth/verify");
        tracing::debug!(%url, "Verifying token");
        self.send(self.client.post(&url).bearer_auth(token)).await
    }

    async fn signup(&self, token: &str, activity: &str, email: &str) -> ApiResult<MessageResponse> {
        let url = self.activity_url(activity, "signup");
        tracing::debug!(%url, %email, "Signing up participant");
        self.send(
            self.client
                .post(&url)
                .bearer_auth(token)
                .query(&[("email", email)]),
        )
        .await
    }

    async fn unregister(
        &self,
        token: &str,
        activity: &str,
        email: &str,
    ) -> ApiResult<MessageResponse> {
        let url = self.activity_url(activity, "unregister");
        tracing::debug!(%url, %email, "Unregistering participant");
        self.send(
            self.client
                .delete(&url)
                .bearer_auth(token)
                .query(&[("email", email)]),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.request_timeout_ms, 30_000);
    }

    #[test]
    fn test_activity_url_encodes_name() {
        let api = HttpActivityApi::new(ApiConfig {
            base_url: "http://school.test/".to_string(),
            ..ApiConfig::default()
        })
        .unwrap();

        assert_eq!(
            api.activity_url("Chess Club", "signup"),
            "http://school.test/activities/Chess%20Club/signup"
        );
        assert_eq!(
            api.activity_url("Art/Design & Co", "unregister"),
            "http://school.test/activities/Art%2FDesign%20%26%20Co/unregister"
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_failure() {
        let api = HttpActivityApi::new(ApiConfig {
            // Port 9 (discard) is essentially never listening locally
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_ms: 2_000,
        })
        .unwrap();

        let err = api.list_activities().await.unwrap_err();
        assert_eq!(err.kind(), crate::api::FailureKind::Transport);
    }
}
