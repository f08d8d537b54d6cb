//! Signup Service API
//!
//! Typed access to the remote activity-signup service.
//!
//! ## Endpoints
//!
//! | Call | Request |
//! |---|---|
//! | [`ActivityApi::list_activities`] | `GET /activities` |
//! | [`ActivityApi::login`] | `POST /auth/login` (form) |
//! | [`ActivityApi::verify`] | `POST /auth/verify` (bearer) |
//! | [`ActivityApi::signup`] | `POST /activities/{name}/signup?email=` (bearer) |
//! | [`ActivityApi::unregister`] | `DELETE /activities/{name}/unregister?email=` (bearer) |

mod client;
pub mod dto;
mod error;

pub use client::{ApiConfig, HttpActivityApi};
pub use dto::{
    Activities, Activity, ActivityDetails, LoginResponse, MessageResponse, VerifyResponse,
};
pub use error::{ApiError, ApiResult, FailureKind};

use async_trait::async_trait;

/// The remote service as seen by the session and controller
#[async_trait]
pub trait ActivityApi: Send + Sync {
    /// Full activity collection, in server order
    async fn list_activities(&self) -> ApiResult<Activities>;

    /// Exchange credentials for a bearer token
    async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse>;

    /// Check that a token is still accepted
    async fn verify(&self, token: &str) -> ApiResult<VerifyResponse>;

    async fn signup(&self, token: &str, activity: &str, email: &str) -> ApiResult<MessageResponse>;

    async fn unregister(
        &self,
        token: &str,
        activity: &str,
        email: &str,
    ) -> ApiResult<MessageResponse>;
}
