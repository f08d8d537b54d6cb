//! Top-level error type
//!
//! Startup and wiring failures. Failures during normal operation are turned
//! into notifications by the controller and never surface here.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::session::StoreError;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Api(#[from] ApiError),

    #[error("Token store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;
