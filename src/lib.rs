//! # signup-desk
//!
//! Teacher-facing client for the Mergington High School activity signup
//! service: browse activities and rosters, log in, and register or remove
//! students.
//!
//! ## Modules
//!
//! - [`api`]: typed client for the service's REST endpoints
//! - [`session`]: bearer-token storage, verification, login and logout
//! - [`view`]: pure rendering of the page, plus a terminal adapter
//! - [`notify`]: single-slot, auto-dismissing status messages
//! - [`controller`]: the actions a user can take, wired together
//! - [`shell`]: interactive front end
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use signup_desk::{Config, Controller};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let controller = Controller::from_config(&Config::default(), true)?;
//!
//!     controller.init().await;
//!     controller.login("teacher", "password").await;
//!     controller.signup("Chess Club", "student@mergington.edu").await;
//!
//!     let page = controller.render().await;
//!     println!("{}", signup_desk::view::text::TextPage(&page));
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod notify;
pub mod session;
pub mod shell;
pub mod view;

pub use api::{
    Activities, Activity, ActivityApi, ApiConfig, ApiError, ApiResult, FailureKind,
    HttpActivityApi,
};

pub use config::{Config, ConfigError};

pub use controller::{ActionOutcome, Controller};

pub use error::{ClientError, ClientResult};

pub use notify::{Notification, Notifier, Severity};

pub use session::{
    AuthState, FileTokenStore, LoginFailure, MemoryTokenStore, SessionManager, TokenStore,
};

pub use view::{render, PageView, ViewModel};
