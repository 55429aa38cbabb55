//! Core library for zooloo.
//!
//! Provides the authentication client for the application REST service,
//! the persisted credential store, the session state machine and the
//! routing decision the front-end derives from it.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod navigation;

pub use api::{AuthClient, AuthError};
pub use auth::{CredentialStore, SessionManager, SessionState};
pub use config::Config;
pub use models::{Credentials, LoginResponse, User};
pub use navigation::Route;
