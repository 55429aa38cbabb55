//! REST client module for the application authentication service.
//!
//! This module provides the `AuthClient` for logging in, validating and
//! refreshing session tokens, and logging out. Transport failures are
//! reported through `AuthError` so callers can tell a timeout from a
//! rejected login or a malformed payload.

pub mod client;
pub mod error;

pub use client::{AuthClient, AuthMethod, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use error::AuthError;
