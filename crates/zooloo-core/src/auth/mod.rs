//! Authentication module for session state and credential persistence.
//!
//! This module provides:
//! - `CredentialStore`: token and user profile slots over a key-value backend
//! - `FileStore`, `KeyringStore`, `MemoryStore`: the available backends
//! - `SessionManager`: the session state machine, published over a watch channel

pub mod keychain;
pub mod session;
pub mod store;

pub use keychain::KeyringStore;
pub use session::{SessionManager, SessionState};
pub use store::{CredentialStore, FileStore, KeyValueStore, MemoryStore, TOKEN_KEY, USER_KEY};
